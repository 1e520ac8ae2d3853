//! The ordering conversation: district, depth, equipment, confirmation and
//! contact details, with a running price at every step.
//!
//! [`Conversation::handle`] is synchronous and touches the JSON store, so
//! async callers run it on a blocking thread.

pub mod action;
pub mod reply;
pub mod texts;

use std::sync::Arc;

use chrono::Utc;

use crate::domain::catalog::{District, EquipmentCatalog};
use crate::domain::errors::DomainError;
use crate::domain::order::{new_order_id, Customer, Order, OrderFilter, OrderStatus};
use crate::domain::ports::{CatalogRepository, OrderRepository, ReportRenderer, SessionStore};
use crate::domain::pricing::{format_money, price_equipment, quote_drilling, CostBreakdown};
use crate::domain::session::{DistrictChoice, Session, Step};

pub use action::Action;
pub use reply::{Button, Keyboard, Outcome, Reply};

/// How many of a customer's orders "my orders" lists.
const RECENT_ORDERS: usize = 10;

pub struct Conversation {
    catalog: Arc<dyn CatalogRepository>,
    orders: Arc<dyn OrderRepository>,
    sessions: Arc<dyn SessionStore>,
    reports: Arc<dyn ReportRenderer>,
}

impl Conversation {
    pub fn new(
        catalog: Arc<dyn CatalogRepository>,
        orders: Arc<dyn OrderRepository>,
        sessions: Arc<dyn SessionStore>,
        reports: Arc<dyn ReportRenderer>,
    ) -> Self {
        Self {
            catalog,
            orders,
            sessions,
            reports,
        }
    }

    /// Applies one customer action. Missing reference data and invalid input
    /// come back as notices; only storage failures are errors.
    pub fn handle(&self, customer: &Customer, action: Action) -> Result<Outcome, DomainError> {
        match self.apply(customer, action) {
            Err(e @ (DomainError::NotFound(_) | DomainError::InvalidInput(_))) => {
                Ok(Outcome::notice(format!("❌ {}", e)))
            }
            other => other,
        }
    }

    fn apply(&self, customer: &Customer, action: Action) -> Result<Outcome, DomainError> {
        let user_id = customer.user_id;

        match action {
            Action::Start => {
                self.sessions.remove(user_id);
                Ok(Outcome::reply(Reply::message(
                    texts::greeting(&customer.full_name),
                    Keyboard::MainMenu,
                )))
            }
            Action::Help => Ok(Outcome::reply(Reply::message(
                texts::help(),
                Keyboard::MainMenu,
            ))),
            Action::Cancel => {
                self.sessions.remove(user_id);
                Ok(Outcome::reply(Reply::message(
                    texts::CANCELLED,
                    Keyboard::MainMenu,
                )))
            }
            Action::NewOrder => {
                let districts = self.catalog.districts()?;
                if districts.is_empty() {
                    return Ok(Outcome::notice(texts::NO_DISTRICTS));
                }
                self.sessions.put(user_id, Session::default());
                Ok(Outcome::reply(district_menu(&districts)))
            }
            Action::MyOrders => self.my_orders(user_id),
            Action::DownloadReport(order_id) => self.download_report(user_id, &order_id),
            Action::PickDistrict(id) => self.pick_district(user_id, id),
            Action::PickDepth(depth) => self.pick_depth(user_id, depth),
            Action::PickCategory(id) => self.pick_category(user_id, &id),
            Action::ToggleComponent(id) => self.toggle_component(user_id, &id),
            Action::DoneComponents => self.back_to_categories(user_id, &[Step::SelectingComponents]),
            Action::BackToCategories => self.back_to_categories(
                user_id,
                &[Step::SelectingComponents, Step::ConfirmingOrder],
            ),
            Action::FinishEquipment => {
                let Some(session) = self.session_at(user_id, &[Step::SelectingCategory]) else {
                    return Ok(Outcome::notice(texts::STALE_STEP));
                };
                self.show_summary(user_id, session)
            }
            Action::BackToSummary => {
                let Some(session) = self.session_at(user_id, &[Step::EnteringContactInfo]) else {
                    return Ok(Outcome::notice(texts::STALE_STEP));
                };
                self.show_summary(user_id, session)
            }
            Action::ConfirmOrder => {
                let Some(mut session) = self.session_at(user_id, &[Step::ConfirmingOrder]) else {
                    return Ok(Outcome::notice(texts::STALE_STEP));
                };
                session.step = Step::EnteringContactInfo;
                self.sessions.put(user_id, session);
                Ok(Outcome::reply(Reply::message(
                    texts::CONTACT_PROMPT,
                    Keyboard::Inline(vec![vec![
                        Button::new(texts::BACK_LABEL, Action::BackToSummary),
                        Button::new(texts::CANCEL_LABEL, Action::Cancel),
                    ]]),
                )))
            }
            Action::BackToDistricts => {
                let Some(mut session) = self.session_at(user_id, &[Step::SelectingDepth]) else {
                    return Ok(Outcome::notice(texts::STALE_STEP));
                };
                let districts = self.catalog.districts()?;
                session.step = Step::SelectingDistrict;
                self.sessions.put(user_id, session);
                Ok(Outcome::reply(district_menu(&districts)))
            }
            Action::BackToDepth => {
                let Some(mut session) = self.session_at(user_id, &[Step::SelectingCategory]) else {
                    return Ok(Outcome::notice(texts::STALE_STEP));
                };
                let Some(district) = self.session_district(&session)? else {
                    return Ok(Outcome::notice(texts::DISTRICT_NOT_FOUND));
                };
                session.step = Step::SelectingDepth;
                self.sessions.put(user_id, session);
                Ok(Outcome::reply(depth_menu(&district)))
            }
            Action::Text(text) => self.text(customer, text),
        }
    }

    /// The user's session, if it is at one of `allowed`.
    fn session_at(&self, user_id: i64, allowed: &[Step]) -> Option<Session> {
        self.sessions
            .get(user_id)
            .filter(|session| allowed.contains(&session.step))
    }

    fn session_district(&self, session: &Session) -> Result<Option<District>, DomainError> {
        match &session.district {
            Some(choice) => self.catalog.find_district(choice.id),
            None => Ok(None),
        }
    }

    fn pick_district(&self, user_id: i64, id: u32) -> Result<Outcome, DomainError> {
        let Some(mut session) = self.session_at(user_id, &[Step::SelectingDistrict]) else {
            return Ok(Outcome::notice(texts::STALE_STEP));
        };
        let Some(district) = self.catalog.find_district(id)? else {
            return Ok(Outcome::notice(texts::DISTRICT_NOT_FOUND));
        };

        session.choose_district(DistrictChoice {
            id: district.id,
            name: district.name.clone(),
        });
        self.sessions.put(user_id, session);
        Ok(Outcome::reply(depth_menu(&district)))
    }

    fn pick_depth(&self, user_id: i64, depth: u32) -> Result<Outcome, DomainError> {
        let Some(mut session) = self.session_at(user_id, &[Step::SelectingDepth]) else {
            return Ok(Outcome::notice(texts::STALE_STEP));
        };
        let Some(district) = self.session_district(&session)? else {
            return Ok(Outcome::notice(texts::DISTRICT_NOT_FOUND));
        };
        if depth == 0 || !district.offers_depth(depth) {
            return Ok(Outcome::notice(texts::DEPTH_NOT_OFFERED));
        }

        session.drilling = Some(quote_drilling(&district, depth));
        session.step = Step::SelectingCategory;
        let catalog = self.catalog.equipment()?;
        let reply = category_menu(&session, &catalog);
        self.sessions.put(user_id, session);
        Ok(Outcome::reply(reply))
    }

    fn pick_category(&self, user_id: i64, category_id: &str) -> Result<Outcome, DomainError> {
        let Some(mut session) = self.session_at(user_id, &[Step::SelectingCategory]) else {
            return Ok(Outcome::notice(texts::STALE_STEP));
        };
        let catalog = self.catalog.equipment()?;
        if catalog.category(category_id).is_none() {
            return Ok(Outcome::notice(texts::CATEGORY_NOT_FOUND));
        }

        session.current_category = Some(category_id.to_string());
        session.step = Step::SelectingComponents;
        let reply = component_menu(&session, &catalog);
        self.sessions.put(user_id, session);
        Ok(Outcome::reply(reply))
    }

    fn toggle_component(&self, user_id: i64, component_id: &str) -> Result<Outcome, DomainError> {
        let Some(mut session) = self.session_at(user_id, &[Step::SelectingComponents]) else {
            return Ok(Outcome::notice(texts::STALE_STEP));
        };
        let catalog = self.catalog.equipment()?;
        let Some(category) = session
            .current_category
            .as_deref()
            .and_then(|id| catalog.category(id))
        else {
            return Ok(Outcome::notice(texts::CATEGORY_NOT_FOUND));
        };
        if category.component(component_id).is_none() {
            return Ok(Outcome::notice(texts::COMPONENT_NOT_FOUND));
        }

        let category_id = category.id.clone();
        session.selection.toggle(&category_id, component_id);
        session.equipment_cost = price_equipment(&catalog, &session.selection).equipment_cost;
        let reply = component_menu(&session, &catalog);
        self.sessions.put(user_id, session);
        Ok(Outcome::reply(reply))
    }

    fn back_to_categories(&self, user_id: i64, allowed: &[Step]) -> Result<Outcome, DomainError> {
        let Some(mut session) = self.session_at(user_id, allowed) else {
            return Ok(Outcome::notice(texts::STALE_STEP));
        };
        let catalog = self.catalog.equipment()?;

        session.current_category = None;
        session.step = Step::SelectingCategory;
        let reply = category_menu(&session, &catalog);
        self.sessions.put(user_id, session);
        Ok(Outcome::reply(reply))
    }

    /// Re-prices the whole order against current reference data and moves
    /// to confirmation.
    fn show_summary(&self, user_id: i64, mut session: Session) -> Result<Outcome, DomainError> {
        let Some(district) = self.session_district(&session)? else {
            return Ok(Outcome::notice(texts::DISTRICT_NOT_FOUND));
        };
        let Some(depth) = session.drilling.as_ref().map(|q| q.depth) else {
            return Ok(Outcome::notice(texts::STALE_STEP));
        };
        let catalog = self.catalog.equipment()?;

        let drilling = quote_drilling(&district, depth);
        let equipment = price_equipment(&catalog, &session.selection);
        let costs = CostBreakdown::new(drilling.drilling_cost.clone(), equipment.equipment_cost.clone());
        let text = texts::summary(&district.name, &drilling, &equipment.items, &costs);

        session.drilling = Some(drilling);
        session.equipment_cost = equipment.equipment_cost;
        session.step = Step::ConfirmingOrder;
        self.sessions.put(user_id, session);

        Ok(Outcome::reply(Reply::message(
            text,
            Keyboard::Inline(vec![
                vec![Button::new(texts::CONFIRM_LABEL, Action::ConfirmOrder)],
                vec![Button::new(texts::CHANGE_EQUIPMENT_LABEL, Action::BackToCategories)],
                vec![Button::new(texts::CANCEL_LABEL, Action::Cancel)],
            ]),
        )))
    }

    fn text(&self, customer: &Customer, text: String) -> Result<Outcome, DomainError> {
        let Some(session) = self.sessions.get(customer.user_id) else {
            return Ok(Outcome::reply(Reply::message(
                texts::UNKNOWN_INPUT,
                Keyboard::MainMenu,
            )));
        };

        match session.step {
            Step::EnteringContactInfo => {
                let phone = text.trim();
                if phone.is_empty() {
                    return Ok(Outcome::notice(texts::EMPTY_PHONE));
                }
                self.complete(customer, session, phone)
            }
            Step::SelectingDepth => match text.trim().parse::<u32>() {
                Ok(depth) => self.pick_depth(customer.user_id, depth),
                Err(_) => Ok(Outcome::notice(texts::BAD_DEPTH)),
            },
            _ => Ok(Outcome::notice(texts::USE_BUTTONS)),
        }
    }

    /// Turns the session into a persisted order. The session survives a
    /// failed save so the customer can resend the phone.
    fn complete(
        &self,
        customer: &Customer,
        session: Session,
        phone: &str,
    ) -> Result<Outcome, DomainError> {
        let (Some(choice), Some(drilling)) = (session.district, session.drilling) else {
            return Ok(Outcome::notice(texts::STALE_STEP));
        };
        let catalog = self.catalog.equipment()?;
        let equipment = price_equipment(&catalog, &session.selection);
        let costs = CostBreakdown::new(drilling.drilling_cost.clone(), equipment.equipment_cost);

        let order = Order {
            id: new_order_id(),
            user_id: customer.user_id,
            username: customer.username.clone(),
            full_name: customer.full_name.clone(),
            phone: phone.to_string(),
            district_id: choice.id,
            district_name: choice.name,
            depth: drilling.depth,
            ground_type: drilling.ground_type,
            price_per_meter: drilling.price_per_meter,
            drilling_cost: costs.drilling_cost,
            equipment: equipment.items,
            equipment_cost: costs.equipment_cost,
            total_cost: costs.total_cost,
            created_at: Utc::now(),
            status: OrderStatus::New,
        };

        if let Err(e) = self.orders.create(&order) {
            log::error!("Failed to save order for user {}: {}", customer.user_id, e);
            return Ok(Outcome::notice(texts::SAVE_FAILED));
        }
        self.sessions.remove(customer.user_id);
        log::info!(
            "Order {} placed by user {} for {} ₽",
            order.id,
            order.user_id,
            format_money(&order.total_cost)
        );

        Ok(Outcome {
            replies: vec![Reply::message(texts::order_placed(&order), Keyboard::MainMenu)],
            placed: Some(order),
        })
    }

    fn my_orders(&self, user_id: i64) -> Result<Outcome, DomainError> {
        let filter = OrderFilter {
            user_id: Some(user_id),
            ..OrderFilter::default()
        };
        let mut orders: Vec<Order> = self
            .orders
            .list()?
            .into_iter()
            .filter(|o| filter.matches(o))
            .collect();
        if orders.is_empty() {
            return Ok(Outcome::reply(Reply::message(
                texts::NO_ORDERS,
                Keyboard::MainMenu,
            )));
        }
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let replies = orders
            .iter()
            .take(RECENT_ORDERS)
            .map(|order| {
                Reply::message(
                    texts::order_card(order),
                    Keyboard::Inline(vec![vec![Button::new(
                        texts::DOWNLOAD_REPORT_LABEL,
                        Action::DownloadReport(order.id.clone()),
                    )]]),
                )
            })
            .collect();
        Ok(Outcome {
            replies,
            placed: None,
        })
    }

    fn download_report(&self, user_id: i64, order_id: &str) -> Result<Outcome, DomainError> {
        let Some(order) = self.orders.find_by_id(order_id)? else {
            return Ok(Outcome::notice(texts::ORDER_NOT_FOUND));
        };
        if order.user_id != user_id {
            return Ok(Outcome::notice(texts::ORDER_NOT_YOURS));
        }

        // Rendered fresh so the sheet shows the current status.
        let path = match self.reports.render(&order) {
            Ok(path) => path,
            Err(e) => {
                log::warn!("Failed to render report for order {}: {}", order.id, e);
                return Ok(Outcome::notice(texts::REPORT_FAILED));
            }
        };
        Ok(Outcome::reply(Reply::Document {
            path,
            caption: texts::report_caption(&order.id),
        }))
    }
}

fn district_menu(districts: &[District]) -> Reply {
    let mut rows: Vec<Vec<Button>> = districts
        .iter()
        .map(|d| vec![Button::new(d.name.clone(), Action::PickDistrict(d.id))])
        .collect();
    rows.push(vec![Button::new(texts::CANCEL_LABEL, Action::Cancel)]);
    Reply::message(texts::CHOOSE_DISTRICT, Keyboard::Inline(rows))
}

fn depth_menu(district: &District) -> Reply {
    let mut rows: Vec<Vec<Button>> = district
        .depths
        .chunks(2)
        .map(|pair| {
            pair.iter()
                .map(|&depth| Button::new(texts::depth_button(district, depth), Action::PickDepth(depth)))
                .collect()
        })
        .collect();
    rows.push(vec![
        Button::new(texts::BACK_LABEL, Action::BackToDistricts),
        Button::new(texts::CANCEL_LABEL, Action::Cancel),
    ]);
    Reply::message(texts::choose_depth(&district.name), Keyboard::Inline(rows))
}

fn category_menu(session: &Session, catalog: &EquipmentCatalog) -> Reply {
    let district_name = session.district.as_ref().map_or("", |d| d.name.as_str());
    let text = match &session.drilling {
        Some(quote) => texts::choose_equipment(
            district_name,
            quote,
            &format_money(&session.running_total()),
        ),
        None => texts::CHOOSE_DISTRICT.to_string(),
    };

    let mut rows: Vec<Vec<Button>> = catalog
        .categories
        .iter()
        .map(|c| {
            vec![Button::new(
                texts::category_button(&c.name, session.selection.count_in(&c.id)),
                Action::PickCategory(c.id.clone()),
            )]
        })
        .collect();
    rows.push(vec![Button::new(texts::FINISH_EQUIPMENT_LABEL, Action::FinishEquipment)]);
    rows.push(vec![
        Button::new(texts::BACK_LABEL, Action::BackToDepth),
        Button::new(texts::CANCEL_LABEL, Action::Cancel),
    ]);
    Reply::message(text, Keyboard::Inline(rows))
}

fn component_menu(session: &Session, catalog: &EquipmentCatalog) -> Reply {
    let Some(category) = session
        .current_category
        .as_deref()
        .and_then(|id| catalog.category(id))
    else {
        return category_menu(session, catalog);
    };

    let mut rows: Vec<Vec<Button>> = category
        .components
        .iter()
        .map(|c| {
            vec![Button::new(
                texts::component_button(
                    &c.name,
                    &format_money(&c.price),
                    session.selection.is_selected(&category.id, &c.id),
                ),
                Action::ToggleComponent(c.id.clone()),
            )]
        })
        .collect();
    rows.push(vec![Button::new(texts::DONE_LABEL, Action::DoneComponents)]);
    rows.push(vec![
        Button::new(texts::BACK_LABEL, Action::BackToCategories),
        Button::new(texts::CANCEL_LABEL, Action::Cancel),
    ]);
    Reply::message(texts::choose_components(&category.name), Keyboard::Inline(rows))
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    use bigdecimal::{BigDecimal, Zero};
    use tempfile::TempDir;

    use super::*;
    use crate::domain::catalog::{Component, EquipmentCategory, GroundBand};
    use crate::infrastructure::catalog_repo::JsonCatalogRepository;
    use crate::infrastructure::models::{DataStore, DistrictsDocument};
    use crate::infrastructure::order_repo::JsonOrderRepository;
    use crate::infrastructure::report::PdfReportRenderer;
    use crate::infrastructure::session_store::InMemorySessionStore;

    struct Harness {
        _dir: TempDir,
        store: DataStore,
        sessions: Arc<InMemorySessionStore>,
        orders: Arc<JsonOrderRepository>,
        conversation: Conversation,
    }

    fn district(id: u32, name: &str) -> District {
        District {
            id,
            name: name.to_string(),
            base_price: BigDecimal::from(500),
            depths: vec![30, 50, 80],
            ground_bands: vec![GroundBand {
                name: "Песок".to_string(),
                min_depth: 40,
                max_depth: 60,
                price_per_meter: BigDecimal::from(450),
            }],
        }
    }

    fn harness() -> Harness {
        harness_with(
            |repo| repo as Arc<dyn OrderRepository>,
            |dir| Arc::new(PdfReportRenderer::new(dir.join("reports"))) as Arc<dyn ReportRenderer>,
        )
    }

    fn harness_with(
        orders_port: impl FnOnce(Arc<JsonOrderRepository>) -> Arc<dyn OrderRepository>,
        reports: impl FnOnce(&Path) -> Arc<dyn ReportRenderer>,
    ) -> Harness {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = DataStore::open(dir.path());
        store
            .districts
            .save(&DistrictsDocument {
                districts: vec![district(1, "Север"), district(2, "Юг")],
            })
            .expect("seed districts");
        store
            .equipment
            .save(&EquipmentCatalog {
                categories: vec![EquipmentCategory {
                    id: "pumps".to_string(),
                    name: "Насосы".to_string(),
                    components: vec![
                        Component {
                            id: "pump".to_string(),
                            name: "Насос".to_string(),
                            price: BigDecimal::from(3000),
                        },
                        Component {
                            id: "cable".to_string(),
                            name: "Кабель".to_string(),
                            price: BigDecimal::from(700),
                        },
                    ],
                }],
            })
            .expect("seed equipment");

        let sessions = Arc::new(InMemorySessionStore::new());
        let orders = Arc::new(JsonOrderRepository::new(store.orders.clone()));
        let conversation = Conversation::new(
            Arc::new(JsonCatalogRepository::new(
                store.districts.clone(),
                store.equipment.clone(),
            )),
            orders_port(orders.clone()),
            sessions.clone(),
            reports(dir.path()),
        );

        Harness {
            _dir: dir,
            store,
            sessions,
            orders,
            conversation,
        }
    }

    fn customer() -> Customer {
        Customer {
            user_id: 42,
            username: Some("driller".to_string()),
            full_name: "Иван Петров".to_string(),
        }
    }

    impl Harness {
        fn send(&self, action: Action) -> Outcome {
            self.conversation.handle(&customer(), action).expect("handled")
        }

        fn session(&self) -> Option<Session> {
            self.sessions.get(customer().user_id)
        }

        /// District 1, depth 50, pump selected, at the summary.
        fn up_to_summary(&self) {
            self.send(Action::NewOrder);
            self.send(Action::PickDistrict(1));
            self.send(Action::PickDepth(50));
            self.send(Action::PickCategory("pumps".to_string()));
            self.send(Action::ToggleComponent("pump".to_string()));
            self.send(Action::DoneComponents);
            self.send(Action::FinishEquipment);
        }
    }

    /// Order storage that refuses writes while `failing` is set.
    struct FlakyOrders {
        inner: Arc<JsonOrderRepository>,
        failing: Arc<AtomicBool>,
    }

    impl OrderRepository for FlakyOrders {
        fn create(&self, order: &Order) -> Result<(), DomainError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(DomainError::Transient("disk full".to_string()));
            }
            self.inner.create(order)
        }

        fn find_by_id(&self, id: &str) -> Result<Option<Order>, DomainError> {
            self.inner.find_by_id(id)
        }

        fn list(&self) -> Result<Vec<Order>, DomainError> {
            self.inner.list()
        }

        fn update_status(&self, id: &str, status: OrderStatus) -> Result<Order, DomainError> {
            self.inner.update_status(id, status)
        }
    }

    /// Remembers the status of every order it renders.
    struct StatusRecorder {
        dir: PathBuf,
        rendered: Mutex<Vec<OrderStatus>>,
    }

    impl ReportRenderer for StatusRecorder {
        fn render(&self, order: &Order) -> Result<PathBuf, DomainError> {
            self.rendered.lock().unwrap().push(order.status);
            let path = self.dir.join(format!("order_{}.pdf", order.id));
            std::fs::write(&path, order.status.as_str()).unwrap();
            Ok(path)
        }
    }

    fn is_notice(outcome: &Outcome) -> bool {
        matches!(outcome.replies.as_slice(), [Reply::Notice(_)])
    }

    #[test]
    fn full_flow_places_priced_order() {
        let h = harness();
        h.up_to_summary();
        assert_eq!(h.session().map(|s| s.step), Some(Step::ConfirmingOrder));

        h.send(Action::ConfirmOrder);
        let outcome = h.send(Action::Text("+7 999 123-45-67".to_string()));

        let order = outcome.placed.expect("order placed");
        assert_eq!(order.drilling_cost, BigDecimal::from(22500));
        assert_eq!(order.equipment_cost, BigDecimal::from(3000));
        assert_eq!(order.total_cost, BigDecimal::from(25500));
        assert_eq!(order.ground_type.as_deref(), Some("Песок"));
        assert_eq!(order.phone, "+7 999 123-45-67");
        assert_eq!(order.username.as_deref(), Some("driller"));
        assert!(h.session().is_none());
        assert_eq!(h.orders.find_by_id(&order.id).unwrap(), Some(order));
    }

    #[test]
    fn total_is_drilling_plus_equipment_for_any_selection() {
        let selections: [&[&str]; 4] = [&[], &["pump"], &["cable"], &["pump", "cable"]];
        for picks in selections {
            let h = harness();
            h.send(Action::NewOrder);
            h.send(Action::PickDistrict(2));
            h.send(Action::PickDepth(80));
            h.send(Action::PickCategory("pumps".to_string()));
            for id in picks {
                h.send(Action::ToggleComponent(id.to_string()));
            }
            h.send(Action::DoneComponents);
            h.send(Action::FinishEquipment);
            h.send(Action::ConfirmOrder);
            let order = h
                .send(Action::Text("+7".to_string()))
                .placed
                .expect("order placed");

            assert_eq!(order.drilling_cost, BigDecimal::from(40000));
            assert_eq!(order.equipment.len(), picks.len());
            assert_eq!(order.total_cost, &order.drilling_cost + &order.equipment_cost);
        }
    }

    #[test]
    fn cancel_from_any_step_leaves_no_session() {
        let steps: Vec<Vec<Action>> = vec![
            vec![Action::NewOrder],
            vec![Action::NewOrder, Action::PickDistrict(1)],
            vec![Action::NewOrder, Action::PickDistrict(1), Action::PickDepth(30)],
            vec![
                Action::NewOrder,
                Action::PickDistrict(1),
                Action::PickDepth(30),
                Action::PickCategory("pumps".to_string()),
            ],
            vec![
                Action::NewOrder,
                Action::PickDistrict(1),
                Action::PickDepth(30),
                Action::FinishEquipment,
                Action::ConfirmOrder,
            ],
        ];

        for path in steps {
            let h = harness();
            for action in path {
                h.send(action);
            }
            assert!(h.session().is_some());

            let outcome = h.send(Action::Cancel);

            assert!(h.session().is_none());
            assert!(matches!(
                outcome.replies.as_slice(),
                [Reply::Message { keyboard: Keyboard::MainMenu, .. }]
            ));
        }
    }

    #[test]
    fn reselecting_district_clears_depth_and_equipment() {
        let h = harness();
        h.send(Action::NewOrder);
        h.send(Action::PickDistrict(1));
        h.send(Action::PickDepth(50));
        h.send(Action::PickCategory("pumps".to_string()));
        h.send(Action::ToggleComponent("pump".to_string()));
        h.send(Action::BackToCategories);
        h.send(Action::BackToDepth);
        h.send(Action::BackToDistricts);

        let kept = h.session().expect("session");
        assert!(kept.drilling.is_some());
        assert!(!kept.selection.is_empty());

        h.send(Action::PickDistrict(2));

        let session = h.session().expect("session");
        assert_eq!(session.step, Step::SelectingDepth);
        assert!(session.drilling.is_none());
        assert!(session.selection.is_empty());
        assert_eq!(session.equipment_cost, BigDecimal::zero());
    }

    #[test]
    fn toggling_updates_running_cost() {
        let h = harness();
        h.send(Action::NewOrder);
        h.send(Action::PickDistrict(1));
        h.send(Action::PickDepth(50));
        h.send(Action::PickCategory("pumps".to_string()));

        h.send(Action::ToggleComponent("pump".to_string()));
        h.send(Action::ToggleComponent("cable".to_string()));
        assert_eq!(h.session().unwrap().equipment_cost, BigDecimal::from(3700));

        h.send(Action::ToggleComponent("pump".to_string()));
        let session = h.session().unwrap();
        assert_eq!(session.equipment_cost, BigDecimal::from(700));
        assert_eq!(session.running_total(), BigDecimal::from(23200));
    }

    #[test]
    fn unknown_references_leave_session_unchanged() {
        let h = harness();
        h.send(Action::NewOrder);
        let before = h.session();

        assert!(is_notice(&h.send(Action::PickDistrict(99))));
        assert_eq!(h.session(), before);

        h.send(Action::PickDistrict(1));
        let before = h.session();
        assert!(is_notice(&h.send(Action::PickDepth(55))));
        assert_eq!(h.session(), before);

        h.send(Action::PickDepth(50));
        let before = h.session();
        assert!(is_notice(&h.send(Action::PickCategory("ghost".to_string()))));
        assert_eq!(h.session(), before);

        h.send(Action::PickCategory("pumps".to_string()));
        let before = h.session();
        assert!(is_notice(&h.send(Action::ToggleComponent("ghost".to_string()))));
        assert_eq!(h.session(), before);
    }

    #[test]
    fn out_of_order_action_is_a_notice() {
        let h = harness();
        assert!(is_notice(&h.send(Action::PickDepth(50))));
        assert!(h.session().is_none());

        h.send(Action::NewOrder);
        assert!(is_notice(&h.send(Action::ConfirmOrder)));
        assert_eq!(h.session().map(|s| s.step), Some(Step::SelectingDistrict));
    }

    #[test]
    fn typed_depth_is_accepted() {
        let h = harness();
        h.send(Action::NewOrder);
        h.send(Action::PickDistrict(1));

        h.send(Action::Text("30".to_string()));

        let session = h.session().expect("session");
        assert_eq!(session.step, Step::SelectingCategory);
        assert_eq!(session.drilling_cost(), BigDecimal::from(15000));
    }

    #[test]
    fn blank_phone_is_rejected() {
        let h = harness();
        h.up_to_summary();
        h.send(Action::ConfirmOrder);

        let outcome = h.send(Action::Text("   ".to_string()));

        assert!(outcome.placed.is_none());
        assert_eq!(h.session().map(|s| s.step), Some(Step::EnteringContactInfo));
    }

    #[test]
    fn summary_reprices_against_current_catalog() {
        let h = harness();
        h.send(Action::NewOrder);
        h.send(Action::PickDistrict(1));
        h.send(Action::PickDepth(50));
        h.send(Action::PickCategory("pumps".to_string()));
        h.send(Action::ToggleComponent("pump".to_string()));
        h.send(Action::DoneComponents);

        h.store
            .equipment
            .update(|catalog| {
                catalog.categories[0].components[0].price = BigDecimal::from(3500);
                Ok(())
            })
            .expect("reprice");
        h.send(Action::FinishEquipment);

        assert_eq!(h.session().unwrap().running_total(), BigDecimal::from(26000));
    }

    #[test]
    fn back_to_summary_keeps_choices() {
        let h = harness();
        h.up_to_summary();
        h.send(Action::ConfirmOrder);

        h.send(Action::BackToSummary);

        let session = h.session().expect("session");
        assert_eq!(session.step, Step::ConfirmingOrder);
        assert_eq!(session.running_total(), BigDecimal::from(25500));
    }

    #[test]
    fn my_orders_lists_with_report_buttons() {
        let h = harness();
        assert!(matches!(
            h.send(Action::MyOrders).replies.as_slice(),
            [Reply::Message { .. }]
        ));

        h.up_to_summary();
        h.send(Action::ConfirmOrder);
        let order = h.send(Action::Text("+7".to_string())).placed.unwrap();

        let outcome = h.send(Action::MyOrders);
        let Some(Reply::Message {
            keyboard: Keyboard::Inline(rows),
            ..
        }) = outcome.replies.first()
        else {
            panic!("expected an order card, got {:?}", outcome.replies);
        };
        assert_eq!(rows[0][0].action, Action::DownloadReport(order.id.clone()));
    }

    #[test]
    fn report_download_checks_ownership() {
        let h = harness();
        h.up_to_summary();
        h.send(Action::ConfirmOrder);
        let order = h.send(Action::Text("+7".to_string())).placed.unwrap();

        let outcome = h.send(Action::DownloadReport(order.id.clone()));
        let Some(Reply::Document { path, .. }) = outcome.replies.first() else {
            panic!("expected a document, got {:?}", outcome.replies);
        };
        assert!(path.is_file());

        let stranger = Customer {
            user_id: 7,
            username: None,
            full_name: "Чужой".to_string(),
        };
        let outcome = h
            .conversation
            .handle(&stranger, Action::DownloadReport(order.id))
            .unwrap();
        assert!(is_notice(&outcome));

        assert!(is_notice(&h.send(Action::DownloadReport("NOPE0000".to_string()))));
    }

    #[test]
    fn failed_save_keeps_session_for_retry() {
        let failing = Arc::new(AtomicBool::new(true));
        let h = harness_with(
            {
                let failing = failing.clone();
                move |inner| Arc::new(FlakyOrders { inner, failing }) as Arc<dyn OrderRepository>
            },
            |dir| Arc::new(PdfReportRenderer::new(dir.join("reports"))) as Arc<dyn ReportRenderer>,
        );
        h.up_to_summary();
        h.send(Action::ConfirmOrder);

        let outcome = h.send(Action::Text("+7 999 123-45-67".to_string()));

        assert_eq!(
            outcome.replies,
            vec![Reply::Notice(texts::SAVE_FAILED.to_string())]
        );
        assert!(outcome.placed.is_none());
        assert_eq!(h.session().map(|s| s.step), Some(Step::EnteringContactInfo));
        assert!(h.orders.list().unwrap().is_empty());

        failing.store(false, Ordering::SeqCst);
        let outcome = h.send(Action::Text("+7 999 123-45-67".to_string()));

        let order = outcome.placed.expect("order placed on retry");
        assert_eq!(order.total_cost, BigDecimal::from(25500));
        assert!(h.session().is_none());
        assert_eq!(h.orders.list().unwrap(), vec![order]);
    }

    #[test]
    fn report_download_shows_current_status() {
        let reports_dir = tempfile::tempdir().expect("tempdir");
        let recorder = Arc::new(StatusRecorder {
            dir: reports_dir.path().to_path_buf(),
            rendered: Mutex::new(vec![]),
        });
        let h = harness_with(|repo| repo as Arc<dyn OrderRepository>, {
            let recorder = recorder.clone();
            move |_| recorder as Arc<dyn ReportRenderer>
        });
        h.up_to_summary();
        h.send(Action::ConfirmOrder);
        let order = h.send(Action::Text("+7".to_string())).placed.unwrap();

        h.send(Action::DownloadReport(order.id.clone()));
        h.orders.update_status(&order.id, OrderStatus::Completed).unwrap();
        h.send(Action::DownloadReport(order.id.clone()));

        assert_eq!(
            *recorder.rendered.lock().unwrap(),
            vec![OrderStatus::New, OrderStatus::Completed]
        );
    }
}
