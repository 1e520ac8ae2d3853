use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::application::conversation::{texts, Action, Conversation, Keyboard, Outcome, Reply};
use crate::application::follow_up::OrderFollowUp;
use crate::domain::order::Customer;

use super::telegram::{TelegramClient, Update};

const RETRY_DELAY: Duration = Duration::from_secs(5);

/// One decoded update, ready for the conversation.
#[derive(Debug, PartialEq)]
pub struct Inbound {
    pub chat_id: i64,
    pub customer: Customer,
    /// `None` for callbacks whose data no longer decodes.
    pub action: Option<Action>,
    pub callback_id: Option<String>,
}

/// Messages without a sender or text (stickers, joins, ...) are dropped.
pub fn decode(update: Update) -> Option<Inbound> {
    if let Some(callback) = update.callback_query {
        let chat_id = callback
            .message
            .as_ref()
            .map_or(callback.from.id, |m| m.chat.id);
        return Some(Inbound {
            chat_id,
            customer: callback.from.customer(),
            action: callback.data.as_deref().and_then(Action::from_callback_data),
            callback_id: Some(callback.id),
        });
    }

    let message = update.message?;
    let from = message.from?;
    let text = message.text?;
    Some(Inbound {
        chat_id: message.chat.id,
        customer: from.customer(),
        action: Some(Action::from_text(&text)),
        callback_id: None,
    })
}

/// Long-polls Telegram and feeds updates through the conversation, one at a
/// time.
pub struct Dispatcher {
    client: Arc<TelegramClient>,
    conversation: Arc<Conversation>,
    follow_up: OrderFollowUp,
    poll_timeout_secs: u64,
}

impl Dispatcher {
    pub fn new(
        client: Arc<TelegramClient>,
        conversation: Arc<Conversation>,
        follow_up: OrderFollowUp,
        poll_timeout_secs: u64,
    ) -> Self {
        Self {
            client,
            conversation,
            follow_up,
            poll_timeout_secs,
        }
    }

    pub async fn run(self) {
        log::info!("Bot polling started");
        let mut offset = 0;
        loop {
            match self.client.get_updates(offset, self.poll_timeout_secs).await {
                Ok(updates) => {
                    for update in updates {
                        offset = offset.max(update.update_id + 1);
                        if let Some(inbound) = decode(update) {
                            self.process(inbound).await;
                        }
                    }
                }
                Err(e) => {
                    log::warn!("Polling failed, retrying in {:?}: {}", RETRY_DELAY, e);
                    tokio::time::sleep(RETRY_DELAY).await;
                }
            }
        }
    }

    /// Returns the follow-up task when the update placed an order.
    async fn process(&self, inbound: Inbound) -> Option<JoinHandle<()>> {
        let Inbound {
            chat_id,
            customer,
            action,
            callback_id,
        } = inbound;

        let outcome = match action {
            Some(action) => self.handle(customer, action).await,
            None => Outcome::notice(texts::STALE_STEP),
        };

        // A notice answering a button press shows as a toast instead of a
        // message.
        let mut toast = None;
        for reply in outcome.replies {
            match reply {
                Reply::Notice(text) if callback_id.is_some() && toast.is_none() => {
                    toast = Some(text)
                }
                reply => self.deliver(chat_id, reply).await,
            }
        }
        if let Some(id) = callback_id {
            if let Err(e) = self.client.answer_callback_query(&id, toast.as_deref()).await {
                log::warn!("Failed to answer callback {}: {}", id, e);
            }
        }

        outcome.placed.map(|order| self.follow_up.dispatch(order))
    }

    async fn handle(&self, customer: Customer, action: Action) -> Outcome {
        let conversation = self.conversation.clone();
        let user_id = customer.user_id;
        match tokio::task::spawn_blocking(move || conversation.handle(&customer, action)).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => {
                log::error!("Conversation failed for user {}: {}", user_id, e);
                Outcome::notice(texts::SOMETHING_WENT_WRONG)
            }
            Err(e) => {
                log::error!("Conversation task for user {} panicked: {}", user_id, e);
                Outcome::notice(texts::SOMETHING_WENT_WRONG)
            }
        }
    }

    async fn deliver(&self, chat_id: i64, reply: Reply) {
        let result = match &reply {
            Reply::Message { text, keyboard } => {
                self.client.send_message(chat_id, text, keyboard).await
            }
            Reply::Notice(text) => self.client.send_message(chat_id, text, &Keyboard::None).await,
            Reply::Document { path, caption } => {
                self.client.send_document(chat_id, path, caption).await
            }
        };
        if let Err(e) = result {
            log::warn!("Failed to deliver reply to chat {}: {}", chat_id, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use bigdecimal::BigDecimal;
    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;
    use crate::domain::catalog::District;
    use crate::domain::ports::ReportRenderer;
    use crate::infrastructure::catalog_repo::JsonCatalogRepository;
    use crate::infrastructure::models::{DataStore, DistrictsDocument};
    use crate::infrastructure::order_repo::JsonOrderRepository;
    use crate::infrastructure::report::PdfReportRenderer;
    use crate::infrastructure::session_store::InMemorySessionStore;

    const OPERATOR_CHAT: i64 = -100;

    fn dispatcher(server: &MockServer, dir: &Path) -> (Dispatcher, Arc<Conversation>) {
        let store = DataStore::open(dir);
        store
            .districts
            .save(&DistrictsDocument {
                districts: vec![District {
                    id: 1,
                    name: "Север".to_string(),
                    base_price: BigDecimal::from(500),
                    depths: vec![50],
                    ground_bands: vec![],
                }],
            })
            .unwrap();

        let client = Arc::new(TelegramClient::new(&server.base_url(), "TOKEN"));
        let reports: Arc<dyn ReportRenderer> =
            Arc::new(PdfReportRenderer::new(dir.join("reports")));
        let conversation = Arc::new(Conversation::new(
            Arc::new(JsonCatalogRepository::new(
                store.districts.clone(),
                store.equipment.clone(),
            )),
            Arc::new(JsonOrderRepository::new(store.orders.clone())),
            Arc::new(InMemorySessionStore::new()),
            reports.clone(),
        ));
        let follow_up = OrderFollowUp::new(reports, client.clone(), Some(OPERATOR_CHAT));
        (
            Dispatcher::new(client, conversation.clone(), follow_up, 0),
            conversation,
        )
    }

    fn customer() -> Customer {
        Customer {
            user_id: 42,
            username: None,
            full_name: "Иван".to_string(),
        }
    }

    fn inbound(action: Option<Action>, callback_id: Option<&str>) -> Inbound {
        Inbound {
            chat_id: 42,
            customer: customer(),
            action,
            callback_id: callback_id.map(str::to_string),
        }
    }

    fn sent_ok() -> serde_json::Value {
        json!({ "ok": true, "result": { "message_id": 1 } })
    }

    #[tokio::test]
    async fn stale_button_is_answered_with_a_toast() {
        let dir = tempfile::tempdir().unwrap();
        let server = MockServer::start();
        let toast = server.mock(|when, then| {
            when.method(POST)
                .path("/botTOKEN/answerCallbackQuery")
                .json_body_partial(
                    json!({ "callback_query_id": "cb1", "text": texts::STALE_STEP }).to_string(),
                );
            then.status(200).json_body(json!({ "ok": true, "result": true }));
        });
        let messages = server.mock(|when, then| {
            when.method(POST).path("/botTOKEN/sendMessage");
            then.status(200).json_body(sent_ok());
        });
        let (dispatcher, _) = dispatcher(&server, dir.path());

        let follow_up = dispatcher.process(inbound(None, Some("cb1"))).await;

        assert!(follow_up.is_none());
        toast.assert();
        messages.assert_hits(0);
    }

    #[tokio::test]
    async fn conversation_notice_on_button_becomes_toast() {
        let dir = tempfile::tempdir().unwrap();
        let server = MockServer::start();
        let toast = server.mock(|when, then| {
            when.method(POST)
                .path("/botTOKEN/answerCallbackQuery")
                .json_body_partial(
                    json!({ "callback_query_id": "cb2", "text": texts::STALE_STEP }).to_string(),
                );
            then.status(200).json_body(json!({ "ok": true, "result": true }));
        });
        let messages = server.mock(|when, then| {
            when.method(POST).path("/botTOKEN/sendMessage");
            then.status(200).json_body(sent_ok());
        });
        let (dispatcher, _) = dispatcher(&server, dir.path());

        dispatcher
            .process(inbound(Some(Action::ConfirmOrder), Some("cb2")))
            .await;

        toast.assert();
        messages.assert_hits(0);
    }

    #[tokio::test]
    async fn notice_for_typed_text_is_sent_as_message() {
        let dir = tempfile::tempdir().unwrap();
        let server = MockServer::start();
        let message = server.mock(|when, then| {
            when.method(POST)
                .path("/botTOKEN/sendMessage")
                .json_body_partial(json!({ "chat_id": 42, "text": texts::STALE_STEP }).to_string());
            then.status(200).json_body(sent_ok());
        });
        let callbacks = server.mock(|when, then| {
            when.method(POST).path("/botTOKEN/answerCallbackQuery");
            then.status(200).json_body(json!({ "ok": true, "result": true }));
        });
        let (dispatcher, _) = dispatcher(&server, dir.path());

        dispatcher.process(inbound(Some(Action::ConfirmOrder), None)).await;

        message.assert();
        callbacks.assert_hits(0);
    }

    #[tokio::test]
    async fn placed_order_reaches_customer_and_operator() {
        let dir = tempfile::tempdir().unwrap();
        let server = MockServer::start();
        let confirmation = server.mock(|when, then| {
            when.method(POST)
                .path("/botTOKEN/sendMessage")
                .json_body_partial(json!({ "chat_id": 42 }).to_string());
            then.status(200).json_body(sent_ok());
        });
        let operator = server.mock(|when, then| {
            when.method(POST)
                .path("/botTOKEN/sendMessage")
                .json_body_partial(json!({ "chat_id": OPERATOR_CHAT }).to_string());
            then.status(200).json_body(sent_ok());
        });
        let documents = server.mock(|when, then| {
            when.method(POST).path("/botTOKEN/sendDocument");
            then.status(200).json_body(sent_ok());
        });
        let (dispatcher, conversation) = dispatcher(&server, dir.path());
        for action in [
            Action::NewOrder,
            Action::PickDistrict(1),
            Action::PickDepth(50),
            Action::FinishEquipment,
            Action::ConfirmOrder,
        ] {
            conversation.handle(&customer(), action).unwrap();
        }

        let follow_up = dispatcher
            .process(inbound(Some(Action::Text("+7 999 123-45-67".to_string())), None))
            .await
            .expect("order placed");
        follow_up.await.unwrap();

        confirmation.assert();
        operator.assert();
        documents.assert_hits(2);
        assert!(dir.path().join("reports").read_dir().unwrap().next().is_some());
    }

    fn update(json: serde_json::Value) -> Update {
        serde_json::from_value(json).expect("valid update")
    }

    #[test]
    fn text_message_becomes_action() {
        let inbound = decode(update(serde_json::json!({
            "update_id": 1,
            "message": {
                "message_id": 10,
                "chat": { "id": 500 },
                "from": { "id": 42, "first_name": "Иван", "last_name": "Петров" },
                "text": "/cancel"
            }
        })))
        .expect("decoded");

        assert_eq!(inbound.chat_id, 500);
        assert_eq!(inbound.customer.full_name, "Иван Петров");
        assert_eq!(inbound.action, Some(Action::Cancel));
        assert_eq!(inbound.callback_id, None);
    }

    #[test]
    fn callback_carries_its_id() {
        let inbound = decode(update(serde_json::json!({
            "update_id": 2,
            "callback_query": {
                "id": "cb9",
                "from": { "id": 42, "first_name": "Иван" },
                "message": { "message_id": 11, "chat": { "id": 500 } },
                "data": "comp:pump"
            }
        })))
        .expect("decoded");

        assert_eq!(inbound.chat_id, 500);
        assert_eq!(inbound.action, Some(Action::ToggleComponent("pump".to_string())));
        assert_eq!(inbound.callback_id.as_deref(), Some("cb9"));
    }

    #[test]
    fn stale_callback_data_decodes_without_action() {
        let inbound = decode(update(serde_json::json!({
            "update_id": 3,
            "callback_query": {
                "id": "cb10",
                "from": { "id": 42, "first_name": "Иван" },
                "data": "select_adapter_1"
            }
        })))
        .expect("decoded");

        assert_eq!(inbound.chat_id, 42);
        assert_eq!(inbound.action, None);
    }

    #[test]
    fn message_without_text_is_dropped() {
        assert!(decode(update(serde_json::json!({
            "update_id": 4,
            "message": {
                "message_id": 12,
                "chat": { "id": 500 },
                "from": { "id": 42, "first_name": "Иван" }
            }
        })))
        .is_none());
    }
}
