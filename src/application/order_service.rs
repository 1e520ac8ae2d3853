use bigdecimal::{BigDecimal, Zero};

use crate::domain::errors::DomainError;
use crate::domain::order::{
    DateRange, ListResult, Order, OrderFilter, OrderStats, OrderStatus, Tally,
};
use crate::domain::ports::OrderRepository;

const TOP_EQUIPMENT: usize = 10;

pub struct OrderService<R> {
    repo: R,
}

impl<R: OrderRepository> OrderService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn create_order(&self, order: &Order) -> Result<(), DomainError> {
        self.repo.create(order)
    }

    pub fn get_order(&self, id: &str) -> Result<Option<Order>, DomainError> {
        self.repo.find_by_id(id)
    }

    /// Newest first, then one page of `limit` orders.
    pub fn list_orders(
        &self,
        filter: &OrderFilter,
        page: i64,
        limit: i64,
    ) -> Result<ListResult, DomainError> {
        let matching = self.matching(filter)?;
        let total = matching.len() as i64;
        let limit = limit.max(1);
        // Pages past the end are empty, even when page * limit overflows.
        let offset = page
            .max(1)
            .saturating_sub(1)
            .saturating_mul(limit);
        let offset = usize::try_from(offset).unwrap_or(usize::MAX);

        Ok(ListResult {
            items: matching
                .into_iter()
                .skip(offset)
                .take(usize::try_from(limit).unwrap_or(usize::MAX))
                .collect(),
            total,
        })
    }

    pub fn user_orders(&self, user_id: i64) -> Result<Vec<Order>, DomainError> {
        self.matching(&OrderFilter {
            user_id: Some(user_id),
            ..OrderFilter::default()
        })
    }

    pub fn update_status(&self, id: &str, status: OrderStatus) -> Result<Order, DomainError> {
        let order = self.repo.update_status(id, status)?;
        log::info!("Order {} moved to status {}", order.id, order.status);
        Ok(order)
    }

    pub fn stats(&self, range: DateRange) -> Result<OrderStats, DomainError> {
        let orders = self.matching(&OrderFilter {
            created: range,
            ..OrderFilter::default()
        })?;
        Ok(summarize(&orders))
    }

    fn matching(&self, filter: &OrderFilter) -> Result<Vec<Order>, DomainError> {
        let mut orders: Vec<Order> = self
            .repo
            .list()?
            .into_iter()
            .filter(|o| filter.matches(o))
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }
}

fn summarize(orders: &[Order]) -> OrderStats {
    let total_orders = orders.len();
    let total_revenue = orders
        .iter()
        .fold(BigDecimal::zero(), |acc, o| acc + &o.total_cost);
    let avg_order_cost = if total_orders == 0 {
        BigDecimal::zero()
    } else {
        (&total_revenue / BigDecimal::from(total_orders as u64)).round(2)
    };
    let avg_depth = if total_orders == 0 {
        0.0
    } else {
        let sum: u64 = orders.iter().map(|o| u64::from(o.depth)).sum();
        ((sum as f64 / total_orders as f64) * 100.0).round() / 100.0
    };

    let mut popular_equipment = most_common(
        orders
            .iter()
            .flat_map(|o| o.equipment.iter().map(|item| item.component_name.clone())),
    );
    popular_equipment.truncate(TOP_EQUIPMENT);

    OrderStats {
        total_orders,
        popular_districts: most_common(orders.iter().map(|o| o.district_name.clone())),
        popular_depths: most_common(orders.iter().map(|o| o.depth)),
        popular_equipment,
        total_revenue,
        avg_order_cost,
        avg_depth,
    }
}

/// Counts occurrences, most frequent first; ties keep first-seen order.
fn most_common<K: PartialEq>(keys: impl Iterator<Item = K>) -> Vec<Tally<K>> {
    let mut tallies: Vec<Tally<K>> = Vec::new();
    for key in keys {
        match tallies.iter_mut().find(|t| t.key == key) {
            Some(tally) => tally.count += 1,
            None => tallies.push(Tally { key, count: 1 }),
        }
    }
    tallies.sort_by(|a, b| b.count.cmp(&a.count));
    tallies
}
