use std::sync::Arc;

use crate::domain::errors::DomainError;
use crate::domain::order::{Order, OrderStatus};
use crate::domain::ports::OrderRepository;

use super::json_store::JsonDocument;
use super::models::OrdersDocument;

pub struct JsonOrderRepository {
    doc: Arc<JsonDocument<OrdersDocument>>,
}

impl JsonOrderRepository {
    pub fn new(doc: Arc<JsonDocument<OrdersDocument>>) -> Self {
        Self { doc }
    }
}

impl OrderRepository for JsonOrderRepository {
    fn create(&self, order: &Order) -> Result<(), DomainError> {
        self.doc.update(|doc| {
            if doc.orders.iter().any(|o| o.id == order.id) {
                return Err(DomainError::Internal(format!(
                    "order id {} already taken",
                    order.id
                )));
            }
            doc.orders.push(order.clone());
            Ok(())
        })
    }

    fn find_by_id(&self, id: &str) -> Result<Option<Order>, DomainError> {
        Ok(self.doc.load()?.orders.into_iter().find(|o| o.id == id))
    }

    fn list(&self) -> Result<Vec<Order>, DomainError> {
        Ok(self.doc.load()?.orders)
    }

    fn update_status(&self, id: &str, status: OrderStatus) -> Result<Order, DomainError> {
        self.doc.update(|doc| {
            let order = doc
                .orders
                .iter_mut()
                .find(|o| o.id == id)
                .ok_or_else(|| DomainError::not_found(format!("Order {}", id)))?;
            order.status = status;
            Ok(order.clone())
        })
    }
}
