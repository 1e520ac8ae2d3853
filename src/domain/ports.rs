use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bigdecimal::BigDecimal;

use super::catalog::{Component, District, EquipmentCatalog};
use super::errors::DomainError;
use super::order::{Order, OrderStatus};
use super::session::Session;

pub trait CatalogRepository: Send + Sync + 'static {
    fn districts(&self) -> Result<Vec<District>, DomainError>;
    fn find_district(&self, id: u32) -> Result<Option<District>, DomainError>;
    fn equipment(&self) -> Result<EquipmentCatalog, DomainError>;
    fn update_district_base_price(&self, id: u32, price: BigDecimal)
        -> Result<District, DomainError>;
    fn update_component_price(
        &self,
        category_id: &str,
        component_id: &str,
        price: BigDecimal,
    ) -> Result<Component, DomainError>;
}

pub trait OrderRepository: Send + Sync + 'static {
    fn create(&self, order: &Order) -> Result<(), DomainError>;
    fn find_by_id(&self, id: &str) -> Result<Option<Order>, DomainError>;
    fn list(&self) -> Result<Vec<Order>, DomainError>;
    fn update_status(&self, id: &str, status: OrderStatus) -> Result<Order, DomainError>;
}

/// Per-user conversation state, keyed by chat user id.
pub trait SessionStore: Send + Sync + 'static {
    fn get(&self, user_id: i64) -> Option<Session>;
    fn put(&self, user_id: i64, session: Session);
    fn remove(&self, user_id: i64);
}

pub trait ReportRenderer: Send + Sync + 'static {
    /// Writes the order's report, replacing any earlier one, and returns
    /// where it landed.
    fn render(&self, order: &Order) -> Result<PathBuf, DomainError>;
}

/// Outgoing chat messages.
#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), DomainError>;
    async fn send_document(&self, chat_id: i64, path: &Path, caption: &str)
        -> Result<(), DomainError>;
}
