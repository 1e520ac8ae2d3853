use std::fmt;
use std::str::FromStr;

use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::DomainError;
use super::pricing::PricedItem;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    New,
    InProgress,
    Completed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::New => "new",
            OrderStatus::InProgress => "in_progress",
            OrderStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(OrderStatus::New),
            "in_progress" => Ok(OrderStatus::InProgress),
            "completed" => Ok(OrderStatus::Completed),
            other => Err(DomainError::InvalidInput(format!(
                "unknown order status '{}'",
                other
            ))),
        }
    }
}

/// Who placed the order, as reported by the chat transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Customer {
    pub user_id: i64,
    pub username: Option<String>,
    pub full_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub user_id: i64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub phone: String,
    pub district_id: u32,
    pub district_name: String,
    pub depth: u32,
    #[serde(default)]
    pub ground_type: Option<String>,
    pub price_per_meter: BigDecimal,
    pub drilling_cost: BigDecimal,
    #[serde(default)]
    pub equipment: Vec<PricedItem>,
    #[serde(default = "BigDecimal::zero")]
    pub equipment_cost: BigDecimal,
    pub total_cost: BigDecimal,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub status: OrderStatus,
}

/// Short, human-friendly order number: the first 8 hex digits of a v4 UUID.
pub fn new_order_id() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_uppercase()
}

/// Inclusive calendar-day range; either end may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        let day = at.date_naive();
        if self.start.is_some_and(|start| day < start) {
            return false;
        }
        if let Some(end) = self.end {
            // Whole end day counts.
            let limit = end.checked_add_days(Days::new(1)).unwrap_or(end);
            if day >= limit {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub user_id: Option<i64>,
    pub created: DateRange,
}

impl OrderFilter {
    pub fn matches(&self, order: &Order) -> bool {
        self.status.map_or(true, |s| order.status == s)
            && self.user_id.map_or(true, |u| order.user_id == u)
            && self.created.contains(order.created_at)
    }
}

#[derive(Debug, Clone)]
pub struct ListResult {
    pub items: Vec<Order>,
    pub total: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tally<K> {
    pub key: K,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderStats {
    pub total_orders: usize,
    pub popular_districts: Vec<Tally<String>>,
    pub popular_depths: Vec<Tally<u32>>,
    pub popular_equipment: Vec<Tally<String>>,
    pub total_revenue: BigDecimal,
    pub avg_order_cost: BigDecimal,
    pub avg_depth: f64,
}
