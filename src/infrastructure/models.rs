use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::catalog::{District, EquipmentCatalog};
use crate::domain::order::Order;

use super::json_store::JsonDocument;

pub const DISTRICTS_FILE: &str = "districts.json";
pub const EQUIPMENT_FILE: &str = "equipment.json";
pub const ORDERS_FILE: &str = "orders.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DistrictsDocument {
    #[serde(default)]
    pub districts: Vec<District>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrdersDocument {
    #[serde(default)]
    pub orders: Vec<Order>,
}

/// The three documents of one data directory. Clone it freely; clones share
/// the same per-document locks.
#[derive(Clone)]
pub struct DataStore {
    pub districts: Arc<JsonDocument<DistrictsDocument>>,
    pub equipment: Arc<JsonDocument<EquipmentCatalog>>,
    pub orders: Arc<JsonDocument<OrdersDocument>>,
}

impl DataStore {
    pub fn open(data_dir: &Path) -> Self {
        Self {
            districts: Arc::new(JsonDocument::new(data_dir.join(DISTRICTS_FILE))),
            equipment: Arc::new(JsonDocument::new(data_dir.join(EQUIPMENT_FILE))),
            orders: Arc::new(JsonDocument::new(data_dir.join(ORDERS_FILE))),
        }
    }
}
