use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

/// A depth range with its own ground type and price per meter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundBand {
    pub name: String,
    #[serde(default)]
    pub min_depth: u32,
    #[serde(default)]
    pub max_depth: u32,
    pub price_per_meter: BigDecimal,
}

impl GroundBand {
    pub fn contains(&self, depth: u32) -> bool {
        self.min_depth <= depth && depth <= self.max_depth
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct District {
    pub id: u32,
    pub name: String,
    pub base_price: BigDecimal,
    /// Depths offered to the customer, in meters.
    #[serde(default)]
    pub depths: Vec<u32>,
    /// Checked in order; the first band containing a depth wins.
    #[serde(default)]
    pub ground_bands: Vec<GroundBand>,
}

impl District {
    pub fn band_for(&self, depth: u32) -> Option<&GroundBand> {
        self.ground_bands.iter().find(|band| band.contains(depth))
    }

    pub fn offers_depth(&self, depth: u32) -> bool {
        self.depths.is_empty() || self.depths.contains(&depth)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub id: String,
    pub name: String,
    pub price: BigDecimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentCategory {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub components: Vec<Component>,
}

impl EquipmentCategory {
    pub fn component(&self, id: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.id == id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EquipmentCatalog {
    #[serde(default)]
    pub categories: Vec<EquipmentCategory>,
}

impl EquipmentCatalog {
    pub fn category(&self, id: &str) -> Option<&EquipmentCategory> {
        self.categories.iter().find(|c| c.id == id)
    }
}
