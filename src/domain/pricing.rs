//! Order pricing.
//!
//! Everything here is pure: the same district, depth and selection always
//! produce the same numbers. Missing reference data never fails a quote, it
//! falls back to the district base price or contributes zero.

use std::collections::BTreeMap;

use bigdecimal::{BigDecimal, Zero};
use serde::{Deserialize, Serialize};

use super::catalog::{District, EquipmentCatalog};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrillingQuote {
    pub depth: u32,
    /// `None` when no ground band covers the depth.
    pub ground_type: Option<String>,
    pub price_per_meter: BigDecimal,
    pub drilling_cost: BigDecimal,
}

pub fn quote_drilling(district: &District, depth: u32) -> DrillingQuote {
    let (ground_type, price_per_meter) = match district.band_for(depth) {
        Some(band) => (Some(band.name.clone()), band.price_per_meter.clone()),
        None => (None, district.base_price.clone()),
    };
    let drilling_cost = &price_per_meter * BigDecimal::from(depth);

    DrillingQuote {
        depth,
        ground_type,
        price_per_meter,
        drilling_cost,
    }
}

/// Selected component ids, grouped by category id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EquipmentSelection(BTreeMap<String, Vec<String>>);

impl EquipmentSelection {
    /// Adds the component if absent, removes it otherwise. Returns whether it
    /// is selected afterwards.
    pub fn toggle(&mut self, category_id: &str, component_id: &str) -> bool {
        let picked = self.0.entry(category_id.to_string()).or_default();
        if let Some(pos) = picked.iter().position(|id| id == component_id) {
            picked.remove(pos);
            if picked.is_empty() {
                self.0.remove(category_id);
            }
            false
        } else {
            picked.push(component_id.to_string());
            true
        }
    }

    pub fn is_selected(&self, category_id: &str, component_id: &str) -> bool {
        self.0
            .get(category_id)
            .is_some_and(|picked| picked.iter().any(|id| id == component_id))
    }

    pub fn count_in(&self, category_id: &str) -> usize {
        self.0.get(category_id).map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricedItem {
    pub category_id: String,
    pub category_name: String,
    pub component_id: String,
    pub component_name: String,
    pub price: BigDecimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EquipmentQuote {
    pub items: Vec<PricedItem>,
    pub equipment_cost: BigDecimal,
}

/// Prices the selection in catalog order. Ids the catalog no longer knows
/// are skipped.
pub fn price_equipment(catalog: &EquipmentCatalog, selection: &EquipmentSelection) -> EquipmentQuote {
    let items: Vec<PricedItem> = catalog
        .categories
        .iter()
        .flat_map(|category| {
            category
                .components
                .iter()
                .filter(|component| selection.is_selected(&category.id, &component.id))
                .map(|component| PricedItem {
                    category_id: category.id.clone(),
                    category_name: category.name.clone(),
                    component_id: component.id.clone(),
                    component_name: component.name.clone(),
                    price: component.price.clone(),
                })
        })
        .collect();

    let equipment_cost = items
        .iter()
        .fold(BigDecimal::zero(), |acc, item| acc + &item.price);

    EquipmentQuote {
        items,
        equipment_cost,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CostBreakdown {
    pub drilling_cost: BigDecimal,
    pub equipment_cost: BigDecimal,
    pub total_cost: BigDecimal,
}

impl CostBreakdown {
    pub fn new(drilling_cost: BigDecimal, equipment_cost: BigDecimal) -> Self {
        let total_cost = &drilling_cost + &equipment_cost;
        Self {
            drilling_cost,
            equipment_cost,
            total_cost,
        }
    }
}

/// Rubles with kopecks only when there are any: `22500`, `1250.50`.
pub fn format_money(amount: &BigDecimal) -> String {
    let fixed = amount.round(2).with_scale(2).to_string();
    match fixed.strip_suffix(".00") {
        Some(whole) => whole.to_string(),
        None => fixed,
    }
}
