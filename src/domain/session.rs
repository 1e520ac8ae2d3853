use bigdecimal::{BigDecimal, Zero};

use super::pricing::{DrillingQuote, EquipmentSelection};

/// Where a customer is in the ordering flow.
///
/// `Completed` and `Cancelled` are terminal and have no variant: reaching
/// either removes the session altogether.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    SelectingDistrict,
    SelectingDepth,
    SelectingCategory,
    SelectingComponents,
    ConfirmingOrder,
    EnteringContactInfo,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DistrictChoice {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub step: Step,
    pub district: Option<DistrictChoice>,
    pub drilling: Option<DrillingQuote>,
    pub current_category: Option<String>,
    pub selection: EquipmentSelection,
    pub equipment_cost: BigDecimal,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            step: Step::SelectingDistrict,
            district: None,
            drilling: None,
            current_category: None,
            selection: EquipmentSelection::default(),
            equipment_cost: BigDecimal::zero(),
        }
    }
}

impl Session {
    /// Stores a new district and forgets everything chosen for the old one.
    pub fn choose_district(&mut self, choice: DistrictChoice) {
        self.district = Some(choice);
        self.drilling = None;
        self.current_category = None;
        self.selection.clear();
        self.equipment_cost = BigDecimal::zero();
        self.step = Step::SelectingDepth;
    }

    pub fn drilling_cost(&self) -> BigDecimal {
        self.drilling
            .as_ref()
            .map_or_else(BigDecimal::zero, |q| q.drilling_cost.clone())
    }

    pub fn running_total(&self) -> BigDecimal {
        self.drilling_cost() + &self.equipment_cost
    }
}
