use super::texts;

/// Everything a customer can do: press an inline button, use the main menu,
/// send a command or type free text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Start,
    Help,
    NewOrder,
    MyOrders,
    Cancel,
    PickDistrict(u32),
    PickDepth(u32),
    PickCategory(String),
    ToggleComponent(String),
    DoneComponents,
    FinishEquipment,
    BackToDistricts,
    BackToDepth,
    BackToCategories,
    BackToSummary,
    ConfirmOrder,
    DownloadReport(String),
    Text(String),
}

impl Action {
    /// Commands and main-menu labels; anything else is free text.
    pub fn from_text(text: &str) -> Action {
        let trimmed = text.trim();
        // "/start@SomeBot" in group chats.
        let command = trimmed.split('@').next().unwrap_or(trimmed);

        match command {
            "/start" => Action::Start,
            "/help" => Action::Help,
            "/cancel" => Action::Cancel,
            "/orders" => Action::MyOrders,
            "/new" => Action::NewOrder,
            _ if trimmed == texts::NEW_ORDER_LABEL => Action::NewOrder,
            _ if trimmed == texts::MY_ORDERS_LABEL => Action::MyOrders,
            _ if trimmed == texts::HELP_LABEL => Action::Help,
            _ => Action::Text(trimmed.to_string()),
        }
    }

    /// Compact form carried by inline buttons. Free text has none.
    pub fn callback_data(&self) -> Option<String> {
        let data = match self {
            Action::Start => "start".to_string(),
            Action::Help => "help".to_string(),
            Action::NewOrder => "new_order".to_string(),
            Action::MyOrders => "my_orders".to_string(),
            Action::Cancel => "cancel".to_string(),
            Action::PickDistrict(id) => format!("district:{}", id),
            Action::PickDepth(depth) => format!("depth:{}", depth),
            Action::PickCategory(id) => format!("cat:{}", id),
            Action::ToggleComponent(id) => format!("comp:{}", id),
            Action::DoneComponents => "done_components".to_string(),
            Action::FinishEquipment => "finish_equipment".to_string(),
            Action::BackToDistricts => "back:districts".to_string(),
            Action::BackToDepth => "back:depth".to_string(),
            Action::BackToCategories => "back:categories".to_string(),
            Action::BackToSummary => "back:summary".to_string(),
            Action::ConfirmOrder => "confirm".to_string(),
            Action::DownloadReport(id) => format!("report:{}", id),
            Action::Text(_) => return None,
        };
        Some(data)
    }

    pub fn from_callback_data(data: &str) -> Option<Action> {
        let action = match data {
            "start" => Action::Start,
            "help" => Action::Help,
            "new_order" => Action::NewOrder,
            "my_orders" => Action::MyOrders,
            "cancel" => Action::Cancel,
            "done_components" => Action::DoneComponents,
            "finish_equipment" => Action::FinishEquipment,
            "back:districts" => Action::BackToDistricts,
            "back:depth" => Action::BackToDepth,
            "back:categories" => Action::BackToCategories,
            "back:summary" => Action::BackToSummary,
            "confirm" => Action::ConfirmOrder,
            _ => {
                let (kind, arg) = data.split_once(':')?;
                if arg.is_empty() {
                    return None;
                }
                match kind {
                    "district" => Action::PickDistrict(arg.parse().ok()?),
                    "depth" => Action::PickDepth(arg.parse().ok()?),
                    "cat" => Action::PickCategory(arg.to_string()),
                    "comp" => Action::ToggleComponent(arg.to_string()),
                    "report" => Action::DownloadReport(arg.to_string()),
                    _ => return None,
                }
            }
        };
        Some(action)
    }
}
