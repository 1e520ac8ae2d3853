//! Customer- and operator-facing message texts (Telegram HTML).

use crate::domain::catalog::District;
use crate::domain::order::{Order, OrderStatus};
use crate::domain::pricing::{format_money, CostBreakdown, DrillingQuote, PricedItem};

pub const NEW_ORDER_LABEL: &str = "🔍 Новый расчет";
pub const MY_ORDERS_LABEL: &str = "📋 Мои заказы";
pub const HELP_LABEL: &str = "ℹ️ Помощь";

pub const BACK_LABEL: &str = "◀️ Назад";
pub const CANCEL_LABEL: &str = "❌ Отмена";
pub const DONE_LABEL: &str = "✅ Готово";
pub const FINISH_EQUIPMENT_LABEL: &str = "✅ Завершить выбор оборудования";
pub const CONFIRM_LABEL: &str = "✅ Подтвердить заказ";
pub const CHANGE_EQUIPMENT_LABEL: &str = "🔧 Изменить оборудование";
pub const DOWNLOAD_REPORT_LABEL: &str = "📄 Скачать детали заказа";

pub const DISTRICT_NOT_FOUND: &str = "❌ Район не найден. Пожалуйста, выберите другой район.";
pub const DEPTH_NOT_OFFERED: &str = "❌ Эта глубина недоступна для выбранного района.";
pub const CATEGORY_NOT_FOUND: &str = "❌ Категория оборудования не найдена.";
pub const COMPONENT_NOT_FOUND: &str = "❌ Компонент не найден.";
pub const ORDER_NOT_FOUND: &str = "❌ Заказ не найден.";
pub const ORDER_NOT_YOURS: &str = "❌ У вас нет доступа к этому заказу.";
pub const REPORT_FAILED: &str = "❌ Не удалось сформировать документ. Попробуйте позже.";
pub const STALE_STEP: &str = "Это действие сейчас недоступно. Начните новый расчет.";
pub const SOMETHING_WENT_WRONG: &str = "❌ Произошла ошибка. Попробуйте позже.";
pub const USE_BUTTONS: &str = "Пожалуйста, воспользуйтесь кнопками.";
pub const SAVE_FAILED: &str = "❌ Не удалось сохранить заказ. Попробуйте отправить телефон еще раз.";
pub const BAD_DEPTH: &str = "❌ Укажите глубину целым числом метров или выберите ее кнопкой.";
pub const EMPTY_PHONE: &str = "Введите номер телефона, например: +7 (999) 123-45-67";
pub const NO_ORDERS: &str = "У вас пока нет заказов.";
pub const NO_DISTRICTS: &str = "Сейчас нет доступных районов. Попробуйте позже.";
pub const UNKNOWN_INPUT: &str = "Выберите действие на клавиатуре ниже или воспользуйтесь /help.";
pub const CANCELLED: &str = "❌ Операция отменена. Выберите действие на клавиатуре ниже.";
pub const CHOOSE_DISTRICT: &str = "🏙️ <b>Выберите район бурения:</b>";
pub const CONTACT_PROMPT: &str =
    "📞 <b>Введите ваш номер телефона</b> для связи:\n\nНапример: +7 (999) 123-45-67";
pub const UNKNOWN_GROUND: &str = "Неизвестный";

pub fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub fn greeting(first_name: &str) -> String {
    format!(
        "👋 Здравствуйте, {}!\n\n\
         Я бот для расчета стоимости бурения скважин.\n\
         Выберите действие на клавиатуре ниже или воспользуйтесь командой /help.",
        escape(first_name)
    )
}

pub fn help() -> String {
    format!(
        "🔍 <b>Как пользоваться ботом:</b>\n\n\
         1. Нажмите кнопку <b>\"{}\"</b> для начала расчета\n\
         2. Выберите район бурения\n\
         3. Выберите необходимую глубину\n\
         4. Выберите требуемое оборудование\n\
         5. Подтвердите заказ и оставьте телефон\n\n\
         📋 <b>Доступные команды:</b>\n\
         /start - Начать работу с ботом\n\
         /help - Показать справку\n\
         /cancel - Отменить текущую операцию",
        NEW_ORDER_LABEL
    )
}

fn ground_label(quote: &DrillingQuote) -> String {
    escape(quote.ground_type.as_deref().unwrap_or(UNKNOWN_GROUND))
}

pub fn choose_depth(district_name: &str) -> String {
    format!(
        "🏙️ <b>Выбранный район:</b> {}\n\n📏 <b>Выберите необходимую глубину бурения:</b>",
        escape(district_name)
    )
}

pub fn depth_button(district: &District, depth: u32) -> String {
    let ground = district
        .band_for(depth)
        .map_or(UNKNOWN_GROUND, |band| band.name.as_str());
    format!("{} м - {}", depth, ground)
}

pub fn choose_equipment(district_name: &str, quote: &DrillingQuote, running_total: &str) -> String {
    format!(
        "🏙️ <b>Район:</b> {}\n\
         📏 <b>Глубина:</b> {} м\n\
         🧱 <b>Тип грунта:</b> {}\n\
         💵 <b>Цена за метр:</b> {} ₽\n\
         💰 <b>Стоимость бурения:</b> {} ₽\n\
         🧮 <b>Итого сейчас:</b> {} ₽\n\n\
         🔧 <b>Выберите необходимое оборудование:</b>",
        escape(district_name),
        quote.depth,
        ground_label(quote),
        format_money(&quote.price_per_meter),
        format_money(&quote.drilling_cost),
        running_total
    )
}

pub fn category_button(name: &str, selected: usize) -> String {
    if selected == 0 {
        name.to_string()
    } else {
        format!("{} ({})", name, selected)
    }
}

pub fn choose_components(category_name: &str) -> String {
    format!(
        "🔧 <b>Категория:</b> {}\n\nВыберите компоненты оборудования:",
        escape(category_name)
    )
}

pub fn component_button(name: &str, price: &str, selected: bool) -> String {
    let mark = if selected { "✅ " } else { "" };
    format!("{}{} - {} ₽", mark, name, price)
}

pub fn summary(
    district_name: &str,
    quote: &DrillingQuote,
    items: &[PricedItem],
    costs: &CostBreakdown,
) -> String {
    let mut text = format!(
        "📋 <b>Детали заказа:</b>\n\n\
         🏙️ <b>Район:</b> {}\n\
         📏 <b>Глубина:</b> {} м\n\
         🧱 <b>Тип грунта:</b> {}\n\
         💵 <b>Цена за метр:</b> {} ₽\n\
         💰 <b>Стоимость бурения:</b> {} ₽\n",
        escape(district_name),
        quote.depth,
        ground_label(quote),
        format_money(&quote.price_per_meter),
        format_money(&costs.drilling_cost),
    );

    if !items.is_empty() {
        text.push_str("\n🔧 <b>Выбранное оборудование:</b>\n");
        for item in items {
            text.push_str(&format!(
                "- {}: {} ({} ₽)\n",
                escape(&item.category_name),
                escape(&item.component_name),
                format_money(&item.price)
            ));
        }
        text.push_str(&format!(
            "\n💰 <b>Стоимость оборудования:</b> {} ₽\n",
            format_money(&costs.equipment_cost)
        ));
    }

    text.push_str(&format!(
        "\n💰 <b>Общая стоимость:</b> {} ₽\n\n\
         Подтвердите заказ или вернитесь к выбору оборудования.",
        format_money(&costs.total_cost)
    ));
    text
}

pub fn order_placed(order: &Order) -> String {
    format!(
        "✅ <b>Заказ #{} успешно оформлен!</b>\n\n\
         📅 Дата: {}\n\
         🏙️ Район: {}\n\
         📏 Глубина: {} м\n\
         🧱 Тип грунта: {}\n\
         💰 Общая стоимость: {} ₽\n\n\
         📞 Контактный телефон: {}\n\n\
         Наш менеджер свяжется с вами в ближайшее время для подтверждения заказа.",
        order.id,
        order.created_at.format("%d.%m.%Y %H:%M"),
        escape(&order.district_name),
        order.depth,
        escape(order.ground_type.as_deref().unwrap_or(UNKNOWN_GROUND)),
        format_money(&order.total_cost),
        escape(&order.phone),
    )
}

pub fn order_card(order: &Order) -> String {
    let badge = match order.status {
        OrderStatus::New => "🆕",
        OrderStatus::InProgress => "🔄",
        OrderStatus::Completed => "✅",
    };
    format!(
        "{} <b>Заказ #{}</b>\n\
         📅 Дата: {}\n\
         🏙️ Район: {}\n\
         📏 Глубина: {} м\n\
         💰 Стоимость: {} ₽",
        badge,
        order.id,
        order.created_at.format("%d.%m.%Y %H:%M"),
        escape(&order.district_name),
        order.depth,
        format_money(&order.total_cost),
    )
}

pub fn report_caption(order_id: &str) -> String {
    format!("📄 Детали заказа #{}", order_id)
}

pub fn operator_message(order: &Order) -> String {
    let username = order
        .username
        .as_deref()
        .map_or_else(|| "-".to_string(), |u| format!("@{}", escape(u)));
    let mut text = format!(
        "🔔 <b>Новый заказ! #{}</b>\n\n\
         👤 <b>Клиент:</b> {} ({})\n\
         📞 <b>Телефон:</b> {}\n\
         📅 <b>Дата:</b> {}\n\
         📍 <b>Район:</b> {}\n\
         📏 <b>Глубина:</b> {} м\n\
         🧱 <b>Тип грунта:</b> {}\n\
         💰 <b>Стоимость бурения:</b> {} ₽\n",
        order.id,
        escape(&order.full_name),
        username,
        escape(&order.phone),
        order.created_at.format("%d.%m.%Y %H:%M"),
        escape(&order.district_name),
        order.depth,
        escape(order.ground_type.as_deref().unwrap_or(UNKNOWN_GROUND)),
        format_money(&order.drilling_cost),
    );

    if !order.equipment.is_empty() {
        text.push_str("\n🔧 <b>Оборудование:</b>\n");
        for item in &order.equipment {
            text.push_str(&format!(
                "- {} ({} ₽)\n",
                escape(&item.component_name),
                format_money(&item.price)
            ));
        }
        text.push_str(&format!(
            "💰 <b>Стоимость оборудования:</b> {} ₽\n",
            format_money(&order.equipment_cost)
        ));
    }

    text.push_str(&format!(
        "\n💰 <b>Общая стоимость:</b> {} ₽",
        format_money(&order.total_cost)
    ));
    text
}
