use std::fs::{self, File};
use std::path::{Path, PathBuf};

use chrono::Utc;
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference};

use crate::domain::errors::DomainError;
use crate::domain::order::Order;
use crate::domain::ports::ReportRenderer;
use crate::domain::pricing::format_money;

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 20.0;
const VALUE_COLUMN: f32 = 60.0;

/// Renders orders as one-page A4 PDF order sheets named after the order id.
///
/// Text is set in the configured TrueType font. Without one the built-in
/// Helvetica is used, which has no Cyrillic glyphs.
pub struct PdfReportRenderer {
    dir: PathBuf,
    font: Option<PathBuf>,
}

impl PdfReportRenderer {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            font: None,
        }
    }

    pub fn with_font(mut self, font: impl Into<PathBuf>) -> Self {
        self.font = Some(font.into());
        self
    }

    fn path_for(&self, order_id: &str) -> PathBuf {
        self.dir.join(format!("order_{}.pdf", order_id))
    }

    fn load_font(&self, doc: &PdfDocumentReference) -> Result<IndirectFontRef, DomainError> {
        match &self.font {
            Some(path) => {
                let file = File::open(path).map_err(|e| font_error(path, e))?;
                doc.add_external_font(file).map_err(|e| font_error(path, e))
            }
            None => doc
                .add_builtin_font(BuiltinFont::Helvetica)
                .map_err(|e| DomainError::Internal(e.to_string())),
        }
    }
}

fn font_error(path: &Path, e: impl std::fmt::Display) -> DomainError {
    DomainError::Internal(format!("font {}: {}", path.display(), e))
}

impl ReportRenderer for PdfReportRenderer {
    fn render(&self, order: &Order) -> Result<PathBuf, DomainError> {
        let (doc, page, layer) = PdfDocument::new(
            format!("Заказ {}", order.id),
            Mm(PAGE_WIDTH),
            Mm(PAGE_HEIGHT),
            "sheet",
        );
        let font = self.load_font(&doc)?;

        let mut layer = doc.get_page(page).get_layer(layer);
        let mut y = PAGE_HEIGHT - MARGIN;
        for line in order_sheet(order) {
            if y < MARGIN {
                let (page, next) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "sheet");
                layer = doc.get_page(page).get_layer(next);
                y = PAGE_HEIGHT - MARGIN;
            }
            match line {
                Line::Title(text) => {
                    layer.use_text(text, 16.0, Mm(MARGIN), Mm(y), &font);
                    y -= 12.0;
                }
                Line::Heading(text) => {
                    layer.use_text(text, 13.0, Mm(MARGIN), Mm(y), &font);
                    y -= 8.0;
                }
                Line::Row(label, value) => {
                    layer.use_text(label, 11.0, Mm(MARGIN), Mm(y), &font);
                    layer.use_text(value, 11.0, Mm(MARGIN + VALUE_COLUMN), Mm(y), &font);
                    y -= 6.0;
                }
                Line::Text(text) => {
                    layer.use_text(text, 11.0, Mm(MARGIN), Mm(y), &font);
                    y -= 6.0;
                }
                Line::Gap => y -= 5.0,
            }
        }

        let bytes = doc
            .save_to_bytes()
            .map_err(|e| DomainError::Internal(format!("order {}: {}", order.id, e)))?;
        fs::create_dir_all(&self.dir)
            .map_err(|e| DomainError::Transient(format!("{}: {}", self.dir.display(), e)))?;
        let path = self.path_for(&order.id);
        fs::write(&path, bytes)
            .map_err(|e| DomainError::Transient(format!("{}: {}", path.display(), e)))?;
        Ok(path)
    }
}

#[derive(Debug, PartialEq)]
enum Line {
    Title(String),
    Heading(String),
    Row(&'static str, String),
    Text(String),
    Gap,
}

fn order_sheet(order: &Order) -> Vec<Line> {
    let mut lines = vec![
        Line::Title("ЗАКАЗ НА БУРЕНИЕ СКВАЖИНЫ".to_string()),
        Line::Row("№ заказа:", order.id.clone()),
        Line::Row(
            "Дата заказа:",
            order.created_at.format("%d.%m.%Y %H:%M").to_string(),
        ),
        Line::Row("Статус:", order.status.to_string()),
        Line::Row("Район:", order.district_name.clone()),
        Line::Row("Глубина:", format!("{} м", order.depth)),
        Line::Row(
            "Тип грунта:",
            order.ground_type.clone().unwrap_or_else(|| "Не указан".to_string()),
        ),
        Line::Row("Цена за метр:", format!("{} руб.", format_money(&order.price_per_meter))),
        Line::Row(
            "Стоимость бурения:",
            format!("{} руб.", format_money(&order.drilling_cost)),
        ),
    ];

    if !order.equipment.is_empty() {
        lines.push(Line::Gap);
        lines.push(Line::Heading("ВЫБРАННОЕ ОБОРУДОВАНИЕ".to_string()));
        lines.extend(order.equipment.iter().map(|item| {
            Line::Text(format!(
                "{} / {}: {} руб.",
                item.category_name,
                item.component_name,
                format_money(&item.price)
            ))
        }));
        lines.push(Line::Row(
            "Оборудование итого:",
            format!("{} руб.", format_money(&order.equipment_cost)),
        ));
    }

    lines.extend([
        Line::Gap,
        Line::Heading(format!("ОБЩАЯ СТОИМОСТЬ: {} руб.", format_money(&order.total_cost))),
        Line::Gap,
        Line::Heading("ИНФОРМАЦИЯ О КЛИЕНТЕ".to_string()),
        Line::Row("ФИО:", order.full_name.clone()),
        Line::Row("Телефон:", order.phone.clone()),
        Line::Gap,
        Line::Text(format!(
            "Документ сгенерирован: {}",
            Utc::now().format("%d.%m.%Y %H:%M:%S UTC")
        )),
    ]);
    lines
}
