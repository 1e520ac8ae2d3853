use std::path::PathBuf;
use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::application::conversation::texts;
use crate::domain::order::Order;
use crate::domain::ports::{Notifier, ReportRenderer};

/// Work that follows a placed order: the report for the customer and a
/// heads-up for the operator chat. Nothing here can fail the order; every
/// failure is logged and dropped.
#[derive(Clone)]
pub struct OrderFollowUp {
    reports: Arc<dyn ReportRenderer>,
    notifier: Arc<dyn Notifier>,
    operator_chat_id: Option<i64>,
}

impl OrderFollowUp {
    pub fn new(
        reports: Arc<dyn ReportRenderer>,
        notifier: Arc<dyn Notifier>,
        operator_chat_id: Option<i64>,
    ) -> Self {
        Self {
            reports,
            notifier,
            operator_chat_id,
        }
    }

    /// Runs in the background; the handle is only useful to tests.
    pub fn dispatch(&self, order: Order) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move { this.run(order).await })
    }

    async fn run(self, order: Order) {
        let report = self.render(order.clone()).await;
        let caption = texts::report_caption(&order.id);

        if let Some(path) = &report {
            if let Err(e) = self
                .notifier
                .send_document(order.user_id, path, &caption)
                .await
            {
                log::warn!("Failed to send report for order {} to customer: {}", order.id, e);
            }
        }

        let Some(chat_id) = self.operator_chat_id else {
            log::debug!("No operator chat configured, order {} not forwarded", order.id);
            return;
        };
        if let Err(e) = self
            .notifier
            .send_text(chat_id, &texts::operator_message(&order))
            .await
        {
            log::warn!("Failed to notify operator about order {}: {}", order.id, e);
        }
        if let Some(path) = &report {
            if let Err(e) = self.notifier.send_document(chat_id, path, &caption).await {
                log::warn!("Failed to send report for order {} to operator: {}", order.id, e);
            }
        }
    }

    async fn render(&self, order: Order) -> Option<PathBuf> {
        let reports = self.reports.clone();
        let id = order.id.clone();
        match tokio::task::spawn_blocking(move || reports.render(&order)).await {
            Ok(Ok(path)) => Some(path),
            Ok(Err(e)) => {
                log::warn!("Failed to render report for order {}: {}", id, e);
                None
            }
            Err(e) => {
                log::error!("Report task for order {} panicked: {}", id, e);
                None
            }
        }
    }
}
