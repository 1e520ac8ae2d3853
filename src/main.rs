use std::sync::Arc;

use bur_assist::application::conversation::Conversation;
use bur_assist::application::follow_up::OrderFollowUp;
use bur_assist::bot::dispatcher::Dispatcher;
use bur_assist::bot::telegram::TelegramClient;
use bur_assist::infrastructure::catalog_repo::JsonCatalogRepository;
use bur_assist::infrastructure::models::DataStore;
use bur_assist::infrastructure::order_repo::JsonOrderRepository;
use bur_assist::infrastructure::report::PdfReportRenderer;
use bur_assist::infrastructure::session_store::InMemorySessionStore;
use bur_assist::{build_server, AppContext, Settings};
use dotenvy::dotenv;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let settings = Settings::from_env().map_err(|e| {
        log::error!("Invalid configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    let store = DataStore::open(&settings.data_dir);
    let mut renderer = PdfReportRenderer::new(&settings.reports_dir);
    if settings.report_font.is_file() {
        renderer = renderer.with_font(&settings.report_font);
    } else {
        log::warn!(
            "Report font {} not found, reports fall back to a Latin-only font",
            settings.report_font.display()
        );
    }
    let reports = Arc::new(renderer);
    log::info!("Using data directory {}", settings.data_dir.display());

    match &settings.bot {
        Some(bot) => {
            let client = Arc::new(TelegramClient::new(&bot.api_url, &bot.token));
            let conversation = Arc::new(Conversation::new(
                Arc::new(JsonCatalogRepository::new(
                    store.districts.clone(),
                    store.equipment.clone(),
                )),
                Arc::new(JsonOrderRepository::new(store.orders.clone())),
                Arc::new(InMemorySessionStore::new()),
                reports.clone(),
            ));
            let follow_up = OrderFollowUp::new(reports.clone(), client.clone(), bot.operator_chat_id);
            if bot.operator_chat_id.is_none() {
                log::warn!("OPERATOR_CHAT_ID is not set, new orders will not be forwarded");
            }
            let dispatcher = Dispatcher::new(client, conversation, follow_up, bot.poll_timeout_secs);
            tokio::spawn(dispatcher.run());
        }
        None => log::warn!("BOT_TOKEN is not set, running the HTTP API only"),
    }

    log::info!("Starting server at http://{}:{}", settings.host, settings.port);

    build_server(AppContext::new(&store, reports), &settings.host, settings.port)?.await
}
