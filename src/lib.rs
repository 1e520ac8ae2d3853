pub mod application;
pub mod bot;
pub mod config;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;

use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use application::catalog_service::CatalogService;
use application::order_service::OrderService;
use domain::ports::ReportRenderer;
use infrastructure::catalog_repo::JsonCatalogRepository;
use infrastructure::models::DataStore;
use infrastructure::order_repo::JsonOrderRepository;

pub use config::Settings;

/// Shared state of the HTTP surface.
pub struct AppContext {
    pub orders: OrderService<JsonOrderRepository>,
    pub catalog: CatalogService<JsonCatalogRepository>,
    pub reports: Arc<dyn ReportRenderer>,
}

impl AppContext {
    pub fn new(store: &DataStore, reports: Arc<dyn ReportRenderer>) -> Self {
        Self {
            orders: OrderService::new(JsonOrderRepository::new(store.orders.clone())),
            catalog: CatalogService::new(JsonCatalogRepository::new(
                store.districts.clone(),
                store.equipment.clone(),
            )),
            reports,
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::orders::list_orders,
        handlers::orders::user_orders,
        handlers::orders::get_order,
        handlers::orders::update_status,
        handlers::orders::get_report,
        handlers::prices::list_districts,
        handlers::prices::list_equipment,
        handlers::prices::update_district_price,
        handlers::prices::update_component_price,
        handlers::analytics::stats,
        handlers::analytics::popular_districts,
        handlers::analytics::popular_depths,
        handlers::analytics::popular_equipment,
    ),
    components(schemas(
        handlers::orders::OrderResponse,
        handlers::orders::OrderItemResponse,
        handlers::orders::ListOrdersResponse,
        handlers::orders::UpdateStatusRequest,
        handlers::prices::DistrictResponse,
        handlers::prices::GroundBandResponse,
        handlers::prices::EquipmentCategoryResponse,
        handlers::prices::ComponentResponse,
        handlers::prices::UpdateBasePriceRequest,
        handlers::prices::UpdatePriceRequest,
        handlers::analytics::StatsResponse,
        handlers::analytics::DistrictCount,
        handlers::analytics::DepthCount,
        handlers::analytics::EquipmentCount,
    )),
    tags(
        (name = "orders", description = "Placed orders and their reports"),
        (name = "prices", description = "Districts and equipment price lists"),
        (name = "analytics", description = "Order statistics"),
    )
)]
pub struct ApiDoc;

/// Registers the `/api` routes. Shared by the server and the tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    use handlers::{analytics, orders, prices};

    cfg.service(
        web::scope("/api")
            .service(
                web::scope("/orders")
                    .route("", web::get().to(orders::list_orders))
                    .route("/user/{user_id}", web::get().to(orders::user_orders))
                    .route("/{id}", web::get().to(orders::get_order))
                    .route("/{id}/status", web::put().to(orders::update_status))
                    .route("/{id}/report", web::get().to(orders::get_report)),
            )
            .service(
                web::scope("/prices")
                    .route("/districts", web::get().to(prices::list_districts))
                    .route("/districts/{id}", web::put().to(prices::update_district_price))
                    .route("/equipment", web::get().to(prices::list_equipment))
                    .route(
                        "/equipment/{category_id}/{component_id}",
                        web::put().to(prices::update_component_price),
                    ),
            )
            .service(
                web::scope("/analytics")
                    .route("/stats", web::get().to(analytics::stats))
                    .route("/popular-districts", web::get().to(analytics::popular_districts))
                    .route("/popular-depths", web::get().to(analytics::popular_depths))
                    .route("/popular-equipment", web::get().to(analytics::popular_equipment)),
            ),
    );
}

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    ctx: AppContext,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    let ctx = web::Data::new(ctx);
    Ok(HttpServer::new(move || {
        App::new()
            .app_data(ctx.clone())
            .wrap(Logger::default())
            .configure(configure)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", ApiDoc::openapi()),
            )
    })
    .bind((host.to_string(), port))?
    .run())
}
