use actix_web::http::header;
use actix_web::{web, HttpResponse};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::order::{DateRange, Order, OrderFilter, OrderStatus};
use crate::errors::AppError;
use crate::AppContext;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItemResponse {
    pub category_id: String,
    pub category_name: String,
    pub component_id: String,
    pub component_name: String,
    /// Decimal as a string, e.g. "3000"
    pub price: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: String,
    pub user_id: i64,
    pub username: Option<String>,
    pub full_name: String,
    pub phone: String,
    pub district_id: u32,
    pub district_name: String,
    pub depth: u32,
    pub ground_type: Option<String>,
    pub price_per_meter: String,
    pub drilling_cost: String,
    pub equipment: Vec<OrderItemResponse>,
    pub equipment_cost: String,
    pub total_cost: String,
    pub created_at: String,
    /// One of `new`, `in_progress`, `completed`.
    pub status: String,
}

impl From<Order> for OrderResponse {
    fn from(o: Order) -> Self {
        Self {
            id: o.id,
            user_id: o.user_id,
            username: o.username,
            full_name: o.full_name,
            phone: o.phone,
            district_id: o.district_id,
            district_name: o.district_name,
            depth: o.depth,
            ground_type: o.ground_type,
            price_per_meter: o.price_per_meter.to_string(),
            drilling_cost: o.drilling_cost.to_string(),
            equipment: o
                .equipment
                .into_iter()
                .map(|item| OrderItemResponse {
                    category_id: item.category_id,
                    category_name: item.category_name,
                    component_id: item.component_id,
                    component_name: item.component_name,
                    price: item.price.to_string(),
                })
                .collect(),
            equipment_cost: o.equipment_cost.to_string(),
            total_cost: o.total_cost.to_string(),
            created_at: o.created_at.to_rfc3339(),
            status: o.status.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    /// `new`, `in_progress` or `completed`
    pub status: String,
}

// ── Filtering and pagination ─────────────────────────────────────────────────

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListOrdersParams {
    /// Only orders in this status.
    pub status: Option<String>,
    /// Only orders placed by this chat user.
    pub user_id: Option<i64>,
    /// First day included, `YYYY-MM-DD`.
    pub start_date: Option<NaiveDate>,
    /// Last day included, `YYYY-MM-DD`.
    pub end_date: Option<NaiveDate>,
    /// Page number (1-based). Defaults to 1.
    #[serde(default = "default_page")]
    pub page: i64,
    /// Number of items per page. Defaults to 20, maximum 100.
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    20
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListOrdersResponse {
    pub items: Vec<OrderResponse>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

fn not_found(id: &str) -> AppError {
    AppError::NotFound(format!("Order {}", id))
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /api/orders
///
/// Orders matching the filters, newest first, one page at a time.
#[utoipa::path(
    get,
    path = "/api/orders",
    params(ListOrdersParams),
    responses(
        (status = 200, description = "Paginated list of orders", body = ListOrdersResponse),
        (status = 400, description = "Unknown status or malformed date"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn list_orders(
    ctx: web::Data<AppContext>,
    query: web::Query<ListOrdersParams>,
) -> Result<HttpResponse, AppError> {
    let params = query.into_inner();
    let page = params.page.max(1);
    let limit = params.limit.clamp(1, 100);
    let filter = OrderFilter {
        status: params
            .status
            .as_deref()
            .map(str::parse::<OrderStatus>)
            .transpose()?,
        user_id: params.user_id,
        created: DateRange {
            start: params.start_date,
            end: params.end_date,
        },
    };

    let result = web::block(move || ctx.orders.list_orders(&filter, page, limit))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(ListOrdersResponse {
        items: result.items.into_iter().map(OrderResponse::from).collect(),
        total: result.total,
        page,
        limit,
    }))
}

/// GET /api/orders/user/{user_id}
#[utoipa::path(
    get,
    path = "/api/orders/user/{user_id}",
    params(
        ("user_id" = i64, Path, description = "Chat user id"),
    ),
    responses(
        (status = 200, description = "The user's orders, newest first", body = [OrderResponse]),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn user_orders(
    ctx: web::Data<AppContext>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let user_id = path.into_inner();

    let orders = web::block(move || ctx.orders.user_orders(user_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    let body: Vec<OrderResponse> = orders.into_iter().map(OrderResponse::from).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// GET /api/orders/{id}
#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(
        ("id" = String, Path, description = "Order number, e.g. 0A1B2C3D"),
    ),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn get_order(
    ctx: web::Data<AppContext>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();

    let lookup = id.clone();
    let order = web::block(move || ctx.orders.get_order(&lookup))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    match order {
        Some(order) => Ok(HttpResponse::Ok().json(OrderResponse::from(order))),
        None => Err(not_found(&id)),
    }
}

/// PUT /api/orders/{id}/status
///
/// Status is the only part of an order that changes after checkout.
#[utoipa::path(
    put,
    path = "/api/orders/{id}/status",
    params(
        ("id" = String, Path, description = "Order number"),
    ),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = OrderResponse),
        (status = 400, description = "Unknown status"),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn update_status(
    ctx: web::Data<AppContext>,
    path: web::Path<String>,
    body: web::Json<UpdateStatusRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let status: OrderStatus = body.status.parse()?;

    let order = web::block(move || ctx.orders.update_status(&id, status))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

/// GET /api/orders/{id}/report
///
/// The order sheet as a PDF attachment, rendered fresh on every request.
#[utoipa::path(
    get,
    path = "/api/orders/{id}/report",
    params(
        ("id" = String, Path, description = "Order number"),
    ),
    responses(
        (status = 200, description = "Order sheet", body = Vec<u8>, content_type = "application/pdf"),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn get_report(
    ctx: web::Data<AppContext>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();

    let (file_name, content) = web::block(move || {
        let order = ctx.orders.get_order(&id)?.ok_or_else(|| not_found(&id))?;
        let report = ctx.reports.render(&order)?;
        let content = std::fs::read(&report)
            .map_err(|e| AppError::Internal(format!("{}: {}", report.display(), e)))?;
        let file_name = report
            .file_name()
            .map_or_else(|| format!("order_{}.pdf", order.id), |n| n.to_string_lossy().into_owned());
        Ok::<_, AppError>((file_name, content))
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok()
        .content_type("application/pdf")
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", file_name),
        ))
        .body(content))
}
