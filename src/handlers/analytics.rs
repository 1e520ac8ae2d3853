use actix_web::{web, HttpResponse};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::order::{DateRange, OrderStats};
use crate::errors::AppError;
use crate::AppContext;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StatsParams {
    /// First day included, `YYYY-MM-DD`.
    pub start_date: Option<NaiveDate>,
    /// Last day included, `YYYY-MM-DD`.
    pub end_date: Option<NaiveDate>,
}

impl StatsParams {
    fn range(&self) -> DateRange {
        DateRange {
            start: self.start_date,
            end: self.end_date,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DistrictCount {
    pub district: String,
    pub count: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DepthCount {
    pub depth: u32,
    pub count: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EquipmentCount {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatsResponse {
    pub total_orders: usize,
    pub popular_districts: Vec<DistrictCount>,
    pub popular_depths: Vec<DepthCount>,
    /// Top 10 components across all orders in range.
    pub popular_equipment: Vec<EquipmentCount>,
    pub total_revenue: String,
    pub avg_order_cost: String,
    pub avg_depth: f64,
}

fn district_counts(stats: &OrderStats) -> Vec<DistrictCount> {
    stats
        .popular_districts
        .iter()
        .map(|t| DistrictCount {
            district: t.key.clone(),
            count: t.count,
        })
        .collect()
}

fn depth_counts(stats: &OrderStats) -> Vec<DepthCount> {
    stats
        .popular_depths
        .iter()
        .map(|t| DepthCount {
            depth: t.key,
            count: t.count,
        })
        .collect()
}

fn equipment_counts(stats: &OrderStats) -> Vec<EquipmentCount> {
    stats
        .popular_equipment
        .iter()
        .map(|t| EquipmentCount {
            name: t.key.clone(),
            count: t.count,
        })
        .collect()
}

async fn stats_for(ctx: web::Data<AppContext>, range: DateRange) -> Result<OrderStats, AppError> {
    let stats = web::block(move || ctx.orders.stats(range))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;
    Ok(stats)
}

/// GET /api/analytics/stats
#[utoipa::path(
    get,
    path = "/api/analytics/stats",
    params(StatsParams),
    responses(
        (status = 200, description = "Order statistics for the period", body = StatsResponse),
        (status = 400, description = "Malformed date"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "analytics"
)]
pub async fn stats(
    ctx: web::Data<AppContext>,
    query: web::Query<StatsParams>,
) -> Result<HttpResponse, AppError> {
    let stats = stats_for(ctx, query.range()).await?;

    Ok(HttpResponse::Ok().json(StatsResponse {
        total_orders: stats.total_orders,
        popular_districts: district_counts(&stats),
        popular_depths: depth_counts(&stats),
        popular_equipment: equipment_counts(&stats),
        total_revenue: stats.total_revenue.to_string(),
        avg_order_cost: stats.avg_order_cost.to_string(),
        avg_depth: stats.avg_depth,
    }))
}

/// GET /api/analytics/popular-districts
#[utoipa::path(
    get,
    path = "/api/analytics/popular-districts",
    params(StatsParams),
    responses(
        (status = 200, description = "Districts by number of orders", body = [DistrictCount]),
        (status = 500, description = "Internal server error"),
    ),
    tag = "analytics"
)]
pub async fn popular_districts(
    ctx: web::Data<AppContext>,
    query: web::Query<StatsParams>,
) -> Result<HttpResponse, AppError> {
    let stats = stats_for(ctx, query.range()).await?;
    Ok(HttpResponse::Ok().json(district_counts(&stats)))
}

/// GET /api/analytics/popular-depths
#[utoipa::path(
    get,
    path = "/api/analytics/popular-depths",
    params(StatsParams),
    responses(
        (status = 200, description = "Depths by number of orders", body = [DepthCount]),
        (status = 500, description = "Internal server error"),
    ),
    tag = "analytics"
)]
pub async fn popular_depths(
    ctx: web::Data<AppContext>,
    query: web::Query<StatsParams>,
) -> Result<HttpResponse, AppError> {
    let stats = stats_for(ctx, query.range()).await?;
    Ok(HttpResponse::Ok().json(depth_counts(&stats)))
}

/// GET /api/analytics/popular-equipment
#[utoipa::path(
    get,
    path = "/api/analytics/popular-equipment",
    params(StatsParams),
    responses(
        (status = 200, description = "Top 10 components by number of orders", body = [EquipmentCount]),
        (status = 500, description = "Internal server error"),
    ),
    tag = "analytics"
)]
pub async fn popular_equipment(
    ctx: web::Data<AppContext>,
    query: web::Query<StatsParams>,
) -> Result<HttpResponse, AppError> {
    let stats = stats_for(ctx, query.range()).await?;
    Ok(HttpResponse::Ok().json(equipment_counts(&stats)))
}
