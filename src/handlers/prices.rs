use std::str::FromStr;

use actix_web::{web, HttpResponse};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::catalog::{Component, District, EquipmentCategory};
use crate::errors::AppError;
use crate::AppContext;

#[derive(Debug, Serialize, ToSchema)]
pub struct GroundBandResponse {
    pub name: String,
    pub min_depth: u32,
    pub max_depth: u32,
    pub price_per_meter: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DistrictResponse {
    pub id: u32,
    pub name: String,
    pub base_price: String,
    pub depths: Vec<u32>,
    pub ground_bands: Vec<GroundBandResponse>,
}

impl From<District> for DistrictResponse {
    fn from(d: District) -> Self {
        Self {
            id: d.id,
            name: d.name,
            base_price: d.base_price.to_string(),
            depths: d.depths,
            ground_bands: d
                .ground_bands
                .into_iter()
                .map(|b| GroundBandResponse {
                    name: b.name,
                    min_depth: b.min_depth,
                    max_depth: b.max_depth,
                    price_per_meter: b.price_per_meter.to_string(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ComponentResponse {
    pub id: String,
    pub name: String,
    pub price: String,
}

impl From<Component> for ComponentResponse {
    fn from(c: Component) -> Self {
        Self {
            id: c.id,
            name: c.name,
            price: c.price.to_string(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EquipmentCategoryResponse {
    pub id: String,
    pub name: String,
    pub components: Vec<ComponentResponse>,
}

impl From<EquipmentCategory> for EquipmentCategoryResponse {
    fn from(c: EquipmentCategory) -> Self {
        Self {
            id: c.id,
            name: c.name,
            components: c.components.into_iter().map(ComponentResponse::from).collect(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateBasePriceRequest {
    /// Decimal price per meter as a string, e.g. "550"
    pub base_price: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePriceRequest {
    /// Decimal price as a string, e.g. "3200.50"
    pub price: String,
}

fn parse_price(raw: &str) -> Result<BigDecimal, AppError> {
    BigDecimal::from_str(raw.trim())
        .map_err(|e| AppError::BadRequest(format!("Invalid price '{}': {}", raw, e)))
}

/// GET /api/prices/districts
#[utoipa::path(
    get,
    path = "/api/prices/districts",
    responses(
        (status = 200, description = "All districts with their ground bands", body = [DistrictResponse]),
        (status = 500, description = "Internal server error"),
    ),
    tag = "prices"
)]
pub async fn list_districts(ctx: web::Data<AppContext>) -> Result<HttpResponse, AppError> {
    let districts = web::block(move || ctx.catalog.districts())
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    let body: Vec<DistrictResponse> = districts.into_iter().map(DistrictResponse::from).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// GET /api/prices/equipment
#[utoipa::path(
    get,
    path = "/api/prices/equipment",
    responses(
        (status = 200, description = "Equipment catalog by category", body = [EquipmentCategoryResponse]),
        (status = 500, description = "Internal server error"),
    ),
    tag = "prices"
)]
pub async fn list_equipment(ctx: web::Data<AppContext>) -> Result<HttpResponse, AppError> {
    let catalog = web::block(move || ctx.catalog.equipment())
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    let body: Vec<EquipmentCategoryResponse> = catalog
        .categories
        .into_iter()
        .map(EquipmentCategoryResponse::from)
        .collect();
    Ok(HttpResponse::Ok().json(body))
}

/// PUT /api/prices/districts/{id}
#[utoipa::path(
    put,
    path = "/api/prices/districts/{id}",
    params(
        ("id" = u32, Path, description = "District id"),
    ),
    request_body = UpdateBasePriceRequest,
    responses(
        (status = 200, description = "Base price updated", body = DistrictResponse),
        (status = 400, description = "Negative or malformed price"),
        (status = 404, description = "District not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "prices"
)]
pub async fn update_district_price(
    ctx: web::Data<AppContext>,
    path: web::Path<u32>,
    body: web::Json<UpdateBasePriceRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let price = parse_price(&body.base_price)?;

    let district = web::block(move || ctx.catalog.set_district_base_price(id, price))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(DistrictResponse::from(district)))
}

/// PUT /api/prices/equipment/{category_id}/{component_id}
#[utoipa::path(
    put,
    path = "/api/prices/equipment/{category_id}/{component_id}",
    params(
        ("category_id" = String, Path, description = "Equipment category id"),
        ("component_id" = String, Path, description = "Component id within the category"),
    ),
    request_body = UpdatePriceRequest,
    responses(
        (status = 200, description = "Component price updated", body = ComponentResponse),
        (status = 400, description = "Negative or malformed price"),
        (status = 404, description = "Category or component not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "prices"
)]
pub async fn update_component_price(
    ctx: web::Data<AppContext>,
    path: web::Path<(String, String)>,
    body: web::Json<UpdatePriceRequest>,
) -> Result<HttpResponse, AppError> {
    let (category_id, component_id) = path.into_inner();
    let price = parse_price(&body.price)?;

    let component = web::block(move || {
        ctx.catalog
            .set_component_price(&category_id, &component_id, price)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(ComponentResponse::from(component)))
}
