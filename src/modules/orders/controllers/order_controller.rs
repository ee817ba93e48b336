use std::sync::Arc;

use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::core::{ApiResponse, AppError};
use crate::modules::orders::models::OrderPayload;
use crate::modules::orders::services::OrderService;

/// Query parameters for listing orders
#[derive(Debug, Deserialize)]
pub struct ListOrdersQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

/// GET /orders
pub async fn list_orders(
    service: web::Data<Arc<OrderService>>,
    query: web::Query<ListOrdersQuery>,
) -> Result<HttpResponse, AppError> {
    let orders = service.list(query.limit, query.offset).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(orders)))
}

/// GET /orders/{id}
pub async fn get_order(
    service: web::Data<Arc<OrderService>>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let order = service.get(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(order)))
}

/// PUT /orders/{id}
/// Rejected with 409 once a sale order is settled
pub async fn update_order(
    service: web::Data<Arc<OrderService>>,
    path: web::Path<String>,
    payload: web::Json<OrderPayload>,
) -> Result<HttpResponse, AppError> {
    let order = service
        .update(&path.into_inner(), payload.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(order)))
}

/// DELETE /orders/{id}
pub async fn delete_order(
    service: web::Data<Arc<OrderService>>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    service.delete(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::done("Order deleted")))
}

/// GET /orders/{id}/settlement
pub async fn order_settlement(
    service: web::Data<Arc<OrderService>>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let settlement = service.settlement(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(settlement)))
}

/// Configure order routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/orders")
            .route("", web::get().to(list_orders))
            .route("/{id}", web::get().to(get_order))
            .route("/{id}", web::put().to(update_order))
            .route("/{id}", web::delete().to(delete_order))
            .route("/{id}/settlement", web::get().to(order_settlement)),
    );
}
