use std::sync::Arc;

use actix_web::{web, HttpResponse};

use crate::core::{ApiResponse, AppError};
use crate::modules::bills::models::{BillPayload, CreateBillRequest};
use crate::modules::bills::services::BillService;

/// Checkout: open a bill for one or more orders
/// POST /bills
pub async fn create_bill(
    service: web::Data<Arc<BillService>>,
    request: web::Json<CreateBillRequest>,
) -> Result<HttpResponse, AppError> {
    let bill = service.create_for_orders(request.into_inner()).await?;
    Ok(HttpResponse::Created().json(ApiResponse::ok(bill)))
}

/// GET /bills/{id}
pub async fn get_bill(
    service: web::Data<Arc<BillService>>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let bill = service.get(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(bill)))
}

/// PUT /bills/{id}
pub async fn update_bill(
    service: web::Data<Arc<BillService>>,
    path: web::Path<String>,
    payload: web::Json<BillPayload>,
) -> Result<HttpResponse, AppError> {
    let bill = service
        .update(&path.into_inner(), payload.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(bill)))
}

/// DELETE /bills/{id}
pub async fn delete_bill(
    service: web::Data<Arc<BillService>>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    service.delete(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::done("Bill deleted")))
}

/// POST /bills/{id}/cancel
pub async fn cancel_bill(
    service: web::Data<Arc<BillService>>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let bill = service.cancel(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(bill)))
}

/// GET /bills/{id}/settlement
pub async fn bill_settlement(
    service: web::Data<Arc<BillService>>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let settlement = service.settlement(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(settlement)))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/bills")
            .route("", web::post().to(create_bill))
            .route("/{id}", web::get().to(get_bill))
            .route("/{id}", web::put().to(update_bill))
            .route("/{id}", web::delete().to(delete_bill))
            .route("/{id}/cancel", web::post().to(cancel_bill))
            .route("/{id}/settlement", web::get().to(bill_settlement)),
    );
}
