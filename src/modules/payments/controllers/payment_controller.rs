use std::sync::Arc;

use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::core::{ApiResponse, AppError};
use crate::modules::gateways::controllers::configure_payment_routes;
use crate::modules::payments::models::{CreatePaymentRequest, UpdatePaymentRequest};
use crate::modules::payments::services::PaymentService;

/// Filter for listing payments; one of the two is required
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPaymentsQuery {
    #[serde(default, alias = "bill_id")]
    pub bill_id: Option<String>,
    #[serde(default, alias = "order_id")]
    pub order_id: Option<String>,
}

/// GET /payments?billId=&orderId=
pub async fn list_payments(
    service: web::Data<Arc<PaymentService>>,
    query: web::Query<ListPaymentsQuery>,
) -> Result<HttpResponse, AppError> {
    let payments = service
        .list(query.bill_id.as_deref(), query.order_id.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(payments)))
}

/// GET /payments/{id}
pub async fn get_payment(
    service: web::Data<Arc<PaymentService>>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let payment = service.get(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(payment)))
}

/// Record a cash or other manual payment
/// POST /payments
pub async fn create_payment(
    service: web::Data<Arc<PaymentService>>,
    request: web::Json<CreatePaymentRequest>,
) -> Result<HttpResponse, AppError> {
    let payment = service.record_manual(request.into_inner()).await?;
    Ok(HttpResponse::Created().json(ApiResponse::ok(payment)))
}

/// PUT /payments/{id}
pub async fn update_payment(
    service: web::Data<Arc<PaymentService>>,
    path: web::Path<String>,
    request: web::Json<UpdatePaymentRequest>,
) -> Result<HttpResponse, AppError> {
    let payment = service
        .update(&path.into_inner(), request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(payment)))
}

/// Configure payment routes, gateway checkout/return included
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/payments")
            .configure(configure_payment_routes)
            .route("", web::get().to(list_payments))
            .route("", web::post().to(create_payment))
            .route("/{id}", web::get().to(get_payment))
            .route("/{id}", web::put().to(update_payment)),
    );
}
