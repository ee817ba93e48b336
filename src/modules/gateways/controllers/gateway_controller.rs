use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use actix_web::{web, HttpRequest, HttpResponse};

use crate::core::{ApiResponse, AppError};
use crate::modules::gateways::models::GatewayProvider;
use crate::modules::gateways::services::{GatewayService, ParamSet};
use crate::modules::payments::services::{CheckoutRequest, PaymentService};

/// List providers and whether they can take payments
/// GET /gateways
pub async fn list_gateways(
    service: web::Data<Arc<GatewayService>>,
) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(ApiResponse::ok(service.list_gateways())))
}

/// Start a gateway payment and hand back the signed redirect
/// POST /payments/gateway/{provider}/checkout
pub async fn checkout(
    service: web::Data<Arc<PaymentService>>,
    path: web::Path<String>,
    request: web::Json<CheckoutRequest>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let provider: GatewayProvider = path.into_inner().parse()?;
    let response = service
        .initiate_gateway_checkout(provider, request.into_inner(), &client_ip(&req))
        .await?;

    Ok(HttpResponse::Created().json(ApiResponse::ok(response)))
}

/// Customer return from the provider; the query string carries the signed result
/// GET /payments/gateway/{provider}/return
pub async fn gateway_return(
    service: web::Data<Arc<PaymentService>>,
    path: web::Path<String>,
    query: web::Query<HashMap<String, String>>,
) -> Result<HttpResponse, AppError> {
    let provider: GatewayProvider = path.into_inner().parse()?;
    let params: ParamSet = query.into_inner().into_iter().collect();

    let outcome = service.handle_gateway_return(provider, &params).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(outcome)))
}

/// Caller IP without the port; loopback when unknown
fn client_ip(req: &HttpRequest) -> String {
    let info = req.connection_info();
    let addr = info.realip_remote_addr().unwrap_or("127.0.0.1");
    addr.parse::<SocketAddr>()
        .map(|socket| socket.ip().to_string())
        .unwrap_or_else(|_| addr.to_string())
}

/// `/gateways` listing
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/gateways").route("", web::get().to(list_gateways)));
}

/// Gateway routes nested under `/payments`
pub fn configure_payment_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/gateway/{provider}")
            .route("/checkout", web::post().to(checkout))
            .route("/return", web::get().to(gateway_return)),
    );
}
