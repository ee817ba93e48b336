use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;

use crate::core::ApiResponse;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Readiness {
    pub ready: bool,
    pub database: bool,
}

/// GET /health - liveness, no dependency checks
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::ok(HealthStatus {
        status: "healthy".to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    }))
}

/// GET /ready - readiness, pings the database
pub async fn readiness_check(pool: web::Data<MySqlPool>) -> HttpResponse {
    let database = match sqlx::query("SELECT 1").fetch_one(pool.get_ref()).await {
        Ok(_) => true,
        Err(e) => {
            tracing::error!(error = %e, "Database readiness check failed");
            false
        }
    };

    let body = ApiResponse::ok(Readiness {
        ready: database,
        database,
    });

    if database {
        HttpResponse::Ok().json(body)
    } else {
        HttpResponse::ServiceUnavailable().json(body)
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/ready", web::get().to(readiness_check));
}
