use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::database::Database;

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub database: String,
    pub timestamp: i64,
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Database unreachable", body = HealthResponse)
    )
)]
pub async fn health_check(db: web::Data<Database>) -> HttpResponse {
    let (status, database) = match db.ping().await {
        Ok(()) => ("healthy", "connected".to_string()),
        Err(e) => {
            log::warn!("⚠️ Health check: database ping failed: {}", e);
            ("degraded", format!("unreachable: {}", e))
        }
    };

    let body = HealthResponse {
        status: status.to_string(),
        service: "medbot-assist".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database,
        timestamp: chrono::Utc::now().timestamp(),
    };

    if status == "healthy" {
        HttpResponse::Ok().json(body)
    } else {
        HttpResponse::ServiceUnavailable().json(body)
    }
}
