pub mod handlers;

pub use handlers::{get_engagement, get_market_insights};

use actix_web::{web, HttpResponse, Responder};
use serde::Serialize;
use std::sync::Arc;

use crate::cache::CachedInsights;
use crate::config::InsightsConfig;

/// Application state shared across all handlers
pub struct AppState {
    pub config: Arc<InsightsConfig>,
    pub insights: Arc<CachedInsights>,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    service: String,
    version: String,
}

/// Health check endpoint
async fn health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        service: "insights-service".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Configure application routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .route("/health", web::get().to(health))
            .route(
                "/restaurants/{id}/insights",
                web::get().to(handlers::get_market_insights),
            )
            .route(
                "/restaurants/{id}/engagement",
                web::get().to(handlers::get_engagement),
            ),
    );
}
