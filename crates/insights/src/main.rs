//! Insights Service - Competitive Market Insights for Restaurant Owners
//!
//! Port: 8083
//! Read-only over the platform database; all writes belong to other services.

use actix_web::{web, App, HttpResponse, HttpServer};
use std::sync::Arc;
use tastelanc_insights::{config, server};
use tracing::info;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .json()
        .init();

    info!("Starting Insights Service");

    // Load configuration
    let config = Arc::new(config::InsightsConfig::load()?);
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);

    info!("Insights Service listening on {}", bind_addr);

    // Initialize service components
    let insights = tastelanc_insights::init_service(config.clone()).await?;

    // Create application state
    let app_state = web::Data::new(server::AppState {
        config: config.clone(),
        insights,
    });

    // Start HTTP server with routes
    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .route("/health", web::get().to(health_check))
            .route("/ready", web::get().to(readiness_check))
            .configure(server::configure_routes)
            .wrap(actix_web::middleware::Logger::default())
    })
    .workers(config.server.workers.unwrap_or_else(num_cpus::get))
    .bind(&bind_addr)?
    .run()
    .await?;

    Ok(())
}

async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "insights-service",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn readiness_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ready"
    }))
}
