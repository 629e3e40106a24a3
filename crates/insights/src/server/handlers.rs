use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

use super::AppState;

/// Query parameters for the engagement endpoint
#[derive(Debug, Deserialize)]
pub struct EngagementQuery {
    /// Time period: "7d" or "30d"
    #[serde(default = "default_period")]
    pub period: String,
}

fn default_period() -> String {
    "30d".to_string()
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// GET /api/v1/restaurants/{id}/insights - Competitive market insights
///
/// Returns the visibility score, peer percentile, benchmark comparison,
/// trending peers, and prioritized recommendations for one restaurant.
/// Degraded market states (too few peers, incomplete profile) come back as
/// 200s with explanatory text; only store failures are 500s.
pub async fn get_market_insights(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> impl Responder {
    let restaurant_id = path.into_inner();

    info!(restaurant_id = %restaurant_id, "Fetching market insights");

    match state.insights.market_insights(restaurant_id).await {
        Ok(insights) => HttpResponse::Ok().json(insights),
        Err(e) => {
            error!(error = %e, restaurant_id = %restaurant_id, "Failed to compute market insights");
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: format!("Failed to compute market insights: {}", e),
            })
        }
    }
}

/// GET /api/v1/restaurants/{id}/engagement - Engagement totals
///
/// Query parameters:
/// - period: Time period ("7d", "30d", default: "30d")
pub async fn get_engagement(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    params: web::Query<EngagementQuery>,
) -> impl Responder {
    let restaurant_id = path.into_inner();

    info!(
        restaurant_id = %restaurant_id,
        period = %params.period,
        "Fetching engagement summary"
    );

    match state
        .insights
        .service()
        .metrics()
        .engagement_summary(restaurant_id, &params.period)
        .await
    {
        Ok(summary) => HttpResponse::Ok().json(summary),
        Err(e) => {
            error!(error = %e, restaurant_id = %restaurant_id, "Failed to fetch engagement summary");
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: format!("Failed to fetch engagement summary: {}", e),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_period() {
        assert_eq!(default_period(), "30d");
    }
}
