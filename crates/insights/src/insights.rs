//! Market insights pipeline.
//!
//! One invocation reads the requester's content row, assembles the
//! comparison set (same city, overlapping category), snapshots engagement
//! for the whole set, and scores everything in memory. Nothing is written
//! back; two invocations over the same stored state produce the same
//! payload.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::content::{content_completeness, freshness_ratio, ContentStore, RestaurantContent};
use crate::metrics::{count_for, EngagementSnapshot, MetricsStore};
use crate::recommend::{content_gaps, detect_trending, Priority, Recommendation, TrendingEntry};
use crate::scoring::{
    composite_score, factor_percentiles, peer_percentile, FactorValues, FactorWeights,
};

/// Peers included in the benchmark averages.
const TOP_SET_SIZE: usize = 10;

/// Errors that abort an insights invocation.
///
/// Degraded market states (too few peers, incomplete profile, unknown
/// restaurant) are not errors; they come back as regular payloads with
/// explanatory text. Only an unreachable store fails the request, because a
/// score computed from a partial snapshot would be fabricated.
#[derive(Debug, thiserror::Error)]
pub enum InsightsError {
    #[error("database query failed: {0}")]
    Database(#[from] sqlx::Error),
}

/// The competitive context a score was computed within.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CompetitiveSet {
    pub category: String,
    pub city: String,
    pub total_count: usize,
}

/// Content counts used for benchmark comparison. Counts for a single
/// restaurant, averages for the top performers.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ContentMetrics {
    pub menu_items: f64,
    pub happy_hours: f64,
    pub active_specials: f64,
    pub upcoming_events: f64,
    pub photos: f64,
    /// 0 or 1 for a single restaurant; the qualifying share for a set.
    pub with_description: f64,
}

impl ContentMetrics {
    fn of(restaurant: &RestaurantContent) -> Self {
        Self {
            menu_items: restaurant.menu_items as f64,
            happy_hours: restaurant.happy_hours as f64,
            active_specials: restaurant.active_specials as f64,
            upcoming_events: restaurant.upcoming_events as f64,
            photos: restaurant.photos as f64,
            with_description: if restaurant.has_description() { 1.0 } else { 0.0 },
        }
    }

    fn average(restaurants: &[&RestaurantContent]) -> Self {
        let n = restaurants.len().max(1) as f64;
        let sum = |value: fn(&RestaurantContent) -> f64| -> f64 {
            restaurants.iter().map(|r| value(r)).sum::<f64>() / n
        };

        Self {
            menu_items: sum(|r| r.menu_items as f64),
            happy_hours: sum(|r| r.happy_hours as f64),
            active_specials: sum(|r| r.active_specials as f64),
            upcoming_events: sum(|r| r.upcoming_events as f64),
            photos: sum(|r| r.photos as f64),
            with_description: sum(|r| if r.has_description() { 1.0 } else { 0.0 }),
        }
    }
}

/// Benchmark comparison between the requester and the top performers.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Benchmarks {
    pub you: ContentMetrics,
    pub top_ten_avg: ContentMetrics,
}

/// The full insights payload returned to the owner dashboard.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MarketInsights {
    /// Weighted composite of the six factor percentiles, 0-100.
    pub visibility_score: f64,
    /// Share of the comparison set this restaurant outperforms, 0-100.
    pub percentile: f64,
    pub comparison_text: String,
    pub competitive_set: CompetitiveSet,
    pub benchmarks: Option<Benchmarks>,
    pub trending: Vec<TrendingEntry>,
    pub recommendations: Vec<Recommendation>,
}

/// Computes competitive market insights for one restaurant on demand.
#[derive(Clone)]
pub struct InsightsService {
    content: ContentStore,
    metrics: MetricsStore,
    weights: FactorWeights,
}

impl InsightsService {
    /// Create the service over a shared pool, validating the weight vector.
    pub fn new(pool: PgPool, weights: FactorWeights) -> anyhow::Result<Self> {
        weights.validate()?;

        Ok(Self {
            content: ContentStore::new(pool.clone()),
            metrics: MetricsStore::new(pool),
            weights,
        })
    }

    pub fn metrics(&self) -> &MetricsStore {
        &self.metrics
    }

    /// Compute the full insights payload for one restaurant.
    #[instrument(skip(self), fields(restaurant_id = %restaurant_id))]
    pub async fn market_insights(
        &self,
        restaurant_id: Uuid,
    ) -> Result<MarketInsights, InsightsError> {
        let now = Utc::now();

        let Some(you) = self.content.fetch_restaurant(restaurant_id).await? else {
            info!("Restaurant has no content row; returning degraded payload");
            return Ok(not_in_competitive_set());
        };

        let Some(city) = you.city.clone().filter(|c| !c.is_empty()) else {
            info!("Restaurant is missing a city; returning degraded payload");
            return Ok(incomplete_profile(&you));
        };
        if you.primary_category().is_none() {
            info!("Restaurant has no category tags; returning degraded payload");
            return Ok(incomplete_profile(&you));
        }

        let comparison_set = self
            .content
            .fetch_competitive_set(&city, &you.categories)
            .await?;

        if comparison_set.len() < 2 {
            info!(
                peers = comparison_set.len(),
                "Comparison set too small to score"
            );
            return Ok(insufficient_peers(&you, &city, comparison_set.len()));
        }

        let ids: Vec<Uuid> = comparison_set.iter().map(|r| r.id).collect();
        let snapshot = self.metrics.engagement_snapshot(&ids, now).await?;

        Ok(compute_insights(
            restaurant_id,
            &comparison_set,
            &snapshot,
            &self.weights,
            now,
        ))
    }
}

/// Score a comparison set and assemble the insights payload.
///
/// Pure over its inputs: the same set and snapshot always produce the same
/// payload. The degraded branches mirror the service-level short circuits
/// so the function is total over any input.
pub fn compute_insights(
    requester: Uuid,
    comparison_set: &[RestaurantContent],
    snapshot: &EngagementSnapshot,
    weights: &FactorWeights,
    now: DateTime<Utc>,
) -> MarketInsights {
    let Some(you) = comparison_set.iter().find(|r| r.id == requester) else {
        return not_in_competitive_set();
    };

    let city = you.city.clone().filter(|c| !c.is_empty());
    let Some(city) = city else {
        return incomplete_profile(you);
    };
    if you.primary_category().is_none() {
        return incomplete_profile(you);
    }

    if comparison_set.len() < 2 {
        return insufficient_peers(you, &city, comparison_set.len());
    }

    let factors: Vec<(Uuid, FactorValues)> = comparison_set
        .iter()
        .map(|r| (r.id, raw_factors(r, snapshot, now)))
        .collect();

    let percentiles = factor_percentiles(&factors);

    let mut ranked: Vec<(f64, &RestaurantContent)> = comparison_set
        .iter()
        .map(|r| {
            let pct = percentiles.get(&r.id).copied().unwrap_or_default();
            (composite_score(&pct, weights), r)
        })
        .collect();
    ranked.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

    let rank_index = ranked
        .iter()
        .position(|(_, r)| r.id == requester)
        .unwrap_or(ranked.len() - 1);
    let visibility_score = ranked[rank_index].0.round();
    let percentile = peer_percentile(rank_index, ranked.len()).round();

    let ranked_refs: Vec<&RestaurantContent> = ranked.iter().map(|(_, r)| *r).collect();
    let top_set: Vec<&RestaurantContent> = ranked_refs
        .iter()
        .take(TOP_SET_SIZE)
        .copied()
        .collect();

    let category = you.primary_category().unwrap_or_default().to_string();
    let comparison_text = format!(
        "You rank #{} of {} {} restaurants in {}, ahead of {:.0}% of your competitive set.",
        rank_index + 1,
        ranked.len(),
        category,
        city,
        percentile,
    );

    MarketInsights {
        visibility_score,
        percentile,
        comparison_text,
        competitive_set: CompetitiveSet {
            category,
            city,
            total_count: ranked.len(),
        },
        benchmarks: Some(Benchmarks {
            you: ContentMetrics::of(you),
            top_ten_avg: ContentMetrics::average(&top_set),
        }),
        trending: detect_trending(&ranked_refs, requester, snapshot),
        recommendations: content_gaps(you, &top_set),
    }
}

fn raw_factors(
    restaurant: &RestaurantContent,
    snapshot: &EngagementSnapshot,
    now: DateTime<Utc>,
) -> FactorValues {
    let views = count_for(&snapshot.views_30d, restaurant.id) as f64;
    let clicks = count_for(&snapshot.clicks_30d, restaurant.id) as f64;

    FactorValues {
        views,
        click_through: if views > 0.0 { clicks / views } else { 0.0 },
        favorites: count_for(&snapshot.favorites_30d, restaurant.id) as f64,
        rating: restaurant.average_rating.unwrap_or(0.0),
        completeness: content_completeness(restaurant),
        freshness: freshness_ratio(restaurant.last_content_update, now),
    }
}

fn not_in_competitive_set() -> MarketInsights {
    MarketInsights {
        visibility_score: 0.0,
        percentile: 0.0,
        comparison_text:
            "This restaurant is not appearing in a competitive set yet. Publish your listing to start tracking visibility."
                .to_string(),
        competitive_set: CompetitiveSet {
            category: String::new(),
            city: String::new(),
            total_count: 0,
        },
        benchmarks: None,
        trending: Vec::new(),
        recommendations: Vec::new(),
    }
}

fn incomplete_profile(you: &RestaurantContent) -> MarketInsights {
    MarketInsights {
        visibility_score: 0.0,
        percentile: 0.0,
        comparison_text:
            "Add a city and at least one category to your profile to unlock market insights."
                .to_string(),
        competitive_set: CompetitiveSet {
            category: you.primary_category().unwrap_or_default().to_string(),
            city: you.city.clone().unwrap_or_default(),
            total_count: 0,
        },
        benchmarks: None,
        trending: Vec::new(),
        recommendations: vec![Recommendation {
            priority: Priority::High,
            message: "Your profile is missing the city or category tags used to build your competitive set."
                .to_string(),
            action: "complete_profile".to_string(),
            action_label: "Complete Your Profile".to_string(),
        }],
    }
}

fn insufficient_peers(you: &RestaurantContent, city: &str, total: usize) -> MarketInsights {
    let category = you.primary_category().unwrap_or_default().to_string();

    MarketInsights {
        visibility_score: 50.0,
        percentile: 50.0,
        comparison_text: format!(
            "Not enough {} restaurants in {} to compare against yet. Check back as more spots join.",
            category, city,
        ),
        competitive_set: CompetitiveSet {
            category,
            city: city.to_string(),
            total_count: total,
        },
        benchmarks: None,
        trending: Vec::new(),
        recommendations: Vec::new(),
    }
}
