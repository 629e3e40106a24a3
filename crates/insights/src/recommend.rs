//! Trend detection and content-gap recommendations.

use serde::Serialize;
use uuid::Uuid;

use crate::content::RestaurantContent;
use crate::metrics::{count_for, EngagementSnapshot};

/// Spike multiplier over the trailing baseline that qualifies as a trend.
pub const TREND_SPIKE_RATIO: f64 = 1.5;

/// Maximum trending entries surfaced to the owner.
pub const MAX_TRENDING: usize = 5;

/// Gap ratios strictly above this are high priority.
const GAP_HIGH: f64 = 0.6;

/// Gap ratios strictly above this (and at or below the high bound) are medium.
const GAP_MEDIUM: f64 = 0.3;

/// Engagement badge for a peer restaurant. One badge per restaurant,
/// assigned in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Badge {
    MostFavorited,
    Trending,
    Rising,
}

impl Badge {
    pub fn label(&self) -> &'static str {
        match self {
            Badge::MostFavorited => "Most Favorited",
            Badge::Trending => "Trending",
            Badge::Rising => "Rising",
        }
    }
}

/// A peer restaurant with notable engagement this week.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TrendingEntry {
    pub name: String,
    pub badge: Badge,
    pub badge_label: String,
}

/// Recommendation urgency. Sort order is declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

/// One actionable recommendation for the requesting owner.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Recommendation {
    pub priority: Priority,
    pub message: String,
    pub action: String,
    pub action_label: String,
}

impl Recommendation {
    fn new(priority: Priority, message: String, action: &str, action_label: &str) -> Self {
        Self {
            priority,
            message,
            action: action.to_string(),
            action_label: action_label.to_string(),
        }
    }
}

/// Scan the comparison set (excluding the requester) for week-over-week
/// engagement spikes.
///
/// A restaurant gets at most one badge: Most Favorited beats Trending beats
/// Rising. Entries come out in the order `ranked` was given (composite rank)
/// and the list is capped at [`MAX_TRENDING`].
pub fn detect_trending(
    ranked: &[&RestaurantContent],
    requester: Uuid,
    snapshot: &EngagementSnapshot,
) -> Vec<TrendingEntry> {
    let most_favorited = ranked
        .iter()
        .filter(|r| r.id != requester)
        .map(|r| (r.id, count_for(&snapshot.favorites_this_week, r.id)))
        .filter(|(_, gained)| *gained > 0)
        .fold(None::<(Uuid, i64)>, |best, candidate| match best {
            Some((_, top)) if top >= candidate.1 => best,
            _ => Some(candidate),
        })
        .map(|(id, _)| id);

    let mut entries = Vec::new();
    for restaurant in ranked.iter().filter(|r| r.id != requester) {
        if entries.len() == MAX_TRENDING {
            break;
        }

        let badge = if most_favorited == Some(restaurant.id) {
            Badge::MostFavorited
        } else if is_trending(restaurant.id, snapshot) {
            Badge::Trending
        } else if is_rising(restaurant.id, snapshot) {
            Badge::Rising
        } else {
            continue;
        };

        entries.push(TrendingEntry {
            name: restaurant.name.clone(),
            badge,
            badge_label: badge.label().to_string(),
        });
    }

    entries
}

/// This-week impressions against the per-week average of the prior three
/// weeks.
fn is_trending(id: Uuid, snapshot: &EngagementSnapshot) -> bool {
    let this_week = count_for(&snapshot.impressions_this_week, id);
    let prior_weekly_avg =
        count_for(&snapshot.impressions_prior_three_weeks, id) as f64 / 3.0;

    this_week > 0 && this_week as f64 > TREND_SPIKE_RATIO * prior_weekly_avg
}

/// This-week page views against last week's.
fn is_rising(id: Uuid, snapshot: &EngagementSnapshot) -> bool {
    let this_week = count_for(&snapshot.views_this_week, id);
    let last_week = count_for(&snapshot.views_last_week, id);

    this_week > 0 && last_week > 0 && this_week as f64 > TREND_SPIKE_RATIO * last_week as f64
}

struct GapDimension {
    value: fn(&RestaurantContent) -> i64,
    noun: &'static str,
    action: &'static str,
    action_label: &'static str,
}

const GAP_DIMENSIONS: [GapDimension; 5] = [
    GapDimension {
        value: |r| r.happy_hours,
        noun: "happy hours",
        action: "add_happy_hour",
        action_label: "Add a Happy Hour",
    },
    GapDimension {
        value: |r| r.upcoming_events,
        noun: "upcoming events",
        action: "add_event",
        action_label: "Post an Event",
    },
    GapDimension {
        value: |r| r.active_specials,
        noun: "active specials",
        action: "add_special",
        action_label: "Add a Special",
    },
    GapDimension {
        value: |r| r.photos,
        noun: "photos",
        action: "add_photos",
        action_label: "Upload Photos",
    },
    GapDimension {
        value: |r| r.menu_items,
        noun: "menu items",
        action: "update_menu",
        action_label: "Update Your Menu",
    },
];

/// Compare the requester's content against the top performers and emit
/// prioritized recommendations for each shortfall.
///
/// For every dimension where the top performers average something, the gap
/// ratio is the relative shortfall: `(top_avg - yours) / top_avg`, floored
/// at 0. Strictly above 0.6 is high priority, strictly above 0.3 medium,
/// anything else above zero low. The description check is independent: it
/// fires when the requester lacks a qualifying description but more than
/// half of the top performers have one.
pub fn content_gaps(you: &RestaurantContent, top_set: &[&RestaurantContent]) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();

    if top_set.is_empty() {
        return recommendations;
    }

    for dimension in &GAP_DIMENSIONS {
        let top_avg = top_set
            .iter()
            .map(|r| (dimension.value)(r) as f64)
            .sum::<f64>()
            / top_set.len() as f64;

        if top_avg <= 0.0 {
            continue;
        }

        let yours = (dimension.value)(you);
        let gap = ((top_avg - yours as f64) / top_avg).max(0.0);
        if gap <= 0.0 {
            continue;
        }

        let priority = if gap > GAP_HIGH {
            Priority::High
        } else if gap > GAP_MEDIUM {
            Priority::Medium
        } else {
            Priority::Low
        };

        recommendations.push(Recommendation::new(
            priority,
            format!(
                "Top performers in your market average {:.0} {}; you have {}.",
                top_avg, dimension.noun, yours
            ),
            dimension.action,
            dimension.action_label,
        ));
    }

    let top_with_description = top_set.iter().filter(|r| r.has_description()).count();
    if !you.has_description() && top_with_description * 2 > top_set.len() {
        recommendations.push(Recommendation::new(
            Priority::Medium,
            "Most top performers in your market have a description; add one so diners know what makes you different.".to_string(),
            "add_description",
            "Write a Description",
        ));
    }

    // Stable: equal priorities keep dimension order.
    recommendations.sort_by_key(|r| r.priority);
    recommendations
}
