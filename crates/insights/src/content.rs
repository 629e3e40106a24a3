//! Content store access and content-quality ratios.
//!
//! Restaurant content (menus, happy hours, specials, events, photos,
//! descriptions) is owned by the platform's CRUD surface; this service only
//! reads pre-joined snapshots of it.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

/// Descriptions at or below this length are treated as placeholder text and
/// do not count toward completeness.
pub const MIN_DESCRIPTION_CHARS: usize = 10;

/// Days without a content update after which freshness bottoms out at 0.
pub const FRESHNESS_WINDOW_DAYS: f64 = 90.0;

const COMPLETENESS_FACTORS: f64 = 6.0;

/// One restaurant's content snapshot, one row per restaurant.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RestaurantContent {
    pub id: Uuid,
    pub name: String,
    pub city: Option<String>,
    /// Category tags; the first is the primary category.
    pub categories: Vec<String>,
    pub menu_items: i64,
    pub happy_hours: i64,
    pub active_specials: i64,
    pub upcoming_events: i64,
    pub photos: i64,
    pub description: Option<String>,
    pub average_rating: Option<f64>,
    pub last_content_update: Option<DateTime<Utc>>,
}

impl RestaurantContent {
    /// True when the description is present and longer than the placeholder
    /// threshold.
    pub fn has_description(&self) -> bool {
        self.description
            .as_deref()
            .map(|d| d.chars().count() > MIN_DESCRIPTION_CHARS)
            .unwrap_or(false)
    }

    pub fn primary_category(&self) -> Option<&str> {
        self.categories.first().map(String::as_str)
    }
}

/// Content completeness: the share of the six content factors a restaurant
/// has filled in, in [0, 1].
pub fn content_completeness(content: &RestaurantContent) -> f64 {
    let filled = [
        content.menu_items > 0,
        content.happy_hours > 0,
        content.active_specials > 0,
        content.upcoming_events > 0,
        content.photos > 0,
        content.has_description(),
    ]
    .iter()
    .filter(|present| **present)
    .count();

    filled as f64 / COMPLETENESS_FACTORS
}

/// Content freshness: 1.0 for content updated now, decaying linearly to 0.0
/// at 90 days, clamped to [0, 1]. Restaurants that never updated score 0.
pub fn freshness_ratio(last_update: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    let Some(updated_at) = last_update else {
        return 0.0;
    };

    let days_since = (now - updated_at).num_seconds() as f64 / 86_400.0;
    (1.0 - days_since / FRESHNESS_WINDOW_DAYS).clamp(0.0, 1.0)
}

/// Read-only access to restaurant content rows.
#[derive(Clone)]
pub struct ContentStore {
    pool: PgPool,
}

const CONTENT_SELECT: &str = r#"
    SELECT
        r.id,
        r.name,
        r.city,
        r.description,
        r.average_rating,
        r.last_content_update,
        COALESCE(
            ARRAY_AGG(DISTINCT rc.category) FILTER (WHERE rc.category IS NOT NULL),
            '{}'
        ) as categories,
        COUNT(DISTINCT mi.id) as menu_items,
        COUNT(DISTINCT hh.id) as happy_hours,
        COUNT(DISTINCT sp.id) as active_specials,
        COUNT(DISTINCT ev.id) as upcoming_events,
        COUNT(DISTINCT ph.id) as photos
    FROM restaurants r
    LEFT JOIN restaurant_categories rc ON rc.restaurant_id = r.id
    LEFT JOIN menu_items mi ON mi.restaurant_id = r.id AND mi.is_active
    LEFT JOIN happy_hours hh ON hh.restaurant_id = r.id AND hh.is_active
    LEFT JOIN specials sp ON sp.restaurant_id = r.id AND sp.is_active
    LEFT JOIN events ev ON ev.restaurant_id = r.id AND ev.starts_at >= NOW()
    LEFT JOIN restaurant_photos ph ON ph.restaurant_id = r.id
"#;

impl ContentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetch one active restaurant's content snapshot.
    #[instrument(skip(self))]
    pub async fn fetch_restaurant(
        &self,
        id: Uuid,
    ) -> Result<Option<RestaurantContent>, sqlx::Error> {
        let query = format!(
            "{CONTENT_SELECT} WHERE r.id = $1 AND r.is_active GROUP BY r.id"
        );

        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| row_to_content(&r)).transpose()
    }

    /// Fetch the comparison set: every active restaurant in the city sharing
    /// at least one category tag. Includes the requesting restaurant itself.
    #[instrument(skip(self, categories), fields(city = %city, categories = categories.len()))]
    pub async fn fetch_competitive_set(
        &self,
        city: &str,
        categories: &[String],
    ) -> Result<Vec<RestaurantContent>, sqlx::Error> {
        let query = format!(
            r#"{CONTENT_SELECT}
            WHERE r.city = $1
              AND r.is_active
              AND EXISTS (
                  SELECT 1 FROM restaurant_categories shared
                  WHERE shared.restaurant_id = r.id AND shared.category = ANY($2)
              )
            GROUP BY r.id
            ORDER BY r.name ASC
            "#
        );

        let rows = sqlx::query(&query)
            .bind(city)
            .bind(categories)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_content).collect()
    }
}

fn row_to_content(row: &PgRow) -> Result<RestaurantContent, sqlx::Error> {
    Ok(RestaurantContent {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        city: row.try_get("city")?,
        categories: row.try_get("categories")?,
        menu_items: row.try_get("menu_items")?,
        happy_hours: row.try_get("happy_hours")?,
        active_specials: row.try_get("active_specials")?,
        upcoming_events: row.try_get("upcoming_events")?,
        photos: row.try_get("photos")?,
        description: row.try_get("description")?,
        average_rating: row.try_get("average_rating")?,
        last_content_update: row.try_get("last_content_update")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn content(description: Option<&str>) -> RestaurantContent {
        RestaurantContent {
            id: Uuid::new_v4(),
            name: "Test Kitchen".to_string(),
            city: Some("Lancaster".to_string()),
            categories: vec!["italian".to_string()],
            menu_items: 0,
            happy_hours: 0,
            active_specials: 0,
            upcoming_events: 0,
            photos: 0,
            description: description.map(str::to_string),
            average_rating: None,
            last_content_update: None,
        }
    }

    #[test]
    fn test_completeness_is_exact_sixths() {
        let mut c = content(None);
        assert_eq!(content_completeness(&c), 0.0);

        c.menu_items = 12;
        assert!((content_completeness(&c) - 1.0 / 6.0).abs() < 1e-9);

        c.happy_hours = 2;
        c.active_specials = 1;
        c.upcoming_events = 3;
        c.photos = 8;
        c.description = Some("A cozy trattoria off Prince Street".to_string());
        assert!((content_completeness(&c) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_completeness_counts_each_filled_factor() {
        // One active special and three photos: two of six factors filled.
        let mut c = content(None);
        c.active_specials = 1;
        c.photos = 3;
        assert!((content_completeness(&c) - 2.0 / 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_description_placeholder_threshold() {
        assert!(!content(None).has_description());
        assert!(!content(Some("")).has_description());
        // Exactly 10 characters is still placeholder territory.
        assert!(!content(Some("0123456789")).has_description());
        assert!(content(Some("01234567890")).has_description());
    }

    #[test]
    fn test_short_description_does_not_count_toward_completeness() {
        let c = content(Some("Good food"));
        assert_eq!(content_completeness(&c), 0.0);
    }

    #[test]
    fn test_freshness_decay() {
        let now = Utc::now();

        assert_eq!(freshness_ratio(Some(now), now), 1.0);
        assert_eq!(freshness_ratio(None, now), 0.0);

        let half = freshness_ratio(Some(now - Duration::days(45)), now);
        assert!((half - 0.5).abs() < 1e-6);

        assert_eq!(freshness_ratio(Some(now - Duration::days(90)), now), 0.0);
        assert_eq!(freshness_ratio(Some(now - Duration::days(365)), now), 0.0);
    }

    #[test]
    fn test_freshness_future_timestamp_clamps() {
        let now = Utc::now();
        assert_eq!(freshness_ratio(Some(now + Duration::days(3)), now), 1.0);
    }

    #[test]
    fn test_primary_category() {
        let mut c = content(None);
        assert_eq!(c.primary_category(), Some("italian"));

        c.categories.clear();
        assert_eq!(c.primary_category(), None);
    }
}
