//! Visibility scoring: per-factor percentile ranking and the weighted
//! composite score.
//!
//! Two different "percentile" notions live here and are deliberately named
//! apart. A *factor percentile* is a scoring input: where a restaurant's raw
//! value for one factor falls within its comparison set. The *peer
//! percentile* is the outward-facing rank descriptor: the share of the
//! comparison set a restaurant outperforms by composite score.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use uuid::Uuid;

/// Relative weight of each factor in the composite visibility score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FactorWeights {
    pub views: f64,
    pub click_through: f64,
    pub favorites: f64,
    pub rating: f64,
    pub completeness: f64,
    pub freshness: f64,
}

impl FactorWeights {
    /// Create a new weight vector, rejecting vectors that do not sum to 1.0.
    pub fn new(
        views: f64,
        click_through: f64,
        favorites: f64,
        rating: f64,
        completeness: f64,
        freshness: f64,
    ) -> anyhow::Result<Self> {
        let weights = Self {
            views,
            click_through,
            favorites,
            rating,
            completeness,
            freshness,
        };

        weights.validate()?;
        Ok(weights)
    }

    /// Validate that weights sum to 1.0 (with small tolerance for floating point)
    pub fn validate(&self) -> anyhow::Result<()> {
        const EPSILON: f64 = 0.0001;

        let sum = self.total_weight();
        if (sum - 1.0).abs() > EPSILON {
            return Err(anyhow::anyhow!("Weights must sum to 1.0, got {:.4}", sum));
        }

        if self.views < 0.0
            || self.click_through < 0.0
            || self.favorites < 0.0
            || self.rating < 0.0
            || self.completeness < 0.0
            || self.freshness < 0.0
        {
            return Err(anyhow::anyhow!("All weights must be non-negative"));
        }

        Ok(())
    }

    /// Get total weight (should always be 1.0 if validated)
    pub fn total_weight(&self) -> f64 {
        self.views
            + self.click_through
            + self.favorites
            + self.rating
            + self.completeness
            + self.freshness
    }
}

impl Default for FactorWeights {
    fn default() -> Self {
        Self {
            views: 0.30,
            click_through: 0.15,
            favorites: 0.15,
            rating: 0.15,
            completeness: 0.20,
            freshness: 0.05,
        }
    }
}

/// Raw per-restaurant factor values for one scoring invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FactorValues {
    /// Page views over the trailing 30 days.
    pub views: f64,
    /// Clicks per page view over the trailing 30 days, 0 when there were no views.
    pub click_through: f64,
    /// Favorites added over the trailing 30 days.
    pub favorites: f64,
    /// Average rating on the 0-5 scale, 0 when unrated.
    pub rating: f64,
    /// Content completeness ratio in [0, 1].
    pub completeness: f64,
    /// Content freshness ratio in [0, 1].
    pub freshness: f64,
}

/// Where each raw factor value falls within the comparison set, 0-100.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FactorPercentiles {
    pub views: f64,
    pub click_through: f64,
    pub favorites: f64,
    pub rating: f64,
    pub completeness: f64,
    pub freshness: f64,
}

/// Rank one factor's raw values into percentiles within the set.
///
/// Stable ascending sort; `percentile = index / (len - 1) * 100`, so the
/// minimum lands on 0 and the maximum on 100. Tied values keep their input
/// order and receive adjacent, distinct percentiles. A set of size 1 ranks
/// its only member at 100.
pub fn rank_percentiles(values: &[(Uuid, f64)]) -> HashMap<Uuid, f64> {
    if values.len() <= 1 {
        return values.iter().map(|(id, _)| (*id, 100.0)).collect();
    }

    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| {
        values[a]
            .1
            .partial_cmp(&values[b].1)
            .unwrap_or(Ordering::Equal)
    });

    let denom = (values.len() - 1).max(1) as f64;
    order
        .iter()
        .enumerate()
        .map(|(position, &index)| (values[index].0, position as f64 / denom * 100.0))
        .collect()
}

/// Compute all six factor percentile maps for a comparison set.
pub fn factor_percentiles(units: &[(Uuid, FactorValues)]) -> HashMap<Uuid, FactorPercentiles> {
    let rank_of = |extract: fn(&FactorValues) -> f64| -> HashMap<Uuid, f64> {
        let raw: Vec<(Uuid, f64)> = units.iter().map(|(id, f)| (*id, extract(f))).collect();
        rank_percentiles(&raw)
    };

    let views = rank_of(|f| f.views);
    let click_through = rank_of(|f| f.click_through);
    let favorites = rank_of(|f| f.favorites);
    let rating = rank_of(|f| f.rating);
    let completeness = rank_of(|f| f.completeness);
    let freshness = rank_of(|f| f.freshness);

    let at = |map: &HashMap<Uuid, f64>, id: &Uuid| map.get(id).copied().unwrap_or(0.0);

    units
        .iter()
        .map(|(id, _)| {
            (
                *id,
                FactorPercentiles {
                    views: at(&views, id),
                    click_through: at(&click_through, id),
                    favorites: at(&favorites, id),
                    rating: at(&rating, id),
                    completeness: at(&completeness, id),
                    freshness: at(&freshness, id),
                },
            )
        })
        .collect()
}

/// Weighted composite of the six factor percentiles, in [0, 100].
pub fn composite_score(percentiles: &FactorPercentiles, weights: &FactorWeights) -> f64 {
    percentiles.views * weights.views
        + percentiles.click_through * weights.click_through
        + percentiles.favorites * weights.favorites
        + percentiles.rating * weights.rating
        + percentiles.completeness * weights.completeness
        + percentiles.freshness * weights.freshness
}

/// Share of the comparison set a restaurant outperforms by composite score.
///
/// `rank_index` is the zero-based position after sorting descending by
/// composite. Sets with a single member default to 50.
pub fn peer_percentile(rank_index: usize, total: usize) -> f64 {
    if total <= 1 {
        return 50.0;
    }

    let above = (total - 1).saturating_sub(rank_index);
    above as f64 / (total - 1) as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<Uuid> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    #[test]
    fn test_weights_validation() {
        let valid = FactorWeights::new(0.30, 0.15, 0.15, 0.15, 0.20, 0.05);
        assert!(valid.is_ok());

        let invalid_sum = FactorWeights::new(0.5, 0.3, 0.2, 0.2, 0.1, 0.1);
        assert!(invalid_sum.is_err());
        assert!(invalid_sum
            .unwrap_err()
            .to_string()
            .contains("must sum to 1.0"));

        let invalid_negative = FactorWeights::new(0.5, -0.1, 0.2, 0.2, 0.1, 0.1);
        assert!(invalid_negative.is_err());
        assert!(invalid_negative
            .unwrap_err()
            .to_string()
            .contains("must be non-negative"));
    }

    #[test]
    fn test_default_weights() {
        let weights = FactorWeights::default();
        assert!(weights.validate().is_ok());
        assert!((weights.total_weight() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_rank_percentiles_min_max() {
        let ids = ids(3);
        let values = vec![(ids[0], 100.0), (ids[1], 50.0), (ids[2], 10.0)];

        let ranked = rank_percentiles(&values);
        assert_eq!(ranked[&ids[0]], 100.0);
        assert_eq!(ranked[&ids[1]], 50.0);
        assert_eq!(ranked[&ids[2]], 0.0);
    }

    #[test]
    fn test_rank_percentiles_bounds() {
        let ids = ids(7);
        let values: Vec<(Uuid, f64)> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| (*id, (i as f64 * 13.7) % 41.0))
            .collect();

        for pct in rank_percentiles(&values).values() {
            assert!(*pct >= 0.0 && *pct <= 100.0);
        }
    }

    #[test]
    fn test_rank_percentiles_single_member() {
        let id = Uuid::new_v4();
        let ranked = rank_percentiles(&[(id, 0.0)]);
        assert_eq!(ranked[&id], 100.0);
    }

    #[test]
    fn test_rank_percentiles_ties_keep_input_order() {
        let ids = ids(3);
        let values = vec![(ids[0], 5.0), (ids[1], 5.0), (ids[2], 1.0)];

        let ranked = rank_percentiles(&values);
        // Tied values stay in input order: the earlier entry sorts lower.
        assert_eq!(ranked[&ids[2]], 0.0);
        assert_eq!(ranked[&ids[0]], 50.0);
        assert_eq!(ranked[&ids[1]], 100.0);
    }

    #[test]
    fn test_composite_score_range() {
        let weights = FactorWeights::default();

        let floor = FactorPercentiles::default();
        assert_eq!(composite_score(&floor, &weights), 0.0);

        let ceiling = FactorPercentiles {
            views: 100.0,
            click_through: 100.0,
            favorites: 100.0,
            rating: 100.0,
            completeness: 100.0,
            freshness: 100.0,
        };
        assert!((composite_score(&ceiling, &weights) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_composite_score_weighting() {
        let weights = FactorWeights::default();
        let views_only = FactorPercentiles {
            views: 100.0,
            ..Default::default()
        };
        assert!((composite_score(&views_only, &weights) - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_peer_percentile() {
        // Top of a set of 5 outperforms everyone, bottom outperforms no one.
        assert_eq!(peer_percentile(0, 5), 100.0);
        assert_eq!(peer_percentile(4, 5), 0.0);
        assert_eq!(peer_percentile(2, 5), 50.0);

        assert_eq!(peer_percentile(0, 1), 50.0);
        assert_eq!(peer_percentile(0, 0), 50.0);
    }

    #[test]
    fn test_factor_percentiles_all_factors_ranked() {
        let ids = ids(2);
        let units = vec![
            (
                ids[0],
                FactorValues {
                    views: 10.0,
                    click_through: 0.5,
                    favorites: 3.0,
                    rating: 4.5,
                    completeness: 1.0,
                    freshness: 0.9,
                },
            ),
            (
                ids[1],
                FactorValues {
                    views: 2.0,
                    click_through: 0.1,
                    favorites: 1.0,
                    rating: 3.0,
                    completeness: 0.5,
                    freshness: 0.2,
                },
            ),
        ];

        let pct = factor_percentiles(&units);
        let top = pct[&ids[0]];
        let bottom = pct[&ids[1]];

        assert_eq!(top.views, 100.0);
        assert_eq!(top.click_through, 100.0);
        assert_eq!(top.favorites, 100.0);
        assert_eq!(top.rating, 100.0);
        assert_eq!(top.completeness, 100.0);
        assert_eq!(top.freshness, 100.0);
        assert_eq!(bottom.views, 0.0);
        assert_eq!(bottom.freshness, 0.0);
    }
}
