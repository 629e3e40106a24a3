use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::scoring::FactorWeights;

/// Insights Service Configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InsightsConfig {
    /// HTTP server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Insight cache configuration
    pub cache: CacheConfig,

    /// Scoring configuration
    #[serde(default)]
    pub scoring: ScoringConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Server host
    pub host: String,

    /// Server port (default: 8083)
    pub port: u16,

    /// Worker threads
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Connection pool size
    pub max_connections: u32,

    /// Connection timeout
    pub connect_timeout_sec: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Cache TTL for computed insight payloads (seconds)
    pub insight_ttl_sec: u64,
}

/// Scoring configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScoringConfig {
    /// Factor weights for the composite visibility score
    pub weights: FactorWeights,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: FactorWeights::default(),
        }
    }
}

impl Default for InsightsConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8083,
                workers: None,
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/tastelanc".to_string(),
                max_connections: 10,
                connect_timeout_sec: 10,
            },
            cache: CacheConfig {
                insight_ttl_sec: 300, // 5 minutes
            },
            scoring: ScoringConfig::default(),
        }
    }
}

impl InsightsConfig {
    /// Load configuration from environment and config file
    pub fn load() -> anyhow::Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("config/insights").required(false))
            .add_source(config::Environment::with_prefix("INSIGHTS"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Get insight cache TTL as Duration
    pub fn insight_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.insight_ttl_sec)
    }
}
