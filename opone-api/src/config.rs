//! API Configuration Module
//!
//! CORS and cache tuning knobs loaded from environment variables with
//! development defaults.

use std::time::Duration;

// ============================================================================
// API CONFIGURATION
// ============================================================================

/// API configuration for CORS and cache tuning.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    // ========================================================================
    // CORS Configuration
    // ========================================================================
    /// Allowed CORS origins (comma-separated in env var).
    /// Empty means allow all origins (dev mode).
    pub cors_origins: Vec<String>,

    /// Max age for CORS preflight cache in seconds.
    pub cors_max_age_secs: u64,

    // ========================================================================
    // Cache Configuration
    // ========================================================================
    /// Default TTL for query-cache entries.
    pub cache_default_ttl: Duration,

    /// TTL for the dashboard metrics snapshot.
    pub metrics_ttl: Duration,

    /// Period of the background expired-entry sweep.
    pub cache_sweep_interval: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            // CORS defaults: permissive for development
            cors_origins: Vec::new(), // Empty = allow all
            cors_max_age_secs: 86400, // 24 hours

            // Cache defaults
            cache_default_ttl: Duration::from_secs(300),
            metrics_ttl: Duration::from_secs(60),
            cache_sweep_interval: Duration::from_secs(300),
        }
    }
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// Environment variables:
    /// - `OPONE_CORS_ORIGINS`: Comma-separated allowed origins (empty = allow all)
    /// - `OPONE_CORS_MAX_AGE_SECS`: Preflight cache duration (default: 86400)
    /// - `OPONE_CACHE_TTL_SECS`: Default query-cache TTL (default: 300)
    /// - `OPONE_METRICS_TTL_SECS`: Dashboard snapshot TTL (default: 60)
    /// - `OPONE_CACHE_SWEEP_SECS`: Background sweep period (default: 300)
    pub fn from_env() -> Self {
        let cors_origins = std::env::var("OPONE_CORS_ORIGINS")
            .ok()
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let cors_max_age_secs = std::env::var("OPONE_CORS_MAX_AGE_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(86400);

        let secs = |name: &str, default: u64| {
            Duration::from_secs(
                std::env::var(name)
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(default),
            )
        };

        Self {
            cors_origins,
            cors_max_age_secs,
            cache_default_ttl: secs("OPONE_CACHE_TTL_SECS", 300),
            metrics_ttl: secs("OPONE_METRICS_TTL_SECS", 60),
            cache_sweep_interval: secs("OPONE_CACHE_SWEEP_SECS", 300),
        }
    }

    /// Check if running in production mode (strict CORS).
    pub fn is_production(&self) -> bool {
        !self.cors_origins.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ApiConfig::default();
        assert!(config.cors_origins.is_empty());
        assert_eq!(config.cors_max_age_secs, 86400);
        assert_eq!(config.cache_default_ttl, Duration::from_secs(300));
        assert_eq!(config.metrics_ttl, Duration::from_secs(60));
        assert_eq!(config.cache_sweep_interval, Duration::from_secs(300));
    }

    #[test]
    fn test_is_production() {
        let mut config = ApiConfig::default();
        assert!(!config.is_production());

        config.cors_origins = vec!["https://app.opone.dev".to_string()];
        assert!(config.is_production());
    }
}
