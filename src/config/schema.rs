//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.
//! Every section has defaults so an empty file is a valid configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::odata::QueryLimits;

/// Root configuration for the book service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// OData surface: route prefix and query limits of `GET /Books`.
    pub odata: ODataConfig,

    /// Catalogue store settings.
    pub store: StoreConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    pub security: SecurityConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// OData route and query-option settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ODataConfig {
    /// Path prefix of the service root, without slashes (e.g., "odata").
    pub route_prefix: String,

    /// Server-driven page size of `GET /Books`.
    pub max_page_size: usize,

    /// Largest `$top` accepted by `GET /Books`.
    pub max_top: usize,

    /// Deepest `$expand` nesting accepted by `GET /Books`.
    pub max_expansion_depth: usize,

    /// Longest accepted `$filter` expression, in bytes.
    pub max_filter_length: usize,

    /// Most `$orderby` keys accepted.
    pub max_orderby_fields: usize,
}

impl Default for ODataConfig {
    fn default() -> Self {
        Self {
            route_prefix: "odata".to_string(),
            max_page_size: 100,
            max_top: 1,
            max_expansion_depth: 5,
            max_filter_length: 2000,
            max_orderby_fields: 5,
        }
    }
}

impl ODataConfig {
    /// Query limits of the `Books` entity set.
    pub fn list_limits(&self) -> QueryLimits {
        QueryLimits::new()
            .with_max_top(self.max_top)
            .with_page_size(self.max_page_size)
            .with_max_expansion_depth(self.max_expansion_depth)
            .with_max_filter_length(self.max_filter_length)
            .with_max_orderby_fields(self.max_orderby_fields)
    }

    /// Absolute path of the service root, always ending in `/`.
    pub fn service_root(&self) -> String {
        let prefix = self.route_prefix.trim_matches('/');
        if prefix.is_empty() {
            "/".to_string()
        } else {
            format!("/{prefix}/")
        }
    }
}

/// Catalogue store settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    /// When true, PUT/PATCH/DELETE validate and echo without changing the store.
    pub read_only: bool,

    /// JSON seed file; the built-in catalogue is used when unset.
    pub seed_path: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            read_only: true,
            seed_path: None,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: ServiceConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.odata.route_prefix, "odata");
        assert_eq!(config.odata.max_top, 1);
        assert_eq!(config.odata.max_page_size, 100);
        assert_eq!(config.odata.max_expansion_depth, 5);
        assert!(config.store.read_only);
        assert!(config.store.seed_path.is_none());
        assert_eq!(config.timeouts.request_secs, 30);
        assert!(!config.observability.metrics_enabled);
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config: ServiceConfig = toml::from_str(
            r#"
            [odata]
            max_top = 10

            [store]
            read_only = false
            seed_path = "books.json"
            "#,
        )
        .unwrap();
        assert_eq!(config.odata.max_top, 10);
        assert_eq!(config.odata.max_page_size, 100);
        assert!(!config.store.read_only);
        assert_eq!(config.store.seed_path, Some(PathBuf::from("books.json")));
    }

    #[test]
    fn test_list_limits() {
        let limits = ODataConfig::default().list_limits();
        assert_eq!(limits.max_top, Some(1));
        assert_eq!(limits.page_size, Some(100));
        assert_eq!(limits.max_expansion_depth, 5);
    }

    #[test]
    fn test_service_root() {
        assert_eq!(ODataConfig::default().service_root(), "/odata/");
        let bare = ODataConfig {
            route_prefix: String::new(),
            ..Default::default()
        };
        assert_eq!(bare.service_root(), "/");
        let nested = ODataConfig {
            route_prefix: "/api/v1/".into(),
            ..Default::default()
        };
        assert_eq!(nested.service_root(), "/api/v1/");
    }
}
