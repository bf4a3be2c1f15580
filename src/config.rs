//! Configuration for catalog sessions
//!
//! A catalog session is described in YAML: where the catalog lives, which
//! endpoints form the source chain, and how the engine prefetches.
//!
//! ```yaml
//! base_url: https://api.themoviedb.org/
//! api_key: "..."
//! sources:
//!   - name: popular
//!     path: 3/movie/popular
//!     language: en
//!   - path: 3/movie/top_rated
//!     language: ru
//!     page_size: 20
//! ```

use crate::catalog::CatalogSource;
use crate::engine::EngineConfig;
use crate::error::{Error, Result, ResultExt};
use crate::http::HttpClientConfig;
use crate::pagination::{validate_sources, Source};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Built-in session over the public TMDB catalog: popular films in English,
/// top rated in Russian, then upcoming in English.
pub const TMDB_CATALOG: &str = r"
base_url: https://api.themoviedb.org/
sources:
  - name: popular
    path: 3/movie/popular
    language: en
  - name: top_rated
    path: 3/movie/top_rated
    language: ru
  - name: upcoming
    path: 3/movie/upcoming
    language: en
";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Complete catalog session configuration loaded from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Base URL of the catalog API
    pub base_url: String,

    /// API key sent as the `api_key` query parameter
    #[serde(default)]
    pub api_key: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Fixed look-ahead distance (defaults to half a page)
    #[serde(default)]
    pub prefetch_distance: Option<usize>,

    /// Ordered source chain
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

fn default_timeout_secs() -> u64 {
    30
}

// ============================================================================
// Sources
// ============================================================================

/// One source of the chain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Display name
    #[serde(default)]
    pub name: Option<String>,

    /// Endpoint path relative to `base_url`
    pub path: String,

    /// Language tag for this source
    #[serde(default = "default_language")]
    pub language: String,

    /// First page requested
    #[serde(default = "default_initial_page")]
    pub initial_page: u32,

    /// Items per page
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_language() -> String {
    "en".to_string()
}

fn default_initial_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    20
}

impl SourceConfig {
    /// Name for display, falling back to the path
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.path)
    }
}

// ============================================================================
// Loading & Validation
// ============================================================================

impl CatalogConfig {
    /// Parse a config from YAML
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Load a config from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_yaml_str(&contents)
    }

    /// The built-in TMDB session
    pub fn tmdb() -> Result<Self> {
        Self::from_yaml_str(TMDB_CATALOG)
    }

    /// Check the config describes a usable session
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(Error::missing_field("base_url"));
        }
        url::Url::parse(&self.base_url)?;

        if self.sources.is_empty() {
            return Err(Error::config("at least one source is required"));
        }
        for (index, source) in self.sources.iter().enumerate() {
            if source.path.trim().is_empty() {
                return Err(Error::missing_field(format!("sources[{index}].path")));
            }
        }
        validate_sources(&self.engine_sources())?;

        if self.timeout_secs == 0 {
            return Err(Error::invalid_value(
                "timeout_secs",
                "timeout must be greater than zero",
            ));
        }
        Ok(())
    }

    /// Source chain for the engine
    pub fn engine_sources(&self) -> Vec<Source> {
        self.sources
            .iter()
            .map(|s| Source::new(s.initial_page, s.page_size))
            .collect()
    }

    /// Catalog endpoints, index-aligned with [`engine_sources`](Self::engine_sources)
    pub fn catalog_sources(&self) -> Vec<CatalogSource> {
        self.sources
            .iter()
            .map(|s| CatalogSource::new(&s.path, &s.language))
            .collect()
    }

    /// Engine configuration
    pub fn engine_config(&self) -> EngineConfig {
        match self.prefetch_distance {
            Some(distance) => EngineConfig::new().with_prefetch_distance(distance),
            None => EngineConfig::new(),
        }
    }

    /// HTTP client configuration
    pub fn http_config(&self) -> HttpClientConfig {
        let mut builder = HttpClientConfig::builder()
            .base_url(&self.base_url)
            .timeout(Duration::from_secs(self.timeout_secs));
        if let Some(key) = &self.api_key {
            builder = builder.query("api_key", key);
        }
        builder.build()
    }
}
