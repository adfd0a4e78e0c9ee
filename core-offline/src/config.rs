//! Offline worker configuration.

/// Configuration for the offline response cache worker.
///
/// Cache names are derived as `{cache_prefix}-pages-{pages_generation}` and
/// `{cache_prefix}-api-{api_generation}`; bumping a generation makes
/// activation discard the previous generation's cache wholesale.
#[derive(Debug, Clone)]
pub struct OfflineConfig {
    /// Shared prefix for every cache this worker owns.
    pub cache_prefix: String,
    /// Generation tag for the static page/asset cache.
    pub pages_generation: String,
    /// Generation tag for the API response cache.
    pub api_generation: String,
    /// Origin this worker serves; requests elsewhere pass through untouched.
    pub origin: String,
    /// Routes fetched and cached up front during install.
    pub precache_routes: Vec<String>,
    /// Path prefixes treated as API calls (network-first).
    pub api_prefixes: Vec<String>,
    /// Route served when an offline navigation has no exact cached match.
    pub root_route: String,
}

impl Default for OfflineConfig {
    fn default() -> Self {
        Self {
            cache_prefix: "flashcards".to_string(),
            pages_generation: "v1".to_string(),
            api_generation: "v1".to_string(),
            origin: "http://localhost:8000".to_string(),
            precache_routes: vec!["/".to_string(), "/manifest.json".to_string()],
            api_prefixes: vec![
                "/folders".to_string(),
                "/decks".to_string(),
                "/cards".to_string(),
            ],
            root_route: "/".to_string(),
        }
    }
}

impl OfflineConfig {
    pub fn with_cache_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.cache_prefix = prefix.into();
        self
    }

    pub fn with_pages_generation(mut self, generation: impl Into<String>) -> Self {
        self.pages_generation = generation.into();
        self
    }

    pub fn with_api_generation(mut self, generation: impl Into<String>) -> Self {
        self.api_generation = generation.into();
        self
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    pub fn with_precache_routes(mut self, routes: Vec<String>) -> Self {
        self.precache_routes = routes;
        self
    }

    pub fn with_api_prefixes(mut self, prefixes: Vec<String>) -> Self {
        self.api_prefixes = prefixes;
        self
    }

    /// Full name of the current static cache generation.
    pub fn page_cache_name(&self) -> String {
        format!("{}-pages-{}", self.cache_prefix, self.pages_generation)
    }

    /// Full name of the current API cache generation.
    pub fn api_cache_name(&self) -> String {
        format!("{}-api-{}", self.cache_prefix, self.api_generation)
    }

    /// Whether a cache name belongs to this worker but not to the current
    /// generation set.
    pub fn is_stale_cache(&self, name: &str) -> bool {
        name.starts_with(&format!("{}-", self.cache_prefix))
            && name != self.page_cache_name()
            && name != self.api_cache_name()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.cache_prefix.is_empty() {
            return Err("cache_prefix cannot be empty".to_string());
        }
        if self.pages_generation.is_empty() || self.api_generation.is_empty() {
            return Err("cache generations cannot be empty".to_string());
        }
        if self.origin.is_empty() {
            return Err("origin cannot be empty".to_string());
        }
        if self.origin.ends_with('/') {
            return Err("origin must not end with a slash".to_string());
        }
        if !self.root_route.starts_with('/') {
            return Err("root_route must be an absolute path".to_string());
        }
        for prefix in &self.api_prefixes {
            if !prefix.starts_with('/') {
                return Err(format!("API prefix must start with '/': {}", prefix));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = OfflineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.page_cache_name(), "flashcards-pages-v1");
        assert_eq!(config.api_cache_name(), "flashcards-api-v1");
    }

    #[test]
    fn test_stale_cache_detection() {
        let config = OfflineConfig::default().with_pages_generation("v2");

        assert!(config.is_stale_cache("flashcards-pages-v1"));
        assert!(!config.is_stale_cache("flashcards-pages-v2"));
        assert!(!config.is_stale_cache("flashcards-api-v1"));
        // Foreign caches are never ours to prune
        assert!(!config.is_stale_cache("other-app-pages-v1"));
    }

    #[test]
    fn test_validation_rejects_trailing_slash_origin() {
        let config = OfflineConfig::default().with_origin("http://localhost:8000/");
        assert!(config.validate().is_err());
    }
}
