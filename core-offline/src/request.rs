//! Request classification for the offline worker.

use bridge_traits::HttpMethod;

use crate::config::OfflineConfig;

/// How the host is issuing the request, the equivalent of a browser's
/// request mode. Navigations get the offline root fallback; subresource
/// requests do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
    /// A page navigation (address bar, link click).
    Navigate,
    /// Any other fetch (asset, API call).
    Subresource,
}

/// A request as seen by the worker's fetch interception point.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub method: HttpMethod,
    pub url: String,
    pub mode: RequestMode,
}

impl FetchRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            mode: RequestMode::Subresource,
        }
    }

    pub fn navigate(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            mode: RequestMode::Navigate,
        }
    }

    pub fn with_method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    /// Stable cache key for this request.
    pub fn cache_key(&self) -> String {
        format!("{:?} {}", self.method, self.url)
    }

    /// Whether the URL is on the given origin.
    pub fn same_origin(&self, origin: &str) -> bool {
        match self.url.strip_prefix(origin) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }

    /// Path component relative to the origin, without the query string.
    /// `None` for cross-origin URLs.
    pub fn path(&self, origin: &str) -> Option<&str> {
        let rest = self.url.strip_prefix(origin)?;
        if !(rest.is_empty() || rest.starts_with('/')) {
            return None;
        }
        let path = rest.split('?').next().unwrap_or(rest);
        Some(if path.is_empty() { "/" } else { path })
    }
}

/// Which caching policy applies to a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Same-origin API call: network-first, cached for offline replay.
    Api,
    /// Page navigation: network-first with the root route as last resort.
    Navigation,
    /// Same-origin static asset: cache-first.
    Static,
    /// Not ours to cache; forwarded to the network untouched.
    Passthrough,
}

/// Classify a request against the worker's configuration.
pub fn classify(request: &FetchRequest, config: &OfflineConfig) -> RouteClass {
    if !request.method.is_idempotent_read() {
        return RouteClass::Passthrough;
    }

    let Some(path) = request.path(&config.origin) else {
        return RouteClass::Passthrough;
    };

    if config.api_prefixes.iter().any(|p| path.starts_with(p.as_str())) {
        return RouteClass::Api;
    }

    if request.mode == RequestMode::Navigate {
        return RouteClass::Navigation;
    }

    RouteClass::Static
}
