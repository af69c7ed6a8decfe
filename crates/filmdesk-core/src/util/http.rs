use once_cell::sync::Lazy;
use reqwest::{Client, Url};
use std::time::Duration;

use crate::config::ApiConfig;
use crate::error::ApiError;

/// Default HTTP client, built from `ApiConfig::default()`.
static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    let defaults = ApiConfig::default();
    builder(&defaults).build().unwrap_or_else(|e| {
        tracing::warn!("Falling back to a bare HTTP client: {}", e);
        Client::new()
    })
});

/// Get the shared default HTTP client.
pub fn client() -> &'static Client {
    &HTTP_CLIENT
}

/// Build a client honoring the configured timeouts and user agent.
pub fn build_client(config: &ApiConfig) -> Result<Client, ApiError> {
    Ok(builder(config).build()?)
}

fn builder(config: &ApiConfig) -> reqwest::ClientBuilder {
    Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .pool_idle_timeout(Duration::from_secs(90))
        .user_agent(config.user_agent.clone())
}

/// Parse an absolute URL, mapping failures into the API error space.
pub fn parse_url(raw: &str) -> Result<Url, ApiError> {
    Url::parse(raw).map_err(|e| ApiError::InvalidUrl(format!("{raw}: {e}")))
}

/// Whether two URLs share scheme, host and port.
pub fn same_origin(a: &Url, b: &Url) -> bool {
    a.origin() == b.origin()
}

/// Append path segments to a base URL, percent-encoding each one.
///
/// A trailing slash on the base is ignored so `http://h/api` and
/// `http://h/api/` produce the same result.
pub fn join_segments(base: &Url, segments: &[&str]) -> Result<Url, ApiError> {
    let mut url = base.clone();
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(format!("{base} cannot be a base URL")))?;
        path.pop_if_empty();
        path.extend(segments);
    }
    Ok(url)
}
