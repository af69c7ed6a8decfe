//! Authenticated access to the catalog API.
//!
//! Every call site goes through a [`Gateway`] value instead of a patched
//! global client. The gateway attaches the bearer token to requests aimed at
//! the API origin and turns any 401 from that origin into a session teardown,
//! a login redirect and an [`ApiError::Unauthorized`].

pub mod transport;

use reqwest::{Method, Url};
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::session::SessionStore;
use crate::util::http;

pub use transport::{ApiRequest, ApiResponse, ReqwestTransport, Transport};

/// What "send the user to the login screen" means for the host application.
pub trait LoginRedirect: Send + Sync {
    fn redirect_to_login(&self);
}

/// Redirect that only counts how often it fired.
#[derive(Debug, Default)]
pub struct RecordingRedirect {
    count: AtomicUsize,
}

impl RecordingRedirect {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl LoginRedirect for RecordingRedirect {
    fn redirect_to_login(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct Gateway {
    transport: Arc<dyn Transport>,
    session: Arc<dyn SessionStore>,
    api_base: Url,
    redirect: Arc<dyn LoginRedirect>,
}

impl Gateway {
    pub fn new(
        transport: Arc<dyn Transport>,
        session: Arc<dyn SessionStore>,
        api_base: Url,
        redirect: Arc<dyn LoginRedirect>,
    ) -> Self {
        Self {
            transport,
            session,
            api_base,
            redirect,
        }
    }

    pub fn api_base(&self) -> &Url {
        &self.api_base
    }

    pub fn session(&self) -> &Arc<dyn SessionStore> {
        &self.session
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Resolve a path under the API base, e.g. `["movies", "3"]`.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        http::join_segments(&self.api_base, segments)
    }

    /// Whether `url` is served by the API origin.
    pub fn targets_api(&self, url: &Url) -> bool {
        http::same_origin(&self.api_base, url)
    }

    /// Send a request.
    ///
    /// Non-2xx responses other than 401 are returned as-is; callers decide
    /// how to report them.
    pub async fn send(&self, mut request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let is_api = self.targets_api(&request.url);

        if is_api && !request.has_header("authorization") {
            if let Some(token) = self.session.get_token() {
                request
                    .headers
                    .push(("Authorization".to_string(), format!("Bearer {token}")));
            }
        }

        debug!("{} {}", request.method, request.url);
        let response = self.transport.execute(request).await?;

        if is_api && response.status == 401 {
            warn!("API rejected credentials; clearing session");
            if let Err(e) = self.session.clear_session() {
                warn!("Failed to clear session after 401: {}", e);
            }
            self.redirect.redirect_to_login();
            return Err(ApiError::Unauthorized);
        }

        Ok(response)
    }

    pub async fn get(&self, url: Url) -> Result<ApiResponse, ApiError> {
        self.send(ApiRequest::new(Method::GET, url)).await
    }

    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        url: Url,
        body: &T,
    ) -> Result<ApiResponse, ApiError> {
        self.send(ApiRequest::new(Method::POST, url).json(body)?).await
    }

    pub async fn put_json<T: Serialize + ?Sized>(
        &self,
        url: Url,
        body: &T,
    ) -> Result<ApiResponse, ApiError> {
        self.send(ApiRequest::new(Method::PUT, url).json(body)?).await
    }

    pub async fn delete(&self, url: Url) -> Result<ApiResponse, ApiError> {
        self.send(ApiRequest::new(Method::DELETE, url)).await
    }
}
