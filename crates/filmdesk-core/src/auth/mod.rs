//! Login, logout and the session guard.

use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{ApiError, Result, SessionError, ValidationError};
use crate::gateway::{ApiRequest, Gateway};
use crate::session::Session;

const LOGIN_FAILED: &str = "Login failed. Check your credentials.";
const TOKEN_MISSING: &str = "No token found in the server response.";

/// Where a login response may keep its token, in lookup order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenField {
    Token,
    AccessToken,
    Jwt,
    DataToken,
    DataAccessToken,
    DataJwt,
}

impl TokenField {
    pub const SEARCH_ORDER: [TokenField; 6] = [
        TokenField::Token,
        TokenField::AccessToken,
        TokenField::Jwt,
        TokenField::DataToken,
        TokenField::DataAccessToken,
        TokenField::DataJwt,
    ];

    fn lookup<'a>(&self, body: &'a Value) -> Option<&'a Value> {
        match self {
            TokenField::Token => body.get("token"),
            TokenField::AccessToken => body.get("access_token"),
            TokenField::Jwt => body.get("jwt"),
            TokenField::DataToken => body.get("data")?.get("token"),
            TokenField::DataAccessToken => body.get("data")?.get("access_token"),
            TokenField::DataJwt => body.get("data")?.get("jwt"),
        }
    }
}

/// Result of searching a login response for a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenPayload {
    Found { field: TokenField, token: String },
    Missing,
}

impl TokenPayload {
    /// First non-empty string in [`TokenField::SEARCH_ORDER`].
    pub fn extract(body: &Value) -> Self {
        TokenField::SEARCH_ORDER
            .iter()
            .find_map(|field| {
                let token = field.lookup(body)?.as_str()?;
                (!token.is_empty()).then(|| TokenPayload::Found {
                    field: *field,
                    token: token.to_string(),
                })
            })
            .unwrap_or(TokenPayload::Missing)
    }
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

/// Login and logout against the catalog API.
#[derive(Clone)]
pub struct AuthClient {
    gateway: Arc<Gateway>,
}

impl AuthClient {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }

    /// Exchange credentials for a token and persist the session.
    ///
    /// The request bypasses the gateway's 401 handling: a rejected login is
    /// an ordinary failure with the server's explanation, not a session
    /// teardown. A 2xx answer without a usable token is also a failure, and
    /// in every failure case the stored session is left untouched.
    pub async fn login(&self, username: &str, password: &str) -> Result<Session> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(ValidationError::MissingCredentials.into());
        }

        let url = self.gateway.endpoint(&["login"])?;
        debug!("POST {} as {}", url, username);
        let request = ApiRequest::new(Method::POST, url)
            .json(&LoginRequest { username, password })?;
        let response = self.gateway.transport().execute(request).await?;

        if !response.is_success() {
            return Err(ApiError::Status {
                status: response.status,
                message: response
                    .server_message()
                    .unwrap_or_else(|| LOGIN_FAILED.to_string()),
            }
            .into());
        }

        let body = response.json_value().unwrap_or(Value::Null);
        let token = match TokenPayload::extract(&body) {
            TokenPayload::Found { field, token } => {
                debug!("Token found in {:?}", field);
                token
            }
            TokenPayload::Missing => return Err(ApiError::Malformed(TOKEN_MISSING.into()).into()),
        };

        self.gateway.session().set_session(&token, username)?;
        info!("Logged in as {}", username);

        Ok(Session {
            token: Some(token),
            username: Some(username.to_string()),
        })
    }

    /// Tell the server, then forget the session whatever it answered.
    ///
    /// Like login, the call skips the gateway's 401 handling: a token the
    /// server already dropped is not a reason to send the user to login.
    pub async fn logout(&self) -> std::result::Result<(), SessionError> {
        match self.gateway.endpoint(&["logout"]) {
            Ok(url) => {
                let mut request = ApiRequest::new(Method::POST, url);
                if let Some(token) = self.gateway.session().get_token() {
                    request = request.header("Authorization", format!("Bearer {token}"));
                }
                match self.gateway.transport().execute(request).await {
                    Ok(resp) if !resp.is_success() => {
                        debug!("Ignoring logout status {}", resp.status)
                    }
                    Ok(_) => {}
                    Err(e) => debug!("Ignoring logout failure: {}", e),
                }
            }
            Err(e) => debug!("Skipping logout call: {}", e),
        }

        self.gateway.session().clear_session()?;
        info!("Logged out");
        Ok(())
    }

    /// The stored session, or `NotLoggedIn` when there is no token.
    pub fn require_session(&self) -> std::result::Result<Session, SessionError> {
        let session = self.gateway.session().load();
        if session.is_authenticated() {
            Ok(session)
        } else {
            Err(SessionError::NotLoggedIn)
        }
    }
}

/// The login screen: credentials plus the submit control's state.
#[derive(Debug, Default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    submitting: bool,
}

impl LoginForm {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            submitting: false,
        }
    }

    /// True while a login request is in flight; the submit control is
    /// disabled for that long.
    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub async fn submit(&mut self, auth: &AuthClient) -> Result<Session> {
        self.submitting = true;
        let result = auth.login(&self.username, &self.password).await;
        self.submitting = false;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FilmdeskError;
    use crate::gateway::tests::{CountingStore, ScriptedTransport};
    use crate::gateway::{ApiResponse, RecordingRedirect};
    use crate::session::SessionStore;
    use reqwest::Url;
    use serde_json::json;
    use std::sync::atomic::Ordering;

    struct Harness {
        auth: AuthClient,
        transport: Arc<ScriptedTransport>,
        store: Arc<CountingStore>,
        redirect: Arc<RecordingRedirect>,
    }

    fn harness(store: CountingStore, responses: Vec<ApiResponse>) -> Harness {
        let transport = Arc::new(ScriptedTransport::new(responses));
        let store = Arc::new(store);
        let redirect = Arc::new(RecordingRedirect::new());
        let gateway = Gateway::new(
            transport.clone(),
            store.clone(),
            Url::parse("http://localhost:8080/api").unwrap(),
            redirect.clone(),
        );
        Harness {
            auth: AuthClient::new(Arc::new(gateway)),
            transport,
            store,
            redirect,
        }
    }

    #[test]
    fn test_token_search_order() {
        let cases = [
            (json!({ "token": "a" }), TokenField::Token),
            (json!({ "access_token": "b" }), TokenField::AccessToken),
            (json!({ "jwt": "c" }), TokenField::Jwt),
            (json!({ "data": { "token": "d" } }), TokenField::DataToken),
            (json!({ "data": { "access_token": "e" } }), TokenField::DataAccessToken),
            (json!({ "data": { "jwt": "f" } }), TokenField::DataJwt),
            (json!({ "jwt": "x", "token": "y" }), TokenField::Token),
        ];
        for (body, expected) in cases {
            match TokenPayload::extract(&body) {
                TokenPayload::Found { field, .. } => assert_eq!(field, expected, "{body}"),
                TokenPayload::Missing => panic!("no token in {body}"),
            }
        }
    }

    #[test]
    fn test_token_missing_or_unusable() {
        for body in [
            json!({}),
            Value::Null,
            json!({ "token": "" }),
            json!({ "token": 42 }),
            json!({ "data": "token" }),
            json!({ "user": { "token": "nested-too-deep" } }),
        ] {
            assert_eq!(TokenPayload::extract(&body), TokenPayload::Missing, "{body}");
        }
    }

    #[test]
    fn test_empty_token_falls_through_to_next_field() {
        let body = json!({ "token": "", "access_token": "real" });
        assert_eq!(
            TokenPayload::extract(&body),
            TokenPayload::Found {
                field: TokenField::AccessToken,
                token: "real".into()
            }
        );
    }

    #[tokio::test]
    async fn test_login_persists_session() {
        let h = harness(
            CountingStore::default(),
            vec![ApiResponse::new(200, r#"{"data":{"access_token":"xyz"}}"#)],
        );
        let session = h.auth.login("  budi ", "rahasia").await.unwrap();
        assert_eq!(session.token.as_deref(), Some("xyz"));
        assert_eq!(h.store.get_token().as_deref(), Some("xyz"));
        assert_eq!(h.store.get_username().as_deref(), Some("budi"));

        let sent = h.transport.requests().remove(0);
        assert_eq!(sent.url.path(), "/api/login");
        let body: Value = serde_json::from_slice(sent.body.as_ref().unwrap()).unwrap();
        assert_eq!(body, json!({ "username": "budi", "password": "rahasia" }));
    }

    #[tokio::test]
    async fn test_login_rejected_keeps_store_and_skips_redirect() {
        let h = harness(
            CountingStore::with_session("previous", "old"),
            vec![ApiResponse::new(401, r#"{"error":"Invalid username or password"}"#)],
        );
        let err = h.auth.login("budi", "wrong").await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid username or password");
        assert_eq!(h.redirect.count(), 0);
        assert_eq!(h.store.clears.load(Ordering::SeqCst), 0);
        assert_eq!(h.store.get_token().as_deref(), Some("previous"));
    }

    #[tokio::test]
    async fn test_login_rejected_with_blank_body_uses_fallback() {
        let h = harness(CountingStore::default(), vec![ApiResponse::new(403, "")]);
        let err = h.auth.login("budi", "wrong").await.unwrap_err();
        assert_eq!(err.to_string(), LOGIN_FAILED);
        assert!(h.store.get_token().is_none());
    }

    #[tokio::test]
    async fn test_login_rejected_with_unexplained_json_uses_fallback() {
        let h = harness(
            CountingStore::default(),
            vec![ApiResponse::new(401, r#"{"status":"fail"}"#)],
        );
        let err = h.auth.login("budi", "wrong").await.unwrap_err();
        assert_eq!(err.to_string(), LOGIN_FAILED);
    }

    #[tokio::test]
    async fn test_login_success_without_token_is_failure() {
        let h = harness(
            CountingStore::default(),
            vec![ApiResponse::new(200, r#"{"status":"ok"}"#)],
        );
        let err = h.auth.login("budi", "pw").await.unwrap_err();
        assert!(matches!(err, FilmdeskError::Api(ApiError::Malformed(_))));
        assert!(h.store.get_token().is_none());
    }

    #[tokio::test]
    async fn test_login_requires_both_fields() {
        let h = harness(CountingStore::default(), vec![]);
        for (user, pass) in [("", "pw"), ("   ", "pw"), ("budi", "")] {
            let err = h.auth.login(user, pass).await.unwrap_err();
            assert!(matches!(
                err,
                FilmdeskError::Validation(ValidationError::MissingCredentials)
            ));
        }
        assert!(h.transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_login_form_reenables_submit() {
        let h = harness(CountingStore::default(), vec![ApiResponse::new(500, "")]);
        let mut form = LoginForm::new("budi", "pw");
        assert!(!form.is_submitting());
        assert!(form.submit(&h.auth).await.is_err());
        assert!(!form.is_submitting());
    }

    #[tokio::test]
    async fn test_logout_ignores_server_failure() {
        let h = harness(
            CountingStore::with_session("tok", "budi"),
            vec![ApiResponse::new(500, "boom")],
        );
        h.auth.logout().await.unwrap();
        assert!(h.store.get_token().is_none());

        let sent = h.transport.requests().remove(0);
        assert_eq!(sent.method, Method::POST);
        assert_eq!(sent.url.path(), "/api/logout");
        assert_eq!(sent.header_value("authorization"), Some("Bearer tok"));
    }

    #[tokio::test]
    async fn test_logout_with_dead_token_does_not_redirect() {
        let h = harness(
            CountingStore::with_session("revoked", "budi"),
            vec![ApiResponse::new(401, r#"{"message":"token expired"}"#)],
        );
        h.auth.logout().await.unwrap();

        assert_eq!(h.redirect.count(), 0);
        assert_eq!(h.store.clears.load(Ordering::SeqCst), 1);
        assert!(h.store.get_token().is_none());
    }

    #[tokio::test]
    async fn test_require_session() {
        let h = harness(CountingStore::default(), vec![]);
        assert!(matches!(h.auth.require_session(), Err(SessionError::NotLoggedIn)));

        h.store.set_session("t", "u").unwrap();
        assert_eq!(h.auth.require_session().unwrap().username.as_deref(), Some("u"));
    }
}
