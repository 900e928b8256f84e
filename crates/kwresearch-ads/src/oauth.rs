//! OAuth 2.0 for the Google Ads API.
//!
//! Two halves:
//!
//! - [`TokenSource`] turns a long-lived refresh token into short-lived
//!   access tokens, caching each until shortly before it expires so a long
//!   batch run keeps working past the one-hour token lifetime.
//! - [`ClientSecret`] and [`receive_authorization_code`] run the installed
//!   application flow once, to mint the refresh token that goes into
//!   `google-ads.yaml`.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use backon::{ExponentialBuilder, Retryable};
use reqwest::Client;
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, Mutex, Notify};
use tokio::time::{timeout, Instant};
use url::Url;

use crate::error::{AdsError, AdsResult};

pub const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
pub const ADWORDS_SCOPE: &str = "https://www.googleapis.com/auth/adwords";

/// Refresh this long before the reported expiry.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Assumed lifetime when the token endpoint omits `expires_in`.
const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(3600);

const REFRESH_ATTEMPTS: usize = 3;
const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(500);

// ---------------------------------------------------------------------------
// Token endpoint
// ---------------------------------------------------------------------------

/// Successful token endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
    /// Only present on authorization-code exchanges.
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

async fn post_token_form(
    http: &Client,
    token_url: &str,
    form: &[(&str, &str)],
) -> AdsResult<TokenResponse> {
    let response = http.post(token_url).form(form).send().await?;
    let status = response.status();

    if status.is_success() {
        return response
            .json::<TokenResponse>()
            .await
            .map_err(|e| AdsError::Parse {
                message: format!("token response: {e}"),
            });
    }

    let body = response.text().await.unwrap_or_default();
    if status.is_client_error() && status.as_u16() != 429 {
        let message = match serde_json::from_str::<TokenErrorResponse>(&body) {
            Ok(TokenErrorResponse {
                error,
                error_description: Some(description),
            }) => format!("{error}: {description}"),
            Ok(TokenErrorResponse { error, .. }) => error,
            Err(_) => body,
        };
        return Err(AdsError::Auth { message });
    }

    Err(AdsError::Http {
        endpoint: token_url.to_string(),
        status: status.as_u16(),
        message: body,
    })
}

// ---------------------------------------------------------------------------
// Access tokens
// ---------------------------------------------------------------------------

struct AccessToken {
    value: String,
    expires_at: Instant,
}

impl AccessToken {
    fn new(value: String, expires_in: Option<u64>) -> Self {
        let lifetime = expires_in.map_or(DEFAULT_TOKEN_LIFETIME, Duration::from_secs);
        Self {
            value,
            expires_at: Instant::now() + lifetime,
        }
    }

    fn is_fresh(&self) -> bool {
        Instant::now() + EXPIRY_MARGIN < self.expires_at
    }
}

/// Caching access-token provider backed by a refresh token.
pub struct TokenSource {
    http: Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    refresh_token: String,
    retry_delay: Duration,
    cached: Mutex<Option<AccessToken>>,
}

impl TokenSource {
    #[must_use]
    pub fn new(
        http: Client,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Self {
        Self {
            http,
            token_url: TOKEN_URL.to_string(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            refresh_token: refresh_token.into(),
            retry_delay: DEFAULT_RETRY_DELAY,
            cached: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn with_token_url(mut self, token_url: impl Into<String>) -> Self {
        self.token_url = token_url.into();
        self
    }

    /// Initial backoff between refresh attempts; doubles on each retry.
    #[must_use]
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Return a valid access token, refreshing it if missing or about to
    /// expire.
    pub async fn access_token(&self) -> AdsResult<String> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh()) {
            return Ok(token.value.clone());
        }

        let token = self.refresh().await?;
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    async fn refresh(&self) -> AdsResult<AccessToken> {
        let form = [
            ("grant_type", "refresh_token"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("refresh_token", self.refresh_token.as_str()),
        ];

        let response = (|| post_token_form(&self.http, &self.token_url, &form))
            .retry(
                ExponentialBuilder::default()
                    .with_min_delay(self.retry_delay)
                    .with_max_times(REFRESH_ATTEMPTS),
            )
            .when(AdsError::is_transient)
            .notify(|err: &AdsError, delay: Duration| {
                log::warn!(
                    "Access token refresh failed ({}), retrying in {}ms",
                    err,
                    delay.as_millis()
                );
            })
            .await?;

        log::debug!("Refreshed access token");
        Ok(AccessToken::new(response.access_token, response.expires_in))
    }
}

impl fmt::Debug for TokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSource")
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .field("retry_delay", &self.retry_delay)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Installed application flow
// ---------------------------------------------------------------------------

/// OAuth client id and secret from a Google Cloud `client_secret.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecret {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_auth_uri() -> String {
    AUTH_URL.to_string()
}

fn default_token_uri() -> String {
    TOKEN_URL.to_string()
}

#[derive(Debug, Deserialize)]
struct ClientSecretFile {
    installed: Option<ClientSecret>,
    web: Option<ClientSecret>,
}

impl ClientSecret {
    /// Load a downloaded `client_secret.json` (either the `installed` or
    /// the `web` flavour).
    pub fn from_file(path: &Path) -> AdsResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| AdsError::Credentials {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_json(&contents).map_err(|message| AdsError::Credentials {
            path: path.to_path_buf(),
            message,
        })
    }

    fn from_json(contents: &str) -> Result<Self, String> {
        let file: ClientSecretFile = serde_json::from_str(contents).map_err(|e| e.to_string())?;
        file.installed
            .or(file.web)
            .ok_or_else(|| "expected an \"installed\" or \"web\" section".to_string())
    }

    /// Consent page URL requesting offline access to the AdWords scope.
    pub fn authorization_url(&self, redirect_uri: &str, state: &str) -> AdsResult<Url> {
        Url::parse_with_params(
            &self.auth_uri,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", redirect_uri),
                ("response_type", "code"),
                ("scope", ADWORDS_SCOPE),
                ("access_type", "offline"),
                ("prompt", "consent"),
                ("state", state),
            ],
        )
        .map_err(|e| AdsError::Parse {
            message: format!("auth_uri {:?}: {e}", self.auth_uri),
        })
    }

    /// Trade an authorization code for access and refresh tokens.
    pub async fn exchange_code(
        &self,
        http: &Client,
        code: &str,
        redirect_uri: &str,
    ) -> AdsResult<TokenResponse> {
        post_token_form(
            http,
            &self.token_uri,
            &[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("redirect_uri", redirect_uri),
            ],
        )
        .await
    }
}

const REDIRECT_OK: &str = "Authorization complete. You may close this window.";
const REDIRECT_FAILED: &str = "Authorization failed. Check the terminal for details.";
const REDIRECT_HANDLED: &str = "Authorization already handled. You may close this window.";

/// How long to let the last response flush before the listener is dropped.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

#[derive(Clone)]
struct RedirectState {
    expected_state: Arc<str>,
    outcome: Arc<StdMutex<Option<oneshot::Sender<AdsResult<String>>>>>,
}

async fn handle_redirect(
    State(state): State<RedirectState>,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, &'static str) {
    let outcome = if let Some(error) = params.get("error") {
        Err(AdsError::Auth {
            message: format!("authorization denied: {error}"),
        })
    } else if let Some(code) = params.get("code") {
        if params.get("state").map(String::as_str) == Some(&*state.expected_state) {
            Ok(code.clone())
        } else {
            Err(AdsError::Auth {
                message: "state parameter mismatch on redirect".to_string(),
            })
        }
    } else {
        return (StatusCode::NOT_FOUND, "");
    };

    let sender = state.outcome.lock().ok().and_then(|mut slot| slot.take());
    let Some(sender) = sender else {
        return (StatusCode::OK, REDIRECT_HANDLED);
    };

    let body = if outcome.is_ok() { REDIRECT_OK } else { REDIRECT_FAILED };
    if sender.send(outcome).is_err() {
        log::debug!("Redirect arrived after the listener gave up");
    }
    (StatusCode::OK, body)
}

async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

/// Serve the browser redirect on `listener` and return the authorization
/// code it carries.
///
/// Requests without `code` or `error` parameters (favicon probes and the
/// like) get a 404. The redirect's `state` must equal `expected_state`.
/// The listener is shut down once the first redirect has been answered.
pub async fn receive_authorization_code(
    listener: TcpListener,
    expected_state: &str,
) -> AdsResult<String> {
    let (outcome_tx, outcome_rx) = oneshot::channel();
    let state = RedirectState {
        expected_state: Arc::from(expected_state),
        outcome: Arc::new(StdMutex::new(Some(outcome_tx))),
    };

    let app = Router::new()
        .route("/", get(handle_redirect))
        .fallback(not_found)
        .with_state(state);

    let shutdown = Arc::new(Notify::new());
    let signal = Arc::clone(&shutdown);
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move { signal.notified().await });
    let mut server = tokio::spawn(async move { server.await });

    let outcome = tokio::select! {
        received = outcome_rx => received.map_err(|_| AdsError::Auth {
            message: "redirect listener closed before a code arrived".to_string(),
        }),
        served = &mut server => {
            let message = match served {
                Ok(Ok(())) => "redirect listener stopped".to_string(),
                Ok(Err(e)) => format!("redirect listener failed: {e}"),
                Err(e) => format!("redirect listener task failed: {e}"),
            };
            return Err(AdsError::Auth { message });
        }
    };

    shutdown.notify_one();
    if timeout(SHUTDOWN_GRACE, &mut server).await.is_err() {
        log::debug!("Redirect listener still draining, aborting");
        server.abort();
    }

    outcome?
}
