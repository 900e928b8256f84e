//! Google Ads REST client for `KeywordPlanIdeaService.GenerateKeywordIdeas`.
//!
//! Authenticates with an OAuth access token (refreshed through
//! [`TokenSource`]) plus the account's developer token, and decodes both
//! the success payload and Google's structured error envelope. The REST
//! API encodes 64-bit integers as strings and enums as names; the wire
//! types below accept either form.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use kwresearch_core::model::{CompetitionLevel, CustomerId};

use crate::credentials::AdsCredentials;
use crate::error::{AdsError, AdsResult};
use crate::oauth::{TokenSource, TOKEN_URL};
use crate::service::{
    FieldError, IdeaMetrics, KeywordIdea, KeywordIdeaService, KeywordIdeasRequest, ServiceFailure,
};

pub const DEFAULT_ENDPOINT: &str = "https://googleads.googleapis.com";
/// Google retires API versions about a year after release; bump this (or
/// set `api_version` in the config) when requests start failing with 404.
pub const DEFAULT_API_VERSION: &str = "v22";

const USER_AGENT: &str = concat!("kwresearch/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Wire types (private -- REST shapes of the proto messages)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireInt {
    Number(i64),
    Text(String),
}

impl WireInt {
    fn value(&self) -> AdsResult<i64> {
        match self {
            Self::Number(n) => Ok(*n),
            Self::Text(s) => s.trim().parse().map_err(|e| AdsError::Parse {
                message: format!("expected integer, got {s:?}: {e}"),
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireEnum {
    Code(i64),
    Name(String),
}

impl WireEnum {
    fn code(&self) -> i64 {
        match self {
            Self::Code(code) => *code,
            Self::Name(name) => CompetitionLevel::from_name(name).code(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateKeywordIdeasResponse {
    #[serde(default)]
    results: Vec<WireIdea>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireIdea {
    #[serde(default)]
    text: String,
    #[serde(default)]
    keyword_idea_metrics: Option<WireMetrics>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireMetrics {
    #[serde(default)]
    avg_monthly_searches: Option<WireInt>,
    #[serde(default)]
    competition: Option<WireEnum>,
    #[serde(default)]
    competition_index: Option<WireInt>,
}

impl WireIdea {
    fn into_idea(self) -> AdsResult<KeywordIdea> {
        let metrics = match self.keyword_idea_metrics {
            Some(wire) => IdeaMetrics {
                avg_monthly_searches: match wire.avg_monthly_searches {
                    Some(v) => u64::try_from(v.value()?).unwrap_or_default(),
                    None => 0,
                },
                competition: wire.competition.as_ref().map_or(0, WireEnum::code),
                competition_index: match wire.competition_index {
                    Some(v) => v.value()?,
                    None => 0,
                },
            },
            None => IdeaMetrics::default(),
        };
        Ok(KeywordIdea::new(self.text, metrics))
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: RpcError,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    details: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorDetail {
    #[serde(default)]
    errors: Vec<WireAdsError>,
    #[serde(default)]
    request_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireAdsError {
    #[serde(default)]
    error_code: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default)]
    message: String,
    #[serde(default)]
    location: Option<WireLocation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireLocation {
    #[serde(default)]
    field_path_elements: Vec<FieldPathElement>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FieldPathElement {
    field_name: String,
    #[serde(default)]
    index: Option<u32>,
}

impl From<WireAdsError> for FieldError {
    fn from(wire: WireAdsError) -> Self {
        let error_code = wire.error_code.and_then(|code| {
            code.into_iter().next().map(|(category, value)| match value {
                serde_json::Value::String(v) => format!("{category}={v}"),
                other => format!("{category}={other}"),
            })
        });
        let field_path = wire
            .location
            .map(|loc| {
                loc.field_path_elements
                    .into_iter()
                    .map(|el| match el.index {
                        Some(i) => format!("{}[{}]", el.field_name, i),
                        None => el.field_name,
                    })
                    .collect()
            })
            .unwrap_or_default();
        Self {
            message: wire.message,
            error_code,
            field_path,
        }
    }
}

fn decode_ideas(body: &str) -> AdsResult<Vec<KeywordIdea>> {
    let response: GenerateKeywordIdeasResponse =
        serde_json::from_str(body).map_err(|e| AdsError::Parse {
            message: format!("keyword ideas response: {e}"),
        })?;
    response
        .results
        .into_iter()
        .map(WireIdea::into_idea)
        .collect()
}

/// Map a non-success response onto the error taxonomy. A decodable Google
/// error envelope is a service-reported failure; a bare 429 is treated as
/// quota exhaustion; anything else is a plain HTTP error.
fn decode_failure(endpoint: &str, http_status: u16, body: &str) -> AdsError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(ErrorEnvelope { error }) => {
            let status = if error.status.is_empty() {
                fallback_status(http_status).to_string()
            } else {
                error.status
            };
            let request_id = error.details.iter().find_map(|d| d.request_id.clone());
            let errors = error
                .details
                .into_iter()
                .flat_map(|d| d.errors)
                .map(FieldError::from)
                .collect();
            AdsError::Service(ServiceFailure {
                status,
                http_status,
                message: error.message,
                errors,
                request_id,
            })
        }
        Err(_) if http_status == 429 => AdsError::Service(ServiceFailure {
            status: fallback_status(http_status).to_string(),
            http_status,
            message: body.to_string(),
            errors: Vec::new(),
            request_id: None,
        }),
        Err(_) => AdsError::Http {
            endpoint: endpoint.to_string(),
            status: http_status,
            message: body.to_string(),
        },
    }
}

fn fallback_status(http_status: u16) -> &'static str {
    match http_status {
        400 => "INVALID_ARGUMENT",
        401 => "UNAUTHENTICATED",
        403 => "PERMISSION_DENIED",
        404 => "NOT_FOUND",
        429 => "RESOURCE_EXHAUSTED",
        503 => "UNAVAILABLE",
        500..=599 => "INTERNAL",
        _ => "UNKNOWN",
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Builder for [`GoogleAdsClient`]; endpoints are overridable for tests and
/// API version pinning.
#[derive(Debug)]
pub struct GoogleAdsClientBuilder {
    credentials: AdsCredentials,
    endpoint: String,
    token_url: String,
    api_version: String,
    timeout: Duration,
    token_retry_delay: Option<Duration>,
}

impl GoogleAdsClientBuilder {
    #[must_use]
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    #[must_use]
    pub fn token_url(mut self, token_url: impl Into<String>) -> Self {
        self.token_url = token_url.into();
        self
    }

    #[must_use]
    pub fn api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn token_retry_delay(mut self, delay: Duration) -> Self {
        self.token_retry_delay = Some(delay);
        self
    }

    /// Build the client and fetch a first access token.
    ///
    /// Failing here means the credentials are unusable; callers should
    /// treat it as fatal.
    pub async fn connect(self) -> AdsResult<GoogleAdsClient> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(self.timeout)
            .build()?;

        let mut tokens = TokenSource::new(
            http.clone(),
            self.credentials.client_id.clone(),
            self.credentials.client_secret.clone(),
            self.credentials.refresh_token.clone(),
        )
        .with_token_url(self.token_url);
        if let Some(delay) = self.token_retry_delay {
            tokens = tokens.with_retry_delay(delay);
        }

        tokens.access_token().await?;
        log::info!("Authenticated with Google Ads API {}", self.api_version);

        Ok(GoogleAdsClient {
            http,
            endpoint: self.endpoint.trim_end_matches('/').to_string(),
            api_version: self.api_version,
            developer_token: self.credentials.developer_token,
            login_customer_id: self.credentials.login_customer_id,
            tokens,
        })
    }
}

/// REST client for the keyword planner.
pub struct GoogleAdsClient {
    http: Client,
    endpoint: String,
    api_version: String,
    developer_token: String,
    login_customer_id: Option<CustomerId>,
    tokens: TokenSource,
}

impl GoogleAdsClient {
    #[must_use]
    pub fn builder(credentials: AdsCredentials) -> GoogleAdsClientBuilder {
        GoogleAdsClientBuilder {
            credentials,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            token_url: TOKEN_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout: Duration::from_secs(60),
            token_retry_delay: None,
        }
    }

    fn ideas_url(&self, customer_id: &CustomerId) -> String {
        format!(
            "{}/{}/customers/{}:generateKeywordIdeas",
            self.endpoint, self.api_version, customer_id
        )
    }
}

impl fmt::Debug for GoogleAdsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoogleAdsClient")
            .field("endpoint", &self.endpoint)
            .field("api_version", &self.api_version)
            .field("login_customer_id", &self.login_customer_id)
            .field("tokens", &self.tokens)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl KeywordIdeaService for GoogleAdsClient {
    async fn generate_keyword_ideas(
        &self,
        request: &KeywordIdeasRequest,
    ) -> AdsResult<Vec<KeywordIdea>> {
        let token = self.tokens.access_token().await?;
        let url = self.ideas_url(&request.customer_id);

        let mut builder = self
            .http
            .post(&url)
            .bearer_auth(token)
            .header("developer-token", &self.developer_token)
            .json(&request.to_body());
        if let Some(login) = &self.login_customer_id {
            builder = builder.header("login-customer-id", login.as_str());
        }

        log::debug!(
            "POST {} ({} seed keywords)",
            url,
            request.keywords.len()
        );
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(decode_failure(&url, status.as_u16(), &body));
        }
        decode_ideas(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_ideas_string_encoded_values() {
        let body = r#"{
            "results": [
                {
                    "text": "shoe",
                    "keywordIdeaMetrics": {
                        "competition": "LOW",
                        "avgMonthlySearches": "1000",
                        "competitionIndex": "50",
                        "monthlySearchVolumes": [{"month": "JANUARY", "year": "2024", "monthlySearches": "900"}]
                    }
                },
                {
                    "text": "boot",
                    "keywordIdeaMetrics": {"competition": 4, "avgMonthlySearches": 20, "competitionIndex": 88}
                }
            ],
            "totalSize": "2"
        }"#;

        let ideas = decode_ideas(body).unwrap();
        assert_eq!(ideas.len(), 2);
        assert_eq!(ideas[0].text, "shoe");
        assert_eq!(
            ideas[0].metrics,
            IdeaMetrics {
                avg_monthly_searches: 1000,
                competition: 2,
                competition_index: 50,
            }
        );
        assert_eq!(ideas[1].metrics.competition, 4);
        assert_eq!(ideas[1].metrics.competition_index, 88);
    }

    #[test]
    fn test_decode_ideas_missing_metrics_default() {
        let body = r#"{"results": [{"text": "rare phrase"}]}"#;
        let ideas = decode_ideas(body).unwrap();
        assert_eq!(ideas[0].metrics, IdeaMetrics::default());
    }

    #[test]
    fn test_decode_ideas_empty_body() {
        assert!(decode_ideas("{}").unwrap().is_empty());
    }

    #[test]
    fn test_decode_ideas_bad_integer() {
        let body = r#"{"results": [{"text": "x", "keywordIdeaMetrics": {"avgMonthlySearches": "lots"}}]}"#;
        assert!(matches!(decode_ideas(body), Err(AdsError::Parse { .. })));
    }

    #[test]
    fn test_decode_failure_envelope() {
        let body = r#"{
            "error": {
                "code": 400,
                "message": "Request contains an invalid argument.",
                "status": "INVALID_ARGUMENT",
                "details": [{
                    "@type": "type.googleapis.com/google.ads.googleads.v22.errors.GoogleAdsFailure",
                    "errors": [{
                        "errorCode": {"keywordPlanIdeaError": "URL_AND_KEYWORD_SEED_BOTH_EMPTY"},
                        "message": "Keyword seed is empty.",
                        "location": {"fieldPathElements": [
                            {"fieldName": "keyword_seed"},
                            {"fieldName": "keywords", "index": 3}
                        ]}
                    }],
                    "requestId": "req-123"
                }]
            }
        }"#;

        let AdsError::Service(failure) = decode_failure("url", 400, body) else {
            panic!("expected service failure");
        };
        assert_eq!(failure.status, "INVALID_ARGUMENT");
        assert_eq!(failure.request_id.as_deref(), Some("req-123"));
        assert_eq!(failure.errors.len(), 1);
        assert_eq!(failure.errors[0].message, "Keyword seed is empty.");
        assert_eq!(
            failure.errors[0].error_code.as_deref(),
            Some("keywordPlanIdeaError=URL_AND_KEYWORD_SEED_BOTH_EMPTY")
        );
        assert_eq!(failure.errors[0].field_path, vec!["keyword_seed", "keywords[3]"]);
        assert!(!failure.is_resource_exhausted());
    }

    #[test]
    fn test_decode_failure_bare_429() {
        let err = decode_failure("url", 429, "Too Many Requests");
        assert!(err.is_rate_limited());
    }

    #[test]
    fn test_decode_failure_unstructured() {
        let err = decode_failure("url", 502, "<html>Bad Gateway</html>");
        assert!(matches!(err, AdsError::Http { status: 502, .. }));
        assert!(!err.is_service_reported());
    }

    #[test]
    fn test_fallback_status() {
        assert_eq!(fallback_status(429), "RESOURCE_EXHAUSTED");
        assert_eq!(fallback_status(500), "INTERNAL");
        assert_eq!(fallback_status(418), "UNKNOWN");
    }
}
