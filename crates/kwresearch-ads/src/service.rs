//! The keyword idea service seam.
//!
//! [`KeywordIdeaService`] is the one remote operation the pipeline depends
//! on. [`GoogleAdsClient`](crate::client::GoogleAdsClient) implements it
//! against the REST API; tests implement it with in-memory stubs.

use async_trait::async_trait;
use serde::Serialize;

use kwresearch_core::model::{CustomerId, LanguageId, LocationId};

use crate::error::AdsResult;

/// Default page-size hint. The service is free to ignore it for seed
/// keyword requests.
pub const DEFAULT_PAGE_SIZE: u32 = 1;

/// Metrics are computed for the Google Search network only.
const KEYWORD_PLAN_NETWORK: &str = "GOOGLE_SEARCH";

/// A "generate keyword ideas" request for one batch of seed keywords.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordIdeasRequest {
    pub customer_id: CustomerId,
    pub language: LanguageId,
    pub geo_targets: Vec<LocationId>,
    pub keywords: Vec<String>,
    pub page_size: u32,
}

impl KeywordIdeasRequest {
    /// Build a search-network request for `keywords` targeting a single
    /// language and location.
    #[must_use]
    pub fn new(
        customer_id: CustomerId,
        keywords: &[String],
        language: LanguageId,
        location: LocationId,
    ) -> Self {
        Self {
            customer_id,
            language,
            geo_targets: vec![location],
            keywords: keywords.to_vec(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// JSON body in the REST API's camelCase shape. The customer id travels
    /// in the URL, not the body.
    #[must_use]
    pub fn to_body(&self) -> RequestBody<'_> {
        RequestBody {
            language: self.language.resource_name(),
            geo_target_constants: self.geo_targets.iter().map(LocationId::resource_name).collect(),
            keyword_plan_network: KEYWORD_PLAN_NETWORK,
            keyword_seed: KeywordSeed {
                keywords: &self.keywords,
            },
            page_size: self.page_size,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestBody<'a> {
    language: String,
    geo_target_constants: Vec<String>,
    keyword_plan_network: &'static str,
    keyword_seed: KeywordSeed<'a>,
    page_size: u32,
}

#[derive(Debug, Serialize)]
struct KeywordSeed<'a> {
    keywords: &'a [String],
}

/// Historical metrics attached to an idea.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IdeaMetrics {
    pub avg_monthly_searches: u64,
    /// Raw competition code as reported by the API.
    pub competition: i64,
    pub competition_index: i64,
}

/// One result record: a keyword and its metrics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordIdea {
    pub text: String,
    pub metrics: IdeaMetrics,
}

impl KeywordIdea {
    #[must_use]
    pub fn new(text: impl Into<String>, metrics: IdeaMetrics) -> Self {
        Self {
            text: text.into(),
            metrics,
        }
    }
}

/// A field-level error inside a [`ServiceFailure`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub message: String,
    /// Error code as `category=VALUE`, e.g. `quotaError=RESOURCE_EXHAUSTED`.
    pub error_code: Option<String>,
    /// Field path from the request root, outermost first.
    pub field_path: Vec<String>,
}

/// A structured failure reported by the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceFailure {
    /// RPC status name, e.g. `RESOURCE_EXHAUSTED` or `INVALID_ARGUMENT`.
    pub status: String,
    pub http_status: u16,
    pub message: String,
    pub errors: Vec<FieldError>,
    pub request_id: Option<String>,
}

impl ServiceFailure {
    /// Quota or rate exhaustion, signalled either by the RPC status, by
    /// HTTP 429, or by a quota error code on any field error.
    pub fn is_resource_exhausted(&self) -> bool {
        self.status == "RESOURCE_EXHAUSTED"
            || self.http_status == 429
            || self.errors.iter().any(|e| {
                e.error_code
                    .as_deref()
                    .is_some_and(|code| code.ends_with("RESOURCE_EXHAUSTED"))
            })
    }
}

/// The remote "generate keyword ideas" operation.
#[async_trait]
pub trait KeywordIdeaService: Send + Sync {
    async fn generate_keyword_ideas(
        &self,
        request: &KeywordIdeasRequest,
    ) -> AdsResult<Vec<KeywordIdea>>;
}
