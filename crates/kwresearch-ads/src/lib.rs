//! Google Ads keyword planning for kwresearch.
//!
//! Provides the keyword idea service abstraction and its REST client,
//! OAuth token handling, request pacing, and the batch pipeline that turns
//! a list of seed keywords into per-keyword metrics.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod oauth;
pub mod pipeline;
pub mod resilience;
pub mod service;

pub use client::{GoogleAdsClient, GoogleAdsClientBuilder};
pub use config::Config;
pub use credentials::AdsCredentials;
pub use error::{AdsError, AdsResult};
pub use oauth::{ClientSecret, TokenSource};
pub use pipeline::{BatchPipeline, PipelineOptions, RunStats};
pub use resilience::Throttle;
pub use service::{
    FieldError, IdeaMetrics, KeywordIdea, KeywordIdeaService, KeywordIdeasRequest, ServiceFailure,
};
