#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Landmark geometry and attribute sources.
//!
//! The map consumes two external collaborators: a [`GeometrySource`] that
//! supplies landmark footprints as `GeoJSON` features, and an
//! [`AttributeQueryService`] that answers filter catalog, overview, and
//! per-building record queries. [`socrata::SocrataClient`] implements both
//! against the NYC Open Data SODA API.
//!
//! All operations are read-only and idempotent. An empty result is a valid
//! answer meaning "no matching records", never an error.

pub mod config;
pub mod http;
pub mod parsing;
pub mod socrata;
pub mod soql;

use async_trait::async_trait;
use landmark_map_landmark_models::{
    ComplaintRecord, FilterField, FilterValue, LandmarkFeature, OverviewResult, ViolationRecord,
};

/// Errors that can occur while fetching from a source.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The service answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status {
        /// Response status code.
        status: u16,
        /// Requested URL.
        url: String,
    },

    /// The response decoded but is missing the expected shape or fields.
    #[error("Malformed result: {message}")]
    MalformedResult {
        /// Description of what was missing.
        message: String,
    },
}

impl SourceError {
    /// Returns `true` for a response that arrived but had the wrong shape.
    #[must_use]
    pub const fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedResult { .. })
    }
}

/// Supplies landmark geometries as map features.
#[async_trait]
pub trait GeometrySource: Send + Sync {
    /// Fetches every landmark in the dataset.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the request or decoding fails.
    async fn fetch_all_landmarks(&self) -> Result<Vec<LandmarkFeature>, SourceError>;

    /// Fetches the landmarks whose `filter.field` column equals
    /// `filter.value`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the request or decoding fails.
    async fn fetch_landmarks_by_filter(
        &self,
        filter: &FilterValue,
    ) -> Result<Vec<LandmarkFeature>, SourceError>;
}

/// Resolves catalog, aggregate, and per-building queries against the
/// landmark attribute tables.
#[async_trait]
pub trait AttributeQueryService: Send + Sync {
    /// Fetches the filter values offered for `field`. Called once per
    /// field at startup.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the request or decoding fails.
    async fn fetch_filter_catalog(
        &self,
        field: FilterField,
    ) -> Result<Vec<FilterValue>, SourceError>;

    /// Fetches the aggregate overview for `filter`. The service answers
    /// with a sequence; callers consume the first element only.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the request or decoding fails.
    async fn fetch_overview(&self, filter: &FilterValue)
    -> Result<Vec<OverviewResult>, SourceError>;

    /// Fetches the violations recorded against building `bin`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the request or decoding fails.
    async fn fetch_violations(&self, bin: &str) -> Result<Vec<ViolationRecord>, SourceError>;

    /// Fetches the complaints filed against building `bin`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the request or decoding fails.
    async fn fetch_complaints(&self, bin: &str) -> Result<Vec<ComplaintRecord>, SourceError>;
}
