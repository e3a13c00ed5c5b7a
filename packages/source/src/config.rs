//! Socrata dataset configuration.
//!
//! The dataset identifiers, column names and limits the client queries are
//! defined in `packages/source/config/nyc.toml`, baked into the binary at
//! compile time via [`include_str!`]. A few values can be overridden from
//! the environment at startup (see [`SocrataSettings::with_env_overrides`]).

use landmark_map_landmark_models::FilterField;
use serde::Deserialize;

/// TOML config embedded at compile time.
const NYC_TOML: &str = include_str!("../config/nyc.toml");

/// Overrides the SODA host (e.g. a local mock).
pub const BASE_URL_ENV: &str = "SOCRATA_BASE_URL";
/// Socrata application token sent with every request.
pub const APP_TOKEN_ENV: &str = "SOCRATA_APP_TOKEN";
/// Overrides the violations dataset identifier.
pub const VIOLATIONS_DATASET_ENV: &str = "LANDMARK_VIOLATIONS_DATASET";
/// Overrides the complaints dataset identifier.
pub const COMPLAINTS_DATASET_ENV: &str = "LANDMARK_COMPLAINTS_DATASET";

/// Everything the Socrata client needs to know about its datasets.
#[derive(Debug, Clone, Deserialize)]
pub struct SocrataSettings {
    /// SODA host, e.g. `"https://data.cityofnewyork.us"`.
    pub base_url: String,
    /// Optional application token (raises Socrata's rate limits).
    #[serde(default)]
    pub app_token: Option<String>,
    /// Landmark footprints dataset.
    pub landmarks: LandmarkDataset,
    /// Filter catalog queries per field.
    pub catalogs: CatalogSettings,
    /// Aggregate shown on the overview card.
    pub overview: OverviewSettings,
    /// Per-building violations dataset.
    pub violations: RecordDataset,
    /// Per-building complaints dataset.
    pub complaints: RecordDataset,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LandmarkDataset {
    /// Socrata 4x4 dataset identifier.
    pub dataset: String,
    /// Column giving geometry pages a stable order.
    pub page_order: String,
    /// `$limit` of each geometry page.
    pub page_size: u32,
    /// Most features one fetch will page through.
    pub max_features: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogSettings {
    pub style: CatalogQuery,
    pub district: CatalogQuery,
}

impl CatalogSettings {
    /// Returns the catalog query for `field`.
    #[must_use]
    pub const fn for_field(&self, field: FilterField) -> &CatalogQuery {
        match field {
            FilterField::Style => &self.style,
            FilterField::District => &self.district,
        }
    }
}

/// A grouped count query listing the distinct values of one column.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogQuery {
    /// Alias of the `count(*)` column.
    pub count_alias: String,
    /// Values left out of the catalog (e.g. `"NOT DETERMINED"`, `"0"`).
    #[serde(default)]
    pub exclude: Vec<String>,
    pub order: String,
    pub limit: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OverviewSettings {
    /// `$select` aggregate expression.
    pub select: String,
}

/// A dataset of records keyed by building identifier.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordDataset {
    pub dataset: String,
    /// Column holding the building identifier.
    pub bin_column: String,
    pub order: String,
    pub limit: u32,
}

impl SocrataSettings {
    /// Returns the embedded NYC Open Data configuration.
    ///
    /// # Panics
    ///
    /// Panics if the embedded TOML is malformed (a development error caught
    /// by the tests below, since the file is compiled in).
    #[must_use]
    pub fn nyc() -> Self {
        parse_settings(NYC_TOML).unwrap_or_else(|e| panic!("Failed to parse nyc.toml: {e}"))
    }

    /// Applies overrides from the environment variables listed at the top
    /// of this module. Unset or empty variables leave values untouched.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(base_url) = get(BASE_URL_ENV) {
            log::info!("Using Socrata host from {BASE_URL_ENV}: {base_url}");
            self.base_url = base_url;
        }
        if let Some(token) = get(APP_TOKEN_ENV) {
            self.app_token = Some(token);
        }
        if let Some(dataset) = get(VIOLATIONS_DATASET_ENV) {
            self.violations.dataset = dataset;
        }
        if let Some(dataset) = get(COMPLAINTS_DATASET_ENV) {
            self.complaints.dataset = dataset;
        }
        self
    }
}

/// Parses settings from TOML.
///
/// # Errors
///
/// Returns a [`toml::de::Error`] if the document does not match
/// [`SocrataSettings`].
pub fn parse_settings(toml_str: &str) -> Result<SocrataSettings, toml::de::Error> {
    toml::de::from_str(toml_str)
}
