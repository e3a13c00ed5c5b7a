//! Socrata SODA API client for the landmark datasets.
//!
//! Geometry comes from the dataset's `.geojson` endpoint; catalogs,
//! overviews and per-building records come from the `.json` endpoint with
//! `SoQL` `$select`/`$where`/`$group` parameters built by [`SoqlQuery`].

use async_trait::async_trait;
use landmark_map_landmark_models::{
    ComplaintRecord, FilterField, FilterValue, LandmarkFeature, OverviewResult, ViolationRecord,
};

use crate::config::{RecordDataset, SocrataSettings};
use crate::http::{decode_rows, get_json};
use crate::soql::SoqlQuery;
use crate::{AttributeQueryService, GeometrySource, SourceError};

/// A client for the landmark datasets on one Socrata host.
pub struct SocrataClient {
    client: reqwest::Client,
    settings: SocrataSettings,
}

impl SocrataClient {
    #[must_use]
    pub fn new(settings: SocrataSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            settings,
        }
    }

    #[must_use]
    pub const fn settings(&self) -> &SocrataSettings {
        &self.settings
    }

    /// Returns `{base}/resource/{dataset}.{extension}`.
    #[must_use]
    pub fn resource_url(&self, dataset: &str, extension: &str) -> String {
        format!(
            "{}/resource/{dataset}.{extension}",
            self.settings.base_url.trim_end_matches('/')
        )
    }

    /// Query for one page of landmark geometries, optionally scoped to one
    /// filter.
    #[must_use]
    pub fn landmarks_query(
        &self,
        filter: Option<&FilterValue>,
        offset: u32,
        limit: u32,
    ) -> SoqlQuery {
        let query = SoqlQuery::new()
            .order(self.settings.landmarks.page_order.clone())
            .limit(limit)
            .offset(offset);
        match filter {
            Some(filter) => query.where_eq(filter.column(), &filter.value),
            None => query,
        }
    }

    /// Query listing the distinct values of `field` with their counts.
    #[must_use]
    pub fn catalog_query(&self, field: FilterField) -> SoqlQuery {
        let catalog = self.settings.catalogs.for_field(field);
        let column = field.column();
        let query = catalog.exclude.iter().fold(
            SoqlQuery::new().select(format!("{column}, count(*) as {}", catalog.count_alias)),
            |query, excluded| query.where_not_eq(column, excluded),
        );
        query
            .group(column)
            .order(catalog.order.clone())
            .limit(catalog.limit)
    }

    /// Query for the aggregate overview of one filter.
    #[must_use]
    pub fn overview_query(&self, filter: &FilterValue) -> SoqlQuery {
        SoqlQuery::new()
            .select(self.settings.overview.select.clone())
            .where_eq(filter.column(), &filter.value)
    }

    /// Query for the rows of `dataset` belonging to building `bin`.
    #[must_use]
    pub fn records_query(dataset: &RecordDataset, bin: &str) -> SoqlQuery {
        SoqlQuery::new()
            .where_eq(&dataset.bin_column, bin)
            .order(dataset.order.clone())
            .limit(dataset.limit)
    }

    async fn get(&self, url: &str, query: &SoqlQuery) -> Result<serde_json::Value, SourceError> {
        get_json(
            &self.client,
            url,
            query,
            self.settings.app_token.as_deref(),
        )
        .await
    }

    async fn fetch_features(
        &self,
        filter: Option<&FilterValue>,
    ) -> Result<Vec<LandmarkFeature>, SourceError> {
        let dataset = &self.settings.landmarks;
        let url = self.resource_url(&dataset.dataset, "geojson");
        let label = filter.map_or_else(|| "all landmarks".to_string(), ToString::to_string);
        let mut features = Vec::new();
        let mut offset = 0;

        while let Some(limit) = page_limit(offset, dataset.page_size, dataset.max_features) {
            log::info!("Fetching {label}: offset={offset}, limit={limit}");
            let body = self
                .get(&url, &self.landmarks_query(filter, offset, limit))
                .await?;
            let (page, received) = parse_feature_page(body)?;
            features.extend(page);
            offset = offset.saturating_add(u32::try_from(received).unwrap_or(u32::MAX));

            if received < limit as usize {
                break;
            }
            if offset >= dataset.max_features {
                log::warn!(
                    "Stopped fetching {label} at {} features; more may exist",
                    dataset.max_features
                );
                break;
            }
        }

        log::info!("Fetched {} landmark features for {label}", features.len());
        Ok(features)
    }

    async fn fetch_records<T>(
        &self,
        dataset: &RecordDataset,
        bin: &str,
    ) -> Result<Vec<T>, SourceError>
    where
        T: serde::de::DeserializeOwned,
    {
        let url = self.resource_url(&dataset.dataset, "json");
        let body = self.get(&url, &Self::records_query(dataset, bin)).await?;
        decode_rows(body)
    }
}

/// Returns the `$limit` of the page starting at `offset`, or `None` once
/// `max_features` have been requested.
#[must_use]
pub fn page_limit(offset: u32, page_size: u32, max_features: u32) -> Option<u32> {
    let remaining = max_features.saturating_sub(offset);
    (remaining > 0 && page_size > 0).then(|| remaining.min(page_size))
}

/// Converts a `GeoJSON` `FeatureCollection` body into landmark features.
///
/// Features whose properties do not decode are skipped with a warning.
///
/// # Errors
///
/// Returns [`SourceError::MalformedResult`] if `body` is not a
/// `FeatureCollection`.
pub fn parse_feature_collection(
    body: serde_json::Value,
) -> Result<Vec<LandmarkFeature>, SourceError> {
    parse_feature_page(body).map(|(features, _)| features)
}

/// Like [`parse_feature_collection`], also returning how many features the
/// page held before unreadable ones were skipped.
fn parse_feature_page(
    body: serde_json::Value,
) -> Result<(Vec<LandmarkFeature>, usize), SourceError> {
    let collection: geojson::FeatureCollection =
        serde_json::from_value(body).map_err(|e| SourceError::MalformedResult {
            message: format!("expected a GeoJSON FeatureCollection: {e}"),
        })?;
    let received = collection.features.len();

    let features = collection
        .features
        .into_iter()
        .filter_map(|feature| match LandmarkFeature::try_from(feature) {
            Ok(feature) => Some(feature),
            Err(e) => {
                log::warn!("Skipping landmark feature with unreadable properties: {e}");
                None
            }
        })
        .collect();
    Ok((features, received))
}

/// Extracts the catalog values of `field` from grouped count rows.
///
/// Rows without a string value for the field's column (e.g. the `NULL`
/// group) are skipped.
#[must_use]
pub fn parse_catalog(
    field: FilterField,
    rows: Vec<serde_json::Map<String, serde_json::Value>>,
) -> Vec<FilterValue> {
    rows.into_iter()
        .filter_map(|mut row| match row.remove(field.column()) {
            Some(serde_json::Value::String(value)) if !value.is_empty() => {
                Some(FilterValue::new(field, value))
            }
            _ => None,
        })
        .collect()
}

#[async_trait]
impl GeometrySource for SocrataClient {
    async fn fetch_all_landmarks(&self) -> Result<Vec<LandmarkFeature>, SourceError> {
        self.fetch_features(None).await
    }

    async fn fetch_landmarks_by_filter(
        &self,
        filter: &FilterValue,
    ) -> Result<Vec<LandmarkFeature>, SourceError> {
        self.fetch_features(Some(filter)).await
    }
}

#[async_trait]
impl AttributeQueryService for SocrataClient {
    async fn fetch_filter_catalog(
        &self,
        field: FilterField,
    ) -> Result<Vec<FilterValue>, SourceError> {
        let url = self.resource_url(&self.settings.landmarks.dataset, "json");
        let body = self.get(&url, &self.catalog_query(field)).await?;
        let values = parse_catalog(field, decode_rows(body)?);
        log::info!("Fetched {} {field} catalog values", values.len());
        Ok(values)
    }

    async fn fetch_overview(
        &self,
        filter: &FilterValue,
    ) -> Result<Vec<OverviewResult>, SourceError> {
        let url = self.resource_url(&self.settings.landmarks.dataset, "json");
        let body = self.get(&url, &self.overview_query(filter)).await?;
        decode_rows(body)
    }

    async fn fetch_violations(&self, bin: &str) -> Result<Vec<ViolationRecord>, SourceError> {
        self.fetch_records(&self.settings.violations, bin).await
    }

    async fn fetch_complaints(&self, bin: &str) -> Result<Vec<ComplaintRecord>, SourceError> {
        self.fetch_records(&self.settings.complaints, bin).await
    }
}
