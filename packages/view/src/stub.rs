//! In-memory data services whose calls can be held open or made to fail.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use futures::channel::oneshot;
use landmark_map_landmark_models::{
    ComplaintRecord, FilterField, FilterValue, Landmark, LandmarkFeature, OverviewField,
    OverviewResult, ViolationRecord,
};
use landmark_map_source::{AttributeQueryService, GeometrySource, SourceError};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Call {
    AllLandmarks,
    Landmarks(FilterValue),
    Catalog(FilterField),
    Overview(FilterValue),
    Violations(String),
    Complaints(String),
}

/// Test side of a held call: `arrived` fires once the call is in flight,
/// and sending on `release` lets it complete.
pub struct Held {
    pub arrived: oneshot::Receiver<()>,
    pub release: oneshot::Sender<()>,
}

struct Gate {
    arrived: oneshot::Sender<()>,
    release: oneshot::Receiver<()>,
}

#[derive(Default)]
pub struct StubSource {
    landmarks: Vec<LandmarkFeature>,
    by_filter: HashMap<FilterValue, Vec<LandmarkFeature>>,
    catalogs: HashMap<FilterField, Vec<FilterValue>>,
    overviews: HashMap<FilterValue, Vec<OverviewResult>>,
    violations: HashMap<String, Vec<ViolationRecord>>,
    complaints: HashMap<String, Vec<ComplaintRecord>>,
    failing: Mutex<HashSet<Call>>,
    gates: Mutex<HashMap<Call, Gate>>,
    calls: Mutex<Vec<Call>>,
}

pub fn landmark_feature(bin: &str, style: &str) -> LandmarkFeature {
    LandmarkFeature {
        geometry: None,
        landmark: Landmark {
            bin: Some(bin.to_string()),
            style_prim: Some(style.to_string()),
            address: Some(format!("{bin} Broadway")),
            borough: Some("MN".to_string()),
            zip_code: Some("10012".to_string()),
            hist_dist: Some("0".to_string()),
            ..Landmark::default()
        },
    }
}

pub fn overview(pairs: &[(&str, &str)]) -> OverviewResult {
    OverviewResult {
        fields: pairs
            .iter()
            .map(|(name, value)| OverviewField {
                name: (*name).to_string(),
                value: (*value).to_string(),
            })
            .collect(),
    }
}

impl StubSource {
    pub fn with_landmarks(mut self, features: Vec<LandmarkFeature>) -> Self {
        self.landmarks = features;
        self
    }

    pub fn with_filter(
        mut self,
        filter: &FilterValue,
        features: Vec<LandmarkFeature>,
        overview: Vec<OverviewResult>,
    ) -> Self {
        self.catalogs
            .entry(filter.field)
            .or_default()
            .push(filter.clone());
        self.by_filter.insert(filter.clone(), features);
        self.overviews.insert(filter.clone(), overview);
        self
    }

    pub fn with_violations(mut self, bin: &str, records: Vec<ViolationRecord>) -> Self {
        self.violations.insert(bin.to_string(), records);
        self
    }

    pub fn with_complaints(mut self, bin: &str, records: Vec<ComplaintRecord>) -> Self {
        self.complaints.insert(bin.to_string(), records);
        self
    }

    /// Makes every later `call` fail.
    pub fn fail(&self, call: Call) {
        self.failing.lock().unwrap().insert(call);
    }

    /// Holds the next `call` until released.
    pub fn hold(&self, call: Call) -> Held {
        let (arrived_tx, arrived_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel();
        self.gates.lock().unwrap().insert(
            call,
            Gate {
                arrived: arrived_tx,
                release: release_rx,
            },
        );
        Held {
            arrived: arrived_rx,
            release: release_tx,
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    async fn enter(&self, call: Call) -> Result<(), SourceError> {
        self.calls.lock().unwrap().push(call.clone());
        let gate = self.gates.lock().unwrap().remove(&call);
        if let Some(gate) = gate {
            let _ = gate.arrived.send(());
            let _ = gate.release.await;
        }
        if self.failing.lock().unwrap().contains(&call) {
            return Err(SourceError::Status {
                status: 503,
                url: format!("stub://{call:?}"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl GeometrySource for StubSource {
    async fn fetch_all_landmarks(&self) -> Result<Vec<LandmarkFeature>, SourceError> {
        self.enter(Call::AllLandmarks).await?;
        Ok(self.landmarks.clone())
    }

    async fn fetch_landmarks_by_filter(
        &self,
        filter: &FilterValue,
    ) -> Result<Vec<LandmarkFeature>, SourceError> {
        self.enter(Call::Landmarks(filter.clone())).await?;
        Ok(self.by_filter.get(filter).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl AttributeQueryService for StubSource {
    async fn fetch_filter_catalog(
        &self,
        field: FilterField,
    ) -> Result<Vec<FilterValue>, SourceError> {
        self.enter(Call::Catalog(field)).await?;
        Ok(self.catalogs.get(&field).cloned().unwrap_or_default())
    }

    async fn fetch_overview(
        &self,
        filter: &FilterValue,
    ) -> Result<Vec<OverviewResult>, SourceError> {
        self.enter(Call::Overview(filter.clone())).await?;
        Ok(self.overviews.get(filter).cloned().unwrap_or_default())
    }

    async fn fetch_violations(&self, bin: &str) -> Result<Vec<ViolationRecord>, SourceError> {
        self.enter(Call::Violations(bin.to_string())).await?;
        Ok(self.violations.get(bin).cloned().unwrap_or_default())
    }

    async fn fetch_complaints(&self, bin: &str) -> Result<Vec<ComplaintRecord>, SourceError> {
        self.enter(Call::Complaints(bin.to_string())).await?;
        Ok(self.complaints.get(bin).cloned().unwrap_or_default())
    }
}
