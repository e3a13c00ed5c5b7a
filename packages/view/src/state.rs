//! The map's UI state, shared by every pipeline step of a session.

use landmark_map_landmark_models::{LandmarkFeature, OverviewResult};
use landmark_map_source::SourceError;

use crate::display::DisplayReconciler;
use crate::filter::FilterControls;
use crate::layer::FeatureLayer;
use crate::policy::{RenderPolicy, Stamp, StepOutcome};
use crate::selection::SelectionState;

/// Everything drawn on the map plus the current selection.
///
/// Lives in a `RefCell` owned by the session. Pipeline steps borrow it
/// only between awaits, never across one.
#[derive(Debug)]
pub struct MapState {
    pub(crate) selection: SelectionState,
    pub(crate) layer: FeatureLayer,
    pub(crate) controls: FilterControls,
    pub(crate) display: DisplayReconciler,
    policy: RenderPolicy,
}

impl MapState {
    #[must_use]
    pub fn new(policy: RenderPolicy) -> Self {
        Self {
            selection: SelectionState::new(),
            layer: FeatureLayer::new(),
            controls: FilterControls::default(),
            display: DisplayReconciler::new(),
            policy,
        }
    }

    #[must_use]
    pub const fn policy(&self) -> RenderPolicy {
        self.policy
    }

    #[must_use]
    pub const fn selection(&self) -> &SelectionState {
        &self.selection
    }

    #[must_use]
    pub const fn layer(&self) -> &FeatureLayer {
        &self.layer
    }

    #[must_use]
    pub const fn controls(&self) -> &FilterControls {
        &self.controls
    }

    #[must_use]
    pub const fn display(&self) -> &DisplayReconciler {
        &self.display
    }

    /// Number of emphasized features and filter controls.
    #[must_use]
    pub fn emphasized_count(&self) -> usize {
        self.layer.emphasized_count() + self.controls.emphasized_count()
    }

    /// Adds fetched geometry to the layer if the layer has not been reset
    /// since `epoch` (or the policy does not care).
    pub(crate) fn render_geometry(
        &mut self,
        epoch: Stamp,
        result: Result<Vec<LandmarkFeature>, SourceError>,
    ) -> StepOutcome {
        let features = match result {
            Ok(features) => features,
            Err(e) => {
                log::warn!("Landmark geometry fetch failed: {e}");
                return StepOutcome::Failed(e);
            }
        };

        if !self.policy.admits(epoch, self.layer.epoch()) {
            log::debug!(
                "Discarding {} landmark features fetched for layer epoch {}",
                features.len(),
                epoch.value()
            );
            return StepOutcome::Discarded;
        }

        let items = self.layer.add_features(features).len();
        StepOutcome::Rendered { items }
    }

    /// Shows a fetched overview if the selection has not changed since
    /// `issued` (or the policy does not care).
    pub(crate) fn render_overview(
        &mut self,
        issued: Stamp,
        result: Result<Vec<OverviewResult>, SourceError>,
        title: &str,
    ) -> StepOutcome {
        let results = match result {
            Ok(results) => results,
            Err(e) => {
                log::warn!("Overview fetch for {title} failed: {e}");
                return StepOutcome::Failed(e);
            }
        };

        if !self.policy.admits(issued, self.selection.stamp()) {
            log::debug!("Discarding stale overview for {title}");
            return StepOutcome::Discarded;
        }

        if results.is_empty() {
            let e = SourceError::MalformedResult {
                message: format!("overview for {title} returned no records"),
            };
            log::warn!("{e}");
        }
        self.display.show_overview(&results, title);
        let items = results.first().map_or(0, |r| r.fields.len());
        StepOutcome::Rendered { items }
    }
}
