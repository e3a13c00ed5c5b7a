//! Mutual exclusion between a selected feature and a selected filter.

use landmark_map_landmark_models::FilterValue;
use serde::Serialize;

use crate::filter::FilterControls;
use crate::layer::{FeatureId, FeatureLayer};
use crate::policy::Stamp;

/// What the user has currently selected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "target", rename_all = "snake_case")]
pub enum Selection {
    #[default]
    None,
    Feature(FeatureId),
    Filter(FilterValue),
}

/// Tracks the one visually emphasized selection.
///
/// Every transition first removes the previous selection's emphasis (the
/// feature's style or the filter control's colors), then applies the new
/// one, so at most one element is emphasized at a time. Each transition
/// also advances the selection stamp used to recognize stale fetches.
#[derive(Debug, Default)]
pub struct SelectionState {
    current: Selection,
    stamp: Stamp,
}

impl SelectionState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn current(&self) -> &Selection {
        &self.current
    }

    #[must_use]
    pub const fn stamp(&self) -> Stamp {
        self.stamp
    }

    #[must_use]
    pub const fn selected_feature(&self) -> Option<FeatureId> {
        match self.current {
            Selection::Feature(id) => Some(id),
            _ => None,
        }
    }

    #[must_use]
    pub const fn selected_filter(&self) -> Option<&FilterValue> {
        match &self.current {
            Selection::Filter(filter) => Some(filter),
            _ => None,
        }
    }

    /// Selects feature `id`, restoring whatever was emphasized before.
    pub fn select_feature(
        &mut self,
        id: FeatureId,
        layer: &mut FeatureLayer,
        controls: &mut FilterControls,
    ) -> Stamp {
        self.release(layer, controls);
        if !layer.emphasize(id) {
            log::debug!("Selected feature {} is not on the layer", id.value());
        }
        self.current = Selection::Feature(id);
        self.advance()
    }

    /// Selects `filter`, restoring whatever was emphasized before.
    pub fn select_filter(
        &mut self,
        filter: FilterValue,
        layer: &mut FeatureLayer,
        controls: &mut FilterControls,
    ) -> Stamp {
        self.release(layer, controls);
        if !controls.emphasize(&filter) {
            log::debug!("Selected filter {filter} has no control");
        }
        self.current = Selection::Filter(filter);
        self.advance()
    }

    /// Drops the selection and its emphasis.
    pub fn clear(&mut self, layer: &mut FeatureLayer, controls: &mut FilterControls) -> Stamp {
        self.release(layer, controls);
        self.advance()
    }

    fn release(&mut self, layer: &mut FeatureLayer, controls: &mut FilterControls) {
        match std::mem::take(&mut self.current) {
            Selection::None => {}
            Selection::Feature(id) => {
                layer.reset_style(id);
            }
            Selection::Filter(filter) => {
                controls.reset_emphasis(&filter);
            }
        }
    }

    fn advance(&mut self) -> Stamp {
        self.stamp = self.stamp.next();
        self.stamp
    }
}
