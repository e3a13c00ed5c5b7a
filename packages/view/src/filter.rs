//! Filter controls and the filter activation pipeline.

use std::cell::RefCell;
use std::sync::Arc;

use landmark_map_landmark_models::{FilterField, FilterValue};
use landmark_map_source::{AttributeQueryService, GeometrySource, SourceError};
use serde::Serialize;

use crate::policy::StepOutcome;
use crate::state::MapState;

/// Colors applied to the control of the active filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ControlEmphasis {
    pub background: &'static str,
    pub color: &'static str,
}

impl ControlEmphasis {
    #[must_use]
    pub const fn for_field(field: FilterField) -> Self {
        match field {
            FilterField::Style => Self {
                background: "lightblue",
                color: "black",
            },
            FilterField::District => Self {
                background: "salmon",
                color: "black",
            },
        }
    }
}

/// One clickable filter control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterControl {
    pub filter: FilterValue,
    emphasis: Option<ControlEmphasis>,
}

impl FilterControl {
    #[must_use]
    pub fn label(&self) -> &str {
        &self.filter.value
    }

    #[must_use]
    pub const fn emphasis(&self) -> Option<ControlEmphasis> {
        self.emphasis
    }
}

/// The style and district control groups, in catalog order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FilterControls {
    style: Vec<FilterControl>,
    district: Vec<FilterControl>,
}

impl FilterControls {
    /// Replaces the controls of `field`'s group with `values`.
    pub fn set_group(&mut self, field: FilterField, values: Vec<FilterValue>) {
        *self.group_mut(field) = values
            .into_iter()
            .filter(|value| value.field == field)
            .map(|filter| FilterControl {
                filter,
                emphasis: None,
            })
            .collect();
    }

    #[must_use]
    pub fn group(&self, field: FilterField) -> &[FilterControl] {
        match field {
            FilterField::Style => &self.style,
            FilterField::District => &self.district,
        }
    }

    fn group_mut(&mut self, field: FilterField) -> &mut Vec<FilterControl> {
        match field {
            FilterField::Style => &mut self.style,
            FilterField::District => &mut self.district,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &FilterControl> {
        self.style.iter().chain(&self.district)
    }

    #[must_use]
    pub fn find(&self, filter: &FilterValue) -> Option<&FilterControl> {
        self.group(filter.field)
            .iter()
            .find(|control| control.filter == *filter)
    }

    /// Applies the field's emphasis colors to `filter`'s control.
    pub fn emphasize(&mut self, filter: &FilterValue) -> bool {
        self.set_emphasis(filter, Some(ControlEmphasis::for_field(filter.field)))
    }

    pub fn reset_emphasis(&mut self, filter: &FilterValue) -> bool {
        self.set_emphasis(filter, None)
    }

    fn set_emphasis(&mut self, filter: &FilterValue, emphasis: Option<ControlEmphasis>) -> bool {
        self.group_mut(filter.field)
            .iter_mut()
            .find(|control| control.filter == *filter)
            .map(|control| control.emphasis = emphasis)
            .is_some()
    }

    #[must_use]
    pub fn emphasized_count(&self) -> usize {
        self.iter().filter(|c| c.emphasis.is_some()).count()
    }
}

/// How each half of a filter activation ended.
#[derive(Debug)]
pub struct FilterOutcome {
    pub filter: FilterValue,
    pub geometry: StepOutcome,
    pub overview: StepOutcome,
}

/// Loads filter catalogs and runs filter activations.
pub struct FilterController {
    geometry: Arc<dyn GeometrySource>,
    attributes: Arc<dyn AttributeQueryService>,
}

impl FilterController {
    #[must_use]
    pub fn new(
        geometry: Arc<dyn GeometrySource>,
        attributes: Arc<dyn AttributeQueryService>,
    ) -> Self {
        Self {
            geometry,
            attributes,
        }
    }

    /// Fetches `field`'s catalog and replaces its control group.
    ///
    /// # Errors
    ///
    /// Returns the fetch error; the existing controls are left untouched.
    #[allow(clippy::future_not_send)]
    pub async fn load_catalog(
        &self,
        state: &RefCell<MapState>,
        field: FilterField,
    ) -> Result<usize, SourceError> {
        let values = self.attributes.fetch_filter_catalog(field).await?;
        let count = values.len();
        state.borrow_mut().controls.set_group(field, values);
        log::info!("Loaded {count} {} filter controls", field.label());
        Ok(count)
    }

    /// Activates `filter`.
    ///
    /// Synchronously clears the display, selects the filter and empties the
    /// layer, then fetches the filtered geometry and the overview
    /// concurrently. Each half renders as soon as its own fetch completes,
    /// subject to the session's render policy.
    #[allow(clippy::future_not_send)]
    pub async fn activate(&self, state: &RefCell<MapState>, filter: FilterValue) -> FilterOutcome {
        let (selection_stamp, layer_epoch) = {
            let mut guard = state.borrow_mut();
            let map = &mut *guard;
            map.display.clear();
            let stamp = map
                .selection
                .select_filter(filter.clone(), &mut map.layer, &mut map.controls);
            (stamp, map.layer.reset())
        };
        log::debug!("Activating filter {filter}");

        let geometry = async {
            let result = self.geometry.fetch_landmarks_by_filter(&filter).await;
            state.borrow_mut().render_geometry(layer_epoch, result)
        };
        let overview = async {
            let result = self.attributes.fetch_overview(&filter).await;
            state
                .borrow_mut()
                .render_overview(selection_stamp, result, &filter.value)
        };
        let (geometry, overview) = futures::join!(geometry, overview);

        FilterOutcome {
            filter,
            geometry,
            overview,
        }
    }
}
