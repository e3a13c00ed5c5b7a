#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Selection state, filter orchestration, and card reconciliation for the
//! landmark map.
//!
//! A [`MapSession`] owns the map's single-threaded UI state: the feature
//! layer, the filter controls, the current selection, and the display
//! container. User interactions are funneled through its methods:
//!
//! - [`MapSession::click_feature`] selects one landmark and shows its
//!   detail card.
//! - [`MapSession::activate_filter`] clears the card, selects the filter,
//!   empties the layer, then concurrently fetches the filtered geometry and
//!   the filter's overview, rendering each as it completes.
//! - [`MapSession::show_sub_list`] lazily fetches the violations or
//!   complaints for the open detail card.
//!
//! Fetches are never cancelled. Whether a result that completes after a
//! newer selection still renders is decided by the session's
//! [`RenderPolicy`].

pub mod detail;
pub mod display;
pub mod filter;
pub mod layer;
pub mod policy;
pub mod selection;
pub mod session;
pub mod state;

#[cfg(test)]
mod stub;

pub use detail::{DetailCard, DetailCardBuilder, SubList, SubListBody, SubListKind};
pub use display::{Card, CardId, DisplayReconciler, OverviewCard};
pub use filter::{ControlEmphasis, FilterControl, FilterController, FilterControls, FilterOutcome};
pub use layer::{FeatureId, FeatureLayer, FeatureStyle};
pub use policy::{RenderPolicy, Stamp, StepOutcome};
pub use selection::{Selection, SelectionState};
pub use session::{LoadReport, MapSession, SessionOptions};
pub use state::MapState;
