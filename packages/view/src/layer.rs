//! The map's feature layer: the landmarks currently drawn and their styles.

use landmark_map_landmark_models::{Landmark, LandmarkFeature};
use serde::Serialize;

use crate::policy::Stamp;

/// Identifies one rendered feature. Ids are never reused, even across
/// layer resets, so a stale id simply stops resolving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct FeatureId(u64);

impl FeatureId {
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

/// Stroke and fill used to draw a feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FeatureStyle {
    pub color: &'static str,
    pub fill_color: &'static str,
    pub weight: u8,
}

impl FeatureStyle {
    pub const DEFAULT: Self = Self {
        color: "#3388ff",
        fill_color: "#3388ff",
        weight: 2,
    };

    pub const SELECTED: Self = Self {
        color: "red",
        fill_color: "yellow",
        weight: 2,
    };
}

/// A feature as drawn on the layer.
#[derive(Debug, Clone)]
pub struct RenderedFeature {
    id: FeatureId,
    feature: LandmarkFeature,
    emphasized: bool,
}

impl RenderedFeature {
    #[must_use]
    pub const fn id(&self) -> FeatureId {
        self.id
    }

    #[must_use]
    pub const fn feature(&self) -> &LandmarkFeature {
        &self.feature
    }

    #[must_use]
    pub const fn landmark(&self) -> &Landmark {
        &self.feature.landmark
    }

    #[must_use]
    pub const fn is_emphasized(&self) -> bool {
        self.emphasized
    }

    #[must_use]
    pub const fn style(&self) -> FeatureStyle {
        if self.emphasized {
            FeatureStyle::SELECTED
        } else {
            FeatureStyle::DEFAULT
        }
    }
}

/// The set of landmark features currently on the map.
///
/// Each [`reset`](Self::reset) advances the layer's epoch; geometry fetched
/// for an older epoch is stale.
#[derive(Debug, Default)]
pub struct FeatureLayer {
    features: Vec<RenderedFeature>,
    next_id: u64,
    epoch: Stamp,
}

impl FeatureLayer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn epoch(&self) -> Stamp {
        self.epoch
    }

    /// Removes every feature and starts a new epoch.
    pub fn reset(&mut self) -> Stamp {
        self.features.clear();
        self.epoch = self.epoch.next();
        self.epoch
    }

    /// Appends `features` with the default style and returns their ids.
    pub fn add_features(&mut self, features: Vec<LandmarkFeature>) -> Vec<FeatureId> {
        self.features.reserve(features.len());
        features
            .into_iter()
            .map(|feature| {
                self.next_id += 1;
                let id = FeatureId(self.next_id);
                self.features.push(RenderedFeature {
                    id,
                    feature,
                    emphasized: false,
                });
                id
            })
            .collect()
    }

    #[must_use]
    pub fn get(&self, id: FeatureId) -> Option<&RenderedFeature> {
        self.features.iter().find(|f| f.id == id)
    }

    /// Finds the first feature for building `bin`.
    #[must_use]
    pub fn find_by_bin(&self, bin: &str) -> Option<FeatureId> {
        self.features
            .iter()
            .find(|f| f.landmark().bin() == Some(bin))
            .map(|f| f.id)
    }

    /// Applies the selected style. Returns `false` if `id` is not on the layer.
    pub fn emphasize(&mut self, id: FeatureId) -> bool {
        self.set_emphasis(id, true)
    }

    /// Restores the default style. Returns `false` if `id` is not on the layer.
    pub fn reset_style(&mut self, id: FeatureId) -> bool {
        self.set_emphasis(id, false)
    }

    fn set_emphasis(&mut self, id: FeatureId, emphasized: bool) -> bool {
        self.features
            .iter_mut()
            .find(|f| f.id == id)
            .map(|f| f.emphasized = emphasized)
            .is_some()
    }

    #[must_use]
    pub fn emphasized_count(&self) -> usize {
        self.features.iter().filter(|f| f.emphasized).count()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RenderedFeature> {
        self.features.iter()
    }

    /// Exports the layer as `GeoJSON`, with each feature's id and style.
    #[must_use]
    pub fn to_feature_collection(&self) -> geojson::FeatureCollection {
        let features = self
            .features
            .iter()
            .map(|rendered| {
                let mut feature = geojson::Feature::from(&rendered.feature);
                feature.id = Some(geojson::feature::Id::Number(rendered.id.0.into()));
                if let Ok(style) = serde_json::to_value(rendered.style()) {
                    feature
                        .foreign_members
                        .get_or_insert_with(Default::default)
                        .insert("style".to_string(), style);
                }
                feature
            })
            .collect();

        geojson::FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        }
    }
}
