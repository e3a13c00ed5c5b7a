#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Landmark attribute, filter, and aggregate record types.
//!
//! These are the shapes the landmark map works with after a fetch
//! completes: the per-building [`Landmark`] attribute set carried by each
//! map feature, the [`FilterValue`] behind every filter control, the
//! [`OverviewResult`] aggregate shown for an active filter, and the
//! per-building violation and complaint rows shown on a detail card.
//!
//! Source data is delivered by Socrata with every column as an optional
//! string, and uses the literal `'0'` to mean "not applicable" for some
//! columns. Accessors on [`Landmark`] hide that sentinel from callers.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use strum_macros::{AsRefStr, Display, EnumString, IntoStaticStr};

/// Sentinel used by the landmark dataset for "field not applicable".
pub const NOT_APPLICABLE: &str = "0";

/// Label used when a borough code is absent or unrecognized.
pub const FALLBACK_BOROUGH_LABEL: &str = "NYC";

/// Attribute a map filter can be scoped to.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FilterField {
    /// Primary architectural style (`style_prim`).
    Style,
    /// Historic district (`hist_dist`).
    District,
}

impl FilterField {
    /// Returns the dataset column this field filters on.
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::Style => "style_prim",
            Self::District => "hist_dist",
        }
    }

    /// Returns the heading shown above this field's filter controls.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Style => "Primary styles",
            Self::District => "Historic districts",
        }
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Style, Self::District]
    }
}

/// The identity of one filter control: a field and the value it selects.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterValue {
    /// Which attribute is filtered.
    pub field: FilterField,
    /// The attribute value to match (e.g. `"Neo-Roman"`).
    pub value: String,
}

impl FilterValue {
    /// Creates a filter value for `field`.
    #[must_use]
    pub fn new(field: FilterField, value: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
        }
    }

    /// Returns the dataset column this filter matches against.
    #[must_use]
    pub const fn column(&self) -> &'static str {
        self.field.column()
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.column(), self.value)
    }
}

/// The five New York City boroughs, keyed by the dataset's two-letter code.
///
/// Code lookup is case-insensitive (`"bk"` and `"BK"` both resolve to
/// [`Borough::Brooklyn`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, IntoStaticStr)]
#[strum(ascii_case_insensitive)]
pub enum Borough {
    #[strum(serialize = "BK")]
    Brooklyn,
    #[strum(serialize = "SI")]
    StatenIsland,
    #[strum(serialize = "QN")]
    Queens,
    #[strum(serialize = "MN")]
    Manhattan,
    #[strum(serialize = "BX")]
    Bronx,
}

impl Borough {
    /// Resolves a two-letter borough code, ignoring case and surrounding
    /// whitespace.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        code.trim().parse().ok()
    }

    /// Returns the human-readable borough name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Brooklyn => "Brooklyn",
            Self::StatenIsland => "Staten Island",
            Self::Queens => "Queens",
            Self::Manhattan => "Manhattan",
            Self::Bronx => "Bronx",
        }
    }

    /// Returns the canonical upper-case code.
    #[must_use]
    pub fn code(self) -> &'static str {
        self.into()
    }
}

/// Resolves an optional borough code to a display label, falling back to
/// [`FALLBACK_BOROUGH_LABEL`] when the code is absent or unknown.
#[must_use]
pub fn borough_label(code: Option<&str>) -> &'static str {
    code.and_then(Borough::from_code)
        .map_or(FALLBACK_BOROUGH_LABEL, Borough::name)
}

/// One landmark building's attribute set, as carried in a map feature's
/// properties.
///
/// Immutable once fetched. Every column is optional; numeric columns are
/// kept as the strings the dataset delivers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Landmark {
    /// Building identification number.
    #[serde(default, deserialize_with = "opt_string")]
    pub bin: Option<String>,
    /// Borough/block/lot identifier.
    #[serde(default, deserialize_with = "opt_string")]
    pub bbl: Option<String>,
    /// Two-letter borough code (e.g. `"BK"`).
    #[serde(default, deserialize_with = "opt_string")]
    pub borough: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub zip_code: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub owner_name: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub num_floors: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub year_build: Option<String>,
    /// Architect or builder.
    #[serde(default, deserialize_with = "opt_string")]
    pub arch_build: Option<String>,
    /// Primary architectural style.
    #[serde(default, deserialize_with = "opt_string")]
    pub style_prim: Option<String>,
    /// Primary building material.
    #[serde(default, deserialize_with = "opt_string")]
    pub mat_prim: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub use_orig: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub use_other: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub build_type: Option<String>,
    /// Building name, or `'0'` when the building has none.
    #[serde(default, deserialize_with = "opt_string")]
    pub build_nme: Option<String>,
    /// Historic district, or `'0'` when not in one.
    #[serde(default, deserialize_with = "opt_string")]
    pub hist_dist: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub era: Option<String>,
}

impl Landmark {
    /// Returns the historic district, suppressing the `'0'` sentinel.
    #[must_use]
    pub fn historic_district(&self) -> Option<&str> {
        applicable(self.hist_dist.as_deref())
    }

    /// Returns the building name, suppressing the `'0'` sentinel.
    #[must_use]
    pub fn building_name(&self) -> Option<&str> {
        applicable(self.build_nme.as_deref())
    }

    /// Returns the borough display label (see [`borough_label`]).
    #[must_use]
    pub fn borough_label(&self) -> &'static str {
        borough_label(self.borough.as_deref())
    }

    /// Returns the card header line: `"{address}, {borough}, NYC {zip}"`.
    #[must_use]
    pub fn header(&self) -> String {
        format!(
            "{}, {}, NYC {}",
            self.address.as_deref().unwrap_or_default(),
            self.borough_label(),
            self.zip_code.as_deref().unwrap_or_default(),
        )
    }

    /// Returns a Google Maps place link for this landmark's address.
    #[must_use]
    pub fn map_link(&self) -> String {
        format!(
            "https://www.google.com/maps/place/{}",
            self.header().replace(' ', "+")
        )
    }

    /// Returns the building identifier if present and non-empty.
    #[must_use]
    pub fn bin(&self) -> Option<&str> {
        self.bin.as_deref().filter(|bin| !bin.trim().is_empty())
    }
}

fn applicable(value: Option<&str>) -> Option<&str> {
    value.filter(|v| *v != NOT_APPLICABLE)
}

/// Accepts strings, numbers and booleans, normalizing all of them to a
/// string. `null` and missing values become `None`.
fn opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }))
}

/// A landmark as rendered on the map: an optional geometry plus the
/// attributes parsed from the `GeoJSON` feature's properties.
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkFeature {
    /// Footprint geometry. `None` if the source row has none.
    pub geometry: Option<geojson::Geometry>,
    /// Attribute set from the feature's properties.
    pub landmark: Landmark,
}

impl TryFrom<geojson::Feature> for LandmarkFeature {
    type Error = serde_json::Error;

    fn try_from(feature: geojson::Feature) -> Result<Self, Self::Error> {
        let properties = feature.properties.unwrap_or_default();
        let landmark = serde_json::from_value(serde_json::Value::Object(properties))?;
        Ok(Self {
            geometry: feature.geometry,
            landmark,
        })
    }
}

impl From<&LandmarkFeature> for geojson::Feature {
    fn from(feature: &LandmarkFeature) -> Self {
        let properties = match serde_json::to_value(&feature.landmark) {
            Ok(serde_json::Value::Object(map)) => Some(map),
            _ => None,
        };
        Self {
            bbox: None,
            geometry: feature.geometry.clone(),
            id: None,
            properties,
            foreign_members: None,
        }
    }
}

/// One `field - value` line of an overview aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverviewField {
    pub name: String,
    pub value: String,
}

/// An aggregate record summarizing the landmarks matching one filter.
///
/// The record is an arbitrary field-to-value mapping; field order is the
/// order the service returned them in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OverviewResult {
    /// Aggregate fields in response order.
    pub fields: Vec<OverviewField>,
}

impl OverviewResult {
    /// Builds a result from a JSON object, keeping key order.
    #[must_use]
    pub fn from_map(map: serde_json::Map<String, serde_json::Value>) -> Self {
        let fields = map
            .into_iter()
            .map(|(name, value)| OverviewField {
                name,
                value: display_value(value),
            })
            .collect();
        Self { fields }
    }

    /// Looks up a field's display value by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }
}

impl<'de> Deserialize<'de> for OverviewResult {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let map = serde_json::Map::<String, serde_json::Value>::deserialize(deserializer)?;
        Ok(Self::from_map(map))
    }
}

fn display_value(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// A landmark preservation violation tied to one building.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationRecord {
    #[serde(rename = "vio_date", default, deserialize_with = "opt_string")]
    pub date: Option<String>,
    #[serde(rename = "violation_class", default, deserialize_with = "opt_string")]
    pub class: Option<String>,
}

/// A complaint filed against one building.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplaintRecord {
    #[serde(default, deserialize_with = "opt_string")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub work_reported: Option<String>,
}
