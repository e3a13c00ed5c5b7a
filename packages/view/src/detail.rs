//! Landmark detail cards and their lazily loaded sub-lists.

use std::cell::RefCell;
use std::fmt;
use std::sync::Arc;

use landmark_map_landmark_models::{ComplaintRecord, Landmark, ViolationRecord};
use landmark_map_source::parsing::display_date;
use landmark_map_source::{AttributeQueryService, SourceError};
use serde::Serialize;
use strum_macros::{AsRefStr, Display, EnumString};

use crate::display::CardId;
use crate::policy::{RenderPolicy, Stamp, StepOutcome};
use crate::state::MapState;

/// Shown for an attribute the dataset leaves blank.
pub const MISSING_VALUE: &str = "unknown";

/// The per-building record lists a detail card can expand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SubListKind {
    Violations,
    Complaints,
}

impl SubListKind {
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Violations, Self::Complaints]
    }

    /// Label of the trigger that loads this list.
    #[must_use]
    pub const fn trigger_label(self) -> &'static str {
        match self {
            Self::Violations => "See Violations",
            Self::Complaints => "See Complaints",
        }
    }

    #[must_use]
    pub const fn placeholder(self) -> &'static str {
        match self {
            Self::Violations => "No violations in dataset",
            Self::Complaints => "No complaints in dataset",
        }
    }
}

/// One record of a sub-list, as display lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubListItem {
    pub lines: Vec<String>,
}

impl From<&ViolationRecord> for SubListItem {
    fn from(record: &ViolationRecord) -> Self {
        Self {
            lines: vec![
                format!("Violation Date: {}", display_date(record.date.as_deref())),
                format!("Violation Class: {}", or_missing(record.class.as_deref())),
            ],
        }
    }
}

impl From<&ComplaintRecord> for SubListItem {
    fn from(record: &ComplaintRecord) -> Self {
        Self {
            lines: vec![
                format!("Complaint Date: {}", display_date(record.date.as_deref())),
                format!("Work Reported: {}", or_missing(record.work_reported.as_deref())),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubListBody {
    Items(Vec<SubListItem>),
    Placeholder(&'static str),
}

/// A rendered sub-list: its records, or a placeholder when there are none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubList {
    pub kind: SubListKind,
    pub body: SubListBody,
}

impl SubList {
    #[must_use]
    pub fn new(kind: SubListKind, items: Vec<SubListItem>) -> Self {
        let body = if items.is_empty() {
            SubListBody::Placeholder(kind.placeholder())
        } else {
            SubListBody::Items(items)
        };
        Self { kind, body }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match &self.body {
            SubListBody::Items(items) => items.len(),
            SubListBody::Placeholder(_) => 0,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for SubList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.body {
            SubListBody::Placeholder(text) => writeln!(f, "  {text}"),
            SubListBody::Items(items) => items.iter().try_for_each(|item| {
                item.lines.iter().try_for_each(|line| writeln!(f, "  {line}"))?;
                writeln!(f)
            }),
        }
    }
}

/// Where one sub-list renders. The generation advances on every trigger so
/// a slower, older fetch cannot overwrite a newer one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
struct SubListSlot {
    #[serde(skip)]
    generation: Stamp,
    list: Option<SubList>,
}

/// Attribute summary of one selected landmark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailCard {
    pub id: CardId,
    pub bin: Option<String>,
    /// `"{address}, {borough}, NYC {zip}"`.
    pub header: String,
    pub details: Vec<String>,
    pub map_link: String,
    violations: SubListSlot,
    complaints: SubListSlot,
}

impl DetailCard {
    #[must_use]
    pub const fn sub_list(&self, kind: SubListKind) -> Option<&SubList> {
        self.slot(kind).list.as_ref()
    }

    const fn slot(&self, kind: SubListKind) -> &SubListSlot {
        match kind {
            SubListKind::Violations => &self.violations,
            SubListKind::Complaints => &self.complaints,
        }
    }

    const fn slot_mut(&mut self, kind: SubListKind) -> &mut SubListSlot {
        match kind {
            SubListKind::Violations => &mut self.violations,
            SubListKind::Complaints => &mut self.complaints,
        }
    }

    fn begin_fetch(&mut self, kind: SubListKind) -> Stamp {
        let slot = self.slot_mut(kind);
        slot.generation = slot.generation.next();
        slot.generation
    }

    /// Replaces the slot's list unless a newer trigger superseded `issued`.
    fn finish_fetch(&mut self, issued: Stamp, policy: RenderPolicy, list: SubList) -> bool {
        let slot = self.slot_mut(list.kind);
        if !policy.admits(issued, slot.generation) {
            return false;
        }
        slot.list = Some(list);
        true
    }
}

impl fmt::Display for DetailCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.header)?;
        for line in &self.details {
            writeln!(f, "  {line}")?;
        }
        writeln!(f, "  {}", self.map_link)?;
        for &kind in SubListKind::all() {
            match self.sub_list(kind) {
                Some(list) => write!(f, "\n{}:\n{list}", kind.trigger_label())?,
                None => writeln!(f, "  [{}]", kind.trigger_label())?,
            }
        }
        Ok(())
    }
}

fn or_missing(value: Option<&str>) -> &str {
    value.filter(|v| !v.trim().is_empty()).unwrap_or(MISSING_VALUE)
}

/// Builds detail cards and fills their sub-lists on demand.
pub struct DetailCardBuilder {
    attributes: Arc<dyn AttributeQueryService>,
}

impl DetailCardBuilder {
    #[must_use]
    pub fn new(attributes: Arc<dyn AttributeQueryService>) -> Self {
        Self { attributes }
    }

    /// Builds the card for `landmark`. The historic district and building
    /// name lines are omitted when the dataset marks them not applicable.
    #[must_use]
    pub fn build(id: CardId, landmark: &Landmark) -> DetailCard {
        let mut details = Vec::with_capacity(7);
        if let Some(district) = landmark.historic_district() {
            details.push(format!("Historic District: {district}"));
        }
        if let Some(name) = landmark.building_name() {
            details.push(name.to_string());
        }
        details.extend([
            format!("Primary Style: {}", or_missing(landmark.style_prim.as_deref())),
            format!("Era: {}", or_missing(landmark.era.as_deref())),
            format!("Year Built: {}", or_missing(landmark.year_build.as_deref())),
            format!("Primary Material: {}", or_missing(landmark.mat_prim.as_deref())),
            format!("Building Type: {}", or_missing(landmark.build_type.as_deref())),
        ]);

        DetailCard {
            id,
            bin: landmark.bin().map(str::to_string),
            header: landmark.header(),
            details,
            map_link: landmark.map_link(),
            violations: SubListSlot::default(),
            complaints: SubListSlot::default(),
        }
    }

    /// Fetches the `kind` records of card `card`'s building and renders
    /// them into the card.
    ///
    /// The result is discarded if the card is no longer on display when the
    /// fetch completes, or if the same trigger fired again in the meantime.
    #[allow(clippy::future_not_send)]
    pub async fn show_sub_list(
        &self,
        state: &RefCell<MapState>,
        card: CardId,
        kind: SubListKind,
    ) -> StepOutcome {
        let (bin, issued) = {
            let mut map = state.borrow_mut();
            let Some(detail) = map.display.detail_mut(card) else {
                log::debug!("Ignoring {kind} trigger for a card that is no longer shown");
                return StepOutcome::Discarded;
            };
            let Some(bin) = detail.bin.clone() else {
                let e = SourceError::MalformedResult {
                    message: format!("cannot load {kind} for a landmark without a BIN"),
                };
                log::warn!("{e}");
                return StepOutcome::Failed(e);
            };
            (bin, detail.begin_fetch(kind))
        };

        let result = match kind {
            SubListKind::Violations => self
                .attributes
                .fetch_violations(&bin)
                .await
                .map(|rows| rows.iter().map(SubListItem::from).collect::<Vec<_>>()),
            SubListKind::Complaints => self
                .attributes
                .fetch_complaints(&bin)
                .await
                .map(|rows| rows.iter().map(SubListItem::from).collect::<Vec<_>>()),
        };
        let items = match result {
            Ok(items) => items,
            Err(e) => {
                log::warn!("Fetching {kind} for BIN {bin} failed: {e}");
                return StepOutcome::Failed(e);
            }
        };

        let mut map = state.borrow_mut();
        let policy = map.policy();
        let Some(detail) = map.display.detail_mut(card) else {
            log::debug!("Discarding {kind} for BIN {bin}: card closed");
            return StepOutcome::Discarded;
        };
        let count = items.len();
        if detail.finish_fetch(issued, policy, SubList::new(kind, items)) {
            StepOutcome::Rendered { items: count }
        } else {
            log::debug!("Discarding superseded {kind} for BIN {bin}");
            StepOutcome::Discarded
        }
    }
}
