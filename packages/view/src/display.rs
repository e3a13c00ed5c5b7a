//! The single-card display container.

use std::fmt;

use landmark_map_landmark_models::{Landmark, OverviewResult};
use serde::Serialize;

use crate::detail::{DetailCard, DetailCardBuilder};

/// Text shown when an overview query returns no records.
pub const EMPTY_OVERVIEW: &str = "No overview data";

/// Identifies one card instance. Each `show_*` call mints a new id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct CardId(u64);

/// Aggregate summary of the active filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverviewCard {
    pub id: CardId,
    pub title: String,
    /// `"{field} - {value}"` lines, in the order the service returned them.
    pub lines: Vec<String>,
    /// Set when there were no records to list.
    pub placeholder: Option<&'static str>,
}

impl OverviewCard {
    fn new(id: CardId, title: &str, result: Option<&OverviewResult>) -> Self {
        let lines: Vec<String> = result
            .map(|r| {
                r.fields
                    .iter()
                    .map(|f| format!("{} - {}", f.name, f.value))
                    .collect()
            })
            .unwrap_or_default();
        Self {
            id,
            title: title.to_string(),
            placeholder: result.is_none().then_some(EMPTY_OVERVIEW),
            lines,
        }
    }
}

impl fmt::Display for OverviewCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        if let Some(placeholder) = self.placeholder {
            writeln!(f, "  {placeholder}")?;
        }
        for line in &self.lines {
            writeln!(f, "  {line}")?;
        }
        Ok(())
    }
}

/// Whatever card the display container is showing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Card {
    Detail(DetailCard),
    Overview(OverviewCard),
}

impl Card {
    #[must_use]
    pub const fn id(&self) -> CardId {
        match self {
            Self::Detail(card) => card.id,
            Self::Overview(card) => card.id,
        }
    }

    #[must_use]
    pub const fn as_detail(&self) -> Option<&DetailCard> {
        match self {
            Self::Detail(card) => Some(card),
            Self::Overview(_) => None,
        }
    }

    #[must_use]
    pub const fn as_overview(&self) -> Option<&OverviewCard> {
        match self {
            Self::Overview(card) => Some(card),
            Self::Detail(_) => None,
        }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Detail(card) => fmt::Display::fmt(card, f),
            Self::Overview(card) => fmt::Display::fmt(card, f),
        }
    }
}

/// Owns the display container, which holds at most one card.
///
/// Every `show_*` call replaces the container's content, so a newer card
/// never stacks on an older one.
#[derive(Debug, Default)]
pub struct DisplayReconciler {
    card: Option<Card>,
    next_id: u64,
}

impl DisplayReconciler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn card(&self) -> Option<&Card> {
        self.card.as_ref()
    }

    #[must_use]
    pub fn card_count(&self) -> usize {
        usize::from(self.card.is_some())
    }

    /// Empties the container, returning what it held.
    pub fn clear(&mut self) -> Option<Card> {
        self.card.take()
    }

    /// Replaces the content with a detail card for `landmark`.
    pub fn show_detail(&mut self, landmark: &Landmark) -> CardId {
        let id = self.next_card_id();
        self.card = Some(Card::Detail(DetailCardBuilder::build(id, landmark)));
        id
    }

    /// Replaces the content with an overview card titled `title`, listing
    /// the fields of the first result.
    pub fn show_overview(&mut self, results: &[OverviewResult], title: &str) -> CardId {
        let id = self.next_card_id();
        self.card = Some(Card::Overview(OverviewCard::new(id, title, results.first())));
        id
    }

    #[must_use]
    pub fn detail(&self) -> Option<&DetailCard> {
        self.card.as_ref().and_then(Card::as_detail)
    }

    /// The detail card `id`, if it is still the one on display.
    pub fn detail_mut(&mut self, id: CardId) -> Option<&mut DetailCard> {
        match &mut self.card {
            Some(Card::Detail(card)) if card.id == id => Some(card),
            _ => None,
        }
    }

    fn next_card_id(&mut self) -> CardId {
        self.next_id += 1;
        CardId(self.next_id)
    }
}
