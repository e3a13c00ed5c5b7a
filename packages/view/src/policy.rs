//! Rules for rendering fetch results that complete out of order.
//!
//! Every selection transition and every layer reset advances a [`Stamp`].
//! A fetch remembers the stamp current when it was issued; when it
//! completes, the session's [`RenderPolicy`] decides whether the result is
//! still allowed to render.

use landmark_map_source::SourceError;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Environment variable selecting the render policy
/// (`discard_stale` or `last_write_wins`).
pub const RENDER_POLICY_ENV: &str = "LANDMARK_MAP_RENDER_POLICY";

/// A monotonically increasing sequence number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Stamp(u64);

impl Stamp {
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }

    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

/// What to do with a fetch result that completes after a newer selection.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RenderPolicy {
    /// Every completed fetch renders; whichever completes last wins, and
    /// stale geometry is appended to the current layer.
    LastWriteWins,
    /// A completed fetch renders only if no newer selection (or layer
    /// reset) happened since it was issued.
    #[default]
    DiscardStale,
}

impl RenderPolicy {
    /// Returns whether a result issued at `issued` may render when the
    /// current stamp is `current`.
    #[must_use]
    pub fn admits(self, issued: Stamp, current: Stamp) -> bool {
        match self {
            Self::LastWriteWins => true,
            Self::DiscardStale => issued == current,
        }
    }

    /// Reads the policy from [`RENDER_POLICY_ENV`], falling back to the
    /// default when unset or unrecognized.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_setting(std::env::var(RENDER_POLICY_ENV).ok().as_deref())
    }

    fn from_setting(setting: Option<&str>) -> Self {
        match setting.map(str::trim).filter(|s| !s.is_empty()) {
            None => Self::default(),
            Some(value) => value.parse().unwrap_or_else(|_| {
                log::warn!(
                    "Unknown {RENDER_POLICY_ENV} value {value:?}, using {}",
                    Self::default()
                );
                Self::default()
            }),
        }
    }
}

/// The result of one render step of a fetch-then-render pipeline.
#[derive(Debug)]
pub enum StepOutcome {
    /// The result was rendered; `items` counts what was drawn.
    Rendered {
        /// Features added, overview lines, or sub-list records.
        items: usize,
    },
    /// The result completed but was not rendered: it was stale under the
    /// render policy, or its target was no longer on screen.
    Discarded,
    /// The fetch failed; nothing was rendered and prior output stays.
    Failed(SourceError),
}

impl StepOutcome {
    #[must_use]
    pub const fn is_rendered(&self) -> bool {
        matches!(self, Self::Rendered { .. })
    }

    #[must_use]
    pub const fn is_discarded(&self) -> bool {
        matches!(self, Self::Discarded)
    }

    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}
