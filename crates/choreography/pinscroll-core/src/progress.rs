//! Raw scroll offset → section-local progress.

use serde::{Deserialize, Serialize};

use crate::error::{ChoreoError, Result};
use crate::ids::SectionId;
use crate::interp::functions::inverse_lerp;

/// Scroll interval (raw document units) during which a section is pinned.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PinnedSpan {
    pub id: SectionId,
    pub scroll_start: f32,
    pub scroll_end: f32,
}

impl PinnedSpan {
    /// Rejects spans with `scroll_end <= scroll_start` (or non-finite bounds).
    pub fn new(id: SectionId, scroll_start: f32, scroll_end: f32) -> Result<Self> {
        let span = Self {
            id,
            scroll_start,
            scroll_end,
        };
        if span.is_degenerate() {
            return Err(ChoreoError::DegenerateSpan {
                start: scroll_start,
                end: scroll_end,
            });
        }
        Ok(span)
    }

    /// Span starting at `scroll_start` and lasting `distance`.
    pub fn with_distance(id: SectionId, scroll_start: f32, distance: f32) -> Result<Self> {
        Self::new(id, scroll_start, scroll_start + distance)
    }

    #[inline]
    pub fn is_degenerate(&self) -> bool {
        !(self.scroll_start.is_finite()
            && self.scroll_end.is_finite()
            && self.scroll_end > self.scroll_start)
    }

    #[inline]
    pub fn length(&self) -> f32 {
        self.scroll_end - self.scroll_start
    }

    #[inline]
    pub fn center(&self) -> f32 {
        self.scroll_start + self.length() * 0.5
    }

    #[inline]
    pub fn progress(&self, scroll_offset: f32) -> f32 {
        progress(scroll_offset, self)
    }
}

/// Section-local progress in [0,1]: 0 at or above the span start, 1 at or past its end,
/// linear in between.
#[inline]
pub fn progress(scroll_offset: f32, span: &PinnedSpan) -> f32 {
    if scroll_offset <= span.scroll_start {
        0.0
    } else if scroll_offset >= span.scroll_end {
        1.0
    } else {
        inverse_lerp(span.scroll_start, span.scroll_end, scroll_offset)
    }
}
