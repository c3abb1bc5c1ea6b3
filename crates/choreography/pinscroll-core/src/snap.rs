//! Global snap policy over all pinned spans.
//!
//! SnapRegistry is written by SectionControllers (add at mount/relayout, remove at
//! unmount) and read by SnapEngine after `rebuild` has normalized the spans against
//! the document's max scroll. Writes and reads never interleave within a frame.

use hashbrown::HashMap;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::config::SnapConfig;
use crate::ids::SectionId;
use crate::interp::functions::lerp_f32;
use crate::interp::Ease;
use crate::progress::PinnedSpan;

/// Motions shorter than this (raw scroll units) are not worth animating.
const MIN_SNAP_TRAVEL: f32 = 0.5;

/// A pinned span expressed as fractions of the document's max scroll.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRange {
    pub id: SectionId,
    pub start: f32,
    pub end: f32,
    pub center: f32,
}

impl NormalizedRange {
    /// `None` for degenerate spans or a non-positive max scroll.
    pub fn from_span(span: &PinnedSpan, max_scroll: f32) -> Option<Self> {
        if span.is_degenerate() || !max_scroll.is_finite() || max_scroll <= 0.0 {
            return None;
        }
        Some(Self {
            id: span.id,
            start: span.scroll_start / max_scroll,
            end: span.scroll_end / max_scroll,
            center: span.center() / max_scroll,
        })
    }

    #[inline]
    pub fn contains_within(&self, value: f32, epsilon: f32) -> bool {
        value >= self.start - epsilon && value <= self.end + epsilon
    }
}

#[derive(Debug, Default)]
pub struct SnapRegistry {
    spans: HashMap<SectionId, PinnedSpan>,
    /// Sorted by `scroll_start`; valid as of the last rebuild.
    ranges: Vec<NormalizedRange>,
    max_scroll: f32,
    dirty: bool,
}

impl SnapRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the span of `span.id`.
    pub fn add(&mut self, span: PinnedSpan) {
        self.spans.insert(span.id, span);
        self.dirty = true;
    }

    pub fn remove(&mut self, id: SectionId) -> Option<PinnedSpan> {
        let removed = self.spans.remove(&id);
        if removed.is_some() {
            self.dirty = true;
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Spans changed since the last rebuild.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn max_scroll(&self) -> f32 {
        self.max_scroll
    }

    pub fn ranges(&self) -> &[NormalizedRange] {
        &self.ranges
    }

    /// Registered spans sorted by start (ties by id).
    pub fn spans_sorted(&self) -> Vec<PinnedSpan> {
        let mut spans: Vec<PinnedSpan> = self.spans.values().copied().collect();
        spans.sort_by(|a, b| {
            a.scroll_start
                .total_cmp(&b.scroll_start)
                .then(a.id.cmp(&b.id))
        });
        spans
    }

    /// Recompute normalized ranges. Degenerate spans are skipped. Returns the range count.
    pub fn rebuild(&mut self, max_scroll: f32) -> usize {
        self.max_scroll = max_scroll;
        self.dirty = false;
        self.ranges.clear();
        if !max_scroll.is_finite() || max_scroll <= 0.0 {
            warn!("snap registry rebuild skipped: max scroll {max_scroll}");
            return 0;
        }
        for span in self.spans_sorted() {
            match NormalizedRange::from_span(&span, max_scroll) {
                Some(range) => self.ranges.push(range),
                None => warn!(
                    "excluding degenerate span of {}: [{}, {}]",
                    span.id, span.scroll_start, span.scroll_end
                ),
            }
        }
        debug!(
            "snap registry rebuilt: {} ranges over max scroll {max_scroll}",
            self.ranges.len()
        );
        self.ranges.len()
    }

    /// First range (in start order) whose ε-widened bounds contain `value`.
    pub fn find_near(&self, value: f32, epsilon: f32) -> Option<&NormalizedRange> {
        self.ranges
            .iter()
            .find(|r| r.contains_within(value, epsilon))
    }

    pub fn is_near_pinned(&self, value: f32, epsilon: f32) -> bool {
        self.find_near(value, epsilon).is_some()
    }

    /// Range with the center closest to `value`; ties keep the earlier range.
    pub fn closest(&self, value: f32) -> Option<&NormalizedRange> {
        let mut best: Option<&NormalizedRange> = None;
        for r in &self.ranges {
            match best {
                Some(b) if (r.center - value).abs() >= (b.center - value).abs() => {}
                _ => best = Some(r),
            }
        }
        best
    }

    pub fn closest_center(&self, value: f32) -> Option<f32> {
        self.closest(value).map(|r| r.center)
    }
}

/// Normalized scroll value the viewport should be steered toward.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SnapTarget {
    pub value: f32,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SnapDecision {
    /// Outside every pinned zone; leave the scroll where it is.
    Free { value: f32 },
    Snap { target: SnapTarget },
}

impl SnapDecision {
    /// Normalized value the scroll should end at.
    pub fn value(&self) -> f32 {
        match *self {
            SnapDecision::Free { value } => value,
            SnapDecision::Snap { target } => target.value,
        }
    }
}

/// An in-flight scroll animation toward a snap target (raw offsets).
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SnapMotion {
    pub from: f32,
    pub to: f32,
    pub duration: f32,
    pub elapsed: f32,
    pub ease: Ease,
}

impl SnapMotion {
    pub fn sample(&self, elapsed: f32) -> f32 {
        if self.duration <= 0.0 {
            return self.to;
        }
        let t = (elapsed / self.duration).clamp(0.0, 1.0);
        lerp_f32(self.from, self.to, self.ease.apply(t))
    }

    /// Step by `dt` seconds and return the offset to scroll to.
    pub fn advance(&mut self, dt: f32) -> f32 {
        self.elapsed = (self.elapsed + dt.max(0.0)).min(self.duration.max(0.0));
        if self.is_finished() {
            self.to
        } else {
            self.sample(self.elapsed)
        }
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }
}

#[derive(Clone, Debug, Default)]
pub struct SnapEngine {
    cfg: SnapConfig,
}

impl SnapEngine {
    pub fn new(cfg: SnapConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &SnapConfig {
        &self.cfg
    }

    /// Decide where a candidate normalized scroll value should settle.
    pub fn resolve(&self, registry: &SnapRegistry, candidate: f32) -> SnapDecision {
        if !registry.is_near_pinned(candidate, self.cfg.epsilon) {
            return SnapDecision::Free { value: candidate };
        }
        match registry.closest_center(candidate) {
            Some(value) => SnapDecision::Snap {
                target: SnapTarget { value },
            },
            None => SnapDecision::Free { value: candidate },
        }
    }

    /// Travel time for a normalized distance, within `[duration_min, duration_max]`.
    pub fn duration_for(&self, distance: f32) -> f32 {
        let t = (distance.abs() / self.cfg.duration_reference_distance).clamp(0.0, 1.0);
        lerp_f32(self.cfg.duration_min, self.cfg.duration_max, t)
    }

    /// Plan a motion from `current_offset` (raw units). `None` when no snap applies.
    pub fn plan(&self, registry: &SnapRegistry, current_offset: f32) -> Option<SnapMotion> {
        let max_scroll = registry.max_scroll();
        if !self.cfg.enabled || max_scroll <= 0.0 {
            return None;
        }
        let candidate = current_offset / max_scroll;
        let SnapDecision::Snap { target } = self.resolve(registry, candidate) else {
            return None;
        };
        let to = target.value * max_scroll;
        if (to - current_offset).abs() < MIN_SNAP_TRAVEL {
            return None;
        }
        Some(SnapMotion {
            from: current_offset,
            to,
            duration: self.duration_for(target.value - candidate),
            elapsed: 0.0,
            ease: self.cfg.ease,
        })
    }
}
