//! Per-section pin lifecycle.
//!
//! A SectionController is created by `mount` (which registers its span) and destroyed
//! by `unmount(self, ..)`, which consumes it. Nothing can write to a section's targets
//! after unmount because the controller no longer exists.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::Result;
use crate::ids::SectionId;
use crate::outputs::{Change, Clear, CoreEvent, Outputs};
use crate::progress::{progress, PinnedSpan};
use crate::snap::SnapRegistry;
use crate::targets::{SectionLayout, SectionTargets};
use crate::timeline::{Phase, PhaseTimeline};

/// Exponential catch-up rate; after `scrub_lag` seconds about 2% of the gap remains.
const SCRUB_RATE: f32 = 4.0;
const SCRUB_SNAP_EPS: f32 = 1e-4;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SectionStatus {
    Unregistered,
    /// Registered; scroll has not passed the span start.
    Pinned,
    /// Entrance phase playing.
    Active,
    /// Inside the settle dead zone.
    Settled,
    Exiting,
    /// Released at the bottom of the span.
    Unpinned,
}

impl SectionStatus {
    pub fn from_progress(p: f32) -> Self {
        if p <= 0.0 {
            SectionStatus::Pinned
        } else if p >= 1.0 {
            SectionStatus::Unpinned
        } else {
            match Phase::at(p) {
                Phase::Entrance => SectionStatus::Active,
                Phase::Settle => SectionStatus::Settled,
                Phase::Exit => SectionStatus::Exiting,
            }
        }
    }

    #[inline]
    pub fn is_inside(self) -> bool {
        matches!(
            self,
            SectionStatus::Active | SectionStatus::Settled | SectionStatus::Exiting
        )
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollDirection {
    #[default]
    Forward,
    Backward,
}

/// Mutable per-section state.
#[derive(Clone, Debug)]
struct SectionState {
    pinned_span: PinnedSpan,
    timeline: PhaseTimeline,
    /// Scroll progress from the latest scroll tick.
    last_progress: f32,
    direction: ScrollDirection,
}

/// Pinned distance for a section: a fixed multiple of the viewport height, never
/// below `min_pin_distance`.
pub fn pin_distance(cfg: &Config, viewport_height: f32) -> f32 {
    (cfg.pin_distance_vh * viewport_height).max(cfg.min_pin_distance)
}

#[derive(Debug)]
pub struct SectionController {
    id: SectionId,
    layout: SectionLayout,
    state: SectionState,
    status: SectionStatus,
    /// Progress the timeline is currently evaluated at (lags scroll when scrubbing).
    applied_progress: f32,
    scrub_lag: f32,
    last_offset: Option<f32>,
    /// Last value written per timeline channel.
    written: Vec<Option<f32>>,
}

impl SectionController {
    /// Measure, build and register. On error nothing is registered.
    pub fn mount(
        id: SectionId,
        cfg: &Config,
        viewport_height: f32,
        layout: SectionLayout,
        targets: &SectionTargets,
        scroll_start: f32,
        registry: &mut SnapRegistry,
    ) -> Result<Self> {
        let span = PinnedSpan::with_distance(id, scroll_start, pin_distance(cfg, viewport_height))?;
        let timeline = PhaseTimeline::build(layout, targets)?;
        registry.add(span);
        debug!(
            "mounted {id}: span [{}, {}], {} entries",
            span.scroll_start,
            span.scroll_end,
            timeline.len()
        );
        let channels = timeline.channel_count();
        Ok(Self {
            id,
            layout,
            state: SectionState {
                pinned_span: span,
                timeline,
                last_progress: 0.0,
                direction: ScrollDirection::Forward,
            },
            status: SectionStatus::Pinned,
            applied_progress: 0.0,
            scrub_lag: cfg.scrub_lag,
            last_offset: None,
            written: vec![None; channels],
        })
    }

    pub fn id(&self) -> SectionId {
        self.id
    }

    pub fn layout(&self) -> SectionLayout {
        self.layout
    }

    pub fn status(&self) -> SectionStatus {
        self.status
    }

    pub fn span(&self) -> &PinnedSpan {
        &self.state.pinned_span
    }

    pub fn timeline(&self) -> &PhaseTimeline {
        &self.state.timeline
    }

    pub fn direction(&self) -> ScrollDirection {
        self.state.direction
    }

    /// Progress the timeline is evaluated at.
    pub fn applied_progress(&self) -> f32 {
        self.applied_progress
    }

    /// Progress derived from the latest scroll offset.
    pub fn scroll_progress(&self) -> f32 {
        self.state.last_progress
    }

    /// Adopt `offset` as the current position without events or smoothing.
    pub fn sync(&mut self, offset: f32) {
        let p = progress(offset, &self.state.pinned_span);
        self.last_offset = Some(offset);
        self.state.last_progress = p;
        self.applied_progress = p;
        self.status = SectionStatus::from_progress(p);
    }

    /// Handle one scroll tick and write changed values.
    pub fn on_scroll(&mut self, offset: f32, out: &mut Outputs) {
        let span = self.state.pinned_span;
        let p = progress(offset, &span);

        if let Some(last) = self.last_offset {
            if offset > last {
                self.state.direction = ScrollDirection::Forward;
            } else if offset < last {
                self.state.direction = ScrollDirection::Backward;
            }
        }
        let left_back = self
            .last_offset
            .is_some_and(|last| last > span.scroll_start && offset <= span.scroll_start);

        let prev = self.status;
        let next = SectionStatus::from_progress(p);
        self.last_offset = Some(offset);
        self.state.last_progress = p;
        self.status = next;

        if left_back {
            // Multi-phase timelines do not reverse to a clean start; force it.
            self.applied_progress = 0.0;
            self.write_reset(out);
            out.push_event(CoreEvent::SectionLeftBack { section: self.id });
            debug!("{} left back, properties reset", self.id);
            return;
        }

        if next.is_inside() && !prev.is_inside() {
            out.push_event(CoreEvent::SectionEntered {
                section: self.id,
                direction: self.state.direction,
            });
        }
        if next == SectionStatus::Unpinned && prev != SectionStatus::Unpinned {
            out.push_event(CoreEvent::SectionLeft { section: self.id });
        }

        if self.scrub_lag <= 0.0 {
            self.applied_progress = p;
        }
        self.write_changes(out);
    }

    /// Move applied progress toward scroll progress by `dt` seconds of scrub.
    pub fn advance(&mut self, dt: f32, out: &mut Outputs) {
        let target = self.state.last_progress;
        let gap = target - self.applied_progress;
        if gap == 0.0 {
            return;
        }
        if self.scrub_lag <= 0.0 || gap.abs() < SCRUB_SNAP_EPS {
            self.applied_progress = target;
        } else {
            let alpha = 1.0 - (-dt.max(0.0) * SCRUB_RATE / self.scrub_lag).exp();
            self.applied_progress += gap * alpha;
            if (target - self.applied_progress).abs() < SCRUB_SNAP_EPS {
                self.applied_progress = target;
            }
        }
        self.write_changes(out);
    }

    /// Write every channel whose value differs from the last write.
    pub fn write_changes(&mut self, out: &mut Outputs) {
        let id = self.id;
        let written = &mut self.written;
        self.state
            .timeline
            .for_each_channel(self.applied_progress, |idx, target, property, value| {
                if written[idx] != Some(value) {
                    written[idx] = Some(value);
                    out.push_change(Change {
                        section: id,
                        target: target.clone(),
                        property,
                        value,
                    });
                }
            });
    }

    /// Write every channel's reset value regardless of what was written before.
    fn write_reset(&mut self, out: &mut Outputs) {
        let values = self.state.timeline.reset_values();
        for (idx, v) in values.into_iter().enumerate() {
            self.written[idx] = Some(v.value);
            out.push_change(Change {
                section: self.id,
                target: v.target,
                property: v.property,
                value: v.value,
            });
        }
    }

    /// Re-measure after a viewport change, keeping or moving the span start.
    pub fn relayout(
        &mut self,
        cfg: &Config,
        scroll_start: f32,
        viewport_height: f32,
        registry: &mut SnapRegistry,
    ) -> Result<()> {
        let span =
            PinnedSpan::with_distance(self.id, scroll_start, pin_distance(cfg, viewport_height))?;
        self.state.pinned_span = span;
        registry.add(span);
        debug!(
            "relayout {}: span [{}, {}]",
            self.id, span.scroll_start, span.scroll_end
        );
        Ok(())
    }

    /// Recompute progress for the last known offset after the span moved.
    pub fn resync(&mut self, out: &mut Outputs) {
        let Some(offset) = self.last_offset else {
            return;
        };
        let p = progress(offset, &self.state.pinned_span);
        self.state.last_progress = p;
        self.status = SectionStatus::from_progress(p);
        if self.scrub_lag <= 0.0 {
            self.applied_progress = p;
        }
        self.write_changes(out);
    }

    /// Unregister first, then release every animated target to its neutral style.
    pub fn unmount(self, registry: &mut SnapRegistry, out: &mut Outputs) {
        registry.remove(self.id);
        for target in self.state.timeline.targets() {
            out.push_clear(Clear {
                section: self.id,
                target: target.clone(),
            });
        }
        debug!(
            "unmounted {} at progress {}",
            self.id, self.applied_progress
        );
    }
}
