//! Three-phase section timeline as an interpolation table.
//!
//! Model:
//! - Section-local progress [0,1] is split into fixed phases:
//!   Entrance [0, 0.3], Settle [0.3, 0.7] (no entries), Exit [0.7, 1.0].
//! - Each AnimationEntry drives one (target, property) across one phase.
//! - Stagger delays each successive element of a group by a fixed step; every element
//!   of the group still ends at the phase end.
//! - A (target, property) channel may have entries in several phases. At progress `p`
//!   the governing entry is the last one (in start order) with `start <= p`; before
//!   the first entry starts, its `from` value holds.
//!
//! API:
//! - PhaseTimeline::build(layout, &targets)
//! - PhaseTimeline::evaluate(p) / for_each_value(p, f)

use serde::{Deserialize, Serialize};

use crate::error::{ChoreoError, Result};
use crate::interp::functions::{inverse_lerp, lerp_f32};
use crate::interp::Ease;
use crate::targets::{require, PanelPosition, SectionLayout, SectionTargets, TargetHandle};

/// Smallest local-progress span a staggered element may animate over.
pub const MIN_TWEEN_SPAN: f32 = 0.01;

/// Local progress at which the content group starts its entrance.
pub const CONTENT_ENTRANCE_DELAY: f32 = 0.08;
pub const ENTRANCE_STAGGER: f32 = 0.03;
pub const EXIT_STAGGER: f32 = 0.02;
/// Local progress at which hero corner markers start fading.
pub const HERO_MARKER_FADE_START: f32 = 0.85;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Entrance,
    Settle,
    Exit,
}

impl Phase {
    #[inline]
    pub const fn bounds(self) -> (f32, f32) {
        match self {
            Phase::Entrance => (0.0, 0.3),
            Phase::Settle => (0.3, 0.7),
            Phase::Exit => (0.7, 1.0),
        }
    }

    #[inline]
    pub const fn start(self) -> f32 {
        self.bounds().0
    }

    #[inline]
    pub const fn end(self) -> f32 {
        self.bounds().1
    }

    /// Phase containing `progress`. Settle owns both of its bounds.
    pub fn at(progress: f32) -> Phase {
        if progress < Phase::Settle.start() {
            Phase::Entrance
        } else if progress <= Phase::Settle.end() {
            Phase::Settle
        } else {
            Phase::Exit
        }
    }
}

/// Animated visual property. Translations carry viewport units.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Property {
    /// Horizontal offset in `vw`.
    TranslateX,
    /// Vertical offset in `vh`.
    TranslateY,
    Opacity,
    Scale,
}

/// Named target group within a section.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Track {
    Panel,
    Content,
    Image,
    Markers,
}

impl Track {
    pub fn name(self) -> &'static str {
        match self {
            Track::Panel => "panel",
            Track::Content => "content",
            Track::Image => "image",
            Track::Markers => "markers",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stagger {
    pub index: u32,
    pub step: f32,
}

/// One scheduled property change over a sub-range of local progress.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnimationEntry {
    pub target: TargetHandle,
    pub track: Track,
    pub phase: Phase,
    pub property: Property,
    pub from: f32,
    pub to: f32,
    pub start_progress: f32,
    pub end_progress: f32,
    pub ease: Ease,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stagger: Option<Stagger>,
}

impl AnimationEntry {
    /// Value at local progress `p`: `from` up to and including the start, `to` from the
    /// end onward, eased blend in between.
    #[inline]
    pub fn sample(&self, p: f32) -> f32 {
        if p <= self.start_progress {
            self.from
        } else if p >= self.end_progress {
            self.to
        } else {
            let t = inverse_lerp(self.start_progress, self.end_progress, p);
            lerp_f32(self.from, self.to, self.ease.apply(t))
        }
    }
}

/// One evaluated (target, property) value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PropertyValue {
    pub target: TargetHandle,
    pub property: Property,
    pub value: f32,
}

/// Entries of one (target, property), as indices into the timeline in start order.
#[derive(Clone, Debug)]
struct Channel {
    target: TargetHandle,
    property: Property,
    entries: Vec<usize>,
}

/// Accumulates entries the way a scrubbed `fromTo` timeline would be authored.
#[derive(Default)]
struct TimelineBuilder {
    entries: Vec<AnimationEntry>,
}

struct Tween<'a> {
    track: Track,
    phase: Phase,
    position: f32,
    ease: Ease,
    stagger_step: f32,
    props: &'a [(Property, f32, f32)],
}

impl TimelineBuilder {
    fn from_to(&mut self, targets: &[TargetHandle], tween: Tween<'_>) -> Result<()> {
        debug_assert!(tween.phase != Phase::Settle, "settle phase holds values");
        let end = tween.phase.end();
        if let Some(last) = targets.len().checked_sub(1) {
            let last_start = tween.position + last as f32 * tween.stagger_step;
            if last_start > end - MIN_TWEEN_SPAN {
                return Err(ChoreoError::StaggerOverflow {
                    group: tween.track.name(),
                    count: targets.len(),
                });
            }
        }
        for (k, target) in targets.iter().enumerate() {
            let start = tween.position + k as f32 * tween.stagger_step;
            let stagger = (tween.stagger_step > 0.0).then_some(Stagger {
                index: k as u32,
                step: tween.stagger_step,
            });
            for &(property, from, to) in tween.props {
                self.entries.push(AnimationEntry {
                    target: target.clone(),
                    track: tween.track,
                    phase: tween.phase,
                    property,
                    from,
                    to,
                    start_progress: start,
                    end_progress: end,
                    ease: tween.ease,
                    stagger,
                });
            }
        }
        Ok(())
    }
}

/// Immutable schedule for one section plus a channel index for evaluation.
#[derive(Clone, Debug)]
pub struct PhaseTimeline {
    entries: Vec<AnimationEntry>,
    channels: Vec<Channel>,
}

impl PhaseTimeline {
    /// Build the schedule for `layout`. Fails without building anything when a
    /// required target is absent.
    pub fn build(layout: SectionLayout, targets: &SectionTargets) -> Result<Self> {
        let entries = match layout {
            SectionLayout::Standard { panel_position } => standard_entries(panel_position, targets)?,
            SectionLayout::Hero => hero_entries(targets)?,
        };
        Ok(Self::from_entries(entries))
    }

    fn from_entries(mut entries: Vec<AnimationEntry>) -> Self {
        // stable: authoring order breaks ties
        entries.sort_by(|a, b| a.start_progress.total_cmp(&b.start_progress));
        let mut channels: Vec<Channel> = Vec::new();
        for (idx, e) in entries.iter().enumerate() {
            match channels
                .iter_mut()
                .find(|c| c.property == e.property && c.target == e.target)
            {
                Some(c) => c.entries.push(idx),
                None => channels.push(Channel {
                    target: e.target.clone(),
                    property: e.property,
                    entries: vec![idx],
                }),
            }
        }
        Self { entries, channels }
    }

    pub fn entries(&self) -> &[AnimationEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of distinct (target, property) channels.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Distinct animated targets, in first-appearance order.
    pub fn targets(&self) -> Vec<&TargetHandle> {
        let mut out: Vec<&TargetHandle> = Vec::new();
        for c in &self.channels {
            if !out.contains(&&c.target) {
                out.push(&c.target);
            }
        }
        out
    }

    /// Visit every channel's value at local progress `p`.
    pub fn for_each_value(&self, p: f32, mut f: impl FnMut(&TargetHandle, Property, f32)) {
        self.for_each_channel(p, |_, target, property, value| f(target, property, value));
    }

    /// Like `for_each_value`, with the channel's stable index (`0..channel_count()`).
    pub(crate) fn for_each_channel(
        &self,
        p: f32,
        mut f: impl FnMut(usize, &TargetHandle, Property, f32),
    ) {
        for (idx, c) in self.channels.iter().enumerate() {
            let governing = c
                .entries
                .iter()
                .rev()
                .copied()
                .find(|&i| self.entries[i].start_progress <= p)
                .unwrap_or(c.entries[0]);
            f(idx, &c.target, c.property, self.entries[governing].sample(p));
        }
    }

    /// Owned snapshot of every channel's value at `p`. Pure in `p`.
    pub fn evaluate(&self, p: f32) -> Vec<PropertyValue> {
        let mut out = Vec::with_capacity(self.channels.len());
        self.for_each_value(p, |target, property, value| {
            out.push(PropertyValue {
                target: target.clone(),
                property,
                value,
            })
        });
        out
    }

    /// Values written when a section is re-entered from above: the state at progress 0.
    pub fn reset_values(&self) -> Vec<PropertyValue> {
        self.evaluate(0.0)
    }
}

fn standard_entries(side: PanelPosition, targets: &SectionTargets) -> Result<Vec<AnimationEntry>> {
    require(&targets.container, "container")?;
    let panel = require(&targets.panel, "panel")?;
    let content = require(&targets.content, "content")?;
    let image = require(&targets.image, "image")?;

    let sign = side.sign();
    let panel = std::slice::from_ref(panel);
    let image = std::slice::from_ref(image);
    let mut tl = TimelineBuilder::default();

    // ENTRANCE (0% - 30%), linear so motion tracks the scroll wheel
    tl.from_to(
        panel,
        Tween {
            track: Track::Panel,
            phase: Phase::Entrance,
            position: 0.0,
            ease: Ease::None,
            stagger_step: 0.0,
            props: &[
                (Property::TranslateX, 50.0 * sign, 0.0),
                (Property::Opacity, 0.0, 1.0),
            ],
        },
    )?;
    tl.from_to(
        &content.items,
        Tween {
            track: Track::Content,
            phase: Phase::Entrance,
            position: CONTENT_ENTRANCE_DELAY,
            ease: Ease::None,
            stagger_step: ENTRANCE_STAGGER,
            props: &[
                (Property::TranslateX, 10.0 * sign, 0.0),
                (Property::Opacity, 0.0, 1.0),
            ],
        },
    )?;
    tl.from_to(
        image,
        Tween {
            track: Track::Image,
            phase: Phase::Entrance,
            position: 0.0,
            ease: Ease::None,
            stagger_step: 0.0,
            props: &[(Property::Scale, 1.08, 1.0), (Property::Opacity, 0.6, 1.0)],
        },
    )?;

    // EXIT (70% - 100%)
    tl.from_to(
        panel,
        Tween {
            track: Track::Panel,
            phase: Phase::Exit,
            position: Phase::Exit.start(),
            ease: Ease::Power2In,
            stagger_step: 0.0,
            props: &[
                (Property::TranslateX, 0.0, 18.0 * sign),
                (Property::Opacity, 1.0, 0.0),
            ],
        },
    )?;
    tl.from_to(
        &content.items,
        Tween {
            track: Track::Content,
            phase: Phase::Exit,
            position: Phase::Exit.start(),
            ease: Ease::Power2In,
            stagger_step: EXIT_STAGGER,
            props: &[(Property::TranslateY, 0.0, -10.0), (Property::Opacity, 1.0, 0.0)],
        },
    )?;
    tl.from_to(
        image,
        Tween {
            track: Track::Image,
            phase: Phase::Exit,
            position: Phase::Exit.start(),
            ease: Ease::None,
            stagger_step: 0.0,
            props: &[(Property::Scale, 1.0, 1.05), (Property::Opacity, 1.0, 0.35)],
        },
    )?;
    Ok(tl.entries)
}

fn hero_entries(targets: &SectionTargets) -> Result<Vec<AnimationEntry>> {
    require(&targets.container, "container")?;
    let content = require(&targets.content, "content")?;
    let image = require(&targets.image, "image")?;
    let markers = require(&targets.markers, "markers")?;
    if content.items.is_empty() {
        return Err(ChoreoError::MissingTarget {
            role: "content item",
        });
    }

    let mut tl = TimelineBuilder::default();
    // Entrance and settle hold the state left by the load-time intro.
    tl.from_to(
        &content.items,
        Tween {
            track: Track::Content,
            phase: Phase::Exit,
            position: Phase::Exit.start(),
            ease: Ease::Power2In,
            stagger_step: EXIT_STAGGER,
            props: &[(Property::TranslateX, 0.0, -18.0), (Property::Opacity, 1.0, 0.0)],
        },
    )?;
    tl.from_to(
        std::slice::from_ref(image),
        Tween {
            track: Track::Image,
            phase: Phase::Exit,
            position: Phase::Exit.start(),
            ease: Ease::None,
            stagger_step: 0.0,
            props: &[(Property::Scale, 1.0, 1.06), (Property::Opacity, 1.0, 0.35)],
        },
    )?;
    tl.from_to(
        &markers.items,
        Tween {
            track: Track::Markers,
            phase: Phase::Exit,
            position: HERO_MARKER_FADE_START,
            ease: Ease::None,
            stagger_step: 0.0,
            props: &[(Property::Opacity, 1.0, 0.3)],
        },
    )?;
    Ok(tl.entries)
}
