//! Output contracts from the choreography engine.
//!
//! Outputs carry only the property writes for this tick, keyed by the host's
//! TargetHandle, plus clear requests, an optional scroll request and a list of
//! semantic events. Adapters (wasm, native hosts) apply them to the page.

use serde::{Deserialize, Serialize};

use crate::ids::SectionId;
use crate::progress::PinnedSpan;
use crate::section::ScrollDirection;
use crate::targets::TargetHandle;
use crate::timeline::Property;

/// One property write for a target this tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Change {
    pub section: SectionId,
    pub target: TargetHandle,
    pub property: Property,
    pub value: f32,
}

/// Remove every animated property from a target (restore its neutral style).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Clear {
    pub section: SectionId,
    pub target: TargetHandle,
}

/// Discrete semantic signals emitted during stepping.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum CoreEvent {
    SectionMounted {
        section: SectionId,
        span: PinnedSpan,
    },
    SectionUnmounted {
        section: SectionId,
    },
    SectionEntered {
        section: SectionId,
        direction: ScrollDirection,
    },
    /// Scrolled past the end of the span (pin released at the bottom).
    SectionLeft {
        section: SectionId,
    },
    /// Scrolled back above the start of the span; properties were reset.
    SectionLeftBack {
        section: SectionId,
    },
    SnapInstalled {
        ranges: usize,
    },
    SnapStarted {
        from: f32,
        to: f32,
        duration: f32,
    },
    SnapCompleted {
        offset: f32,
    },
    SnapCancelled,
    Error {
        message: String,
    },
}

/// Outputs returned by Choreographer::update().
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Outputs {
    #[serde(default)]
    pub changes: Vec<Change>,
    #[serde(default)]
    pub clears: Vec<Clear>,
    /// Raw scroll offset the host should move the viewport to.
    #[serde(default)]
    pub scroll_request: Option<f32>,
    #[serde(default)]
    pub events: Vec<CoreEvent>,
}

impl Outputs {
    #[inline]
    pub fn clear(&mut self) {
        self.changes.clear();
        self.clears.clear();
        self.scroll_request = None;
        self.events.clear();
    }

    #[inline]
    pub fn push_change(&mut self, change: Change) {
        self.changes.push(change);
    }

    #[inline]
    pub fn push_clear(&mut self, clear: Clear) {
        self.clears.push(clear);
    }

    #[inline]
    pub fn push_event(&mut self, event: CoreEvent) {
        self.events.push(event);
    }

    /// Move everything from `other` into `self`, leaving `other` empty.
    pub fn append(&mut self, other: &mut Outputs) {
        self.changes.append(&mut other.changes);
        self.clears.append(&mut other.clears);
        if let Some(req) = other.scroll_request.take() {
            self.scroll_request = Some(req);
        }
        self.events.append(&mut other.events);
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
            && self.clears.is_empty()
            && self.scroll_request.is_none()
            && self.events.is_empty()
    }

    /// Latest value written this tick for (target, property), if any.
    pub fn latest(&self, target: &str, property: Property) -> Option<f32> {
        self.changes
            .iter()
            .rev()
            .find(|c| c.target == target && c.property == property)
            .map(|c| c.value)
    }
}
