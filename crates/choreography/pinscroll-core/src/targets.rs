//! Element handles supplied by the host for one section.
//!
//! Handles are small string keys. The host keeps the mapping from key to the real
//! element (DOM node, entity, widget) and applies `Change`/`Clear` outputs to it.

use serde::{Deserialize, Serialize};

use crate::error::{ChoreoError, Result};

/// Opaque target handle (small string key).
pub type TargetHandle = String;

/// Which screen edge the sliding panel is anchored to.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelPosition {
    #[default]
    Left,
    Right,
}

impl PanelPosition {
    /// Sign applied to horizontal displacements so motion heads toward the anchor edge.
    #[inline]
    pub fn sign(self) -> f32 {
        match self {
            PanelPosition::Left => -1.0,
            PanelPosition::Right => 1.0,
        }
    }
}

/// Choreography variant for a section.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SectionLayout {
    /// Panel + content + background, full entrance/settle/exit.
    Standard {
        #[serde(default)]
        panel_position: PanelPosition,
    },
    /// Opening section: entrance already played on load, only the exit is scrubbed.
    Hero,
}

impl Default for SectionLayout {
    fn default() -> Self {
        SectionLayout::Standard {
            panel_position: PanelPosition::Left,
        }
    }
}

/// A block element with an ordered list of animated children.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetGroup {
    pub block: TargetHandle,
    #[serde(default)]
    pub items: Vec<TargetHandle>,
}

/// Handles for one section. `None` means the element is not mounted yet.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionTargets {
    #[serde(default)]
    pub container: Option<TargetHandle>,
    #[serde(default)]
    pub panel: Option<TargetHandle>,
    #[serde(default)]
    pub content: Option<TargetGroup>,
    #[serde(default)]
    pub image: Option<TargetHandle>,
    #[serde(default)]
    pub markers: Option<TargetGroup>,
}

/// Return the handle or a `MissingTarget` error naming its role.
pub fn require<'a, T>(slot: &'a Option<T>, role: &'static str) -> Result<&'a T> {
    slot.as_ref().ok_or(ChoreoError::MissingTarget { role })
}

impl SectionTargets {
    /// Convenience constructor for the standard layout with every element present.
    pub fn standard(prefix: &str, item_count: usize) -> Self {
        Self {
            container: Some(format!("{prefix}/section")),
            panel: Some(format!("{prefix}/panel")),
            content: Some(TargetGroup {
                block: format!("{prefix}/content"),
                items: (0..item_count)
                    .map(|i| format!("{prefix}/content/item{i}"))
                    .collect(),
            }),
            image: Some(format!("{prefix}/image")),
            markers: None,
        }
    }

    /// Convenience constructor for the hero layout with every element present.
    pub fn hero(prefix: &str, item_count: usize, marker_count: usize) -> Self {
        Self {
            container: Some(format!("{prefix}/section")),
            panel: None,
            content: Some(TargetGroup {
                block: format!("{prefix}/content"),
                items: (0..item_count)
                    .map(|i| format!("{prefix}/content/item{i}"))
                    .collect(),
            }),
            image: Some(format!("{prefix}/image")),
            markers: Some(TargetGroup {
                block: format!("{prefix}/markers"),
                items: (0..marker_count)
                    .map(|i| format!("{prefix}/markers/m{i}"))
                    .collect(),
            }),
        }
    }
}
