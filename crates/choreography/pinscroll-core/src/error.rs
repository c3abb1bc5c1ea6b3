//! Error taxonomy for the choreography core.
//!
//! Every error here is contained: callers degrade the affected section to a static
//! (non-animated) state instead of propagating a failure to the page.

use thiserror::Error;

use crate::ids::SectionId;

pub type Result<T, E = ChoreoError> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChoreoError {
    /// A required element handle was not mounted when the timeline was built.
    #[error("missing target for role '{role}'")]
    MissingTarget { role: &'static str },

    /// A pinned span with `end <= start`.
    #[error("degenerate pinned span: start={start} end={end}")]
    DegenerateSpan { start: f32, end: f32 },

    /// The stagger step cannot fit every element of a group inside its phase.
    #[error("stagger overflow: {count} '{group}' elements do not fit the phase")]
    StaggerOverflow { group: &'static str, count: usize },

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("unknown section: {0}")]
    UnknownSection(SectionId),
}
