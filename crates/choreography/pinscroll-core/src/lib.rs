//! Pinscroll Core (host-agnostic)
//!
//! Scroll-pinned section choreography: each mounted section pins for a fixed scroll
//! distance while a three-phase timeline (entrance, settle, exit) is scrubbed by scroll
//! progress. A page-level snap registry pulls the scroll position to the center of the
//! nearest pinned span once scrolling settles near one.
//!
//! Hosts (DOM, native, tests) own the actual elements. They feed scroll and resize
//! notifications in as `Inputs` and apply the returned `Outputs` to their targets.

pub mod config;
pub mod engine;
pub mod error;
pub mod ids;
pub mod inputs;
pub mod interp;
pub mod outputs;
pub mod progress;
pub mod section;
pub mod snap;
pub mod targets;
pub mod timeline;

// Re-exports for consumers (adapters)
pub use config::{Config, SnapConfig};
pub use engine::Choreographer;
pub use error::{ChoreoError, Result};
pub use ids::{IdAllocator, SectionId};
pub use inputs::{HostCommand, Inputs, Viewport};
pub use interp::Ease;
pub use outputs::{Change, Clear, CoreEvent, Outputs};
pub use progress::{progress, PinnedSpan};
pub use section::{ScrollDirection, SectionController, SectionStatus};
pub use snap::{NormalizedRange, SnapDecision, SnapEngine, SnapMotion, SnapRegistry, SnapTarget};
pub use targets::{PanelPosition, SectionLayout, SectionTargets, TargetGroup, TargetHandle};
pub use timeline::{AnimationEntry, Phase, PhaseTimeline, Property, PropertyValue, Stagger, Track};
