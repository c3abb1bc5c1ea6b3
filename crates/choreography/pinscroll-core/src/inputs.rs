//! Input contracts for the choreography engine.
//!
//! Hosts translate their scroll/resize/input notifications into HostCommands and
//! pass them into Choreographer::update() once per frame.

use serde::{Deserialize, Serialize};

/// Viewport measurements supplied by the layout collaborator.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub height: f32,
    /// Largest reachable document scroll offset.
    pub max_scroll: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            height: 1000.0,
            max_scroll: 0.0,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Inputs {
    /// Commands applied in order before stepping.
    #[serde(default)]
    pub commands: Vec<HostCommand>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostCommand {
    /// Current document scroll offset.
    Scroll { offset: f32 },
    /// The user stopped scrolling; snapping may start.
    ScrollEnd,
    /// Wheel/touch/key input; cancels a running snap.
    Interrupt,
    Resize { viewport: Viewport },
}

impl Inputs {
    pub fn scroll(offset: f32) -> Self {
        Self {
            commands: vec![HostCommand::Scroll { offset }],
        }
    }

    /// Scroll to `offset` and report that scrolling settled there.
    pub fn settle_at(offset: f32) -> Self {
        Self {
            commands: vec![HostCommand::Scroll { offset }, HostCommand::ScrollEnd],
        }
    }

    pub fn with(mut self, cmd: HostCommand) -> Self {
        self.commands.push(cmd);
        self
    }
}
