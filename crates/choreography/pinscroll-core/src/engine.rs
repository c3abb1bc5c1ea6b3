//! Choreographer: owns every section, the snap registry and the snap engine.
//!
//! Methods:
//! - new, mount_section, unmount_section, relayout_section, update (commands → timers → scrub → snap)
//!
//! Snapping is inactive until the registry is first built `settle_delay` seconds after
//! construction, giving every section time to mount and register its span.

use log::{debug, warn};

use crate::config::Config;
use crate::error::{ChoreoError, Result};
use crate::ids::{IdAllocator, SectionId};
use crate::inputs::{HostCommand, Inputs, Viewport};
use crate::outputs::{CoreEvent, Outputs};
use crate::section::SectionController;
use crate::snap::{SnapDecision, SnapEngine, SnapMotion, SnapRegistry};
use crate::targets::{SectionLayout, SectionTargets};

#[derive(Debug)]
pub struct Choreographer {
    cfg: Config,
    ids: IdAllocator,
    viewport: Viewport,
    scroll_offset: f32,
    /// Seconds since construction.
    clock: f32,

    sections: Vec<SectionController>,
    registry: SnapRegistry,
    snap: SnapEngine,
    snap_installed: bool,
    /// Debounced registry rebuild deadline (engine clock).
    rebuild_at: Option<f32>,
    motion: Option<SnapMotion>,

    /// Writes produced outside update() (mount/unmount), flushed on the next tick.
    pending: Outputs,
    outputs: Outputs,
}

impl Choreographer {
    /// Create an engine for a page with the given viewport. Fails on invalid config.
    pub fn new(cfg: Config, viewport: Viewport) -> Result<Self> {
        cfg.validate()?;
        let rebuild_at = cfg.snap.enabled.then_some(cfg.snap.settle_delay);
        Ok(Self {
            snap: SnapEngine::new(cfg.snap.clone()),
            cfg,
            ids: IdAllocator::new(),
            viewport,
            scroll_offset: 0.0,
            clock: 0.0,
            sections: Vec::new(),
            registry: SnapRegistry::new(),
            snap_installed: false,
            rebuild_at,
            motion: None,
            pending: Outputs::default(),
            outputs: Outputs::default(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn scroll_offset(&self) -> f32 {
        self.scroll_offset
    }

    pub fn registry(&self) -> &SnapRegistry {
        &self.registry
    }

    pub fn is_snap_installed(&self) -> bool {
        self.snap_installed
    }

    pub fn active_motion(&self) -> Option<&SnapMotion> {
        self.motion.as_ref()
    }

    pub fn sections(&self) -> &[SectionController] {
        &self.sections
    }

    pub fn section(&self, id: SectionId) -> Option<&SectionController> {
        self.sections.iter().find(|s| s.id() == id)
    }

    /// Mount a section whose pin starts at `scroll_start`. Initial property values are
    /// delivered with the next update. On failure the section is left unregistered and
    /// the host may retry once every element exists.
    pub fn mount_section(
        &mut self,
        layout: SectionLayout,
        targets: &SectionTargets,
        scroll_start: f32,
    ) -> Result<SectionId> {
        let id = self.ids.peek_section();
        let mut section = match SectionController::mount(
            id,
            &self.cfg,
            self.viewport.height,
            layout,
            targets,
            scroll_start,
            &mut self.registry,
        ) {
            Ok(section) => section,
            Err(err) => {
                warn!("section mount skipped: {err}");
                self.pending.push_event(CoreEvent::Error {
                    message: err.to_string(),
                });
                return Err(err);
            }
        };
        self.ids.alloc_section();
        section.sync(self.scroll_offset);
        section.write_changes(&mut self.pending);
        self.pending.push_event(CoreEvent::SectionMounted {
            section: id,
            span: *section.span(),
        });
        self.sections.push(section);
        self.schedule_rebuild();
        Ok(id)
    }

    /// Detach a section: unregister its span and clear its targets.
    pub fn unmount_section(&mut self, id: SectionId) -> Result<()> {
        let idx = self
            .sections
            .iter()
            .position(|s| s.id() == id)
            .ok_or(ChoreoError::UnknownSection(id))?;
        let section = self.sections.remove(idx);
        // buffered writes for a detached section must not reach the host
        self.pending.changes.retain(|c| c.section != id);
        section.unmount(&mut self.registry, &mut self.pending);
        self.pending
            .push_event(CoreEvent::SectionUnmounted { section: id });
        self.schedule_rebuild();
        Ok(())
    }

    /// Move a section's pin start after a layout change.
    pub fn relayout_section(&mut self, id: SectionId, scroll_start: f32) -> Result<()> {
        let height = self.viewport.height;
        let section = self
            .sections
            .iter_mut()
            .find(|s| s.id() == id)
            .ok_or(ChoreoError::UnknownSection(id))?;
        section.relayout(&self.cfg, scroll_start, height, &mut self.registry)?;
        section.resync(&mut self.pending);
        self.schedule_rebuild();
        Ok(())
    }

    /// Snap decision for a normalized value. Free while snapping is not installed.
    pub fn resolve_snap(&self, candidate: f32) -> SnapDecision {
        if !self.snap_installed {
            return SnapDecision::Free { value: candidate };
        }
        self.snap.resolve(&self.registry, candidate)
    }

    /// Before installation the initial timer covers span changes.
    fn schedule_rebuild(&mut self) {
        if self.snap_installed {
            self.rebuild_at = Some(self.clock + self.cfg.snap.settle_delay);
        }
    }

    fn apply_command(&mut self, cmd: HostCommand) {
        match cmd {
            HostCommand::Scroll { offset } => {
                self.scroll_offset = offset;
                for s in &mut self.sections {
                    s.on_scroll(offset, &mut self.outputs);
                }
            }
            HostCommand::ScrollEnd => {
                if !self.snap_installed || self.motion.is_some() {
                    return;
                }
                if let Some(m) = self.snap.plan(&self.registry, self.scroll_offset) {
                    debug!("snap {} -> {} over {}s", m.from, m.to, m.duration);
                    self.outputs.push_event(CoreEvent::SnapStarted {
                        from: m.from,
                        to: m.to,
                        duration: m.duration,
                    });
                    self.motion = Some(m);
                }
            }
            HostCommand::Interrupt => {
                if self.motion.take().is_some() {
                    self.outputs.push_event(CoreEvent::SnapCancelled);
                }
            }
            HostCommand::Resize { viewport } => {
                self.viewport = viewport;
                for s in &mut self.sections {
                    let start = s.span().scroll_start;
                    if let Err(err) =
                        s.relayout(&self.cfg, start, viewport.height, &mut self.registry)
                    {
                        warn!("relayout of {} failed: {err}", s.id());
                    }
                    s.resync(&mut self.outputs);
                }
                // Stale ranges would snap to the wrong offsets; refresh right away.
                if self.snap_installed {
                    self.registry.rebuild(viewport.max_scroll);
                }
                self.motion = None;
            }
        }
    }

    /// Step by `dt` seconds with the given host commands, producing outputs.
    pub fn update(&mut self, dt: f32, inputs: Inputs) -> &Outputs {
        self.outputs.clear();
        self.outputs.append(&mut self.pending);
        let dt = dt.max(0.0);
        self.clock += dt;

        // 1) Host commands in arrival order
        for cmd in inputs.commands {
            self.apply_command(cmd);
        }

        // 2) Debounced registry build
        if self.rebuild_at.is_some_and(|at| self.clock >= at) {
            self.rebuild_at = None;
            let ranges = self.registry.rebuild(self.viewport.max_scroll);
            if !self.snap_installed {
                self.snap_installed = true;
                debug!("snap installed with {ranges} ranges");
                self.outputs.push_event(CoreEvent::SnapInstalled { ranges });
            }
        }

        // 3) Scrub smoothing
        for s in &mut self.sections {
            s.advance(dt, &mut self.outputs);
        }

        // 4) Snap travel
        if let Some(m) = self.motion.as_mut() {
            let offset = m.advance(dt);
            self.outputs.scroll_request = Some(offset);
            if m.is_finished() {
                self.outputs
                    .push_event(CoreEvent::SnapCompleted { offset });
                self.motion = None;
            }
        }

        &self.outputs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> Viewport {
        Viewport {
            height: 1000.0,
            max_scroll: 10_000.0,
        }
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut cfg = Config::default();
        cfg.pin_distance_vh = 0.0;
        assert!(Choreographer::new(cfg, viewport()).is_err());
    }

    #[test]
    fn unknown_section_errors() {
        let mut eng = Choreographer::new(Config::immediate(), viewport()).unwrap();
        assert_eq!(
            eng.unmount_section(SectionId(42)),
            Err(ChoreoError::UnknownSection(SectionId(42)))
        );
    }

    #[test]
    fn mount_failure_surfaces_error_event() {
        let mut eng = Choreographer::new(Config::immediate(), viewport()).unwrap();
        let err = eng
            .mount_section(SectionLayout::default(), &SectionTargets::default(), 0.0)
            .unwrap_err();
        assert!(matches!(err, ChoreoError::MissingTarget { .. }));
        let out = eng.update(0.0, Inputs::default());
        assert!(matches!(out.events[0], CoreEvent::Error { .. }));
        assert!(eng.sections().is_empty());
        assert!(eng.registry().is_empty());
    }

    #[test]
    fn snap_disabled_never_installs() {
        let mut cfg = Config::immediate();
        cfg.snap.enabled = false;
        let mut eng = Choreographer::new(cfg, viewport()).unwrap();
        eng.update(10.0, Inputs::default());
        assert!(!eng.is_snap_installed());
    }
}
