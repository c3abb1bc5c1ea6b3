use pinscroll_core::{
    ChoreoError, Choreographer, Config, CoreEvent, HostCommand, Inputs, PanelPosition, Phase,
    PhaseTimeline, Property, ScrollDirection, SectionLayout, SectionStatus, SectionTargets,
    SnapDecision, Viewport,
};

fn approx(a: f32, b: f32, eps: f32) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}

fn viewport() -> Viewport {
    Viewport {
        height: 1000.0,
        max_scroll: 10_000.0,
    }
}

fn left() -> SectionLayout {
    SectionLayout::Standard {
        panel_position: PanelPosition::Left,
    }
}

fn right() -> SectionLayout {
    SectionLayout::Standard {
        panel_position: PanelPosition::Right,
    }
}

/// Engine with one left-anchored standard section pinned over [1000, 2300].
fn one_section(cfg: Config) -> Choreographer {
    let mut eng = Choreographer::new(cfg, viewport()).unwrap();
    eng.mount_section(left(), &SectionTargets::standard("s", 3), 1000.0)
        .unwrap();
    eng
}

/// it should play entrance, hold, and exit as the user scrolls straight through
#[test]
fn scroll_through_single_section() {
    let mut eng = one_section(Config::immediate());
    eng.update(0.0, Inputs::default());

    let out = eng.update(0.016, Inputs::scroll(1000.0 + 0.15 * 1300.0));
    approx(out.latest("s/panel", Property::TranslateX).unwrap(), -25.0, 1e-3);
    approx(out.latest("s/panel", Property::Opacity).unwrap(), 0.5, 1e-3);
    assert!(matches!(
        out.events[..],
        [CoreEvent::SectionEntered {
            direction: ScrollDirection::Forward,
            ..
        }]
    ));

    let out = eng.update(0.016, Inputs::scroll(1000.0 + 0.5 * 1300.0));
    approx(out.latest("s/panel", Property::TranslateX).unwrap(), 0.0, 1e-4);
    approx(out.latest("s/content/item2", Property::Opacity).unwrap(), 1.0, 1e-4);

    let out = eng.update(0.016, Inputs::scroll(2300.0));
    approx(out.latest("s/panel", Property::TranslateX).unwrap(), -18.0, 1e-4);
    approx(out.latest("s/panel", Property::Opacity).unwrap(), 0.0, 1e-4);
    approx(out.latest("s/content/item0", Property::TranslateY).unwrap(), -10.0, 1e-4);
    approx(out.latest("s/image", Property::Scale).unwrap(), 1.05, 1e-4);
    approx(out.latest("s/image", Property::Opacity).unwrap(), 0.35, 1e-4);
    assert!(out
        .events
        .iter()
        .any(|e| matches!(e, CoreEvent::SectionLeft { .. })));
}

/// it should write nothing while scrolling inside the settle phase
#[test]
fn settle_phase_is_a_dead_zone() {
    let mut eng = one_section(Config::immediate());
    eng.update(0.0, Inputs::scroll(1000.0 + 0.31 * 1300.0));
    for p in [0.35, 0.45, 0.55, 0.65, 0.69] {
        let out = eng.update(0.016, Inputs::scroll(1000.0 + p * 1300.0));
        assert!(out.changes.is_empty(), "changes at p={p}: {:?}", out.changes);
        assert_eq!(
            eng.sections()[0].status(),
            SectionStatus::Settled,
            "status at p={p}"
        );
    }
}

/// it should not rewrite values when the scroll offset repeats
#[test]
fn repeated_offset_is_idempotent() {
    let mut eng = one_section(Config::immediate());
    eng.update(0.0, Inputs::default());
    let first = eng.update(0.016, Inputs::scroll(1200.0)).changes.len();
    assert!(first > 0);
    let again = eng.update(0.016, Inputs::scroll(1200.0));
    assert!(again.is_empty(), "unexpected outputs: {again:?}");
}

/// it should mirror horizontal motion for right-anchored panels
#[test]
fn panel_side_mirrors_translation() {
    let mut eng = Choreographer::new(Config::immediate(), viewport()).unwrap();
    eng.mount_section(left(), &SectionTargets::standard("l", 1), 0.0)
        .unwrap();
    eng.mount_section(right(), &SectionTargets::standard("r", 1), 0.0)
        .unwrap();
    let out = eng.update(0.0, Inputs::scroll(0.85 * 1300.0));
    let l = out.latest("l/panel", Property::TranslateX).unwrap();
    let r = out.latest("r/panel", Property::TranslateX).unwrap();
    assert!(l < 0.0 && r > 0.0);
    approx(l, -r, 1e-5);
}

/// it should start content items in order, spaced by the stagger step
#[test]
fn stagger_orders_items_for_any_count() {
    for n in [1usize, 2, 5, 8] {
        let tl = PhaseTimeline::build(left(), &SectionTargets::standard("s", n)).unwrap();
        let starts: Vec<f32> = (0..n)
            .map(|k| {
                tl.entries()
                    .iter()
                    .find(|e| {
                        e.target == format!("s/content/item{k}")
                            && e.phase == Phase::Entrance
                            && e.property == Property::Opacity
                    })
                    .unwrap()
                    .start_progress
            })
            .collect();
        for (k, pair) in starts.windows(2).enumerate() {
            approx(pair[1] - pair[0], 0.03, 1e-5);
            assert!(pair[1] > pair[0], "item {} starts before item {k}", k + 1);
        }
        assert!(starts.iter().all(|&s| s < Phase::Entrance.end()));
    }
}

/// it should refuse groups too large to fit their phase
#[test]
fn oversized_group_fails_to_mount() {
    let mut eng = Choreographer::new(Config::immediate(), viewport()).unwrap();
    let err = eng
        .mount_section(left(), &SectionTargets::standard("s", 9), 0.0)
        .unwrap_err();
    assert!(matches!(err, ChoreoError::StaggerOverflow { .. }));
    assert!(eng.registry().is_empty());
}

/// it should hold every value at its boundary when landing exactly on a phase edge
#[test]
fn phase_boundaries_are_continuous() {
    let tl = PhaseTimeline::build(right(), &SectionTargets::standard("s", 2)).unwrap();
    for edge in [0.3f32, 0.7] {
        let before = tl.evaluate(edge - 1e-5);
        let at = tl.evaluate(edge);
        for (b, a) in before.iter().zip(at.iter()) {
            assert_eq!((&b.target, b.property), (&a.target, a.property));
            approx(b.value, a.value, 0.01);
        }
    }
}

/// it should restore the start state when scrolling back above the span
#[test]
fn leave_back_resets_to_start_state() {
    let mut eng = one_section(Config::default());
    eng.update(0.0, Inputs::default());
    eng.update(0.1, Inputs::scroll(2100.0));
    // Smoothing is still catching up when the user reverses.
    let out = eng.update(0.016, Inputs::scroll(950.0));
    assert!(out
        .events
        .iter()
        .any(|e| matches!(e, CoreEvent::SectionLeftBack { .. })));
    approx(out.latest("s/panel", Property::TranslateX).unwrap(), -50.0, 1e-5);
    approx(out.latest("s/panel", Property::Opacity).unwrap(), 0.0, 1e-5);
    approx(out.latest("s/content/item1", Property::TranslateX).unwrap(), -10.0, 1e-5);
    approx(out.latest("s/content/item1", Property::TranslateY).unwrap(), 0.0, 1e-5);
    approx(out.latest("s/image", Property::Scale).unwrap(), 1.08, 1e-5);
    assert_eq!(eng.sections()[0].applied_progress(), 0.0);
    assert_eq!(eng.sections()[0].status(), SectionStatus::Pinned);
}

/// it should ease applied progress toward scroll progress over several frames
#[test]
fn scrub_lag_smooths_progress() {
    let mut eng = one_section(Config::default());
    eng.update(0.0, Inputs::default());
    eng.update(0.016, Inputs::scroll(1650.0));
    let first = eng.sections()[0].applied_progress();
    assert!(first > 0.0 && first < 0.5, "applied {first}");
    let mut prev = first;
    for _ in 0..30 {
        eng.update(0.05, Inputs::default());
        let p = eng.sections()[0].applied_progress();
        assert!(p >= prev);
        prev = p;
    }
    approx(prev, 0.5, 1e-3);
    assert_eq!(eng.sections()[0].scroll_progress(), 0.5);
}

/// it should leave snapping off until the settle delay has elapsed
#[test]
fn snap_installs_after_settle_delay() {
    let mut eng = one_section(Config::immediate());
    eng.update(0.25, Inputs::default());
    assert!(!eng.is_snap_installed());
    assert_eq!(eng.resolve_snap(0.18), SnapDecision::Free { value: 0.18 });

    let out = eng.update(0.25, Inputs::default());
    assert!(out
        .events
        .contains(&CoreEvent::SnapInstalled { ranges: 1 }));
    assert!(eng.is_snap_installed());
    match eng.resolve_snap(0.18) {
        SnapDecision::Snap { target } => approx(target.value, 0.165, 1e-5),
        other => panic!("expected snap, got {other:?}"),
    }
    assert_eq!(eng.resolve_snap(0.5), SnapDecision::Free { value: 0.5 });
}

/// it should steer the scroll to the span center after scrolling stops nearby
#[test]
fn scroll_end_near_span_snaps_to_center() {
    let mut eng = one_section(Config::immediate());
    eng.update(0.5, Inputs::default());

    let out = eng.update(0.0, Inputs::settle_at(2200.0));
    let (from, to, duration) = out
        .events
        .iter()
        .find_map(|e| match *e {
            CoreEvent::SnapStarted { from, to, duration } => Some((from, to, duration)),
            _ => None,
        })
        .expect("snap started");
    approx(from, 2200.0, 1e-3);
    approx(to, 1650.0, 1e-2);
    assert!((0.15..=0.35).contains(&duration));

    let mut last = from;
    let mut completed = false;
    for _ in 0..40 {
        let out = eng.update(0.016, Inputs::default());
        if let Some(req) = out.scroll_request {
            assert!(req <= last + 1e-3, "snap overshot: {req} after {last}");
            last = req;
        }
        if out.events.iter().any(|e| matches!(e, CoreEvent::SnapCompleted { .. })) {
            completed = true;
            break;
        }
    }
    assert!(completed);
    approx(last, 1650.0, 1e-2);
    assert!(eng.active_motion().is_none());
}

/// it should not snap when scrolling stops away from every span
#[test]
fn scroll_end_far_from_span_stays_free() {
    let mut eng = one_section(Config::immediate());
    eng.update(0.5, Inputs::default());
    let out = eng.update(0.0, Inputs::settle_at(6000.0));
    assert!(out.scroll_request.is_none());
    assert!(eng.active_motion().is_none());
}

/// it should drop a running snap as soon as the user scrolls again
#[test]
fn user_input_interrupts_snap() {
    let mut eng = one_section(Config::immediate());
    eng.update(0.5, Inputs::default());
    eng.update(0.0, Inputs::settle_at(2200.0));
    assert!(eng.active_motion().is_some());
    let out = eng.update(0.016, Inputs::default().with(HostCommand::Interrupt));
    assert!(out.events.contains(&CoreEvent::SnapCancelled));
    assert!(out.scroll_request.is_none());
    assert!(eng.active_motion().is_none());
}

/// it should clear every animated target and forget the span on unmount
#[test]
fn unmount_clears_targets() {
    let mut eng = one_section(Config::immediate());
    let id = eng.sections()[0].id();
    eng.update(0.0, Inputs::scroll(1400.0));
    eng.unmount_section(id).unwrap();
    let out = eng.update(0.0, Inputs::scroll(1500.0));
    let mut cleared: Vec<&str> = out.clears.iter().map(|c| c.target.as_str()).collect();
    cleared.sort_unstable();
    assert_eq!(
        cleared,
        vec!["s/content/item0", "s/content/item1", "s/content/item2", "s/image", "s/panel"]
    );
    assert!(out.changes.is_empty());
    assert!(out
        .events
        .contains(&CoreEvent::SectionUnmounted { section: id }));
    assert!(eng.registry().is_empty());
    assert_eq!(
        eng.unmount_section(id),
        Err(ChoreoError::UnknownSection(id))
    );
}

/// it should re-measure spans and refresh snap ranges on resize
#[test]
fn resize_rescales_spans() {
    let mut eng = one_section(Config::immediate());
    eng.update(0.5, Inputs::scroll(1650.0));
    let out = eng.update(
        0.016,
        Inputs::default().with(HostCommand::Resize {
            viewport: Viewport {
                height: 500.0,
                max_scroll: 5000.0,
            },
        }),
    );
    // The new span is [1000, 1650]; 1650 is now the end.
    approx(out.latest("s/panel", Property::Opacity).unwrap(), 0.0, 1e-4);
    let span = *eng.sections()[0].span();
    approx(span.scroll_end, 1650.0, 1e-3);
    let range = eng.registry().ranges()[0];
    approx(range.start, 0.2, 1e-5);
    approx(range.end, 0.33, 1e-5);
}

/// it should move a section's span when the host reports a new start
#[test]
fn relayout_moves_span() {
    let mut eng = one_section(Config::immediate());
    let id = eng.sections()[0].id();
    eng.update(0.5, Inputs::scroll(1650.0));
    eng.relayout_section(id, 3000.0).unwrap();
    let out = eng.update(0.0, Inputs::default());
    approx(out.latest("s/panel", Property::TranslateX).unwrap(), -50.0, 1e-4);
    assert_eq!(eng.section(id).unwrap().status(), SectionStatus::Pinned);
    assert!(eng.registry().is_dirty());

    eng.update(0.5, Inputs::default());
    assert!(!eng.registry().is_dirty());
    approx(eng.registry().ranges()[0].start, 0.3, 1e-5);
}

/// it should hold hero content until the exit phase, then fade markers last
#[test]
fn hero_exit_only() {
    let mut eng = Choreographer::new(Config::immediate(), viewport()).unwrap();
    eng.mount_section(SectionLayout::Hero, &SectionTargets::hero("h", 2, 3), 0.0)
        .unwrap();
    eng.update(0.0, Inputs::default());
    let out = eng.update(0.016, Inputs::scroll(0.6 * 1300.0));
    assert!(out.changes.is_empty());

    let out = eng.update(0.016, Inputs::scroll(0.8 * 1300.0));
    assert!(out.latest("h/content/item0", Property::TranslateX).unwrap() < 0.0);
    assert!(out.latest("h/markers/m0", Property::Opacity).is_none());

    let out = eng.update(0.016, Inputs::scroll(1300.0));
    approx(out.latest("h/markers/m2", Property::Opacity).unwrap(), 0.3, 1e-5);
    approx(out.latest("h/image", Property::Scale).unwrap(), 1.06, 1e-5);
}

/// it should reject hero sections missing their markers
#[test]
fn hero_requires_markers() {
    let mut eng = Choreographer::new(Config::immediate(), viewport()).unwrap();
    let mut targets = SectionTargets::hero("h", 2, 3);
    targets.markers = None;
    assert_eq!(
        eng.mount_section(SectionLayout::Hero, &targets, 0.0),
        Err(ChoreoError::MissingTarget { role: "markers" })
    );
}

/// it should put hero content back to its settled look when scrolling back to the top
#[test]
fn hero_leave_back_restores_settled_values() {
    let mut eng = Choreographer::new(Config::immediate(), viewport()).unwrap();
    let id = eng
        .mount_section(SectionLayout::Hero, &SectionTargets::hero("h", 2, 3), 100.0)
        .unwrap();
    eng.update(0.0, Inputs::scroll(1400.0));
    let out = eng.update(0.016, Inputs::scroll(50.0));
    assert!(out
        .events
        .contains(&CoreEvent::SectionLeftBack { section: id }));
    approx(out.latest("h/content/item1", Property::TranslateX).unwrap(), 0.0, 1e-6);
    approx(out.latest("h/content/item1", Property::Opacity).unwrap(), 1.0, 1e-6);
    approx(out.latest("h/markers/m0", Property::Opacity).unwrap(), 1.0, 1e-6);
    approx(out.latest("h/image", Property::Scale).unwrap(), 1.0, 1e-6);
}

/// it should pin every entry to `from` at or before its start and `to` at or after its end
#[test]
fn every_entry_holds_its_endpoints() {
    let builds = [
        PhaseTimeline::build(right(), &SectionTargets::standard("s", 3)).unwrap(),
        PhaseTimeline::build(SectionLayout::Hero, &SectionTargets::hero("h", 2, 3)).unwrap(),
    ];
    for tl in &builds {
        for e in tl.entries() {
            let (start, end) = (e.start_progress, e.end_progress);
            let (lo, hi) = e.phase.bounds();
            assert!(lo <= start && start < end && end <= hi, "{e:?} outside {:?}", e.phase);
            assert_eq!(e.sample(start), e.from, "{} {:?} at start", e.target, e.property);
            if start > 0.0 {
                assert_eq!(e.sample(start - 0.001), e.from, "{} before start", e.target);
            }
            assert_eq!(e.sample(end), e.to, "{} {:?} at end", e.target, e.property);
            assert_eq!(e.sample(end + 0.001), e.to, "{} after end", e.target);
        }
    }

    let content_starts: Vec<(u32, f32)> = builds[0]
        .entries()
        .iter()
        .filter(|e| e.phase == Phase::Entrance && e.property == Property::Opacity)
        .filter_map(|e| e.stagger.map(|s| (s.index, e.start_progress)))
        .collect();
    assert_eq!(content_starts.len(), 3);
    for (k, start) in content_starts {
        approx(start, 0.08 + 0.03 * k as f32, 1e-6);
    }
    let marker_starts = builds[1]
        .entries()
        .iter()
        .filter(|e| e.target.starts_with("h/markers/"))
        .map(|e| e.start_progress);
    for start in marker_starts {
        approx(start, 0.85, 1e-6);
    }
}

/// it should rewrite every channel with its progress-0 value on leave back
#[test]
fn leave_back_writes_every_reset_value() {
    let mut eng = one_section(Config::immediate());
    eng.update(0.0, Inputs::scroll(1000.0 + 0.5 * 1300.0));
    let out = eng.update(0.016, Inputs::scroll(900.0)).clone();
    let expected = eng.sections()[0].timeline().reset_values();
    assert_eq!(out.changes.len(), expected.len());
    for (change, v) in out.changes.iter().zip(expected.iter()) {
        assert_eq!((&change.target, change.property), (&v.target, v.property));
        assert_eq!(change.value, v.value);
    }
    // The cache now holds the reset values, so a repeat tick writes nothing.
    let out = eng.update(0.016, Inputs::scroll(900.0));
    assert!(out.changes.is_empty());
}

/// it should drop initial writes of a section unmounted before the host saw them
#[test]
fn unmount_before_update_drops_buffered_writes() {
    let mut eng = Choreographer::new(Config::immediate(), viewport()).unwrap();
    let keep = eng
        .mount_section(left(), &SectionTargets::standard("k", 1), 2000.0)
        .unwrap();
    let id = eng
        .mount_section(left(), &SectionTargets::standard("s", 2), 0.0)
        .unwrap();
    eng.unmount_section(id).unwrap();
    let out = eng.update(0.0, Inputs::default());
    assert!(out.changes.iter().all(|c| c.section != id), "{:?}", out.changes);
    assert!(out.changes.iter().any(|c| c.section == keep));
    assert!(!out.clears.is_empty());
    assert!(out.clears.iter().all(|c| c.section == id));
    assert!(out
        .events
        .contains(&CoreEvent::SectionUnmounted { section: id }));
}

/// it should hand out ids only to sections that actually mount
#[test]
fn failed_mount_does_not_consume_an_id() {
    let mut eng = Choreographer::new(Config::immediate(), viewport()).unwrap();
    let mut broken = SectionTargets::standard("s", 2);
    broken.image = None;
    assert_eq!(
        eng.mount_section(left(), &broken, 0.0),
        Err(ChoreoError::MissingTarget { role: "image" })
    );
    let first = eng
        .mount_section(left(), &SectionTargets::standard("s", 2), 0.0)
        .unwrap();
    assert_eq!(first, pinscroll_core::SectionId(0));
    let second = eng
        .mount_section(left(), &SectionTargets::standard("t", 2), 1500.0)
        .unwrap();
    assert_eq!(second, pinscroll_core::SectionId(1));
}
