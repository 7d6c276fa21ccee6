//! End-to-end lifecycle scenarios against the in-memory page.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use curtain_core::assets::FrameSet;
use curtain_core::scroll_lock::{OverflowSnapshot, ScrollLock};
use curtain_core::{CompletionState, Disposition, IntroConfig, IntroEvent};
use curtain_web::input::{InputEvent, TouchPhase};
use curtain_web::page::{MemoryPage, PageSnapshot};
use curtain_web::presentation::{IntroAssets, Scene};
use curtain_web::session::{IntroSession, SessionError};
use curtain_web::stage::{Stage, StageEvent};
use curtain_web::{ListenerKinds, ListenerOptions};
use pretty_assertions::assert_eq;

const FRAME: Duration = Duration::from_millis(16);

fn frames(n: usize) -> IntroAssets {
    IntroAssets::new(
        FrameSet::from_sources((1..=n).rev().map(|i| format!("/intro/frame-{i}.webp"))),
        "/assets/intro.webp",
    )
}

fn page() -> (MemoryPage, ScrollLock) {
    let page = MemoryPage::new().with_overflow("scroll", "auto");
    page.set_scroll_y(1200.0);
    let lock = ScrollLock::new(page.clone()).with_smooth_scroller(page.clone());
    (page, lock)
}

fn idle_snapshot(scroll_y: f64) -> PageSnapshot {
    PageSnapshot {
        overflow: OverflowSnapshot {
            root: "scroll".into(),
            body: "auto".into(),
        },
        scroll_y,
        smooth_running: true,
        listeners: Vec::new(),
    }
}

fn run_frames(session: &mut IntroSession, n: usize) {
    for _ in 0..n {
        session.advance_time(FRAME);
    }
}

#[test]
fn image_sequence_full_run() {
    let (page, lock) = page();
    let fired = Rc::new(Cell::new(0));
    let counter = Rc::clone(&fired);
    let mut session = IntroSession::mount(IntroConfig::default(), &frames(120), &lock, page.clone())
        .unwrap()
        .on_complete(move || counter.set(counter.get() + 1));
    assert_eq!(page.current_scroll_y(), 0.0);
    assert_eq!(
        session.presentation().as_image_sequence().unwrap().probe_source(),
        Some("/intro/frame-1.webp")
    );
    session.probe_loaded();

    // Scroll through in steps, letting the spring catch up. The last step
    // lands exactly on full progress.
    for _ in 0..28 {
        assert_eq!(
            session.handle_input(&InputEvent::wheel(60.0)),
            Disposition::Consumed
        );
        run_frames(&mut session, 4);
    }
    run_frames(&mut session, 200);

    assert_eq!(session.state(), CompletionState::Completed);
    assert_eq!(fired.get(), 1);
    assert_eq!(page.snapshot(), idle_snapshot(0.0));

    let events = session.drain_events();
    assert_eq!(
        events.iter().filter(|e| **e == IntroEvent::Completed).count(),
        1
    );
    assert!(events.contains(&IntroEvent::CompletionArmed));
    assert!(events.iter().any(|e| matches!(e, IntroEvent::PhaseChanged { .. })));
    match session.scene() {
        Scene::ImageSequence(scene) => {
            assert_eq!(scene.index, 119);
            assert_eq!(scene.fade_opacity, 1.0);
            assert_eq!(scene.source, "/intro/frame-120.webp");
        }
        other => panic!("unexpected scene {other:?}"),
    }
}

#[test]
fn unmount_mid_animation_cleans_up() {
    let (page, lock) = page();
    let mut session =
        IntroSession::mount(IntroConfig::static_frame(), &frames(0), &lock, page.clone()).unwrap();
    session.handle_input(&InputEvent::wheel(4000.0));
    run_frames(&mut session, 5);
    assert_eq!(session.state(), CompletionState::Completing);
    assert_eq!(
        session.controller().settle_remaining(),
        Some(Duration::from_millis(400))
    );
    assert!(session.wants_frames());

    session.unmount();
    assert!(!session.is_mounted());
    assert!(!session.wants_frames());
    assert_eq!(session.controller().pending_settle(), None);
    assert_eq!(page.snapshot(), idle_snapshot(0.0));

    // The armed completion was cancelled, and late frames change nothing.
    run_frames(&mut session, 60);
    assert_eq!(session.state(), CompletionState::Active);
    assert_eq!(session.controller().completions(), 0);
    assert_eq!(page.snapshot(), idle_snapshot(0.0));
}

#[test]
fn dropping_session_restores_page() {
    let (page, lock) = page();
    {
        let mut session =
            IntroSession::mount(IntroConfig::default(), &frames(10), &lock, page.clone()).unwrap();
        session.handle_input(&InputEvent::touch(TouchPhase::Start, 500.0));
        session.handle_input(&InputEvent::touch(TouchPhase::Move, 420.0));
        assert!(page.current_overflow().is_hidden());
    }
    assert_eq!(page.snapshot(), idle_snapshot(0.0));
    assert!(!lock.is_held());
}

#[test]
fn listeners_are_registered_with_expected_passivity() {
    let (page, lock) = page();
    let _session =
        IntroSession::mount(IntroConfig::default(), &frames(10), &lock, page.clone()).unwrap();
    let regs = page.snapshot().listeners;
    assert_eq!(regs.len(), 2);
    assert_eq!(regs[0].kinds, ListenerKinds::BLOCKING);
    assert_eq!(regs[0].options, ListenerOptions::BLOCKING);
    assert_eq!(regs[1].kinds, ListenerKinds::OBSERVING);
    assert_eq!(regs[1].options, ListenerOptions::PASSIVE);
}

#[test]
fn mount_failure_releases_lock() {
    let (page, lock) = page();
    page.refuse_listeners(ListenerKinds::WHEEL);
    let err = IntroSession::mount(IntroConfig::default(), &frames(10), &lock, page.clone())
        .unwrap_err();
    assert!(matches!(err, SessionError::Host(_)));
    assert_eq!(page.snapshot(), idle_snapshot(0.0));
    assert_eq!(page.smooth_calls(), (1, 1));

    page.refuse_listeners(ListenerKinds::empty());
    let session = IntroSession::mount(IntroConfig::default(), &frames(10), &lock, page.clone());
    assert!(session.is_ok());
}

#[test]
fn invalid_config_never_touches_page() {
    let (page, lock) = page();
    let mut config = IntroConfig::default();
    config.wheel_sensitivity = 0.0;
    let err = IntroSession::mount(config, &frames(10), &lock, page.clone()).unwrap_err();
    assert!(matches!(err, SessionError::Config(_)));
    assert_eq!(page.snapshot(), idle_snapshot(1200.0));
    assert_eq!(page.smooth_calls(), (0, 0));
}

#[test]
fn degraded_sequence_still_completes() {
    let (page, lock) = page();
    let fired = Rc::new(Cell::new(false));
    let flag = Rc::clone(&fired);
    let mut session = IntroSession::mount(
        IntroConfig::default().smoothing(None),
        &frames(30),
        &lock,
        page.clone(),
    )
    .unwrap()
    .on_complete(move || flag.set(true));
    session.probe_failed();
    assert_eq!(session.presentation().frame_count(), None);
    session.handle_input(&InputEvent::key("PageDown"));
    assert!((session.controller().progress() - 0.04).abs() < 1e-6);
    session.handle_input(&InputEvent::wheel(2000.0));
    run_frames(&mut session, 30);
    assert!(fired.get());
    match session.scene() {
        Scene::ImageSequence(scene) => {
            assert_eq!(scene.source, "/assets/intro.webp");
            assert_eq!(
                scene.degraded.as_deref(),
                Some("first frame failed to load: /intro/frame-1.webp")
            );
        }
        other => panic!("unexpected scene {other:?}"),
    }
}

#[test]
fn scrolling_back_cancels_pending_completion() {
    let (page, lock) = page();
    let mut session =
        IntroSession::mount(
            IntroConfig::default()
                .smoothing(None)
                .settle_delay(Duration::from_millis(300)),
            &frames(0),
            &lock,
            page,
        )
        .unwrap();
    session.handle_input(&InputEvent::wheel(2000.0));
    run_frames(&mut session, 10);
    assert_eq!(session.state(), CompletionState::Completing);
    session.handle_input(&InputEvent::key("ArrowUp"));
    assert_eq!(session.state(), CompletionState::Active);
    run_frames(&mut session, 60);
    assert_eq!(session.state(), CompletionState::Active);
    assert!(session.drain_events().contains(&IntroEvent::CompletionCancelled));
}

#[test]
fn cancelled_touch_does_not_leak_into_next_gesture() {
    let (page, lock) = page();
    let mut session =
        IntroSession::mount(IntroConfig::vector_graphics(), &frames(0), &lock, page.clone())
            .unwrap();
    assert_eq!(
        page.options_for(ListenerKinds::TOUCH_CANCEL),
        Some(ListenerOptions::PASSIVE)
    );

    session.handle_input(&InputEvent::touch(TouchPhase::Start, 400.0));
    assert_eq!(
        session.handle_input(&InputEvent::touch(TouchPhase::Cancel, 380.0)),
        Disposition::Ignored
    );
    session.handle_input(&InputEvent::touch(TouchPhase::Move, 100.0));
    assert_eq!(session.controller().progress(), 0.0);
    session.handle_input(&InputEvent::touch(TouchPhase::Move, 50.0));
    assert!(session.controller().progress() > 0.0);
}

#[test]
fn mounting_at_the_end_completes_without_input() {
    let (page, lock) = page();
    let fired = Rc::new(Cell::new(0));
    let counter = Rc::clone(&fired);
    let mut session = IntroSession::mount(
        IntroConfig::vector_graphics()
            .initial_progress(1.0)
            .settle_delay(Duration::from_millis(420)),
        &frames(0),
        &lock,
        page.clone(),
    )
    .unwrap()
    .on_complete(move || counter.set(counter.get() + 1));
    assert_eq!(session.state(), CompletionState::Completing);
    assert!(lock.is_held());

    run_frames(&mut session, 30);
    assert_eq!(session.state(), CompletionState::Completed);
    assert_eq!(fired.get(), 1);
    assert!(!lock.is_held());
    assert_eq!(page.listener_count(), 0);
}

#[test]
fn completion_during_mount_reaches_late_callback() {
    let (page, lock) = page();
    let fired = Rc::new(Cell::new(0));
    let counter = Rc::clone(&fired);
    let session = IntroSession::mount(
        IntroConfig::vector_graphics().initial_progress(1.0),
        &frames(0),
        &lock,
        page.clone(),
    )
    .unwrap();
    assert!(session.is_completed());
    assert!(!lock.is_held());
    let _session = session.on_complete(move || counter.set(counter.get() + 1));
    assert_eq!(fired.get(), 1);
}

#[test]
fn stage_reentry_round_trip() {
    let (page, lock) = page();
    let config = IntroConfig::vector_graphics();
    let mut stage = Stage::new(config, frames(0), lock.clone(), page.clone()).unwrap();

    stage.handle_input(&InputEvent::wheel(2000.0));
    assert!(!stage.is_intro_visible());
    assert_eq!(
        page.snapshot().listeners.iter().map(|r| (r.kinds, r.options)).collect::<Vec<_>>(),
        vec![(ListenerKinds::REENTRY, ListenerOptions::PASSIVE)]
    );

    // User reads the page, then comes back to the top.
    page.set_scroll_y(900.0);
    stage.handle_input(&InputEvent::wheel(-120.0));
    assert!(!stage.is_intro_visible());
    page.set_scroll_y(0.0);
    stage.drain_events();
    assert_eq!(
        stage.handle_input(&InputEvent::wheel(-120.0)),
        Disposition::Ignored
    );
    assert!(stage.is_intro_visible());
    assert!(lock.is_held());

    let events = stage.drain_events();
    assert_eq!(events[0], StageEvent::ReentryTriggered);
    assert_eq!(events[1], StageEvent::IntroMounted { progress: 0.99 });

    // Scrub backwards through the intro, then finish it again.
    for _ in 0..10 {
        stage.handle_input(&InputEvent::wheel(-200.0));
    }
    let progress = stage.session().unwrap().controller().progress();
    assert!(progress < 0.0001);
    stage.handle_input(&InputEvent::wheel(2000.0));
    assert!(!stage.is_intro_visible());
    assert!(stage.is_watching());
    assert_eq!(stage.mounts(), 2);

    stage.close();
    assert_eq!(page.snapshot(), idle_snapshot(0.0));
}
