#![cfg(not(target_arch = "wasm32"))]
//! Property-based invariant tests for mounted intro sessions.
//!
//! Verifies:
//! 1. Unmounting after any input leaves the page exactly as it was found
//! 2. Only blocking listeners ever report `Consumed`
//! 3. Listener passivity never depends on the input seen
//! 4. An active, mounted session always holds the lock with overflow hidden
//! 5. `on_complete` fires once per completion, and once at most when not reversible
//! 6. A stage always ends up either showing the intro or (if reversible) watching

use std::cell::Cell;
use std::rc::Rc;

use curtain_core::assets::FrameSet;
use curtain_core::scroll_lock::ScrollLock;
use curtain_core::{CompletionState, Disposition, IntroConfig, Variant};
use curtain_web::input::{InputEvent, TouchPhase};
use curtain_web::page::MemoryPage;
use curtain_web::presentation::IntroAssets;
use curtain_web::session::IntroSession;
use curtain_web::stage::Stage;
use curtain_web::{ListenerKinds, ListenerOptions};
use proptest::prelude::*;

// ── Strategy helpers ──────────────────────────────────────────────────

fn arb_touch_phase() -> impl Strategy<Value = TouchPhase> {
    prop_oneof![
        Just(TouchPhase::Start),
        Just(TouchPhase::Move),
        Just(TouchPhase::End),
        Just(TouchPhase::Cancel),
    ]
}

fn arb_event() -> impl Strategy<Value = InputEvent> {
    prop_oneof![
        4 => (-800.0f32..800.0).prop_map(InputEvent::wheel),
        3 => (arb_touch_phase(), 0.0f32..900.0).prop_map(|(p, y)| InputEvent::touch(p, y)),
        2 => prop_oneof![
            Just("ArrowDown"),
            Just("ArrowUp"),
            Just("PageDown"),
            Just("PageUp"),
            Just(" "),
            Just("Enter"),
        ]
        .prop_map(|k: &str| InputEvent::key(k)),
        3 => (0u64..120).prop_map(InputEvent::tick),
        1 => Just(InputEvent::Reenter),
    ]
}

fn arb_config() -> impl Strategy<Value = IntroConfig> {
    (
        prop_oneof![
            Just(Variant::ImageSequence),
            Just(Variant::VectorGraphics),
            Just(Variant::StaticFrame),
        ],
        any::<bool>(),
        any::<bool>(),
    )
        .prop_map(|(variant, reversible, start_at_end)| {
            IntroConfig::for_variant(variant)
                .reversible(reversible)
                .start_at_end(start_at_end)
        })
}

fn arb_assets() -> impl Strategy<Value = IntroAssets> {
    (0usize..40).prop_map(|n| {
        IntroAssets::new(
            FrameSet::from_sources((1..=n).map(|i| format!("/frames/frame-{i:03}.webp"))),
            "/assets/intro.webp",
        )
    })
}

fn page() -> (MemoryPage, ScrollLock) {
    let page = MemoryPage::new().with_overflow("clip", "");
    page.set_scroll_y(640.0);
    let lock = ScrollLock::new(page.clone()).with_smooth_scroller(page.clone());
    (page, lock)
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Unmount restores the page
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn unmount_restores_page(
        config in arb_config(),
        assets in arb_assets(),
        probe_ok in any::<bool>(),
        events in prop::collection::vec(arb_event(), 0..60),
    ) {
        let (page, lock) = page();
        let before = page.current_overflow();
        let mut session = IntroSession::mount(config, &assets, &lock, page.clone()).unwrap();
        if probe_ok {
            session.probe_loaded();
        } else {
            session.probe_failed();
        }
        for event in &events {
            session.handle_input(event);
        }
        session.unmount();
        prop_assert_eq!(page.current_overflow(), before);
        prop_assert!(page.smooth_running());
        prop_assert_eq!(page.listener_count(), 0);
        prop_assert!(!lock.is_held());
        let (stops, starts) = page.smooth_calls();
        prop_assert_eq!(stops, starts);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2–4. Dispositions, passivity, lock while active
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn only_blocking_kinds_are_consumed(
        config in arb_config(),
        events in prop::collection::vec(arb_event(), 1..60),
    ) {
        let (page, lock) = page();
        let assets = IntroAssets::new(FrameSet::default(), "/assets/intro.webp");
        let mut session = IntroSession::mount(config, &assets, &lock, page).unwrap();
        for event in &events {
            let disposition = session.handle_input(event);
            if disposition == Disposition::Consumed && !matches!(event, InputEvent::Reenter) {
                let kind = event.listener_kind();
                prop_assert!(kind.is_some_and(|k| ListenerKinds::BLOCKING.contains(k)));
            }
        }
    }

    #[test]
    fn listener_passivity_is_fixed(
        config in arb_config(),
        events in prop::collection::vec(arb_event(), 0..60),
    ) {
        let (page, lock) = page();
        let assets = IntroAssets::new(FrameSet::default(), "/assets/intro.webp");
        let mut session = IntroSession::mount(config, &assets, &lock, page.clone()).unwrap();
        for event in &events {
            session.handle_input(event);
            for reg in page.snapshot().listeners {
                let expected = if reg.kinds == ListenerKinds::BLOCKING {
                    ListenerOptions::BLOCKING
                } else {
                    ListenerOptions::PASSIVE
                };
                prop_assert_eq!(reg.options, expected);
            }
        }
    }

    #[test]
    fn active_session_holds_lock(
        config in arb_config(),
        events in prop::collection::vec(arb_event(), 0..60),
    ) {
        let (page, lock) = page();
        let assets = IntroAssets::new(FrameSet::default(), "/assets/intro.webp");
        let mut session = IntroSession::mount(config, &assets, &lock, page.clone()).unwrap();
        for event in &events {
            session.handle_input(event);
            if session.state() != CompletionState::Completed {
                prop_assert!(session.holds_lock());
                prop_assert!(page.current_overflow().is_hidden());
                prop_assert_eq!(page.listening(), ListenerKinds::INTRO);
            } else {
                prop_assert!(!session.holds_lock());
                prop_assert_eq!(page.listener_count(), 0);
            }
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Completion callback
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn on_complete_matches_completions(
        config in arb_config(),
        events in prop::collection::vec(arb_event(), 0..80),
    ) {
        let reversible = config.reversible;
        let (page, lock) = page();
        let assets = IntroAssets::new(FrameSet::default(), "/assets/intro.webp");
        let fired = Rc::new(Cell::new(0u32));
        let counter = Rc::clone(&fired);
        let mut session = IntroSession::mount(config, &assets, &lock, page)
            .unwrap()
            .on_complete(move || counter.set(counter.get() + 1));
        for event in &events {
            session.handle_input(event);
        }
        prop_assert_eq!(fired.get(), session.controller().completions());
        if !reversible {
            prop_assert!(fired.get() <= 1);
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 6. Stage visibility
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn stage_is_visible_or_watching(
        config in arb_config(),
        scroll_ys in prop::collection::vec(prop_oneof![Just(0.0f64), 1.0f64..500.0], 1..8),
        events in prop::collection::vec(arb_event(), 0..80),
    ) {
        let reversible = config.reversible;
        let (page, lock) = page();
        let assets = IntroAssets::new(FrameSet::default(), "/assets/intro.webp");
        let mut stage = Stage::new(config, assets, lock.clone(), page.clone()).unwrap();
        for (i, event) in events.iter().enumerate() {
            if !stage.is_intro_visible() {
                page.set_scroll_y(scroll_ys[i % scroll_ys.len()]);
            }
            stage.handle_input(event);
            if stage.is_intro_visible() {
                prop_assert!(lock.is_held());
                prop_assert!(!stage.is_watching());
            } else {
                prop_assert!(!lock.is_held());
                prop_assert_eq!(stage.is_watching(), reversible);
            }
        }
    }
}
