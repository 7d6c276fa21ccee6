#![forbid(unsafe_code)]

//! Replay harness for the scroll intro.
//!
//! [`replay`] mounts a [`Stage`] on an in-memory page, feeds it a parsed
//! script and records every transition with the step that caused it. The
//! report ends with the page state after teardown, so a script can check
//! that the intro left the page as it found it.

pub mod cli;
pub mod script;

use std::time::Duration;

use curtain_core::assets::FrameSet;
use curtain_core::scroll_lock::{OverflowSnapshot, ScrollLock};
use curtain_core::{CompletionState, IntroConfig};
use curtain_web::page::MemoryPage;
use curtain_web::presentation::{IntroAssets, Scene};
use curtain_web::session::SessionError;
use curtain_web::stage::{Stage, StageEvent};
use serde::Serialize;

use crate::script::{Directive, Step};

/// Overflow the harness page starts with.
pub const INITIAL_OVERFLOW: (&str, &str) = ("", "auto");

/// Fallback still used by harness assets.
pub const FALLBACK_SOURCE: &str = "/assets/intro.webp";

/// Replay settings.
#[derive(Debug, Clone)]
pub struct ReplayOptions {
    /// Duration of one animation frame for `wait` steps.
    pub frame: Duration,
    /// Record the scene after every step.
    pub scenes: bool,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        Self {
            frame: Duration::from_millis(16),
            scenes: false,
        }
    }
}

/// A transition and the script step that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplayLine {
    /// 0 for the initial mount, otherwise the 1-based step index.
    pub step: usize,
    pub event: StageEvent,
}

/// What the page looked like at the end.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplaySummary {
    pub steps: usize,
    pub mounts: u32,
    pub completions: usize,
    pub consumed: usize,
    pub visible: bool,
    pub state: Option<String>,
    pub progress: Option<f32>,
    pub watching: bool,
    /// Whether the scroll lock was held before teardown.
    pub lock_held: bool,
    /// Whether teardown restored the original overflow with no listeners left.
    pub page_restored: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplayReport {
    pub lines: Vec<ReplayLine>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub scenes: Vec<(usize, Scene)>,
    pub summary: ReplaySummary,
}

/// Frame sources named `frame-001.webp` … for `n` frames.
pub fn numbered_frames(n: usize) -> IntroAssets {
    IntroAssets::new(
        FrameSet::from_sources((1..=n).map(|i| format!("/frames/frame-{i:03}.webp"))),
        FALLBACK_SOURCE,
    )
}

/// Run `steps` against a fresh in-memory page.
///
/// # Errors
///
/// Returns [`SessionError`] if the intro cannot be mounted.
pub fn replay(
    config: IntroConfig,
    assets: IntroAssets,
    steps: &[Step],
    options: &ReplayOptions,
) -> Result<ReplayReport, SessionError> {
    let page = MemoryPage::new().with_overflow(INITIAL_OVERFLOW.0, INITIAL_OVERFLOW.1);
    let lock = ScrollLock::new(page.clone()).with_smooth_scroller(page.clone());
    let mut stage = Stage::new(config, assets, lock.clone(), page.clone())?;

    let mut lines = Vec::new();
    let mut scenes = Vec::new();
    let mut consumed = 0;
    record(&mut lines, 0, stage.drain_events());

    for (i, step) in steps.iter().enumerate() {
        let n = i + 1;
        match step {
            Step::Input(event) => {
                if stage.handle_input(event).is_consumed() {
                    consumed += 1;
                }
            }
            Step::Directive(Directive::Scroll { y }) => page.set_scroll_y(*y),
            Step::Directive(Directive::Probe { ok: true }) => stage.probe_loaded(),
            Step::Directive(Directive::Probe { ok: false }) => stage.probe_failed(),
            Step::Directive(Directive::Wait { ms }) => {
                run_for(&mut stage, Duration::from_millis(*ms), options.frame);
            }
        }
        record(&mut lines, n, stage.drain_events());
        if options.scenes
            && let Some(scene) = stage.scene()
        {
            scenes.push((n, scene));
        }
        tracing::trace!(step = n, visible = stage.is_intro_visible(), "step replayed");
    }

    let session = stage.session();
    let mut summary = ReplaySummary {
        steps: steps.len(),
        mounts: stage.mounts(),
        completions: lines
            .iter()
            .filter(|l| l.event == StageEvent::IntroCompleted)
            .count(),
        consumed,
        visible: stage.is_intro_visible(),
        state: session.map(|s| state_name(s.state()).to_string()),
        progress: session.map(|s| s.controller().progress()),
        watching: stage.is_watching(),
        lock_held: lock.is_held(),
        page_restored: false,
    };

    stage.close();
    record(&mut lines, steps.len() + 1, stage.drain_events());
    summary.page_restored = page.listener_count() == 0
        && !lock.is_held()
        && page.smooth_running()
        && page.current_overflow()
            == OverflowSnapshot {
                root: INITIAL_OVERFLOW.0.into(),
                body: INITIAL_OVERFLOW.1.into(),
            };
    tracing::info!(
        steps = summary.steps,
        completions = summary.completions,
        restored = summary.page_restored,
        "replay finished"
    );

    Ok(ReplayReport {
        lines,
        scenes,
        summary,
    })
}

fn record(lines: &mut Vec<ReplayLine>, step: usize, events: Vec<StageEvent>) {
    lines.extend(events.into_iter().map(|event| ReplayLine { step, event }));
}

fn run_for(stage: &mut Stage<MemoryPage>, total: Duration, frame: Duration) {
    let frame = frame.max(Duration::from_millis(1));
    let mut left = total;
    while !left.is_zero() {
        let dt = left.min(frame);
        stage.advance_time(dt);
        left -= dt;
    }
}

fn state_name(state: CompletionState) -> &'static str {
    match state {
        CompletionState::Active => "active",
        CompletionState::Completing => "completing",
        CompletionState::Completed => "completed",
    }
}
