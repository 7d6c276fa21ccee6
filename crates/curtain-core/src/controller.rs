#![forbid(unsafe_code)]

//! The intro state machine.
//!
//! [`IntroController`] owns the raw progress, the optional smoothing spring and
//! the completion state. Hosts feed it [`IntroMsg`]s and advance time
//! explicitly; it queues [`IntroEvent`]s for the host to drain.
//!
//! # States
//!
//! ```text
//!            criterion met               settle delay elapsed
//!   Active ───────────────▶ Completing ───────────────────────▶ Completed
//!     ▲                        │                                   │
//!     └──── criterion lost ────┘                                   │
//!     └───────────────── re-entry (reversible only) ───────────────┘
//! ```
//!
//! The completion criterion is "fade opacity reached 1" when a frame sequence
//! is attached and "sampled progress reached 1" otherwise.
//!
//! # Invariants
//!
//! 1. Raw progress stays in [0, 1].
//! 2. `Completed` is emitted at most once per `Active → Completed` traversal.
//! 3. A settle timer armed before the criterion was lost never completes the
//!    intro; every cancellation bumps the timer generation, so an old
//!    [`SettleToken`] is rejected.
//! 4. The spring only reads raw progress.
//! 5. A controller started at the end does not arm until the criterion has
//!    been observed false once.
//! 6. After [`halt`](IntroController::halt) no input, frame or timer changes
//!    state.

use std::time::Duration;

use crate::accumulator::ProgressAccumulator;
use crate::animation::Animation;
use crate::animation::spring::Spring;
use crate::config::IntroConfig;
use crate::error::ConfigError;
use crate::event::{Disposition, InputSource, IntroEvent, IntroMsg};
use crate::frames::{FrameSample, FrameTracker, FrameWindow};
use crate::phase::PhaseBand;

/// Completion state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompletionState {
    /// Taking input; criterion not met (or arming disabled).
    Active,
    /// Criterion met; settle timer running.
    Completing,
    /// Completion fired.
    Completed,
}

/// Identifies one arming of the settle timer.
///
/// Hosts that schedule the timer themselves (e.g. with `setTimeout`) hold the
/// token and pass it back to [`IntroController::fire_settle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SettleToken(u64);

#[derive(Debug, Clone, Copy, Default)]
struct SettleTimer {
    generation: u64,
    remaining: Option<Duration>,
}

impl SettleTimer {
    fn arm(&mut self, delay: Duration) -> SettleToken {
        self.generation += 1;
        self.remaining = Some(delay);
        SettleToken(self.generation)
    }

    fn cancel(&mut self) -> bool {
        self.generation += 1;
        self.remaining.take().is_some()
    }

    fn token(&self) -> Option<SettleToken> {
        self.remaining.map(|_| SettleToken(self.generation))
    }

    /// Count down; returns true once the delay has fully elapsed.
    fn tick(&mut self, dt: Duration) -> bool {
        match self.remaining {
            Some(left) if left <= dt => {
                self.remaining = None;
                true
            }
            Some(left) => {
                self.remaining = Some(left - dt);
                false
            }
            None => false,
        }
    }
}

/// Snapshot of everything a presentation needs for one render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntroView<'a> {
    /// Raw accumulated progress.
    pub progress: f32,
    /// Progress used for derivation (spring output when smoothing is on).
    pub sampled: f32,
    pub phase_index: usize,
    pub phase: &'a PhaseBand,
    /// `None` without a frame sequence.
    pub frame: Option<FrameSample>,
    pub state: CompletionState,
    /// Whether the overlay should be on screen.
    pub visible: bool,
}

/// Scroll-progress intro controller.
#[derive(Debug, Clone)]
pub struct IntroController {
    config: IntroConfig,
    accumulator: ProgressAccumulator,
    spring: Option<Spring>,
    frames: Option<FrameWindow>,
    tracker: FrameTracker,
    phase: usize,
    fade: f32,
    state: CompletionState,
    allow_complete: bool,
    timer: SettleTimer,
    completions: u32,
    halted: bool,
    events: Vec<IntroEvent>,
}

impl IntroController {
    /// Create a controller with no frame sequence attached.
    pub fn new(config: IntroConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let start = config.starting_progress();
        let accumulator = ProgressAccumulator::new(config.sensitivity(), start);
        let start = accumulator.progress();
        let spring = config.smoothing.map(|cfg| Spring::new(cfg, start));
        let phase = config.phases.index_of(start);
        crate::debug!(
            variant = config.variant.as_str(),
            progress = start,
            start_at_end = config.start_at_end,
            "intro controller created"
        );
        let mut controller = Self {
            allow_complete: !config.start_at_end,
            accumulator,
            spring,
            frames: None,
            tracker: FrameTracker::default(),
            phase,
            fade: 0.0,
            state: CompletionState::Active,
            timer: SettleTimer::default(),
            completions: 0,
            halted: false,
            events: Vec::new(),
            config,
        };
        // A controller built at the end arms right away unless `start_at_end`.
        controller.refresh();
        Ok(controller)
    }

    /// Attach (or detach with `None`/`Some(0)`) a frame sequence.
    ///
    /// The frame tracker restarts at the current index without emitting a
    /// `FrameChanged`, so attaching frames does not count as a render change.
    pub fn set_frame_count(&mut self, frame_count: Option<usize>) {
        self.frames = frame_count.and_then(|n| FrameWindow::new(n, self.config.fade_lead_frames));
        let sampled = self.sampled_progress();
        match self.frames {
            Some(window) => {
                let sample = window.sample(sampled);
                self.tracker = FrameTracker::starting_at(sample.index);
                self.fade = sample.opacity;
            }
            None => {
                self.tracker.reset();
                self.fade = 0.0;
            }
        }
        crate::debug!(frames = ?frame_count, "frame sequence attached");
        self.refresh();
    }

    pub fn config(&self) -> &IntroConfig {
        &self.config
    }

    /// Raw accumulated progress.
    pub fn progress(&self) -> f32 {
        self.accumulator.progress()
    }

    /// Progress sampled for derivation.
    pub fn sampled_progress(&self) -> f32 {
        match &self.spring {
            Some(spring) => spring.value(),
            None => self.accumulator.progress(),
        }
    }

    pub fn state(&self) -> CompletionState {
        self.state
    }

    pub fn is_completed(&self) -> bool {
        self.state == CompletionState::Completed
    }

    /// Number of completions fired over the controller's lifetime.
    pub fn completions(&self) -> u32 {
        self.completions
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Whether input currently has no effect on progress.
    pub fn is_inert(&self) -> bool {
        self.halted || self.accumulator.is_inert()
    }

    /// Whether the smoothing spring is still moving.
    pub fn is_animating(&self) -> bool {
        !self.halted && self.spring.as_ref().is_some_and(|s| !s.is_complete())
    }

    /// Current settle timer, if armed.
    pub fn pending_settle(&self) -> Option<SettleToken> {
        self.timer.token()
    }

    /// Time left on the settle timer.
    pub fn settle_remaining(&self) -> Option<Duration> {
        self.timer.remaining
    }

    pub fn view(&self) -> IntroView<'_> {
        let sampled = self.sampled_progress();
        let phase = self.config.phases.band_for(sampled);
        IntroView {
            progress: self.progress(),
            sampled,
            phase_index: self.phase,
            phase,
            frame: self.frames.map(|w| w.sample(sampled)),
            state: self.state,
            visible: self.state != CompletionState::Completed,
        }
    }

    /// Take the queued transition events.
    pub fn drain_events(&mut self) -> Vec<IntroEvent> {
        std::mem::take(&mut self.events)
    }

    /// Feed one message into the state machine.
    ///
    /// Returns whether the host should suppress the input's default action.
    pub fn dispatch(&mut self, msg: IntroMsg) -> Disposition {
        if self.halted {
            return Disposition::Ignored;
        }
        match msg {
            IntroMsg::Delta { value, source } => {
                self.accumulator.apply_delta(value, source);
                self.after_input();
                Disposition::Consumed
            }
            IntroMsg::Wheel { delta_y } => {
                self.accumulator.apply_delta(delta_y, InputSource::Wheel);
                self.after_input();
                Disposition::Consumed
            }
            IntroMsg::TouchStart { y } => {
                self.accumulator.touch_start(y);
                Disposition::Ignored
            }
            IntroMsg::TouchMove { y } => {
                self.accumulator.touch_move(y);
                self.after_input();
                Disposition::Consumed
            }
            IntroMsg::TouchEnd => {
                self.accumulator.touch_end();
                Disposition::Ignored
            }
            IntroMsg::Key(key) => {
                if self.accumulator.key(key) {
                    self.after_input();
                    Disposition::Consumed
                } else {
                    Disposition::Ignored
                }
            }
            IntroMsg::Frame(dt) => {
                self.advance(dt);
                Disposition::Ignored
            }
            IntroMsg::Reenter => {
                if self.reenter() {
                    Disposition::Consumed
                } else {
                    Disposition::Ignored
                }
            }
        }
    }

    /// Advance time by `dt`: one smoothing step, then the settle timer.
    ///
    /// A timer armed during this call starts counting on the next one.
    pub fn advance(&mut self, dt: Duration) {
        if self.halted {
            return;
        }
        let was_pending = self.timer.remaining.is_some();
        if let Some(spring) = self.spring.as_mut()
            && !spring.is_complete()
        {
            spring.tick(dt);
            crate::trace!(sampled = spring.value(), "spring step");
            self.refresh();
        }
        if was_pending && self.timer.remaining.is_some() && self.timer.tick(dt) {
            self.fire_completion();
        }
    }

    /// Deliver an externally scheduled settle timeout.
    ///
    /// Returns whether the token was current and completion fired.
    pub fn fire_settle(&mut self, token: SettleToken) -> bool {
        if self.halted || self.timer.token() != Some(token) {
            crate::warn!(token = token.0, "ignoring stale settle timer");
            return false;
        }
        self.timer.remaining = None;
        self.fire_completion()
    }

    /// Re-enter a completed, reversible intro just short of the end.
    ///
    /// Returns false (and does nothing) when the intro is not reversible or
    /// not completed.
    pub fn reenter(&mut self) -> bool {
        if self.halted || !self.config.reversible || self.state != CompletionState::Completed {
            return false;
        }
        let progress = self.config.reentry_progress;
        self.accumulator.set_progress(progress);
        self.accumulator.set_inert(false);
        self.accumulator.touch_end();
        if let Some(spring) = self.spring.as_mut() {
            spring.snap_to(progress);
        }
        self.state = CompletionState::Active;
        self.allow_complete = false;
        self.events.push(IntroEvent::Reentered);
        crate::debug!(progress, "intro re-entered");
        self.refresh();
        true
    }

    /// Cancel a pending settle timer without touching progress.
    pub fn cancel_pending(&mut self) {
        if self.timer.cancel() {
            crate::debug!("settle timer cancelled");
            if self.state == CompletionState::Completing {
                self.state = CompletionState::Active;
                self.events.push(IntroEvent::CompletionCancelled);
            }
        }
    }

    /// Stop the controller for good: cancel the timer, freeze smoothing and
    /// drop all further input.
    pub fn halt(&mut self) {
        if self.halted {
            return;
        }
        self.cancel_pending();
        if let Some(spring) = self.spring.as_mut() {
            let at = spring.value();
            spring.snap_to(at);
        }
        self.accumulator.touch_end();
        self.accumulator.set_inert(true);
        self.halted = true;
        crate::debug!(state = ?self.state, "intro controller halted");
    }

    fn after_input(&mut self) {
        let progress = self.accumulator.progress();
        if let Some(spring) = self.spring.as_mut() {
            spring.set_target(progress);
        }
        self.refresh();
    }

    /// Re-derive phase, frame and fade from the sampled progress and update
    /// the completion state.
    fn refresh(&mut self) {
        let sampled = self.sampled_progress();

        let phase = self.config.phases.index_of(sampled);
        if phase != self.phase {
            crate::debug!(from = self.phase, to = phase, "phase changed");
            self.events.push(IntroEvent::PhaseChanged {
                from: self.phase,
                to: phase,
            });
            self.phase = phase;
        }

        let criterion = match self.frames {
            Some(window) => {
                let sample = window.sample(sampled);
                if let Some(index) = self.tracker.update(sample.index) {
                    self.events.push(IntroEvent::FrameChanged { index });
                }
                if sample.opacity != self.fade {
                    self.fade = sample.opacity;
                    self.events.push(IntroEvent::FadeChanged {
                        opacity: sample.opacity,
                    });
                }
                sample.opacity >= 1.0
            }
            None => sampled >= 1.0,
        };

        if !criterion {
            self.allow_complete = true;
        }

        match self.state {
            CompletionState::Active if criterion && self.allow_complete => self.arm(),
            CompletionState::Completing if !criterion => self.cancel_pending(),
            _ => {}
        }
    }

    fn arm(&mut self) {
        let delay = self.config.settle_delay_duration();
        self.state = CompletionState::Completing;
        self.events.push(IntroEvent::CompletionArmed);
        if delay.is_zero() {
            crate::debug!("completion criterion met, completing immediately");
            self.fire_completion();
        } else {
            let _token = self.timer.arm(delay);
            crate::debug!(delay_ms = self.config.settle_delay_ms, "completion armed");
        }
    }

    fn fire_completion(&mut self) -> bool {
        if self.state != CompletionState::Completing {
            return false;
        }
        self.state = CompletionState::Completed;
        self.completions += 1;
        if !self.config.reversible {
            self.accumulator.set_inert(true);
        }
        self.events.push(IntroEvent::Completed);
        crate::info!(completions = self.completions, "intro completed");
        true
    }
}
