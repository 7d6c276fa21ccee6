#![forbid(unsafe_code)]

//! A mounted intro overlay.
//!
//! [`IntroSession`] ties one [`IntroController`] to the page: it holds the
//! scroll lock, owns the listener registrations, forwards input, advances
//! time and drives the presentation.
//!
//! # Lifecycle Guarantees
//!
//! 1. **Mount is all-or-nothing** - if any listener registration fails, the
//!    partially built session is dropped and its teardown releases whatever
//!    was already acquired.
//! 2. **Completion hands control back** - when the controller completes, the
//!    session releases the scroll lock, detaches its listeners and calls the
//!    completion callback, in that order, once.
//! 3. **Teardown is unconditional** - [`IntroSession::unmount`] and `Drop`
//!    cancel the settle timer, stop smoothing, detach every listener and
//!    release the lock, with no early return between the steps.
//!
//! # Teardown Order
//!
//! 1. Halt the controller (cancels the settle timer, freezes the spring)
//! 2. Detach listeners
//! 3. Release the scroll lock (restores overflow, restarts smooth scrolling)

use std::fmt;
use std::time::Duration;

use curtain_core::scroll_lock::{ScrollLock, ScrollLockHandle};
use curtain_core::{
    CompletionState, ConfigError, Disposition, IntroConfig, IntroController, IntroEvent,
    IntroMsg, ScrollLockError,
};

use crate::input::InputEvent;
use crate::presentation::{IntroAssets, Presentation, Scene};
use crate::{DeterministicClock, HostError, ListenerHost, ListenerId, ListenerKinds, ListenerOptions};

/// Failure to mount or re-activate a session.
#[derive(Debug)]
pub enum SessionError {
    Config(ConfigError),
    ScrollLock(ScrollLockError),
    Host(HostError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(err) => write!(f, "intro config: {err}"),
            Self::ScrollLock(err) => write!(f, "intro mount: {err}"),
            Self::Host(err) => write!(f, "intro mount: {err}"),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::ScrollLock(err) => Some(err),
            Self::Host(err) => Some(err),
        }
    }
}

impl From<ConfigError> for SessionError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

impl From<ScrollLockError> for SessionError {
    fn from(err: ScrollLockError) -> Self {
        Self::ScrollLock(err)
    }
}

impl From<HostError> for SessionError {
    fn from(err: HostError) -> Self {
        Self::Host(err)
    }
}

/// A mounted intro.
pub struct IntroSession {
    controller: IntroController,
    presentation: Presentation,
    lock: ScrollLock,
    handle: Option<ScrollLockHandle>,
    host: Box<dyn ListenerHost>,
    listeners: Vec<(ListenerId, ListenerKinds)>,
    clock: DeterministicClock,
    on_complete: Option<Box<dyn FnMut()>>,
    /// Completions seen before a callback was registered.
    unreported: u32,
    events: Vec<IntroEvent>,
    mounted: bool,
}

impl fmt::Debug for IntroSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntroSession")
            .field("state", &self.controller.state())
            .field("progress", &self.controller.progress())
            .field("variant", &self.presentation.variant())
            .field("lock_held", &self.handle.is_some())
            .field("listening", &self.listening())
            .field("mounted", &self.mounted)
            .finish()
    }
}

impl IntroSession {
    /// Mount an intro: build the controller, take the scroll lock and
    /// register listeners.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if the configuration is invalid, the lock is
    /// already held, or the host refuses a listener. Nothing stays acquired
    /// on error.
    pub fn mount(
        config: IntroConfig,
        assets: &IntroAssets,
        lock: &ScrollLock,
        host: impl ListenerHost + 'static,
    ) -> Result<Self, SessionError> {
        let controller = IntroController::new(config)?;
        let presentation = Presentation::for_config(controller.config(), assets, &controller.view());
        let handle = lock.acquire()?;
        let mut session = Self {
            controller,
            presentation,
            lock: lock.clone(),
            handle: Some(handle),
            host: Box::new(host),
            listeners: Vec::new(),
            clock: DeterministicClock::new(),
            on_complete: None,
            unreported: 0,
            events: Vec::new(),
            mounted: true,
        };
        session.attach_listeners()?;
        session.pump();
        tracing::info!(
            variant = session.presentation.variant().as_str(),
            progress = session.controller.progress(),
            "intro mounted"
        );
        Ok(session)
    }

    /// Callback invoked once per completion.
    ///
    /// An intro mounted at the end with no settle delay completes inside
    /// [`mount`](Self::mount); the callback runs for it on registration.
    #[must_use]
    pub fn on_complete(mut self, f: impl FnMut() + 'static) -> Self {
        let mut f: Box<dyn FnMut()> = Box::new(f);
        for _ in 0..std::mem::take(&mut self.unreported) {
            f();
        }
        self.on_complete = Some(f);
        self
    }

    pub fn controller(&self) -> &IntroController {
        &self.controller
    }

    pub fn presentation(&self) -> &Presentation {
        &self.presentation
    }

    pub fn scene(&self) -> Scene {
        self.presentation.scene()
    }

    /// Overlay status line (phase label, loading text or hint).
    pub fn status_text(&self) -> &str {
        self.presentation.status_text(&self.controller.view())
    }

    pub fn state(&self) -> CompletionState {
        self.controller.state()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn is_completed(&self) -> bool {
        self.controller.is_completed()
    }

    pub fn holds_lock(&self) -> bool {
        self.handle.is_some()
    }

    pub fn listening(&self) -> ListenerKinds {
        self.listeners
            .iter()
            .fold(ListenerKinds::empty(), |acc, (_, kinds)| acc | *kinds)
    }

    /// Host time elapsed since mount.
    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    /// Whether the host should keep requesting animation frames.
    pub fn wants_frames(&self) -> bool {
        self.mounted
            && (self.controller.is_animating()
                || self.controller.pending_settle().is_some()
                || matches!(
                    self.presentation,
                    Presentation::StaticFrame(ref adapter) if adapter.is_fading_out()
                ))
    }

    /// Handle one host input record.
    ///
    /// DOM events are only accepted for kinds this session is listening to;
    /// the returned disposition tells the host whether to `preventDefault`.
    pub fn handle_input(&mut self, event: &InputEvent) -> Disposition {
        match event {
            InputEvent::Tick { ms } => {
                self.advance_time(Duration::from_millis(*ms));
                Disposition::Ignored
            }
            InputEvent::Reenter => match self.reenter() {
                Ok(true) => Disposition::Consumed,
                Ok(false) => Disposition::Ignored,
                Err(err) => {
                    tracing::warn!(error = %err, "re-entry failed");
                    Disposition::Ignored
                }
            },
            _ => {
                let listening = self.listening();
                let delivered = event
                    .listener_kind()
                    .is_some_and(|kind| listening.contains(kind));
                if !delivered {
                    return Disposition::Ignored;
                }
                let disposition = self.controller.dispatch(event.to_msg());
                self.pump();
                disposition
            }
        }
    }

    /// Advance host time by one animation frame.
    pub fn advance_time(&mut self, dt: Duration) {
        if !self.mounted {
            return;
        }
        self.clock.advance(dt);
        self.controller.dispatch(IntroMsg::Frame(dt));
        self.presentation.tick(dt);
        if let Some(handle) = &self.handle {
            handle.pin_to_top();
        }
        self.pump();
    }

    /// The first frame of the sequence loaded.
    pub fn probe_loaded(&mut self) {
        if let Some(adapter) = self.presentation.as_image_sequence_mut()
            && adapter.probe_loaded()
        {
            self.controller.set_frame_count(self.presentation.frame_count());
            self.pump();
        }
    }

    /// The first frame of the sequence failed to load.
    pub fn probe_failed(&mut self) {
        if let Some(adapter) = self.presentation.as_image_sequence_mut()
            && adapter.probe_failed()
        {
            self.controller.set_frame_count(None);
            self.pump();
        }
    }

    /// Re-enter a completed, reversible intro in place: retake the lock,
    /// re-register listeners and restore progress just short of the end.
    ///
    /// Returns `Ok(false)` if the intro cannot be re-entered.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if the lock or listeners cannot be retaken;
    /// the controller stays completed in that case.
    pub fn reenter(&mut self) -> Result<bool, SessionError> {
        if !self.mounted || !self.controller.config().reversible || !self.is_completed() {
            return Ok(false);
        }
        if self.handle.is_none() {
            self.handle = Some(self.lock.acquire()?);
        }
        if let Err(err) = self.attach_listeners() {
            self.release_page();
            return Err(err);
        }
        let reentered = self.controller.reenter();
        self.pump();
        Ok(reentered)
    }

    /// Take the transition events observed since the last call.
    pub fn drain_events(&mut self) -> Vec<IntroEvent> {
        std::mem::take(&mut self.events)
    }

    /// Tear the overlay down. Safe to call more than once.
    pub fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        self.mounted = false;
        self.controller.halt();
        self.release_page();
        tracing::info!(
            state = ?self.controller.state(),
            progress = self.controller.progress(),
            "intro unmounted"
        );
    }

    fn attach_listeners(&mut self) -> Result<(), SessionError> {
        let blocking = self
            .host
            .attach(ListenerKinds::BLOCKING, ListenerOptions::BLOCKING)?;
        self.listeners.push((blocking, ListenerKinds::BLOCKING));
        let observing = self
            .host
            .attach(ListenerKinds::OBSERVING, ListenerOptions::PASSIVE)?;
        self.listeners.push((observing, ListenerKinds::OBSERVING));
        tracing::debug!(kinds = ?self.listening(), "intro listeners attached");
        Ok(())
    }

    /// Detach listeners and release the lock.
    fn release_page(&mut self) {
        for (id, _) in self.listeners.drain(..) {
            self.host.detach(id);
        }
        if let Some(handle) = self.handle.take() {
            handle.release();
        }
    }

    /// Forward controller events to the presentation and react to completion.
    fn pump(&mut self) {
        let events = self.controller.drain_events();
        let view = self.controller.view();
        for event in &events {
            self.presentation.on_event(event);
        }
        self.presentation.sync(&view);
        if events.contains(&IntroEvent::Completed) {
            self.release_page();
            match self.on_complete.as_mut() {
                Some(callback) => callback(),
                None => self.unreported += 1,
            }
        }
        self.events.extend(events);
    }
}

impl Drop for IntroSession {
    fn drop(&mut self) {
        self.unmount();
        // A session dropped mid-mount (failed listener registration) is
        // unmounted already but may still hold page resources.
        self.release_page();
    }
}
