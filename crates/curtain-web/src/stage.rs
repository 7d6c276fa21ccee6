#![forbid(unsafe_code)]

//! The host page around the intro.
//!
//! A [`Stage`] shows the intro on load, hides it once it completes and, for
//! reversible intros, watches the page for an upward scroll at the very top.
//! When that happens the intro is mounted again just short of its end, so the
//! user can scrub back through it.
//!
//! While the intro is hidden the stage owns one passive registration for
//! [`ListenerKinds::REENTRY`]; while it is shown the session owns its own
//! listeners and the scroll lock.

use std::time::Duration;

use curtain_core::scroll_lock::ScrollLock;
use curtain_core::{Disposition, IntroConfig, IntroEvent};
use serde::Serialize;

use crate::input::InputEvent;
use crate::presentation::{IntroAssets, Scene};
use crate::reentry::ReentryWatcher;
use crate::session::{IntroSession, SessionError};
use crate::{ListenerHost, ListenerId, ListenerKinds, ListenerOptions};

/// Page-level transition.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StageEvent {
    /// An intro overlay was mounted.
    IntroMounted { progress: f32 },
    /// The mounted intro completed.
    IntroCompleted,
    /// The overlay was removed from the page.
    IntroUnmounted,
    /// Scrolling up at the top of the page asked for the intro again.
    ReentryTriggered,
    /// Transition inside the mounted intro.
    Intro(IntroEvent),
}

/// Host page that mounts, hides and re-mounts the intro.
pub struct Stage<H: ListenerHost> {
    config: IntroConfig,
    assets: IntroAssets,
    lock: ScrollLock,
    host: H,
    session: Option<IntroSession>,
    watcher: ReentryWatcher,
    watch: Option<ListenerId>,
    events: Vec<StageEvent>,
    mounts: u32,
}

impl<H: ListenerHost> std::fmt::Debug for Stage<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stage")
            .field("session", &self.session)
            .field("watching", &self.watch.is_some())
            .field("mounts", &self.mounts)
            .finish()
    }
}

impl<H: ListenerHost + Clone + 'static> Stage<H> {
    /// Mount the intro for `config`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if the first mount fails.
    pub fn new(
        config: IntroConfig,
        assets: IntroAssets,
        lock: ScrollLock,
        host: H,
    ) -> Result<Self, SessionError> {
        let mut stage = Self {
            config,
            assets,
            lock,
            host,
            session: None,
            watcher: ReentryWatcher::new(),
            watch: None,
            events: Vec::new(),
            mounts: 0,
        };
        let config = stage.config.clone();
        stage.mount(config)?;
        Ok(stage)
    }

    pub fn is_intro_visible(&self) -> bool {
        self.session.is_some()
    }

    /// Whether the stage is watching for re-entry.
    pub fn is_watching(&self) -> bool {
        self.watch.is_some()
    }

    /// Number of times an intro has been mounted.
    pub fn mounts(&self) -> u32 {
        self.mounts
    }

    pub fn session(&self) -> Option<&IntroSession> {
        self.session.as_ref()
    }

    pub fn scene(&self) -> Option<Scene> {
        self.session.as_ref().map(IntroSession::scene)
    }

    /// Route one host input record to the intro or the re-entry watcher.
    pub fn handle_input(&mut self, event: &InputEvent) -> Disposition {
        if let Some(session) = self.session.as_mut() {
            let disposition = session.handle_input(event);
            self.collect();
            return disposition;
        }
        if self.watch.is_none() {
            return Disposition::Ignored;
        }
        let triggered = match event {
            InputEvent::Tick { .. } => false,
            InputEvent::Reenter => true,
            _ => {
                let watched = event
                    .listener_kind()
                    .is_some_and(|kind| ListenerKinds::REENTRY.contains(kind));
                watched && self.watcher.observe(event, self.lock.scroll_y())
            }
        };
        if triggered {
            self.reenter();
        }
        // Watch listeners are passive; the page keeps its scroll.
        Disposition::Ignored
    }

    fn reenter(&mut self) {
        self.events.push(StageEvent::ReentryTriggered);
        tracing::info!("re-entering intro from page top");
        self.stop_watching();
        let config = self.config.reentering();
        if let Err(err) = self.mount(config) {
            tracing::warn!(error = %err, "intro re-entry mount failed");
            self.start_watching();
        }
    }

    /// Advance host time by one animation frame.
    pub fn advance_time(&mut self, dt: Duration) {
        if let Some(session) = self.session.as_mut() {
            session.advance_time(dt);
            self.collect();
        }
    }

    /// Forward a first-frame probe result to the mounted intro.
    pub fn probe_loaded(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.probe_loaded();
            self.collect();
        }
    }

    pub fn probe_failed(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.probe_failed();
            self.collect();
        }
    }

    /// Take the transitions observed since the last call.
    pub fn drain_events(&mut self) -> Vec<StageEvent> {
        std::mem::take(&mut self.events)
    }

    /// Remove the intro and stop watching. Safe to call more than once.
    pub fn close(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.unmount();
            self.events.push(StageEvent::IntroUnmounted);
        }
        self.stop_watching();
    }

    fn mount(&mut self, config: IntroConfig) -> Result<(), SessionError> {
        let session = IntroSession::mount(config, &self.assets, &self.lock, self.host.clone())?;
        self.mounts += 1;
        self.events.push(StageEvent::IntroMounted {
            progress: session.controller().progress(),
        });
        self.session = Some(session);
        self.collect();
        Ok(())
    }

    /// Pull session events and hide the intro once it completes.
    fn collect(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let events = session.drain_events();
        let completed = events.contains(&IntroEvent::Completed);
        self.events.extend(events.into_iter().map(StageEvent::Intro));
        if !completed {
            return;
        }
        self.events.push(StageEvent::IntroCompleted);
        if let Some(mut session) = self.session.take() {
            session.unmount();
        }
        self.events.push(StageEvent::IntroUnmounted);
        if self.config.reversible {
            self.start_watching();
        }
    }

    fn start_watching(&mut self) {
        if self.watch.is_some() {
            return;
        }
        self.watcher.reset();
        match self
            .host
            .attach(ListenerKinds::REENTRY, ListenerOptions::PASSIVE)
        {
            Ok(id) => self.watch = Some(id),
            Err(err) => tracing::warn!(error = %err, "re-entry watch unavailable"),
        }
    }

    fn stop_watching(&mut self) {
        if let Some(id) = self.watch.take() {
            self.host.detach(id);
        }
        self.watcher.reset();
    }
}

impl<H: ListenerHost> Drop for Stage<H> {
    fn drop(&mut self) {
        // The session tears itself down; only the watch registration is ours.
        if let Some(id) = self.watch.take() {
            self.host.detach(id);
        }
    }
}
