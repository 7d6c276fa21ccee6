#![forbid(unsafe_code)]

//! In-memory page used by tests and the replay harness.
//!
//! [`MemoryPage`] stands in for the browser document: it owns the root/body
//! overflow styles, the scroll offset, a smooth-scroller run flag and the set
//! of registered listeners. Clones share state, so one clone can be handed
//! to a [`ScrollLock`](curtain_core::scroll_lock::ScrollLock) and another to
//! a session while a test inspects a third.

use std::cell::RefCell;
use std::rc::Rc;

use curtain_core::scroll_lock::{OverflowSnapshot, PageScroll, SmoothScroller};

use crate::{HostError, ListenerHost, ListenerId, ListenerKinds, ListenerOptions};

/// One live listener registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registration {
    pub id: ListenerId,
    pub kinds: ListenerKinds,
    pub options: ListenerOptions,
}

/// Everything observable about the page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageSnapshot {
    pub overflow: OverflowSnapshot,
    pub scroll_y: f64,
    pub smooth_running: bool,
    pub listeners: Vec<Registration>,
}

#[derive(Debug)]
struct PageState {
    overflow: OverflowSnapshot,
    scroll_y: f64,
    smooth_running: bool,
    smooth_stops: u32,
    smooth_starts: u32,
    listeners: Vec<Registration>,
    next_id: u32,
    refuse: ListenerKinds,
}

/// Shared in-memory page.
#[derive(Debug, Clone)]
pub struct MemoryPage {
    state: Rc<RefCell<PageState>>,
}

impl Default for MemoryPage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryPage {
    /// A page at the top with unset overflow and a running smooth scroller.
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(PageState {
                overflow: OverflowSnapshot::default(),
                scroll_y: 0.0,
                smooth_running: true,
                smooth_stops: 0,
                smooth_starts: 0,
                listeners: Vec::new(),
                next_id: 1,
                refuse: ListenerKinds::empty(),
            })),
        }
    }

    #[must_use]
    pub fn with_overflow(self, root: &str, body: &str) -> Self {
        self.state.borrow_mut().overflow = OverflowSnapshot {
            root: root.to_string(),
            body: body.to_string(),
        };
        self
    }

    /// Make registrations covering any of `kinds` fail.
    pub fn refuse_listeners(&self, kinds: ListenerKinds) {
        self.state.borrow_mut().refuse = kinds;
    }

    /// Simulate the user scrolling the page.
    pub fn set_scroll_y(&self, y: f64) {
        self.state.borrow_mut().scroll_y = y;
    }

    pub fn current_scroll_y(&self) -> f64 {
        self.state.borrow().scroll_y
    }

    pub fn current_overflow(&self) -> OverflowSnapshot {
        self.state.borrow().overflow.clone()
    }

    pub fn smooth_running(&self) -> bool {
        self.state.borrow().smooth_running
    }

    /// `(stops, starts)` issued to the smooth scroller.
    pub fn smooth_calls(&self) -> (u32, u32) {
        let state = self.state.borrow();
        (state.smooth_stops, state.smooth_starts)
    }

    /// Union of all registered listener kinds.
    pub fn listening(&self) -> ListenerKinds {
        self.state
            .borrow()
            .listeners
            .iter()
            .fold(ListenerKinds::empty(), |acc, r| acc | r.kinds)
    }

    pub fn listener_count(&self) -> usize {
        self.state.borrow().listeners.len()
    }

    /// Options of the registration covering `kind`, if any.
    pub fn options_for(&self, kind: ListenerKinds) -> Option<ListenerOptions> {
        self.state
            .borrow()
            .listeners
            .iter()
            .find(|r| r.kinds.contains(kind))
            .map(|r| r.options)
    }

    pub fn snapshot(&self) -> PageSnapshot {
        let state = self.state.borrow();
        PageSnapshot {
            overflow: state.overflow.clone(),
            scroll_y: state.scroll_y,
            smooth_running: state.smooth_running,
            listeners: state.listeners.clone(),
        }
    }
}

impl PageScroll for MemoryPage {
    fn overflow(&self) -> OverflowSnapshot {
        self.current_overflow()
    }

    fn set_overflow(&mut self, overflow: &OverflowSnapshot) {
        self.state.borrow_mut().overflow = overflow.clone();
    }

    fn scroll_to_top(&mut self) {
        self.state.borrow_mut().scroll_y = 0.0;
    }

    fn scroll_y(&self) -> f64 {
        self.current_scroll_y()
    }
}

impl SmoothScroller for MemoryPage {
    fn stop(&mut self) {
        let mut state = self.state.borrow_mut();
        state.smooth_running = false;
        state.smooth_stops += 1;
    }

    fn start(&mut self) {
        let mut state = self.state.borrow_mut();
        state.smooth_running = true;
        state.smooth_starts += 1;
    }
}

impl ListenerHost for MemoryPage {
    fn attach(
        &mut self,
        kinds: ListenerKinds,
        options: ListenerOptions,
    ) -> Result<ListenerId, HostError> {
        let mut state = self.state.borrow_mut();
        if state.refuse.intersects(kinds) {
            return Err(HostError::ListenerRegistration(
                kinds.intersection(state.refuse).dom_names().join(","),
            ));
        }
        let id = ListenerId(state.next_id);
        state.next_id += 1;
        state.listeners.push(Registration { id, kinds, options });
        Ok(id)
    }

    fn detach(&mut self, id: ListenerId) {
        self.state.borrow_mut().listeners.retain(|r| r.id != id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn clones_share_state() {
        let page = MemoryPage::new().with_overflow("", "auto");
        let mut other = page.clone();
        other.set_overflow(&OverflowSnapshot::hidden());
        assert!(page.current_overflow().is_hidden());
    }

    #[test]
    fn attach_and_detach() {
        let mut page = MemoryPage::new();
        let id = page
            .attach(ListenerKinds::BLOCKING, ListenerOptions::BLOCKING)
            .unwrap();
        page.attach(ListenerKinds::OBSERVING, ListenerOptions::PASSIVE)
            .unwrap();
        assert_eq!(page.listening(), ListenerKinds::INTRO);
        assert_eq!(
            page.options_for(ListenerKinds::TOUCH_START),
            Some(ListenerOptions::PASSIVE)
        );
        page.detach(id);
        assert_eq!(page.listening(), ListenerKinds::OBSERVING);
    }

    #[test]
    fn refused_registration_reports_kinds() {
        let mut page = MemoryPage::new();
        page.refuse_listeners(ListenerKinds::KEY_DOWN);
        let err = page
            .attach(ListenerKinds::BLOCKING, ListenerOptions::BLOCKING)
            .unwrap_err();
        assert_eq!(err, HostError::ListenerRegistration("keydown".into()));
        assert_eq!(page.listener_count(), 0);
    }

    #[test]
    fn smooth_scroller_counts_calls() {
        let mut page = MemoryPage::new();
        page.stop();
        page.start();
        page.stop();
        assert_eq!(page.smooth_calls(), (2, 1));
        assert!(!page.smooth_running());
    }
}
