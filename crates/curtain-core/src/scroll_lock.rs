#![forbid(unsafe_code)]

//! Scoped page scroll lock.
//!
//! While the intro owns input, the page behind it must not scroll. A
//! [`ScrollLock`] wraps the page's scroll surface and its smooth-scrolling
//! library; [`ScrollLock::acquire`] hands out at most one
//! [`ScrollLockHandle`] at a time.
//!
//! # Lifecycle Guarantees
//!
//! 1. **One holder** - acquiring while a handle is alive fails with
//!    [`ScrollLockError::AlreadyHeld`].
//! 2. **Saved policy is restored** - the overflow values present at acquire
//!    time are written back on release, whatever they were.
//! 3. **Release happens once** - [`ScrollLockHandle::release`] and `Drop`
//!    share one cleanup path guarded by a flag.
//! 4. **No leaked lock on any exit path** - a handle dropped by `?` or a
//!    panic during setup still restores the page.
//!
//! # Acquire / Release Order
//!
//! | Step | Acquire | Release |
//! |------|---------|---------|
//! | 1 | save overflow | restore overflow |
//! | 2 | set overflow `hidden` | restart smooth scroller |
//! | 3 | stop smooth scroller | |
//! | 4 | scroll to top | |

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::error::ScrollLockError;

/// Overflow style of the document root and body (`""` means unset).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverflowSnapshot {
    pub root: String,
    pub body: String,
}

impl OverflowSnapshot {
    pub fn hidden() -> Self {
        Self {
            root: "hidden".into(),
            body: "hidden".into(),
        }
    }

    pub fn is_hidden(&self) -> bool {
        self.root == "hidden" && self.body == "hidden"
    }
}

/// The page's native scroll surface.
pub trait PageScroll {
    fn overflow(&self) -> OverflowSnapshot;
    fn set_overflow(&mut self, overflow: &OverflowSnapshot);
    fn scroll_to_top(&mut self);
    /// Current vertical scroll offset in CSS pixels.
    fn scroll_y(&self) -> f64;
}

/// An inertial scrolling library layered over the page.
pub trait SmoothScroller {
    fn stop(&mut self);
    fn start(&mut self);
}

struct LockState {
    page: Box<dyn PageScroll>,
    scroller: Option<Box<dyn SmoothScroller>>,
    held: bool,
}

/// Shared owner of the page scroll surface.
///
/// Clones refer to the same page; the single-holder rule spans all clones.
#[derive(Clone)]
pub struct ScrollLock {
    inner: Rc<RefCell<LockState>>,
}

impl fmt::Debug for ScrollLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.borrow();
        f.debug_struct("ScrollLock")
            .field("held", &state.held)
            .field("smooth_scroller", &state.scroller.is_some())
            .finish()
    }
}

impl ScrollLock {
    pub fn new(page: impl PageScroll + 'static) -> Self {
        Self {
            inner: Rc::new(RefCell::new(LockState {
                page: Box::new(page),
                scroller: None,
                held: false,
            })),
        }
    }

    #[must_use]
    pub fn with_smooth_scroller(self, scroller: impl SmoothScroller + 'static) -> Self {
        self.inner.borrow_mut().scroller = Some(Box::new(scroller));
        self
    }

    pub fn is_held(&self) -> bool {
        self.inner.borrow().held
    }

    pub fn scroll_y(&self) -> f64 {
        self.inner.borrow().page.scroll_y()
    }

    /// Lock page scrolling.
    ///
    /// # Errors
    ///
    /// Returns [`ScrollLockError::AlreadyHeld`] if another handle is alive.
    pub fn acquire(&self) -> Result<ScrollLockHandle, ScrollLockError> {
        let mut state = self.inner.borrow_mut();
        if state.held {
            crate::warn!("scroll lock already held");
            return Err(ScrollLockError::AlreadyHeld);
        }
        let saved = state.page.overflow();
        state.page.set_overflow(&OverflowSnapshot::hidden());
        if let Some(scroller) = state.scroller.as_mut() {
            scroller.stop();
        }
        state.page.scroll_to_top();
        state.held = true;
        crate::info!(
            root = saved.root.as_str(),
            body = saved.body.as_str(),
            "scroll lock acquired"
        );
        Ok(ScrollLockHandle {
            lock: Rc::clone(&self.inner),
            saved,
            released: false,
        })
    }
}

/// Proof of holding the scroll lock. Releases on drop.
pub struct ScrollLockHandle {
    lock: Rc<RefCell<LockState>>,
    saved: OverflowSnapshot,
    released: bool,
}

impl fmt::Debug for ScrollLockHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScrollLockHandle")
            .field("saved", &self.saved)
            .field("released", &self.released)
            .finish()
    }
}

impl ScrollLockHandle {
    /// Overflow values that will be restored on release.
    pub fn saved(&self) -> &OverflowSnapshot {
        &self.saved
    }

    /// Force the page back to the top if something scrolled it.
    pub fn pin_to_top(&self) {
        if self.released {
            return;
        }
        let mut state = self.lock.borrow_mut();
        if state.page.scroll_y() != 0.0 {
            state.page.scroll_to_top();
        }
    }

    /// Release now instead of on drop.
    pub fn release(mut self) {
        self.cleanup();
    }

    fn cleanup(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        let mut state = self.lock.borrow_mut();
        state.page.set_overflow(&self.saved);
        if let Some(scroller) = state.scroller.as_mut() {
            scroller.start();
        }
        state.held = false;
        crate::info!("scroll lock released");
    }
}

impl Drop for ScrollLockHandle {
    fn drop(&mut self) {
        self.cleanup();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Log {
        overflow: OverflowSnapshot,
        scroll_y: f64,
        smooth_running: bool,
        calls: Vec<&'static str>,
    }

    #[derive(Clone, Default)]
    struct FakePage(Rc<RefCell<Log>>);

    impl PageScroll for FakePage {
        fn overflow(&self) -> OverflowSnapshot {
            self.0.borrow().overflow.clone()
        }
        fn set_overflow(&mut self, overflow: &OverflowSnapshot) {
            let mut log = self.0.borrow_mut();
            log.overflow = overflow.clone();
            log.calls.push("set_overflow");
        }
        fn scroll_to_top(&mut self) {
            let mut log = self.0.borrow_mut();
            log.scroll_y = 0.0;
            log.calls.push("scroll_to_top");
        }
        fn scroll_y(&self) -> f64 {
            self.0.borrow().scroll_y
        }
    }

    impl SmoothScroller for FakePage {
        fn stop(&mut self) {
            let mut log = self.0.borrow_mut();
            log.smooth_running = false;
            log.calls.push("stop");
        }
        fn start(&mut self) {
            let mut log = self.0.borrow_mut();
            log.smooth_running = true;
            log.calls.push("start");
        }
    }

    fn page(root: &str, body: &str) -> FakePage {
        let page = FakePage::default();
        {
            let mut log = page.0.borrow_mut();
            log.overflow = OverflowSnapshot {
                root: root.into(),
                body: body.into(),
            };
            log.scroll_y = 120.0;
            log.smooth_running = true;
        }
        page
    }

    #[test]
    fn acquire_hides_stops_and_scrolls_top() {
        let fake = page("", "auto");
        let lock = ScrollLock::new(fake.clone()).with_smooth_scroller(fake.clone());
        let handle = lock.acquire().unwrap();
        {
            let log = fake.0.borrow();
            assert!(log.overflow.is_hidden());
            assert!(!log.smooth_running);
            assert_eq!(log.scroll_y, 0.0);
            assert_eq!(log.calls, ["set_overflow", "stop", "scroll_to_top"]);
        }
        assert_eq!(handle.saved().body, "auto");
        assert!(lock.is_held());
    }

    #[test]
    fn drop_restores_previous_policy() {
        let fake = page("scroll", "");
        let lock = ScrollLock::new(fake.clone()).with_smooth_scroller(fake.clone());
        drop(lock.acquire().unwrap());
        let log = fake.0.borrow();
        assert_eq!(
            log.overflow,
            OverflowSnapshot {
                root: "scroll".into(),
                body: String::new()
            }
        );
        assert!(log.smooth_running);
        assert!(!lock.is_held());
    }

    #[test]
    fn single_holder() {
        let fake = page("", "");
        let lock = ScrollLock::new(fake);
        let other = lock.clone();
        let handle = lock.acquire().unwrap();
        assert_eq!(other.acquire().unwrap_err(), ScrollLockError::AlreadyHeld);
        handle.release();
        assert!(other.acquire().is_ok());
    }

    #[test]
    fn explicit_release_runs_cleanup_once() {
        let fake = page("", "");
        let lock = ScrollLock::new(fake.clone()).with_smooth_scroller(fake.clone());
        lock.acquire().unwrap().release();
        let starts = fake.0.borrow().calls.iter().filter(|c| **c == "start").count();
        assert_eq!(starts, 1);
    }

    #[test]
    fn early_return_releases() {
        fn setup(lock: &ScrollLock) -> Result<ScrollLockHandle, &'static str> {
            let _handle = lock.acquire().map_err(|_| "held")?;
            Err("listener registration failed")
        }
        let fake = page("", "visible");
        let lock = ScrollLock::new(fake.clone());
        assert!(setup(&lock).is_err());
        assert!(!lock.is_held());
        assert_eq!(fake.0.borrow().overflow.body, "visible");
    }

    #[test]
    fn pin_to_top_only_scrolls_when_moved() {
        let fake = page("", "");
        let lock = ScrollLock::new(fake.clone());
        let handle = lock.acquire().unwrap();
        handle.pin_to_top();
        assert_eq!(
            fake.0.borrow().calls.iter().filter(|c| **c == "scroll_to_top").count(),
            1
        );
        fake.0.borrow_mut().scroll_y = 40.0;
        handle.pin_to_top();
        assert_eq!(lock.scroll_y(), 0.0);
    }
}
