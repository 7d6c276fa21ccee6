#![forbid(unsafe_code)]

use curtain_core::IntroConfig;
use curtain_core::assets::FrameSet;
use curtain_core::scroll_lock::{OverflowSnapshot, PageScroll, ScrollLock, SmoothScroller};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::HtmlElement;

use crate::input::InputEvent;
use crate::presentation::IntroAssets;
use crate::stage::Stage;
use crate::{HostError, ListenerHost, ListenerId, ListenerKinds, ListenerOptions};

fn js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Call `target[name](...args)`.
fn call_method(target: &JsValue, name: &str, args: &[JsValue]) -> Result<JsValue, JsValue> {
    let method: js_sys::Function = js_sys::Reflect::get(target, &JsValue::from_str(name))?
        .dyn_into()
        .map_err(|_| js_error(format!("`{name}` is not a function")))?;
    match args {
        [] => method.call0(target),
        [a] => method.call1(target, a),
        [a, b] => method.call2(target, a, b),
        _ => Err(js_error("too many arguments")),
    }
}

/// Document root and body of the current page.
struct JsPage;

impl JsPage {
    fn window() -> Option<web_sys::Window> {
        web_sys::window()
    }

    fn root() -> Option<HtmlElement> {
        Self::window()?
            .document()?
            .document_element()?
            .dyn_into::<HtmlElement>()
            .ok()
    }

    fn body() -> Option<HtmlElement> {
        Self::window()?.document()?.body()
    }

    fn read(element: Option<HtmlElement>) -> String {
        element
            .and_then(|el| el.style().get_property_value("overflow").ok())
            .unwrap_or_default()
    }

    fn write(element: Option<HtmlElement>, value: &str) {
        let Some(el) = element else {
            return;
        };
        let style = el.style();
        let result = if value.is_empty() {
            style.remove_property("overflow").map(drop)
        } else {
            style.set_property("overflow", value)
        };
        if result.is_err() {
            tracing::warn!(value, "failed to set page overflow");
        }
    }
}

impl PageScroll for JsPage {
    fn overflow(&self) -> OverflowSnapshot {
        OverflowSnapshot {
            root: Self::read(Self::root()),
            body: Self::read(Self::body()),
        }
    }

    fn set_overflow(&mut self, overflow: &OverflowSnapshot) {
        Self::write(Self::root(), &overflow.root);
        Self::write(Self::body(), &overflow.body);
    }

    fn scroll_to_top(&mut self) {
        if let Some(window) = Self::window() {
            window.scroll_to_with_x_and_y(0.0, 0.0);
        }
    }

    fn scroll_y(&self) -> f64 {
        Self::window()
            .and_then(|w| w.scroll_y().ok())
            .unwrap_or_default()
    }
}

/// JS object with `stop()` and `start()` (e.g. a Lenis instance).
struct JsSmoothScroller(JsValue);

impl SmoothScroller for JsSmoothScroller {
    fn stop(&mut self) {
        if call_method(&self.0, "stop", &[]).is_err() {
            tracing::warn!("smooth scroller stop() failed");
        }
    }

    fn start(&mut self) {
        if call_method(&self.0, "start", &[]).is_err() {
            tracing::warn!("smooth scroller start() failed");
        }
    }
}

/// JS object with `attach(types: string[], passive: boolean): number` and
/// `detach(id: number)`.
///
/// The host registers `addEventListener` handlers for the given DOM types,
/// forwards each event to [`CurtainIntro::input`] and calls
/// `preventDefault` when it returns true.
#[derive(Clone)]
struct JsListenerHost(JsValue);

impl ListenerHost for JsListenerHost {
    fn attach(
        &mut self,
        kinds: ListenerKinds,
        options: ListenerOptions,
    ) -> Result<ListenerId, HostError> {
        let names: js_sys::Array = kinds
            .dom_names()
            .into_iter()
            .map(JsValue::from_str)
            .collect();
        let id = call_method(
            &self.0,
            "attach",
            &[names.into(), JsValue::from_bool(options.passive)],
        )
        .map_err(|err| {
            HostError::ListenerRegistration(
                err.as_string()
                    .unwrap_or_else(|| kinds.dom_names().join(",")),
            )
        })?;
        id.as_f64()
            .and_then(ListenerId::from_f64)
            .ok_or(HostError::Unsupported(
                "attach() must return an integer id in 0..=4294967295",
            ))
    }

    fn detach(&mut self, id: ListenerId) {
        if call_method(&self.0, "detach", &[JsValue::from(id.0)]).is_err() {
            tracing::warn!(id = id.0, "listener detach failed");
        }
    }
}

/// Scroll intro mounted on the current page.
#[wasm_bindgen]
pub struct CurtainIntro {
    stage: Stage<JsListenerHost>,
}

#[wasm_bindgen]
impl CurtainIntro {
    /// Mount the intro.
    ///
    /// `config` is a JSON `IntroConfig` (empty for defaults), `frames` the
    /// frame URLs in any order and `fallback` the still shown when frames
    /// are unusable.
    #[wasm_bindgen(constructor)]
    pub fn new(
        config: &str,
        frames: js_sys::Array,
        fallback: String,
        listener_host: JsValue,
        smooth_scroller: JsValue,
    ) -> Result<CurtainIntro, JsValue> {
        let config = if config.trim().is_empty() {
            IntroConfig::default()
        } else {
            IntroConfig::from_json_str(config).map_err(js_error)?
        };
        let frames = FrameSet::from_sources(frames.iter().filter_map(|v| v.as_string()));
        let assets = IntroAssets::new(frames, fallback);
        let mut lock = ScrollLock::new(JsPage);
        if !smooth_scroller.is_undefined() && !smooth_scroller.is_null() {
            lock = lock.with_smooth_scroller(JsSmoothScroller(smooth_scroller));
        }
        let stage = Stage::new(config, assets, lock, JsListenerHost(listener_host))
            .map_err(js_error)?;
        Ok(Self { stage })
    }

    /// Forward one JSON input record. Returns true when the host should call
    /// `preventDefault`.
    pub fn input(&mut self, event: &str) -> Result<bool, JsValue> {
        let event = InputEvent::from_json_str(event).map_err(js_error)?;
        Ok(self.stage.handle_input(&event).is_consumed())
    }

    /// Advance by one animation frame of `ms` milliseconds.
    pub fn tick(&mut self, ms: f64) {
        let ms = if ms.is_finite() { ms.max(0.0) } else { 0.0 };
        self.stage
            .advance_time(std::time::Duration::from_secs_f64(ms / 1000.0));
    }

    /// URL the host should load before frames are shown, if any.
    #[wasm_bindgen(js_name = probeSource)]
    pub fn probe_source(&self) -> Option<String> {
        self.stage
            .session()?
            .presentation()
            .as_image_sequence()?
            .probe_source()
            .map(str::to_string)
    }

    /// Frame URLs worth fetching ahead of the one on screen.
    #[wasm_bindgen(js_name = preloadSources)]
    pub fn preload_sources(&self) -> Vec<String> {
        self.stage
            .session()
            .and_then(|s| s.presentation().as_image_sequence())
            .map(|adapter| {
                adapter
                    .preload_sources()
                    .into_iter()
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    #[wasm_bindgen(js_name = probeLoaded)]
    pub fn probe_loaded(&mut self) {
        self.stage.probe_loaded();
    }

    #[wasm_bindgen(js_name = probeFailed)]
    pub fn probe_failed(&mut self) {
        self.stage.probe_failed();
    }

    /// Whether the overlay is on screen.
    pub fn visible(&self) -> bool {
        self.stage.is_intro_visible()
    }

    /// Whether the host should keep requesting animation frames.
    #[wasm_bindgen(js_name = wantsFrames)]
    pub fn wants_frames(&self) -> bool {
        self.stage.session().is_some_and(|s| s.wants_frames())
    }

    #[wasm_bindgen(js_name = statusText)]
    pub fn status_text(&self) -> Option<String> {
        self.stage.session().map(|s| s.status_text().to_string())
    }

    /// Current scene as JSON, or `undefined` while hidden.
    pub fn scene(&self) -> Result<Option<String>, JsValue> {
        self.stage
            .scene()
            .map(|scene| serde_json::to_string(&scene).map_err(js_error))
            .transpose()
    }

    /// Transitions since the last call, as a JSON array.
    #[wasm_bindgen(js_name = drainEvents)]
    pub fn drain_events(&mut self) -> Result<String, JsValue> {
        serde_json::to_string(&self.stage.drain_events()).map_err(js_error)
    }

    /// Explicit teardown for JS callers. Restores page scrolling and removes
    /// every listener.
    pub fn destroy(&mut self) {
        self.stage.close();
    }
}
