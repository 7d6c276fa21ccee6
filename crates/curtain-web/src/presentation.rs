#![forbid(unsafe_code)]

//! Presentation adapters driven by the intro controller.
//!
//! One controller drives one of three renderers, selected by
//! [`Variant`]:
//!
//! | Adapter | Renders | Completion signal |
//! |---------|---------|-------------------|
//! | [`ImageSequenceAdapter`] | scroll-scrubbed frames with a white fade | fade opacity reaches 1 |
//! | [`VectorGraphicsAdapter`] | curve-driven vector scene | progress reaches 1 |
//! | [`StaticFrameAdapter`] | one still with a hint | progress reaches 1, then fades out |
//!
//! Adapters never touch the controller. The session calls [`Presentation::sync`]
//! after every change and [`Presentation::tick`] once per frame; a renderer
//! reads the resulting [`Scene`].

use std::f32::consts::PI;
use std::time::Duration;

use curtain_core::animation::{Animation, Fade, curve, ease_in_out_cubic, elastic_curve, peak};
use curtain_core::assets::FrameSet;
use curtain_core::{Degradation, IntroConfig, IntroEvent, IntroView, Variant};
use serde::Serialize;

/// Status text shown while the first frame is loading.
pub const LOADING_TEXT: &str = "LOADING INTRO...";
/// Hint shown on the static frame.
pub const HINT_TEXT: &str = "SCROLL TO PLAY";
/// Exit fade of the static frame (cubic ease-in-out).
pub const STATIC_FADE: Duration = Duration::from_millis(480);

/// Images available to the intro.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntroAssets {
    pub frames: FrameSet,
    /// Shown when the sequence is unusable and by the static variant.
    pub fallback: String,
}

impl IntroAssets {
    pub fn new(frames: FrameSet, fallback: impl Into<String>) -> Self {
        Self {
            frames,
            fallback: fallback.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Image sequence
// ---------------------------------------------------------------------------

/// State of the first-frame probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeState {
    Pending,
    Loaded,
    Degraded(Degradation),
}

/// Frame-sequence renderer.
#[derive(Debug, Clone)]
pub struct ImageSequenceAdapter {
    frames: FrameSet,
    fallback: String,
    probe: ProbeState,
    current: usize,
    fade: f32,
    preload: Vec<usize>,
}

impl ImageSequenceAdapter {
    /// An empty frame set degrades immediately; otherwise the first frame
    /// must be probed before frames are shown.
    pub fn new(assets: &IntroAssets) -> Self {
        let probe = if assets.frames.is_empty() {
            tracing::warn!(reason = %Degradation::EmptyAssetSet, "intro degraded to fallback image");
            ProbeState::Degraded(Degradation::EmptyAssetSet)
        } else {
            ProbeState::Pending
        };
        Self {
            frames: assets.frames.clone(),
            fallback: assets.fallback.clone(),
            probe,
            current: 0,
            fade: 0.0,
            preload: Vec::new(),
        }
    }

    /// Source the host should load to decide whether frames are usable.
    pub fn probe_source(&self) -> Option<&str> {
        match self.probe {
            ProbeState::Pending => self.frames.first(),
            _ => None,
        }
    }

    /// The first frame loaded. Returns whether the state changed.
    pub fn probe_loaded(&mut self) -> bool {
        if self.probe != ProbeState::Pending {
            return false;
        }
        self.probe = ProbeState::Loaded;
        self.preload = preload_window(self.current, self.frames.len());
        tracing::debug!(frames = self.frames.len(), "first frame loaded");
        true
    }

    /// The first frame failed to load. Returns whether the state changed.
    pub fn probe_failed(&mut self) -> bool {
        if self.probe != ProbeState::Pending {
            return false;
        }
        let source = self.frames.first().unwrap_or_default().to_string();
        let degradation = Degradation::AssetLoadFailure { source };
        tracing::warn!(reason = %degradation, "intro degraded to fallback image");
        self.probe = ProbeState::Degraded(degradation);
        self.preload.clear();
        true
    }

    pub fn degradation(&self) -> Option<&Degradation> {
        match &self.probe {
            ProbeState::Degraded(d) => Some(d),
            _ => None,
        }
    }

    /// Frames the controller may derive against; `None` until the probe
    /// succeeded.
    pub fn usable_frame_count(&self) -> Option<usize> {
        (self.probe == ProbeState::Loaded).then_some(self.frames.len())
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn fade_opacity(&self) -> f32 {
        self.fade
    }

    /// Image currently on screen.
    pub fn current_source(&self) -> &str {
        match self.probe {
            ProbeState::Loaded => self.frames.get(self.current).unwrap_or(&self.fallback),
            _ => &self.fallback,
        }
    }

    /// Frame indices worth fetching ahead of the current one.
    pub fn preload(&self) -> &[usize] {
        &self.preload
    }

    pub fn preload_sources(&self) -> Vec<&str> {
        self.preload
            .iter()
            .filter_map(|&i| self.frames.get(i))
            .collect()
    }

    fn sync(&mut self, view: &IntroView<'_>) {
        let Some(sample) = view.frame else {
            return;
        };
        if sample.index != self.current {
            self.current = sample.index;
            self.preload = preload_window(self.current, self.frames.len());
        }
        self.fade = sample.opacity;
    }

    fn scene(&self) -> ImageScene {
        ImageScene {
            source: self.current_source().to_string(),
            index: self.current,
            fade_opacity: self.fade,
            loading: self.probe == ProbeState::Pending,
            degraded: self.degradation().map(ToString::to_string),
            preload: self.preload.clone(),
        }
    }
}

/// `current+1..=current+3` then `current-1`, restricted to `[0, len)`.
pub fn preload_window(current: usize, len: usize) -> Vec<usize> {
    let ahead = (1..=3).filter_map(|d| current.checked_add(d));
    let behind = current.checked_sub(1);
    ahead.chain(behind).filter(|&i| i < len).collect()
}

// ---------------------------------------------------------------------------
// Vector graphics
// ---------------------------------------------------------------------------

/// Number of orbiting satellites.
pub const SATELLITE_COUNT: usize = 16;
/// Number of core dots spiralling into the center.
pub const CORE_DOT_COUNT: usize = 4;
/// Number of ambient rings.
pub const RING_COUNT: usize = 4;

/// Shape drawn for a dot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    Circle,
    Square,
    Triangle,
    Cross,
}

impl Shape {
    const CYCLE: [Self; 4] = [Self::Circle, Self::Square, Self::Triangle, Self::Cross];

    fn nth(i: usize) -> Self {
        Self::CYCLE[i % Self::CYCLE.len()]
    }
}

/// Static layout of one satellite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Satellite {
    pub shape: Shape,
    pub radius: f32,
    pub angle_offset: f32,
    pub distance: f32,
    pub rotation_speed: f32,
    pub entry_delay: f32,
}

impl Satellite {
    /// Layout of satellite `i` of [`SATELLITE_COUNT`].
    pub fn nth(i: usize) -> Self {
        Self {
            shape: Shape::nth(i),
            radius: 8.0 + (i % 6) as f32,
            angle_offset: i as f32 / SATELLITE_COUNT as f32 * 2.0 * PI,
            distance: 250.0 + (i % 3) as f32 * 60.0,
            rotation_speed: 6.0 + (i % 5) as f32,
            entry_delay: (i % 4) as f32 * 0.05,
        }
    }
}

/// Position and scale of a moving dot at some progress.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Dot {
    pub shape: Shape,
    pub radius: f32,
    pub x: f32,
    pub y: f32,
    pub scale: f32,
}

/// Scale and opacity of a single element.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Pulse {
    pub scale: f32,
    pub opacity: f32,
}

/// Every animated parameter of the vector scene at one progress value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VectorScene {
    pub ring_opacity: f32,
    /// Rotation of ring `i` in degrees; odd rings turn the other way.
    pub ring_rotation: [f32; RING_COUNT],
    pub receiver_scale: f32,
    pub core_dots: Vec<Dot>,
    pub satellites: Vec<Dot>,
    pub shockwaves: [Pulse; 2],
    pub bloom: Pulse,
    pub title: Pulse,
    pub subtitle_y: f32,
    pub subtitle_opacity: f32,
    pub bar_fill: f32,
    pub bar_highlight: bool,
    pub phase_label: String,
}

impl VectorScene {
    pub fn at(progress: f32, phase_label: &str) -> Self {
        let p = progress.clamp(0.0, 1.0);
        let converge = 1.0 - curve(p, 0.2, 0.6);
        let shrink = 1.0 - curve(p, 0.5, 0.65);

        let ring_rotation = std::array::from_fn(|i| {
            let direction = if i % 2 == 0 { 1.0 } else { -1.0 };
            p * 180.0 * direction
        });

        let core_dots = (0..CORE_DOT_COUNT)
            .map(|i| {
                let angle = i as f32 * PI / 2.0 + p * 5.0;
                let orbit = 200.0 * converge;
                let delay = i as f32 * 0.05;
                Dot {
                    shape: Shape::nth(i),
                    radius: 30.0 + (i % 2) as f32 * 12.0,
                    x: angle.cos() * orbit,
                    y: angle.sin() * orbit,
                    scale: elastic_curve(p, delay, delay + 0.2) * shrink,
                }
            })
            .collect();

        let satellites = (0..SATELLITE_COUNT)
            .map(|i| {
                let s = Satellite::nth(i);
                let angle = s.angle_offset + p * s.rotation_speed;
                let orbit = s.distance * converge;
                Dot {
                    shape: s.shape,
                    radius: s.radius,
                    x: angle.cos() * orbit,
                    y: angle.sin() * orbit,
                    scale: elastic_curve(p, s.entry_delay, s.entry_delay + 0.2) * shrink,
                }
            })
            .collect();

        let bloom_opacity = if p > 0.6 {
            (1.0 - (p - 0.95) * 20.0).clamp(0.0, 1.0)
        } else {
            0.0
        };

        Self {
            ring_opacity: curve(p, 0.0, 0.4) * (1.0 - curve(p, 0.6, 0.7)),
            ring_rotation,
            receiver_scale: curve(p, 0.45, 0.55) * (1.0 - curve(p, 0.55, 0.65)),
            core_dots,
            satellites,
            shockwaves: [
                Pulse {
                    scale: curve(p, 0.45, 0.6) * 3.0,
                    opacity: peak(p, 0.45, 0.52, 0.6),
                },
                Pulse {
                    scale: curve(p, 0.5, 0.65) * 4.0,
                    opacity: peak(p, 0.5, 0.55, 0.65),
                },
            ],
            bloom: Pulse {
                scale: elastic_curve(p, 0.6, 0.85) * 40.0,
                opacity: bloom_opacity,
            },
            title: Pulse {
                scale: elastic_curve(p, 0.75, 0.95),
                opacity: if p > 0.7 { 1.0 } else { 0.0 },
            },
            subtitle_y: 45.0 + (1.0 - curve(p, 0.85, 0.95)) * 30.0,
            subtitle_opacity: curve(p, 0.85, 0.95),
            bar_fill: p,
            bar_highlight: p > 0.75,
            phase_label: phase_label.to_string(),
        }
    }
}

/// Vector renderer.
#[derive(Debug, Clone)]
pub struct VectorGraphicsAdapter {
    scene: VectorScene,
}

impl VectorGraphicsAdapter {
    pub fn new(initial: &IntroView<'_>) -> Self {
        Self {
            scene: VectorScene::at(initial.sampled, &initial.phase.label),
        }
    }

    pub fn scene(&self) -> &VectorScene {
        &self.scene
    }

    fn sync(&mut self, view: &IntroView<'_>) {
        self.scene = VectorScene::at(view.sampled, &view.phase.label);
    }
}

// ---------------------------------------------------------------------------
// Static frame
// ---------------------------------------------------------------------------

/// Single still with a scroll hint.
#[derive(Debug, Clone)]
pub struct StaticFrameAdapter {
    source: String,
    exit: Option<Fade>,
}

impl StaticFrameAdapter {
    pub fn new(assets: &IntroAssets) -> Self {
        Self {
            source: assets.fallback.clone(),
            exit: None,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_fading_out(&self) -> bool {
        self.exit.is_some()
    }

    /// Overlay opacity: 1 until completion is armed, then fades to 0.
    pub fn opacity(&self) -> f32 {
        self.exit.map_or(1.0, |fade| 1.0 - fade.value())
    }

    fn on_event(&mut self, event: &IntroEvent) {
        match event {
            IntroEvent::CompletionArmed => {
                self.exit = Some(Fade::new(STATIC_FADE).easing(ease_in_out_cubic));
            }
            IntroEvent::CompletionCancelled | IntroEvent::Reentered => self.exit = None,
            _ => {}
        }
    }

    fn tick(&mut self, dt: Duration) {
        if let Some(fade) = self.exit.as_mut() {
            fade.tick(dt);
        }
    }
}

// ---------------------------------------------------------------------------
// Tagged presentation
// ---------------------------------------------------------------------------

/// Renderer snapshot for the image sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageScene {
    pub source: String,
    pub index: usize,
    pub fade_opacity: f32,
    pub loading: bool,
    pub degraded: Option<String>,
    pub preload: Vec<usize>,
}

/// Renderer snapshot for the static frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StaticScene {
    pub source: String,
    pub opacity: f32,
    pub hint: &'static str,
}

/// What a renderer should draw right now.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "variant", rename_all = "snake_case")]
pub enum Scene {
    ImageSequence(ImageScene),
    VectorGraphics(VectorScene),
    StaticFrame(StaticScene),
}

/// Adapter selected by configuration.
#[derive(Debug, Clone)]
pub enum Presentation {
    ImageSequence(ImageSequenceAdapter),
    VectorGraphics(VectorGraphicsAdapter),
    StaticFrame(StaticFrameAdapter),
}

impl Presentation {
    /// Build the adapter for `config.variant`.
    pub fn for_config(config: &IntroConfig, assets: &IntroAssets, initial: &IntroView<'_>) -> Self {
        match config.variant {
            Variant::ImageSequence => Self::ImageSequence(ImageSequenceAdapter::new(assets)),
            Variant::VectorGraphics => Self::VectorGraphics(VectorGraphicsAdapter::new(initial)),
            Variant::StaticFrame => Self::StaticFrame(StaticFrameAdapter::new(assets)),
        }
    }

    pub fn variant(&self) -> Variant {
        match self {
            Self::ImageSequence(_) => Variant::ImageSequence,
            Self::VectorGraphics(_) => Variant::VectorGraphics,
            Self::StaticFrame(_) => Variant::StaticFrame,
        }
    }

    /// Frame count the controller should derive against.
    pub fn frame_count(&self) -> Option<usize> {
        match self {
            Self::ImageSequence(adapter) => adapter.usable_frame_count(),
            _ => None,
        }
    }

    pub fn as_image_sequence(&self) -> Option<&ImageSequenceAdapter> {
        match self {
            Self::ImageSequence(adapter) => Some(adapter),
            _ => None,
        }
    }

    pub fn as_image_sequence_mut(&mut self) -> Option<&mut ImageSequenceAdapter> {
        match self {
            Self::ImageSequence(adapter) => Some(adapter),
            _ => None,
        }
    }

    /// Status line for the overlay.
    pub fn status_text<'a>(&self, view: &IntroView<'a>) -> &'a str {
        match self {
            Self::ImageSequence(adapter) if adapter.probe == ProbeState::Pending => LOADING_TEXT,
            Self::StaticFrame(_) => HINT_TEXT,
            _ => view.phase.label.as_str(),
        }
    }

    pub fn on_event(&mut self, event: &IntroEvent) {
        if let Self::StaticFrame(adapter) = self {
            adapter.on_event(event);
        }
    }

    pub fn sync(&mut self, view: &IntroView<'_>) {
        match self {
            Self::ImageSequence(adapter) => adapter.sync(view),
            Self::VectorGraphics(adapter) => adapter.sync(view),
            Self::StaticFrame(_) => {}
        }
    }

    pub fn tick(&mut self, dt: Duration) {
        if let Self::StaticFrame(adapter) = self {
            adapter.tick(dt);
        }
    }

    pub fn scene(&self) -> Scene {
        match self {
            Self::ImageSequence(adapter) => Scene::ImageSequence(adapter.scene()),
            Self::VectorGraphics(adapter) => Scene::VectorGraphics(adapter.scene.clone()),
            Self::StaticFrame(adapter) => Scene::StaticFrame(StaticScene {
                source: adapter.source.clone(),
                opacity: adapter.opacity(),
                hint: HINT_TEXT,
            }),
        }
    }
}
