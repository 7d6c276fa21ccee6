#![forbid(unsafe_code)]

//! Intro configuration.
//!
//! [`IntroConfig`] selects the presentation variant and tunes input
//! sensitivity, completion timing, smoothing and the phase table. It can be
//! built in code, decoded from JSON (missing fields take defaults) and
//! adjusted from `CURTAIN_*` environment variables.
//!
//! # Environment overrides
//!
//! | Variable | Field |
//! |----------|-------|
//! | `CURTAIN_VARIANT` | `variant` (`image_sequence`, `vector_graphics`, `static_frame`) |
//! | `CURTAIN_WHEEL_SENSITIVITY` | `wheel_sensitivity` |
//! | `CURTAIN_TOUCH_SENSITIVITY` | `touch_sensitivity` |
//! | `CURTAIN_KEY_STEP` | `key_step` |
//! | `CURTAIN_SETTLE_DELAY_MS` | `settle_delay_ms` |
//! | `CURTAIN_FADE_LEAD_FRAMES` | `fade_lead_frames` |
//! | `CURTAIN_REVERSIBLE` | `reversible` (`1`/`0`, `true`/`false`) |
//! | `CURTAIN_SMOOTHING` | `smoothing` (`off` disables, `on` restores defaults) |

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::accumulator::Sensitivity;
use crate::animation::spring::SpringConfig;
use crate::error::ConfigError;
use crate::phase::PhaseTable;

/// Presentation adapter selected for the intro.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// Scroll-scrubbed image sequence with a trailing fade.
    #[default]
    ImageSequence,
    /// Vector scene whose elements are driven by progress curves.
    VectorGraphics,
    /// A single still with a scroll hint.
    StaticFrame,
}

impl Variant {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ImageSequence => "image_sequence",
            Self::VectorGraphics => "vector_graphics",
            Self::StaticFrame => "static_frame",
        }
    }
}

impl FromStr for Variant {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "image_sequence" | "image" | "frames" => Ok(Self::ImageSequence),
            "vector_graphics" | "vector" | "svg" => Ok(Self::VectorGraphics),
            "static_frame" | "static" => Ok(Self::StaticFrame),
            _ => Err(ConfigError::UnknownVariant(s.to_string())),
        }
    }
}

/// Full intro configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntroConfig {
    pub variant: Variant,
    /// Progress per wheel `deltaY` unit.
    pub wheel_sensitivity: f32,
    /// Progress per touch pixel.
    pub touch_sensitivity: f32,
    /// Progress per navigation key press.
    pub key_step: f32,
    /// Pause between meeting the completion criterion and completing.
    pub settle_delay_ms: u64,
    /// Trailing frames over which the fade overlay ramps in.
    pub fade_lead_frames: usize,
    /// Whether a completed intro may be re-entered.
    pub reversible: bool,
    /// Progress restored on re-entry.
    pub reentry_progress: f32,
    /// Start fully progressed, with completion disarmed until the user
    /// scrolls back.
    pub start_at_end: bool,
    /// Starting progress when `start_at_end` is false.
    pub initial_progress: f32,
    /// Spring smoothing of the sampled progress; `None` samples raw progress.
    pub smoothing: Option<SpringConfig>,
    pub phases: PhaseTable,
}

impl Default for IntroConfig {
    fn default() -> Self {
        Self {
            variant: Variant::ImageSequence,
            wheel_sensitivity: 0.0006,
            touch_sensitivity: 0.003,
            key_step: 0.04,
            settle_delay_ms: 420,
            fade_lead_frames: 20,
            reversible: false,
            reentry_progress: 0.99,
            start_at_end: false,
            initial_progress: 0.0,
            smoothing: Some(SpringConfig::default()),
            phases: PhaseTable::default(),
        }
    }
}

impl IntroConfig {
    /// Image sequence scrubbed by a smoothed progress, fading to white.
    pub fn image_sequence() -> Self {
        Self::default()
    }

    /// Vector scene driven directly by raw progress. Completes immediately
    /// at full progress and may be re-entered from the page top.
    pub fn vector_graphics() -> Self {
        Self {
            variant: Variant::VectorGraphics,
            touch_sensitivity: 0.0012,
            settle_delay_ms: 0,
            reversible: true,
            smoothing: None,
            ..Self::default()
        }
    }

    /// Single still with a hint; fades out over the settle delay.
    pub fn static_frame() -> Self {
        Self {
            variant: Variant::StaticFrame,
            wheel_sensitivity: 0.00055,
            touch_sensitivity: 0.0026,
            settle_delay_ms: 480,
            smoothing: None,
            ..Self::default()
        }
    }

    /// Preset for `variant`.
    pub fn for_variant(variant: Variant) -> Self {
        match variant {
            Variant::ImageSequence => Self::image_sequence(),
            Variant::VectorGraphics => Self::vector_graphics(),
            Variant::StaticFrame => Self::static_frame(),
        }
    }

    #[must_use]
    pub fn reversible(mut self, reversible: bool) -> Self {
        self.reversible = reversible;
        self
    }

    #[must_use]
    pub fn start_at_end(mut self, start_at_end: bool) -> Self {
        self.start_at_end = start_at_end;
        self
    }

    #[must_use]
    pub fn initial_progress(mut self, progress: f32) -> Self {
        self.initial_progress = progress;
        self
    }

    #[must_use]
    pub fn settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    #[must_use]
    pub fn smoothing(mut self, smoothing: Option<SpringConfig>) -> Self {
        self.smoothing = smoothing;
        self
    }

    #[must_use]
    pub fn phases(mut self, phases: PhaseTable) -> Self {
        self.phases = phases;
        self
    }

    /// Configuration for mounting a fresh intro after an external re-entry
    /// trigger: same tuning, starting just short of the end.
    #[must_use]
    pub fn reentering(&self) -> Self {
        Self {
            start_at_end: false,
            initial_progress: self.reentry_progress,
            ..self.clone()
        }
    }

    pub fn settle_delay_duration(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn sensitivity(&self) -> Sensitivity {
        Sensitivity {
            wheel: self.wheel_sensitivity,
            touch: self.touch_sensitivity,
            key_step: self.key_step,
        }
    }

    /// Progress the controller starts at.
    pub fn starting_progress(&self) -> f32 {
        if self.start_at_end {
            1.0
        } else {
            self.initial_progress
        }
    }

    /// Check ranges that serde and the builders cannot enforce.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("wheel_sensitivity", self.wheel_sensitivity)?;
        positive("touch_sensitivity", self.touch_sensitivity)?;
        positive("key_step", self.key_step)?;
        if self.key_step > 1.0 {
            return Err(invalid("key_step", self.key_step));
        }
        if !(self.reentry_progress.is_finite() && (0.0..1.0).contains(&self.reentry_progress)) {
            return Err(invalid("reentry_progress", self.reentry_progress));
        }
        if !(self.initial_progress.is_finite() && (0.0..=1.0).contains(&self.initial_progress))
        {
            return Err(invalid("initial_progress", self.initial_progress));
        }
        if let Some(spring) = &self.smoothing {
            positive("smoothing.stiffness", spring.stiffness)?;
            positive("smoothing.damping", spring.damping)?;
            positive("smoothing.mass", spring.mass)?;
            if !spring.is_valid() {
                return Err(invalid("smoothing", spring.stable_step()));
            }
        }
        Ok(())
    }

    /// Decode and validate a JSON configuration.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Apply `CURTAIN_*` overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("CURTAIN_VARIANT") {
            self.variant = val.parse()?;
        }
        if let Some(val) = lookup("CURTAIN_WHEEL_SENSITIVITY") {
            self.wheel_sensitivity = parse_env("CURTAIN_WHEEL_SENSITIVITY", &val)?;
        }
        if let Some(val) = lookup("CURTAIN_TOUCH_SENSITIVITY") {
            self.touch_sensitivity = parse_env("CURTAIN_TOUCH_SENSITIVITY", &val)?;
        }
        if let Some(val) = lookup("CURTAIN_KEY_STEP") {
            self.key_step = parse_env("CURTAIN_KEY_STEP", &val)?;
        }
        if let Some(val) = lookup("CURTAIN_SETTLE_DELAY_MS") {
            self.settle_delay_ms = parse_env("CURTAIN_SETTLE_DELAY_MS", &val)?;
        }
        if let Some(val) = lookup("CURTAIN_FADE_LEAD_FRAMES") {
            self.fade_lead_frames = parse_env("CURTAIN_FADE_LEAD_FRAMES", &val)?;
        }
        if let Some(val) = lookup("CURTAIN_REVERSIBLE") {
            self.reversible = parse_flag("CURTAIN_REVERSIBLE", &val)?;
        }
        if let Some(val) = lookup("CURTAIN_SMOOTHING") {
            self.smoothing = parse_flag("CURTAIN_SMOOTHING", &val)?.then(SpringConfig::default);
        }
        self.validate()
    }
}

fn invalid(field: &'static str, value: f32) -> ConfigError {
    ConfigError::InvalidValue {
        field,
        value: f64::from(value),
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, value))
    }
}

fn parse_env<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Ok(true),
        "0" | "false" | "off" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidEnv {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_validate() {
        for variant in [
            Variant::ImageSequence,
            Variant::VectorGraphics,
            Variant::StaticFrame,
        ] {
            let cfg = IntroConfig::for_variant(variant);
            assert_eq!(cfg.variant, variant);
            cfg.validate().unwrap();
        }
    }

    #[test]
    fn presets_differ_where_expected() {
        let svg = IntroConfig::vector_graphics();
        assert!(svg.reversible);
        assert!(svg.smoothing.is_none());
        assert_eq!(svg.settle_delay_ms, 0);
        let img = IntroConfig::image_sequence();
        assert!(!img.reversible);
        assert_eq!(img.smoothing, Some(SpringConfig::default()));
        assert_eq!(img.settle_delay_duration(), Duration::from_millis(420));
    }

    #[test]
    fn starting_progress_respects_start_at_end() {
        let cfg = IntroConfig::default().initial_progress(0.3);
        assert_eq!(cfg.starting_progress(), 0.3);
        assert_eq!(cfg.start_at_end(true).starting_progress(), 1.0);
    }

    #[test]
    fn reentering_starts_near_end() {
        let cfg = IntroConfig::vector_graphics().start_at_end(true);
        let re = cfg.reentering();
        assert!(!re.start_at_end);
        assert_eq!(re.starting_progress(), 0.99);
        assert_eq!(re.touch_sensitivity, cfg.touch_sensitivity);
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut cfg = IntroConfig::default();
        cfg.wheel_sensitivity = 0.0;
        assert!(cfg.validate().is_err());

        let mut cfg = IntroConfig::default();
        cfg.reentry_progress = 1.0;
        assert!(cfg.validate().is_err());

        let mut cfg = IntroConfig::default();
        cfg.initial_progress = f32::NAN;
        assert!(cfg.validate().is_err());

        let cfg = IntroConfig::default().smoothing(Some(SpringConfig {
            damping: -1.0,
            ..SpringConfig::default()
        }));
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("smoothing"));

        let cfg = IntroConfig::default().smoothing(Some(SpringConfig {
            mass: 1.0e-12,
            ..SpringConfig::default()
        }));
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn json_fills_missing_fields() {
        let cfg = IntroConfig::from_json_str(r#"{"variant":"vector_graphics","reversible":true}"#)
            .unwrap();
        assert_eq!(cfg.variant, Variant::VectorGraphics);
        assert!(cfg.reversible);
        assert_eq!(cfg.key_step, 0.04);
        assert_eq!(cfg.phases, PhaseTable::default());
    }

    #[test]
    fn json_round_trip_preserves_config() {
        let cfg = IntroConfig::static_frame().reversible(true);
        let json = cfg.to_json_string().unwrap();
        assert_eq!(IntroConfig::from_json_str(&json).unwrap(), cfg);
    }

    #[test]
    fn json_rejects_invalid_ranges() {
        let err = IntroConfig::from_json_str(r#"{"key_step": 2.0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { field: "key_step", .. }));
        let err = IntroConfig::from_json_str("not json").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn env_overrides_apply() {
        let mut cfg = IntroConfig::default();
        cfg.apply_overrides_from(lookup(&[
            ("CURTAIN_VARIANT", "svg"),
            ("CURTAIN_SETTLE_DELAY_MS", "100"),
            ("CURTAIN_REVERSIBLE", "yes"),
            ("CURTAIN_SMOOTHING", "off"),
            ("CURTAIN_WHEEL_SENSITIVITY", "0.001"),
        ]))
        .unwrap();
        assert_eq!(cfg.variant, Variant::VectorGraphics);
        assert_eq!(cfg.settle_delay_ms, 100);
        assert!(cfg.reversible);
        assert!(cfg.smoothing.is_none());
        assert_eq!(cfg.wheel_sensitivity, 0.001);
    }

    #[test]
    fn env_override_errors_name_the_key() {
        let mut cfg = IntroConfig::default();
        let err = cfg
            .apply_overrides_from(lookup(&[("CURTAIN_FADE_LEAD_FRAMES", "many")]))
            .unwrap_err();
        assert!(err.to_string().contains("CURTAIN_FADE_LEAD_FRAMES"));

        let err = cfg
            .apply_overrides_from(lookup(&[("CURTAIN_VARIANT", "hologram")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownVariant(_)));
    }

    #[test]
    fn variant_names_round_trip() {
        for v in [
            Variant::ImageSequence,
            Variant::VectorGraphics,
            Variant::StaticFrame,
        ] {
            assert_eq!(v.as_str().parse::<Variant>().unwrap(), v);
        }
        assert_eq!("Static-Frame".parse::<Variant>().unwrap(), Variant::StaticFrame);
    }
}
