#![forbid(unsafe_code)]

//! Phase labels derived from progress.
//!
//! A [`PhaseTable`] is an ascending list of band start thresholds. Band `i`
//! covers `[start_i, start_{i+1})`; the last band covers `[start_last, 1]`.
//!
//! # Invariants
//!
//! 1. The first band starts at exactly 0.0.
//! 2. Starts are strictly ascending and lie in [0, 1].
//! 3. Every progress value in [0, 1] selects exactly one band; values outside
//!    the range are clamped first, NaN selects the first band.
//!
//! Tables that violate 1–2 cannot be constructed (including via serde).

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// One band of the phase table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseBand {
    /// Inclusive lower threshold.
    pub start: f32,
    /// Stable identifier (`waking`, `ready`, ...).
    pub name: String,
    /// Status text shown while the band is active.
    pub label: String,
}

impl PhaseBand {
    pub fn new(start: f32, name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            start,
            name: name.into(),
            label: label.into(),
        }
    }
}

/// Validated, ascending phase thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<PhaseBand>", into = "Vec<PhaseBand>")]
pub struct PhaseTable {
    bands: Vec<PhaseBand>,
}

impl PhaseTable {
    /// Build a table, validating the threshold invariants.
    pub fn new(bands: Vec<PhaseBand>) -> Result<Self, ConfigError> {
        let Some(first) = bands.first() else {
            return Err(ConfigError::InvalidPhaseTable("table is empty"));
        };
        if first.start != 0.0 {
            return Err(ConfigError::InvalidPhaseTable("first band must start at 0"));
        }
        if bands
            .iter()
            .any(|b| !b.start.is_finite() || !(0.0..=1.0).contains(&b.start))
        {
            return Err(ConfigError::InvalidPhaseTable(
                "thresholds must lie in [0, 1]",
            ));
        }
        if bands.windows(2).any(|w| w[1].start <= w[0].start) {
            return Err(ConfigError::InvalidPhaseTable(
                "thresholds must be strictly ascending",
            ));
        }
        Ok(Self { bands })
    }

    /// Index of the band containing `progress`.
    pub fn index_of(&self, progress: f32) -> usize {
        let p = if progress.is_nan() {
            0.0
        } else {
            progress.clamp(0.0, 1.0)
        };
        // First band starts at 0, so the partition point is always >= 1.
        self.bands.partition_point(|b| b.start <= p) - 1
    }

    /// Band containing `progress`.
    pub fn band_for(&self, progress: f32) -> &PhaseBand {
        &self.bands[self.index_of(progress)]
    }

    /// Band by index.
    pub fn band(&self, index: usize) -> Option<&PhaseBand> {
        self.bands.get(index)
    }

    /// Half-open range `[start, end)` covered by band `index` (the last band
    /// reports `end = 1.0` and is inclusive).
    pub fn range(&self, index: usize) -> Option<(f32, f32)> {
        let band = self.bands.get(index)?;
        let end = self.bands.get(index + 1).map_or(1.0, |next| next.start);
        Some((band.start, end))
    }

    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    pub fn bands(&self) -> &[PhaseBand] {
        &self.bands
    }
}

impl Default for PhaseTable {
    fn default() -> Self {
        Self {
            bands: vec![
                PhaseBand::new(0.0, "waking", "Waking up the canvas..."),
                PhaseBand::new(0.15, "gathering", "Gathering colors..."),
                PhaseBand::new(0.35, "fusing", "Fusing ideas together..."),
                PhaseBand::new(0.55, "expanding", "Expanding creativity..."),
                PhaseBand::new(0.80, "ready", "Ready!"),
            ],
        }
    }
}

impl TryFrom<Vec<PhaseBand>> for PhaseTable {
    type Error = ConfigError;

    fn try_from(bands: Vec<PhaseBand>) -> Result<Self, Self::Error> {
        Self::new(bands)
    }
}

impl From<PhaseTable> for Vec<PhaseBand> {
    fn from(table: PhaseTable) -> Self {
        table.bands
    }
}
