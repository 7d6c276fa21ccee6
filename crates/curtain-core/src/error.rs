#![forbid(unsafe_code)]

//! Error and degradation types.
//!
//! Configuration and lock acquisition can fail and are reported as errors.
//! Asset problems never fail: they degrade the presentation and are reported
//! as a [`Degradation`] so the host can log or display them.

use std::fmt;

/// Invalid intro configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// The phase threshold table is malformed.
    InvalidPhaseTable(&'static str),
    /// A numeric field is out of range or not finite.
    InvalidValue { field: &'static str, value: f64 },
    /// An unknown presentation variant name.
    UnknownVariant(String),
    /// An environment override could not be parsed.
    InvalidEnv { key: String, value: String },
    /// The JSON configuration could not be decoded.
    Json(serde_json::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPhaseTable(reason) => write!(f, "invalid phase table: {reason}"),
            Self::InvalidValue { field, value } => {
                write!(f, "invalid value for `{field}`: {value}")
            }
            Self::UnknownVariant(name) => write!(f, "unknown intro variant: {name:?}"),
            Self::InvalidEnv { key, value } => {
                write!(f, "invalid environment override {key}={value:?}")
            }
            Self::Json(err) => write!(f, "invalid intro config JSON: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

/// Scroll lock acquisition failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollLockError {
    /// Another intro already holds the page scroll lock.
    AlreadyHeld,
}

impl fmt::Display for ScrollLockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyHeld => f.write_str("page scroll lock is already held"),
        }
    }
}

impl std::error::Error for ScrollLockError {}

/// Why an image-sequence presentation fell back to its static image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Degradation {
    /// No frames were supplied.
    EmptyAssetSet,
    /// The first-frame probe failed to load.
    AssetLoadFailure { source: String },
}

impl fmt::Display for Degradation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyAssetSet => f.write_str("frame sequence is empty"),
            Self::AssetLoadFailure { source } => {
                write!(f, "first frame failed to load: {source}")
            }
        }
    }
}
