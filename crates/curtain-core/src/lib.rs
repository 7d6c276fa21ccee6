#![forbid(unsafe_code)]

//! Core: scroll-driven intro progress, phases, frames, completion, and the
//! page scroll lock.
//!
//! Nothing here touches a browser. Hosts translate native input into
//! [`event::IntroMsg`], advance time explicitly, and drain
//! [`event::IntroEvent`]s from the [`controller::IntroController`].

pub mod accumulator;
pub mod animation;
pub mod assets;
pub mod config;
pub mod controller;
pub mod error;
pub mod event;
pub mod frames;
pub mod logging;
pub mod phase;
pub mod scroll_lock;

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{debug, info, trace, warn};

pub use config::{IntroConfig, Variant};
pub use controller::{CompletionState, IntroController, IntroView, SettleToken};
pub use error::{ConfigError, Degradation, ScrollLockError};
pub use event::{Disposition, InputSource, IntroEvent, IntroKey, IntroMsg};
