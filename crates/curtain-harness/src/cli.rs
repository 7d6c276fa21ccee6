#![forbid(unsafe_code)]

//! Command-line argument parsing for the replay harness.
//!
//! Parses args manually to keep the binary lean. Supports environment
//! variable overrides via the `CURTAIN_HARNESS_*` prefix.

use std::env;
use std::path::PathBuf;
use std::process;
use std::str::FromStr;

use curtain_core::Variant;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const HELP_TEXT: &str = "\
Curtain replay harness

Replays a JSON-lines input script against the scroll intro on an in-memory
page and prints one JSON line per transition, then a summary.

USAGE:
    curtain-harness [OPTIONS] [SCRIPT]

    Reads the script from SCRIPT, or from stdin when omitted or '-'.

OPTIONS:
    --config=PATH        Load an IntroConfig JSON file
    --variant=NAME       Presentation: image_sequence (default), vector_graphics, static_frame
    --frames=N           Number of synthetic frame images (default: 120)
    --reversible         Allow re-entry after completion
    --frame-ms=N         Animation frame length for wait steps (default: 16)
    --scene              Print the scene after every step
    --log-json           Write logs to stderr as JSON lines
    --help, -h           Show this help message
    --version, -V        Show version

SCRIPT LINES:
    {\"type\":\"wheel\",\"delta_y\":120}
    {\"type\":\"touch\",\"phase\":\"start\",\"y\":400}
    {\"type\":\"key\",\"key\":\"ArrowDown\"}
    {\"type\":\"tick\",\"ms\":16}
    {\"type\":\"reenter\"}
    {\"type\":\"probe\",\"ok\":true}
    {\"type\":\"wait\",\"ms\":500}
    {\"type\":\"scroll\",\"y\":0}

ENVIRONMENT VARIABLES:
    CURTAIN_HARNESS_CONFIG     Override --config
    CURTAIN_HARNESS_FRAMES     Override --frames
    CURTAIN_HARNESS_FRAME_MS   Override --frame-ms
    CURTAIN_HARNESS_LOG_JSON   Set to 1 for --log-json
    CURTAIN_LOG                Log filter (default: info)
    CURTAIN_*                  IntroConfig overrides, e.g. CURTAIN_SETTLE_DELAY_MS";

/// Parsed command-line options.
#[derive(Debug, Clone, PartialEq)]
pub struct Opts {
    /// IntroConfig JSON file.
    pub config: Option<PathBuf>,
    /// Variant override; `None` keeps the configured one.
    pub variant: Option<Variant>,
    /// Synthetic frame count.
    pub frames: usize,
    pub reversible: bool,
    pub frame_ms: u64,
    pub scene: bool,
    pub log_json: bool,
    /// Script path; `None` reads stdin.
    pub script: Option<PathBuf>,
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            config: None,
            variant: None,
            frames: 120,
            reversible: false,
            frame_ms: 16,
            scene: false,
            log_json: false,
            script: None,
        }
    }
}

/// Outcome of argument parsing.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Run(Opts),
    Help,
    Version,
}

impl Opts {
    /// Parse command-line arguments and environment variables, exiting on
    /// `--help`, `--version` or invalid input.
    ///
    /// Environment variables take precedence over defaults but are overridden
    /// by explicit command-line flags.
    pub fn parse() -> Self {
        let args: Vec<String> = env::args().skip(1).collect();
        match Self::parse_from(&args, |key| env::var(key).ok()) {
            Ok(Command::Run(opts)) => opts,
            Ok(Command::Help) => {
                println!("{HELP_TEXT}");
                process::exit(0);
            }
            Ok(Command::Version) => {
                println!("curtain-harness {VERSION}");
                process::exit(0);
            }
            Err(msg) => {
                eprintln!("{msg}");
                eprintln!("Run with --help for usage information.");
                process::exit(1);
            }
        }
    }

    /// Parse `args` with `env` as the environment.
    pub fn parse_from<F>(args: &[String], env: F) -> Result<Command, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut opts = Self::default();

        // Apply environment variable defaults first
        if let Some(val) = env("CURTAIN_HARNESS_CONFIG") {
            opts.config = Some(PathBuf::from(val));
        }
        if let Some(val) = env("CURTAIN_HARNESS_FRAMES")
            && let Ok(n) = val.parse()
        {
            opts.frames = n;
        }
        if let Some(val) = env("CURTAIN_HARNESS_FRAME_MS")
            && let Ok(n) = val.parse()
        {
            opts.frame_ms = n;
        }
        if let Some(val) = env("CURTAIN_HARNESS_LOG_JSON") {
            opts.log_json = matches!(val.trim(), "1" | "true" | "on" | "yes");
        }

        for arg in args {
            match arg.as_str() {
                "--help" | "-h" => return Ok(Command::Help),
                "--version" | "-V" => return Ok(Command::Version),
                "--reversible" => opts.reversible = true,
                "--scene" => opts.scene = true,
                "--log-json" => opts.log_json = true,
                "-" => opts.script = None,
                other => {
                    if let Some(val) = other.strip_prefix("--config=") {
                        opts.config = Some(PathBuf::from(val));
                    } else if let Some(val) = other.strip_prefix("--variant=") {
                        let variant = Variant::from_str(val)
                            .map_err(|_| format!("Invalid --variant value: {val}"))?;
                        opts.variant = Some(variant);
                    } else if let Some(val) = other.strip_prefix("--frames=") {
                        opts.frames = val
                            .parse()
                            .map_err(|_| format!("Invalid --frames value: {val}"))?;
                    } else if let Some(val) = other.strip_prefix("--frame-ms=") {
                        opts.frame_ms = val
                            .parse()
                            .map_err(|_| format!("Invalid --frame-ms value: {val}"))?;
                    } else if other.starts_with('-') {
                        return Err(format!("Unknown argument: {other}"));
                    } else if opts.script.is_some() {
                        return Err(format!("Unexpected extra script: {other}"));
                    } else {
                        opts.script = Some(PathBuf::from(other));
                    }
                }
            }
        }

        Ok(Command::Run(opts))
    }
}
