#![forbid(unsafe_code)]

//! Curtain replay harness.
//!
//! # Running
//!
//! ```sh
//! cargo run -p curtain-harness -- --variant=vector_graphics --reversible demo.jsonl
//! echo '{"type":"wheel","delta_y":4000}' | cargo run -p curtain-harness -- --frames=0
//! ```

use std::fs;
use std::io::{self, Read};
use std::process::ExitCode;
use std::time::Duration;

use curtain_core::IntroConfig;
use curtain_harness::cli::Opts;
use curtain_harness::{ReplayOptions, numbered_frames, replay, script};
use tracing_subscriber::EnvFilter;

fn init_logging(json: bool) {
    if json && curtain_core::logging::init_json_subscriber() {
        return;
    }
    let filter = EnvFilter::try_from_env("CURTAIN_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    // Ignore the error: a subscriber may already be installed.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn main() -> ExitCode {
    let opts = Opts::parse();
    init_logging(opts.log_json);
    match run(&opts) {
        Ok(restored) if restored => ExitCode::SUCCESS,
        Ok(_) => {
            eprintln!("page was not restored after teardown");
            ExitCode::FAILURE
        }
        Err(err) => {
            eprintln!("curtain-harness: {err}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(opts: &Opts) -> Result<IntroConfig, Box<dyn std::error::Error>> {
    let mut config = match (&opts.config, opts.variant) {
        (Some(path), _) => IntroConfig::from_json_str(&fs::read_to_string(path)?)?,
        (None, Some(variant)) => IntroConfig::for_variant(variant),
        (None, None) => IntroConfig::default(),
    };
    config.apply_env_overrides()?;
    if let Some(variant) = opts.variant {
        config.variant = variant;
    }
    if opts.reversible {
        config.reversible = true;
    }
    config.validate()?;
    Ok(config)
}

fn run(opts: &Opts) -> Result<bool, Box<dyn std::error::Error>> {
    let config = load_config(opts)?;
    let source = match &opts.script {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    let steps = script::parse(&source)?;
    tracing::info!(
        variant = config.variant.as_str(),
        steps = steps.len(),
        frames = opts.frames,
        "replaying script"
    );

    let options = ReplayOptions {
        frame: Duration::from_millis(opts.frame_ms),
        scenes: opts.scene,
    };
    let report = replay(config, numbered_frames(opts.frames), &steps, &options)?;

    let mut scenes = report.scenes.iter().peekable();
    for line in &report.lines {
        println!("{}", serde_json::to_string(line)?);
        while let Some((step, scene)) = scenes.next_if(|(step, _)| *step <= line.step) {
            println!("{}", serde_json::json!({ "step": step, "scene": scene }));
        }
    }
    for (step, scene) in scenes {
        println!("{}", serde_json::json!({ "step": step, "scene": scene }));
    }
    println!("{}", serde_json::to_string_pretty(&report.summary)?);
    Ok(report.summary.page_restored)
}
