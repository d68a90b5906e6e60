//! framegate_demo - synthetic stream through the frame gate
//!
//! Replays a scripted detector over generated frames and prints one JSON report
//! per frame, then the best-frame snapshot.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use framegate::coverage::CoverageStrategy;
use framegate::emit::{BestFrameReport, FrameReport};
use framegate::{
    BestFrame, FrameGate, GateConfig, LandmarkName, PixelFormat, RawFrame, ScoringPolicy, ScriptStep,
    ScriptedDetector, SyntheticPerson,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Number of synthetic frames to stream.
    #[arg(long, default_value_t = 30)]
    frames: u64,
    #[arg(long, default_value_t = 640)]
    width: u32,
    #[arg(long, default_value_t = 480)]
    height: u32,
    /// Scoring policy (overrides FRAMEGATE_POLICY and the config file).
    #[arg(long)]
    policy: Option<ScoringPolicy>,
    /// Coverage strategy (overrides FRAMEGATE_COVERAGE and the config file).
    #[arg(long)]
    coverage: Option<CoverageStrategy>,
    #[arg(long, default_value = "demo")]
    session: String,
    /// Print only the final best-frame report.
    #[arg(long)]
    summary_only: bool,
    /// Write the best frame as JPEG to this path (needs the `jpeg` feature).
    #[arg(long)]
    jpeg_out: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    if args.width == 0 || args.height == 0 {
        return Err(anyhow!("width and height must be >= 1"));
    }
    let frame_len = rgb_len(args.width, args.height)
        .ok_or_else(|| anyhow!("{}x{} frame is too large", args.width, args.height))?;

    let mut cfg = GateConfig::load().context("load gate config")?;
    if let Some(policy) = args.policy {
        cfg.params = policy.params();
    }
    if let Some(coverage) = args.coverage {
        cfg.coverage = coverage;
    }
    cfg.validate()?;
    log::info!(
        "policy {:?}, coverage {:?}, promotion {:?}",
        cfg.params.policy,
        cfg.coverage,
        cfg.promotion
    );

    let detector = Arc::new(Mutex::new(ScriptedDetector::new(script(
        args.width,
        args.height,
    ))));
    let gate = FrameGate::from_config(&cfg, detector.clone(), Some(detector))?;
    gate.open_session(&args.session)?;

    for frame_number in 0..args.frames {
        let pixels = gradient(args.width, args.height, frame_len, frame_number);
        let frame = RawFrame::from_pixels(&pixels, args.width, args.height, PixelFormat::Rgb24)?;
        let result = gate.ingest_frame(&args.session, frame, frame_number)?;
        if !args.summary_only {
            println!("{}", FrameReport::new(&result).to_json()?);
        }
    }

    match gate.get_best_frame(&args.session)? {
        Some(best) => {
            println!("{}", BestFrameReport::new(&best).to_json()?);
            if let Some(path) = &args.jpeg_out {
                write_jpeg(&best, path)?;
            }
        }
        None => log::warn!("no frame was accepted"),
    }

    gate.close_session(&args.session)?;
    Ok(())
}

#[cfg(feature = "jpeg")]
fn write_jpeg(best: &BestFrame, path: &Path) -> Result<()> {
    let bytes = framegate::emit::encode_jpeg(best)?;
    std::fs::write(path, bytes).with_context(|| format!("write {}", path.display()))?;
    log::info!("best frame written to {}", path.display());
    Ok(())
}

#[cfg(not(feature = "jpeg"))]
fn write_jpeg(_best: &BestFrame, path: &Path) -> Result<()> {
    Err(anyhow!(
        "cannot write {}: built without the jpeg feature",
        path.display()
    ))
}

/// A person walking into view: nothing, a face, a cropped body, a centered full
/// body, an off-center one, and a detector outage.
fn script(width: u32, height: u32) -> Vec<ScriptStep> {
    let centered = SyntheticPerson::default();
    let off_center = SyntheticPerson {
        center_x: 0.75,
        ..centered
    };
    let far = SyntheticPerson {
        height_ratio: 0.3,
        ..centered
    };
    vec![
        ScriptStep::empty(),
        ScriptStep::Detections {
            rectangles: vec![centered.rectangles(width, height)[0].clone()],
            skeleton: None,
        },
        centered.step_without(
            width,
            height,
            &[
                LandmarkName::LeftKnee,
                LandmarkName::RightKnee,
                LandmarkName::LeftAnkle,
                LandmarkName::RightAnkle,
            ],
        ),
        far.step(width, height),
        centered.step(width, height),
        off_center.step(width, height),
        ScriptStep::Failure("synthetic detector outage".to_string()),
    ]
}

fn rgb_len(width: u32, height: u32) -> Option<usize> {
    (width as usize)
        .checked_mul(height as usize)?
        .checked_mul(3)
}

/// Diagonal gradient that drifts with the frame number.
fn gradient(width: u32, height: u32, len: usize, frame_number: u64) -> Vec<u8> {
    let span = width as u64 + height as u64;
    let mut pixels = Vec::with_capacity(len);
    for y in 0..height as u64 {
        for x in 0..width as u64 {
            let v = (((x + y + frame_number * 4) % span) * 255 / span) as u8;
            pixels.extend_from_slice(&[v, v, v]);
        }
    }
    pixels
}
