// Demo runner: wires a frame source into the pipeline, logs what each cycle
// found, and optionally exports a snapshot of the final frame. All analysis
// lives in the library; this binary is presentation only.

use std::path::PathBuf;

use anyhow::{ensure, Result};
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use prism_vision::{
    export, render, FrameAnalysis, FramePipeline, FrameSource, ImageDirSource, PipelineConfig,
    SyntheticSource, ThresholdStrategy,
};

#[derive(Parser, Debug)]
#[command(
    name = "prism_vision",
    about = "Shape and color analysis over a frame stream, with identity tracking."
)]
struct Args {
    /// Directory of frame images to replay in place of a live camera.
    #[arg(long)]
    frames: Option<PathBuf>,

    /// Number of procedurally generated frames when no directory is given.
    #[arg(long, default_value_t = 90)]
    synthetic_frames: u32,

    #[arg(long, default_value_t = 640)]
    width: u32,

    #[arg(long, default_value_t = 480)]
    height: u32,

    /// Reject contours with a smaller enclosed area.
    #[arg(long, default_value_t = 300.0)]
    min_area: f64,

    /// Reject contours with a larger enclosed area.
    #[arg(long, default_value_t = 50_000.0)]
    max_area: f64,

    /// Maximum centroid distance for a cross-frame identity match.
    #[arg(long, default_value_t = 50.0)]
    distance_gate: f64,

    /// Use the global threshold strategy with this cutoff instead of the
    /// default adaptive one.
    #[arg(long)]
    global_threshold: Option<u8>,

    /// Write a JSON snapshot and annotated screenshot of the final frame here.
    #[arg(long)]
    export_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let config = PipelineConfig {
        min_area: args.min_area,
        max_area: args.max_area,
        distance_gate: args.distance_gate,
        threshold: match args.global_threshold {
            Some(cutoff) => ThresholdStrategy::Global { threshold: cutoff },
            None => ThresholdStrategy::Adaptive { block_radius: 5 },
        },
        ..PipelineConfig::default()
    };

    let mut source: Box<dyn FrameSource> = match &args.frames {
        Some(dir) => Box::new(ImageDirSource::open(dir)?),
        None => Box::new(SyntheticSource::new(args.width, args.height, args.synthetic_frames)),
    };
    ensure!(source.is_open(), "frame source could not be opened");

    let mut pipeline = FramePipeline::new(config);
    let mut last: Option<(image::RgbImage, FrameAnalysis)> = None;
    let mut frame_index = 0u64;

    loop {
        let Some(frame) = source.read_frame() else {
            info!(frames = frame_index, "end of stream");
            break;
        };
        let analysis = pipeline.process_frame(&frame);
        info!(frame = frame_index, objects = analysis.objects.len(), "frame processed");
        for (label, count) in &analysis.counts {
            debug!(%label, count, "label count");
        }
        last = Some((frame, analysis));
        frame_index += 1;
    }

    if let (Some(dir), Some((frame, analysis))) = (args.export_dir.as_ref(), last.as_ref()) {
        std::fs::create_dir_all(dir)?;
        let json_path = export::save_detection_data(&analysis.objects, dir, "detection")?;
        let annotated = render::annotate(frame, analysis);
        let shot_path = export::save_screenshot(&annotated, dir, "screenshot")?;
        info!(
            json = %json_path.display(),
            screenshot = %shot_path.display(),
            "snapshot exported"
        );
    }

    Ok(())
}
