use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;

use lenslab_core::detection::infrastructure::model_set::{ModelArtifact, ModelSet, SetProgressFn};
use lenslab_core::detection::infrastructure::onnx_face_analyzer::OnnxFaceAnalyzer;
use lenslab_core::motion::domain::motion_detector::MotionDetector;
use lenslab_core::motion::infrastructure::frame_diff_detector::FrameDiffDetector;
use lenslab_core::overlay::canvas::OverlayCanvas;
use lenslab_core::overlay::font::OverlayFont;
use lenslab_core::overlay::renderer::{DisplayMode, RenderOptions};
use lenslab_core::pipeline::cycle_timer::CycleTimer;
use lenslab_core::pipeline::detection_loop::{CycleOutcome, DetectionLoop};
use lenslab_core::shared::frame::Frame;
use lenslab_core::shared::model_resolver::ResolveLocations;
use lenslab_core::video::domain::video_source::VideoSource;
use lenslab_core::video::infrastructure::image_source::ImageSource;
use lenslab_core::video::infrastructure::synthetic_source::SyntheticSource;

/// Webcam-style motion and face detection demo.
#[derive(Parser)]
#[command(name = "lenslab")]
struct Cli {
    /// Input image file or directory of frames (synthetic feed if omitted).
    input: Option<PathBuf>,

    /// Overlay mode: landmarks, bars, or mesh.
    #[arg(long, default_value = "landmarks")]
    mode: String,

    /// Hide the per-face details panel.
    #[arg(long)]
    hide_details: bool,

    /// Print face records as JSON, one line per cycle.
    #[arg(long)]
    json: bool,

    /// Directory to write composited overlay frames into.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Face detection confidence threshold (0.0-1.0).
    #[arg(long, default_value = "0.5")]
    confidence: f32,

    /// Number of analysis cycles to run before exiting.
    #[arg(long, default_value = "5")]
    cycles: usize,

    /// Milliseconds between cycle starts.
    #[arg(long, default_value = "1500")]
    period_ms: u64,

    /// Run the motion detector instead of face analysis (no models needed).
    #[arg(long)]
    motion: bool,

    /// Directory containing the model files (skips cache and download).
    #[arg(long)]
    models_dir: Option<PathBuf>,

    /// Synthetic feed width (when no input is given).
    #[arg(long, default_value = "640")]
    width: u32,

    /// Synthetic feed height (when no input is given).
    #[arg(long, default_value = "480")]
    height: u32,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let mut source: Box<dyn VideoSource> = match &cli.input {
        Some(path) => {
            let source = ImageSource::open(path)?;
            log::info!(
                "{} image frame(s) from {}",
                source.frame_count(),
                path.display()
            );
            Box::new(source)
        }
        None => {
            log::info!("no input given, using the synthetic feed");
            Box::new(SyntheticSource::new(cli.width, cli.height))
        }
    };

    if cli.motion {
        return run_motion(&cli, source.as_mut());
    }

    let options = RenderOptions {
        mode: parse_mode(&cli.mode),
        show_details: !cli.hide_details,
    };
    let models = resolve_models(cli.models_dir.as_deref())?;
    let analyzer = OnnxFaceAnalyzer::new(&models)?;

    if let Some(dir) = &cli.output {
        std::fs::create_dir_all(dir)?;
    }

    run_demo(&cli, source.as_mut(), analyzer, &options)
}

/// Motion demo: samples frame differences for the same wall-clock span the
/// face demo would cover and logs each motion event as it starts.
fn run_motion(cli: &Cli, source: &mut dyn VideoSource) -> Result<(), Box<dyn std::error::Error>> {
    let mut detector = FrameDiffDetector::default();
    let frame_interval = Duration::from_millis(33);
    let deadline = Instant::now() + Duration::from_millis(cli.period_ms) * cli.cycles as u32;

    let mut events = 0usize;
    let mut was_triggered = false;
    while Instant::now() < deadline {
        let Some(frame) = source.next_frame()? else {
            break;
        };
        let sample = detector.sample(&frame);
        if sample.triggered && !was_triggered {
            events += 1;
            match sample.region {
                Some(region) => log::info!(
                    "motion started: {:.1}% of cells, around ({:.0}, {:.0})",
                    sample.level * 100.0,
                    region.center().x,
                    region.center().y
                ),
                None => log::info!("motion started: {:.1}% of cells", sample.level * 100.0),
            }
        }
        was_triggered = sample.triggered;
        thread::sleep(frame_interval);
    }
    println!("{events} motion event(s)");
    Ok(())
}

fn run_demo(
    cli: &Cli,
    source: &mut dyn VideoSource,
    analyzer: OnnxFaceAnalyzer,
    options: &RenderOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let font = OverlayFont::discover();
    let (width, height) = source.dimensions();
    let mut canvas = OverlayCanvas::new(width, height);
    let mut pipeline = DetectionLoop::new(Box::new(analyzer), cli.confidence);

    let period = Duration::from_millis(cli.period_ms);
    let frame_interval = Duration::from_millis(33).min(period);
    let mut timer = CycleTimer::new(period);
    timer.restart(Instant::now());

    let mut completed = 0usize;
    while completed < cli.cycles {
        let Some(frame) = source.next_frame()? else {
            break;
        };
        if timer.poll(Instant::now()) {
            match pipeline.run_cycle(
                true,
                true,
                Some(&frame),
                Some(&mut canvas),
                options,
                font.as_ref(),
            ) {
                CycleOutcome::Completed { faces } => {
                    completed += 1;
                    report_cycle(cli, completed, faces, &pipeline, &canvas, &frame)?;
                }
                CycleOutcome::Failed => {
                    completed += 1;
                }
                CycleOutcome::Skipped(_) => {}
            }
        }
        thread::sleep(frame_interval);
    }
    Ok(())
}

fn report_cycle(
    cli: &Cli,
    cycle: usize,
    faces: usize,
    pipeline: &DetectionLoop,
    canvas: &OverlayCanvas,
    frame: &Frame,
) -> Result<(), Box<dyn std::error::Error>> {
    log::info!("cycle {cycle}/{total}: {faces} face(s)", total = cli.cycles);
    if cli.json {
        let line = serde_json::json!({ "cycle": cycle, "faces": pipeline.records() });
        println!("{line}");
    } else {
        for (index, record) in pipeline.records().iter().enumerate() {
            let [profile, expression] = record.panel_lines();
            println!("  face {}: {profile}; {expression}", index + 1);
        }
    }
    if let Some(dir) = &cli.output {
        let path = dir.join(format!("cycle_{cycle:03}.png"));
        canvas.composite_over(frame).save(&path)?;
        log::info!("wrote {}", path.display());
    }
    Ok(())
}

fn resolve_models(models_dir: Option<&Path>) -> Result<ModelSet, Box<dyn std::error::Error>> {
    let bundled = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("models")));
    let locations = ResolveLocations {
        override_dir: models_dir,
        bundled_dir: bundled.as_deref(),
    };
    log::info!("Resolving {} model artifacts", ModelArtifact::ALL.len());
    let progress: SetProgressFn = Arc::new(download_progress);
    let models = ModelSet::resolve_all(&locations, Some(progress))?;
    eprintln!();
    Ok(models)
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(input) = &cli.input {
        if !input.exists() {
            return Err(format!("Input not found: {}", input.display()).into());
        }
    }
    let valid_modes = ["landmarks", "bars", "mesh"];
    if !valid_modes.contains(&cli.mode.as_str()) {
        return Err(format!(
            "Mode must be one of: landmarks, bars, mesh, got '{}'",
            cli.mode
        )
        .into());
    }
    if !(0.0..=1.0).contains(&cli.confidence) {
        return Err(format!(
            "Confidence must be between 0.0 and 1.0, got {}",
            cli.confidence
        )
        .into());
    }
    if cli.cycles == 0 {
        return Err("Cycles must be at least 1".into());
    }
    if cli.motion && (cli.json || cli.output.is_some()) {
        return Err("--json and --output apply to face analysis, not --motion".into());
    }
    if cli.period_ms == 0 {
        return Err("Period must be at least 1 ms".into());
    }
    if cli.input.is_none() && (cli.width < 32 || cli.height < 32) {
        return Err(format!(
            "Synthetic feed must be at least 32x32, got {}x{}",
            cli.width, cli.height
        )
        .into());
    }
    Ok(())
}

fn parse_mode(mode: &str) -> DisplayMode {
    match mode {
        "bars" => DisplayMode::ExpressionBars,
        "mesh" => DisplayMode::PointMesh,
        _ => DisplayMode::Landmarks,
    }
}

fn download_progress(artifact: ModelArtifact, downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading {artifact} model... {pct}%");
    } else {
        eprint!("\rDownloading {artifact} model... {downloaded} bytes");
    }
}
