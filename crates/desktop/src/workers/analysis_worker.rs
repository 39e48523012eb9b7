use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender};

use lenslab_core::detection::domain::face_analyzer::FaceAnalyzer;
use lenslab_core::detection::domain::face_record::FaceRecord;
use lenslab_core::detection::infrastructure::model_set::{ModelArtifact, ModelSet, SetProgressFn};
use lenslab_core::detection::infrastructure::onnx_face_analyzer::OnnxFaceAnalyzer;
use lenslab_core::motion::domain::motion_detector::MotionDetector;
use lenslab_core::motion::infrastructure::frame_diff_detector::FrameDiffDetector;
use lenslab_core::overlay::canvas::OverlayCanvas;
use lenslab_core::overlay::font::OverlayFont;
use lenslab_core::pipeline::cycle_timer::CycleTimer;
use lenslab_core::pipeline::detection_loop::{CycleOutcome, DetectionLoop};
use lenslab_core::shared::constants::DEFAULT_CONFIDENCE;
use lenslab_core::shared::model_resolver::ResolveLocations;
use lenslab_core::video::domain::video_source::VideoSource;
use lenslab_core::video::infrastructure::image_source::ImageSource;
use lenslab_core::video::infrastructure::synthetic_source::SyntheticSource;

use crate::settings::Settings;

/// Frame pacing for the preview loop.
const FRAME_INTERVAL: Duration = Duration::from_millis(33);

/// Synthetic feed dimensions when no input is selected.
const SYNTHETIC_WIDTH: u32 = 640;
const SYNTHETIC_HEIGHT: u32 = 480;

pub enum ControlMsg {
    /// Full settings snapshot. Receipt re-arms the cycle timer, so changes
    /// take effect within one fresh period.
    Settings(Settings),
}

pub enum WorkerEvent {
    DownloadProgress {
        artifact: ModelArtifact,
        downloaded: u64,
        total: u64,
    },
    /// All five model artifacts resolved; face analysis is available.
    Ready,
    /// Model provisioning or the analyzer build failed. Face detection
    /// stays unavailable for the life of the worker; motion keeps running.
    LoadFailed(String),
    /// The frame source failed mid-run and the worker exited.
    SourceFailed(String),
    Cycle {
        faces: usize,
        records: Vec<FaceRecord>,
    },
    Motion {
        level: f32,
        triggered: bool,
    },
}

/// Composited preview frame (video with the overlay already applied).
pub struct PreviewFrame {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

pub struct WorkerParams {
    /// Image file or directory of frames; None selects the synthetic feed.
    pub input: Option<PathBuf>,
    pub settings: Settings,
    pub models_dir: Option<PathBuf>,
}

pub struct WorkerHandle {
    pub events: Receiver<WorkerEvent>,
    pub frames: Receiver<PreviewFrame>,
    pub control: Sender<ControlMsg>,
    cancelled: Arc<AtomicBool>,
}

impl WorkerHandle {
    pub fn stop(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

pub fn spawn(params: WorkerParams) -> WorkerHandle {
    let (event_tx, event_rx) = crossbeam_channel::unbounded::<WorkerEvent>();
    // Latest-wins preview: a small buffer and try_send keep the worker from
    // ever blocking on a slow UI
    let (frame_tx, frame_rx) = crossbeam_channel::bounded::<PreviewFrame>(2);
    let (control_tx, control_rx) = crossbeam_channel::unbounded::<ControlMsg>();
    let cancelled = Arc::new(AtomicBool::new(false));
    let cancelled_worker = cancelled.clone();

    thread::spawn(move || {
        if let Err(e) = run_worker(&event_tx, &frame_tx, &control_rx, &cancelled_worker, params) {
            if !cancelled_worker.load(Ordering::Relaxed) {
                let _ = event_tx.send(WorkerEvent::SourceFailed(e.to_string()));
            }
        }
    });

    WorkerHandle {
        events: event_rx,
        frames: frame_rx,
        control: control_tx,
        cancelled,
    }
}

fn run_worker(
    event_tx: &Sender<WorkerEvent>,
    frame_tx: &Sender<PreviewFrame>,
    control_rx: &Receiver<ControlMsg>,
    cancelled: &Arc<AtomicBool>,
    params: WorkerParams,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut source = open_source(params.input.as_deref())?;
    let mut motion = FrameDiffDetector::default();
    let font = OverlayFont::discover();
    let (width, height) = source.dimensions();
    let mut canvas = OverlayCanvas::new(width, height);
    let mut settings = params.settings;

    // Models resolve before the frame loop starts. A failure leaves face
    // analysis permanently unavailable for this worker (no retry) while the
    // loop still serves frames and motion samples.
    let mut pipeline = match build_pipeline(params.models_dir.as_deref(), event_tx, cancelled) {
        Ok(analyzer) => {
            let _ = event_tx.send(WorkerEvent::Ready);
            Some(DetectionLoop::new(analyzer, DEFAULT_CONFIDENCE))
        }
        Err(e) => {
            if cancelled.load(Ordering::Relaxed) {
                return Ok(());
            }
            log::error!("model load failed: {e}");
            let _ = event_tx.send(WorkerEvent::LoadFailed(e.to_string()));
            None
        }
    };
    let models_ready = pipeline.is_some();

    let mut timer = CycleTimer::with_default_period();
    timer.rearm(Instant::now(), settings.detection_enabled);

    while !cancelled.load(Ordering::Relaxed) {
        while let Ok(ControlMsg::Settings(next)) = control_rx.try_recv() {
            if next != settings {
                settings = next;
                timer.rearm(Instant::now(), settings.detection_enabled);
            }
        }

        let Some(frame) = source.next_frame()? else {
            break;
        };

        let sample = motion.sample(&frame);
        let _ = event_tx.send(WorkerEvent::Motion {
            level: sample.level,
            triggered: sample.triggered,
        });

        if timer.poll(Instant::now()) {
            if let Some(pipeline) = pipeline.as_mut() {
                let outcome = pipeline.run_cycle(
                    models_ready,
                    settings.detection_enabled,
                    Some(&frame),
                    Some(&mut canvas),
                    &settings.render_options(),
                    font.as_ref(),
                );
                if let CycleOutcome::Completed { faces } = outcome {
                    let _ = event_tx.send(WorkerEvent::Cycle {
                        faces,
                        records: pipeline.records().to_vec(),
                    });
                }
            }
        }

        let composited = canvas.composite_over(&frame);
        let (pw, ph) = composited.dimensions();
        let _ = frame_tx.try_send(PreviewFrame {
            pixels: composited.into_raw(),
            width: pw,
            height: ph,
        });

        thread::sleep(FRAME_INTERVAL);
    }

    Ok(())
}

fn open_source(input: Option<&std::path::Path>) -> Result<Box<dyn VideoSource>, Box<dyn std::error::Error>> {
    match input {
        Some(path) => Ok(Box::new(ImageSource::open(path)?)),
        None => Ok(Box::new(SyntheticSource::new(
            SYNTHETIC_WIDTH,
            SYNTHETIC_HEIGHT,
        ))),
    }
}

fn build_pipeline(
    models_dir: Option<&std::path::Path>,
    event_tx: &Sender<WorkerEvent>,
    cancelled: &Arc<AtomicBool>,
) -> Result<Box<dyn FaceAnalyzer>, Box<dyn std::error::Error>> {
    let bundled = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("models")));
    let locations = ResolveLocations {
        override_dir: models_dir,
        bundled_dir: bundled.as_deref(),
    };

    let tx = event_tx.clone();
    let progress: SetProgressFn = Arc::new(move |artifact, downloaded, total| {
        let _ = tx.send(WorkerEvent::DownloadProgress {
            artifact,
            downloaded,
            total,
        });
    });

    let models = ModelSet::resolve_all(&locations, Some(progress))?;
    if cancelled.load(Ordering::Relaxed) {
        return Err("Cancelled".into());
    }
    let analyzer = OnnxFaceAnalyzer::new(&models)?;
    Ok(Box::new(analyzer))
}
