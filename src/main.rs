use anyhow::Result;
use clap::Parser;
use opencv::core::Mat;
use std::path::PathBuf;

use pose_metrics::camera::{OpenCvCamera, VideoRecorder};
use pose_metrics::config::{Config, DetectionMode};
use pose_metrics::metrics::FrameMetricExtractor;
use pose_metrics::pose::{Blocking, LandmarkSource, LiveStream, OnnxPoseDetector, Polled};
use pose_metrics::render::{MinifbRenderer, SkeletonOverlay};
use pose_metrics::session::{RunSummary, Session};
use pose_metrics::sink::{ConsoleSink, LogSink, MultiSink};

const CONFIG_PATH: &str = "config.toml";

#[derive(Parser, Debug)]
#[command(version = env!("GIT_VERSION"), about = "Webcam pose metrics: velocity, knee angles, confidence")]
struct Args {
    /// Config file (defaults are used when the default file is missing)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Camera index
    #[arg(long)]
    camera: Option<i32>,

    /// Read frames from a video file instead of a camera
    #[arg(long, value_name = "PATH")]
    video: Option<String>,

    /// Run detection on a worker thread and draw the latest available result
    #[arg(long)]
    live: bool,

    /// Record the annotated video to this file (mp4)
    #[arg(long, value_name = "PATH")]
    record: Option<String>,

    /// Do not open a preview window
    #[arg(long)]
    headless: bool,

    /// Detection frames skipped between samples (0 samples every frame)
    #[arg(long)]
    interval: Option<u32>,

    /// Reference landmark visibility required to report metrics
    #[arg(long)]
    threshold: Option<f32>,

    /// Do not clear the console before each report
    #[arg(long)]
    no_clear: bool,
}

impl Args {
    fn apply(&self, config: &mut Config) {
        if let Some(index) = self.camera {
            config.camera.index = index;
        }
        if let Some(video) = &self.video {
            config.camera.file = Some(video.clone());
        }
        if self.live {
            config.detector.mode = DetectionMode::LiveStream;
        }
        if let Some(record) = &self.record {
            config.output.record = Some(record.clone());
        }
        if self.headless {
            config.output.window = false;
        }
        if let Some(interval) = self.interval {
            config.sampling.interval = interval;
        }
        if let Some(threshold) = self.threshold {
            config.gate.threshold = threshold;
        }
        if self.no_clear {
            config.report.clear_console = false;
        }
    }
}

/// 同期/ライブストリームのどちらかで動く検出
enum Detection {
    Sync(Blocking<OnnxPoseDetector>),
    Live(LiveStream<Mat>),
}

impl LandmarkSource<Mat> for Detection {
    fn poll(&mut self, frame: &Mat) -> Result<Polled> {
        match self {
            Detection::Sync(source) => source.poll(frame),
            Detection::Live(source) => source.poll(frame),
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(CONFIG_PATH),
    };
    args.apply(&mut config);
    config.validate()?;

    log::info!("pose_metrics {}", env!("GIT_VERSION"));
    log::info!(
        "skipping {} detection frames between samples, threshold {:.2} on {:?}",
        config.sampling.interval,
        config.gate.threshold,
        config.gate.reference
    );

    let camera = OpenCvCamera::from_config(&config.camera)?;
    let resolution = camera.resolution();
    log::info!("capture {}x{} @ {:.1} fps", resolution.0, resolution.1, camera.fps());

    log::info!("loading model from {}", config.detector.model_path);
    let detector = OnnxPoseDetector::new(&config.detector.model_path, config.detector.min_pose_confidence)?;
    let detection = match config.detector.mode {
        DetectionMode::Sync => Detection::Sync(Blocking::new(detector)),
        DetectionMode::LiveStream => Detection::Live(LiveStream::spawn(detector)?),
    };
    log::info!("detection mode: {:?}", config.detector.mode);

    let mut reports = MultiSink::new();
    if config.report.console {
        reports.push(ConsoleSink::stdout(config.report.clear_console));
    }
    if config.report.log {
        reports.push(LogSink);
    }

    let extractor = FrameMetricExtractor::from_config(&config);
    let mut session = Session::new(camera, detection, extractor, reports)
        .with_overlay(SkeletonOverlay::new(config.report.overlay));

    if config.output.window {
        let (width, height) = resolution;
        session = session.with_output(MinifbRenderer::new(
            &config.output.title,
            width as usize,
            height as usize,
        )?);
        log::info!("press ESC or Q to exit");
    }
    if let Some(path) = &config.output.record {
        session = session.with_output(VideoRecorder::create(path, config.output.record_fps, resolution)?);
    }

    let summary: RunSummary = session.run()?;
    log::info!(
        "{:?}: {} frames, {} with pose, {} samples, {} reports",
        summary.stop_reason,
        summary.frames,
        summary.detections,
        summary.samples,
        summary.reports
    );

    let (_, detection, _, _) = session.into_parts();
    if let Detection::Live(source) = &detection {
        log::info!(
            "detector received {} frames, skipped {} while busy",
            source.submitted_frames(),
            source.dropped_frames()
        );
    }

    Ok(())
}
