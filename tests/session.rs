use anyhow::Result;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use pose_metrics::metrics::{ExtractorConfig, FrameMetricExtractor, MetricReport};
use pose_metrics::pose::{Blocking, Detections, Landmark, LandmarkIndex, LandmarkSource, Polled, PoseLandmarks};
use pose_metrics::session::{FrameOutput, IterSource, Overlay, Session, StopReason};

/// Synthetic frame: nose position and visibility, or no person in view.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Frame {
    Person { x: f32, y: f32, visibility: f32 },
    Empty,
}

fn person(x: f32, y: f32, visibility: f32) -> Frame {
    Frame::Person { x, y, visibility }
}

fn detect(frame: &Frame) -> Result<Detections> {
    match *frame {
        Frame::Person { x, y, visibility } => {
            let mut pose = PoseLandmarks::default();
            *pose.get_mut(LandmarkIndex::Nose) = Landmark::new(x, y, 0.0, visibility);
            // left knee bent at 90, right leg bent at 135
            *pose.get_mut(LandmarkIndex::LeftHip) = Landmark::new(0.4, 0.5, 0.0, 1.0);
            *pose.get_mut(LandmarkIndex::LeftKnee) = Landmark::new(0.4, 0.7, 0.0, 1.0);
            *pose.get_mut(LandmarkIndex::LeftAnkle) = Landmark::new(0.3, 0.7, 0.0, 1.0);
            *pose.get_mut(LandmarkIndex::RightHip) = Landmark::new(0.6, 0.5, 0.0, 1.0);
            *pose.get_mut(LandmarkIndex::RightKnee) = Landmark::new(0.6, 0.7, 0.0, 1.0);
            *pose.get_mut(LandmarkIndex::RightAnkle) = Landmark::new(0.7, 0.8, 0.0, 1.0);
            Ok(vec![pose])
        }
        Frame::Empty => Ok(Vec::new()),
    }
}

fn extractor(interval: u32) -> FrameMetricExtractor {
    FrameMetricExtractor::new(ExtractorConfig {
        sample_interval: interval,
        ..ExtractorConfig::default()
    })
}

#[derive(Default)]
struct Recorded {
    presented: Vec<Frame>,
    overlays: Vec<(bool, Option<MetricReport>)>,
}

struct FakeOutput {
    log: Rc<RefCell<Recorded>>,
    stop_after: Option<usize>,
}

impl FrameOutput<Frame> for FakeOutput {
    fn present(&mut self, frame: &Frame) -> Result<()> {
        self.log.borrow_mut().presented.push(*frame);
        Ok(())
    }

    fn stop_requested(&mut self) -> bool {
        match self.stop_after {
            Some(n) => self.log.borrow().presented.len() >= n,
            None => false,
        }
    }
}

struct FakeOverlay {
    log: Rc<RefCell<Recorded>>,
}

impl Overlay<Frame> for FakeOverlay {
    fn draw(&mut self, _: &mut Frame, poses: Option<&Detections>, report: Option<&MetricReport>) -> Result<()> {
        self.log.borrow_mut().overlays.push((poses.is_some(), report.copied()));
        Ok(())
    }
}

#[test]
fn test_reports_every_interval_after_baseline() {
    let frames: Vec<Frame> = (0..34).map(|i| person(0.5, 0.5 - i as f32 / 256.0, 0.99)).collect();
    let mut session = Session::new(
        IterSource(frames.into_iter()),
        Blocking::new(detect),
        extractor(10),
        Vec::<MetricReport>::new(),
    );

    let summary = session.run().unwrap();
    assert_eq!(summary.stop_reason, StopReason::EndOfStream);
    assert_eq!(summary.frames, 34);
    assert_eq!(summary.detections, 34);
    // frames 11, 22 and 33 are sampled
    assert_eq!(summary.samples, 3);
    // first sample only establishes the baseline
    assert_eq!(summary.reports, 2);

    let reports = session.reports();
    assert_eq!(reports.len(), 2);
    for report in reports {
        match *report {
            MetricReport::Metrics { velocity, .. } => {
                // nose rises by 11/256 between samples
                assert_eq!(velocity.dx, 0.0);
                assert!((velocity.dy - 11.0 / 256.0).abs() < 1e-6);
            }
            MetricReport::LowConfidence { .. } => panic!("unexpected low confidence"),
        }
    }
}

#[test]
fn test_empty_frames_do_not_advance_sampling() {
    let mut frames = Vec::new();
    for _ in 0..10 {
        frames.push(person(0.5, 0.5, 1.0));
        frames.push(Frame::Empty);
        frames.push(Frame::Empty);
    }
    let mut session = Session::new(
        IterSource(frames.into_iter()),
        Blocking::new(detect),
        extractor(5),
        Vec::<MetricReport>::new(),
    );

    let summary = session.run().unwrap();
    assert_eq!(summary.frames, 30);
    assert_eq!(summary.detections, 10);
    // sixth detection is sampled, four more are counted after it
    assert_eq!(summary.samples, 1);
    assert_eq!(session.extractor().counter(), 4);
}

#[test]
fn test_low_confidence_suppresses_metrics() {
    let frames = vec![person(0.5, 0.5, 1.0), person(0.6, 0.4, 0.5)];
    let mut session = Session::new(
        IterSource(frames.into_iter()),
        Blocking::new(detect),
        extractor(0),
        Vec::<MetricReport>::new(),
    );
    session.run().unwrap();

    assert_eq!(session.reports(), &vec![MetricReport::LowConfidence { confidence: 0.5 }]);
    let text = session.reports()[0].to_string();
    assert_eq!(text, "Low confidence: 0.500");
}

#[test]
fn test_overlay_sees_latest_report_and_outputs_receive_frames() {
    let log = Rc::new(RefCell::new(Recorded::default()));
    let frames = vec![
        person(0.5, 0.5, 1.0),
        person(0.5, 0.25, 1.0),
        Frame::Empty,
        person(0.5, 0.25, 1.0),
    ];
    let mut session = Session::new(
        IterSource(frames.clone().into_iter()),
        Blocking::new(detect),
        extractor(0),
        Vec::<MetricReport>::new(),
    )
    .with_overlay(FakeOverlay { log: log.clone() })
    .with_output(FakeOutput {
        log: log.clone(),
        stop_after: None,
    });

    session.run().unwrap();

    let recorded = log.borrow();
    assert_eq!(recorded.presented, frames);
    assert_eq!(recorded.overlays.len(), 4);
    assert_eq!(recorded.overlays[0], (true, None));
    assert!(recorded.overlays[1].1.is_some());
    // no pose this frame, but the previous report stays on screen
    assert_eq!(recorded.overlays[2].0, false);
    assert_eq!(recorded.overlays[2].1, recorded.overlays[1].1);
    assert_eq!(session.last_report(), recorded.overlays[3].1.as_ref());
}

#[test]
fn test_stop_request_ends_run() {
    let log = Rc::new(RefCell::new(Recorded::default()));
    let frames = std::iter::repeat(person(0.5, 0.5, 1.0));
    let mut session = Session::new(IterSource(frames), Blocking::new(detect), extractor(10), Vec::<MetricReport>::new())
        .with_output(FakeOutput {
            log: log.clone(),
            stop_after: Some(25),
        });

    let summary = session.run().unwrap();
    assert_eq!(summary.stop_reason, StopReason::Stopped);
    assert_eq!(summary.frames, 25);
    assert_eq!(summary.samples, 2);
    assert_eq!(log.borrow().presented.len(), 25);
}

#[test]
fn test_detector_error_aborts_run() {
    let frames = vec![person(0.5, 0.5, 1.0); 3];
    let failing = |_: &Frame| -> Result<Detections> { anyhow::bail!("inference failed") };
    let mut session = Session::new(IterSource(frames.into_iter()), Blocking::new(failing), extractor(0), Vec::<MetricReport>::new());
    assert!(session.run().is_err());
}

#[test]
fn test_concrete_velocity_scenario() {
    let frames = vec![person(0.50, 0.40, 0.99), person(0.52, 0.35, 0.99)];
    let mut session = Session::new(
        IterSource(frames.into_iter()),
        Blocking::new(detect),
        extractor(0),
        Vec::<MetricReport>::new(),
    );
    session.run().unwrap();

    let (_, _, _, reports) = session.into_parts();
    let lines = reports[0].lines();
    assert_eq!(lines[0], "Velocity X: 0.020");
    assert_eq!(lines[1], "Velocity Y: 0.050");
    assert_eq!(lines[2], "Left Knee Angle: 90.00");
    assert_eq!(lines[3], "Right Knee Angle: 135.00");
    assert_eq!(lines[4], "Confidence: 0.990");
}

/// Worker-style source: one result is published, then repeated as stale on every poll.
struct StaleSource {
    latest: Option<Arc<Detections>>,
    delivered: bool,
}

impl LandmarkSource<Frame> for StaleSource {
    fn poll(&mut self, frame: &Frame) -> Result<Polled> {
        if self.latest.is_none() {
            self.latest = Some(Arc::new(detect(frame)?));
        }
        let fresh = !self.delivered;
        self.delivered = true;
        Ok(Polled {
            poses: self.latest.clone(),
            fresh,
        })
    }
}

#[test]
fn test_stale_results_do_not_advance_sampling() {
    let log = Rc::new(RefCell::new(Recorded::default()));
    let frames = vec![person(0.5, 0.5, 1.0); 20];
    let source = StaleSource {
        latest: None,
        delivered: false,
    };
    let mut session = Session::new(IterSource(frames.into_iter()), source, extractor(3), Vec::<MetricReport>::new())
        .with_overlay(FakeOverlay { log: log.clone() });

    let summary = session.run().unwrap();
    assert_eq!(summary.frames, 20);
    assert_eq!(summary.samples, 0);
    assert_eq!(session.extractor().counter(), 1);

    let recorded = log.borrow();
    assert_eq!(recorded.overlays.len(), 20);
    assert!(recorded.overlays.iter().all(|(poses, _)| *poses));
}
