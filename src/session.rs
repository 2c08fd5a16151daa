//! The read → detect → measure → draw → display loop.

use anyhow::Result;

use crate::metrics::{FrameMetricExtractor, MetricReport, Step};
use crate::pose::{Detections, LandmarkSource};
use crate::sink::ReportSink;

/// フレームの供給元。None はストリーム終端
pub trait FrameSource {
    type Frame;

    fn next_frame(&mut self) -> Result<Option<Self::Frame>>;
}

/// 表示・録画前にフレームへ描き込む
pub trait Overlay<F> {
    fn draw(&mut self, frame: &mut F, poses: Option<&Detections>, report: Option<&MetricReport>) -> Result<()>;
}

/// 描画済みフレームの出力先 (ウィンドウ, 録画)
pub trait FrameOutput<F> {
    fn present(&mut self, frame: &F) -> Result<()>;

    /// 停止要求 (キー入力など)。毎フレーム1回確認される
    fn stop_requested(&mut self) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// フレームが読めなくなった
    EndOfStream,
    /// 出力側から停止要求があった
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub frames: u64,
    /// 新しい検出結果に姿勢が含まれていたフレーム数
    pub detections: u64,
    pub samples: u64,
    pub reports: u64,
    pub stop_reason: StopReason,
}

/// カメラ1台・抽出器1つ分の追跡セッション
pub struct Session<S: FrameSource, L, R> {
    source: S,
    landmarks: L,
    extractor: FrameMetricExtractor,
    reports: R,
    overlay: Option<Box<dyn Overlay<S::Frame>>>,
    outputs: Vec<Box<dyn FrameOutput<S::Frame>>>,
    last_report: Option<MetricReport>,
}

impl<S, L, R> Session<S, L, R>
where
    S: FrameSource,
    L: LandmarkSource<S::Frame>,
    R: ReportSink,
{
    pub fn new(source: S, landmarks: L, extractor: FrameMetricExtractor, reports: R) -> Self {
        Self {
            source,
            landmarks,
            extractor,
            reports,
            overlay: None,
            outputs: Vec::new(),
            last_report: None,
        }
    }

    pub fn with_overlay<O: Overlay<S::Frame> + 'static>(mut self, overlay: O) -> Self {
        self.overlay = Some(Box::new(overlay));
        self
    }

    pub fn with_output<O: FrameOutput<S::Frame> + 'static>(mut self, output: O) -> Self {
        self.outputs.push(Box::new(output));
        self
    }

    pub fn extractor(&self) -> &FrameMetricExtractor {
        &self.extractor
    }

    pub fn reports(&self) -> &R {
        &self.reports
    }

    /// 直近のレポート (オーバーレイ表示用)
    pub fn last_report(&self) -> Option<&MetricReport> {
        self.last_report.as_ref()
    }

    /// 1フレーム処理する
    pub fn step(&mut self, mut frame: S::Frame) -> Result<Step> {
        let polled = self.landmarks.poll(&frame)?;
        let pose = polled.fresh_poses().and_then(|poses| poses.first());
        let step = self.extractor.process(pose);

        if let Step::Reported(report) = &step {
            self.reports.emit(report)?;
            self.last_report = Some(*report);
        }

        if let Some(overlay) = self.overlay.as_mut() {
            overlay.draw(&mut frame, polled.poses.as_deref(), self.last_report.as_ref())?;
        }
        for output in self.outputs.iter_mut() {
            output.present(&frame)?;
        }

        Ok(step)
    }

    /// ストリーム終端か停止要求まで回す
    pub fn run(&mut self) -> Result<RunSummary> {
        let mut summary = RunSummary {
            frames: 0,
            detections: 0,
            samples: 0,
            reports: 0,
            stop_reason: StopReason::EndOfStream,
        };

        loop {
            let frame = match self.source.next_frame()? {
                Some(frame) => frame,
                None => {
                    log::info!("end of stream after {} frames", summary.frames);
                    break;
                }
            };

            let step = self.step(frame)?;
            summary.frames += 1;
            if step != Step::NoPose {
                summary.detections += 1;
            }
            if step.is_sample() {
                summary.samples += 1;
            }
            if step.report().is_some() {
                summary.reports += 1;
            }

            // 全出力に確認させる (キー状態の取りこぼしを防ぐ)
            let stop = self
                .outputs
                .iter_mut()
                .fold(false, |stop, output| output.stop_requested() || stop);
            if stop {
                log::info!("stop requested after {} frames", summary.frames);
                summary.stop_reason = StopReason::Stopped;
                break;
            }
        }

        Ok(summary)
    }

    pub fn into_parts(self) -> (S, L, FrameMetricExtractor, R) {
        (self.source, self.landmarks, self.extractor, self.reports)
    }
}

/// イテレータをフレーム供給元として使う
pub struct IterSource<I>(pub I);

impl<I: Iterator> FrameSource for IterSource<I> {
    type Frame = I::Item;

    fn next_frame(&mut self) -> Result<Option<Self::Frame>> {
        Ok(self.0.next())
    }
}
