use anyhow::Result;
use opencv::core::{Mat, Point, Scalar};
use opencv::imgproc;
use opencv::prelude::*;

use crate::metrics::MetricReport;
use crate::pose::{Detections, PoseLandmarks};
use crate::render::skeleton::{
    LANDMARK_COLOR, LOW_CONFIDENCE_TEXT_COLOR, LOW_VISIBILITY_COLOR, REPORT_TEXT_COLOR,
    SKELETON_COLOR, SKELETON_CONNECTIONS, VISIBILITY_THRESHOLD,
};
use crate::session::Overlay;

const LANDMARK_RADIUS: i32 = 5;
const LINE_THICKNESS: i32 = 2;
const TEXT_SCALE: f64 = 0.6;
const TEXT_LINE_HEIGHT: i32 = 24;
const TEXT_ORIGIN: (i32, i32) = (12, 28);

fn scalar(bgr: [u8; 3]) -> Scalar {
    Scalar::new(bgr[0] as f64, bgr[1] as f64, bgr[2] as f64, 0.0)
}

/// 骨格とレポートをフレームに描き込む
pub struct SkeletonOverlay {
    /// レポート文字を描くか
    pub show_report: bool,
}

impl SkeletonOverlay {
    pub fn new(show_report: bool) -> Self {
        Self { show_report }
    }

    /// 姿勢を描画 (接続線を先に描き、点を上に重ねる)
    pub fn draw_pose(&self, frame: &mut Mat, pose: &PoseLandmarks) -> Result<()> {
        let w = frame.cols() as u32;
        let h = frame.rows() as u32;

        for (start_idx, end_idx) in SKELETON_CONNECTIONS.iter() {
            let (x1, y1) = pose.get(*start_idx).to_pixel(w, h);
            let (x2, y2) = pose.get(*end_idx).to_pixel(w, h);
            imgproc::line(
                frame,
                Point::new(x1, y1),
                Point::new(x2, y2),
                scalar(SKELETON_COLOR),
                LINE_THICKNESS,
                imgproc::LINE_8,
                0,
            )?;
        }

        for (_, lm) in pose.iter() {
            let (px, py) = lm.to_pixel(w, h);
            let color = if lm.is_visible(VISIBILITY_THRESHOLD) {
                LANDMARK_COLOR
            } else {
                LOW_VISIBILITY_COLOR
            };
            imgproc::circle(
                frame,
                Point::new(px, py),
                LANDMARK_RADIUS,
                scalar(color),
                -1,
                imgproc::LINE_8,
                0,
            )?;
        }

        Ok(())
    }

    /// レポートを左上に描画
    pub fn draw_report(&self, frame: &mut Mat, report: &MetricReport) -> Result<()> {
        let color = if report.is_low_confidence() {
            LOW_CONFIDENCE_TEXT_COLOR
        } else {
            REPORT_TEXT_COLOR
        };

        for (i, line) in report.lines().iter().enumerate() {
            let origin = Point::new(TEXT_ORIGIN.0, TEXT_ORIGIN.1 + i as i32 * TEXT_LINE_HEIGHT);
            // 背景（黒）で視認性確保
            imgproc::put_text(
                frame,
                line,
                origin,
                imgproc::FONT_HERSHEY_SIMPLEX,
                TEXT_SCALE,
                Scalar::new(0.0, 0.0, 0.0, 0.0),
                4,
                imgproc::LINE_8,
                false,
            )?;
            imgproc::put_text(
                frame,
                line,
                origin,
                imgproc::FONT_HERSHEY_SIMPLEX,
                TEXT_SCALE,
                scalar(color),
                1,
                imgproc::LINE_8,
                false,
            )?;
        }

        Ok(())
    }
}

impl Overlay<Mat> for SkeletonOverlay {
    fn draw(&mut self, frame: &mut Mat, poses: Option<&Detections>, report: Option<&MetricReport>) -> Result<()> {
        if let Some(poses) = poses {
            for pose in poses {
                self.draw_pose(frame, pose)?;
            }
        }
        if self.show_report {
            if let Some(report) = report {
                self.draw_report(frame, report)?;
            }
        }
        Ok(())
    }
}
