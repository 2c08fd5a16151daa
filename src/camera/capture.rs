use anyhow::{Context, Result};
use opencv::{
    core::{self, Mat},
    prelude::*,
    videoio::{self, VideoCapture, VideoCaptureAPIs, VideoCaptureTrait},
};

use crate::config::CameraConfig;
use crate::session::FrameSource;

/// OpenCVを使用したカメラ (または動画ファイル) キャプチャ
pub struct OpenCvCamera {
    capture: VideoCapture,
    width: u32,
    height: u32,
    fps: f64,
    mirror: bool,
}

impl OpenCvCamera {
    /// 解像度とFPSを指定してカメラを開く
    pub fn open_with_config(index: i32, width: Option<u32>, height: Option<u32>, fps: Option<u32>) -> Result<Self> {
        let mut capture =
            VideoCapture::new(index, VideoCaptureAPIs::CAP_ANY as i32).context("Failed to open camera")?;

        if !capture.is_opened()? {
            anyhow::bail!("Camera {} is not available", index);
        }

        // 解像度を設定
        if let Some(w) = width {
            capture.set(videoio::CAP_PROP_FRAME_WIDTH, w as f64)?;
        }
        if let Some(h) = height {
            capture.set(videoio::CAP_PROP_FRAME_HEIGHT, h as f64)?;
        }
        if let Some(f) = fps {
            capture.set(videoio::CAP_PROP_FPS, f as f64)?;
        }
        capture.set(videoio::CAP_PROP_BUFFERSIZE, 1.0)?;

        Self::from_capture(capture)
    }

    /// 動画ファイルを開く
    pub fn open_file(path: &str) -> Result<Self> {
        let capture = VideoCapture::from_file(path, VideoCaptureAPIs::CAP_ANY as i32)
            .with_context(|| format!("Failed to open video {}", path))?;

        if !capture.is_opened()? {
            anyhow::bail!("Video {} could not be opened", path);
        }

        Self::from_capture(capture)
    }

    /// 設定に従ってカメラまたは動画ファイルを開く
    pub fn from_config(config: &CameraConfig) -> Result<Self> {
        let camera = match &config.file {
            // 動画ファイルは鏡像にしない
            Some(path) => Self::open_file(path)?.with_mirror(false),
            None => Self::open_with_config(
                config.index,
                Some(config.width),
                Some(config.height),
                Some(config.fps),
            )?
            .with_mirror(config.mirror),
        };
        Ok(camera)
    }

    fn from_capture(capture: VideoCapture) -> Result<Self> {
        let width = capture.get(videoio::CAP_PROP_FRAME_WIDTH)? as u32;
        let height = capture.get(videoio::CAP_PROP_FRAME_HEIGHT)? as u32;
        let fps = capture.get(videoio::CAP_PROP_FPS)?;
        log::info!("capture opened: {}x{} @ {:.1} fps", width, height, fps);

        Ok(Self {
            capture,
            width,
            height,
            fps,
            mirror: false,
        })
    }

    /// 左右反転を設定
    pub fn with_mirror(mut self, mirror: bool) -> Self {
        self.mirror = mirror;
        self
    }

    /// 解像度を取得
    pub fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// 報告されたFPS (不明な場合は0)
    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// フレームを読み込む（BGR形式）。読めなければストリーム終端として None
    pub fn read_frame(&mut self) -> Result<Option<Mat>> {
        let mut frame = Mat::default();
        let ok = self
            .capture
            .read(&mut frame)
            .context("Failed to read frame")?;

        if !ok || frame.empty() {
            return Ok(None);
        }

        if self.mirror {
            let mut flipped = Mat::default();
            core::flip(&frame, &mut flipped, 1)?;
            frame = flipped;
        }

        Ok(Some(frame))
    }
}

impl FrameSource for OpenCvCamera {
    type Frame = Mat;

    fn next_frame(&mut self) -> Result<Option<Mat>> {
        self.read_frame()
    }
}

impl Drop for OpenCvCamera {
    fn drop(&mut self) {
        if let Err(e) = self.capture.release() {
            log::warn!("failed to release capture: {}", e);
        }
    }
}
