use anyhow::{Context, Result};
use opencv::{
    core::{Mat, Size},
    prelude::*,
    videoio::{VideoWriter, VideoWriterTrait},
};

use crate::session::FrameOutput;

/// 描画済みフレームを mp4 (mp4v) に書き出す
pub struct VideoRecorder {
    writer: VideoWriter,
    path: String,
    frames: u64,
}

impl VideoRecorder {
    pub fn create(path: &str, fps: u32, (width, height): (u32, u32)) -> Result<Self> {
        let fourcc = VideoWriter::fourcc('m', 'p', '4', 'v')?;
        let writer = VideoWriter::new(
            path,
            fourcc,
            fps as f64,
            Size::new(width as i32, height as i32),
            true,
        )
        .with_context(|| format!("Failed to create recorder {}", path))?;

        if !writer.is_opened()? {
            anyhow::bail!("Recorder {} could not be opened", path);
        }
        log::info!("recording to {} ({}x{} @ {} fps)", path, width, height, fps);

        Ok(Self {
            writer,
            path: path.to_string(),
            frames: 0,
        })
    }
}

impl FrameOutput<Mat> for VideoRecorder {
    fn present(&mut self, frame: &Mat) -> Result<()> {
        self.writer.write(frame)?;
        self.frames += 1;
        Ok(())
    }
}

impl Drop for VideoRecorder {
    fn drop(&mut self) {
        match self.writer.release() {
            Ok(()) => log::info!("saved {} frames to {}", self.frames, self.path),
            Err(e) => log::warn!("failed to finalize {}: {}", self.path, e),
        }
    }
}
