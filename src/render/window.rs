use anyhow::Result;
use minifb::{Key, Window, WindowOptions};
use opencv::core::Mat;
use opencv::prelude::*;

use crate::session::FrameOutput;

/// minifbを使用したプレビューウィンドウ
pub struct MinifbRenderer {
    window: Window,
    buffer: Vec<u32>,
    width: usize,
    height: usize,
}

impl MinifbRenderer {
    /// ウィンドウを作成
    pub fn new(title: &str, width: usize, height: usize) -> Result<Self> {
        let window = Window::new(
            title,
            width,
            height,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        )?;

        let buffer = vec![0u32; width * height];

        Ok(Self {
            window,
            buffer,
            width,
            height,
        })
    }

    /// ウィンドウが開いていて、終了キー (Esc / Q) が押されていないか
    pub fn is_open(&self) -> bool {
        self.window.is_open()
            && !self.window.is_key_down(Key::Escape)
            && !self.window.is_key_down(Key::Q)
    }

    /// BGR Mat をバッファにコピー
    pub fn draw_frame(&mut self, frame: &Mat) -> Result<()> {
        let frame_width = frame.cols() as usize;
        let frame_height = frame.rows() as usize;

        // サイズが異なる場合はクロップ/パディング
        for y in 0..self.height.min(frame_height) {
            for x in 0..self.width.min(frame_width) {
                let pixel = frame.at_2d::<opencv::core::Vec3b>(y as i32, x as i32)?;
                // BGR -> RGB -> u32
                let r = pixel[2] as u32;
                let g = pixel[1] as u32;
                let b = pixel[0] as u32;
                self.buffer[y * self.width + x] = (r << 16) | (g << 8) | b;
            }
        }

        Ok(())
    }

    /// バッファをウィンドウに表示
    pub fn update(&mut self) -> Result<()> {
        self.window
            .update_with_buffer(&self.buffer, self.width, self.height)?;
        Ok(())
    }
}

impl FrameOutput<Mat> for MinifbRenderer {
    fn present(&mut self, frame: &Mat) -> Result<()> {
        self.draw_frame(frame)?;
        self.update()
    }

    fn stop_requested(&mut self) -> bool {
        !self.is_open()
    }
}
