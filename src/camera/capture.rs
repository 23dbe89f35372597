use anyhow::{Context, Result};
use opencv::{
    core::{Mat, Size, Vec3b},
    imgproc,
    prelude::*,
    videoio::{self, VideoCapture, VideoCaptureAPIs, VideoCaptureTrait},
};

use super::display_size;
use crate::config::CameraConfig;
use crate::pipeline::FrameSource;
use crate::render::canvas::{rgb, FrameBuffer};

/// OpenCVを使用したカメラキャプチャ
///
/// 読み込んだフレームは表示幅にリサイズして [`FrameBuffer`] で返す。
pub struct OpenCvCamera {
    capture: VideoCapture,
    display_width: u32,
    display_height: u32,
    resized: Mat,
}

impl OpenCvCamera {
    /// 設定に従ってカメラを開く
    pub fn open(config: &CameraConfig) -> Result<Self> {
        let index = config.index;
        let mut capture = VideoCapture::new(index, VideoCaptureAPIs::CAP_ANY as i32)
            .with_context(|| format!("Failed to open camera {}", index))?;

        if !capture.is_opened()? {
            anyhow::bail!("Camera {} is not available", index);
        }

        // 解像度を設定
        if let Some(w) = config.capture_width {
            capture.set(videoio::CAP_PROP_FRAME_WIDTH, w as f64)?;
        }
        if let Some(h) = config.capture_height {
            capture.set(videoio::CAP_PROP_FRAME_HEIGHT, h as f64)?;
        }
        capture.set(videoio::CAP_PROP_BUFFERSIZE, 1.0)?;

        let actual_width = capture.get(videoio::CAP_PROP_FRAME_WIDTH)? as u32;
        let actual_height = capture.get(videoio::CAP_PROP_FRAME_HEIGHT)? as u32;
        let (display_width, display_height) =
            display_size(actual_width, actual_height, config.display_width);
        tracing::info!(
            "Camera {}: {}x{} @ {} FPS, display {}x{}",
            index,
            actual_width,
            actual_height,
            capture.get(videoio::CAP_PROP_FPS)?,
            display_width,
            display_height
        );

        Ok(Self {
            capture,
            display_width,
            display_height,
            resized: Mat::default(),
        })
    }

    /// BGR Mat を表示サイズの [`FrameBuffer`] に変換
    fn to_frame_buffer(&mut self, frame: &Mat) -> Result<FrameBuffer> {
        let size = Size::new(self.display_width as i32, self.display_height as i32);
        imgproc::resize(frame, &mut self.resized, size, 0.0, 0.0, imgproc::INTER_LINEAR)?;

        let width = self.display_width as usize;
        let height = self.display_height as usize;
        let mut pixels = vec![0u32; width * height];
        for y in 0..height {
            for x in 0..width {
                let pixel = self.resized.at_2d::<Vec3b>(y as i32, x as i32)?;
                // BGR -> RGB -> u32
                pixels[y * width + x] = rgb(pixel[2], pixel[1], pixel[0]);
            }
        }

        FrameBuffer::from_pixels(width, height, pixels).context("pixel buffer size mismatch")
    }
}

impl FrameSource for OpenCvCamera {
    fn read_frame(&mut self) -> Result<FrameBuffer> {
        let mut frame = Mat::default();
        let grabbed = self
            .capture
            .read(&mut frame)
            .context("Failed to read frame")?;

        if !grabbed || frame.empty() {
            anyhow::bail!("Empty frame received");
        }

        self.to_frame_buffer(&frame)
    }

    fn resolution(&self) -> (u32, u32) {
        (self.display_width, self.display_height)
    }
}
