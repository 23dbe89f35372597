use ndarray::Array4;

use super::crop::CropRegion;
use crate::render::canvas::{unpack_rgb, FrameBuffer};

/// BlazePose ランドマークモデルの入力サイズ
pub const BLAZEPOSE_INPUT_SIZE: usize = 256;

/// フレームの推論領域を BlazePose 用の入力テンソルに変換
///
/// - 領域を size x size に最近傍リサンプリング
/// - [1, size, size, 3] の f32 テンソル (RGB, 0.0-1.0)
pub fn preprocess_for_blazepose(frame: &FrameBuffer, roi: &CropRegion, size: usize) -> Array4<f32> {
    let mut tensor = Array4::<f32>::zeros((1, size, size, 3));
    if frame.width() == 0 || frame.height() == 0 {
        return tensor;
    }

    let fw = frame.width() as f32;
    let fh = frame.height() as f32;
    let x0 = roi.x * fw;
    let y0 = roi.y * fh;
    let step_x = roi.width * fw / size as f32;
    let step_y = roi.height * fh / size as f32;
    let max_x = frame.width() as i32 - 1;
    let max_y = frame.height() as i32 - 1;

    for ty in 0..size {
        let sy = ((y0 + (ty as f32 + 0.5) * step_y) as i32).clamp(0, max_y);
        for tx in 0..size {
            let sx = ((x0 + (tx as f32 + 0.5) * step_x) as i32).clamp(0, max_x);
            let pixel = frame.get_pixel(sx, sy).unwrap_or(0);
            let (r, g, b) = unpack_rgb(pixel);
            tensor[[0, ty, tx, 0]] = r as f32 / 255.0;
            tensor[[0, ty, tx, 1]] = g as f32 / 255.0;
            tensor[[0, ty, tx, 2]] = b as f32 / 255.0;
        }
    }

    tensor
}
