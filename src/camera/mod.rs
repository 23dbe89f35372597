#[cfg(feature = "desktop")]
mod capture;

#[cfg(feature = "desktop")]
pub use capture::OpenCvCamera;

/// 表示幅に合わせてアスペクト比を保った高さを求める
///
/// カメラが解像度を返さない場合は 4:3 とみなす。
pub fn display_size(capture_width: u32, capture_height: u32, display_width: u32) -> (u32, u32) {
    if capture_width == 0 || capture_height == 0 {
        return (display_width, (display_width * 3 / 4).max(1));
    }
    let height = (display_width as u64 * capture_height as u64 / capture_width as u64).max(1);
    (display_width, height as u32)
}
