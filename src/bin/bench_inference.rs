use anyhow::Result;
use std::time::{Duration, Instant};

use keypoint_charades::camera::OpenCvCamera;
use keypoint_charades::config::Config;
use keypoint_charades::logging;
use keypoint_charades::pipeline::FrameSource;
use keypoint_charades::pose::{BlazePoseDetector, DetectorOptions, PoseEstimator};

const DEFAULT_ITERATIONS: u32 = 100;

fn main() -> Result<()> {
    logging::init();

    let iterations = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .filter(|&n: &u32| n > 0)
        .unwrap_or(DEFAULT_ITERATIONS);

    let config = Config::load_or_default("config.toml")?;
    let options = DetectorOptions::from_config(&config.detector)?;
    let mut camera = OpenCvCamera::open(&config.camera)?;
    let mut detector = BlazePoseDetector::new(&config.detector, options)?;

    // ウォームアップ
    let frame = camera.read_frame()?;
    detector.detect(&frame)?;

    let mut capture_time = Duration::ZERO;
    let mut detect_time = Duration::ZERO;
    let mut detected = 0u32;

    for _ in 0..iterations {
        let start = Instant::now();
        let frame = camera.read_frame()?;
        capture_time += start.elapsed();

        let start = Instant::now();
        if detector.detect(&frame)?.is_some() {
            detected += 1;
        }
        detect_time += start.elapsed();
    }

    let capture_ms = capture_time.as_secs_f64() * 1000.0 / iterations as f64;
    let detect_ms = detect_time.as_secs_f64() * 1000.0 / iterations as f64;
    let total_ms = capture_ms + detect_ms;

    println!("Camera capture: {:.2}ms/frame", capture_ms);
    println!("Pose detection: {:.2}ms/frame ({} / {} detected)", detect_ms, detected, iterations);
    println!("Total: {:.2}ms/frame = {:.1} FPS", total_ms, 1000.0 / total_ms);

    Ok(())
}
