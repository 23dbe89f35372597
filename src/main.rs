use anyhow::{Context, Result};
use std::time::Duration;

use keypoint_charades::camera::OpenCvCamera;
use keypoint_charades::config::Config;
use keypoint_charades::controls::ViewState;
use keypoint_charades::logging;
use keypoint_charades::pipeline::{FramePipeline, FrameSource, SleepTicker};
use keypoint_charades::pose::{BlazePoseDetector, DetectorOptions, Taxonomy};
use keypoint_charades::render::{MinifbRenderer, SelectiveRenderer};

const CONFIG_PATH: &str = "config.toml";
const WINDOW_TITLE: &str = "Keypoint Charades";

fn main() -> Result<()> {
    logging::init();
    tracing::info!("=== Keypoint Charades {} ===", env!("GIT_VERSION"));

    let config = Config::load_or_default(CONFIG_PATH)?;
    let taxonomy = Taxonomy::blazepose()?;
    let options = DetectorOptions::from_config(&config.detector)?;

    let camera = OpenCvCamera::open(&config.camera).context("camera setup failed")?;
    let (width, height) = camera.resolution();

    tracing::info!("Loading {} ...", options.complexity.file_name());
    let detector = BlazePoseDetector::new(&config.detector, options)?;

    let mut window = MinifbRenderer::new(WINDOW_TITLE, width as usize, height as usize)?;
    tracing::info!(
        "Keys: Up/Down select, Space toggle, G group, A all, F frame, B bones, Esc quit"
    );

    let view = ViewState::new(&taxonomy, config.pipeline.show_frame, config.pipeline.show_skeleton);
    let mut pipeline = FramePipeline::new(
        camera,
        detector,
        taxonomy,
        SelectiveRenderer::new(config.render.clone()),
        view,
        Duration::from_millis(config.pipeline.tick_delay_ms),
    );

    pipeline.run(&mut window, &mut SleepTicker);
    Ok(())
}
