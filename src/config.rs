use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::ConfigError;
use crate::render::skeleton::{BONE_COLOR, LANDMARK_COLOR, LOW_CONFIDENCE_COLOR, MARKER_COLOR};

#[derive(Debug, Default, Deserialize, Clone, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub detector: DetectorConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CameraConfig {
    /// カメラ番号
    #[serde(default)]
    pub index: i32,
    /// 表示幅（高さはカメラのアスペクト比に合わせる）
    #[serde(default = "default_display_width")]
    pub display_width: u32,
    /// キャプチャ解像度の要求値（未指定ならカメラ既定）
    #[serde(default)]
    pub capture_width: Option<u32>,
    #[serde(default)]
    pub capture_height: Option<u32>,
}

fn default_display_width() -> u32 { 800 }

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            index: 0,
            display_width: default_display_width(),
            capture_width: None,
            capture_height: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct DetectorConfig {
    /// pose_landmark_{lite,full,heavy}.onnx を置くディレクトリ
    #[serde(default = "default_model_dir")]
    pub model_dir: String,
    /// 0: lite, 1: full, 2: heavy
    #[serde(default = "default_model_complexity")]
    pub model_complexity: u8,
    #[serde(default = "default_confidence")]
    pub min_detection_confidence: f32,
    #[serde(default = "default_confidence")]
    pub min_tracking_confidence: f32,
    /// true なら前フレームを使ったトラッキングを行わない
    #[serde(default)]
    pub static_image_mode: bool,
    #[serde(default = "default_input_name")]
    pub input_name: String,
    #[serde(default = "default_landmarks_output")]
    pub landmarks_output: String,
    #[serde(default = "default_presence_output")]
    pub presence_output: String,
}

fn default_model_dir() -> String { "models".to_string() }
fn default_model_complexity() -> u8 { 1 }
fn default_confidence() -> f32 { 0.5 }
fn default_input_name() -> String { "input_1".to_string() }
fn default_landmarks_output() -> String { "Identity".to_string() }
fn default_presence_output() -> String { "Identity_1".to_string() }

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            model_dir: default_model_dir(),
            model_complexity: default_model_complexity(),
            min_detection_confidence: default_confidence(),
            min_tracking_confidence: default_confidence(),
            static_image_mode: false,
            input_name: default_input_name(),
            landmarks_output: default_landmarks_output(),
            presence_output: default_presence_output(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct RenderConfig {
    /// ポイントモードのマーカー半径（ピクセル）
    #[serde(default = "default_marker_radius")]
    pub marker_radius: i32,
    #[serde(default = "default_marker_color")]
    pub marker_color: u32,
    /// 骨格モードのランドマーク半径
    #[serde(default = "default_landmark_radius")]
    pub landmark_radius: i32,
    #[serde(default = "default_landmark_color")]
    pub landmark_color: u32,
    #[serde(default = "default_bone_color")]
    pub bone_color: u32,
    #[serde(default = "default_bone_thickness")]
    pub bone_thickness: i32,
    #[serde(default = "default_low_confidence_color")]
    pub low_confidence_color: u32,
    /// これ未満の可視スコアは低信頼色で描く（骨格モードのみ）
    #[serde(default = "default_confidence")]
    pub visibility_threshold: f32,
}

fn default_marker_radius() -> i32 { 5 }
fn default_marker_color() -> u32 { MARKER_COLOR }
fn default_landmark_radius() -> i32 { 2 }
fn default_landmark_color() -> u32 { LANDMARK_COLOR }
fn default_bone_color() -> u32 { BONE_COLOR }
fn default_bone_thickness() -> i32 { 2 }
fn default_low_confidence_color() -> u32 { LOW_CONFIDENCE_COLOR }

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            marker_radius: default_marker_radius(),
            marker_color: default_marker_color(),
            landmark_radius: default_landmark_radius(),
            landmark_color: default_landmark_color(),
            bone_color: default_bone_color(),
            bone_thickness: default_bone_thickness(),
            low_confidence_color: default_low_confidence_color(),
            visibility_threshold: default_confidence(),
        }
    }
}

/// 半径・線幅の上限（ピクセル）
pub const MAX_BRUSH_SIZE: i32 = 1024;

impl RenderConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("render.marker_radius", self.marker_radius),
            ("render.landmark_radius", self.landmark_radius),
            ("render.bone_thickness", self.bone_thickness),
        ] {
            if value <= 0 {
                return Err(ConfigError::NonPositive { name, value: value as i64 });
            }
            if value > MAX_BRUSH_SIZE {
                return Err(ConfigError::OutOfRange {
                    name,
                    value: value as i64,
                    max: MAX_BRUSH_SIZE as i64,
                });
            }
        }
        if !(0.0..=1.0).contains(&self.visibility_threshold) {
            return Err(ConfigError::InvalidThreshold {
                name: "render.visibility_threshold",
                value: self.visibility_threshold,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct PipelineConfig {
    /// 1ティックごとの待ち時間（ミリ秒）
    #[serde(default = "default_tick_delay_ms")]
    pub tick_delay_ms: u64,
    #[serde(default = "default_true")]
    pub show_frame: bool,
    #[serde(default = "default_true")]
    pub show_skeleton: bool,
}

fn default_tick_delay_ms() -> u64 { 10 }
fn default_true() -> bool { true }

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            tick_delay_ms: default_tick_delay_ms(),
            show_frame: true,
            show_skeleton: true,
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("failed to parse {}", path.display()))
    }

    /// ファイルが無ければ既定値。読めるのに壊れている場合はエラー
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::info!("{} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.render.validate()?;
        if config.camera.display_width == 0 {
            return Err(ConfigError::NonPositive {
                name: "camera.display_width",
                value: 0,
            }
            .into());
        }
        Ok(config)
    }
}
