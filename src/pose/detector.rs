use anyhow::{bail, Result};

use super::crop::{bbox_from_landmarks, remap_landmarks, roi_from_bbox, CropRegion};
use super::keypoint::{KeypointIndex, Landmark, LandmarkFrame};
use crate::config::DetectorConfig;
use crate::error::ConfigError;
use crate::render::canvas::FrameBuffer;

/// ランドマーク1個あたりの出力値 (x, y, z, visibility, presence)
pub const LANDMARK_STRIDE: usize = 5;

/// フレームから姿勢を推定する
///
/// 人物が映っていないのはエラーではなく `Ok(None)`。
pub trait PoseEstimator {
    fn detect(&mut self, frame: &FrameBuffer) -> Result<Option<LandmarkFrame>>;
}

/// モデルの重さ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelComplexity {
    Lite,
    Full,
    Heavy,
}

impl ModelComplexity {
    pub fn from_tier(tier: u8) -> Result<Self, ConfigError> {
        match tier {
            0 => Ok(Self::Lite),
            1 => Ok(Self::Full),
            2 => Ok(Self::Heavy),
            other => Err(ConfigError::InvalidModelComplexity(other)),
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            Self::Lite => "pose_landmark_lite.onnx",
            Self::Full => "pose_landmark_full.onnx",
            Self::Heavy => "pose_landmark_heavy.onnx",
        }
    }
}

/// 構築時に固定される検出器の設定
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorOptions {
    pub min_detection_confidence: f32,
    pub min_tracking_confidence: f32,
    pub static_image_mode: bool,
    pub complexity: ModelComplexity,
}

impl DetectorOptions {
    pub fn from_config(config: &DetectorConfig) -> Result<Self, ConfigError> {
        for (name, value) in [
            ("detector.min_detection_confidence", config.min_detection_confidence),
            ("detector.min_tracking_confidence", config.min_tracking_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidThreshold { name, value });
            }
        }
        Ok(Self {
            min_detection_confidence: config.min_detection_confidence,
            min_tracking_confidence: config.min_tracking_confidence,
            static_image_mode: config.static_image_mode,
            complexity: ModelComplexity::from_tier(config.model_complexity)?,
        })
    }
}

impl Default for DetectorOptions {
    fn default() -> Self {
        Self {
            min_detection_confidence: 0.5,
            min_tracking_confidence: 0.5,
            static_image_mode: false,
            complexity: ModelComplexity::Full,
        }
    }
}

pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// モデル出力（入力画像のピクセル座標）をフレーム全体の正規化座標に変換
///
/// visibility はロジットなので sigmoid をかける。座標は [0, 1] にクランプ。
pub fn decode_landmarks(raw: &[f32], roi: &CropRegion, input_size: usize) -> Result<LandmarkFrame> {
    let needed = KeypointIndex::COUNT * LANDMARK_STRIDE;
    if raw.len() < needed {
        bail!("landmark tensor too short: {} < {}", raw.len(), needed);
    }

    let size = input_size as f32;
    let mut landmarks = [Landmark::default(); KeypointIndex::COUNT];
    for (i, lm) in landmarks.iter_mut().enumerate() {
        let v = &raw[i * LANDMARK_STRIDE..(i + 1) * LANDMARK_STRIDE];
        *lm = Landmark::new(v[0] / size, v[1] / size, sigmoid(v[3]));
    }

    let mut remapped = *remap_landmarks(&LandmarkFrame::new(landmarks), roi).landmarks();
    for lm in remapped.iter_mut() {
        lm.x = lm.x.clamp(0.0, 1.0);
        lm.y = lm.y.clamp(0.0, 1.0);
    }
    Ok(LandmarkFrame::new(remapped))
}

/// 存在スコア出力の先頭値を [0, 1] の確率として取り出す
///
/// pose flag 出力はモデル内で sigmoid 済み。空・NaN は 0（不在）。
pub fn decode_presence(raw: &[f32]) -> f32 {
    match raw.first() {
        Some(&p) if p.is_finite() => p.clamp(0.0, 1.0),
        _ => 0.0,
    }
}

/// 前フレームの結果から次の推論領域を決める
#[derive(Debug, Clone, Default)]
pub struct TrackingState {
    roi: Option<CropRegion>,
}

impl TrackingState {
    /// 次に推論する領域。追跡中でなければフレーム全体
    pub fn roi(&self) -> CropRegion {
        self.roi.unwrap_or_else(CropRegion::full)
    }

    pub fn is_tracking(&self) -> bool {
        self.roi.is_some()
    }

    /// 存在スコアの閾値。追跡中は min_tracking_confidence
    pub fn presence_threshold(&self, options: &DetectorOptions) -> f32 {
        if self.is_tracking() {
            options.min_tracking_confidence
        } else {
            options.min_detection_confidence
        }
    }

    /// 存在スコアが現在の閾値以上か
    pub fn is_present(&self, presence: f32, options: &DetectorOptions) -> bool {
        presence >= self.presence_threshold(options)
    }

    /// 検出結果で追跡領域を更新。見失ったらフレーム全体に戻す
    pub fn update(
        &mut self,
        detected: Option<&LandmarkFrame>,
        frame_w: u32,
        frame_h: u32,
        options: &DetectorOptions,
    ) {
        if options.static_image_mode {
            self.roi = None;
            return;
        }
        self.roi = detected
            .and_then(|lm| {
                bbox_from_landmarks(lm, frame_w, frame_h, options.min_tracking_confidence)
            })
            .map(|bbox| roi_from_bbox(&bbox, frame_w, frame_h));
    }

    pub fn reset(&mut self) {
        self.roi = None;
    }
}

#[cfg(feature = "desktop")]
pub use blazepose::BlazePoseDetector;

#[cfg(feature = "desktop")]
mod blazepose {
    use anyhow::{Context, Result};
    use ort::session::builder::GraphOptimizationLevel;
    use ort::session::Session;
    use ort::value::Tensor;
    use std::path::Path;

    use super::{decode_landmarks, decode_presence, DetectorOptions, PoseEstimator, TrackingState};
    use crate::config::DetectorConfig;
    use crate::pose::keypoint::LandmarkFrame;
    use crate::pose::preprocess::{preprocess_for_blazepose, BLAZEPOSE_INPUT_SIZE};
    use crate::render::canvas::FrameBuffer;

    /// BlazePose ランドマークモデル (ONNX) を使用した姿勢検出器
    pub struct BlazePoseDetector {
        session: Session,
        options: DetectorOptions,
        tracking: TrackingState,
        input_name: String,
        landmarks_output: String,
        presence_output: String,
    }

    impl BlazePoseDetector {
        /// `model_dir` からモデルの重さに応じたファイルを読み込む
        pub fn new(config: &DetectorConfig, options: DetectorOptions) -> Result<Self> {
            let model_path = Path::new(&config.model_dir).join(options.complexity.file_name());
            let session = Session::builder()?
                .with_optimization_level(GraphOptimizationLevel::Level3)?
                .commit_from_file(&model_path)
                .with_context(|| format!("Failed to load ONNX model {}", model_path.display()))?;
            tracing::info!("loaded pose model {}", model_path.display());

            Ok(Self {
                session,
                options,
                tracking: TrackingState::default(),
                input_name: config.input_name.clone(),
                landmarks_output: config.landmarks_output.clone(),
                presence_output: config.presence_output.clone(),
            })
        }
    }

    impl PoseEstimator for BlazePoseDetector {
        fn detect(&mut self, frame: &FrameBuffer) -> Result<Option<LandmarkFrame>> {
            let roi = self.tracking.roi();
            let input = preprocess_for_blazepose(frame, &roi, BLAZEPOSE_INPUT_SIZE);
            let input_tensor = Tensor::from_array(input)?;

            let outputs = self
                .session
                .run(ort::inputs![self.input_name.as_str() => input_tensor])
                .context("Inference failed")?;

            let presence: ndarray::ArrayViewD<f32> = outputs[self.presence_output.as_str()]
                .try_extract_array()
                .context("Failed to extract presence tensor")?;
            let presence: Vec<f32> = presence.iter().copied().collect();
            let presence = decode_presence(&presence);

            let (w, h) = frame.size();
            if !self.tracking.is_present(presence, &self.options) {
                tracing::debug!(
                    presence,
                    threshold = self.tracking.presence_threshold(&self.options),
                    "no pose in frame"
                );
                self.tracking.reset();
                return Ok(None);
            }

            let raw: ndarray::ArrayViewD<f32> = outputs[self.landmarks_output.as_str()]
                .try_extract_array()
                .context("Failed to extract landmark tensor")?;
            let raw: Vec<f32> = raw.iter().copied().collect();
            let landmarks = decode_landmarks(&raw, &roi, BLAZEPOSE_INPUT_SIZE)?;

            self.tracking.update(Some(&landmarks), w, h, &self.options);
            Ok(Some(landmarks))
        }
    }
}
