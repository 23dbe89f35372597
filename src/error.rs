use crate::pose::taxonomy::GroupId;

/// 起動時の構成エラー（キーポイント分類・設定値の検証）
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("expected {expected} keypoints, got {actual}")]
    KeypointCount { expected: usize, actual: usize },

    #[error("invalid keypoint label {index}: {label:?} (no left/right/face marker)")]
    UnclassifiedLabel { index: usize, label: String },

    #[error("group {group} references keypoint {index} outside 0..{len}")]
    GroupIndexOutOfRange { group: GroupId, index: usize, len: usize },

    #[error("keypoint index {index} is outside 0..{len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("keypoint {index} ({label}) cannot be toggled individually")]
    NonInteractive { index: usize, label: String },

    #[error("model complexity must be 0, 1 or 2 (got {0})")]
    InvalidModelComplexity(u8),

    #[error("{name} must be within [0, 1] (got {value})")]
    InvalidThreshold { name: &'static str, value: f32 },

    #[error("{name} must be positive (got {value})")]
    NonPositive { name: &'static str, value: i64 },

    #[error("{name} must be at most {max} (got {value})")]
    OutOfRange { name: &'static str, value: i64, max: i64 },
}
