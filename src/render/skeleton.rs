use crate::pose::KeypointIndex;

use KeypointIndex::*;

/// 骨格の接続定義 (開始キーポイント, 終了キーポイント)
pub const POSE_CONNECTIONS: [(KeypointIndex, KeypointIndex); 35] = [
    // 顔
    (Nose, LeftEyeInner),
    (LeftEyeInner, LeftEye),
    (LeftEye, LeftEyeOuter),
    (LeftEyeOuter, LeftEar),
    (Nose, RightEyeInner),
    (RightEyeInner, RightEye),
    (RightEye, RightEyeOuter),
    (RightEyeOuter, RightEar),
    (MouthLeft, MouthRight),
    // 上半身
    (LeftShoulder, RightShoulder),
    (LeftShoulder, LeftElbow),
    (LeftElbow, LeftWrist),
    (LeftWrist, LeftPinky),
    (LeftWrist, LeftIndex),
    (LeftWrist, LeftThumb),
    (LeftPinky, LeftIndex),
    (RightShoulder, RightElbow),
    (RightElbow, RightWrist),
    (RightWrist, RightPinky),
    (RightWrist, RightIndex),
    (RightWrist, RightThumb),
    (RightPinky, RightIndex),
    // 胴体
    (LeftShoulder, LeftHip),
    (RightShoulder, RightHip),
    (LeftHip, RightHip),
    // 下半身
    (LeftHip, LeftKnee),
    (RightHip, RightKnee),
    (LeftKnee, LeftAnkle),
    (RightKnee, RightAnkle),
    (LeftAnkle, LeftHeel),
    (RightAnkle, RightHeel),
    (LeftHeel, LeftFootIndex),
    (RightHeel, RightFootIndex),
    (LeftAnkle, LeftFootIndex),
    (RightAnkle, RightFootIndex),
];

/// 選択キーポイントのマーカー色 (RGB)
pub const MARKER_COLOR: u32 = 0xFF0000; // 赤

/// 骨格モードのランドマーク色 (RGB)
pub const LANDMARK_COLOR: u32 = 0xFF0000;

/// 骨格線の色 (RGB)
pub const BONE_COLOR: u32 = 0xE0E0E0; // 薄い灰色

/// 可視スコアが低いランドマークの色 (RGB)
pub const LOW_CONFIDENCE_COLOR: u32 = 0x0000FF; // 青
