use super::keypoint::{KeypointIndex, Landmark, LandmarkFrame};

/// 推論に使う領域（正規化座標 0.0〜1.0）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropRegion {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl CropRegion {
    pub fn full() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 1.0,
            height: 1.0,
        }
    }

    pub fn is_full(&self) -> bool {
        self.width >= 1.0 && self.height >= 1.0
    }
}

/// BBox（ピクセル座標）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// 前フレームのランドマークからBBoxを推定
///
/// visibility_threshold以上のランドマークのmin/maxからBBoxを返す。
/// 有効なランドマークが2個未満ならNone。
pub fn bbox_from_landmarks(
    frame: &LandmarkFrame,
    frame_w: u32,
    frame_h: u32,
    visibility_threshold: f32,
) -> Option<BBox> {
    let (fw, fh) = (frame_w as f32, frame_h as f32);
    let mut points = frame
        .landmarks()
        .iter()
        .filter(|lm| lm.visibility >= visibility_threshold)
        .map(|lm| (lm.x * fw, lm.y * fh));

    let first = points.next()?;
    let (mut lo, mut hi, mut count) = (first, first, 1);
    for (px, py) in points {
        lo = (lo.0.min(px), lo.1.min(py));
        hi = (hi.0.max(px), hi.1.max(py));
        count += 1;
    }
    if count < 2 {
        return None;
    }

    Some(BBox {
        x: lo.0,
        y: lo.1,
        width: hi.0 - lo.0,
        height: hi.1 - lo.1,
    })
}

/// BBoxから次フレームの推論領域を計算
///
/// - 1.25倍に拡張（中心を保持）
/// - 正方形（ピクセル単位）に調整
/// - フレーム境界にクリップ
pub fn roi_from_bbox(bbox: &BBox, frame_w: u32, frame_h: u32) -> CropRegion {
    let expand = 1.25;
    let cx = bbox.x + bbox.width / 2.0;
    let cy = bbox.y + bbox.height / 2.0;
    let side = bbox.width.max(bbox.height) * expand;

    let fw = frame_w as f32;
    let fh = frame_h as f32;
    let x = (cx - side / 2.0).max(0.0);
    let y = (cy - side / 2.0).max(0.0);
    let w = side.min(fw - x).max(1.0);
    let h = side.min(fh - y).max(1.0);

    CropRegion {
        x: x / fw,
        y: y / fh,
        width: w / fw,
        height: h / fh,
    }
}

/// 領域内の正規化座標をフレーム全体の正規化座標に変換
pub fn remap_landmarks(frame: &LandmarkFrame, crop: &CropRegion) -> LandmarkFrame {
    let mut landmarks = [Landmark::default(); KeypointIndex::COUNT];
    for (dst, src) in landmarks.iter_mut().zip(frame.landmarks()) {
        *dst = Landmark {
            x: crop.x + src.x * crop.width,
            y: crop.y + src.y * crop.height,
            visibility: src.visibility,
        };
    }
    LandmarkFrame::new(landmarks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crop_region_full() {
        let region = CropRegion::full();
        assert!(region.is_full());
        assert_eq!(region.x, 0.0);
        assert_eq!(region.y, 0.0);
    }

    #[test]
    fn test_bbox_from_landmarks_basic() {
        let mut landmarks = [Landmark::default(); KeypointIndex::COUNT];
        landmarks[KeypointIndex::LeftShoulder as usize] = Landmark::new(0.25, 0.25, 0.9);
        landmarks[KeypointIndex::RightShoulder as usize] = Landmark::new(0.75, 0.5, 0.8);

        let frame = LandmarkFrame::new(landmarks);
        let bbox = bbox_from_landmarks(&frame, 640, 480, 0.5).unwrap();
        // 0.25 * 640 = 160, 0.75 * 640 = 480
        assert!((bbox.x - 160.0).abs() < 1.0);
        // 0.25 * 480 = 120, 0.5 * 480 = 240
        assert!((bbox.y - 120.0).abs() < 1.0);
        assert!((bbox.width - 320.0).abs() < 1.0);
        assert!((bbox.height - 120.0).abs() < 1.0);
    }

    #[test]
    fn test_bbox_from_landmarks_low_visibility() {
        let mut landmarks = [Landmark::default(); KeypointIndex::COUNT];
        // 1つだけ有効 → 2個未満なのでNone
        landmarks[KeypointIndex::Nose as usize] = Landmark::new(0.5, 0.5, 0.9);

        let frame = LandmarkFrame::new(landmarks);
        assert!(bbox_from_landmarks(&frame, 640, 480, 0.5).is_none());
    }

    #[test]
    fn test_roi_is_square_and_centered() {
        let bbox = BBox {
            x: 300.0,
            y: 200.0,
            width: 100.0,
            height: 200.0,
        };
        let roi = roi_from_bbox(&bbox, 1000, 1000);
        // 一辺 = 200 * 1.25 = 250, 中心 (350, 300)
        assert!((roi.width - 0.25).abs() < 1e-6);
        assert!((roi.height - 0.25).abs() < 1e-6);
        assert!((roi.x - 0.225).abs() < 1e-6);
        assert!((roi.y - 0.175).abs() < 1e-6);
    }

    #[test]
    fn test_roi_clipped_to_frame() {
        let bbox = BBox {
            x: 0.0,
            y: 0.0,
            width: 200.0,
            height: 200.0,
        };
        let roi = roi_from_bbox(&bbox, 400, 400);
        assert_eq!(roi.x, 0.0);
        assert_eq!(roi.y, 0.0);
        assert!(roi.x + roi.width <= 1.0 + 1e-6);
        assert!(roi.y + roi.height <= 1.0 + 1e-6);
    }

    #[test]
    fn test_remap_landmarks() {
        let crop = CropRegion {
            x: 0.25,
            y: 0.1,
            width: 0.5,
            height: 0.8,
        };

        let mut landmarks = [Landmark::default(); KeypointIndex::COUNT];
        landmarks[KeypointIndex::Nose as usize] = Landmark::new(0.5, 0.5, 0.9);

        let remapped = remap_landmarks(&LandmarkFrame::new(landmarks), &crop);

        let nose = remapped.get(KeypointIndex::Nose);
        // new_x = 0.25 + 0.5 * 0.5 = 0.5
        assert!((nose.x - 0.5).abs() < 1e-6);
        // new_y = 0.1 + 0.5 * 0.8 = 0.5
        assert!((nose.y - 0.5).abs() < 1e-6);
        assert_eq!(nose.visibility, 0.9);

        // (0,0) のランドマークは領域の左上にマッピング
        let eye = remapped.get(KeypointIndex::LeftEye);
        assert!((eye.x - 0.25).abs() < 1e-6);
        assert!((eye.y - 0.1).abs() < 1e-6);
    }
}
