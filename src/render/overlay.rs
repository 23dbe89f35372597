//! 選択描画
//!
//! 骨格モードは表示フラグを無視して骨格全体を描く。
//! ポイントモードはグループ内で1つでも表示中なら、そのグループ全員を描く。

use crate::config::RenderConfig;
use crate::pose::taxonomy::{GroupId, Taxonomy};
use crate::pose::LandmarkFrame;
use crate::render::canvas::FrameBuffer;
use crate::render::skeleton::POSE_CONNECTIONS;
use crate::visibility::VisibilityState;

/// 描画モード
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawMode {
    /// 骨格グラフ全体
    Skeleton,
    /// 表示フラグで選ばれたポイントのみ
    Points,
}

impl DrawMode {
    pub fn from_show_skeleton(show_skeleton: bool) -> Self {
        if show_skeleton {
            Self::Skeleton
        } else {
            Self::Points
        }
    }
}

/// 描いたマーカー（ピクセル座標）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Marker {
    pub index: usize,
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderReport {
    pub markers: Vec<Marker>,
    pub bones: usize,
}

impl RenderReport {
    pub fn marker_indices(&self) -> Vec<usize> {
        self.markers.iter().map(|m| m.index).collect()
    }
}

/// ポイントモードで描くキーポイント（昇順）
///
/// 1. グループ内に表示中のメンバーが1つでもあれば、メンバー全員
/// 2. 残りの対話キーポイントは自分のフラグに従う
pub fn point_mode_indices(taxonomy: &Taxonomy, visibility: &VisibilityState) -> Vec<usize> {
    let mut selected = vec![false; taxonomy.len()];

    for group in GroupId::ALL {
        if visibility.any_visible(group) {
            for &i in taxonomy.members(group) {
                selected[i] = true;
            }
        }
    }

    for i in taxonomy.interactive_indices() {
        if !selected[i] && visibility.is_visible(i) {
            selected[i] = true;
        }
    }

    selected
        .iter()
        .enumerate()
        .filter(|(_, s)| **s)
        .map(|(i, _)| i)
        .collect()
}

pub struct SelectiveRenderer {
    style: RenderConfig,
}

impl SelectiveRenderer {
    pub fn new(style: RenderConfig) -> Self {
        Self { style }
    }

    pub fn style(&self) -> &RenderConfig {
        &self.style
    }

    /// `base` を複製して注釈を描く。ランドマークが無ければ複製をそのまま返す
    pub fn render(
        &self,
        base: &FrameBuffer,
        landmarks: Option<&LandmarkFrame>,
        visibility: &VisibilityState,
        taxonomy: &Taxonomy,
        mode: DrawMode,
    ) -> (FrameBuffer, RenderReport) {
        let mut canvas = base.clone();
        let report = match landmarks {
            Some(landmarks) => self.draw(&mut canvas, landmarks, visibility, taxonomy, mode),
            None => RenderReport::default(),
        };
        (canvas, report)
    }

    /// キャンバスに直接描く
    pub fn draw(
        &self,
        canvas: &mut FrameBuffer,
        landmarks: &LandmarkFrame,
        visibility: &VisibilityState,
        taxonomy: &Taxonomy,
        mode: DrawMode,
    ) -> RenderReport {
        match mode {
            DrawMode::Skeleton => self.draw_skeleton(canvas, landmarks),
            DrawMode::Points => self.draw_points(canvas, landmarks, visibility, taxonomy),
        }
    }

    fn draw_skeleton(&self, canvas: &mut FrameBuffer, landmarks: &LandmarkFrame) -> RenderReport {
        let (w, h) = canvas.size();
        let style = &self.style;
        let mut report = RenderReport::default();

        // 骨格線を描画
        for &(start, end) in POSE_CONNECTIONS.iter() {
            let (x1, y1) = landmarks.get(start).to_pixel(w, h);
            let (x2, y2) = landmarks.get(end).to_pixel(w, h);
            canvas.draw_line(x1, y1, x2, y2, style.bone_thickness, style.bone_color);
            report.bones += 1;
        }

        // ランドマークを描画
        for (index, lm) in landmarks.landmarks().iter().enumerate() {
            let (x, y) = lm.to_pixel(w, h);
            let color = if lm.is_valid(style.visibility_threshold) {
                style.landmark_color
            } else {
                style.low_confidence_color
            };
            canvas.draw_circle(x, y, style.landmark_radius, color);
            report.markers.push(Marker { index, x, y });
        }

        report
    }

    fn draw_points(
        &self,
        canvas: &mut FrameBuffer,
        landmarks: &LandmarkFrame,
        visibility: &VisibilityState,
        taxonomy: &Taxonomy,
    ) -> RenderReport {
        let (w, h) = canvas.size();
        let mut report = RenderReport::default();

        for index in point_mode_indices(taxonomy, visibility) {
            let Some(lm) = landmarks.at(index) else {
                continue;
            };
            let (x, y) = lm.to_pixel(w, h);
            canvas.draw_circle(x, y, self.style.marker_radius, self.style.marker_color);
            report.markers.push(Marker { index, x, y });
        }

        report
    }
}
