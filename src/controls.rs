//! UIイベントと操作パネル
//!
//! ウィンドウのキー入力を [`ControlKey`] に、パネルのカーソル位置を使って
//! [`UiEvent`] に変換する。状態の変更は [`ViewState::apply`] だけが行う。

use crate::error::ConfigError;
use crate::pose::taxonomy::{GroupId, Side, Taxonomy};
use crate::render::overlay::DrawMode;
use crate::visibility::VisibilityState;

/// UIから届く1操作 = 1変更
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiEvent {
    ToggleSingle(usize),
    ToggleGroup(GroupId),
    ToggleSelectAll,
    ToggleShowFrame,
    ToggleShowSkeleton,
}

/// 表示フラグと2つの表示トグル
#[derive(Debug, Clone)]
pub struct ViewState {
    pub visibility: VisibilityState,
    pub show_frame: bool,
    pub show_skeleton: bool,
}

impl ViewState {
    pub fn new(taxonomy: &Taxonomy, show_frame: bool, show_skeleton: bool) -> Self {
        Self {
            visibility: VisibilityState::new(taxonomy),
            show_frame,
            show_skeleton,
        }
    }

    pub fn draw_mode(&self) -> DrawMode {
        DrawMode::from_show_skeleton(self.show_skeleton)
    }

    /// イベントを1つ反映する
    pub fn apply(&mut self, event: UiEvent) -> Result<(), ConfigError> {
        match event {
            UiEvent::ToggleSingle(index) => {
                let value = self.visibility.toggle_single(index)?;
                tracing::debug!(index, value, "toggle keypoint");
            }
            UiEvent::ToggleGroup(group) => {
                let value = self.visibility.toggle_group(group);
                tracing::debug!(%group, value, "toggle group");
            }
            UiEvent::ToggleSelectAll => {
                let value = self.visibility.toggle_all();
                tracing::debug!(value, "toggle all");
            }
            UiEvent::ToggleShowFrame => {
                self.show_frame = !self.show_frame;
                tracing::info!(show_frame = self.show_frame, "source frame toggled");
            }
            UiEvent::ToggleShowSkeleton => {
                self.show_skeleton = !self.show_skeleton;
                tracing::info!(show_skeleton = self.show_skeleton, "skeleton toggled");
            }
        }
        Ok(())
    }
}

/// ウィンドウ側のキー操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKey {
    CursorUp,
    CursorDown,
    Toggle,
    ToggleGroup,
    SelectAll,
    ShowFrame,
    ShowSkeleton,
}

/// チェックボックス列の代わりになる操作パネル
///
/// 左列（左側と顔）→ 右列の順に対話キーポイントを並べ、カーソルで選ぶ。
#[derive(Debug, Clone)]
pub struct ControlPanel {
    order: Vec<usize>,
    cursor: usize,
}

impl ControlPanel {
    pub fn new(taxonomy: &Taxonomy) -> Self {
        let interactive: Vec<usize> = taxonomy.interactive_indices().collect();
        let side = |i: usize| taxonomy.get(i).map(|k| k.side);
        let order = interactive
            .iter()
            .copied()
            .filter(|&i| side(i) != Some(Side::Right))
            .chain(interactive.iter().copied().filter(|&i| side(i) == Some(Side::Right)))
            .collect();
        Self { order, cursor: 0 }
    }

    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// カーソル位置のキーポイント
    pub fn selected(&self) -> Option<usize> {
        self.order.get(self.cursor).copied()
    }

    pub fn on_key(&mut self, key: ControlKey, taxonomy: &Taxonomy) -> Option<UiEvent> {
        let len = self.order.len();
        match key {
            ControlKey::CursorUp => {
                if len > 0 {
                    self.cursor = (self.cursor + len - 1) % len;
                }
                None
            }
            ControlKey::CursorDown => {
                if len > 0 {
                    self.cursor = (self.cursor + 1) % len;
                }
                None
            }
            ControlKey::Toggle => self.selected().map(UiEvent::ToggleSingle),
            ControlKey::ToggleGroup => self
                .selected()
                .and_then(|i| taxonomy.groups_of(i).first().copied())
                .map(UiEvent::ToggleGroup),
            ControlKey::SelectAll => Some(UiEvent::ToggleSelectAll),
            ControlKey::ShowFrame => Some(UiEvent::ToggleShowFrame),
            ControlKey::ShowSkeleton => Some(UiEvent::ToggleShowSkeleton),
        }
    }

    /// ウィンドウタイトル用の状態表示
    pub fn status(&self, view: &ViewState, taxonomy: &Taxonomy) -> String {
        let cursor = match self.selected() {
            Some(i) => format!(
                "> {} [{}]",
                taxonomy.label(i).unwrap_or("?"),
                if view.visibility.is_visible(i) { "x" } else { " " }
            ),
            None => "-".to_string(),
        };
        format!(
            "{} | {} | {}",
            cursor,
            if view.show_frame { "Hide Frame" } else { "Show Frame" },
            if view.show_skeleton { "Hide Bones" } else { "Show Bones" },
        )
    }
}
