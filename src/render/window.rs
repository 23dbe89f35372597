use anyhow::Result;
use minifb::{Key, KeyRepeat, Window, WindowOptions};

use crate::controls::ControlKey;
use crate::pipeline::{ControlSurface, DisplaySink};
use crate::render::canvas::FrameBuffer;

/// minifbを使用した表示ウィンドウ
///
/// 表示先とキー入力を兼ねる。状態はタイトルバーに出す。
pub struct MinifbRenderer {
    window: Window,
    title: String,
}

impl MinifbRenderer {
    /// ウィンドウを作成
    pub fn new(title: &str, width: usize, height: usize) -> Result<Self> {
        let window = Window::new(
            title,
            width,
            height,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        )?;

        Ok(Self {
            window,
            title: title.to_string(),
        })
    }
}

/// minifbのキーを操作キーに変換
pub fn control_key(key: Key) -> Option<ControlKey> {
    match key {
        Key::Up => Some(ControlKey::CursorUp),
        Key::Down => Some(ControlKey::CursorDown),
        Key::Space | Key::Enter => Some(ControlKey::Toggle),
        Key::G => Some(ControlKey::ToggleGroup),
        Key::A => Some(ControlKey::SelectAll),
        Key::F => Some(ControlKey::ShowFrame),
        Key::B => Some(ControlKey::ShowSkeleton),
        _ => None,
    }
}

impl DisplaySink for MinifbRenderer {
    fn present(&mut self, frame: &FrameBuffer) -> Result<()> {
        self.window
            .update_with_buffer(frame.pixels(), frame.width(), frame.height())?;
        Ok(())
    }
}

impl ControlSurface for MinifbRenderer {
    /// ウィンドウが開いているか
    fn is_open(&self) -> bool {
        self.window.is_open() && !self.window.is_key_down(Key::Escape)
    }

    fn poll_keys(&mut self) -> Vec<ControlKey> {
        self.window
            .get_keys_pressed(KeyRepeat::No)
            .into_iter()
            .filter_map(control_key)
            .collect()
    }

    fn set_status(&mut self, status: &str) {
        self.window.set_title(&format!("{} - {}", self.title, status));
    }
}
