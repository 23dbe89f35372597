//! キャプチャ → 検出 → 描画 → 表示 を1ティックずつ回す状態機械
//!
//! どの段階で失敗してもループは止めない。キャプチャ失敗は前フレーム（無ければ黒）、
//! 検出失敗は注釈なしの表示に落とす。

use anyhow::Result;
use std::thread;
use std::time::{Duration, Instant};

use crate::controls::{ControlKey, ControlPanel, UiEvent, ViewState};
use crate::error::ConfigError;
use crate::pose::{LandmarkFrame, PoseEstimator, Taxonomy};
use crate::render::canvas::FrameBuffer;
use crate::render::overlay::{RenderReport, SelectiveRenderer};

/// カメラ等のフレーム供給元
pub trait FrameSource {
    fn read_frame(&mut self) -> Result<FrameBuffer>;
    /// 表示解像度 (幅, 高さ)
    fn resolution(&self) -> (u32, u32);
}

/// 注釈済みフレームの表示先
pub trait DisplaySink {
    fn present(&mut self, frame: &FrameBuffer) -> Result<()>;
}

/// キー入力を出すUI
pub trait ControlSurface {
    fn is_open(&self) -> bool;
    fn poll_keys(&mut self) -> Vec<ControlKey>;
    fn set_status(&mut self, _status: &str) {}
}

/// 次のティックまで待つ
pub trait Ticker {
    fn wait(&mut self, delay: Duration);
}

/// `thread::sleep` で待つ
#[derive(Debug, Default)]
pub struct SleepTicker;

impl Ticker for SleepTicker {
    fn wait(&mut self, delay: Duration) {
        thread::sleep(delay);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Capturing,
    Detecting,
    Rendering,
    Presenting,
}

impl PipelineState {
    /// 固定順の次状態。Presenting の次は Idle
    pub fn next(self) -> Self {
        match self {
            Self::Idle => Self::Capturing,
            Self::Capturing => Self::Detecting,
            Self::Detecting => Self::Rendering,
            Self::Rendering => Self::Presenting,
            Self::Presenting => Self::Idle,
        }
    }
}

/// そのティックの入力フレームの出どころ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureOutcome {
    Fresh,
    /// キャプチャ失敗、前フレームを再利用
    Reused,
    /// キャプチャ失敗、前フレームも無い
    Blank,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub capture: CaptureOutcome,
    pub detected: bool,
    pub render: RenderReport,
    pub presented: bool,
}

/// FPS計測用
///
/// 1秒ごとに FPS・検出数・平均可視スコアをログに出す。
struct FpsCounter {
    frames: u32,
    detected: u32,
    visibility_sum: f32,
    since: Instant,
}

impl FpsCounter {
    fn new() -> Self {
        Self {
            frames: 0,
            detected: 0,
            visibility_sum: 0.0,
            since: Instant::now(),
        }
    }

    fn record(&mut self, landmarks: Option<&LandmarkFrame>) {
        self.frames += 1;
        if let Some(landmarks) = landmarks {
            self.detected += 1;
            self.visibility_sum += landmarks.average_visibility();
        }
        let elapsed = self.since.elapsed().as_secs_f32();
        if elapsed >= 1.0 {
            tracing::info!(
                "FPS: {:.1}, detected: {}/{}, avg visibility: {:.2}",
                self.frames as f32 / elapsed,
                self.detected,
                self.frames,
                self.average_visibility()
            );
            *self = Self::new();
        }
    }

    /// 検出できたフレームの平均可視スコア
    fn average_visibility(&self) -> f32 {
        if self.detected == 0 {
            0.0
        } else {
            self.visibility_sum / self.detected as f32
        }
    }
}

pub struct FramePipeline<S, D> {
    source: S,
    detector: D,
    taxonomy: Taxonomy,
    renderer: SelectiveRenderer,
    view: ViewState,
    state: PipelineState,
    last_frame: Option<FrameBuffer>,
    tick_delay: Duration,
    fps: FpsCounter,
}

impl<S: FrameSource, D: PoseEstimator> FramePipeline<S, D> {
    pub fn new(
        source: S,
        detector: D,
        taxonomy: Taxonomy,
        renderer: SelectiveRenderer,
        view: ViewState,
        tick_delay: Duration,
    ) -> Self {
        Self {
            source,
            detector,
            taxonomy,
            renderer,
            view,
            state: PipelineState::Idle,
            last_frame: None,
            tick_delay,
            fps: FpsCounter::new(),
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn detector(&self) -> &D {
        &self.detector
    }

    fn advance(&mut self) {
        let next = self.state.next();
        tracing::trace!(from = ?self.state, to = ?next, "pipeline transition");
        self.state = next;
    }

    /// UIイベントの唯一の受け口
    pub fn dispatch(&mut self, event: UiEvent) -> Result<(), ConfigError> {
        self.view.apply(event)
    }

    /// 1ティック分を実行。必ず Idle に戻る
    pub fn tick<K: DisplaySink>(&mut self, sink: &mut K) -> TickReport {
        // Capturing
        self.advance();
        let (frame, capture) = self.capture();

        // Detecting
        self.advance();
        let landmarks = match capture {
            CaptureOutcome::Fresh => self.detect(&frame),
            CaptureOutcome::Reused | CaptureOutcome::Blank => None,
        };

        // Rendering
        self.advance();
        let base = if self.view.show_frame {
            frame
        } else {
            frame.blank_like()
        };
        let (annotated, render) = self.renderer.render(
            &base,
            landmarks.as_ref(),
            &self.view.visibility,
            &self.taxonomy,
            self.view.draw_mode(),
        );

        // Presenting
        self.advance();
        let presented = match sink.present(&annotated) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("present failed: {:#}", e);
                false
            }
        };

        self.advance();
        debug_assert_eq!(self.state, PipelineState::Idle);
        self.fps.record(landmarks.as_ref());

        TickReport {
            capture,
            detected: landmarks.is_some(),
            render,
            presented,
        }
    }

    fn capture(&mut self) -> (FrameBuffer, CaptureOutcome) {
        match self.source.read_frame() {
            Ok(frame) => {
                self.last_frame = Some(frame.clone());
                (frame, CaptureOutcome::Fresh)
            }
            Err(e) => {
                tracing::warn!("Frame capture error: {:#}", e);
                match &self.last_frame {
                    Some(prev) => (prev.clone(), CaptureOutcome::Reused),
                    None => {
                        let (w, h) = self.source.resolution();
                        (FrameBuffer::blank(w as usize, h as usize), CaptureOutcome::Blank)
                    }
                }
            }
        }
    }

    fn detect(&mut self, frame: &FrameBuffer) -> Option<LandmarkFrame> {
        match self.detector.detect(frame) {
            Ok(landmarks) => landmarks,
            Err(e) => {
                tracing::warn!("pose detection failed: {:#}", e);
                None
            }
        }
    }

    /// ウィンドウが閉じるまでティックを回す
    pub fn run<U, T>(&mut self, ui: &mut U, ticker: &mut T)
    where
        U: DisplaySink + ControlSurface,
        T: Ticker,
    {
        let mut panel = ControlPanel::new(&self.taxonomy);
        ui.set_status(&panel.status(&self.view, &self.taxonomy));

        while ui.is_open() {
            let keys = ui.poll_keys();
            let changed = !keys.is_empty();
            for key in keys {
                if let Some(event) = panel.on_key(key, &self.taxonomy) {
                    if let Err(e) = self.dispatch(event) {
                        tracing::warn!("ignored {:?}: {}", event, e);
                    }
                }
            }
            if changed {
                ui.set_status(&panel.status(&self.view, &self.taxonomy));
            }

            self.tick(ui);
            ticker.wait(self.tick_delay);
        }

        tracing::info!("window closed, shutting down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RenderConfig;
    use crate::pose::Landmark;
    use anyhow::anyhow;
    use std::collections::VecDeque;

    const W: usize = 80;
    const H: usize = 60;
    const GRAY: u32 = 0x808080;

    /// 用意したフレーム（または失敗）を順に返す
    struct ScriptedSource {
        frames: VecDeque<Result<FrameBuffer>>,
    }

    impl ScriptedSource {
        fn new(frames: Vec<Result<FrameBuffer>>) -> Self {
            Self {
                frames: frames.into(),
            }
        }
    }

    impl FrameSource for ScriptedSource {
        fn read_frame(&mut self) -> Result<FrameBuffer> {
            self.frames
                .pop_front()
                .unwrap_or_else(|| Err(anyhow!("camera unplugged")))
        }

        fn resolution(&self) -> (u32, u32) {
            (W as u32, H as u32)
        }
    }

    /// 毎回同じ結果を返す検出器
    struct FixedDetector {
        result: Option<LandmarkFrame>,
        fail: bool,
        calls: usize,
    }

    impl FixedDetector {
        fn found() -> Self {
            Self {
                result: Some(LandmarkFrame::filled(Landmark::new(0.5, 0.5, 1.0))),
                fail: false,
                calls: 0,
            }
        }

        fn absent() -> Self {
            Self {
                result: None,
                fail: false,
                calls: 0,
            }
        }

        fn failing() -> Self {
            Self {
                result: None,
                fail: true,
                calls: 0,
            }
        }
    }

    impl PoseEstimator for FixedDetector {
        fn detect(&mut self, _frame: &FrameBuffer) -> Result<Option<LandmarkFrame>> {
            self.calls += 1;
            if self.fail {
                return Err(anyhow!("inference failed"));
            }
            Ok(self.result.clone())
        }
    }

    #[derive(Default)]
    struct RecordingUi {
        presented: Vec<FrameBuffer>,
        keys: VecDeque<Vec<ControlKey>>,
        statuses: Vec<String>,
        fail_present: bool,
    }

    impl DisplaySink for RecordingUi {
        fn present(&mut self, frame: &FrameBuffer) -> Result<()> {
            if self.fail_present {
                return Err(anyhow!("window gone"));
            }
            self.presented.push(frame.clone());
            Ok(())
        }
    }

    impl ControlSurface for RecordingUi {
        fn is_open(&self) -> bool {
            !self.keys.is_empty()
        }

        fn poll_keys(&mut self) -> Vec<ControlKey> {
            self.keys.pop_front().unwrap_or_default()
        }

        fn set_status(&mut self, status: &str) {
            self.statuses.push(status.to_string());
        }
    }

    #[derive(Default)]
    struct CountingTicker {
        waits: Vec<Duration>,
    }

    impl Ticker for CountingTicker {
        fn wait(&mut self, delay: Duration) {
            self.waits.push(delay);
        }
    }

    fn pipeline<D: PoseEstimator>(
        frames: Vec<Result<FrameBuffer>>,
        detector: D,
        show_frame: bool,
        show_skeleton: bool,
    ) -> FramePipeline<ScriptedSource, D> {
        let taxonomy = Taxonomy::blazepose().unwrap();
        let view = ViewState::new(&taxonomy, show_frame, show_skeleton);
        FramePipeline::new(
            ScriptedSource::new(frames),
            detector,
            taxonomy,
            SelectiveRenderer::new(RenderConfig::default()),
            view,
            Duration::from_millis(10),
        )
    }

    fn gray() -> FrameBuffer {
        FrameBuffer::filled(W, H, GRAY)
    }

    #[test]
    fn test_fps_counter_averages_detected_frames() {
        let mut fps = FpsCounter::new();
        fps.record(Some(&LandmarkFrame::filled(Landmark::new(0.5, 0.5, 0.9))));
        fps.record(None);
        fps.record(Some(&LandmarkFrame::filled(Landmark::new(0.5, 0.5, 0.5))));
        assert_eq!(fps.frames, 3);
        assert_eq!(fps.detected, 2);
        assert!((fps.average_visibility() - 0.7).abs() < 1e-5);
        assert_eq!(FpsCounter::new().average_visibility(), 0.0);
    }

    #[test]
    fn test_state_cycle_order() {
        let mut state = PipelineState::Idle;
        let mut seen = Vec::new();
        for _ in 0..5 {
            state = state.next();
            seen.push(state);
        }
        assert_eq!(
            seen,
            vec![
                PipelineState::Capturing,
                PipelineState::Detecting,
                PipelineState::Rendering,
                PipelineState::Presenting,
                PipelineState::Idle,
            ]
        );
    }

    #[test]
    fn test_skeleton_tick_annotates_frame() {
        let mut p = pipeline(vec![Ok(gray())], FixedDetector::found(), true, true);
        let mut ui = RecordingUi::default();

        let report = p.tick(&mut ui);
        assert_eq!(p.state(), PipelineState::Idle);
        assert_eq!(report.capture, CaptureOutcome::Fresh);
        assert!(report.detected);
        assert!(report.presented);
        assert_eq!(report.render.bones, 35);
        assert_eq!(ui.presented.len(), 1);
        assert_ne!(ui.presented[0], gray());
    }

    #[test]
    fn test_absent_pose_presents_raw_frame() {
        let mut p = pipeline(vec![Ok(gray())], FixedDetector::absent(), true, true);
        let mut ui = RecordingUi::default();

        let report = p.tick(&mut ui);
        assert!(!report.detected);
        assert!(report.render.markers.is_empty());
        assert_eq!(ui.presented, vec![gray()]);
    }

    #[test]
    fn test_absent_pose_with_frame_hidden_presents_blank() {
        let mut p = pipeline(vec![Ok(gray())], FixedDetector::absent(), false, true);
        let mut ui = RecordingUi::default();

        p.tick(&mut ui);
        assert_eq!(ui.presented, vec![FrameBuffer::blank(W, H)]);
    }

    #[test]
    fn test_point_mode_on_blank_canvas() {
        let mut p = pipeline(vec![Ok(gray())], FixedDetector::found(), false, false);
        p.dispatch(UiEvent::ToggleSingle(11)).unwrap();
        let mut ui = RecordingUi::default();

        let report = p.tick(&mut ui);
        assert_eq!(report.render.marker_indices(), vec![11]);
        assert_eq!(report.render.bones, 0);

        let out = &ui.presented[0];
        assert_eq!(out.get_pixel(40, 30), Some(RenderConfig::default().marker_color));
        // 元フレームは使わない
        assert_eq!(out.get_pixel(0, 0), Some(0));
    }

    #[test]
    fn test_capture_failure_reuses_previous_frame() {
        let mut p = pipeline(
            vec![Ok(gray()), Err(anyhow!("read failed"))],
            FixedDetector::found(),
            true,
            false,
        );
        let mut ui = RecordingUi::default();

        p.tick(&mut ui);
        let report = p.tick(&mut ui);
        assert_eq!(report.capture, CaptureOutcome::Reused);
        assert!(!report.detected);
        assert_eq!(ui.presented[1], gray());
        assert_eq!(p.detector().calls, 1);
        assert_eq!(p.state(), PipelineState::Idle);
    }

    #[test]
    fn test_capture_failure_without_history_is_blank() {
        let mut p = pipeline(vec![], FixedDetector::found(), true, true);
        let mut ui = RecordingUi::default();

        let report = p.tick(&mut ui);
        assert_eq!(report.capture, CaptureOutcome::Blank);
        assert_eq!(ui.presented, vec![FrameBuffer::blank(W, H)]);
        assert_eq!(p.detector().calls, 0);
    }

    #[test]
    fn test_detector_error_degrades_to_raw_frame() {
        let mut p = pipeline(vec![Ok(gray())], FixedDetector::failing(), true, true);
        let mut ui = RecordingUi::default();

        let report = p.tick(&mut ui);
        assert!(!report.detected);
        assert_eq!(ui.presented, vec![gray()]);
        assert_eq!(p.state(), PipelineState::Idle);
    }

    #[test]
    fn test_present_failure_does_not_stop_tick() {
        let mut p = pipeline(vec![Ok(gray())], FixedDetector::found(), true, true);
        let mut ui = RecordingUi {
            fail_present: true,
            ..RecordingUi::default()
        };

        let report = p.tick(&mut ui);
        assert!(!report.presented);
        assert_eq!(p.state(), PipelineState::Idle);
    }

    #[test]
    fn test_dispatch_rejects_non_interactive() {
        let mut p = pipeline(vec![], FixedDetector::absent(), true, true);
        assert!(p.dispatch(UiEvent::ToggleSingle(1)).is_err());
        assert_eq!(p.view().visibility.visible_count(), 0);
    }

    #[test]
    fn test_run_until_window_closes() {
        let frames = (0..3).map(|_| Ok(gray())).collect();
        let mut p = pipeline(frames, FixedDetector::found(), true, true);
        let mut ui = RecordingUi::default();
        ui.keys.push_back(vec![ControlKey::ShowSkeleton, ControlKey::Toggle]);
        ui.keys.push_back(vec![]);
        ui.keys.push_back(vec![ControlKey::ShowFrame]);
        let mut ticker = CountingTicker::default();

        p.run(&mut ui, &mut ticker);

        assert_eq!(ui.presented.len(), 3);
        assert_eq!(ticker.waits, vec![Duration::from_millis(10); 3]);
        assert!(!p.view().show_skeleton);
        assert!(!p.view().show_frame);
        assert!(p.view().visibility.is_visible(0));
        // 初期表示 + キー入力があった2回
        assert_eq!(ui.statuses.len(), 3);
        assert_eq!(ui.statuses[2], "> face [x] | Show Frame | Show Bones");
    }
}
