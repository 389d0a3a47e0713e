// screen_claude_detector.rs - Screen buffer based Claude state detector

use std::time::{Duration, Instant};

use anyhow::Result;
use ccstate_shared::{log_detector, ClaudeState, Config, PromptMode};

use crate::interactive_detector::{detect_interactive, InteractionMatch};
use crate::screen_buffer::ScreenBuffer;
use crate::screen_text::ScreenText;
use crate::state_classifier::{StateClassifier, StateVerdict};
use crate::state_detector::StateDetector;

/// スクリーンバッファベースのClaude状態検出器
///
/// PTY出力を逐次 [`ScreenBuffer`] に流し込み、更新のたびに画面全体を
/// 分類し直す。
pub struct ScreenClaudeStateDetector {
    screen_buffer: ScreenBuffer,
    classifier: StateClassifier,
    current: StateVerdict,
    mode: PromptMode,
    interaction: Option<InteractionMatch>,
    pattern_match_last_n_lines: usize,
    last_state_change: Option<Instant>,
}

impl ScreenClaudeStateDetector {
    pub fn new(rows: usize, cols: usize) -> Self {
        let defaults = Config::default();
        Self::with_classifier(
            rows,
            cols,
            StateClassifier::default(),
            defaults.detection.pattern_match_last_n_lines,
        )
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let classifier = StateClassifier::from_config(config)?;
        Ok(Self::with_classifier(
            config.screen.rows,
            config.screen.cols,
            classifier,
            config.detection.pattern_match_last_n_lines,
        ))
    }

    fn with_classifier(
        rows: usize,
        cols: usize,
        classifier: StateClassifier,
        pattern_match_last_n_lines: usize,
    ) -> Self {
        log_detector!(
            debug,
            "🖥️  Initialized screen buffer with {rows}x{cols} (rows x cols)"
        );

        Self {
            screen_buffer: ScreenBuffer::new(rows, cols),
            classifier,
            current: StateVerdict::idle(),
            mode: PromptMode::Default,
            interaction: None,
            pattern_match_last_n_lines,
            last_state_change: None,
        }
    }

    /// 現在の状態になってからの経過時間
    pub fn time_in_state(&self) -> Option<Duration> {
        self.last_state_change.map(|t| t.elapsed())
    }

    fn reclassify(&mut self) -> Option<ClaudeState> {
        let screen = self.screen_buffer.screen_text();
        let text = screen.text();
        let verdict = self.classifier.classify(&text);

        self.mode = self.classifier.classify_mode(&text);
        self.interaction = if verdict.state == ClaudeState::Interactive {
            detect_interactive(screen.last_content_lines(self.pattern_match_last_n_lines))
        } else {
            None
        };

        if verdict.state == self.current.state {
            if verdict.detail != self.current.detail {
                log_detector!(trace, "detail: {:?} → {:?}", self.current.detail, verdict.detail);
            }
            self.current = verdict;
            return None;
        }

        let elapsed = self
            .time_in_state()
            .map(|d| format!(" after {:.1}s", d.as_secs_f64()))
            .unwrap_or_default();
        log_detector!(
            info,
            "{} {} → {} {}{elapsed} ({:?})",
            self.current.state.icon(),
            self.current.state,
            verdict.state.icon(),
            verdict.state,
            verdict.detail
        );

        self.last_state_change = Some(Instant::now());
        self.current = verdict;
        Some(self.current.state)
    }
}

impl StateDetector for ScreenClaudeStateDetector {
    fn process_bytes(&mut self, data: &[u8]) -> Option<ClaudeState> {
        // 画面バッファを更新
        self.screen_buffer.process_data(data);
        self.reclassify()
    }

    fn current_verdict(&self) -> &StateVerdict {
        &self.current
    }

    fn current_mode(&self) -> PromptMode {
        self.mode
    }

    fn current_interaction(&self) -> Option<&InteractionMatch> {
        self.interaction.as_ref()
    }

    fn screen_text(&self) -> ScreenText {
        self.screen_buffer.screen_text()
    }

    fn resize_screen_buffer(&mut self, rows: usize, cols: usize) {
        self.screen_buffer = ScreenBuffer::new(rows, cols);
        log_detector!(debug, "Screen buffer resized to {rows}x{cols}");
    }

    fn debug_buffer(&self) {
        // デバッグ用に画面内容を表示
        for (i, line) in self.screen_buffer.screen_text().lines().iter().enumerate() {
            if !line.is_empty() {
                log_detector!(debug, "  {i:2}: {line}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reports_only_state_changes() {
        let mut detector = ScreenClaudeStateDetector::new(10, 60);
        assert_eq!(detector.current_state(), ClaudeState::Idle);

        assert_eq!(
            detector.process_output("\x1b[38;2;215;119;87m✻\x1b[39m Thinking…"),
            Some(ClaudeState::Processing)
        );
        assert_eq!(detector.current_verdict().detail, "Thinking…");
        assert!(detector.time_in_state().is_some());

        // 同じ状態のままなら通知しない
        assert_eq!(detector.process_output("\r\x1b[2K✶ Pondering…"), None);
        assert_eq!(detector.current_verdict().detail, "Pondering…");
    }

    #[test]
    fn test_interactive_collects_choices() {
        let mut detector = ScreenClaudeStateDetector::new(10, 60);
        let state = detector.process_output("Do you want to create hello.rs?\r\n❯ 1. Yes\r\n  2. No\r\n");
        assert_eq!(state, Some(ClaudeState::Interactive));

        let interaction = detector.current_interaction().unwrap();
        assert_eq!(interaction.choices, vec!["1. Yes", "2. No"]);
    }

    #[test]
    fn test_resize_clears_screen() {
        let mut detector = ScreenClaudeStateDetector::new(5, 40);
        detector.process_output("✻ Thinking");
        detector.resize_screen_buffer(10, 80);
        assert!(detector.screen_text().is_blank());
        assert_eq!(detector.screen_text().lines().len(), 10);
    }
}
