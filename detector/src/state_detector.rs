// state_detector.rs - 状態検出の抽象化レイヤー

use anyhow::Result;
use ccstate_shared::{ClaudeState, Config, PromptMode};

use crate::interactive_detector::InteractionMatch;
use crate::screen_claude_detector::ScreenClaudeStateDetector;
use crate::screen_text::ScreenText;
use crate::state_classifier::StateVerdict;

/// 状態検出器の共通インターフェース
pub trait StateDetector: Send {
    /// 新しい出力（生バイト）を処理し、状態が変わった場合のみ新しい状態を返す
    fn process_bytes(&mut self, data: &[u8]) -> Option<ClaudeState>;

    /// 新しい出力を処理して状態を更新
    fn process_output(&mut self, output: &str) -> Option<ClaudeState> {
        self.process_bytes(output.as_bytes())
    }

    /// 現在の判定
    fn current_verdict(&self) -> &StateVerdict;

    /// 現在の状態を取得
    fn current_state(&self) -> ClaudeState {
        self.current_verdict().state
    }

    /// 現在の入力モード
    fn current_mode(&self) -> PromptMode;

    /// interactive 時の選択肢
    fn current_interaction(&self) -> Option<&InteractionMatch>;

    /// 現在の画面テキスト
    fn screen_text(&self) -> ScreenText;

    /// 端末サイズ変更（画面は作り直す）
    fn resize_screen_buffer(&mut self, rows: usize, cols: usize);

    /// デバッグ用：現在のバッファを表示
    fn debug_buffer(&self);
}

/// 設定から状態検出器を生成
pub fn create_state_detector(config: &Config) -> Result<Box<dyn StateDetector>> {
    Ok(Box::new(ScreenClaudeStateDetector::from_config(config)?))
}
