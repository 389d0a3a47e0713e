// state_classifier.rs - Screen text based Claude state classifier
//
// 画面の最下行から上へ一度だけ走査し、最初に確定した手がかりで状態を決める。
// 1行ごとの判定順:
//   1. 既知の対話プロンプト文字列        → interactive
//   2. ❯ 行（入力ボックス / メニュー確認） → inputting / interactive / 保留
//   3. スピナー行                         → completed / processing
// どれにも当たらなければ idle。

use std::borrow::Cow;
use std::sync::OnceLock;

use anyhow::Result;
use ccstate_shared::logging::LogCategory;
use ccstate_shared::{log_debug, log_trace, ClaudeState, Config, PromptMode};
use regex::Regex;
use serde::Serialize;

use crate::screen_text::{is_separator_line, nearest_non_blank, Direction};
use crate::vocabulary::{
    Vocabulary, ACCEPT_EDITS_GLYPH, PLAN_MODE_GLYPH, PROMPT_CARET, SPINNER_GLYPHS,
};

/// ❯ 行の上下で区切り線を探す既定の距離
pub const DEFAULT_SEPARATOR_LOOKAROUND: usize = 3;

/// ❯ 行から上へ「?」を探す既定の最大行数
pub const DEFAULT_QUESTION_SEARCH_LIMIT: usize = 20;

/// 状態と、その根拠になった文字列
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateVerdict {
    pub state: ClaudeState,
    pub detail: String,
}

impl StateVerdict {
    pub fn new(state: ClaudeState, detail: impl Into<String>) -> Self {
        Self {
            state,
            detail: detail.into(),
        }
    }

    pub fn idle() -> Self {
        Self::new(ClaudeState::Idle, "")
    }
}

impl Default for StateVerdict {
    fn default() -> Self {
        Self::idle()
    }
}

/// スピナー行: 先頭の空白 + スピナー記号 + 1つ以上の空白 + 本文
fn spinner_regex() -> &'static Regex {
    static SPINNER: OnceLock<Regex> = OnceLock::new();
    SPINNER.get_or_init(|| {
        let glyphs: String = SPINNER_GLYPHS
            .iter()
            .map(|c| regex::escape(&c.to_string()))
            .collect();
        Regex::new(&format!(r"^\s*[{glyphs}]\s+(.*)")).unwrap()
    })
}

/// 画面テキストの状態分類器
#[derive(Debug, Clone)]
pub struct StateClassifier {
    vocabulary: Cow<'static, Vocabulary>,
    separator_lookaround: usize,
    question_search_limit: usize,
}

impl Default for StateClassifier {
    fn default() -> Self {
        Self {
            vocabulary: Cow::Borrowed(Vocabulary::claude()),
            separator_lookaround: DEFAULT_SEPARATOR_LOOKAROUND,
            question_search_limit: DEFAULT_QUESTION_SEARCH_LIMIT,
        }
    }
}

impl StateClassifier {
    /// 既定語彙・既定閾値の分類器（共有インスタンス）
    pub fn shared() -> &'static StateClassifier {
        static SHARED: OnceLock<StateClassifier> = OnceLock::new();
        SHARED.get_or_init(StateClassifier::default)
    }

    /// 設定ファイルの閾値と語彙追加を反映した分類器
    pub fn from_config(config: &Config) -> Result<Self> {
        let extras = &config.vocabulary;
        let vocabulary = if extras.extra_processing_words.is_empty()
            && extras.extra_completed_words.is_empty()
            && extras.extra_prompts.is_empty()
        {
            Cow::Borrowed(Vocabulary::claude())
        } else {
            log_debug!(
                LogCategory::Classifier,
                "Extending vocabulary: +{} processing, +{} completed, +{} prompts",
                extras.extra_processing_words.len(),
                extras.extra_completed_words.len(),
                extras.extra_prompts.len()
            );
            Cow::Owned(Vocabulary::with_extras(extras)?)
        };

        Ok(Self {
            vocabulary,
            separator_lookaround: config.detection.separator_lookaround,
            question_search_limit: config.detection.question_search_limit,
        })
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// 画面テキストから状態を推定する
    pub fn classify(&self, screen_text: &str) -> StateVerdict {
        if screen_text.trim().is_empty() {
            return StateVerdict::idle();
        }

        let lines: Vec<&str> = screen_text.split('\n').collect();

        for idx in (0..lines.len()).rev() {
            let stripped = lines[idx].trim();
            if stripped.is_empty() {
                continue;
            }

            if let Some(prompt) = self.vocabulary.find_prompt(stripped) {
                return StateVerdict::new(ClaudeState::Interactive, prompt);
            }

            if let Some(pos) = stripped.find(PROMPT_CARET) {
                let after = stripped[pos + PROMPT_CARET.len_utf8()..].trim();
                if after.is_empty() {
                    // 空のプロンプト。上の行へ
                    continue;
                }

                if self.is_input_box(&lines, idx) {
                    return StateVerdict::new(ClaudeState::Inputting, after);
                }

                if self.has_question_above(&lines, idx) {
                    return StateVerdict::new(ClaudeState::Interactive, after);
                }

                // シェルプロンプト風の ❯ など。スピナー判定はしない
                continue;
            }

            if let Some(verdict) = self.classify_spinner_line(lines[idx]) {
                return verdict;
            }
        }

        StateVerdict::idle()
    }

    /// 入力ボックス: ❯ 行の直近の非空行が上下とも区切り線
    fn is_input_box(&self, lines: &[&str], idx: usize) -> bool {
        let above = nearest_non_blank(lines, idx, Direction::Up, self.separator_lookaround);
        let below = nearest_non_blank(lines, idx, Direction::Down, self.separator_lookaround);

        match (above, below) {
            (Some(a), Some(b)) => {
                is_separator_line(lines[a].trim()) && is_separator_line(lines[b].trim())
            }
            _ => false,
        }
    }

    /// ❯ 行より上、区切り線に当たるまでの範囲に「?」を含む行があるか
    fn has_question_above(&self, lines: &[&str], idx: usize) -> bool {
        for offset in 1..=self.question_search_limit {
            let Some(j) = idx.checked_sub(offset) else {
                break;
            };
            let above = lines[j].trim();
            if above.is_empty() {
                continue;
            }
            if is_separator_line(above) {
                return false;
            }
            if above.contains('?') {
                return true;
            }
        }
        false
    }

    /// スピナー行の判定。本文が空なら None
    fn classify_spinner_line(&self, line: &str) -> Option<StateVerdict> {
        let caps = spinner_regex().captures(line)?;
        let rest = caps.get(1).map_or("", |m| m.as_str()).trim();
        if rest.is_empty() {
            return None;
        }

        let first_word = rest.split_whitespace().next().unwrap_or(rest);
        if self.vocabulary.is_completed_word(first_word) {
            return Some(StateVerdict::new(ClaudeState::Completed, first_word));
        }

        if !self.is_known_activity(first_word, rest) {
            // 既知の動名詞でも省略記号付きでもないが、スピナー行なので処理中とみなす
            log_trace!(LogCategory::Classifier, "Unlisted spinner text: {rest}");
        }
        Some(StateVerdict::new(ClaudeState::Processing, rest))
    }

    /// 処理中語彙に載っている、または「…」「...」で終わるスピナー文言か
    fn is_known_activity(&self, first_word: &str, rest: &str) -> bool {
        let gerund = first_word.trim_end_matches(|c: char| c == '…' || c == '.');
        self.vocabulary.is_processing_word(gerund) || rest.ends_with('…') || rest.ends_with("...")
    }

    /// フッターの表示から入力モードを推定する
    pub fn classify_mode(&self, screen_text: &str) -> PromptMode {
        for line in screen_text.split('\n') {
            let lower = line.to_lowercase();
            if line.contains(PLAN_MODE_GLYPH) && lower.contains("plan") {
                return PromptMode::Plan;
            }
            if line.contains(ACCEPT_EDITS_GLYPH) && lower.contains("accept") {
                return PromptMode::AcceptEdits;
            }
        }
        PromptMode::Default
    }
}

/// 既定の分類器で状態を推定
pub fn classify_state(screen_text: &str) -> StateVerdict {
    StateClassifier::shared().classify(screen_text)
}

/// 既定の分類器で入力モードを推定
pub fn classify_mode(screen_text: &str) -> PromptMode {
    StateClassifier::shared().classify_mode(screen_text)
}
