// session_tracker.rs - ポーリングごとの安定度追跡とステータス応答の生成

use anyhow::Result;
use ccstate_shared::{
    log_session, ClaudeState, Config, DetectionSettings, StatusDetail, StatusResponse, TaskStatus,
    TerminalState, TimingInfo,
};
use chrono::{DateTime, Utc};

use crate::interactive_detector::{detect_interactive, InteractionMatch};
use crate::screen_buffer::ScreenBuffer;
use crate::screen_text::ScreenText;
use crate::state_classifier::{StateClassifier, StateVerdict};

/// 1セッション分の追跡状態
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub session_id: String,
    pub terminal_state: TerminalState,
    pub task_status: TaskStatus,
    /// 描画結果が変わらなかった連続ポーリング回数
    pub stable_count: u32,
    pub last_output: Option<String>,
    pub verdict: StateVerdict,
    pub description: String,
    pub interaction: Option<InteractionMatch>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl SessionState {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            ..Default::default()
        }
    }

    /// 開始済みで、まだ完了・失敗していない実行があるか
    pub fn run_in_progress(&self) -> bool {
        self.started_at.is_some() && self.completed_at.is_none()
    }

    pub fn to_status_response(&self) -> StatusResponse {
        StatusResponse {
            terminal_state: self.terminal_state,
            task_status: self.task_status,
            stable_count: self.stable_count,
            detail: StatusDetail {
                description: self.description.clone(),
                interaction_type: self.interaction.as_ref().map(|m| m.interaction_type),
                choices: self.interaction.as_ref().map(|m| m.choices.clone()),
            },
            timing: TimingInfo::from_times(self.started_at, self.completed_at),
        }
    }
}

/// 生の端末出力をポーリングし、セッションの状態を更新する
pub struct SessionTracker {
    renderer: ScreenBuffer,
    classifier: StateClassifier,
    detection: DetectionSettings,
    state: SessionState,
}

impl SessionTracker {
    pub fn new(session_id: impl Into<String>, config: &Config) -> Result<Self> {
        Ok(Self {
            renderer: ScreenBuffer::new(config.screen.rows, config.screen.cols),
            classifier: StateClassifier::from_config(config)?,
            detection: config.detection.clone(),
            state: SessionState::new(session_id),
        })
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// 直近の描画結果
    pub fn live_output(&self) -> Option<&str> {
        self.state.last_output.as_deref()
    }

    pub fn status_response(&self) -> StatusResponse {
        self.state.to_status_response()
    }

    pub fn poll(&mut self, raw_output: &str) -> StatusResponse {
        self.poll_at(raw_output, Utc::now())
    }

    /// 出力のスナップショットを1回分処理する
    pub fn poll_at(&mut self, raw_output: &str, now: DateTime<Utc>) -> StatusResponse {
        let screen = self.renderer.render(raw_output);
        let rendered = screen.text();

        if self.state.last_output.as_deref() == Some(rendered.as_str()) {
            self.state.stable_count = self.state.stable_count.saturating_add(1);
        } else {
            self.state.stable_count = 0;
            self.state.last_output = Some(rendered.clone());
        }

        let verdict = self.classifier.classify(&rendered);
        self.apply_verdict(&screen, verdict, now);
        self.status_response()
    }

    /// 外部要因でタスクが失敗した場合
    pub fn mark_failed(&mut self, reason: impl Into<String>, now: DateTime<Utc>) {
        self.set_status(TerminalState::Completed, TaskStatus::Failed);
        self.state.completed_at = Some(now);
        self.state.description = reason.into();
        self.state.interaction = None;
    }

    fn apply_verdict(&mut self, screen: &ScreenText, verdict: StateVerdict, now: DateTime<Utc>) {
        let stable_count = self.state.stable_count;

        match verdict.state {
            ClaudeState::Processing => {
                if !self.state.run_in_progress() {
                    // 新しい実行の開始
                    self.state.started_at = Some(now);
                }
                self.state.completed_at = None;
                self.set_status(TerminalState::Running, TaskStatus::Running);
                self.state.description = format!("Processing: {}", verdict.detail);
                self.state.interaction = None;
            }
            ClaudeState::Inputting => {
                // 次の指示の入力中は実行とみなさず、直前のタスク状態を保つ
                let task_status = if self.state.run_in_progress() {
                    TaskStatus::WaitingForInput
                } else {
                    self.state.task_status
                };
                self.set_status(TerminalState::Interactive, task_status);
                self.state.description = format!("Typing: {}", verdict.detail);
                self.state.interaction = None;
            }
            ClaudeState::Interactive => {
                // 描画途中のメニューを拾わないよう、安定するまで確定しない
                if stable_count >= self.detection.interactive_stability_threshold {
                    let lines = screen.last_content_lines(self.detection.pattern_match_last_n_lines);
                    self.state.interaction = detect_interactive(lines);
                    self.set_status(TerminalState::Interactive, TaskStatus::WaitingForInput);
                    self.state.description = verdict.detail.clone();
                }
            }
            ClaudeState::Completed => {
                self.state.completed_at.get_or_insert(now);
                self.set_status(TerminalState::Completed, TaskStatus::Completed);
                self.state.description = format!("Completed: {}", verdict.detail);
                self.state.interaction = None;
            }
            ClaudeState::Idle => {
                if stable_count >= self.detection.completed_stability_threshold {
                    let task_status = if self.state.run_in_progress() {
                        self.state.completed_at = Some(now);
                        TaskStatus::Completed
                    } else if self.state.task_status == TaskStatus::WaitingForInput {
                        // 実行の外で出たメニューが閉じられた
                        if self.state.completed_at.is_some() {
                            TaskStatus::Completed
                        } else {
                            TaskStatus::Pending
                        }
                    } else {
                        self.state.task_status
                    };
                    self.set_status(TerminalState::Completed, task_status);
                    self.state.description = "Idle".to_string();
                    self.state.interaction = None;
                }
            }
        }

        self.state.verdict = verdict;
    }

    fn set_status(&mut self, terminal_state: TerminalState, task_status: TaskStatus) {
        if self.state.task_status != task_status {
            log_session!(
                info,
                "[{}] {:?} → {:?} (stable_count={})",
                self.state.session_id,
                self.state.task_status,
                task_status,
                self.state.stable_count
            );
        }
        self.state.terminal_state = terminal_state;
        self.state.task_status = task_status;
    }
}
