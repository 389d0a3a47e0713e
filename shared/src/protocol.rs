// protocol.rs - 状態推定結果とステータス応答の型定義

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// 画面から推定されるClaude Codeの状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaudeState {
    Idle,        // ⚪ 入力待ちのプロンプトのみ
    Inputting,   // ⌨️ 入力ボックスに打鍵中
    Interactive, // 🟡 ユーザーの選択待ち
    Processing,  // 🟢 スピナー表示中
    Completed,   // 🔵 完了マーカー表示
}

impl ClaudeState {
    pub fn icon(&self) -> &'static str {
        match self {
            Self::Idle => "⚪",
            Self::Inputting => "⌨️",
            Self::Interactive => "🟡",
            Self::Processing => "🟢",
            Self::Completed => "🔵",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Inputting => "inputting",
            Self::Interactive => "interactive",
            Self::Processing => "processing",
            Self::Completed => "completed",
        }
    }
}

impl std::fmt::Display for ClaudeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// フッターに表示される入力モード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PromptMode {
    Plan,
    AcceptEdits,
    #[default]
    Default,
}

impl PromptMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plan => "plan",
            Self::AcceptEdits => "accept-edits",
            Self::Default => "default",
        }
    }
}

impl std::fmt::Display for PromptMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 対話プロンプトの種類（priorityが小さいほど優先）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionType {
    PermissionConfirm,
    HighlightedOption,
    PlanApproval,
    UserQuestion,
    SelectionMenu,
}

impl InteractionType {
    pub const ALL: [InteractionType; 5] = [
        Self::PermissionConfirm,
        Self::HighlightedOption,
        Self::PlanApproval,
        Self::UserQuestion,
        Self::SelectionMenu,
    ];

    pub fn priority(&self) -> u8 {
        match self {
            Self::PermissionConfirm => 1,
            Self::HighlightedOption => 2,
            Self::PlanApproval => 3,
            Self::UserQuestion => 4,
            Self::SelectionMenu => 5,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PermissionConfirm => "permission_confirm",
            Self::HighlightedOption => "highlighted_option",
            Self::PlanApproval => "plan_approval",
            Self::UserQuestion => "user_question",
            Self::SelectionMenu => "selection_menu",
        }
    }
}

impl std::fmt::Display for InteractionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// ターミナル全体の状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalState {
    #[default]
    Running,
    Interactive,
    Completed,
}

/// オーケストレータから見たタスクの状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    Running,
    WaitingForInput,
    Completed,
    Failed,
}

/// ステータスの詳細
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StatusDetail {
    pub description: String,
    pub interaction_type: Option<InteractionType>,
    pub choices: Option<Vec<String>>,
}

/// 実行時間の情報（ISO 8601 / UTC）
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TimingInfo {
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
    pub duration_seconds: Option<f64>,
}

impl TimingInfo {
    pub fn from_times(started_at: Option<DateTime<Utc>>, completed_at: Option<DateTime<Utc>>) -> Self {
        Self {
            started_at: started_at.map(format_timestamp),
            completed_at: completed_at.map(format_timestamp),
            duration_seconds: calculate_duration(started_at, completed_at),
        }
    }
}

/// ポーリング1回分のステータス応答
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StatusResponse {
    pub terminal_state: TerminalState,
    pub task_status: TaskStatus,
    pub stable_count: u32,
    pub detail: StatusDetail,
    pub timing: TimingInfo,
}

impl StatusResponse {
    /// インデント付きJSONに変換
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// タイムスタンプをUTCのISO 8601文字列に変換
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// 開始から完了までの秒数（どちらかが無ければNone）
pub fn calculate_duration(
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
) -> Option<f64> {
    match (started_at, completed_at) {
        (Some(start), Some(end)) => {
            let millis = (end - start).num_milliseconds();
            Some(millis as f64 / 1000.0)
        }
        _ => None,
    }
}
