// logging.rs - レベル・カテゴリ付きの軽量ロガー
//
// 判定結果は stdout に出すため、ログは既定で stderr に流す。

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::OnceLock;

/// ログレベル（数値が大きいほど詳細）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
    Trace = 4,
}

impl LogLevel {
    const ALL: [LogLevel; 5] = [
        LogLevel::Error,
        LogLevel::Warn,
        LogLevel::Info,
        LogLevel::Debug,
        LogLevel::Trace,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Trace => "TRACE",
        }
    }

    fn from_u8(value: u8) -> Self {
        Self::ALL
            .get(value as usize)
            .copied()
            .unwrap_or(LogLevel::Info)
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 設定ファイル・環境変数の文字列から変換（不明な値は info）
impl From<&str> for LogLevel {
    fn from(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => LogLevel::Error,
            "warn" | "warning" => LogLevel::Warn,
            "debug" => LogLevel::Debug,
            "trace" => LogLevel::Trace,
            _ => LogLevel::Info,
        }
    }
}

/// ログカテゴリ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogCategory {
    System,
    Config,
    /// ANSI → 画面テキスト
    Render,
    Classifier,
    Detector,
    Session,
    Cli,
}

impl LogCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogCategory::System => "SYSTEM",
            LogCategory::Config => "CONFIG",
            LogCategory::Render => "RENDER",
            LogCategory::Classifier => "CLASSIFIER",
            LogCategory::Detector => "DETECTOR",
            LogCategory::Session => "SESSION",
            LogCategory::Cli => "CLI",
        }
    }
}

impl fmt::Display for LogCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

static GLOBAL_LOG_LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Info as u8);

type LogSink = Box<dyn Fn(&str) + Send + Sync>;

static LOG_OUTPUT: OnceLock<LogSink> = OnceLock::new();

pub fn set_log_level(level: LogLevel) {
    GLOBAL_LOG_LEVEL.store(level as u8, Ordering::Relaxed);
}

pub fn get_log_level() -> LogLevel {
    LogLevel::from_u8(GLOBAL_LOG_LEVEL.load(Ordering::Relaxed))
}

/// 指定レベルが現在出力対象か
pub fn log_enabled(level: LogLevel) -> bool {
    level <= get_log_level()
}

/// ログ出力先を差し替える（最初の一回のみ有効）
pub fn set_log_output<F>(output: F)
where
    F: Fn(&str) + Send + Sync + 'static,
{
    let _ = LOG_OUTPUT.set(Box::new(output));
}

/// 1行分を整形して出力。レベル判定はマクロ側で済ませる
pub fn write_log(level: LogLevel, category: LogCategory, args: fmt::Arguments<'_>) {
    let line = format!(
        "[{}] [{level}] [{category}] {args}",
        chrono::Utc::now().format("%H:%M:%S%.3f")
    );

    match LOG_OUTPUT.get() {
        Some(output) => output(&line),
        None => eprintln!("{line}"),
    }
}

/// 文字列メッセージ版
pub fn log_message(level: LogLevel, category: LogCategory, message: &str) {
    if log_enabled(level) {
        write_log(level, category, format_args!("{message}"));
    }
}

/// レベル指定の共通マクロ。無効なレベルでは引数を評価しない
#[macro_export]
macro_rules! log_at {
    ($level:expr, $category:expr, $($arg:tt)*) => {{
        let level = $level;
        if $crate::logging::log_enabled(level) {
            $crate::logging::write_log(level, $category, format_args!($($arg)*));
        }
    }};
}

#[macro_export]
macro_rules! log_error {
    ($category:expr, $($arg:tt)*) => {
        $crate::log_at!($crate::logging::LogLevel::Error, $category, $($arg)*)
    };
}

#[macro_export]
macro_rules! log_warn {
    ($category:expr, $($arg:tt)*) => {
        $crate::log_at!($crate::logging::LogLevel::Warn, $category, $($arg)*)
    };
}

#[macro_export]
macro_rules! log_info {
    ($category:expr, $($arg:tt)*) => {
        $crate::log_at!($crate::logging::LogLevel::Info, $category, $($arg)*)
    };
}

#[macro_export]
macro_rules! log_debug {
    ($category:expr, $($arg:tt)*) => {
        $crate::log_at!($crate::logging::LogLevel::Debug, $category, $($arg)*)
    };
}

#[macro_export]
macro_rules! log_trace {
    ($category:expr, $($arg:tt)*) => {
        $crate::log_at!($crate::logging::LogLevel::Trace, $category, $($arg)*)
    };
}

/// カテゴリ別の短縮形: `log_render!(debug, "...")`
#[macro_export]
macro_rules! log_config {
    ($level:ident, $($arg:tt)*) => {
        $crate::paste::paste! {
            $crate::[<log_ $level>]!($crate::logging::LogCategory::Config, $($arg)*)
        }
    };
}

#[macro_export]
macro_rules! log_render {
    ($level:ident, $($arg:tt)*) => {
        $crate::paste::paste! {
            $crate::[<log_ $level>]!($crate::logging::LogCategory::Render, $($arg)*)
        }
    };
}

#[macro_export]
macro_rules! log_detector {
    ($level:ident, $($arg:tt)*) => {
        $crate::paste::paste! {
            $crate::[<log_ $level>]!($crate::logging::LogCategory::Detector, $($arg)*)
        }
    };
}

#[macro_export]
macro_rules! log_session {
    ($level:ident, $($arg:tt)*) => {
        $crate::paste::paste! {
            $crate::[<log_ $level>]!($crate::logging::LogCategory::Session, $($arg)*)
        }
    };
}

#[macro_export]
macro_rules! log_cli {
    ($level:ident, $($arg:tt)*) => {
        $crate::paste::paste! {
            $crate::[<log_ $level>]!($crate::logging::LogCategory::Cli, $($arg)*)
        }
    };
}
