use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// メインの設定構造体
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// ログ設定
    #[serde(default)]
    pub logging: LoggingSettings,

    /// 仮想スクリーン設定
    #[serde(default)]
    pub screen: ScreenSettings,

    /// 状態検出の閾値
    #[serde(default)]
    pub detection: DetectionSettings,

    /// 語彙の追加
    #[serde(default)]
    pub vocabulary: VocabularySettings,
}

/// ログ関連の設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// 詳細ログを有効にするか（有効時はdebugレベル）
    #[serde(default)]
    pub verbose: bool,

    /// ログレベル ("error" | "warn" | "info" | "debug" | "trace")
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// 画面レンダリングのサイズ
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenSettings {
    #[serde(default = "default_rows")]
    pub rows: usize,

    #[serde(default = "default_cols")]
    pub cols: usize,
}

/// 状態検出の探索範囲と安定判定の閾値
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionSettings {
    /// ❯行の上下で区切り線を探す最大距離
    #[serde(default = "default_separator_lookaround")]
    pub separator_lookaround: usize,

    /// ❯行から上へ「?」を探す最大行数
    #[serde(default = "default_question_search_limit")]
    pub question_search_limit: usize,

    /// 対話プロンプト検出に使う末尾の行数
    #[serde(default = "default_pattern_match_last_n_lines")]
    pub pattern_match_last_n_lines: usize,

    /// interactive確定に必要な連続一致回数
    #[serde(default = "default_interactive_stability_threshold")]
    pub interactive_stability_threshold: u32,

    /// idleを完了とみなすのに必要な連続一致回数
    #[serde(default = "default_completed_stability_threshold")]
    pub completed_stability_threshold: u32,
}

/// 既定語彙への追加分
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VocabularySettings {
    /// スピナー文言の既知語。スピナー行は未知語でも処理中と判定されるため、
    /// 判定結果は変わらず、未知語ログの抑止と完了語との重複検査にだけ効く
    #[serde(default)]
    pub extra_processing_words: Vec<String>,

    #[serde(default)]
    pub extra_completed_words: Vec<String>,

    #[serde(default)]
    pub extra_prompts: Vec<String>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            verbose: false,
            level: default_log_level(),
        }
    }
}

impl Default for ScreenSettings {
    fn default() -> Self {
        Self {
            rows: default_rows(),
            cols: default_cols(),
        }
    }
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            separator_lookaround: default_separator_lookaround(),
            question_search_limit: default_question_search_limit(),
            pattern_match_last_n_lines: default_pattern_match_last_n_lines(),
            interactive_stability_threshold: default_interactive_stability_threshold(),
            completed_stability_threshold: default_completed_stability_threshold(),
        }
    }
}

// デフォルト値関数
fn default_log_level() -> String {
    "info".to_string()
}

fn default_rows() -> usize {
    50
}

fn default_cols() -> usize {
    120
}

fn default_separator_lookaround() -> usize {
    3
}

fn default_question_search_limit() -> usize {
    20
}

fn default_pattern_match_last_n_lines() -> usize {
    30
}

fn default_interactive_stability_threshold() -> u32 {
    2
}

fn default_completed_stability_threshold() -> u32 {
    5
}

impl Config {
    /// 設定ファイルから読み込み
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;

        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.as_ref().display()))?;

        Ok(config)
    }

    /// 設定ファイルに保存
    pub fn save_to_file<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        // ディレクトリが存在しない場合は作成
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// デフォルトの設定ファイルパスを取得
    pub fn default_config_path() -> Result<PathBuf> {
        let home_dir = home::home_dir().context("Failed to get home directory")?;

        Ok(home_dir.join(".ccstate").join("config.toml"))
    }

    /// 設定ファイルパスの候補を取得（優先順位順）
    pub fn config_path_candidates() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        // 1. カレントディレクトリの .ccstate/config.toml
        if let Ok(current_dir) = std::env::current_dir() {
            paths.push(current_dir.join(".ccstate").join("config.toml"));
        }

        // 2. ホームディレクトリの .ccstate/config.toml
        if let Ok(path) = Self::default_config_path() {
            paths.push(path);
        }

        // 3. XDG規格に従った設定ディレクトリ
        if let Ok(xdg_config_home) = std::env::var("XDG_CONFIG_HOME") {
            paths.push(
                PathBuf::from(xdg_config_home)
                    .join("ccstate")
                    .join("config.toml"),
            );
        } else if let Some(home_dir) = home::home_dir() {
            paths.push(home_dir.join(".config").join("ccstate").join("config.toml"));
        }

        paths
    }

    /// 設定ファイルを自動検出して読み込み
    pub fn load_auto() -> Result<Option<(Self, PathBuf)>> {
        for path in Self::config_path_candidates() {
            if path.exists() {
                let config = Self::from_file(&path)?;
                crate::log_config!(debug, "Loaded config from {}", path.display());
                return Ok(Some((config, path)));
            }
        }
        Ok(None)
    }

    /// 環境変数で設定を上書き
    pub fn apply_env_overrides(&mut self) {
        if let Ok(verbose) = std::env::var("CCSTATE_VERBOSE") {
            self.logging.verbose = verbose == "1" || verbose.to_lowercase() == "true";
        }

        if let Ok(level) = std::env::var("CCSTATE_LOG_LEVEL") {
            self.logging.level = level;
        }

        // 数値として読めない値は無視
        if let Some(rows) = env_usize("CCSTATE_ROWS") {
            self.screen.rows = rows;
        }

        if let Some(cols) = env_usize("CCSTATE_COLS") {
            self.screen.cols = cols;
        }
    }

    /// 値の整合性チェック
    pub fn validate(&self) -> Result<()> {
        if self.screen.rows == 0 || self.screen.cols == 0 {
            bail!(
                "screen size must be non-zero (rows={}, cols={})",
                self.screen.rows,
                self.screen.cols
            );
        }

        if self.detection.separator_lookaround == 0 {
            bail!("detection.separator_lookaround must be at least 1");
        }

        if self.detection.question_search_limit == 0 {
            bail!("detection.question_search_limit must be at least 1");
        }

        if self.detection.pattern_match_last_n_lines == 0 {
            bail!("detection.pattern_match_last_n_lines must be at least 1");
        }

        let vocab = &self.vocabulary;
        if let Some(word) = vocab
            .extra_completed_words
            .iter()
            .find(|w| vocab.extra_processing_words.contains(w))
        {
            bail!("vocabulary word '{word}' cannot be both a processing and a completed word");
        }

        let blank = vocab
            .extra_processing_words
            .iter()
            .chain(&vocab.extra_completed_words)
            .chain(&vocab.extra_prompts)
            .any(|w| w.trim().is_empty());
        if blank {
            bail!("vocabulary entries must not be blank");
        }

        Ok(())
    }

    /// ログレベル（verbose指定時はdebug以上）
    pub fn effective_log_level(&self) -> crate::logging::LogLevel {
        let level = crate::logging::LogLevel::from(self.logging.level.as_str());
        if self.logging.verbose {
            level.max(crate::logging::LogLevel::Debug)
        } else {
            level
        }
    }

    /// 設定のサンプルを生成
    pub fn sample() -> Self {
        let mut config = Self::default();

        config.logging.verbose = false;
        config.logging.level = "info".to_string();

        config.vocabulary.extra_processing_words = vec!["Deliberating".to_string()];
        config.vocabulary.extra_completed_words = vec!["Simmered".to_string()];

        config
    }
}

fn env_usize(key: &str) -> Option<usize> {
    std::env::var(key).ok()?.trim().parse().ok()
}
