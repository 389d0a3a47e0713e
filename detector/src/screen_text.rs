// screen_text.rs - ANSIを含まない画面テキストと行単位のヘルパー

use std::fmt;

use crate::vocabulary::is_separator_char;

/// 描画上は見えないが文字列比較を狂わせる文字
pub const INVISIBLE_CHARS: &[char] = &[
    '\u{200B}', // zero width space
    '\u{200C}', // zero width non-joiner
    '\u{200D}', // zero width joiner
    '\u{200E}', // left-to-right mark
    '\u{200F}', // right-to-left mark
    '\u{FEFF}', // BOM
];

/// 区切り線とみなす最小文字数
const MIN_SEPARATOR_LEN: usize = 4;

/// レンダリング済みの画面テキスト（1ポーリング分）
///
/// 各行は不可視文字と行末の空白が取り除かれている。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScreenText {
    lines: Vec<String>,
}

impl ScreenText {
    /// 行の列から構築（各行をクリーニング）
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            lines: lines.into_iter().map(|l| clean_line(l.as_ref())).collect(),
        }
    }

    /// 改行区切りのテキストから構築
    pub fn parse(text: &str) -> Self {
        Self::from_lines(text.split('\n'))
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// 末尾 n 行
    pub fn last_lines(&self, n: usize) -> &[String] {
        let start = self.lines.len().saturating_sub(n);
        &self.lines[start..]
    }

    /// 画面下部の空行を除いた末尾 n 行
    pub fn last_content_lines(&self, n: usize) -> &[String] {
        let end = self
            .lines
            .iter()
            .rposition(|l| !l.trim().is_empty())
            .map_or(0, |i| i + 1);
        let start = end.saturating_sub(n);
        &self.lines[start..end]
    }

    /// 空白以外の文字が一つもないか
    pub fn is_blank(&self) -> bool {
        self.lines.iter().all(|l| l.trim().is_empty())
    }

    /// 改行で連結したテキスト
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

impl fmt::Display for ScreenText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text())
    }
}

/// 1行分のクリーニング：不可視文字を除去し行末の空白を落とす
pub fn clean_line(line: &str) -> String {
    let visible: String = line.chars().filter(|c| !INVISIBLE_CHARS.contains(c)).collect();
    visible.trim_end().to_string()
}

/// 区切り線（──── や ╌╌╌╌ など）か。引数はtrim済みの行
pub fn is_separator_line(trimmed: &str) -> bool {
    trimmed.chars().count() >= MIN_SEPARATOR_LEN && trimmed.chars().all(is_separator_char)
}

/// 探索方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// idx から direction 方向に max_dist 行以内で最も近い非空行
///
/// 画面の端に達した時点で None。
pub fn nearest_non_blank<S: AsRef<str>>(
    lines: &[S],
    idx: usize,
    direction: Direction,
    max_dist: usize,
) -> Option<usize> {
    for dist in 1..=max_dist {
        let j = match direction {
            Direction::Up => idx.checked_sub(dist)?,
            Direction::Down => idx + dist,
        };
        let line = lines.get(j)?;
        if !line.as_ref().trim().is_empty() {
            return Some(j);
        }
    }
    None
}
