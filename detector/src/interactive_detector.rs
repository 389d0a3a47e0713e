// interactive_detector.rs - 対話プロンプトの種類判定と選択肢の抽出
//
// 5種類のプロンプト形状を優先度順に照合し、最初に一致して選択肢が
// 1つ以上取れたものを返す。

use std::sync::OnceLock;

use ccstate_shared::InteractionType;
use regex::Regex;
use serde::Serialize;

/// メニューとみなす最小行数
const MIN_MENU_LINES: usize = 2;

/// 判定結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InteractionMatch {
    pub interaction_type: InteractionType,
    pub choices: Vec<String>,
    pub matched_text: String,
}

/// プロンプト形状の照合方法
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MatchScope {
    /// テキスト全体のどこかに一致
    Anywhere,
    /// 指定数以上の行が一致
    Lines(usize),
}

/// プロンプト形状ごとの照合パターン
#[derive(Debug)]
pub struct InteractionPattern {
    pub interaction_type: InteractionType,
    pub priority: u8,
    regex: Regex,
    scope: MatchScope,
}

impl InteractionPattern {
    fn new(interaction_type: InteractionType, pattern: &str, scope: MatchScope) -> Self {
        Self {
            interaction_type,
            priority: interaction_type.priority(),
            regex: Regex::new(pattern).unwrap(),
            scope,
        }
    }

    /// 一致した部分を返す。行単位の場合は一致行を改行で連結
    pub fn find(&self, text: &str) -> Option<String> {
        match self.scope {
            MatchScope::Anywhere => self.regex.find(text).map(|m| m.as_str().to_string()),
            MatchScope::Lines(min) => {
                let lines: Vec<&str> = text
                    .split('\n')
                    .filter(|line| self.regex.is_match(line))
                    .collect();
                (lines.len() >= min).then(|| lines.join("\n"))
            }
        }
    }
}

/// 優先度順に並んだパターン表
pub fn interaction_patterns() -> &'static [InteractionPattern] {
    static PATTERNS: OnceLock<Vec<InteractionPattern>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let mut patterns = vec![
            InteractionPattern::new(
                InteractionType::PermissionConfirm,
                r"(?i)Allow\s+tool\s+\w+\?",
                MatchScope::Anywhere,
            ),
            InteractionPattern::new(
                InteractionType::HighlightedOption,
                r"❯\s+\w+",
                MatchScope::Anywhere,
            ),
            InteractionPattern::new(
                InteractionType::PlanApproval,
                r"(?i)Proceed(\s+with)?.*\?",
                MatchScope::Anywhere,
            ),
            InteractionPattern::new(
                InteractionType::UserQuestion,
                r"(?i)(Do\s+you\s+want|Would\s+you\s+like|Should\s+I)",
                MatchScope::Anywhere,
            ),
            InteractionPattern::new(
                InteractionType::SelectionMenu,
                r"^\s*[\d\-\*\+][.)]?\s+\w+",
                MatchScope::Lines(MIN_MENU_LINES),
            ),
        ];
        patterns.sort_by_key(|p| p.priority);
        patterns
    })
}

struct ChoiceRegexes {
    yes: Regex,
    no: Regex,
    proceed: Regex,
    cancel: Regex,
    caret_option: Regex,
    indented_word: Regex,
    menu_item: Regex,
}

fn choice_regexes() -> &'static ChoiceRegexes {
    static REGEXES: OnceLock<ChoiceRegexes> = OnceLock::new();
    REGEXES.get_or_init(|| ChoiceRegexes {
        yes: Regex::new(r"(?i)\bYes\b").unwrap(),
        no: Regex::new(r"(?i)\bNo\b").unwrap(),
        proceed: Regex::new(r"(?i)\bProceed\b").unwrap(),
        cancel: Regex::new(r"(?i)\bCancel\b").unwrap(),
        caret_option: Regex::new(r"❯\s+(.+)").unwrap(),
        indented_word: Regex::new(r"^\s{2,}\w").unwrap(),
        menu_item: Regex::new(r"^\s*[\d\-\*\+][.)]?\s+(\w.*)").unwrap(),
    })
}

fn idle_prompt_regex() -> &'static Regex {
    static IDLE: OnceLock<Regex> = OnceLock::new();
    IDLE.get_or_init(|| Regex::new(r"(?m)❯\s*$").unwrap())
}

/// 末尾N行から対話プロンプトを判定する
pub fn detect_interactive<S: AsRef<str>>(lines: &[S]) -> Option<InteractionMatch> {
    let text = lines
        .iter()
        .map(|l| l.as_ref())
        .collect::<Vec<_>>()
        .join("\n");

    interaction_patterns().iter().find_map(|pattern| {
        let matched_text = pattern.find(&text)?;
        let choices = extract_choices(&text, pattern.interaction_type);
        if choices.is_empty() {
            // 形は合っても選択肢が取れなければ次の候補へ
            return None;
        }
        Some(InteractionMatch {
            interaction_type: pattern.interaction_type,
            choices,
            matched_text,
        })
    })
}

/// 空の ❯ プロンプト（入力待ち）が表示されているか
pub fn detect_idle_prompt(text: &str) -> bool {
    idle_prompt_regex().is_match(text)
}

/// プロンプト種別ごとの選択肢抽出
pub fn extract_choices(text: &str, interaction_type: InteractionType) -> Vec<String> {
    let re = choice_regexes();
    match interaction_type {
        InteractionType::PermissionConfirm | InteractionType::UserQuestion => {
            keyword_choices(text, &[("Yes", &re.yes), ("No", &re.no)])
        }
        InteractionType::PlanApproval => keyword_choices(
            text,
            &[
                ("Yes", &re.yes),
                ("No", &re.no),
                ("Proceed", &re.proceed),
                ("Cancel", &re.cancel),
            ],
        ),
        InteractionType::HighlightedOption => text
            .split('\n')
            .filter_map(|line| {
                if line.contains('❯') {
                    re.caret_option.captures(line).map(|c| c[1].trim().to_string())
                } else if re.indented_word.is_match(line) {
                    Some(line.trim().to_string())
                } else {
                    None
                }
            })
            .filter(|choice| !choice.is_empty())
            .collect(),
        InteractionType::SelectionMenu => text
            .split('\n')
            .filter_map(|line| re.menu_item.captures(line).map(|c| c[1].trim().to_string()))
            .filter(|choice| !choice.is_empty())
            .collect(),
    }
}

/// 単語が含まれる選択肢を列挙。1つも無ければ Yes/No
fn keyword_choices(text: &str, keywords: &[(&str, &Regex)]) -> Vec<String> {
    let found: Vec<String> = keywords
        .iter()
        .filter(|(_, regex)| regex.is_match(text))
        .map(|(label, _)| label.to_string())
        .collect();

    if found.is_empty() {
        vec!["Yes".to_string(), "No".to_string()]
    } else {
        found
    }
}
