// Detector側テストフィクスチャ
// Note: 統合テスト用共通関数は複数の統合テストファイルから使用されるが、
// Rustコンパイラーは各統合テストを独立してコンパイルするため
// dead_code警告が発生する。実際には使用されているため警告を抑制。

#![allow(dead_code)]

/// 実際のCLIで使われる区切り線（80桁）
pub fn sep() -> String {
    "─".repeat(80)
}

pub const MODE_ACCEPT: &str = "  ⏵⏵ accept edits on (shift+tab to cycle) · esc to interrupt";
pub const MODE_PLAN: &str = "  ⏸ plan mode on (shift+tab to cycle) · esc to interrupt";

/// フッターのモード行
#[derive(Debug, Clone, Copy)]
pub enum Footer {
    Accept,
    Plan,
}

impl Footer {
    fn mode_line(self) -> &'static str {
        match self {
            Footer::Accept => MODE_ACCEPT,
            Footer::Plan => MODE_PLAN,
        }
    }
}

/// 画面下部の入力枠（空の ❯）
pub fn cli_footer(mode: Footer) -> String {
    let sep = sep();
    format!("\n{sep}\n❯\n{sep}\n{}", mode.mode_line())
}

/// 画面下部の入力枠（打鍵中）
pub fn cli_footer_inputting(text: &str, mode: Footer) -> String {
    let sep = sep();
    format!("\n{sep}\n❯ {text}\n{sep}\n{}", mode.mode_line())
}

/// 処理中の画面
pub fn processing_screen() -> String {
    format!(
        "      332  complete -c mk -f -n \"__fish_seen\" -l dry-run\n\
         \x20     333\n\
         \x20     334  # config mirror reset --tool\n\
         \n\
         ✢ Gallivanting… (1m 43s · ↓ 6.4k tokens){}",
        cli_footer(Footer::Accept)
    )
}

/// 完了後の画面
pub fn completed_screen() -> String {
    format!("✻ Cogitated for 1m 56s{}", cli_footer(Footer::Accept))
}

/// plan 承認メニュー（質問文が折り返されている）
pub fn plan_approval_screen() -> String {
    [
        "╌".repeat(64).as_str(),
        "",
        " Claude has written up a plan and is ready to execute. Would you like to",
        " proceed?",
        "",
        " ❯ 1. Yes, clear context and auto-accept edits (shift+tab)",
        "   2. Yes, auto-accept edits",
        "   3. Yes, manually approve edits",
        "   4. Type here to tell Claude what to change",
        "",
        " ctrl-g to edit in Vim · ~/.claude/plans/example.md",
    ]
    .join("\n")
}

/// 「?」が ❯ の4行上にある確認画面
pub fn exit_plan_mode_screen() -> String {
    format!(
        "{}\n Exit plan mode?\n\n  Claude wants to exit plan mode\n\n  ❯ 1. Yes\n    2. No",
        sep()
    )
}

/// ツール実行の許可確認
pub fn permission_screen() -> String {
    format!(
        "{}\n Allow tool Read to read /etc/hosts?\n\n  ❯ 1. Allow once\n    2. Allow always\n    3. Deny",
        sep()
    )
}

/// 改行を端末出力の CRLF に変換
pub fn to_crlf(text: &str) -> String {
    text.replace('\n', "\r\n")
}

/// ANSI付きの処理中出力（スピナーは色付き）
pub fn raw_processing_output() -> String {
    let sep = sep();
    format!(
        "I'll help you implement this feature.\r\n\
         \r\n\
         \x1b[38;2;215;119;87m✻\x1b[39m Thinking…\r\n\
         \r\n\
         \x1b[2m{sep}\x1b[22m\r\n\
         \x1b[1m❯\x1b[22m \r\n\
         \x1b[2m{sep}\x1b[22m\r\n\
         \x1b[38;2;153;153;153m{MODE_ACCEPT}\x1b[39m"
    )
}

/// ANSI付きの選択メニュー出力
pub fn raw_menu_output() -> &'static str {
    "\x1b[H\x1b[2J\
     Do you want to make this edit to main.rs?\r\n\
     \x1b[38;2;177;185;249m❯ 1. Yes\x1b[39m\r\n\
     \x20 2. Yes, allow all edits during this session\r\n\
     \x20 3. No, and tell Claude what to do differently"
}
