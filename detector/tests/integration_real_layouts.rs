// 実際のClaude Code画面レイアウトを使った状態分類テスト

mod common;

use ccstate_detector::interactive_detector::{detect_idle_prompt, detect_interactive};
use ccstate_detector::screen_text::ScreenText;
use ccstate_detector::state_classifier::{classify_mode, classify_state, StateClassifier};
use ccstate_shared::{ClaudeState, Config, InteractionType, PromptMode};
use common::test_fixtures::*;

#[test]
fn test_processing_layout_with_footer() {
    let screen = processing_screen();
    let verdict = classify_state(&screen);
    assert_eq!(verdict.state, ClaudeState::Processing);
    assert!(verdict.detail.starts_with("Gallivanting…"));
    assert_eq!(classify_mode(&screen), PromptMode::AcceptEdits);
}

#[test]
fn test_processing_with_tip_below_spinner() {
    let screen = format!(
        "⏺ Updated plan\n  ⎿  /plan to preview\n\n✢ Schlepping… (43s · ↑ 694 tokens · thinking)\n  ⎿  Tip: Did you know you can drag and drop image files into your terminal?{}",
        cli_footer(Footer::Accept)
    );
    let verdict = classify_state(&screen);
    assert_eq!(verdict.state, ClaudeState::Processing);
    assert!(verdict.detail.starts_with("Schlepping…"));
}

#[test]
fn test_unknown_spinner_text_is_processing() {
    let screen = format!(
        "Looking through the codebase for relevant code.\n\n✳ Searching for patterns in src/{}",
        cli_footer(Footer::Accept)
    );
    let verdict = classify_state(&screen);
    assert_eq!(verdict.state, ClaudeState::Processing);
    assert_eq!(verdict.detail, "Searching for patterns in src/");
}

#[test]
fn test_completed_layout() {
    let verdict = classify_state(&completed_screen());
    assert_eq!(verdict.state, ClaudeState::Completed);
    assert_eq!(verdict.detail, "Cogitated");
}

#[test]
fn test_plan_approval_menu() {
    let screen = plan_approval_screen();
    let verdict = classify_state(&screen);
    assert_eq!(verdict.state, ClaudeState::Interactive);
    assert_eq!(
        verdict.detail,
        "1. Yes, clear context and auto-accept edits (shift+tab)"
    );

    let lines: Vec<&str> = screen.split('\n').collect();
    let interaction = detect_interactive(&lines).unwrap();
    assert_eq!(interaction.interaction_type, InteractionType::HighlightedOption);
    assert_eq!(
        interaction.choices,
        vec![
            "1. Yes, clear context and auto-accept edits (shift+tab)",
            "2. Yes, auto-accept edits",
            "3. Yes, manually approve edits",
            "4. Type here to tell Claude what to change",
        ]
    );
}

#[test]
fn test_exit_plan_mode_question_four_lines_above() {
    let screen = exit_plan_mode_screen();
    let verdict = classify_state(&screen);
    assert_eq!(verdict.state, ClaudeState::Interactive);
    assert_eq!(verdict.detail, "1. Yes");

    let parsed = ScreenText::parse(&screen);
    let interaction = detect_interactive(parsed.lines()).unwrap();
    assert!(interaction.choices.contains(&"1. Yes".to_string()));
    assert!(interaction.choices.contains(&"2. No".to_string()));
}

#[test]
fn test_permission_menu() {
    let screen = permission_screen();
    let verdict = classify_state(&screen);
    assert_eq!(verdict.state, ClaudeState::Interactive);
    assert_eq!(verdict.detail, "1. Allow once");

    let parsed = ScreenText::parse(&screen);
    let interaction = detect_interactive(parsed.lines()).unwrap();
    // 「Allow tool Read to ...?」は単純な許可確認の形ではない
    assert_eq!(interaction.interaction_type, InteractionType::HighlightedOption);
    assert_eq!(
        interaction.choices,
        vec!["1. Allow once", "2. Allow always", "3. Deny"]
    );
}

#[test]
fn test_literal_prompt_after_plan_list() {
    let screen = "I've analyzed the code and here's my plan:\n\n\
                  1. Refactor the authentication module\n\
                  2. Add unit tests for the new logic\n\
                  3. Update the API documentation\n\n\
                  Should I proceed?";
    let verdict = classify_state(screen);
    assert_eq!(verdict.state, ClaudeState::Interactive);
    assert_eq!(verdict.detail, "Should I proceed?");
}

#[test]
fn test_confirmed_caret_beats_stale_spinner() {
    let screen = "✻ Thinking…\nI found two possible approaches.\n\nWhich approach do you prefer?\n❯ Yes\n  No";
    let verdict = classify_state(screen);
    assert_eq!(verdict.state, ClaudeState::Interactive);
    assert_eq!(verdict.detail, "Yes");
}

#[test]
fn test_unconfirmed_caret_falls_back_to_spinner() {
    let verdict = classify_state("✻ Thinking…\nSome output\n❯ ls -la");
    assert_eq!(verdict.state, ClaudeState::Processing);
    assert_eq!(verdict.detail, "Thinking…");
}

#[test]
fn test_question_blocked_by_separator_is_idle() {
    let screen = format!(
        "Is this correct?\n{}\nSome context below separator\n❯ ls -la",
        sep()
    );
    assert_eq!(classify_state(&screen).state, ClaudeState::Idle);
}

#[test]
fn test_inputting_in_accept_mode() {
    let screen = format!(
        "I've finished reviewing the code.{}",
        cli_footer_inputting("implement the auth feature", Footer::Accept)
    );
    let verdict = classify_state(&screen);
    assert_eq!(verdict.state, ClaudeState::Inputting);
    assert_eq!(verdict.detail, "implement the auth feature");
    assert_eq!(classify_mode(&screen), PromptMode::AcceptEdits);
}

#[test]
fn test_inputting_in_plan_mode_after_completion() {
    let screen = format!(
        "✻ Worked for 30s{}",
        cli_footer_inputting("fix the login bug", Footer::Plan)
    );
    let verdict = classify_state(&screen);
    assert_eq!(verdict.state, ClaudeState::Inputting);
    assert_eq!(verdict.detail, "fix the login bug");
    assert_eq!(classify_mode(&screen), PromptMode::Plan);
}

#[test]
fn test_idle_footer() {
    let screen = format!(
        "Task completed successfully.\n\nAll tests passed.{}",
        cli_footer(Footer::Accept)
    );
    let verdict = classify_state(&screen);
    assert_eq!(verdict.state, ClaudeState::Idle);
    assert_eq!(verdict.detail, "");
    assert!(detect_idle_prompt(&screen));
}

#[test]
fn test_long_output_uses_bottom_state() {
    let mut lines: Vec<String> = (0..200).map(|i| format!("line {i}")).collect();
    lines.push("✻ Thinking…".to_string());
    let verdict = classify_state(&lines.join("\n"));
    assert_eq!(verdict.state, ClaudeState::Processing);

    lines.push("Should I proceed?".to_string());
    let verdict = classify_state(&lines.join("\n"));
    assert_eq!(verdict.state, ClaudeState::Interactive);
    assert_eq!(verdict.detail, "Should I proceed?");
}

#[test]
fn test_configured_vocabulary_extends_classification() {
    let mut config = Config::default();
    config.vocabulary.extra_completed_words = vec!["Simmered".to_string()];
    config.vocabulary.extra_prompts = vec!["Continue with the migration?".to_string()];
    let classifier = StateClassifier::from_config(&config).unwrap();

    let marker = "✻ Simmered for 3s";
    assert_eq!(classify_state(marker).state, ClaudeState::Processing);
    let verdict = classifier.classify(marker);
    assert_eq!(verdict.state, ClaudeState::Completed);
    assert_eq!(verdict.detail, "Simmered");

    let verdict = classifier.classify("Schema diff ready.\nContinue with the migration?");
    assert_eq!(verdict.state, ClaudeState::Interactive);
    assert_eq!(verdict.detail, "Continue with the migration?");
}

#[test]
fn test_every_vocabulary_word_classifies_by_its_set() {
    use ccstate_detector::vocabulary::{
        COMPLETED_WORDS, INTERACTIVE_PROMPTS, PROCESSING_WORDS, SPINNER_GLYPHS,
    };

    for glyph in SPINNER_GLYPHS {
        for word in COMPLETED_WORDS {
            let verdict = classify_state(&format!("{glyph} {word} for 3s"));
            assert_eq!(verdict.state, ClaudeState::Completed, "{glyph} {word}");
            assert_eq!(verdict.detail, *word);
        }
    }

    for word in PROCESSING_WORDS {
        let line = format!("✻ {word}…");
        let verdict = classify_state(&line);
        assert_eq!(verdict.state, ClaudeState::Processing, "{word}");
        assert_eq!(verdict.detail, format!("{word}…"));
    }

    for prompt in INTERACTIVE_PROMPTS {
        let verdict = classify_state(&format!("✻ Thinking…\n{prompt}"));
        assert_eq!(verdict.state, ClaudeState::Interactive);
        assert!(!verdict.detail.is_empty());
    }
}
