// lib.rs - Claude Code の画面テキストから状態を判定するライブラリ

pub mod interactive_detector;
pub mod screen_buffer;
pub mod screen_claude_detector;
pub mod screen_text;
pub mod session_tracker;
pub mod state_classifier;
pub mod state_detector;
pub mod vocabulary;

pub use interactive_detector::{detect_idle_prompt, detect_interactive, InteractionMatch};
pub use screen_buffer::ScreenBuffer;
pub use screen_claude_detector::ScreenClaudeStateDetector;
pub use screen_text::ScreenText;
pub use session_tracker::{SessionState, SessionTracker};
pub use state_classifier::{classify_mode, classify_state, StateClassifier, StateVerdict};
pub use state_detector::{create_state_detector, StateDetector};
pub use vocabulary::Vocabulary;
