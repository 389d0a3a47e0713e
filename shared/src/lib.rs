pub mod config;
pub mod logging;
pub mod protocol;

pub use config::*;
pub use protocol::*;

// カテゴリ別ログマクロが利用側クレートで展開できるように再エクスポート
#[doc(hidden)]
pub use paste;
