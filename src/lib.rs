//! tsuzuri - Emacs 互換の端末テキストエディタ
//!
//! 行リストのバッファ、キーマップによるコマンド実行、設定用の小さな Lisp を持つ。

// 拡張言語
pub mod alisp;

// コアモジュール
pub mod error;
pub mod list;
pub mod logging;
pub mod variables;

// データ層
pub mod buffer;
pub mod file;

// 編集層
pub mod editor;

// ロジック層
pub mod input;
pub mod minibuffer;
pub mod search;

// 表示層
pub mod term;

// 公開API
pub use buffer::{Buffer, BufferId, Point};
pub use editor::Editor;
pub use error::{CommandError, CommandResult, Result, TsuzuriError};
pub use input::{Command, Key};
pub use term::{CrosstermTerminal, ScriptedTerminal, Terminal};
