//! 入力処理モジュール
//!
//! キーコードの正規化、キー列のトライ木、組み込みコマンド表を提供

pub mod commands;
pub mod keycode;
pub mod keymap;

// 公開API
pub use commands::{command_names, default_keymap, Command, CommandSpec, Function, COMMANDS};
pub use keycode::{render_sequence, Key, KeyParseError};
pub use keymap::{Keymap, KeymapError, Lookup};
