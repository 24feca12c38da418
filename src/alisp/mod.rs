//! 設定用の小さな Lisp
//!
//! S 式を読み、`setq`・`quote`・`progn` と登録済みコマンドを評価する。
//! 値は変数表と同じ文字列で保持する。

mod ast;
pub mod error;
mod eval;
pub mod reader;

pub use ast::Expr;
pub use error::{EvalError, Position, ReaderError};
pub use eval::{eval, eval_file, eval_string};
