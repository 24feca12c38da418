//! 読み取りと評価のエラー

use std::fmt;

use thiserror::Error;

/// ソース中の位置。行・桁とも 1 始まり。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// S 式を読めなかった
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReaderError {
    #[error("{at}: End of file during parsing")]
    UnexpectedEof { at: Position },

    #[error("{at}: Unbalanced `)'")]
    UnbalancedClose { at: Position },

    /// `at` は開きの `"` の位置
    #[error("{at}: Unterminated string")]
    UnterminatedString { at: Position },

    #[error("{at}: Unknown escape `\\{escape}'")]
    UnknownEscape { escape: char, at: Position },

    #[error("{at}: Invalid read syntax `{found}'")]
    InvalidSyntax { found: String, at: Position },
}

impl ReaderError {
    pub fn position(&self) -> Position {
        match self {
            ReaderError::UnexpectedEof { at }
            | ReaderError::UnbalancedClose { at }
            | ReaderError::UnterminatedString { at }
            | ReaderError::UnknownEscape { at, .. }
            | ReaderError::InvalidSyntax { at, .. } => *at,
        }
    }
}

/// 評価の失敗。コマンド自体の失敗は `nil` になるのでここには来ない。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    #[error(transparent)]
    Read(#[from] ReaderError),

    #[error("Undefined function name `{0}'")]
    UndefinedFunction(String),

    /// 形の崩れた特殊形式。値は形式の名前。
    #[error("Invalid {0} form")]
    InvalidForm(&'static str),

    #[error("Cannot open load file: {path}")]
    LoadFile { path: String, reason: String },
}
