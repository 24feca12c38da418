//! エラーハンドリングシステム
//!
//! tsuzuri 全体で使用される統一されたエラー型とユーティリティを定義する。
//! コマンド実行中の失敗は `CommandError` として戻り値で伝播し、
//! エコー領域へのメッセージとベルに変換される。

use thiserror::Error;

/// アプリケーション全体のエラー型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TsuzuriError {
    /// ファイル操作エラー
    #[error("File operation failed: {0}")]
    File(#[from] FileError),

    /// バッファ操作エラー
    #[error("Buffer operation failed: {0}")]
    Buffer(#[from] BufferError),

    /// 入力処理エラー
    #[error("Input processing failed: {0}")]
    Input(#[from] InputError),

    /// システムエラー
    #[error("System error: {0}")]
    System(#[from] SystemError),

    /// 設定エラー
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// 拡張言語の評価エラー
    #[error("Lisp error: {0}")]
    Lisp(String),
}

/// ファイル操作固有のエラー
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FileError {
    #[error("File not found: {path}")]
    NotFound { path: String },

    #[error("Permission denied: {path}")]
    PermissionDenied { path: String },

    #[error("Invalid path: {path}")]
    InvalidPath { path: String },

    #[error("{path} is a directory")]
    IsDirectory { path: String },

    #[error("{path} is not valid UTF-8 (byte {offset})")]
    InvalidEncoding { path: String, offset: usize },

    #[error("IO error: {message}")]
    Io { message: String },
}

impl FileError {
    /// `std::io::Error` をパス情報付きで分類する
    pub fn from_io(path: &str, error: &std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::NotFound => FileError::NotFound {
                path: path.to_string(),
            },
            std::io::ErrorKind::PermissionDenied => FileError::PermissionDenied {
                path: path.to_string(),
            },
            _ => FileError::Io {
                message: format!("{}: {}", path, error),
            },
        }
    }
}

/// バッファ操作固有のエラー
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BufferError {
    #[error("No buffer named {name}")]
    NotFound { name: String },

    #[error("Buffer name `{name}' is in use")]
    NameInUse { name: String },

    #[error("Line list corrupted: {detail}")]
    Corrupted { detail: String },
}

/// 入力処理固有のエラー
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("Invalid key sequence: {sequence}")]
    InvalidKeySequence { sequence: String },

    #[error("Key sequence {sequence} conflicts with an existing binding")]
    BindingConflict { sequence: String },

    #[error("Command not found: {command}")]
    CommandNotFound { command: String },
}

/// システム固有のエラー（致命的）
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SystemError {
    #[error("Terminal initialization failed: {message}")]
    TerminalInit { message: String },

    #[error("Terminal I/O failed: {message}")]
    TerminalIo { message: String },

    #[error("Out of memory")]
    OutOfMemory,
}

/// 設定固有のエラー
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid variable assignment: {assignment}")]
    InvalidAssignment { assignment: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Cannot load startup file {path}: {message}")]
    StartupFile { path: String, message: String },
}

/// コマンド実行の失敗
///
/// 利用者の入力ミスやバッファ境界などの想定内の失敗を表す。
/// `Quit` は `C-g` によるキャンセルで、`?` でそのまま呼び出し元へ戻す。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("Quit")]
    Quit,

    #[error("Beginning of buffer")]
    BeginningOfBuffer,

    #[error("End of buffer")]
    EndOfBuffer,

    #[error("The mark is not set now")]
    NoMark,

    #[error("Buffer is read-only: {0}")]
    ReadOnly(String),

    #[error("Undo disabled in this buffer")]
    UndoDisabled,

    #[error("No further undo information")]
    NoFurtherUndo,

    #[error("{0} is undefined")]
    UndefinedKey(String),

    #[error("Undefined function name `{0}'")]
    UndefinedFunction(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Search failed: \"{0}\"")]
    SearchFailed(String),

    #[error("{0}")]
    Message(String),
}

impl CommandError {
    /// エコー領域での扱いを決める
    pub fn level(&self) -> ErrorLevel {
        match self {
            CommandError::Quit => ErrorLevel::Info,
            CommandError::BeginningOfBuffer
            | CommandError::EndOfBuffer
            | CommandError::NoMark
            | CommandError::SearchFailed(_) => ErrorLevel::Warning,
            _ => ErrorLevel::Error,
        }
    }
}

impl From<TsuzuriError> for CommandError {
    fn from(error: TsuzuriError) -> Self {
        match error {
            TsuzuriError::File(inner) => CommandError::Message(inner.to_string()),
            TsuzuriError::Input(InputError::CommandNotFound { command }) => {
                CommandError::UndefinedFunction(command)
            }
            other => CommandError::Message(other.to_string()),
        }
    }
}

impl From<FileError> for CommandError {
    fn from(error: FileError) -> Self {
        CommandError::Message(error.to_string())
    }
}

/// エラーレベル分類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorLevel {
    Info,
    Warning,
    Error,
    Fatal,
}

/// エラー表示情報
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorDisplay {
    /// エコー領域に出す文字列
    pub message: String,
    /// エラーレベル
    pub level: ErrorLevel,
    /// ベルを鳴らすか
    pub ring_bell: bool,
}

impl ErrorDisplay {
    pub fn new(error: &CommandError) -> Self {
        Self {
            message: error.to_string(),
            level: error.level(),
            ring_bell: true,
        }
    }

    pub fn from_fatal(error: &TsuzuriError) -> Self {
        Self {
            message: error.to_string(),
            level: ErrorLevel::Fatal,
            ring_bell: true,
        }
    }
}

/// プロジェクト標準のResult型
pub type Result<T> = std::result::Result<T, TsuzuriError>;

/// コマンドの戻り値
pub type CommandResult = std::result::Result<(), CommandError>;

/// パニックの内容をログへ残すフックを設定する
///
/// 端末は代替画面にあるため標準エラーには書かない。復旧処理は
/// `catch_unwind` した呼び出し側が行う。
pub fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|panic_info| {
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s
        } else {
            "Unknown panic payload"
        };
        match panic_info.location() {
            Some(location) => log::error!(
                "PANIC at {}:{}: {}",
                location.file(),
                location.line(),
                message
            ),
            None => log::error!("PANIC: {}", message),
        }
        log::error!("Stack trace: {}", std::backtrace::Backtrace::capture());
    }));
}

impl From<std::io::Error> for TsuzuriError {
    fn from(error: std::io::Error) -> Self {
        TsuzuriError::File(FileError::Io {
            message: error.to_string(),
        })
    }
}
