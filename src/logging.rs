//! ロギングシステム
//!
//! `log` クレートのバックエンドを提供する。端末は raw モードで使用するため
//! 出力先はファイルのみ。`TSUZURI_LOG` にパスが設定されている場合に有効になる。

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use log::{LevelFilter, Log, Metadata, Record};

/// ログファイルを指定する環境変数
pub const LOG_FILE_ENV: &str = "TSUZURI_LOG";
/// ログレベルを指定する環境変数
pub const LOG_LEVEL_ENV: &str = "TSUZURI_LOG_LEVEL";

/// ファイルへ書き出すロガー
#[derive(Debug)]
pub struct Logger {
    level: LevelFilter,
    output_file: Option<PathBuf>,
    sink: Mutex<Option<File>>,
}

impl Logger {
    /// デフォルト構築（出力先なし）
    pub fn new(level: LevelFilter) -> Self {
        Self {
            level,
            output_file: None,
            sink: Mutex::new(None),
        }
    }

    /// 環境変数から構築する
    pub fn from_env() -> Self {
        let level = std::env::var(LOG_LEVEL_ENV)
            .ok()
            .and_then(|value| parse_level(&value))
            .unwrap_or(LevelFilter::Info);
        let logger = Self::new(level);
        match std::env::var_os(LOG_FILE_ENV) {
            Some(path) if !path.is_empty() => logger.with_file_output(PathBuf::from(path)),
            _ => logger,
        }
    }

    /// ファイル出力を設定
    pub fn with_file_output<P: Into<PathBuf>>(mut self, path: P) -> Self {
        let path = path.into();
        let file = OpenOptions::new().create(true).append(true).open(&path).ok();
        self.sink = Mutex::new(file);
        self.output_file = Some(path);
        self
    }

    /// ログレベルを取得
    pub fn level(&self) -> LevelFilter {
        self.level
    }

    /// 出力ファイル
    pub fn output_file(&self) -> Option<&PathBuf> {
        self.output_file.as_ref()
    }

    /// グローバルロガーとして登録する
    ///
    /// 出力先がない場合は登録せず `false` を返す。
    pub fn install(self) -> bool {
        if self.output_file.is_none() {
            return false;
        }
        let level = self.level;
        if log::set_boxed_logger(Box::new(self)).is_ok() {
            log::set_max_level(level);
            true
        } else {
            false
        }
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        if let Ok(mut guard) = self.sink.lock() {
            if let Some(file) = guard.as_mut() {
                let _ = writeln!(
                    file,
                    "{} [{}] {}",
                    record.level(),
                    record.target(),
                    record.args()
                );
            }
        }
    }

    fn flush(&self) {
        if let Ok(mut guard) = self.sink.lock() {
            if let Some(file) = guard.as_mut() {
                let _ = file.flush();
            }
        }
    }
}

fn parse_level(value: &str) -> Option<LevelFilter> {
    match value.trim().to_ascii_lowercase().as_str() {
        "off" => Some(LevelFilter::Off),
        "error" => Some(LevelFilter::Error),
        "warn" | "warning" => Some(LevelFilter::Warn),
        "info" => Some(LevelFilter::Info),
        "debug" => Some(LevelFilter::Debug),
        "trace" => Some(LevelFilter::Trace),
        _ => None,
    }
}
