//! ファイルI/O操作
//!
//! テキストファイルを行の列として読み込み、改行コードを判定する。
//! 保存は一時ファイルに書いてから置き換える。

use crate::buffer::Eol;
use crate::error::FileError;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::Utf8Error;

/// 改行コードの判定に使う改行の数
const EOL_SAMPLES: usize = 3;

/// 読み込んだファイルの内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedFile {
    pub lines: Vec<String>,
    pub eol: Eol,
}

/// ファイル操作のトレイト
pub trait FileOperations {
    /// ファイルを読み込み、行に分割する
    fn read_lines(&self, path: &Path) -> Result<LoadedFile, FileError>;

    /// 行を改行コードで連結して書き込む
    fn write_lines(&self, path: &Path, lines: &[String], eol: Eol) -> Result<(), FileError>;

    /// ファイルが存在するかチェック
    fn file_exists(&self, path: &Path) -> bool {
        path.is_file()
    }
}

/// ファイル操作の実装
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultFileOperations;

impl FileOperations for DefaultFileOperations {
    fn read_lines(&self, path: &Path) -> Result<LoadedFile, FileError> {
        read_lines(path)
    }

    fn write_lines(&self, path: &Path, lines: &[String], eol: Eol) -> Result<(), FileError> {
        write_lines(path, lines, eol)
    }
}

fn display(path: &Path) -> String {
    path.display().to_string()
}

/// ファイルを読み込む
pub fn read_lines(path: &Path) -> Result<LoadedFile, FileError> {
    if path.is_dir() {
        return Err(FileError::IsDirectory {
            path: display(path),
        });
    }
    let bytes = fs::read(path).map_err(|e| FileError::from_io(&display(path), &e))?;
    log::debug!("read {} bytes from {}", bytes.len(), path.display());
    decode_lines(&bytes).map_err(|e| FileError::InvalidEncoding {
        path: display(path),
        offset: e.valid_up_to(),
    })
}

/// バイト列を行に分割する。UTF-8 として読めなければ書き戻しで壊さないよう拒否する。
pub fn decode_lines(bytes: &[u8]) -> Result<LoadedFile, Utf8Error> {
    let text = std::str::from_utf8(bytes)?;
    let eol = detect_eol(text);
    let lines = text.split(eol.as_str()).map(str::to_string).collect();
    Ok(LoadedFile { lines, eol })
}

/// 先頭の改行を調べて改行コードを決める。混在していれば LF。
pub fn detect_eol(text: &str) -> Eol {
    let chars: Vec<char> = text.chars().collect();
    let mut found: Vec<Eol> = Vec::with_capacity(EOL_SAMPLES);
    let mut i = 0;
    while i < chars.len() && found.len() < EOL_SAMPLES {
        match chars[i] {
            '\r' if chars.get(i + 1) == Some(&'\n') => {
                found.push(Eol::CrLf);
                i += 1;
            }
            '\r' => found.push(Eol::Cr),
            '\n' => found.push(Eol::Lf),
            _ => {}
        }
        i += 1;
    }
    match found.first() {
        Some(&first) if found.iter().all(|eol| *eol == first) => first,
        _ => Eol::Lf,
    }
}

/// 行を連結して書き込む。一時ファイルに書いてからアトミックに移動する。
pub fn write_lines(path: &Path, lines: &[String], eol: Eol) -> Result<(), FileError> {
    let content = lines.join(eol.as_str());
    write_atomic(path, content.as_bytes())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.tmp", name))
}

fn write_atomic(path: &Path, content: &[u8]) -> Result<(), FileError> {
    if path.is_dir() {
        return Err(FileError::IsDirectory {
            path: display(path),
        });
    }
    // 親ディレクトリが存在しない場合は作成
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| FileError::from_io(&display(parent), &e))?;
        }
    }

    let temp_path = temp_path_for(path);
    fs::write(&temp_path, content).map_err(|e| FileError::from_io(&display(path), &e))?;
    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(FileError::from_io(&display(path), &e));
    }
    log::debug!("wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}

/// 書き込みの素の経路。一時ファイルもバックアップも使わない（緊急保存用）。
pub fn write_lines_direct(path: &Path, lines: &[String], eol: Eol) -> Result<(), FileError> {
    let content = lines.join(eol.as_str());
    fs::write(path, content).map_err(|e| FileError::from_io(&display(path), &e))
}
