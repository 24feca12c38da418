//! ファイル管理モジュール
//!
//! パス展開、行単位の読み書き、バックアップ、緊急保存。

pub mod backup;
pub mod io;

use std::path::{Component, Path, PathBuf};

use crate::buffer::Buffer;
use crate::error::FileError;

pub use backup::{backup_path, make_backup};
pub use io::{decode_lines, detect_eol, read_lines, write_lines, DefaultFileOperations, FileOperations, LoadedFile};

/// `~` と環境変数を展開し、カレントディレクトリからの絶対パスにする
pub fn expand_path(input: &str) -> Result<PathBuf, FileError> {
    let invalid = || FileError::InvalidPath {
        path: input.to_string(),
    };
    if input.trim().is_empty() {
        return Err(invalid());
    }
    let expanded = shellexpand::full(input).map_err(|_| invalid())?;
    let path = PathBuf::from(expanded.as_ref());
    let absolute = if path.is_absolute() {
        path
    } else {
        std::env::current_dir()
            .map_err(|e| FileError::from_io(input, &e))?
            .join(path)
    };
    Ok(normalize(&absolute))
}

/// `.` と `..` を字句的に取り除く
fn normalize(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                result.pop();
            }
            other => result.push(other.as_os_str()),
        }
    }
    result
}

/// 緊急保存先: ファイル名（なければバッファ名）に `.SAVE` を付ける
pub fn emergency_path(buffer: &Buffer) -> PathBuf {
    let base = match buffer.filename() {
        Some(path) => path.as_os_str().to_os_string(),
        None => buffer.name().replace('/', "!").into(),
    };
    let mut name = base;
    name.push(".SAVE");
    PathBuf::from(name)
}

/// バッファを緊急保存する。アンドゥもバックアップも経由しない。
pub fn emergency_save(buffer: &Buffer) -> Result<PathBuf, FileError> {
    let path = emergency_path(buffer);
    io::write_lines_direct(&path, &buffer.line_strings(), buffer.eol())?;
    log::warn!("emergency save: {} -> {}", buffer.name(), path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_expand_path_normalizes() {
        let path = expand_path("/tmp/a/../b/./c.txt").unwrap();
        assert_eq!(path, PathBuf::from("/tmp/b/c.txt"));
    }

    #[test]
    fn test_expand_relative_path() {
        let path = expand_path("notes.txt").unwrap();
        assert!(path.is_absolute());
        assert!(path.ends_with("notes.txt"));
    }

    #[test]
    fn test_expand_empty_path_fails() {
        assert!(matches!(expand_path("  "), Err(FileError::InvalidPath { .. })));
    }

    #[test]
    fn test_emergency_save_writes_next_to_file() {
        let dir = tempdir().unwrap();
        let mut buffer = Buffer::from_text(1, "a.txt", "one\ntwo");
        buffer.set_filename(Some(dir.path().join("a.txt")));

        let saved = emergency_save(&buffer).unwrap();
        assert_eq!(saved, dir.path().join("a.txt.SAVE"));
        assert_eq!(std::fs::read_to_string(saved).unwrap(), "one\ntwo");
    }
}
