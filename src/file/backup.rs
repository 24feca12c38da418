//! バックアップファイル
//!
//! 初回保存の前に元のファイルを `file~` へ複製する。バックアップ用
//! ディレクトリが設定されていれば、絶対パスの `/` を `!` に置き換えた
//! 名前でそこへ置く。

use crate::error::FileError;
use std::fs;
use std::path::{Path, PathBuf};

/// バックアップファイルのパス
pub fn backup_path(path: &Path, backup_dir: Option<&Path>) -> PathBuf {
    match backup_dir {
        None => {
            let mut name = path.as_os_str().to_os_string();
            name.push("~");
            PathBuf::from(name)
        }
        Some(dir) => {
            let encoded = path.to_string_lossy().replace('/', "!");
            dir.join(format!("{}~", encoded))
        }
    }
}

/// 既存ファイルを複製する。元のファイルがなければ何もしない。
pub fn make_backup(path: &Path, backup_dir: Option<&Path>) -> Result<Option<PathBuf>, FileError> {
    if !path.is_file() {
        return Ok(None);
    }
    if let Some(dir) = backup_dir {
        if !dir.exists() {
            fs::create_dir_all(dir)
                .map_err(|e| FileError::from_io(&dir.display().to_string(), &e))?;
        }
    }
    let backup = backup_path(path, backup_dir);
    fs::copy(path, &backup).map_err(|e| FileError::from_io(&backup.display().to_string(), &e))?;
    log::info!("backup {} -> {}", path.display(), backup.display());
    Ok(Some(backup))
}
