//! 変数テーブル
//!
//! エディタ変数は文字列として保持する。バッファローカルの上書きが
//! あればそれを優先し、なければグローバル値を使う。

use std::collections::BTreeMap;

use crate::buffer::Buffer;

/// 既定値を持つ変数の定義
#[derive(Debug, Clone, Copy)]
pub struct VarSpec {
    pub name: &'static str,
    pub default: &'static str,
    /// `setq` でバッファローカルに設定されるか
    pub local: bool,
    pub doc: &'static str,
}

/// 既定の変数一覧
pub const DEFAULT_VARIABLES: &[VarSpec] = &[
    VarSpec {
        name: "tab-width",
        default: "8",
        local: true,
        doc: "Distance between tab stops (for display of tab characters), in columns.",
    },
    VarSpec {
        name: "fill-column",
        default: "70",
        local: true,
        doc: "Column beyond which automatic line-wrapping should happen.",
    },
    VarSpec {
        name: "case-fold-search",
        default: "t",
        local: true,
        doc: "Non-nil means searches ignore case unless the pattern contains upper case letters.",
    },
    VarSpec {
        name: "make-backup-files",
        default: "t",
        local: false,
        doc: "Non-nil means make a backup of a file the first time it is saved.",
    },
    VarSpec {
        name: "backup-directory",
        default: "nil",
        local: false,
        doc: "Directory in which backups are written; nil means next to the file.",
    },
    VarSpec {
        name: "indent-tabs-mode",
        default: "t",
        local: true,
        doc: "If non-nil, indentation commands may insert tabs.",
    },
    VarSpec {
        name: "auto-fill-mode",
        default: "nil",
        local: false,
        doc: "If non-nil, new buffers start with auto fill enabled.",
    },
    VarSpec {
        name: "kill-whole-line",
        default: "nil",
        local: false,
        doc: "If non-nil, `kill-line' with no arg at start of line kills the whole line.",
    },
    VarSpec {
        name: "standard-indent",
        default: "4",
        local: true,
        doc: "Default number of columns for indentation.",
    },
    VarSpec {
        name: "ring-bell",
        default: "t",
        local: false,
        doc: "Non-nil means ring the terminal bell on any error.",
    },
    VarSpec {
        name: "inhibit-splash-screen",
        default: "nil",
        local: false,
        doc: "Non-nil inhibits the startup message.",
    },
    VarSpec {
        name: "highlight-nonselected-windows",
        default: "nil",
        local: false,
        doc: "If non-nil, highlight region even in nonselected windows.",
    },
];

/// グローバル変数表
#[derive(Debug, Clone)]
pub struct VarTable {
    values: BTreeMap<String, String>,
}

impl Default for VarTable {
    fn default() -> Self {
        Self::new()
    }
}

impl VarTable {
    /// 既定値で初期化
    pub fn new() -> Self {
        let values = DEFAULT_VARIABLES
            .iter()
            .map(|spec| (spec.name.to_string(), spec.default.to_string()))
            .collect();
        Self { values }
    }

    pub fn spec(name: &str) -> Option<&'static VarSpec> {
        DEFAULT_VARIABLES.iter().find(|spec| spec.name == name)
    }

    pub fn get_global(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn set_global(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    /// バッファローカル値を優先して参照する
    pub fn get<'a>(&'a self, buffer: Option<&'a Buffer>, name: &str) -> Option<&'a str> {
        buffer
            .and_then(|buf| buf.local_var(name))
            .or_else(|| self.get_global(name))
    }

    /// ローカル変数ならバッファへ、そうでなければグローバルへ設定する
    pub fn set(&mut self, buffer: Option<&mut Buffer>, name: &str, value: &str) {
        let local = Self::spec(name).map(|spec| spec.local).unwrap_or(false);
        match buffer {
            Some(buf) if local => buf.set_local_var(name, value),
            _ => self.set_global(name, value),
        }
    }

    pub fn get_number(&self, buffer: Option<&Buffer>, name: &str) -> Option<i64> {
        self.get(buffer, name).and_then(|value| value.trim().parse().ok())
    }

    /// `nil` 以外を真とみなす
    pub fn get_bool(&self, buffer: Option<&Buffer>, name: &str) -> bool {
        matches!(self.get(buffer, name), Some(value) if value != "nil")
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_loaded() {
        let vars = VarTable::new();
        assert_eq!(vars.get_number(None, "tab-width"), Some(8));
        assert_eq!(vars.get_number(None, "fill-column"), Some(70));
        assert!(vars.get_bool(None, "case-fold-search"));
        assert!(!vars.get_bool(None, "kill-whole-line"));
    }

    #[test]
    fn buffer_local_overrides_global() {
        let mut vars = VarTable::new();
        let mut buf = Buffer::new(1, "a");
        vars.set(Some(&mut buf), "tab-width", "4");
        assert_eq!(vars.get_number(Some(&buf), "tab-width"), Some(4));
        assert_eq!(vars.get_number(None, "tab-width"), Some(8));

        // グローバル専用の変数はバッファに入らない
        vars.set(Some(&mut buf), "make-backup-files", "nil");
        assert!(buf.local_var("make-backup-files").is_none());
        assert!(!vars.get_bool(Some(&buf), "make-backup-files"));
    }

    #[test]
    fn unknown_variables_are_global() {
        let mut vars = VarTable::new();
        vars.set(None, "my-var", "42");
        assert_eq!(vars.get(None, "my-var"), Some("42"));
        assert!(vars.names().any(|name| name == "my-var"));
    }
}
