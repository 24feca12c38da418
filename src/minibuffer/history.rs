//! ミニバッファの入力履歴
//!
//! 種類ごとに循環リストで保持し、`M-p`/`M-n` で辿る。

use std::collections::HashMap;

use crate::list::{CircularList, NodeId};

/// 履歴の最大件数
const HISTORY_LIMIT: usize = 100;

/// 履歴の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HistoryKind {
    Files,
    Commands,
    Search,
    Replace,
    Buffers,
    Expressions,
}

/// 1 種類分の履歴
#[derive(Debug, Clone, Default)]
pub struct History {
    entries: CircularList<String>,
    /// 辿っている位置。`None` なら履歴の外（入力中の文字列）。
    cursor: Option<NodeId>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 新しい入力を末尾に追加する。空文字列と直前と同じ入力は追加しない。
    pub fn add(&mut self, text: &str) {
        self.cursor = None;
        if text.is_empty() {
            return;
        }
        let last = self.entries.last().and_then(|id| self.entries.get(id));
        if last.map(String::as_str) == Some(text) {
            return;
        }
        self.entries.push_back(text.to_string());
        if self.entries.len() > HISTORY_LIMIT {
            if let Some(first) = self.entries.first() {
                self.entries.remove(first);
            }
        }
    }

    /// 読み始めに位置を戻す
    pub fn reset(&mut self) {
        self.cursor = None;
    }

    /// ひとつ古い項目
    pub fn previous(&mut self) -> Option<&str> {
        let target = match self.cursor {
            None => self.entries.last(),
            Some(id) => self.entries.prev(id),
        }?;
        self.cursor = Some(target);
        self.entries.get(target).map(String::as_str)
    }

    /// ひとつ新しい項目。最新を越えると `None` になり入力中の文字列へ戻る。
    pub fn next(&mut self) -> Option<&str> {
        let current = self.cursor?;
        self.cursor = self.entries.next(current);
        let target = self.cursor?;
        self.entries.get(target).map(String::as_str)
    }

    /// 履歴を辿っている途中か
    pub fn is_browsing(&self) -> bool {
        self.cursor.is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(_, entry)| entry.as_str())
    }
}

/// 種類ごとの履歴
#[derive(Debug, Clone, Default)]
pub struct Histories {
    lists: HashMap<HistoryKind, History>,
}

impl Histories {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, kind: HistoryKind) -> Option<&History> {
        self.lists.get(&kind)
    }

    pub fn get_mut(&mut self, kind: HistoryKind) -> &mut History {
        self.lists.entry(kind).or_default()
    }

    pub fn add(&mut self, kind: HistoryKind, text: &str) {
        self.get_mut(kind).add(text);
    }
}
