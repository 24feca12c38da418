//! アンドゥログ
//!
//! 各エントリは「取り消すときに行う操作」を記録する。取り消しの実行中は
//! 通常の記録を止め、逆操作だけを明示的に積むことで、続けて取り消すと
//! やり直しになる。

use super::{Buffer, Point};
use crate::error::CommandError;

/// 取り消し時に行う操作
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UndoDelta {
    /// グループの開始
    StartSequence,
    /// グループの終了
    EndSequence,
    /// テキストを挿入する。`point_at_end` ならポイントを挿入後へ置く。
    InsertBlock { text: String, point_at_end: bool },
    /// `size` 文字を削除する
    RemoveBlock { size: usize },
    /// `new_size` 文字を削除して `old_text` を挿入する
    ReplaceBlock { old_text: String, new_size: usize },
    /// 1 文字を置き換える
    ReplaceChar { ch: char },
    /// ポイントを動かさずに 1 文字挿入する
    IntercalateChar { ch: char },
}

/// アンドゥエントリ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoEntry {
    pub delta: UndoDelta,
    /// 操作位置の行番号
    pub n: usize,
    /// 操作位置の行内オフセット
    pub o: usize,
    /// 記録時にバッファが未変更だった
    pub unchanged: bool,
}

/// バッファごとのアンドゥ履歴
#[derive(Debug, Clone, Default)]
pub struct UndoLog {
    entries: Vec<UndoEntry>,
    /// 次に取り消すエントリの上限（この位置より下が対象）
    next: usize,
    suppressed: bool,
}

impl UndoLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[UndoEntry] {
        &self.entries
    }

    pub fn last(&self) -> Option<&UndoEntry> {
        self.entries.last()
    }

    /// 取り消し可能な残りエントリ数
    pub fn remaining(&self) -> usize {
        self.next
    }

    pub fn is_suppressed(&self) -> bool {
        self.suppressed
    }

    /// 記録停止状態を切り替え、以前の状態を返す
    pub fn set_suppressed(&mut self, suppressed: bool) -> bool {
        std::mem::replace(&mut self.suppressed, suppressed)
    }

    /// 取り消しカーソルを最新へ戻す
    pub fn reset_cursor(&mut self) {
        self.next = self.entries.len();
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.next = 0;
    }

    /// 保存後は過去の未変更状態に戻れないので印を消す
    pub fn forget_unchanged(&mut self) {
        for entry in &mut self.entries {
            entry.unchanged = false;
        }
    }

    fn push(&mut self, entry: UndoEntry) {
        self.entries.push(entry);
    }

    fn pop(&mut self) -> Option<UndoEntry> {
        let entry = self.entries.pop();
        self.next = self.next.min(self.entries.len());
        entry
    }
}

impl Buffer {
    /// 通常の編集操作から呼ばれる記録
    pub(crate) fn record_undo(&mut self, delta: UndoDelta, pt: Point) {
        if self.flags.no_undo || self.undo.is_suppressed() {
            return;
        }
        self.push_undo(delta, pt);
    }

    fn push_undo(&mut self, delta: UndoDelta, pt: Point) {
        let entry = UndoEntry {
            delta,
            n: pt.n,
            o: pt.o,
            unchanged: !self.flags.modified,
        };
        self.undo.push(entry);
    }

    /// コマンド 1 回分の編集をまとめ始める
    pub fn undo_start_sequence(&mut self) {
        let pt = self.pt;
        self.record_undo(UndoDelta::StartSequence, pt);
    }

    /// グループを閉じる。中身が空なら開始記録ごと取り除く。
    pub fn undo_end_sequence(&mut self) {
        if self.flags.no_undo || self.undo.is_suppressed() {
            return;
        }
        match self.undo.last().map(|entry| &entry.delta) {
            Some(UndoDelta::StartSequence) => {
                self.undo.pop();
            }
            Some(_) => {
                let pt = self.pt;
                self.push_undo(UndoDelta::EndSequence, pt);
            }
            None => {}
        }
    }

    /// アンドゥを 1 段階実行する
    ///
    /// 直前のコマンドがアンドゥでなければカーソルを最新へ戻してから始める。
    pub fn undo(&mut self, continuing: bool) -> Result<(), CommandError> {
        if self.flags.no_undo {
            return Err(CommandError::UndoDisabled);
        }
        self.ensure_writable()?;
        if !continuing {
            self.undo.reset_cursor();
        }
        if self.undo.next == 0 {
            self.undo.reset_cursor();
            return Err(CommandError::NoFurtherUndo);
        }
        let top = self.undo.next - 1;
        self.undo.next = self.revert_entry(top);
        Ok(())
    }

    /// `index` のエントリを取り消し、次の取り消し上限を返す
    fn revert_entry(&mut self, index: usize) -> usize {
        let entry = self.undo.entries[index].clone();
        let previous = self.undo.set_suppressed(true);
        self.goto_point(entry.n, entry.o);
        let at = self.pt;

        let next = match entry.delta {
            UndoDelta::StartSequence => index,
            UndoDelta::EndSequence => {
                self.push_undo(UndoDelta::StartSequence, at);
                let mut cursor = index;
                while cursor > 0 {
                    let below = cursor - 1;
                    if self.undo.entries[below].delta == UndoDelta::StartSequence {
                        cursor = below;
                        break;
                    }
                    cursor = self.revert_entry(below);
                }
                let pt = self.pt;
                self.push_undo(UndoDelta::EndSequence, pt);
                cursor
            }
            UndoDelta::InsertBlock { text, point_at_end } => {
                self.push_undo(
                    UndoDelta::RemoveBlock {
                        size: text.chars().count(),
                    },
                    at,
                );
                self.insert_text_raw(&text);
                if !point_at_end {
                    self.goto_point(entry.n, entry.o);
                }
                index
            }
            UndoDelta::RemoveBlock { size } => {
                let end = self.offset_to_point(self.point_to_offset(at) + size);
                let text = self.text_between(at, end);
                self.push_undo(
                    UndoDelta::InsertBlock {
                        text,
                        point_at_end: true,
                    },
                    at,
                );
                self.delete_chars_raw(size);
                index
            }
            UndoDelta::ReplaceBlock { old_text, new_size } => {
                let end = self.offset_to_point(self.point_to_offset(at) + new_size);
                let current = self.text_between(at, end);
                self.push_undo(
                    UndoDelta::ReplaceBlock {
                        old_text: current,
                        new_size: old_text.chars().count(),
                    },
                    at,
                );
                self.delete_chars_raw(new_size);
                self.insert_text_raw(&old_text);
                self.goto_point(entry.n, entry.o);
                index
            }
            UndoDelta::ReplaceChar { ch } => {
                if let Some(current) = self.current_line().char_at(at.o) {
                    self.push_undo(UndoDelta::ReplaceChar { ch: current }, at);
                    self.overwrite_char_raw(ch);
                }
                self.goto_point(entry.n, entry.o);
                index
            }
            UndoDelta::IntercalateChar { ch } => {
                self.push_undo(UndoDelta::RemoveBlock { size: 1 }, at);
                if ch == '\n' {
                    self.split_line_raw();
                } else {
                    self.insert_char_raw(ch);
                    self.pt.o -= 1;
                }
                index
            }
        };

        if entry.unchanged {
            self.flags.modified = false;
        }
        self.undo.set_suppressed(previous);
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer(text: &str) -> Buffer {
        Buffer::from_text(1, "undo", text)
    }

    #[test]
    fn single_insert_reverts_to_original() {
        let mut buf = buffer("abc");
        buf.goto_point(0, 1);
        buf.insert_char('X').unwrap();
        assert_eq!(buf.text(), "aXbc");
        assert!(buf.is_modified());
        buf.undo(false).unwrap();
        assert_eq!(buf.text(), "abc");
        assert_eq!(buf.pt().o, 1);
        assert!(!buf.is_modified());
    }

    #[test]
    fn undo_twice_in_a_row_continues_backwards() {
        let mut buf = buffer("");
        buf.insert_char('a').unwrap();
        buf.insert_char('b').unwrap();
        buf.undo(false).unwrap();
        buf.undo(true).unwrap();
        assert_eq!(buf.text(), "");
        assert_eq!(buf.undo(true), Err(CommandError::NoFurtherUndo));
    }

    #[test]
    fn undo_after_break_redoes() {
        let mut buf = buffer("");
        buf.insert_char('a').unwrap();
        buf.undo(false).unwrap();
        assert_eq!(buf.text(), "");
        // 別のコマンドを挟むと直前の取り消し自体が取り消される
        buf.undo(false).unwrap();
        assert_eq!(buf.text(), "a");
    }

    #[test]
    fn sequence_is_atomic() {
        let mut buf = buffer("base");
        buf.end_of_line();
        buf.undo_start_sequence();
        buf.insert_char('1').unwrap();
        buf.insert_newline().unwrap();
        buf.insert_string("two").unwrap();
        buf.undo_end_sequence();
        assert_eq!(buf.text(), "base1\ntwo");

        buf.undo(false).unwrap();
        assert_eq!(buf.text(), "base");
        assert_eq!((buf.pt().n, buf.pt().o), (0, 4));
        assert!(!buf.is_modified());

        // 取り消しの取り消しで元に戻る
        buf.undo(false).unwrap();
        assert_eq!(buf.text(), "base1\ntwo");
    }

    #[test]
    fn empty_sequence_is_dropped() {
        let mut buf = buffer("x");
        buf.undo_start_sequence();
        buf.undo_end_sequence();
        assert!(buf.undo_log().is_empty());
    }

    #[test]
    fn disabled_and_readonly_buffers_refuse() {
        let mut buf = buffer("x");
        buf.flags.no_undo = true;
        assert_eq!(buf.undo(false), Err(CommandError::UndoDisabled));
        buf.flags.no_undo = false;
        buf.flags.readonly = true;
        assert!(matches!(buf.undo(false), Err(CommandError::ReadOnly(_))));
    }

    #[test]
    fn no_undo_buffers_record_nothing() {
        let mut buf = buffer("");
        buf.flags.no_undo = true;
        buf.insert_string("abc").unwrap();
        assert!(buf.undo_log().is_empty());
    }
}
