//! 編集プリミティブ
//!
//! 文字・改行・文字列の挿入と削除。すべての変更はここを通り、
//! マーカーの追従とアンドゥ記録を行う。`*_raw` は記録を行わない下位操作。

use super::{Buffer, DynString, Point, UndoDelta};
use crate::error::CommandError;

impl Buffer {
    // ---- 記録なしの下位操作 ----

    pub(crate) fn insert_char_raw(&mut self, ch: char) {
        let pt = self.pt;
        self.lines[pt.line].insert_char(pt.o as isize, ch);
        self.markers.adjust_char(pt.line, pt.o + 1, 1);
        self.pt.o += 1;
        self.flags.modified = true;
    }

    /// ポイント位置で行を分割する。ポイントは動かない。
    pub(crate) fn split_line_raw(&mut self) {
        let pt = self.pt;
        let tail = self.lines[pt.line].split_off(pt.o as isize);
        let new_line = match self.lines.insert_after(pt.line, tail) {
            Some(id) => id,
            None => return,
        };
        self.markers.adjust_split(pt.line, pt.n, pt.o, new_line);
        self.flags.modified = true;
    }

    /// ポイント直後の 1 文字を削除する。行末では次の行を連結する。
    pub(crate) fn delete_char_raw(&mut self) -> Option<char> {
        let pt = self.pt;
        if pt.o < self.lines[pt.line].len() {
            let ch = self.lines[pt.line].char_at(pt.o);
            self.lines[pt.line].remove(pt.o as isize, 1);
            self.markers.adjust_char(pt.line, pt.o + 1, -1);
            self.flags.modified = true;
            return ch;
        }
        let next = self.lines.next(pt.line)?;
        let removed: DynString = self.lines.remove(next)?;
        let line = &mut self.lines[pt.line];
        let len = line.len();
        line.append_dyn(&removed);
        self.markers.adjust_join(pt.line, pt.n, next, len);
        self.flags.modified = true;
        Some('\n')
    }

    pub(crate) fn overwrite_char_raw(&mut self, ch: char) {
        let pt = self.pt;
        self.lines[pt.line].set_char(pt.o, ch);
        self.pt.o += 1;
        self.flags.modified = true;
    }

    pub(crate) fn insert_text_raw(&mut self, text: &str) {
        for ch in text.chars() {
            if ch == '\n' {
                self.split_line_raw();
                self.forward_char();
            } else {
                self.insert_char_raw(ch);
            }
        }
    }

    pub(crate) fn delete_chars_raw(&mut self, count: usize) {
        for _ in 0..count {
            if self.delete_char_raw().is_none() {
                break;
            }
        }
    }

    // ---- 記録付きの編集操作 ----

    /// ポイント位置に 1 文字挿入してポイントを進める
    pub fn insert_char(&mut self, ch: char) -> Result<(), CommandError> {
        if ch == '\n' {
            return self.insert_newline();
        }
        self.ensure_writable()?;
        let pt = self.pt;
        self.record_undo(UndoDelta::RemoveBlock { size: 1 }, pt);
        self.insert_char_raw(ch);
        Ok(())
    }

    /// ポイントを動かさずに 1 文字挿入する
    pub fn intercalate_char(&mut self, ch: char) -> Result<(), CommandError> {
        if ch == '\n' {
            return self.intercalate_newline();
        }
        self.ensure_writable()?;
        let pt = self.pt;
        self.record_undo(UndoDelta::RemoveBlock { size: 1 }, pt);
        self.insert_char_raw(ch);
        self.pt = pt;
        Ok(())
    }

    /// ポイント直後の文字を置き換える（行末では挿入）
    pub fn replace_char(&mut self, ch: char) -> Result<(), CommandError> {
        let current = match self.current_line().char_at(self.pt.o) {
            Some(current) => current,
            None => return self.insert_char(ch),
        };
        self.ensure_writable()?;
        let pt = self.pt;
        self.record_undo(UndoDelta::ReplaceChar { ch: current }, pt);
        self.overwrite_char_raw(ch);
        Ok(())
    }

    /// 改行を挿入して次の行の先頭へ移動する
    pub fn insert_newline(&mut self) -> Result<(), CommandError> {
        self.intercalate_newline()?;
        self.forward_char();
        Ok(())
    }

    /// 改行を挿入する。ポイントは現在行の末尾に残る。
    pub fn intercalate_newline(&mut self) -> Result<(), CommandError> {
        self.ensure_writable()?;
        let pt = self.pt;
        self.record_undo(UndoDelta::RemoveBlock { size: 1 }, pt);
        self.split_line_raw();
        Ok(())
    }

    /// ポイント直後の 1 文字を削除する
    pub fn delete_char(&mut self) -> Result<char, CommandError> {
        if self.eobp() {
            return Err(CommandError::EndOfBuffer);
        }
        self.ensure_writable()?;
        let pt = self.pt;
        let ch = self.following_char().ok_or(CommandError::EndOfBuffer)?;
        self.record_undo(UndoDelta::IntercalateChar { ch }, pt);
        self.delete_char_raw();
        Ok(ch)
    }

    /// ポイント直前の 1 文字を削除する
    pub fn backward_delete_char(&mut self) -> Result<char, CommandError> {
        if self.bobp() {
            return Err(CommandError::BeginningOfBuffer);
        }
        self.ensure_writable()?;
        self.backward_char();
        let pt = self.pt;
        let ch = self.following_char().ok_or(CommandError::EndOfBuffer)?;
        self.record_undo(
            UndoDelta::InsertBlock {
                text: ch.to_string(),
                point_at_end: true,
            },
            pt,
        );
        self.delete_char_raw();
        Ok(ch)
    }

    /// 文字列を挿入する（改行を含んでよい）
    pub fn insert_string(&mut self, text: &str) -> Result<(), CommandError> {
        if text.is_empty() {
            return Ok(());
        }
        self.ensure_writable()?;
        let pt = self.pt;
        self.record_undo(
            UndoDelta::RemoveBlock {
                size: text.chars().count(),
            },
            pt,
        );
        self.insert_text_raw(text);
        Ok(())
    }

    /// ポイントから `size` 文字を削除して削除したテキストを返す
    pub fn delete_nstring(&mut self, size: usize) -> Result<String, CommandError> {
        self.ensure_writable()?;
        let pt = self.pt;
        let end = self.offset_to_point(self.point_to_offset(pt) + size);
        let text = self.text_between(pt, end);
        if text.is_empty() {
            return Ok(text);
        }
        let count = text.chars().count();
        self.record_undo(
            UndoDelta::InsertBlock {
                text: text.clone(),
                point_at_end: false,
            },
            pt,
        );
        self.delete_chars_raw(count);
        Ok(text)
    }

    /// `start` から `end` までを削除する。ポイントは `start` へ移る。
    pub fn delete_between(&mut self, start: Point, end: Point) -> Result<String, CommandError> {
        let (start, end) = if start.position_cmp(&end).is_le() {
            (start, end)
        } else {
            (end, start)
        };
        let size = self.point_dist(start, end);
        self.pt = start;
        self.delete_nstring(size)
    }

    /// ポイントから `size` 文字を `text` で置き換える。ポイントは置換後の末尾。
    pub fn replace_nstring(&mut self, size: usize, text: &str) -> Result<String, CommandError> {
        self.ensure_writable()?;
        let pt = self.pt;
        let end = self.offset_to_point(self.point_to_offset(pt) + size);
        let old_text = self.text_between(pt, end);
        let count = old_text.chars().count();
        self.record_undo(
            UndoDelta::ReplaceBlock {
                old_text: old_text.clone(),
                new_size: text.chars().count(),
            },
            pt,
        );
        self.delete_chars_raw(count);
        self.insert_text_raw(text);
        Ok(old_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer(text: &str) -> Buffer {
        Buffer::from_text(1, "edit", text)
    }

    #[test]
    fn insert_and_delete_chars() {
        let mut buf = buffer("ac");
        buf.goto_point(0, 1);
        buf.insert_char('b').unwrap();
        assert_eq!(buf.text(), "abc");
        assert_eq!(buf.pt().o, 2);
        assert_eq!(buf.delete_char().unwrap(), 'c');
        assert_eq!(buf.delete_char(), Err(CommandError::EndOfBuffer));
        assert_eq!(buf.backward_delete_char().unwrap(), 'b');
        assert_eq!(buf.text(), "a");
    }

    #[test]
    fn newline_split_and_join() {
        let mut buf = buffer("helloworld");
        buf.goto_point(0, 5);
        buf.insert_newline().unwrap();
        assert_eq!(buf.text(), "hello\nworld");
        assert_eq!((buf.pt().n, buf.pt().o), (1, 0));
        assert_eq!(buf.backward_delete_char().unwrap(), '\n');
        assert_eq!(buf.text(), "helloworld");
        assert_eq!(buf.pt().o, 5);
    }

    #[test]
    fn intercalate_keeps_point() {
        let mut buf = buffer("ab");
        buf.goto_point(0, 1);
        buf.intercalate_newline().unwrap();
        assert_eq!(buf.text(), "a\nb");
        assert_eq!((buf.pt().n, buf.pt().o), (0, 1));
        buf.intercalate_char('x').unwrap();
        assert_eq!(buf.text(), "ax\nb");
        assert_eq!(buf.pt().o, 1);
    }

    #[test]
    fn markers_follow_split_and_join() {
        let mut buf = buffer("abcdef\nxyz");
        let tail = buf.create_marker(buf.point_at(0, 4));
        let below = buf.create_marker(buf.point_at(1, 2));
        buf.goto_point(0, 2);
        buf.insert_newline().unwrap();
        assert_eq!(buf.marker_point(tail).map(|p| (p.n, p.o)), Some((1, 2)));
        assert_eq!(buf.marker_point(below).map(|p| (p.n, p.o)), Some((2, 2)));

        buf.backward_delete_char().unwrap();
        assert_eq!(buf.marker_point(tail).map(|p| (p.n, p.o)), Some((0, 4)));
        assert_eq!(buf.marker_point(below).map(|p| (p.n, p.o)), Some((1, 2)));
        assert!(buf.check_consistency().is_ok());
    }

    #[test]
    fn delete_nstring_spans_lines() {
        let mut buf = buffer("one\ntwo\nthree");
        buf.goto_point(0, 2);
        let removed = buf.delete_nstring(7).unwrap();
        assert_eq!(removed, "e\ntwo\nt");
        assert_eq!(buf.text(), "onhree");
        buf.undo(false).unwrap();
        assert_eq!(buf.text(), "one\ntwo\nthree");
        assert_eq!((buf.pt().n, buf.pt().o), (0, 2));
    }

    #[test]
    fn replace_nstring_and_undo() {
        let mut buf = buffer("abc def");
        buf.goto_point(0, 4);
        let old = buf.replace_nstring(3, "XYZW").unwrap();
        assert_eq!(old, "def");
        assert_eq!(buf.text(), "abc XYZW");
        assert_eq!(buf.pt().o, 8);
        buf.undo(false).unwrap();
        assert_eq!(buf.text(), "abc def");
        assert_eq!(buf.pt().o, 4);
    }

    #[test]
    fn readonly_blocks_edits() {
        let mut buf = buffer("x");
        buf.flags.readonly = true;
        assert!(matches!(buf.insert_char('a'), Err(CommandError::ReadOnly(_))));
        assert!(matches!(buf.delete_char(), Err(CommandError::ReadOnly(_))));
        assert_eq!(buf.text(), "x");
    }

    #[test]
    fn replace_char_overwrites_and_reverts() {
        let mut buf = buffer("abc");
        buf.replace_char('X').unwrap();
        assert_eq!(buf.text(), "Xbc");
        assert_eq!(buf.pt().o, 1);
        buf.undo(false).unwrap();
        assert_eq!(buf.text(), "abc");
        assert_eq!(buf.pt().o, 0);
    }

    #[test]
    fn delete_char_reverts_in_place() {
        let mut buf = buffer("ab\ncd");
        buf.goto_point(0, 2);
        buf.delete_char().unwrap();
        assert_eq!(buf.text(), "abcd");
        buf.undo(false).unwrap();
        assert_eq!(buf.text(), "ab\ncd");
        assert_eq!((buf.pt().n, buf.pt().o), (0, 2));
    }
}
