//! キルとヤンク、マーク操作
//!
//! 連続したキルはキルバッファで 1 つにまとまる。直前のコマンドが
//! キルでなければ新しいキルの前にキルバッファを空にする。

use crate::buffer::Point;
use crate::error::{CommandError, CommandResult};

use super::Editor;

impl Editor {
    fn kill_prepare(&mut self) {
        if !self.last_flags.kill {
            self.kill_buffer.clear();
        }
        self.this_flags.kill = true;
    }

    fn store_kill(&mut self, text: &str, backward: bool) {
        if backward {
            self.kill_buffer.prepend(text);
        } else {
            self.kill_buffer.append(text);
        }
    }

    /// 範囲を削除してキルバッファへ入れる。読み取り専用ならコピーだけ行う。
    fn kill_between(&mut self, a: Point, b: Point, backward: bool) -> CommandResult {
        self.kill_prepare();
        let buffer = self.buffer_mut();
        if buffer.flags.readonly {
            let text = buffer.text_between(a, b);
            let name = buffer.name().to_string();
            self.store_kill(&text, backward);
            return Err(CommandError::ReadOnly(name));
        }
        let text = buffer.delete_between(a, b)?;
        self.store_kill(&text, backward);
        Ok(())
    }

    pub(crate) fn kill_line(&mut self, uniarg: Option<i32>) -> CommandResult {
        let kill_whole_line = self.var_enabled("kill-whole-line");
        let buffer = self.buffer();
        let pt = buffer.pt();
        let last = buffer.line_count() - 1;
        match uniarg {
            None => {
                if buffer.eobp() {
                    return Err(CommandError::EndOfBuffer);
                }
                let rest = &buffer.current_line().as_chars()[pt.o..];
                let through_newline = rest.iter().all(|ch| ch.is_whitespace())
                    || (kill_whole_line && buffer.bolp());
                let end = if through_newline && pt.n < last {
                    buffer.point_at(pt.n + 1, 0)
                } else {
                    buffer.point_at(pt.n, usize::MAX)
                };
                self.kill_between(pt, end, false)
            }
            Some(count) if count > 0 => {
                let target = pt.n + count as usize;
                let end = if target <= last {
                    buffer.point_at(target, 0)
                } else {
                    buffer.point_at(last, usize::MAX)
                };
                if end == pt {
                    return Err(CommandError::EndOfBuffer);
                }
                self.kill_between(pt, end, false)
            }
            Some(count) => {
                let target = pt.n.saturating_sub(count.unsigned_abs() as usize);
                let start = buffer.point_at(target, 0);
                self.kill_between(start, pt, true)
            }
        }
    }

    pub(crate) fn kill_region(&mut self) -> CommandResult {
        let buffer = self.buffer();
        let region = buffer.region()?;
        let backward = buffer.pt() == region.end && region.start != region.end;
        self.kill_between(region.start, region.end, backward)
    }

    pub(crate) fn copy_region_as_kill(&mut self) -> CommandResult {
        let buffer = self.buffer();
        let region = buffer.region()?;
        let text = buffer.text_between(region.start, region.end);
        self.kill_prepare();
        self.store_kill(&text, false);
        Ok(())
    }

    pub(crate) fn kill_word(&mut self, count: i32) -> CommandResult {
        let buffer = self.buffer_mut();
        let start = buffer.pt();
        for _ in 0..count.unsigned_abs() {
            let moved = if count > 0 {
                buffer.forward_word()
            } else {
                buffer.backward_word()
            };
            if !moved {
                break;
            }
        }
        let end = buffer.pt();
        self.kill_between(start, end, count < 0)
    }

    pub(crate) fn kill_sexp(&mut self, count: i32) -> CommandResult {
        let buffer = self.buffer_mut();
        let start = buffer.pt();
        for _ in 0..count.unsigned_abs() {
            let moved = if count > 0 {
                buffer.forward_sexp()
            } else {
                buffer.backward_sexp()
            };
            match moved {
                Ok(true) => {}
                Ok(false) => break,
                Err(error) => {
                    buffer.set_pt(start);
                    return Err(error);
                }
            }
        }
        let end = buffer.pt();
        self.kill_between(start, end, count < 0)
    }

    /// キルバッファの内容を挿入し、挿入前の位置にマークを置く
    pub(crate) fn yank(&mut self) -> CommandResult {
        if self.kill_buffer.is_empty() {
            return Err(CommandError::Message("Kill ring is empty".to_string()));
        }
        let text = self.kill_buffer.text().to_string();
        let buffer = self.buffer_mut();
        buffer.ensure_writable()?;
        let pt = buffer.pt();
        buffer.set_mark(pt);
        buffer.insert_string(&text)
    }

    // ---- マーク ----

    pub(crate) fn set_mark_command(&mut self, uniarg: Option<i32>) -> CommandResult {
        let buffer = self.buffer_mut();
        if uniarg.is_some() {
            let mark = buffer.mark().ok_or(CommandError::NoMark)?;
            buffer.set_pt(mark);
            buffer.pop_mark();
            return Ok(());
        }
        let pt = buffer.pt();
        buffer.set_mark(pt);
        self.message("Mark set");
        Ok(())
    }

    pub(crate) fn exchange_point_and_mark(&mut self) -> CommandResult {
        self.buffer_mut().exchange_point_and_mark()
    }

    pub(crate) fn mark_whole_buffer(&mut self) -> CommandResult {
        let buffer = self.buffer_mut();
        buffer.end_of_buffer();
        let end = buffer.pt();
        buffer.set_mark(end);
        buffer.beginning_of_buffer();
        self.message("Mark set");
        Ok(())
    }

    pub(crate) fn mark_word(&mut self, count: i32) -> CommandResult {
        let buffer = self.buffer_mut();
        let origin = buffer.pt();
        for _ in 0..count.unsigned_abs() {
            let moved = if count > 0 {
                buffer.forward_word()
            } else {
                buffer.backward_word()
            };
            if !moved {
                break;
            }
        }
        let mark = buffer.pt();
        buffer.set_mark(mark);
        buffer.set_pt(origin);
        Ok(())
    }

    pub(crate) fn mark_paragraph(&mut self) -> CommandResult {
        let buffer = self.buffer_mut();
        buffer.forward_paragraph();
        let end = buffer.pt();
        buffer.set_mark(end);
        buffer.backward_paragraph();
        Ok(())
    }

    pub(crate) fn mark_sexp(&mut self, count: i32) -> CommandResult {
        let buffer = self.buffer_mut();
        let origin = buffer.pt();
        for _ in 0..count.unsigned_abs() {
            let moved = if count > 0 {
                buffer.forward_sexp()
            } else {
                buffer.backward_sexp()
            };
            match moved {
                Ok(true) => {}
                Ok(false) => break,
                Err(error) => {
                    buffer.set_pt(origin);
                    return Err(error);
                }
            }
        }
        let mark = buffer.pt();
        buffer.set_mark(mark);
        buffer.set_pt(origin);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::editor::test_support::editor_with_text;

    #[test]
    fn consecutive_kill_lines_accumulate() {
        let mut editor = editor_with_text("hello\nworld\n");
        editor.feed_sequence("C-k C-k").unwrap();
        editor.run_pending();
        assert_eq!(editor.buffer().text(), "world\n");
        assert_eq!(editor.kill_buffer_text(), "hello\n");
    }

    #[test]
    fn interrupted_kill_starts_fresh() {
        let mut editor = editor_with_text("ab cd");
        editor.feed_sequence("M-d C-f M-d").unwrap();
        editor.run_pending();
        assert_eq!(editor.kill_buffer_text(), "cd");
    }

    #[test]
    fn backward_kill_word_prepends() {
        let mut editor = editor_with_text("one two");
        editor.feed_sequence("C-e M-DEL M-DEL").unwrap();
        editor.run_pending();
        assert_eq!(editor.buffer().text(), "");
        assert_eq!(editor.kill_buffer_text(), "one two");
    }

    #[test]
    fn yank_sets_mark_before_text() {
        let mut editor = editor_with_text("abc");
        editor.feed_sequence("C-k C-y C-y").unwrap();
        editor.run_pending();
        assert_eq!(editor.buffer().text(), "abcabc");
        assert_eq!(editor.buffer().mark().map(|pt| pt.o), Some(3));
    }

    #[test]
    fn yank_with_empty_kill_buffer_fails() {
        let mut editor = editor_with_text("");
        editor.feed_sequence("C-y").unwrap();
        editor.run_pending();
        assert_eq!(editor.echo_text(), Some("Kill ring is empty"));
    }

    #[test]
    fn kill_line_with_zero_argument_kills_to_line_start() {
        let mut editor = editor_with_text("abc def");
        editor.feed_sequence("C-e C-u 0 C-k").unwrap();
        editor.run_pending();
        assert_eq!(editor.buffer().text(), "");
        assert_eq!(editor.kill_buffer_text(), "abc def");
    }

    #[test]
    fn kill_region_in_read_only_buffer_copies() {
        let mut editor = editor_with_text("abc");
        editor.buffer_mut().flags.readonly = true;
        editor.feed_sequence("C-SPC C-e C-w").unwrap();
        editor.run_pending();
        assert_eq!(editor.buffer().text(), "abc");
        assert_eq!(editor.kill_buffer_text(), "abc");
    }
}
