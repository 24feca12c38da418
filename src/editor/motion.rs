//! 移動コマンド

use crate::error::{CommandError, CommandResult};

use super::Editor;

impl Editor {
    pub(crate) fn forward_char(&mut self, count: i32) -> CommandResult {
        let buffer = self.buffer_mut();
        for _ in 0..count.unsigned_abs() {
            if count > 0 {
                if !buffer.forward_char() {
                    return Err(CommandError::EndOfBuffer);
                }
            } else if !buffer.backward_char() {
                return Err(CommandError::BeginningOfBuffer);
            }
        }
        Ok(())
    }

    /// 目標桁を保って縦に移動する。直前も縦移動なら目標桁を引き継ぐ。
    pub(crate) fn next_line(&mut self, count: i32) -> CommandResult {
        let tab_width = self.tab_width();
        let continuing = self.last_flags.vertical;
        let buffer = self.buffer_mut();
        if !continuing {
            buffer.goal_column = buffer.current_column(tab_width);
        }
        let goal = buffer.goal_column;
        for _ in 0..count.unsigned_abs() {
            if count > 0 {
                if !buffer.move_line_down(goal, tab_width) {
                    return Err(CommandError::EndOfBuffer);
                }
            } else if !buffer.move_line_up(goal, tab_width) {
                return Err(CommandError::BeginningOfBuffer);
            }
        }
        Ok(())
    }

    pub(crate) fn beginning_of_line(&mut self) -> CommandResult {
        self.buffer_mut().beginning_of_line();
        Ok(())
    }

    pub(crate) fn end_of_line(&mut self) -> CommandResult {
        self.buffer_mut().end_of_line();
        Ok(())
    }

    pub(crate) fn forward_word(&mut self, count: i32) -> CommandResult {
        let buffer = self.buffer_mut();
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
        Ok(())
    }

    pub(crate) fn beginning_of_buffer(&mut self) -> CommandResult {
        let buffer = self.buffer_mut();
        let pt = buffer.pt();
        buffer.set_mark(pt);
        buffer.beginning_of_buffer();
        self.message("Mark set");
        Ok(())
    }

    pub(crate) fn end_of_buffer(&mut self) -> CommandResult {
        let buffer = self.buffer_mut();
        let pt = buffer.pt();
        buffer.set_mark(pt);
        buffer.end_of_buffer();
        self.message("Mark set");
        Ok(())
    }

    /// 1 画面分の移動量（2 行を重ねて残す）
    fn scroll_amount(&self) -> usize {
        self.windows[self.current_window]
            .text_height()
            .saturating_sub(2)
            .max(1)
    }

    pub(crate) fn scroll_up(&mut self) -> CommandResult {
        let amount = self.scroll_amount();
        let tab_width = self.tab_width();
        let window = &self.windows[self.current_window];
        let (top, height) = (window.top, window.text_height());
        let line_count = self.buffer().line_count();
        if top + height >= line_count {
            return Err(CommandError::EndOfBuffer);
        }
        self.windows[self.current_window].top = top + amount;
        let continuing = self.last_flags.vertical;
        let buffer = self.buffer_mut();
        if !continuing {
            buffer.goal_column = buffer.current_column(tab_width);
        }
        let goal = buffer.goal_column;
        for _ in 0..amount {
            if !buffer.move_line_down(goal, tab_width) {
                break;
            }
        }
        Ok(())
    }

    pub(crate) fn scroll_down(&mut self) -> CommandResult {
        let amount = self.scroll_amount();
        let tab_width = self.tab_width();
        let top = self.windows[self.current_window].top;
        if top == 0 {
            return Err(CommandError::BeginningOfBuffer);
        }
        self.windows[self.current_window].top = top.saturating_sub(amount);
        let continuing = self.last_flags.vertical;
        let buffer = self.buffer_mut();
        if !continuing {
            buffer.goal_column = buffer.current_column(tab_width);
        }
        let goal = buffer.goal_column;
        for _ in 0..amount {
            if !buffer.move_line_up(goal, tab_width) {
                break;
            }
        }
        Ok(())
    }

    /// 1 始まりの行番号へ移動する
    pub(crate) fn goto_line(&mut self, uniarg: Option<i32>) -> CommandResult {
        let line = match uniarg {
            Some(line) => i64::from(line),
            None => self.read_number("Goto line: ")?,
        };
        let buffer = self.buffer_mut();
        let last = buffer.line_count() - 1;
        let n = usize::try_from(line - 1).unwrap_or(0).min(last);
        let pt = buffer.pt();
        buffer.set_mark(pt);
        buffer.goto_point(n, 0);
        Ok(())
    }

    /// 1 始まりの文字位置へ移動する
    pub(crate) fn goto_char(&mut self, uniarg: Option<i32>) -> CommandResult {
        let position = match uniarg {
            Some(position) => i64::from(position),
            None => self.read_number("Goto char: ")?,
        };
        let buffer = self.buffer_mut();
        let offset = usize::try_from(position - 1).unwrap_or(0).min(buffer.len_chars());
        buffer.goto_offset(offset);
        Ok(())
    }

    pub(crate) fn forward_paragraph(&mut self, count: i32) -> CommandResult {
        let buffer = self.buffer_mut();
        for _ in 0..count.unsigned_abs() {
            let moved = if count > 0 {
                buffer.forward_paragraph()
            } else {
                buffer.backward_paragraph()
            };
            if !moved {
                break;
            }
        }
        Ok(())
    }

    pub(crate) fn forward_sexp(&mut self, count: i32) -> CommandResult {
        let buffer = self.buffer_mut();
        for _ in 0..count.unsigned_abs() {
            let moved = if count > 0 {
                buffer.forward_sexp()?
            } else {
                buffer.backward_sexp()?
            };
            if !moved {
                break;
            }
        }
        Ok(())
    }

    pub(crate) fn back_to_indentation(&mut self) -> CommandResult {
        let buffer = self.buffer_mut();
        buffer.beginning_of_line();
        while matches!(buffer.following_char(), Some(' ' | '\t')) {
            buffer.forward_char();
        }
        Ok(())
    }

    /// ポイントの行をウィンドウの中央に置く
    pub(crate) fn recenter(&mut self) -> CommandResult {
        let n = self.buffer().pt().n;
        let window = &mut self.windows[self.current_window];
        window.top = n.saturating_sub(window.text_height() / 2);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::editor::test_support::editor_with_text;

    #[test]
    fn vertical_motion_keeps_goal_column() {
        let mut editor = editor_with_text("abcdef\nab\nabcdef");
        editor.feed_sequence("C-e C-b C-b C-n C-n").unwrap();
        editor.run_pending();
        let pt = editor.buffer().pt();
        assert_eq!((pt.n, pt.o), (2, 4));
    }

    #[test]
    fn next_line_at_last_line_fails() {
        let mut editor = editor_with_text("one");
        editor.feed_sequence("C-n").unwrap();
        editor.run_pending();
        assert_eq!(editor.echo_text(), Some("End of buffer"));
    }

    #[test]
    fn goto_line_with_argument() {
        let mut editor = editor_with_text("a\nb\nc\nd");
        editor.feed_sequence("C-u 3 M-g g").unwrap();
        editor.run_pending();
        assert_eq!(editor.buffer().pt().n, 2);
        assert_eq!(editor.buffer().mark().map(|pt| pt.n), Some(0));
    }

    #[test]
    fn end_of_buffer_sets_mark() {
        let mut editor = editor_with_text("a\nbc");
        editor.feed_sequence("M->").unwrap();
        editor.run_pending();
        let pt = editor.buffer().pt();
        assert_eq!((pt.n, pt.o), (1, 2));
        assert_eq!(editor.echo_text(), Some("Mark set"));
    }

    #[test]
    fn back_to_indentation_skips_blanks() {
        let mut editor = editor_with_text("  \tfoo");
        editor.feed_sequence("C-e M-m").unwrap();
        editor.run_pending();
        assert_eq!(editor.buffer().pt().o, 3);
    }
}
