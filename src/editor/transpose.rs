//! 入れ替えコマンド
//!
//! 前後に動く関数の組で「もの」の境界を決め、2 つの範囲を入れ替える。

use crate::buffer::Buffer;
use crate::error::{CommandError, CommandResult};

use super::Editor;

type Mover = fn(&mut Buffer) -> Result<bool, CommandError>;

fn nothing_to_transpose() -> CommandError {
    CommandError::Message("Don't have two things to transpose".to_string())
}

/// 1 回動かして位置を返す。動けなければ入れ替えられない。
fn step(buffer: &mut Buffer, mover: Mover) -> Result<usize, CommandError> {
    if mover(buffer)? {
        Ok(buffer.point_to_offset(buffer.pt()))
    } else {
        Err(nothing_to_transpose())
    }
}

/// (start1, end1, start2, end2) を求める
fn bounds(buffer: &mut Buffer, forward: Mover, backward: Mover) -> Result<(usize, usize, usize, usize), CommandError> {
    let end2 = step(buffer, forward)?;
    let start2 = step(buffer, backward)?;
    let start1 = step(buffer, backward)?;
    let end1 = step(buffer, forward)?;
    Ok((start1, end1, start2, end2))
}

/// ポイントの前後にある 2 つの範囲を入れ替え、ポイントを後ろの範囲の末尾へ置く
fn transpose_subr(buffer: &mut Buffer, forward: Mover, backward: Mover) -> CommandResult {
    buffer.ensure_writable()?;
    let origin = buffer.pt();
    let (start1, end1, start2, end2) = match bounds(buffer, forward, backward) {
        Ok(bounds) => bounds,
        Err(error) => {
            buffer.set_pt(origin);
            return Err(error);
        }
    };
    if end1 > start2 || start1 >= end1 || start2 >= end2 {
        buffer.set_pt(origin);
        return Err(nothing_to_transpose());
    }

    let text1 = buffer.text_between(buffer.offset_to_point(start1), buffer.offset_to_point(end1));
    let text2 = buffer.text_between(buffer.offset_to_point(start2), buffer.offset_to_point(end2));
    // 後ろの範囲から置き換えると前の範囲の位置が変わらない
    buffer.goto_offset(start2);
    buffer.replace_nstring(end2 - start2, &text1)?;
    buffer.goto_offset(start1);
    buffer.replace_nstring(end1 - start1, &text2)?;
    buffer.goto_offset(end2);
    Ok(())
}

impl Editor {
    pub(crate) fn transpose_chars(&mut self) -> CommandResult {
        let buffer = self.buffer_mut();
        if buffer.eolp() && !buffer.bolp() {
            buffer.backward_char();
        }
        transpose_subr(
            buffer,
            |buffer| Ok(buffer.forward_char()),
            |buffer| Ok(buffer.backward_char()),
        )
    }

    pub(crate) fn transpose_words(&mut self) -> CommandResult {
        transpose_subr(
            self.buffer_mut(),
            |buffer| Ok(buffer.forward_word()),
            |buffer| Ok(buffer.backward_word()),
        )
    }

    pub(crate) fn transpose_sexps(&mut self) -> CommandResult {
        transpose_subr(self.buffer_mut(), Buffer::forward_sexp, Buffer::backward_sexp)
    }

    /// 現在の行と前の行を入れ替え、ポイントを次の行の先頭へ置く
    pub(crate) fn transpose_lines(&mut self) -> CommandResult {
        let buffer = self.buffer_mut();
        buffer.ensure_writable()?;
        let n = buffer.pt().n;
        if n == 0 {
            return Err(nothing_to_transpose());
        }
        if n + 1 == buffer.line_count() {
            buffer.end_of_buffer();
            buffer.insert_newline()?;
        }
        let start1 = buffer.point_at(n - 1, 0);
        let end1 = buffer.point_at(n - 1, usize::MAX);
        let start2 = buffer.point_at(n, 0);
        let end2 = buffer.point_at(n, usize::MAX);
        let line1 = buffer.text_between(start1, end1);
        let line2 = buffer.text_between(start2, end2);
        buffer.set_pt(start2);
        buffer.replace_nstring(line2.chars().count(), &line1)?;
        let start1 = buffer.point_at(n - 1, 0);
        buffer.set_pt(start1);
        buffer.replace_nstring(line1.chars().count(), &line2)?;
        buffer.goto_point(n + 1, 0);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::editor::test_support::editor_with_text;

    #[test]
    fn transpose_chars_swaps_around_point() {
        let mut editor = editor_with_text("abc");
        editor.feed_sequence("C-f C-t").unwrap();
        editor.run_pending();
        assert_eq!(editor.buffer().text(), "bac");
        assert_eq!(editor.buffer().pt().o, 2);
    }

    #[test]
    fn transpose_chars_at_end_of_line_swaps_previous_two() {
        let mut editor = editor_with_text("abc");
        editor.feed_sequence("C-e C-t").unwrap();
        editor.run_pending();
        assert_eq!(editor.buffer().text(), "acb");
    }

    #[test]
    fn transpose_words_across_punctuation() {
        let mut editor = editor_with_text("foo, bar");
        editor.feed_sequence("M-f M-t").unwrap();
        editor.run_pending();
        assert_eq!(editor.buffer().text(), "bar, foo");
        assert_eq!(editor.buffer().pt().o, 8);
    }

    #[test]
    fn transpose_lines_on_last_line_adds_newline() {
        let mut editor = editor_with_text("one\ntwo");
        editor.feed_sequence("C-n C-x C-t").unwrap();
        editor.run_pending();
        assert_eq!(editor.buffer().text(), "two\none\n");
        assert_eq!(editor.buffer().pt().n, 2);
    }

    #[test]
    fn transpose_at_beginning_fails() {
        let mut editor = editor_with_text("abc");
        editor.feed_sequence("C-t").unwrap();
        editor.run_pending();
        assert_eq!(editor.echo_text(), Some("Don't have two things to transpose"));
        assert_eq!(editor.buffer().text(), "abc");
    }
}
