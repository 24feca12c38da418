//! 挿入・削除・インデント・大文字小文字・詰め込み

use crate::buffer::motion::is_word_char;
use crate::buffer::point::advance_column;
use crate::error::{CommandError, CommandResult};

use super::dispatch::CaseChange;
use super::Editor;

fn is_blank(ch: char) -> bool {
    ch == ' ' || ch == '\t'
}

impl Editor {
    pub(crate) fn self_insert(&mut self, count: i32) -> CommandResult {
        let ch = self
            .last_key
            .and_then(|key| key.as_char())
            .ok_or_else(|| CommandError::InvalidArgument("self-insert-command".to_string()))?;
        for _ in 0..count.max(0) {
            self.insert_typed_char(ch)?;
        }
        Ok(())
    }

    /// 上書きモードと自動詰め込みを考慮して 1 文字入力する
    fn insert_typed_char(&mut self, ch: char) -> CommandResult {
        if ch == ' ' && self.needs_auto_fill() {
            self.auto_fill()?;
        }
        let tab_width = self.tab_width();
        let buffer = self.buffer_mut();
        let overwrite = buffer.flags.overwrite
            && !buffer.eolp()
            && match buffer.following_char() {
                // タブは表示桁の最後の位置でだけ置き換える
                Some('\t') => buffer.current_column(tab_width) % tab_width == tab_width - 1,
                _ => true,
            };
        if overwrite {
            buffer.replace_char(ch)
        } else {
            buffer.insert_char(ch)
        }
    }

    fn needs_auto_fill(&self) -> bool {
        let buffer = self.buffer();
        buffer.flags.autofill && buffer.current_column(self.tab_width()) > self.fill_column()
    }

    /// 詰め込み桁を超えた行をポイントより前の空白で折り返す
    fn auto_fill(&mut self) -> CommandResult {
        let fill_column = self.fill_column();
        let tab_width = self.tab_width();
        let buffer = self.buffer_mut();
        let line: Vec<char> = buffer.current_line().as_chars().to_vec();
        let pt = buffer.pt();
        let indent = line.iter().take_while(|ch| is_blank(**ch)).count();

        let mut column = 0;
        let mut break_at = None;
        for (i, &ch) in line.iter().enumerate().take(pt.o) {
            if is_blank(ch) && i > indent && (column <= fill_column || break_at.is_none()) {
                break_at = Some(i);
            }
            column = advance_column(column, ch, tab_width);
        }
        let Some(mut start) = break_at else {
            return Ok(());
        };
        while start > indent && is_blank(line[start - 1]) {
            start -= 1;
        }
        let mut end = start;
        while end < line.len() && is_blank(line[end]) {
            end += 1;
        }
        if end >= pt.o {
            return Ok(());
        }

        let marker = buffer.create_marker(pt);
        buffer.goto_point(pt.n, start);
        buffer.delete_nstring(end - start)?;
        buffer.insert_newline()?;
        if let Some(restored) = buffer.free_marker(marker) {
            buffer.set_pt(restored);
        }
        Ok(())
    }

    pub(crate) fn newline(&mut self, count: i32) -> CommandResult {
        for _ in 0..count.max(0) {
            if self.needs_auto_fill() {
                self.auto_fill()?;
            }
            self.buffer_mut().insert_newline()?;
        }
        Ok(())
    }

    pub(crate) fn open_line(&mut self, count: i32) -> CommandResult {
        let buffer = self.buffer_mut();
        let pt = buffer.pt();
        for _ in 0..count.max(0) {
            buffer.intercalate_newline()?;
            buffer.set_pt(pt);
        }
        Ok(())
    }

    /// 改行し、元の行と同じインデントを入れる
    pub(crate) fn newline_and_indent(&mut self) -> CommandResult {
        let buffer = self.buffer_mut();
        let indent: String = buffer
            .current_line()
            .as_chars()
            .iter()
            .take_while(|ch| is_blank(**ch))
            .collect();
        let mut trailing = 0;
        while matches!(buffer.preceding_char(), Some(ch) if is_blank(ch)) {
            buffer.backward_char();
            trailing += 1;
        }
        buffer.delete_nstring(trailing)?;
        buffer.insert_newline()?;
        buffer.insert_string(&indent)?;
        Ok(())
    }

    pub(crate) fn delete_char(&mut self, count: i32) -> CommandResult {
        let buffer = self.buffer_mut();
        for _ in 0..count.unsigned_abs() {
            if count > 0 {
                buffer.delete_char()?;
            } else {
                buffer.backward_delete_char()?;
            }
        }
        Ok(())
    }

    /// ポイント前後の空白を削除し、削除した数を返す
    fn delete_blanks_around_point(&mut self) -> Result<usize, CommandError> {
        let buffer = self.buffer_mut();
        while matches!(buffer.preceding_char(), Some(ch) if is_blank(ch)) {
            buffer.backward_char();
        }
        let line = buffer.current_line().as_chars();
        let o = buffer.pt().o;
        let count = line[o..].iter().take_while(|ch| is_blank(**ch)).count();
        buffer.delete_nstring(count)?;
        Ok(count)
    }

    pub(crate) fn delete_horizontal_space(&mut self) -> CommandResult {
        self.delete_blanks_around_point().map(|_| ())
    }

    pub(crate) fn just_one_space(&mut self) -> CommandResult {
        self.delete_blanks_around_point()?;
        self.buffer_mut().insert_char(' ')
    }

    /// 空行上なら周囲の空行を 1 行に、孤立した空行なら削除し、
    /// 空でない行なら後続の空行を削除する
    pub(crate) fn delete_blank_lines(&mut self) -> CommandResult {
        let buffer = self.buffer_mut();
        let pt = buffer.pt();
        let n = pt.n;
        let count = buffer.line_count();
        let mut last = n;
        while last + 1 < count && buffer.is_blank_line(last + 1) {
            last += 1;
        }

        if !buffer.is_blank_line(n) {
            if last > n {
                let marker = buffer.create_marker(pt);
                let start = buffer.point_at(n, usize::MAX);
                let end = buffer.point_at(last, usize::MAX);
                buffer.delete_between(start, end)?;
                if let Some(restored) = buffer.free_marker(marker) {
                    buffer.set_pt(restored);
                }
            }
            return Ok(());
        }

        let mut first = n;
        while first > 0 && buffer.is_blank_line(first - 1) {
            first -= 1;
        }
        if first == last {
            let (start, end) = if n + 1 < count {
                (buffer.point_at(n, 0), buffer.point_at(n + 1, 0))
            } else if n > 0 {
                (buffer.point_at(n - 1, usize::MAX), buffer.point_at(n, usize::MAX))
            } else {
                (buffer.point_at(n, 0), buffer.point_at(n, usize::MAX))
            };
            buffer.delete_between(start, end)?;
        } else {
            let start = buffer.point_at(first, 0);
            let end = buffer.point_at(last, usize::MAX);
            buffer.delete_between(start, end)?;
        }
        Ok(())
    }

    /// ポイント前の空白を消して `column` 桁まで空白を入れる
    fn indent_to(&mut self, column: usize) -> CommandResult {
        let tab_width = self.tab_width();
        let use_tabs = self.var_enabled("indent-tabs-mode");
        let buffer = self.buffer_mut();
        let mut trailing = 0;
        while matches!(buffer.preceding_char(), Some(ch) if is_blank(ch)) {
            buffer.backward_char();
            trailing += 1;
        }
        buffer.delete_nstring(trailing)?;
        let mut current = buffer.current_column(tab_width);
        let mut fill = String::new();
        if use_tabs {
            loop {
                let next = current + tab_width - current % tab_width;
                if next > column {
                    break;
                }
                fill.push('\t');
                current = next;
            }
        }
        while current < column {
            fill.push(' ');
            current += 1;
        }
        buffer.insert_string(&fill)
    }

    /// 直前の空でない行の次のインデント位置へ。なければタブ位置へ。
    pub(crate) fn indent_for_tab(&mut self) -> CommandResult {
        let tab_width = self.tab_width();
        let buffer = self.buffer();
        let column = buffer.current_column(tab_width);
        let mut target = None;
        let mut n = buffer.pt().n;
        while n > 0 {
            n -= 1;
            if buffer.is_blank_line(n) {
                continue;
            }
            let line = buffer.line(buffer.point_at(n, 0).line).as_chars();
            let mut col = 0;
            let mut previous_blank = true;
            for &ch in line {
                if previous_blank && !is_blank(ch) && col > column {
                    target = Some(col);
                    break;
                }
                previous_blank = is_blank(ch);
                col = advance_column(col, ch, tab_width);
            }
            break;
        }
        match target {
            Some(target) => self.indent_to(target),
            None => self.tab_to_tab_stop(),
        }
    }

    pub(crate) fn tab_to_tab_stop(&mut self) -> CommandResult {
        let tab_width = self.tab_width();
        let column = self.buffer().current_column(tab_width);
        self.indent_to(column + tab_width - column % tab_width)
    }

    /// 次のキーをそのまま挿入する。制御キーは制御文字になる。
    pub(crate) fn quoted_insert(&mut self, count: i32) -> CommandResult {
        self.message("C-q-");
        let key = self.read_key()?;
        self.clear_message();
        let code = if key.is_ctrl() {
            key.base() & 0x1f
        } else {
            key.without_meta().base()
        };
        let ch = char::from_u32(code)
            .filter(|_| key.without_meta().as_char().is_some() || key.is_ctrl())
            .ok_or_else(|| CommandError::InvalidArgument(key.to_string()))?;
        let buffer = self.buffer_mut();
        for _ in 0..count.max(0) {
            buffer.insert_char(ch)?;
        }
        Ok(())
    }

    /// Lisp の引数を全て挿入する。対話時は文字列を読む。
    pub(crate) fn insert_command(&mut self) -> CommandResult {
        if self.lisp_args.is_empty() {
            let text = self.read_string("Insert: ", "", None, None)?;
            return self.buffer_mut().insert_string(&text);
        }
        let args: Vec<String> = self.lisp_args.drain(..).collect();
        let buffer = self.buffer_mut();
        for text in args {
            buffer.insert_string(&text)?;
        }
        Ok(())
    }

    // ---- 大文字小文字 ----

    pub(crate) fn change_word_case(&mut self, count: i32, change: CaseChange) -> CommandResult {
        let buffer = self.buffer_mut();
        let origin = buffer.point_to_offset(buffer.pt());
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
        let other = buffer.point_to_offset(buffer.pt());
        let (start, end) = (origin.min(other), origin.max(other));
        let start_pt = buffer.offset_to_point(start);
        let end_pt = buffer.offset_to_point(end);
        let text = buffer.text_between(start_pt, end_pt);
        let converted = convert_case(&text, change);
        buffer.set_pt(start_pt);
        if converted != text {
            buffer.replace_nstring(end - start, &converted)?;
        } else {
            buffer.goto_offset(end);
        }
        if count < 0 {
            let shift = converted.chars().count() as isize - (end - start) as isize;
            buffer.goto_offset((origin as isize + shift).max(0) as usize);
        }
        Ok(())
    }

    /// 領域を変換する。ポイントは動かさない。
    pub(crate) fn change_region_case(&mut self, change: CaseChange) -> CommandResult {
        let buffer = self.buffer_mut();
        buffer.ensure_writable()?;
        let region = buffer.region()?;
        let text = buffer.text_between(region.start, region.end);
        let converted = convert_case(&text, change);
        if converted == text {
            return Ok(());
        }
        let origin = buffer.point_to_offset(buffer.pt());
        let end = buffer.point_to_offset(region.end);
        buffer.set_pt(region.start);
        buffer.replace_nstring(region.size, &converted)?;
        let shift = converted.chars().count() as isize - region.size as isize;
        let restored = if origin >= end {
            (origin as isize + shift).max(0) as usize
        } else {
            origin
        };
        buffer.goto_offset(restored);
        Ok(())
    }

    // ---- 詰め込み ----

    /// 段落を詰め込み桁で折り返す。最初の行のインデントを保つ。
    pub(crate) fn fill_paragraph(&mut self) -> CommandResult {
        let fill_column = self.fill_column();
        let tab_width = self.tab_width();
        let buffer = self.buffer_mut();
        let count = buffer.line_count();
        let mut first = buffer.pt().n;
        while first < count && buffer.is_blank_line(first) {
            first += 1;
        }
        if first >= count {
            return Ok(());
        }
        while first > 0 && !buffer.is_blank_line(first - 1) {
            first -= 1;
        }
        let mut last = first;
        while last + 1 < count && !buffer.is_blank_line(last + 1) {
            last += 1;
        }

        let start = buffer.point_at(first, 0);
        let end = buffer.point_at(last, usize::MAX);
        let text = buffer.text_between(start, end);
        let indent: String = text.chars().take_while(|ch| is_blank(*ch)).collect();
        let filled = fill_words(&text, &indent, fill_column, tab_width);
        if filled == text {
            return Ok(());
        }

        // ポイントより前の非空白文字数で位置を対応づける
        let pt = buffer.pt();
        let before = if pt.n < first {
            0
        } else {
            buffer
                .text_between(start, pt)
                .chars()
                .filter(|ch| !ch.is_whitespace())
                .count()
        };
        buffer.set_pt(start);
        buffer.replace_nstring(text.chars().count(), &filled)?;
        let mut seen = 0;
        let mut offset = 0;
        for ch in filled.chars() {
            if seen == before {
                break;
            }
            if !ch.is_whitespace() {
                seen += 1;
            }
            offset += 1;
        }
        let base = buffer.point_to_offset(start);
        buffer.goto_offset(base + offset);
        Ok(())
    }

    pub(crate) fn set_fill_column(&mut self, uniarg: Option<i32>) -> CommandResult {
        let tab_width = self.tab_width();
        let column = match uniarg {
            Some(column) if column > 0 => column as usize,
            Some(_) => {
                return Err(CommandError::InvalidArgument(
                    "fill-column must be positive".to_string(),
                ))
            }
            None => self.buffer().current_column(tab_width).max(1),
        };
        let previous = self.fill_column();
        self.set_variable("fill-column", &column.to_string());
        self.message(format!("Fill column set to {} (was {})", column, previous));
        Ok(())
    }

    pub(crate) fn auto_fill_mode(&mut self) -> CommandResult {
        let buffer = self.buffer_mut();
        buffer.flags.autofill = !buffer.flags.autofill;
        let state = if buffer.flags.autofill { "enabled" } else { "disabled" };
        self.message(format!("Auto-Fill mode {} in current buffer", state));
        Ok(())
    }

    pub(crate) fn overwrite_mode(&mut self) -> CommandResult {
        let buffer = self.buffer_mut();
        buffer.flags.overwrite = !buffer.flags.overwrite;
        let state = if buffer.flags.overwrite { "enabled" } else { "disabled" };
        self.message(format!("Overwrite mode {} in current buffer", state));
        Ok(())
    }

    pub(crate) fn undo(&mut self) -> CommandResult {
        let continuing = self.last_flags.undo;
        self.this_flags.undo = true;
        self.buffer_mut().undo(continuing)?;
        self.message("Undo!");
        Ok(())
    }
}

fn convert_case(text: &str, change: CaseChange) -> String {
    match change {
        CaseChange::Upcase => text.to_uppercase(),
        CaseChange::Downcase => text.to_lowercase(),
        CaseChange::Capitalize => {
            let mut result = String::with_capacity(text.len());
            let mut in_word = false;
            for ch in text.chars() {
                if is_word_char(ch) {
                    if in_word {
                        result.extend(ch.to_lowercase());
                    } else {
                        result.extend(ch.to_uppercase());
                    }
                    in_word = true;
                } else {
                    result.push(ch);
                    in_word = false;
                }
            }
            result
        }
    }
}

/// 単語を詰め込み桁まで並べた行を作る
fn fill_words(text: &str, indent: &str, fill_column: usize, tab_width: usize) -> String {
    let indent_width = indent
        .chars()
        .fold(0, |col, ch| advance_column(col, ch, tab_width));
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut width = 0;
    for word in text.split_whitespace() {
        let word_width = word
            .chars()
            .fold(0, |col, ch| advance_column(col, ch, tab_width));
        if current.is_empty() {
            current.push_str(indent);
            current.push_str(word);
            width = indent_width + word_width;
        } else if width + 1 + word_width <= fill_column {
            current.push(' ');
            current.push_str(word);
            width += 1 + word_width;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(indent);
            current.push_str(word);
            width = indent_width + word_width;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::test_support::editor_with_text;

    #[test]
    fn fill_words_wraps_at_column() {
        let filled = fill_words("  aaa bbb ccc\nddd", "  ", 10, 8);
        assert_eq!(filled, "  aaa bbb\n  ccc ddd");
    }

    #[test]
    fn capitalize_each_word() {
        assert_eq!(
            convert_case("hELLO wORLD-foo", CaseChange::Capitalize),
            "Hello World-Foo"
        );
    }

    #[test]
    fn upcase_word_moves_over() {
        let mut editor = editor_with_text("foo bar");
        editor.feed_sequence("M-u").unwrap();
        editor.run_pending();
        assert_eq!(editor.buffer().text(), "FOO bar");
        assert_eq!(editor.buffer().pt().o, 3);
    }

    #[test]
    fn just_one_space_collapses_blanks() {
        let mut editor = editor_with_text("a  \t  b");
        editor.feed_sequence("C-f C-f C-f M-SPC").unwrap();
        editor.run_pending();
        assert_eq!(editor.buffer().text(), "a b");
        assert_eq!(editor.buffer().pt().o, 2);
    }

    #[test]
    fn delete_blank_lines_leaves_one() {
        let mut editor = editor_with_text("a\n\n\n\nb");
        editor.feed_sequence("C-n C-n C-x C-o").unwrap();
        editor.run_pending();
        assert_eq!(editor.buffer().text(), "a\n\nb");
    }

    #[test]
    fn delete_blank_lines_after_nonblank_line() {
        let mut editor = editor_with_text("a\n\n\nb");
        editor.feed_sequence("C-x C-o").unwrap();
        editor.run_pending();
        assert_eq!(editor.buffer().text(), "a\nb");
        assert_eq!(editor.buffer().pt().o, 0);
    }

    #[test]
    fn newline_and_indent_copies_indentation() {
        let mut editor = editor_with_text("    foo");
        editor.feed_sequence("C-e C-j").unwrap();
        editor.run_pending();
        assert_eq!(editor.buffer().text(), "    foo\n    ");
    }

    #[test]
    fn overwrite_mode_replaces_characters() {
        let mut editor = editor_with_text("abc");
        editor.feed_sequence("<insert> x y").unwrap();
        editor.run_pending();
        assert_eq!(editor.buffer().text(), "xyc");
    }

    #[test]
    fn auto_fill_breaks_long_line() {
        let mut editor = editor_with_text("");
        editor.set_variable("fill-column", "10");
        editor.buffer_mut().flags.autofill = true;
        for ch in "hello brave new".chars() {
            editor.feed_keys([crate::input::Key::from_char(ch)]);
        }
        editor.feed_sequence("SPC").unwrap();
        editor.run_pending();
        assert_eq!(editor.buffer().text(), "hello\nbrave new ");
    }

    #[test]
    fn fill_paragraph_rewraps_lines() {
        let mut editor = editor_with_text("one two\nthree four five six");
        editor.set_variable("fill-column", "14");
        editor.feed_sequence("M-q").unwrap();
        editor.run_pending();
        assert_eq!(editor.buffer().text(), "one two three\nfour five six");
    }
}
