//! 再表示
//!
//! ウィンドウを上から積み、それぞれ本文とモード行を描く。最下行は
//! エコー領域。本文は折り返さず、はみ出した行は端に `$` を出す。
//!
//! 画面はまず行ごとのセル列（`Frame`）に組み立て、最後にまとめて端末へ書く。

use unicode_width::UnicodeWidthChar;

use crate::buffer::{Buffer, Point};
use crate::editor::{Editor, Window};

use super::Attributes;

/// 1 行分のセル。全角文字の右半分は `None`。
type Row = Vec<Option<char>>;

struct Frame {
    rows: Vec<(Row, Attributes)>,
    cursor: (usize, usize),
}

/// 1 文字を表示セルに展開する
fn expand_char(ch: char, col: usize, tab_width: usize, out: &mut Row) {
    if ch == '\t' {
        let tab_width = tab_width.max(1);
        let spaces = tab_width - col % tab_width;
        out.extend(std::iter::repeat(Some(' ')).take(spaces));
    } else if ch.is_control() {
        out.push(Some('^'));
        out.push(char::from_u32((ch as u32) ^ 0x40).or(Some('?')));
    } else {
        out.push(Some(ch));
        for _ in 1..ch.width().unwrap_or(1) {
            out.push(None);
        }
    }
}

/// 行全体をセルに展開する
fn expand_line(chars: &[char], tab_width: usize) -> Row {
    let mut cells = Row::with_capacity(chars.len());
    for &ch in chars {
        let col = cells.len();
        expand_char(ch, col, tab_width, &mut cells);
    }
    cells
}

/// `start` 桁から `width` 桁を切り出す。端からはみ出す側には `$` を置く。
fn clip_row(cells: &Row, start: usize, width: usize) -> Row {
    let mut row: Row = cells.iter().skip(start).take(width).cloned().collect();
    if width == 0 {
        return row;
    }
    if start > 0 && !cells.is_empty() {
        if let Some(first) = row.first_mut() {
            *first = Some('$');
        }
    }
    if cells.len() > start + width {
        row[width - 1] = Some('$');
    }
    // 切り口に全角文字の右半分だけが残らないようにする
    if let Some(first) = row.first_mut() {
        if first.is_none() {
            *first = Some(' ');
        }
    }
    row.resize(width, Some(' '));
    row
}

fn text_row(text: &str, width: usize) -> Row {
    let chars: Vec<char> = text.chars().collect();
    clip_row(&expand_line(&chars, 8), 0, width)
}

/// モード行の位置表示
fn position_label(top: usize, text_height: usize, line_count: usize) -> String {
    let bottom_visible = top + text_height >= line_count;
    match (top == 0, bottom_visible) {
        (true, true) => "All".to_string(),
        (true, false) => "Top".to_string(),
        (false, true) => "Bot".to_string(),
        (false, false) => format!("{}%", top * 100 / line_count.max(1)),
    }
}

/// モード行の文字列
pub fn mode_line(buffer: &Buffer, window: &Window, point: Point, width: usize) -> String {
    let flags = &buffer.flags;
    let first = if flags.readonly {
        '%'
    } else if buffer.is_modified() {
        '*'
    } else {
        '-'
    };
    let second = if buffer.is_modified() {
        '*'
    } else if flags.readonly {
        '%'
    } else {
        '-'
    };
    let mut modes = String::from("Fundamental");
    if flags.autofill {
        modes.push_str(" Fill");
    }
    if flags.overwrite {
        modes.push_str(" Ovwrt");
    }
    let position = position_label(window.top_line(), window.text_height(), buffer.line_count());
    let mut line = format!(
        "-{}{}{}-  {:<16} {:<4} L{:<5} ({})",
        buffer.eol().mode_label(),
        first,
        second,
        buffer.name(),
        position,
        point.n + 1,
        modes
    );
    line.push(' ');
    let used: usize = line.chars().map(|ch| ch.width().unwrap_or(1)).sum();
    if used < width {
        line.push_str(&"-".repeat(width - used));
    }
    line
}

/// ポイントが本文に収まるように表示開始行と開始桁を決める
fn scroll_window(window: &mut Window, point_row: usize, point_col: usize, width: usize) {
    let text_height = window.text_height();
    if point_row < window.top || point_row >= window.top + text_height {
        window.top = point_row.saturating_sub(text_height / 2);
    }
    // 右端は `$` に使うので 1 桁残す
    let usable = width.saturating_sub(1).max(1);
    if point_col < window.start_column || point_col >= window.start_column + usable {
        window.start_column = if point_col < usable {
            0
        } else {
            point_col - usable / 2
        };
    }
}

impl Editor {
    /// 画面全体を描き直す
    pub fn redisplay(&mut self) {
        let (width, height) = self.term.size();
        if width == 0 || height < 2 {
            return;
        }
        let total: usize = self.windows.iter().map(Window::height).sum();
        if total + 1 != height {
            self.fit_windows(height);
        }
        let frame = self.build_frame(width, height);
        self.draw_frame(&frame);
    }

    fn build_frame(&mut self, width: usize, height: usize) -> Frame {
        let tab_width = self.tab_width();
        let mut rows = Vec::with_capacity(height);
        let mut cursor = (0, 0);

        for index in 0..self.windows.len() {
            let Some(point) = self.window_point(index) else {
                continue;
            };
            let buffer_id = self.windows[index].buffer_id();
            let Some(buffer) = self.buffers.iter().find(|buffer| buffer.id() == buffer_id) else {
                continue;
            };
            let point_col = crate::buffer::point::column_at(buffer.line(point.line), point.o, tab_width);
            let window = &mut self.windows[index];
            scroll_window(window, point.n, point_col, width);

            let origin = rows.len();
            let mut line = Some(buffer.point_at(window.top, 0).line);
            if window.top >= buffer.line_count() {
                line = None;
            }
            for _ in 0..window.text_height() {
                let row = match line {
                    Some(id) => {
                        let cells = expand_line(buffer.line(id).as_chars(), tab_width);
                        line = buffer.next_line_of(id);
                        clip_row(&cells, window.start_column, width)
                    }
                    None => vec![Some(' '); width],
                };
                rows.push((row, Attributes::NORMAL));
            }
            if index == self.current_window {
                let row = origin + point.n.saturating_sub(window.top);
                cursor = (row, point_col.saturating_sub(window.start_column));
            }
            let text = mode_line(buffer, window, point, width);
            rows.push((text_row(&text, width), Attributes::REVERSE));
        }

        // エコー領域
        let echo = self.echo.clone().unwrap_or_default();
        let echo_cells = expand_line(&echo.chars().collect::<Vec<_>>(), tab_width);
        match self.minibuffer_cursor {
            Some(column) => {
                let start = if column >= width { column + 1 - width } else { 0 };
                rows.push((clip_row(&echo_cells, start, width), Attributes::NORMAL));
                cursor = (rows.len() - 1, column - start);
            }
            None => rows.push((clip_row(&echo_cells, 0, width), Attributes::NORMAL)),
        }

        rows.truncate(height);
        Frame { rows, cursor }
    }

    fn draw_frame(&mut self, frame: &Frame) {
        for (row_index, (cells, attrs)) in frame.rows.iter().enumerate() {
            self.term.move_to(row_index, 0);
            self.term.set_attributes(*attrs);
            for cell in cells.iter().flatten() {
                self.term.add_char(*cell);
            }
            self.term.set_attributes(Attributes::NORMAL);
            self.term.clear_to_eol();
        }
        self.term.move_to(frame.cursor.0, frame.cursor.1);
        if let Err(error) = self.term.refresh() {
            log::warn!("refresh failed: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::test_support::editor_with_text;
    use crate::term::ScriptedTerminal;

    fn screen_of(editor: &Editor) -> &ScriptedTerminal {
        editor.scripted_terminal().unwrap()
    }

    #[test]
    fn tabs_and_control_chars_expand() {
        let cells = expand_line(&['a', '\t', 'b', '\u{1}'], 4);
        let text: String = cells.iter().flatten().collect();
        assert_eq!(text, "a   b^A");
    }

    #[test]
    fn long_lines_are_marked() {
        let chars: Vec<char> = "abcdefghij".chars().collect();
        let cells = expand_line(&chars, 8);
        let text: String = clip_row(&cells, 0, 5).iter().flatten().collect();
        assert_eq!(text, "abcd$");
        let text: String = clip_row(&cells, 4, 5).iter().flatten().collect();
        assert_eq!(text, "$fgh$");
    }

    #[test]
    fn position_labels() {
        assert_eq!(position_label(0, 10, 5), "All");
        assert_eq!(position_label(0, 10, 50), "Top");
        assert_eq!(position_label(45, 10, 50), "Bot");
        assert_eq!(position_label(25, 10, 100), "25%");
    }

    #[test]
    fn draws_text_mode_line_and_echo() {
        let mut editor = editor_with_text("hello\nworld");
        editor.message("hi");
        editor.redisplay();
        let term = screen_of(&editor);
        assert_eq!(term.row_text(0), "hello");
        assert_eq!(term.row_text(1), "world");
        assert!(term.row_text(22).starts_with("-:---  *scratch*"));
        assert!(term.row_text(22).contains("All"));
        assert!(term.row_text(22).contains("(Fundamental)"));
        assert_eq!(term.row_text(23), "hi");
        assert_eq!(term.cursor(), (0, 0));
    }

    #[test]
    fn modified_buffer_shows_stars() {
        let mut editor = editor_with_text("");
        editor.feed_sequence("x").unwrap();
        editor.run_pending();
        editor.redisplay();
        let term = screen_of(&editor);
        assert!(term.row_text(22).starts_with("-:**-"));
        assert_eq!(term.cursor(), (0, 1));
    }

    #[test]
    fn scrolls_to_keep_point_visible() {
        let text = (0..100).map(|n| n.to_string()).collect::<Vec<_>>().join("\n");
        let mut editor = editor_with_text(&text);
        editor.feed_sequence("M->").unwrap();
        editor.run_pending();
        editor.redisplay();
        let top = editor.windows()[0].top_line();
        assert!(top <= 99 && 99 < top + editor.windows()[0].text_height());
        let term = screen_of(&editor);
        assert_eq!(term.cursor().0, 99 - top);
    }

    #[test]
    fn split_windows_each_get_a_mode_line() {
        let mut editor = editor_with_text("abc");
        editor.feed_sequence("C-x 2").unwrap();
        editor.run_pending();
        editor.redisplay();
        let term = screen_of(&editor);
        let mode_lines = (0..23)
            .filter(|row| term.row_text(*row).starts_with("-:---"))
            .count();
        assert_eq!(mode_lines, 2);
    }
}
