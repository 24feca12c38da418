//! スクリプト端末
//!
//! あらかじめ与えたキー列を返し、画面をメモリ上に保持する。
//! テストとバッチ実行で使う。

use std::collections::VecDeque;
use std::io;
use std::time::Duration;

use super::{Attributes, Terminal};
use crate::input::Key;

/// メモリ上の端末
#[derive(Debug, Clone)]
pub struct ScriptedTerminal {
    width: usize,
    height: usize,
    screen: Vec<Vec<char>>,
    cursor: (usize, usize),
    attrs: Attributes,
    keys: VecDeque<Key>,
    bells: usize,
    refreshes: usize,
}

impl ScriptedTerminal {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            screen: vec![vec![' '; width]; height],
            cursor: (0, 0),
            attrs: Attributes::NORMAL,
            keys: VecDeque::new(),
            bells: 0,
            refreshes: 0,
        }
    }

    /// キーを末尾に追加する
    pub fn push_keys(&mut self, keys: impl IntoIterator<Item = Key>) {
        self.keys.extend(keys);
    }

    /// `C-x C-f` 形式のキー列を追加する。解析できない名前は無視する。
    pub fn push_sequence(&mut self, sequence: &str) {
        if let Ok(keys) = Key::parse_sequence(sequence) {
            self.push_keys(keys);
        }
    }

    /// 文字列の各文字をキーとして追加する
    pub fn push_text(&mut self, text: &str) {
        self.push_keys(text.chars().map(|ch| match ch {
            '\n' => Key::RET,
            other => Key::from_char(other),
        }));
    }

    pub fn pending_keys(&self) -> usize {
        self.keys.len()
    }

    pub fn bells(&self) -> usize {
        self.bells
    }

    pub fn refreshes(&self) -> usize {
        self.refreshes
    }

    pub fn cursor(&self) -> (usize, usize) {
        self.cursor
    }

    /// 画面の 1 行（末尾の空白は除く）
    pub fn row_text(&self, row: usize) -> String {
        self.screen
            .get(row)
            .map(|cells| cells.iter().collect::<String>().trim_end().to_string())
            .unwrap_or_default()
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.screen = vec![vec![' '; width]; height];
        self.cursor = (0, 0);
    }

    pub fn current_attributes(&self) -> Attributes {
        self.attrs
    }
}

impl Terminal for ScriptedTerminal {
    fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn move_to(&mut self, row: usize, col: usize) {
        self.cursor = (row, col);
    }

    fn clear_to_eol(&mut self) {
        let (row, col) = self.cursor;
        if let Some(cells) = self.screen.get_mut(row) {
            for cell in cells.iter_mut().skip(col) {
                *cell = ' ';
            }
        }
    }

    fn add_char(&mut self, ch: char) {
        let (row, col) = self.cursor;
        if let Some(cell) = self.screen.get_mut(row).and_then(|cells| cells.get_mut(col)) {
            *cell = ch;
        }
        self.cursor.1 += 1;
    }

    fn set_attributes(&mut self, attrs: Attributes) {
        self.attrs = attrs;
    }

    fn refresh(&mut self) -> io::Result<()> {
        self.refreshes += 1;
        Ok(())
    }

    fn beep(&mut self) {
        self.bells += 1;
    }

    fn get_key(&mut self, _timeout: Option<Duration>) -> Option<Key> {
        self.keys.pop_front()
    }

    fn unget_key(&mut self, key: Key) {
        self.keys.push_front(key);
    }

    fn input_exhausted(&self) -> bool {
        self.keys.is_empty()
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draws_into_memory_screen() {
        let mut term = ScriptedTerminal::new(10, 3);
        term.move_to(1, 2);
        term.add_string("hello");
        assert_eq!(term.row_text(1), "  hello");
        term.move_to(1, 4);
        term.clear_to_eol();
        assert_eq!(term.row_text(1), "  he");
    }

    #[test]
    fn unget_returns_key_first() {
        let mut term = ScriptedTerminal::new(10, 3);
        term.push_sequence("C-x C-f");
        term.unget_key(Key::from_char('q'));
        assert_eq!(term.get_key(None), Some(Key::from_char('q')));
        assert_eq!(term.get_key(None), Some(Key::ctrl('x')));
        assert_eq!(term.pending_keys(), 1);
    }

    #[test]
    fn writes_past_edge_are_dropped() {
        let mut term = ScriptedTerminal::new(3, 1);
        term.add_string("abcdef");
        assert_eq!(term.row_text(0), "abc");
        term.beep();
        assert_eq!(term.bells(), 1);
    }
}
