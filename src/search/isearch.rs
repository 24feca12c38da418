//! インクリメンタル検索
//!
//! 1 文字入力するたびに検索し直す。`C-s`/`C-r` で次のマッチへ進み、
//! 失敗した状態でもう一度押すとバッファの端から折り返す。

use crate::buffer::motion::is_word_char;
use crate::editor::Editor;
use crate::error::{CommandError, CommandResult};
use crate::input::Key;
use crate::minibuffer::HistoryKind;

use super::matcher::SearchMatch;
use super::state::{IsearchState, IsearchStep};
use super::find_match;

impl Editor {
    pub(crate) fn isearch(&mut self, forward: bool, regex: bool) -> CommandResult {
        let origin = self.point_offset();
        let mut state = IsearchState::new(origin, forward, regex);
        loop {
            self.echo = Some(state.prompt());
            let key = match self.read_key() {
                Ok(key) => key,
                Err(error) => {
                    self.buffer_mut().goto_offset(origin);
                    return Err(error);
                }
            };

            if key == Key::ctrl('g') {
                if state.top().failed {
                    state.pop_failures();
                    self.buffer_mut().goto_offset(state.point());
                    continue;
                }
                self.buffer_mut().goto_offset(origin);
                self.clear_message();
                return Err(CommandError::Quit);
            } else if key == Key::ctrl('s') || key == Key::ctrl('r') {
                self.isearch_repeat(&mut state, key == Key::ctrl('s'));
            } else if key == Key::RET {
                if state.top().pattern.is_empty() && state.top().current.is_empty() {
                    self.clear_message();
                    return self.search_command(state.top().forward, regex);
                }
                break;
            } else if key == Key::DEL {
                if !state.pop() {
                    self.term.beep();
                }
                self.buffer_mut().goto_offset(state.point());
            } else if key == Key::ctrl('q') {
                let quoted = self.read_key()?;
                let code = if quoted.is_ctrl() { quoted.base() & 0x1f } else { quoted.base() };
                if let Some(ch) = char::from_u32(code) {
                    self.isearch_append(&mut state, &ch.to_string());
                }
            } else if key == Key::ctrl('w') {
                let word = self.word_after(state.point());
                if !word.is_empty() {
                    self.isearch_append(&mut state, &word);
                }
            } else if let Some(ch) = key.as_char().filter(|ch| !ch.is_control() || *ch == '\t') {
                self.isearch_append(&mut state, &ch.to_string());
            } else {
                self.unget_key(key);
                break;
            }
        }
        self.isearch_done(&state);
        Ok(())
    }

    fn isearch_done(&mut self, state: &IsearchState) {
        self.clear_message();
        let pattern = state.top().pattern.clone();
        if !pattern.is_empty() {
            self.histories.add(HistoryKind::Search, &pattern);
            self.last_search = Some(pattern);
        }
        if self.point_offset() != state.origin {
            let buffer = self.buffer_mut();
            let origin = buffer.offset_to_point(state.origin);
            buffer.set_mark(origin);
            self.message("Mark saved where search started");
        }
    }

    /// 検索語を伸ばして現在のマッチの位置から探し直す
    fn isearch_append(&mut self, state: &mut IsearchState, text: &str) {
        let top = state.top().clone();
        let pattern = format!("{}{}", top.pattern, text);
        let from = if top.forward {
            top.current.start
        } else {
            top.current.start + pattern.chars().count()
        };
        let found = self.isearch_find(state.regex, &pattern, from, top.forward);
        state.push(IsearchStep {
            failed: found.is_none(),
            current: found.unwrap_or(top.current),
            pattern,
            ..top
        });
        self.buffer_mut().goto_offset(state.point());
    }

    /// 次のマッチへ進む。方向が変われば同じマッチの反対側へ。
    fn isearch_repeat(&mut self, state: &mut IsearchState, forward: bool) {
        let top = state.top().clone();
        let mut pattern = top.pattern.clone();
        if pattern.is_empty() {
            match self.last_search.clone() {
                Some(last) => pattern = last,
                None => {
                    state.push(IsearchStep { forward, ..top });
                    return;
                }
            }
        }

        let len = self.buffer().len_chars();
        let (from, wrapped) = if top.failed && top.forward == forward {
            (if forward { 0 } else { len }, true)
        } else {
            (state.point(), top.wrapped)
        };
        let mut found = self.isearch_find(state.regex, &pattern, from, forward);
        // 空のマッチに留まらない
        if found == Some(top.current) && top.current.is_empty() {
            found = match (forward, from) {
                (true, from) if from < len => self.isearch_find(state.regex, &pattern, from + 1, true),
                (false, from) if from > 0 => self.isearch_find(state.regex, &pattern, from - 1, false),
                _ => None,
            };
        }
        state.push(IsearchStep {
            pattern,
            forward,
            current: found.unwrap_or(top.current),
            failed: found.is_none(),
            wrapped,
        });
        self.buffer_mut().goto_offset(state.point());
    }

    fn isearch_find(&self, regex: bool, pattern: &str, from: usize, forward: bool) -> Option<SearchMatch> {
        let matcher = self.matcher_for(pattern, regex).ok()?;
        let text = self.search_text();
        find_match(matcher.as_ref(), &text, from, forward)
    }

    /// `offset` から次の単語の末尾までの文字列
    fn word_after(&self, offset: usize) -> String {
        let text = self.search_text();
        let chars = text.chars();
        let mut end = offset.min(chars.len());
        while end < chars.len() && !is_word_char(chars[end]) {
            end += 1;
        }
        while end < chars.len() && is_word_char(chars[end]) {
            end += 1;
        }
        chars[offset.min(chars.len())..end].iter().collect()
    }
}
