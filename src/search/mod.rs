//! 検索モジュール
//!
//! インクリメンタル検索、ミニバッファから読む通常の検索、置換。
//! 大文字を含まない検索語は `case-fold-search` が有効なら大小を区別しない。

pub mod isearch;
pub mod matcher;
pub mod replace;
pub mod state;

use crate::editor::Editor;
use crate::error::{CommandError, CommandResult};
use crate::minibuffer::HistoryKind;

pub use matcher::{build_matcher, fold_case_for, LiteralMatcher, RegexMatcher, SearchMatch, SearchText, StringMatcher};
pub use state::{IsearchState, IsearchStep};

/// 検索方向に応じて次のマッチを探す
pub fn find_match(matcher: &dyn StringMatcher, text: &SearchText, from: usize, forward: bool) -> Option<SearchMatch> {
    if forward {
        matcher.find_forward(text, from)
    } else {
        matcher.find_backward(text, from)
    }
}

impl Editor {
    pub(crate) fn matcher_for(&self, pattern: &str, regex: bool) -> Result<Box<dyn StringMatcher>, CommandError> {
        build_matcher(pattern, regex, self.var_enabled("case-fold-search"))
    }

    pub(crate) fn search_text(&self) -> SearchText {
        SearchText::new(self.buffer().text())
    }

    pub(crate) fn point_offset(&self) -> usize {
        let buffer = self.buffer();
        buffer.point_to_offset(buffer.pt())
    }

    /// 空の入力なら直前の検索語を使う
    pub(crate) fn search_pattern_or_last(&mut self, input: String) -> Result<String, CommandError> {
        if !input.is_empty() {
            self.last_search = Some(input.clone());
            return Ok(input);
        }
        self.last_search
            .clone()
            .ok_or_else(|| CommandError::Message("No previous search string".to_string()))
    }

    /// ミニバッファから検索語を読んで 1 回検索する
    pub(crate) fn search_command(&mut self, forward: bool, regex: bool) -> CommandResult {
        let prompt = match (regex, forward) {
            (false, true) => "Search: ",
            (false, false) => "Search backward: ",
            (true, true) => "RE search: ",
            (true, false) => "RE search backward: ",
        };
        let input = self.read_string(prompt, "", Some(HistoryKind::Search), None)?;
        let pattern = self.search_pattern_or_last(input)?;
        let matcher = self.matcher_for(&pattern, regex)?;
        let text = self.search_text();
        let from = self.point_offset();
        match find_match(matcher.as_ref(), &text, from, forward) {
            Some(found) => {
                self.buffer_mut()
                    .goto_offset(if forward { found.end } else { found.start });
                Ok(())
            }
            None => Err(CommandError::SearchFailed(pattern)),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::editor::test_support::editor_with_text;

    #[test]
    fn search_forward_moves_after_match() {
        let mut editor = editor_with_text("one two\nthree two");
        editor.feed_sequence("C-u 1 0 C-f").unwrap();
        editor.run_pending();
        editor.feed_sequence("t w o RET").unwrap();
        editor.search_command(true, false).unwrap();
        let pt = editor.buffer().pt();
        assert_eq!((pt.n, pt.o), (1, 9));
    }

    #[test]
    fn search_backward_reuses_last_pattern() {
        let mut editor = editor_with_text("ab ab ab");
        editor.buffer_mut().goto_offset(8);
        editor.feed_sequence("a b RET").unwrap();
        editor.search_command(false, false).unwrap();
        assert_eq!(editor.point_offset(), 6);
        editor.feed_sequence("RET").unwrap();
        editor.search_command(false, false).unwrap();
        assert_eq!(editor.point_offset(), 3);
    }

    #[test]
    fn failed_search_keeps_point() {
        let mut editor = editor_with_text("abc");
        editor.feed_sequence("x y RET").unwrap();
        let result = editor.search_command(true, false);
        assert_eq!(result, Err(crate::error::CommandError::SearchFailed("xy".to_string())));
        assert_eq!(editor.point_offset(), 0);
    }

    #[test]
    fn regex_search_respects_case_folding() {
        let mut editor = editor_with_text("Foo foo");
        editor.feed_sequence("f o + RET").unwrap();
        editor.search_command(true, true).unwrap();
        assert_eq!(editor.point_offset(), 3);
    }
}
