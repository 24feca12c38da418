//! 置換
//!
//! ポイントからバッファ末尾までの出現を置き換える。`query-replace` は
//! 出現ごとに 1 キーで答えを読む。

use crate::editor::Editor;
use crate::error::{CommandError, CommandResult};
use crate::input::Key;
use crate::minibuffer::HistoryKind;

use super::matcher::StringMatcher;

/// `query-replace` の答え
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Answer {
    Replace,
    Skip,
    ReplaceAll,
    ReplaceAndExit,
    Exit,
    Other(Key),
}

fn answer_for(key: Key) -> Answer {
    match key.as_char() {
        Some('y' | ' ') => Answer::Replace,
        Some('n') => Answer::Skip,
        Some('!') => Answer::ReplaceAll,
        Some('.') => Answer::ReplaceAndExit,
        Some('q') => Answer::Exit,
        _ if key == Key::DEL => Answer::Skip,
        _ if key == Key::RET => Answer::Exit,
        _ => Answer::Other(key),
    }
}

fn replaced_message(count: usize) -> String {
    if count == 1 {
        "Replaced 1 occurrence".to_string()
    } else {
        format!("Replaced {} occurrences", count)
    }
}

impl Editor {
    /// 置換前と置換後の文字列を読む
    fn read_replacement(&mut self, verb: &str) -> Result<(String, String), CommandError> {
        let from = self.read_string(&format!("{}: ", verb), "", Some(HistoryKind::Replace), None)?;
        if from.is_empty() {
            return Err(CommandError::Message("Empty search string".to_string()));
        }
        let to = self.read_string(
            &format!("{} {} with: ", verb, from),
            "",
            Some(HistoryKind::Replace),
            None,
        )?;
        Ok((from, to))
    }

    /// `from` 以降で次の出現を探す
    fn next_occurrence(&self, matcher: &dyn StringMatcher, from: usize) -> Option<(usize, usize)> {
        let text = self.search_text();
        matcher.find_forward(&text, from).map(|found| (found.start, found.end))
    }

    /// `start..end` を置き換え、置換後の末尾を返す
    fn replace_occurrence(&mut self, start: usize, end: usize, to: &str) -> Result<usize, CommandError> {
        let buffer = self.buffer_mut();
        buffer.goto_offset(start);
        buffer.replace_nstring(end - start, to)?;
        Ok(start + to.chars().count())
    }

    pub(crate) fn replace_string(&mut self) -> CommandResult {
        let (from, to) = self.read_replacement("Replace string")?;
        self.buffer().ensure_writable()?;
        let matcher = self.matcher_for(&from, false)?;

        let mut count = 0;
        let mut position = self.point_offset();
        while let Some((start, end)) = self.next_occurrence(matcher.as_ref(), position) {
            position = self.replace_occurrence(start, end, &to)?;
            count += 1;
        }
        self.message(replaced_message(count));
        Ok(())
    }

    pub(crate) fn query_replace(&mut self) -> CommandResult {
        let (from, to) = self.read_replacement("Query replace")?;
        self.buffer().ensure_writable()?;
        let matcher = self.matcher_for(&from, false)?;
        let prompt = format!("Query replacing {} with {}: (? for help) ", from, to);

        let mut count = 0;
        let mut ask = true;
        let mut position = self.point_offset();
        while let Some((start, end)) = self.next_occurrence(matcher.as_ref(), position) {
            self.buffer_mut().goto_offset(end);
            let answer = if ask {
                let key = self.read_char(&prompt)?;
                answer_for(key)
            } else {
                Answer::Replace
            };
            match answer {
                Answer::Replace => {
                    position = self.replace_occurrence(start, end, &to)?;
                    count += 1;
                }
                Answer::ReplaceAll => {
                    ask = false;
                    position = self.replace_occurrence(start, end, &to)?;
                    count += 1;
                }
                Answer::ReplaceAndExit => {
                    self.replace_occurrence(start, end, &to)?;
                    count += 1;
                    break;
                }
                Answer::Skip => position = end.max(start + 1),
                Answer::Exit => break,
                Answer::Other(key) => {
                    self.unget_key(key);
                    break;
                }
            }
        }
        self.message(replaced_message(count));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::editor::test_support::editor_with_text;

    #[test]
    fn replace_string_replaces_all_after_point() {
        let mut editor = editor_with_text("abc def de ab cd ab de fg");
        editor.feed_sequence("d e RET x x x RET").unwrap();
        editor.replace_string().unwrap();
        assert_eq!(editor.buffer().text(), "abc xxxf xxx ab cd ab xxx fg");
        assert_eq!(editor.echo_text(), Some("Replaced 3 occurrences"));
        assert_eq!(editor.point_offset(), 25);
    }

    #[test]
    fn replace_string_is_undone_as_one_command() {
        let mut editor = editor_with_text("a a");
        editor.feed_sequence("M-x r e p l a c e - s t r i n g RET a RET b RET C-_").unwrap();
        editor.run_pending();
        assert_eq!(editor.buffer().text(), "a a");
    }

    #[test]
    fn query_replace_answers() {
        let mut editor = editor_with_text("a a a a");
        editor.feed_sequence("M-% a RET b RET y n !").unwrap();
        editor.run_pending();
        assert_eq!(editor.buffer().text(), "b a b b");
        assert_eq!(editor.echo_text(), Some("Replaced 3 occurrences"));
    }

    #[test]
    fn query_replace_dot_replaces_once() {
        let mut editor = editor_with_text("aa");
        editor.feed_sequence("M-% a RET x RET .").unwrap();
        editor.run_pending();
        assert_eq!(editor.buffer().text(), "xa");
        assert_eq!(editor.echo_text(), Some("Replaced 1 occurrence"));
    }

    #[test]
    fn query_replace_other_key_exits_and_runs() {
        let mut editor = editor_with_text("ab ab");
        editor.feed_sequence("M-% a b RET c RET C-a").unwrap();
        editor.run_pending();
        assert_eq!(editor.buffer().text(), "ab ab");
        assert_eq!(editor.point_offset(), 0);
    }

    #[test]
    fn replacement_in_read_only_buffer_fails() {
        let mut editor = editor_with_text("abc");
        editor.buffer_mut().flags.readonly = true;
        editor.feed_sequence("a RET b RET").unwrap();
        assert!(editor.replace_string().is_err());
        assert_eq!(editor.buffer().text(), "abc");
    }
}
