//! ミニバッファ
//!
//! エコー行で 1 行の文字列を読む。Lisp から呼ばれたコマンドでは
//! `lisp_args` に積まれた引数を先に消費し、端末からは読まない。

pub mod completion;
pub mod history;

use unicode_width::UnicodeWidthStr;

use crate::editor::Editor;
use crate::error::CommandError;
use crate::input::Key;

pub use completion::{common_prefix, Completion, CompletionStatus};
pub use history::{Histories, History, HistoryKind};

/// 入力中の行
#[derive(Debug, Clone, Default)]
struct LineEditor {
    chars: Vec<char>,
    cursor: usize,
}

impl LineEditor {
    fn new(initial: &str) -> Self {
        let chars: Vec<char> = initial.chars().collect();
        let cursor = chars.len();
        Self { chars, cursor }
    }

    fn text(&self) -> String {
        self.chars.iter().collect()
    }

    fn set_text(&mut self, text: &str) {
        self.chars = text.chars().collect();
        self.cursor = self.chars.len();
    }

    fn insert(&mut self, ch: char) {
        self.chars.insert(self.cursor, ch);
        self.cursor += 1;
    }

    fn delete_backward(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        self.chars.remove(self.cursor);
        true
    }

    fn delete_forward(&mut self) -> bool {
        if self.cursor >= self.chars.len() {
            return false;
        }
        self.chars.remove(self.cursor);
        true
    }

    fn kill_to_end(&mut self) {
        self.chars.truncate(self.cursor);
    }

    fn before_cursor(&self) -> String {
        self.chars[..self.cursor].iter().collect()
    }
}

/// 1 キー分の編集結果
enum Step {
    Continue,
    Accept,
}

impl Editor {
    /// ミニバッファで文字列を読む。`C-g` で `Err(Quit)`。
    pub fn read_string(
        &mut self,
        prompt: &str,
        initial: &str,
        history: Option<HistoryKind>,
        mut completion: Option<Completion>,
    ) -> Result<String, CommandError> {
        if let Some(arg) = self.lisp_args.pop_front() {
            return Ok(arg);
        }
        if let Some(kind) = history {
            self.histories.get_mut(kind).reset();
        }

        let mut line = LineEditor::new(initial);
        let mut saved_input: Option<String> = None;
        let mut note: Option<String> = None;
        let result = loop {
            self.show_minibuffer(prompt, &line, note.take().as_deref());
            let key = match self.read_key_or_quit() {
                Ok(key) => key,
                Err(error) => break Err(error),
            };
            match self.minibuffer_key(key, &mut line, history, &mut saved_input, &mut completion, &mut note) {
                Step::Continue => {}
                Step::Accept => break Ok(line.text()),
            }
        };
        self.minibuffer_cursor = None;
        self.clear_message();

        let text = result?;
        if let Some(kind) = history {
            self.histories.add(kind, &text);
        }
        Ok(text)
    }

    fn show_minibuffer(&mut self, prompt: &str, line: &LineEditor, note: Option<&str>) {
        let mut shown = format!("{}{}", prompt, line.text());
        if let Some(note) = note {
            shown.push(' ');
            shown.push_str(note);
        }
        self.echo = Some(shown);
        let column = prompt.width() + line.before_cursor().width();
        self.minibuffer_cursor = Some(column);
    }

    fn minibuffer_key(
        &mut self,
        key: Key,
        line: &mut LineEditor,
        history: Option<HistoryKind>,
        saved_input: &mut Option<String>,
        completion: &mut Option<Completion>,
        note: &mut Option<String>,
    ) -> Step {
        match key {
            Key::RET => return Step::Accept,
            k if k == Key::ctrl('a') || k == Key::HOME => line.cursor = 0,
            k if k == Key::ctrl('e') || k == Key::END => line.cursor = line.chars.len(),
            k if k == Key::ctrl('b') || k == Key::LEFT => {
                if line.cursor > 0 {
                    line.cursor -= 1;
                } else {
                    self.ding();
                }
            }
            k if k == Key::ctrl('f') || k == Key::RIGHT => {
                if line.cursor < line.chars.len() {
                    line.cursor += 1;
                } else {
                    self.ding();
                }
            }
            k if k == Key::DEL || k == Key::ctrl('h') => {
                if !line.delete_backward() {
                    self.ding();
                }
            }
            k if k == Key::ctrl('d') || k == Key::DELETE => {
                if !line.delete_forward() {
                    self.ding();
                }
            }
            k if k == Key::ctrl('k') => line.kill_to_end(),
            k if k == Key::meta('p') || k == Key::UP => {
                let Some(kind) = history else {
                    self.ding();
                    return Step::Continue;
                };
                let browsing = self.histories.get_mut(kind).is_browsing();
                let entry = self.histories.get_mut(kind).previous().map(str::to_string);
                match entry {
                    Some(entry) => {
                        if !browsing {
                            *saved_input = Some(line.text());
                        }
                        line.set_text(&entry);
                    }
                    None => {
                        *note = Some("[Beginning of history]".to_string());
                        self.ding();
                    }
                }
            }
            k if k == Key::meta('n') || k == Key::DOWN => {
                let Some(kind) = history else {
                    self.ding();
                    return Step::Continue;
                };
                if !self.histories.get_mut(kind).is_browsing() {
                    *note = Some("[End of history]".to_string());
                    self.ding();
                    return Step::Continue;
                }
                let entry = self.histories.get_mut(kind).next().map(str::to_string);
                match entry {
                    Some(entry) => line.set_text(&entry),
                    None => line.set_text(saved_input.take().as_deref().unwrap_or("")),
                }
            }
            Key::TAB => match completion.as_mut() {
                Some(completion) => {
                    *note = self.complete_minibuffer(completion, line);
                }
                None => line.insert('\t'),
            },
            k if k == Key::ctrl('q') => {
                if let Ok(quoted) = self.read_key() {
                    if let Some(ch) = quoted_char(quoted) {
                        line.insert(ch);
                    }
                }
            }
            k => match k.as_char() {
                Some(ch) if !ch.is_control() => line.insert(ch),
                _ => self.ding(),
            },
        }
        Step::Continue
    }

    /// `TAB` による補完。表示する注記を返す。
    fn complete_minibuffer(&mut self, completion: &mut Completion, line: &mut LineEditor) -> Option<String> {
        let input = line.text();
        let (status, completed) = completion.complete(&input);
        let progressed = completed != input;
        line.set_text(&completed);
        match status {
            CompletionStatus::NotMatched => {
                self.ding();
                Some("[No match]".to_string())
            }
            CompletionStatus::Matched if completion.is_filename() && completed.ends_with('/') => None,
            CompletionStatus::Matched => Some("[Sole completion]".to_string()),
            CompletionStatus::MatchedNonUnique => Some("[Complete, but not unique]".to_string()),
            CompletionStatus::NonUniqueMatches if progressed => None,
            CompletionStatus::NonUniqueMatches => {
                Some(format!("{{{}}}", completion.matches().join(", ")))
            }
        }
    }

    fn ding(&mut self) {
        if self.var_enabled("ring-bell") {
            self.term.beep();
        }
    }

    /// `yes` か `no` を入力させる
    pub fn read_yesno(&mut self, prompt: &str) -> Result<bool, CommandError> {
        let full = format!("{}(yes or no) ", prompt);
        loop {
            let answer = self.read_string(&full, "", None, None)?;
            match answer.trim() {
                "yes" => return Ok(true),
                "no" => return Ok(false),
                _ => {
                    self.message("Please answer yes or no.");
                    self.ding();
                }
            }
        }
    }

    /// `y` か `n` の 1 キーで答えさせる
    pub fn read_yn(&mut self, prompt: &str) -> Result<bool, CommandError> {
        if let Some(arg) = self.lisp_args.pop_front() {
            return Ok(matches!(arg.as_str(), "y" | "yes" | "t"));
        }
        let full = format!("{}(y or n) ", prompt);
        loop {
            let key = self.read_char(&full)?;
            match key.as_char() {
                Some('y' | 'Y' | ' ') => return Ok(true),
                Some('n' | 'N') => return Ok(false),
                _ if key == Key::DEL => return Ok(false),
                _ => self.ding(),
            }
        }
    }

    /// プロンプトを出して 1 キー読む
    pub fn read_char(&mut self, prompt: &str) -> Result<Key, CommandError> {
        self.echo = Some(prompt.to_string());
        self.minibuffer_cursor = Some(prompt.width());
        let key = self.read_key_or_quit();
        self.minibuffer_cursor = None;
        key
    }

    /// 整数を読む
    pub fn read_number(&mut self, prompt: &str) -> Result<i64, CommandError> {
        let text = self.read_string(prompt, "", None, None)?;
        text.trim()
            .parse::<i64>()
            .map_err(|_| CommandError::InvalidArgument(text.trim().to_string()))
    }
}

/// `C-q` に続くキーが表す文字
fn quoted_char(key: Key) -> Option<char> {
    if key.is_ctrl() {
        return char::from_u32(key.base() & 0x1f);
    }
    key.as_char()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::test_support::editor_with_text;

    fn read_with(sequence: &str) -> (Editor, Result<String, CommandError>) {
        let mut editor = editor_with_text("");
        editor.feed_sequence(sequence).unwrap();
        let result = editor.read_string("Prompt: ", "", Some(HistoryKind::Commands), None);
        (editor, result)
    }

    #[test]
    fn line_editing_keys() {
        let (_, result) = read_with("a b c C-a x C-e DEL C-b C-d RET");
        assert_eq!(result.unwrap(), "xa");
    }

    #[test]
    fn kill_to_end_of_line() {
        let (_, result) = read_with("a b c C-b C-b C-k d RET");
        assert_eq!(result.unwrap(), "ad");
    }

    #[test]
    fn cancel_returns_quit() {
        let (editor, result) = read_with("a C-g");
        assert_eq!(result, Err(CommandError::Quit));
        assert_eq!(editor.minibuffer_cursor, None);
    }

    #[test]
    fn history_browsing_restores_input() {
        let mut editor = editor_with_text("");
        editor.histories.add(HistoryKind::Search, "old");
        editor.feed_sequence("n e w M-p M-n RET").unwrap();
        let text = editor.read_string("Search: ", "", Some(HistoryKind::Search), None).unwrap();
        assert_eq!(text, "new");

        editor.feed_sequence("M-p M-p RET").unwrap();
        let text = editor.read_string("Search: ", "", Some(HistoryKind::Search), None).unwrap();
        assert_eq!(text, "old");
    }

    #[test]
    fn tab_completes_common_prefix() {
        let mut editor = editor_with_text("");
        editor.feed_sequence("f o TAB RET").unwrap();
        let completion = Completion::new(["forward-word", "forward-char", "find-file"]);
        let text = editor.read_string("M-x ", "", None, Some(completion)).unwrap();
        assert_eq!(text, "forward-");
    }

    #[test]
    fn lisp_arguments_are_used_first() {
        let mut editor = editor_with_text("");
        editor.lisp_args.push_back("42".to_string());
        assert_eq!(editor.read_number("Goto line: "), Ok(42));
    }

    #[test]
    fn read_yn_accepts_y() {
        let mut editor = editor_with_text("");
        editor.feed_sequence("x y").unwrap();
        assert_eq!(editor.read_yn("Save? "), Ok(true));
    }

    #[test]
    fn invalid_number_is_rejected() {
        let mut editor = editor_with_text("");
        editor.feed_sequence("a b RET").unwrap();
        assert_eq!(
            editor.read_number("Number: "),
            Err(CommandError::InvalidArgument("ab".to_string()))
        );
    }
}
