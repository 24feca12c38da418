//! ヘルプ系のコマンド

use crate::error::{CommandError, CommandResult};
use crate::input::{command_names, render_sequence, Command, Function, Lookup};
use crate::minibuffer::{Completion, HistoryKind};
use crate::variables::VarTable;

use super::Editor;

const HELP_BUFFER_NAME: &str = "*Help*";

/// エコー領域用の文字表記。制御文字は `C-j` のように出す。
fn describe_char(ch: char) -> String {
    match ch as u32 {
        code @ 0..=0x1f => format!("C-{}", char::from(code as u8 + b'`')),
        0x7f => "^?".to_string(),
        _ => ch.to_string(),
    }
}

impl Editor {
    /// `*Help*` バッファに内容を出して別ウィンドウに表示する
    fn show_help(&mut self, lines: Vec<String>) -> CommandResult {
        let id = match self.find_buffer(HELP_BUFFER_NAME) {
            Some(id) => id,
            None => self.create_buffer(HELP_BUFFER_NAME),
        };
        if let Some(buffer) = self.buffer_by_id_mut(id) {
            buffer.flags.temporary = true;
            buffer.flags.need_name = false;
            buffer.set_lines(lines);
            buffer.flags.readonly = true;
            buffer.flags.no_undo = true;
        }
        self.popup_buffer(id)
    }

    pub(crate) fn function_names(&self) -> Vec<String> {
        command_names()
            .map(str::to_string)
            .chain(self.macros.names().map(str::to_string))
            .collect()
    }

    pub(crate) fn read_function(&mut self, prompt: &str) -> Result<Function, CommandError> {
        let completion = Completion::new(self.function_names());
        let name = self.read_string(prompt, "", Some(HistoryKind::Commands), Some(completion))?;
        self.resolve_function(&name)
            .ok_or(CommandError::UndefinedFunction(name))
    }

    pub(crate) fn describe_bindings(&mut self) -> CommandResult {
        let mut lines = vec![
            format!("{:<20}{}", "key", "binding"),
            format!("{:<20}{}", "---", "-------"),
        ];
        self.keymap.walk(|keys, function| {
            lines.push(format!("{:<20}{}", keys, function.name()));
        });
        lines.push(String::new());
        self.show_help(lines)
    }

    pub(crate) fn where_is(&mut self) -> CommandResult {
        let function = self.read_function("Where is command: ")?;
        let keys = self.keymap.where_is(&function);
        if keys.is_empty() {
            self.message(format!("{} is not on any key", function.name()));
        } else {
            self.message(format!("{} is on {}", function.name(), keys.join(", ")));
        }
        Ok(())
    }

    pub(crate) fn describe_function(&mut self) -> CommandResult {
        let function = self.read_function("Describe function: ")?;
        let keys = self.keymap.where_is(&function);
        let mut lines = match &function {
            Function::Command(command) => vec![format!(
                "{} is an interactive built-in function.",
                command.name()
            )],
            Function::Macro(name) => vec![format!("{} is a keyboard macro.", name)],
        };
        lines.push(String::new());
        if !keys.is_empty() {
            lines.push(format!("It is bound to {}.", keys.join(", ")));
            lines.push(String::new());
        }
        if let Function::Command(command) = function {
            lines.push(command.doc().to_string());
        }
        self.show_help(lines)
    }

    pub(crate) fn describe_variable(&mut self) -> CommandResult {
        let names: Vec<String> = self.vars.names().map(str::to_string).collect();
        let name = self.read_string(
            "Describe variable: ",
            "",
            Some(HistoryKind::Commands),
            Some(Completion::new(names)),
        )?;
        let value = self
            .variable_value(&name)
            .map(str::to_string)
            .ok_or_else(|| CommandError::Message(format!("Symbol's value as variable is void: {}", name)))?;

        let mut lines = vec![format!("{}'s value is {}", name, value)];
        if self.buffer().local_var(&name).is_some() {
            lines.push(format!("Local in buffer {}", self.buffer().name()));
        }
        if let Some(spec) = VarTable::spec(&name) {
            lines.push(String::new());
            lines.push(spec.doc.to_string());
        }
        self.show_help(lines)
    }

    /// キー列を 1 つ読んで割り当てを表示する
    pub(crate) fn describe_key(&mut self) -> CommandResult {
        self.message("Describe key: ");
        let mut keys = vec![self.read_key()?];
        loop {
            let shown = render_sequence(&keys);
            // `None` は接頭辞
            let bound = match self.keymap.lookup(&keys) {
                Lookup::Bound(function) => Some(Some(function.name().to_string())),
                Lookup::Prefix => None,
                Lookup::Undefined if keys.len() == 1 && keys[0].is_self_inserting() => {
                    Some(Some(Command::SelfInsertCommand.name().to_string()))
                }
                Lookup::Undefined => Some(None),
            };
            let Some(name) = bound else {
                self.message(format!("Describe key: {} -", shown));
                keys.push(self.read_key()?);
                continue;
            };
            match name {
                Some(name) => self.message(format!("{} runs the command {}", shown, name)),
                None => self.message(format!("{} is undefined", shown)),
            }
            return Ok(());
        }
    }

    /// `C-x =` の表示
    pub(crate) fn what_cursor_position(&mut self) -> CommandResult {
        let tab_width = self.tab_width();
        let buffer = self.buffer();
        let offset = buffer.point_to_offset(buffer.pt());
        let total = buffer.len_chars();
        let column = buffer.current_column(tab_width);
        let percent = if total == 0 {
            0
        } else {
            (offset as f64 * 100.0 / total as f64).round() as usize
        };
        let position = format!(
            "point={} of {} ({}%) column={}",
            offset + 1,
            total + 1,
            percent,
            column
        );
        let text = match buffer.following_char() {
            Some(ch) => {
                let code = ch as u32;
                format!(
                    "Char: {} ({}, #o{:o}, #x{:x}) {}",
                    describe_char(ch),
                    code,
                    code,
                    code,
                    position
                )
            }
            None => position,
        };
        self.message(text);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::test_support::editor_with_text;

    #[test]
    fn control_chars_are_named() {
        assert_eq!(describe_char('\n'), "C-j");
        assert_eq!(describe_char('a'), "a");
        assert_eq!(describe_char('\u{7f}'), "^?");
    }

    #[test]
    fn where_is_lists_keys() {
        let mut editor = editor_with_text("");
        editor.feed_sequence("C-h w s a v e - b u f f e r RET").unwrap();
        editor.run_pending();
        assert_eq!(editor.echo_text(), Some("save-buffer is on C-x C-s"));
    }

    #[test]
    fn where_is_unbound_command() {
        let mut editor = editor_with_text("");
        editor.feed_sequence("C-h w e v a l - b u f f e r RET").unwrap();
        editor.run_pending();
        assert_eq!(editor.echo_text(), Some("eval-buffer is not on any key"));
    }

    #[test]
    fn where_is_unknown_function() {
        let mut editor = editor_with_text("");
        editor.feed_sequence("C-h w n o p e RET").unwrap();
        editor.run_pending();
        assert_eq!(editor.echo_text(), Some("Undefined function name `nope'"));
    }

    #[test]
    fn describe_key_follows_prefixes() {
        let mut editor = editor_with_text("");
        editor.feed_sequence("C-h k C-x C-s").unwrap();
        editor.run_pending();
        assert_eq!(editor.echo_text(), Some("C-x C-s runs the command save-buffer"));

        editor.feed_sequence("C-h k a").unwrap();
        editor.run_pending();
        assert_eq!(editor.echo_text(), Some("a runs the command self-insert-command"));
    }

    #[test]
    fn describe_bindings_fills_help_buffer() {
        let mut editor = editor_with_text("");
        editor.feed_sequence("C-h b").unwrap();
        editor.run_pending();
        let id = editor.find_buffer("*Help*").unwrap();
        let text = editor.buffer_by_id(id).unwrap().text();
        assert!(text.contains("C-x C-f"));
        assert!(text.contains("find-file"));
    }

    #[test]
    fn describe_variable_shows_value_and_doc() {
        let mut editor = editor_with_text("");
        editor.feed_sequence("C-h v f i l l - c o l u m n RET").unwrap();
        editor.run_pending();
        let id = editor.find_buffer("*Help*").unwrap();
        let text = editor.buffer_by_id(id).unwrap().text();
        assert!(text.starts_with("fill-column's value is 70"));
        assert!(text.contains("line-wrapping"));
    }

    #[test]
    fn cursor_position_report() {
        let mut editor = editor_with_text("abc\nde");
        editor.feed_sequence("C-f C-x =").unwrap();
        editor.run_pending();
        assert_eq!(
            editor.echo_text(),
            Some("Char: b (98, #o142, #x62) point=2 of 7 (17%) column=1")
        );
    }

    #[test]
    fn cursor_position_at_end_of_buffer() {
        let mut editor = editor_with_text("ab");
        editor.feed_sequence("M-> C-x =").unwrap();
        editor.run_pending();
        assert_eq!(editor.echo_text(), Some("point=3 of 3 (100%) column=2"));
    }
}
