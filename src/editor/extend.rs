//! `M-x` と Lisp 評価まわりのコマンド

use crate::alisp::{self, EvalError};
use crate::error::{CommandError, CommandResult};
use crate::file::expand_path;
use crate::input::{render_sequence, Key, Lookup};
use crate::minibuffer::{Completion, HistoryKind};

use super::Editor;

impl From<EvalError> for CommandError {
    fn from(error: EvalError) -> Self {
        CommandError::Message(error.to_string())
    }
}

impl Editor {
    pub(crate) fn execute_extended_command(&mut self, uniarg: Option<i32>) -> CommandResult {
        let prompt = match uniarg {
            Some(arg) => format!("{} M-x ", arg),
            None => "M-x ".to_string(),
        };
        let completion = Completion::new(self.function_names());
        let name = self.read_string(&prompt, "", Some(HistoryKind::Commands), Some(completion))?;
        let function = self
            .resolve_function(&name)
            .ok_or(CommandError::UndefinedFunction(name))?;
        log::debug!("M-x {}", function.name());
        self.execute_function(&function, uniarg)
    }

    pub(crate) fn set_variable_command(&mut self) -> CommandResult {
        let names: Vec<String> = self.vars.names().map(str::to_string).collect();
        let name = self.read_string(
            "Set variable: ",
            "",
            Some(HistoryKind::Commands),
            Some(Completion::new(names)),
        )?;
        if name.is_empty() {
            return Err(CommandError::Message("You did not specify a variable".to_string()));
        }
        let value = self.read_string(&format!("Set {} to value: ", name), "", Some(HistoryKind::Expressions), None)?;
        self.set_variable(&name, &value);
        Ok(())
    }

    pub(crate) fn eval_expression(&mut self) -> CommandResult {
        let source = self.read_string("Eval: ", "", Some(HistoryKind::Expressions), None)?;
        let value = alisp::eval_string(self, &source)?;
        self.message(value.to_string());
        Ok(())
    }

    pub(crate) fn eval_buffer(&mut self) -> CommandResult {
        let source = self.buffer().text();
        alisp::eval_string(self, &source)?;
        Ok(())
    }

    pub(crate) fn load_command(&mut self) -> CommandResult {
        let input = self.read_string("Load file: ", "", Some(HistoryKind::Files), Some(Completion::filename()))?;
        let path = expand_path(&input)?;
        self.message(format!("Loading {}...", path.display()));
        alisp::eval_file(self, &path)?;
        self.message(format!("Loading {}...done", path.display()));
        Ok(())
    }

    /// 接頭辞でないところまでキーを読む。Lisp からはキー列の文字列を受け取る。
    fn read_key_sequence(&mut self, prompt: &str) -> Result<Vec<Key>, CommandError> {
        if let Some(text) = self.lisp_args.pop_front() {
            return Key::parse_sequence(&text)
                .map_err(|error| CommandError::InvalidArgument(error.to_string()));
        }
        self.message(prompt);
        let mut keys = vec![self.read_key_or_quit()?];
        while matches!(self.keymap.lookup(&keys), Lookup::Prefix) {
            self.message(format!("{}{} -", prompt, render_sequence(&keys)));
            keys.push(self.read_key_or_quit()?);
        }
        Ok(keys)
    }

    pub(crate) fn global_set_key(&mut self) -> CommandResult {
        let keys = self.read_key_sequence("Set key globally: ")?;
        let shown = render_sequence(&keys);
        let function = self.read_function(&format!("Set key {} to command: ", shown))?;
        self.keymap
            .rebind(&keys, function.clone())
            .map_err(|error| CommandError::Message(error.to_string()))?;
        log::info!("bound {} to {}", shown, function.name());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::editor::test_support::editor_with_text;

    #[test]
    fn extended_command_runs_with_argument() {
        let mut editor = editor_with_text("abcdef");
        editor.feed_sequence("C-u 3 M-x f o r w a r d - c h a r RET").unwrap();
        editor.run_pending();
        assert_eq!(editor.point_offset(), 3);
    }

    #[test]
    fn extended_command_completes_names() {
        let mut editor = editor_with_text("abc");
        editor.feed_sequence("M-x e n d - o f - b u TAB RET").unwrap();
        editor.run_pending();
        assert_eq!(editor.point_offset(), 3);
    }

    #[test]
    fn unknown_extended_command() {
        let mut editor = editor_with_text("");
        editor.feed_sequence("M-x f r o b RET").unwrap();
        editor.run_pending();
        assert_eq!(editor.echo_text(), Some("Undefined function name `frob'"));
    }

    #[test]
    fn set_variable_updates_buffer_local_value() {
        let mut editor = editor_with_text("");
        editor
            .feed_sequence("M-x s e t - v a r i a b l e RET f i l l - c o l u m n RET 4 0 RET")
            .unwrap();
        editor.run_pending();
        assert_eq!(editor.fill_column(), 40);
    }

    #[test]
    fn eval_expression_shows_value() {
        let mut editor = editor_with_text("");
        editor.feed_sequence("M-: ( s e t q SPC t a b - w i d t h SPC 4 ) RET").unwrap();
        editor.run_pending();
        assert_eq!(editor.echo_text(), Some("4"));
        assert_eq!(editor.tab_width(), 4);
    }

    #[test]
    fn eval_expression_reports_reader_errors() {
        let mut editor = editor_with_text("");
        editor.feed_sequence("M-: ( p r o g n RET").unwrap();
        editor.run_pending();
        assert!(editor.echo_text().is_some_and(|text| !text.is_empty()));
        assert_eq!(editor.buffer().text(), "");
    }

    #[test]
    fn eval_buffer_runs_commands() {
        let mut editor = editor_with_text("(end-of-buffer)\n(insert \"!\")");
        editor.eval_buffer().unwrap();
        assert_eq!(editor.buffer().text(), "(end-of-buffer)\n(insert \"!\")!");
    }

    #[test]
    fn global_set_key_from_lisp() {
        let mut editor = editor_with_text("abc");
        crate::alisp::eval_string(&mut editor, "(global-set-key \"C-c f\" 'forward-char)").unwrap();
        editor.feed_sequence("C-c f C-c f").unwrap();
        editor.run_pending();
        assert_eq!(editor.point_offset(), 2);
    }

    #[test]
    fn global_set_key_interactively() {
        let mut editor = editor_with_text("abc");
        editor
            .feed_sequence("M-x g l o b a l - s e t - k e y RET C-t e n d - o f - l i n e RET C-t")
            .unwrap();
        editor.run_pending();
        assert_eq!(editor.point_offset(), 3);
    }
}
