//! コマンドループ
//!
//! キーを読み、キーマップを辿ってコマンドを決め、前置引数と
//! アンドゥのグループ化を施して実行する。

use std::time::Duration;

use crate::alisp::Expr;
use crate::error::{CommandError, CommandResult};
use crate::input::{render_sequence, Command, Function, Key, Lookup};

use super::{CommandFlags, Editor};

/// 入力待ちの間隔。待つたびに再表示して端末サイズの変化を拾う。
const KEY_TIMEOUT: Duration = Duration::from_millis(500);

/// キーマップ探索の結果（キーマップへの借用を持たない形）
enum Resolved {
    Bound(Function),
    Prefix,
    Undefined,
}

impl Editor {
    /// 終了が要求されるか入力が尽きるまでコマンドを実行する
    pub fn run(&mut self) {
        log::info!("command loop started");
        while !self.is_quit_requested() {
            self.redisplay();
            if self.pending_input.is_empty() && self.term.input_exhausted() {
                log::info!("input exhausted");
                break;
            }
            match self.read_key() {
                Ok(key) => self.process_key(key),
                Err(_) => break,
            }
        }
        log::info!("command loop finished");
    }

    /// テスト・バッチ用にキーを入力キューへ積む
    pub fn feed_keys(&mut self, keys: impl IntoIterator<Item = Key>) {
        self.pending_input.extend(keys);
    }

    /// `C-x C-f` 形式のキー列を積む
    pub fn feed_sequence(&mut self, sequence: &str) -> Result<(), crate::input::KeyParseError> {
        let keys = Key::parse_sequence(sequence)?;
        self.feed_keys(keys);
        Ok(())
    }

    /// 積まれたキーを全て処理する
    pub fn run_pending(&mut self) {
        while !self.is_quit_requested() && !self.pending_input.is_empty() {
            match self.read_key() {
                Ok(key) => self.process_key(key),
                Err(_) => break,
            }
        }
    }

    /// 先頭キーから 1 コマンドを読んで実行する
    pub fn process_key(&mut self, first: Key) {
        self.clear_message();
        let result = match self.read_command(first) {
            Ok((function, uniarg, key)) => self.run_interactive(function, uniarg, key),
            Err(error) => Err(error),
        };
        if let Err(error) = result {
            self.macros.cancel();
            self.report_error(&error);
        }
    }

    /// マクロ記録を挟んで実行する
    fn run_interactive(&mut self, function: Function, uniarg: Option<i32>, key: Key) -> CommandResult {
        self.last_key = Some(key);
        let recordable = self.macros.is_recording()
            && !matches!(
                function,
                Function::Command(Command::StartKbdMacro | Command::EndKbdMacro)
            );
        if recordable {
            self.macros.begin_capture();
        }
        self.execute_function(&function, uniarg)?;
        if recordable {
            self.macros.end_capture(function, uniarg, Some(key));
        }
        Ok(())
    }

    // ---- キー入力 ----

    /// キーを 1 つ読む。`ESC` に続くキーは Meta 付きにまとめる。
    pub(crate) fn read_key(&mut self) -> Result<Key, CommandError> {
        let mut key = self.next_raw_key()?;
        if key == Key::ESC {
            key = self.next_raw_key()?.with_meta();
        }
        self.macros.capture_key(key);
        Ok(key)
    }

    /// キーを読み、`C-g` なら中断する
    pub(crate) fn read_key_or_quit(&mut self) -> Result<Key, CommandError> {
        let key = self.read_key()?;
        if key == Key::ctrl('g') {
            return Err(CommandError::Quit);
        }
        Ok(key)
    }

    fn next_raw_key(&mut self) -> Result<Key, CommandError> {
        if let Some(key) = self.replay_input.pop_front() {
            return Ok(key);
        }
        if let Some(key) = self.pending_input.pop_front() {
            return Ok(key);
        }
        self.wait_for_key()
    }

    fn wait_for_key(&mut self) -> Result<Key, CommandError> {
        loop {
            if let Some(key) = self.term.get_key(Some(KEY_TIMEOUT)) {
                return Ok(key);
            }
            if self.term.input_exhausted() {
                return Err(CommandError::Quit);
            }
            self.redisplay();
        }
    }

    /// 読んだキーを戻す。次の `read_key` で最初に返る。
    pub(crate) fn unget_key(&mut self, key: Key) {
        if self.macros.is_replaying() {
            self.replay_input.push_front(key);
        } else {
            self.pending_input.push_front(key);
        }
    }

    /// キー列をキーマップで解決する
    fn read_command(&mut self, first: Key) -> Result<(Function, Option<i32>, Key), CommandError> {
        let mut uniarg = None;
        let mut keys = vec![first];
        // ESC に続く数字と `-` は前置引数の始まり
        if let Some((digits, negative)) = meta_argument_start(first) {
            let (value, next) = self.read_universal_argument(digits, negative)?;
            uniarg = Some(value);
            keys = vec![next];
        }
        loop {
            let resolved = match self.keymap.lookup(&keys) {
                Lookup::Bound(function) => Resolved::Bound(function.clone()),
                Lookup::Prefix => Resolved::Prefix,
                Lookup::Undefined => Resolved::Undefined,
            };
            let last = keys[keys.len() - 1];
            match resolved {
                Resolved::Bound(Function::Command(Command::UniversalArgument)) if uniarg.is_none() => {
                    let (value, next) = self.read_universal_argument(None, false)?;
                    uniarg = Some(value);
                    keys = vec![next];
                }
                Resolved::Bound(function) => return Ok((function, uniarg, last)),
                Resolved::Prefix => {
                    self.message(format!("{} -", render_sequence(&keys)));
                    keys.push(self.read_key()?);
                }
                Resolved::Undefined => {
                    if keys.len() == 1 && last.is_self_inserting() {
                        return Ok((Function::Command(Command::SelfInsertCommand), uniarg, last));
                    }
                    return Err(CommandError::UndefinedKey(render_sequence(&keys)));
                }
            }
        }
    }

    /// `C-u` に続く数字・`-`・`C-u` を読み、引数と次のキーを返す。
    /// `digits` と `negative` は `ESC` 数字で始めた時の入力済みの分。
    fn read_universal_argument(
        &mut self,
        mut digits: Option<i32>,
        mut negative: bool,
    ) -> Result<(i32, Key), CommandError> {
        let mut multiplier: i32 = 4;
        loop {
            let shown = match digits {
                Some(value) => value.to_string(),
                None if negative => String::new(),
                None => multiplier.to_string(),
            };
            self.message(format!("C-u {}{}-", if negative { "-" } else { "" }, shown));
            let key = self.read_key_or_quit()?;
            if key == Key::ctrl('u') && digits.is_none() && !negative {
                multiplier = multiplier.saturating_mul(4);
                continue;
            }
            if let Some(digit) = key.digit() {
                let value = digits.unwrap_or(0).saturating_mul(10).saturating_add(digit as i32);
                digits = Some(value);
                continue;
            }
            if key.without_meta() == Key::from_char('-') && digits.is_none() && !negative {
                negative = true;
                continue;
            }
            let value = match digits {
                Some(value) => value,
                None if negative => 1,
                None => multiplier,
            };
            self.clear_message();
            return Ok((if negative { -value } else { value }, key));
        }
    }

    // ---- 実行 ----

    /// コマンドまたは名前付きマクロを実行する
    pub(crate) fn execute_function(&mut self, function: &Function, uniarg: Option<i32>) -> CommandResult {
        match function {
            Function::Command(command) => self.execute_command(*command, uniarg),
            Function::Macro(name) => self.call_named_macro(name, uniarg.unwrap_or(1)),
        }
    }

    /// アンドゥのグループで囲んでコマンドを実行する
    pub(crate) fn execute_command(&mut self, command: Command, uniarg: Option<i32>) -> CommandResult {
        log::trace!("execute {} {:?}", command.name(), uniarg);
        self.this_flags = CommandFlags::default();
        let buffer_id = self.current_buffer_id();
        let grouped = command != Command::Undo;
        if grouped {
            if let Some(buffer) = self.buffer_by_id_mut(buffer_id) {
                buffer.undo_start_sequence();
            }
        }
        let result = self.run_command(command, uniarg);
        if grouped {
            if let Some(buffer) = self.buffer_by_id_mut(buffer_id) {
                buffer.undo_end_sequence();
            }
        }
        self.this_flags.vertical = command.is_vertical_motion();
        self.last_flags = self.this_flags;
        result
    }

    fn run_command(&mut self, command: Command, uniarg: Option<i32>) -> CommandResult {
        let arg = uniarg.unwrap_or(1);
        match command {
            // 移動
            Command::ForwardChar => self.forward_char(arg),
            Command::BackwardChar => self.forward_char(-arg),
            Command::NextLine => self.next_line(arg),
            Command::PreviousLine => self.next_line(-arg),
            Command::BeginningOfLine => self.beginning_of_line(),
            Command::EndOfLine => self.end_of_line(),
            Command::ForwardWord => self.forward_word(arg),
            Command::BackwardWord => self.forward_word(-arg),
            Command::BeginningOfBuffer => self.beginning_of_buffer(),
            Command::EndOfBuffer => self.end_of_buffer(),
            Command::ScrollUp => self.scroll_up(),
            Command::ScrollDown => self.scroll_down(),
            Command::GotoLine => self.goto_line(uniarg),
            Command::GotoChar => self.goto_char(uniarg),
            Command::ForwardParagraph => self.forward_paragraph(arg),
            Command::BackwardParagraph => self.forward_paragraph(-arg),
            Command::ForwardSexp => self.forward_sexp(arg),
            Command::BackwardSexp => self.forward_sexp(-arg),
            Command::BackToIndentation => self.back_to_indentation(),
            Command::Recenter => self.recenter(),
            // 編集
            Command::SelfInsertCommand => self.self_insert(arg),
            Command::Newline => self.newline(arg),
            Command::OpenLine => self.open_line(arg),
            Command::NewlineAndIndent => self.newline_and_indent(),
            Command::DeleteChar => self.delete_char(arg),
            Command::BackwardDeleteChar => self.delete_char(-arg),
            Command::DeleteHorizontalSpace => self.delete_horizontal_space(),
            Command::JustOneSpace => self.just_one_space(),
            Command::DeleteBlankLines => self.delete_blank_lines(),
            Command::IndentForTabCommand => self.indent_for_tab(),
            Command::TabToTabStop => self.tab_to_tab_stop(),
            Command::QuotedInsert => self.quoted_insert(arg),
            Command::Insert => self.insert_command(),
            Command::TransposeChars => self.transpose_chars(),
            Command::TransposeWords => self.transpose_words(),
            Command::TransposeLines => self.transpose_lines(),
            Command::TransposeSexps => self.transpose_sexps(),
            Command::UpcaseWord => self.change_word_case(arg, CaseChange::Upcase),
            Command::DowncaseWord => self.change_word_case(arg, CaseChange::Downcase),
            Command::CapitalizeWord => self.change_word_case(arg, CaseChange::Capitalize),
            Command::UpcaseRegion => self.change_region_case(CaseChange::Upcase),
            Command::DowncaseRegion => self.change_region_case(CaseChange::Downcase),
            Command::FillParagraph => self.fill_paragraph(),
            Command::SetFillColumn => self.set_fill_column(uniarg),
            Command::AutoFillMode => self.auto_fill_mode(),
            Command::OverwriteMode => self.overwrite_mode(),
            Command::Undo => self.undo(),
            // キル
            Command::KillLine => self.kill_line(uniarg),
            Command::KillRegion => self.kill_region(),
            Command::CopyRegionAsKill => self.copy_region_as_kill(),
            Command::KillWord => self.kill_word(arg),
            Command::BackwardKillWord => self.kill_word(-arg),
            Command::KillSexp => self.kill_sexp(arg),
            Command::Yank => self.yank(),
            // マーク
            Command::SetMarkCommand => self.set_mark_command(uniarg),
            Command::ExchangePointAndMark => self.exchange_point_and_mark(),
            Command::MarkWholeBuffer => self.mark_whole_buffer(),
            Command::MarkWord => self.mark_word(arg),
            Command::MarkParagraph => self.mark_paragraph(),
            Command::MarkSexp => self.mark_sexp(arg),
            // 検索
            Command::IsearchForward => self.isearch(true, false),
            Command::IsearchBackward => self.isearch(false, false),
            Command::IsearchForwardRegexp => self.isearch(true, true),
            Command::IsearchBackwardRegexp => self.isearch(false, true),
            Command::SearchForward => self.search_command(true, false),
            Command::SearchBackward => self.search_command(false, false),
            Command::SearchForwardRegexp => self.search_command(true, true),
            Command::SearchBackwardRegexp => self.search_command(false, true),
            Command::ReplaceString => self.replace_string(),
            Command::QueryReplace => self.query_replace(),
            // ファイル
            Command::FindFile => self.find_file(false),
            Command::FindFileReadOnly => self.find_file(true),
            Command::FindAlternateFile => self.find_alternate_file(),
            Command::InsertFile => self.insert_file(),
            Command::SaveBuffer => self.save_buffer(),
            Command::WriteFile => self.write_file(),
            Command::SaveSomeBuffers => self.save_some_buffers(),
            Command::SaveBuffersKillEmacs => self.save_buffers_kill_emacs(),
            // バッファ
            Command::SwitchToBuffer => self.switch_to_buffer(),
            Command::KillBuffer => self.kill_buffer_command(),
            Command::ListBuffers => self.list_buffers(),
            Command::ToggleReadOnly => self.toggle_read_only(),
            Command::RenameBuffer => self.rename_buffer(),
            // ウィンドウ
            Command::SplitWindow => self.split_window(),
            Command::DeleteWindow => self.delete_window(),
            Command::DeleteOtherWindows => self.delete_other_windows(),
            Command::OtherWindow => self.other_window(arg),
            Command::EnlargeWindow => self.enlarge_window(arg),
            Command::ShrinkWindow => self.shrink_window(arg),
            // マクロ
            Command::StartKbdMacro => self.start_kbd_macro(),
            Command::EndKbdMacro => self.end_kbd_macro(),
            Command::CallLastKbdMacro => self.call_last_kbd_macro(arg),
            Command::NameLastKbdMacro => self.name_last_kbd_macro(),
            // ヘルプ
            Command::DescribeBindings => self.describe_bindings(),
            Command::WhereIs => self.where_is(),
            Command::DescribeFunction => self.describe_function(),
            Command::DescribeVariable => self.describe_variable(),
            Command::DescribeKey => self.describe_key(),
            Command::WhatCursorPosition => self.what_cursor_position(),
            // その他
            Command::ExecuteExtendedCommand => self.execute_extended_command(uniarg),
            Command::KeyboardQuit => Err(CommandError::Quit),
            Command::UniversalArgument => Ok(()),
            Command::SetVariable => self.set_variable_command(),
            Command::EvalExpression => self.eval_expression(),
            Command::EvalBuffer => self.eval_buffer(),
            Command::Load => self.load_command(),
            Command::GlobalSetKey => self.global_set_key(),
            Command::SuspendEmacs => self.suspend(),
        }
    }

    fn suspend(&mut self) -> CommandResult {
        self.term
            .suspend()
            .map_err(|error| CommandError::Message(format!("Cannot suspend: {}", error)))
    }

    // ---- Lisp との接続 ----

    /// 名前でコマンドを実行する（コマンド行の `-f`）
    pub fn call_function_by_name(&mut self, name: &str) -> CommandResult {
        let function = self
            .resolve_function(name)
            .ok_or_else(|| CommandError::UndefinedFunction(name.to_string()))?;
        self.execute_function(&function, None)
    }

    /// 名前からコマンドまたは名前付きマクロを引く
    pub fn resolve_function(&self, name: &str) -> Option<Function> {
        if let Some(command) = Command::from_name(name) {
            return Some(Function::Command(command));
        }
        self.macros
            .named(name)
            .map(|_| Function::Macro(name.to_string()))
    }

    /// Lisp から関数を呼ぶ。成功したかを返す。
    ///
    /// 引数を読むコマンドには引数を入力として渡し、それ以外は
    /// 先頭の整数を前置引数として扱う。
    pub(crate) fn call_from_lisp(&mut self, function: &Function, args: &[Expr]) -> bool {
        let mut uniarg = None;
        match function {
            Function::Command(command) if command.reads_arguments() => {
                self.lisp_args = args.iter().map(Expr::to_value_string).collect();
            }
            _ => {
                if let Some(Expr::Integer(value)) = args.first() {
                    uniarg = i32::try_from(*value).ok();
                }
            }
        }
        let result = self.execute_function(function, uniarg);
        self.lisp_args.clear();
        match result {
            Ok(()) => true,
            Err(error) => {
                log::debug!("{} failed: {}", function.name(), error);
                self.report_error(&error);
                false
            }
        }
    }
}

/// 大文字小文字の変換方法
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CaseChange {
    Upcase,
    Downcase,
    Capitalize,
}

/// Meta 付きの数字か `-` なら、前置引数の初期状態を返す
fn meta_argument_start(key: Key) -> Option<(Option<i32>, bool)> {
    if !key.is_meta() || key.is_ctrl() {
        return None;
    }
    if let Some(digit) = key.digit() {
        return Some((Some(digit as i32), false));
    }
    (key.without_meta() == Key::from_char('-')).then_some((None, true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::test_support::editor_with_text;

    #[test]
    fn self_insert_with_universal_argument() {
        let mut editor = editor_with_text("");
        editor.feed_sequence("C-u 3 a").unwrap();
        editor.run_pending();
        assert_eq!(editor.buffer().text(), "aaa");
    }

    #[test]
    fn repeated_universal_argument_multiplies() {
        let mut editor = editor_with_text("");
        editor.feed_sequence("C-u C-u x").unwrap();
        editor.run_pending();
        assert_eq!(editor.buffer().text(), "x".repeat(16));
    }

    #[test]
    fn undefined_key_is_reported() {
        let mut editor = editor_with_text("");
        editor.feed_sequence("C-x C-z").unwrap();
        editor.run_pending();
        assert_eq!(editor.echo_text(), Some("C-x C-z is undefined"));
    }

    #[test]
    fn escape_prefix_is_meta() {
        let mut editor = editor_with_text("one two");
        editor.feed_sequence("ESC f").unwrap();
        editor.run_pending();
        assert_eq!(editor.buffer().pt().o, 3);
    }

    #[test]
    fn escape_digit_starts_argument() {
        let mut editor = editor_with_text("");
        editor.feed_sequence("ESC 3 a").unwrap();
        editor.run_pending();
        assert_eq!(editor.buffer().text(), "aaa");

        editor.feed_sequence("ESC 1 2 b").unwrap();
        editor.run_pending();
        assert_eq!(editor.buffer().text(), format!("aaa{}", "b".repeat(12)));
    }

    #[test]
    fn escape_minus_is_negative_argument() {
        let mut editor = editor_with_text("one two three");
        editor.feed_sequence("M-> ESC - 2 M-f").unwrap();
        editor.run_pending();
        assert_eq!(editor.buffer().pt().o, 4);

        editor.feed_sequence("M-> ESC - M-f").unwrap();
        editor.run_pending();
        assert_eq!(editor.buffer().pt().o, 8);
    }

    #[test]
    fn lone_escape_waits_for_next_key() {
        let mut editor = editor_with_text("abc");
        editor.feed_sequence("ESC").unwrap();
        editor.run_pending();
        assert_eq!(editor.buffer().text(), "abc");
        assert_ne!(editor.echo_text(), Some("ESC is undefined"));
    }

    #[test]
    fn undo_reverts_one_command() {
        let mut editor = editor_with_text("");
        editor.feed_sequence("a b C-u 2 c C-_").unwrap();
        editor.run_pending();
        assert_eq!(editor.buffer().text(), "ab");
    }

    #[test]
    fn keyboard_quit_reports_quit() {
        let mut editor = editor_with_text("");
        editor.feed_sequence("C-g").unwrap();
        editor.run_pending();
        assert_eq!(editor.echo_text(), Some("Quit"));
    }
}
