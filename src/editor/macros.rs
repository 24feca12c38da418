//! キーボードマクロ
//!
//! マクロは実行したコマンドの列として記録する。各ステップはコマンド、
//! 前置引数、起動キー、コマンドがミニバッファなどで読んだキーを持つ。

use std::collections::HashMap;

use crate::error::{CommandError, CommandResult};
use crate::input::{Function, Key};

use super::Editor;

/// 名前付きマクロの入れ子の上限
const MAX_MACRO_DEPTH: usize = 16;

/// 記録された 1 コマンド
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroStep {
    pub function: Function,
    pub uniarg: Option<i32>,
    pub key: Option<Key>,
    /// コマンド実行中に読んだキー
    pub input: Vec<Key>,
}

pub type KeyboardMacro = Vec<MacroStep>;

/// 記録・再生の状態
#[derive(Debug, Default)]
pub struct MacroState {
    recording: Option<KeyboardMacro>,
    /// 記録中のステップが読んだキー
    capture: Option<Vec<Key>>,
    last: Option<KeyboardMacro>,
    named: HashMap<String, KeyboardMacro>,
    depth: usize,
    replaying: usize,
}

impl MacroState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_recording(&self) -> bool {
        self.recording.is_some()
    }

    pub fn is_replaying(&self) -> bool {
        self.replaying > 0
    }

    pub fn last(&self) -> Option<&KeyboardMacro> {
        self.last.as_ref()
    }

    pub fn named(&self, name: &str) -> Option<&KeyboardMacro> {
        self.named.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.named.keys().map(String::as_str)
    }

    pub(crate) fn begin_capture(&mut self) {
        if self.recording.is_some() {
            self.capture = Some(Vec::new());
        }
    }

    /// 読んだキーを記録する
    pub(crate) fn capture_key(&mut self, key: Key) {
        if let Some(capture) = self.capture.as_mut() {
            capture.push(key);
        }
    }

    /// ステップの記録を確定する
    pub(crate) fn end_capture(&mut self, function: Function, uniarg: Option<i32>, key: Option<Key>) {
        let input = self.capture.take().unwrap_or_default();
        if let Some(recording) = self.recording.as_mut() {
            recording.push(MacroStep {
                function,
                uniarg,
                key,
                input,
            });
        }
    }

    /// 記録を破棄する（コマンドの失敗時）
    pub(crate) fn cancel(&mut self) {
        if self.recording.take().is_some() {
            log::debug!("keyboard macro recording cancelled");
        }
        self.capture = None;
    }
}

impl Editor {
    pub fn macro_state(&self) -> &MacroState {
        &self.macros
    }

    pub(crate) fn start_kbd_macro(&mut self) -> CommandResult {
        if self.macros.is_recording() {
            return Err(CommandError::Message(
                "Already defining keyboard macro".to_string(),
            ));
        }
        self.macros.recording = Some(Vec::new());
        self.message("Defining keyboard macro...");
        Ok(())
    }

    pub(crate) fn end_kbd_macro(&mut self) -> CommandResult {
        let recorded = self
            .macros
            .recording
            .take()
            .ok_or_else(|| CommandError::Message("Not defining kbd macro".to_string()))?;
        log::debug!("keyboard macro defined with {} steps", recorded.len());
        self.macros.last = Some(recorded);
        self.message("Keyboard macro defined");
        Ok(())
    }

    pub(crate) fn call_last_kbd_macro(&mut self, count: i32) -> CommandResult {
        if self.macros.is_recording() {
            return Err(CommandError::Message(
                "Can't execute anonymous macro while defining one".to_string(),
            ));
        }
        let steps = self
            .macros
            .last
            .clone()
            .ok_or_else(|| CommandError::Message("No kbd macro has been defined".to_string()))?;
        for _ in 0..count.max(1) {
            self.replay_macro(&steps)?;
        }
        Ok(())
    }

    pub(crate) fn name_last_kbd_macro(&mut self) -> CommandResult {
        let steps = self
            .macros
            .last
            .clone()
            .ok_or_else(|| CommandError::Message("No kbd macro has been defined".to_string()))?;
        let name = self.read_string("Name for last kbd macro: ", "", None, None)?;
        if name.is_empty() {
            return Err(CommandError::Message("No command name given".to_string()));
        }
        if crate::input::Command::from_name(&name).is_some() {
            return Err(CommandError::Message(format!(
                "`{}' is already defined as a command",
                name
            )));
        }
        self.macros.named.insert(name, steps);
        Ok(())
    }

    /// 名前付きマクロを実行する
    pub(crate) fn call_named_macro(&mut self, name: &str, count: i32) -> CommandResult {
        let steps = self
            .macros
            .named(name)
            .cloned()
            .ok_or_else(|| CommandError::UndefinedFunction(name.to_string()))?;
        if self.macros.depth >= MAX_MACRO_DEPTH {
            return Err(CommandError::Message(format!(
                "Keyboard macro `{}' nested too deeply",
                name
            )));
        }
        self.macros.depth += 1;
        let mut result = Ok(());
        for _ in 0..count.max(1) {
            result = self.replay_macro(&steps);
            if result.is_err() {
                break;
            }
        }
        self.macros.depth -= 1;
        result
    }

    /// ステップごとに記録した入力を供給しながら実行する
    fn replay_macro(&mut self, steps: &[MacroStep]) -> CommandResult {
        let saved = std::mem::take(&mut self.replay_input);
        self.macros.replaying += 1;
        let mut result = Ok(());
        for step in steps {
            self.replay_input = step.input.iter().copied().collect();
            self.last_key = step.key;
            result = self.execute_function(&step.function, step.uniarg);
            if result.is_err() {
                break;
            }
        }
        self.macros.replaying -= 1;
        self.replay_input = saved;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Command;

    #[test]
    fn capture_is_attached_to_step() {
        let mut state = MacroState::new();
        state.recording = Some(Vec::new());
        state.begin_capture();
        state.capture_key(Key::from_char('a'));
        state.end_capture(Function::Command(Command::SwitchToBuffer), None, Some(Key::ctrl('b')));
        let steps = state.recording.as_ref().unwrap();
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].input, vec![Key::from_char('a')]);
    }

    #[test]
    fn cancel_drops_recording() {
        let mut state = MacroState::new();
        state.recording = Some(Vec::new());
        state.cancel();
        assert!(!state.is_recording());
        assert!(state.last().is_none());
    }
}
