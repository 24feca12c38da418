//! エディタモジュール
//!
//! バッファ一覧・ウィンドウ・キーマップ・端末をまとめた `Editor` と、
//! その上に組み立てた編集コマンド群。

mod buffers;
mod dispatch;
mod editing;
mod extend;
mod help;
pub mod kill_buffer;
mod killing;
pub mod macros;
mod motion;
mod transpose;
pub mod windows;

use std::collections::VecDeque;
use std::path::PathBuf;

use crate::buffer::{Buffer, BufferId};
use crate::error::{CommandError, ErrorDisplay, Result};
use crate::input::{default_keymap, Function, Key, Keymap};
use crate::minibuffer::history::Histories;
use crate::term::Terminal;
use crate::variables::VarTable;

pub use kill_buffer::KillBuffer;
pub use macros::{KeyboardMacro, MacroState, MacroStep};
pub use windows::Window;

/// 直前・現在のコマンドの性質
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommandFlags {
    /// キル系コマンド（キルバッファへ追記する）
    pub kill: bool,
    /// 縦移動（目標桁を引き継ぐ）
    pub vertical: bool,
    /// アンドゥ（連続アンドゥでさらに遡る）
    pub undo: bool,
}

/// エディタ全体の状態
pub struct Editor {
    /// 最近選択した順
    pub(crate) buffers: Vec<Buffer>,
    next_buffer_id: BufferId,
    pub(crate) windows: Vec<Window>,
    pub(crate) current_window: usize,
    pub(crate) kill_buffer: KillBuffer,
    pub(crate) vars: VarTable,
    pub(crate) keymap: Keymap<Function>,
    pub(crate) term: Box<dyn Terminal>,
    pub(crate) this_flags: CommandFlags,
    pub(crate) last_flags: CommandFlags,
    /// コマンドを起動した最後のキー
    pub(crate) last_key: Option<Key>,
    /// Lisp から渡された引数。ミニバッファより先に消費される。
    pub(crate) lisp_args: VecDeque<String>,
    /// マクロ再生中のステップが消費する入力
    pub(crate) replay_input: VecDeque<Key>,
    /// 端末より先に読まれるキー（戻したキーと `feed_keys` の入力）
    pub(crate) pending_input: VecDeque<Key>,
    pub(crate) macros: MacroState,
    pub(crate) echo: Option<String>,
    /// ミニバッファ入力中のカーソル桁
    pub(crate) minibuffer_cursor: Option<usize>,
    pub(crate) histories: Histories,
    pub(crate) last_search: Option<String>,
    /// 起動スクリプト評価中は変数をグローバルに設定する
    pub(crate) loading_init: bool,
    quit_requested: bool,
}

impl Editor {
    /// `*scratch*` バッファと 1 つのウィンドウで起動する
    pub fn new(term: Box<dyn Terminal>) -> Result<Self> {
        let keymap = default_keymap()?;
        let (_, height) = term.size();
        let mut scratch = Buffer::new(0, "*scratch*");
        scratch.set_filename(None);
        let window = Window::new(0, height.saturating_sub(1).max(2));
        log::info!("editor created");
        Ok(Self {
            buffers: vec![scratch],
            next_buffer_id: 1,
            windows: vec![window],
            current_window: 0,
            kill_buffer: KillBuffer::new(),
            vars: VarTable::new(),
            keymap,
            term,
            this_flags: CommandFlags::default(),
            last_flags: CommandFlags::default(),
            last_key: None,
            lisp_args: VecDeque::new(),
            replay_input: VecDeque::new(),
            pending_input: VecDeque::new(),
            macros: MacroState::new(),
            echo: None,
            minibuffer_cursor: None,
            histories: Histories::new(),
            last_search: None,
            loading_init: false,
            quit_requested: false,
        })
    }

    // ---- バッファ参照 ----

    pub fn current_buffer_id(&self) -> BufferId {
        self.windows[self.current_window].buffer
    }

    pub(crate) fn buffer_index(&self, id: BufferId) -> Option<usize> {
        self.buffers.iter().position(|buffer| buffer.id() == id)
    }

    /// 現在のバッファ
    pub fn buffer(&self) -> &Buffer {
        let index = self.buffer_index(self.current_buffer_id()).unwrap_or(0);
        &self.buffers[index]
    }

    pub fn buffer_mut(&mut self) -> &mut Buffer {
        let index = self.buffer_index(self.current_buffer_id()).unwrap_or(0);
        &mut self.buffers[index]
    }

    pub fn buffer_by_id(&self, id: BufferId) -> Option<&Buffer> {
        self.buffers.iter().find(|buffer| buffer.id() == id)
    }

    pub fn buffer_by_id_mut(&mut self, id: BufferId) -> Option<&mut Buffer> {
        self.buffers.iter_mut().find(|buffer| buffer.id() == id)
    }

    pub fn buffers(&self) -> &[Buffer] {
        &self.buffers
    }

    pub(crate) fn allocate_buffer_id(&mut self) -> BufferId {
        let id = self.next_buffer_id;
        self.next_buffer_id += 1;
        id
    }

    // ---- 変数 ----

    /// 現在のバッファから見た変数の値
    pub fn variable_value(&self, name: &str) -> Option<&str> {
        self.vars.get(Some(self.buffer()), name)
    }

    pub fn set_variable(&mut self, name: &str, value: &str) {
        log::debug!("set {} = {}", name, value);
        if self.loading_init {
            self.vars.set_global(name, value);
            return;
        }
        let index = self.buffer_index(self.current_buffer_id()).unwrap_or(0);
        let buffer = &mut self.buffers[index];
        self.vars.set(Some(buffer), name, value);
    }

    /// バッファローカルの値を作らずに設定する（コマンド行の `-v`）
    pub fn set_global_variable(&mut self, name: &str, value: &str) {
        log::debug!("set global {} = {}", name, value);
        self.vars.set_global(name, value);
    }

    pub(crate) fn tab_width(&self) -> usize {
        self.vars
            .get_number(Some(self.buffer()), "tab-width")
            .filter(|width| *width > 0)
            .unwrap_or(8) as usize
    }

    pub(crate) fn fill_column(&self) -> usize {
        self.vars
            .get_number(Some(self.buffer()), "fill-column")
            .filter(|column| *column > 0)
            .unwrap_or(70) as usize
    }

    pub(crate) fn var_enabled(&self, name: &str) -> bool {
        self.vars.get_bool(Some(self.buffer()), name)
    }

    // ---- エコー領域 ----

    pub fn message(&mut self, text: impl Into<String>) {
        let text = text.into();
        log::debug!("message: {}", text);
        self.echo = Some(text);
    }

    pub fn echo_text(&self) -> Option<&str> {
        self.echo.as_deref()
    }

    pub fn clear_message(&mut self) {
        self.echo = None;
    }

    /// エラーをエコー領域に表示し、ベルを鳴らす
    pub fn report_error(&mut self, error: &CommandError) {
        let display = ErrorDisplay::new(error);
        log::debug!("command failed: {}", display.message);
        self.echo = Some(display.message);
        if display.ring_bell && self.var_enabled("ring-bell") {
            self.term.beep();
        }
    }

    // ---- その他の状態 ----

    pub fn kill_buffer_text(&self) -> &str {
        self.kill_buffer.text()
    }

    pub fn keymap(&self) -> &Keymap<Function> {
        &self.keymap
    }

    pub fn terminal(&self) -> &dyn Terminal {
        self.term.as_ref()
    }

    pub fn terminal_mut(&mut self) -> &mut dyn Terminal {
        self.term.as_mut()
    }

    /// スクリプト端末で動いていればその端末
    pub fn scripted_terminal(&self) -> Option<&crate::term::ScriptedTerminal> {
        self.term.as_any().downcast_ref()
    }

    pub fn is_quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub(crate) fn request_quit(&mut self) {
        self.quit_requested = true;
    }

    pub fn last_flags(&self) -> CommandFlags {
        self.last_flags
    }

    /// 起動スクリプトを評価する。変数はグローバルに設定される。
    pub fn load_init_file(&mut self, path: &std::path::Path) -> std::result::Result<(), crate::alisp::EvalError> {
        self.loading_init = true;
        let result = crate::alisp::eval_file(self, path);
        self.loading_init = false;
        result.map(|_| ())
    }

    /// 変更済みバッファを `<name>.SAVE` へ書き出す（クラッシュ時用）
    pub fn emergency_save(&self) -> Vec<PathBuf> {
        let mut saved = Vec::new();
        for buffer in &self.buffers {
            if !buffer.is_modified() || buffer.flags.temporary {
                continue;
            }
            match crate::file::emergency_save(buffer) {
                Ok(path) => saved.push(path),
                Err(error) => log::error!("emergency save of {} failed: {}", buffer.name(), error),
            }
        }
        saved
    }
}
