//! crossterm 端末
//!
//! ratatui の `Terminal` を二重バッファの文字画面として使う。
//! セルへ書き込み、`refresh` で差分だけを出力する。

use std::io::{self, Stdout};
use std::time::Duration;

use crossterm::event::{self, Event};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Position, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::Terminal as RatatuiTerminal;
use unicode_width::UnicodeWidthChar;

use super::{Attributes, Terminal};
use crate::error::SystemError;
use crate::input::Key;

/// 実端末
pub struct CrosstermTerminal {
    terminal: RatatuiTerminal<CrosstermBackend<Stdout>>,
    width: u16,
    height: u16,
    cursor: (u16, u16),
    style: Style,
    pending: Vec<Key>,
    active: bool,
}

impl CrosstermTerminal {
    /// raw モードと代替画面に入る
    pub fn new() -> Result<Self, SystemError> {
        enable_raw_mode().map_err(init_error)?;
        execute!(io::stdout(), EnterAlternateScreen).map_err(init_error)?;
        let mut terminal =
            RatatuiTerminal::new(CrosstermBackend::new(io::stdout())).map_err(init_error)?;
        terminal.clear().map_err(init_error)?;
        let (width, height) = crossterm::terminal::size().map_err(init_error)?;
        log::info!("terminal initialized: {}x{}", width, height);
        Ok(Self {
            terminal,
            width,
            height,
            cursor: (0, 0),
            style: Style::default(),
            pending: Vec::new(),
            active: true,
        })
    }

    /// 端末を元の状態に戻す
    pub fn restore(&mut self) -> io::Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        self.terminal.show_cursor()?;
        execute!(io::stdout(), LeaveAlternateScreen)?;
        disable_raw_mode()
    }

    fn handle_resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        if let Err(error) = self.terminal.resize(Rect::new(0, 0, width, height)) {
            log::warn!("resize failed: {}", error);
        }
    }
}

impl Drop for CrosstermTerminal {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}

impl Terminal for CrosstermTerminal {
    fn size(&self) -> (usize, usize) {
        (self.width as usize, self.height as usize)
    }

    fn move_to(&mut self, row: usize, col: usize) {
        self.cursor = (col.min(u16::MAX as usize) as u16, row.min(u16::MAX as usize) as u16);
    }

    fn clear_to_eol(&mut self) {
        let (x, y) = self.cursor;
        let buffer = self.terminal.current_buffer_mut();
        for column in x..self.width {
            if let Some(cell) = buffer.cell_mut((column, y)) {
                cell.reset();
            }
        }
    }

    fn add_char(&mut self, ch: char) {
        let (x, y) = self.cursor;
        let width = ch.width().unwrap_or(1).max(1) as u16;
        if y < self.height && x + width <= self.width {
            let style = self.style;
            self.terminal
                .current_buffer_mut()
                .set_stringn(x, y, ch.to_string(), width as usize, style);
        }
        self.cursor.0 = x.saturating_add(width);
    }

    fn set_attributes(&mut self, attrs: Attributes) {
        let mut style = Style::default();
        if attrs.reverse {
            style = style.add_modifier(Modifier::REVERSED);
        }
        if attrs.bold {
            style = style.add_modifier(Modifier::BOLD);
        }
        self.style = style;
    }

    fn refresh(&mut self) -> io::Result<()> {
        self.terminal.flush()?;
        let (x, y) = self.cursor;
        self.terminal.set_cursor_position(Position::new(x, y))?;
        self.terminal.show_cursor()?;
        self.terminal.swap_buffers();
        self.terminal.backend_mut().flush()
    }

    fn beep(&mut self) {
        use std::io::Write;
        let mut out = io::stdout();
        let _ = out.write_all(b"\x07");
        let _ = out.flush();
    }

    fn get_key(&mut self, timeout: Option<Duration>) -> Option<Key> {
        if let Some(key) = self.pending.pop() {
            return Some(key);
        }
        loop {
            if let Some(limit) = timeout {
                match event::poll(limit) {
                    Ok(true) => {}
                    Ok(false) => return None,
                    Err(error) => {
                        log::error!("event poll failed: {}", error);
                        return None;
                    }
                }
            }
            match event::read() {
                Ok(Event::Key(event)) => {
                    if let Some(key) = Key::from_event(&event) {
                        return Some(key);
                    }
                }
                Ok(Event::Resize(width, height)) => {
                    self.handle_resize(width, height);
                    return None;
                }
                Ok(_) => {}
                Err(error) => {
                    log::error!("event read failed: {}", error);
                    return None;
                }
            }
        }
    }

    fn unget_key(&mut self, key: Key) {
        self.pending.push(key);
    }

    fn suspend(&mut self) -> io::Result<()> {
        self.restore()?;
        log::info!("terminal suspended");
        enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen)?;
        self.terminal.clear()?;
        self.active = true;
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

fn init_error(error: io::Error) -> SystemError {
    SystemError::TerminalInit {
        message: error.to_string(),
    }
}
