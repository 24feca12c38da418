//! 端末抽象化
//!
//! 再表示とミニバッファが使う最小限の端末機能。

mod crossterm_term;
pub mod redisplay;
mod scripted;

use std::any::Any;
use std::io;
use std::time::Duration;

use crate::input::Key;

pub use crossterm_term::CrosstermTerminal;
pub use scripted::ScriptedTerminal;

/// 文字属性
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Attributes {
    pub reverse: bool,
    pub bold: bool,
}

impl Attributes {
    pub const NORMAL: Attributes = Attributes {
        reverse: false,
        bold: false,
    };
    pub const REVERSE: Attributes = Attributes {
        reverse: true,
        bold: false,
    };
}

/// 端末機能
pub trait Terminal {
    /// (幅, 高さ)
    fn size(&self) -> (usize, usize);

    fn move_to(&mut self, row: usize, col: usize);

    fn clear_to_eol(&mut self);

    fn add_char(&mut self, ch: char);

    fn add_string(&mut self, text: &str) {
        for ch in text.chars() {
            self.add_char(ch);
        }
    }

    fn set_attributes(&mut self, attrs: Attributes);

    fn refresh(&mut self) -> io::Result<()>;

    fn beep(&mut self);

    /// キーを 1 つ読む。`timeout` 内に入力がなければ `None`。
    fn get_key(&mut self, timeout: Option<Duration>) -> Option<Key>;

    /// 読んだキーを戻す。次の `get_key` で最初に返る。
    fn unget_key(&mut self, key: Key);

    /// これ以上入力が来ない（スクリプトの終端）
    fn input_exhausted(&self) -> bool {
        false
    }

    /// 端末を一時停止する（ジョブ制御）
    fn suspend(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// 具体的な端末型へのダウンキャスト用
    fn as_any(&self) -> &dyn Any;
}
