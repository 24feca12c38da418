//! キーコード
//!
//! 端末から届いたキーを正規化した 1 つの整数で表す。
//! 下位ビットが文字または特殊キー、上位ビットが Ctrl/Meta 修飾。

use std::fmt;

use crossterm::event::{KeyCode as CrosstermKeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use thiserror::Error;

/// 正規化されたキー入力
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key(u32);

const CTRL_BIT: u32 = 1 << 24;
const META_BIT: u32 = 1 << 25;
const BASE_MASK: u32 = CTRL_BIT - 1;
const SPECIAL_BASE: u32 = 0x11_0000;

/// キー名の解析エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyParseError {
    #[error("Empty key sequence")]
    EmptySequence,

    #[error("Unknown key: {0}")]
    UnknownKey(String),
}

// 名前付きキーの表（表示名, 基本コード）
const NAMED_KEYS: &[(&str, u32)] = &[
    ("SPC", ' ' as u32),
    ("TAB", '\t' as u32),
    ("RET", '\r' as u32),
    ("ESC", 0x1b),
    ("DEL", 0x7f),
    ("<up>", SPECIAL_BASE),
    ("<down>", SPECIAL_BASE + 1),
    ("<left>", SPECIAL_BASE + 2),
    ("<right>", SPECIAL_BASE + 3),
    ("<home>", SPECIAL_BASE + 4),
    ("<end>", SPECIAL_BASE + 5),
    ("<prior>", SPECIAL_BASE + 6),
    ("<next>", SPECIAL_BASE + 7),
    ("<insert>", SPECIAL_BASE + 8),
    ("<delete>", SPECIAL_BASE + 9),
    ("<f1>", SPECIAL_BASE + 0x11),
    ("<f2>", SPECIAL_BASE + 0x12),
    ("<f3>", SPECIAL_BASE + 0x13),
    ("<f4>", SPECIAL_BASE + 0x14),
    ("<f5>", SPECIAL_BASE + 0x15),
    ("<f6>", SPECIAL_BASE + 0x16),
    ("<f7>", SPECIAL_BASE + 0x17),
    ("<f8>", SPECIAL_BASE + 0x18),
    ("<f9>", SPECIAL_BASE + 0x19),
    ("<f10>", SPECIAL_BASE + 0x1a),
    ("<f11>", SPECIAL_BASE + 0x1b),
    ("<f12>", SPECIAL_BASE + 0x1c),
];

impl Key {
    pub const RET: Key = Key('\r' as u32);
    pub const TAB: Key = Key('\t' as u32);
    pub const SPC: Key = Key(' ' as u32);
    pub const ESC: Key = Key(0x1b);
    pub const DEL: Key = Key(0x7f);
    pub const UP: Key = Key(SPECIAL_BASE);
    pub const DOWN: Key = Key(SPECIAL_BASE + 1);
    pub const LEFT: Key = Key(SPECIAL_BASE + 2);
    pub const RIGHT: Key = Key(SPECIAL_BASE + 3);
    pub const HOME: Key = Key(SPECIAL_BASE + 4);
    pub const END: Key = Key(SPECIAL_BASE + 5);
    pub const PRIOR: Key = Key(SPECIAL_BASE + 6);
    pub const NEXT: Key = Key(SPECIAL_BASE + 7);
    pub const INSERT: Key = Key(SPECIAL_BASE + 8);
    pub const DELETE: Key = Key(SPECIAL_BASE + 9);

    /// 修飾なしの文字キー
    pub const fn from_char(ch: char) -> Self {
        Key(ch as u32)
    }

    /// `C-<ch>`
    pub const fn ctrl(ch: char) -> Self {
        Key(ch as u32 | CTRL_BIT)
    }

    /// `M-<ch>`
    pub const fn meta(ch: char) -> Self {
        Key(ch as u32 | META_BIT)
    }

    /// `F<n>` キー
    pub fn function(n: u8) -> Self {
        Key(SPECIAL_BASE + 0x10 + n as u32)
    }

    pub const fn with_ctrl(self) -> Self {
        Key(self.0 | CTRL_BIT)
    }

    pub const fn with_meta(self) -> Self {
        Key(self.0 | META_BIT)
    }

    pub const fn without_meta(self) -> Self {
        Key(self.0 & !META_BIT)
    }

    pub const fn is_ctrl(self) -> bool {
        self.0 & CTRL_BIT != 0
    }

    pub const fn is_meta(self) -> bool {
        self.0 & META_BIT != 0
    }

    /// 修飾を除いた基本コード
    pub const fn base(self) -> u32 {
        self.0 & BASE_MASK
    }

    pub const fn code(self) -> u32 {
        self.0
    }

    /// 修飾なしの文字キーならその文字
    pub fn as_char(self) -> Option<char> {
        if self.is_ctrl() || self.is_meta() {
            return None;
        }
        char::from_u32(self.0).filter(|_| self.0 < SPECIAL_BASE)
    }

    /// 挿入される文字キーか
    pub fn is_self_inserting(self) -> bool {
        matches!(self.as_char(), Some(ch) if !ch.is_control())
    }

    /// 数字キー（Meta 付きも含む）なら値
    pub fn digit(self) -> Option<u32> {
        if self.is_ctrl() {
            return None;
        }
        char::from_u32(self.base()).and_then(|ch| ch.to_digit(10))
    }

    /// `C-x C-f` 形式のキー列を解析する
    pub fn parse_sequence(text: &str) -> Result<Vec<Key>, KeyParseError> {
        let keys = text
            .split_whitespace()
            .map(Key::parse)
            .collect::<Result<Vec<_>, _>>()?;
        if keys.is_empty() {
            return Err(KeyParseError::EmptySequence);
        }
        Ok(keys)
    }

    /// 1 キー分の名前を解析する
    pub fn parse(text: &str) -> Result<Key, KeyParseError> {
        let mut modifiers = 0;
        let mut remaining = text;
        loop {
            let stripped = remaining.strip_prefix('\\').unwrap_or(remaining);
            if stripped.len() > 2 && stripped.starts_with("C-") {
                modifiers |= CTRL_BIT;
                remaining = &stripped[2..];
            } else if stripped.len() > 2 && stripped.starts_with("M-") {
                modifiers |= META_BIT;
                remaining = &stripped[2..];
            } else {
                break;
            }
        }

        if let Some((_, code)) = NAMED_KEYS.iter().find(|(name, _)| *name == remaining) {
            return Ok(Key(code | modifiers));
        }
        let mut chars = remaining.chars();
        match (chars.next(), chars.next()) {
            (Some(ch), None) => Ok(Key(ch as u32 | modifiers)),
            _ => Err(KeyParseError::UnknownKey(text.to_string())),
        }
    }

    /// 端末イベントから変換する。扱えないキーは `None`。
    pub fn from_event(event: &KeyEvent) -> Option<Key> {
        if event.kind == KeyEventKind::Release {
            return None;
        }
        let base = match event.code {
            CrosstermKeyCode::Char(ch) => {
                if event.modifiers.contains(KeyModifiers::CONTROL) {
                    Key::from_char(ch.to_ascii_lowercase())
                } else {
                    Key::from_char(ch)
                }
            }
            CrosstermKeyCode::Enter => Key::RET,
            CrosstermKeyCode::Tab | CrosstermKeyCode::BackTab => Key::TAB,
            CrosstermKeyCode::Backspace => Key::DEL,
            CrosstermKeyCode::Esc => Key::ESC,
            CrosstermKeyCode::Up => Key::UP,
            CrosstermKeyCode::Down => Key::DOWN,
            CrosstermKeyCode::Left => Key::LEFT,
            CrosstermKeyCode::Right => Key::RIGHT,
            CrosstermKeyCode::Home => Key::HOME,
            CrosstermKeyCode::End => Key::END,
            CrosstermKeyCode::PageUp => Key::PRIOR,
            CrosstermKeyCode::PageDown => Key::NEXT,
            CrosstermKeyCode::Insert => Key::INSERT,
            CrosstermKeyCode::Delete => Key::DELETE,
            CrosstermKeyCode::F(n) if (1..=12).contains(&n) => Key::function(n),
            _ => return None,
        };
        let mut key = base;
        if event.modifiers.contains(KeyModifiers::CONTROL) {
            key = key.with_ctrl();
        }
        if event.modifiers.contains(KeyModifiers::ALT) {
            key = key.with_meta();
        }
        Some(key)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_ctrl() {
            f.write_str("C-")?;
        }
        if self.is_meta() {
            f.write_str("M-")?;
        }
        let base = self.base();
        if let Some((name, _)) = NAMED_KEYS.iter().find(|(_, code)| *code == base) {
            return f.write_str(name);
        }
        match char::from_u32(base) {
            Some(ch) if base < SPECIAL_BASE && !ch.is_control() => write!(f, "{}", ch),
            Some(ch) if base < 0x20 => write!(f, "C-{}", ((base as u8) + b'`') as char),
            _ => write!(f, "<key-{:x}>", base),
        }
    }
}

/// キー列を空白区切りの名前にする
pub fn render_sequence(keys: &[Key]) -> String {
    keys.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_modifiers_and_names() {
        assert_eq!(Key::parse("C-x").unwrap(), Key::ctrl('x'));
        assert_eq!(Key::parse("M-%").unwrap(), Key::meta('%'));
        assert_eq!(Key::parse("C-M-f").unwrap(), Key::ctrl('f').with_meta());
        assert_eq!(Key::parse("RET").unwrap(), Key::RET);
        assert_eq!(Key::parse("C-<home>").unwrap(), Key::HOME.with_ctrl());
        assert_eq!(Key::parse("M--").unwrap(), Key::meta('-'));
        assert_eq!(Key::parse("\\C-c").unwrap(), Key::ctrl('c'));
        assert!(Key::parse("bogus").is_err());
    }

    #[test]
    fn render_round_trips_names() {
        for name in ["C-x", "M-x", "C-M-s", "RET", "SPC", "DEL", "<f5>", "<prior>", "a", "M-<"] {
            assert_eq!(Key::parse(name).unwrap().to_string(), name);
        }
        let keys = Key::parse_sequence("C-x C-f").unwrap();
        assert_eq!(render_sequence(&keys), "C-x C-f");
    }

    #[test]
    fn empty_sequence_is_rejected() {
        assert_eq!(Key::parse_sequence("  "), Err(KeyParseError::EmptySequence));
    }

    #[test]
    fn self_inserting_keys() {
        assert!(Key::from_char('a').is_self_inserting());
        assert!(Key::from_char('あ').is_self_inserting());
        assert!(!Key::ctrl('a').is_self_inserting());
        assert!(!Key::TAB.is_self_inserting());
        assert!(!Key::DEL.is_self_inserting());
        assert!(!Key::UP.is_self_inserting());
    }

    #[test]
    fn digits_with_meta() {
        assert_eq!(Key::meta('7').digit(), Some(7));
        assert_eq!(Key::from_char('3').digit(), Some(3));
        assert_eq!(Key::ctrl('3').digit(), None);
        assert_eq!(Key::from_char('x').digit(), None);
    }

    #[test]
    fn converts_crossterm_events() {
        let event = KeyEvent::new(CrosstermKeyCode::Char('x'), KeyModifiers::CONTROL);
        assert_eq!(Key::from_event(&event), Some(Key::ctrl('x')));
        let event = KeyEvent::new(CrosstermKeyCode::Char('f'), KeyModifiers::ALT);
        assert_eq!(Key::from_event(&event), Some(Key::meta('f')));
        let event = KeyEvent::new(CrosstermKeyCode::Enter, KeyModifiers::NONE);
        assert_eq!(Key::from_event(&event), Some(Key::RET));
        let event = KeyEvent::new(CrosstermKeyCode::PageDown, KeyModifiers::NONE);
        assert_eq!(Key::from_event(&event), Some(Key::NEXT));
    }
}
