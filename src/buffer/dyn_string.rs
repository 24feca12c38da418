//! 可変長文字列
//!
//! 1 行分のテキストを保持する。位置は文字単位で、負の位置は末尾からの
//! 相対位置として扱う。範囲外の位置はエラーにせず `[0, len]` に丸める。

use std::fmt;

/// 容量拡張時に上乗せする文字数
const GROWTH_CHUNK: usize = 16;

/// 行テキスト用の可変長文字列
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DynString {
    chars: Vec<char>,
}

impl DynString {
    pub fn new() -> Self {
        Self { chars: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.chars.capacity()
    }

    pub fn as_chars(&self) -> &[char] {
        &self.chars
    }

    pub fn char_at(&self, pos: usize) -> Option<char> {
        self.chars.get(pos).copied()
    }

    /// 位置を `[0, len]` に丸める
    pub fn clamp(&self, pos: isize) -> usize {
        let len = self.chars.len() as isize;
        let pos = if pos < 0 { len + pos } else { pos };
        pos.clamp(0, len) as usize
    }

    /// 内容を置き換える
    pub fn assign(&mut self, text: &str) -> &mut Self {
        self.chars.clear();
        self.append(text)
    }

    pub fn append(&mut self, text: &str) -> &mut Self {
        let len = self.chars.len() as isize;
        self.insert(len, text)
    }

    pub fn append_dyn(&mut self, other: &DynString) -> &mut Self {
        self.reserve(other.len());
        self.chars.extend_from_slice(&other.chars);
        self
    }

    pub fn append_char(&mut self, ch: char) -> &mut Self {
        self.reserve(1);
        self.chars.push(ch);
        self
    }

    pub fn insert(&mut self, pos: isize, text: &str) -> &mut Self {
        let at = self.clamp(pos);
        let incoming: Vec<char> = text.chars().collect();
        self.reserve(incoming.len());
        self.chars.splice(at..at, incoming);
        self
    }

    pub fn insert_char(&mut self, pos: isize, ch: char) -> &mut Self {
        let at = self.clamp(pos);
        self.reserve(1);
        self.chars.insert(at, ch);
        self
    }

    /// `pos` から `len` 文字を削除する
    pub fn remove(&mut self, pos: isize, len: usize) -> &mut Self {
        let start = self.clamp(pos);
        let end = start.saturating_add(len).min(self.chars.len());
        self.chars.drain(start..end);
        self
    }

    /// `pos` から `len` 文字を `text` で置き換える
    pub fn replace(&mut self, pos: isize, len: usize, text: &str) -> &mut Self {
        let start = self.clamp(pos);
        let end = start.saturating_add(len).min(self.chars.len());
        let incoming: Vec<char> = text.chars().collect();
        self.reserve(incoming.len());
        self.chars.splice(start..end, incoming);
        self
    }

    pub fn set_char(&mut self, pos: usize, ch: char) {
        if let Some(slot) = self.chars.get_mut(pos) {
            *slot = ch;
        }
    }

    /// `pos` 以降を切り詰めて返す
    pub fn split_off(&mut self, pos: isize) -> DynString {
        let at = self.clamp(pos);
        DynString {
            chars: self.chars.split_off(at),
        }
    }

    pub fn substring(&self, pos: isize, len: usize) -> DynString {
        let start = self.clamp(pos);
        let end = start.saturating_add(len).min(self.chars.len());
        DynString {
            chars: self.chars[start..end].to_vec(),
        }
    }

    /// `from` 以降で最初に現れる位置
    pub fn find(&self, needle: &str, from: usize) -> Option<usize> {
        let needle: Vec<char> = needle.chars().collect();
        if from > self.chars.len() {
            return None;
        }
        if needle.is_empty() {
            return Some(from);
        }
        self.chars[from..]
            .windows(needle.len())
            .position(|window| window == needle.as_slice())
            .map(|offset| offset + from)
    }

    /// 最後に現れる位置
    pub fn rfind(&self, needle: &str) -> Option<usize> {
        let needle: Vec<char> = needle.chars().collect();
        if needle.is_empty() {
            return Some(self.chars.len());
        }
        self.chars
            .windows(needle.len())
            .rposition(|window| window == needle.as_slice())
    }

    // 容量が足りなければ倍か必要量 + GROWTH_CHUNK の大きい方まで広げる
    fn reserve(&mut self, additional: usize) {
        let needed = self.chars.len() + additional;
        if needed > self.chars.capacity() {
            let target = (self.chars.capacity() * 2).max(needed + GROWTH_CHUNK);
            self.chars.reserve_exact(target - self.chars.len());
        }
    }
}

impl From<&str> for DynString {
    fn from(text: &str) -> Self {
        let mut string = DynString::new();
        string.assign(text);
        string
    }
}

impl fmt::Display for DynString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for ch in &self.chars {
            write!(f, "{}", ch)?;
        }
        Ok(())
    }
}
