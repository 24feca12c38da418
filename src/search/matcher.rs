//! 検索用マッチャー
//!
//! 位置はすべてバッファ先頭からの文字オフセット。改行も 1 文字と数える。

use regex::{Regex, RegexBuilder};

use crate::error::CommandError;

/// 1 件のマッチ（文字オフセット、`end` は含まない）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchMatch {
    pub start: usize,
    pub end: usize,
}

impl SearchMatch {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// 検索対象のテキストと文字・バイト位置の対応
#[derive(Debug, Clone)]
pub struct SearchText {
    text: String,
    chars: Vec<char>,
    /// 各文字の先頭バイト位置。末尾に全体の長さを持つ。
    byte_offsets: Vec<usize>,
}

impl SearchText {
    pub fn new(text: String) -> Self {
        let mut chars = Vec::with_capacity(text.len());
        let mut byte_offsets = Vec::with_capacity(text.len() + 1);
        for (i, ch) in text.char_indices() {
            chars.push(ch);
            byte_offsets.push(i);
        }
        byte_offsets.push(text.len());
        Self {
            text,
            chars,
            byte_offsets,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    fn char_to_byte(&self, offset: usize) -> usize {
        self.byte_offsets[offset.min(self.chars.len())]
    }

    fn byte_to_char(&self, byte: usize) -> usize {
        self.byte_offsets.binary_search(&byte).unwrap_or_else(|i| i)
    }
}

/// 文字列マッチング戦略
pub trait StringMatcher {
    /// `from` 以降で最初のマッチ
    fn find_forward(&self, text: &SearchText, from: usize) -> Option<SearchMatch>;

    /// 末尾が `bound` 以前のマッチのうち、最も後ろから始まるもの
    fn find_backward(&self, text: &SearchText, bound: usize) -> Option<SearchMatch>;
}

/// 大文字を含まない検索語なら大文字小文字を区別しない
pub fn fold_case_for(pattern: &str, case_fold_search: bool) -> bool {
    case_fold_search && !pattern.chars().any(char::is_uppercase)
}

/// 単純なリテラルマッチャー
#[derive(Debug, Clone)]
pub struct LiteralMatcher {
    pattern: Vec<char>,
    case_sensitive: bool,
}

impl LiteralMatcher {
    pub fn new(pattern: &str, case_sensitive: bool) -> Self {
        Self {
            pattern: pattern.chars().collect(),
            case_sensitive,
        }
    }

    fn matches_at(&self, chars: &[char], start: usize) -> bool {
        self.pattern
            .iter()
            .enumerate()
            .all(|(offset, pat_ch)| chars_equal(chars[start + offset], *pat_ch, self.case_sensitive))
    }
}

impl StringMatcher for LiteralMatcher {
    fn find_forward(&self, text: &SearchText, from: usize) -> Option<SearchMatch> {
        let chars = text.chars();
        let len = self.pattern.len();
        if from + len > chars.len() {
            return None;
        }
        (from..=chars.len() - len)
            .find(|&start| self.matches_at(chars, start))
            .map(|start| SearchMatch {
                start,
                end: start + len,
            })
    }

    fn find_backward(&self, text: &SearchText, bound: usize) -> Option<SearchMatch> {
        let chars = text.chars();
        let len = self.pattern.len();
        let bound = bound.min(chars.len());
        if len > bound {
            return None;
        }
        (0..=bound - len)
            .rev()
            .find(|&start| self.matches_at(chars, start))
            .map(|start| SearchMatch {
                start,
                end: start + len,
            })
    }
}

fn chars_equal(a: char, b: char, case_sensitive: bool) -> bool {
    if case_sensitive {
        return a == b;
    }

    // Unicodeケースフォールディング（簡易）
    a == b || a.to_lowercase().eq(b.to_lowercase())
}

/// 正規表現マッチャー
#[derive(Debug, Clone)]
pub struct RegexMatcher {
    regex: Regex,
}

impl RegexMatcher {
    pub fn new(pattern: &str, case_sensitive: bool) -> Result<Self, CommandError> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(!case_sensitive)
            .multi_line(true)
            .build()
            .map_err(|error| CommandError::Message(format!("Invalid regexp: {}", error_summary(&error.to_string()))))?;
        Ok(Self { regex })
    }
}

fn error_summary(text: &str) -> &str {
    text.lines().last().unwrap_or(text).trim()
}

impl StringMatcher for RegexMatcher {
    fn find_forward(&self, text: &SearchText, from: usize) -> Option<SearchMatch> {
        if from > text.len() {
            return None;
        }
        let found = self.regex.find_at(text.as_str(), text.char_to_byte(from))?;
        Some(SearchMatch {
            start: text.byte_to_char(found.start()),
            end: text.byte_to_char(found.end()),
        })
    }

    fn find_backward(&self, text: &SearchText, bound: usize) -> Option<SearchMatch> {
        let bound = bound.min(text.len());
        let bound_byte = text.char_to_byte(bound);
        (0..=bound).rev().find_map(|start| {
            let start_byte = text.char_to_byte(start);
            let found = self.regex.find_at(text.as_str(), start_byte)?;
            (found.start() == start_byte && found.end() <= bound_byte).then(|| SearchMatch {
                start,
                end: text.byte_to_char(found.end()),
            })
        })
    }
}

/// 検索語と種類からマッチャーを作る
pub fn build_matcher(
    pattern: &str,
    regex: bool,
    case_fold_search: bool,
) -> Result<Box<dyn StringMatcher>, CommandError> {
    let case_sensitive = !fold_case_for(pattern, case_fold_search);
    if regex {
        Ok(Box::new(RegexMatcher::new(pattern, case_sensitive)?))
    } else {
        Ok(Box::new(LiteralMatcher::new(pattern, case_sensitive)))
    }
}
