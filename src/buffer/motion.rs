//! 単語・段落・S 式単位の移動

use super::Buffer;
use crate::error::CommandError;

/// 単語を構成する文字
pub fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric()
}

/// シンボルを構成する文字
pub fn is_symbol_char(ch: char) -> bool {
    ch.is_alphanumeric() || "_-+*/<>=!?$%&~^:.@#".contains(ch)
}

fn is_open(ch: char) -> bool {
    matches!(ch, '(' | '[' | '{')
}

fn is_close(ch: char) -> bool {
    matches!(ch, ')' | ']' | '}')
}

fn is_blank_text(chars: &[char]) -> bool {
    chars.iter().all(|ch| ch.is_whitespace())
}

impl Buffer {
    /// 次の単語の末尾へ。単語がなければ `false`。
    pub fn forward_word(&mut self) -> bool {
        while let Some(ch) = self.following_char() {
            if is_word_char(ch) {
                break;
            }
            self.forward_char();
        }
        if self.eobp() {
            return false;
        }
        while matches!(self.following_char(), Some(ch) if is_word_char(ch)) {
            self.forward_char();
        }
        true
    }

    /// 前の単語の先頭へ。単語がなければ `false`。
    pub fn backward_word(&mut self) -> bool {
        while let Some(ch) = self.preceding_char() {
            if is_word_char(ch) {
                break;
            }
            self.backward_char();
        }
        if self.bobp() {
            return false;
        }
        while matches!(self.preceding_char(), Some(ch) if is_word_char(ch)) {
            self.backward_char();
        }
        true
    }

    /// 空白だけの行か
    pub fn is_blank_line(&self, n: usize) -> bool {
        let pt = self.point_at(n, 0);
        is_blank_text(self.line(pt.line).as_chars())
    }

    /// 段落の末尾（次の空行の先頭かバッファ末尾）へ
    pub fn forward_paragraph(&mut self) -> bool {
        if self.eobp() {
            return false;
        }
        let last = self.line_count() - 1;
        let mut n = self.pt.n;
        while n < last && self.is_blank_line(n) {
            n += 1;
        }
        while !self.is_blank_line(n) {
            if n == last {
                self.goto_point(n, usize::MAX);
                return true;
            }
            n += 1;
        }
        self.goto_point(n, 0);
        true
    }

    /// 段落の先頭（直前の空行の先頭かバッファ先頭）へ
    pub fn backward_paragraph(&mut self) -> bool {
        if self.bobp() {
            return false;
        }
        let mut n = self.pt.n;
        if self.bolp() || self.is_blank_line(n) {
            if n == 0 {
                self.goto_point(0, 0);
                return true;
            }
            n -= 1;
        }
        while n > 0 && self.is_blank_line(n) {
            n -= 1;
        }
        while !self.is_blank_line(n) {
            if n == 0 {
                self.goto_point(0, 0);
                return true;
            }
            n -= 1;
        }
        self.goto_point(n, 0);
        true
    }

    /// 次の S 式の末尾へ。S 式がなければ `Ok(false)`。
    pub fn forward_sexp(&mut self) -> Result<bool, CommandError> {
        let chars: Vec<char> = self.text().chars().collect();
        let from = self.point_to_offset(self.pt);
        match scan_sexp_forward(&chars, from)? {
            Some(end) => {
                self.goto_offset(end);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// 前の S 式の先頭へ
    pub fn backward_sexp(&mut self) -> Result<bool, CommandError> {
        let chars: Vec<char> = self.text().chars().collect();
        let from = self.point_to_offset(self.pt);
        match scan_sexp_backward(&chars, from)? {
            Some(start) => {
                self.goto_offset(start);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

fn scan_error(message: &str) -> CommandError {
    CommandError::Message(format!("Scan error: {}", message))
}

/// `from` から次の S 式の末尾を探す
pub fn scan_sexp_forward(chars: &[char], from: usize) -> Result<Option<usize>, CommandError> {
    let mut i = from;
    while i < chars.len() && !is_symbol_char(chars[i]) && !is_open(chars[i]) && !is_close(chars[i]) && chars[i] != '"' {
        i += 1;
    }
    if i >= chars.len() {
        return Ok(None);
    }
    let ch = chars[i];
    if is_close(ch) {
        return Err(scan_error("Containing expression ends prematurely"));
    }
    if ch == '"' {
        return skip_string_forward(chars, i + 1).map(Some);
    }
    if is_open(ch) {
        let mut depth = 0usize;
        while i < chars.len() {
            let c = chars[i];
            if c == '"' {
                i = skip_string_forward(chars, i + 1)?;
                continue;
            }
            if is_open(c) {
                depth += 1;
            } else if is_close(c) {
                depth -= 1;
                if depth == 0 {
                    return Ok(Some(i + 1));
                }
            }
            i += 1;
        }
        return Err(scan_error("Unbalanced parentheses"));
    }
    while i < chars.len() && is_symbol_char(chars[i]) {
        i += 1;
    }
    Ok(Some(i))
}

/// 文字列の開き `"` の直後から閉じ `"` の直後まで進む
fn skip_string_forward(chars: &[char], mut i: usize) -> Result<usize, CommandError> {
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 2,
            '"' => return Ok(i + 1),
            _ => i += 1,
        }
    }
    Err(scan_error("Unbalanced parentheses"))
}

/// `from` から前の S 式の先頭を探す
pub fn scan_sexp_backward(chars: &[char], from: usize) -> Result<Option<usize>, CommandError> {
    let mut i = from.min(chars.len());
    while i > 0 {
        let c = chars[i - 1];
        if is_symbol_char(c) || is_open(c) || is_close(c) || c == '"' {
            break;
        }
        i -= 1;
    }
    if i == 0 {
        return Ok(None);
    }
    let ch = chars[i - 1];
    if is_open(ch) {
        return Err(scan_error("Containing expression ends prematurely"));
    }
    if ch == '"' {
        return skip_string_backward(chars, i - 1).map(Some);
    }
    if is_close(ch) {
        let mut depth = 0usize;
        while i > 0 {
            let c = chars[i - 1];
            if c == '"' {
                i = skip_string_backward(chars, i - 1)?;
                continue;
            }
            if is_close(c) {
                depth += 1;
            } else if is_open(c) {
                depth -= 1;
                if depth == 0 {
                    return Ok(Some(i - 1));
                }
            }
            i -= 1;
        }
        return Err(scan_error("Unbalanced parentheses"));
    }
    while i > 0 && is_symbol_char(chars[i - 1]) {
        i -= 1;
    }
    Ok(Some(i))
}

/// 閉じ `"` の位置から開き `"` の位置まで戻る
fn skip_string_backward(chars: &[char], close: usize) -> Result<usize, CommandError> {
    let mut i = close;
    while i > 0 {
        i -= 1;
        if chars[i] == '"' {
            let escaped = i > 0 && chars[i - 1] == '\\';
            if !escaped {
                return Ok(i);
            }
        }
    }
    Err(scan_error("Unbalanced parentheses"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(text: &str) -> Vec<char> {
        text.chars().collect()
    }

    #[test]
    fn words_skip_punctuation() {
        let mut buf = Buffer::from_text(1, "t", "  foo, bar\nbaz");
        assert!(buf.forward_word());
        assert_eq!(buf.pt().o, 5);
        assert!(buf.forward_word());
        assert!(buf.forward_word());
        assert_eq!((buf.pt().n, buf.pt().o), (1, 3));
        assert!(!buf.forward_word());
        assert!(buf.backward_word());
        assert_eq!((buf.pt().n, buf.pt().o), (1, 0));
    }

    #[test]
    fn paragraphs_stop_at_blank_lines() {
        let mut buf = Buffer::from_text(1, "t", "a\nb\n\nc\nd");
        assert!(buf.forward_paragraph());
        assert_eq!((buf.pt().n, buf.pt().o), (2, 0));
        assert!(buf.forward_paragraph());
        assert_eq!((buf.pt().n, buf.pt().o), (4, 1));
        assert!(buf.backward_paragraph());
        assert_eq!(buf.pt().n, 2);
        assert!(buf.backward_paragraph());
        assert_eq!((buf.pt().n, buf.pt().o), (0, 0));
    }

    #[test]
    fn sexp_scans_nested_lists_and_strings() {
        let text = chars("(a \"b)\" (c)) d");
        assert_eq!(scan_sexp_forward(&text, 0).unwrap(), Some(12));
        assert_eq!(scan_sexp_forward(&text, 12).unwrap(), Some(14));
        assert_eq!(scan_sexp_backward(&text, 12).unwrap(), Some(0));
        assert_eq!(scan_sexp_backward(&text, 7).unwrap(), Some(3));
        assert_eq!(scan_sexp_forward(&text, 14).unwrap(), None);
    }

    #[test]
    fn unbalanced_sexp_is_an_error() {
        let text = chars("(a (b)");
        assert!(scan_sexp_forward(&text, 0).is_err());
        let text = chars("a)");
        assert!(scan_sexp_forward(&text, 1).is_err());
    }
}
