use crate::alisp::ast::Expr;
use crate::alisp::error::{Position, ReaderError};

#[derive(Debug)]
pub struct Reader {
    chars: Vec<char>,
    index: usize,
    line: usize,
    column: usize,
}

impl Reader {
    pub fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            index: 0,
            line: 1,
            column: 1,
        }
    }

    pub fn parse(mut self) -> Result<Vec<Expr>, ReaderError> {
        let mut forms = Vec::new();
        loop {
            self.skip_whitespace_and_comments();
            if self.is_eof() {
                break;
            }
            forms.push(self.read_form()?);
        }
        Ok(forms)
    }

    fn read_form(&mut self) -> Result<Expr, ReaderError> {
        self.skip_whitespace_and_comments();
        let ch = self
            .peek_char()
            .ok_or(ReaderError::UnexpectedEof { at: self.position() })?;
        match ch {
            '(' => {
                self.consume_char();
                self.read_list()
            }
            ')' => Err(ReaderError::UnbalancedClose { at: self.position() }),
            '"' => self.read_string(),
            '\'' => {
                self.consume_char();
                let quoted = self.read_form()?;
                Ok(Expr::Quote(Box::new(quoted)))
            }
            _ => self.read_atom(),
        }
    }

    fn read_list(&mut self) -> Result<Expr, ReaderError> {
        let mut elements = Vec::new();
        loop {
            self.skip_whitespace_and_comments();
            match self.peek_char() {
                Some(')') => {
                    self.consume_char();
                    break;
                }
                Some(_) => elements.push(self.read_form()?),
                None => {
                    return Err(ReaderError::UnexpectedEof { at: self.position() });
                }
            }
        }
        Ok(Expr::List(elements))
    }

    fn read_string(&mut self) -> Result<Expr, ReaderError> {
        let start = self.position();
        self.consume_char(); // opening quote
        let mut buf = String::new();
        while let Some(ch) = self.consume_char() {
            match ch {
                '"' => return Ok(Expr::Str(buf)),
                '\\' => match self.consume_char() {
                    Some('n') => buf.push('\n'),
                    Some('t') => buf.push('\t'),
                    Some('"') => buf.push('"'),
                    Some('\\') => buf.push('\\'),
                    Some(other) => {
                        return Err(ReaderError::UnknownEscape { escape: other, at: start });
                    }
                    None => break,
                },
                other => buf.push(other),
            }
        }
        Err(ReaderError::UnterminatedString { at: start })
    }

    /// 整数かシンボル。`1+` のように数字で始まっても整数として読めなければシンボル。
    fn read_atom(&mut self) -> Result<Expr, ReaderError> {
        let start = self.position();
        let mut buf = String::new();
        while let Some(ch) = self.peek_char() {
            if is_symbol_char(ch) {
                buf.push(ch);
                self.consume_char();
            } else {
                break;
            }
        }
        if buf.is_empty() {
            let found = self.peek_char().map(String::from).unwrap_or_default();
            return Err(ReaderError::InvalidSyntax { found, at: start });
        }
        if looks_like_integer(&buf) {
            if let Ok(number) = buf.parse::<i64>() {
                return Ok(Expr::Integer(number));
            }
        }
        Ok(Expr::Symbol(buf))
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            while let Some(ch) = self.peek_char() {
                if ch.is_whitespace() {
                    self.consume_char();
                } else {
                    break;
                }
            }
            if self.peek_char() == Some(';') {
                while let Some(ch) = self.consume_char() {
                    if ch == '\n' {
                        break;
                    }
                }
                continue;
            }
            break;
        }
    }

    fn consume_char(&mut self) -> Option<char> {
        let ch = self.chars.get(self.index).copied();
        if let Some(c) = ch {
            self.index += 1;
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        ch
    }

    fn peek_char(&self) -> Option<char> {
        self.chars.get(self.index).copied()
    }

    fn is_eof(&self) -> bool {
        self.index >= self.chars.len()
    }

    fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }
}

fn is_symbol_char(ch: char) -> bool {
    !ch.is_whitespace() && !matches!(ch, '(' | ')' | '"' | '\'' | ';')
}

fn looks_like_integer(text: &str) -> bool {
    let digits = text.strip_prefix(['-', '+']).unwrap_or(text);
    !digits.is_empty() && digits.chars().all(|ch| ch.is_ascii_digit())
}

pub fn parse(source: &str) -> Result<Vec<Expr>, ReaderError> {
    Reader::new(source).parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(name: &str) -> Expr {
        Expr::Symbol(name.to_string())
    }

    #[test]
    fn reads_nested_lists_and_atoms() {
        let forms = parse("(setq fill-column 72) ; comment\n(forward-char -3)").unwrap();
        assert_eq!(
            forms,
            vec![
                Expr::List(vec![sym("setq"), sym("fill-column"), Expr::Integer(72)]),
                Expr::List(vec![sym("forward-char"), Expr::Integer(-3)]),
            ]
        );
    }

    #[test]
    fn string_escapes_are_decoded() {
        let forms = parse(r#"(insert "a \"b\" \\ c\n")"#).unwrap();
        assert_eq!(
            forms[0],
            Expr::List(vec![sym("insert"), Expr::Str("a \"b\" \\ c\n".to_string())])
        );
    }

    #[test]
    fn quote_and_symbol_like_numbers() {
        let forms = parse("'(a b) 1+ -").unwrap();
        assert_eq!(
            forms[0],
            Expr::Quote(Box::new(Expr::List(vec![sym("a"), sym("b")])))
        );
        assert_eq!(forms[1], sym("1+"));
        assert_eq!(forms[2], sym("-"));
    }

    #[test]
    fn errors_carry_location() {
        let err = parse("(a\n  \"open").unwrap_err();
        assert_eq!(err, ReaderError::UnterminatedString { at: Position::new(2, 3) });

        let err = parse("(a b").unwrap_err();
        assert_eq!(err, ReaderError::UnexpectedEof { at: Position::new(1, 5) });
        assert_eq!(parse(")").unwrap_err().to_string(), "1:1: Unbalanced `)'");
        assert!(matches!(
            parse(r#""\q""#).unwrap_err(),
            ReaderError::UnknownEscape { escape: 'q', .. }
        ));
    }
}
