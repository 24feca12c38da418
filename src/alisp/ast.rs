use std::fmt;

/// 読み込んだ式。評価結果もこの形で返す。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Integer(i64),
    Str(String),
    Symbol(String),
    List(Vec<Expr>),
    /// `'form`
    Quote(Box<Expr>),
}

impl Expr {
    pub fn t() -> Self {
        Expr::Symbol("t".to_string())
    }

    pub fn nil() -> Self {
        Expr::Symbol("nil".to_string())
    }

    pub fn from_bool(value: bool) -> Self {
        if value {
            Self::t()
        } else {
            Self::nil()
        }
    }

    pub fn is_nil(&self) -> bool {
        match self {
            Expr::Symbol(name) => name == "nil",
            Expr::List(items) => items.is_empty(),
            _ => false,
        }
    }

    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Expr::Symbol(name) => Some(name),
            _ => None,
        }
    }

    /// 変数表に格納する文字列表現
    pub fn to_value_string(&self) -> String {
        match self {
            Expr::Str(text) => text.clone(),
            other => other.to_string(),
        }
    }

    /// 変数表の値を式に戻す
    pub fn from_value_string(value: &str) -> Self {
        if let Ok(number) = value.parse::<i64>() {
            Expr::Integer(number)
        } else if value == "t" || value == "nil" {
            Expr::Symbol(value.to_string())
        } else {
            Expr::Str(value.to_string())
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Integer(number) => write!(f, "{}", number),
            Expr::Str(text) => {
                write!(f, "\"")?;
                for ch in text.chars() {
                    match ch {
                        '"' => write!(f, "\\\"")?,
                        '\\' => write!(f, "\\\\")?,
                        '\n' => write!(f, "\\n")?,
                        '\t' => write!(f, "\\t")?,
                        other => write!(f, "{}", other)?,
                    }
                }
                write!(f, "\"")
            }
            Expr::Symbol(name) => write!(f, "{}", name),
            Expr::List(items) if items.is_empty() => write!(f, "nil"),
            Expr::List(items) => {
                write!(f, "(")?;
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
            Expr::Quote(inner) => write!(f, "'{}", inner),
        }
    }
}
