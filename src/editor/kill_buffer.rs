//! キルバッファ実装
//!
//! 連続したキルは 1 つのテキストへ結合され、次のキルの開始時に空になる。

/// 直前にキルしたテキスト
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct KillBuffer {
    text: String,
}

impl KillBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// 内容を置き換える
    pub fn set(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// 末尾に結合
    pub fn append(&mut self, text: &str) {
        self.text.push_str(text);
    }

    /// 先頭に結合
    pub fn prepend(&mut self, text: &str) {
        let mut joined = String::with_capacity(text.len() + self.text.len());
        joined.push_str(text);
        joined.push_str(&self.text);
        self.text = joined;
    }

    pub fn clear(&mut self) {
        self.text.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_and_prepend_join_kills() {
        let mut kill = KillBuffer::new();
        kill.append("world");
        kill.prepend("hello ");
        kill.append("!");
        assert_eq!(kill.text(), "hello world!");
    }

    #[test]
    fn clear_empties_text() {
        let mut kill = KillBuffer::new();
        kill.set("abc");
        assert!(!kill.is_empty());
        kill.clear();
        assert!(kill.is_empty());
    }
}
