//! キーマップ
//!
//! キー列から機能への対応をトライ木で保持する。子ノードはキーコード順に
//! 並べ、二分探索と一覧表示の順序決定に使う。

use thiserror::Error;

use super::keycode::{render_sequence, Key};

/// キーマップ操作のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeymapError {
    #[error("Key sequence {0} is already bound")]
    Conflict(String),

    #[error("Key sequence {sequence} starts with non-prefix key {prefix}")]
    NonPrefix { sequence: String, prefix: String },

    #[error("Empty key sequence")]
    Empty,
}

/// 検索結果
#[derive(Debug, PartialEq, Eq)]
pub enum Lookup<'a, F> {
    /// 機能が割り当てられている
    Bound(&'a F),
    /// さらにキーが続く
    Prefix,
    /// 該当なし
    Undefined,
}

#[derive(Debug, Clone)]
struct Leaf<F> {
    key: Key,
    func: Option<F>,
    children: Vec<Leaf<F>>,
}

impl<F> Leaf<F> {
    fn new(key: Key) -> Self {
        Self {
            key,
            func: None,
            children: Vec::new(),
        }
    }

    fn child(&self, key: Key) -> Option<&Leaf<F>> {
        self.children
            .binary_search_by(|leaf| leaf.key.cmp(&key))
            .ok()
            .map(|index| &self.children[index])
    }

    fn child_or_insert(&mut self, key: Key) -> &mut Leaf<F> {
        let index = match self.children.binary_search_by(|leaf| leaf.key.cmp(&key)) {
            Ok(index) => index,
            Err(index) => {
                self.children.insert(index, Leaf::new(key));
                index
            }
        };
        &mut self.children[index]
    }
}

/// キー列のトライ木
#[derive(Debug, Clone)]
pub struct Keymap<F> {
    root: Leaf<F>,
}

impl<F> Default for Keymap<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F> Keymap<F> {
    pub fn new() -> Self {
        Self {
            root: Leaf::new(Key::from_char('\0')),
        }
    }

    /// 新しい割り当てを追加する。既存の割り当てとの衝突はエラー。
    pub fn bind(&mut self, keys: &[Key], func: F) -> Result<(), KeymapError> {
        self.insert(keys, func, false)
    }

    /// 割り当てを上書きする
    pub fn rebind(&mut self, keys: &[Key], func: F) -> Result<(), KeymapError> {
        self.insert(keys, func, true)
    }

    fn insert(&mut self, keys: &[Key], func: F, replace: bool) -> Result<(), KeymapError> {
        if keys.is_empty() {
            return Err(KeymapError::Empty);
        }
        // 途中のキーに機能があれば接頭辞として使えない
        let mut node = &self.root;
        for (depth, key) in keys[..keys.len() - 1].iter().enumerate() {
            match node.child(*key) {
                Some(child) if child.func.is_some() => {
                    return Err(KeymapError::NonPrefix {
                        sequence: render_sequence(keys),
                        prefix: render_sequence(&keys[..=depth]),
                    });
                }
                Some(child) => node = child,
                None => break,
            }
        }

        let mut node = &mut self.root;
        for key in keys {
            node = node.child_or_insert(*key);
        }
        if !replace && (node.func.is_some() || !node.children.is_empty()) {
            return Err(KeymapError::Conflict(render_sequence(keys)));
        }
        node.children.clear();
        node.func = Some(func);
        Ok(())
    }

    /// キー列を引く
    pub fn lookup(&self, keys: &[Key]) -> Lookup<'_, F> {
        let mut node = &self.root;
        for key in keys {
            match node.child(*key) {
                Some(child) => node = child,
                None => return Lookup::Undefined,
            }
        }
        match &node.func {
            Some(func) => Lookup::Bound(func),
            None if !node.children.is_empty() && !keys.is_empty() => Lookup::Prefix,
            None => Lookup::Undefined,
        }
    }

    /// 割り当て済みのキー列を深さ優先で列挙する
    pub fn walk(&self, mut visit: impl FnMut(&str, &F)) {
        let mut path = Vec::new();
        for child in &self.root.children {
            Self::walk_leaf(child, &mut path, &mut visit);
        }
    }

    fn walk_leaf(leaf: &Leaf<F>, path: &mut Vec<Key>, visit: &mut impl FnMut(&str, &F)) {
        path.push(leaf.key);
        if let Some(func) = &leaf.func {
            visit(&render_sequence(path), func);
        }
        for child in &leaf.children {
            Self::walk_leaf(child, path, visit);
        }
        path.pop();
    }
}

impl<F: PartialEq> Keymap<F> {
    /// `func` に割り当てられたキー列の一覧
    pub fn where_is(&self, func: &F) -> Vec<String> {
        let mut found = Vec::new();
        self.walk(|keys, bound| {
            if bound == func {
                found.push(keys.to_string());
            }
        });
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(text: &str) -> Vec<Key> {
        Key::parse_sequence(text).unwrap()
    }

    #[test]
    fn prefix_and_exact_lookup() {
        let mut map = Keymap::new();
        map.bind(&keys("C-x C-f"), "find-file").unwrap();
        map.bind(&keys("C-x C-s"), "save-buffer").unwrap();
        map.bind(&keys("C-f"), "forward-char").unwrap();

        assert_eq!(map.lookup(&keys("C-f")), Lookup::Bound(&"forward-char"));
        assert_eq!(map.lookup(&keys("C-x")), Lookup::Prefix);
        assert_eq!(map.lookup(&keys("C-x C-s")), Lookup::Bound(&"save-buffer"));
        assert_eq!(map.lookup(&keys("C-x q")), Lookup::Undefined);
        assert_eq!(map.lookup(&keys("C-q")), Lookup::Undefined);
    }

    #[test]
    fn conflicts_are_rejected() {
        let mut map = Keymap::new();
        map.bind(&keys("C-x C-f"), 1).unwrap();
        assert_eq!(
            map.bind(&keys("C-x C-f"), 2),
            Err(KeymapError::Conflict("C-x C-f".to_string()))
        );
        assert!(map.bind(&keys("C-x"), 3).is_err());
        assert!(matches!(
            map.bind(&keys("C-x C-f a"), 4),
            Err(KeymapError::NonPrefix { .. })
        ));
    }

    #[test]
    fn rebind_overrides() {
        let mut map = Keymap::new();
        map.bind(&keys("C-c a"), 1).unwrap();
        map.rebind(&keys("C-c a"), 2).unwrap();
        assert_eq!(map.lookup(&keys("C-c a")), Lookup::Bound(&2));
    }

    #[test]
    fn walk_is_sorted_by_key_code() {
        let mut map = Keymap::new();
        map.bind(&keys("b"), "b").unwrap();
        map.bind(&keys("C-x b"), "cxb").unwrap();
        map.bind(&keys("a"), "a").unwrap();
        map.bind(&keys("C-x a"), "cxa").unwrap();

        let mut seen = Vec::new();
        map.walk(|keys, func| seen.push(format!("{}={}", keys, func)));
        assert_eq!(seen, vec!["a=a", "b=b", "C-x a=cxa", "C-x b=cxb"]);
        assert_eq!(map.where_is(&"cxa"), vec!["C-x a".to_string()]);
    }
}
