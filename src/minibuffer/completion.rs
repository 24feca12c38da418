//! 補完機能
//!
//! 候補一覧から入力に前方一致するものを絞り込み、共通接頭辞まで補う。
//! ファイル名モードでは入力のディレクトリ部分を読んで候補を作る。

use std::fs;
use std::path::PathBuf;

/// 補完の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionStatus {
    /// 一致する候補がない
    NotMatched,
    /// 候補が 1 つに決まった
    Matched,
    /// 入力と同じ候補があるが、それを接頭辞に持つ候補もある
    MatchedNonUnique,
    /// 複数の候補がある
    NonUniqueMatches,
}

/// 1 回のミニバッファ読み込みで使う補完
#[derive(Debug, Clone, Default)]
pub struct Completion {
    candidates: Vec<String>,
    matches: Vec<String>,
    filename: bool,
}

impl Completion {
    pub fn new<I, S>(candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut candidates: Vec<String> = candidates.into_iter().map(Into::into).collect();
        candidates.sort();
        candidates.dedup();
        Self {
            candidates,
            matches: Vec::new(),
            filename: false,
        }
    }

    /// ファイル名補完
    pub fn filename() -> Self {
        Self {
            candidates: Vec::new(),
            matches: Vec::new(),
            filename: true,
        }
    }

    pub fn is_filename(&self) -> bool {
        self.filename
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    /// 直前の `complete` で一致した候補
    pub fn matches(&self) -> &[String] {
        &self.matches
    }

    /// 入力を補完し、状態と補完後の文字列を返す
    pub fn complete(&mut self, input: &str) -> (CompletionStatus, String) {
        if self.filename {
            let (dir, base) = split_dir(input);
            self.candidates = list_directory(dir, base.starts_with('.'));
            let (status, completed) = self.complete_name(base);
            return (status, format!("{}{}", dir, completed));
        }
        self.complete_name(input)
    }

    fn complete_name(&mut self, input: &str) -> (CompletionStatus, String) {
        self.matches = self
            .candidates
            .iter()
            .filter(|candidate| candidate.starts_with(input))
            .cloned()
            .collect();

        match self.matches.len() {
            0 => (CompletionStatus::NotMatched, input.to_string()),
            1 => (CompletionStatus::Matched, self.matches[0].clone()),
            _ => {
                let prefix = common_prefix(&self.matches);
                let status = if self.matches.iter().any(|m| m == &prefix) {
                    CompletionStatus::MatchedNonUnique
                } else {
                    CompletionStatus::NonUniqueMatches
                };
                (status, prefix)
            }
        }
    }

    /// 入力が候補のどれかと完全に一致するか
    pub fn is_exact(&self, input: &str) -> bool {
        self.candidates.iter().any(|candidate| candidate == input)
    }
}

/// 候補の最長共通接頭辞
pub fn common_prefix(candidates: &[String]) -> String {
    let Some(first) = candidates.first() else {
        return String::new();
    };
    let mut len = first.len();
    for candidate in &candidates[1..] {
        len = first
            .char_indices()
            .zip(candidate.chars())
            .take_while(|((_, a), b)| a == b)
            .map(|((i, a), _)| i + a.len_utf8())
            .last()
            .unwrap_or(0)
            .min(len);
    }
    first[..len].to_string()
}

/// 最後の `/` までをディレクトリ部分として分ける
fn split_dir(input: &str) -> (&str, &str) {
    match input.rfind('/') {
        Some(slash) => input.split_at(slash + 1),
        None => ("", input),
    }
}

/// ディレクトリの中身。ディレクトリには `/` を付ける。
fn list_directory(dir: &str, show_hidden: bool) -> Vec<String> {
    let path = if dir.is_empty() {
        PathBuf::from(".")
    } else {
        match shellexpand::full(dir) {
            Ok(expanded) => PathBuf::from(expanded.as_ref()),
            Err(_) => return Vec::new(),
        }
    };
    let Ok(entries) = fs::read_dir(&path) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().into_owned();
            if !show_hidden && name.starts_with('.') {
                return None;
            }
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            Some(if is_dir { format!("{}/", name) } else { name })
        })
        .collect();
    names.sort();
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn words(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_common_prefix() {
        assert_eq!(common_prefix(&words(&["forward-char", "forward-word"])), "forward-");
        assert_eq!(common_prefix(&words(&["single"])), "single");
        assert_eq!(common_prefix(&[]), "");
        assert_eq!(common_prefix(&words(&["日本語", "日本"])), "日本");
    }

    #[test]
    fn test_statuses() {
        let mut completion = Completion::new(["find-file", "find-file-read-only", "forward-char"]);
        assert_eq!(
            completion.complete("x"),
            (CompletionStatus::NotMatched, "x".to_string())
        );
        assert_eq!(
            completion.complete("fo"),
            (CompletionStatus::Matched, "forward-char".to_string())
        );
        assert_eq!(
            completion.complete("fi"),
            (CompletionStatus::MatchedNonUnique, "find-file".to_string())
        );
        assert_eq!(completion.matches().len(), 2);
        assert_eq!(
            completion.complete("f"),
            (CompletionStatus::NonUniqueMatches, "f".to_string())
        );
    }

    #[test]
    fn test_filename_completion() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("alpha.txt"), "").unwrap();
        fs::write(dir.path().join("alpine.txt"), "").unwrap();
        fs::write(dir.path().join(".hidden"), "").unwrap();
        fs::create_dir(dir.path().join("beta")).unwrap();
        let base = format!("{}/", dir.path().display());

        let mut completion = Completion::filename();
        let (status, text) = completion.complete(&format!("{}al", base));
        assert_eq!(status, CompletionStatus::NonUniqueMatches);
        assert_eq!(text, format!("{}alp", base));

        let (status, text) = completion.complete(&format!("{}b", base));
        assert_eq!(status, CompletionStatus::Matched);
        assert_eq!(text, format!("{}beta/", base));

        completion.complete(&base);
        assert_eq!(completion.matches().len(), 3);
    }
}
