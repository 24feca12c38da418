//! インクリメンタル検索の状態管理

use super::matcher::SearchMatch;

/// 検索語を 1 文字変えるごとに積む状態
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IsearchStep {
    /// 検索パターン
    pub pattern: String,
    /// 検索方向
    pub forward: bool,
    /// 現在のマッチ。未検索なら開始位置の空範囲。
    pub current: SearchMatch,
    /// マッチ失敗状態
    pub failed: bool,
    /// 折り返しが発生したか
    pub wrapped: bool,
}

/// インクリメンタル検索の内部状態
#[derive(Debug, Clone)]
pub struct IsearchState {
    /// 正規表現検索か
    pub regex: bool,
    /// 検索開始時のポイント（文字オフセット）
    pub origin: usize,
    steps: Vec<IsearchStep>,
}

impl IsearchState {
    /// 新しい状態を作成
    pub fn new(origin: usize, forward: bool, regex: bool) -> Self {
        Self {
            regex,
            origin,
            steps: vec![IsearchStep {
                pattern: String::new(),
                forward,
                current: SearchMatch {
                    start: origin,
                    end: origin,
                },
                failed: false,
                wrapped: false,
            }],
        }
    }

    pub fn top(&self) -> &IsearchStep {
        &self.steps[self.steps.len() - 1]
    }

    pub fn push(&mut self, step: IsearchStep) {
        self.steps.push(step);
    }

    /// 1 つ前の状態へ戻る。最初の状態なら `false`。
    pub fn pop(&mut self) -> bool {
        if self.steps.len() <= 1 {
            return false;
        }
        self.steps.pop();
        true
    }

    /// 失敗している状態を捨てて、最後に成功した状態へ戻る
    pub fn pop_failures(&mut self) {
        while self.top().failed && self.pop() {}
    }

    /// ポイントを置く位置。前方検索ならマッチの後ろ、後方なら前。
    pub fn point(&self) -> usize {
        let step = self.top();
        if step.forward {
            step.current.end
        } else {
            step.current.start
        }
    }

    /// エコー行のプロンプト
    pub fn prompt(&self) -> String {
        let step = self.top();
        let mut prompt = String::new();
        if step.failed {
            prompt.push_str("Failing ");
        }
        if step.wrapped {
            prompt.push_str("Wrapped ");
        }
        if self.regex {
            prompt.push_str("Regexp ");
        }
        prompt.push_str("I-search");
        if !step.forward {
            prompt.push_str(" backward");
        }
        prompt.push_str(": ");
        prompt.push_str(&step.pattern);
        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_reflects_state() {
        let mut state = IsearchState::new(0, true, false);
        assert_eq!(state.prompt(), "I-search: ");
        state.push(IsearchStep {
            pattern: "ab".to_string(),
            forward: false,
            current: SearchMatch { start: 0, end: 0 },
            failed: true,
            wrapped: false,
        });
        assert_eq!(state.prompt(), "Failing I-search backward: ab");
    }

    #[test]
    fn pop_failures_returns_to_success() {
        let mut state = IsearchState::new(3, true, true);
        for (pattern, failed) in [("a", false), ("ax", true), ("axy", true)] {
            state.push(IsearchStep {
                pattern: pattern.to_string(),
                forward: true,
                current: SearchMatch { start: 5, end: 6 },
                failed,
                wrapped: false,
            });
        }
        state.pop_failures();
        assert_eq!(state.top().pattern, "a");
        assert_eq!(state.point(), 6);
        assert!(state.pop());
        assert!(!state.pop());
    }
}
