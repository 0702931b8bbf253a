//! 快捷鍵模組

use serde::{Deserialize, Serialize};

use crate::action::Action;

/// 快捷鍵：按鍵組合字串（例如 `F1`、`Ctrl+N`）對應動作序列
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hotkey {
    pub key: String,
    pub actions: Vec<Action>,
}

impl Hotkey {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            actions: Vec::new(),
        }
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    pub fn matches(&self, chord: &str) -> bool {
        self.key.eq_ignore_ascii_case(chord)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chord_match_ignores_case() {
        let hotkey = Hotkey::new("Ctrl+N");
        assert!(hotkey.matches("ctrl+n"));
        assert!(!hotkey.matches("ctrl+m"));
    }
}
