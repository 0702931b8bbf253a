//! 命令別名模組
//!
//! 將簡短輸入展開為動作序列。別名詞以「完全相同」或「詞 + 空格」
//! 匹配輸入；其餘部分綁定到位置參數 `%0` / `%1`。

use serde::{Deserialize, Serialize};

use crate::action::Action;

/// 命令別名
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandAlias {
    /// 別名詞
    pub command: String,
    pub actions: Vec<Action>,
}

impl CommandAlias {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            actions: Vec::new(),
        }
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    /// 嘗試匹配輸入，成功時回傳別名詞之後的剩餘部分
    pub fn match_input<'a>(&self, input: &'a str) -> Option<&'a str> {
        if input == self.command {
            return Some("");
        }
        input
            .strip_prefix(self.command.as_str())
            .and_then(|rest| rest.strip_prefix(' '))
    }
}
