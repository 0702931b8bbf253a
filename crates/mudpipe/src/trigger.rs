//! 觸發器模組
//!
//! 匹配內送訊息並依序執行動作。全域啟用清單依優先級排序快取於
//! [`RuleStore`](crate::group::RuleStore)。

use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::pattern::{CompiledPattern, PatternError};

/// 觸發器
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trigger {
    pattern: String,
    #[serde(skip)]
    compiled: CompiledPattern,
    pub actions: Vec<Action>,
    /// 優先級，數值小者先觸發
    pub priority: i32,
    /// 觸發後停止處理此訊息的後續觸發器
    pub stop_processing: bool,
    /// 不顯示原始訊息（下游顯示與日誌單元跳過）
    pub do_not_display: bool,
}

impl Trigger {
    pub const DEFAULT_PRIORITY: i32 = 5;

    pub fn new(pattern: impl Into<String>) -> Result<Self, PatternError> {
        let pattern = pattern.into();
        let compiled = CompiledPattern::compile(&pattern)?;
        Ok(Self {
            pattern,
            compiled,
            actions: Vec::new(),
            priority: Self::DEFAULT_PRIORITY,
            stop_processing: false,
            do_not_display: false,
        })
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn compiled(&self) -> &CompiledPattern {
        &self.compiled
    }

    /// 重新指定樣式字串並立即重新編譯
    pub fn set_pattern(&mut self, pattern: impl Into<String>) -> Result<(), PatternError> {
        let pattern = pattern.into();
        self.compiled = CompiledPattern::compile(&pattern)?;
        self.pattern = pattern;
        Ok(())
    }

    /// 反序列化後重建編譯結果
    pub fn recompile(&mut self) -> Result<(), PatternError> {
        self.compiled = CompiledPattern::compile(&self.pattern)?;
        Ok(())
    }
}
