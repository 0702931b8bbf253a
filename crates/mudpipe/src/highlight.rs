//! 高亮規則模組
//!
//! 為訊息中匹配樣式的片段上色，不改變文字內容。

use serde::{Deserialize, Serialize};

use crate::message::{TextColor, TextMessage};
use crate::pattern::{CaptureSlots, CompiledPattern, PatternError};
use crate::variables::VariableStore;

/// 高亮規則
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Highlight {
    pattern: String,
    #[serde(skip)]
    compiled: CompiledPattern,
    pub foreground: Option<TextColor>,
    pub background: Option<TextColor>,
}

impl Highlight {
    pub fn new(
        pattern: impl Into<String>,
        foreground: Option<TextColor>,
    ) -> Result<Self, PatternError> {
        let pattern = pattern.into();
        let compiled = CompiledPattern::compile(&pattern)?;
        Ok(Self {
            pattern,
            compiled,
            foreground,
            background: None,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// 反序列化後重建編譯結果
    pub fn recompile(&mut self) -> Result<(), PatternError> {
        self.compiled = CompiledPattern::compile(&self.pattern)?;
        Ok(())
    }

    /// 為所有匹配片段上色，回傳上色次數
    pub fn apply(
        &self,
        message: &mut TextMessage,
        variables: &VariableStore,
    ) -> Result<usize, PatternError> {
        let text = message.plain_text();
        let mut captures = CaptureSlots::new();
        let mut cursor = 0usize;
        let mut count = 0usize;

        while let Some((start, end)) =
            self.compiled
                .find_match(&text, cursor, variables, &mut captures)?
        {
            if start == end {
                break;
            }
            message.colorize_range(start, end, self.foreground, self.background);
            cursor = end;
            count += 1;
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_highlight_all_matches() {
        let red = TextColor::new(0xbb, 0, 0);
        let highlight = Highlight::new("orc", Some(red)).unwrap();
        let vars = VariableStore::new();
        let mut message = TextMessage::from_plain("orc and orc");
        let count = highlight.apply(&mut message, &vars).unwrap();
        assert_eq!(count, 2);
        assert_eq!(message.plain_text(), "orc and orc");
        let colored: Vec<_> = message
            .spans
            .iter()
            .filter(|s| s.foreground == Some(red))
            .collect();
        assert_eq!(colored.len(), 2);
    }
}
