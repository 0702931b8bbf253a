//! 替換規則模組
//!
//! 就地改寫內送訊息的匹配片段。改寫以游標反覆進行：每次自游標位置
//! 匹配、以渲染後的替換文字縫合片段，游標前進到
//! `匹配起點 + 替換長度`；空匹配直接停止。替換文字再匹配也不會
//! 無窮迴圈。

use serde::{Deserialize, Serialize};

use crate::message::{TextColor, TextMessage};
use crate::pattern::{
    parse_tokens, render_tokens, CaptureSlots, CompiledPattern, PatternError, PatternToken,
};
use crate::variables::VariableStore;

/// 替換規則
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Substitution {
    pattern: String,
    #[serde(skip)]
    compiled: CompiledPattern,
    replacement: String,
    /// 替換模板的節點序列，`%N` 引用本次匹配的捕獲
    #[serde(skip)]
    replacement_tokens: Vec<PatternToken>,
    /// 替換文字的前景色；`None` 表示不帶顏色
    pub foreground: Option<TextColor>,
}

impl Substitution {
    pub fn new(
        pattern: impl Into<String>,
        replacement: impl Into<String>,
    ) -> Result<Self, PatternError> {
        let pattern = pattern.into();
        let replacement = replacement.into();
        let compiled = CompiledPattern::compile(&pattern)?;
        let replacement_tokens = parse_tokens(&replacement);
        Ok(Self {
            pattern,
            compiled,
            replacement,
            replacement_tokens,
            foreground: None,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    /// 反序列化後重建編譯結果
    pub fn recompile(&mut self) -> Result<(), PatternError> {
        self.compiled = CompiledPattern::compile(&self.pattern)?;
        self.replacement_tokens = parse_tokens(&self.replacement);
        Ok(())
    }

    /// 對訊息套用替換，回傳改寫次數
    pub fn apply(
        &self,
        message: &mut TextMessage,
        variables: &VariableStore,
    ) -> Result<usize, PatternError> {
        let mut captures = CaptureSlots::new();
        let mut cursor = 0usize;
        let mut count = 0usize;

        loop {
            let text = message.plain_text();
            let Some((start, end)) =
                self.compiled
                    .find_match(&text, cursor, variables, &mut captures)?
            else {
                break;
            };
            if start == end {
                // 空匹配不前進，繼續改寫會無窮迴圈
                break;
            }
            let rendered = render_tokens(&self.replacement_tokens, &captures, variables)?;
            message.replace_range(start, end, &rendered, self.foreground);
            cursor = start + rendered.len();
            count += 1;
        }
        Ok(count)
    }
}
