//! 樣式（Pattern）編譯與匹配模組
//!
//! 支援兩種樣式語言：
//! - 萬用字元：`%0`..`%9` 為捕獲槽、`$name` 為變數引用、`{}` 為字面巢狀、
//!   開頭 `^` 錨定行首；重複出現的 `%N` 視為對第一次捕獲的回溯引用
//! - 正則模式：前後以 `/` 包住的字面正則表達式
//!
//! 編譯結果為不可變值物件；規則的樣式字串重新指定時由呼叫端明確重新編譯。

use fancy_regex::Regex as FancyRegex;
use thiserror::Error;

use crate::braces::depth_chars;
use crate::variables::{VariableError, VariableStore};

/// 捕獲槽數量上限
pub const CAPTURE_SLOTS: usize = 10;

/// 樣式錯誤
#[derive(Debug, Error)]
pub enum PatternError {
    #[error("正則表達式無效: {0}")]
    Regex(String),

    #[error(transparent)]
    Variable(#[from] VariableError),
}

/// 編譯後的樣式節點
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternToken {
    /// 字面文字
    Literal(String),
    /// 捕獲槽 %0..%9
    Capture(u8),
    /// 變數引用，匹配時才解析
    Variable(String),
}

/// 10 格捕獲槽
///
/// 每次匹配嘗試之間必須清空，避免前一次的捕獲外漏到下一次。
#[derive(Debug, Clone, Default)]
pub struct CaptureSlots {
    slots: [Option<String>; CAPTURE_SLOTS],
}

impl CaptureSlots {
    pub fn new() -> Self {
        Self::default()
    }

    /// 清空所有槽位
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
    }

    /// 取得槽位值，未綁定的槽位回傳空字串
    pub fn get(&self, index: usize) -> &str {
        self.slots
            .get(index)
            .and_then(|s| s.as_deref())
            .unwrap_or("")
    }

    /// 槽位是否已在本次匹配中綁定
    pub fn is_set(&self, index: usize) -> bool {
        self.slots.get(index).is_some_and(|s| s.is_some())
    }

    pub fn set(&mut self, index: usize, value: impl Into<String>) {
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = Some(value.into());
        }
    }

    fn unset(&mut self, index: usize) {
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = None;
        }
    }
}

/// 編譯後的樣式
#[derive(Debug, Clone)]
pub enum CompiledPattern {
    /// 萬用字元樣式
    Wildcard {
        tokens: Vec<PatternToken>,
        /// 開頭 `^` 錨定
        anchored: bool,
    },
    /// 字面正則樣式（`/.../`）
    Regex {
        source: String,
        /// 含變數引用的正則無法預編譯，匹配時替換變數後再編譯
        compiled: Option<FancyRegex>,
    },
}

impl Default for CompiledPattern {
    fn default() -> Self {
        Self::Wildcard {
            tokens: Vec::new(),
            anchored: false,
        }
    }
}

impl CompiledPattern {
    /// 編譯樣式字串
    ///
    /// 前後以 `/` 包住者視為字面正則，其餘視為萬用字元樣式。
    pub fn compile(pattern: &str) -> Result<Self, PatternError> {
        if pattern.len() >= 2 && pattern.starts_with('/') && pattern.ends_with('/') {
            let source = &pattern[1..pattern.len() - 1];
            let compiled = if contains_variable_token(source) {
                None
            } else {
                Some(FancyRegex::new(source).map_err(|e| PatternError::Regex(e.to_string()))?)
            };
            return Ok(Self::Regex {
                source: source.to_string(),
                compiled,
            });
        }

        let (tokens, anchored) = compile_wildcard(pattern);
        Ok(Self::Wildcard { tokens, anchored })
    }

    /// 從指定位移開始匹配文字
    ///
    /// 成功時回傳匹配範圍（位元組位移），並把捕獲寫入 `captures`；
    /// 每次呼叫都會先清空捕獲槽。
    pub fn find_match(
        &self,
        text: &str,
        offset: usize,
        variables: &VariableStore,
        captures: &mut CaptureSlots,
    ) -> Result<Option<(usize, usize)>, PatternError> {
        captures.clear();
        if offset > text.len() {
            return Ok(None);
        }

        match self {
            Self::Wildcard { tokens, anchored } => {
                let resolved = resolve_tokens(tokens, variables)?;
                Ok(match_wildcard(&resolved, *anchored, text, offset, captures))
            }
            Self::Regex { source, compiled } => {
                let found = match compiled {
                    Some(regex) => regex
                        .captures_from_pos(text, offset)
                        .map_err(|e| PatternError::Regex(e.to_string()))?,
                    None => {
                        // 變數值只有匹配時才知道，替換（並轉義）後重新編譯
                        let (expanded, _) = variables.expand_escaped(source)?;
                        let regex = FancyRegex::new(&expanded)
                            .map_err(|e| PatternError::Regex(e.to_string()))?;
                        regex
                            .captures_from_pos(text, offset)
                            .map_err(|e| PatternError::Regex(e.to_string()))?
                    }
                };

                Ok(found.map(|caps| {
                    let whole = caps.get(0).expect("捕獲 0 即整體匹配，必然存在");
                    captures.set(0, whole.as_str());
                    for index in 1..CAPTURE_SLOTS {
                        if let Some(group) = caps.get(index) {
                            captures.set(index, group.as_str());
                        }
                    }
                    (whole.start(), whole.end())
                }))
            }
        }
    }
}

/// 解析一段替換模板為樣式節點序列（不處理行首錨點）
pub fn parse_tokens(text: &str) -> Vec<PatternToken> {
    parse_token_sequence(text)
}

/// 以捕獲值與變數渲染樣式節點序列
pub fn render_tokens(
    tokens: &[PatternToken],
    captures: &CaptureSlots,
    variables: &VariableStore,
) -> Result<String, VariableError> {
    let mut out = String::new();
    for token in tokens {
        match token {
            PatternToken::Literal(text) => out.push_str(text),
            PatternToken::Capture(n) => out.push_str(captures.get(*n as usize)),
            PatternToken::Variable(name) => out.push_str(&variables.resolve(name)?),
        }
    }
    Ok(out)
}

/// 萬用字元樣式轉正則表達式
///
/// 字面片段逐一轉義（開頭錨點 `^` 不轉義）；`%N` 第一次出現轉為
/// 具名貪婪群組 `(?<pN>.*)`，之後的出現轉為同名回溯引用 `\k<pN>`；
/// 變數引用保留原樣，由匹配時替換。
pub fn wildcard_to_regex(pattern: &str) -> String {
    let (tokens, anchored) = compile_wildcard(pattern);
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut seen = [false; CAPTURE_SLOTS];

    if anchored {
        out.push('^');
    }
    for token in tokens {
        match token {
            PatternToken::Literal(text) => out.push_str(&regex::escape(&text)),
            PatternToken::Capture(n) => {
                if seen[n as usize] {
                    out.push_str(&format!(r"\k<p{}>", n));
                } else {
                    seen[n as usize] = true;
                    out.push_str(&format!("(?<p{}>.*)", n));
                }
            }
            PatternToken::Variable(name) => {
                out.push('$');
                out.push_str(&name);
            }
        }
    }
    out
}

/// 正則原始碼是否含有變數引用
///
/// 結尾的孤立 `$` 是行尾錨點而非變數。
fn contains_variable_token(source: &str) -> bool {
    let mut chars = source.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '$' {
            if let Some(&next) = chars.peek() {
                if next.is_ascii_alphabetic() || next == '_' {
                    return true;
                }
            }
        }
    }
    false
}

/// 編譯萬用字元樣式，回傳節點序列與是否錨定行首
fn compile_wildcard(pattern: &str) -> (Vec<PatternToken>, bool) {
    let (anchored, body) = match pattern.strip_prefix('^') {
        Some(rest) => (true, rest),
        None => (false, pattern),
    };
    (parse_token_sequence(body), anchored)
}

fn parse_token_sequence(text: &str) -> Vec<PatternToken> {
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut iter = depth_chars(text).peekable();

    while let Some((_, c, depth)) = iter.next() {
        if depth > 0 {
            // 括號內一律字面，巢狀括號本身也保留
            literal.push(c);
            continue;
        }
        match c {
            // 最外層括號只界定範圍，不進入字面
            '{' | '}' => {}
            '%' => {
                let digit = iter.peek().and_then(|&(_, n, _)| n.to_digit(10));
                if let Some(d) = digit {
                    flush_literal(&mut tokens, &mut literal);
                    tokens.push(PatternToken::Capture(d as u8));
                    iter.next();
                } else {
                    literal.push('%');
                }
            }
            '$' => {
                let mut name = String::new();
                if iter
                    .peek()
                    .is_some_and(|&(_, n, _)| n.is_ascii_alphabetic() || n == '_')
                {
                    while let Some(&(_, n, _)) = iter.peek() {
                        if n.is_ascii_alphanumeric() || n == '_' {
                            name.push(n);
                            iter.next();
                        } else {
                            break;
                        }
                    }
                }
                if name.is_empty() {
                    literal.push('$');
                } else {
                    flush_literal(&mut tokens, &mut literal);
                    tokens.push(PatternToken::Variable(name));
                }
            }
            _ => literal.push(c),
        }
    }
    flush_literal(&mut tokens, &mut literal);
    tokens
}

fn flush_literal(tokens: &mut Vec<PatternToken>, literal: &mut String) {
    if !literal.is_empty() {
        tokens.push(PatternToken::Literal(std::mem::take(literal)));
    }
}

/// 將變數節點解析為字面節點
fn resolve_tokens(
    tokens: &[PatternToken],
    variables: &VariableStore,
) -> Result<Vec<PatternToken>, VariableError> {
    tokens
        .iter()
        .map(|token| match token {
            PatternToken::Variable(name) => {
                Ok(PatternToken::Literal(variables.resolve(name)?))
            }
            other => Ok(other.clone()),
        })
        .collect()
}

fn match_wildcard(
    tokens: &[PatternToken],
    anchored: bool,
    text: &str,
    offset: usize,
    captures: &mut CaptureSlots,
) -> Option<(usize, usize)> {
    if anchored {
        if offset > 0 {
            return None;
        }
        captures.clear();
        return match_at(tokens, text, 0, captures).map(|end| (0, end));
    }

    let mut start = offset;
    loop {
        // 第一個節點是字面時直接跳到下一個出現位置
        if let Some(PatternToken::Literal(first)) = tokens.first() {
            match text[start..].find(first.as_str()) {
                Some(found) => start += found,
                None => return None,
            }
        }

        captures.clear();
        if let Some(end) = match_at(tokens, text, start, captures) {
            return Some((start, end));
        }

        match text[start..].chars().next() {
            Some(c) => start += c.len_utf8(),
            None => return None,
        }
    }
}

/// 在固定位置遞迴匹配節點序列，回傳匹配結尾位移
fn match_at(
    tokens: &[PatternToken],
    text: &str,
    pos: usize,
    captures: &mut CaptureSlots,
) -> Option<usize> {
    let Some((token, rest)) = tokens.split_first() else {
        return Some(pos);
    };

    match token {
        PatternToken::Literal(lit) => {
            if text[pos..].starts_with(lit.as_str()) {
                match_at(rest, text, pos + lit.len(), captures)
            } else {
                None
            }
        }
        PatternToken::Capture(n) => {
            let index = *n as usize;
            if captures.is_set(index) {
                // 回溯引用：必須與第一次捕獲完全相同
                let bound = captures.get(index).to_string();
                if text[pos..].starts_with(bound.as_str()) {
                    match_at(rest, text, pos + bound.len(), captures)
                } else {
                    None
                }
            } else {
                // 貪婪：由最長往回嘗試
                let mut end = text.len();
                loop {
                    captures.set(index, &text[pos..end]);
                    if let Some(matched_end) = match_at(rest, text, end, captures) {
                        return Some(matched_end);
                    }
                    captures.unset(index);
                    if end == pos {
                        return None;
                    }
                    end -= 1;
                    while end > pos && !text.is_char_boundary(end) {
                        end -= 1;
                    }
                }
            }
        }
        // 變數節點在 resolve_tokens 已展開為字面
        PatternToken::Variable(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variables::VariableStore;

    fn find(pattern: &str, text: &str) -> Option<(usize, usize, Vec<String>)> {
        let compiled = CompiledPattern::compile(pattern).unwrap();
        let vars = VariableStore::new();
        let mut captures = CaptureSlots::new();
        compiled
            .find_match(text, 0, &vars, &mut captures)
            .unwrap()
            .map(|(s, e)| {
                let caps = (0..CAPTURE_SLOTS)
                    .map(|i| captures.get(i).to_string())
                    .collect();
                (s, e, caps)
            })
    }

    #[test]
    fn test_literal_match() {
        let (start, end, _) = find("orc", "an orc arrives").unwrap();
        assert_eq!(&"an orc arrives"[start..end], "orc");
    }

    #[test]
    fn test_capture_roundtrip() {
        let (_, _, caps) = find("%0 tells you '%1'", "Gandalf tells you 'flee'").unwrap();
        assert_eq!(caps[0], "Gandalf");
        assert_eq!(caps[1], "flee");
    }

    #[test]
    fn test_greedy_capture() {
        // 貪婪語意：%0 吃到最後一個可行位置
        let (_, _, caps) = find("%0 coins", "10 coins and 5 coins").unwrap();
        assert_eq!(caps[0], "10 coins and 5");
    }

    #[test]
    fn test_anchored_pattern() {
        assert!(find("^You see", "You see a troll").is_some());
        assert!(find("^You see", "Suddenly You see a troll").is_none());
    }

    #[test]
    fn test_backreference_slot() {
        // 重複的 %1 必須與第一次捕獲一致
        let (_, _, caps) = find("^%1 hits %1!", "orc hits orc!").unwrap();
        assert_eq!(caps[1], "orc");
        assert!(find("^%1 hits %1!", "orc hits troll!").is_none());
    }

    #[test]
    fn test_braces_make_percent_literal() {
        // 括號內的 % 不展開為捕獲槽
        assert!(find("{%1} done", "%1 done").is_some());
        assert!(find("{%1} done", "anything done").is_none());
    }

    #[test]
    fn test_nested_braces_literal() {
        let tokens = parse_tokens("{a{b}c}");
        assert_eq!(tokens, vec![PatternToken::Literal("a{b}c".to_string())]);
    }

    #[test]
    fn test_variable_in_pattern() {
        let mut vars = VariableStore::new();
        vars.set("target", "goblin");
        let compiled = CompiledPattern::compile("$target dies").unwrap();
        let mut captures = CaptureSlots::new();
        let found = compiled
            .find_match("the goblin dies here", 0, &vars, &mut captures)
            .unwrap();
        assert!(found.is_some());
    }

    #[test]
    fn test_regex_mode() {
        let (_, _, caps) = find("/(\\d+) gold/", "you get 42 gold now").unwrap();
        assert_eq!(caps[0], "42 gold");
        assert_eq!(caps[1], "42");
    }

    #[test]
    fn test_regex_trailing_dollar_is_anchor() {
        let compiled = CompiledPattern::compile("/end$/").unwrap();
        assert!(matches!(
            compiled,
            CompiledPattern::Regex { compiled: Some(_), .. }
        ));
    }

    #[test]
    fn test_regex_with_variable_recompiles() {
        let compiled = CompiledPattern::compile("/$prey flees/").unwrap();
        assert!(matches!(
            compiled,
            CompiledPattern::Regex { compiled: None, .. }
        ));

        let mut vars = VariableStore::new();
        vars.set("prey", "a.wolf"); // 值裡的 . 必須被轉義
        let mut captures = CaptureSlots::new();
        assert!(compiled
            .find_match("a.wolf flees", 0, &vars, &mut captures)
            .unwrap()
            .is_some());
        assert!(compiled
            .find_match("aXwolf flees", 0, &vars, &mut captures)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_match_from_offset() {
        let compiled = CompiledPattern::compile("red").unwrap();
        let vars = VariableStore::new();
        let mut captures = CaptureSlots::new();
        let text = "red and red";
        let (s1, e1) = compiled
            .find_match(text, 0, &vars, &mut captures)
            .unwrap()
            .unwrap();
        assert_eq!((s1, e1), (0, 3));
        let (s2, _) = compiled
            .find_match(text, e1, &vars, &mut captures)
            .unwrap()
            .unwrap();
        assert_eq!(s2, 8);
    }

    #[test]
    fn test_captures_cleared_between_attempts() {
        let compiled = CompiledPattern::compile("%3 arrives").unwrap();
        let vars = VariableStore::new();
        let mut captures = CaptureSlots::new();
        compiled
            .find_match("a troll arrives", 0, &vars, &mut captures)
            .unwrap()
            .unwrap();
        assert_eq!(captures.get(3), "a troll");

        // 第二次匹配失敗後不得殘留上一次的捕獲
        assert!(compiled
            .find_match("nothing here", 0, &vars, &mut captures)
            .unwrap()
            .is_none());
        assert_eq!(captures.get(3), "");
    }

    #[test]
    fn test_wildcard_to_regex_escaping() {
        let regex = wildcard_to_regex("^%1 says (hi)");
        assert_eq!(regex, r"^(?<p1>.*) says \(hi\)");
    }

    #[test]
    fn test_wildcard_to_regex_backreference() {
        let regex = wildcard_to_regex("%2 and %2");
        assert_eq!(regex, r"(?<p2>.*) and \k<p2>");
    }

    #[test]
    fn test_invalid_regex_is_error() {
        assert!(CompiledPattern::compile("/([unclosed/").is_err());
    }

    #[test]
    fn test_multibyte_text() {
        let (_, _, caps) = find("你獲得%1金幣", "戰利品：你獲得五十金幣！").unwrap();
        assert_eq!(caps[1], "五十");
    }
}
