//! 命令引數切分模組
//!
//! 規則定義命令（動詞已由呼叫端剝除）的引數文法：
//! - `{...}` 成對括號取整段為一個引數（支援巢狀；未閉合則取至行尾）
//! - 開頭的非括號片段在第一個空白或括號處切開一次
//! - 其後的引數不是括號段就是以分隔符為界的片段（分隔符只在深度 0 生效）

use crate::braces::depth_chars;

/// 切分引數
pub fn tokenize(args: &str, delimiter: char) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut rest = skip_separators(args, delimiter);
    let mut first = true;

    while !rest.is_empty() {
        let token;
        if rest.starts_with('{') {
            (token, rest) = take_braced(rest);
        } else if first {
            let cut = rest
                .find(|c: char| c == ' ' || c == '{' || c == delimiter)
                .unwrap_or(rest.len());
            token = rest[..cut].to_string();
            rest = &rest[cut..];
        } else {
            (token, rest) = take_until_delimiter(rest, delimiter);
        }
        tokens.push(token);
        first = false;
        rest = skip_separators(rest, delimiter);
    }
    tokens
}

fn skip_separators(text: &str, delimiter: char) -> &str {
    text.trim_start_matches(|c: char| c == ' ' || c == delimiter)
}

/// 自開頭的 `{` 取一個括號段，剝除最外層括號
fn take_braced(text: &str) -> (String, &str) {
    for (i, c, depth) in depth_chars(text) {
        if c == '}' && depth == 0 {
            return (text[1..i].to_string(), &text[i + 1..]);
        }
    }
    // 未閉合：取剩餘整行
    (text[1..].to_string(), "")
}

/// 取至下一個深度 0 分隔符為止的片段
fn take_until_delimiter(text: &str, delimiter: char) -> (String, &str) {
    for (i, c, depth) in depth_chars(text) {
        if c == delimiter && depth == 0 {
            return (
                text[..i].trim_end().to_string(),
                &text[i + delimiter.len_utf8()..],
            );
        }
    }
    (text.trim_end().to_string(), "")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_braced_arguments() {
        let args = tokenize("{^You see} {look} {5} {Combat}", ';');
        assert_eq!(args, vec!["^You see", "look", "5", "Combat"]);
    }

    #[test]
    fn test_leading_word_splits_once() {
        let args = tokenize("kk kill kobold", ';');
        assert_eq!(args, vec!["kk", "kill kobold"]);
    }

    #[test]
    fn test_leading_word_then_brace() {
        let args = tokenize("kk {kill kobold;look}", ';');
        assert_eq!(args, vec!["kk", "kill kobold;look"]);
    }

    #[test]
    fn test_nested_braces_verbatim() {
        let args = tokenize("{outer {inner} tail} {x}", ';');
        assert_eq!(args, vec!["outer {inner} tail", "x"]);
    }

    #[test]
    fn test_unterminated_brace_takes_rest() {
        let args = tokenize("{no closing here", ';');
        assert_eq!(args, vec!["no closing here"]);
    }

    #[test]
    fn test_delimiter_bounded_runs() {
        let args = tokenize("north;south;east", ';');
        assert_eq!(args, vec!["north", "south", "east"]);
    }

    #[test]
    fn test_delimiter_inside_braces_ignored() {
        let args = tokenize("go {a;b};stop", ';');
        assert_eq!(args, vec!["go", "a;b", "stop"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(tokenize("", ';').is_empty());
        assert!(tokenize("   ", ';').is_empty());
    }
}
