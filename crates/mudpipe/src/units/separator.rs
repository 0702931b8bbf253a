//! 命令切分單元
//!
//! 把文字命令在深度 0 的分隔符處切開；整段以大括號包住的片段剝除
//! 一層括號後整段視為一個命令。切分結果帶 `no_split` 標記，
//! 不會被本單元再次處理。

use crate::braces::depth_chars;
use crate::conveyor::{Outbox, Unit};
use crate::message::{command_tags, Command, CommandKind};
use crate::model::Model;

pub struct SeparatorUnit;

impl SeparatorUnit {
    /// 是否為單一成對括號包住的整段
    fn is_braced(text: &str) -> bool {
        if !text.starts_with('{') {
            return false;
        }
        for (i, c, depth) in depth_chars(text) {
            if c == '}' && depth == 0 {
                return i + 1 == text.len();
            }
        }
        false
    }

    fn unwrap_braces(text: &str) -> &str {
        if Self::is_braced(text) {
            &text[1..text.len() - 1]
        } else {
            text
        }
    }
}

impl Unit for SeparatorUnit {
    fn name(&self) -> &'static str {
        "separator"
    }

    fn command_tags(&self) -> &'static [u8] {
        &[command_tags::TEXT]
    }

    fn process_command(&mut self, command: &mut Command, model: &mut Model, out: &mut Outbox) {
        let CommandKind::Text(text_command) = &command.kind else {
            return;
        };
        if text_command.no_split {
            return;
        }

        let text = text_command.text.as_str();
        let separator = model.settings.separator;
        let mut parts: Vec<&str> = Vec::new();
        let mut start = 0usize;
        for (i, c, depth) in depth_chars(text) {
            if c == separator && depth == 0 {
                parts.push(&text[start..i]);
                start = i + separator.len_utf8();
            }
        }
        parts.push(&text[start..]);

        // 沒有分隔符也沒有外層括號：原樣放行
        if parts.len() == 1 && !Self::is_braced(parts[0].trim()) {
            return;
        }

        command.handled = true;
        for part in parts {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            out.push_command(Command::text(Self::unwrap_braces(part)).mark_no_split());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conveyor::Conveyor;
    use crate::message::CommandKind;
    use crate::model::Model;

    fn split(input: &str) -> Vec<String> {
        let mut conveyor = Conveyor::new(Model::new(), vec![Box::new(SeparatorUnit)]);
        conveyor.process_command(Command::text(input));
        conveyor
            .take_outbound()
            .into_iter()
            .filter_map(|c| match c.kind {
                CommandKind::Text(tc) => Some(tc.text),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_split_on_separator() {
        assert_eq!(split("north;east;look"), vec!["north", "east", "look"]);
    }

    #[test]
    fn test_separator_inside_braces_protected() {
        assert_eq!(split("say {hi;all}"), vec!["say {hi;all}"]);
    }

    #[test]
    fn test_braced_whole_command_unwrapped() {
        assert_eq!(split("{say hi;look}"), vec!["say hi;look"]);
    }

    #[test]
    fn test_plain_command_passes_through() {
        assert_eq!(split("look"), vec!["look"]);
    }

    #[test]
    fn test_empty_segments_dropped() {
        assert_eq!(split("north;;east;"), vec!["north", "east"]);
    }
}
