//! 命令倍增單元
//!
//! `#3 say hi` 把 `say hi` 再投遞三次。倍增結果帶 `no_multiply`
//! 標記，不會被本單元再次展開。

use crate::conveyor::{Outbox, Unit};
use crate::message::{command_tags, Command, CommandKind};
use crate::model::Model;

/// 單次倍增上限，避免輸入錯誤灌爆佇列
const MAX_REPEAT: u32 = 1000;

pub struct MultiplierUnit;

impl Unit for MultiplierUnit {
    fn name(&self) -> &'static str {
        "multiplier"
    }

    fn command_tags(&self) -> &'static [u8] {
        &[command_tags::TEXT]
    }

    fn process_command(&mut self, command: &mut Command, model: &mut Model, out: &mut Outbox) {
        let CommandKind::Text(text_command) = &command.kind else {
            return;
        };
        if text_command.no_multiply {
            return;
        }

        let text = text_command.text.trim();
        let Some(body) = text.strip_prefix(model.settings.command_char) else {
            return;
        };
        let digits: String = body.chars().take_while(|c| c.is_ascii_digit()).collect();
        if digits.is_empty() {
            return;
        }
        let rest = body[digits.len()..].trim_start();

        command.handled = true;
        if rest.is_empty() {
            out.error("倍增命令缺少要重複的內容");
            return;
        }
        let Ok(count) = digits.parse::<u32>() else {
            out.error(format!("倍增次數無效: {}", digits));
            return;
        };

        let repeated = strip_outer_braces(rest);
        for _ in 0..count.min(MAX_REPEAT) {
            out.push_command(Command::text(repeated).mark_no_multiply());
        }
    }
}

/// 剝除一層成對的外層括號
fn strip_outer_braces(text: &str) -> &str {
    use crate::braces::depth_chars;
    if !text.starts_with('{') {
        return text;
    }
    for (i, c, depth) in depth_chars(text) {
        if c == '}' && depth == 0 {
            return if i + 1 == text.len() {
                &text[1..i]
            } else {
                text
            };
        }
    }
    text
}
