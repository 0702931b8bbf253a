//! 別名展開單元
//!
//! 輸入匹配啟用群組中的別名詞時，以其動作序列取代原命令。
//! `%0` 與 `%1` 都綁定別名詞之後的剩餘部分；末尾的送出動作不含
//! `%0` 也不含 `%1` 時，剩餘部分自動附加在展開結果之後。

use crate::action::{run_actions, Action, ActionExecutionContext};
use crate::braces::depth_chars;
use crate::conveyor::{Outbox, Unit};
use crate::message::{command_tags, Command, CommandKind};
use crate::model::Model;

pub struct AliasUnit;

/// 文字在深度 0 是否引用剩餘部分（`%0` 或 `%1`）
fn references_remainder(text: &str) -> bool {
    let mut previous_percent = false;
    for (_, c, depth) in depth_chars(text) {
        if previous_percent && (c == '0' || c == '1') {
            return true;
        }
        previous_percent = c == '%' && depth == 0;
    }
    false
}

impl Unit for AliasUnit {
    fn name(&self) -> &'static str {
        "alias"
    }

    fn command_tags(&self) -> &'static [u8] {
        &[command_tags::TEXT]
    }

    fn process_command(&mut self, command: &mut Command, model: &mut Model, out: &mut Outbox) {
        let CommandKind::Text(text_command) = &command.kind else {
            return;
        };
        let input = text_command.text.trim().to_string();

        let Some((actions, remainder)) = find_alias(model, &input) else {
            return;
        };
        command.handled = true;

        let mut context = ActionExecutionContext::new();
        context.set_parameter(0, remainder.as_str());
        context.set_parameter(1, remainder.as_str());

        // 隱含尾端引數：末尾的送出動作未引用 %0/%1 時，剩餘部分附加其後
        let mut actions = actions;
        if let Some(Action::SendText { text }) = actions.last_mut() {
            if !remainder.is_empty() && !references_remainder(text) {
                text.push(' ');
                text.push_str(&remainder);
            }
        }
        run_actions(&actions, &context, model, out);
    }
}

fn find_alias(model: &Model, input: &str) -> Option<(Vec<Action>, String)> {
    for group in model.rules.enabled_groups() {
        for alias in &group.aliases {
            if let Some(remainder) = alias.match_input(input) {
                return Some((alias.actions.clone(), remainder.to_string()));
            }
        }
    }
    None
}
