//! 快捷鍵單元
//!
//! 把按鍵組合命令對應到啟用群組中的快捷鍵動作。沒有對應時命令
//! 原樣標記為已處理（按鍵不會漏到伺服器）。

use crate::action::{run_actions, ActionExecutionContext};
use crate::conveyor::{Outbox, Unit};
use crate::message::{command_tags, Command, CommandKind};
use crate::model::Model;

pub struct HotkeyUnit;

impl Unit for HotkeyUnit {
    fn name(&self) -> &'static str {
        "hotkey"
    }

    fn command_tags(&self) -> &'static [u8] {
        &[command_tags::HOTKEY]
    }

    fn process_command(&mut self, command: &mut Command, model: &mut Model, out: &mut Outbox) {
        let CommandKind::Hotkey(chord) = &command.kind else {
            return;
        };
        command.handled = true;

        let actions: Vec<_> = model
            .rules
            .enabled_groups()
            .flat_map(|g| g.hotkeys.iter())
            .find(|h| h.matches(chord))
            .map(|h| h.actions.clone())
            .unwrap_or_default();
        if actions.is_empty() {
            return;
        }
        let context = ActionExecutionContext::new();
        run_actions(&actions, &context, model, out);
    }
}
