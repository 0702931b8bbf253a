//! 變數替換單元
//!
//! 外送文字命令中的 `$變數` 在離開管線前展開；`$` 之後不是變數
//! 名稱起始字元時視為字面文字。引用了未定義變數的命令整個丟棄並
//! 回報，避免把半展開的文字送到伺服器。

use crate::conveyor::{Outbox, Unit};
use crate::message::{command_tags, Command, CommandKind};
use crate::model::Model;

pub struct VariableReplaceUnit;

impl Unit for VariableReplaceUnit {
    fn name(&self) -> &'static str {
        "variable_replace"
    }

    fn command_tags(&self) -> &'static [u8] {
        &[command_tags::TEXT]
    }

    fn process_command(&mut self, command: &mut Command, model: &mut Model, out: &mut Outbox) {
        let CommandKind::Text(text_command) = &mut command.kind else {
            return;
        };
        if !text_command.text.contains('$') {
            return;
        }

        match model.variables.expand(&text_command.text) {
            Ok((expanded, true)) => {
                text_command.text = expanded;
            }
            Ok((_, false)) => {
                command.handled = true;
                out.error(format!("命令引用了未定義的變數: {}", text_command.text));
            }
            Err(err) => {
                command.handled = true;
                out.error(format!("變數展開失敗: {}", err));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conveyor::Conveyor;
    use crate::message::MessageKind;

    fn run(model: Model, input: &str) -> (Vec<String>, Vec<String>) {
        let mut conveyor = Conveyor::new(model, vec![Box::new(VariableReplaceUnit)]);
        conveyor.process_command(Command::text(input));
        let sent = conveyor
            .take_outbound()
            .into_iter()
            .filter_map(|c| match c.kind {
                CommandKind::Text(tc) => Some(tc.text),
                _ => None,
            })
            .collect();
        let errors = conveyor
            .output()
            .iter()
            .filter_map(|m| match &m.kind {
                MessageKind::Error(text) => Some(text.clone()),
                _ => None,
            })
            .collect();
        (sent, errors)
    }

    #[test]
    fn test_variable_expanded() {
        let mut model = Model::new();
        model.variables.set("target", "orc");
        let (sent, _) = run(model, "kill $target");
        assert_eq!(sent, vec!["kill orc"]);
    }

    #[test]
    fn test_chained_variables_expand_to_fixed_point() {
        let mut model = Model::new();
        model.variables.set("a", "$b");
        model.variables.set("b", "north");
        let (sent, _) = run(model, "go $a");
        assert_eq!(sent, vec!["go north"]);
    }

    #[test]
    fn test_undefined_variable_drops_command() {
        let (sent, errors) = run(Model::new(), "kill $nobody");
        assert!(sent.is_empty());
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_dollar_before_digit_is_literal() {
        let (sent, _) = run(Model::new(), "pay $100");
        assert_eq!(sent, vec!["pay $100"]);
    }

    #[test]
    fn test_cycle_reported() {
        let mut model = Model::new();
        model.variables.set("a", "$b");
        model.variables.set("b", "$a");
        let (sent, errors) = run(model, "go $a");
        assert!(sent.is_empty());
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_plain_command_untouched() {
        let (sent, _) = run(Model::new(), "look");
        assert_eq!(sent, vec!["look"]);
    }
}
