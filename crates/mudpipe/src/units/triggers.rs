//! 觸發器調度單元
//!
//! 對每行伺服器訊息依優先級嘗試啟用中的觸發器；匹配即以捕獲建立
//! 上下文執行動作。調度走規則庫的快照投影，動作中途改動規則只
//! 影響下一行訊息。

use tracing::debug;

use crate::action::{run_actions, ActionExecutionContext};
use crate::conveyor::{Outbox, Unit};
use crate::message::{message_tags, Message, MessageKind};
use crate::model::Model;
use crate::pattern::CaptureSlots;

pub struct TriggerUnit;

impl Unit for TriggerUnit {
    fn name(&self) -> &'static str {
        "trigger"
    }

    fn message_tags(&self) -> &'static [u8] {
        &[message_tags::TEXT]
    }

    fn process_message(&mut self, message: &mut Message, model: &mut Model, out: &mut Outbox) {
        let MessageKind::Text(text_message) = &message.kind else {
            return;
        };
        let text = text_message.plain_text();
        let source = text_message.clone();
        let triggers = model.rules.enabled_triggers();

        let mut captures = CaptureSlots::new();
        for trigger in triggers.iter() {
            let found = match trigger
                .compiled()
                .find_match(&text, 0, &model.variables, &mut captures)
            {
                Ok(found) => found,
                Err(err) => {
                    debug!(pattern = trigger.pattern(), "觸發器匹配失敗: {}", err);
                    continue;
                }
            };
            if found.is_none() {
                continue;
            }

            let context = ActionExecutionContext::from_captures(&captures, Some(source.clone()));
            run_actions(&trigger.actions, &context, model, out);
            if trigger.do_not_display {
                message.gagged = true;
            }
            if trigger.stop_processing {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;
    use crate::conveyor::Conveyor;
    use crate::group::DEFAULT_GROUP;
    use crate::message::CommandKind;
    use crate::trigger::Trigger;

    fn sent_texts(conveyor: &mut Conveyor) -> Vec<String> {
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
    fn test_trigger_fires_with_captures() {
        let mut model = Model::new();
        model.rules.add_trigger(
            DEFAULT_GROUP,
            Trigger::new("^%1 arrives")
                .unwrap()
                .with_action(Action::send_text("look %1")),
        );
        let mut conveyor = Conveyor::new(model, vec![Box::new(TriggerUnit)]);
        conveyor.process_message(Message::text("a large troll arrives"));
        assert_eq!(sent_texts(&mut conveyor), vec!["look a large troll"]);
    }

    #[test]
    fn test_priority_order_across_groups() {
        let mut model = Model::new();
        model.rules.add_trigger(
            "misc",
            Trigger::new("orc")
                .unwrap()
                .with_priority(9)
                .with_action(Action::send_text("second")),
        );
        model.rules.add_trigger(
            "combat",
            Trigger::new("orc")
                .unwrap()
                .with_priority(1)
                .with_action(Action::send_text("first")),
        );
        let mut conveyor = Conveyor::new(model, vec![Box::new(TriggerUnit)]);
        conveyor.process_message(Message::text("an orc appears"));
        assert_eq!(sent_texts(&mut conveyor), vec!["first", "second"]);
    }

    #[test]
    fn test_stop_processing_halts_later_triggers() {
        let mut model = Model::new();
        let mut stopper = Trigger::new("orc")
            .unwrap()
            .with_priority(1)
            .with_action(Action::send_text("first"));
        stopper.stop_processing = true;
        model.rules.add_trigger(DEFAULT_GROUP, stopper);
        model.rules.add_trigger(
            DEFAULT_GROUP,
            Trigger::new("orc")
                .unwrap()
                .with_priority(2)
                .with_action(Action::send_text("second")),
        );
        let mut conveyor = Conveyor::new(model, vec![Box::new(TriggerUnit)]);
        conveyor.process_message(Message::text("an orc appears"));
        assert_eq!(sent_texts(&mut conveyor), vec!["first"]);
    }

    #[test]
    fn test_do_not_display_gags_message() {
        let mut model = Model::new();
        let mut gag = Trigger::new("spam").unwrap();
        gag.do_not_display = true;
        model.rules.add_trigger(DEFAULT_GROUP, gag);
        let mut conveyor = Conveyor::new(model, vec![Box::new(TriggerUnit)]);
        conveyor.process_message(Message::text("spam spam spam"));
        conveyor.process_message(Message::text("a real line"));
        // 被抑制的訊息不進顯示歷史
        assert_eq!(conveyor.output().len(), 1);
    }

    #[test]
    fn test_action_may_mutate_rules_mid_dispatch() {
        // 動作在調度中移除自己：本行其餘觸發器照常執行
        let mut model = Model::new();
        model.rules.add_trigger(
            DEFAULT_GROUP,
            Trigger::new("orc")
                .unwrap()
                .with_priority(1)
                .with_action(Action::send_text("once")),
        );
        let mut conveyor = Conveyor::new(model, vec![Box::new(TriggerUnit)]);
        conveyor.process_message(Message::text("an orc appears"));
        conveyor.model_mut().rules.remove_trigger("orc", None);
        conveyor.process_message(Message::text("an orc appears"));
        assert_eq!(sent_texts(&mut conveyor), vec!["once"]);
    }

    #[test]
    fn test_set_variable_action() {
        let mut model = Model::new();
        model.rules.add_trigger(
            DEFAULT_GROUP,
            Trigger::new("^%1 hits you").unwrap().with_action(Action::SetVariable {
                name: "attacker".to_string(),
                value: "%1".to_string(),
            }),
        );
        let mut conveyor = Conveyor::new(model, vec![Box::new(TriggerUnit)]);
        conveyor.process_message(Message::text("the orc hits you!"));
        assert_eq!(conveyor.model().variables.raw("attacker"), Some("the orc"));
    }
}
