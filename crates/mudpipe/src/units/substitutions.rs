//! 替換套用單元
//!
//! 依群組順序對訊息套用啟用中的替換規則，就地改寫匹配片段。

use tracing::debug;

use crate::conveyor::{Outbox, Unit};
use crate::message::{message_tags, Message, MessageKind};
use crate::model::Model;

pub struct SubstitutionUnit;

impl Unit for SubstitutionUnit {
    fn name(&self) -> &'static str {
        "substitution"
    }

    fn message_tags(&self) -> &'static [u8] {
        &[message_tags::TEXT]
    }

    fn process_message(&mut self, message: &mut Message, model: &mut Model, _out: &mut Outbox) {
        let MessageKind::Text(text_message) = &mut message.kind else {
            return;
        };
        for group in model.rules.enabled_groups() {
            for substitution in &group.substitutions {
                if let Err(err) = substitution.apply(text_message, &model.variables) {
                    debug!(pattern = substitution.pattern(), "替換套用失敗: {}", err);
                }
            }
        }
    }
}
