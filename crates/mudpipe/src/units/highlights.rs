//! 高亮套用單元
//!
//! 替換之後、日誌之前，為訊息中的匹配片段上色。

use tracing::debug;

use crate::conveyor::{Outbox, Unit};
use crate::message::{message_tags, Message, MessageKind};
use crate::model::Model;

pub struct HighlightUnit;

impl Unit for HighlightUnit {
    fn name(&self) -> &'static str {
        "highlight"
    }

    fn message_tags(&self) -> &'static [u8] {
        &[message_tags::TEXT]
    }

    fn process_message(&mut self, message: &mut Message, model: &mut Model, _out: &mut Outbox) {
        let MessageKind::Text(text_message) = &mut message.kind else {
            return;
        };
        for group in model.rules.enabled_groups() {
            for highlight in &group.highlights {
                if let Err(err) = highlight.apply(text_message, &model.variables) {
                    debug!(pattern = highlight.pattern(), "高亮套用失敗: {}", err);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conveyor::Conveyor;
    use crate::group::DEFAULT_GROUP;
    use crate::highlight::Highlight;
    use crate::message::{MessageKind, TextColor};

    #[test]
    fn test_highlight_colors_matches() {
        let red = TextColor::new(0xbb, 0, 0);
        let mut model = Model::new();
        model
            .rules
            .add_highlight(DEFAULT_GROUP, Highlight::new("orc", Some(red)).unwrap());
        let mut conveyor = Conveyor::new(model, vec![Box::new(HighlightUnit)]);
        conveyor.process_message(Message::text("an orc waves"));

        let message = conveyor.output().iter().next().unwrap();
        let MessageKind::Text(text) = &message.kind else {
            panic!("應為文字訊息");
        };
        assert_eq!(text.plain_text(), "an orc waves");
        assert!(text
            .spans
            .iter()
            .any(|s| s.text == "orc" && s.foreground == Some(red)));
    }
}
