//! 輸送帶（Conveyor）管線調度模組
//!
//! 依建構時固定的順序，把每個 Command/Message 交給有登記對應類型
//! 標籤的處理單元；任一單元設定 `handled` 後不再往下傳。單元可經由
//! `Outbox` 再投遞新項目，同一邏輯輸入衍生的項目會在下一個外部項目
//! 之前處理完畢（單執行緒、協作式）。

use std::collections::VecDeque;

use tracing::{trace, warn};

use crate::history::OutputHistory;
use crate::message::{Command, CommandKind, Message};
use crate::model::Model;

/// 管線處理單元
///
/// 以 `command_tags` / `message_tags` 宣告興趣；預設實作對兩者都
/// 不感興趣，單元只需覆寫自己用到的一側。
pub trait Unit {
    fn name(&self) -> &'static str;

    /// 此單元處理的命令類型標籤
    fn command_tags(&self) -> &'static [u8] {
        &[]
    }

    /// 此單元處理的訊息類型標籤
    fn message_tags(&self) -> &'static [u8] {
        &[]
    }

    fn process_command(&mut self, _command: &mut Command, _model: &mut Model, _out: &mut Outbox) {}

    fn process_message(&mut self, _message: &mut Message, _model: &mut Model, _out: &mut Outbox) {}
}

#[derive(Debug)]
enum Item {
    Command(Command),
    Message(Message),
}

/// 單元再投遞新項目的出口
#[derive(Debug, Default)]
pub struct Outbox {
    items: VecDeque<Item>,
}

impl Outbox {
    pub fn push_command(&mut self, command: Command) {
        self.items.push_back(Item::Command(command));
    }

    pub fn push_message(&mut self, message: Message) {
        self.items.push_back(Item::Message(message));
    }

    /// 投遞文字命令
    pub fn send_text(&mut self, text: impl Into<String>) {
        self.push_command(Command::text(text));
    }

    /// 投遞回顯訊息
    pub fn echo(&mut self, text: impl Into<String>) {
        self.push_message(Message::echo(text));
    }

    /// 投遞錯誤回饋訊息
    pub fn error(&mut self, text: impl Into<String>) {
        self.push_message(Message::error(text));
    }
}

/// 輸送帶：依序調度 Command/Message 的管線
pub struct Conveyor {
    units: Vec<Box<dyn Unit>>,
    model: Model,
    queue: VecDeque<Item>,
    /// 未被任何單元消化的命令，留給 socket 協作者
    outbound: Vec<Command>,
    /// 未被抑制的訊息，留給 UI 協作者
    output: OutputHistory,
}

impl Conveyor {
    /// 顯示歷史預設容量
    const OUTPUT_CAPACITY: usize = 10_000;

    /// 單次排空的項目上限，阻斷自我引用的別名/觸發器迴圈
    const DRAIN_LIMIT: usize = 10_000;

    pub fn new(model: Model, units: Vec<Box<dyn Unit>>) -> Self {
        Self {
            units,
            model,
            queue: VecDeque::new(),
            outbound: Vec::new(),
            output: OutputHistory::new(Self::OUTPUT_CAPACITY),
        }
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut Model {
        &mut self.model
    }

    /// 取走送往伺服器的命令
    pub fn take_outbound(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.outbound)
    }

    /// 顯示歷史
    pub fn output(&self) -> &OutputHistory {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut OutputHistory {
        &mut self.output
    }

    /// 接受一個外部命令並完全排空管線
    pub fn process_command(&mut self, command: Command) {
        self.queue.push_back(Item::Command(command));
        self.run();
    }

    /// 接受一個外部訊息並完全排空管線
    pub fn process_message(&mut self, message: Message) {
        self.queue.push_back(Item::Message(message));
        self.run();
    }

    fn run(&mut self) {
        let mut drained = 0usize;
        while let Some(item) = self.queue.pop_front() {
            drained += 1;
            if drained > Self::DRAIN_LIMIT {
                warn!("管線項目超過 {} 個，放棄剩餘項目", Self::DRAIN_LIMIT);
                self.queue.clear();
                break;
            }
            let mut out = Outbox::default();
            match item {
                Item::Command(mut command) => {
                    // 顯示歷史屬於輸送帶本身，不經過單元
                    if command.kind == CommandKind::FlushOutput {
                        self.output.clear();
                        continue;
                    }
                    let tag = command.tag();
                    for unit in &mut self.units {
                        if !unit.command_tags().contains(&tag) {
                            continue;
                        }
                        trace!(unit = unit.name(), tag, "處理命令");
                        unit.process_command(&mut command, &mut self.model, &mut out);
                        if command.handled {
                            break;
                        }
                    }
                    if !command.handled {
                        self.outbound.push(command);
                    }
                }
                Item::Message(mut message) => {
                    let tag = message.tag();
                    for unit in &mut self.units {
                        if !unit.message_tags().contains(&tag) {
                            continue;
                        }
                        trace!(unit = unit.name(), tag, "處理訊息");
                        unit.process_message(&mut message, &mut self.model, &mut out);
                        if message.handled {
                            break;
                        }
                    }
                    if !message.gagged {
                        self.output.push(message);
                    }
                }
            }
            // 衍生項目插到佇列前端並保持相對順序：一個項目的衍生鏈
            // 先於尚未處理的兄弟項目排空，送出順序才跟輸入順序一致
            for item in out.items.into_iter().rev() {
                self.queue.push_front(item);
            }
        }
    }
}
