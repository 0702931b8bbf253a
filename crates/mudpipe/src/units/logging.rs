//! 日誌單元
//!
//! 管線末端：把未被抑制的文字訊息排入會話日誌。StartLog/StopLog
//! 命令在此消化並回報對應的 LogStarted/LogStopped 訊息。

use std::path::Path;

use crate::conveyor::{Outbox, Unit};
use crate::logger::{LogFormat, Logger};
use crate::message::{command_tags, message_tags, Command, CommandKind, Message, MessageKind};
use crate::model::Model;

pub struct LoggingUnit {
    logger: Logger,
}

impl LoggingUnit {
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub fn logger_mut(&mut self) -> &mut Logger {
        &mut self.logger
    }
}

impl Unit for LoggingUnit {
    fn name(&self) -> &'static str {
        "logging"
    }

    fn command_tags(&self) -> &'static [u8] {
        &[command_tags::START_LOG, command_tags::STOP_LOG]
    }

    fn message_tags(&self) -> &'static [u8] {
        &[
            message_tags::TEXT,
            message_tags::ECHO,
            message_tags::ERROR,
        ]
    }

    fn process_command(&mut self, command: &mut Command, _model: &mut Model, out: &mut Outbox) {
        match &command.kind {
            CommandKind::StartLog(path) => {
                command.handled = true;
                // 副檔名 .html 時切換為 HTML 格式
                let format = match Path::new(path).extension() {
                    Some(ext) if ext.eq_ignore_ascii_case("html") => LogFormat::Html,
                    _ => LogFormat::PlainText,
                };
                self.logger.set_format(format);
                match self.logger.start(path) {
                    Ok(()) => {
                        out.push_message(Message::new(MessageKind::LogStarted(path.clone())));
                        out.echo(format!("開始記錄到 {}", path));
                    }
                    Err(err) => out.error(format!("無法開啟日誌: {}", err)),
                }
            }
            CommandKind::StopLog => {
                command.handled = true;
                if !self.logger.is_recording() {
                    out.error("目前沒有進行中的日誌");
                    return;
                }
                match self.logger.stop() {
                    Ok(()) => {
                        out.push_message(Message::new(MessageKind::LogStopped));
                        out.echo("日誌已停止");
                    }
                    Err(err) => out.error(format!("停止日誌失敗: {}", err)),
                }
            }
            _ => {}
        }
    }

    fn process_message(&mut self, message: &mut Message, _model: &mut Model, out: &mut Outbox) {
        if message.gagged || !self.logger.is_recording() {
            return;
        }
        let Some(line) = message.display_text() else {
            return;
        };
        if let Err(err) = self.logger.log(&line) {
            // 背景執行緒已死：停止記錄，避免每行都報錯
            let _ = self.logger.stop();
            out.error(format!("日誌寫入失敗，已停止記錄: {}", err));
        }
    }
}
