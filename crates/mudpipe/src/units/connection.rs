//! 連線簿記單元
//!
//! 實際的 socket 由外部協作者持有；本單元只維護 `Model` 中的連線
//! 狀態與遠端位址，並把連線事件轉成回顯訊息。Connect/Disconnect
//! 命令保持未處理，由協作者自 outbound 取走執行。

use crate::conveyor::{Outbox, Unit};
use crate::message::{command_tags, message_tags, Command, CommandKind, Message, MessageKind};
use crate::model::{ConnectionState, Model};

pub struct ConnectionUnit;

impl Unit for ConnectionUnit {
    fn name(&self) -> &'static str {
        "connection"
    }

    fn command_tags(&self) -> &'static [u8] {
        &[command_tags::CONNECT, command_tags::DISCONNECT]
    }

    fn message_tags(&self) -> &'static [u8] {
        &[message_tags::CONNECTED, message_tags::DISCONNECTED]
    }

    fn process_command(&mut self, command: &mut Command, model: &mut Model, out: &mut Outbox) {
        match &command.kind {
            CommandKind::Connect { host, port } => {
                if model.connection != ConnectionState::Disconnected {
                    command.handled = true;
                    out.error("已有連線，請先斷線");
                    return;
                }
                model.connection = ConnectionState::Connecting;
                model.remote = Some((host.clone(), *port));
                out.echo(format!("連線到 {}:{} ...", host, port));
            }
            CommandKind::Disconnect => {
                if model.connection == ConnectionState::Disconnected {
                    command.handled = true;
                    out.error("目前沒有連線");
                }
            }
            _ => {}
        }
    }

    fn process_message(&mut self, message: &mut Message, model: &mut Model, out: &mut Outbox) {
        match &message.kind {
            MessageKind::Connected { host, port } => {
                model.connection = ConnectionState::Connected;
                model.remote = Some((host.clone(), *port));
                out.echo(format!("已連線到 {}:{}", host, port));
            }
            MessageKind::Disconnected => {
                model.connection = ConnectionState::Disconnected;
                model.remote = None;
                out.echo("連線已中斷");
            }
            _ => {}
        }
    }
}
