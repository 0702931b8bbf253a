//! 動作（Action）模組
//!
//! 規則觸發後執行的效果。已知類型以封閉列舉表示，外部類型經由
//! `ActionRegistry` 註冊；執行介面固定為「上下文 → 副作用」。
//! 單一動作失敗只記錄並略過，不中斷同一批的其餘動作。

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::braces::depth_chars;
use crate::conveyor::Outbox;
use crate::message::{Command, Message, TextMessage};
use crate::model::Model;
use crate::pattern::{CaptureSlots, CAPTURE_SLOTS};

/// 動作執行錯誤
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("未註冊的動作類型: {0}")]
    UnknownKind(String),

    #[error("動作執行失敗: {0}")]
    Failed(String),
}

/// 動作執行上下文 — 交給外部動作實作的唯一資料
///
/// 最多 10 個位置參數（索引 0..9）與選填的來源訊息。
#[derive(Debug, Clone, Default)]
pub struct ActionExecutionContext {
    parameters: [String; CAPTURE_SLOTS],
    pub source: Option<TextMessage>,
}

impl ActionExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// 由匹配捕獲建立上下文
    pub fn from_captures(captures: &CaptureSlots, source: Option<TextMessage>) -> Self {
        let mut context = Self {
            parameters: Default::default(),
            source,
        };
        for index in 0..CAPTURE_SLOTS {
            context.parameters[index] = captures.get(index).to_string();
        }
        context
    }

    pub fn parameter(&self, index: usize) -> &str {
        self.parameters.get(index).map(String::as_str).unwrap_or("")
    }

    pub fn set_parameter(&mut self, index: usize, value: impl Into<String>) {
        if let Some(slot) = self.parameters.get_mut(index) {
            *slot = value.into();
        }
    }

    /// 將文字中的 `%N` 參數以上下文值取代（只在大括號深度 0 生效）
    pub fn substitute(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut iter = depth_chars(text).peekable();
        while let Some((_, c, depth)) = iter.next() {
            if c == '%' && depth == 0 {
                if let Some(digit) = iter.peek().and_then(|&(_, n, _)| n.to_digit(10)) {
                    iter.next();
                    out.push_str(self.parameter(digit as usize));
                    continue;
                }
            }
            out.push(c);
        }
        out
    }
}

/// 規則動作
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// 送出文字命令（`%N` 參數先替換，`$變數` 於管線中展開）
    SendText { text: String },
    /// 本地回顯
    Echo { text: String },
    /// 設定變數
    SetVariable { name: String, value: String },
    /// 刪除變數
    UnsetVariable { name: String },
    /// 外部註冊的動作類型
    Custom { kind: String, arg: String },
}

impl Action {
    pub fn send_text(text: impl Into<String>) -> Self {
        Self::SendText { text: text.into() }
    }

    pub fn echo(text: impl Into<String>) -> Self {
        Self::Echo { text: text.into() }
    }
}

/// 外部動作實作介面
pub trait ActionHandler: Send + Sync {
    fn execute(&self, arg: &str, context: &ActionExecutionContext) -> Result<(), ActionError>;
}

/// 外部動作類型註冊表
#[derive(Default, Clone)]
pub struct ActionRegistry {
    handlers: HashMap<String, Arc<dyn ActionHandler>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, kind: impl Into<String>, handler: Arc<dyn ActionHandler>) {
        self.handlers.insert(kind.into(), handler);
    }

    pub fn get(&self, kind: &str) -> Option<&Arc<dyn ActionHandler>> {
        self.handlers.get(kind)
    }
}

impl fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionRegistry")
            .field("kinds", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// 依序執行動作，個別失敗只記錄並略過
pub fn run_actions(
    actions: &[Action],
    context: &ActionExecutionContext,
    model: &mut Model,
    out: &mut Outbox,
) {
    for action in actions {
        if let Err(err) = run_action(action, context, model, out) {
            warn!("動作執行失敗，略過: {}", err);
        }
    }
}

fn run_action(
    action: &Action,
    context: &ActionExecutionContext,
    model: &mut Model,
    out: &mut Outbox,
) -> Result<(), ActionError> {
    match action {
        Action::SendText { text } => {
            out.push_command(Command::text(context.substitute(text)));
        }
        Action::Echo { text } => {
            out.push_message(Message::echo(context.substitute(text)));
        }
        Action::SetVariable { name, value } => {
            model.variables.set(name.clone(), context.substitute(value));
        }
        Action::UnsetVariable { name } => {
            model.variables.unset(name);
        }
        Action::Custom { kind, arg } => {
            let handler = model
                .actions
                .get(kind)
                .cloned()
                .ok_or_else(|| ActionError::UnknownKind(kind.clone()))?;
            handler.execute(&context.substitute(arg), context)?;
        }
    }
    Ok(())
}
