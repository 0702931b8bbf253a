//! MUD 文字管線函式庫
//!
//! 提供 MUD 客戶端的文字處理核心：
//! - `pattern`: 萬用字元/正則樣式編譯與匹配
//! - `variables`: 變數庫與 `$變數` 展開
//! - `tokenizer`: 規則命令引數切分
//! - `group`: 規則群組與優先級投影
//! - `conveyor`: 輸送帶管線調度
//! - `units`: 標準處理單元（切分、別名、觸發器、替換、高亮、日誌）
//! - `logger`: 會話日誌記錄

pub mod action;
pub mod alias;
pub mod braces;
pub mod conveyor;
pub mod group;
pub mod highlight;
pub mod history;
pub mod hotkey;
pub mod logger;
pub mod message;
pub mod model;
pub mod pattern;
pub mod substitution;
pub mod tokenizer;
pub mod trigger;
pub mod units;
pub mod variables;

pub use action::{Action, ActionExecutionContext, ActionHandler, ActionRegistry};
pub use alias::CommandAlias;
pub use conveyor::{Conveyor, Outbox, Unit};
pub use group::{Group, RuleStore, DEFAULT_GROUP};
pub use highlight::Highlight;
pub use history::OutputHistory;
pub use hotkey::Hotkey;
pub use logger::{LogFormat, Logger};
pub use message::{Command, CommandKind, Message, MessageKind, TextColor, TextMessage};
pub use model::{ConnectionState, Model, Settings};
pub use pattern::{CaptureSlots, CompiledPattern};
pub use substitution::Substitution;
pub use tokenizer::tokenize;
pub use trigger::Trigger;
pub use units::standard_units;
pub use variables::{Variable, VariableStore};
