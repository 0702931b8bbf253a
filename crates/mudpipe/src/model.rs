//! 管線共享狀態
//!
//! 取代環境全域單例：設定、規則、變數與動作註冊表全部收在一個
//! `Model`，由建構時傳入輸送帶，再借給每個處理單元。

use crate::action::ActionRegistry;
use crate::group::RuleStore;
use crate::variables::VariableStore;

/// 管線設定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    /// 規則命令的前綴字元
    pub command_char: char,
    /// 命令分隔字元
    pub separator: char,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            command_char: '#',
            separator: ';',
        }
    }
}

/// 連線狀態（僅簿記；實際連線由 socket 協作者負責）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// 管線共享狀態
#[derive(Debug, Default)]
pub struct Model {
    pub settings: Settings,
    pub rules: RuleStore,
    pub variables: VariableStore,
    pub actions: ActionRegistry,
    pub connection: ConnectionState,
    /// 目前（嘗試）連線的遠端
    pub remote: Option<(String, u16)>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }
}
