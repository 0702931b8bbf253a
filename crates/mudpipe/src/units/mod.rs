//! 管線處理單元
//!
//! 單元順序由 [`standard_units`] 固定：命令側先切分、再倍增、再規則
//! 命令、快捷鍵、別名、變數替換、連線簿記；訊息側先觸發器、再替換、
//! 高亮、最後日誌。

pub mod aliasing;
pub mod commands;
pub mod connection;
pub mod highlights;
pub mod hotkeys;
pub mod logging;
pub mod multiplier;
pub mod separator;
pub mod substitutions;
pub mod triggers;
pub mod vars;

pub use aliasing::AliasUnit;
pub use commands::UserCommandUnit;
pub use connection::ConnectionUnit;
pub use highlights::HighlightUnit;
pub use hotkeys::HotkeyUnit;
pub use logging::LoggingUnit;
pub use multiplier::MultiplierUnit;
pub use separator::SeparatorUnit;
pub use substitutions::SubstitutionUnit;
pub use triggers::TriggerUnit;
pub use vars::VariableReplaceUnit;

use crate::conveyor::Unit;
use crate::logger::Logger;

/// 標準單元順序
///
/// 順序有語意：切分要在別名展開之前、別名要在觸發器調度之前。
pub fn standard_units() -> Vec<Box<dyn Unit>> {
    vec![
        Box::new(SeparatorUnit),
        Box::new(MultiplierUnit),
        Box::new(UserCommandUnit),
        Box::new(HotkeyUnit),
        Box::new(AliasUnit),
        Box::new(VariableReplaceUnit),
        Box::new(ConnectionUnit),
        Box::new(TriggerUnit),
        Box::new(SubstitutionUnit),
        Box::new(HighlightUnit),
        Box::new(LoggingUnit::new(Logger::new())),
    ]
}
