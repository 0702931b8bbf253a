//! 命令與訊息模組
//!
//! 管線中流動的兩種項目：`Command` 由使用者流向伺服器、`Message` 由
//! 伺服器流向使用者。兩者都帶整數類型標籤與可變的 `handled` 旗標，
//! 在通過處理單元時就地改寫。

use serde::{Deserialize, Serialize};

/// 命令類型標籤
pub mod command_tags {
    pub const TEXT: u8 = 1;
    pub const HOTKEY: u8 = 2;
    pub const CONNECT: u8 = 3;
    pub const DISCONNECT: u8 = 4;
    pub const START_LOG: u8 = 5;
    pub const STOP_LOG: u8 = 6;
    pub const FLUSH_OUTPUT: u8 = 7;
}

/// 訊息類型標籤
pub mod message_tags {
    pub const TEXT: u8 = 1;
    pub const ECHO: u8 = 2;
    pub const ERROR: u8 = 3;
    pub const CONNECTED: u8 = 4;
    pub const DISCONNECTED: u8 = 5;
    pub const LOG_STARTED: u8 = 6;
    pub const LOG_STOPPED: u8 = 7;
}

/// RGB 文字顏色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl TextColor {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// 解析顏色名稱或 `#rrggbb`
    pub fn parse(name: &str) -> Option<Self> {
        if let Some(hex) = name.strip_prefix('#') {
            if hex.len() == 6 {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                return Some(Self::new(r, g, b));
            }
            return None;
        }
        match name.to_ascii_lowercase().as_str() {
            "black" => Some(Self::new(0x00, 0x00, 0x00)),
            "red" => Some(Self::new(0xbb, 0x00, 0x00)),
            "green" => Some(Self::new(0x00, 0xbb, 0x00)),
            "yellow" => Some(Self::new(0xbb, 0xbb, 0x00)),
            "blue" => Some(Self::new(0x00, 0x00, 0xbb)),
            "magenta" => Some(Self::new(0xbb, 0x00, 0xbb)),
            "cyan" => Some(Self::new(0x00, 0xbb, 0xbb)),
            "white" => Some(Self::new(0xbb, 0xbb, 0xbb)),
            _ => None,
        }
    }
}

/// 帶樣式的文字片段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSpan {
    pub text: String,
    pub foreground: Option<TextColor>,
    pub background: Option<TextColor>,
}

impl TextSpan {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            foreground: None,
            background: None,
        }
    }
}

/// 伺服器訊息：依序排列的樣式片段
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextMessage {
    pub spans: Vec<TextSpan>,
}

impl TextMessage {
    pub fn from_plain(text: impl Into<String>) -> Self {
        Self {
            spans: vec![TextSpan::plain(text)],
        }
    }

    /// 純文字投影（片段串接）
    pub fn plain_text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }

    /// 以 `replacement` 取代 `start..end` 範圍並縫合樣式片段
    ///
    /// 替換文字不繼承任何顏色，只帶入指定的前景色。
    /// 範圍位移以純文字投影的位元組計，必須落在字元邊界。
    pub fn replace_range(
        &mut self,
        start: usize,
        end: usize,
        replacement: &str,
        foreground: Option<TextColor>,
    ) {
        let mut result = Vec::with_capacity(self.spans.len() + 1);
        let mut suffix = Vec::new();
        let mut offset = 0usize;

        for span in self.spans.drain(..) {
            let span_start = offset;
            let span_end = span_start + span.text.len();
            offset = span_end;

            if span_start < start {
                let cut = (start - span_start).min(span.text.len());
                if cut > 0 {
                    result.push(TextSpan {
                        text: span.text[..cut].to_string(),
                        foreground: span.foreground,
                        background: span.background,
                    });
                }
            }
            if span_end > end {
                let cut = end.saturating_sub(span_start).min(span.text.len());
                if cut < span.text.len() {
                    suffix.push(TextSpan {
                        text: span.text[cut..].to_string(),
                        foreground: span.foreground,
                        background: span.background,
                    });
                }
            }
        }

        if !replacement.is_empty() {
            result.push(TextSpan {
                text: replacement.to_string(),
                foreground,
                background: None,
            });
        }
        result.extend(suffix);
        self.spans = result;
    }

    /// 為 `start..end` 範圍上色，必要時在邊界切開片段
    pub fn colorize_range(
        &mut self,
        start: usize,
        end: usize,
        foreground: Option<TextColor>,
        background: Option<TextColor>,
    ) {
        let mut result = Vec::with_capacity(self.spans.len() + 2);
        let mut offset = 0usize;

        for span in self.spans.drain(..) {
            let span_start = offset;
            let span_end = span_start + span.text.len();
            offset = span_end;

            if span_end <= start || span_start >= end {
                result.push(span);
                continue;
            }

            let rel_start = start.saturating_sub(span_start);
            let rel_end = if end < span_end {
                end - span_start
            } else {
                span.text.len()
            };

            if rel_start > 0 {
                result.push(TextSpan {
                    text: span.text[..rel_start].to_string(),
                    foreground: span.foreground,
                    background: span.background,
                });
            }
            result.push(TextSpan {
                text: span.text[rel_start..rel_end].to_string(),
                foreground: foreground.or(span.foreground),
                background: background.or(span.background),
            });
            if rel_end < span.text.len() {
                result.push(TextSpan {
                    text: span.text[rel_end..].to_string(),
                    foreground: span.foreground,
                    background: span.background,
                });
            }
        }
        self.spans = result;
    }
}

/// 外送文字命令
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextCommand {
    pub text: String,
    /// 由切分單元產生，不再重複切分
    pub no_split: bool,
    /// 由倍增單元產生，不再重複倍增
    pub no_multiply: bool,
}

/// 命令內容
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandKind {
    Text(TextCommand),
    /// 快捷鍵（按鍵組合字串）
    Hotkey(String),
    Connect { host: String, port: u16 },
    Disconnect,
    StartLog(String),
    StopLog,
    /// 清空顯示歷史
    FlushOutput,
}

/// 外送命令：內容 + 已處理旗標
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub kind: CommandKind,
    pub handled: bool,
}

impl Command {
    pub fn new(kind: CommandKind) -> Self {
        Self {
            kind,
            handled: false,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(CommandKind::Text(TextCommand {
            text: text.into(),
            ..TextCommand::default()
        }))
    }

    pub fn hotkey(chord: impl Into<String>) -> Self {
        Self::new(CommandKind::Hotkey(chord.into()))
    }

    pub fn connect(host: impl Into<String>, port: u16) -> Self {
        Self::new(CommandKind::Connect {
            host: host.into(),
            port,
        })
    }

    pub fn disconnect() -> Self {
        Self::new(CommandKind::Disconnect)
    }

    pub fn flush_output() -> Self {
        Self::new(CommandKind::FlushOutput)
    }

    pub fn mark_no_split(mut self) -> Self {
        if let CommandKind::Text(tc) = &mut self.kind {
            tc.no_split = true;
        }
        self
    }

    pub fn mark_no_multiply(mut self) -> Self {
        if let CommandKind::Text(tc) = &mut self.kind {
            tc.no_multiply = true;
        }
        self
    }

    /// 類型標籤，單元以此宣告興趣
    pub fn tag(&self) -> u8 {
        match &self.kind {
            CommandKind::Text(_) => command_tags::TEXT,
            CommandKind::Hotkey(_) => command_tags::HOTKEY,
            CommandKind::Connect { .. } => command_tags::CONNECT,
            CommandKind::Disconnect => command_tags::DISCONNECT,
            CommandKind::StartLog(_) => command_tags::START_LOG,
            CommandKind::StopLog => command_tags::STOP_LOG,
            CommandKind::FlushOutput => command_tags::FLUSH_OUTPUT,
        }
    }
}

/// 訊息內容
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageKind {
    /// 伺服器文字行
    Text(TextMessage),
    /// 本地回顯／資訊
    Echo(String),
    /// 錯誤回饋
    Error(String),
    Connected { host: String, port: u16 },
    Disconnected,
    LogStarted(String),
    LogStopped,
}

/// 內送訊息：內容 + 已處理旗標 + 抑制顯示旗標
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub kind: MessageKind,
    pub handled: bool,
    /// 觸發器設定後，下游的顯示與日誌單元跳過此訊息
    pub gagged: bool,
}

impl Message {
    pub fn new(kind: MessageKind) -> Self {
        Self {
            kind,
            handled: false,
            gagged: false,
        }
    }

    pub fn text(line: impl Into<String>) -> Self {
        Self::new(MessageKind::Text(TextMessage::from_plain(line)))
    }

    pub fn echo(text: impl Into<String>) -> Self {
        Self::new(MessageKind::Echo(text.into()))
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(MessageKind::Error(text.into()))
    }

    pub fn tag(&self) -> u8 {
        match &self.kind {
            MessageKind::Text(_) => message_tags::TEXT,
            MessageKind::Echo(_) => message_tags::ECHO,
            MessageKind::Error(_) => message_tags::ERROR,
            MessageKind::Connected { .. } => message_tags::CONNECTED,
            MessageKind::Disconnected => message_tags::DISCONNECTED,
            MessageKind::LogStarted(_) => message_tags::LOG_STARTED,
            MessageKind::LogStopped => message_tags::LOG_STOPPED,
        }
    }

    /// 可顯示／可記錄的文字內容
    pub fn display_text(&self) -> Option<String> {
        match &self.kind {
            MessageKind::Text(text) => Some(text.plain_text()),
            MessageKind::Echo(text) | MessageKind::Error(text) => Some(text.clone()),
            _ => None,
        }
    }
}
