//! 會話日誌模組
//!
//! 記錄對話到檔案。唯一跨越執行緒邊界的元件：管線執行緒只把整行
//! 排入佇列（不阻塞），背景執行緒寫入緩衝並以固定間隔刷新；
//! `stop()` 關閉通道並 join，同步排空剩餘訊息。

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use thiserror::Error;
use tracing::error;

/// 日誌記錄錯誤
#[derive(Debug, Error)]
pub enum LogError {
    #[error("IO 錯誤: {0}")]
    Io(#[from] io::Error),

    #[error("日誌未開啟")]
    NotOpen,
}

/// 日誌格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// 純文字
    #[default]
    PlainText,
    /// HTML
    Html,
}

struct LogSession {
    sender: Sender<String>,
    handle: JoinHandle<()>,
    path: PathBuf,
}

/// 會話日誌記錄器
pub struct Logger {
    format: LogFormat,
    flush_interval: Duration,
    session: Option<LogSession>,
}

impl Logger {
    pub fn new() -> Self {
        Self {
            format: LogFormat::default(),
            flush_interval: Duration::from_millis(250),
            session: None,
        }
    }

    pub fn set_format(&mut self, format: LogFormat) {
        self.format = format;
    }

    pub fn format(&self) -> LogFormat {
        self.format
    }

    pub fn is_recording(&self) -> bool {
        self.session.is_some()
    }

    pub fn path(&self) -> Option<&Path> {
        self.session.as_ref().map(|s| s.path.as_path())
    }

    /// 開始記錄到指定檔案並啟動背景寫入執行緒
    pub fn start(&mut self, path: impl AsRef<Path>) -> Result<(), LogError> {
        self.stop()?;
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let mut writer = BufWriter::new(file);

        let format = self.format;
        if format == LogFormat::Html {
            write_html_header(&mut writer)?;
        }

        let (sender, receiver) = mpsc::channel::<String>();
        let interval = self.flush_interval;
        let handle = thread::spawn(move || write_loop(writer, receiver, format, interval));

        self.session = Some(LogSession {
            sender,
            handle,
            path,
        });
        Ok(())
    }

    /// 停止記錄：關閉通道，背景執行緒同步排空剩餘訊息後結束
    pub fn stop(&mut self) -> Result<(), LogError> {
        let Some(session) = self.session.take() else {
            return Ok(());
        };
        drop(session.sender);
        let _ = session.handle.join();
        Ok(())
    }

    /// 排入一行（不阻塞）
    ///
    /// 背景執行緒已因寫入錯誤結束時回傳 [`LogError::NotOpen`]，
    /// 呼叫端應停止記錄並回報。
    pub fn log(&mut self, line: &str) -> Result<(), LogError> {
        let session = self.session.as_ref().ok_or(LogError::NotOpen)?;
        session
            .sender
            .send(line.to_string())
            .map_err(|_| LogError::NotOpen)
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

fn write_loop(
    mut writer: BufWriter<File>,
    receiver: Receiver<String>,
    format: LogFormat,
    interval: Duration,
) {
    loop {
        match receiver.recv_timeout(interval) {
            Ok(line) => {
                if write_line(&mut writer, &line, format).is_err() {
                    error!("日誌寫入失敗，背景執行緒結束");
                    return;
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                let _ = writer.flush();
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    if format == LogFormat::Html {
        let _ = writeln!(writer, "</body></html>");
    }
    let _ = writer.flush();
}

fn write_line(writer: &mut BufWriter<File>, line: &str, format: LogFormat) -> io::Result<()> {
    match format {
        LogFormat::PlainText => writeln!(writer, "{}", line),
        LogFormat::Html => writeln!(writer, "{}<br>", escape_html(line)),
    }
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            _ => out.push(c),
        }
    }
    out
}

fn write_html_header(writer: &mut BufWriter<File>) -> io::Result<()> {
    writeln!(
        writer,
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="UTF-8">
<title>MUD Log</title>
<style>
body {{ background: #1e1e1e; color: #d4d4d4; font-family: monospace; white-space: pre-wrap; }}
</style>
</head>
<body>"#
    )
}
