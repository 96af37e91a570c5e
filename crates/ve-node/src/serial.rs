//! Serial link to the GUI.
//!
//! A background thread reads the device and hands completed lines to the
//! main loop over a channel, so polling never blocks the bus loop.

use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc;

use crate::console::LineBuffer;
use crate::error::{NodeError, NodeResult};

const READ_CHUNK: usize = 64;
const IDLE_SLEEP: Duration = Duration::from_millis(1);

/// Line-oriented connection to the GUI.
pub trait GuiPort: Send {
    /// Lines completed since the last call.
    fn poll_lines(&mut self) -> Vec<String>;

    /// Write one line; the caller supplies the terminator.
    fn send_line(&mut self, line: &str) -> std::io::Result<()>;
}

/// GUI link over a serial device or pty.
pub struct SerialLink {
    path: String,
    writer: File,
    lines: mpsc::UnboundedReceiver<String>,
}

impl SerialLink {
    /// Open `path` read-write and start the reader thread.
    pub fn open(path: &str) -> NodeResult<Self> {
        let serial_err = |source| NodeError::Serial {
            path: path.to_string(),
            source,
        };
        let writer = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(serial_err)?;
        let reader = writer.try_clone().map_err(serial_err)?;

        let (tx, rx) = mpsc::unbounded_channel();
        let thread_path = path.to_string();
        std::thread::Builder::new()
            .name("gui-serial-reader".into())
            .spawn(move || read_lines(reader, tx, &thread_path))
            .map_err(serial_err)?;

        tracing::info!(path, "GUI serial link opened");
        Ok(Self {
            path: path.to_string(),
            writer,
            lines: rx,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

fn read_lines(mut reader: File, tx: mpsc::UnboundedSender<String>, path: &str) {
    let mut buffer = LineBuffer::new();
    let mut chunk = [0u8; READ_CHUNK];
    loop {
        match reader.read(&mut chunk) {
            Ok(0) => std::thread::sleep(IDLE_SLEEP),
            Ok(n) => {
                for line in buffer.push_bytes(&chunk[..n]) {
                    if tx.send(line).is_err() {
                        return;
                    }
                }
            }
            Err(e) if matches!(e.kind(), ErrorKind::Interrupted | ErrorKind::WouldBlock) => {
                std::thread::sleep(IDLE_SLEEP);
            }
            Err(e) => {
                tracing::error!(path, error = %e, "GUI serial read failed, reader stopped");
                return;
            }
        }
        if tx.is_closed() {
            return;
        }
    }
}

impl GuiPort for SerialLink {
    fn poll_lines(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        while let Ok(line) = self.lines.try_recv() {
            lines.push(line);
        }
        lines
    }

    fn send_line(&mut self, line: &str) -> std::io::Result<()> {
        self.writer.write_all(line.as_bytes())?;
        self.writer.flush()
    }
}

#[derive(Debug, Default)]
struct Script {
    incoming: VecDeque<String>,
    sent: Vec<String>,
}

/// In-memory GUI for tests. Clones share the same script.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPort {
    script: Arc<Mutex<Script>>,
}

impl ScriptedPort {
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue raw GUI bytes; they are split into lines like serial input.
    pub fn push_input(&self, bytes: &[u8]) {
        let lines = LineBuffer::new().push_bytes(bytes);
        self.script().incoming.extend(lines);
    }

    pub fn sent_lines(&self) -> Vec<String> {
        self.script().sent.clone()
    }
}

impl GuiPort for ScriptedPort {
    fn poll_lines(&mut self) -> Vec<String> {
        self.script().incoming.drain(..).collect()
    }

    fn send_line(&mut self, line: &str) -> std::io::Result<()> {
        self.script().sent.push(line.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_missing_device_is_serial_error() {
        let err = SerialLink::open("/nonexistent/ve-node-pty").err().unwrap();
        assert_eq!(err.exit_code(), 3);
        assert!(err.to_string().contains("/nonexistent/ve-node-pty"));
    }

    #[test]
    fn scripted_port_splits_and_records() {
        let gui = ScriptedPort::new();
        let mut port: Box<dyn GuiPort> = Box::new(gui.clone());

        gui.push_input(b"exd 0032\rEXD 0101\r");
        assert_eq!(port.poll_lines(), vec!["EXD 0032", "EXD 0101"]);
        assert!(port.poll_lines().is_empty());

        port.send_line("EXU 0005\n").unwrap();
        assert_eq!(gui.sent_lines(), vec!["EXU 0005\n"]);
    }

    #[tokio::test]
    async fn serial_link_reads_lines_from_file() {
        let path = std::env::temp_dir().join(format!("ve-node-serial-{}", std::process::id()));
        std::fs::write(&path, b"EXD 0050\r").unwrap();

        let mut link = SerialLink::open(path.to_str().unwrap()).unwrap();
        let mut lines = Vec::new();
        for _ in 0..200 {
            lines = link.poll_lines();
            if !lines.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(lines, vec!["EXD 0050"]);
        assert_eq!(link.path(), path.to_str().unwrap());

        drop(link);
        let _ = std::fs::remove_file(&path);
    }
}
