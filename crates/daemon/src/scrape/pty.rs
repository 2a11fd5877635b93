// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! PTY seam for the scraper.
//!
//! Production uses `portable-pty`: one blocking reader thread bridges
//! output onto a tokio channel, writes go through a mutex-guarded writer,
//! and the child is killed on every exit path by the owning scrape.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::io::{Read, Write};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors from PTY operations
#[derive(Debug, Error)]
pub enum PtyError {
    #[error("pty open failed: {0}")]
    Open(String),
    #[error("pty spawn failed: {0}")]
    Spawn(String),
    #[error("pty write failed: {0}")]
    Write(String),
}

/// A live pseudo-terminal session.
#[async_trait]
pub trait Pty: Send {
    /// Next chunk of terminal output; `None` on EOF.
    async fn read_chunk(&mut self) -> Option<Vec<u8>>;

    /// Write bytes to the terminal. Serialized internally.
    fn write(&self, bytes: &[u8]) -> Result<(), PtyError>;

    /// Kill the child process. Idempotent.
    fn kill(&mut self);
}

/// portable-pty backed session.
pub struct NativePty {
    output: mpsc::Receiver<Vec<u8>>,
    writer: Arc<Mutex<Box<dyn Write + Send>>>,
    child: Box<dyn portable_pty::Child + Send + Sync>,
    // Dropping the master closes the terminal; keep it for the session's life.
    _master: Box<dyn portable_pty::MasterPty + Send>,
}

impl NativePty {
    /// Open a PTY of the given size and launch `argv` on it.
    pub fn spawn(argv: &[String], rows: u16, cols: u16) -> Result<NativePty, PtyError> {
        if argv.is_empty() {
            return Err(PtyError::Spawn("empty argv".to_string()));
        }

        let pty_system = portable_pty::native_pty_system();
        let pair = pty_system
            .openpty(portable_pty::PtySize {
                rows,
                cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| PtyError::Open(e.to_string()))?;

        let mut command = portable_pty::CommandBuilder::new(&argv[0]);
        command.args(&argv[1..]);
        let child = pair
            .slave
            .spawn_command(command)
            .map_err(|e| PtyError::Spawn(e.to_string()))?;
        drop(pair.slave);

        let mut reader = pair
            .master
            .try_clone_reader()
            .map_err(|e| PtyError::Open(e.to_string()))?;
        let writer = pair.master.take_writer().map_err(|e| PtyError::Open(e.to_string()))?;

        let (tx, rx) = mpsc::channel::<Vec<u8>>(32);
        std::thread::spawn(move || {
            let mut buf = [0u8; 4096];
            loop {
                match reader.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        if tx.blocking_send(buf[..n].to_vec()).is_err() {
                            break;
                        }
                    }
                }
            }
        });

        Ok(NativePty {
            output: rx,
            writer: Arc::new(Mutex::new(writer)),
            child,
            _master: pair.master,
        })
    }
}

#[async_trait]
impl Pty for NativePty {
    async fn read_chunk(&mut self) -> Option<Vec<u8>> {
        self.output.recv().await
    }

    fn write(&self, bytes: &[u8]) -> Result<(), PtyError> {
        let mut writer = self.writer.lock();
        writer.write_all(bytes).map_err(|e| PtyError::Write(e.to_string()))?;
        writer.flush().map_err(|e| PtyError::Write(e.to_string()))
    }

    fn kill(&mut self) {
        let _ = self.child.kill();
    }
}

impl Drop for NativePty {
    fn drop(&mut self) {
        self.kill();
    }
}

/// Scripted PTY for tests: emits chunks on a schedule, records writes.
#[cfg(any(test, feature = "test-support"))]
pub mod fake {
    use super::*;
    use std::time::Duration;

    pub struct FakePty {
        script: std::collections::VecDeque<(Duration, Vec<u8>)>,
        writes: Arc<Mutex<Vec<Vec<u8>>>>,
        killed: Arc<Mutex<bool>>,
        /// When false, the fake never reaches EOF on its own (models a TUI
        /// that only exits when told to).
        eof_after_script: bool,
    }

    impl FakePty {
        pub fn new(script: Vec<(Duration, &[u8])>) -> Self {
            Self {
                script: script.into_iter().map(|(d, b)| (d, b.to_vec())).collect(),
                writes: Arc::new(Mutex::new(Vec::new())),
                killed: Arc::new(Mutex::new(false)),
                eof_after_script: true,
            }
        }

        pub fn without_eof(mut self) -> Self {
            self.eof_after_script = false;
            self
        }

        /// Everything written to the terminal, in order.
        pub fn writes_handle(&self) -> Arc<Mutex<Vec<Vec<u8>>>> {
            Arc::clone(&self.writes)
        }

        pub fn killed_handle(&self) -> Arc<Mutex<bool>> {
            Arc::clone(&self.killed)
        }
    }

    #[async_trait]
    impl Pty for FakePty {
        async fn read_chunk(&mut self) -> Option<Vec<u8>> {
            match self.script.pop_front() {
                Some((delay, chunk)) => {
                    tokio::time::sleep(delay).await;
                    Some(chunk)
                }
                None => {
                    if self.eof_after_script {
                        None
                    } else {
                        // Block forever; the scrape's timers decide.
                        std::future::pending::<()>().await;
                        None
                    }
                }
            }
        }

        fn write(&self, bytes: &[u8]) -> Result<(), PtyError> {
            self.writes.lock().push(bytes.to_vec());
            Ok(())
        }

        fn kill(&mut self) {
            *self.killed.lock() = true;
        }
    }
}
