// SPDX-License-Identifier: Apache-2.0

//! FIFO receiver implementation
//!
//! Reads newline-delimited records from a named pipe and sends them to the
//! relay channel. The receiver owns the pipe's lifecycle: it creates the pipe
//! when missing and reacquires it whenever a producer closes its end.

use crate::bounded_channel::BoundedSender;
use crate::receivers::fifo::config::{FIFO_MODE, FifoReceiverConfig};
use crate::receivers::fifo::error::{FifoReceiverError, Result};
use crate::receivers::fifo::lines::LineReader;
use bytes::Bytes;
use std::ffi::CString;
use std::fs::File;
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::FileTypeExt;
use std::path::Path;
use std::time::Duration;
use tokio::net::unix::pipe;
use tokio::select;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Pause before reacquiring the pipe after a read error
const REOPEN_BACKOFF: Duration = Duration::from_millis(100);

/// Wait between two attempts to release an open that is still pending
const RELEASE_RETRY: Duration = Duration::from_millis(50);
const RELEASE_ATTEMPTS: usize = 20;

pub struct FifoReceiver {
    config: FifoReceiverConfig,
}

impl FifoReceiver {
    pub fn new(config: FifoReceiverConfig) -> Result<Self> {
        config
            .validate()
            .map_err(FifoReceiverError::ConfigurationError)?;

        info!(
            path = %config.path.display(),
            max_line_length = config.max_line_length,
            "FIFO receiver initialized"
        );

        Ok(Self { config })
    }

    /// Read lines until cancelled.
    ///
    /// Pipe setup failures are returned to the caller and are not retried.
    /// End of input and read errors close the pipe and start over with a
    /// fresh acquisition, so every producer gets its own line framing.
    ///
    /// After cancelling, drive the future to completion: it may be waiting
    /// for a producer in a blocking open that has to be released first.
    pub async fn run(
        &self,
        lines_output: BoundedSender<Bytes>,
        cancel: CancellationToken,
    ) -> Result<()> {
        let path = self.config.path.as_path();
        loop {
            let Some(receiver) = acquire_input(path, &cancel).await? else {
                info!("FIFO receiver cancelled");
                return Ok(());
            };
            debug!(path = %path.display(), "Named pipe opened for reading");

            let mut lines = LineReader::new(receiver, self.config.max_line_length);
            let mut read_failed = false;
            loop {
                select! {
                    next = lines.next_line() => match next {
                        Ok(Some(line)) => {
                            select! {
                                sent = lines_output.send(line) => {
                                    sent.map_err(|_| FifoReceiverError::ChannelClosed)?;
                                }
                                _ = cancel.cancelled() => {
                                    info!("FIFO receiver cancelled");
                                    return Ok(());
                                }
                            }
                        }
                        Ok(None) => {
                            debug!(path = %path.display(), "Producer closed the named pipe, reopening");
                            break;
                        }
                        Err(e) => {
                            warn!(path = %path.display(), error = %e, "Error reading named pipe, reopening");
                            read_failed = true;
                            break;
                        }
                    },
                    _ = cancel.cancelled() => {
                        info!("FIFO receiver cancelled");
                        return Ok(());
                    }
                }
            }

            // Close before the next acquisition
            drop(lines);

            if read_failed {
                select! {
                    _ = tokio::time::sleep(REOPEN_BACKOFF) => {}
                    _ = cancel.cancelled() => {
                        info!("FIFO receiver cancelled");
                        return Ok(());
                    }
                }
            }
        }
    }
}

/// Ensure a named pipe exists at `path` and open it for reading.
///
/// The open is read-only and waits until a producer opens the write end, so
/// the stream reports end of input once that producer is gone. Returns
/// `None` when cancelled while waiting.
pub async fn acquire_input(
    path: &Path,
    cancel: &CancellationToken,
) -> Result<Option<pipe::Receiver>> {
    ensure_pipe(path)?;

    let blocking_path = path.to_path_buf();
    let mut open = tokio::task::spawn_blocking(move || File::open(blocking_path));

    let opened = select! {
        res = &mut open => res,
        _ = cancel.cancelled() => {
            release_pending_open(path, &mut open).await;
            return Ok(None);
        }
    };

    opened
        .map_err(io::Error::from)
        .and_then(|file| file)
        .and_then(pipe::Receiver::from_file)
        .map(Some)
        .map_err(|source| FifoReceiverError::OpenPipe {
            path: path.to_path_buf(),
            source,
        })
}

fn ensure_pipe(path: &Path) -> Result<()> {
    match std::fs::metadata(path) {
        Ok(meta) => {
            if !meta.file_type().is_fifo() {
                return Err(FifoReceiverError::NotAPipe(path.to_path_buf()));
            }
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            create_fifo(path, FIFO_MODE).map_err(|source| FifoReceiverError::CreatePipe {
                path: path.to_path_buf(),
                source,
            })?;
            info!(path = %path.display(), "Created named pipe");
        }
        Err(source) => {
            return Err(FifoReceiverError::Stat {
                path: path.to_path_buf(),
                source,
            });
        }
    }

    Ok(())
}

// A blocked read-only open only returns once some writer shows up, so open a
// write end of our own until the pending open completes.
async fn release_pending_open(path: &Path, open: &mut JoinHandle<io::Result<File>>) {
    for _ in 0..RELEASE_ATTEMPTS {
        let _writer = pipe::OpenOptions::new().open_sender(path);
        if timeout(RELEASE_RETRY, &mut *open).await.is_ok() {
            return;
        }
    }
    warn!(path = %path.display(), "Named pipe open still pending after cancellation");
}

fn create_fifo(path: &Path, mode: u32) -> io::Result<()> {
    let path_c = CString::new(path.as_os_str().as_bytes())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    let ret = unsafe { libc::mkfifo(path_c.as_ptr(), mode as libc::mode_t) };
    if ret != 0 {
        let err = io::Error::last_os_error();
        // Another process created it between the stat and here, the open
        // below still verifies the file type.
        if err.kind() != io::ErrorKind::AlreadyExists {
            return Err(err);
        }
    }

    Ok(())
}
