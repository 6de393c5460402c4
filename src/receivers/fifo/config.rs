// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

/// Default input pipe, relative to the working directory
pub const DEFAULT_INPUT_PATH: &str = "access.log";

/// Default maximum line length in bytes, longer lines are dropped
pub const DEFAULT_MAX_LINE_LENGTH: usize = 64 * 1024;

/// Permissions for a newly created pipe, before the process umask applies
pub const FIFO_MODE: u32 = 0o666;

/// Configuration for the FIFO receiver
#[derive(Debug, Clone)]
pub struct FifoReceiverConfig {
    /// Path of the named pipe, created if missing
    pub path: PathBuf,

    /// Maximum number of bytes in a single line (excluding the newline)
    pub max_line_length: usize,
}

impl Default for FifoReceiverConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_INPUT_PATH),
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
        }
    }
}

impl FifoReceiverConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Set custom maximum line length
    pub fn with_max_line_length(mut self, max_line_length: usize) -> Self {
        self.max_line_length = max_line_length;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.path.as_os_str().is_empty() {
            return Err("Input path must not be empty".to_string());
        }

        if self.max_line_length == 0 {
            return Err("Max line length must be at least 1, got 0".to_string());
        }

        Ok(())
    }
}
