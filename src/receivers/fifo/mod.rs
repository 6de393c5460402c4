// SPDX-License-Identifier: Apache-2.0

//! Named pipe (FIFO) receiver
//!
//! Creates the FIFO when it does not exist yet, reads it line by line and
//! hands every line to the relay channel. When the stream ends the pipe is
//! closed and acquired again, so consecutive producer processes can write to
//! the same path without restarting the relay.
//!
//! This receiver is unix-only, named pipes don't exist on other platforms.

pub mod config;
pub mod error;
pub mod lines;
pub mod receiver;

pub use config::FifoReceiverConfig;
pub use error::{FifoReceiverError, Result};
pub use receiver::{FifoReceiver, acquire_input};
