// SPDX-License-Identifier: Apache-2.0

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FifoReceiverError {
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("can't create named pipe {path}: {source}")]
    CreatePipe {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unknown error when opening named pipe {path}: {source}")]
    Stat {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("the input file is not a named pipe: {0}")]
    NotAPipe(PathBuf),

    #[error("can't open named pipe {path}: {source}")]
    OpenPipe {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("line channel closed")]
    ChannelClosed,
}

pub type Result<T> = std::result::Result<T, FifoReceiverError>;
