// SPDX-License-Identifier: Apache-2.0

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DestinationError {
    #[error("no output given")]
    NoOutput,

    #[error("can't open output file {path}: {source}")]
    OpenFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("can't dial udp destination {address}: {source}")]
    DialUdp {
        address: String,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, DestinationError>;
