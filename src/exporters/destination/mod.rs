// SPDX-License-Identifier: Apache-2.0

//! Destination writer
//!
//! Owns the live output targets (a day-stamped file and/or a connected UDP
//! socket), writes every line to all of them and rebuilds the whole set when
//! a write fails or the day rolls over.

pub mod error;
pub mod file;
pub mod set;
pub mod udp;
pub mod writer;

pub use error::{DestinationError, Result};
pub use set::DestinationSet;
pub use writer::DestinationWriter;

use std::future::Future;
use std::io;
use std::path::Path;
use std::pin::Pin;

pub type DestinationFuture<'a, T> = Pin<Box<dyn Future<Output = io::Result<T>> + Send + 'a>>;

/// A single output target
pub trait Destination: Send {
    /// Short name used in logs, e.g. `file` or `udp`
    fn kind(&self) -> &'static str;

    /// Write one framed record, already terminated by a newline
    fn write_record<'a>(&'a mut self, record: &'a [u8]) -> DestinationFuture<'a, ()>;

    fn close(self: Box<Self>) -> DestinationFuture<'static, ()>;
}

/// Opens destinations during a rebuild
pub trait DestinationOpener: Send + Sync {
    fn open_file<'a>(&'a self, path: &'a Path) -> DestinationFuture<'a, Box<dyn Destination>>;

    fn dial_udp<'a>(&'a self, address: &'a str) -> DestinationFuture<'a, Box<dyn Destination>>;
}

/// Opens real files and sockets
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemOpener;

impl DestinationOpener for SystemOpener {
    fn open_file<'a>(&'a self, path: &'a Path) -> DestinationFuture<'a, Box<dyn Destination>> {
        Box::pin(async move {
            let file = file::FileDestination::open(path).await?;
            Ok(Box::new(file) as Box<dyn Destination>)
        })
    }

    fn dial_udp<'a>(&'a self, address: &'a str) -> DestinationFuture<'a, Box<dyn Destination>> {
        Box::pin(async move {
            let udp = udp::UdpDestination::dial(address).await?;
            Ok(Box::new(udp) as Box<dyn Destination>)
        })
    }
}

/// Which destinations to build
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DestinationConfig {
    /// Prefix of the day-stamped output file, `None` disables the file sink
    pub output_prefix: Option<String>,

    /// UDP `host:port`, `None` disables the UDP sink
    pub udp_address: Option<String>,
}

impl DestinationConfig {
    /// Empty values disable the matching sink
    pub fn new(output_prefix: impl Into<String>, udp_address: impl Into<String>) -> Self {
        let non_empty = |s: String| if s.is_empty() { None } else { Some(s) };
        Self {
            output_prefix: non_empty(output_prefix.into()),
            udp_address: non_empty(udp_address.into()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.output_prefix.is_none() && self.udp_address.is_none() {
            return Err(DestinationError::NoOutput);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_values_disable_sinks() {
        let config = DestinationConfig::new("log", "");
        assert_eq!(config.output_prefix.as_deref(), Some("log"));
        assert_eq!(config.udp_address, None);

        let config = DestinationConfig::new("", "127.0.0.1:3309");
        assert_eq!(config.output_prefix, None);
        assert_eq!(config.udp_address.as_deref(), Some("127.0.0.1:3309"));
    }

    #[test]
    fn test_validate_requires_an_output() {
        assert!(DestinationConfig::new("log", "").validate().is_ok());
        assert!(DestinationConfig::new("", "localhost:514").validate().is_ok());
        assert!(matches!(
            DestinationConfig::new("", "").validate(),
            Err(DestinationError::NoOutput)
        ));
    }
}
