// SPDX-License-Identifier: Apache-2.0

use crate::exporters::destination::{Destination, DestinationFuture};
use std::path::Path;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;

/// Permissions for newly created output files
pub const OUTPUT_FILE_MODE: u32 = 0o600;

/// Append-only output file.
///
/// Every record is flushed before the write returns, so an I/O error is
/// reported for the record that caused it.
pub struct FileDestination {
    file: File,
}

impl FileDestination {
    /// Open or create `path` for appending, existing content is kept
    pub async fn open(path: &Path) -> std::io::Result<Self> {
        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .mode(OUTPUT_FILE_MODE)
            .open(path)
            .await?;

        Ok(Self { file })
    }
}

impl Destination for FileDestination {
    fn kind(&self) -> &'static str {
        "file"
    }

    fn write_record<'a>(&'a mut self, record: &'a [u8]) -> DestinationFuture<'a, ()> {
        Box::pin(async move {
            self.file.write_all(record).await?;
            self.file.flush().await
        })
    }

    fn close(self: Box<Self>) -> DestinationFuture<'static, ()> {
        let mut file = self.file;
        Box::pin(async move { file.flush().await })
    }
}
