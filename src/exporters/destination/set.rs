// SPDX-License-Identifier: Apache-2.0

use crate::exporters::destination::Destination;
use std::io;
use tracing::warn;

/// The currently open destinations, written as one fan-out target.
///
/// Records go to the file first, then to UDP. The first failing destination
/// aborts the write, later ones don't see that record.
#[derive(Default)]
pub struct DestinationSet {
    pub(crate) file: Option<Box<dyn Destination>>,
    pub(crate) udp: Option<Box<dyn Destination>>,
}

impl DestinationSet {
    pub fn is_empty(&self) -> bool {
        self.file.is_none() && self.udp.is_none()
    }

    /// Frame `line` with a trailing newline and write it to every destination
    pub async fn write_line(&mut self, line: &[u8]) -> io::Result<()> {
        let mut record = Vec::with_capacity(line.len() + 1);
        record.extend_from_slice(line);
        record.push(b'\n');

        for dest in self.file.iter_mut().chain(self.udp.iter_mut()) {
            let kind = dest.kind();
            dest.write_record(&record)
                .await
                .map_err(|e| io::Error::new(e.kind(), format!("{} destination: {}", kind, e)))?;
        }
        Ok(())
    }

    /// Close everything, failures are logged and ignored
    pub async fn close(&mut self) {
        if let Some(file) = self.file.take() {
            close_quietly(file).await;
        }
        if let Some(udp) = self.udp.take() {
            close_quietly(udp).await;
        }
    }
}

pub(crate) async fn close_quietly(dest: Box<dyn Destination>) {
    let kind = dest.kind();
    if let Err(e) = dest.close().await {
        warn!(destination = kind, error = %e, "Error closing destination");
    }
}
