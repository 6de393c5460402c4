// SPDX-License-Identifier: Apache-2.0

use crate::bounded_channel::BoundedReceiver;
use crate::exporters::destination::set::close_quietly;
use crate::exporters::destination::{
    DestinationConfig, DestinationError, DestinationOpener, DestinationSet, Result, SystemOpener,
};
use crate::topology::rotation::{Clock, RotationKey};
use bytes::Bytes;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Sole owner of the output file and UDP socket.
///
/// A failed write or a rotation signal rebuilds every destination from
/// scratch. A failed rebuild is returned to the caller, which has no way to
/// make progress without destinations.
pub struct DestinationWriter<O = SystemOpener> {
    config: DestinationConfig,
    opener: O,
    clock: Arc<dyn Clock>,
    destinations: DestinationSet,
}

impl<O: DestinationOpener> DestinationWriter<O> {
    /// Validate the config and open the first destination set
    pub async fn open(config: DestinationConfig, opener: O, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;

        let mut writer = Self {
            config,
            opener,
            clock,
            destinations: DestinationSet::default(),
        };
        writer.rebuild().await?;

        Ok(writer)
    }

    /// Close and reopen all configured destinations for the current day.
    ///
    /// Reopening the same day's file appends to it, nothing is truncated.
    pub async fn rebuild(&mut self) -> Result<()> {
        let key = RotationKey::now(self.clock.as_ref());

        if let Some(prefix) = &self.config.output_prefix {
            if let Some(previous) = self.destinations.file.take() {
                close_quietly(previous).await;
            }

            let path = PathBuf::from(key.file_name(prefix));
            let file = self
                .opener
                .open_file(&path)
                .await
                .map_err(|source| DestinationError::OpenFile {
                    path: path.clone(),
                    source,
                })?;
            debug!(path = %path.display(), "Opened output file");
            self.destinations.file = Some(file);
        }

        if let Some(address) = &self.config.udp_address {
            if let Some(previous) = self.destinations.udp.take() {
                close_quietly(previous).await;
            }

            let udp = self.opener.dial_udp(address).await.map_err(|source| {
                DestinationError::DialUdp {
                    address: address.clone(),
                    source,
                }
            })?;
            debug!(address = %address, "Dialed UDP destination");
            self.destinations.udp = Some(udp);
        }

        if self.destinations.is_empty() {
            return Err(DestinationError::NoOutput);
        }

        info!(
            day = %key,
            file = self.destinations.file.is_some(),
            udp = self.destinations.udp.is_some(),
            "Destinations opened"
        );
        Ok(())
    }

    /// Write one line, rebuilding the destinations if the write fails.
    ///
    /// The failed line is not retried.
    pub async fn write_line(&mut self, line: &[u8]) -> Result<()> {
        if let Err(e) = self.destinations.write_line(line).await {
            warn!(error = %e, "Writing error, closing sockets/file and reopening");
            self.rebuild().await?;
        }
        Ok(())
    }

    /// Process lines and rotation signals until cancelled or the line channel closes
    pub async fn run(
        mut self,
        mut lines: BoundedReceiver<Bytes>,
        mut rotations: BoundedReceiver<()>,
        cancel: CancellationToken,
    ) -> Result<()> {
        let mut rotations_open = true;

        let result = loop {
            select! {
                line = lines.next() => match line {
                    Some(line) => {
                        if let Err(e) = self.write_line(&line).await {
                            break Err(e);
                        }
                    }
                    None => {
                        debug!("Line channel closed, stopping destination writer");
                        break Ok(());
                    }
                },
                rotation = rotations.next(), if rotations_open => match rotation {
                    Some(()) => {
                        info!("Rotating destinations");
                        if let Err(e) = self.rebuild().await {
                            break Err(e);
                        }
                    }
                    None => {
                        warn!("Rotation channel closed, destinations will no longer rotate");
                        rotations_open = false;
                    }
                },
                _ = cancel.cancelled() => {
                    info!("Destination writer cancelled");
                    break Ok(());
                }
            }
        };

        self.destinations.close().await;
        result
    }
}
