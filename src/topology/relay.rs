// SPDX-License-Identifier: Apache-2.0

use crate::bounded_channel::{BoundedReceiver, BoundedSender};
use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Pass-through stage between the pipe reader and the destination writer.
///
/// Each side is a single-slot channel, so a writer that is busy rebuilding
/// its destinations holds at most one line here before the reader is pushed
/// back on.
pub struct LineRelay<T> {
    input: BoundedReceiver<T>,
    output: BoundedSender<T>,
}

impl<T> LineRelay<T> {
    pub fn new(input: BoundedReceiver<T>, output: BoundedSender<T>) -> Self {
        Self { input, output }
    }

    pub async fn run(mut self, cancel: CancellationToken) {
        loop {
            let item = select! {
                item = self.input.next() => match item {
                    Some(item) => item,
                    None => {
                        debug!("Relay input closed");
                        break;
                    }
                },
                _ = cancel.cancelled() => {
                    info!("Line relay cancelled");
                    break;
                }
            };

            select! {
                sent = self.output.send(item) => {
                    if sent.is_err() {
                        debug!("Relay output closed");
                        break;
                    }
                },
                _ = cancel.cancelled() => {
                    info!("Line relay cancelled");
                    break;
                }
            }
        }
    }
}
