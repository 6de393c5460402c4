// SPDX-License-Identifier: Apache-2.0

use crate::bounded_channel::bounded;
use crate::exporters::destination::{DestinationWriter, SystemOpener};
use crate::init::BoxError;
use crate::init::config::RelayConfig;
use crate::init::wait::{self, RelayTasks};
use crate::receivers::fifo::{FifoReceiver, FifoReceiverError};
use crate::topology::relay::LineRelay;
use crate::topology::rotation::{Clock, LocalClock, RolloverMonitor};
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Capacity of every channel between stages
const STAGE_QUEUE_SIZE: usize = 1;

/// How long the tasks get to stop once the relay is shutting down
const TASK_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Wires the pipe reader, line relay, rollover monitor and destination writer
pub struct Relay {
    config: RelayConfig,
    clock: Arc<dyn Clock>,
}

impl Relay {
    pub fn new(config: RelayConfig) -> Self {
        Self {
            config,
            clock: Arc::new(LocalClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Run until cancelled or until a fatal error.
    ///
    /// The destinations are opened before anything else starts, so a bad
    /// output fails here without touching the pipe. The pipe reader then runs
    /// in this task while the other stages run in a `JoinSet`.
    pub async fn run(self, cancel: CancellationToken) -> Result<(), BoxError> {
        self.config.validate()?;

        let receiver = FifoReceiver::new(self.config.receiver_config())?;
        let writer = DestinationWriter::open(
            self.config.destination_config(),
            SystemOpener,
            self.clock.clone(),
        )
        .await?;

        let (reader_tx, relay_rx) = bounded::<Bytes>(STAGE_QUEUE_SIZE);
        let (relay_tx, writer_rx) = bounded::<Bytes>(STAGE_QUEUE_SIZE);
        let (rotate_tx, rotate_rx) = bounded::<()>(STAGE_QUEUE_SIZE);

        let monitor = RolloverMonitor::new(
            self.config.rotation_trigger(self.clock.clone()),
            self.config.rotation_check_interval,
            rotate_tx,
        );

        let tasks_cancel = cancel.child_token();
        let mut tasks = RelayTasks::new();
        {
            let token = tasks_cancel.clone();
            tasks.spawn(async move {
                monitor.run(token).await;
                Ok(())
            });
        }
        {
            let token = tasks_cancel.clone();
            tasks.spawn(async move {
                LineRelay::new(relay_rx, relay_tx).run(token).await;
                Ok(())
            });
        }
        {
            let token = tasks_cancel.clone();
            tasks.spawn(async move {
                writer
                    .run(writer_rx, rotate_rx, token)
                    .await
                    .map_err(|e| e.into())
            });
        }

        info!(
            input = %self.config.input_path.display(),
            output = %self.config.output_prefix,
            udp = %self.config.udp_address,
            rotation = ?self.config.rotation_policy,
            "Relay started"
        );

        let reader = receiver.run(reader_tx, tasks_cancel.clone());
        tokio::pin!(reader);

        let (reader_res, task_res) = select! {
            res = &mut reader => (Some(res), None),
            res = wait::wait_for_any_task(&mut tasks) => (None, Some(res)),
        };

        debug!("Stopping relay tasks");
        tasks_cancel.cancel();

        // The reader may be parked in a pipe open, let it release it
        let reader_res = match reader_res {
            Some(res) => res,
            None => reader.await,
        };

        let mut result: Result<(), BoxError> = match task_res {
            Some(Ok(())) if !cancel.is_cancelled() => Err("relay task exited unexpectedly".into()),
            Some(Err(e)) => Err(e),
            _ => Ok(()),
        };

        // A closed channel means a later stage stopped, its error is the cause
        let mut downstream_closed = false;
        match reader_res {
            Ok(()) => {}
            Err(FifoReceiverError::ChannelClosed) => downstream_closed = true,
            Err(e) if result.is_ok() => result = Err(e.into()),
            Err(e) => warn!(error = %e, "Additional error while stopping pipe reader"),
        }

        let shutdown = wait::wait_for_tasks_with_timeout(&mut tasks, TASK_SHUTDOWN_TIMEOUT).await;

        match (result, shutdown) {
            (Err(e), Err(other)) => {
                warn!(error = %other, "Additional error while stopping relay tasks");
                Err(e)
            }
            (Err(e), Ok(())) | (Ok(()), Err(e)) => Err(e),
            (Ok(()), Ok(())) if downstream_closed => Err(FifoReceiverError::ChannelClosed.into()),
            (Ok(()), Ok(())) => {
                info!("Relay stopped");
                Ok(())
            }
        }
    }
}
