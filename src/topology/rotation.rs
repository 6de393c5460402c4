// SPDX-License-Identifier: Apache-2.0

//! Day-rollover detection.
//!
//! The monitor polls a [`RotationTrigger`] on a fixed interval and sends a
//! unit signal to the destination writer whenever the trigger fires.

use crate::bounded_channel::BoundedSender;
use chrono::{Datelike, Local, NaiveDate};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::select;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Default interval between two trigger checks
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(5);

/// Source of the current local calendar date
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Wall clock in the local time zone
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn today(&self) -> NaiveDate {
        (**self).today()
    }
}

/// Calendar day a destination set was opened for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationKey {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl RotationKey {
    pub fn now(clock: &dyn Clock) -> Self {
        clock.today().into()
    }

    /// `{prefix}-{year}-{month:02}-{day:02}`
    pub fn file_name(&self, prefix: &str) -> String {
        format!("{}-{}", prefix, self)
    }
}

impl From<NaiveDate> for RotationKey {
    fn from(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
            day: date.day(),
        }
    }
}

impl fmt::Display for RotationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// Decides at each check whether the destinations should be rotated
pub trait RotationTrigger: Send {
    fn should_rotate(&mut self) -> bool;
}

/// Fires once whenever the local date differs from the last recorded one
pub struct DayChange<C> {
    clock: C,
    day: NaiveDate,
}

impl<C: Clock> DayChange<C> {
    pub fn new(clock: C) -> Self {
        let day = clock.today();
        Self { clock, day }
    }
}

impl<C: Clock> RotationTrigger for DayChange<C> {
    fn should_rotate(&mut self) -> bool {
        let today = self.clock.today();
        if today != self.day {
            self.day = today;
            return true;
        }
        false
    }
}

/// Fires at every check
#[derive(Debug, Default)]
pub struct EveryCheck;

impl RotationTrigger for EveryCheck {
    fn should_rotate(&mut self) -> bool {
        true
    }
}

pub struct RolloverMonitor {
    trigger: Box<dyn RotationTrigger>,
    check_interval: Duration,
    rotate_tx: BoundedSender<()>,
}

impl RolloverMonitor {
    pub fn new(
        trigger: Box<dyn RotationTrigger>,
        check_interval: Duration,
        rotate_tx: BoundedSender<()>,
    ) -> Self {
        Self {
            trigger,
            check_interval,
            rotate_tx,
        }
    }

    pub async fn run(mut self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.check_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await; // Skip the first immediate tick

        loop {
            select! {
                _ = ticker.tick() => {
                    if !self.trigger.should_rotate() {
                        continue;
                    }
                    debug!("Rotation triggered");

                    // Rotations are rare, waiting on the single slot is fine
                    select! {
                        sent = self.rotate_tx.send(()) => {
                            if sent.is_err() {
                                debug!("Rotation channel closed, stopping monitor");
                                return;
                            }
                        }
                        _ = cancel.cancelled() => break,
                    }
                }
                _ = cancel.cancelled() => break,
            }
        }

        info!("Rollover monitor cancelled");
    }
}

#[cfg(test)]
pub(crate) use manual_clock::ManualClock;
