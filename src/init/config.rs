// SPDX-License-Identifier: Apache-2.0

use crate::exporters::destination::{DestinationConfig, DestinationError};
use crate::receivers::fifo::FifoReceiverConfig;
use crate::receivers::fifo::config::{DEFAULT_INPUT_PATH, DEFAULT_MAX_LINE_LENGTH};
use crate::topology::rotation::{
    Clock, DEFAULT_CHECK_INTERVAL, DayChange, EveryCheck, RotationTrigger,
};
use clap::ValueEnum;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Default output file prefix
pub const DEFAULT_OUTPUT_PREFIX: &str = "log";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid input configuration: {0}")]
    Input(String),

    #[error(transparent)]
    Destination(#[from] DestinationError),

    #[error("rotation check interval must be greater than zero")]
    ZeroCheckInterval,
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// When the destinations are reopened
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, ValueEnum)]
pub enum RotationPolicy {
    /// When the local calendar day changes
    #[default]
    Daily,

    /// At every rotation check
    Always,
}

/// Immutable relay settings, built once at startup
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub input_path: PathBuf,

    /// Empty disables the file destination
    pub output_prefix: String,

    /// Empty disables the UDP destination
    pub udp_address: String,

    pub max_line_length: usize,
    pub rotation_check_interval: Duration,
    pub rotation_policy: RotationPolicy,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from(DEFAULT_INPUT_PATH),
            output_prefix: DEFAULT_OUTPUT_PREFIX.to_string(),
            udp_address: String::new(),
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            rotation_check_interval: DEFAULT_CHECK_INTERVAL,
            rotation_policy: RotationPolicy::default(),
        }
    }
}

impl RelayConfig {
    pub fn validate(&self) -> Result<()> {
        self.receiver_config()
            .validate()
            .map_err(ConfigError::Input)?;
        self.destination_config().validate()?;

        if self.rotation_check_interval.is_zero() {
            return Err(ConfigError::ZeroCheckInterval);
        }
        Ok(())
    }

    pub fn receiver_config(&self) -> FifoReceiverConfig {
        FifoReceiverConfig::new(self.input_path.clone())
            .with_max_line_length(self.max_line_length)
    }

    pub fn destination_config(&self) -> DestinationConfig {
        DestinationConfig::new(self.output_prefix.clone(), self.udp_address.clone())
    }

    pub fn rotation_trigger<C: Clock + 'static>(&self, clock: C) -> Box<dyn RotationTrigger> {
        match self.rotation_policy {
            RotationPolicy::Daily => Box::new(DayChange::new(clock)),
            RotationPolicy::Always => Box::new(EveryCheck),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = RelayConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.input_path, PathBuf::from("access.log"));
        assert_eq!(
            config.destination_config().output_prefix.as_deref(),
            Some("log")
        );
        assert_eq!(config.destination_config().udp_address, None);
    }

    #[test]
    fn test_no_outputs_rejected() {
        let config = RelayConfig {
            output_prefix: String::new(),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Destination(DestinationError::NoOutput)
        ));
        assert_eq!(err.to_string(), "no output given");
    }

    #[test]
    fn test_invalid_input_rejected() {
        let config = RelayConfig {
            max_line_length: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Input(_))));

        let config = RelayConfig {
            input_path: PathBuf::new(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Input(_))));
    }

    #[test]
    fn test_zero_check_interval_rejected() {
        let config = RelayConfig {
            rotation_check_interval: Duration::ZERO,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroCheckInterval)
        ));
    }

    #[test]
    fn test_always_policy_fires_every_check() {
        use crate::topology::rotation::LocalClock;

        let config = RelayConfig {
            rotation_policy: RotationPolicy::Always,
            ..Default::default()
        };
        let mut trigger = config.rotation_trigger(LocalClock);
        assert!(trigger.should_rotate());
        assert!(trigger.should_rotate());
    }
}
