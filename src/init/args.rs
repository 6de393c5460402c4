// SPDX-License-Identifier: Apache-2.0

use crate::init::config::{DEFAULT_OUTPUT_PREFIX, RelayConfig, RotationPolicy};
use crate::receivers::fifo::config::{DEFAULT_INPUT_PATH, DEFAULT_MAX_LINE_LENGTH};
use clap::Args;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Args, Clone)]
pub struct RelayArgs {
    /// Input named pipe, created when missing
    #[arg(short = 'i', long = "input", env = "LOGPIPE_INPUT", default_value = DEFAULT_INPUT_PATH)]
    pub input: PathBuf,

    /// Output file prefix, the date is appended as -YYYY-MM-DD. Empty disables file output
    #[arg(short = 'o', long = "output", env = "LOGPIPE_OUTPUT", default_value = DEFAULT_OUTPUT_PREFIX)]
    pub output: String,

    /// UDP destination as host:port. Empty disables UDP output
    #[arg(short = 'u', long = "udp", env = "LOGPIPE_UDP", default_value = "")]
    pub udp: String,

    /// Maximum line length in bytes, longer lines are dropped
    #[arg(long, env = "LOGPIPE_MAX_LINE_LENGTH", default_value_t = DEFAULT_MAX_LINE_LENGTH)]
    pub max_line_length: usize,

    /// Seconds between two rotation checks
    #[arg(long, env = "LOGPIPE_ROTATION_CHECK_INTERVAL_SECS", default_value = "5")]
    pub rotation_check_interval_secs: u64,

    /// Rotation policy
    #[arg(value_enum, long, env = "LOGPIPE_ROTATION", default_value = "daily")]
    pub rotation: RotationPolicy,
}

impl RelayArgs {
    pub fn build_config(&self) -> RelayConfig {
        RelayConfig {
            input_path: self.input.clone(),
            output_prefix: self.output.clone(),
            udp_address: self.udp.clone(),
            max_line_length: self.max_line_length,
            rotation_check_interval: Duration::from_secs(self.rotation_check_interval_secs),
            rotation_policy: self.rotation,
        }
    }
}
