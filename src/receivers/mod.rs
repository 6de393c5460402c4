// SPDX-License-Identifier: Apache-2.0

#[cfg(unix)]
pub mod fifo;
