//! Runtime configuration for the trace command

use crate::{Result, SchedwatchError};
use std::time::Duration;

/// Upper bound on buffers handed to a single perf read
pub const MAX_BATCH_SIZE: usize = 1024;

/// Output format for drained events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// `PID: <pid>, CPU: <cpu>, Time: <time> ns`
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Stop after this long; run until Ctrl-C when `None`
    pub duration: Option<Duration>,
    /// Pages per CPU perf buffer
    pub page_count: usize,
    /// Records read per CPU per wakeup
    pub batch_size: usize,
    pub format: OutputFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            duration: None,
            page_count: 64,
            batch_size: 64,
            format: OutputFormat::Text,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.page_count == 0 || !self.page_count.is_power_of_two() {
            return Err(SchedwatchError::ConfigError(format!(
                "page count must be a non-zero power of two, got {}",
                self.page_count
            )));
        }

        if self.batch_size == 0 || self.batch_size > MAX_BATCH_SIZE {
            return Err(SchedwatchError::ConfigError(format!(
                "batch size must be between 1 and {}, got {}",
                MAX_BATCH_SIZE, self.batch_size
            )));
        }

        if self.duration == Some(Duration::ZERO) {
            return Err(SchedwatchError::ConfigError(
                "duration must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}
