pub mod cli;
pub mod config;
pub mod ebpf;
pub mod error;

pub use error::{Result, SchedwatchError};
pub use schedwatch_common::SwitchEvent;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
