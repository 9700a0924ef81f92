//! Userspace side of the sched_switch probe
//!
//! - `preflight`: kernel, BTF and privilege checks
//! - `loader`: load, attach and unload the probe (Linux only)
//! - `reader`: per-CPU perf buffer readers (Linux only)
//! - `events`: record decoding and rendering

pub mod events;
pub mod preflight;

#[cfg(target_os = "linux")]
pub mod loader;
#[cfg(target_os = "linux")]
pub mod reader;
