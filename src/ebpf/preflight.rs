//! Pre-flight checks run before loading the probe

use crate::{Result, SchedwatchError};
use std::path::Path;
use tracing::{info, warn};

/// BPF programs on tracepoints need 4.7+
pub const MIN_KERNEL_VERSION: (u32, u32) = (4, 7);

const BTF_PATH: &str = "/sys/kernel/btf/vmlinux";

/// Run pre-flight checks to validate the system can run eBPF programs
pub fn run_preflight_checks() -> Result<()> {
    info!("Running pre-flight checks...");

    check_kernel_version()?;
    check_btf();
    check_capabilities();

    info!("Pre-flight checks passed");
    Ok(())
}

/// Parse `major.minor` out of a kernel release string such as `6.8.0-45-generic`
pub fn parse_kernel_version(release: &str) -> Result<(u32, u32)> {
    let release = release.trim();
    let mut parts = release.split('.');

    let major = parts
        .next()
        .and_then(|s| s.parse::<u32>().ok())
        .ok_or_else(|| SchedwatchError::KernelVersionUnparsable(release.to_string()))?;

    let minor = parts
        .next()
        .map(|s| {
            s.split(|c: char| !c.is_ascii_digit())
                .next()
                .unwrap_or_default()
        })
        .and_then(|s| s.parse::<u32>().ok())
        .ok_or_else(|| SchedwatchError::KernelVersionUnparsable(release.to_string()))?;

    Ok((major, minor))
}

/// Check if kernel version is >= [`MIN_KERNEL_VERSION`]
pub fn check_kernel_version() -> Result<()> {
    let output = std::process::Command::new("uname").arg("-r").output()?;
    let release = String::from_utf8_lossy(&output.stdout);

    ensure_supported(&release)?;

    info!("Kernel version: {} (supported)", release.trim());
    Ok(())
}

fn ensure_supported(release: &str) -> Result<()> {
    let version = parse_kernel_version(release)?;
    if version < MIN_KERNEL_VERSION {
        return Err(SchedwatchError::KernelVersionTooOld {
            version: release.trim().to_string(),
            min_version: format!("{}.{}", MIN_KERNEL_VERSION.0, MIN_KERNEL_VERSION.1),
        });
    }
    Ok(())
}

/// Check if BTF (BPF Type Format) is available
pub fn check_btf() {
    if !Path::new(BTF_PATH).exists() {
        warn!("BTF not found at {}", BTF_PATH);
        warn!("The probe does not need BTF, but kernel introspection tools may");
        return;
    }

    info!("BTF available");
}

/// Check if process has necessary capabilities to load eBPF programs
pub fn check_capabilities() {
    #[cfg(target_os = "linux")]
    {
        // SAFETY: geteuid has no preconditions and cannot fail
        let euid = unsafe { libc::geteuid() };

        if euid != 0 {
            warn!(
                "Not running as root (euid={}). Ensure CAP_BPF and CAP_PERFMON (or CAP_SYS_ADMIN) are granted.",
                euid
            );
        } else {
            info!("Running with root privileges");
        }
    }
}
