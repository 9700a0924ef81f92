use anyhow::{anyhow, Context};
use aya_build::cargo_metadata;
use std::env;

fn main() -> anyhow::Result<()> {
    // Skip eBPF build if we're already building for the eBPF target
    if env::var("CARGO_CFG_TARGET_ARCH").unwrap_or_default() == "bpf" {
        return Ok(());
    }

    // The loader is Linux-only; nothing embeds the object elsewhere
    if env::var("CARGO_CFG_TARGET_OS").unwrap_or_default() != "linux" {
        println!(
            "cargo:warning=eBPF compilation skipped for target OS {}.",
            env::var("CARGO_CFG_TARGET_OS").unwrap_or_default()
        );
        return Ok(());
    }

    let cargo_metadata::Metadata { packages, .. } = cargo_metadata::MetadataCommand::new()
        .no_deps()
        .exec()
        .context("MetadataCommand::exec")?;

    let ebpf_package = packages
        .into_iter()
        .find(|pkg| pkg.name == "schedwatch-probes")
        .ok_or_else(|| anyhow!("schedwatch-probes package not found"))?;

    aya_build::build_ebpf([ebpf_package])?;

    let out_dir = env::var("OUT_DIR")?;
    let probe_path = format!("{}/sched_switch", out_dir);
    if !std::path::Path::new(&probe_path).exists() {
        return Err(anyhow!(
            "eBPF probe compilation failed: {} not found",
            probe_path
        ));
    }

    Ok(())
}
