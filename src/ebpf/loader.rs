//! eBPF probe loader and lifecycle management

use crate::ebpf::preflight::run_preflight_checks;
use crate::ebpf::reader::CpuReader;
use crate::{Result, SchedwatchError};
use aya::{maps::AsyncPerfEventArray, programs::TracePoint, util::online_cpus, Ebpf};
use schedwatch_common::{EVENTS_MAP, PROGRAM_NAME, TRACEPOINT_CATEGORY, TRACEPOINT_NAME};
use tracing::info;

/// Manages the sched_switch probe lifecycle
///
/// Dropping the manager detaches the program and destroys the `events` map.
pub struct ProbeManager {
    bpf: Ebpf,
}

impl ProbeManager {
    /// Run pre-flight checks and load the embedded probe object
    pub fn new() -> Result<Self> {
        run_preflight_checks()?;

        info!("Loading sched_switch probe...");
        let bpf = load_sched_switch_probe()?;

        Ok(Self { bpf })
    }

    /// Attach the probe to `sched/sched_switch`
    pub fn attach(&mut self) -> Result<()> {
        let program: &mut TracePoint = self
            .bpf
            .program_mut(PROGRAM_NAME)
            .ok_or_else(|| SchedwatchError::ProgramNotFound(PROGRAM_NAME.to_string()))?
            .try_into()
            .map_err(|e| SchedwatchError::ProgramLoadFailed(format!("{}", e)))?;

        program
            .load()
            .map_err(|e| SchedwatchError::ProgramLoadFailed(e.to_string()))?;

        program
            .attach(TRACEPOINT_CATEGORY, TRACEPOINT_NAME)
            .map_err(|e| {
                SchedwatchError::AttachFailed(format!(
                    "{}/{}: {}",
                    TRACEPOINT_CATEGORY, TRACEPOINT_NAME, e
                ))
            })?;

        info!(
            "Probe attached to tracepoint {}/{}",
            TRACEPOINT_CATEGORY, TRACEPOINT_NAME
        );
        Ok(())
    }

    /// Take the `events` map and open one reader per online CPU.
    ///
    /// `page_count` is the size of each CPU's buffer in pages and must be a
    /// power of two. Can only be called once per manager.
    pub fn open_readers(&mut self, page_count: usize) -> Result<Vec<CpuReader>> {
        let available_maps: Vec<_> = self.bpf.maps().map(|(name, _)| name.to_string()).collect();
        let map = self
            .bpf
            .take_map(EVENTS_MAP)
            .ok_or_else(|| SchedwatchError::MapNotFound {
                name: EVENTS_MAP.to_string(),
                available: available_maps,
            })?;

        let mut perf_array = AsyncPerfEventArray::try_from(map)
            .map_err(|e| SchedwatchError::EbpfError(format!("{}: {}", EVENTS_MAP, e)))?;

        let cpus = online_cpus().map_err(|(path, e)| {
            SchedwatchError::EbpfError(format!("Failed to read online CPUs from {}: {}", path, e))
        })?;

        let mut readers = Vec::with_capacity(cpus.len());
        for cpu in cpus {
            let buf = perf_array
                .open(cpu, Some(page_count))
                .map_err(|e| SchedwatchError::PerfBuffer(format!("cpu {}: {}", cpu, e)))?;
            readers.push(CpuReader::new(cpu, buf));
        }

        info!(
            "Opened {} per-CPU buffers ({} pages each)",
            readers.len(),
            page_count
        );
        Ok(readers)
    }

    /// Detach and unload the probe
    pub fn unload(self) {
        info!("Unloading eBPF probe...");
        drop(self.bpf);
        info!("Probe unloaded");
    }
}

/// Load the sched_switch probe eBPF object
fn load_sched_switch_probe() -> Result<Ebpf> {
    Ebpf::load(aya::include_bytes_aligned!(concat!(
        env!("OUT_DIR"),
        "/sched_switch"
    )))
    .map_err(|e| SchedwatchError::ProgramLoadFailed(e.to_string()))
}
