//! Shared types between the eBPF probe (kernel) and userspace
//!
//! `SwitchEvent` is a binary contract: the probe writes it verbatim into the
//! `events` perf array and the consumer decodes the same 16 bytes. It must be:
//! - `#[repr(C)]` for stable memory layout
//! - `no_std` compatible for eBPF
//! - free of padding

#![cfg_attr(not(feature = "userspace"), no_std)]

/// Name of the perf event array the probe submits into
pub const EVENTS_MAP: &str = "events";

/// Name of the tracepoint program inside the eBPF object
pub const PROGRAM_NAME: &str = "sched_switch";

/// Tracepoint the program attaches to: `sched/sched_switch`
pub const TRACEPOINT_CATEGORY: &str = "sched";
pub const TRACEPOINT_NAME: &str = "sched_switch";

/// One scheduler context switch as seen by the probe
///
/// Layout (16 bytes total, 8-byte aligned):
/// - pid: upper 32 bits of `bpf_get_current_pid_tgid()` for the task being switched out
/// - cpu: logical CPU index the switch happened on
/// - time: `bpf_ktime_get_ns()` at the time of the switch (monotonic, since boot)
#[repr(C)]
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "userspace", derive(PartialEq, Eq))]
pub struct SwitchEvent {
    pub pid: u32,
    pub cpu: u32,
    pub time: u64,
}

impl SwitchEvent {
    /// Size of one record on the wire
    pub const SIZE: usize = 16;

    /// Build an event from the raw pid/tgid helper value.
    #[inline(always)]
    pub const fn from_pid_tgid(pid_tgid: u64, cpu: u32, time: u64) -> Self {
        Self {
            pid: (pid_tgid >> 32) as u32,
            cpu,
            time,
        }
    }
}

#[cfg(feature = "userspace")]
impl SwitchEvent {
    /// Decode a little-endian wire record. Returns `None` unless `bytes` is
    /// exactly [`SwitchEvent::SIZE`] long.
    pub fn from_le_bytes(bytes: &[u8]) -> Option<Self> {
        let bytes: &[u8; Self::SIZE] = bytes.try_into().ok()?;
        let (pid, rest) = bytes.split_at(4);
        let (cpu, time) = rest.split_at(4);

        Some(Self {
            pid: u32::from_le_bytes(pid.try_into().ok()?),
            cpu: u32::from_le_bytes(cpu.try_into().ok()?),
            time: u64::from_le_bytes(time.try_into().ok()?),
        })
    }

    /// Encode as a little-endian wire record
    pub fn to_le_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[0..4].copy_from_slice(&self.pid.to_le_bytes());
        out[4..8].copy_from_slice(&self.cpu.to_le_bytes());
        out[8..16].copy_from_slice(&self.time.to_le_bytes());
        out
    }
}

const _: () = {
    assert!(
        core::mem::size_of::<SwitchEvent>() == SwitchEvent::SIZE,
        "SwitchEvent must be exactly 16 bytes"
    );
    assert!(
        core::mem::align_of::<SwitchEvent>() == 8,
        "SwitchEvent must be 8-byte aligned"
    );
    assert!(core::mem::offset_of!(SwitchEvent, pid) == 0);
    assert!(core::mem::offset_of!(SwitchEvent, cpu) == 4);
    assert!(core::mem::offset_of!(SwitchEvent, time) == 8);
};
