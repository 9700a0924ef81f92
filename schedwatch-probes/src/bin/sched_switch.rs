//! Scheduler context switch probe
//!
//! This probe:
//! - Attaches to the `sched/sched_switch` tracepoint
//! - Records the current pid, CPU index and monotonic timestamp
//! - Submits one `SwitchEvent` per switch into the current CPU's perf buffer
//!
//! It runs inline on the scheduler path: no allocation, no loops, no logging.
//!
//! Note: This binary must be built for the bpfel-unknown-none target.
//! The root crate's build.rs handles cross-compilation via aya-build.

#![no_std]
#![no_main]

use aya_ebpf::{
    helpers::{bpf_get_current_pid_tgid, bpf_get_smp_processor_id, bpf_ktime_get_ns},
    macros::{map, tracepoint},
    maps::PerfEventArray,
    programs::TracePointContext,
};
use schedwatch_common::SwitchEvent;

/// One perf ring per CPU. Records are dropped by the kernel when the ring of
/// the submitting CPU is full; userspace sees them as lost samples.
#[map(name = "events")]
static EVENTS: PerfEventArray<SwitchEvent> = PerfEventArray::new(0);

#[tracepoint]
pub fn sched_switch(ctx: TracePointContext) -> u32 {
    record_switch(&ctx);
    // Success whether or not the record made it into the buffer.
    0
}

#[inline(always)]
fn record_switch(ctx: &TracePointContext) {
    let pid_tgid = bpf_get_current_pid_tgid();
    // SAFETY: both helpers are always safe to call from tracepoint context
    let cpu = unsafe { bpf_get_smp_processor_id() };
    let time = unsafe { bpf_ktime_get_ns() };

    let event = SwitchEvent::from_pid_tgid(pid_tgid, cpu, time);

    // PerfEventArray::output submits with BPF_F_CURRENT_CPU. A failed
    // submission is counted by the kernel as lost and otherwise ignored.
    EVENTS.output(ctx, &event, 0);
}

#[cfg(not(test))]
#[panic_handler]
fn panic(_info: &core::panic::PanicInfo) -> ! {
    loop {}
}

// bpf_perf_event_output is a GPL-only helper.
#[link_section = "license"]
#[no_mangle]
static LICENSE: [u8; 4] = *b"GPL\0";
