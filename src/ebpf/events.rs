//! Decoding and rendering of records drained from the `events` perf array

use crate::config::OutputFormat;
use crate::{Result, SchedwatchError};
use schedwatch_common::SwitchEvent;
use serde::Serialize;
use std::io::Write;
use tokio::sync::mpsc;
use tracing::warn;

/// Records drained from one CPU's buffer in a single read
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CpuBatch {
    pub cpu: u32,
    /// In submission order
    pub events: Vec<SwitchEvent>,
    /// Records the kernel dropped since the previous read because the buffer was full
    pub lost: usize,
}

/// Decode one raw perf sample into a [`SwitchEvent`]
///
/// The kernel pads raw samples so that the size header plus payload is 8-byte
/// aligned, so a 16 byte record arrives as 20 bytes. Trailing padding is
/// ignored; anything shorter than a record is rejected.
pub fn decode_record(bytes: &[u8]) -> Result<SwitchEvent> {
    bytes
        .get(..SwitchEvent::SIZE)
        .and_then(SwitchEvent::from_le_bytes)
        .ok_or(SchedwatchError::MalformedRecord {
            expected: SwitchEvent::SIZE,
            actual: bytes.len(),
        })
}

#[derive(Serialize)]
struct JsonEvent {
    pid: u32,
    cpu: u32,
    time: u64,
}

/// Render one event as a single output line (without trailing newline)
pub fn render(event: &SwitchEvent, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(format!(
            "PID: {}, CPU: {}, Time: {} ns",
            event.pid, event.cpu, event.time
        )),
        OutputFormat::Json => {
            let json = JsonEvent {
                pid: event.pid,
                cpu: event.cpu,
                time: event.time,
            };
            Ok(serde_json::to_string(&json)?)
        }
    }
}

/// Running totals across all CPUs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainStats {
    pub received: u64,
    pub lost: u64,
    pub batches: u64,
}

impl DrainStats {
    pub fn record(&mut self, batch: &CpuBatch) {
        self.received += batch.events.len() as u64;
        self.lost += batch.lost as u64;
        self.batches += 1;
    }
}

/// Writes drained batches to `out` and keeps the running totals
pub struct EventSink<W> {
    out: W,
    format: OutputFormat,
    stats: DrainStats,
}

impl<W: Write> EventSink<W> {
    pub fn new(out: W, format: OutputFormat) -> Self {
        Self {
            out,
            format,
            stats: DrainStats::default(),
        }
    }

    /// Print one reader result. A reader error is returned as-is so the
    /// trace stops instead of running with a CPU missing.
    pub fn handle(&mut self, item: Result<CpuBatch>) -> Result<()> {
        let batch = item?;

        if batch.lost > 0 {
            warn!(cpu = batch.cpu, lost = batch.lost, "Buffer full, events dropped");
        }

        for event in &batch.events {
            writeln!(self.out, "{}", render(event, self.format)?)?;
        }
        self.out.flush()?;
        self.stats.record(&batch);
        Ok(())
    }

    /// Close `rx` and print every batch already queued in it
    pub fn drain_pending(&mut self, rx: &mut mpsc::Receiver<Result<CpuBatch>>) -> Result<()> {
        rx.close();
        while let Ok(item) = rx.try_recv() {
            self.handle(item)?;
        }
        Ok(())
    }

    pub fn stats(&self) -> DrainStats {
        self.stats
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_record() {
        let event = SwitchEvent {
            pid: 1234,
            cpu: 7,
            time: 987_654_321,
        };

        let decoded = decode_record(&event.to_le_bytes()).expect("valid record");
        assert_eq!(decoded, event);
    }

    #[test]
    fn test_decode_record_ignores_sample_padding() {
        let event = SwitchEvent {
            pid: 99,
            cpu: 2,
            time: 42,
        };
        let mut sample = event.to_le_bytes().to_vec();
        sample.extend_from_slice(&[0u8; 4]);

        assert_eq!(decode_record(&sample).unwrap(), event);
    }

    #[test]
    fn test_decode_malformed_record() {
        let err = decode_record(&[0u8; 12]).unwrap_err();
        match err {
            SchedwatchError::MalformedRecord { expected, actual } => {
                assert_eq!(expected, 16);
                assert_eq!(actual, 12);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_render_text() {
        let event = SwitchEvent {
            pid: 42,
            cpu: 1,
            time: 5_000,
        };
        assert_eq!(
            render(&event, OutputFormat::Text).unwrap(),
            "PID: 42, CPU: 1, Time: 5000 ns"
        );
    }

    #[test]
    fn test_render_json() {
        let event = SwitchEvent {
            pid: 42,
            cpu: 1,
            time: u64::MAX,
        };
        let line = render(&event, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();

        assert_eq!(value["pid"], 42);
        assert_eq!(value["cpu"], 1);
        assert_eq!(value["time"], u64::MAX);
    }

    #[test]
    fn test_drain_stats_accumulate() {
        let mut stats = DrainStats::default();
        let event = SwitchEvent {
            pid: 1,
            cpu: 0,
            time: 1,
        };

        stats.record(&CpuBatch {
            cpu: 0,
            events: vec![event, event],
            lost: 0,
        });
        stats.record(&CpuBatch {
            cpu: 3,
            events: vec![event],
            lost: 5,
        });

        assert_eq!(
            stats,
            DrainStats {
                received: 3,
                lost: 5,
                batches: 2,
            }
        );
    }

    fn batch(cpu: u32, times: &[u64], lost: usize) -> CpuBatch {
        CpuBatch {
            cpu,
            events: times
                .iter()
                .map(|&time| SwitchEvent { pid: 7, cpu, time })
                .collect(),
            lost,
        }
    }

    #[test]
    fn test_sink_prints_and_counts() {
        let mut sink = EventSink::new(Vec::new(), OutputFormat::Text);

        sink.handle(Ok(batch(2, &[10, 20], 3))).unwrap();

        assert_eq!(
            sink.stats(),
            DrainStats {
                received: 2,
                lost: 3,
                batches: 1,
            }
        );
        let out = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(
            out,
            "PID: 7, CPU: 2, Time: 10 ns\nPID: 7, CPU: 2, Time: 20 ns\n"
        );
    }

    #[test]
    fn test_sink_stops_on_reader_error() {
        let mut sink = EventSink::new(Vec::new(), OutputFormat::Text);

        let err = sink
            .handle(Err(SchedwatchError::PerfBuffer("cpu 3: gone".to_string())))
            .unwrap_err();

        assert!(matches!(err, SchedwatchError::PerfBuffer(_)));
        assert_eq!(sink.stats(), DrainStats::default());
    }

    #[tokio::test]
    async fn test_drain_pending_prints_queued_batches() {
        let (tx, mut rx) = mpsc::channel(8);
        tx.send(Ok(batch(0, &[1], 0))).await.unwrap();
        tx.send(Ok(batch(1, &[2, 3], 0))).await.unwrap();

        let mut sink = EventSink::new(Vec::new(), OutputFormat::Json);
        sink.drain_pending(&mut rx).unwrap();

        assert_eq!(sink.stats().received, 3);
        assert_eq!(sink.stats().batches, 2);
        let out = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(out.lines().count(), 3);

        // Closed: readers still holding a sender can no longer queue batches
        assert!(tx.send(Ok(batch(0, &[4], 0))).await.is_err());
    }

    #[test]
    fn test_serde_error_maps_to_serialization() {
        let err: SchedwatchError = serde_json::from_str::<u32>("x").unwrap_err().into();
        assert!(matches!(err, SchedwatchError::Serialization(_)));
    }
}
