//! Per-CPU readers draining the `events` perf array

use crate::ebpf::events::{decode_record, CpuBatch};
use crate::{Result, SchedwatchError};
use aya::maps::{perf::AsyncPerfEventArrayBuffer, MapData};
use bytes::BytesMut;
use schedwatch_common::SwitchEvent;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Reader for a single CPU's perf buffer
pub struct CpuReader {
    cpu: u32,
    buf: AsyncPerfEventArrayBuffer<MapData>,
}

impl CpuReader {
    pub(crate) fn new(cpu: u32, buf: AsyncPerfEventArrayBuffer<MapData>) -> Self {
        Self { cpu, buf }
    }

    pub fn cpu(&self) -> u32 {
        self.cpu
    }

    /// Wait until the buffer has data, then drain up to `buffers.len()` records.
    ///
    /// Records that fail to decode are skipped with a warning.
    pub async fn read_batch(&mut self, buffers: &mut [BytesMut]) -> Result<CpuBatch> {
        let events = self
            .buf
            .read_events(buffers)
            .await
            .map_err(|e| SchedwatchError::PerfBuffer(format!("cpu {}: {}", self.cpu, e)))?;

        let mut batch = CpuBatch {
            cpu: self.cpu,
            events: Vec::with_capacity(events.read),
            lost: events.lost,
        };

        for raw in buffers.iter().take(events.read) {
            match decode_record(raw) {
                Ok(event) => batch.events.push(event),
                Err(e) => warn!(cpu = self.cpu, "{} - skipping", e),
            }
        }

        Ok(batch)
    }
}

/// Allocate the scratch buffers handed to [`CpuReader::read_batch`]
pub fn batch_buffers(batch_size: usize) -> Vec<BytesMut> {
    (0..batch_size)
        .map(|_| BytesMut::with_capacity(SwitchEvent::SIZE + 8))
        .collect()
}

/// Spawn one task per CPU forwarding batches into `tx`.
///
/// A task exits when the receiver is closed or after forwarding the error
/// its buffer failed with.
pub fn spawn_readers(
    readers: Vec<CpuReader>,
    batch_size: usize,
    tx: mpsc::Sender<Result<CpuBatch>>,
) -> Vec<JoinHandle<()>> {
    readers
        .into_iter()
        .map(|mut reader| {
            let tx = tx.clone();
            tokio::spawn(async move {
                let mut buffers = batch_buffers(batch_size);
                loop {
                    let item = reader.read_batch(&mut buffers).await;
                    let failed = item.is_err();

                    if tx.send(item).await.is_err() {
                        debug!(cpu = reader.cpu(), "Receiver closed, stopping reader");
                        break;
                    }
                    if failed {
                        warn!(cpu = reader.cpu(), "Reader failed, stopping");
                        break;
                    }
                }
            })
        })
        .collect()
}
