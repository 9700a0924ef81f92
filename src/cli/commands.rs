use crate::cli::Commands;
use crate::config::Config;
use crate::ebpf::preflight::run_preflight_checks;
use crate::Result;

pub async fn handle_command(command: Commands) -> Result<()> {
    match command.trace_config() {
        Some(config) => handle_trace(config).await,
        None => handle_check(),
    }
}

fn handle_check() -> Result<()> {
    run_preflight_checks()?;
    println!("System is ready to run the sched_switch probe");
    Ok(())
}

#[cfg(not(target_os = "linux"))]
async fn handle_trace(config: Config) -> Result<()> {
    config.validate()?;
    Err(crate::SchedwatchError::UnsupportedFeature(format!(
        "eBPF tracing requires Linux, running on {}",
        std::env::consts::OS
    )))
}

#[cfg(target_os = "linux")]
async fn handle_trace(config: Config) -> Result<()> {
    use crate::ebpf::events::EventSink;
    use crate::ebpf::loader::ProbeManager;
    use crate::ebpf::reader::spawn_readers;
    use tokio::signal;
    use tokio::sync::mpsc;
    use tracing::{info, warn};

    config.validate()?;
    info!(?config, "Trace requested");

    let mut manager = ProbeManager::new()?;
    manager.attach()?;
    let readers = manager.open_readers(config.page_count)?;

    let (tx, mut rx) = mpsc::channel(readers.len().max(1) * 4);
    let handles = spawn_readers(readers, config.batch_size, tx);

    let deadline = async {
        match config.duration {
            Some(duration) => tokio::time::sleep(duration).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(deadline);

    info!("schedwatch running. Press Ctrl+C to exit.");

    let mut sink = EventSink::new(std::io::stdout(), config.format);

    let outcome = loop {
        tokio::select! {
            _ = signal::ctrl_c() => {
                info!("Shutdown signal received");
                break Ok(());
            }
            _ = &mut deadline => {
                info!("Trace duration elapsed");
                break Ok(());
            }
            item = rx.recv() => {
                let Some(item) = item else {
                    warn!("All CPU readers stopped");
                    break Ok(());
                };
                if let Err(e) = sink.handle(item) {
                    break Err(e);
                }
            }
        }
    };

    for handle in handles {
        handle.abort();
    }
    // Batches already read from the kernel are still printed on shutdown
    let outcome = outcome.and_then(|()| sink.drain_pending(&mut rx));
    manager.unload();

    let stats = sink.stats();
    info!(
        received = stats.received,
        lost = stats.lost,
        batches = stats.batches,
        "schedwatch stopped"
    );
    outcome
}
