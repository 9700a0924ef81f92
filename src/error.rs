use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchedwatchError {
    #[error("eBPF error: {0}")]
    EbpfError(String),

    #[error("Failed to load eBPF program: {0}")]
    ProgramLoadFailed(String),

    #[error("Program {0} not found in eBPF object")]
    ProgramNotFound(String),

    #[error("Failed to attach eBPF program: {0}")]
    AttachFailed(String),

    #[error("Map {name} not found in eBPF object. Available maps: {available:?}")]
    MapNotFound {
        name: String,
        available: Vec<String>,
    },

    #[error("Perf buffer error: {0}")]
    PerfBuffer(String),

    #[error("Malformed event: expected {expected} bytes, got {actual} bytes")]
    MalformedRecord { expected: usize, actual: usize },

    #[error("Failed to serialize event: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Kernel version {version} is too old. Minimum required: {min_version}")]
    KernelVersionTooOld {
        version: String,
        min_version: String,
    },

    #[error("Could not parse kernel version: {0}")]
    KernelVersionUnparsable(String),

    #[error("Unsupported feature on this system: {0}")]
    UnsupportedFeature(String),
}

pub type Result<T> = std::result::Result<T, SchedwatchError>;
