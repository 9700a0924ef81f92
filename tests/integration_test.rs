use schedwatch::config::Config;
use schedwatch::ebpf::events::{decode_record, render};
use schedwatch::error::SchedwatchError;
use schedwatch::SwitchEvent;

#[test]
fn test_error_types() {
    let err = SchedwatchError::MapNotFound {
        name: "events".to_string(),
        available: vec!["other".to_string()],
    };

    assert!(err.to_string().contains("events"));
    assert!(err.to_string().contains("other"));

    let err = SchedwatchError::KernelVersionTooOld {
        version: "4.4.0".to_string(),
        min_version: "4.7".to_string(),
    };
    assert!(err.to_string().contains("4.4.0"));
}

#[test]
fn test_version_const() {
    assert!(!schedwatch::VERSION.is_empty());
}

#[test]
fn test_record_is_sixteen_bytes() {
    assert_eq!(std::mem::size_of::<SwitchEvent>(), 16);
    assert_eq!(SwitchEvent::SIZE, 16);
}

#[test]
fn test_decode_then_render_matches_collector_format() {
    let mut raw = Vec::new();
    raw.extend_from_slice(&1337u32.to_le_bytes());
    raw.extend_from_slice(&3u32.to_le_bytes());
    raw.extend_from_slice(&123_456_789u64.to_le_bytes());

    let event = decode_record(&raw).unwrap();
    assert_eq!(
        render(&event, Default::default()).unwrap(),
        "PID: 1337, CPU: 3, Time: 123456789 ns"
    );
}

#[test]
fn test_invalid_config_is_config_error() {
    let config = Config {
        page_count: 3,
        ..Config::default()
    };
    assert!(matches!(
        config.validate(),
        Err(SchedwatchError::ConfigError(_))
    ));
}
