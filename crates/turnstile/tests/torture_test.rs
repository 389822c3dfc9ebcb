//! Integration test for the torture harness.

use std::io::Write;

use turnstile::{torture, TortureConfig, TortureError};

fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_test_writer()
        .try_init();
}

fn temp_config_path() -> std::path::PathBuf {
    let id = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("test_torture_{id}.toml"))
}

#[test]
fn test_torture_from_config_file() {
    init_test_logging();
    let path = temp_config_path();
    {
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "threads = 6").unwrap();
        writeln!(file, "write_percent = 25").unwrap();
        writeln!(file, "operations_per_thread = 300").unwrap();
        writeln!(file, "hold_micros = 1").unwrap();
    }

    let config = TortureConfig::load(&path).unwrap();
    std::fs::remove_file(&path).ok();

    let report = torture::run(&config).unwrap();

    println!("\n=== Torture Run ===");
    println!("Reads:       {}", report.reads);
    println!("Writes:      {}", report.writes);
    println!("Max readers: {}", report.max_concurrent_readers);
    println!("Elapsed:     {:?}", report.elapsed);

    assert_eq!(report.reads + report.writes, config.total_operations());
    assert_eq!(report.workers.len(), 6);
    for (i, worker) in report.workers.iter().enumerate() {
        assert_eq!(worker.worker, i);
        assert_eq!(worker.reads + worker.writes, 300);
    }
}

#[test]
fn test_readers_overlap_under_read_heavy_load() {
    init_test_logging();
    let config = TortureConfig {
        threads: 8,
        write_percent: 0,
        operations_per_thread: 200,
        hold_micros: 200,
        seed: 3,
    };

    let report = torture::run(&config).unwrap();
    // With sleeping readers and no writers, at least two must share the lock.
    assert!(
        report.max_concurrent_readers >= 2,
        "readers never overlapped: max {}",
        report.max_concurrent_readers
    );
}

#[test]
fn test_invalid_file_reports_parse_error() {
    init_test_logging();
    let path = temp_config_path();
    std::fs::write(&path, "threads = \"many\"\n").unwrap();

    let result = TortureConfig::load(&path);
    std::fs::remove_file(&path).ok();

    assert!(matches!(result, Err(TortureError::ConfigParse(_))));
}
