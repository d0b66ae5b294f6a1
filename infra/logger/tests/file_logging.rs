use std::fs;
use std::time::Duration;
use tempfile::tempdir;
use wf_logger::{LevelFilter, Logger, Rotation};

#[test]
fn file_logging_creates_log_file() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_dir = tempdir()?;
    let log_dir = tmp_dir.path().join("logs");

    let logger = Logger::builder()
        .name("integration-file-logging")
        .console(false)
        .directory(&log_dir)
        .rotation(Rotation::NEVER)
        .level(LevelFilter::INFO)
        .init()?;
    assert!(logger.guard().is_some());

    tracing::info!("hello from integration test");
    tracing::debug!("filtered out by level");

    std::thread::sleep(Duration::from_millis(30));
    drop(logger);

    let log_file = fs::read_dir(&log_dir)?
        .flatten()
        .map(|entry| entry.path())
        .find(|path| path.extension().and_then(|ext| ext.to_str()) == Some("log"))
        .expect("log file should be created");

    let content = fs::read_to_string(&log_file)?;
    assert!(content.contains("hello from integration test"));
    assert!(!content.contains("filtered out by level"));

    Ok(())
}
