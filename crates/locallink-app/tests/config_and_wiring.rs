//! 설정 및 DI 와이어링 통합 테스트.
//!
//! 설정 파일 → 어댑터 생성 검증.

use locallink_core::config::AppConfig;
use locallink_core::config_manager::{ConfigManager, CONFIG_FILE_NAME};
use locallink_core::ports::detector::LocalInfoSource;
use locallink_core::ports::storage::KeyValueStore;
use locallink_network::TcpProbeDetector;
use locallink_storage::SqliteKvStore;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn config_defaults_are_valid() {
    let config = AppConfig::default_config();

    // 폴러 설정
    assert!(config.poller.initial_backoff_ms > 0);
    assert!(config.poller.max_backoff_ms >= config.poller.initial_backoff_ms);
    assert_eq!(config.poller.max_retries, 30);
    assert_eq!(config.poll_interval(), Duration::from_millis(3_000));

    // 감지 설정
    assert!(!config.detection.common_ports.is_empty());
    assert!(config.probe_timeout() < config.poll_interval());

    // UI 설정
    assert_eq!(config.notice_ttl(), Duration::from_millis(2_000));
}

#[test]
fn first_run_writes_default_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("LocalLink").join(CONFIG_FILE_NAME);

    let manager = ConfigManager::with_path(path.clone()).unwrap();
    assert!(path.exists());

    let raw = std::fs::read_to_string(&path).unwrap();
    let on_disk: AppConfig = serde_json::from_str(&raw).unwrap();
    assert_eq!(
        on_disk.detection.common_ports,
        manager.get().detection.common_ports
    );
}

#[test]
fn partial_file_fills_missing_sections() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    std::fs::write(&path, r#"{"detection": {"common_ports": [4000]}}"#).unwrap();

    let manager = ConfigManager::with_path(path).unwrap();
    let config = manager.get();
    assert_eq!(config.detection.common_ports, vec![4000]);
    assert_eq!(config.detection.probe_timeout_ms, 200);
    assert_eq!(config.poller.poll_interval_ms, 3_000);
}

#[tokio::test]
async fn adapters_wire_from_config() {
    let dir = TempDir::new().unwrap();
    let mut config = AppConfig::default_config();
    config.storage.db_path = Some(dir.path().join("locallink.db"));
    config.detection.common_ports = Vec::new();
    config.detection.probe_timeout_ms = 50;

    let path = config.storage.db_path.clone().unwrap();
    let storage: Arc<dyn KeyValueStore> = Arc::new(SqliteKvStore::open(&path).unwrap());
    storage.save("probe", "ok").await.unwrap();
    assert_eq!(storage.load("probe").await.unwrap().as_deref(), Some("ok"));

    let detector: Arc<dyn LocalInfoSource> = Arc::new(
        TcpProbeDetector::from_config(&config.detection).with_ip_resolver(|| None),
    );
    let info = detector.get_local_info(&[]).await.unwrap();
    assert!(info.ip.is_none());
    assert!(info.active_ports.is_empty());
}
