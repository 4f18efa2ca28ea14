//! 애플리케이션 설정 구조체.
//!
//! 폴링/재시도 주기, 감지 대상 포트, 저장소 경로, UI 알림 설정 등
//! 런타임 설정을 정의한다. JSON 파일에서 로드 (`config_manager`).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// 최상위 애플리케이션 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// 폴러 설정
    #[serde(default)]
    pub poller: PollerSettings,
    /// 감지 설정
    #[serde(default)]
    pub detection: DetectionConfig,
    /// 로컬 저장소 설정
    #[serde(default)]
    pub storage: StorageConfig,
    /// UI 설정
    #[serde(default)]
    pub ui: UiConfig,
}

// ============================================================
// 폴러 설정
// ============================================================

/// 폴러 설정: 시작 재시도(exponential backoff)와 정상 상태 폴링 주기
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollerSettings {
    /// 첫 재시도 대기 (밀리초)
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    /// 재시도 대기 상한 (밀리초)
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
    /// 시작 단계 최대 재시도 횟수
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// 정상 상태 폴링 주기 (밀리초)
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for PollerSettings {
    fn default() -> Self {
        Self {
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            max_retries: default_max_retries(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

// ============================================================
// 감지 설정
// ============================================================

/// 감지 설정: 기본 검사 포트와 프로브 타임아웃
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// 항상 검사하는 개발 서버 포트
    ///
    /// 1420(LocalLink 자체 개발 서버), 5000(macOS AirPlay 수신기)은 제외.
    #[serde(default = "default_common_ports")]
    pub common_ports: Vec<u16>,
    /// 포트당 연결 프로브 타임아웃 (밀리초)
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            common_ports: default_common_ports(),
            probe_timeout_ms: default_probe_timeout_ms(),
        }
    }
}

/// 로컬 저장소 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite DB 파일 경로 (None이면 플랫폼 기본 데이터 디렉토리)
    #[serde(default)]
    pub db_path: Option<PathBuf>,
}

/// UI 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// 클립보드 알림 자동 해제 시간 (밀리초)
    #[serde(default = "default_notice_ttl_ms")]
    pub notice_ttl_ms: u64,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            notice_ttl_ms: default_notice_ttl_ms(),
        }
    }
}

impl AppConfig {
    /// 기본 설정 생성
    pub fn default_config() -> Self {
        Self::default()
    }

    /// 정상 상태 폴링 주기를 Duration으로 반환
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poller.poll_interval_ms)
    }

    /// 프로브 타임아웃을 Duration으로 반환
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.detection.probe_timeout_ms)
    }

    /// 알림 자동 해제 시간을 Duration으로 반환
    pub fn notice_ttl(&self) -> Duration {
        Duration::from_millis(self.ui.notice_ttl_ms)
    }
}

// ============================================================
// 기본값 함수
// ============================================================

fn default_initial_backoff_ms() -> u64 {
    100
}

fn default_max_backoff_ms() -> u64 {
    5_000
}

fn default_max_retries() -> u32 {
    30
}

fn default_poll_interval_ms() -> u64 {
    3_000
}

fn default_common_ports() -> Vec<u16> {
    // Vite, React/Node, Angular, Astro, Python, 범용 HTTP, Jupyter 등
    vec![3000, 3001, 4200, 4321, 5173, 8000, 8080, 8888, 9000, 9090]
}

fn default_probe_timeout_ms() -> u64 {
    200
}

fn default_notice_ttl_ms() -> u64 {
    2_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_uses_defaults() {
        let config: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.poller.poll_interval_ms, 3_000);
        assert_eq!(config.detection.common_ports.len(), 10);
        assert!(config.storage.db_path.is_none());
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"poller": {"poll_interval_ms": 1000}}"#).unwrap();
        assert_eq!(config.poll_interval(), Duration::from_millis(1_000));
        assert_eq!(config.poller.max_retries, 30);
        assert_eq!(config.poller.initial_backoff_ms, 100);
    }

    #[test]
    fn common_ports_exclude_reserved() {
        let ports = default_common_ports();
        assert!(!ports.contains(&1420));
        assert!(!ports.contains(&5000));
        assert!(ports.contains(&5173));
    }
}
