//! 커스텀 포트 저장소.
//!
//! 사용자가 추가한 포트 목록을 소유하고 `KeyValueStore`에 JSON 배열로 영속화한다.
//! 변경될 때마다 watch 채널로 새 목록을 발행한다 (폴러가 구독).
//!
//! 불변 조건: 모든 원소는 1–65535, 중복 없음, 추가 순서 유지.

use locallink_core::error::CoreError;
use locallink_core::ports::storage::KeyValueStore;
use locallink_core::validation::{check_port, parse_port, ValidationError};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// 저장소 키
pub const CUSTOM_PORTS_KEY: &str = "locallink.custom_ports";

/// 커스텀 포트 저장소
pub struct CustomPortStore {
    ports: Vec<u16>,
    storage: Arc<dyn KeyValueStore>,
    tx: watch::Sender<Vec<u16>>,
}

impl CustomPortStore {
    /// 저장소에서 목록 로드
    ///
    /// 값이 없거나 읽기 실패, 파싱 실패, 불변 조건 위반이면 빈 목록으로 시작한다.
    pub async fn load(storage: Arc<dyn KeyValueStore>) -> Self {
        let ports = match storage.load(CUSTOM_PORTS_KEY).await {
            Ok(Some(raw)) => decode(&raw).unwrap_or_else(|e| {
                warn!("저장된 커스텀 포트 무시: {e}");
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("커스텀 포트 로드 실패: {e}");
                Vec::new()
            }
        };

        info!("커스텀 포트 {}개 로드", ports.len());
        let (tx, _) = watch::channel(ports.clone());
        Self { ports, storage, tx }
    }

    /// 현재 목록 (추가 순서)
    pub fn ports(&self) -> &[u16] {
        &self.ports
    }

    /// 목록 변경 수신기 생성
    pub fn subscribe(&self) -> watch::Receiver<Vec<u16>> {
        self.tx.subscribe()
    }

    /// 입력 문자열을 검증해 추가
    pub async fn add(&mut self, raw: &str) -> Result<u16, ValidationError> {
        let port = parse_port(raw, &self.ports)?;
        self.push(port).await;
        Ok(port)
    }

    /// 포트 제거 (없으면 false, 저장하지 않음)
    pub async fn remove(&mut self, port: u16) -> bool {
        let Some(index) = self.ports.iter().position(|&p| p == port) else {
            return false;
        };
        self.ports.remove(index);
        debug!("커스텀 포트 제거: {port}");
        self.commit().await;
        true
    }

    async fn push(&mut self, port: u16) {
        self.ports.push(port);
        debug!("커스텀 포트 추가: {port}");
        self.commit().await;
    }

    /// 저장 후 발행. 저장 실패는 경고만 남긴다.
    async fn commit(&self) {
        match encode(&self.ports) {
            Ok(raw) => {
                if let Err(e) = self.storage.save(CUSTOM_PORTS_KEY, &raw).await {
                    warn!("커스텀 포트 저장 실패: {e}");
                }
            }
            Err(e) => warn!("커스텀 포트 직렬화 실패: {e}"),
        }
        self.tx.send_replace(self.ports.clone());
    }
}

fn encode(ports: &[u16]) -> Result<String, CoreError> {
    Ok(serde_json::to_string(ports)?)
}

/// 저장된 JSON 배열 해석. 원소 하나라도 규칙을 어기면 전체를 버린다.
fn decode(raw: &str) -> Result<Vec<u16>, CoreError> {
    let values: Vec<u16> = serde_json::from_str(raw)?;
    let mut ports = Vec::with_capacity(values.len());
    for value in values {
        let port = check_port(value, &ports)
            .map_err(|e| CoreError::Internal(format!("포트 {value}: {e}")))?;
        ports.push(port);
    }
    Ok(ports)
}
