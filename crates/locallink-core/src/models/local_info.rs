//! 감지 결과 모델.

use serde::{Deserialize, Serialize};

/// 최근 감지 결과: LAN IP와 응답 중인 로컬 포트 목록
///
/// `active_ports`는 백엔드가 돌려준 순서를 그대로 유지하며,
/// 항상 통째로 교체된다 (부분 패치 없음).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalInfo {
    /// LAN IPv4 주소 (첫 감지 성공 전에는 None)
    pub ip: Option<String>,
    /// 응답 중인 포트 목록
    pub active_ports: Vec<u16>,
}

impl LocalInfo {
    /// 포트별 공유 URL 목록 (`http://{ip}:{port}`)
    ///
    /// IP를 모르면 빈 목록.
    pub fn urls(&self) -> Vec<String> {
        match self.ip.as_deref() {
            Some(ip) => self
                .active_ports
                .iter()
                .map(|port| service_url(ip, *port))
                .collect(),
            None => Vec::new(),
        }
    }

    /// 특정 포트의 공유 URL (포트가 활성 목록에 없으면 None)
    pub fn url_for(&self, port: u16) -> Option<String> {
        let ip = self.ip.as_deref()?;
        self.active_ports
            .contains(&port)
            .then(|| service_url(ip, port))
    }
}

/// 공유 URL 생성
pub fn service_url(ip: &str, port: u16) -> String {
    format!("http://{ip}:{port}")
}
