//! 로컬 개발 서버 감지.
//!
//! `LocalInfoSource` 포트 구현. 기본 포트 + 커스텀 포트를 동시에 프로브한다.
//! Node.js 18+는 기본적으로 `::1`에 바인딩하므로 IPv4/IPv6 로컬호스트를 함께 시도.

use async_trait::async_trait;
use locallink_core::config::DetectionConfig;
use locallink_core::error::CoreError;
use locallink_core::models::local_info::LocalInfo;
use locallink_core::ports::detector::LocalInfoSource;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::local_ip::lan_ipv4;

/// TCP 연결 프로브 감지기: `LocalInfoSource` 포트 구현
pub struct TcpProbeDetector {
    common_ports: Vec<u16>,
    probe_timeout: Duration,
    ip_resolver: fn() -> Option<String>,
}

impl TcpProbeDetector {
    /// 새 감지기 생성
    pub fn new(common_ports: Vec<u16>, probe_timeout: Duration) -> Self {
        Self {
            common_ports,
            probe_timeout,
            ip_resolver: lan_ipv4,
        }
    }

    /// 설정에서 감지기 생성
    pub fn from_config(config: &DetectionConfig) -> Self {
        Self::new(
            config.common_ports.clone(),
            Duration::from_millis(config.probe_timeout_ms),
        )
    }

    /// IP 조회 함수 교체
    pub fn with_ip_resolver(mut self, resolver: fn() -> Option<String>) -> Self {
        self.ip_resolver = resolver;
        self
    }

    /// 검사할 포트 목록: 기본 포트 뒤에 중복 없이 추가 포트를 붙인다
    pub fn ports_to_check(&self, extra_ports: &[u16]) -> Vec<u16> {
        let mut ports = Vec::with_capacity(self.common_ports.len() + extra_ports.len());
        for &port in self.common_ports.iter().chain(extra_ports) {
            if !ports.contains(&port) {
                ports.push(port);
            }
        }
        ports
    }
}

/// 포트가 로컬호스트에서 수신 중인지 확인
///
/// IPv4/IPv6 중 하나라도 연결되면 true. 타임아웃 시 false.
pub async fn is_port_listening(port: u16, timeout: Duration) -> bool {
    let v4 = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
    let v6 = SocketAddr::from((Ipv6Addr::LOCALHOST, port));

    tokio::time::timeout(timeout, async {
        let (v4, v6) = tokio::join!(TcpStream::connect(v4), TcpStream::connect(v6));
        v4.is_ok() || v6.is_ok()
    })
    .await
    .unwrap_or(false)
}

#[async_trait]
impl LocalInfoSource for TcpProbeDetector {
    async fn get_local_info(&self, extra_ports: &[u16]) -> Result<LocalInfo, CoreError> {
        let ip = (self.ip_resolver)();
        let ports = self.ports_to_check(extra_ports);
        let timeout = self.probe_timeout;

        let mut set = JoinSet::new();
        for port in ports {
            set.spawn(async move { (port, is_port_listening(port, timeout).await) });
        }

        let mut active_ports = Vec::new();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((port, true)) => active_ports.push(port),
                Ok((_, false)) => {}
                Err(e) => warn!("포트 프로브 태스크 실패: {e}"),
            }
        }
        active_ports.sort_unstable();

        debug!("감지 완료: ip={:?}, 활성 포트={:?}", ip, active_ports);
        Ok(LocalInfo { ip, active_ports })
    }
}
