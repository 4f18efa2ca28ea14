//! 네트워크 감지 포트.
//!
//! 구현: `locallink-network` crate (TCP 연결 프로브)

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::local_info::LocalInfo;

/// 로컬 개발 서버 감지 인터페이스
///
/// 폴러가 주기적으로 호출한다. 실패는 폴러의 재시도 정책이 처리한다.
#[async_trait]
pub trait LocalInfoSource: Send + Sync {
    /// LAN IP와 응답 중인 포트 조회
    ///
    /// `extra_ports`: 사용자가 추가한 커스텀 포트 (기본 포트에 더해 검사)
    async fn get_local_info(&self, extra_ports: &[u16]) -> Result<LocalInfo, CoreError>;
}
