//! LAN IP 조회.

use tracing::debug;

/// 기본 라우트 인터페이스의 IPv4 주소 (조회 실패 시 None)
///
/// IPv6는 아직 지원하지 않는다.
pub fn lan_ipv4() -> Option<String> {
    match local_ip_address::local_ip() {
        Ok(ip) => Some(ip.to_string()),
        Err(e) => {
            debug!("LAN IP 조회 실패: {e}");
            None
        }
    }
}
