//! # locallink-network
//!
//! 감지 어댑터. `LocalInfoSource` 포트를 구현한다.
//!
//! ## 모듈
//! - `detector`: 로컬호스트 TCP 연결 프로브 기반 개발 서버 감지
//! - `local_ip`: LAN IPv4 주소 조회

pub mod detector;
pub mod local_ip;

pub use detector::TcpProbeDetector;
