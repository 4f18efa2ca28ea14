//! LocalLink 핵심 에러 타입.
//!
//! 모든 어댑터 crate는 라이브러리 에러를 `CoreError`로 매핑해 반환한다.

use thiserror::Error;

/// 코어 레이어 에러.
/// 직렬화, 설정, 감지, 저장소, 클립보드 등 도메인 공통 에러를 정의한다.
#[derive(Debug, Error)]
pub enum CoreError {
    /// JSON 직렬화/역직렬화 실패
    #[error("직렬화 에러: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 설정값 오류
    #[error("설정 에러: {0}")]
    Config(String),

    /// 감지 백엔드 연결 실패
    #[error("네트워크 에러: {0}")]
    Network(String),

    /// 영속 저장소 읽기/쓰기 실패
    #[error("저장소 에러: {0}")]
    Storage(String),

    /// 클립보드 쓰기 실패
    #[error("클립보드 에러: {0}")]
    Clipboard(String),

    /// 내부 에러 (예상치 못한 상황)
    #[error("내부 에러: {0}")]
    Internal(String),

    /// I/O 에러
    #[error("I/O 에러: {0}")]
    Io(#[from] std::io::Error),
}
