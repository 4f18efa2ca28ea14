//! 영속 키-값 저장소 포트.
//!
//! 구현: `locallink-storage` crate (rusqlite, 인메모리)
//!
//! 저장소는 신뢰할 수 없는 것으로 취급한다. 호출자는 실패를 빈 상태로 강등한다.

use async_trait::async_trait;

use crate::error::CoreError;

/// 문자열 키-값 저장소
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// 키에 저장된 값 조회 (없으면 None)
    async fn load(&self, key: &str) -> Result<Option<String>, CoreError>;

    /// 키에 값 저장 (기존 값 덮어쓰기)
    async fn save(&self, key: &str, value: &str) -> Result<(), CoreError>;
}
