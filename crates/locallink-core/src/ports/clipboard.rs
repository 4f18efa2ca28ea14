//! 클립보드 포트.
//!
//! 구현: `locallink-app` crate (플랫폼 클립보드 유틸리티)

use async_trait::async_trait;

use crate::error::CoreError;

/// 클립보드 쓰기 인터페이스
#[async_trait]
pub trait ClipboardWriter: Send + Sync {
    /// 텍스트를 클립보드에 복사
    async fn write_text(&self, text: &str) -> Result<(), CoreError>;
}
