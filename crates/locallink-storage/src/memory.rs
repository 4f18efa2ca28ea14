//! 인메모리 키-값 저장소.
//!
//! 프로세스 종료 시 내용이 사라진다. 테스트와 DB 열기 실패 시 대체 저장소로 사용.

use async_trait::async_trait;
use locallink_core::error::CoreError;
use locallink_core::ports::storage::KeyValueStore;
use parking_lot::Mutex;
use std::collections::HashMap;

/// 인메모리 저장소: `KeyValueStore` 포트 구현
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryKvStore {
    /// 빈 저장소 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 초기 값을 가진 저장소 생성
    pub fn with_entry(key: &str, value: &str) -> Self {
        let store = Self::new();
        store
            .entries
            .lock()
            .insert(key.to_string(), value.to_string());
        store
    }

    /// 저장된 값 직접 조회 (테스트 검증용)
    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKvStore {
    async fn load(&self, key: &str) -> Result<Option<String>, CoreError> {
        Ok(self.get(key))
    }

    async fn save(&self, key: &str, value: &str) -> Result<(), CoreError> {
        self.entries
            .lock()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
