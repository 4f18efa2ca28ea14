//! SQLite 키-값 저장소 어댑터.
//!
//! `KeyValueStore` 포트 구현.

use async_trait::async_trait;
use locallink_core::error::CoreError;
use locallink_core::ports::storage::KeyValueStore;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use tracing::{debug, info};

use crate::migration;

/// SQLite 저장소: `KeyValueStore` 포트 구현
pub struct SqliteKvStore {
    conn: Mutex<Connection>,
}

impl SqliteKvStore {
    /// 파일 기반 SQLite 저장소 생성
    pub fn open(path: &Path) -> Result<Self, CoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)
            .map_err(|e| CoreError::Storage(format!("SQLite 열기 실패: {e}")))?;

        conn.execute_batch(
            "
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            ",
        )
        .map_err(|e| CoreError::Storage(format!("PRAGMA 설정 실패: {e}")))?;

        migration::run_migrations(&conn)
            .map_err(|e| CoreError::Storage(format!("마이그레이션 실패: {e}")))?;

        info!("SQLite 저장소 초기화: {}", path.display());

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// 인메모리 SQLite 저장소 생성 (테스트용)
    pub fn open_in_memory() -> Result<Self, CoreError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| CoreError::Storage(format!("인메모리 SQLite 생성 실패: {e}")))?;

        migration::run_migrations(&conn)
            .map_err(|e| CoreError::Storage(format!("마이그레이션 실패: {e}")))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

#[async_trait]
impl KeyValueStore for SqliteKvStore {
    async fn load(&self, key: &str) -> Result<Option<String>, CoreError> {
        let conn = self.conn.lock();
        let value = conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()
            .map_err(|e| CoreError::Storage(format!("키 조회 실패: {e}")))?;

        debug!("키 조회: {key} (존재={})", value.is_some());
        Ok(value)
    }

    async fn save(&self, key: &str, value: &str) -> Result<(), CoreError> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value],
        )
        .map_err(|e| CoreError::Storage(format!("키 저장 실패: {e}")))?;

        debug!("키 저장: {key} ({} bytes)", value.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn missing_key_is_none() {
        let store = SqliteKvStore::open_in_memory().unwrap();
        assert_eq!(store.load("nothing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn save_then_load() {
        let store = SqliteKvStore::open_in_memory().unwrap();
        store.save("ports", "[3000,5173]").await.unwrap();
        assert_eq!(
            store.load("ports").await.unwrap().as_deref(),
            Some("[3000,5173]")
        );
    }

    #[tokio::test]
    async fn save_overwrites_existing_value() {
        let store = SqliteKvStore::open_in_memory().unwrap();
        store.save("ports", "[3000]").await.unwrap();
        store.save("ports", "[8080]").await.unwrap();
        assert_eq!(store.load("ports").await.unwrap().as_deref(), Some("[8080]"));
    }

    #[tokio::test]
    async fn values_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("data").join("locallink.db");

        {
            let store = SqliteKvStore::open(&db_path).unwrap();
            store.save("ports", "[4321]").await.unwrap();
        }

        let reopened = SqliteKvStore::open(&db_path).unwrap();
        assert_eq!(reopened.load("ports").await.unwrap().as_deref(), Some("[4321]"));
    }
}
