//! # locallink-storage
//!
//! 로컬 저장소 어댑터.
//! `KeyValueStore` 포트를 SQLite와 인메모리로 구현한다.
//!
//! ## 모듈
//! - `sqlite`: 파일/인메모리 SQLite 키-값 저장소
//! - `memory`: 프로세스 메모리 저장소 (테스트, DB 열기 실패 시 대체)
//! - `migration`: 스키마 마이그레이션

pub mod memory;
pub mod migration;
pub mod sqlite;

pub use memory::MemoryKvStore;
pub use sqlite::SqliteKvStore;
