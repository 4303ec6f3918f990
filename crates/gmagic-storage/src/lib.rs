//! # gmagic-storage
//!
//! 설정 저장소 어댑터.
//! `KeyValueStore` 포트를 SQLite 테이블과 인메모리 맵으로 구현한다.
//!
//! ## 모듈
//! - `sqlite`: 파일 기반 key-value 저장소
//! - `memory`: 프로세스 수명 저장소 (테스트, 임시 실행)
//! - `migration`: 스키마 마이그레이션

pub mod memory;
pub mod migration;
pub mod sqlite;

pub use memory::MemoryKvStore;
pub use sqlite::SqliteKvStore;
