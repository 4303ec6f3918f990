//! 키-값 저장소 포트.
//!
//! 구현: `gmagic-storage` crate (rusqlite, 인메모리)

use crate::error::CoreError;

/// 문자열 키-값 저장소 (localStorage 대응)
pub trait KeyValueStore: Send + Sync {
    /// 값 조회. 키가 없으면 `Ok(None)`.
    fn get_item(&self, key: &str) -> Result<Option<String>, CoreError>;

    /// 값 저장 (덮어쓰기)
    fn set_item(&self, key: &str, value: &str) -> Result<(), CoreError>;
}
