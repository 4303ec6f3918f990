//! 인메모리 key-value 저장소.

use gmagic_core::error::CoreError;
use gmagic_core::ports::storage::KeyValueStore;
use parking_lot::Mutex;
use std::collections::HashMap;

/// 프로세스 수명 동안만 유지되는 저장소
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 초기 항목을 가진 저장소
    pub fn with_item(key: &str, value: &str) -> Self {
        let store = Self::new();
        store.items.lock().insert(key.to_string(), value.to_string());
        store
    }
}

impl KeyValueStore for MemoryKvStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, CoreError> {
        Ok(self.items.lock().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), CoreError> {
        self.items.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}
