//! 어댑터 생성 (DI 와이어링).

use anyhow::{Context, Result};
use gmagic_core::config::{StorageBackend, StorageConfig};
use gmagic_core::config_manager::ConfigManager;
use gmagic_core::ports::storage::KeyValueStore;
use gmagic_storage::{MemoryKvStore, SqliteKvStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// 저장소 어댑터 생성
///
/// SQLite 파일 위치: `--data-dir` 인자 또는 플랫폼별 데이터 디렉토리.
pub fn open_store(
    config: &StorageConfig,
    data_dir: Option<&Path>,
) -> Result<Arc<dyn KeyValueStore>> {
    match config.backend {
        StorageBackend::Memory => {
            info!("인메모리 저장소 사용 (종료 시 설정 소멸)");
            Ok(Arc::new(MemoryKvStore::new()))
        }
        StorageBackend::Sqlite => {
            let path = resolve_db_path(config, data_dir)?;
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("데이터 디렉토리 생성 실패: {}", parent.display()))?;
            }
            let store = SqliteKvStore::open(&path)
                .with_context(|| format!("SQLite 저장소 열기 실패: {}", path.display()))?;
            Ok(Arc::new(store))
        }
    }
}

/// SQLite 파일 경로 결정
fn resolve_db_path(config: &StorageConfig, data_dir: Option<&Path>) -> Result<PathBuf> {
    let dir = match data_dir {
        Some(dir) => dir.to_path_buf(),
        None => ConfigManager::data_dir()?,
    };
    Ok(dir.join(&config.db_file))
}
