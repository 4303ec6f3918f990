//! 애플리케이션 설정 구조체.
//!
//! 동기화 키/설정 페이지 URL, 저장소 백엔드, 호스트 채널 버퍼 등
//! 런타임 설정을 정의한다. `ConfigManager`를 통해 JSON 파일에서 로드.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// 기본 저장소 키
pub const DEFAULT_STORAGE_KEY: &str = "general_magic_settings";

/// 기본 설정 페이지 URL
pub const DEFAULT_CONFIG_URL: &str =
    "https://midlneedle-stack.github.io/General_Magic_pebble_watchface/config/index.html";

/// 최상위 애플리케이션 설정
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// 설정 동기화
    #[serde(default)]
    pub sync: SyncConfig,
    /// 로컬 저장소
    #[serde(default)]
    pub storage: StorageConfig,
    /// 호스트 이벤트 채널
    #[serde(default)]
    pub host: HostConfig,
}

impl AppConfig {
    /// 기본 설정
    pub fn default_config() -> Self {
        Self::default()
    }

    /// 설정값 검증
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.sync.storage_key.trim().is_empty() {
            return Err(CoreError::Config("storage_key가 비어 있음".to_string()));
        }

        let url = url::Url::parse(&self.sync.config_url).map_err(|e| {
            CoreError::Config(format!(
                "config_url 파싱 실패: {}: {e}",
                self.sync.config_url
            ))
        })?;
        if url.query().is_some() {
            return Err(CoreError::Config(format!(
                "config_url에 쿼리가 포함됨: {}",
                self.sync.config_url
            )));
        }

        if self.storage.db_file.trim().is_empty() {
            return Err(CoreError::Config("db_file이 비어 있음".to_string()));
        }

        if self.host.event_buffer == 0 {
            return Err(CoreError::Config(
                "event_buffer는 0보다 커야 함".to_string(),
            ));
        }

        Ok(())
    }
}

// ============================================================
// 동기화 설정
// ============================================================

/// 설정 동기화: 저장소 키, 설정 페이지, 워치 빌드 변형
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// 설정 레코드 저장 키
    #[serde(default = "default_storage_key")]
    pub storage_key: String,
    /// 설정 페이지 기본 URL (쿼리 없이)
    #[serde(default = "default_config_url")]
    pub config_url: String,
    /// 정시 알림 세기 필드 송수신 여부
    #[serde(default = "default_true")]
    pub track_chime_strength: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            storage_key: default_storage_key(),
            config_url: default_config_url(),
            track_chime_strength: true,
        }
    }
}

fn default_storage_key() -> String {
    DEFAULT_STORAGE_KEY.to_string()
}

fn default_config_url() -> String {
    DEFAULT_CONFIG_URL.to_string()
}

fn default_true() -> bool {
    true
}

// ============================================================
// 저장소 설정
// ============================================================

/// 저장소 백엔드
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// 파일 기반 SQLite
    #[default]
    Sqlite,
    /// 프로세스 수명 동안만 유지
    Memory,
}

/// 로컬 저장소 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// 백엔드 종류
    #[serde(default)]
    pub backend: StorageBackend,
    /// 데이터 디렉토리 내 SQLite 파일 이름
    #[serde(default = "default_db_file")]
    pub db_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Sqlite,
            db_file: default_db_file(),
        }
    }
}

fn default_db_file() -> String {
    "settings.db".to_string()
}

// ============================================================
// 호스트 설정
// ============================================================

/// 호스트 이벤트 채널 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostConfig {
    /// 인바운드 이벤트 채널 용량
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            event_buffer: default_event_buffer(),
        }
    }
}

fn default_event_buffer() -> usize {
    64
}
