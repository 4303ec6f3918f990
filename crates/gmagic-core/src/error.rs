//! 핵심 에러 타입.
//!
//! 모든 어댑터 crate는 네이티브 에러를 `CoreError`로 매핑해서 반환한다.

use thiserror::Error;

/// 코어 레이어 에러.
/// 직렬화, 설정, 저장소, 메시지 채널 등 도메인 공통 에러를 정의한다.
#[derive(Debug, Error)]
pub enum CoreError {
    /// JSON 직렬화/역직렬화 실패
    #[error("직렬화 에러: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 설정값 오류
    #[error("설정 에러: {0}")]
    Config(String),

    /// 키-값 저장소 읽기/쓰기 실패
    #[error("저장소 에러: {0}")]
    Storage(String),

    /// 디바이스 메시지 채널 에러 (전송 실패, 채널 닫힘)
    #[error("채널 에러: {0}")]
    Channel(String),

    /// 외부 입력 디코딩 실패 (URL 인코딩, 형식 불일치)
    #[error("디코딩 에러: {0}")]
    Decode(String),

    /// I/O 에러
    #[error("I/O 에러: {0}")]
    Io(#[from] std::io::Error),
}
