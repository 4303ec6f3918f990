//! 설정 웹뷰 포트.
//!
//! 구현: `gmagic-app` crate (stdio 호스트가 URL 열기 명령을 전달)

use crate::error::CoreError;

/// 외부 설정 페이지를 여는 웹뷰
pub trait ConfigWebview: Send + Sync {
    /// URL 열기
    fn open(&self, url: &str) -> Result<(), CoreError>;
}
