//! 디바이스 메시지 채널 포트.
//!
//! 구현: `gmagic-app` crate (stdio JSON-lines 호스트)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::CoreError;
use crate::models::message::AppMessage;

/// 호스트에서 들어오는 인바운드 이벤트
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SyncEvent {
    /// 메시지 채널 수립 (한 번)
    Ready,
    /// 워치에서 수신한 메시지
    AppMessage {
        #[serde(default)]
        payload: AppMessage,
    },
    /// 사용자가 설정 화면 열기를 요청
    ShowConfiguration,
    /// 설정 웹뷰 닫힘 (편집된 설정 응답)
    WebviewClosed {
        #[serde(default)]
        response: Option<String>,
    },
    /// 호스트 종료
    Close,
}

/// 워치로 메시지를 보내는 채널
#[async_trait]
pub trait DeviceChannel: Send + Sync {
    /// 메시지 전송. 실패는 호출자가 로그로 처리한다.
    async fn send(&self, message: &AppMessage) -> Result<(), CoreError>;
}

/// 인바운드 이벤트 소스
#[async_trait]
pub trait EventSource: Send + Sync {
    /// 이벤트 수신 시작
    ///
    /// 수신된 이벤트를 `tx` 채널로 전송한다.
    /// 소스가 끝나면 반환하고 `tx`는 닫힌다.
    async fn connect(&self, tx: mpsc::Sender<SyncEvent>) -> Result<(), CoreError>;
}
