//! 인바운드 이벤트 루프.
//!
//! 이벤트 소스 → 채널 → 동기화기. 핸들러는 한 번에 하나씩, 끝까지 실행된다.

use gmagic_core::error::CoreError;
use gmagic_core::ports::device::{EventSource, SyncEvent};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::synchronizer::SettingsSync;

/// 설정 이벤트 루프: 이벤트 소스 → 동기화기 직렬 처리
pub struct SettingsEventLoop {
    source: Arc<dyn EventSource>,
    sync: SettingsSync,
    buffer: usize,
}

impl SettingsEventLoop {
    pub fn new(source: Arc<dyn EventSource>, sync: SettingsSync, buffer: usize) -> Self {
        Self {
            source,
            sync,
            buffer: buffer.max(1),
        }
    }

    /// 이벤트 수신 시작 (소스가 끝나거나 Close 이벤트까지)
    ///
    /// 종료 시 동기화기를 돌려준다. 동기화기가 소멸하면 아웃박스도 닫힌다.
    pub async fn run(mut self) -> Result<SettingsSync, CoreError> {
        let (tx, mut rx) = mpsc::channel::<SyncEvent>(self.buffer);

        let source = self.source.clone();
        let connection = tokio::spawn(async move {
            if let Err(e) = source.connect(tx).await {
                error!("이벤트 소스 연결 에러: {e}");
            }
        });

        info!("이벤트 수신 대기 시작");

        let mut handled = 0usize;
        while let Some(event) = rx.recv().await {
            debug!("이벤트 수신: {:?}", std::mem::discriminant(&event));
            handled += 1;
            if !self.sync.handle(event) {
                break;
            }
        }

        rx.close();
        connection.abort();
        info!("이벤트 루프 종료: {handled}건 처리");

        Ok(self.sync)
    }
}
