//! 디바이스 디스패처.
//!
//! 동기화기가 아웃박스에 넣은 메시지를 순서대로 꺼내 디바이스 채널로 전송한다.
//! 전송 결과는 로그로만 남기며 재시도하지 않는다.

use gmagic_core::models::message::AppMessage;
use gmagic_core::ports::device::DeviceChannel;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// 동기화기 ↔ 디스패처 사이의 아웃박스 채널 생성
pub fn outbox() -> (
    mpsc::UnboundedSender<AppMessage>,
    mpsc::UnboundedReceiver<AppMessage>,
) {
    mpsc::unbounded_channel()
}

/// 디스패치 통계
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// 전송 성공
    pub sent: usize,
    /// 전송 실패 (로그 후 폐기)
    pub failed: usize,
}

/// 아웃박스 → 디바이스 채널 전송기
pub struct DeviceDispatcher {
    channel: Arc<dyn DeviceChannel>,
    rx: mpsc::UnboundedReceiver<AppMessage>,
}

impl DeviceDispatcher {
    pub fn new(channel: Arc<dyn DeviceChannel>, rx: mpsc::UnboundedReceiver<AppMessage>) -> Self {
        Self { channel, rx }
    }

    /// 아웃박스가 닫힐 때까지 전송
    pub async fn run(mut self) -> DispatchStats {
        let mut stats = DispatchStats::default();

        while let Some(message) = self.rx.recv().await {
            match self.channel.send(&message).await {
                Ok(()) => {
                    stats.sent += 1;
                    debug!("워치 전송 완료: 키 {}개", message.len());
                }
                Err(e) => {
                    stats.failed += 1;
                    warn!("워치 전송 실패: {e}");
                }
            }
        }

        info!(
            "디스패처 종료: 성공 {}건, 실패 {}건",
            stats.sent, stats.failed
        );
        stats
    }

    /// 백그라운드 태스크로 실행
    pub fn spawn(self) -> JoinHandle<DispatchStats> {
        tokio::spawn(self.run())
    }
}
