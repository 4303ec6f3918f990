//! stdio JSON-lines 호스트 어댑터.
//!
//! 표준 입력의 한 줄 = `SyncEvent` 하나, 표준 출력의 한 줄 = `HostCommand` 하나.
//! 워치 메시지 채널과 설정 웹뷰는 호스트 프로세스가 중계한다.

use async_trait::async_trait;
use gmagic_core::error::CoreError;
use gmagic_core::models::message::AppMessage;
use gmagic_core::ports::device::{DeviceChannel, EventSource, SyncEvent};
use gmagic_core::ports::webview::ConfigWebview;
use parking_lot::Mutex;
use serde::Serialize;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// 호스트로 나가는 명령
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum HostCommand<'a> {
    /// 워치로 메시지 전송
    AppMessage { payload: &'a AppMessage },
    /// 설정 페이지 열기
    OpenUrl { url: &'a str },
}

type LineReader = Box<dyn AsyncBufRead + Send + Unpin>;
type LineWriter = Box<dyn Write + Send>;

/// stdio 호스트: `EventSource` + `DeviceChannel` + `ConfigWebview` 구현
pub struct StdioHost {
    /// 한 번만 연결 가능 (connect 시 꺼내감)
    reader: Mutex<Option<LineReader>>,
    writer: Mutex<LineWriter>,
}

impl StdioHost {
    pub fn new(
        reader: impl AsyncBufRead + Send + Unpin + 'static,
        writer: impl Write + Send + 'static,
    ) -> Self {
        Self {
            reader: Mutex::new(Some(Box::new(reader))),
            writer: Mutex::new(Box::new(writer)),
        }
    }

    /// 프로세스 표준 입출력에 연결된 호스트
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), std::io::stdout())
    }

    fn write_command(&self, command: &HostCommand<'_>) -> Result<(), CoreError> {
        let line = serde_json::to_string(command)?;
        let mut writer = self.writer.lock();
        writeln!(writer, "{line}")?;
        writer.flush()?;
        Ok(())
    }
}

#[async_trait]
impl EventSource for StdioHost {
    async fn connect(&self, tx: mpsc::Sender<SyncEvent>) -> Result<(), CoreError> {
        let reader = self
            .reader
            .lock()
            .take()
            .ok_or_else(|| CoreError::Channel("호스트 입력이 이미 연결됨".to_string()))?;

        info!("호스트 입력 연결");
        let mut lines = reader.split(b'\n');
        while let Some(raw) = lines.next_segment().await? {
            let Ok(line) = String::from_utf8(raw) else {
                warn!("호스트 입력이 UTF-8이 아님, 줄 건너뜀");
                continue;
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            match serde_json::from_str::<SyncEvent>(line) {
                Ok(event) => {
                    if tx.send(event).await.is_err() {
                        debug!("이벤트 채널 닫힘, 입력 중단");
                        break;
                    }
                }
                Err(e) => warn!("호스트 이벤트 파싱 실패: {e}"),
            }
        }

        info!("호스트 입력 종료");
        Ok(())
    }
}

#[async_trait]
impl DeviceChannel for StdioHost {
    async fn send(&self, message: &AppMessage) -> Result<(), CoreError> {
        self.write_command(&HostCommand::AppMessage { payload: message })
    }
}

impl ConfigWebview for StdioHost {
    fn open(&self, url: &str) -> Result<(), CoreError> {
        self.write_command(&HostCommand::OpenUrl { url })
    }
}
