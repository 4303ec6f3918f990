//! # gmagic-sync
//!
//! 설정 동기화 파이프라인.
//! 저장소, 워치 메시지, 설정 웹뷰 세 곳에서 들어오는 부분 업데이트를
//! 하나의 정규 레코드로 병합하고, 변경 시 저장한 뒤 워치로 다시 전송한다.
//!
//! ## 모듈
//! - `synchronizer`: 정규 레코드 소유자와 이벤트 핸들러
//! - `dispatcher`: 아웃박스 → 디바이스 채널 전송 태스크
//! - `event_loop`: 인바운드 이벤트 직렬 처리 루프

pub mod dispatcher;
pub mod event_loop;
pub mod synchronizer;

pub use dispatcher::{outbox, DeviceDispatcher};
pub use event_loop::SettingsEventLoop;
pub use synchronizer::{SettingsSync, SyncOptions};
