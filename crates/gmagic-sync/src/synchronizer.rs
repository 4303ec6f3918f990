//! 설정 동기화기.
//!
//! 정규 설정 레코드를 단독으로 소유하고, 저장소/워치/설정 웹뷰에서 들어오는
//! 부분 업데이트를 병합한다. 모든 핸들러는 에러를 호출자에게 올리지 않고
//! 로그를 남긴 뒤 이전 상태를 유지한다.

use gmagic_core::config::SyncConfig;
use gmagic_core::models::config_page::{build_config_url, decode_config_response};
use gmagic_core::models::message::{decode_settings, encode_settings, AppMessage};
use gmagic_core::models::settings::SettingsRecord;
use gmagic_core::ports::device::SyncEvent;
use gmagic_core::ports::storage::KeyValueStore;
use gmagic_core::ports::webview::ConfigWebview;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// 동기화 옵션
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    /// 설정 레코드 저장 키
    pub storage_key: String,
    /// 설정 페이지 기본 URL
    pub config_url: String,
    /// 정시 알림 세기 송수신 여부
    pub track_chime_strength: bool,
}

impl From<&SyncConfig> for SyncOptions {
    fn from(config: &SyncConfig) -> Self {
        Self {
            storage_key: config.storage_key.clone(),
            config_url: config.config_url.clone(),
            track_chime_strength: config.track_chime_strength,
        }
    }
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self::from(&SyncConfig::default())
    }
}

/// 설정 동기화기: 정규 레코드 + 저장/전송 부수효과
pub struct SettingsSync {
    store: Arc<dyn KeyValueStore>,
    /// 워치로 나갈 메시지 큐 (DeviceDispatcher가 소비)
    outbox: mpsc::UnboundedSender<AppMessage>,
    webview: Option<Arc<dyn ConfigWebview>>,
    options: SyncOptions,
    settings: SettingsRecord,
}

impl SettingsSync {
    /// 저장소에서 설정을 로드하여 동기화기 생성
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        outbox: mpsc::UnboundedSender<AppMessage>,
        options: SyncOptions,
    ) -> Self {
        let settings = Self::load(store.as_ref(), &options.storage_key);
        info!("설정 로드 완료: {}", settings.to_json());

        Self {
            store,
            outbox,
            webview: None,
            options,
            settings,
        }
    }

    /// 설정 웹뷰 연결
    pub fn with_webview(mut self, webview: Arc<dyn ConfigWebview>) -> Self {
        self.webview = Some(webview);
        self
    }

    /// 저장소에서 레코드 로드
    ///
    /// 값이 없거나 읽기/파싱에 실패하면 기본값을 반환한다.
    pub fn load(store: &dyn KeyValueStore, key: &str) -> SettingsRecord {
        let raw = match store.get_item(key) {
            Ok(Some(raw)) if !raw.is_empty() => raw,
            Ok(_) => {
                debug!("저장된 설정 없음, 기본값 사용: {key}");
                return SettingsRecord::default();
            }
            Err(e) => {
                warn!("설정 읽기 실패, 기본값 사용: {e}");
                return SettingsRecord::default();
            }
        };

        match serde_json::from_str::<SettingsRecord>(&raw) {
            Ok(record) => record,
            Err(e) => {
                warn!("설정 파싱 실패, 기본값 사용: {e}");
                SettingsRecord::default()
            }
        }
    }

    /// 현재 정규 레코드
    pub fn settings(&self) -> &SettingsRecord {
        &self.settings
    }

    /// 전체 레코드를 저장소에 기록. 실패는 로그만 남긴다.
    pub fn persist(&self) {
        match self
            .store
            .set_item(&self.options.storage_key, &self.settings.to_json())
        {
            Ok(()) => debug!("설정 저장 완료"),
            Err(e) => warn!("설정 저장 실패: {e}"),
        }
    }

    /// 워치에 현재 설정 보고 요청
    pub fn request_device_settings(&self) {
        self.enqueue(AppMessage::settings_request(), "설정 요청");
    }

    /// 워치 메시지 반영
    ///
    /// 메시지에 있는 키만 디코딩하여 값이 달라진 필드를 갱신하고,
    /// 하나라도 바뀌었으면 한 번 저장한다. 변경 여부를 반환한다.
    pub fn apply_device_message(&mut self, payload: &AppMessage) -> bool {
        let update = decode_settings(payload, self.options.track_chime_strength);
        let changed = update.apply_to(&mut self.settings);

        if changed {
            info!("워치 설정 반영: {:?}", update);
            self.persist();
        } else {
            debug!("워치 메시지: 변경 없음 (키 {}개)", payload.len());
        }

        changed
    }

    /// 설정 페이지 URL
    pub fn build_config_url(&self) -> String {
        build_config_url(&self.options.config_url, &self.settings)
    }

    /// 설정 페이지 열기
    pub fn open_configuration(&self) {
        let Some(webview) = &self.webview else {
            warn!("설정 웹뷰가 연결되지 않음");
            return;
        };

        let url = self.build_config_url();
        match webview.open(&url) {
            Ok(()) => debug!("설정 페이지 열기: {url}"),
            Err(e) => warn!("설정 페이지 열기 실패: {e}"),
        }
    }

    /// 설정 웹뷰 응답 반영
    ///
    /// 응답의 모든 키로 현재 레코드를 덮어쓴 뒤 정규화하고,
    /// 저장 후 워치로 전송한다. 응답이 없거나 해석할 수 없으면 아무것도 하지 않는다.
    pub fn apply_webview_result(&mut self, response: Option<&str>) -> bool {
        let Some(encoded) = response.filter(|r| !r.is_empty()) else {
            debug!("웹뷰 응답 없음");
            return false;
        };

        let patch = match decode_config_response(encoded) {
            Ok(patch) => patch,
            Err(e) => {
                warn!("설정 페이지 응답 해석 실패: {e}");
                return false;
            }
        };

        self.settings = self.settings.merged(patch);
        info!("설정 페이지 결과 반영: {}", self.settings.to_json());

        self.persist();
        self.push_to_device();
        true
    }

    /// 정규 레코드를 워치로 전송
    pub fn push_to_device(&self) {
        let message = encode_settings(&self.settings, self.options.track_chime_strength);
        self.enqueue(message, "설정");
    }

    /// 인바운드 이벤트 하나 처리. 루프를 계속할지 반환한다.
    pub fn handle(&mut self, event: SyncEvent) -> bool {
        match event {
            SyncEvent::Ready => {
                info!("메시지 채널 준비됨");
                self.request_device_settings();
            }
            SyncEvent::AppMessage { payload } => {
                self.apply_device_message(&payload);
            }
            SyncEvent::ShowConfiguration => self.open_configuration(),
            SyncEvent::WebviewClosed { response } => {
                self.apply_webview_result(response.as_deref());
            }
            SyncEvent::Close => {
                info!("호스트 종료 이벤트 수신");
                return false;
            }
        }
        true
    }

    fn enqueue(&self, message: AppMessage, what: &str) {
        if self.outbox.send(message).is_err() {
            warn!("{what} 전송 실패: 아웃박스 닫힘");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::outbox;
    use gmagic_core::error::CoreError;
    use gmagic_core::models::message::keys;
    use gmagic_core::models::settings::{ChimeStrength, Theme, TimeFormat};
    use gmagic_storage::MemoryKvStore;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tokio::sync::mpsc::error::TryRecvError;

    const KEY: &str = "general_magic_settings";

    /// 호출 기록 + 실패 주입용 Mock 저장소
    #[derive(Default)]
    struct MockStore {
        items: Mutex<HashMap<String, String>>,
        writes: Mutex<Vec<String>>,
        fail_reads: bool,
        fail_writes: bool,
    }

    impl MockStore {
        fn seeded(value: &str) -> Self {
            let store = Self::default();
            store
                .items
                .lock()
                .unwrap()
                .insert(KEY.to_string(), value.to_string());
            store
        }

        fn write_count(&self) -> usize {
            self.writes.lock().unwrap().len()
        }
    }

    impl KeyValueStore for MockStore {
        fn get_item(&self, key: &str) -> Result<Option<String>, CoreError> {
            if self.fail_reads {
                return Err(CoreError::Storage("mock 읽기 실패".to_string()));
            }
            Ok(self.items.lock().unwrap().get(key).cloned())
        }

        fn set_item(&self, key: &str, value: &str) -> Result<(), CoreError> {
            self.writes.lock().unwrap().push(value.to_string());
            if self.fail_writes {
                return Err(CoreError::Storage("mock 쓰기 실패".to_string()));
            }
            self.items
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }
    }

    #[derive(Default)]
    struct MockWebview {
        opened: Mutex<Vec<String>>,
        fail: bool,
    }

    impl ConfigWebview for MockWebview {
        fn open(&self, url: &str) -> Result<(), CoreError> {
            self.opened.lock().unwrap().push(url.to_string());
            if self.fail {
                Err(CoreError::Channel("mock 웹뷰 실패".to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn make_sync(
        store: Arc<MockStore>,
    ) -> (SettingsSync, mpsc::UnboundedReceiver<AppMessage>) {
        let (tx, rx) = outbox();
        (SettingsSync::new(store, tx, SyncOptions::default()), rx)
    }

    #[test]
    fn load_from_empty_storage_returns_defaults() {
        let store = MemoryKvStore::new();
        assert_eq!(SettingsSync::load(&store, KEY), SettingsRecord::default());

        let empty = MemoryKvStore::with_item(KEY, "");
        assert_eq!(SettingsSync::load(&empty, KEY), SettingsRecord::default());
    }

    #[test]
    fn load_partial_record_merges_over_defaults() {
        let store = MemoryKvStore::with_item(
            KEY,
            r#"{"theme":"light","hourlyChimeStrength":"ultra","legacyFlag":true}"#,
        );
        let record = SettingsSync::load(&store, KEY);

        assert_eq!(record.theme, Theme::Light);
        assert_eq!(record.hourly_chime_strength, ChimeStrength::Medium);
        assert_eq!(record.time_format, TimeFormat::TwentyFourHour);
        assert!(record.vibration);
        assert!(!record.hourly_chime);
        assert_eq!(record.extra.get("legacyFlag"), Some(&json!(true)));
    }

    #[test]
    fn load_keeps_valid_strength() {
        let store = MemoryKvStore::with_item(KEY, r#"{"hourlyChimeStrength":"hard"}"#);
        let record = SettingsSync::load(&store, KEY);
        assert_eq!(record.hourly_chime_strength, ChimeStrength::Hard);
    }

    #[test]
    fn load_malformed_or_non_object_falls_back_to_defaults() {
        for raw in ["{not json", "42", "null", r#""text""#] {
            let store = MemoryKvStore::with_item(KEY, raw);
            assert_eq!(SettingsSync::load(&store, KEY), SettingsRecord::default());
        }
    }

    #[test]
    fn load_read_failure_falls_back_to_defaults() {
        let store = MockStore {
            fail_reads: true,
            ..MockStore::default()
        };
        assert_eq!(SettingsSync::load(&store, KEY), SettingsRecord::default());
    }

    #[test]
    fn new_does_not_persist_or_send() {
        let store = Arc::new(MockStore::seeded(r#"{"timeFormat":"12"}"#));
        let (sync, mut rx) = make_sync(store.clone());

        assert_eq!(sync.settings().time_format, TimeFormat::TwelveHour);
        assert_eq!(store.write_count(), 0);
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[test]
    fn empty_device_message_leaves_record_and_skips_persist() {
        let store = Arc::new(MockStore::default());
        let (mut sync, _rx) = make_sync(store.clone());

        assert!(!sync.apply_device_message(&AppMessage::new()));
        assert_eq!(sync.settings(), &SettingsRecord::default());
        assert_eq!(store.write_count(), 0);
    }

    #[test]
    fn time_format_message_changes_only_time_format() {
        let store = Arc::new(MockStore::default());
        let (mut sync, mut rx) = make_sync(store.clone());

        let changed = sync.apply_device_message(&AppMessage::new().with(keys::TIME_FORMAT, 12));

        assert!(changed);
        let expected = SettingsRecord {
            time_format: TimeFormat::TwelveHour,
            ..SettingsRecord::default()
        };
        assert_eq!(sync.settings(), &expected);
        assert_eq!(store.write_count(), 1);
        // 워치에서 온 변경은 워치로 되돌려 보내지 않는다
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[test]
    fn multi_field_message_persists_once() {
        let store = Arc::new(MockStore::default());
        let (mut sync, _rx) = make_sync(store.clone());

        let payload = AppMessage::new()
            .with(keys::THEME, 1)
            .with(keys::VIBRATION, 0)
            .with(keys::HOURLY_CHIME, 1)
            .with(keys::HOURLY_CHIME_STRENGTH, 0)
            .with("Unknown", 99);
        assert!(sync.apply_device_message(&payload));

        let settings = sync.settings();
        assert_eq!(settings.theme, Theme::Light);
        assert!(!settings.vibration);
        assert!(settings.hourly_chime);
        assert_eq!(settings.hourly_chime_strength, ChimeStrength::Light);
        assert_eq!(store.write_count(), 1);

        let stored = store.items.lock().unwrap().get(KEY).cloned().unwrap();
        let reloaded: SettingsRecord = serde_json::from_str(&stored).unwrap();
        assert_eq!(&reloaded, settings);
    }

    #[test]
    fn identical_device_message_does_not_persist() {
        let store = Arc::new(MockStore::default());
        let (mut sync, _rx) = make_sync(store.clone());

        let payload = AppMessage::new()
            .with(keys::TIME_FORMAT, 24)
            .with(keys::THEME, 0)
            .with(keys::ANIMATION, 1);
        assert!(!sync.apply_device_message(&payload));
        assert_eq!(store.write_count(), 0);
    }

    #[test]
    fn out_of_range_strength_index_decodes_medium() {
        let store = Arc::new(MockStore::seeded(r#"{"hourlyChimeStrength":"hard"}"#));
        let (mut sync, _rx) = make_sync(store.clone());

        assert!(sync.apply_device_message(&AppMessage::new().with(keys::HOURLY_CHIME_STRENGTH, 5)));
        assert_eq!(sync.settings().hourly_chime_strength, ChimeStrength::Medium);
    }

    #[test]
    fn strength_ignored_when_not_tracked() {
        let store = Arc::new(MockStore::default());
        let (tx, mut rx) = outbox();
        let options = SyncOptions {
            track_chime_strength: false,
            ..SyncOptions::default()
        };
        let mut sync = SettingsSync::new(store.clone(), tx, options);

        assert!(!sync.apply_device_message(&AppMessage::new().with(keys::HOURLY_CHIME_STRENGTH, 2)));
        assert_eq!(store.write_count(), 0);

        sync.push_to_device();
        let message = rx.try_recv().unwrap();
        assert!(!message.contains_key(keys::HOURLY_CHIME_STRENGTH));
        assert_eq!(message.len(), 6);
    }

    #[test]
    fn webview_result_merges_normalizes_persists_and_pushes() {
        let store = Arc::new(MockStore::default());
        let (mut sync, mut rx) = make_sync(store.clone());

        let response = urlencoding::encode(r#"{"theme":"light","hourlyChimeStrength":"ultra"}"#);
        assert!(sync.apply_webview_result(Some(response.as_ref())));

        assert_eq!(sync.settings().theme, Theme::Light);
        assert_eq!(sync.settings().hourly_chime_strength, ChimeStrength::Medium);
        assert_eq!(store.write_count(), 1);

        let pushed = rx.try_recv().unwrap();
        assert_eq!(pushed.get(keys::THEME), Some(&json!(1)));
        assert_eq!(pushed.get(keys::HOURLY_CHIME_STRENGTH), Some(&json!(1)));
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[test]
    fn webview_result_overwrites_even_unchanged_values() {
        let store = Arc::new(MockStore::default());
        let (mut sync, mut rx) = make_sync(store.clone());

        assert!(sync.apply_webview_result(Some(r#"{"theme":"dark"}"#)));
        assert_eq!(sync.settings(), &SettingsRecord::default());
        assert_eq!(store.write_count(), 1);
        assert!(rx.try_recv().is_ok());
    }

    #[test]
    fn absent_webview_result_is_noop() {
        let store = Arc::new(MockStore::default());
        let (mut sync, mut rx) = make_sync(store.clone());

        assert!(!sync.apply_webview_result(None));
        assert!(!sync.apply_webview_result(Some("")));
        assert_eq!(store.write_count(), 0);
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[test]
    fn undecodable_webview_result_leaves_record_unchanged() {
        let store = Arc::new(MockStore::seeded(r#"{"theme":"light","vibration":false}"#));
        let (mut sync, mut rx) = make_sync(store.clone());
        let before = sync.settings().to_json();

        for response in [
            "%7Bbroken",
            "%FF",
            "%5B1%5D",
            "true",
            "%7B%22theme%22%3A%22dark%22%2C%22n%22%3A%22100%ZZ%22%7D",
        ] {
            assert!(!sync.apply_webview_result(Some(response)));
        }

        assert_eq!(sync.settings().to_json(), before);
        assert_eq!(store.write_count(), 0);
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[test]
    fn persist_failure_keeps_memory_state_and_still_pushes() {
        let store = Arc::new(MockStore {
            fail_writes: true,
            ..MockStore::default()
        });
        let (mut sync, mut rx) = make_sync(store.clone());

        assert!(sync.apply_webview_result(Some(r#"{"hourlyChime":true}"#)));
        assert!(sync.settings().hourly_chime);
        assert_eq!(store.write_count(), 1);
        assert_eq!(rx.try_recv().unwrap().get(keys::HOURLY_CHIME), Some(&json!(1)));
    }

    #[test]
    fn request_device_settings_sends_single_field() {
        let (mut sync, mut rx) = make_sync(Arc::new(MockStore::default()));

        assert!(sync.handle(SyncEvent::Ready));
        assert_eq!(rx.try_recv().unwrap(), AppMessage::settings_request());
    }

    #[test]
    fn closed_outbox_is_logged_not_raised() {
        let (sync, rx) = make_sync(Arc::new(MockStore::default()));
        drop(rx);
        sync.request_device_settings();
        sync.push_to_device();
    }

    #[test]
    fn config_url_uses_configured_base() {
        let store = Arc::new(MockStore::default());
        let (tx, _rx) = outbox();
        let options = SyncOptions {
            config_url: "https://example.com/cfg".to_string(),
            ..SyncOptions::default()
        };
        let sync = SettingsSync::new(store, tx, options);

        let url = sync.build_config_url();
        assert!(url.starts_with("https://example.com/cfg?state="));
        let (_, state) = url.split_once("?state=").unwrap();
        let map = decode_config_response(state).unwrap();
        assert_eq!(SettingsRecord::from(map), SettingsRecord::default());
    }

    #[test]
    fn show_configuration_opens_webview() {
        let webview = Arc::new(MockWebview::default());
        let (sync, _rx) = make_sync(Arc::new(MockStore::default()));
        let mut sync = sync.with_webview(webview.clone());

        assert!(sync.handle(SyncEvent::ShowConfiguration));

        let opened = webview.opened.lock().unwrap();
        assert_eq!(opened.len(), 1);
        assert_eq!(opened[0], sync.build_config_url());
    }

    #[test]
    fn webview_failure_and_missing_webview_are_tolerated() {
        let failing = Arc::new(MockWebview {
            fail: true,
            ..MockWebview::default()
        });
        let (sync, _rx) = make_sync(Arc::new(MockStore::default()));
        sync.open_configuration();

        let sync = sync.with_webview(failing.clone());
        sync.open_configuration();
        assert_eq!(failing.opened.lock().unwrap().len(), 1);
    }

    #[test]
    fn handle_dispatches_and_stops_on_close() {
        let store = Arc::new(MockStore::default());
        let (mut sync, mut rx) = make_sync(store.clone());

        assert!(sync.handle(SyncEvent::AppMessage {
            payload: AppMessage::new().with(keys::ANIMATION, 0),
        }));
        assert!(!sync.settings().animation);

        assert!(sync.handle(SyncEvent::WebviewClosed {
            response: Some(r#"{"animation":true}"#.to_string()),
        }));
        assert!(sync.settings().animation);
        assert_eq!(store.write_count(), 2);
        assert!(rx.try_recv().is_ok());

        assert!(!sync.handle(SyncEvent::Close));
    }
}
