//! 디바이스 AppMessage 와이어 코덱.
//!
//! 설정 레코드 ↔ 평탄한 키/원시값 메시지 변환.
//! 인코딩과 디코딩 규칙은 이 모듈에만 존재하며 서로의 역함수다.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::models::settings::{ChimeStrength, SettingsRecord, Theme, TimeFormat};

/// 메시지 키 (대소문자 구분, 워치 앱의 MESSAGE_KEY와 동일)
pub mod keys {
    pub const TIME_FORMAT: &str = "TimeFormat";
    pub const THEME: &str = "Theme";
    pub const VIBRATION: &str = "Vibration";
    pub const ANIMATION: &str = "Animation";
    pub const VIBRATE_ON_OPEN: &str = "VibrateOnOpen";
    pub const HOURLY_CHIME: &str = "HourlyChime";
    pub const HOURLY_CHIME_STRENGTH: &str = "HourlyChimeStrength";
    pub const SETTINGS_REQUEST: &str = "SettingsRequest";
}

/// 디바이스와 주고받는 메시지 (키 → 원시값)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppMessage(BTreeMap<String, Value>);

impl AppMessage {
    pub fn new() -> Self {
        Self::default()
    }

    /// 빌더 스타일 삽입
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// 정수 값 조회 (와이어 정수 규칙 적용)
    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(wire_int)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// 워치에 현재 설정 보고를 요청하는 단일 필드 메시지
    pub fn settings_request() -> Self {
        Self::new().with(keys::SETTINGS_REQUEST, 1)
    }
}

/// 와이어 정수 해석. 소수부 없는 부동소수도 정수로 인정한다.
fn wire_int(value: &Value) -> Option<i64> {
    let Value::Number(number) = value else {
        return None;
    };
    number.as_i64().or_else(|| {
        number
            .as_f64()
            .filter(|f| f.fract() == 0.0 && f.abs() <= i64::MAX as f64)
            .map(|f| f as i64)
    })
}

/// 24 → 24시간, 그 외 모든 값 → 12시간
pub fn decode_time_format(value: &Value) -> TimeFormat {
    if wire_int(value) == Some(24) {
        TimeFormat::TwentyFourHour
    } else {
        TimeFormat::TwelveHour
    }
}

/// 1 → light, 그 외 → dark
pub fn decode_theme(value: &Value) -> Theme {
    if wire_int(value) == Some(1) {
        Theme::Light
    } else {
        Theme::Dark
    }
}

/// 1 → true, 그 외 → false
pub fn decode_flag(value: &Value) -> bool {
    wire_int(value) == Some(1)
}

/// 인덱스 → 세기. 숫자가 아니거나 범위를 벗어나면 medium.
pub fn decode_strength(value: &Value) -> ChimeStrength {
    wire_int(value)
        .map(index_to_strength)
        .unwrap_or_default()
}

pub fn index_to_strength(index: i64) -> ChimeStrength {
    ChimeStrength::from_index(index)
}

/// 세기 이름 → 인덱스. 알 수 없는 이름은 먼저 medium으로 정규화된다.
pub fn strength_to_index(name: &str) -> u8 {
    ChimeStrength::normalize(name).index()
}

/// 레코드 전체를 디바이스 메시지로 인코딩
///
/// `include_strength`가 false면 세기 키를 생략한다 (세기 미지원 워치 빌드).
pub fn encode_settings(record: &SettingsRecord, include_strength: bool) -> AppMessage {
    let flag = |enabled: bool| if enabled { 1 } else { 0 };

    let time_format = match record.time_format {
        TimeFormat::TwentyFourHour => 24,
        TimeFormat::TwelveHour => 12,
    };
    let theme = match record.theme {
        Theme::Light => 1,
        Theme::Dark => 0,
    };

    let message = AppMessage::new()
        .with(keys::TIME_FORMAT, time_format)
        .with(keys::THEME, theme)
        .with(keys::VIBRATION, flag(record.vibration))
        .with(keys::ANIMATION, flag(record.animation))
        .with(keys::VIBRATE_ON_OPEN, flag(record.vibrate_on_open))
        .with(keys::HOURLY_CHIME, flag(record.hourly_chime));

    if include_strength {
        message.with(
            keys::HOURLY_CHIME_STRENGTH,
            record.hourly_chime_strength.index(),
        )
    } else {
        message
    }
}

/// 디바이스 메시지에서 디코딩한 부분 업데이트
///
/// `None` 필드는 메시지에 해당 키가 없었음을 뜻하며 "변경 없음"으로 취급된다.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceSettingsUpdate {
    pub time_format: Option<TimeFormat>,
    pub theme: Option<Theme>,
    pub vibration: Option<bool>,
    pub animation: Option<bool>,
    pub vibrate_on_open: Option<bool>,
    pub hourly_chime: Option<bool>,
    pub hourly_chime_strength: Option<ChimeStrength>,
}

impl DeviceSettingsUpdate {
    /// 값이 달라진 필드만 레코드에 반영하고 변경 여부를 반환한다.
    pub fn apply_to(&self, record: &mut SettingsRecord) -> bool {
        let mut changed = false;
        changed |= assign(&mut record.time_format, self.time_format);
        changed |= assign(&mut record.theme, self.theme);
        changed |= assign(&mut record.vibration, self.vibration);
        changed |= assign(&mut record.animation, self.animation);
        changed |= assign(&mut record.vibrate_on_open, self.vibrate_on_open);
        changed |= assign(&mut record.hourly_chime, self.hourly_chime);
        changed |= assign(
            &mut record.hourly_chime_strength,
            self.hourly_chime_strength,
        );
        changed
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn assign<T: PartialEq>(slot: &mut T, incoming: Option<T>) -> bool {
    match incoming {
        Some(value) if *slot != value => {
            *slot = value;
            true
        }
        _ => false,
    }
}

/// 디바이스 메시지 디코딩. 인식하지 못한 키는 무시한다.
pub fn decode_settings(message: &AppMessage, include_strength: bool) -> DeviceSettingsUpdate {
    DeviceSettingsUpdate {
        time_format: message.get(keys::TIME_FORMAT).map(decode_time_format),
        theme: message.get(keys::THEME).map(decode_theme),
        vibration: message.get(keys::VIBRATION).map(decode_flag),
        animation: message.get(keys::ANIMATION).map(decode_flag),
        vibrate_on_open: message.get(keys::VIBRATE_ON_OPEN).map(decode_flag),
        hourly_chime: message.get(keys::HOURLY_CHIME).map(decode_flag),
        hourly_chime_strength: if include_strength {
            message.get(keys::HOURLY_CHIME_STRENGTH).map(decode_strength)
        } else {
            None
        },
    }
}
