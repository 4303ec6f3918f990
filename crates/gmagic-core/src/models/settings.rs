//! 설정 레코드 모델.
//!
//! 워치페이스 사용자 설정의 정규(canonical) 표현.
//! 외부 입력(저장소, 설정 페이지)은 항상 `From<Map>`을 거쳐 정규화되므로
//! 레코드의 모든 필드는 언제나 유효한 값을 가진다.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// JSON 필드 이름 (저장소/설정 페이지 공통)
pub mod fields {
    pub const TIME_FORMAT: &str = "timeFormat";
    pub const THEME: &str = "theme";
    pub const VIBRATION: &str = "vibration";
    pub const ANIMATION: &str = "animation";
    pub const VIBRATE_ON_OPEN: &str = "vibrateOnOpen";
    pub const HOURLY_CHIME: &str = "hourlyChime";
    pub const HOURLY_CHIME_STRENGTH: &str = "hourlyChimeStrength";
}

/// 시간 표시 형식
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeFormat {
    #[serde(rename = "12")]
    TwelveHour,
    #[default]
    #[serde(rename = "24")]
    TwentyFourHour,
}

impl TimeFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TwelveHour => "12",
            Self::TwentyFourHour => "24",
        }
    }

    /// 외부 값 파싱. "12"/"24" 문자열 또는 12/24 숫자만 인정하고 나머지는 기본값.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::String(s) if s == "12" => Self::TwelveHour,
            Value::String(s) if s == "24" => Self::TwentyFourHour,
            Value::Number(n) if n.as_i64() == Some(12) => Self::TwelveHour,
            Value::Number(n) if n.as_i64() == Some(24) => Self::TwentyFourHour,
            _ => Self::default(),
        }
    }
}

/// 색상 테마
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    pub fn from_value(value: &Value) -> Self {
        match value.as_str() {
            Some("light") => Self::Light,
            Some("dark") => Self::Dark,
            _ => Self::default(),
        }
    }
}

/// 정시 알림 진동 세기
///
/// 순서가 곧 와이어 인덱스다 (light=0, medium=1, hard=2).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChimeStrength {
    Light,
    #[default]
    Medium,
    Hard,
}

impl ChimeStrength {
    /// 인덱스 순서대로 나열한 전체 값
    pub const ALL: [ChimeStrength; 3] = [Self::Light, Self::Medium, Self::Hard];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }

    /// 세기 정규화: 정확히 일치하는 이름만 유지하고 나머지는 `Medium`
    pub fn normalize(name: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|strength| strength.as_str() == name)
            .unwrap_or_default()
    }

    /// 문자열이 아닌 값은 모두 `Medium`으로 정규화
    pub fn from_value(value: &Value) -> Self {
        value.as_str().map(Self::normalize).unwrap_or_default()
    }

    /// 0부터 시작하는 인덱스. 범위를 벗어나면 `Medium`.
    pub fn from_index(index: i64) -> Self {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
            .unwrap_or_default()
    }

    pub fn index(self) -> u8 {
        match self {
            Self::Light => 0,
            Self::Medium => 1,
            Self::Hard => 2,
        }
    }
}

/// 불리언 필드 파싱. `true`/`false` 또는 1/0 숫자만 인정.
fn flag_from_value(value: &Value, default: bool) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => match n.as_i64() {
            Some(1) => true,
            Some(0) => false,
            _ => default,
        },
        _ => default,
    }
}

/// 정규 설정 레코드
///
/// 알 수 없는 키는 `extra`에 보존되어 저장/설정 페이지 왕복 시 그대로 전달된다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct SettingsRecord {
    /// 시간 표시 형식 (기본 24시간)
    pub time_format: TimeFormat,
    /// 테마 (기본 dark)
    pub theme: Theme,
    /// 진동 전체 활성화
    pub vibration: bool,
    /// 애니메이션 활성화
    pub animation: bool,
    /// 손목을 들어 화면을 켤 때 진동
    pub vibrate_on_open: bool,
    /// 정시 알림
    pub hourly_chime: bool,
    /// 정시 알림 진동 세기
    pub hourly_chime_strength: ChimeStrength,
    /// 알 수 없는 추가 필드 (통과)
    pub extra: Map<String, Value>,
}

impl Default for SettingsRecord {
    fn default() -> Self {
        Self {
            time_format: TimeFormat::default(),
            theme: Theme::default(),
            vibration: true,
            animation: true,
            vibrate_on_open: true,
            hourly_chime: false,
            hourly_chime_strength: ChimeStrength::default(),
            extra: Map::new(),
        }
    }
}

impl SettingsRecord {
    /// 현재 레코드 위에 부분 매핑을 얕게 병합한 새 레코드를 만든다.
    ///
    /// 매핑에 있는 키는 조건 없이 덮어쓰고, 결과는 다시 정규화된다.
    pub fn merged(&self, patch: Map<String, Value>) -> Self {
        let mut base = self.to_map();
        base.extend(patch);
        Self::from(base)
    }

    /// 필드 이름 → JSON 값 매핑
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = self.extra.clone();
        map.insert(
            fields::TIME_FORMAT.to_string(),
            Value::from(self.time_format.as_str()),
        );
        map.insert(fields::THEME.to_string(), Value::from(self.theme.as_str()));
        map.insert(fields::VIBRATION.to_string(), Value::from(self.vibration));
        map.insert(fields::ANIMATION.to_string(), Value::from(self.animation));
        map.insert(
            fields::VIBRATE_ON_OPEN.to_string(),
            Value::from(self.vibrate_on_open),
        );
        map.insert(
            fields::HOURLY_CHIME.to_string(),
            Value::from(self.hourly_chime),
        );
        map.insert(
            fields::HOURLY_CHIME_STRENGTH.to_string(),
            Value::from(self.hourly_chime_strength.as_str()),
        );
        map
    }

    /// 압축 JSON 문자열 (저장소 값, 설정 페이지 상태)
    pub fn to_json(&self) -> String {
        Value::Object(self.to_map()).to_string()
    }
}

impl From<Map<String, Value>> for SettingsRecord {
    fn from(mut map: Map<String, Value>) -> Self {
        let defaults = Self::default();
        let mut flag = |key: &str, default: bool| {
            map.remove(key)
                .map(|v| flag_from_value(&v, default))
                .unwrap_or(default)
        };

        let vibration = flag(fields::VIBRATION, defaults.vibration);
        let animation = flag(fields::ANIMATION, defaults.animation);
        let vibrate_on_open = flag(fields::VIBRATE_ON_OPEN, defaults.vibrate_on_open);
        let hourly_chime = flag(fields::HOURLY_CHIME, defaults.hourly_chime);

        let time_format = map
            .remove(fields::TIME_FORMAT)
            .map(|v| TimeFormat::from_value(&v))
            .unwrap_or(defaults.time_format);
        let theme = map
            .remove(fields::THEME)
            .map(|v| Theme::from_value(&v))
            .unwrap_or(defaults.theme);
        let hourly_chime_strength = map
            .remove(fields::HOURLY_CHIME_STRENGTH)
            .map(|v| ChimeStrength::from_value(&v))
            .unwrap_or(defaults.hourly_chime_strength);

        Self {
            time_format,
            theme,
            vibration,
            animation,
            vibrate_on_open,
            hourly_chime,
            hourly_chime_strength,
            extra: map,
        }
    }
}

impl From<SettingsRecord> for Map<String, Value> {
    fn from(record: SettingsRecord) -> Self {
        record.to_map()
    }
}
