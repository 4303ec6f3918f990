//! 설정 웹 페이지 인코딩.
//!
//! 현재 레코드를 `?state=` 쿼리로 실어 보내고,
//! 페이지가 닫힐 때 돌려주는 URL 인코딩된 JSON 응답을 해석한다.

use serde_json::{Map, Value};

use crate::error::CoreError;
use crate::models::settings::SettingsRecord;

/// 설정 페이지 상태 쿼리 파라미터 이름
pub const STATE_PARAM: &str = "state";

/// `<base>?state=<URL 인코딩된 레코드 JSON>`
pub fn build_config_url(base: &str, record: &SettingsRecord) -> String {
    let json = record.to_json();
    let state = urlencoding::encode(&json);
    format!("{base}?{STATE_PARAM}={state}")
}

/// 웹뷰 응답을 부분 매핑으로 디코딩
///
/// 응답은 URL 인코딩된 JSON 객체여야 한다. 16진수 두 자리가 뒤따르지 않는
/// `%`는 디코딩 실패로 취급한다.
pub fn decode_config_response(encoded: &str) -> Result<Map<String, Value>, CoreError> {
    check_escapes(encoded)?;
    let decoded = urlencoding::decode(encoded)
        .map_err(|e| CoreError::Decode(format!("URL 디코딩 실패: {e}")))?;

    match serde_json::from_str::<Value>(&decoded)? {
        Value::Object(map) => Ok(map),
        other => Err(CoreError::Decode(format!(
            "설정 응답이 JSON 객체가 아님: {other}"
        ))),
    }
}

/// 잘못된 `%` 이스케이프 검사 (`urlencoding::decode`는 그대로 통과시킴)
fn check_escapes(encoded: &str) -> Result<(), CoreError> {
    let bytes = encoded.as_bytes();
    for (i, _) in encoded.match_indices('%') {
        let valid = bytes
            .get(i + 1..i + 3)
            .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
        if !valid {
            return Err(CoreError::Decode(format!(
                "잘못된 퍼센트 이스케이프 (위치 {i})"
            )));
        }
    }
    Ok(())
}
