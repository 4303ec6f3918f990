//! General Magic 도메인 모델.
//!
//! 저장소, 설정 페이지, 워치 사이에서 공유하는 데이터 구조체와
//! 인코딩 규칙을 정의한다.

pub mod config_page;
pub mod message;
pub mod settings;
