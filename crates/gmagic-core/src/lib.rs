//! # gmagic-core
//!
//! General Magic 워치페이스 컴패니언의 도메인 모델, 포트(trait) 정의, 에러 타입.
//! 모든 크레이트가 공유하는 핵심 타입과 인터페이스를 제공한다.
//!
//! ## 구조
//!
//! - [`models`]: 설정 레코드, 디바이스 와이어 코덱, 설정 페이지 인코딩
//! - [`ports`]: Hexagonal Architecture 포트 인터페이스 (저장소, 디바이스 채널, 웹뷰)
//! - [`error`]: 핵심 에러 타입 (thiserror)
//! - [`config`]: 애플리케이션 설정 구조체
//! - [`config_manager`]: 설정 파일 관리 (로드/저장)

pub mod config;
pub mod config_manager;
pub mod error;
pub mod models;
pub mod ports;
