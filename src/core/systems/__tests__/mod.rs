//! # systems 모듈 테스트
//!
//! 설정과 합성 샘플 생성기 단위테스트

pub mod config_test;
