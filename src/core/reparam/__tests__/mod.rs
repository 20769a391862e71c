//! # reparam 모듈 테스트
//!
//! 통계 추정, 화이트닝 변환, 재매개변수화 엔진 단위테스트

pub mod statistics_test;
