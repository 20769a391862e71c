//! # params 모듈 테스트

pub mod store_test;
