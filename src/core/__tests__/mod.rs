//! # 자연 신경망 통합 단위테스트

pub mod network_test;
