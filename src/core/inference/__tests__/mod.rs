//! # inference 모듈 테스트
