//! # 순전파 모듈
//!
//! 화이트닝 레이어 연산과 은닉 상태를 기록하는 순전파 엔진

pub mod ops;
pub mod engine;

// 테스트 모듈
#[cfg(test)]
mod __tests__;

pub use engine::{ForwardEngine, ForwardOutput, HiddenState};
