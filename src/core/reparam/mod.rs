//! # 재매개변수화 모듈
//!
//! 은닉 상태 통계 → 고유값 분해 기반 화이트닝 → 함수 보존 파라미터 재작성

pub mod statistics;
pub mod whitening;
pub mod canonical;
pub mod engine;
pub mod diagnostics;

// 테스트 모듈
#[cfg(test)]
mod __tests__;

pub use statistics::HiddenStatistics;
pub use whitening::WhiteningTransform;
pub use engine::{ReparamEngine, ReparamReport, LayerReparamRecord};
pub use diagnostics::{diagnose, WhiteningDiagnostic};
