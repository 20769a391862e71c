//! # 설정 및 보조 시스템 모듈
//!
//! 네트워크 구성 설정과 합성 샘플 생성기

pub mod config;
pub mod synthetic;

// 설정 관련 재수출
pub use config::{
    NaturalNetConfig, Architecture, ConvSettings, Initializer, StatisticsMode
};

pub use synthetic::{GaussianSource, gaussian_images};

// 테스트 모듈들
#[cfg(test)]
pub mod __tests__;
