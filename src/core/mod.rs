//! # 자연 신경망 핵심 모듈
//!
//! 파라미터 저장소 → 순전파 엔진 → 재매개변수화 엔진 순서로 의존

pub mod error;
pub mod systems;
pub mod params;
pub mod inference;
pub mod reparam;
pub mod network;

// 주요 타입들 재수출
pub use error::{NaturalNetError, Result};
pub use systems::{
    Architecture, ConvSettings, GaussianSource, Initializer, NaturalNetConfig, StatisticsMode,
    gaussian_images,
};
pub use params::{
    ConvParams, DenseParams, DenseWhitening, LayerKind, LayerParams, ParamKind, ParameterCount,
    ParameterStore, conv_identity_whitening, identity_whitening,
};
pub use inference::{ForwardEngine, ForwardOutput, HiddenState};
pub use reparam::{
    HiddenStatistics, LayerReparamRecord, ReparamEngine, ReparamReport, WhiteningDiagnostic,
    WhiteningTransform, diagnose,
};
pub use network::NaturalNet;

// 네트워크 단위 테스트
#[cfg(test)]
mod __tests__;
