//! Natural Neural Network 라이브러리
//!
//! 은닉 활성을 레이어별 아핀 재매개변수화(U, c)로 화이트닝하는
//! 밀집/합성곱 신경망과, 함수를 보존하며 화이트닝을 갱신하는 재매개변수화 엔진

pub mod core;

// 핵심 모듈들 재수출
pub use crate::core::{
    // 설정
    NaturalNetConfig, Architecture, ConvSettings, Initializer, StatisticsMode, GaussianSource,
    // 파라미터 저장소
    ParameterStore, LayerParams, LayerKind, DenseParams, DenseWhitening, ConvParams, ParamKind,
    // 순전파
    ForwardEngine, ForwardOutput, HiddenState,
    // 재매개변수화
    ReparamEngine, ReparamReport, LayerReparamRecord, WhiteningTransform, WhiteningDiagnostic,
    // 네트워크
    NaturalNet,
    // 오류
    NaturalNetError, Result,
};
