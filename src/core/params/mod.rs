pub mod layer_params;
pub mod initializer;
pub mod store;

// 테스트 모듈
#[cfg(test)]
mod __tests__;

pub use layer_params::{
    ParamKind, LayerKind, LayerParams, DenseParams, DenseWhitening, ConvParams
};
pub use initializer::{identity_whitening, conv_identity_whitening};
pub use store::{ParameterStore, ParameterCount};
