//! # 오류 타입
//!
//! 자연 신경망 전 구성요소가 공유하는 오류 분류 체계

use crate::core::params::ParamKind;
use thiserror::Error;

/// 라이브러리 결과 타입
pub type Result<T> = std::result::Result<T, NaturalNetError>;

#[derive(Debug, Error)]
pub enum NaturalNetError {
    /// 선언된 크기와 실제 텐서 형상이 어긋남
    #[error("형상 불일치 ({context}): 기대 {expected:?}, 실제 {actual:?}")]
    ShapeMismatch {
        context: String,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// 고유값 분해나 역행렬이 유한하지 않거나 특이함
    #[error("레이어 {layer} 수치적 퇴화: {reason}")]
    NumericalDegeneracy { layer: usize, reason: String },

    /// 생성 인자 오류
    #[error("설정 오류: {0}")]
    Configuration(String),

    #[error("존재하지 않는 레이어 {layer} (전체 {num_layers}개)")]
    UnknownLayer { layer: usize, num_layers: usize },

    #[error("레이어 {layer}에 {kind} 파라미터가 없음")]
    MissingParameter { layer: usize, kind: ParamKind },

    #[error("설정 파일 입출력 실패: {0}")]
    Io(#[from] std::io::Error),

    #[error("설정 JSON 파싱 실패: {0}")]
    Json(#[from] serde_json::Error),
}

impl NaturalNetError {
    pub(crate) fn shape(context: impl Into<String>, expected: &[usize], actual: &[usize]) -> Self {
        NaturalNetError::ShapeMismatch {
            context: context.into(),
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        }
    }

    pub(crate) fn degenerate(layer: usize, reason: impl Into<String>) -> Self {
        NaturalNetError::NumericalDegeneracy {
            layer,
            reason: reason.into(),
        }
    }
}
