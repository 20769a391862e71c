//! 레이어별 파라미터 묶음
//!
//! 학습 가능 쌍 (V, d)와 학습되지 않는 화이트닝 쌍 (U, c)

use crate::core::error::{NaturalNetError, Result};
use ndarray::{Array, Array1, Array2, Array4, ArrayD, ArrayViewD, Dimension};
use serde::Serialize;
use std::fmt;

/// 파라미터 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    /// 변환 가중치
    V,
    /// 편향
    D,
    /// 화이트닝 행렬
    U,
    /// 화이트닝 평균 오프셋
    C,
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParamKind::V => "V",
            ParamKind::D => "d",
            ParamKind::U => "U",
            ParamKind::C => "c",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    Dense,
    Conv,
}

/// 밀집 레이어 화이트닝 쌍: x ↦ (x - c)·U
#[derive(Debug, Clone)]
pub struct DenseWhitening {
    /// [input_dim × input_dim]
    pub u: Array2<f64>,
    /// [input_dim]
    pub c: Array1<f64>,
}

impl DenseWhitening {
    pub fn identity(input_dim: usize) -> Self {
        Self {
            u: super::initializer::identity_whitening(input_dim),
            c: Array1::zeros(input_dim),
        }
    }
}

/// 밀집 레이어: activation((x - c)·U·V + d)
#[derive(Debug, Clone)]
pub struct DenseParams {
    /// [input_dim × output_dim]
    pub v: Array2<f64>,
    /// [output_dim]
    pub d: Array1<f64>,
    /// 입력 레이어(1번)에는 없음
    pub whitening: Option<DenseWhitening>,
}

/// 합성곱 레이어
///
/// 1번 레이어는 편향 d만, 2번 이후 레이어는 1×1 화이트닝 커널 U만 가진다.
/// 합성곱 레이어에는 평균 오프셋 c가 없다.
#[derive(Debug, Clone)]
pub struct ConvParams {
    /// [k × k × in_channels × out_channels]
    pub v: Array4<f64>,
    /// [out_channels]
    pub d: Option<Array1<f64>>,
    /// [1 × 1 × in_channels × in_channels]
    pub u: Option<Array4<f64>>,
}

#[derive(Debug, Clone)]
pub enum LayerParams {
    Dense(DenseParams),
    Conv(ConvParams),
}

impl LayerParams {
    pub fn kind(&self) -> LayerKind {
        match self {
            LayerParams::Dense(_) => LayerKind::Dense,
            LayerParams::Conv(_) => LayerKind::Conv,
        }
    }

    /// 화이트닝 파라미터 보유 여부
    pub fn is_whitened(&self) -> bool {
        match self {
            LayerParams::Dense(p) => p.whitening.is_some(),
            LayerParams::Conv(p) => p.u.is_some(),
        }
    }

    /// 입력 특징(채널) 수
    pub fn input_dim(&self) -> usize {
        match self {
            LayerParams::Dense(p) => p.v.nrows(),
            LayerParams::Conv(p) => p.v.dim().2,
        }
    }

    /// 출력 특징(채널) 수
    pub fn output_dim(&self) -> usize {
        match self {
            LayerParams::Dense(p) => p.v.ncols(),
            LayerParams::Conv(p) => p.v.dim().3,
        }
    }

    pub fn get(&self, kind: ParamKind) -> Option<ArrayViewD<'_, f64>> {
        match (self, kind) {
            (LayerParams::Dense(p), ParamKind::V) => Some(p.v.view().into_dyn()),
            (LayerParams::Dense(p), ParamKind::D) => Some(p.d.view().into_dyn()),
            (LayerParams::Dense(p), ParamKind::U) => {
                p.whitening.as_ref().map(|w| w.u.view().into_dyn())
            }
            (LayerParams::Dense(p), ParamKind::C) => {
                p.whitening.as_ref().map(|w| w.c.view().into_dyn())
            }
            (LayerParams::Conv(p), ParamKind::V) => Some(p.v.view().into_dyn()),
            (LayerParams::Conv(p), ParamKind::D) => p.d.as_ref().map(|d| d.view().into_dyn()),
            (LayerParams::Conv(p), ParamKind::U) => p.u.as_ref().map(|u| u.view().into_dyn()),
            (LayerParams::Conv(_), ParamKind::C) => None,
        }
    }

    /// 같은 형상의 값으로 덮어쓰기
    pub(crate) fn set(&mut self, layer: usize, kind: ParamKind, value: ArrayD<f64>) -> Result<()> {
        let missing = NaturalNetError::MissingParameter { layer, kind };
        match (self, kind) {
            (LayerParams::Dense(p), ParamKind::V) => assign(&mut p.v, value, layer, kind),
            (LayerParams::Dense(p), ParamKind::D) => assign(&mut p.d, value, layer, kind),
            (LayerParams::Dense(p), ParamKind::U) => match p.whitening.as_mut() {
                Some(w) => assign(&mut w.u, value, layer, kind),
                None => Err(missing),
            },
            (LayerParams::Dense(p), ParamKind::C) => match p.whitening.as_mut() {
                Some(w) => assign(&mut w.c, value, layer, kind),
                None => Err(missing),
            },
            (LayerParams::Conv(p), ParamKind::V) => assign(&mut p.v, value, layer, kind),
            (LayerParams::Conv(p), ParamKind::D) => match p.d.as_mut() {
                Some(d) => assign(d, value, layer, kind),
                None => Err(missing),
            },
            (LayerParams::Conv(p), ParamKind::U) => match p.u.as_mut() {
                Some(u) => assign(u, value, layer, kind),
                None => Err(missing),
            },
            (LayerParams::Conv(_), ParamKind::C) => Err(missing),
        }
    }

    /// (학습 가능, 화이트닝) 원소 수
    pub fn parameter_count(&self) -> (usize, usize) {
        match self {
            LayerParams::Dense(p) => {
                let whitening = p.whitening.as_ref().map_or(0, |w| w.u.len() + w.c.len());
                (p.v.len() + p.d.len(), whitening)
            }
            LayerParams::Conv(p) => {
                let bias = p.d.as_ref().map_or(0, |d| d.len());
                (p.v.len() + bias, p.u.as_ref().map_or(0, |u| u.len()))
            }
        }
    }
}

fn assign<D: Dimension>(
    slot: &mut Array<f64, D>,
    value: ArrayD<f64>,
    layer: usize,
    kind: ParamKind,
) -> Result<()> {
    let context = format!("레이어 {layer} {kind} 갱신");
    if slot.shape() != value.shape() {
        return Err(NaturalNetError::shape(context, slot.shape(), value.shape()));
    }
    let expected = slot.shape().to_vec();
    *slot = value
        .into_dimensionality::<D>()
        .map_err(|_| NaturalNetError::shape(context, &expected, &[]))?;
    Ok(())
}
