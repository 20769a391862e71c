//! 레이어 파라미터 저장소
//!
//! 레이어 인덱스(1부터)로 (V, d, U, c)를 읽고 쓴다.

use super::layer_params::{ConvParams, DenseParams, LayerParams, ParamKind};
use crate::core::error::{NaturalNetError, Result};
use ndarray::{ArrayD, ArrayViewD};

/// 전체 원소 수 요약
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParameterCount {
    pub trainable: usize,
    pub whitening: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ParameterStore {
    layers: Vec<LayerParams>,
}

impl ParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 레이어를 추가하고 그 인덱스를 반환
    pub fn push(&mut self, params: LayerParams) -> usize {
        self.layers.push(params);
        self.layers.len()
    }

    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    pub fn layer(&self, index: usize) -> Result<&LayerParams> {
        index
            .checked_sub(1)
            .and_then(|slot| self.layers.get(slot))
            .ok_or(NaturalNetError::UnknownLayer {
                layer: index,
                num_layers: self.layers.len(),
            })
    }

    fn layer_mut(&mut self, index: usize) -> Result<&mut LayerParams> {
        let num_layers = self.layers.len();
        index
            .checked_sub(1)
            .and_then(|slot| self.layers.get_mut(slot))
            .ok_or(NaturalNetError::UnknownLayer {
                layer: index,
                num_layers,
            })
    }

    pub fn dense(&self, index: usize) -> Result<&DenseParams> {
        match self.layer(index)? {
            LayerParams::Dense(params) => Ok(params),
            LayerParams::Conv(_) => Err(NaturalNetError::Configuration(format!(
                "레이어 {index}는 밀집 레이어가 아님"
            ))),
        }
    }

    pub fn conv(&self, index: usize) -> Result<&ConvParams> {
        match self.layer(index)? {
            LayerParams::Conv(params) => Ok(params),
            LayerParams::Dense(_) => Err(NaturalNetError::Configuration(format!(
                "레이어 {index}는 합성곱 레이어가 아님"
            ))),
        }
    }

    /// 현재 텐서 조회
    pub fn get(&self, index: usize, kind: ParamKind) -> Result<ArrayViewD<'_, f64>> {
        self.layer(index)?
            .get(kind)
            .ok_or(NaturalNetError::MissingParameter { layer: index, kind })
    }

    /// 형상을 유지한 채 덮어쓰기. 형상이 다르면 ShapeMismatch
    pub fn set(&mut self, index: usize, kind: ParamKind, value: ArrayD<f64>) -> Result<()> {
        self.layer_mut(index)?.set(index, kind, value)
    }

    /// (인덱스, 파라미터) 순회
    pub fn iter(&self) -> impl Iterator<Item = (usize, &LayerParams)> + '_ {
        self.layers.iter().enumerate().map(|(slot, params)| (slot + 1, params))
    }

    pub fn parameter_count(&self) -> ParameterCount {
        self.layers
            .iter()
            .map(LayerParams::parameter_count)
            .fold(ParameterCount::default(), |acc, (trainable, whitening)| {
                ParameterCount {
                    trainable: acc.trainable + trainable,
                    whitening: acc.whitening + whitening,
                }
            })
    }
}
