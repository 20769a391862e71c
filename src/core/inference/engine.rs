//! 순전파 엔진
//!
//! 화이트닝 레이어를 이어 출력을 만들고, 다음 레이어의 화이트닝이
//! 소비하는 은닉 상태를 기록한다. 재매개변수화도 같은 경로를 쓴다.

use super::ops::{
    add_channel_bias, affine, collapse_spatial, conv1x1, conv2d_same, flatten, max_pool_2x2,
    relu, whitened_affine,
};
use crate::core::error::{NaturalNetError, Result};
use crate::core::params::{DenseParams, DenseWhitening, ParamKind, ParameterStore};
use crate::core::systems::ConvSettings;
use ndarray::{Array2, Array4, ArrayView2, ArrayView4};

/// 한 번의 순전파에서 기록된 은닉 상태
#[derive(Debug, Clone)]
pub enum HiddenState {
    /// [batch, features]
    Dense(Array2<f64>),
    /// [batch, height, width, channels]
    Conv(Array4<f64>),
}

impl HiddenState {
    /// 통계용 관측 행렬. 합성곱 상태는 배치와 공간 축을 합친다.
    pub fn observations(&self) -> Array2<f64> {
        match self {
            HiddenState::Dense(h) => h.clone(),
            HiddenState::Conv(h) => collapse_spatial(h.view()),
        }
    }

    /// 특징(채널) 수
    pub fn features(&self) -> usize {
        match self {
            HiddenState::Dense(h) => h.ncols(),
            HiddenState::Conv(h) => h.dim().3,
        }
    }

    pub fn batch(&self) -> usize {
        match self {
            HiddenState::Dense(h) => h.nrows(),
            HiddenState::Conv(h) => h.dim().0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ForwardOutput {
    /// [batch, output_dim]
    pub output: Array2<f64>,
    /// hidden_states[i-2]는 레이어 i의 화이트닝이 소비하는 상태
    pub hidden_states: Vec<HiddenState>,
}

/// 현재 파라미터로 순전파를 수행
pub struct ForwardEngine<'a> {
    store: &'a ParameterStore,
}

impl<'a> ForwardEngine<'a> {
    pub fn new(store: &'a ParameterStore) -> Self {
        Self { store }
    }

    /// 밀집 네트워크 순전파
    ///
    /// 레이어 1: ReLU(x·V₁ + d₁), 레이어 i ≥ 2: ReLU((h - cᵢ)·Uᵢ·Vᵢ + dᵢ),
    /// 마지막 레이어는 활성화 없음.
    pub fn infer_dense(&self, x: ArrayView2<'_, f64>, layer_sizes: &[usize]) -> Result<ForwardOutput> {
        let num_layers = require_layers(layer_sizes)?;
        let first = self.store.dense(1)?;
        expect_dense_shape(1, first, x.ncols(), layer_sizes[0])?;

        let mut h = relu(affine(x, &first.v, &first.d)?);
        let mut hidden_states = Vec::with_capacity(num_layers);
        hidden_states.push(HiddenState::Dense(h.clone()));

        for i in 2..=num_layers {
            let layer = self.store.dense(i)?;
            expect_dense_shape(i, layer, layer_sizes[i - 2], layer_sizes[i - 1])?;
            h = whitened_dense(i, layer, h.view())?;
            if i < num_layers {
                h = relu(h);
                hidden_states.push(HiddenState::Dense(h.clone()));
            }
        }

        Ok(ForwardOutput {
            output: h,
            hidden_states,
        })
    }

    /// 합성곱 네트워크 순전파
    ///
    /// 레이어 1: k×k 합성곱 + 편향 + ReLU, 레이어 i ≥ 2: 1×1 화이트닝 합성곱 후
    /// k×k 합성곱 + ReLU. 각 합성곱 뒤 2×2 최대 풀링. 풀링 전 상태를 기록하고,
    /// 평탄화 뒤 화이트닝 밀집 레이어 두 개(ReLU, 선형)로 마무리한다.
    pub fn infer_conv(
        &self,
        x: ArrayView4<'_, f64>,
        layer_sizes: &[usize],
        settings: &ConvSettings,
    ) -> Result<ForwardOutput> {
        let num_layers = require_layers(layer_sizes)?;
        let (_, height, width, channels) = x.dim();
        let expected = [settings.height, settings.width, settings.channels];
        if [height, width, channels] != expected {
            return Err(NaturalNetError::shape("합성곱 입력", &expected, &x.shape()[1..]));
        }

        let first = self.store.conv(1)?;
        let bias = first
            .d
            .as_ref()
            .ok_or(NaturalNetError::MissingParameter { layer: 1, kind: ParamKind::D })?;
        let mut h = relu(add_channel_bias(conv2d_same(x, &first.v, 1)?, bias)?);
        expect_channels(1, h.dim().3, layer_sizes[0])?;

        let mut hidden_states = Vec::with_capacity(num_layers);
        hidden_states.push(HiddenState::Conv(h.clone()));
        h = max_pool_2x2(h.view());

        for i in 2..=num_layers {
            let layer = self.store.conv(i)?;
            let whitening = layer
                .u
                .as_ref()
                .ok_or(NaturalNetError::MissingParameter { layer: i, kind: ParamKind::U })?;
            let whitened = conv1x1(h.view(), whitening)?;
            h = relu(conv2d_same(whitened.view(), &layer.v, settings.stride)?);
            expect_channels(i, h.dim().3, layer_sizes[i - 1])?;
            hidden_states.push(HiddenState::Conv(h.clone()));
            h = max_pool_2x2(h.view());
        }

        let flat = flatten(h.view());
        let hidden = relu(whitened_dense(
            num_layers + 1,
            self.store.dense(num_layers + 1)?,
            flat.view(),
        )?);
        let output = whitened_dense(
            num_layers + 2,
            self.store.dense(num_layers + 2)?,
            hidden.view(),
        )?;

        Ok(ForwardOutput {
            output,
            hidden_states,
        })
    }
}

fn require_layers(layer_sizes: &[usize]) -> Result<usize> {
    if layer_sizes.is_empty() {
        return Err(NaturalNetError::Configuration("layer_sizes가 비어 있음".to_string()));
    }
    Ok(layer_sizes.len())
}

fn whitened_dense(layer: usize, params: &DenseParams, h: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
    let DenseWhitening { u, c } = params
        .whitening
        .as_ref()
        .ok_or(NaturalNetError::MissingParameter { layer, kind: ParamKind::U })?;
    whitened_affine(h, c, u, &params.v, &params.d)
}

fn expect_dense_shape(layer: usize, params: &DenseParams, rows: usize, cols: usize) -> Result<()> {
    if params.v.dim() != (rows, cols) {
        return Err(NaturalNetError::shape(
            format!("레이어 {layer} V"),
            &[rows, cols],
            params.v.shape(),
        ));
    }
    Ok(())
}

fn expect_channels(layer: usize, actual: usize, declared: usize) -> Result<()> {
    if actual != declared {
        return Err(NaturalNetError::shape(
            format!("레이어 {layer} 출력 채널"),
            &[declared],
            &[actual],
        ));
    }
    Ok(())
}
