//! # 재매개변수화 엔진
//!
//! 한 번의 순전파로 얻은 은닉 상태에서 레이어별 평균과 2차 모멘트를 추정하고,
//! 새 화이트닝 (U, c)를 유도한 뒤 정준 사상 (W, b)가 변하지 않도록
//! (V, d)를 다시 풀어 저장소에 반영한다.

use super::canonical::{canonical_dense, left_multiply_taps};
use super::statistics::HiddenStatistics;
use super::whitening::{eigen_range, WhiteningTransform};
use crate::core::error::{NaturalNetError, Result};
use crate::core::inference::ops::squeeze_whitening;
use crate::core::inference::HiddenState;
use crate::core::params::{LayerKind, ParamKind, ParameterStore};
use crate::core::systems::StatisticsMode;
use ndarray::Axis;
use serde::Serialize;

/// 레이어 하나의 재매개변수화 기록
#[derive(Debug, Clone, Serialize)]
pub struct LayerReparamRecord {
    pub layer: usize,
    pub kind: LayerKind,
    /// 통계에 쓴 관측 수 (합성곱은 배치×공간 위치)
    pub observations: usize,
    pub min_eigenvalue: f64,
    pub max_eigenvalue: f64,
    /// ‖μ‖₂
    pub mean_norm: f64,
}

/// 한 번의 재매개변수화 결과 (관측용, 의미상 반환값은 없음)
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReparamReport {
    pub records: Vec<LayerReparamRecord>,
}

impl ReparamReport {
    pub fn layers(&self) -> usize {
        self.records.len()
    }

    /// 레이어들 중 가장 큰 (λmax+ε)/(λmin+ε)
    pub fn worst_condition(&self, epsilon: f64) -> f64 {
        self.records
            .iter()
            .map(|r| (r.max_eigenvalue + epsilon) / (r.min_eigenvalue + epsilon))
            .fold(1.0, f64::max)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ReparamEngine {
    epsilon: f64,
    statistics: StatisticsMode,
}

impl ReparamEngine {
    pub fn new(epsilon: f64, statistics: StatisticsMode) -> Self {
        Self { epsilon, statistics }
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// 레이어 2..=num_layers를 순서대로 재매개변수화
    ///
    /// hidden_states는 갱신 전 파라미터로 한 번에 얻은 것이어야 한다.
    pub fn reparameterize(
        &self,
        store: &mut ParameterStore,
        hidden_states: &[HiddenState],
        num_layers: usize,
    ) -> Result<ReparamReport> {
        let required = num_layers.saturating_sub(1);
        if hidden_states.len() < required {
            return Err(NaturalNetError::shape(
                "은닉 상태 수",
                &[required],
                &[hidden_states.len()],
            ));
        }

        let mut report = ReparamReport::default();
        for layer in 2..=num_layers {
            let hidden = &hidden_states[layer - 2];
            let record = match store.layer(layer)?.kind() {
                LayerKind::Dense => self.reparam_dense(store, layer, hidden)?,
                LayerKind::Conv => self.reparam_conv(store, layer, hidden)?,
            };
            log::debug!(
                "레이어 {} 재매개변수화: 관측 {}, λ ∈ [{:.3e}, {:.3e}], ‖μ‖ = {:.4}",
                record.layer,
                record.observations,
                record.min_eigenvalue,
                record.max_eigenvalue,
                record.mean_norm
            );
            report.records.push(record);
        }
        Ok(report)
    }

    fn reparam_dense(
        &self,
        store: &mut ParameterStore,
        layer: usize,
        hidden: &HiddenState,
    ) -> Result<LayerReparamRecord> {
        let params = store.dense(layer)?;
        let whitening = params
            .whitening
            .as_ref()
            .ok_or(NaturalNetError::MissingParameter { layer, kind: ParamKind::U })?;
        let (w, b) = canonical_dense(&whitening.u, &params.v, &whitening.c, &params.d);

        let observations = hidden.observations();
        if observations.ncols() != w.nrows() {
            return Err(NaturalNetError::shape(
                format!("레이어 {layer} 은닉 상태 폭"),
                &[w.nrows()],
                &[observations.ncols()],
            ));
        }
        let stats = HiddenStatistics::estimate(&observations, self.statistics, layer)?;
        let transform = WhiteningTransform::from_second_moment(&stats.second_moment, self.epsilon, layer)?;
        let new_v = transform.inverse.dot(&w);

        store.set(layer, ParamKind::C, stats.mean.clone().into_dyn())?;
        store.set(layer, ParamKind::U, transform.matrix.clone().into_dyn())?;

        // 편향은 방금 반영한 U, c로 복원: d' = b + c'·U'·V'
        let committed = store
            .dense(layer)?
            .whitening
            .as_ref()
            .ok_or(NaturalNetError::MissingParameter { layer, kind: ParamKind::U })?;
        let new_d = &b + &committed.c.dot(&committed.u.dot(&new_v));

        store.set(layer, ParamKind::V, new_v.into_dyn())?;
        store.set(layer, ParamKind::D, new_d.into_dyn())?;

        Ok(record(layer, LayerKind::Dense, &stats, &transform))
    }

    fn reparam_conv(
        &self,
        store: &mut ParameterStore,
        layer: usize,
        hidden: &HiddenState,
    ) -> Result<LayerReparamRecord> {
        let params = store.conv(layer)?;
        let kernel = params
            .u
            .as_ref()
            .ok_or(NaturalNetError::MissingParameter { layer, kind: ParamKind::U })?;
        let u = squeeze_whitening(kernel)?;
        let w = left_multiply_taps(&u, &params.v)?;

        // 모든 공간 위치를 독립 관측으로 (채널별 화이트닝)
        let observations = hidden.observations();
        if observations.ncols() != u.nrows() {
            return Err(NaturalNetError::shape(
                format!("레이어 {layer} 은닉 채널"),
                &[u.nrows()],
                &[observations.ncols()],
            ));
        }
        let stats = HiddenStatistics::estimate(&observations, self.statistics, layer)?;
        let transform = WhiteningTransform::from_second_moment(&stats.second_moment, self.epsilon, layer)?;
        let new_v = left_multiply_taps(&transform.inverse, &w)?;
        let new_u = transform
            .matrix
            .clone()
            .insert_axis(Axis(0))
            .insert_axis(Axis(0));

        store.set(layer, ParamKind::U, new_u.into_dyn())?;
        store.set(layer, ParamKind::V, new_v.into_dyn())?;

        Ok(record(layer, LayerKind::Conv, &stats, &transform))
    }
}

fn record(
    layer: usize,
    kind: LayerKind,
    stats: &HiddenStatistics,
    transform: &WhiteningTransform,
) -> LayerReparamRecord {
    let (min_eigenvalue, max_eigenvalue) = eigen_range(&transform.eigenvalues);
    LayerReparamRecord {
        layer,
        kind,
        observations: stats.observations,
        min_eigenvalue,
        max_eigenvalue,
        mean_norm: stats.mean.dot(&stats.mean).sqrt(),
    }
}
