//! 화이트닝 품질 진단
//!
//! 현재 (U, c)가 은닉 상태를 얼마나 잘 화이트닝하는지 측정

use super::statistics::HiddenStatistics;
use crate::core::error::{NaturalNetError, Result};
use crate::core::inference::ops::squeeze_whitening;
use crate::core::inference::HiddenState;
use crate::core::params::{LayerParams, ParamKind, ParameterStore};
use crate::core::systems::StatisticsMode;
use ndarray::{Array1, Array2, Axis};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct WhiteningDiagnostic {
    pub layer: usize,
    pub observations: usize,
    /// max |mean((h - c)·U)|
    pub mean_max_abs: f64,
    /// ‖Uᵗ·Σ(h)·U - I‖_F
    pub moment_deviation: f64,
}

/// 레이어 2..=num_layers의 화이트닝 품질
pub fn diagnose(
    store: &ParameterStore,
    hidden_states: &[HiddenState],
    num_layers: usize,
    mode: StatisticsMode,
) -> Result<Vec<WhiteningDiagnostic>> {
    (2..=num_layers)
        .map(|layer| {
            let hidden = hidden_states.get(layer - 2).ok_or_else(|| {
                NaturalNetError::shape("은닉 상태 수", &[layer - 1], &[hidden_states.len()])
            })?;
            let (u, c) = whitening_of(store.layer(layer)?, layer)?;
            let observations = hidden.observations();
            if observations.ncols() != u.nrows() {
                return Err(NaturalNetError::shape(
                    format!("레이어 {layer} 진단 입력 폭"),
                    &[u.nrows()],
                    &[observations.ncols()],
                ));
            }

            let centered = match &c {
                Some(c) => &observations - c,
                None => observations.clone(),
            };
            let whitened = centered.dot(&u);
            let mean_max_abs = whitened
                .mean_axis(Axis(0))
                .map(|m| m.iter().fold(0.0_f64, |acc, v| acc.max(v.abs())))
                .ok_or_else(|| NaturalNetError::degenerate(layer, "관측치가 없는 샘플 배치"))?;

            let stats = HiddenStatistics::estimate(&observations, mode, layer)?;
            let moment = u.t().dot(&stats.second_moment).dot(&u);
            let deviation = &moment - &Array2::<f64>::eye(moment.nrows());

            Ok(WhiteningDiagnostic {
                layer,
                observations: stats.observations,
                mean_max_abs,
                moment_deviation: frobenius(&deviation),
            })
        })
        .collect()
}

fn whitening_of(params: &LayerParams, layer: usize) -> Result<(Array2<f64>, Option<Array1<f64>>)> {
    let missing = NaturalNetError::MissingParameter { layer, kind: ParamKind::U };
    match params {
        LayerParams::Dense(p) => p
            .whitening
            .as_ref()
            .map(|w| (w.u.clone(), Some(w.c.clone())))
            .ok_or(missing),
        LayerParams::Conv(p) => {
            let kernel = p.u.as_ref().ok_or(missing)?;
            Ok((squeeze_whitening(kernel)?, None))
        }
    }
}

pub fn frobenius(matrix: &Array2<f64>) -> f64 {
    matrix.iter().map(|v| v * v).sum::<f64>().sqrt()
}
