//! 은닉 상태 통계 추정

use crate::core::error::{NaturalNetError, Result};
use crate::core::systems::StatisticsMode;
use ndarray::{Array1, Array2, Axis};

/// 관측 축에 대한 경험적 평균과 2차 모멘트
#[derive(Debug, Clone)]
pub struct HiddenStatistics {
    /// μ = mean(h)
    pub mean: Array1<f64>,
    /// Uncentered: mean(h·hᵗ), Centered: mean((h-μ)·(h-μ)ᵗ)
    pub second_moment: Array2<f64>,
    pub observations: usize,
}

impl HiddenStatistics {
    /// observations: [관측 수, 특징 수]
    pub fn estimate(observations: &Array2<f64>, mode: StatisticsMode, layer: usize) -> Result<Self> {
        let count = observations.nrows();
        let mean = observations
            .mean_axis(Axis(0))
            .ok_or_else(|| NaturalNetError::degenerate(layer, "관측치가 없는 샘플 배치"))?;

        // 외적들의 평균: hᵗ·h / n (대칭)
        let second_moment = match mode {
            StatisticsMode::Uncentered => observations.t().dot(observations) / count as f64,
            StatisticsMode::Centered => {
                let centered = observations - &mean;
                centered.t().dot(&centered) / count as f64
            }
        };

        Ok(Self {
            mean,
            second_moment,
            observations: count,
        })
    }

    pub fn dim(&self) -> usize {
        self.mean.len()
    }
}
