//! # 합성 샘플 생성기
//!
//! 재매개변수화와 진단에 쓸 비등방 가우시안 배치 생성

use crate::core::error::{NaturalNetError, Result};
use ndarray::{Array1, Array2, Array4};
use rand::Rng;
use rand_distr::StandardNormal;

/// x = mean + L·g, g ~ N(0, I) 형태의 가우시안 분포
#[derive(Debug, Clone)]
pub struct GaussianSource {
    pub mean: Array1<f64>,
    /// 혼합 행렬 L (공분산 = L·Lᵗ)
    pub mixing: Array2<f64>,
}

impl GaussianSource {
    pub fn new(mean: Array1<f64>, mixing: Array2<f64>) -> Result<Self> {
        let dim = mean.len();
        if mixing.dim() != (dim, dim) {
            return Err(NaturalNetError::shape(
                "가우시안 혼합 행렬",
                &[dim, dim],
                mixing.shape(),
            ));
        }
        Ok(Self { mean, mixing })
    }

    /// 축마다 표준편차만 다른 대각 분포
    pub fn axis_aligned(mean: Array1<f64>, stds: &[f64]) -> Result<Self> {
        let mixing = Array2::from_diag(&Array1::from(stds.to_vec()));
        Self::new(mean, mixing)
    }

    pub fn dim(&self) -> usize {
        self.mean.len()
    }

    /// [batch, dim] 샘플 배치
    pub fn sample<R: Rng>(&self, rng: &mut R, batch: usize) -> Array2<f64> {
        let noise = Array2::from_shape_simple_fn((batch, self.dim()), || {
            rng.sample::<f64, _>(StandardNormal)
        });
        noise.dot(&self.mixing.t()) + &self.mean
    }
}

/// [batch, height, width, channels] 이미지 배치 (픽셀 독립 가우시안)
pub fn gaussian_images<R: Rng>(
    rng: &mut R,
    batch: usize,
    height: usize,
    width: usize,
    channels: usize,
    mean: f64,
    std: f64,
) -> Array4<f64> {
    Array4::from_shape_simple_fn((batch, height, width, channels), || {
        mean + std * rng.sample::<f64, _>(StandardNormal)
    })
}
