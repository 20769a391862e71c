//! 파라미터 초기화
//!
//! 화이트닝 쌍은 항등/영으로, 학습 가능 가중치는 설정된 전략으로 초기화

use crate::core::error::{NaturalNetError, Result};
use crate::core::systems::Initializer;
use ndarray::{s, Array, Array2, Array4, Dimension, IntoDimension};
use rand::Rng;
use rand_distr::{Distribution, Normal};

/// 밀집 화이트닝 행렬 초기값: n×n 항등행렬
pub fn identity_whitening(n: usize) -> Array2<f64> {
    Array2::eye(n)
}

/// 합성곱 화이트닝 커널 초기값: 단일 탭이 c×c 항등행렬인 1×1×c×c 커널
pub fn conv_identity_whitening(channels: usize) -> Array4<f64> {
    let mut kernel = Array4::zeros((1, 1, channels, channels));
    kernel
        .slice_mut(s![0, 0, .., ..])
        .assign(&Array2::eye(channels));
    kernel
}

impl Initializer {
    /// [fan_in × fan_out] 밀집 가중치
    pub fn matrix<R: Rng>(&self, rows: usize, cols: usize, rng: &mut R) -> Result<Array2<f64>> {
        self.fill((rows, cols), rows, cols, rng)
    }

    /// [k × k × in_c × out_c] 합성곱 커널 (fan은 수용 영역 포함)
    pub fn kernel<R: Rng>(
        &self,
        kernel_size: usize,
        in_channels: usize,
        out_channels: usize,
        rng: &mut R,
    ) -> Result<Array4<f64>> {
        let receptive = kernel_size * kernel_size;
        self.fill(
            (kernel_size, kernel_size, in_channels, out_channels),
            receptive * in_channels,
            receptive * out_channels,
            rng,
        )
    }

    fn fill<Sh, R>(
        &self,
        shape: Sh,
        fan_in: usize,
        fan_out: usize,
        rng: &mut R,
    ) -> Result<Array<f64, Sh::Dim>>
    where
        Sh: IntoDimension,
        Sh::Dim: Dimension,
        R: Rng,
    {
        let dim = shape.into_dimension();
        match *self {
            Initializer::Xavier => {
                let limit = (6.0 / (fan_in + fan_out).max(1) as f64).sqrt();
                Ok(Array::from_shape_simple_fn(dim, || rng.gen_range(-limit..=limit)))
            }
            Initializer::Normal { std } => {
                if !(std.is_finite() && std > 0.0) {
                    return Err(NaturalNetError::Configuration(format!(
                        "정규 초기화 표준편차가 잘못됨: {std}"
                    )));
                }
                let normal = Normal::new(0.0, std).map_err(|e| {
                    NaturalNetError::Configuration(format!("정규 분포 생성 실패: {e}"))
                })?;
                Ok(Array::from_shape_simple_fn(dim, || normal.sample(rng)))
            }
            Initializer::Constant { value } => Ok(Array::from_elem(dim, value)),
        }
    }
}
