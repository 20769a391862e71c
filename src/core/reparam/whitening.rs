//! # 화이트닝 변환
//!
//! 대칭 2차 모멘트 Σ = Q·diag(λ)·Qᵗ에서 행 벡터 활성 h ↦ h·U를
//! 화이트닝하는 U = Q·diag(1/√(λ+ε))를 구한다.
//! (고유벡터를 행으로 둔 E = Qᵗ로 쓰면 U = Eᵗ·diag(1/√(λ+ε)))

use crate::core::error::{NaturalNetError, Result};
use nalgebra::{DMatrix, SymmetricEigen};
use ndarray::{Array1, Array2};

/// ε = 0일 때 고유값 퇴화 판정 배수: max(λ)·n·64·f64::EPSILON 이하이면 특이
pub const RANK_TOLERANCE_FACTOR: f64 = 64.0;

/// 대칭 고유값 분해 반복 상한
pub const MAX_EIGEN_ITERATIONS: usize = 10_000;

#[derive(Debug, Clone)]
pub struct WhiteningTransform {
    /// 새 화이트닝 행렬 U [n × n]
    pub matrix: Array2<f64>,
    /// U⁻¹
    pub inverse: Array2<f64>,
    /// Σ의 고유값 λ (ε 더하기 전)
    pub eigenvalues: Array1<f64>,
}

impl WhiteningTransform {
    /// Σ에서 화이트닝 변환 유도
    ///
    /// ε > 0이면 반올림으로 생긴 음의 고유값을 0으로 자른 λ+ε를 쓰므로
    /// 분산이 0인 방향이 있어도 실패하지 않는다. ε = 0이면 상대 허용 하한
    /// 이하의 고유값이나 대각 원소를 특이로 본다. NaN/Inf, 고유값 분해 실패,
    /// 역행렬 부재는 모두 `NumericalDegeneracy`로 전파한다.
    pub fn from_second_moment(sigma: &Array2<f64>, epsilon: f64, layer: usize) -> Result<Self> {
        let n = sigma.nrows();
        if sigma.ncols() != n {
            return Err(NaturalNetError::shape("2차 모멘트 행렬", &[n, n], sigma.shape()));
        }
        if let Some(value) = sigma.iter().find(|v| !v.is_finite()) {
            return Err(NaturalNetError::degenerate(
                layer,
                format!("2차 모멘트에 유한하지 않은 값 {value}"),
            ));
        }

        // 외적 평균이라 대칭이지만 부동소수점 오차를 대칭화로 제거
        let matrix = DMatrix::from_fn(n, n, |i, j| 0.5 * (sigma[[i, j]] + sigma[[j, i]]));
        let eigen = SymmetricEigen::try_new(matrix, f64::EPSILON, MAX_EIGEN_ITERATIONS)
            .ok_or_else(|| NaturalNetError::degenerate(layer, "대칭 고유값 분해가 수렴하지 않음"))?;

        let shifted = if epsilon > 0.0 {
            regularized_eigenvalues(eigen.eigenvalues.as_slice(), epsilon, layer)?
        } else {
            exact_eigenvalues(eigen.eigenvalues.as_slice(), sigma, layer)?
        };

        let mut whitening = eigen.eigenvectors;
        for (j, &value) in shifted.iter().enumerate() {
            whitening.column_mut(j).scale_mut(value.sqrt().recip());
        }
        let inverse = whitening
            .clone()
            .try_inverse()
            .filter(|m| m.iter().all(|v| v.is_finite()))
            .ok_or_else(|| NaturalNetError::degenerate(layer, "화이트닝 행렬이 가역이 아님"))?;

        Ok(Self {
            matrix: to_array(&whitening),
            inverse: to_array(&inverse),
            eigenvalues: eigen.eigenvalues.iter().copied().collect(),
        })
    }

    pub fn dim(&self) -> usize {
        self.matrix.nrows()
    }

    /// 최대/최소 고유값 (λ+ε 기준) 비
    pub fn condition_number(&self, epsilon: f64) -> f64 {
        let (min, max) = eigen_range(&self.eigenvalues);
        (max + epsilon) / (min + epsilon)
    }
}

/// ε > 0: max(λ, 0) + ε, 유한한 양수만 허용
fn regularized_eigenvalues(eigenvalues: &[f64], epsilon: f64, layer: usize) -> Result<Vec<f64>> {
    eigenvalues
        .iter()
        .enumerate()
        .map(|(index, &lambda)| {
            let value = lambda.max(0.0) + epsilon;
            if value.is_finite() && value > 0.0 {
                Ok(value)
            } else {
                Err(NaturalNetError::degenerate(
                    layer,
                    format!("고유값 {index}: λ+ε = {value:e}"),
                ))
            }
        })
        .collect()
}

/// ε = 0: 상대 허용 하한을 넘는 고유값과 대각 원소만 허용
fn exact_eigenvalues(eigenvalues: &[f64], sigma: &Array2<f64>, layer: usize) -> Result<Vec<f64>> {
    let n = eigenvalues.len();
    let largest = eigenvalues.iter().copied().fold(0.0_f64, f64::max);
    let tolerance = largest * n as f64 * RANK_TOLERANCE_FACTOR * f64::EPSILON;

    for (index, &value) in eigenvalues.iter().enumerate() {
        if !value.is_finite() || value <= tolerance {
            return Err(NaturalNetError::degenerate(
                layer,
                format!("고유값 {index}: λ = {value:e} (하한 {tolerance:e})"),
            ));
        }
    }
    // 대각 원소가 0이면 그 방향 에너지가 없음 (죽은 유닛)
    for j in 0..n {
        let diagonal = sigma[[j, j]];
        if diagonal <= tolerance {
            return Err(NaturalNetError::degenerate(
                layer,
                format!("특징 {j}의 2차 모멘트 = {diagonal:e}"),
            ));
        }
    }
    Ok(eigenvalues.to_vec())
}

/// (최소, 최대) 고유값
pub fn eigen_range(eigenvalues: &Array1<f64>) -> (f64, f64) {
    eigenvalues
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)))
}

fn to_array(matrix: &DMatrix<f64>) -> Array2<f64> {
    Array2::from_shape_fn((matrix.nrows(), matrix.ncols()), |(i, j)| matrix[(i, j)])
}
