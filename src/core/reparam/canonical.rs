//! 정준 파라미터
//!
//! U/V 분해와 무관한 합성 사상 (W, b)

use crate::core::error::{NaturalNetError, Result};
use ndarray::{s, Array1, Array2, Array4};

/// 밀집: W = U·V, b = d - c·W
pub fn canonical_dense(
    u: &Array2<f64>,
    v: &Array2<f64>,
    c: &Array1<f64>,
    d: &Array1<f64>,
) -> (Array2<f64>, Array1<f64>) {
    let w = u.dot(v);
    let b = d - &c.dot(&w);
    (w, b)
}

/// 커널 [kh, kw, in_c, out_c]의 모든 탭에 같은 행렬 M [m × in_c]을 왼쪽에서 곱함
///
/// 결과는 [kh, kw, m, out_c]. 합성곱 정준 가중치 W = U·V와 V 복원 U⁻¹·W에 쓴다.
pub fn left_multiply_taps(matrix: &Array2<f64>, kernel: &Array4<f64>) -> Result<Array4<f64>> {
    let (kh, kw, in_channels, out_channels) = kernel.dim();
    if matrix.ncols() != in_channels {
        return Err(NaturalNetError::shape(
            "탭별 행렬곱",
            &[matrix.ncols()],
            &[in_channels],
        ));
    }
    let mut product = Array4::zeros((kh, kw, matrix.nrows(), out_channels));
    for ky in 0..kh {
        for kx in 0..kw {
            let tap = kernel.slice(s![ky, kx, .., ..]);
            product.slice_mut(s![ky, kx, .., ..]).assign(&matrix.dot(&tap));
        }
    }
    Ok(product)
}
