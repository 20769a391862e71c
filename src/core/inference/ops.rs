//! 순전파 텐서 연산
//!
//! NHWC 레이아웃 기준 SAME 합성곱, 2×2 최대 풀링, (화이트닝) 아핀 변환

use crate::core::error::{NaturalNetError, Result};
use ndarray::{Array, Array1, Array2, Array3, Array4, ArrayView2, ArrayView4, Axis, Dimension};
use rayon::prelude::*;

/// 풀링 창 크기이자 stride
pub const POOL_SIZE: usize = 2;

pub fn relu<D: Dimension>(x: Array<f64, D>) -> Array<f64, D> {
    x.mapv_into(|v| v.max(0.0))
}

/// x·W + b
pub fn affine(x: ArrayView2<'_, f64>, w: &Array2<f64>, b: &Array1<f64>) -> Result<Array2<f64>> {
    if x.ncols() != w.nrows() {
        return Err(NaturalNetError::shape("아핀 입력 폭", &[w.nrows()], &[x.ncols()]));
    }
    if b.len() != w.ncols() {
        return Err(NaturalNetError::shape("아핀 편향", &[w.ncols()], &[b.len()]));
    }
    Ok(x.dot(w) + b)
}

/// (x - c)·(U·V) + d
pub fn whitened_affine(
    x: ArrayView2<'_, f64>,
    c: &Array1<f64>,
    u: &Array2<f64>,
    v: &Array2<f64>,
    d: &Array1<f64>,
) -> Result<Array2<f64>> {
    if c.len() != x.ncols() || u.dim() != (x.ncols(), x.ncols()) {
        return Err(NaturalNetError::shape(
            "화이트닝 파라미터",
            &[x.ncols(), x.ncols()],
            u.shape(),
        ));
    }
    let centered = &x - c;
    affine(centered.view(), &u.dot(v), d)
}

/// SAME 패딩: (출력 크기, 앞쪽 패딩)
pub fn same_padding(input: usize, kernel: usize, stride: usize) -> (usize, usize) {
    let output = input.div_ceil(stride);
    let needed = ((output.saturating_sub(1)) * stride + kernel).saturating_sub(input);
    (output, needed / 2)
}

/// SAME 패딩 2D 합성곱 (im2col 후 GEMM)
///
/// input: [batch, h, w, in_c], kernel: [kh, kw, in_c, out_c]
pub fn conv2d_same(
    input: ArrayView4<'_, f64>,
    kernel: &Array4<f64>,
    stride: usize,
) -> Result<Array4<f64>> {
    let (batch, height, width, in_channels) = input.dim();
    let (kh, kw, kernel_in, out_channels) = kernel.dim();
    if kernel_in != in_channels {
        return Err(NaturalNetError::shape(
            "합성곱 입력 채널",
            &[kernel_in],
            &[in_channels],
        ));
    }
    if stride == 0 {
        return Err(NaturalNetError::Configuration("stride가 0".to_string()));
    }
    let (out_h, pad_top) = same_padding(height, kh, stride);
    let (out_w, pad_left) = same_padding(width, kw, stride);
    let patch = kh * kw * in_channels;

    let mut columns = Array3::<f64>::zeros((batch, out_h * out_w, patch));
    columns
        .axis_iter_mut(Axis(0))
        .into_par_iter()
        .enumerate()
        .for_each(|(n, mut rows)| {
            let image = input.index_axis(Axis(0), n);
            for oy in 0..out_h {
                for ox in 0..out_w {
                    let mut row = rows.row_mut(oy * out_w + ox);
                    for ky in 0..kh {
                        let iy = (oy * stride + ky) as isize - pad_top as isize;
                        if iy < 0 || iy as usize >= height {
                            continue;
                        }
                        for kx in 0..kw {
                            let ix = (ox * stride + kx) as isize - pad_left as isize;
                            if ix < 0 || ix as usize >= width {
                                continue;
                            }
                            let offset = (ky * kw + kx) * in_channels;
                            for ch in 0..in_channels {
                                row[offset + ch] = image[[iy as usize, ix as usize, ch]];
                            }
                        }
                    }
                }
            }
        });

    // 커널 [kh, kw, in_c, out_c]를 행 우선으로 펼치면 im2col 열 순서와 일치
    let weights = Array2::from_shape_vec((patch, out_channels), kernel.iter().copied().collect())
        .map_err(|_| NaturalNetError::shape("합성곱 커널", &[patch, out_channels], kernel.shape()))?;
    let columns = columns
        .into_shape((batch * out_h * out_w, patch))
        .map_err(|_| NaturalNetError::shape("im2col", &[batch * out_h * out_w, patch], &[]))?;
    columns
        .dot(&weights)
        .into_shape((batch, out_h, out_w, out_channels))
        .map_err(|_| {
            NaturalNetError::shape("합성곱 출력", &[batch, out_h, out_w, out_channels], &[])
        })
}

/// 1×1 화이트닝 합성곱 (stride 1): 모든 위치에 같은 c×c 행렬을 적용
pub fn conv1x1(input: ArrayView4<'_, f64>, whitening: &Array4<f64>) -> Result<Array4<f64>> {
    let (batch, height, width, channels) = input.dim();
    let matrix = squeeze_whitening(whitening)?;
    if matrix.nrows() != channels {
        return Err(NaturalNetError::shape(
            "1×1 화이트닝 입력 채널",
            &[matrix.nrows()],
            &[channels],
        ));
    }
    let out_channels = matrix.ncols();
    collapse_spatial(input)
        .dot(&matrix)
        .into_shape((batch, height, width, out_channels))
        .map_err(|_| NaturalNetError::shape("1×1 합성곱 출력", &[batch, height, width, out_channels], &[]))
}

/// [1, 1, c, c] 커널을 c×c 행렬로
pub fn squeeze_whitening(kernel: &Array4<f64>) -> Result<Array2<f64>> {
    let (kh, kw, rows, cols) = kernel.dim();
    if kh != 1 || kw != 1 || rows != cols {
        return Err(NaturalNetError::shape(
            "1×1 화이트닝 커널",
            &[1, 1, rows, rows],
            kernel.shape(),
        ));
    }
    Ok(kernel.index_axis(Axis(0), 0).index_axis(Axis(0), 0).to_owned())
}

/// 채널별 편향 더하기
pub fn add_channel_bias(x: Array4<f64>, bias: &Array1<f64>) -> Result<Array4<f64>> {
    let channels = x.dim().3;
    if bias.len() != channels {
        return Err(NaturalNetError::shape("채널 편향", &[channels], &[bias.len()]));
    }
    Ok(x + bias)
}

/// 2×2, stride 2, SAME 최대 풀링 (패딩 위치는 최댓값 후보에서 제외)
pub fn max_pool_2x2(input: ArrayView4<'_, f64>) -> Array4<f64> {
    let (batch, height, width, channels) = input.dim();
    let out_h = height.div_ceil(POOL_SIZE);
    let out_w = width.div_ceil(POOL_SIZE);
    Array4::from_shape_fn((batch, out_h, out_w, channels), |(n, oy, ox, ch)| {
        let mut best = f64::NEG_INFINITY;
        for y in oy * POOL_SIZE..((oy + 1) * POOL_SIZE).min(height) {
            for x in ox * POOL_SIZE..((ox + 1) * POOL_SIZE).min(width) {
                best = best.max(input[[n, y, x, ch]]);
            }
        }
        best
    })
}

/// [batch, h, w, c] → [batch·h·w, c]: 모든 공간 위치를 독립 관측으로
pub fn collapse_spatial(input: ArrayView4<'_, f64>) -> Array2<f64> {
    let (batch, height, width, channels) = input.dim();
    let plane = height * width;
    Array2::from_shape_fn((batch * plane, channels), |(row, ch)| {
        input[[row / plane, (row % plane) / width, row % width, ch]]
    })
}

/// [batch, h, w, c] → [batch, h·w·c]
pub fn flatten(input: ArrayView4<'_, f64>) -> Array2<f64> {
    let (batch, height, width, channels) = input.dim();
    let row_width = width * channels;
    Array2::from_shape_fn((batch, height * row_width), |(n, feature)| {
        input[[n, feature / row_width, (feature % row_width) / channels, feature % channels]]
    })
}
