//! # 네트워크 구성 설정
//!
//! 레이어 크기, 안정화 상수, 초기화 전략, 아키텍처(밀집/합성곱)와
//! 통계 추정 방식을 묶는 설정 구조체들

use crate::core::error::{NaturalNetError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// 학습 가능 가중치(V) 초기화 전략
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Initializer {
    /// Glorot 균등 분포 U(-√(6/(fan_in+fan_out)), +√(6/(fan_in+fan_out)))
    Xavier,
    /// N(0, std²)
    Normal { std: f64 },
    /// 모든 원소를 같은 값으로
    Constant { value: f64 },
}

/// 화이트닝할 2차 모멘트 추정 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatisticsMode {
    /// E[h·hᵗ] (비중심 2차 모멘트)
    Uncentered,
    /// E[(h-μ)·(h-μ)ᵗ] (공분산)
    Centered,
}

/// 합성곱 아키텍처 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvSettings {
    /// 입력 이미지 높이
    pub height: usize,
    /// 입력 이미지 너비
    pub width: usize,
    /// 입력 채널 수
    pub channels: usize,
    /// 학습 가능 합성곱 커널 크기 (k×k)
    pub kernel_size: usize,
    /// 2번째 이후 합성곱 레이어의 stride
    pub stride: usize,
    /// 평탄화 뒤 첫 밀집 레이어 폭
    pub dense_hidden: usize,
    /// 출력 클래스 수
    pub num_classes: usize,
}

/// 네트워크 토폴로지
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Architecture {
    /// 완전 연결 네트워크, 입력은 [batch, input_dim]
    Dense { input_dim: usize },
    /// 합성곱 네트워크, 입력은 [batch, height, width, channels]
    Conv(ConvSettings),
}

/// 자연 신경망 전체 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NaturalNetConfig {
    /// 은닉 레이어 폭들 (마지막은 출력 폭; 합성곱이면 채널 수)
    pub layer_sizes: Vec<usize>,
    /// 고유값 안정화 상수 ε
    pub epsilon: f64,
    /// 가중치 초기화
    pub initializer: Initializer,
    /// 아키텍처
    pub architecture: Architecture,
    /// 2차 모멘트 추정 방식
    pub statistics: StatisticsMode,
    /// 초기화 난수 시드
    pub seed: u64,
}

// Default 구현들

impl Default for Initializer {
    fn default() -> Self {
        Initializer::Xavier
    }
}

impl Default for StatisticsMode {
    fn default() -> Self {
        StatisticsMode::Uncentered
    }
}

impl Default for ConvSettings {
    fn default() -> Self {
        Self {
            height: 28,
            width: 28,
            channels: 1,
            kernel_size: 5,
            stride: 1,
            dense_hidden: 1024,
            num_classes: 10,
        }
    }
}

impl Default for Architecture {
    fn default() -> Self {
        Architecture::Dense { input_dim: 4 }
    }
}

impl Default for NaturalNetConfig {
    fn default() -> Self {
        Self {
            layer_sizes: vec![4, 3, 2],
            epsilon: 1e-3,
            initializer: Initializer::default(),
            architecture: Architecture::default(),
            statistics: StatisticsMode::default(),
            seed: 42,
        }
    }
}

impl ConvSettings {
    /// 첫 합성곱과 풀링을 거친 뒤 평탄화되는 특징 수
    pub fn flattened_dim(&self, layer_sizes: &[usize]) -> usize {
        let (mut height, mut width) = (self.height, self.width);
        for layer in 1..=layer_sizes.len() {
            let stride = if layer == 1 { 1 } else { self.stride };
            height = pooled_extent(height.div_ceil(stride));
            width = pooled_extent(width.div_ceil(stride));
        }
        height * width * layer_sizes.last().copied().unwrap_or(0)
    }
}

/// 2×2, stride 2 SAME 풀링 후 크기
fn pooled_extent(extent: usize) -> usize {
    extent.div_ceil(2)
}

impl NaturalNetConfig {
    /// 밀집 네트워크 설정
    pub fn dense(layer_sizes: &[usize], input_dim: usize, epsilon: f64) -> Self {
        Self {
            layer_sizes: layer_sizes.to_vec(),
            epsilon,
            architecture: Architecture::Dense { input_dim },
            ..Self::default()
        }
    }

    /// 합성곱 네트워크 설정
    pub fn conv(layer_sizes: &[usize], settings: ConvSettings, epsilon: f64) -> Self {
        Self {
            layer_sizes: layer_sizes.to_vec(),
            epsilon,
            architecture: Architecture::Conv(settings),
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_statistics(mut self, statistics: StatisticsMode) -> Self {
        self.statistics = statistics;
        self
    }

    pub fn with_initializer(mut self, initializer: Initializer) -> Self {
        self.initializer = initializer;
        self
    }

    pub fn is_conv(&self) -> bool {
        matches!(self.architecture, Architecture::Conv(_))
    }

    /// 재매개변수화 대상 레이어 수 (입력 레이어 포함)
    pub fn num_layers(&self) -> usize {
        self.layer_sizes.len()
    }

    /// 샘플 하나의 입력 형상 (배치 축 제외)
    pub fn sample_shape(&self) -> Vec<usize> {
        match &self.architecture {
            Architecture::Dense { input_dim } => vec![*input_dim],
            Architecture::Conv(settings) => {
                vec![settings.height, settings.width, settings.channels]
            }
        }
    }

    /// 생성 인자 검증
    pub fn validate(&self) -> Result<()> {
        if self.layer_sizes.is_empty() {
            return Err(NaturalNetError::Configuration(
                "layer_sizes가 비어 있음".to_string(),
            ));
        }
        if let Some(position) = self.layer_sizes.iter().position(|&size| size == 0) {
            return Err(NaturalNetError::Configuration(format!(
                "layer_sizes[{position}]가 0"
            )));
        }
        // ε = 0은 허용: 퇴화 배치가 재매개변수화 시점에 드러나도록
        if !self.epsilon.is_finite() || self.epsilon < 0.0 {
            return Err(NaturalNetError::Configuration(format!(
                "epsilon은 0 이상의 유한값이어야 함: {}",
                self.epsilon
            )));
        }
        match self.initializer {
            Initializer::Normal { std } if !(std.is_finite() && std > 0.0) => {
                return Err(NaturalNetError::Configuration(format!(
                    "정규 초기화 표준편차가 잘못됨: {std}"
                )));
            }
            Initializer::Constant { value } if !value.is_finite() => {
                return Err(NaturalNetError::Configuration(format!(
                    "상수 초기화 값이 유한하지 않음: {value}"
                )));
            }
            _ => {}
        }
        match &self.architecture {
            Architecture::Dense { input_dim } => {
                if *input_dim == 0 {
                    return Err(NaturalNetError::Configuration(
                        "input_dim이 0".to_string(),
                    ));
                }
            }
            Architecture::Conv(settings) => {
                let fields = [
                    ("height", settings.height),
                    ("width", settings.width),
                    ("channels", settings.channels),
                    ("kernel_size", settings.kernel_size),
                    ("stride", settings.stride),
                    ("dense_hidden", settings.dense_hidden),
                    ("num_classes", settings.num_classes),
                ];
                if let Some((name, _)) = fields.iter().find(|(_, value)| *value == 0) {
                    return Err(NaturalNetError::Configuration(format!(
                        "합성곱 설정 {name}이 0"
                    )));
                }
            }
        }
        Ok(())
    }

    /// JSON 설정 파일 로드 (검증 포함)
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
