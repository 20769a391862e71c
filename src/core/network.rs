//! # 자연 신경망
//!
//! 파라미터 저장소를 소유하고 순전파와 재매개변수화를 노출하는 진입점

use crate::core::error::{NaturalNetError, Result};
use crate::core::inference::{ForwardEngine, ForwardOutput};
use crate::core::params::{
    conv_identity_whitening, ConvParams, DenseParams, DenseWhitening, LayerParams, ParameterStore,
};
use crate::core::reparam::{diagnose, ReparamEngine, ReparamReport, WhiteningDiagnostic};
use crate::core::systems::{Architecture, ConvSettings, NaturalNetConfig};
use ndarray::{Array1, Array2, Array4, ArrayViewD, Ix2, Ix4};
use rand::rngs::StdRng;
use rand::SeedableRng;

#[derive(Debug, Clone)]
pub struct NaturalNet {
    config: NaturalNetConfig,
    store: ParameterStore,
}

impl NaturalNet {
    /// 설정 검증 후 파라미터 생성 (화이트닝은 항등/영, V는 초기화 전략, d는 영)
    pub fn new(config: NaturalNetConfig) -> Result<Self> {
        config.validate()?;
        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut store = ParameterStore::new();
        let sizes = &config.layer_sizes;

        match &config.architecture {
            Architecture::Dense { input_dim } => {
                store.push(LayerParams::Dense(DenseParams {
                    v: config.initializer.matrix(*input_dim, sizes[0], &mut rng)?,
                    d: Array1::zeros(sizes[0]),
                    whitening: None,
                }));
                for i in 2..=sizes.len() {
                    store.push(whitened_dense_layer(&config, sizes[i - 2], sizes[i - 1], &mut rng)?);
                }
            }
            Architecture::Conv(settings) => {
                let k = settings.kernel_size;
                store.push(LayerParams::Conv(ConvParams {
                    v: config.initializer.kernel(k, settings.channels, sizes[0], &mut rng)?,
                    d: Some(Array1::zeros(sizes[0])),
                    u: None,
                }));
                for i in 2..=sizes.len() {
                    store.push(LayerParams::Conv(ConvParams {
                        v: config.initializer.kernel(k, sizes[i - 2], sizes[i - 1], &mut rng)?,
                        d: None,
                        u: Some(conv_identity_whitening(sizes[i - 2])),
                    }));
                }
                let flat = settings.flattened_dim(sizes);
                store.push(whitened_dense_layer(&config, flat, settings.dense_hidden, &mut rng)?);
                store.push(whitened_dense_layer(
                    &config,
                    settings.dense_hidden,
                    settings.num_classes,
                    &mut rng,
                )?);
            }
        }

        let count = store.parameter_count();
        log::info!(
            "자연 신경망 생성: {:?}, 레이어 {}개, 학습 파라미터 {}, 화이트닝 파라미터 {}",
            sizes,
            store.num_layers(),
            count.trainable,
            count.whitening
        );
        Ok(Self { config, store })
    }

    /// 밀집 네트워크 간편 생성
    pub fn dense(layer_sizes: &[usize], input_dim: usize, epsilon: f64) -> Result<Self> {
        Self::new(NaturalNetConfig::dense(layer_sizes, input_dim, epsilon))
    }

    pub fn config(&self) -> &NaturalNetConfig {
        &self.config
    }

    pub fn params(&self) -> &ParameterStore {
        &self.store
    }

    pub fn params_mut(&mut self) -> &mut ParameterStore {
        &mut self.store
    }

    /// 재매개변수화되는 레이어 수 (layer_sizes 길이)
    pub fn num_layers(&self) -> usize {
        self.config.num_layers()
    }

    pub fn epsilon(&self) -> f64 {
        self.config.epsilon
    }

    /// 밀집 순전파, x: [batch, input_dim]
    pub fn inference(&self, x: &Array2<f64>) -> Result<ForwardOutput> {
        if self.config.is_conv() {
            return Err(NaturalNetError::Configuration(
                "합성곱 네트워크에는 conv_inference를 사용".to_string(),
            ));
        }
        ForwardEngine::new(&self.store).infer_dense(x.view(), &self.config.layer_sizes)
    }

    /// 합성곱 순전파, x: [batch, height, width, channels]
    pub fn conv_inference(&self, x: &Array4<f64>) -> Result<ForwardOutput> {
        let settings = self.conv_settings()?;
        ForwardEngine::new(&self.store).infer_conv(x.view(), &self.config.layer_sizes, settings)
    }

    /// 아키텍처에 맞춰 순전파 (입력 차원 수 검사 포함)
    pub fn forward(&self, x: ArrayViewD<'_, f64>) -> Result<ForwardOutput> {
        let engine = ForwardEngine::new(&self.store);
        let mut expected = vec![x.shape().first().copied().unwrap_or(0)];
        expected.extend(self.config.sample_shape());
        let mismatch = || NaturalNetError::shape("네트워크 입력", &expected, x.shape());

        match &self.config.architecture {
            Architecture::Dense { .. } => {
                let x = x.view().into_dimensionality::<Ix2>().map_err(|_| mismatch())?;
                engine.infer_dense(x, &self.config.layer_sizes)
            }
            Architecture::Conv(settings) => {
                let x = x.view().into_dimensionality::<Ix4>().map_err(|_| mismatch())?;
                engine.infer_conv(x, &self.config.layer_sizes, settings)
            }
        }
    }

    /// 샘플 배치로 모든 화이트닝 레이어를 재매개변수화
    ///
    /// 은닉 상태는 갱신 전에 한 번의 순전파로 모두 얻는다. 실현 함수는
    /// 부동소수점 오차와 ε 범위 안에서 변하지 않는다.
    pub fn reparam_op(&mut self, samples: ArrayViewD<'_, f64>) -> Result<ReparamReport> {
        let ForwardOutput { hidden_states, .. } = self.forward(samples)?;
        let num_layers = self.num_layers();
        let engine = ReparamEngine::new(self.config.epsilon, self.config.statistics);
        let report = engine.reparameterize(&mut self.store, &hidden_states, num_layers)?;
        log::info!(
            "재매개변수화 완료: 레이어 {}개, 최대 조건수 {:.3e}",
            report.layers(),
            report.worst_condition(self.config.epsilon)
        );
        Ok(report)
    }

    /// 현재 화이트닝 파라미터가 샘플 배치를 얼마나 화이트닝하는지
    pub fn whitening_diagnostics(&self, samples: ArrayViewD<'_, f64>) -> Result<Vec<WhiteningDiagnostic>> {
        let ForwardOutput { hidden_states, .. } = self.forward(samples)?;
        diagnose(&self.store, &hidden_states, self.num_layers(), self.config.statistics)
    }

    fn conv_settings(&self) -> Result<&ConvSettings> {
        match &self.config.architecture {
            Architecture::Conv(settings) => Ok(settings),
            Architecture::Dense { .. } => Err(NaturalNetError::Configuration(
                "밀집 네트워크에는 inference를 사용".to_string(),
            )),
        }
    }
}

fn whitened_dense_layer(
    config: &NaturalNetConfig,
    input_dim: usize,
    output_dim: usize,
    rng: &mut StdRng,
) -> Result<LayerParams> {
    Ok(LayerParams::Dense(DenseParams {
        v: config.initializer.matrix(input_dim, output_dim, rng)?,
        d: Array1::zeros(output_dim),
        whitening: Some(DenseWhitening::identity(input_dim)),
    }))
}
