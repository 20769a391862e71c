//! # 구성 설정 단위테스트
//!
//! NaturalNetConfig 기본값, 검증 규칙, JSON 입출력 검증

use crate::core::error::NaturalNetError;
use crate::core::systems::config::{
    Architecture, ConvSettings, Initializer, NaturalNetConfig, StatisticsMode,
};

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn assert_configuration_error(config: &NaturalNetConfig) {
        match config.validate() {
            Err(NaturalNetError::Configuration(message)) => {
                println!("   거부 사유: {message}");
            }
            other => panic!("Configuration 오류를 기대했지만 {other:?}"),
        }
    }

    #[test]
    fn 설정_기본값_테스트() {
        let config = NaturalNetConfig::default();

        assert_eq!(config.layer_sizes, vec![4, 3, 2]);
        assert_eq!(config.epsilon, 1e-3);
        assert_eq!(config.initializer, Initializer::Xavier);
        assert_eq!(config.statistics, StatisticsMode::Uncentered);
        assert_eq!(config.architecture, Architecture::Dense { input_dim: 4 });
        assert!(!config.is_conv());
        assert_eq!(config.num_layers(), 3);
        assert_eq!(config.sample_shape(), vec![4]);
        assert!(config.validate().is_ok());

        println!("✅ 설정 기본값 테스트 통과");
    }

    #[test]
    fn 합성곱_설정_테스트() {
        let config = NaturalNetConfig::conv(&[32, 64], ConvSettings::default(), 1e-3);

        assert!(config.is_conv());
        assert_eq!(config.sample_shape(), vec![28, 28, 1]);
        // 28 → 풀링 14 → 풀링 7, 7·7·64
        assert_eq!(ConvSettings::default().flattened_dim(&config.layer_sizes), 7 * 7 * 64);
        assert!(config.validate().is_ok());

        println!("✅ 합성곱 설정 테스트 통과");
    }

    #[test]
    fn 평탄화_크기_stride_테스트() {
        let settings = ConvSettings {
            height: 9,
            width: 6,
            stride: 2,
            ..ConvSettings::default()
        };
        // 높이: 9 → 풀링 5 → stride 3 → 풀링 2
        // 너비: 6 → 풀링 3 → stride 2 → 풀링 1
        assert_eq!(settings.flattened_dim(&[3, 5]), 2 * 1 * 5);

        println!("✅ 평탄화 크기 stride 테스트 통과");
    }

    #[test]
    fn 잘못된_설정_거부_테스트() {
        assert_configuration_error(&NaturalNetConfig::dense(&[], 4, 1e-3));
        assert_configuration_error(&NaturalNetConfig::dense(&[4, 0, 2], 4, 1e-3));
        assert_configuration_error(&NaturalNetConfig::dense(&[4, 3], 0, 1e-3));
        assert_configuration_error(&NaturalNetConfig::dense(&[4, 3], 4, -1e-3));
        assert_configuration_error(&NaturalNetConfig::dense(&[4, 3], 4, f64::NAN));
        assert_configuration_error(
            &NaturalNetConfig::dense(&[4, 3], 4, 1e-3)
                .with_initializer(Initializer::Normal { std: 0.0 }),
        );
        assert_configuration_error(&NaturalNetConfig::conv(
            &[4],
            ConvSettings {
                kernel_size: 0,
                ..ConvSettings::default()
            },
            1e-3,
        ));

        println!("✅ 잘못된 설정 거부 테스트 통과");
    }

    #[test]
    fn 엡실론_0_허용_테스트() {
        let config = NaturalNetConfig::dense(&[4, 3, 2], 4, 0.0);
        assert!(config.validate().is_ok());

        println!("✅ ε = 0 허용 테스트 통과");
    }

    #[test]
    fn JSON_왕복_테스트() {
        let config = NaturalNetConfig::dense(&[8, 6, 3], 5, 1e-2)
            .with_seed(7)
            .with_statistics(StatisticsMode::Centered)
            .with_initializer(Initializer::Normal { std: 0.1 });

        let text = config.to_json_string().unwrap();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();

        let loaded = NaturalNetConfig::from_json_file(file.path()).unwrap();
        assert_eq!(loaded, config);

        println!("✅ JSON 왕복 테스트 통과");
        println!("{text}");
    }

    #[test]
    fn JSON_부분_설정_기본값_채움_테스트() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "layer_sizes": [16, 8], "architecture": {{ "kind": "conv", "height": 12, "width": 12 }} }}"#
        )
        .unwrap();

        let loaded = NaturalNetConfig::from_json_file(file.path()).unwrap();
        assert_eq!(loaded.layer_sizes, vec![16, 8]);
        assert_eq!(loaded.epsilon, 1e-3);
        match loaded.architecture {
            Architecture::Conv(settings) => {
                assert_eq!((settings.height, settings.width), (12, 12));
                assert_eq!(settings.kernel_size, 5);
                assert_eq!(settings.num_classes, 10);
            }
            other => panic!("합성곱 아키텍처를 기대했지만 {other:?}"),
        }

        println!("✅ JSON 부분 설정 테스트 통과");
    }

    #[test]
    fn JSON_검증_실패_테스트() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "layer_sizes": [], "epsilon": 0.001 }}"#).unwrap();
        assert!(matches!(
            NaturalNetConfig::from_json_file(file.path()),
            Err(NaturalNetError::Configuration(_))
        ));

        let missing = NaturalNetConfig::from_json_file("/nonexistent/natural_net.json");
        assert!(matches!(missing, Err(NaturalNetError::Io(_))));

        let mut broken = tempfile::NamedTempFile::new().unwrap();
        write!(broken, "{{ not json").unwrap();
        assert!(matches!(
            NaturalNetConfig::from_json_file(broken.path()),
            Err(NaturalNetError::Json(_))
        ));

        println!("✅ JSON 검증 실패 테스트 통과");
    }
}
