//! NaturalNet 진입점 테스트

use crate::core::error::NaturalNetError;
use crate::core::network::NaturalNet;
use crate::core::params::{LayerKind, ParamKind};
use crate::core::systems::{ConvSettings, Initializer, NaturalNetConfig};
use ndarray::{Array2, Array3, Array4};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn 밀집_네트워크_생성_테스트() {
        let net = NaturalNet::dense(&[4, 3, 2], 4, 1e-3).unwrap();
        let params = net.params();

        assert_eq!(net.num_layers(), 3);
        assert_eq!(net.epsilon(), 1e-3);
        assert_eq!(params.num_layers(), 3);
        assert_eq!(params.get(1, ParamKind::V).unwrap().shape(), &[4, 4]);
        assert!(params.get(1, ParamKind::U).is_err());
        assert!(params.get(1, ParamKind::C).is_err());

        for (layer, inputs, outputs) in [(2, 4, 3), (3, 3, 2)] {
            let dense = params.dense(layer).unwrap();
            let whitening = dense.whitening.as_ref().unwrap();
            assert_eq!(dense.v.dim(), (inputs, outputs));
            assert_eq!(whitening.u, Array2::<f64>::eye(inputs));
            assert!(whitening.c.iter().all(|v| *v == 0.0));
            assert!(dense.d.iter().all(|v| *v == 0.0));
        }

        println!("✅ 밀집 네트워크 생성 테스트 통과");
    }

    #[test]
    fn 합성곱_네트워크_생성_테스트() {
        let settings = ConvSettings {
            height: 12,
            width: 10,
            channels: 3,
            kernel_size: 5,
            stride: 1,
            dense_hidden: 16,
            num_classes: 4,
        };
        let net = NaturalNet::new(NaturalNetConfig::conv(&[8, 6], settings, 1e-3)).unwrap();
        let params = net.params();

        // 합성곱 2개 + 머리 밀집 2개
        assert_eq!(params.num_layers(), 4);
        assert_eq!(net.num_layers(), 2);
        assert_eq!(params.get(1, ParamKind::V).unwrap().shape(), &[5, 5, 3, 8]);
        assert_eq!(params.get(1, ParamKind::D).unwrap().shape(), &[8]);
        assert_eq!(params.get(2, ParamKind::U).unwrap().shape(), &[1, 1, 8, 8]);
        assert_eq!(params.get(2, ParamKind::V).unwrap().shape(), &[5, 5, 8, 6]);
        assert!(params.get(2, ParamKind::D).is_err());
        assert!(params.get(2, ParamKind::C).is_err());

        // 12×10 → 6×5 → 3×3, 3·3·6
        assert_eq!(params.get(3, ParamKind::V).unwrap().shape(), &[54, 16]);
        assert_eq!(params.get(4, ParamKind::V).unwrap().shape(), &[16, 4]);
        assert_eq!(params.layer(3).unwrap().kind(), LayerKind::Dense);

        println!("✅ 합성곱 네트워크 생성 테스트 통과");
    }

    #[test]
    fn 시드_결정성_테스트() {
        let config = NaturalNetConfig::dense(&[4, 3], 2, 1e-3).with_seed(123);
        let a = NaturalNet::new(config.clone()).unwrap();
        let b = NaturalNet::new(config).unwrap();
        let c = NaturalNet::new(NaturalNetConfig::dense(&[4, 3], 2, 1e-3).with_seed(124)).unwrap();

        assert_eq!(a.params().dense(2).unwrap().v, b.params().dense(2).unwrap().v);
        assert_ne!(a.params().dense(2).unwrap().v, c.params().dense(2).unwrap().v);

        println!("✅ 시드 결정성 테스트 통과");
    }

    #[test]
    fn 잘못된_설정_생성_거부_테스트() {
        assert!(matches!(
            NaturalNet::dense(&[], 4, 1e-3),
            Err(NaturalNetError::Configuration(_))
        ));
        assert!(matches!(
            NaturalNet::dense(&[4, 3], 4, -0.5),
            Err(NaturalNetError::Configuration(_))
        ));
        let constant = NaturalNetConfig::dense(&[2], 2, 1e-3)
            .with_initializer(Initializer::Constant { value: f64::INFINITY });
        assert!(NaturalNet::new(constant).is_err());

        println!("✅ 잘못된 설정 생성 거부 테스트 통과");
    }

    #[test]
    fn 동적_입력_분기_테스트() {
        let mut net = NaturalNet::dense(&[4, 3, 2], 4, 1e-3).unwrap();
        let x = Array2::from_shape_fn((8, 4), |(i, j)| (i as f64 - 3.5) * 0.3 + j as f64);

        let direct = net.inference(&x).unwrap();
        let dynamic = net.forward(x.view().into_dyn()).unwrap();
        assert_eq!(direct.output, dynamic.output);

        let wrong_rank = Array3::<f64>::zeros((8, 4, 1));
        match net.forward(wrong_rank.view().into_dyn()) {
            Err(NaturalNetError::ShapeMismatch { expected, actual, .. }) => {
                assert_eq!(expected, vec![8, 4]);
                assert_eq!(actual, vec![8, 4, 1]);
            }
            other => panic!("ShapeMismatch를 기대했지만 {other:?}"),
        }
        assert!(net.reparam_op(wrong_rank.view().into_dyn()).is_err());
        assert!(net.reparam_op(x.view().into_dyn()).is_ok());

        println!("✅ 동적 입력 분기 테스트 통과");
    }

    #[test]
    fn 합성곱_동적_입력_테스트() {
        let settings = ConvSettings {
            height: 4,
            width: 4,
            channels: 1,
            kernel_size: 3,
            stride: 1,
            dense_hidden: 3,
            num_classes: 2,
        };
        let net = NaturalNet::new(NaturalNetConfig::conv(&[2, 2], settings, 1e-3)).unwrap();
        let x = Array4::from_shape_fn((2, 4, 4, 1), |(n, y, x, _)| (n + y + x) as f64 * 0.1);

        let out = net.forward(x.view().into_dyn()).unwrap();
        assert_eq!(out.output.dim(), (2, 2));
        assert!(net.forward(Array2::<f64>::zeros((2, 16)).view().into_dyn()).is_err());

        println!("✅ 합성곱 동적 입력 테스트 통과");
    }
}
