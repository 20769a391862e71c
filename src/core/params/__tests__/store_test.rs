//! 파라미터 저장소 단위테스트

use crate::core::error::NaturalNetError;
use crate::core::params::{
    conv_identity_whitening, ConvParams, DenseParams, DenseWhitening, LayerKind, LayerParams,
    ParamKind, ParameterStore,
};
use ndarray::{Array1, Array2, Array4};

#[cfg(test)]
mod tests {
    use super::*;

    fn two_layer_store() -> ParameterStore {
        let mut store = ParameterStore::new();
        store.push(LayerParams::Dense(DenseParams {
            v: Array2::ones((4, 3)),
            d: Array1::zeros(3),
            whitening: None,
        }));
        store.push(LayerParams::Dense(DenseParams {
            v: Array2::ones((3, 2)),
            d: Array1::zeros(2),
            whitening: Some(DenseWhitening::identity(3)),
        }));
        store
    }

    #[test]
    fn 인덱스_조회_테스트() {
        let store = two_layer_store();

        assert_eq!(store.num_layers(), 2);
        assert_eq!(store.get(1, ParamKind::V).unwrap().shape(), &[4, 3]);
        assert_eq!(store.get(2, ParamKind::U).unwrap().shape(), &[3, 3]);
        assert_eq!(store.get(2, ParamKind::C).unwrap().shape(), &[3]);
        assert!(!store.layer(1).unwrap().is_whitened());
        assert!(store.layer(2).unwrap().is_whitened());
        assert_eq!(store.layer(2).unwrap().kind(), LayerKind::Dense);

        let indices: Vec<usize> = store.iter().map(|(index, _)| index).collect();
        assert_eq!(indices, vec![1, 2]);

        println!("✅ 인덱스 조회 테스트 통과");
    }

    #[test]
    fn 없는_레이어_파라미터_테스트() {
        let store = two_layer_store();

        assert!(matches!(
            store.layer(0),
            Err(NaturalNetError::UnknownLayer { layer: 0, num_layers: 2 })
        ));
        assert!(matches!(store.layer(3), Err(NaturalNetError::UnknownLayer { .. })));
        assert!(matches!(
            store.get(1, ParamKind::U),
            Err(NaturalNetError::MissingParameter { layer: 1, kind: ParamKind::U })
        ));
        assert!(matches!(store.conv(1), Err(NaturalNetError::Configuration(_))));

        println!("✅ 없는 레이어/파라미터 테스트 통과");
    }

    #[test]
    fn 덮어쓰기_테스트() {
        let mut store = two_layer_store();
        let replacement = Array2::from_elem((3, 3), 0.5);

        store.set(2, ParamKind::U, replacement.clone().into_dyn()).unwrap();
        let whitening = store.dense(2).unwrap().whitening.as_ref().unwrap();
        assert_eq!(whitening.u, replacement);

        store.set(2, ParamKind::D, Array1::from(vec![1.0, 2.0]).into_dyn()).unwrap();
        assert_eq!(store.dense(2).unwrap().d[1], 2.0);

        println!("✅ 덮어쓰기 테스트 통과");
    }

    #[test]
    fn 형상_불일치_덮어쓰기_거부_테스트() {
        let mut store = two_layer_store();

        let result = store.set(2, ParamKind::U, Array2::<f64>::eye(4).into_dyn());
        match result {
            Err(NaturalNetError::ShapeMismatch { expected, actual, .. }) => {
                assert_eq!(expected, vec![3, 3]);
                assert_eq!(actual, vec![4, 4]);
            }
            other => panic!("ShapeMismatch를 기대했지만 {other:?}"),
        }
        // 실패한 갱신은 값을 바꾸지 않음
        assert_eq!(store.dense(2).unwrap().whitening.as_ref().unwrap().u, Array2::<f64>::eye(3));

        assert!(matches!(
            store.set(1, ParamKind::C, Array1::<f64>::zeros(4).into_dyn()),
            Err(NaturalNetError::MissingParameter { layer: 1, kind: ParamKind::C })
        ));

        println!("✅ 형상 불일치 덮어쓰기 거부 테스트 통과");
    }

    #[test]
    fn 합성곱_파라미터_테스트() {
        let mut store = ParameterStore::new();
        store.push(LayerParams::Conv(ConvParams {
            v: Array4::zeros((5, 5, 1, 4)),
            d: Some(Array1::zeros(4)),
            u: None,
        }));
        store.push(LayerParams::Conv(ConvParams {
            v: Array4::zeros((5, 5, 4, 8)),
            d: None,
            u: Some(conv_identity_whitening(4)),
        }));

        let layer = store.layer(2).unwrap();
        assert_eq!(layer.kind(), LayerKind::Conv);
        assert_eq!((layer.input_dim(), layer.output_dim()), (4, 8));
        assert_eq!(store.get(2, ParamKind::U).unwrap().shape(), &[1, 1, 4, 4]);
        assert!(store.get(2, ParamKind::C).is_err());
        assert!(store.get(2, ParamKind::D).is_err());

        let count = store.parameter_count();
        assert_eq!(count.trainable, 5 * 5 * 4 + 4 + 5 * 5 * 4 * 8);
        assert_eq!(count.whitening, 16);

        println!("✅ 합성곱 파라미터 테스트 통과");
        println!("   파라미터 수: {count:?}");
    }
}
