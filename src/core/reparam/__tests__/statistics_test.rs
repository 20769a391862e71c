//! 은닉 상태 통계 테스트

use crate::core::error::NaturalNetError;
use crate::core::reparam::HiddenStatistics;
use crate::core::systems::StatisticsMode;
use ndarray::{array, Array2};

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn 비중심_2차_모멘트_테스트() {
        let h = array![[1.0, 2.0], [3.0, 0.0]];
        let stats = HiddenStatistics::estimate(&h, StatisticsMode::Uncentered, 2).unwrap();

        assert_eq!(stats.observations, 2);
        assert_eq!(stats.dim(), 2);
        assert_eq!(stats.mean, array![2.0, 1.0]);
        // (h₁h₁ᵗ + h₂h₂ᵗ)/2 = ([[1,2],[2,4]] + [[9,0],[0,0]])/2
        assert_eq!(stats.second_moment, array![[5.0, 1.0], [1.0, 2.0]]);

        println!("✅ 비중심 2차 모멘트 테스트 통과");
    }

    #[test]
    fn 공분산_테스트() {
        let h = array![[1.0, 2.0], [3.0, 0.0]];
        let stats = HiddenStatistics::estimate(&h, StatisticsMode::Centered, 2).unwrap();

        // 중심화: [[-1, 1], [1, -1]]
        assert_eq!(stats.second_moment, array![[1.0, -1.0], [-1.0, 1.0]]);
        for (a, b) in stats.second_moment.iter().zip(stats.second_moment.t().iter()) {
            assert_abs_diff_eq!(*a, *b);
        }

        println!("✅ 공분산 테스트 통과");
    }

    #[test]
    fn 빈_배치_퇴화_테스트() {
        let empty = Array2::<f64>::zeros((0, 3));
        let result = HiddenStatistics::estimate(&empty, StatisticsMode::Uncentered, 4);
        assert!(matches!(
            result,
            Err(NaturalNetError::NumericalDegeneracy { layer: 4, .. })
        ));

        println!("✅ 빈 배치 퇴화 테스트 통과");
    }
}
