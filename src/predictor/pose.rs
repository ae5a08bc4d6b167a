use std::collections::BTreeMap;
use std::f64::consts::PI;

use nalgebra::Vector3;
use serde::Serialize;

use crate::error::PredictError;
use crate::grid::GridStore;
use crate::kinematics::{self, JOINT_COUNT};
use crate::predictor::bilinear::{BilinearPredictor, PredictOptions};
use crate::predictor::query::PredictionQuery;
use crate::predictor::variable::{JointVariable, OrientationVariable, Segment, Variable};
use crate::subject::SubjectMetrics;

/// 回帰の基準フレームをFKの規約に合わせる角度オフセット
pub const ANGLE_OFFSET: f64 = 1.5 * PI;

/// ANGLE_OFFSET を加える関節
const OFFSET_JOINTS: [JointVariable; 3] = [
    JointVariable::ThetaTwo,
    JointVariable::ThetaFour,
    JointVariable::ThetaFive,
];

/// 姿勢変数名 → 予測値
pub type Orientation = BTreeMap<OrientationVariable, f64>;

/// 回帰から直接得た関節値と姿勢変数（オフセット・スケール前）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JointPrediction {
    pub joints: [f64; JOINT_COUNT],
    pub pelvis_orientation: Orientation,
    pub chest_orientation: Orientation,
}

impl JointPrediction {
    pub fn joint(&self, joint: JointVariable) -> f64 {
        self.joints[joint as usize]
    }

    /// FK入力へ変換する
    ///
    /// - θ2, θ4, θ5 に 3π/2 を加算
    /// - d3 を足首→骨盤長、d6 を骨盤→胸長でスケール（正規化値 → メートル）
    pub fn adjusted(&self, metrics: &SubjectMetrics) -> [f64; JOINT_COUNT] {
        let mut q = self.joints;
        for joint in OFFSET_JOINTS {
            q[joint as usize] += ANGLE_OFFSET;
        }
        q[JointVariable::DThree as usize] *= metrics.ankle_to_pelvis;
        q[JointVariable::DSix as usize] *= metrics.pelvis_to_chest;
        q
    }
}

/// ランドマーク1点の予測（位置 + 姿勢変数）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoseEstimate {
    pub position: Vector3<f64>,
    pub orientation: Orientation,
}

impl PoseEstimate {
    pub fn get(&self, variable: OrientationVariable) -> Option<f64> {
        self.orientation.get(&variable).copied()
    }
}

/// 骨盤・胸の予測結果。毎回新しく計算し、フレーム間で使い回さない
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BodyEstimate {
    pub query: PredictionQuery,
    pub pelvis: PoseEstimate,
    pub chest: PoseEstimate,
}

/// 関節・姿勢予測器。読み込み済みグリッドを所有する
#[derive(Debug, Clone)]
pub struct PosePredictor {
    grid: GridStore,
    options: PredictOptions,
}

impl PosePredictor {
    pub fn new(grid: GridStore, options: PredictOptions) -> Self {
        Self { grid, options }
    }

    pub fn grid(&self) -> &GridStore {
        &self.grid
    }

    pub fn options(&self) -> PredictOptions {
        self.options
    }

    /// 1変数ごとの補間器
    pub fn variables(&self) -> BilinearPredictor<'_> {
        BilinearPredictor::new(&self.grid, self.options)
    }

    /// 6関節 + 6姿勢変数を予測する
    pub fn predict_joints(&self, query: &PredictionQuery) -> Result<JointPrediction, PredictError> {
        // 4隅の探索は全変数で共通
        let cell = self.variables().locate(query)?;

        let mut joints = [0.0; JOINT_COUNT];
        for joint in JointVariable::ALL {
            joints[joint as usize] = cell.interpolate(Variable::Joint(joint))?;
        }

        let mut pelvis_orientation = Orientation::new();
        let mut chest_orientation = Orientation::new();
        for orientation in OrientationVariable::ALL {
            let value = cell.interpolate(Variable::Orientation(orientation))?;
            match orientation.segment() {
                Segment::Pelvis => pelvis_orientation.insert(orientation, value),
                Segment::Chest => chest_orientation.insert(orientation, value),
            };
        }

        Ok(JointPrediction {
            joints,
            pelvis_orientation,
            chest_orientation,
        })
    }

    /// 関節予測 → オフセット・スケール → FK で骨盤・胸の姿勢を求める
    pub fn estimate(
        &self,
        query: &PredictionQuery,
        metrics: &SubjectMetrics,
    ) -> Result<BodyEstimate, PredictError> {
        let prediction = self.predict_joints(query)?;
        let landmarks = kinematics::solve(&prediction.adjusted(metrics));

        Ok(BodyEstimate {
            query: *query,
            pelvis: PoseEstimate {
                position: landmarks.pelvis,
                orientation: prediction.pelvis_orientation,
            },
            chest: PoseEstimate {
                position: landmarks.chest,
                orientation: prediction.chest_orientation,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{GridRow, Polynomial};
    use approx::assert_abs_diff_eq;

    fn sample_predictor() -> PosePredictor {
        let grid = GridStore::parse(include_str!("../../data/reach_grid.csv"), ',').unwrap();
        PosePredictor::new(grid, PredictOptions::default())
    }

    fn metrics() -> SubjectMetrics {
        SubjectMetrics::new(0.92, 0.36).unwrap()
    }

    /// 全隅・全変数が同じ多項式のグリッド
    fn uniform_predictor(value_of: impl Fn(&str) -> f64) -> PosePredictor {
        let mut rows = Vec::new();
        for &(d, h) in &[(0.0, 0.0), (0.0, 1.0), (45.0, 0.0), (45.0, 1.0)] {
            for joint in JointVariable::ALL {
                rows.push(GridRow {
                    line: 0,
                    direction: d,
                    height: h,
                    variable: joint.name().to_string(),
                    polynomial: Polynomial::from_values(&[value_of(joint.name())]),
                });
            }
            for orientation in OrientationVariable::ALL {
                rows.push(GridRow {
                    line: 0,
                    direction: d,
                    height: h,
                    variable: orientation.name().to_string(),
                    polynomial: Polynomial::from_values(&[value_of(orientation.name())]),
                });
            }
        }
        PosePredictor::new(GridStore::from_rows(rows).unwrap(), PredictOptions::default())
    }

    #[test]
    fn test_adjusted_offsets_and_scales() {
        let prediction = JointPrediction {
            joints: [0.1, 0.2, 1.0, 0.3, 0.4, 0.5],
            pelvis_orientation: Orientation::new(),
            chest_orientation: Orientation::new(),
        };
        let q = prediction.adjusted(&metrics());
        assert_eq!(q[0], 0.1);
        assert_abs_diff_eq!(q[1], 0.2 + ANGLE_OFFSET, epsilon = 1e-12);
        assert_abs_diff_eq!(q[2], 0.92, epsilon = 1e-12);
        assert_abs_diff_eq!(q[3], 0.3 + ANGLE_OFFSET, epsilon = 1e-12);
        assert_abs_diff_eq!(q[4], 0.4 + ANGLE_OFFSET, epsilon = 1e-12);
        assert_abs_diff_eq!(q[5], 0.5 * 0.36, epsilon = 1e-12);
    }

    #[test]
    fn test_orientation_partitioned_by_segment() {
        let predictor = sample_predictor();
        let prediction = predictor
            .predict_joints(&PredictionQuery::new(22.5, 0.5, 0.5))
            .unwrap();
        assert_eq!(prediction.pelvis_orientation.len(), 3);
        assert_eq!(prediction.chest_orientation.len(), 3);
        assert!(prediction
            .pelvis_orientation
            .keys()
            .all(|o| o.segment() == Segment::Pelvis));
        assert!(prediction
            .chest_orientation
            .keys()
            .all(|o| o.segment() == Segment::Chest));
    }

    #[test]
    fn test_joint_value_matches_single_variable_predictor() {
        let predictor = sample_predictor();
        let query = PredictionQuery::new(67.5, 2.5, 0.33);
        let prediction = predictor.predict_joints(&query).unwrap();
        for joint in JointVariable::ALL {
            let single = predictor
                .variables()
                .predict(Variable::Joint(joint), &query)
                .unwrap();
            assert_eq!(prediction.joint(joint), single);
        }
    }

    #[test]
    fn test_sample_grid_theta_two() {
        let predictor = sample_predictor();
        let prediction = predictor
            .predict_joints(&PredictionQuery::new(22.5, 0.5, 0.5))
            .unwrap();
        assert_abs_diff_eq!(prediction.joint(JointVariable::ThetaTwo), 1.6178855, epsilon = 1e-9);
    }

    #[test]
    fn test_upright_when_regression_is_neutral() {
        // raw θ = π/2 -> adjusted 2π: chain stays vertical
        let predictor = uniform_predictor(|name| match name {
            "dThree" | "dSix" => 1.0,
            "thetaOne" => 0.0,
            n if n.starts_with("theta") => PI / 2.0,
            _ => 0.0,
        });
        let estimate = predictor
            .estimate(&PredictionQuery::new(10.0, 0.3, 0.7), &metrics())
            .unwrap();
        assert_abs_diff_eq!(estimate.pelvis.position, Vector3::new(0.0, 0.0, 0.92), epsilon = 1e-12);
        assert_abs_diff_eq!(estimate.chest.position, Vector3::new(0.0, 0.0, 1.28), epsilon = 1e-12);
    }

    #[test]
    fn test_orientation_values_pass_through() {
        let predictor = uniform_predictor(|name| match name {
            "pelvisYaw" => 12.5,
            "chestPitch" => -3.0,
            "dThree" | "dSix" => 1.0,
            _ => 0.0,
        });
        let estimate = predictor
            .estimate(&PredictionQuery::new(30.0, 0.5, 0.5), &metrics())
            .unwrap();
        assert_eq!(estimate.pelvis.get(OrientationVariable::PelvisYaw), Some(12.5));
        assert_eq!(estimate.chest.get(OrientationVariable::ChestPitch), Some(-3.0));
        assert_eq!(estimate.pelvis.get(OrientationVariable::ChestPitch), None);
    }

    #[test]
    fn test_estimate_is_idempotent() {
        let predictor = sample_predictor();
        let query = PredictionQuery::new(100.0, 0.2, 0.9);
        let first = predictor.estimate(&query, &metrics()).unwrap();
        let second = predictor.estimate(&query, &metrics()).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            first.pelvis.position.x.to_bits(),
            second.pelvis.position.x.to_bits()
        );
    }

    #[test]
    fn test_metrics_scale_positions() {
        let predictor = sample_predictor();
        let query = PredictionQuery::new(45.0, 1.0, 0.5);
        let short = predictor
            .estimate(&query, &SubjectMetrics::new(0.8, 0.3).unwrap())
            .unwrap();
        let tall = predictor
            .estimate(&query, &SubjectMetrics::new(1.0, 0.3).unwrap())
            .unwrap();
        assert_abs_diff_eq!(
            tall.pelvis.position.norm() / short.pelvis.position.norm(),
            1.25,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_missing_orientation_is_lookup_error() {
        let mut rows = Vec::new();
        for &(d, h) in &[(0.0, 0.0), (0.0, 1.0), (45.0, 0.0), (45.0, 1.0)] {
            for joint in JointVariable::ALL {
                rows.push(GridRow {
                    line: 0,
                    direction: d,
                    height: h,
                    variable: joint.name().to_string(),
                    polynomial: Polynomial::from_values(&[1.0]),
                });
            }
        }
        let predictor =
            PosePredictor::new(GridStore::from_rows(rows).unwrap(), PredictOptions::default());
        let err = predictor
            .predict_joints(&PredictionQuery::new(10.0, 0.5, 0.5))
            .unwrap_err();
        assert!(matches!(
            err,
            PredictError::MissingVariable {
                variable: Variable::Orientation(OrientationVariable::PelvisRoll),
                ..
            }
        ));
    }
}
