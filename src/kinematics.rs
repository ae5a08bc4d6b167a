use std::f64::consts::FRAC_PI_2;

use nalgebra::{Matrix4, Vector3, Vector4};
use serde::Serialize;

use crate::predictor::JointVariable;

/// 関節数 (θ1, θ2, d3, θ4, θ5, d6)
pub const JOINT_COUNT: usize = 6;

/// 各リンクのねじれ角 α（標準DH、リンク長 a = 0）
///
/// 足首: θ1 (α=+π/2), θ2 (α=-π/2), 足首→骨盤の直動 d3
/// 骨盤: θ4 (α=+π/2), θ5 (α=-π/2), 骨盤→胸の直動 d6
const LINK_TWIST: [f64; JOINT_COUNT] = [FRAC_PI_2, -FRAC_PI_2, 0.0, FRAC_PI_2, -FRAC_PI_2, 0.0];

/// 骨盤・胸の位置（足首原点の座標系、メートル）
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LandmarkPositions {
    pub pelvis: Vector3<f64>,
    pub chest: Vector3<f64>,
}

/// 調整済み関節ベクトルから骨盤・胸の位置を閉形式で求める。
///
/// 状態を持たず反復もしない。同じ入力には常に同じ出力を返す。
pub fn solve(joints: &[f64; JOINT_COUNT]) -> LandmarkPositions {
    let [t1, t2, d3, t4, t5, d6] = *joints;
    let (s1, c1) = t1.sin_cos();
    let (s2, c2) = t2.sin_cos();
    let (s4, c4) = t4.sin_cos();
    let (s5, c5) = t5.sin_cos();

    // 最初の3関節の先端
    let pelvis = Vector3::new(-d3 * c1 * s2, -d3 * s1 * s2, d3 * c2);

    // 骨盤フレームのz軸を足首フレームへ
    let wx = -c2 * c4 * s5 - s2 * c5;
    let wy = -s2 * c4 * s5 + c2 * c5;
    let wz = s4 * s5;
    let trunk = Vector3::new(c1 * wx + s1 * wz, s1 * wx - c1 * wz, wy);

    LandmarkPositions {
        pelvis,
        chest: pelvis + trunk * d6,
    }
}

/// 標準DHパラメータの同次変換 Rz(θ)·Tz(d)·Tx(a)·Rx(α)
pub fn dh_transform(theta: f64, d: f64, a: f64, alpha: f64) -> Matrix4<f64> {
    let (st, ct) = theta.sin_cos();
    let (sa, ca) = alpha.sin_cos();
    Matrix4::new(
        ct, -st * ca, st * sa, a * ct,
        st, ct * ca, -ct * sa, a * st,
        0.0, sa, ca, d,
        0.0, 0.0, 0.0, 1.0,
    )
}

/// 各関節までの累積変換 T0_1 .. T0_6
pub fn chain_transforms(joints: &[f64; JOINT_COUNT]) -> [Matrix4<f64>; JOINT_COUNT] {
    let mut out = [Matrix4::identity(); JOINT_COUNT];
    let mut acc = Matrix4::identity();
    for (i, (joint, slot)) in JointVariable::ALL.iter().zip(out.iter_mut()).enumerate() {
        // 直動関節: 変位は d、回転はなし
        let link = if joint.is_prismatic() {
            dh_transform(0.0, joints[i], 0.0, LINK_TWIST[i])
        } else {
            dh_transform(joints[i], 0.0, 0.0, LINK_TWIST[i])
        };
        acc *= link;
        *slot = acc;
    }
    out
}

/// 累積変換の積から位置を求める（`solve` の検算用）
pub fn solve_by_chain(joints: &[f64; JOINT_COUNT]) -> LandmarkPositions {
    let transforms = chain_transforms(joints);
    let origin = Vector4::new(0.0, 0.0, 0.0, 1.0);
    let pelvis = transforms[2] * origin;
    let chest = transforms[5] * origin;
    LandmarkPositions {
        pelvis: pelvis.xyz(),
        chest: chest.xyz(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_zero_configuration() {
        let result = solve(&[0.0; JOINT_COUNT]);
        assert_eq!(result.pelvis, Vector3::zeros());
        assert_eq!(result.chest, Vector3::zeros());
    }

    #[test]
    fn test_zero_angles_upright_chain() {
        let result = solve(&[0.0, 0.0, 0.9, 0.0, 0.0, 0.35]);
        assert_abs_diff_eq!(result.pelvis, Vector3::new(0.0, 0.0, 0.9), epsilon = 1e-12);
        assert_abs_diff_eq!(result.chest, Vector3::new(0.0, 0.0, 1.25), epsilon = 1e-12);
    }

    #[test]
    fn test_matches_transform_product() {
        let configs = [
            [0.3, 1.5 * PI + 0.2, 0.92, 1.5 * PI + 0.4, 1.5 * PI - 0.1, 0.36],
            [-1.1, 0.7, 1.0, -0.4, 2.2, 0.4],
            [PI, -PI / 3.0, 0.5, PI / 7.0, 0.05, 0.25],
        ];
        for joints in &configs {
            let closed = solve(joints);
            let chained = solve_by_chain(joints);
            assert_abs_diff_eq!(closed.pelvis, chained.pelvis, epsilon = 1e-12);
            assert_abs_diff_eq!(closed.chest, chained.chest, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_segment_lengths_preserved() {
        let joints = [0.8, 2.1, 0.95, -0.6, 1.3, 0.33];
        let result = solve(&joints);
        assert_abs_diff_eq!(result.pelvis.norm(), 0.95, epsilon = 1e-12);
        assert_abs_diff_eq!((result.chest - result.pelvis).norm(), 0.33, epsilon = 1e-12);
    }

    #[test]
    fn test_theta_one_rotates_about_vertical() {
        let base = solve(&[0.0, 0.4, 1.0, 0.2, 0.3, 0.4]);
        let turned = solve(&[PI / 2.0, 0.4, 1.0, 0.2, 0.3, 0.4]);
        assert_abs_diff_eq!(base.pelvis.z, turned.pelvis.z, epsilon = 1e-12);
        assert_abs_diff_eq!(base.chest.z, turned.chest.z, epsilon = 1e-12);
        // 90° about z: (x, y) -> (-y, x)
        assert_abs_diff_eq!(turned.pelvis.x, -base.pelvis.y, epsilon = 1e-12);
        assert_abs_diff_eq!(turned.pelvis.y, base.pelvis.x, epsilon = 1e-12);
    }

    #[test]
    fn test_dh_transform_is_rigid() {
        let t = dh_transform(0.7, 0.2, 0.0, FRAC_PI_2);
        let r = t.fixed_view::<3, 3>(0, 0);
        let should_be_identity = r.transpose() * r;
        assert_abs_diff_eq!(
            should_be_identity,
            nalgebra::Matrix3::identity(),
            epsilon = 1e-12
        );
    }
}
