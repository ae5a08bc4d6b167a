use std::fmt;

use serde::{Deserialize, Serialize};

/// 予測クエリ（リーチ方向・高さ・進行度）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionQuery {
    /// リーチ方向（度）
    pub direction: f64,
    /// リーチ高さ（グリッドの高さ軸と同じ単位）
    pub height: f64,
    /// リーチ進行度 (0.0..=1.0)
    pub progression: f64,
}

impl PredictionQuery {
    pub fn new(direction: f64, height: f64, progression: f64) -> Self {
        Self {
            direction,
            height,
            progression,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.direction.is_finite() && self.height.is_finite() && self.progression.is_finite()
    }
}

impl fmt::Display for PredictionQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(direction={}, height={}, progression={})",
            self.direction, self.height, self.progression
        )
    }
}

/// 範囲外の進行度の扱い
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressionPolicy {
    /// [0, 1] にクランプして評価
    #[default]
    Clamp,
    /// エラーとして拒否
    Reject,
}
