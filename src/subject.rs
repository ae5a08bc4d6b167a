use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 被験者の体節長（メートル）
///
/// セッション開始時に一度だけ設定し、予測中は読み取り専用。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubjectMetrics {
    /// 足首→骨盤
    pub ankle_to_pelvis: f64,
    /// 骨盤→胸
    pub pelvis_to_chest: f64,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SubjectError {
    #[error("{name} must be a positive finite length, got {value}")]
    InvalidLength { name: &'static str, value: f64 },

    #[error("reach heights must be non-decreasing (waist <= chest <= shoulder <= eye), got {0:?}")]
    UnorderedHeights([f64; 4]),
}

impl SubjectMetrics {
    pub fn new(ankle_to_pelvis: f64, pelvis_to_chest: f64) -> Result<Self, SubjectError> {
        check_length("ankle_to_pelvis", ankle_to_pelvis)?;
        check_length("pelvis_to_chest", pelvis_to_chest)?;
        Ok(Self {
            ankle_to_pelvis,
            pelvis_to_chest,
        })
    }
}

fn check_length(name: &'static str, value: f64) -> Result<(), SubjectError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SubjectError::InvalidLength { name, value })
    }
}

/// 被験者ごとに計測した4段階のリーチ高さ（メートル）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReachHeights {
    pub waist: f64,
    pub chest: f64,
    pub shoulder: f64,
    pub eye: f64,
}

impl ReachHeights {
    /// 高さ指定子の最大値（0=腰, 1=胸, 2=肩, 3=目）
    pub const MAX_SPECIFIER: f64 = 3.0;

    pub fn new(waist: f64, chest: f64, shoulder: f64, eye: f64) -> Result<Self, SubjectError> {
        let levels = [waist, chest, shoulder, eye];
        for (name, value) in ["waist", "chest", "shoulder", "eye"].into_iter().zip(levels) {
            check_length(name, value)?;
        }
        if levels.windows(2).any(|w| w[1] < w[0]) {
            return Err(SubjectError::UnorderedHeights(levels));
        }
        Ok(Self {
            waist,
            chest,
            shoulder,
            eye,
        })
    }

    pub fn levels(&self) -> [f64; 4] {
        [self.waist, self.chest, self.shoulder, self.eye]
    }

    /// 高さ指定子 [0, 3] を計測高さ間の線形補間でメートルに変換する。
    /// 範囲外の指定子はクランプする。
    pub fn to_meters(&self, specifier: f64) -> f64 {
        let levels = self.levels();
        let s = specifier.clamp(0.0, Self::MAX_SPECIFIER);
        let i = (s.floor() as usize).min(levels.len() - 2);
        let t = s - i as f64;
        levels[i] + (levels[i + 1] - levels[i]) * t
    }
}

/// 被験者計測を提供する外部コンポーネント
///
/// フレームごとに `is_ready` をポーリングし、true になった時点で
/// `metrics` を一度だけ読み取る。
pub trait SubjectSource {
    fn is_ready(&self) -> bool;

    fn metrics(&self) -> SubjectMetrics;

    fn heights(&self) -> Option<ReachHeights> {
        None
    }
}

/// 固定値を返す SubjectSource（設定ファイル・検証用）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedSubject {
    pub metrics: SubjectMetrics,
    pub heights: Option<ReachHeights>,
}

impl FixedSubject {
    pub fn new(metrics: SubjectMetrics) -> Self {
        Self {
            metrics,
            heights: None,
        }
    }

    pub fn with_heights(mut self, heights: ReachHeights) -> Self {
        self.heights = Some(heights);
        self
    }
}

impl SubjectSource for FixedSubject {
    fn is_ready(&self) -> bool {
        true
    }

    fn metrics(&self) -> SubjectMetrics {
        self.metrics
    }

    fn heights(&self) -> Option<ReachHeights> {
        self.heights
    }
}
