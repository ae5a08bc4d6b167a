use std::fmt;

use serde::Serialize;

/// 運動連鎖の関節変数（FKの入力順）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
#[repr(usize)]
pub enum JointVariable {
    ThetaOne = 0,
    ThetaTwo = 1,
    DThree = 2,
    ThetaFour = 3,
    ThetaFive = 4,
    DSix = 5,
}

impl JointVariable {
    pub const COUNT: usize = 6;

    pub const ALL: [JointVariable; Self::COUNT] = [
        Self::ThetaOne,
        Self::ThetaTwo,
        Self::DThree,
        Self::ThetaFour,
        Self::ThetaFive,
        Self::DSix,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::ThetaOne => "thetaOne",
            Self::ThetaTwo => "thetaTwo",
            Self::DThree => "dThree",
            Self::ThetaFour => "thetaFour",
            Self::ThetaFive => "thetaFive",
            Self::DSix => "dSix",
        }
    }

    /// 直動関節（正規化された伸展量）か
    pub fn is_prismatic(self) -> bool {
        matches!(self, Self::DThree | Self::DSix)
    }
}

/// 姿勢変数が属する部位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Segment {
    Pelvis,
    Chest,
}

/// 骨盤・胸部の姿勢変数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum OrientationVariable {
    PelvisRoll,
    PelvisPitch,
    PelvisYaw,
    ChestRoll,
    ChestPitch,
    ChestYaw,
}

impl OrientationVariable {
    pub const COUNT: usize = 6;

    pub const ALL: [OrientationVariable; Self::COUNT] = [
        Self::PelvisRoll,
        Self::PelvisPitch,
        Self::PelvisYaw,
        Self::ChestRoll,
        Self::ChestPitch,
        Self::ChestYaw,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::PelvisRoll => "pelvisRoll",
            Self::PelvisPitch => "pelvisPitch",
            Self::PelvisYaw => "pelvisYaw",
            Self::ChestRoll => "chestRoll",
            Self::ChestPitch => "chestPitch",
            Self::ChestYaw => "chestYaw",
        }
    }

    pub fn segment(self) -> Segment {
        match self {
            Self::PelvisRoll | Self::PelvisPitch | Self::PelvisYaw => Segment::Pelvis,
            Self::ChestRoll | Self::ChestPitch | Self::ChestYaw => Segment::Chest,
        }
    }
}

/// 回帰グリッドが保持する変数（関節6 + 姿勢6）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Variable {
    Joint(JointVariable),
    Orientation(OrientationVariable),
}

impl Variable {
    /// 外部テーブルの列名から変換する。大文字小文字は区別する。
    /// 文字列テーブルはこの読み込み境界でのみ使う。
    pub fn from_name(name: &str) -> Option<Self> {
        if let Some(joint) = JointVariable::ALL.iter().find(|j| j.name() == name) {
            return Some(Self::Joint(*joint));
        }
        OrientationVariable::ALL
            .iter()
            .find(|o| o.name() == name)
            .map(|o| Self::Orientation(*o))
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Joint(j) => j.name(),
            Self::Orientation(o) => o.name(),
        }
    }
}

impl From<JointVariable> for Variable {
    fn from(joint: JointVariable) -> Self {
        Self::Joint(joint)
    }
}

impl From<OrientationVariable> for Variable {
    fn from(orientation: OrientationVariable) -> Self {
        Self::Orientation(orientation)
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
