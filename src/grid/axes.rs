use crate::error::{Axis, LoadError};

/// グリッドに現れた方向値・高さ値（昇順・重複なし）
#[derive(Debug, Clone, PartialEq)]
pub struct GridAxes {
    directions: Vec<f64>,
    heights: Vec<f64>,
}

impl GridAxes {
    /// ノードのキー列から軸を導出する。各軸に2値以上なければ補間できない
    pub fn derive<I>(keys: I) -> Result<Self, LoadError>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let (directions, heights): (Vec<f64>, Vec<f64>) = keys.into_iter().unzip();
        let directions = sorted_unique(directions);
        let heights = sorted_unique(heights);

        if directions.len() < 2 {
            return Err(LoadError::AxisTooShort {
                axis: Axis::Direction,
                count: directions.len(),
            });
        }
        if heights.len() < 2 {
            return Err(LoadError::AxisTooShort {
                axis: Axis::Height,
                count: heights.len(),
            });
        }

        Ok(Self {
            directions,
            heights,
        })
    }

    pub fn directions(&self) -> &[f64] {
        &self.directions
    }

    pub fn heights(&self) -> &[f64] {
        &self.heights
    }

    pub fn values(&self, axis: Axis) -> &[f64] {
        match axis {
            Axis::Direction => &self.directions,
            Axis::Height => &self.heights,
        }
    }

    /// 指定軸上でクエリ値を挟む2値を返す
    pub fn bracket(&self, axis: Axis, value: f64) -> Bracket {
        Bracket::locate(self.values(axis), value)
    }
}

fn sorted_unique(mut values: Vec<f64>) -> Vec<f64> {
    values.sort_by(f64::total_cmp);
    values.dedup();
    values
}

/// 軸上の隣接2値
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bracket {
    pub low: f64,
    pub high: f64,
}

impl Bracket {
    /// low: value 以下の最大値（なければ最小値）
    /// high: value 以上の最小値（なければ最大値）
    ///
    /// 範囲外のクエリは端の行/列に落ちる（外挿しない）。
    /// `values` は昇順・非空であること。
    pub fn locate(values: &[f64], value: f64) -> Self {
        let first = values.first().copied().unwrap_or(value);
        let last = values.last().copied().unwrap_or(value);

        // 昇順なので partition_point で境界を求められる
        let le = values.partition_point(|v| *v <= value);
        let low = if le == 0 { first } else { values[le - 1] };

        let lt = values.partition_point(|v| *v < value);
        let high = if lt == values.len() { last } else { values[lt] };

        Self { low, high }
    }

    pub fn is_collapsed(&self) -> bool {
        self.low == self.high
    }

    pub fn span(&self) -> f64 {
        self.high - self.low
    }

    /// 補間重み t = (value - low) / (high - low) を [0, 1] にクランプして返す。
    ///
    /// 格子点上・端へのクランプで low == high の場合は 0。
    /// 幅が epsilon 未満の場合は None（ゼロ除算になるため）。
    pub fn weight(&self, value: f64, epsilon: f64) -> Option<f64> {
        if self.is_collapsed() {
            return Some(0.0);
        }
        let span = self.span();
        if span.abs() < epsilon {
            return None;
        }
        Some(((value - self.low) / span).clamp(0.0, 1.0))
    }
}
