use serde::{Deserialize, Serialize};

use crate::error::{Axis, Corner, PredictError};
use crate::grid::{Bracket, GridNode, GridStore};
use crate::predictor::query::{PredictionQuery, ProgressionPolicy};
use crate::predictor::variable::Variable;

/// 補間の設定
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictOptions {
    pub progression: ProgressionPolicy,
    /// これより狭い軸区間は退化とみなす
    pub axis_epsilon: f64,
}

impl Default for PredictOptions {
    fn default() -> Self {
        Self {
            progression: ProgressionPolicy::Clamp,
            axis_epsilon: 1e-9,
        }
    }
}

#[inline]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// クエリを囲む4格子点と補間重み
#[derive(Debug, Clone, Copy)]
pub struct GridCell<'a> {
    pub query: PredictionQuery,
    pub direction: Bracket,
    pub height: Bracket,
    /// 方向 low/high × 高さ low/high の順: 00, 01, 10, 11
    pub corners: [&'a GridNode; 4],
    /// 高さ方向の重み t_h
    pub t_height: f64,
    /// 方向の重み t_d
    pub t_direction: f64,
    /// 多項式の評価点（ポリシー適用後の進行度）
    pub x: f64,
}

impl GridCell<'_> {
    /// 4隅の多項式を評価し、高さ→方向の順に線形補間する
    pub fn interpolate(&self, variable: Variable) -> Result<f64, PredictError> {
        let mut p = [0.0; 4];
        for (value, node) in p.iter_mut().zip(self.corners.iter()) {
            let polynomial = node.polynomial(variable).ok_or(PredictError::MissingVariable {
                variable,
                direction: node.direction,
                height: node.height,
            })?;
            *value = polynomial.evaluate(self.x);
            if value.is_nan() {
                return Err(self.not_a_number(variable));
            }
        }

        let [p00, p01, p10, p11] = p;
        let low = lerp(p00, p01, self.t_height);
        let high = lerp(p10, p11, self.t_height);
        let result = lerp(low, high, self.t_direction);

        if result.is_nan() {
            return Err(self.not_a_number(variable));
        }
        Ok(result)
    }

    fn not_a_number(&self, variable: Variable) -> PredictError {
        PredictError::NotANumber {
            variable,
            query: self.query,
        }
    }
}

/// グリッド近傍探索 + 双線形補間
#[derive(Debug, Clone, Copy)]
pub struct BilinearPredictor<'a> {
    grid: &'a GridStore,
    options: PredictOptions,
}

impl<'a> BilinearPredictor<'a> {
    pub fn new(grid: &'a GridStore, options: PredictOptions) -> Self {
        Self { grid, options }
    }

    /// 1変数の予測値
    pub fn predict(&self, variable: Variable, query: &PredictionQuery) -> Result<f64, PredictError> {
        self.locate(query)?.interpolate(variable)
    }

    /// クエリを囲むセルを求める。範囲外の方向・高さは端にクランプされる
    pub fn locate(&self, query: &PredictionQuery) -> Result<GridCell<'a>, PredictError> {
        if !query.is_finite() {
            return Err(PredictError::NonFiniteQuery { query: *query });
        }
        let x = self.progression(query.progression)?;

        let axes = self.grid.axes();
        let direction = axes.bracket(Axis::Direction, query.direction);
        let height = axes.bracket(Axis::Height, query.height);

        let t_direction = self.weight(Axis::Direction, direction, query)?;
        let t_height = self.weight(Axis::Height, height, query)?;

        let corners = [
            self.corner(Corner::LowLow, direction.low, height.low)?,
            self.corner(Corner::LowHigh, direction.low, height.high)?,
            self.corner(Corner::HighLow, direction.high, height.low)?,
            self.corner(Corner::HighHigh, direction.high, height.high)?,
        ];

        Ok(GridCell {
            query: *query,
            direction,
            height,
            corners,
            t_height,
            t_direction,
            x,
        })
    }

    fn progression(&self, progression: f64) -> Result<f64, PredictError> {
        if (0.0..=1.0).contains(&progression) {
            return Ok(progression);
        }
        match self.options.progression {
            ProgressionPolicy::Clamp => Ok(progression.clamp(0.0, 1.0)),
            ProgressionPolicy::Reject => Err(PredictError::ProgressionOutOfRange { progression }),
        }
    }

    fn weight(&self, axis: Axis, bracket: Bracket, query: &PredictionQuery) -> Result<f64, PredictError> {
        let value = match axis {
            Axis::Direction => query.direction,
            Axis::Height => query.height,
        };
        bracket
            .weight(value, self.options.axis_epsilon)
            .ok_or(PredictError::DegenerateAxis {
                axis,
                low: bracket.low,
                high: bracket.high,
                query: *query,
            })
    }

    fn corner(&self, corner: Corner, direction: f64, height: f64) -> Result<&'a GridNode, PredictError> {
        self.grid
            .node(direction, height)
            .ok_or(PredictError::MissingNode {
                corner,
                direction,
                height,
            })
    }
}
