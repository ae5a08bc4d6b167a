use std::path::PathBuf;

use thiserror::Error;

use crate::predictor::{PredictionQuery, Variable};
use crate::subject::SubjectError;

/// テーブル読み込み時のエラー（致命的: 部分的なグリッドは使えない）
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read table {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: column {column} is not a number: {value:?}")]
    Parse {
        line: usize,
        column: usize,
        value: String,
    },

    #[error("line {line}: expected at least {expected} fields, got {got}")]
    MissingField {
        line: usize,
        expected: usize,
        got: usize,
    },

    #[error("line {line}: duplicate polynomial for {variable} at direction {direction}, height {height}")]
    DuplicateVariable {
        line: usize,
        variable: Variable,
        direction: f64,
        height: f64,
    },

    #[error("line {line}: polynomial for {variable} has no coefficients (all NA)")]
    EmptyPolynomial { line: usize, variable: Variable },

    #[error("{axis} axis has {count} distinct value(s), interpolation needs at least 2")]
    AxisTooShort { axis: Axis, count: usize },

    #[error("line {line}: {source}")]
    InvalidSubject {
        line: usize,
        #[source]
        source: SubjectError,
    },
}

/// 予測呼び出しごとのエラー（呼び出し単位でローカル）
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictError {
    #[error("no grid node for {corner} corner at direction {direction}, height {height}")]
    MissingNode {
        corner: Corner,
        direction: f64,
        height: f64,
    },

    #[error("grid node at direction {direction}, height {height} has no polynomial for {variable}")]
    MissingVariable {
        variable: Variable,
        direction: f64,
        height: f64,
    },

    #[error("degenerate {axis} span [{low}, {high}] for query {query}")]
    DegenerateAxis {
        axis: Axis,
        low: f64,
        high: f64,
        query: PredictionQuery,
    },

    #[error("{variable} evaluated to NaN for query {query}")]
    NotANumber {
        variable: Variable,
        query: PredictionQuery,
    },

    #[error("progression {progression} outside [0, 1]")]
    ProgressionOutOfRange { progression: f64 },

    #[error("query {query} contains a non-finite value")]
    NonFiniteQuery { query: PredictionQuery },
}

/// グリッド軸
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Direction,
    Height,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Axis::Direction => write!(f, "direction"),
            Axis::Height => write!(f, "height"),
        }
    }
}

/// 補間に使う4隅（方向 low/high × 高さ low/high）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corner {
    LowLow,
    LowHigh,
    HighLow,
    HighHigh,
}

impl std::fmt::Display for Corner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Corner::LowLow => "direction-low/height-low",
            Corner::LowHigh => "direction-low/height-high",
            Corner::HighLow => "direction-high/height-low",
            Corner::HighHigh => "direction-high/height-high",
        };
        write!(f, "{}", name)
    }
}
