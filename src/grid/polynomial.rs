/// 進行度を変数とする回帰多項式
///
/// 係数 c0..cn のうち `None` は「該当なし」(NA) を表す。
/// 低次のフィットと高次のフィットを同じ表に混在させるため、
/// ゼロとは区別して保持し、評価時は項ごと読み飛ばす。
#[derive(Debug, Clone, PartialEq)]
pub struct Polynomial {
    coefficients: Vec<Option<f64>>,
}

impl Polynomial {
    pub fn new(coefficients: Vec<Option<f64>>) -> Self {
        Self { coefficients }
    }

    /// 全係数が存在する多項式
    pub fn from_values(values: &[f64]) -> Self {
        Self::new(values.iter().copied().map(Some).collect())
    }

    pub fn coefficients(&self) -> &[Option<f64>] {
        &self.coefficients
    }

    /// Σ ci·x^i（NA項は除外）
    pub fn evaluate(&self, x: f64) -> f64 {
        self.coefficients
            .iter()
            .enumerate()
            .filter_map(|(i, c)| c.map(|c| c * x.powi(i as i32)))
            .sum()
    }

    /// 値を持つ最高次数。係数が一つもなければ None
    pub fn degree(&self) -> Option<usize> {
        self.coefficients.iter().rposition(Option::is_some)
    }

    pub fn is_empty(&self) -> bool {
        self.degree().is_none()
    }
}
