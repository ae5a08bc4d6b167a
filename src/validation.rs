use std::fmt;
use std::fs;
use std::path::Path;

use nalgebra::Vector3;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::LoadError;
use crate::grid::store::{data_lines, parse_number};
use crate::predictor::{PosePredictor, PredictionQuery};
use crate::subject::{ReachHeights, SubjectMetrics};

/// 参照データとの一致判定の既定許容誤差（ユークリッド距離）
pub const DEFAULT_TOLERANCE: f64 = 1e-4;

/// direction, height, progression, pelvis xyz, chest xyz,
/// ankle-pelvis, pelvis-chest, waist/chest/shoulder/eye heights
const REFERENCE_FIELDS: usize = 15;

/// 外部で生成された参照ケース（入力 + 期待出力 + 被験者計測）
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceCase {
    pub line: usize,
    pub query: PredictionQuery,
    pub expected_pelvis: Vector3<f64>,
    pub expected_chest: Vector3<f64>,
    pub metrics: SubjectMetrics,
    pub heights: ReachHeights,
}

impl ReferenceCase {
    pub fn parse(line: usize, text: &str, delimiter: char) -> Result<Self, LoadError> {
        let fields: Vec<&str> = text.split(delimiter).map(str::trim).collect();
        if fields.len() < REFERENCE_FIELDS {
            return Err(LoadError::MissingField {
                line,
                expected: REFERENCE_FIELDS,
                got: fields.len(),
            });
        }

        let mut v = [0.0; REFERENCE_FIELDS];
        for (i, (slot, field)) in v.iter_mut().zip(&fields).enumerate() {
            *slot = parse_number(line, i + 1, field)?;
        }

        let metrics = SubjectMetrics::new(v[9], v[10])
            .map_err(|source| LoadError::InvalidSubject { line, source })?;
        let heights = ReachHeights::new(v[11], v[12], v[13], v[14])
            .map_err(|source| LoadError::InvalidSubject { line, source })?;

        Ok(Self {
            line,
            query: PredictionQuery::new(v[0], v[1], v[2]),
            expected_pelvis: Vector3::new(v[3], v[4], v[5]),
            expected_chest: Vector3::new(v[6], v[7], v[8]),
            metrics,
            heights,
        })
    }
}

pub fn parse_cases(text: &str, delimiter: char) -> Result<Vec<ReferenceCase>, LoadError> {
    data_lines(text, delimiter)
        .map(|(line, l)| ReferenceCase::parse(line, l, delimiter))
        .collect()
}

pub fn load_cases<P: AsRef<Path>>(path: P, delimiter: char) -> Result<Vec<ReferenceCase>, LoadError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_cases(&text, delimiter)
}

/// ランドマーク1点の比較結果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LandmarkCheck {
    pub expected: Vector3<f64>,
    pub actual: Vector3<f64>,
    /// actual - expected
    pub delta: Vector3<f64>,
    pub distance: f64,
    pub passed: bool,
}

impl LandmarkCheck {
    pub fn compare(expected: Vector3<f64>, actual: Vector3<f64>, tolerance: f64) -> Self {
        let delta = actual - expected;
        let distance = delta.norm();
        Self {
            expected,
            actual,
            delta,
            distance,
            // NaN は不一致
            passed: distance <= tolerance,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CaseOutcome {
    Compared {
        pelvis: LandmarkCheck,
        chest: LandmarkCheck,
    },
    /// 予測自体が失敗した
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseDiagnostic {
    pub index: usize,
    pub line: usize,
    pub query: PredictionQuery,
    pub outcome: CaseOutcome,
}

impl CaseDiagnostic {
    pub fn passed(&self) -> bool {
        match &self.outcome {
            CaseOutcome::Compared { pelvis, chest } => pelvis.passed && chest.passed,
            CaseOutcome::Failed { .. } => false,
        }
    }
}

/// 検証結果の集計
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub tolerance: f64,
    pub passed: usize,
    pub total: usize,
    pub cases: Vec<CaseDiagnostic>,
}

impl ValidationReport {
    pub fn all_passed(&self) -> bool {
        self.passed == self.total
    }

    pub fn failures(&self) -> impl Iterator<Item = &CaseDiagnostic> {
        self.cases.iter().filter(|c| !c.passed())
    }
}

/// 参照データセットをパイプライン全体に通して照合する。グリッドは変更しない
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Harness {
    tolerance: f64,
}

impl Default for Harness {
    fn default() -> Self {
        Self::new(DEFAULT_TOLERANCE)
    }
}

impl Harness {
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn run_case(&self, predictor: &PosePredictor, index: usize, case: &ReferenceCase) -> CaseDiagnostic {
        // ケースごとの被験者計測で予測する
        let outcome = match predictor.estimate(&case.query, &case.metrics) {
            Ok(estimate) => CaseOutcome::Compared {
                pelvis: LandmarkCheck::compare(case.expected_pelvis, estimate.pelvis.position, self.tolerance),
                chest: LandmarkCheck::compare(case.expected_chest, estimate.chest.position, self.tolerance),
            },
            Err(e) => {
                debug!(index, line = case.line, error = %e, "reference case prediction failed");
                CaseOutcome::Failed { error: e.to_string() }
            }
        };

        CaseDiagnostic {
            index,
            line: case.line,
            query: case.query,
            outcome,
        }
    }

    pub fn run_all(&self, predictor: &PosePredictor, cases: &[ReferenceCase]) -> ValidationReport {
        let diagnostics: Vec<CaseDiagnostic> = cases
            .iter()
            .enumerate()
            .map(|(i, case)| self.run_case(predictor, i, case))
            .collect();
        let passed = diagnostics.iter().filter(|d| d.passed()).count();

        info!(passed, total = cases.len(), tolerance = self.tolerance, "validation finished");

        ValidationReport {
            tolerance: self.tolerance,
            passed,
            total: cases.len(),
            cases: diagnostics,
        }
    }
}

fn fmt_vec(v: &Vector3<f64>) -> String {
    format!("({:+.6}, {:+.6}, {:+.6})", v.x, v.y, v.z)
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Summary:")?;
        writeln!(f, "  Cases:     {}", self.total)?;
        writeln!(f, "  Passed:    {}", self.passed)?;
        writeln!(f, "  Tolerance: {:e}", self.tolerance)?;

        if self.all_passed() {
            return Ok(());
        }

        writeln!(f)?;
        writeln!(f, "Mismatches:")?;
        for case in self.failures() {
            writeln!(f, "  #{} (line {}) {}", case.index, case.line, case.query)?;
            match &case.outcome {
                CaseOutcome::Compared { pelvis, chest } => {
                    for (name, check) in [("pelvis", pelvis), ("chest", chest)] {
                        if check.passed {
                            continue;
                        }
                        writeln!(
                            f,
                            "    {:<6} expected {} actual {} delta {} |delta| {:.6e}",
                            name,
                            fmt_vec(&check.expected),
                            fmt_vec(&check.actual),
                            fmt_vec(&check.delta),
                            check.distance
                        )?;
                    }
                }
                CaseOutcome::Failed { error } => {
                    writeln!(f, "    error: {}", error)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridStore;
    use crate::predictor::PredictOptions;

    const GRID: &str = include_str!("../data/reach_grid.csv");
    const CASES: &str = include_str!("../data/reference_cases.csv");

    fn predictor_from(text: &str) -> PosePredictor {
        PosePredictor::new(GridStore::parse(text, ',').unwrap(), PredictOptions::default())
    }

    #[test]
    fn test_parse_reference_case() {
        let case = ReferenceCase::parse(
            5,
            "22.5,0.5,0.5,-0.04,-0.003,0.90,-0.07,-0.006,1.26,0.92,0.36,0.95,1.25,1.42,1.6",
            ',',
        )
        .unwrap();
        assert_eq!(case.query, PredictionQuery::new(22.5, 0.5, 0.5));
        assert_eq!(case.expected_chest, Vector3::new(-0.07, -0.006, 1.26));
        assert_eq!(case.metrics.pelvis_to_chest, 0.36);
        assert_eq!(case.heights.eye, 1.6);
    }

    #[test]
    fn test_parse_reference_case_too_short() {
        let err = ReferenceCase::parse(2, "22.5,0.5,0.5,1,2,3", ',').unwrap_err();
        assert!(matches!(err, LoadError::MissingField { got: 6, .. }));
    }

    #[test]
    fn test_parse_reference_case_bad_subject() {
        let err = ReferenceCase::parse(
            3,
            "0,0,0,0,0,0,0,0,0,-0.9,0.36,0.95,1.25,1.42,1.6",
            ',',
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::InvalidSubject { line: 3, .. }));
    }

    #[test]
    fn test_sample_cases_load() {
        let cases = parse_cases(CASES, ',').unwrap();
        assert_eq!(cases.len(), 12);
        assert_eq!(cases[0].line, 3);
    }

    #[test]
    fn test_reference_dataset_all_pass() {
        let predictor = predictor_from(GRID);
        let cases = parse_cases(CASES, ',').unwrap();
        let report = Harness::default().run_all(&predictor, &cases);
        assert_eq!(report.total, 12);
        assert_eq!(report.passed, report.total, "{}", report);
        assert!(report.all_passed());
        assert_eq!(report.failures().count(), 0);
    }

    #[test]
    fn test_perturbed_coefficient_fails_touching_cases() {
        let perturbed = GRID.replace(
            "0,0,dThree,1.000000,-0.040000,0.015000,NA",
            "0,0,dThree,1.010000,-0.040000,0.015000,NA",
        );
        assert_ne!(perturbed, GRID);
        let predictor = predictor_from(&perturbed);
        let cases = parse_cases(CASES, ',').unwrap();
        let report = Harness::default().run_all(&predictor, &cases);

        // cases whose cell includes node (0, 0): #0 (22.5, 0.5), #1 (0, 0), #10 (10, -0.5)
        assert!(report.passed <= report.total - 3);
        let failed: Vec<usize> = report.failures().map(|c| c.index).collect();
        for index in [0, 1, 10] {
            assert!(failed.contains(&index), "case {} should fail: {}", index, report);
        }
    }

    #[test]
    fn test_mismatch_reports_delta() {
        let predictor = predictor_from(GRID);
        let mut case = parse_cases(CASES, ',').unwrap().remove(1);
        case.expected_pelvis.z += 0.01;
        let diagnostic = Harness::default().run_case(&predictor, 0, &case);
        assert!(!diagnostic.passed());
        match diagnostic.outcome {
            CaseOutcome::Compared { pelvis, chest } => {
                assert!(!pelvis.passed);
                assert!(chest.passed);
                assert!((pelvis.delta.z + 0.01).abs() < 1e-4);
                assert!((pelvis.distance - 0.01).abs() < 1e-4);
            }
            CaseOutcome::Failed { error } => panic!("unexpected failure: {error}"),
        }
    }

    #[test]
    fn test_prediction_error_is_recorded() {
        let predictor = predictor_from(GRID);
        let mut case = parse_cases(CASES, ',').unwrap().remove(0);
        case.query.progression = f64::NAN;
        let report = Harness::default().run_all(&predictor, &[case]);
        assert_eq!(report.passed, 0);
        assert!(matches!(report.cases[0].outcome, CaseOutcome::Failed { .. }));
        assert!(report.to_string().contains("error:"));
    }

    #[test]
    fn test_harness_does_not_touch_grid() {
        let predictor = predictor_from(GRID);
        let before = predictor.grid().len();
        let cases = parse_cases(CASES, ',').unwrap();
        let first = Harness::default().run_all(&predictor, &cases);
        let second = Harness::default().run_all(&predictor, &cases);
        assert_eq!(predictor.grid().len(), before);
        assert_eq!(first, second);
    }

    #[test]
    fn test_report_json() {
        let predictor = predictor_from(GRID);
        let cases = parse_cases(CASES, ',').unwrap();
        let report = Harness::default().run_all(&predictor, &cases[..2]);
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"status\":\"compared\""));
        assert!(json.contains("\"passed\":2"));
    }
}
