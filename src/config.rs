use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::warn;

use crate::predictor::{PredictOptions, ProgressionPolicy};
use crate::subject::{FixedSubject, ReachHeights, SubjectMetrics};
use crate::validation::{Harness, DEFAULT_TOLERANCE};

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub prediction: PredictionConfig,
    #[serde(default)]
    pub validation: ValidationConfig,
    #[serde(default)]
    pub subject: SubjectConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DataConfig {
    /// 回帰グリッドのテーブル
    #[serde(default = "default_grid_path")]
    pub grid_path: String,
    /// 検証用参照ケースのテーブル
    #[serde(default = "default_reference_path")]
    pub reference_path: String,
    /// 列区切り文字
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PredictionConfig {
    /// 範囲外の進行度: "clamp" または "reject"
    #[serde(default)]
    pub progression: ProgressionPolicy,
    /// 退化とみなす軸区間幅
    #[serde(default = "default_axis_epsilon")]
    pub axis_epsilon: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ValidationConfig {
    /// 位置一致の許容誤差（メートル）
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
}

/// 対話モードで使う被験者計測
#[derive(Debug, Deserialize, Clone)]
pub struct SubjectConfig {
    #[serde(default = "default_ankle_to_pelvis")]
    pub ankle_to_pelvis: f64,
    #[serde(default = "default_pelvis_to_chest")]
    pub pelvis_to_chest: f64,
    #[serde(default = "default_waist_height")]
    pub waist_height: f64,
    #[serde(default = "default_chest_height")]
    pub chest_height: f64,
    #[serde(default = "default_shoulder_height")]
    pub shoulder_height: f64,
    #[serde(default = "default_eye_height")]
    pub eye_height: f64,
}

fn default_grid_path() -> String { "data/reach_grid.csv".to_string() }
fn default_reference_path() -> String { "data/reference_cases.csv".to_string() }
fn default_delimiter() -> char { ',' }
fn default_axis_epsilon() -> f64 { 1e-9 }
fn default_tolerance() -> f64 { DEFAULT_TOLERANCE }
fn default_ankle_to_pelvis() -> f64 { 0.92 }
fn default_pelvis_to_chest() -> f64 { 0.36 }
fn default_waist_height() -> f64 { 0.95 }
fn default_chest_height() -> f64 { 1.25 }
fn default_shoulder_height() -> f64 { 1.42 }
fn default_eye_height() -> f64 { 1.60 }

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            grid_path: default_grid_path(),
            reference_path: default_reference_path(),
            delimiter: default_delimiter(),
        }
    }
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            progression: ProgressionPolicy::default(),
            axis_epsilon: default_axis_epsilon(),
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            tolerance: default_tolerance(),
        }
    }
}

impl Default for SubjectConfig {
    fn default() -> Self {
        Self {
            ankle_to_pelvis: default_ankle_to_pelvis(),
            pelvis_to_chest: default_pelvis_to_chest(),
            waist_height: default_waist_height(),
            chest_height: default_chest_height(),
            shoulder_height: default_shoulder_height(),
            eye_height: default_eye_height(),
        }
    }
}

impl PredictionConfig {
    pub fn options(&self) -> PredictOptions {
        PredictOptions {
            progression: self.progression,
            axis_epsilon: self.axis_epsilon,
        }
    }
}

impl ValidationConfig {
    pub fn harness(&self) -> Harness {
        Harness::new(self.tolerance)
    }
}

impl SubjectConfig {
    pub fn subject(&self) -> Result<FixedSubject> {
        let metrics = SubjectMetrics::new(self.ankle_to_pelvis, self.pelvis_to_chest)
            .context("invalid [subject] lengths")?;
        let heights = ReachHeights::new(
            self.waist_height,
            self.chest_height,
            self.shoulder_height,
            self.eye_height,
        )
        .context("invalid [subject] heights")?;
        Ok(FixedSubject::new(metrics).with_heights(heights))
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// 読み込みに失敗したら既定値
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path.as_ref()) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.as_ref().display(), error = %e, "using default config");
                Self::default()
            }
        }
    }
}
