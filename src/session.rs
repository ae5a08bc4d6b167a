use tracing::{debug, info};

use crate::error::PredictError;
use crate::predictor::{BodyEstimate, PosePredictor, PredictionQuery};
use crate::subject::{ReachHeights, SubjectMetrics, SubjectSource};

/// フレーム駆動の予測セッション
///
/// 被験者計測が準備できるまで毎フレーム `is_ready` をポーリングし、
/// 準備完了の最初のフレームで計測を一度だけ取り込む。以降は読み取り専用。
#[derive(Debug)]
pub struct ReachSession {
    predictor: PosePredictor,
    metrics: Option<SubjectMetrics>,
    heights: Option<ReachHeights>,
    latest: Option<BodyEstimate>,
    frames: u64,
}

impl ReachSession {
    pub fn new(predictor: PosePredictor) -> Self {
        Self {
            predictor,
            metrics: None,
            heights: None,
            latest: None,
            frames: 0,
        }
    }

    pub fn predictor(&self) -> &PosePredictor {
        &self.predictor
    }

    pub fn is_ready(&self) -> bool {
        self.metrics.is_some()
    }

    pub fn metrics(&self) -> Option<SubjectMetrics> {
        self.metrics
    }

    pub fn heights(&self) -> Option<ReachHeights> {
        self.heights
    }

    /// 直近フレームの予測（失敗したフレームの後は None）
    pub fn latest(&self) -> Option<&BodyEstimate> {
        self.latest.as_ref()
    }

    /// 処理したフレーム数
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// 1フレーム分の処理
    ///
    /// 計測待ちの間は Ok(None)。エラーはそのフレーム限りで、次のフレームには影響しない。
    pub fn tick<S: SubjectSource>(
        &mut self,
        source: &S,
        query: &PredictionQuery,
    ) -> Result<Option<&BodyEstimate>, PredictError> {
        self.frames += 1;
        self.latest = None;

        let metrics = match self.metrics {
            Some(m) => m,
            None => {
                if !source.is_ready() {
                    return Ok(None);
                }
                let m = source.metrics();
                self.metrics = Some(m);
                self.heights = source.heights();
                info!(
                    frame = self.frames,
                    ankle_to_pelvis = m.ankle_to_pelvis,
                    pelvis_to_chest = m.pelvis_to_chest,
                    "subject metrics latched"
                );
                m
            }
        };

        match self.predictor.estimate(query, &metrics) {
            Ok(estimate) => {
                self.latest = Some(estimate);
                Ok(self.latest.as_ref())
            }
            Err(e) => {
                debug!(frame = self.frames, %query, error = %e, "frame prediction failed");
                Err(e)
            }
        }
    }
}
