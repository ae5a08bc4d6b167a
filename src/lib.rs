pub mod config;
pub mod error;
pub mod grid;
pub mod kinematics;
pub mod logging;
pub mod predictor;
pub mod session;
pub mod subject;
pub mod validation;

pub use error::{LoadError, PredictError};
pub use predictor::{BodyEstimate, PosePredictor, PredictionQuery};
pub use session::ReachSession;
pub use subject::{ReachHeights, SubjectMetrics, SubjectSource};
