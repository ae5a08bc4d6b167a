pub mod bilinear;
pub mod pose;
pub mod query;
pub mod variable;

pub use bilinear::{lerp, BilinearPredictor, GridCell, PredictOptions};
pub use pose::{BodyEstimate, JointPrediction, Orientation, PoseEstimate, PosePredictor, ANGLE_OFFSET};
pub use query::{PredictionQuery, ProgressionPolicy};
pub use variable::{JointVariable, OrientationVariable, Segment, Variable};
