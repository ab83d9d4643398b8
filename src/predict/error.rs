use thiserror::Error;

use crate::frames::FrameError;
use crate::orbit::OrbitError;

#[derive(Debug, Error)]
pub enum PredictError {
    #[error("propagation error: {0}")]
    Propagation(String),
    #[error(transparent)]
    Frame(#[from] FrameError),
}

impl From<OrbitError> for PredictError {
    fn from(err: OrbitError) -> Self {
        match err {
            OrbitError::Frame(e) => PredictError::Frame(e),
            other => PredictError::Propagation(other.to_string()),
        }
    }
}
