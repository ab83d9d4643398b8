use thiserror::Error;

use crate::frames::FrameError;

#[derive(Debug, Error)]
pub enum OrbitError {
    #[error("invalid tle: {0}")]
    Tle(#[from] sgp4::TleError),
    #[error("elements error: {0}")]
    Elements(#[from] sgp4::ElementsError),
    #[error("propagation failed: {0}")]
    Propagation(String),
    #[error(transparent)]
    Frame(#[from] FrameError),
}

impl From<sgp4::Error> for OrbitError {
    fn from(err: sgp4::Error) -> Self {
        OrbitError::Propagation(err.to_string())
    }
}
