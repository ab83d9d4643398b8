mod error;
mod filter;
mod pass_finder;
mod types;

pub use error::PredictError;
pub use filter::{filter_passes, VisibilityFilters, DEFAULT_HORIZON_HOURS};
pub use pass_finder::{compute_passes, EPOCH_GRACE_MINUTES};
pub use types::{Illumination, IlluminationEvent, Pass, PassGeometry, PredictionMode};
