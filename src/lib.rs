pub mod cache;
pub mod catalog;
pub mod config;
pub mod frames;
pub mod ground;
pub mod orbit;
pub mod predict;
pub mod sampling;

pub use cache::{BatchReport, BatchScheduler, PassCache, UpdateTask};
pub use catalog::Catalog;
pub use config::PredictConfig;
pub use ground::GroundPoint;
pub use orbit::OrbitModel;
pub use predict::{
    compute_passes, filter_passes, Pass, PassGeometry, PredictionMode, VisibilityFilters,
};
pub use sampling::{Frame, SampledPositionCache};
