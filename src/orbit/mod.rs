mod error;
mod model;
mod sun;

pub use error::OrbitError;
pub use model::{OrbitModel, TemeState};
pub use sun::{is_ground_dark, is_in_earth_shadow, sun_position_inertial};
