pub mod locator;
pub mod synthetic;

pub use locator::start_locator;
pub use synthetic::{LiftScene, SyntheticLift, start_synthetic_lift};
