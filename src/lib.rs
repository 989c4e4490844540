pub mod body;
pub mod config;
pub mod detector;
pub mod error;
pub mod geometry;
pub mod mapping;
pub mod overlay;
pub mod pipeline;
pub mod smoother;
pub mod types;

pub use config::{LocatorConfig, SensorGeometry, SmootherConfig, TrackingConfig};
pub use detector::{BarLocator, ListenerId};
pub use error::{LocatorError, SmootherError};
pub use mapping::{CameraIntrinsics, CoordinateMapper, PinholeMapper};
pub use smoother::{Smoothable, TemporalSmoother};
pub use types::{BarDetection, PointTriple, Skeleton};
