use crate::error::LocatorError;

/// Frame resolutions of the two sensor grids.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SensorGeometry {
    pub color_width: usize,
    pub color_height: usize,
    pub depth_width: usize,
    pub depth_height: usize,
}

impl SensorGeometry {
    pub fn new(
        color_width: usize,
        color_height: usize,
        depth_width: usize,
        depth_height: usize,
    ) -> Self {
        Self {
            color_width,
            color_height,
            depth_width,
            depth_height,
        }
    }

    pub fn color_len(&self) -> usize {
        self.color_width.saturating_mul(self.color_height)
    }

    pub fn depth_len(&self) -> usize {
        self.depth_width.saturating_mul(self.depth_height)
    }

    pub fn validate(&self) -> Result<(), LocatorError> {
        if self.color_len() == 0 {
            return Err(LocatorError::EmptyFrame("color"));
        }
        if self.depth_len() == 0 {
            return Err(LocatorError::EmptyFrame("depth"));
        }
        Ok(())
    }
}

impl Default for SensorGeometry {
    fn default() -> Self {
        // Kinect v2: 1920x1080 color, 512x424 depth.
        Self::new(1920, 1080, 512, 424)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LocatorConfig {
    /// Closest supported spine-base distance, meters.
    pub min_distance: f32,
    /// Farthest supported spine-base distance, meters.
    pub max_distance: f32,
    /// Largest accepted absolute tilt, degrees.
    pub max_angle: f64,
    /// Added to the measured height to account for the bar radius.
    pub height_offset: f64,
    /// Body-index label for pixels that belong to nobody.
    pub no_body: u8,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            min_distance: 2.0,
            max_distance: 4.5,
            max_angle: 25.0,
            height_offset: 0.03,
            no_body: 0xFF,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SmootherConfig {
    pub history_size: usize,
    /// Largest single-step jump strict smoothing lets through.
    pub max_margin: f64,
}

impl Default for SmootherConfig {
    fn default() -> Self {
        Self {
            history_size: 5,
            max_margin: 5.0,
        }
    }
}

/// Smoothing applied by the pipeline worker to bar height and angle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackingConfig {
    pub height: SmootherConfig,
    pub angle: SmootherConfig,
    pub strict: bool,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            // Heights are in meters, so the default 5.0 margin would never clamp.
            height: SmootherConfig {
                history_size: 5,
                max_margin: 0.05,
            },
            angle: SmootherConfig::default(),
            strict: true,
        }
    }
}
