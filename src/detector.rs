//! Per-frame bar localization.
//!
//! The bar is taken to be the widest foreground feature: every color pixel is
//! mapped onto the depth grid, and among pixels labeled as belonging to a
//! person the leftmost and rightmost depth columns become the bar endpoints.
//! The endpoints are lifted into camera space to measure length, height above
//! the feet and tilt, and a detection is only reported when the bar is longer
//! than the lifter's arm span and close to horizontal.

use crate::{
    config::{LocatorConfig, SensorGeometry},
    error::LocatorError,
    geometry,
    mapping::CoordinateMapper,
    types::{BarDetection, CameraPoint, DepthPoint, JointKind, PointTriple, Skeleton},
};

const ARM_JOINTS: [JointKind; 6] = [
    JointKind::ShoulderLeft,
    JointKind::ShoulderRight,
    JointKind::ElbowLeft,
    JointKind::ElbowRight,
    JointKind::HandLeft,
    JointKind::HandRight,
];

/// Handle returned by [`BarLocator::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(&BarDetection) + Send>;

/// A foreground pixel on the depth grid together with its raw sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct ScanHit {
    x: i64,
    y: i64,
    distance: u16,
}

impl ScanHit {
    fn depth_point(&self) -> DepthPoint {
        DepthPoint::new(self.x as f32, self.y as f32)
    }
}

/// Running leftmost/rightmost fold over candidates in raster order.
///
/// Ties keep the first-seen hit, so the result depends on scan order.
#[derive(Debug, Default)]
struct EndpointScan {
    extremes: Option<(ScanHit, ScanHit)>,
}

impl EndpointScan {
    fn observe(&mut self, hit: ScanHit) {
        match &mut self.extremes {
            None => self.extremes = Some((hit, hit)),
            Some((min, max)) => {
                if hit.x < min.x {
                    *min = hit;
                }
                if hit.x > max.x {
                    *max = hit;
                }
            }
        }
    }

    fn finish(self) -> Option<(ScanHit, ScanHit)> {
        self.extremes
    }
}

pub struct BarLocator<M> {
    mapper: M,
    geometry: SensorGeometry,
    cfg: LocatorConfig,
    color_to_depth: Vec<DepthPoint>,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: u64,
}

impl<M: CoordinateMapper> BarLocator<M> {
    pub fn new(mapper: M, geometry: SensorGeometry) -> Result<Self, LocatorError> {
        Self::with_config(mapper, geometry, LocatorConfig::default())
    }

    pub fn with_config(
        mapper: M,
        geometry: SensorGeometry,
        cfg: LocatorConfig,
    ) -> Result<Self, LocatorError> {
        geometry.validate()?;
        Ok(Self {
            mapper,
            geometry,
            cfg,
            color_to_depth: vec![DepthPoint::UNMAPPED; geometry.color_len()],
            listeners: Vec::new(),
            next_listener: 0,
        })
    }

    pub fn geometry(&self) -> &SensorGeometry {
        &self.geometry
    }

    pub fn config(&self) -> &LocatorConfig {
        &self.cfg
    }

    /// Registers a callback invoked synchronously, in subscription order, for
    /// every accepted detection.
    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&BarDetection) + Send + 'static,
    {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    /// Processes one frame. Frames whose buffers do not match the configured
    /// geometry are a caller bug: they assert in debug builds and are skipped
    /// in release builds.
    pub fn update(
        &mut self,
        depth: &[u16],
        body_index: &[u8],
        skeleton: &Skeleton,
    ) -> Option<BarDetection> {
        match self.try_update(depth, body_index, skeleton) {
            Ok(detection) => detection,
            Err(err) => {
                debug_assert!(false, "bar locator called with bad frame: {err}");
                log::warn!("skipping frame: {err}");
                None
            }
        }
    }

    pub fn try_update(
        &mut self,
        depth: &[u16],
        body_index: &[u8],
        skeleton: &Skeleton,
    ) -> Result<Option<BarDetection>, LocatorError> {
        let expected = self.geometry.depth_len();
        if depth.len() != expected {
            return Err(LocatorError::DepthSizeMismatch {
                got: depth.len(),
                expected,
            });
        }
        if body_index.len() != expected {
            return Err(LocatorError::BodyIndexSizeMismatch {
                got: body_index.len(),
                expected,
            });
        }

        let detection = self.locate(depth, body_index, skeleton);
        if let Some(detection) = &detection {
            for (_, listener) in self.listeners.iter_mut() {
                listener(detection);
            }
        }
        Ok(detection)
    }

    fn locate(
        &mut self,
        depth: &[u16],
        body_index: &[u8],
        skeleton: &Skeleton,
    ) -> Option<BarDetection> {
        let waist = skeleton.joint(JointKind::SpineBase);
        if !waist.is_tracked() {
            log::trace!("spine base not tracked");
            return None;
        }
        let z = waist.position.z;
        if !(self.cfg.min_distance..=self.cfg.max_distance).contains(&z) {
            log::trace!("lifter at {z:.2} m is outside the capture volume");
            return None;
        }

        let hand_length = arm_span(skeleton);

        let Some((min_hit, max_hit)) = self.scan_endpoints(depth, body_index) else {
            log::trace!("no foreground pixels");
            return None;
        };

        let minimum = self.lift(min_hit);
        let maximum = self.lift(max_hit);
        if !(minimum.camera.is_finite() && maximum.camera.is_finite()) {
            log::debug!("bar endpoint has no valid camera-space position");
            return None;
        }
        let trail = minimum.midpoint(&maximum);

        let foot_left = skeleton.joint(JointKind::FootLeft).position;
        let foot_right = skeleton.joint(JointKind::FootRight).position;
        let feet = geometry::midpoint(foot_left, foot_right);
        let projection = CameraPoint::new(trail.camera.x, feet.y, trail.camera.z);

        let bar_length = geometry::distance(minimum.camera, maximum.camera);
        let bar_height =
            geometry::distance(trail.camera, projection) + self.cfg.height_offset;
        let angle = tilt(minimum.camera, maximum.camera)?;

        if !(bar_length.is_finite() && bar_height.is_finite()) {
            return None;
        }
        if !(bar_length > hand_length && angle.abs() < self.cfg.max_angle) {
            log::debug!(
                "rejected bar candidate: length {bar_length:.3} m (arm span {hand_length:.3} m), angle {angle:.1}"
            );
            return None;
        }

        Some(BarDetection {
            minimum,
            maximum,
            trail,
            bar_length,
            bar_height,
            angle,
        })
    }

    fn scan_endpoints(&mut self, depth: &[u16], body_index: &[u8]) -> Option<(ScanHit, ScanHit)> {
        self.mapper
            .map_color_frame_to_depth_space(depth, &mut self.color_to_depth);

        let width = self.geometry.depth_width as i64;
        let height = self.geometry.depth_height as i64;
        let mut scan = EndpointScan::default();

        for point in &self.color_to_depth {
            if !point.is_mapped() {
                continue;
            }
            let x = (point.x + 0.5).floor() as i64;
            let y = (point.y + 0.5).floor() as i64;
            if x < 0 || x >= width || y < 0 || y >= height {
                continue;
            }

            let index = (y * width + x) as usize;
            if body_index[index] == self.cfg.no_body {
                continue;
            }
            scan.observe(ScanHit {
                x,
                y,
                distance: depth[index],
            });
        }

        scan.finish()
    }

    fn lift(&self, hit: ScanHit) -> PointTriple {
        let depth = hit.depth_point();
        PointTriple {
            depth,
            color: self
                .mapper
                .map_depth_point_to_color_space(depth, hit.distance),
            camera: self
                .mapper
                .map_depth_point_to_camera_space(depth, hit.distance),
        }
    }
}

/// Shoulder-to-shoulder plus both upper arms and forearms, or zero when any
/// arm joint is lost.
pub fn arm_span(skeleton: &Skeleton) -> f64 {
    if !skeleton.all_tracked(&ARM_JOINTS) {
        return 0.0;
    }
    let at = |kind| skeleton.joint(kind).position;

    geometry::distance(at(JointKind::ShoulderLeft), at(JointKind::ShoulderRight))
        + geometry::distance(at(JointKind::ShoulderLeft), at(JointKind::ElbowLeft))
        + geometry::distance(at(JointKind::ShoulderRight), at(JointKind::ElbowRight))
        + geometry::distance(at(JointKind::ElbowLeft), at(JointKind::HandLeft))
        + geometry::distance(at(JointKind::ElbowRight), at(JointKind::HandRight))
}

/// Signed tilt of the bar in degrees, measured against a level reference
/// point under the right end. Negative when the left end is lower.
fn tilt(left: CameraPoint, right: CameraPoint) -> Option<f64> {
    let level = CameraPoint::new(right.x, left.y, (left.z + right.z) / 2.0);
    let mut angle = geometry::angle_between(left, right, level)?;
    if angle > 180.0 {
        angle = 360.0 - angle;
    }
    if left.y < right.y {
        angle = -angle;
    }
    Some(angle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(x: i64, y: i64) -> ScanHit {
        ScanHit { x, y, distance: 1 }
    }

    #[test]
    fn empty_scan_finds_nothing() {
        assert_eq!(EndpointScan::default().finish(), None);
    }

    #[test]
    fn single_candidate_is_both_extremes() {
        let mut scan = EndpointScan::default();
        scan.observe(hit(7, 3));
        assert_eq!(scan.finish(), Some((hit(7, 3), hit(7, 3))));
    }

    #[test]
    fn ties_keep_first_seen() {
        let mut scan = EndpointScan::default();
        for h in [hit(5, 0), hit(2, 1), hit(9, 1), hit(2, 2), hit(9, 3), hit(4, 4)] {
            scan.observe(h);
        }
        assert_eq!(scan.finish(), Some((hit(2, 1), hit(9, 1))));
    }

    #[test]
    fn level_bar_has_zero_tilt() {
        let angle = tilt(CameraPoint::new(-0.5, 1.0, 3.0), CameraPoint::new(0.5, 1.0, 3.0));
        assert!(angle.unwrap().abs() < 1e-9);
    }

    #[test]
    fn tilt_sign_follows_left_end() {
        let low_left = tilt(CameraPoint::new(-0.5, 0.9, 3.0), CameraPoint::new(0.5, 1.1, 3.0));
        let high_left = tilt(CameraPoint::new(-0.5, 1.1, 3.0), CameraPoint::new(0.5, 0.9, 3.0));
        let low_left = low_left.unwrap();
        let high_left = high_left.unwrap();
        assert!(low_left < 0.0);
        assert!(high_left > 0.0);
        // atan(0.2 / 1.0)
        assert!((high_left - 11.309932).abs() < 1e-3);
        assert!((low_left + high_left).abs() < 1e-6);
    }

    #[test]
    fn coincident_endpoints_have_no_tilt() {
        let p = CameraPoint::new(0.1, 0.2, 3.0);
        assert_eq!(tilt(p, p), None);
    }

    #[test]
    fn arm_span_needs_every_arm_joint() {
        let skeleton = Skeleton::new()
            .with_joint(JointKind::ShoulderLeft, CameraPoint::new(-0.2, 1.4, 3.0))
            .with_joint(JointKind::ShoulderRight, CameraPoint::new(0.2, 1.4, 3.0));
        assert_eq!(arm_span(&skeleton), 0.0);

        let skeleton = skeleton
            .with_joint(JointKind::ElbowLeft, CameraPoint::new(-0.5, 1.4, 3.0))
            .with_joint(JointKind::ElbowRight, CameraPoint::new(0.5, 1.4, 3.0))
            .with_joint(JointKind::HandLeft, CameraPoint::new(-0.5, 1.7, 3.0))
            .with_joint(JointKind::HandRight, CameraPoint::new(0.5, 1.7, 3.0));
        // 0.4 + 0.3 + 0.3 + 0.3 + 0.3
        assert!((arm_span(&skeleton) - 1.6).abs() < 1e-5);
    }
}
