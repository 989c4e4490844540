//! Conversions between the depth grid, the color grid and camera space.

use crate::{
    config::SensorGeometry,
    types::{CameraPoint, ColorPoint, DepthPoint},
};

/// Coordinate conversions provided by the sensor runtime.
///
/// Depth samples are raw sensor distances in millimeters.
pub trait CoordinateMapper {
    /// Fills `out` (one entry per color pixel, row-major) with the depth pixel
    /// each color pixel corresponds to, or [`DepthPoint::UNMAPPED`].
    fn map_color_frame_to_depth_space(&self, depth: &[u16], out: &mut [DepthPoint]);

    fn map_depth_point_to_camera_space(&self, point: DepthPoint, depth: u16) -> CameraPoint;

    fn map_depth_point_to_color_space(&self, point: DepthPoint, depth: u16) -> ColorPoint;
}

/// Pinhole intrinsics of the depth sensor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraIntrinsics {
    pub fx: f32,
    pub fy: f32,
    pub cx: f32,
    pub cy: f32,
}

impl CameraIntrinsics {
    /// Typical values for a 512x424 time-of-flight depth sensor.
    pub fn kinect_v2() -> Self {
        Self {
            fx: 365.5,
            fy: 365.5,
            cx: 256.0,
            cy: 212.0,
        }
    }
}

impl Default for CameraIntrinsics {
    fn default() -> Self {
        Self::kinect_v2()
    }
}

/// Mapper for co-located depth and color sensors sharing one field of view.
///
/// Color pixels map to depth pixels by resolution scaling of pixel centers;
/// parallax between the two sensors is ignored.
#[derive(Clone, Debug)]
pub struct PinholeMapper {
    intrinsics: CameraIntrinsics,
    geometry: SensorGeometry,
    scale_x: f32,
    scale_y: f32,
}

impl PinholeMapper {
    pub fn new(intrinsics: CameraIntrinsics, geometry: SensorGeometry) -> Self {
        let scale_x = geometry.depth_width as f32 / geometry.color_width.max(1) as f32;
        let scale_y = geometry.depth_height as f32 / geometry.color_height.max(1) as f32;
        Self {
            intrinsics,
            geometry,
            scale_x,
            scale_y,
        }
    }

    pub fn intrinsics(&self) -> &CameraIntrinsics {
        &self.intrinsics
    }

    pub fn geometry(&self) -> &SensorGeometry {
        &self.geometry
    }

    /// Projects a camera-space point onto the depth grid.
    pub fn camera_to_depth(&self, point: CameraPoint) -> Option<DepthPoint> {
        if point.z <= 0.0 || !point.is_finite() {
            return None;
        }
        let k = &self.intrinsics;
        Some(DepthPoint::new(
            point.x * k.fx / point.z + k.cx,
            -point.y * k.fy / point.z + k.cy,
        ))
    }

    fn depth_to_color(&self, point: DepthPoint) -> ColorPoint {
        ColorPoint::new(
            (point.x + 0.5) / self.scale_x - 0.5,
            (point.y + 0.5) / self.scale_y - 0.5,
        )
    }
}

impl CoordinateMapper for PinholeMapper {
    fn map_color_frame_to_depth_space(&self, depth: &[u16], out: &mut [DepthPoint]) {
        let g = &self.geometry;
        for (color_index, slot) in out.iter_mut().enumerate().take(g.color_len()) {
            let color_x = (color_index % g.color_width) as f32;
            let color_y = (color_index / g.color_width) as f32;
            let depth_x = (color_x + 0.5) * self.scale_x - 0.5;
            let depth_y = (color_y + 0.5) * self.scale_y - 0.5;

            let px = (depth_x + 0.5).floor();
            let py = (depth_y + 0.5).floor();
            let sample = if px >= 0.0
                && py >= 0.0
                && (px as usize) < g.depth_width
                && (py as usize) < g.depth_height
            {
                depth
                    .get(py as usize * g.depth_width + px as usize)
                    .copied()
                    .unwrap_or(0)
            } else {
                0
            };

            *slot = if sample == 0 {
                DepthPoint::UNMAPPED
            } else {
                DepthPoint::new(depth_x, depth_y)
            };
        }
    }

    fn map_depth_point_to_camera_space(&self, point: DepthPoint, depth: u16) -> CameraPoint {
        if depth == 0 {
            return CameraPoint::new(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY);
        }
        let k = &self.intrinsics;
        let z = depth as f32 / 1000.0;
        CameraPoint::new(
            (point.x - k.cx) * z / k.fx,
            -(point.y - k.cy) * z / k.fy,
            z,
        )
    }

    fn map_depth_point_to_color_space(&self, point: DepthPoint, depth: u16) -> ColorPoint {
        if depth == 0 {
            return ColorPoint::new(f32::NEG_INFINITY, f32::NEG_INFINITY);
        }
        self.depth_to_color(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapper(color: (usize, usize), depth: (usize, usize)) -> PinholeMapper {
        PinholeMapper::new(
            CameraIntrinsics {
                fx: 300.0,
                fy: 300.0,
                cx: depth.0 as f32 / 2.0,
                cy: depth.1 as f32 / 2.0,
            },
            SensorGeometry::new(color.0, color.1, depth.0, depth.1),
        )
    }

    #[test]
    fn same_resolution_is_identity() {
        let m = mapper((4, 3), (4, 3));
        let depth = vec![1000u16; 12];
        let mut out = vec![DepthPoint::default(); 12];
        m.map_color_frame_to_depth_space(&depth, &mut out);
        assert_eq!(out[5], DepthPoint::new(1.0, 1.0));
        assert_eq!(out[11], DepthPoint::new(3.0, 2.0));

        let color = m.map_depth_point_to_color_space(DepthPoint::new(3.0, 2.0), 1000);
        assert_eq!(color, ColorPoint::new(3.0, 2.0));
    }

    #[test]
    fn zero_depth_is_unmapped() {
        let m = mapper((2, 1), (2, 1));
        let depth = vec![0u16, 1500];
        let mut out = vec![DepthPoint::default(); 2];
        m.map_color_frame_to_depth_space(&depth, &mut out);
        assert!(!out[0].is_mapped());
        assert!(out[1].is_mapped());
        assert!(!m.map_depth_point_to_camera_space(out[1], 0).is_finite());
    }

    #[test]
    fn double_resolution_color_maps_to_half_pixels() {
        let m = mapper((8, 6), (4, 3));
        let depth = vec![2000u16; 12];
        let mut out = vec![DepthPoint::default(); 48];
        m.map_color_frame_to_depth_space(&depth, &mut out);
        assert_eq!(out[0], DepthPoint::new(-0.25, -0.25));
        assert_eq!(out[1], DepthPoint::new(0.25, -0.25));
    }

    #[test]
    fn camera_roundtrip_through_depth_grid() {
        let m = mapper((200, 100), (200, 100));
        let point = m.map_depth_point_to_camera_space(DepthPoint::new(150.0, 50.0), 3000);
        assert!((point.x - 0.5).abs() < 1e-6);
        assert!(point.y.abs() < 1e-6);
        assert!((point.z - 3.0).abs() < 1e-6);

        let back = m.camera_to_depth(point).unwrap();
        assert!((back.x - 150.0).abs() < 1e-3);
        assert!((back.y - 50.0).abs() < 1e-3);
    }
}
