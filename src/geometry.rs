//! Distance and angle helpers over camera-space points.

use crate::types::CameraPoint;

fn sub(a: CameraPoint, b: CameraPoint) -> [f64; 3] {
    [
        a.x as f64 - b.x as f64,
        a.y as f64 - b.y as f64,
        a.z as f64 - b.z as f64,
    ]
}

fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn norm(v: [f64; 3]) -> f64 {
    dot(v, v).sqrt()
}

/// Euclidean distance in meters.
pub fn distance(a: CameraPoint, b: CameraPoint) -> f64 {
    norm(sub(a, b))
}

/// Angle in degrees, within `[0, 180]`, between `a - vertex` and `b - vertex`.
///
/// Uses `atan2(|u x v|, u . v)`, which stays accurate for nearly parallel
/// vectors where `acos` loses precision. Returns `None` when either vector has
/// zero length or the inputs are not finite.
pub fn angle_between(vertex: CameraPoint, a: CameraPoint, b: CameraPoint) -> Option<f64> {
    let u = sub(a, vertex);
    let v = sub(b, vertex);
    let (len_u, len_v) = (norm(u), norm(v));
    if !(len_u.is_finite() && len_v.is_finite()) || len_u == 0.0 || len_v == 0.0 {
        return None;
    }

    let angle = norm(cross(u, v)).atan2(dot(u, v)).to_degrees();
    angle.is_finite().then_some(angle)
}

pub fn midpoint(a: CameraPoint, b: CameraPoint) -> CameraPoint {
    CameraPoint::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0, (a.z + b.z) / 2.0)
}
