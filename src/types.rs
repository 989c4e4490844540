use std::time::Instant;

/// Pixel coordinate on the depth sensor grid.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DepthPoint {
    pub x: f32,
    pub y: f32,
}

impl DepthPoint {
    /// Marker written by a mapper for color pixels without a depth reading.
    pub const UNMAPPED: DepthPoint = DepthPoint {
        x: f32::NEG_INFINITY,
        y: f32::NEG_INFINITY,
    };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn is_mapped(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Pixel coordinate on the color camera grid.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ColorPoint {
    pub x: f32,
    pub y: f32,
}

impl ColorPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Metric point in sensor-centred camera space (meters, Y up, Z away from the sensor).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CameraPoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl CameraPoint {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// One physical point expressed in all three coordinate systems at once.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PointTriple {
    pub depth: DepthPoint,
    pub color: ColorPoint,
    pub camera: CameraPoint,
}

impl PointTriple {
    /// Componentwise midpoint, taken independently in every coordinate system.
    pub fn midpoint(&self, other: &PointTriple) -> PointTriple {
        PointTriple {
            depth: DepthPoint::new(
                (self.depth.x + other.depth.x) / 2.0,
                (self.depth.y + other.depth.y) / 2.0,
            ),
            color: ColorPoint::new(
                (self.color.x + other.color.x) / 2.0,
                (self.color.y + other.color.y) / 2.0,
            ),
            camera: crate::geometry::midpoint(self.camera, other.camera),
        }
    }
}

/// Geometry of an accepted bar detection.
///
/// `minimum` is the leftmost foreground point on the depth grid and `maximum`
/// the rightmost one; `trail` is their midpoint.
#[derive(Clone, Debug, PartialEq)]
pub struct BarDetection {
    pub minimum: PointTriple,
    pub maximum: PointTriple,
    pub trail: PointTriple,
    /// Meters between the two endpoints.
    pub bar_length: f64,
    /// Meters from the bar midpoint down to foot level, calibration offset included.
    pub bar_height: f64,
    /// Signed tilt in degrees; negative when the left end sits lower than the right.
    pub angle: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TrackingState {
    #[default]
    NotTracked,
    Inferred,
    Tracked,
}

/// Skeleton joints in the order the body tracker reports them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum JointKind {
    SpineBase,
    SpineMid,
    Neck,
    Head,
    ShoulderLeft,
    ElbowLeft,
    WristLeft,
    HandLeft,
    ShoulderRight,
    ElbowRight,
    WristRight,
    HandRight,
    HipLeft,
    KneeLeft,
    AnkleLeft,
    FootLeft,
    HipRight,
    KneeRight,
    AnkleRight,
    FootRight,
    SpineShoulder,
    HandTipLeft,
    ThumbLeft,
    HandTipRight,
    ThumbRight,
}

impl JointKind {
    pub const COUNT: usize = 25;

    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Joint {
    pub position: CameraPoint,
    pub state: TrackingState,
}

impl Joint {
    pub fn is_tracked(&self) -> bool {
        self.state != TrackingState::NotTracked
    }
}

/// One tracked person: a position and tracking state for every joint.
#[derive(Clone, Debug, PartialEq)]
pub struct Skeleton {
    pub tracked: bool,
    joints: [Joint; JointKind::COUNT],
}

impl Default for Skeleton {
    fn default() -> Self {
        Self::new()
    }
}

impl Skeleton {
    /// A tracked body with every joint still `NotTracked`.
    pub fn new() -> Self {
        Self {
            tracked: true,
            joints: [Joint::default(); JointKind::COUNT],
        }
    }

    pub fn joint(&self, kind: JointKind) -> Joint {
        self.joints[kind.index()]
    }

    pub fn set_joint(&mut self, kind: JointKind, position: CameraPoint, state: TrackingState) {
        self.joints[kind.index()] = Joint { position, state };
    }

    pub fn with_joint(mut self, kind: JointKind, position: CameraPoint) -> Self {
        self.set_joint(kind, position, TrackingState::Tracked);
        self
    }

    pub fn all_tracked(&self, kinds: &[JointKind]) -> bool {
        kinds.iter().all(|kind| self.joint(*kind).is_tracked())
    }
}

/// One synchronized multi-source sensor frame.
#[derive(Clone, Debug)]
pub struct SensorFrame {
    pub depth: Vec<u16>,
    pub body_index: Vec<u8>,
    pub bodies: Vec<Skeleton>,
    /// Optional RGBA8 image at color resolution, only used for overlays.
    pub color: Option<Vec<u8>>,
    pub timestamp: Instant,
}

/// Whether the lifter stands inside the supported capture volume.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PositionHint {
    NoBody,
    InRange,
    MoveBackwards,
}

impl PositionHint {
    pub fn label(&self) -> &'static str {
        match self {
            PositionHint::NoBody => "NO BODY",
            PositionHint::InRange => "",
            PositionHint::MoveBackwards => "MOVE BACKWARDS",
        }
    }
}

/// Per-frame output of the locator worker.
#[derive(Clone, Debug)]
pub struct TrackedFrame {
    pub timestamp: Instant,
    pub hint: PositionHint,
    pub detection: Option<BarDetection>,
    pub smoothed_height: Option<f64>,
    pub smoothed_angle: Option<f64>,
    pub color: Option<Vec<u8>>,
}
