//! Synthetic frame source: one lifter raising and lowering a bar in front of
//! a flat wall, rendered through a pinhole sensor model.

use std::{
    f32::consts::PI,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::{Duration, Instant},
};

use crossbeam_channel::{Sender, TrySendError};
use rayon::prelude::*;

use crate::{
    config::SensorGeometry,
    mapping::{CameraIntrinsics, PinholeMapper},
    types::{CameraPoint, JointKind, SensorFrame, Skeleton},
};

const WALL_DEPTH_MM: u16 = 4_500;
const NO_BODY: u8 = 0xFF;
const LIFTER: u8 = 0;
const BAR_HALF_THICKNESS_PX: f32 = 2.0;
const SHOULDER_HALF_WIDTH: f32 = 0.2;
const TORSO_HALF_WIDTH: f32 = 0.2;
const UPPER_ARM: f32 = 0.3;
const FOREARM: f32 = 0.28;
const GRIP_HALF_WIDTH: f32 = 0.4;

#[derive(Clone, Debug)]
pub struct LiftScene {
    pub geometry: SensorGeometry,
    pub intrinsics: CameraIntrinsics,
    /// Spine-base distance from the sensor, meters.
    pub distance: f32,
    /// Camera-space Y of the floor, meters.
    pub floor_y: f32,
    pub bar_length: f32,
    /// Lowest and highest bar-center height above the floor, meters.
    pub lowest: f32,
    pub highest: f32,
    /// Largest tilt reached during a repetition, degrees.
    pub max_tilt: f32,
    /// Duration of one full repetition.
    pub period: Duration,
}

impl Default for LiftScene {
    fn default() -> Self {
        Self {
            geometry: SensorGeometry::new(960, 540, 512, 424),
            intrinsics: CameraIntrinsics::kinect_v2(),
            distance: 3.0,
            floor_y: -0.9,
            bar_length: 2.2,
            lowest: 0.25,
            highest: 1.9,
            max_tilt: 4.0,
            period: Duration::from_secs(3),
        }
    }
}

/// Camera-space state of the scene at one instant.
#[derive(Clone, Copy, Debug)]
struct Pose {
    bar_left: CameraPoint,
    bar_right: CameraPoint,
}

impl Pose {
    fn point_on_bar(&self, x: f32) -> CameraPoint {
        let t = (x - self.bar_left.x) / (self.bar_right.x - self.bar_left.x);
        CameraPoint::new(
            x,
            lerp(self.bar_left.y, self.bar_right.y, t),
            self.bar_left.z,
        )
    }
}

impl LiftScene {
    pub fn mapper(&self) -> PinholeMapper {
        PinholeMapper::new(self.intrinsics, self.geometry)
    }

    fn phase(&self, elapsed: Duration) -> f32 {
        let period = self.period.as_secs_f32().max(f32::EPSILON);
        (elapsed.as_secs_f32() / period).fract()
    }

    /// Bar-center height above the floor at `elapsed`, meters.
    pub fn bar_height_at(&self, elapsed: Duration) -> f32 {
        let phase = self.phase(elapsed);
        self.lowest + (self.highest - self.lowest) * (1.0 - (2.0 * PI * phase).cos()) / 2.0
    }

    fn pose_at(&self, elapsed: Duration) -> Pose {
        let center_y = self.floor_y + self.bar_height_at(elapsed);
        let tilt = (self.max_tilt * (2.0 * PI * self.phase(elapsed)).sin()).to_radians();
        let half = self.bar_length / 2.0;
        let bar_z = self.distance - 0.2;
        Pose {
            bar_left: CameraPoint::new(-half * tilt.cos(), center_y - half * tilt.sin(), bar_z),
            bar_right: CameraPoint::new(half * tilt.cos(), center_y + half * tilt.sin(), bar_z),
        }
    }

    fn skeleton(&self, pose: &Pose) -> Skeleton {
        let z = self.distance;
        let floor = self.floor_y;
        let shoulder_y = floor + 1.45;
        let mut skeleton = Skeleton::new()
            .with_joint(JointKind::SpineBase, CameraPoint::new(0.0, floor + 1.0, z))
            .with_joint(JointKind::SpineShoulder, CameraPoint::new(0.0, shoulder_y, z))
            .with_joint(JointKind::Head, CameraPoint::new(0.0, floor + 1.7, z))
            .with_joint(JointKind::FootLeft, CameraPoint::new(-0.15, floor, z))
            .with_joint(JointKind::FootRight, CameraPoint::new(0.15, floor, z));

        let arms = [
            (JointKind::ShoulderLeft, JointKind::ElbowLeft, JointKind::HandLeft, -1.0),
            (JointKind::ShoulderRight, JointKind::ElbowRight, JointKind::HandRight, 1.0),
        ];
        for (shoulder_kind, elbow_kind, hand_kind, side) in arms {
            let shoulder = CameraPoint::new(side * SHOULDER_HALF_WIDTH, shoulder_y, z);
            let grip = pose.point_on_bar(side * GRIP_HALF_WIDTH);
            let dir = unit(shoulder, grip);
            let elbow = offset(shoulder, dir, UPPER_ARM);
            let hand = offset(elbow, dir, FOREARM);
            skeleton = skeleton
                .with_joint(shoulder_kind, shoulder)
                .with_joint(elbow_kind, elbow)
                .with_joint(hand_kind, hand);
        }
        skeleton
    }

    /// Renders the scene as the sensor would see it `elapsed` into a repetition.
    pub fn render(&self, elapsed: Duration) -> SensorFrame {
        let pose = self.pose_at(elapsed);
        let mapper = self.mapper();
        let g = self.geometry;

        let body_depth = (self.distance * 1000.0) as u16;
        let bar_depth = (pose.bar_left.z * 1000.0) as u16;
        let torso = [
            CameraPoint::new(-TORSO_HALF_WIDTH, self.floor_y + 1.75, self.distance),
            CameraPoint::new(TORSO_HALF_WIDTH, self.floor_y, self.distance),
        ]
        .map(|corner| mapper.camera_to_depth(corner));
        let bar = [pose.bar_left, pose.bar_right].map(|end| mapper.camera_to_depth(end));

        let mut depth = vec![WALL_DEPTH_MM; g.depth_len()];
        let mut body_index = vec![NO_BODY; g.depth_len()];

        depth
            .par_chunks_mut(g.depth_width)
            .zip(body_index.par_chunks_mut(g.depth_width))
            .enumerate()
            .for_each(|(row, (depth_row, index_row))| {
                let y = row as f32;
                for (col, (d, label)) in depth_row.iter_mut().zip(index_row.iter_mut()).enumerate() {
                    let x = col as f32;
                    if let [Some(left), Some(right)] = bar {
                        if x >= left.x && x <= right.x {
                            let t = (x - left.x) / (right.x - left.x).max(f32::EPSILON);
                            if (y - lerp(left.y, right.y, t)).abs() <= BAR_HALF_THICKNESS_PX {
                                *d = bar_depth;
                                *label = LIFTER;
                                continue;
                            }
                        }
                    }
                    if let [Some(top_left), Some(bottom_right)] = torso {
                        if x >= top_left.x
                            && x <= bottom_right.x
                            && y >= top_left.y
                            && y <= bottom_right.y
                        {
                            *d = body_depth;
                            *label = LIFTER;
                        }
                    }
                }
            });

        let color = render_color(&g, &body_index);

        SensorFrame {
            depth,
            body_index,
            bodies: vec![self.skeleton(&pose)],
            color: Some(color),
            timestamp: Instant::now(),
        }
    }
}

fn render_color(g: &SensorGeometry, body_index: &[u8]) -> Vec<u8> {
    let mut rgba = vec![0u8; g.color_len() * 4];
    let sx = g.depth_width as f32 / g.color_width as f32;
    let sy = g.depth_height as f32 / g.color_height as f32;

    rgba.par_chunks_mut(g.color_width * 4)
        .enumerate()
        .for_each(|(row, pixels)| {
            let depth_y = ((row as f32 + 0.5) * sy) as usize;
            for (col, px) in pixels.chunks_exact_mut(4).enumerate() {
                let depth_x = ((col as f32 + 0.5) * sx) as usize;
                let label = body_index
                    .get(depth_y * g.depth_width + depth_x)
                    .copied()
                    .unwrap_or(NO_BODY);
                let shade = if label == NO_BODY { 70 } else { 160 };
                px.copy_from_slice(&[shade, shade, shade, 255]);
            }
        });
    rgba
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

fn unit(from: CameraPoint, to: CameraPoint) -> [f32; 3] {
    let v = [to.x - from.x, to.y - from.y, to.z - from.z];
    let len = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if len < 1e-5 {
        [0.0, -1.0, 0.0]
    } else {
        [v[0] / len, v[1] / len, v[2] / len]
    }
}

fn offset(p: CameraPoint, dir: [f32; 3], length: f32) -> CameraPoint {
    CameraPoint::new(
        p.x + dir[0] * length,
        p.y + dir[1] * length,
        p.z + dir[2] * length,
    )
}

#[derive(Debug)]
pub struct SyntheticLift {
    stop: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl SyntheticLift {
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for SyntheticLift {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Streams frames of `scene` at `fps` until stopped. Frames are dropped while
/// the consumer is busy.
pub fn start_synthetic_lift(
    scene: LiftScene,
    fps: u32,
    frame_tx: Sender<SensorFrame>,
) -> SyntheticLift {
    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = stop.clone();
    let frame_interval = Duration::from_secs_f64(1.0 / fps.max(1) as f64);

    let handle = thread::spawn(move || {
        log::info!(
            "synthetic lift source started at {fps} fps ({}x{} depth)",
            scene.geometry.depth_width,
            scene.geometry.depth_height
        );
        let start = Instant::now();

        while !stop_flag.load(Ordering::Relaxed) {
            let frame_start = Instant::now();
            let frame = scene.render(start.elapsed());

            // Drop if the locator is busy, otherwise forward every frame.
            if let Err(TrySendError::Disconnected(_)) = frame_tx.try_send(frame) {
                log::info!("frame consumer disconnected");
                break;
            }

            if let Some(rest) = frame_interval.checked_sub(frame_start.elapsed()) {
                thread::sleep(rest);
            }
        }
    });

    SyntheticLift {
        stop,
        handle: Some(handle),
    }
}
