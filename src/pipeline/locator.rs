use std::thread;

use crossbeam_channel::{Receiver, Sender};

use crate::{
    body::{position_hint, select_body},
    config::TrackingConfig,
    detector::BarLocator,
    mapping::CoordinateMapper,
    smoother::TemporalSmoother,
    types::{SensorFrame, TrackedFrame},
};

struct DetectionSmoothing {
    height: TemporalSmoother,
    angle: TemporalSmoother,
    strict: bool,
}

impl DetectionSmoothing {
    fn new(cfg: &TrackingConfig) -> anyhow::Result<Self> {
        Ok(Self {
            height: TemporalSmoother::from_config(&cfg.height)?,
            angle: TemporalSmoother::from_config(&cfg.angle)?,
            strict: cfg.strict,
        })
    }
}

/// Spawns the worker that turns sensor frames into tracked frames. The worker
/// exits once `frame_rx` disconnects.
pub fn start_locator<M>(
    locator: BarLocator<M>,
    tracking: TrackingConfig,
    frame_rx: Receiver<SensorFrame>,
    result_tx: Sender<TrackedFrame>,
) -> anyhow::Result<thread::JoinHandle<()>>
where
    M: CoordinateMapper + Send + 'static,
{
    let smoothing = DetectionSmoothing::new(&tracking)?;
    let geometry = *locator.geometry();
    log::info!(
        "starting bar locator: color {}x{}, depth {}x{}",
        geometry.color_width,
        geometry.color_height,
        geometry.depth_width,
        geometry.depth_height
    );

    Ok(thread::spawn(move || {
        run_worker_loop(locator, smoothing, frame_rx, result_tx)
    }))
}

fn run_worker_loop<M: CoordinateMapper>(
    mut locator: BarLocator<M>,
    mut smoothing: DetectionSmoothing,
    frame_rx: Receiver<SensorFrame>,
    result_tx: Sender<TrackedFrame>,
) {
    while let Some(frame) = recv_latest_frame(&frame_rx) {
        let tracked = process_frame(&mut locator, &mut smoothing, frame);
        if result_tx.send(tracked).is_err() {
            break;
        }
    }
    log::info!("bar locator stopped");
}

fn process_frame<M: CoordinateMapper>(
    locator: &mut BarLocator<M>,
    smoothing: &mut DetectionSmoothing,
    frame: SensorFrame,
) -> TrackedFrame {
    let body = select_body(&frame.bodies);
    let hint = position_hint(body, locator.config());

    let detection = match body {
        Some(body) => match locator.try_update(&frame.depth, &frame.body_index, body) {
            Ok(detection) => detection,
            Err(err) => {
                log::warn!("dropping frame: {err}");
                None
            }
        },
        None => None,
    };

    let (smoothed_height, smoothed_angle) = match &detection {
        Some(d) => (
            Some(smoothing.height.smooth(d.bar_height, smoothing.strict)),
            Some(smoothing.angle.smooth(d.angle, smoothing.strict)),
        ),
        None => (None, None),
    };

    TrackedFrame {
        timestamp: frame.timestamp,
        hint,
        detection,
        smoothed_height,
        smoothed_angle,
        color: frame.color,
    }
}

fn recv_latest_frame(frame_rx: &Receiver<SensorFrame>) -> Option<SensorFrame> {
    let mut frame = frame_rx.recv().ok()?;
    // Drop stale frames if the locator is still busy to avoid backlog.
    while let Ok(newer) = frame_rx.try_recv() {
        frame = newer;
    }
    Some(frame)
}
