use std::{
    env,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow};
use barbell_tracker::{
    BarLocator, TrackingConfig,
    overlay::{BAR_LINE_THICKNESS, BarOverlay, draw_overlay},
    pipeline::{LiftScene, start_locator, start_synthetic_lift},
    types::{PositionHint, TrackedFrame},
};
use crossbeam_channel::bounded;

const FPS: u32 = 30;
const FRAMES: usize = 180;

fn main() -> Result<()> {
    env_logger::init();

    let snapshot_path = env::args_os().nth(1).map(PathBuf::from);

    let scene = LiftScene::default();
    let geometry = scene.geometry;
    let locator = BarLocator::new(scene.mapper(), geometry)?;

    let (frame_tx, frame_rx) = bounded(1);
    let (result_tx, result_rx) = bounded(4);

    let worker = start_locator(locator, TrackingConfig::default(), frame_rx, result_tx)?;
    let source = start_synthetic_lift(scene, FPS, frame_tx);

    let mut last_detected: Option<TrackedFrame> = None;
    let mut detections = 0usize;
    for tracked in result_rx.iter().take(FRAMES) {
        if tracked.hint == PositionHint::MoveBackwards {
            log::warn!("{}", tracked.hint.label());
        }
        let (Some(height), Some(angle)) = (tracked.smoothed_height, tracked.smoothed_angle) else {
            continue;
        };
        let Some(detection) = &tracked.detection else {
            continue;
        };

        detections += 1;
        log::info!(
            "bar length {:.2} m, height {:.2} m (smoothed {:.2}), angle {:.1} (smoothed {:.1})",
            detection.bar_length,
            detection.bar_height,
            height,
            detection.angle,
            angle
        );
        last_detected = Some(tracked);
    }

    source.stop();
    drop(result_rx);
    worker
        .join()
        .map_err(|_| anyhow!("bar locator thread panicked"))?;

    log::info!("{detections} of {FRAMES} frames had a bar");

    if let Some(path) = snapshot_path {
        let tracked = last_detected.ok_or_else(|| anyhow!("no bar was detected"))?;
        save_snapshot(&path, &tracked, geometry.color_width as u32, geometry.color_height as u32)?;
        log::info!("wrote overlay snapshot to {}", path.display());
    }

    Ok(())
}

fn save_snapshot(path: &Path, tracked: &TrackedFrame, width: u32, height: u32) -> Result<()> {
    let mut rgba = tracked
        .color
        .clone()
        .ok_or_else(|| anyhow!("frame has no color image"))?;
    let detection = tracked
        .detection
        .as_ref()
        .ok_or_else(|| anyhow!("frame has no detection"))?;

    if let Some(overlay) =
        BarOverlay::from_detection(detection, height as f32, BAR_LINE_THICKNESS as f32)
    {
        log::info!("bar height label {}", overlay.label);
        draw_overlay(&mut rgba, width, height, &overlay);
    }

    let image = image::RgbaImage::from_raw(width, height, rgba)
        .ok_or_else(|| anyhow!("color buffer does not match {width}x{height}"))?;
    image
        .save(path)
        .with_context(|| format!("failed to write {}", path.display()))
}
