use crate::{
    config::LocatorConfig,
    types::{JointKind, PositionHint, Skeleton},
};

/// Picks the tracked body nearest the sensor, by spine-base depth.
pub fn select_body(bodies: &[Skeleton]) -> Option<&Skeleton> {
    bodies
        .iter()
        .filter(|body| body.tracked)
        .min_by(|a, b| {
            let za = a.joint(JointKind::SpineBase).position.z;
            let zb = b.joint(JointKind::SpineBase).position.z;
            za.total_cmp(&zb)
        })
}

pub fn position_hint(body: Option<&Skeleton>, cfg: &LocatorConfig) -> PositionHint {
    match body {
        None => PositionHint::NoBody,
        Some(body) if body.joint(JointKind::SpineBase).position.z < cfg.min_distance => {
            PositionHint::MoveBackwards
        }
        Some(_) => PositionHint::InRange,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CameraPoint;

    fn body_at(z: f32) -> Skeleton {
        Skeleton::new().with_joint(JointKind::SpineBase, CameraPoint::new(0.0, 0.0, z))
    }

    #[test]
    fn nearest_tracked_body_wins() {
        let mut untracked = body_at(1.0);
        untracked.tracked = false;
        let bodies = vec![body_at(3.5), untracked, body_at(2.5), body_at(4.0)];
        let selected = select_body(&bodies).unwrap();
        assert_eq!(selected.joint(JointKind::SpineBase).position.z, 2.5);
    }

    #[test]
    fn no_tracked_bodies() {
        let mut body = body_at(3.0);
        body.tracked = false;
        assert!(select_body(&[body]).is_none());
        assert!(select_body(&[]).is_none());
    }

    #[test]
    fn hint_asks_to_step_back_when_too_close() {
        let cfg = LocatorConfig::default();
        assert_eq!(position_hint(Some(&body_at(1.5)), &cfg), PositionHint::MoveBackwards);
        assert_eq!(position_hint(Some(&body_at(2.0)), &cfg), PositionHint::InRange);
        assert_eq!(position_hint(None, &cfg), PositionHint::NoBody);
    }
}
