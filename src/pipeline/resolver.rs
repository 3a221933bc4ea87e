use crate::types::{JointId, Position3D, Skeleton};

/// Position of `target`, either in sensor space or, when `relative` is set,
/// as an offset from the same skeleton's hip center.
pub fn resolve_position(skeleton: &Skeleton, target: JointId, relative: bool) -> Position3D {
    let position = skeleton[target].position;
    if relative {
        position - skeleton[JointId::HipCenter].position
    } else {
        position
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SkeletonTrackingState;

    const EPSILON: f32 = 1e-6;

    fn assert_close(actual: Position3D, expected: Position3D) {
        assert!(
            (actual.x - expected.x).abs() < EPSILON
                && (actual.y - expected.y).abs() < EPSILON
                && (actual.z - expected.z).abs() < EPSILON,
            "expected {expected:?}, got {actual:?}"
        );
    }

    fn posed_skeleton() -> Skeleton {
        let mut skeleton = Skeleton {
            tracking_state: SkeletonTrackingState::Tracked,
            ..Default::default()
        };
        for (idx, joint) in JointId::ALL.iter().enumerate() {
            let offset = idx as f32 * 0.05;
            skeleton[*joint].position = Position3D::new(0.1 + offset, -0.4 + offset, 2.2 - offset);
        }
        skeleton
    }

    #[test]
    fn absolute_mode_returns_raw_position() {
        let skeleton = posed_skeleton();
        for joint in JointId::ALL {
            assert_eq!(resolve_position(&skeleton, joint, false), skeleton[joint].position);
        }
    }

    #[test]
    fn relative_mode_subtracts_hip_center() {
        let skeleton = posed_skeleton();
        let hip = skeleton[JointId::HipCenter].position;
        for joint in JointId::ALL {
            let p = skeleton[joint].position;
            assert_eq!(
                resolve_position(&skeleton, joint, true),
                Position3D::new(p.x - hip.x, p.y - hip.y, p.z - hip.z)
            );
        }
    }

    #[test]
    fn hip_center_relative_to_itself_is_origin() {
        let skeleton = posed_skeleton();
        assert_eq!(
            resolve_position(&skeleton, JointId::HipCenter, true),
            Position3D::default()
        );
    }

    #[test]
    fn head_above_hip() {
        let mut skeleton = Skeleton::default();
        skeleton[JointId::HipCenter].position = Position3D::new(0.1, 0.2, 2.0);
        skeleton[JointId::Head].position = Position3D::new(0.1, 0.5, 2.0);

        assert_close(
            resolve_position(&skeleton, JointId::Head, true),
            Position3D::new(0.0, 0.3, 0.0),
        );
    }
}
