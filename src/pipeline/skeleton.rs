use crate::types::{JointId, JointTrackingState, Position3D, Skeleton};

pub const BONES: &[(JointId, JointId)] = &[
    (JointId::Head, JointId::ShoulderCenter),
    (JointId::ShoulderCenter, JointId::Spine),
    (JointId::Spine, JointId::HipCenter),
    (JointId::ShoulderCenter, JointId::ShoulderLeft),
    (JointId::ShoulderLeft, JointId::ElbowLeft),
    (JointId::ElbowLeft, JointId::WristLeft),
    (JointId::WristLeft, JointId::HandLeft),
    (JointId::ShoulderCenter, JointId::ShoulderRight),
    (JointId::ShoulderRight, JointId::ElbowRight),
    (JointId::ElbowRight, JointId::WristRight),
    (JointId::WristRight, JointId::HandRight),
    (JointId::HipCenter, JointId::HipLeft),
    (JointId::HipLeft, JointId::KneeLeft),
    (JointId::KneeLeft, JointId::AnkleLeft),
    (JointId::AnkleLeft, JointId::FootLeft),
    (JointId::HipCenter, JointId::HipRight),
    (JointId::HipRight, JointId::KneeRight),
    (JointId::KneeRight, JointId::AnkleRight),
    (JointId::AnkleRight, JointId::FootRight),
];

// Nominal color camera focal length at the 640x480 reference resolution.
const NOMINAL_FOCAL_LENGTH: f32 = 531.15;
const BASE_WIDTH: f32 = 640.0;
const MIN_DEPTH: f32 = 0.1;

/// Projects a sensor-space point onto a color image of the given size.
/// Points behind or too close to the sensor have no projection.
pub fn project_to_color(position: Position3D, width: u32, height: u32) -> Option<(f32, f32)> {
    if position.z < MIN_DEPTH {
        return None;
    }
    let focal = NOMINAL_FOCAL_LENGTH * (width as f32 / BASE_WIDTH);
    let px = width as f32 / 2.0 + position.x / position.z * focal;
    let py = height as f32 / 2.0 - position.y / position.z * focal;
    Some((px, py))
}

/// Image-space points for every joint, indexed by `JointId`. Joints the
/// sensor did not see are left out.
pub fn overlay_points(skeleton: &Skeleton, width: u32, height: u32) -> Vec<Option<(f32, f32)>> {
    JointId::ALL
        .iter()
        .map(|joint| {
            let entry = skeleton[*joint];
            if entry.tracking == JointTrackingState::NotTracked {
                None
            } else {
                project_to_color(entry.position, width, height)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_on_axis_lands_in_center() {
        assert_eq!(
            project_to_color(Position3D::new(0.0, 0.0, 2.0), 640, 480),
            Some((320.0, 240.0))
        );
    }

    #[test]
    fn up_is_toward_the_top_of_the_image() {
        let (_, y) = project_to_color(Position3D::new(0.0, 0.5, 2.0), 640, 480).unwrap();
        assert!(y < 240.0);
    }

    #[test]
    fn points_at_the_sensor_are_dropped() {
        assert_eq!(project_to_color(Position3D::new(0.2, 0.2, 0.0), 640, 480), None);
    }

    #[test]
    fn untracked_joints_are_left_out() {
        let mut skeleton = Skeleton::default();
        skeleton[JointId::Head].position = Position3D::new(0.0, 0.4, 2.0);
        skeleton[JointId::Head].tracking = JointTrackingState::Tracked;

        let points = overlay_points(&skeleton, 640, 480);
        assert_eq!(points.len(), JointId::COUNT);
        assert!(points[JointId::Head.index()].is_some());
        assert!(points[JointId::HipCenter.index()].is_none());
    }
}
