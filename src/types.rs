use std::{
    ops::{Index, IndexMut, Sub},
    time::Instant,
};

/// Number of skeleton slots the sensor reports per frame.
pub const SKELETON_SLOT_COUNT: usize = 6;

#[derive(Clone, Debug)]
pub struct ColorFrame {
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub timestamp: Instant,
}

/// One tick of the sensor. Either half may be missing when the device had
/// nothing new for that stream.
#[derive(Clone, Debug, Default)]
pub struct FrameSample {
    pub color: Option<ColorFrame>,
    pub skeletons: Option<SkeletonSet>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Position3D {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position3D {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

impl Sub for Position3D {
    type Output = Position3D;

    fn sub(self, rhs: Self) -> Self::Output {
        Position3D {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
            z: self.z - rhs.z,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum JointId {
    HipCenter,
    Spine,
    ShoulderCenter,
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
}

impl JointId {
    pub const COUNT: usize = 20;

    pub const ALL: [JointId; JointId::COUNT] = [
        JointId::HipCenter,
        JointId::Spine,
        JointId::ShoulderCenter,
        JointId::Head,
        JointId::ShoulderLeft,
        JointId::ElbowLeft,
        JointId::WristLeft,
        JointId::HandLeft,
        JointId::ShoulderRight,
        JointId::ElbowRight,
        JointId::WristRight,
        JointId::HandRight,
        JointId::HipLeft,
        JointId::KneeLeft,
        JointId::AnkleLeft,
        JointId::FootLeft,
        JointId::HipRight,
        JointId::KneeRight,
        JointId::AnkleRight,
        JointId::FootRight,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JointTrackingState {
    #[default]
    NotTracked,
    Inferred,
    Tracked,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Joint {
    pub position: Position3D,
    pub tracking: JointTrackingState,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SkeletonTrackingState {
    #[default]
    NotTracked,
    PositionOnly,
    Tracked,
}

/// A single body as reported by the sensor. Every joint has an entry, even
/// when the device could not see it; check `Joint::tracking` for confidence.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Skeleton {
    pub tracking_id: u32,
    pub tracking_state: SkeletonTrackingState,
    pub position: Position3D,
    pub joints: [Joint; JointId::COUNT],
}

impl Skeleton {
    pub fn is_tracked(&self) -> bool {
        self.tracking_state == SkeletonTrackingState::Tracked
    }
}

impl Index<JointId> for Skeleton {
    type Output = Joint;

    fn index(&self, joint: JointId) -> &Joint {
        &self.joints[joint.index()]
    }
}

impl IndexMut<JointId> for Skeleton {
    fn index_mut(&mut self, joint: JointId) -> &mut Joint {
        &mut self.joints[joint.index()]
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SkeletonSet {
    pub slots: [Skeleton; SKELETON_SLOT_COUNT],
}

impl SkeletonSet {
    pub fn iter(&self) -> impl Iterator<Item = &Skeleton> {
        self.slots.iter()
    }
}

/// Text shown in the X/Y/Z fields after a snapshot.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SnapshotDisplay {
    pub x: String,
    pub y: String,
    pub z: String,
}

impl SnapshotDisplay {
    pub fn from_result(result: Option<Position3D>) -> Self {
        match result {
            Some(p) => Self {
                x: p.x.to_string(),
                y: p.y.to_string(),
                z: p.z.to_string(),
            },
            None => Self::default(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.x.is_empty() && self.y.is_empty() && self.z.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joint_ids_index_their_own_slot() {
        for (idx, joint) in JointId::ALL.iter().enumerate() {
            assert_eq!(joint.index(), idx);
        }
    }

    #[test]
    fn display_is_blank_without_a_result() {
        let display = SnapshotDisplay::from_result(None);
        assert!(display.is_blank());
    }

    #[test]
    fn display_keeps_raw_float_text() {
        let display = SnapshotDisplay::from_result(Some(Position3D::new(0.25, -1.5, 2.0)));
        assert_eq!(display.x, "0.25");
        assert_eq!(display.y, "-1.5");
        assert_eq!(display.z, "2");
    }
}
