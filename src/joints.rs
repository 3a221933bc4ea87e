//! Label table for the joint picker.
//!
//! The order of `JOINT_LABELS` is the order the picker shows. "Current Player
//! Position" is an alias for the hip center, which is also where the sensor
//! reports the body's overall position.

use crate::types::JointId;

pub const CURRENT_PLAYER_POSITION: &str = "Current Player Position";

const JOINT_LABELS: &[(&str, JointId)] = &[
    (CURRENT_PLAYER_POSITION, JointId::HipCenter),
    ("Head", JointId::Head),
    ("Shoulder Center", JointId::ShoulderCenter),
    ("Shoulder Left", JointId::ShoulderLeft),
    ("Elbow Left", JointId::ElbowLeft),
    ("Wrist Left", JointId::WristLeft),
    ("Hand Left", JointId::HandLeft),
    ("Shoulder Right", JointId::ShoulderRight),
    ("Elbow Right", JointId::ElbowRight),
    ("Wrist Right", JointId::WristRight),
    ("Hand Right", JointId::HandRight),
    ("Spine", JointId::Spine),
    ("Hip Center", JointId::HipCenter),
    ("Hip Left", JointId::HipLeft),
    ("Knee Left", JointId::KneeLeft),
    ("Ankle Left", JointId::AnkleLeft),
    ("Foot Left", JointId::FootLeft),
    ("Hip Right", JointId::HipRight),
    ("Knee Right", JointId::KneeRight),
    ("Ankle Right", JointId::AnkleRight),
    ("Foot Right", JointId::FootRight),
];

/// Labels in picker order.
pub fn labels() -> impl ExactSizeIterator<Item = &'static str> {
    JOINT_LABELS.iter().map(|(label, _)| *label)
}

pub fn lookup(label: &str) -> Option<JointId> {
    JOINT_LABELS
        .iter()
        .find(|(known, _)| *known == label)
        .map(|(_, joint)| *joint)
}

/// Maps a picker label to its joint.
///
/// # Panics
///
/// Panics if `label` is not one of [`labels`]. The picker is populated from
/// this table, so anything else is a bug in the caller.
pub fn resolve(label: &str) -> JointId {
    match lookup(label) {
        Some(joint) => joint,
        None => panic!("unknown joint label {label:?}"),
    }
}

/// Anatomical label for a joint. Never returns the player-position alias.
pub fn label_for(joint: JointId) -> &'static str {
    JOINT_LABELS
        .iter()
        .skip(1)
        .find(|(_, known)| *known == joint)
        .map(|(label, _)| *label)
        .unwrap_or(CURRENT_PLAYER_POSITION)
}
