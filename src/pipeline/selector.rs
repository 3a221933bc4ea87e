use crate::types::{Skeleton, SkeletonSet};

/// Returns the first fully tracked skeleton in slot order.
///
/// There is no identity tracking between frames: if two people are tracked,
/// whoever occupies the lower slot this frame wins.
pub fn select_tracked(set: &SkeletonSet) -> Option<Skeleton> {
    set.iter().find(|skeleton| skeleton.is_tracked()).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SKELETON_SLOT_COUNT, SkeletonTrackingState};

    fn skeleton(id: u32, state: SkeletonTrackingState) -> Skeleton {
        Skeleton {
            tracking_id: id,
            tracking_state: state,
            ..Default::default()
        }
    }

    #[test]
    fn empty_set_selects_nothing() {
        assert_eq!(select_tracked(&SkeletonSet::default()), None);
    }

    #[test]
    fn position_only_is_not_eligible() {
        let mut set = SkeletonSet::default();
        set.slots[0] = skeleton(1, SkeletonTrackingState::PositionOnly);
        set.slots[3] = skeleton(2, SkeletonTrackingState::PositionOnly);
        assert_eq!(select_tracked(&set), None);
    }

    #[test]
    fn single_tracked_slot_is_selected() {
        for slot in 0..SKELETON_SLOT_COUNT {
            let mut set = SkeletonSet::default();
            set.slots[slot] = skeleton(slot as u32 + 10, SkeletonTrackingState::Tracked);
            let selected = select_tracked(&set).map(|s| s.tracking_id);
            assert_eq!(selected, Some(slot as u32 + 10));
        }
    }

    #[test]
    fn lowest_tracked_slot_wins() {
        let mut set = SkeletonSet::default();
        set.slots[1] = skeleton(7, SkeletonTrackingState::PositionOnly);
        set.slots[2] = skeleton(8, SkeletonTrackingState::Tracked);
        set.slots[4] = skeleton(9, SkeletonTrackingState::Tracked);
        assert_eq!(select_tracked(&set).map(|s| s.tracking_id), Some(8));
    }
}
