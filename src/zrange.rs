//! Aggregate elevation range across resident tiles.
//!
//! The range only ever expands while a layer lives: transient tile unloads
//! during camera movement must not shrink the depth-culling interval, or
//! geometry near the old extremes would flicker. The consuming layer resets
//! the aggregate by dropping it.

use crate::mesh::BoundingBox;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZRange {
    pub min: f32,
    pub max: f32,
}

impl ZRange {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Expansion-only merge of the current range with the Z extents of the
    /// resident tiles' bounding boxes. An empty tile set leaves the current
    /// value untouched; an absent current range initializes from the tiles.
    pub fn update<'a>(
        current: Option<ZRange>,
        boxes: impl IntoIterator<Item = &'a BoundingBox>,
    ) -> Option<ZRange> {
        let mut candidate: Option<ZRange> = None;
        for bb in boxes {
            candidate = Some(match candidate {
                None => ZRange::new(bb.min.z, bb.max.z),
                Some(r) => ZRange::new(r.min.min(bb.min.z), r.max.max(bb.max.z)),
            });
        }

        match (current, candidate) {
            (cur, None) => cur,
            (None, Some(c)) => Some(c),
            (Some(cur), Some(c)) => Some(ZRange::new(cur.min.min(c.min), cur.max.max(c.max))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn bb(min_z: f32, max_z: f32) -> BoundingBox {
        BoundingBox {
            min: Vec3::new(0.0, 0.0, min_z),
            max: Vec3::new(1.0, 1.0, max_z),
        }
    }

    #[test]
    fn initializes_from_first_tile_set() {
        let r = ZRange::update(None, [&bb(0.0, 10.0), &bb(5.0, 20.0)]).unwrap();
        assert_eq!(r, ZRange::new(0.0, 20.0));
    }

    #[test]
    fn never_shrinks_when_tiles_unload() {
        let r = ZRange::update(None, [&bb(0.0, 10.0), &bb(5.0, 20.0)]);
        // second tile unloaded; aggregate keeps the old extremes
        let r = ZRange::update(r, [&bb(0.0, 10.0)]);
        assert_eq!(r, Some(ZRange::new(0.0, 20.0)));
    }

    #[test]
    fn empty_tile_set_is_a_no_op() {
        let r = Some(ZRange::new(-5.0, 5.0));
        assert_eq!(ZRange::update(r, []), r);
        assert_eq!(ZRange::update(None, []), None);
    }

    #[test]
    fn expands_in_both_directions() {
        let r = Some(ZRange::new(0.0, 10.0));
        let r = ZRange::update(r, [&bb(-8.0, 3.0)]);
        assert_eq!(r, Some(ZRange::new(-8.0, 10.0)));
        let r = ZRange::update(r, [&bb(2.0, 30.0)]);
        assert_eq!(r, Some(ZRange::new(-8.0, 30.0)));
    }
}
