//! Wrapped grid of stage objects plus per-stage metadata
//!
//! Two parallel row-major arrays back the grid: object kinds and the
//! avoid-search hints authored into section data. Row y=0 is stored
//! first. All coordinate access goes through `wrap`, making the grid
//! topologically a torus.

use glam::{IVec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::wrap_coord;

/// What occupies a single grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ObjectKind {
    #[default]
    None,
    RedSphere,
    BlueSphere,
    YellowSphere,
    Bumper,
    Ring,
}

impl ObjectKind {
    /// Serialized enumerator value (stage file `data` entries)
    pub fn to_u8(self) -> u8 {
        match self {
            ObjectKind::None => 0,
            ObjectKind::RedSphere => 1,
            ObjectKind::BlueSphere => 2,
            ObjectKind::YellowSphere => 3,
            ObjectKind::Bumper => 4,
            ObjectKind::Ring => 5,
        }
    }

    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(ObjectKind::None),
            1 => Some(ObjectKind::RedSphere),
            2 => Some(ObjectKind::BlueSphere),
            3 => Some(ObjectKind::YellowSphere),
            4 => Some(ObjectKind::Bumper),
            5 => Some(ObjectKind::Ring),
            _ => None,
        }
    }
}

/// Per-cell author hint: never seed the ring-conversion search here
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AvoidSearch {
    #[default]
    No,
    Yes,
}

impl AvoidSearch {
    pub fn to_u8(self) -> u8 {
        match self {
            AvoidSearch::No => 0,
            AvoidSearch::Yes => 1,
        }
    }

    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(AvoidSearch::No),
            1 => Some(AvoidSearch::Yes),
            _ => None,
        }
    }
}

/// World state for one bonus round
#[derive(Debug, Clone, PartialEq)]
pub struct Stage {
    side: i32,
    objects: Vec<ObjectKind>,
    avoid_search: Vec<AvoidSearch>,
    pub name: String,
    pub version: u32,
    pub max_rings: u32,
    pub remaining_rings: u32,
    pub start_point: IVec2,
    pub start_direction: IVec2,
    pub emerald_color: Vec3,
    pub pattern_colors: [Vec3; 2],
    pub sky_colors: [Vec3; 2],
    pub star_colors: [Vec3; 2],
}

impl Stage {
    /// Create an empty stage of the given side length
    pub fn new(side: i32) -> Self {
        assert!(side > 0, "stage side must be positive");
        let cells = (side * side) as usize;
        Self {
            side,
            objects: vec![ObjectKind::None; cells],
            avoid_search: vec![AvoidSearch::No; cells],
            name: String::new(),
            version: 0,
            max_rings: 0,
            remaining_rings: 0,
            start_point: IVec2::ZERO,
            start_direction: IVec2::new(0, 1),
            emerald_color: Vec3::ONE,
            pattern_colors: [Vec3::ONE; 2],
            sky_colors: [Vec3::ONE; 2],
            star_colors: [Vec3::ONE; 2],
        }
    }

    /// Side length N of the square grid
    #[inline]
    pub fn side(&self) -> i32 {
        self.side
    }

    /// Reduce a position onto the torus, `[0, N)` on both axes
    #[inline]
    pub fn wrap(&self, pos: IVec2) -> IVec2 {
        wrap_coord(pos, self.side)
    }

    #[inline]
    fn index(&self, pos: IVec2) -> usize {
        let p = self.wrap(pos);
        (p.y * self.side + p.x) as usize
    }

    /// Object at the wrapped position
    pub fn value_at(&self, pos: IVec2) -> ObjectKind {
        self.objects[self.index(pos)]
    }

    /// Overwrite the object at the wrapped position
    pub fn set_value_at(&mut self, pos: IVec2, kind: ObjectKind) {
        let i = self.index(pos);
        self.objects[i] = kind;
    }

    /// Avoid-search hint at the wrapped position
    pub fn avoid_search_at(&self, pos: IVec2) -> AvoidSearch {
        self.avoid_search[self.index(pos)]
    }

    pub fn set_avoid_search_at(&mut self, pos: IVec2, flag: AvoidSearch) {
        let i = self.index(pos);
        self.avoid_search[i] = flag;
    }

    /// Number of cells holding the given kind
    pub fn count(&self, kind: ObjectKind) -> usize {
        self.objects.iter().filter(|&&k| k == kind).count()
    }

    /// True when every ring on the stage has been collected
    pub fn is_perfect(&self) -> bool {
        self.remaining_rings == 0
    }

    /// Pick up the ring at `pos`. The cell must hold a `Ring`.
    pub fn collect_ring(&mut self, pos: IVec2) {
        let i = self.index(pos);
        debug_assert_eq!(self.objects[i], ObjectKind::Ring);
        self.objects[i] = ObjectKind::None;
        self.remaining_rings = self.remaining_rings.saturating_sub(1);
    }

    /// Raw object cells, row y=0 first (serialization support)
    pub(crate) fn objects(&self) -> &[ObjectKind] {
        &self.objects
    }

    pub(crate) fn avoid_flags(&self) -> &[AvoidSearch] {
        &self.avoid_search
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_is_torus() {
        let mut stage = Stage::new(32);
        stage.set_value_at(IVec2::new(3, 4), ObjectKind::BlueSphere);

        // Same cell through any multiple of N on either axis
        for (k, l) in [(1, 0), (0, 1), (-1, -1), (3, -2)] {
            let p = IVec2::new(3 + k * 32, 4 + l * 32);
            assert_eq!(stage.value_at(p), ObjectKind::BlueSphere);
        }
        assert_eq!(stage.wrap(IVec2::new(-1, 33)), IVec2::new(31, 1));
    }

    #[test]
    fn test_set_through_wrapped_coordinates() {
        let mut stage = Stage::new(8);
        stage.set_value_at(IVec2::new(-1, -1), ObjectKind::Bumper);
        assert_eq!(stage.value_at(IVec2::new(7, 7)), ObjectKind::Bumper);
    }

    #[test]
    fn test_count_and_collect_ring() {
        let mut stage = Stage::new(8);
        stage.max_rings = 2;
        stage.remaining_rings = 2;
        stage.set_value_at(IVec2::new(1, 1), ObjectKind::Ring);
        stage.set_value_at(IVec2::new(2, 2), ObjectKind::Ring);
        assert_eq!(stage.count(ObjectKind::Ring), 2);
        assert!(!stage.is_perfect());

        stage.collect_ring(IVec2::new(1, 1));
        assert_eq!(stage.value_at(IVec2::new(1, 1)), ObjectKind::None);
        assert_eq!(stage.remaining_rings, 1);
        assert_eq!(stage.count(ObjectKind::Ring), 1);

        stage.collect_ring(IVec2::new(2, 2));
        assert!(stage.is_perfect());
    }

    #[test]
    fn test_object_kind_round_trip() {
        for v in 0..=5u8 {
            let kind = ObjectKind::from_u8(v).unwrap();
            assert_eq!(kind.to_u8(), v);
        }
        assert_eq!(ObjectKind::from_u8(6), None);
        assert_eq!(AvoidSearch::from_u8(2), None);
    }

    proptest::proptest! {
        #[test]
        fn prop_wrap_homomorphism(
            x in -100i32..100,
            y in -100i32..100,
            k in -3i32..=3,
            l in -3i32..=3,
        ) {
            let mut stage = Stage::new(32);
            stage.set_value_at(IVec2::new(x, y), ObjectKind::Ring);
            proptest::prop_assert_eq!(
                stage.value_at(IVec2::new(x + k * 32, y + l * 32)),
                ObjectKind::Ring
            );
        }
    }
}
