//! Procedural stage generator
//!
//! A generated stage is four pre-baked 16x16 sections mirrored into a
//! coherent 32x32 whole. The section table ships as a JSON asset and is
//! passed in as an explicit handle; the generator itself is a pure
//! function of the stage code, so the same code always yields a
//! byte-identical stage.

use glam::{IVec2, Vec3};
use serde::Deserialize;

use crate::consts::{GENERATED_STAGE_SIDE, SECTION_SIDE};

use super::code::{CodeError, MAX_STAGE_NUMBER, StageCode};
use super::file::StageError;
use super::grid::{AvoidSearch, ObjectKind, Stage};

/// Sections needed by the index scheme (tr runs mod 128)
pub const MIN_SECTIONS: usize = 128;

const SECTION_CELLS: usize = (SECTION_SIDE * SECTION_SIDE) as usize;

/// Pattern colour pairs, two entries per palette slot
const PATTERN_COLORS: [Vec3; 32] = [
    Vec3::new(0.91, 0.42, 0.07), Vec3::new(0.98, 0.83, 0.33),
    Vec3::new(0.13, 0.33, 0.80), Vec3::new(0.55, 0.78, 0.97),
    Vec3::new(0.72, 0.16, 0.16), Vec3::new(0.98, 0.62, 0.55),
    Vec3::new(0.11, 0.52, 0.25), Vec3::new(0.64, 0.90, 0.53),
    Vec3::new(0.45, 0.20, 0.65), Vec3::new(0.82, 0.67, 0.95),
    Vec3::new(0.80, 0.47, 0.10), Vec3::new(0.45, 0.85, 0.87),
    Vec3::new(0.16, 0.16, 0.45), Vec3::new(0.90, 0.90, 0.55),
    Vec3::new(0.55, 0.09, 0.35), Vec3::new(0.95, 0.75, 0.85),
    Vec3::new(0.05, 0.45, 0.55), Vec3::new(0.85, 0.60, 0.25),
    Vec3::new(0.35, 0.42, 0.12), Vec3::new(0.88, 0.93, 0.70),
    Vec3::new(0.62, 0.25, 0.05), Vec3::new(0.40, 0.70, 0.90),
    Vec3::new(0.22, 0.22, 0.24), Vec3::new(0.85, 0.35, 0.30),
    Vec3::new(0.10, 0.60, 0.50), Vec3::new(0.95, 0.88, 0.45),
    Vec3::new(0.50, 0.30, 0.75), Vec3::new(0.95, 0.55, 0.20),
    Vec3::new(0.25, 0.55, 0.85), Vec3::new(0.92, 0.70, 0.60),
    Vec3::new(0.70, 0.12, 0.22), Vec3::new(0.60, 0.88, 0.78),
];

/// Chaos emerald colours
const EMERALD_COLORS: [Vec3; 8] = [
    Vec3::new(0.25, 0.85, 0.40),
    Vec3::new(0.95, 0.25, 0.25),
    Vec3::new(0.30, 0.45, 0.95),
    Vec3::new(0.95, 0.90, 0.30),
    Vec3::new(0.80, 0.80, 0.85),
    Vec3::new(0.70, 0.30, 0.90),
    Vec3::new(0.35, 0.90, 0.90),
    Vec3::new(0.95, 0.60, 0.25),
];

const SKY_COLORS: [Vec3; 2] = [Vec3::new(0.05, 0.07, 0.25), Vec3::new(0.30, 0.15, 0.45)];
const STAR_COLORS: [Vec3; 2] = [Vec3::new(1.0, 1.0, 1.0), Vec3::new(0.75, 0.78, 0.9)];

/// A pre-authored 16x16 sub-grid
#[derive(Debug, Clone)]
pub struct Section {
    pub max_rings: u32,
    objects: Vec<ObjectKind>,
    avoid_search: Vec<AvoidSearch>,
}

impl Section {
    /// Build from raw cell values; both arrays must have 256 entries
    pub fn new(max_rings: u32, data: &[u8], avoid_search: &[u8]) -> Result<Self, StageError> {
        for len in [data.len(), avoid_search.len()] {
            if len != SECTION_CELLS {
                return Err(StageError::BadCellCount {
                    expected: SECTION_CELLS,
                    actual: len,
                });
            }
        }
        let objects = data
            .iter()
            .map(|&v| ObjectKind::from_u8(v).ok_or(StageError::BadObjectValue(v)))
            .collect::<Result<_, _>>()?;
        let avoid_search = avoid_search
            .iter()
            .map(|&v| AvoidSearch::from_u8(v).ok_or(StageError::BadAvoidValue(v)))
            .collect::<Result<_, _>>()?;
        Ok(Self {
            max_rings,
            objects,
            avoid_search,
        })
    }

    #[inline]
    fn cell(&self, x: i32, y: i32) -> (ObjectKind, AvoidSearch) {
        let i = (y * SECTION_SIDE + x) as usize;
        (self.objects[i], self.avoid_search[i])
    }
}

/// On-disk shape of one section in the asset file
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SectionFile {
    max_rings: u32,
    data: Vec<u8>,
    avoid_search: Vec<u8>,
}

/// The full table of pre-baked sections
#[derive(Debug, Clone)]
pub struct SectionTable {
    sections: Vec<Section>,
}

impl SectionTable {
    /// Wrap a section list; the index scheme needs at least 128 entries
    pub fn new(sections: Vec<Section>) -> Result<Self, StageError> {
        if sections.len() < MIN_SECTIONS {
            return Err(StageError::TooFewSections(sections.len()));
        }
        Ok(Self { sections })
    }

    /// Parse the JSON asset form (array of sections)
    pub fn from_json(json: &str) -> Result<Self, StageError> {
        let files: Vec<SectionFile> = serde_json::from_str(json)?;
        let sections = files
            .iter()
            .map(|f| Section::new(f.max_rings, &f.data, &f.avoid_search))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(sections)
    }

    /// Load the section table asset from disk
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self, StageError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let table = Self::from_json(&json)?;
        log::info!("Loaded section table ({} sections)", table.sections.len());
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

/// Horizontal/vertical mirroring applied when pasting a quadrant
#[derive(Clone, Copy)]
struct Mirror {
    flip_x: bool,
    flip_y: bool,
}

/// Paste one section into the stage at a 16-cell quadrant offset
fn paste_section(stage: &mut Stage, section: &Section, offset: IVec2, mirror: Mirror) {
    for y in 0..SECTION_SIDE {
        for x in 0..SECTION_SIDE {
            let sx = if mirror.flip_x { SECTION_SIDE - 1 - x } else { x };
            let sy = if mirror.flip_y { SECTION_SIDE - 1 - y } else { y };
            let (kind, avoid) = section.cell(sx, sy);
            let pos = offset + IVec2::new(x, y);
            stage.set_value_at(pos, kind);
            stage.set_avoid_search_at(pos, avoid);
        }
    }
}

/// Build the stage a code names. Fails only on an invalid code.
pub fn generate(table: &SectionTable, code: StageCode) -> Result<Stage, CodeError> {
    let stage_number = code.stage_number()?;
    Ok(generate_from_number(table, stage_number))
}

/// Build the stage for an already-validated stage number in `[1, 2^27]`
pub fn generate_from_number(table: &SectionTable, stage_number: u32) -> Stage {
    debug_assert!((1..=MAX_STAGE_NUMBER).contains(&stage_number));
    let s = (stage_number - 1) as u64;
    // Co-prime strides keep the four quadrants drifting apart as the
    // stage number advances
    let tr = (s % 128) as usize;
    let br = ((1 + s * 3) % 127) as usize;
    let tl = ((2 + s * 5) % 126) as usize;
    let bl = ((3 + s * 7) % 125) as usize;

    let q = SECTION_SIDE;
    let mut stage = Stage::new(GENERATED_STAGE_SIDE);
    let quadrants = [
        (bl, IVec2::new(0, 0), Mirror { flip_x: false, flip_y: false }),
        (br, IVec2::new(q, 0), Mirror { flip_x: true, flip_y: false }),
        (tl, IVec2::new(0, q), Mirror { flip_x: false, flip_y: true }),
        (tr, IVec2::new(q, q), Mirror { flip_x: true, flip_y: true }),
    ];

    let mut max_rings = 0;
    for (index, offset, mirror) in quadrants {
        let section = &table.sections[index];
        paste_section(&mut stage, section, offset, mirror);
        max_rings += section.max_rings;
    }

    stage.name = format!("Stage {stage_number}");
    stage.version = 300;
    stage.max_rings = max_rings;
    stage.remaining_rings = max_rings;
    stage.start_point = IVec2::new(28, 15);
    stage.start_direction = IVec2::new(0, 1);
    stage.pattern_colors = [
        PATTERN_COLORS[(tl % 16) * 2],
        PATTERN_COLORS[(tl % 16) * 2 + 1],
    ];
    stage.emerald_color = EMERALD_COLORS[tr % 8];
    stage.sky_colors = SKY_COLORS;
    stage.star_colors = STAR_COLORS;

    log::debug!(
        "Generated stage {stage_number}: sections tr={tr} br={br} tl={tl} bl={bl}, {max_rings} rings"
    );
    stage
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Table whose section i is filled with marker cells derived from i,
    /// with one asymmetric corner cell to make mirroring observable
    pub(crate) fn marker_table() -> SectionTable {
        let sections = (0..MIN_SECTIONS)
            .map(|i| {
                let kind = ((i % 4) + 1) as u8;
                let mut data = vec![0u8; 256];
                // Corner marker at section-local (0,0)
                data[0] = kind;
                // A ring somewhere off-center
                data[3 * 16 + 7] = 5;
                let mut avoid = vec![0u8; 256];
                avoid[5 * 16 + 5] = 1;
                Section::new(1, &data, &avoid).unwrap()
            })
            .collect();
        SectionTable::new(sections).unwrap()
    }

    #[test]
    fn test_table_requires_128_sections() {
        let few = vec![
            Section::new(0, &[0u8; 256], &[0u8; 256]).unwrap();
            10
        ];
        assert!(matches!(
            SectionTable::new(few),
            Err(StageError::TooFewSections(10))
        ));
    }

    #[test]
    fn test_generate_metadata() {
        let table = marker_table();
        let stage = generate_from_number(&table, 1);
        assert_eq!(stage.side(), 32);
        assert_eq!(stage.version, 300);
        assert_eq!(stage.start_point, IVec2::new(28, 15));
        assert_eq!(stage.start_direction, IVec2::new(0, 1));
        // Four sections, one ring each
        assert_eq!(stage.max_rings, 4);
        assert_eq!(stage.remaining_rings, 4);
        assert_eq!(stage.count(ObjectKind::Ring), 4);
    }

    #[test]
    fn test_generate_deterministic() {
        let table = marker_table();
        let code = StageCode::for_stage(77);
        let a = generate(&table, code).unwrap();
        let b = generate(&table, code).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_quadrant_mirroring() {
        let table = marker_table();
        // Stage 1: tr=0 br=1 tl=2 bl=3
        let stage = generate_from_number(&table, 1);

        // bl pasted as-is: its (0,0) marker lands at stage (0,0)
        let bl_kind = ObjectKind::from_u8(((3 % 4) + 1) as u8).unwrap();
        assert_eq!(stage.value_at(IVec2::new(0, 0)), bl_kind);

        // br flipped horizontally: marker lands at stage (31, 0)
        let br_kind = ObjectKind::from_u8(((1 % 4) + 1) as u8).unwrap();
        assert_eq!(stage.value_at(IVec2::new(31, 0)), br_kind);

        // tl flipped vertically: marker lands at stage (0, 31)
        let tl_kind = ObjectKind::from_u8(((2 % 4) + 1) as u8).unwrap();
        assert_eq!(stage.value_at(IVec2::new(0, 31)), tl_kind);

        // tr flipped both ways: marker lands at stage (31, 31)
        let tr_kind = ObjectKind::from_u8(1).unwrap();
        assert_eq!(stage.value_at(IVec2::new(31, 31)), tr_kind);
    }

    #[test]
    fn test_avoid_search_copied_and_mirrored() {
        let table = marker_table();
        let stage = generate_from_number(&table, 1);
        // bl quadrant, as-is: flag at (5,5)
        assert_eq!(stage.avoid_search_at(IVec2::new(5, 5)), AvoidSearch::Yes);
        // tr quadrant, both flips: (5,5) mirrors to (10,10) then offsets to (26,26)
        assert_eq!(stage.avoid_search_at(IVec2::new(26, 26)), AvoidSearch::Yes);
    }

    #[test]
    fn test_section_index_scheme() {
        let table = marker_table();
        // Stage 2: tr=1 br=4 tl=7 bl=10
        let stage = generate_from_number(&table, 2);
        let bl_kind = ObjectKind::from_u8(((10 % 4) + 1) as u8).unwrap();
        assert_eq!(stage.value_at(IVec2::new(0, 0)), bl_kind);
        let tr_kind = ObjectKind::from_u8(((1 % 4) + 1) as u8).unwrap();
        assert_eq!(stage.value_at(IVec2::new(31, 31)), tr_kind);
    }

    #[test]
    #[should_panic]
    fn test_stage_zero_is_out_of_range() {
        let table = marker_table();
        let _ = generate_from_number(&table, 0);
    }

    #[test]
    fn test_invalid_code_rejected() {
        let table = marker_table();
        let bad: StageCode = "0000-0000-0000".parse().unwrap();
        assert_eq!(generate(&table, bad), Err(CodeError::Invalid));
    }

    #[test]
    fn test_section_table_from_json() {
        let data: Vec<u8> = vec![0; 256];
        let one = serde_json::json!({
            "maxRings": 3,
            "data": data,
            "avoidSearch": data,
        });
        let json = serde_json::to_string(&vec![one; MIN_SECTIONS]).unwrap();
        let table = SectionTable::from_json(&json).unwrap();
        assert_eq!(table.len(), MIN_SECTIONS);
    }
}
