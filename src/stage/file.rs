//! Stage file I/O
//!
//! Stable JSON layout shared with the stage editor. Cells are stored
//! row-major with row y=0 first. Loading either produces a complete
//! stage or fails with a `StageError`; no partially-filled stage is
//! ever observable.

use std::fmt;
use std::fs;
use std::path::Path;

use glam::{IVec2, Vec3};
use serde::{Deserialize, Serialize};

use super::grid::{AvoidSearch, ObjectKind, Stage};

/// Default star palette for files that predate star colors
const DEFAULT_STAR_COLORS: [Vec3; 2] = [Vec3::new(1.0, 1.0, 1.0), Vec3::new(0.75, 0.78, 0.9)];

/// Why a stage file failed to load or save
#[derive(Debug)]
pub enum StageError {
    Io(std::io::Error),
    Json(serde_json::Error),
    /// Stages are square; width and height disagreed
    NotSquare { width: i32, height: i32 },
    /// `data` or `avoidSearch` length did not match width*height
    BadCellCount { expected: usize, actual: usize },
    /// A `data` entry was not a valid object enumerator
    BadObjectValue(u8),
    /// An `avoidSearch` entry was not 0 or 1
    BadAvoidValue(u8),
    /// `startDirection` was not a unit cardinal vector
    BadStartDirection(IVec2),
    /// Section table asset had fewer than the required 128 sections
    TooFewSections(usize),
}

impl fmt::Display for StageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageError::Io(e) => write!(f, "stage file i/o error: {e}"),
            StageError::Json(e) => write!(f, "stage file is not valid JSON: {e}"),
            StageError::NotSquare { width, height } => {
                write!(f, "stage must be square, got {width}x{height}")
            }
            StageError::BadCellCount { expected, actual } => {
                write!(f, "cell array has {actual} entries, expected {expected}")
            }
            StageError::BadObjectValue(v) => write!(f, "unknown object kind {v}"),
            StageError::BadAvoidValue(v) => write!(f, "avoid-search entry must be 0 or 1, got {v}"),
            StageError::BadStartDirection(d) => {
                write!(f, "start direction must be a unit cardinal, got ({}, {})", d.x, d.y)
            }
            StageError::TooFewSections(n) => {
                write!(f, "section table needs at least 128 sections, got {n}")
            }
        }
    }
}

impl std::error::Error for StageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StageError::Io(e) => Some(e),
            StageError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StageError {
    fn from(e: std::io::Error) -> Self {
        StageError::Io(e)
    }
}

impl From<serde_json::Error> for StageError {
    fn from(e: serde_json::Error) -> Self {
        StageError::Json(e)
    }
}

/// On-disk shape of a stage. Field names are part of the format.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StageFile {
    version: u32,
    name: String,
    width: i32,
    height: i32,
    start_point: [i32; 2],
    start_direction: [i32; 2],
    max_rings: u32,
    emerald_color: [f32; 3],
    pattern_colors: [[f32; 3]; 2],
    sky_colors: [[f32; 3]; 2],
    data: Vec<u8>,
    avoid_search: Vec<u8>,
}

impl Stage {
    /// Parse a stage from its JSON string form
    pub fn from_json(json: &str) -> Result<Stage, StageError> {
        let file: StageFile = serde_json::from_str(json)?;

        if file.width != file.height || file.width <= 0 {
            return Err(StageError::NotSquare {
                width: file.width,
                height: file.height,
            });
        }
        let side = file.width;
        let expected = (side * side) as usize;
        for len in [file.data.len(), file.avoid_search.len()] {
            if len != expected {
                return Err(StageError::BadCellCount {
                    expected,
                    actual: len,
                });
            }
        }
        let start_direction = IVec2::from(file.start_direction);
        if start_direction.abs() != IVec2::X && start_direction.abs() != IVec2::Y {
            return Err(StageError::BadStartDirection(start_direction));
        }

        let mut stage = Stage::new(side);
        stage.version = file.version;
        stage.name = file.name;
        stage.start_point = IVec2::from(file.start_point);
        stage.start_direction = start_direction;
        stage.max_rings = file.max_rings;
        stage.remaining_rings = file.max_rings;
        stage.emerald_color = Vec3::from(file.emerald_color);
        stage.pattern_colors = file.pattern_colors.map(Vec3::from);
        stage.sky_colors = file.sky_colors.map(Vec3::from);
        stage.star_colors = DEFAULT_STAR_COLORS;

        for (i, &v) in file.data.iter().enumerate() {
            let kind = ObjectKind::from_u8(v).ok_or(StageError::BadObjectValue(v))?;
            let pos = IVec2::new(i as i32 % side, i as i32 / side);
            stage.set_value_at(pos, kind);
        }
        for (i, &v) in file.avoid_search.iter().enumerate() {
            let flag = AvoidSearch::from_u8(v).ok_or(StageError::BadAvoidValue(v))?;
            let pos = IVec2::new(i as i32 % side, i as i32 / side);
            stage.set_avoid_search_at(pos, flag);
        }

        Ok(stage)
    }

    /// Serialize to the JSON string form
    pub fn to_json(&self) -> Result<String, StageError> {
        let file = StageFile {
            version: self.version,
            name: self.name.clone(),
            width: self.side(),
            height: self.side(),
            start_point: self.start_point.into(),
            start_direction: self.start_direction.into(),
            max_rings: self.max_rings,
            emerald_color: self.emerald_color.into(),
            pattern_colors: self.pattern_colors.map(Into::into),
            sky_colors: self.sky_colors.map(Into::into),
            data: self.objects().iter().map(|k| k.to_u8()).collect(),
            avoid_search: self.avoid_flags().iter().map(|f| f.to_u8()).collect(),
        };
        Ok(serde_json::to_string_pretty(&file)?)
    }

    /// Load a stage from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Stage, StageError> {
        let json = fs::read_to_string(path.as_ref())?;
        let stage = Stage::from_json(&json)?;
        log::info!(
            "Loaded stage '{}' ({}x{}, {} rings)",
            stage.name,
            stage.side(),
            stage.side(),
            stage.max_rings
        );
        Ok(stage)
    }

    /// Write the stage to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), StageError> {
        fs::write(path.as_ref(), self.to_json()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_stage() -> Stage {
        let mut stage = Stage::new(4);
        stage.version = 300;
        stage.name = "sample".to_string();
        stage.max_rings = 1;
        stage.remaining_rings = 1;
        stage.start_point = IVec2::new(1, 2);
        stage.start_direction = IVec2::new(0, 1);
        stage.set_value_at(IVec2::new(0, 0), ObjectKind::BlueSphere);
        stage.set_value_at(IVec2::new(3, 3), ObjectKind::Ring);
        stage.set_avoid_search_at(IVec2::new(2, 1), AvoidSearch::Yes);
        stage
    }

    #[test]
    fn test_json_round_trip() {
        let stage = sample_stage();
        let json = stage.to_json().unwrap();
        let loaded = Stage::from_json(&json).unwrap();

        assert_eq!(loaded.side(), 4);
        assert_eq!(loaded.name, "sample");
        assert_eq!(loaded.version, 300);
        assert_eq!(loaded.max_rings, 1);
        assert_eq!(loaded.remaining_rings, 1);
        assert_eq!(loaded.value_at(IVec2::new(0, 0)), ObjectKind::BlueSphere);
        assert_eq!(loaded.value_at(IVec2::new(3, 3)), ObjectKind::Ring);
        assert_eq!(loaded.avoid_search_at(IVec2::new(2, 1)), AvoidSearch::Yes);
        assert_eq!(loaded.start_point, IVec2::new(1, 2));
    }

    #[test]
    fn test_missing_key_fails() {
        // No `data` key at all
        let json = r#"{
            "version": 300, "name": "x", "width": 2, "height": 2,
            "startPoint": [0, 0], "startDirection": [0, 1], "maxRings": 0,
            "emeraldColor": [1, 1, 1],
            "patternColors": [[1, 0, 0], [0, 0, 1]],
            "skyColors": [[0, 0, 0], [0, 0, 0.2]],
            "avoidSearch": [0, 0, 0, 0]
        }"#;
        assert!(matches!(Stage::from_json(json), Err(StageError::Json(_))));
    }

    #[test]
    fn test_wrong_cell_count_fails() {
        let mut stage = sample_stage();
        stage.name.clear();
        let json = stage.to_json().unwrap().replace("\"width\": 4", "\"width\": 5");
        match Stage::from_json(&json) {
            Err(StageError::NotSquare { width: 5, height: 4 }) => {}
            other => panic!("expected NotSquare, got {other:?}"),
        }
    }

    #[test]
    fn test_bad_object_value_fails() {
        let json = r#"{
            "version": 300, "name": "x", "width": 1, "height": 1,
            "startPoint": [0, 0], "startDirection": [1, 0], "maxRings": 0,
            "emeraldColor": [1, 1, 1],
            "patternColors": [[1, 0, 0], [0, 0, 1]],
            "skyColors": [[0, 0, 0], [0, 0, 0.2]],
            "data": [9],
            "avoidSearch": [0]
        }"#;
        assert!(matches!(
            Stage::from_json(json),
            Err(StageError::BadObjectValue(9))
        ));
    }

    #[test]
    fn test_bad_start_direction_fails() {
        let json = r#"{
            "version": 300, "name": "x", "width": 1, "height": 1,
            "startPoint": [0, 0], "startDirection": [1, 1], "maxRings": 0,
            "emeraldColor": [1, 1, 1],
            "patternColors": [[1, 0, 0], [0, 0, 1]],
            "skyColors": [[0, 0, 0], [0, 0, 0.2]],
            "data": [0],
            "avoidSearch": [0]
        }"#;
        assert!(matches!(
            Stage::from_json(json),
            Err(StageError::BadStartDirection(_))
        ));
    }

    #[test]
    fn test_row_major_bottom_to_top() {
        // First data entry is cell (0,0), last is (side-1, side-1)
        let mut stage = Stage::new(2);
        stage.set_value_at(IVec2::new(0, 0), ObjectKind::RedSphere);
        stage.set_value_at(IVec2::new(1, 1), ObjectKind::Bumper);
        let json = stage.to_json().unwrap();
        let file: serde_json::Value = serde_json::from_str(&json).unwrap();
        let data = file["data"].as_array().unwrap();
        assert_eq!(data[0], 1);
        assert_eq!(data[3], 4);
    }
}
