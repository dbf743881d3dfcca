//! Stage model: toroidal grid, stage files, codes and the generator
//!
//! A stage is a square grid with periodic boundaries. Every accessor
//! wraps its coordinates, so callers never see an out-of-range error.

pub mod code;
pub mod file;
pub mod generator;
pub mod grid;

pub use code::{CodeError, StageCode, decode_stage, encode_stage};
pub use file::StageError;
pub use generator::{Section, SectionTable, generate, generate_from_number};
pub use grid::{AvoidSearch, ObjectKind, Stage};
