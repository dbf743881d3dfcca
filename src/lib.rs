//! Blue Spheres - bonus stage core
//!
//! Core modules:
//! - `stage`: Toroidal grid model, JSON stage files, twelve-digit stage
//!   codes and the procedural generator built from pre-baked sections
//! - `sim`: Deterministic fixed-timestep game logic (player kinematics,
//!   state machine, ring conversion)
//!
//! Rendering, audio and input are external collaborators; the core takes
//! explicit handles (section tables, command calls) and reports results
//! as values and drained events.

pub mod sim;
pub mod stage;

pub use sim::{Action, GameEvent, GameLogic, GameState, RotateDirection};
pub use stage::{ObjectKind, Stage, StageCode};

use glam::IVec2;

/// Game configuration constants
pub mod consts {
    /// Suggested simulation sub-steps per render frame
    pub const SUB_STEPS: u32 = 5;

    /// Seconds spent in Starting before the avatar begins to run
    pub const START_DELAY: f32 = 3.0;

    /// Seconds between pace increments while Playing
    pub const PACE_INTERVAL: f32 = 5.0;
    /// Highest pace tier
    pub const MAX_PACE: u32 = 3;

    /// Run speed at pace 0, in cells per second
    pub const BASE_VELOCITY: f32 = 3.5;
    /// Run speed gained per pace tier
    pub const PACE_VELOCITY_STEP: f32 = 0.5;
    /// Turn rate at pace 0, in radians per second
    pub const BASE_ANGULAR_VELOCITY: f32 = std::f32::consts::TAU;
    /// Turn rate gained per pace tier
    pub const PACE_ANGULAR_STEP: f32 = std::f32::consts::FRAC_PI_4;

    /// Maximum height at which grid objects still collide with the avatar
    pub const COLLISION_MAX_HEIGHT: f32 = 0.2;

    /// Yellow-sphere jump: distance in cells, apex height, speed scale
    pub const YELLOW_JUMP_DISTANCE: f32 = 6.0;
    pub const YELLOW_JUMP_HEIGHT: f32 = 0.8;
    pub const YELLOW_JUMP_VELOCITY_SCALE: f32 = 2.0;

    /// Player-initiated jump: distance in cells, apex height
    pub const NORMAL_JUMP_DISTANCE: f32 = 2.0;
    pub const NORMAL_JUMP_HEIGHT: f32 = 0.5;

    /// Cells between the avatar and the emerald when the chase begins
    pub const EMERALD_START_DISTANCE: f32 = 16.0;
    /// Speed scale applied during the emerald chase
    pub const EMERALD_VELOCITY_SCALE: f32 = 0.5;

    /// Side length of generated stages
    pub const GENERATED_STAGE_SIDE: i32 = 32;
    /// Side length of a pre-baked section
    pub const SECTION_SIDE: i32 = 16;
}

/// Wrap a single coordinate into `[0, n)` with mathematical modulus
#[inline]
pub fn wrap_axis(v: i32, n: i32) -> i32 {
    v.rem_euclid(n)
}

/// Wrap a grid position onto an `n`-sided torus
#[inline]
pub fn wrap_coord(pos: IVec2, n: i32) -> IVec2 {
    IVec2::new(pos.x.rem_euclid(n), pos.y.rem_euclid(n))
}

/// Wrap a continuous coordinate into `[0, n)`
#[inline]
pub fn wrap_axis_f32(v: f32, n: f32) -> f32 {
    v.rem_euclid(n)
}

/// Rotate a unit cardinal direction a quarter turn counterclockwise
#[inline]
pub fn rotate_ccw(d: IVec2) -> IVec2 {
    IVec2::new(-d.y, d.x)
}

/// Rotate a unit cardinal direction a quarter turn clockwise
#[inline]
pub fn rotate_cw(d: IVec2) -> IVec2 {
    IVec2::new(d.y, -d.x)
}
