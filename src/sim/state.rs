//! Game logic state and event types
//!
//! `GameLogic` owns the stage for the duration of one play session and
//! holds every piece of per-session state: continuous position, facing,
//! rotation, jump arc, pace and the pending one-shot commands.

use glam::{IVec2, Vec2};

use crate::consts::*;
use crate::stage::Stage;

/// Current phase of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    /// Fresh session, first tick pending
    None,
    /// Countdown; the view may rotate but the avatar stands still
    Starting,
    /// Active gameplay
    Playing,
    /// All blue spheres cleared; chasing the emerald
    Emerald,
    /// Run ended
    GameOver,
    /// Session wrapped up by the scene layer
    Finished,
}

/// Discrete gameplay action, raised for audio and scoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    YellowSphereJumpStart,
    NormalJumpStart,
    JumpEnd,
    GoBackward,
    GoForward,
    RingCollected,
    BlueSphereCollected,
    /// Reserved enumerator; no current code path emits it
    GreenSphereCollected,
    HitBumper,
    Perfect,
    GameSpeedUp,
}

/// Event delivered to external subscribers, in program order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    StateChanged { old: GameState, new: GameState },
    Action(Action),
}

/// Quarter-turn rotation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotateDirection {
    Left,
    Right,
}

/// Per-session simulation state
#[derive(Debug, Clone)]
pub struct GameLogic {
    pub(crate) stage: Stage,
    pub(crate) state: GameState,

    // Kinematics
    pub(crate) position: Vec2,
    pub(crate) delta_position: Vec2,
    pub(crate) direction: IVec2,
    pub(crate) rotation_angle: f32,
    pub(crate) target_rotation_angle: f32,
    pub(crate) height: f32,

    // Motion
    pub(crate) velocity: f32,
    pub(crate) velocity_scale: f32,
    pub(crate) jump_velocity_scale: f32,
    pub(crate) angular_velocity: f32,
    pub(crate) current_pace: u32,
    pub(crate) speed_up_elapsed: f32,
    pub(crate) starting_elapsed: f32,
    pub(crate) game_over_rotation_speed: f32,

    // Jump arc
    pub(crate) is_jumping: bool,
    pub(crate) remaining_jump_distance: f32,
    pub(crate) total_jump_distance: f32,
    pub(crate) jump_height: f32,

    // Flags and pending commands
    pub(crate) is_rotating: bool,
    pub(crate) is_going_backward: bool,
    pub(crate) rotate_command: Option<RotateDirection>,
    pub(crate) jump_command: bool,
    pub(crate) run_forward_command: bool,

    // Emerald chase
    pub(crate) is_emerald_visible: bool,
    pub(crate) emerald_distance: f32,

    // Edge crossing
    pub(crate) last_crossed_position: IVec2,
    pub(crate) last_bounce_distance: f32,

    pub(crate) events: Vec<GameEvent>,
}

impl GameLogic {
    /// Start a session on the given stage, avatar at the stage's start
    pub fn new(stage: Stage) -> Self {
        let position = stage.start_point.as_vec2();
        let direction = stage.start_direction;
        let rotation_angle = (direction.y as f32).atan2(direction.x as f32);
        Self {
            last_crossed_position: stage.start_point,
            stage,
            state: GameState::None,
            position,
            delta_position: Vec2::ZERO,
            direction,
            rotation_angle,
            target_rotation_angle: rotation_angle,
            height: 0.0,
            velocity: BASE_VELOCITY,
            velocity_scale: 1.0,
            jump_velocity_scale: 1.0,
            angular_velocity: BASE_ANGULAR_VELOCITY,
            current_pace: 0,
            speed_up_elapsed: 0.0,
            starting_elapsed: 0.0,
            game_over_rotation_speed: 0.0,
            is_jumping: false,
            remaining_jump_distance: 0.0,
            total_jump_distance: 0.0,
            jump_height: 0.0,
            is_rotating: false,
            is_going_backward: false,
            rotate_command: None,
            jump_command: false,
            run_forward_command: false,
            is_emerald_visible: false,
            emerald_distance: 0.0,
            last_bounce_distance: 1.0,
            events: Vec::new(),
        }
    }

    // --- Command queue (subscribers -> core) ---

    /// Request a quarter turn at the next eligible cell boundary.
    /// Repeated calls keep only the latest direction.
    pub fn rotate(&mut self, dir: RotateDirection) {
        self.rotate_command = Some(dir);
    }

    /// Request a jump; one-shot, consumed when the jump starts
    pub fn jump(&mut self) {
        self.jump_command = true;
    }

    /// Request a return to forward running after a bumper bounce
    pub fn run_forward(&mut self) {
        self.run_forward_command = true;
    }

    /// Wrap up the session once the scene layer is done with it;
    /// further ticks become no-ops
    pub fn finish(&mut self) {
        self.transition(GameState::Finished);
    }

    // --- Read access for renderers and drivers ---

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    /// Hand the stage back when the session ends
    pub fn into_stage(self) -> Stage {
        self.stage
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn direction(&self) -> IVec2 {
        self.direction
    }

    pub fn rotation_angle(&self) -> f32 {
        self.rotation_angle
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn current_pace(&self) -> u32 {
        self.current_pace
    }

    pub fn is_jumping(&self) -> bool {
        self.is_jumping
    }

    pub fn is_going_backward(&self) -> bool {
        self.is_going_backward
    }

    pub fn is_emerald_visible(&self) -> bool {
        self.is_emerald_visible
    }

    pub fn emerald_distance(&self) -> f32 {
        self.emerald_distance
    }

    /// Accumulated position change since the last call (view coupling)
    pub fn take_delta_position(&mut self) -> Vec2 {
        std::mem::take(&mut self.delta_position)
    }

    /// Drain events emitted since the last call, in program order
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn emit(&mut self, action: Action) {
        self.events.push(GameEvent::Action(action));
    }

    pub(crate) fn transition(&mut self, new: GameState) {
        let old = self.state;
        if old == new {
            return;
        }
        log::info!("Game state {:?} -> {:?}", old, new);
        self.state = new;
        if new == GameState::Starting {
            self.starting_elapsed = 0.0;
        }
        self.events.push(GameEvent::StateChanged { old, new });
    }
}
