//! Fixed-timestep advance
//!
//! One `advance(dt)` call runs the handler for the current state, then
//! wraps the continuous position back onto the torus. Callers sub-step;
//! the recommended cadence is [`crate::consts::SUB_STEPS`] calls per
//! rendered frame.

use std::f32::consts::{FRAC_PI_2, TAU};

use glam::IVec2;

use crate::consts::*;
use crate::stage::ObjectKind;
use crate::{rotate_ccw, rotate_cw, wrap_axis_f32};

use super::ring::convert_loop;
use super::state::{Action, GameLogic, GameState, RotateDirection};

impl GameLogic {
    /// Advance the simulation by `dt` seconds
    pub fn advance(&mut self, dt: f32) {
        match self.state {
            GameState::None => self.transition(GameState::Starting),
            GameState::Starting => self.advance_starting(dt),
            GameState::Playing => self.advance_playing(dt),
            GameState::Emerald => self.advance_emerald(dt),
            GameState::GameOver => self.advance_game_over(dt),
            GameState::Finished => {}
        }
        let n = self.stage.side() as f32;
        self.position.x = wrap_axis_f32(self.position.x, n);
        self.position.y = wrap_axis_f32(self.position.y, n);
    }

    /// Countdown: the view may already rotate, the avatar stands still
    fn advance_starting(&mut self, dt: f32) {
        if !self.is_rotating {
            if let Some(dir) = self.rotate_command.take() {
                self.begin_rotation(dir);
            }
        }
        self.do_rotation(dt);
        self.starting_elapsed += dt;
        if self.starting_elapsed >= START_DELAY {
            self.transition(GameState::Playing);
        }
    }

    fn advance_playing(&mut self, dt: f32) {
        self.do_rotation(dt);
        self.update_pace(dt);

        let mut step = 0.0;
        let mut crossed = false;
        if !self.is_rotating {
            step = self.velocity * self.velocity_scale * self.jump_velocity_scale * dt;
            let previous = self.position;
            let delta = self.direction.as_vec2() * step;
            self.position += delta;
            self.delta_position += delta;
            self.last_bounce_distance = (self.last_bounce_distance + step).min(1.0);

            let rounded = self.stage.wrap(IVec2::new(
                self.position.x.round() as i32,
                self.position.y.round() as i32,
            ));
            let floor_changed = previous.x.floor() != self.position.x.floor()
                || previous.y.floor() != self.position.y.floor();
            if floor_changed && rounded != self.last_crossed_position {
                crossed = true;
                self.last_crossed_position = rounded;
                // Airborne avatars pass over everything on the floor
                if self.height <= COLLISION_MAX_HEIGHT {
                    self.handle_collision(rounded);
                    if self.state != GameState::Playing {
                        return;
                    }
                }
            }
        }

        if !self.is_jumping && self.jump_command {
            self.jump_command = false;
            self.start_jump(NORMAL_JUMP_DISTANCE, NORMAL_JUMP_HEIGHT, 1.0);
            self.emit(Action::NormalJumpStart);
        }

        if self.is_jumping {
            self.remaining_jump_distance -= step;
            let progress = (self.total_jump_distance - self.remaining_jump_distance)
                / self.total_jump_distance;
            let arc = 2.0 * progress - 1.0;
            self.height = ((1.0 - arc * arc) * self.jump_height).max(0.0);
            if self.remaining_jump_distance <= 0.0 {
                self.is_jumping = false;
                self.height = 0.0;
                self.jump_velocity_scale = 1.0;
                self.emit(Action::JumpEnd);
            }
        }

        // A pending run-forward waits out the bounce recovery
        if self.run_forward_command {
            if !self.is_going_backward {
                self.run_forward_command = false;
            } else if self.last_bounce_distance >= 1.0 {
                self.run_forward_command = false;
                self.is_going_backward = false;
                self.direction = -self.direction;
                self.emit(Action::GoForward);
            }
        }

        if crossed && self.last_bounce_distance >= 1.0 && !self.is_jumping {
            if let Some(dir) = self.rotate_command.take() {
                self.begin_rotation(dir);
                self.position = self.last_crossed_position.as_vec2();
            }
        }
    }

    /// Chase: run straight at the emerald, no collisions apply
    fn advance_emerald(&mut self, dt: f32) {
        self.do_rotation(dt);
        let step = self.velocity * self.velocity_scale * self.jump_velocity_scale * dt;
        let delta = self.direction.as_vec2() * step;
        self.position += delta;
        self.delta_position += delta;
        // Closing speed is twice the run speed
        self.emerald_distance -= 2.0 * step;
        if self.emerald_distance <= 0.0 {
            self.emerald_distance = 0.0;
            self.transition(GameState::GameOver);
        }
    }

    fn advance_game_over(&mut self, dt: f32) {
        self.game_over_rotation_speed += TAU * dt;
        self.rotation_angle += self.game_over_rotation_speed * dt;
    }

    /// React to the object on the cell the avatar just stepped onto
    fn handle_collision(&mut self, cell: IVec2) {
        match self.stage.value_at(cell) {
            ObjectKind::BlueSphere => {
                self.stage.set_value_at(cell, ObjectKind::RedSphere);
                self.emit(Action::BlueSphereCollected);
                convert_loop(&mut self.stage, cell);
                // The conversion may have recolored the cell under us
                if self.stage.value_at(cell) == ObjectKind::Ring {
                    self.stage.collect_ring(cell);
                    self.emit(Action::RingCollected);
                    if self.stage.is_perfect() {
                        self.emit(Action::Perfect);
                    }
                }
                if self.stage.count(ObjectKind::BlueSphere) == 0 {
                    if self.is_going_backward {
                        self.is_going_backward = false;
                        self.direction = -self.direction;
                    }
                    self.position = cell.as_vec2();
                    self.velocity_scale = EMERALD_VELOCITY_SCALE;
                    self.is_emerald_visible = true;
                    self.emerald_distance = EMERALD_START_DISTANCE;
                    self.transition(GameState::Emerald);
                }
            }
            ObjectKind::Bumper => {
                self.last_bounce_distance = 0.0;
                self.is_going_backward = !self.is_going_backward;
                self.direction = -self.direction;
                self.position = cell.as_vec2();
                self.emit(Action::HitBumper);
                self.emit(if self.is_going_backward {
                    Action::GoBackward
                } else {
                    Action::GoForward
                });
            }
            ObjectKind::YellowSphere => {
                self.start_jump(
                    YELLOW_JUMP_DISTANCE,
                    YELLOW_JUMP_HEIGHT,
                    YELLOW_JUMP_VELOCITY_SCALE,
                );
                self.emit(Action::YellowSphereJumpStart);
            }
            ObjectKind::RedSphere => {
                self.transition(GameState::GameOver);
            }
            ObjectKind::Ring => {
                self.stage.collect_ring(cell);
                self.emit(Action::RingCollected);
                if self.stage.is_perfect() {
                    self.emit(Action::Perfect);
                }
            }
            ObjectKind::None => {}
        }
    }

    /// Consume a rotate command: quarter-turn the facing immediately,
    /// let the view catch up over the following ticks
    fn begin_rotation(&mut self, dir: RotateDirection) {
        self.is_rotating = true;
        match dir {
            RotateDirection::Left => {
                self.target_rotation_angle += FRAC_PI_2;
                self.direction = rotate_ccw(self.direction);
            }
            RotateDirection::Right => {
                self.target_rotation_angle -= FRAC_PI_2;
                self.direction = rotate_cw(self.direction);
            }
        }
    }

    /// Turn the view toward the target angle, clamping on arrival
    fn do_rotation(&mut self, dt: f32) {
        if !self.is_rotating {
            return;
        }
        let remaining = self.target_rotation_angle - self.rotation_angle;
        let step = self.angular_velocity * dt;
        if remaining.abs() <= step {
            self.rotation_angle = self.target_rotation_angle;
            self.is_rotating = false;
        } else {
            self.rotation_angle += step * remaining.signum();
        }
    }

    fn update_pace(&mut self, dt: f32) {
        self.speed_up_elapsed += dt;
        while self.speed_up_elapsed >= PACE_INTERVAL && self.current_pace < MAX_PACE {
            self.speed_up_elapsed -= PACE_INTERVAL;
            self.current_pace += 1;
            self.emit(Action::GameSpeedUp);
        }
        self.velocity = BASE_VELOCITY + self.current_pace as f32 * PACE_VELOCITY_STEP;
        self.angular_velocity =
            BASE_ANGULAR_VELOCITY + self.current_pace as f32 * PACE_ANGULAR_STEP;
    }

    fn start_jump(&mut self, distance: f32, height: f32, velocity_scale: f32) {
        self.is_jumping = true;
        self.total_jump_distance = distance;
        self.remaining_jump_distance = distance;
        self.jump_height = height;
        self.jump_velocity_scale = velocity_scale;
        self.height = 0.0;
    }
}
