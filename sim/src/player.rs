//! Player motion controller.
//!
//! Owns the capsule and velocity, integrates gravity and input each tick,
//! substeps the contact solver, and runs the jump state machine (coyote time,
//! jump buffering, air jumps). The surrounding game hands in a movement
//! intent and camera yaw and reads back position, grounded edges and speed.

use bevy::prelude::*;

use crate::capsule::Capsule;
use crate::collide::{resolve_capsule, snap_to_ground};
use crate::config::Tuning;
use crate::geom::damp;
use crate::world::CollisionWorld;

/// Movement intent for one tick, produced by the input layer.
///
/// `jump_pressed` is edge-triggered (one tick per key press); the controller
/// owns buffering, the input layer must not.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlayerInput {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub sprint: bool,
    pub jump_pressed: bool,
}

/// The player's simulation state. One per world; the capsule is mutated only
/// by the solver and ground snap during `update`, and by teleports.
#[derive(Resource)]
pub struct PlayerController {
    pub capsule: Capsule,
    pub velocity: Vec3,
    /// Smoothed facing yaw in radians.
    pub heading: f32,

    pub on_ground: bool,
    pub was_on_ground: bool,
    /// Seconds left in which a jump still counts as a ground jump after
    /// leaving a walkable surface.
    pub coyote_timer: f32,
    /// Seconds left in which an early jump press is still honored.
    pub jump_buffer_timer: f32,
    pub air_jumps_left: u32,
    /// True for the single tick a jump (ground or air) triggered.
    pub just_jumped: bool,
}

impl PlayerController {
    pub fn new(spawn_center: Vec3, tuning: &Tuning) -> Self {
        Self {
            capsule: Capsule::from_center(
                spawn_center,
                tuning.player_height,
                tuning.player_radius,
            ),
            velocity: Vec3::ZERO,
            heading: 0.0,
            on_ground: false,
            was_on_ground: false,
            coyote_timer: 0.0,
            jump_buffer_timer: 0.0,
            air_jumps_left: tuning.max_air_jumps,
            just_jumped: false,
        }
    }

    /// Exposed world position: the capsule segment midpoint.
    pub fn position(&self) -> Vec3 {
        self.capsule.center()
    }

    /// Horizontal speed, consumed by animation playback-rate scaling.
    pub fn horizontal_speed(&self) -> f32 {
        Vec2::new(self.velocity.x, self.velocity.z).length()
    }

    /// Airborne -> grounded edge for this tick (landing reaction).
    pub fn just_landed(&self) -> bool {
        self.on_ground && !self.was_on_ground
    }

    /// Grounded -> airborne edge for this tick (fall/jump reaction).
    pub fn just_left_ground(&self) -> bool {
        !self.on_ground && self.was_on_ground
    }

    /// True once the player has fallen out of the playable area.
    pub fn fell_out(&self, tuning: &Tuning) -> bool {
        self.position().y < tuning.fall_y
    }

    /// Teleport the capsule so its center sits at `center`, wiping all motion
    /// and jump state. Used by respawn.
    pub fn teleport_to(&mut self, center: Vec3, tuning: &Tuning) {
        self.capsule = Capsule::from_center(center, tuning.player_height, tuning.player_radius);
        self.velocity = Vec3::ZERO;
        self.on_ground = false;
        self.was_on_ground = false;
        self.coyote_timer = 0.0;
        self.jump_buffer_timer = 0.0;
        self.air_jumps_left = tuning.max_air_jumps;
        self.just_jumped = false;
    }

    /// Advance the simulation by `dt` seconds.
    pub fn update(
        &mut self,
        world: &CollisionWorld,
        input: &PlayerInput,
        cam_yaw: f32,
        dt: f32,
        tuning: &Tuning,
    ) {
        // Movement intent in world space: camera-relative, normalized.
        let mut wish = Vec3::ZERO;
        if input.forward {
            wish.z -= 1.0;
        }
        if input.backward {
            wish.z += 1.0;
        }
        if input.left {
            wish.x -= 1.0;
        }
        if input.right {
            wish.x += 1.0;
        }
        if wish.length_squared() > 0.0 {
            wish = wish.normalize();
        }
        wish = Quat::from_rotation_y(cam_yaw) * wish;

        // Exponentially damp horizontal velocity toward the target; air
        // control is a fraction of ground acceleration.
        let speed_target =
            tuning.move_speed * if input.sprint { tuning.sprint_mult } else { 1.0 };
        let accel = if self.on_ground {
            tuning.ground_accel
        } else {
            tuning.air_accel_base * tuning.air_control
        };
        self.velocity.x = damp(self.velocity.x, wish.x * speed_target, accel, dt);
        self.velocity.z = damp(self.velocity.z, wish.z * speed_target, accel, dt);

        self.velocity.y -= tuning.gravity * dt;
        if self.velocity.y < tuning.terminal_fall_speed {
            self.velocity.y = tuning.terminal_fall_speed;
        }

        self.evaluate_jump(input, dt, tuning);

        // Substep count from two bounds: total displacement against the
        // solver's per-step displacement budget, and estimated vertical
        // penetration against the per-step penetration target.
        let disp = self.velocity.length() * dt;
        let steps_by_speed = (disp / tuning.max_disp_per_substep.max(0.001)).ceil() as u32;
        let est_pen = self.velocity.y.abs() * dt;
        let steps_by_pen = (est_pen / tuning.substep_pen_target.max(0.075)).ceil() as u32;
        let steps = steps_by_speed.max(steps_by_pen).max(1);
        let dt_step = dt / steps as f32;

        let mut grounded = false;
        for _ in 0..steps {
            self.capsule.translate(self.velocity * dt_step);
            let res = resolve_capsule(world, &mut self.capsule, &mut self.velocity, tuning);
            grounded |= res.on_ground;
        }

        self.was_on_ground = self.on_ground;
        self.on_ground = grounded;

        // The solver can leave the capsule a hair off the floor without a
        // walkable contact; the snap closes that gap unless we are moving up.
        if !self.on_ground && self.velocity.y <= 1.0 {
            if snap_to_ground(world, &mut self.capsule, tuning.ground_snap_max, tuning) {
                self.on_ground = true;
                if self.velocity.y < 0.0 {
                    self.velocity.y = 0.0;
                }
            }
        }

        if self.just_landed() {
            self.air_jumps_left = tuning.max_air_jumps;
        }

        // Face the movement direction; no intent, no turn.
        if wish.length_squared() > 1e-4 {
            let target_yaw = wish.x.atan2(wish.z);
            let delta = wrap_angle(target_yaw - self.heading);
            self.heading = damp(self.heading, self.heading + delta, tuning.heading_damp, dt);
        }
    }

    /// Jump state machine: timers, buffered ground/coyote jumps, air jumps.
    fn evaluate_jump(&mut self, input: &PlayerInput, dt: f32, tuning: &Tuning) {
        self.coyote_timer = (self.coyote_timer - dt).max(0.0);
        self.jump_buffer_timer = (self.jump_buffer_timer - dt).max(0.0);
        if self.on_ground {
            self.coyote_timer = tuning.coyote_time;
        }
        if input.jump_pressed {
            self.jump_buffer_timer = tuning.jump_buffer;
        }

        self.just_jumped = false;
        if self.jump_buffer_timer <= 0.0 {
            return;
        }

        if self.on_ground || self.coyote_timer > 0.0 {
            // Ground (or coyote) jump: consumed atomically.
            self.velocity.y = tuning.jump_speed;
            self.just_jumped = true;
            self.air_jumps_left = tuning.max_air_jumps;
            self.coyote_timer = 0.0;
            self.jump_buffer_timer = 0.0;
        } else if self.air_jumps_left > 0 {
            // Additive with a floor: guarantees a perceptible boost even
            // when already moving upward.
            let impulse = tuning.jump_speed * tuning.double_jump_mult;
            let carried_up = self.velocity.y.max(0.0);
            self.velocity.y =
                (self.velocity.y + 0.85 * impulse).max(impulse + 0.25 * carried_up);
            self.just_jumped = true;
            self.air_jumps_left -= 1;
            self.jump_buffer_timer = 0.0;
        }
    }
}

/// Wrap an angle difference into `[-PI, PI]`.
fn wrap_angle(a: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    (a + PI).rem_euclid(TAU) - PI
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::CollisionWorldBuilder;

    const DT: f32 = 1.0 / 60.0;

    fn flat_quad(y: f32, extent: f32) -> Vec<Vec3> {
        let e = extent;
        vec![
            Vec3::new(-e, y, -e),
            Vec3::new(e, y, e),
            Vec3::new(e, y, -e),
            Vec3::new(-e, y, -e),
            Vec3::new(-e, y, e),
            Vec3::new(e, y, e),
        ]
    }

    fn floor_world() -> CollisionWorld {
        let mut builder = CollisionWorldBuilder::new();
        builder.add_triangle_source(&flat_quad(0.0, 30.0), &Transform::IDENTITY);
        builder.build()
    }

    fn idle() -> PlayerInput {
        PlayerInput::default()
    }

    fn jump_press() -> PlayerInput {
        PlayerInput {
            jump_pressed: true,
            ..Default::default()
        }
    }

    /// Run ticks until grounded (or the tick limit trips).
    fn settle(player: &mut PlayerController, world: &CollisionWorld, tuning: &Tuning) {
        for _ in 0..600 {
            player.update(world, &idle(), 0.0, DT, tuning);
            if player.on_ground {
                return;
            }
        }
        panic!("player never landed");
    }

    #[test]
    fn straight_fall_lands_on_plane() {
        let tuning = Tuning::default();
        let world = floor_world();
        let mut player = PlayerController::new(Vec3::new(0.0, 10.0, 0.0), &tuning);

        let mut prev_start_y = player.capsule.start.y;
        for _ in 0..600 {
            player.update(&world, &idle(), 0.0, DT, &tuning);
            // The capsule surface must never end a tick below the plane.
            assert!(player.capsule.bottom_y() > -tuning.skin_width);
            if player.on_ground {
                break;
            }
            prev_start_y = player.capsule.start.y;
        }
        assert!(player.on_ground);
        // Grounded within the tick that would have carried it through.
        assert!(prev_start_y - tuning.player_radius < tuning.terminal_fall_speed.abs() * DT);
        // Lower sphere center rests within the skin band above the plane:
        // the push-out seats it at exactly `radius`, later snap ticks at
        // `radius + skin`.
        assert!(player.capsule.start.y >= tuning.player_radius - 1e-4);
        assert!(player.capsule.start.y <= tuning.player_radius + tuning.skin_width + 1e-4);
        assert_eq!(player.velocity.y, 0.0);
    }

    #[test]
    fn settled_player_does_not_drift_or_bounce() {
        let tuning = Tuning::default();
        let world = floor_world();
        let mut player = PlayerController::new(Vec3::new(0.0, 3.0, 0.0), &tuning);
        settle(&mut player, &world, &tuning);

        let rest_y = player.capsule.start.y;
        for _ in 0..120 {
            player.update(&world, &idle(), 0.0, DT, &tuning);
            assert!(player.on_ground);
            assert!((player.capsule.start.y - rest_y).abs() <= tuning.skin_width);
        }
    }

    #[test]
    fn ground_jump_leaves_the_floor() {
        let tuning = Tuning::default();
        let world = floor_world();
        let mut player = PlayerController::new(Vec3::new(0.0, 3.0, 0.0), &tuning);
        settle(&mut player, &world, &tuning);

        player.update(&world, &jump_press(), 0.0, DT, &tuning);
        assert!(player.just_jumped);
        assert!(player.velocity.y > 0.0);

        // A few ticks later we are airborne and rising.
        for _ in 0..5 {
            player.update(&world, &idle(), 0.0, DT, &tuning);
        }
        assert!(!player.on_ground);
        assert!(player.position().y > tuning.player_height * 0.5 + 0.2);
    }

    #[test]
    fn jump_buffered_before_landing_fires_on_landing() {
        let mut tuning = Tuning::default();
        tuning.max_air_jumps = 0; // isolate the buffer from air jumps
        let world = floor_world();
        let mut player = PlayerController::new(Vec3::new(0.0, 1.5, 0.0), &tuning);

        // Fall, pressing jump shortly before touchdown.
        let mut pressed = false;
        let mut jumped = false;
        for _ in 0..300 {
            let low = player.capsule.bottom_y() < 0.5;
            let input = if low && !pressed {
                pressed = true;
                jump_press()
            } else {
                idle()
            };
            player.update(&world, &input, 0.0, DT, &tuning);
            if player.just_jumped {
                jumped = true;
                break;
            }
        }
        assert!(pressed);
        assert!(jumped, "buffered jump never fired");
        assert!(player.velocity.y > 0.0);
    }

    #[test]
    fn jump_request_outside_buffer_window_is_dropped() {
        let mut tuning = Tuning::default();
        tuning.max_air_jumps = 0;
        let world = floor_world();
        // High spawn: the press below happens ~0.6s before landing, far
        // outside the 0.15s buffer.
        let mut player = PlayerController::new(Vec3::new(0.0, 8.0, 0.0), &tuning);

        player.update(&world, &jump_press(), 0.0, DT, &tuning);
        for _ in 0..600 {
            player.update(&world, &idle(), 0.0, DT, &tuning);
            assert!(!player.just_jumped);
            if player.on_ground {
                break;
            }
        }
        assert!(player.on_ground);
        assert!(player.velocity.y <= 0.0);
    }

    #[test]
    fn coyote_jump_after_leaving_ground_is_a_ground_jump() {
        let mut tuning = Tuning::default();
        tuning.max_air_jumps = 1;
        let world = floor_world();
        let mut player = PlayerController::new(Vec3::new(0.0, 3.0, 0.0), &tuning);
        settle(&mut player, &world, &tuning);

        // Fake walking off a ledge: lift the capsule clear of snap range.
        player.capsule.translate(Vec3::Y * 1.0);
        player.update(&world, &idle(), 0.0, DT, &tuning);
        assert!(!player.on_ground);

        // Two ticks later we are still inside the coyote window.
        player.update(&world, &jump_press(), 0.0, DT, &tuning);
        assert!(player.just_jumped);
        assert_eq!(player.velocity.y, tuning.jump_speed);
        // A ground jump refills rather than consumes the air-jump budget.
        assert_eq!(player.air_jumps_left, tuning.max_air_jumps);
    }

    #[test]
    fn late_jump_consumes_air_jump_instead() {
        let mut tuning = Tuning::default();
        tuning.max_air_jumps = 1;
        let world = floor_world();
        let mut player = PlayerController::new(Vec3::new(0.0, 3.0, 0.0), &tuning);
        settle(&mut player, &world, &tuning);

        player.capsule.translate(Vec3::Y * 2.0);
        // Let the coyote window expire.
        let coyote_ticks = (tuning.coyote_time / DT).ceil() as u32 + 2;
        for _ in 0..coyote_ticks {
            player.update(&world, &idle(), 0.0, DT, &tuning);
        }
        assert!(!player.on_ground);
        assert!(player.coyote_timer <= 0.0);

        player.update(&world, &jump_press(), 0.0, DT, &tuning);
        assert!(player.just_jumped);
        assert_eq!(player.air_jumps_left, 0);
    }

    #[test]
    fn air_jump_budget_is_exactly_one_between_landings() {
        let mut tuning = Tuning::default();
        tuning.max_air_jumps = 1;
        let world = floor_world();
        let mut player = PlayerController::new(Vec3::new(0.0, 3.0, 0.0), &tuning);
        settle(&mut player, &world, &tuning);

        // Ground jump, then wait out the coyote window.
        player.update(&world, &jump_press(), 0.0, DT, &tuning);
        assert!(player.just_jumped);
        let coyote_ticks = (tuning.coyote_time / DT).ceil() as u32 + 2;
        for _ in 0..coyote_ticks {
            player.update(&world, &idle(), 0.0, DT, &tuning);
        }

        // First air jump succeeds.
        player.update(&world, &jump_press(), 0.0, DT, &tuning);
        assert!(player.just_jumped);
        assert_eq!(player.air_jumps_left, 0);

        // Second one is a no-op.
        let vy_before = player.velocity.y;
        player.update(&world, &jump_press(), 0.0, DT, &tuning);
        assert!(!player.just_jumped);
        assert!(player.velocity.y <= vy_before);

        // Landing replenishes the budget.
        settle(&mut player, &world, &tuning);
        assert_eq!(player.air_jumps_left, 1);
    }

    #[test]
    fn air_jump_boost_has_a_floor_when_rising() {
        let tuning = Tuning::default();
        let world = floor_world();
        let mut player = PlayerController::new(Vec3::new(0.0, 3.0, 0.0), &tuning);
        player.velocity.y = 12.0;

        player.update(&world, &jump_press(), 0.0, DT, &tuning);
        assert!(player.just_jumped);
        let impulse = tuning.jump_speed * tuning.double_jump_mult;
        // Strictly faster than before, never a "dead" double jump.
        assert!(player.velocity.y > 12.0);
        assert!(player.velocity.y >= impulse);
    }

    #[test]
    fn terminal_fall_speed_clamps() {
        let tuning = Tuning::default();
        let world = CollisionWorldBuilder::new().build();
        let mut player = PlayerController::new(Vec3::new(0.0, 500.0, 0.0), &tuning);
        for _ in 0..240 {
            player.update(&world, &idle(), 0.0, DT, &tuning);
        }
        assert!((player.velocity.y - tuning.terminal_fall_speed).abs() < 1e-4);
    }

    #[test]
    fn missing_world_means_freefall_not_panic() {
        let tuning = Tuning::default();
        let world = CollisionWorldBuilder::new().build();
        let mut player = PlayerController::new(Vec3::new(0.0, 0.0, 0.0), &tuning);
        for _ in 0..60 {
            player.update(&world, &idle(), 0.0, DT, &tuning);
        }
        assert!(!player.on_ground);
        assert!(player.position().y < 0.0);
        assert!(player.fell_out(&tuning) == (player.position().y < tuning.fall_y));
    }

    #[test]
    fn sprint_raises_horizontal_speed_cap() {
        let tuning = Tuning::default();
        let world = floor_world();
        let mut walk = PlayerController::new(Vec3::new(0.0, 3.0, 0.0), &tuning);
        settle(&mut walk, &world, &tuning);
        let mut sprint_player = walk_clone(&walk, &tuning);

        let walk_input = PlayerInput {
            forward: true,
            ..Default::default()
        };
        let sprint_input = PlayerInput {
            forward: true,
            sprint: true,
            ..Default::default()
        };
        // Two seconds: enough to converge, short enough to stay on the slab.
        for _ in 0..120 {
            walk.update(&world, &walk_input, 0.0, DT, &tuning);
            sprint_player.update(&world, &sprint_input, 0.0, DT, &tuning);
        }
        assert!((walk.horizontal_speed() - tuning.move_speed).abs() < 0.2);
        assert!(
            (sprint_player.horizontal_speed() - tuning.move_speed * tuning.sprint_mult).abs() < 0.3
        );
    }

    fn walk_clone(p: &PlayerController, tuning: &Tuning) -> PlayerController {
        let mut c = PlayerController::new(p.position(), tuning);
        c.capsule = p.capsule;
        c.on_ground = p.on_ground;
        c.was_on_ground = p.was_on_ground;
        c
    }

    #[test]
    fn heading_turns_toward_intent_and_holds_when_idle() {
        let tuning = Tuning::default();
        let world = floor_world();
        let mut player = PlayerController::new(Vec3::new(0.0, 3.0, 0.0), &tuning);
        settle(&mut player, &world, &tuning);

        let input = PlayerInput {
            right: true,
            ..Default::default()
        };
        for _ in 0..120 {
            player.update(&world, &input, 0.0, DT, &tuning);
        }
        // Intent +X maps to yaw atan2(1, 0) = PI/2.
        assert!((player.heading - std::f32::consts::FRAC_PI_2).abs() < 0.05);

        let held = player.heading;
        for _ in 0..30 {
            player.update(&world, &idle(), 0.0, DT, &tuning);
        }
        assert_eq!(player.heading, held);
    }
}
