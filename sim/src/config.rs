//! Movement and collision tunables.
//!
//! Everything gameplay-feel related lives in one struct so the client can
//! override it from a `tuning.ron` file without recompiling. Defaults are the
//! shipped values.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// All core tunables: gravity, speeds, jump feel, capsule dimensions and the
/// collision solver's stability constants.
#[derive(Resource, Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Downward acceleration in m/s^2 (positive number, applied as -Y).
    pub gravity: f32,
    /// Base horizontal move speed in m/s.
    pub move_speed: f32,
    /// Speed multiplier while sprint is held.
    pub sprint_mult: f32,
    /// Upward velocity set by a ground jump, in m/s.
    pub jump_speed: f32,
    /// Fraction of ground acceleration available while airborne.
    pub air_control: f32,
    /// Horizontal velocity damping rate while grounded.
    pub ground_accel: f32,
    /// Base horizontal damping rate while airborne (scaled by `air_control`).
    pub air_accel_base: f32,

    /// Capsule radius in meters.
    pub player_radius: f32,
    /// Total capsule height (bottom of lower cap to top of upper cap).
    pub player_height: f32,

    /// Falling below this Y triggers a respawn.
    pub fall_y: f32,
    /// Mid-air jumps available between landings.
    pub max_air_jumps: u32,
    /// Scale applied to `jump_speed` for mid-air jumps.
    pub double_jump_mult: f32,
    /// Grace period after walking off a ledge during which a jump still
    /// counts as a ground jump, in seconds.
    pub coyote_time: f32,
    /// How long an early jump press is remembered before landing, in seconds.
    pub jump_buffer: f32,

    /// Minimum upward normal component for a surface to count as ground.
    pub walkable_normal_y: f32,
    /// Fall speed clamp in m/s (negative).
    pub terminal_fall_speed: f32,
    /// Margin kept between the capsule surface and geometry to avoid
    /// floating-point sticking.
    pub skin_width: f32,
    /// Iteration cap for the push-out solver within one substep.
    pub max_resolve_iters: u32,
    /// Largest capsule displacement allowed per substep, in meters.
    pub max_disp_per_substep: f32,
    /// Target vertical penetration per substep, used to pick substep counts
    /// for fast falls.
    pub substep_pen_target: f32,
    /// Per-tick downward snap distance that glues a near-ground capsule onto
    /// walkable surfaces.
    pub ground_snap_max: f32,
    /// More generous snap distance used once right after a respawn teleport.
    pub respawn_snap_max: f32,

    /// Rate at which the character's facing turns toward its movement
    /// direction.
    pub heading_damp: f32,
    /// Simulation dt clamp; frame hitches longer than this advance the
    /// simulation by at most this much.
    pub max_tick_dt: f32,

    /// Distance within which the nearest checkpoint becomes the active one.
    pub checkpoint_trigger_radius: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        let player_radius = 0.35;
        Self {
            gravity: 24.0,
            move_speed: 7.0,
            sprint_mult: 1.5,
            jump_speed: 9.5,
            air_control: 0.45,
            ground_accel: 22.0,
            air_accel_base: 10.0,

            player_radius,
            player_height: 1.7,

            fall_y: -80.0,
            max_air_jumps: 1,
            double_jump_mult: 0.92,
            coyote_time: 0.12,
            jump_buffer: 0.15,

            walkable_normal_y: 0.6,
            terminal_fall_speed: -40.0,
            skin_width: 0.02,
            max_resolve_iters: 12,
            max_disp_per_substep: player_radius * 0.35,
            substep_pen_target: 0.10,
            ground_snap_max: 0.32,
            respawn_snap_max: 0.5,

            heading_damp: 12.0,
            max_tick_dt: 0.033,

            checkpoint_trigger_radius: 4.5,
        }
    }
}

impl Tuning {
    /// Capsule radius minus skin width; penetration is measured against this.
    pub fn effective_radius(&self) -> f32 {
        self.player_radius - self.skin_width
    }

    /// Length of the capsule's core segment (height minus both caps).
    pub fn capsule_segment_length(&self) -> f32 {
        (self.player_height - 2.0 * self.player_radius).max(0.0)
    }
}
