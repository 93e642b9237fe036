//! Per-frame gameplay step for the local player.
//!
//! All simulation lives in the `sim` crate; this system feeds it input and
//! mirrors the result onto the render transform.

use bevy::prelude::*;

use sim::{Checkpoints, CollisionWorld, PlayerController, PlayerInput, Tuning};

use crate::input::InputState;
use crate::ui::Status;

/// Marker for the player's render mesh.
#[derive(Component)]
pub struct PlayerAvatar;

pub fn step_player(
    time: Res<Time>,
    tuning: Res<Tuning>,
    world: Res<CollisionWorld>,
    input_state: Res<InputState>,
    mut controller: ResMut<PlayerController>,
    mut checkpoints: ResMut<Checkpoints>,
    mut status: ResMut<Status>,
    mut avatar: Query<&mut Transform, With<PlayerAvatar>>,
) {
    // Long frame hitches advance the simulation by at most one clamped tick.
    let dt = time.delta_secs().min(tuning.max_tick_dt);

    if input_state.respawn_just_pressed {
        let i = checkpoints.respawn_active(&mut controller, &world, &tuning);
        status.set(format!(
            "Respawned at checkpoint {}/{}",
            i + 1,
            checkpoints.len()
        ));
    }

    let input = PlayerInput {
        forward: input_state.forward,
        backward: input_state.backward,
        left: input_state.left,
        right: input_state.right,
        sprint: input_state.sprint,
        jump_pressed: input_state.jump_just_pressed,
    };
    controller.update(&world, &input, input_state.cam_yaw, dt, &tuning);

    if controller.fell_out(&tuning) {
        let i = checkpoints.respawn_active(&mut controller, &world, &tuning);
        status.set(format!(
            "Fell! Back to checkpoint {}/{}",
            i + 1,
            checkpoints.len()
        ));
    }

    if let Some(i) = checkpoints.update_active(controller.position(), &tuning) {
        status.set(format!(
            "Checkpoint {}/{} reached",
            i + 1,
            checkpoints.len()
        ));
    }

    if let Ok(mut transform) = avatar.single_mut() {
        transform.translation = controller.position();
        transform.rotation = Quat::from_rotation_y(controller.heading);
    }
}
