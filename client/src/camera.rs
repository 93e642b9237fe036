//! Third-person orbit camera.
//!
//! Mouse drag sets the orbit angles (see `input`), the wheel the radius; the
//! camera chases the desired orbit position with a frame-rate independent lag
//! and always looks at a point just above the player's center.

use bevy::prelude::*;

use sim::PlayerController;

use crate::input::InputState;

/// Height of the orbit pivot above the player position.
const CAMERA_HEIGHT: f32 = 2.2;
/// Per-16ms fraction of the remaining distance the camera closes.
const CAMERA_LAG: f32 = 0.12;
/// The camera aims at roughly head height.
const LOOK_AT_HEIGHT: f32 = 1.2;

pub fn update_camera(
    player: Res<PlayerController>,
    input_state: Res<InputState>,
    time: Res<Time>,
    mut camera_query: Query<&mut Transform, With<Camera3d>>,
) {
    let Ok(mut camera_transform) = camera_query.single_mut() else {
        return;
    };

    let yaw = input_state.cam_yaw;
    let pitch = input_state.cam_pitch;
    let dist = input_state.cam_distance;
    let offset = Vec3::new(
        dist * pitch.cos() * yaw.sin(),
        dist * pitch.sin(),
        dist * pitch.cos() * yaw.cos(),
    );
    let desired = player.position() + Vec3::Y * CAMERA_HEIGHT + offset;

    let t = 1.0 - (1.0 - CAMERA_LAG).powf(time.delta_secs() * 60.0);
    camera_transform.translation = camera_transform.translation.lerp(desired, t);

    let target = player.position() + Vec3::Y * LOOK_AT_HEIGHT;
    camera_transform.look_at(target, Vec3::Y);
}
