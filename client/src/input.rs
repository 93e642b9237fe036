//! Player input handling
//!
//! Keyboard drives movement, the mouse orbits the chase camera (drag to look,
//! wheel to zoom). Jump and respawn are edge-triggered here so the simulation
//! only ever sees a one-tick press.

use bevy::input::mouse::{MouseMotion, MouseWheel};
use bevy::prelude::*;

const LOOK_SENSITIVITY: f32 = 0.003;
const PITCH_LIMIT: f32 = 1.2;
const ZOOM_STEP: f32 = 0.6;
const ZOOM_MIN: f32 = 3.2;
const ZOOM_MAX: f32 = 10.5;

/// Client-side input state
#[derive(Resource)]
pub struct InputState {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    /// Hold Shift to sprint
    pub sprint: bool,
    /// Jump request (spacebar), true for exactly one frame per press
    pub jump_just_pressed: bool,
    /// Respawn request (R), true for exactly one frame per press
    pub respawn_just_pressed: bool,

    /// Camera orbit yaw, also the movement frame of reference
    pub cam_yaw: f32,
    /// Camera orbit pitch
    pub cam_pitch: f32,
    /// Camera orbit radius (mouse wheel)
    pub cam_distance: f32,
}

impl Default for InputState {
    fn default() -> Self {
        Self {
            forward: false,
            backward: false,
            left: false,
            right: false,
            sprint: false,
            jump_just_pressed: false,
            respawn_just_pressed: false,
            cam_yaw: 0.0,
            cam_pitch: 0.12,
            cam_distance: 5.8,
        }
    }
}

/// Handle keyboard input for movement
pub fn handle_keyboard_input(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut input_state: ResMut<InputState>,
) {
    input_state.forward = keyboard.pressed(KeyCode::KeyW) || keyboard.pressed(KeyCode::ArrowUp);
    input_state.backward = keyboard.pressed(KeyCode::KeyS) || keyboard.pressed(KeyCode::ArrowDown);
    input_state.left = keyboard.pressed(KeyCode::KeyA) || keyboard.pressed(KeyCode::ArrowLeft);
    input_state.right = keyboard.pressed(KeyCode::KeyD) || keyboard.pressed(KeyCode::ArrowRight);
    input_state.sprint =
        keyboard.pressed(KeyCode::ShiftLeft) || keyboard.pressed(KeyCode::ShiftRight);

    input_state.jump_just_pressed = keyboard.just_pressed(KeyCode::Space);
    input_state.respawn_just_pressed = keyboard.just_pressed(KeyCode::KeyR);
}

/// Handle mouse input: drag to orbit, wheel to zoom
pub fn handle_mouse_input(
    mut mouse_motion: MessageReader<MouseMotion>,
    mut mouse_wheel: MessageReader<MouseWheel>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    mut input_state: ResMut<InputState>,
) {
    let mut delta = Vec2::ZERO;
    for motion in mouse_motion.read() {
        delta += motion.delta;
    }

    if mouse_button.pressed(MouseButton::Left) && delta != Vec2::ZERO {
        input_state.cam_yaw -= delta.x * LOOK_SENSITIVITY;
        input_state.cam_pitch = (input_state.cam_pitch - delta.y * LOOK_SENSITIVITY)
            .clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    for wheel in mouse_wheel.read() {
        if wheel.y != 0.0 {
            input_state.cam_distance = (input_state.cam_distance - wheel.y.signum() * ZOOM_STEP)
                .clamp(ZOOM_MIN, ZOOM_MAX);
        }
    }
}
