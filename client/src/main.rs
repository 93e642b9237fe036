//! Tower of Overtime - a third-person platformer up a spiral of office props
//!
//! All movement and collision logic lives in the `sim` crate; this binary
//! renders the tower, reads input and drives the simulation once per frame.

mod camera;
mod input;
mod player;
mod states;
mod ui;
mod world;

use bevy::prelude::*;
use bevy::window::WindowResolution;

use sim::Tuning;
use states::GameState;

/// Sky backdrop color.
const SKY_COLOR: Color = Color::srgb(0.749, 0.910, 1.0);

/// Load tuning overrides from `assets/tuning.ron` if present.
///
/// The file may override any subset of fields; a missing file means shipped
/// defaults and a malformed one is ignored with a warning.
fn load_tuning() -> Tuning {
    match std::fs::read_to_string("assets/tuning.ron") {
        Ok(text) => match ron::from_str(&text) {
            Ok(tuning) => {
                info!("Loaded tuning overrides from assets/tuning.ron");
                tuning
            }
            Err(err) => {
                warn!("Ignoring malformed assets/tuning.ron: {err}");
                Tuning::default()
            }
        },
        Err(_) => Tuning::default(),
    }
}

fn main() {
    let mut app = App::new();

    app.add_plugins(DefaultPlugins.set(WindowPlugin {
        primary_window: Some(Window {
            title: "Tower of Overtime".to_string(),
            resolution: WindowResolution::new(1280, 720),
            ..default()
        }),
        ..default()
    }));

    app.insert_resource(ClearColor(SKY_COLOR));
    app.insert_resource(load_tuning());
    app.init_resource::<input::InputState>();

    // Game state machine
    app.init_state::<GameState>();

    // UI plugins
    app.add_plugins(ui::MainMenuPlugin);
    app.add_plugins(ui::PauseMenuPlugin);
    app.add_plugins(ui::HudPlugin);

    // Build the tower, bake collision and spawn the player once at startup;
    // the world sits behind the menu until the run starts.
    app.add_systems(Startup, world::setup_world);

    // Gameplay systems (only when playing). Input must be sampled before the
    // simulation step, and the camera reads the post-step player position.
    app.add_systems(
        Update,
        (
            input::handle_keyboard_input,
            input::handle_mouse_input,
            player::step_player,
            camera::update_camera,
        )
            .chain()
            .run_if(in_state(GameState::Playing)),
    );
    app.add_systems(
        Update,
        world::animate_sun.run_if(in_state(GameState::Playing)),
    );

    app.run();
}
