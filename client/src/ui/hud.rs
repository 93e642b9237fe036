//! In-game HUD: a single status line for checkpoint and respawn messages.

use bevy::prelude::*;

use super::styles::*;
use crate::states::GameState;

pub struct HudPlugin;

impl Plugin for HudPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Status>();
        app.add_systems(OnEnter(GameState::Playing), spawn_hud);
        app.add_systems(OnExit(GameState::Playing), despawn_hud);
        app.add_systems(Update, update_hud.run_if(in_state(GameState::Playing)));
    }
}

/// Latest status message shown in the corner of the screen.
#[derive(Resource, Default)]
pub struct Status {
    message: String,
}

impl Status {
    pub fn set(&mut self, message: String) {
        self.message = message;
    }
}

/// Marker for the HUD root
#[derive(Component)]
struct HudRoot;

/// Marker for the status text line
#[derive(Component)]
struct StatusText;

fn spawn_hud(mut commands: Commands) {
    commands
        .spawn((
            HudRoot,
            Node {
                position_type: PositionType::Absolute,
                left: Val::Px(16.0),
                top: Val::Px(12.0),
                flex_direction: FlexDirection::Column,
                ..default()
            },
        ))
        .with_children(|parent| {
            parent.spawn((
                StatusText,
                Text::new(""),
                TextFont {
                    font_size: 18.0,
                    ..default()
                },
                TextColor(ACCENT_COLOR),
            ));
            parent.spawn((
                Text::new("WASD move \u{b7} Shift sprint \u{b7} Space jump \u{b7} R respawn"),
                TextFont {
                    font_size: 13.0,
                    ..default()
                },
                TextColor(TEXT_MUTED),
            ));
        });
}

fn despawn_hud(mut commands: Commands, query: Query<Entity, With<HudRoot>>) {
    for entity in query.iter() {
        commands.entity(entity).despawn();
    }
}

fn update_hud(status: Res<Status>, mut query: Query<&mut Text, With<StatusText>>) {
    if !status.is_changed() {
        return;
    }
    if let Ok(mut text) = query.single_mut() {
        text.0 = status.message.clone();
    }
}
