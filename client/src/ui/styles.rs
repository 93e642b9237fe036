//! Shared UI styles - cool office-blue aesthetic

use bevy::prelude::*;

/// Dark background for menus
pub const MENU_BACKGROUND: Color = Color::srgb(0.04, 0.06, 0.09);

/// Primary button colors - dark with a cold tint
pub const BUTTON_NORMAL: Color = Color::srgb(0.08, 0.11, 0.16);
pub const BUTTON_HOVERED: Color = Color::srgb(0.12, 0.18, 0.26);
pub const BUTTON_PRESSED: Color = Color::srgb(0.16, 0.32, 0.52);

/// Accent color - monitor-glow blue
pub const ACCENT_COLOR: Color = Color::srgb(0.37, 0.73, 1.0);

/// Text colors
pub const TEXT_COLOR: Color = Color::srgb(0.88, 0.93, 0.98);
pub const TEXT_MUTED: Color = Color::srgb(0.42, 0.48, 0.55);

/// Standard button style
pub fn button_style() -> Node {
    Node {
        width: Val::Px(280.0),
        height: Val::Px(55.0),
        justify_content: JustifyContent::Center,
        align_items: AlignItems::Center,
        margin: UiRect::all(Val::Px(8.0)),
        ..default()
    }
}

/// Standard button text style
pub fn button_text_style() -> TextFont {
    TextFont {
        font_size: 22.0,
        ..default()
    }
}

/// Title text style
pub fn title_text_style() -> TextFont {
    TextFont {
        font_size: 72.0,
        ..default()
    }
}
