//! Office-tower world generation.
//!
//! The level is a spiral staircase of office props rendered as plain boxes:
//! every platform's collision shape is baked into the static trimesh while a
//! matching cuboid mesh is spawned for rendering. Checkpoints land on every
//! seventh platform and get a beacon light. Generation runs once at startup;
//! the collision world is immutable afterwards.

use bevy::prelude::*;
use rand::Rng;
use std::f32::consts::PI;

use sim::{Checkpoints, CollisionWorldBuilder, PlayerController, Tuning};

use crate::player::PlayerAvatar;

/// Uniform XZ upscale applied to every platform footprint (height is kept).
const PLATFORM_SIZE_MULT: f32 = 1.4;
/// Extra upscale for the start platform.
const START_SIZE_MULT: f32 = 1.6;

const STEPS_TOTAL: usize = 50;
/// The first few steps use smaller gaps and rises to ease players in.
const EASY_STEPS: usize = 5;
const RISE_EASY: f32 = 0.9;
const RISE_NORM: f32 = 1.3;
const GAP_EASY: f32 = 0.9;
const GAP_NORM: f32 = 1.15;
const TURN_PER_STEP: f32 = PI / 7.0;
/// Every seventh platform carries a checkpoint.
const CHECKPOINT_EVERY: usize = 7;

/// Platform footprint width per step, cycling through the tower's office-prop
/// categories (keyboard, server rack, desk, laptop, tower case, server rack,
/// chair).
const STEP_WIDTHS: [f32; 7] = [3.2, 1.6, 4.5, 2.8, 2.0, 1.6, 2.2];

const PLATFORM_HEIGHT: f32 = 0.3;

/// Marker for the sun directional light (slowly animated).
#[derive(Component)]
pub struct SunLight;

/// Footprint of a platform for a given target width. Depth is proportional
/// but never degenerates below a standable minimum.
fn platform_size(width: f32) -> Vec3 {
    Vec3::new(
        width * PLATFORM_SIZE_MULT,
        PLATFORM_HEIGHT,
        (width * 0.6).max(1.2) * PLATFORM_SIZE_MULT,
    )
}

/// Half the XZ diagonal; step spacing uses it so consecutive platforms never
/// overlap regardless of their yaw.
fn diag_radius(size: Vec3) -> f32 {
    Vec2::new(size.x, size.z).length() * 0.5
}

/// Non-indexed triangle list for an axis-aligned box centered at the origin,
/// wound counter-clockwise viewed from outside.
fn cuboid_triangles(size: Vec3) -> Vec<Vec3> {
    let h = size * 0.5;
    vec![
        // +Y
        Vec3::new(-h.x, h.y, -h.z),
        Vec3::new(h.x, h.y, h.z),
        Vec3::new(h.x, h.y, -h.z),
        Vec3::new(-h.x, h.y, -h.z),
        Vec3::new(-h.x, h.y, h.z),
        Vec3::new(h.x, h.y, h.z),
        // -Y
        Vec3::new(-h.x, -h.y, -h.z),
        Vec3::new(h.x, -h.y, -h.z),
        Vec3::new(h.x, -h.y, h.z),
        Vec3::new(-h.x, -h.y, -h.z),
        Vec3::new(h.x, -h.y, h.z),
        Vec3::new(-h.x, -h.y, h.z),
        // +X
        Vec3::new(h.x, -h.y, -h.z),
        Vec3::new(h.x, h.y, -h.z),
        Vec3::new(h.x, h.y, h.z),
        Vec3::new(h.x, -h.y, -h.z),
        Vec3::new(h.x, h.y, h.z),
        Vec3::new(h.x, -h.y, h.z),
        // -X
        Vec3::new(-h.x, -h.y, -h.z),
        Vec3::new(-h.x, h.y, h.z),
        Vec3::new(-h.x, h.y, -h.z),
        Vec3::new(-h.x, -h.y, -h.z),
        Vec3::new(-h.x, -h.y, h.z),
        Vec3::new(-h.x, h.y, h.z),
        // +Z
        Vec3::new(-h.x, -h.y, h.z),
        Vec3::new(h.x, -h.y, h.z),
        Vec3::new(h.x, h.y, h.z),
        Vec3::new(-h.x, -h.y, h.z),
        Vec3::new(h.x, h.y, h.z),
        Vec3::new(-h.x, h.y, h.z),
        // -Z
        Vec3::new(-h.x, -h.y, -h.z),
        Vec3::new(h.x, h.y, -h.z),
        Vec3::new(h.x, -h.y, -h.z),
        Vec3::new(-h.x, -h.y, -h.z),
        Vec3::new(-h.x, h.y, -h.z),
        Vec3::new(h.x, h.y, -h.z),
    ]
}

/// One-time scene build: lighting, ground, the platform spiral, checkpoints,
/// the baked collision world and the player.
pub fn setup_world(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    tuning: Res<Tuning>,
) {
    let mut builder = CollisionWorldBuilder::new();
    let mut checkpoint_points = Vec::new();

    spawn_lights(&mut commands);
    spawn_ground(&mut commands, &mut meshes, &mut materials, &mut builder);

    let platform_material = materials.add(StandardMaterial {
        base_color: Color::srgb_u8(0xCF, 0xE6, 0xFF),
        perceptual_roughness: 0.9,
        metallic: 0.05,
        ..default()
    });

    let mut spawn_platform = |commands: &mut Commands,
                              meshes: &mut Assets<Mesh>,
                              builder: &mut CollisionWorldBuilder,
                              size: Vec3,
                              pos: Vec3,
                              yaw: f32| {
        // The platform sits on `pos`; the box itself is centered half a
        // height above it.
        let transform = Transform {
            translation: pos + Vec3::Y * (size.y * 0.5),
            rotation: Quat::from_rotation_y(yaw),
            ..default()
        };
        builder.add_triangle_source(&cuboid_triangles(size), &transform);
        commands.spawn((
            Mesh3d(meshes.add(Cuboid::new(size.x, size.y, size.z))),
            MeshMaterial3d(platform_material.clone()),
            transform,
        ));
    };

    // A checkpoint hovers above its platform; surface alignment drops it onto
    // the exact mesh later.
    let rough_checkpoint = |pos: Vec3, size: Vec3| {
        pos + Vec3::Y * (size.y + tuning.player_height * 0.6 + 0.2)
    };

    // Start platform, larger than the regular steps.
    let start_size = platform_size(STEP_WIDTHS[0] * 1.25 * START_SIZE_MULT);
    let start_pos = Vec3::new(0.0, 0.2, 0.0);
    spawn_platform(&mut commands, &mut meshes, &mut builder, start_size, start_pos, 0.0);
    checkpoint_points.push(rough_checkpoint(start_pos, start_size));

    // The spiral: each step turns by a fixed angle and rises, with spacing
    // derived from the two footprints so platforms stay jumpable.
    let mut angle = 0.0_f32;
    let mut prev_center = start_pos;
    let mut prev_size = start_size;
    for i in 0..STEPS_TOTAL {
        angle += TURN_PER_STEP;
        let size = platform_size(STEP_WIDTHS[i % STEP_WIDTHS.len()]);
        let (gap, rise) = if i < EASY_STEPS {
            (GAP_EASY, RISE_EASY)
        } else {
            (GAP_NORM, RISE_NORM)
        };

        let dist = diag_radius(prev_size) + diag_radius(size) + gap;
        let dir = Vec3::new(angle.cos(), 0.0, angle.sin());
        let center = prev_center + dir * dist + Vec3::Y * rise;
        let yaw = angle + PI;
        spawn_platform(&mut commands, &mut meshes, &mut builder, size, center, yaw);

        if (i + 1) % CHECKPOINT_EVERY == 0 {
            let cp = rough_checkpoint(center, size);
            commands.spawn((
                PointLight {
                    color: Color::srgb_u8(0x66, 0xcc, 0xff),
                    intensity: 100_000.0,
                    range: 10.0,
                    shadows_enabled: false,
                    ..default()
                },
                Transform::from_translation(cp + Vec3::Y * 0.2),
            ));
            checkpoint_points.push(cp);
        }

        prev_center = center;
        prev_size = size;
    }

    let world = builder.build();
    let mut checkpoints = Checkpoints::new(checkpoint_points);
    checkpoints.align_to_surface(&world, &tuning);
    info!("tower built: {} checkpoints", checkpoints.len());

    let player = PlayerController::new(checkpoints.spawn_point(), &tuning);
    commands.spawn((
        PlayerAvatar,
        Mesh3d(meshes.add(Capsule3d::new(
            tuning.player_radius,
            tuning.capsule_segment_length(),
        ))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgb_u8(0xFF, 0x8C, 0x42),
            perceptual_roughness: 0.6,
            ..default()
        })),
        Transform::from_translation(player.position()),
    ));

    commands.insert_resource(world);
    commands.insert_resource(checkpoints);
    commands.insert_resource(player);
}

fn spawn_lights(commands: &mut Commands) {
    commands.insert_resource(AmbientLight {
        color: Color::WHITE,
        brightness: 300.0,
        ..default()
    });
    commands.spawn((
        SunLight,
        DirectionalLight {
            illuminance: 10_000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(10.0, 10.0, 8.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
    commands.spawn((
        Camera3d::default(),
        Transform::from_xyz(0.0, 4.0, 8.0).looking_at(Vec3::new(0.0, 1.0, 0.0), Vec3::Y),
    ));
}

fn spawn_ground(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    builder: &mut CollisionWorldBuilder,
) {
    // Visible floor plane; the collider is a slightly larger box whose top
    // face sits flush at y = 0.
    commands.spawn((
        Mesh3d(meshes.add(Plane3d::default().mesh().size(26.0, 26.0))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgb_u8(0xEA, 0xF4, 0xFF),
            perceptual_roughness: 0.95,
            metallic: 0.05,
            ..default()
        })),
        Transform::IDENTITY,
    ));
    builder.add_triangle_source(
        &cuboid_triangles(Vec3::new(28.0, 0.4, 28.0)),
        &Transform::from_translation(Vec3::new(0.0, -0.2, 0.0)),
    );

    // Decorative glowing circuit traces scattered on the floor.
    let trace_material = materials.add(StandardMaterial {
        base_color: Color::srgb_u8(0x00, 0x7A, 0xFF),
        emissive: LinearRgba::from(Color::srgb_u8(0x5F, 0xBA, 0xFF)) * 0.35,
        perceptual_roughness: 0.4,
        metallic: 0.6,
        ..default()
    });
    let mut rng = rand::thread_rng();
    for _ in 0..120 {
        let w = rng.gen_range(0.006..0.026);
        let l = rng.gen_range(1.5..7.5);
        commands.spawn((
            Mesh3d(meshes.add(Cuboid::new(w, 0.002, l))),
            MeshMaterial3d(trace_material.clone()),
            Transform {
                translation: Vec3::new(
                    rng.gen_range(-12.0..12.0),
                    0.002,
                    rng.gen_range(-12.0..12.0),
                ),
                rotation: Quat::from_rotation_y(rng.gen_range(0.0..PI)),
                ..default()
            },
        ));
    }
}

/// Drift the sun slowly so shadows move over the course of a run.
pub fn animate_sun(time: Res<Time>, mut query: Query<&mut Transform, With<SunLight>>) {
    let t = time.elapsed_secs() * 0.1;
    for mut transform in query.iter_mut() {
        transform.translation = Vec3::new(t.cos() * 10.0, 10.0 + t.sin() * 2.0, 8.0);
        transform.look_at(Vec3::ZERO, Vec3::Y);
    }
}
