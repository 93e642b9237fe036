//! Checkpoints and respawn.
//!
//! Checkpoint positions come out of world layout as rough points above
//! platforms; a one-time alignment pass seats them onto the actual walkable
//! surface. At runtime the nearest checkpoint within a trigger radius becomes
//! the active respawn target. Capture is purely proximity based, not ordered.

use bevy::prelude::*;

use crate::collide::snap_to_ground;
use crate::config::Tuning;
use crate::player::PlayerController;
use crate::world::CollisionWorld;

/// Surface-alignment probes accept shallower normals than gameplay ground
/// checks; a checkpoint on a mildly sloped desk top is fine.
const ALIGN_NORMAL_Y: f32 = 0.2;

/// Fallback spawn used when world layout produced no checkpoints at all.
const FALLBACK_SPAWN: Vec3 = Vec3::new(0.0, 1.4, 0.0);

/// Ordered checkpoint list plus the player's most recently captured one.
#[derive(Resource, Default)]
pub struct Checkpoints {
    points: Vec<Vec3>,
    active: usize,
}

impl Checkpoints {
    pub fn new(points: Vec<Vec3>) -> Self {
        Self { points, active: 0 }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn point(&self, index: usize) -> Option<Vec3> {
        self.points.get(index).copied()
    }

    /// Spawn position for the start of a run.
    pub fn spawn_point(&self) -> Vec3 {
        self.points.first().copied().unwrap_or(FALLBACK_SPAWN)
    }

    /// One-time pass after world build: drop each checkpoint onto the surface
    /// beneath it so the player respawns standing, not floating. Points over
    /// the void keep their XZ and get a safe height above the ground slab.
    pub fn align_to_surface(&mut self, world: &CollisionWorld, tuning: &Tuning) {
        let half_height = tuning.player_height * 0.5;
        let clearance = tuning.skin_width.max(0.02);
        for p in &mut self.points {
            let origin = *p + Vec3::Y * 5.0;
            let hit = world
                .raycast_down(origin, 85.0)
                .into_iter()
                .find(|h| h.normal.y > ALIGN_NORMAL_Y);
            match hit {
                Some(h) => {
                    p.x = h.point.x;
                    p.z = h.point.z;
                    p.y = h.point.y + half_height + clearance;
                }
                None => {
                    p.y = p.y.max(half_height + 0.05);
                }
            }
        }
    }

    /// Proximity capture, called once per tick: the nearest checkpoint within
    /// the trigger radius becomes active. Returns the new index when it
    /// changed.
    pub fn update_active(&mut self, player_pos: Vec3, tuning: &Tuning) -> Option<usize> {
        let mut closest = 0;
        let mut best = f32::INFINITY;
        for (i, p) in self.points.iter().enumerate() {
            let d = p.distance_squared(player_pos);
            if d < best {
                best = d;
                closest = i;
            }
        }
        if closest != self.active && best.sqrt() < tuning.checkpoint_trigger_radius {
            self.active = closest;
            return Some(closest);
        }
        None
    }

    /// Teleport the player to the checkpoint at `index` (clamped into range),
    /// wiping velocity and jump state, then seat it with a generous one-time
    /// ground snap so it does not spawn floating. Returns the index used.
    pub fn respawn(
        &mut self,
        index: usize,
        player: &mut PlayerController,
        world: &CollisionWorld,
        tuning: &Tuning,
    ) -> usize {
        let index = if self.points.is_empty() {
            0
        } else {
            index.min(self.points.len() - 1)
        };
        let target = self.point(index).unwrap_or(FALLBACK_SPAWN);
        player.teleport_to(target, tuning);
        snap_to_ground(world, &mut player.capsule, tuning.respawn_snap_max, tuning);
        self.active = index;
        index
    }

    /// Respawn at the most recently captured checkpoint.
    pub fn respawn_active(
        &mut self,
        player: &mut PlayerController,
        world: &CollisionWorld,
        tuning: &Tuning,
    ) -> usize {
        self.respawn(self.active, player, world, tuning)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::CollisionWorldBuilder;

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
        builder.add_triangle_source(&flat_quad(0.0, 50.0), &Transform::IDENTITY);
        builder.build()
    }

    #[test]
    fn alignment_seats_checkpoints_on_surface() {
        let tuning = Tuning::default();
        let world = floor_world();
        let mut cps = Checkpoints::new(vec![Vec3::new(3.0, 2.5, -4.0)]);
        cps.align_to_surface(&world, &tuning);

        let p = cps.point(0).unwrap();
        let expected_y = tuning.player_height * 0.5 + 0.02;
        assert!((p.y - expected_y).abs() < 1e-4);
        assert_eq!((p.x, p.z), (3.0, -4.0));
    }

    #[test]
    fn alignment_over_void_keeps_safe_height() {
        let tuning = Tuning::default();
        let world = CollisionWorldBuilder::new().build();
        let mut cps = Checkpoints::new(vec![Vec3::new(0.0, -3.0, 0.0)]);
        cps.align_to_surface(&world, &tuning);
        assert!(cps.point(0).unwrap().y >= tuning.player_height * 0.5);
    }

    #[test]
    fn proximity_capture_switches_when_close() {
        let tuning = Tuning::default();
        let mut cps = Checkpoints::new(vec![
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(20.0, 1.0, 0.0),
            Vec3::new(40.0, 1.0, 0.0),
        ]);

        // Standing near checkpoint 1 captures it.
        assert_eq!(cps.update_active(Vec3::new(19.0, 1.0, 0.0), &tuning), Some(1));
        assert_eq!(cps.active_index(), 1);

        // Nearest but out of trigger range: no capture.
        assert_eq!(cps.update_active(Vec3::new(30.0, 1.0, 0.0), &tuning), None);
        assert_eq!(cps.active_index(), 1);

        // Capture is not monotonic: walking back near an earlier checkpoint
        // re-activates it.
        assert_eq!(cps.update_active(Vec3::new(1.0, 1.0, 0.0), &tuning), Some(0));
        assert_eq!(cps.active_index(), 0);
    }

    #[test]
    fn respawn_clamps_out_of_range_index() {
        let tuning = Tuning::default();
        let world = floor_world();
        let mut cps = Checkpoints::new(vec![
            Vec3::new(0.0, 0.87, 0.0),
            Vec3::new(10.0, 0.87, 0.0),
        ]);
        let mut player = PlayerController::new(Vec3::ZERO, &tuning);

        let used = cps.respawn(999, &mut player, &world, &tuning);
        assert_eq!(used, 1);
        assert!((player.position().x - 10.0).abs() < 1e-4);
    }

    #[test]
    fn respawn_seats_player_on_surface() {
        let tuning = Tuning::default();
        let world = floor_world();
        let mut cps = Checkpoints::new(vec![Vec3::new(0.0, 2.0, 0.0)]);
        cps.align_to_surface(&world, &tuning);
        let mut player = PlayerController::new(Vec3::new(50.0, 50.0, 50.0), &tuning);
        player.velocity = Vec3::new(3.0, -20.0, 1.0);
        player.air_jumps_left = 0;

        cps.respawn_active(&mut player, &world, &tuning);
        assert_eq!(player.velocity, Vec3::ZERO);
        assert_eq!(player.air_jumps_left, tuning.max_air_jumps);
        assert!(!player.on_ground && !player.was_on_ground);
        // Bottom rests within the generous snap distance of the floor.
        assert!(player.capsule.bottom_y().abs() <= tuning.respawn_snap_max);
        assert!(player.capsule.bottom_y() >= 0.0);
    }

    #[test]
    fn respawn_with_no_checkpoints_uses_fallback() {
        let tuning = Tuning::default();
        let world = floor_world();
        let mut cps = Checkpoints::default();
        let mut player = PlayerController::new(Vec3::ZERO, &tuning);
        cps.respawn(5, &mut player, &world, &tuning);
        assert!(player.position().distance(FALLBACK_SPAWN) < tuning.respawn_snap_max + 1.0);
    }
}
