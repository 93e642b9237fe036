//! Capsule-vs-world contact resolution and ground snapping.
//!
//! The solver is discrete: it detects triangles already penetrating the
//! capsule's effective radius and pushes the capsule out, rather than sweeping
//! the motion. The motion controller keeps per-substep displacement small
//! relative to the capsule radius, which is what makes this stable.

use bevy::prelude::*;

use crate::capsule::Capsule;
use crate::config::Tuning;
use crate::geom::segment_triangle_closest_points;
use crate::world::CollisionWorld;

/// Outcome of one solver call (one substep).
#[derive(Clone, Copy, Debug, Default)]
pub struct Resolution {
    /// At least one triangle penetrated the capsule.
    pub collided: bool,
    /// At least one contact normal was walkable.
    pub on_ground: bool,
}

/// Push `capsule` out of every penetrating triangle and strip the components
/// of `velocity` that drive further penetration.
///
/// Runs up to `max_resolve_iters` iterations: pushing out of one triangle can
/// reveal penetration into a neighbor at mesh seams, so each iteration
/// re-queries the BVH around the moved capsule. Stops early once an iteration
/// finds no contacts. Hitting the cap with contacts still present is
/// accepted; the next substep keeps pushing.
///
/// A contact whose face normal has `y > walkable_normal_y` marks the result
/// as grounded. Velocity response is sliding contact: for each contact normal
/// the inward component is removed, tangential velocity is untouched.
pub fn resolve_capsule(
    world: &CollisionWorld,
    capsule: &mut Capsule,
    velocity: &mut Vec3,
    tuning: &Tuning,
) -> Resolution {
    let mut result = Resolution::default();
    if world.is_empty() {
        return result;
    }

    let r_eff = tuning.effective_radius();
    let mut candidates: Vec<u32> = Vec::new();
    let mut contacts: Vec<Vec3> = Vec::new();

    for _ in 0..tuning.max_resolve_iters {
        // Bounding sphere around the capsule, recomputed each iteration since
        // the previous one may have moved it.
        let sphere_center = capsule.center();
        let sphere_radius = capsule.radius + capsule.segment_half_length() + tuning.skin_width;

        candidates.clear();
        world.for_each_in_sphere(sphere_center, sphere_radius, &mut |i| candidates.push(i));

        contacts.clear();
        for &i in &candidates {
            let tri = world.triangle(i);
            let (on_tri, on_seg, dist) =
                segment_triangle_closest_points(capsule.start, capsule.end, tri);
            if dist >= r_eff {
                continue;
            }

            // Push along the closest-point axis, far enough to restore the
            // skin margin on top of the effective radius.
            let depth = (r_eff - dist) + tuning.skin_width;
            let axis = on_seg - on_tri;
            let len = axis.length().max(1e-8);
            let dir = axis / len;
            capsule.translate(dir * depth);

            let normal = tri.normal();
            if normal.y > tuning.walkable_normal_y {
                result.on_ground = true;
            }
            contacts.push(normal);
            result.collided = true;
        }

        for n in &contacts {
            let vn = velocity.dot(*n);
            if vn < 0.0 {
                *velocity -= *n * vn;
            }
        }

        if contacts.is_empty() {
            break;
        }
    }

    result
}

/// Seat a near-ground capsule exactly onto the walkable surface below it.
///
/// Casts one ray down from just above the capsule's vertical center and takes
/// the first walkable hit. The capsule's lower sphere center belongs exactly
/// `radius + skin_width` above that hit; if reaching that spot needs a
/// vertical shift within `[-0.02, max_dist + 0.02]` (a hair down, or up to
/// `max_dist` up when the capsule ended the substep slightly low), the
/// capsule is moved and the call succeeds. Anything else leaves the capsule
/// untouched. This removes the micro-hover and micro-bounce a discrete
/// solver leaves behind around the rest height.
pub fn snap_to_ground(
    world: &CollisionWorld,
    capsule: &mut Capsule,
    max_dist: f32,
    tuning: &Tuning,
) -> bool {
    if world.is_empty() {
        return false;
    }

    let half_seg = capsule.segment_half_length();
    let mut origin = capsule.center();
    origin.y += half_seg.min(0.3);
    let range = half_seg + max_dist + capsule.radius + 0.05;

    for hit in world.raycast_down(origin, range) {
        if hit.normal.y <= tuning.walkable_normal_y {
            continue;
        }
        let desired_start_y = hit.point.y + capsule.radius + tuning.skin_width;
        let delta = desired_start_y - capsule.start.y;
        if (-0.02..=max_dist + 0.02).contains(&delta) {
            capsule.translate(Vec3::Y * delta);
            return true;
        }
        // First walkable hit decides; a deeper surface must not grab us.
        return false;
    }
    false
}
