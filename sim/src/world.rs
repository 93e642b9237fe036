//! Static collision world: baked triangle soup plus its BVH.
//!
//! World generation feeds every placed mesh through the builder, which bakes
//! triangles into world space, position-only. `build()` runs once after all
//! static geometry is placed; the result is read-only for the rest of the
//! session. A geometry change means a full rebuild, never an incremental
//! update.

use bevy::prelude::*;

use crate::bvh::Bvh;
use crate::geom::Triangle;

/// Accumulates world-space triangles from placed geometry until `build`.
#[derive(Default)]
pub struct CollisionWorldBuilder {
    triangles: Vec<Triangle>,
}

impl CollisionWorldBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bake a mesh's triangles into world space and append them.
    ///
    /// `positions` is non-indexed triangle soup in local space (three vertices
    /// per triangle); every other vertex attribute is irrelevant to collision
    /// and never reaches this layer. Trailing vertices that do not complete a
    /// triangle are dropped.
    pub fn add_triangle_source(&mut self, positions: &[Vec3], transform: &Transform) {
        for tri in positions.chunks_exact(3) {
            self.triangles.push(Triangle::new(
                transform.transform_point(tri[0]),
                transform.transform_point(tri[1]),
                transform.transform_point(tri[2]),
            ));
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Merge everything accumulated so far and build the BVH.
    ///
    /// With zero triangles this logs a warning and returns an empty world;
    /// collision queries against it simply report no contact.
    pub fn build(self) -> CollisionWorld {
        if self.triangles.is_empty() {
            warn!("collision world built with zero triangles; all queries will report no contact");
            return CollisionWorld {
                triangles: Vec::new(),
                bvh: None,
            };
        }
        info!("collision world: {} triangles", self.triangles.len());
        let bvh = Bvh::build(&self.triangles);
        CollisionWorld {
            triangles: self.triangles,
            bvh,
        }
    }
}

/// A downward ray intersection.
#[derive(Clone, Copy, Debug)]
pub struct RayHit {
    pub point: Vec3,
    pub normal: Vec3,
    pub distance: f32,
}

/// The immutable collision mesh shared by the capsule solver, ground snap and
/// checkpoint surface alignment.
#[derive(Resource, Default)]
pub struct CollisionWorld {
    triangles: Vec<Triangle>,
    bvh: Option<Bvh>,
}

impl CollisionWorld {
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    pub fn triangle(&self, index: u32) -> &Triangle {
        &self.triangles[index as usize]
    }

    /// Visit every triangle whose bounds overlap the sphere. No-op on an
    /// unbuilt world.
    pub fn for_each_in_sphere(&self, center: Vec3, radius: f32, visit: &mut impl FnMut(u32)) {
        if let Some(bvh) = &self.bvh {
            bvh.for_each_in_sphere(center, radius, visit);
        }
    }

    /// Cast a ray straight down from `origin`, returning hits sorted
    /// near-to-far. Normals are flipped to face the ray. An unbuilt world or
    /// a miss returns an empty list; that is "no constraint", not an error.
    pub fn raycast_down(&self, origin: Vec3, max_dist: f32) -> Vec<RayHit> {
        let Some(bvh) = &self.bvh else {
            return Vec::new();
        };

        let mut hits = Vec::new();
        bvh.for_each_ray_down(origin, max_dist, &mut |i| {
            let tri = &self.triangles[i as usize];
            if let Some(hit) = ray_down_triangle(origin, max_dist, tri) {
                hits.push(hit);
            }
        });
        hits.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits
    }
}

/// Intersection of a straight-down ray with one triangle.
fn ray_down_triangle(origin: Vec3, max_dist: f32, tri: &Triangle) -> Option<RayHit> {
    let n = tri.normal();
    // Ray direction is (0,-1,0); a plane parallel to the ray can't be hit.
    if n.y.abs() < 1e-8 {
        return None;
    }
    let t = n.dot(origin - tri.a) / n.y;
    if t < 0.0 || t > max_dist {
        return None;
    }
    let point = origin - Vec3::Y * t;
    if !tri.contains_point(point) {
        return None;
    }
    // Report the face normal oriented against the ray (upward).
    let normal = if n.y < 0.0 { -n } else { n };
    Some(RayHit {
        point,
        normal,
        distance: t,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two triangles forming a horizontal quad at `y`, spanning +-extent.
    pub(crate) fn flat_quad(y: f32, extent: f32) -> Vec<Vec3> {
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

    #[test]
    fn empty_build_reports_no_contact() {
        let world = CollisionWorldBuilder::new().build();
        assert!(world.is_empty());
        assert!(world.raycast_down(Vec3::new(0.0, 10.0, 0.0), 100.0).is_empty());
        let mut visited = 0;
        world.for_each_in_sphere(Vec3::ZERO, 100.0, &mut |_| visited += 1);
        assert_eq!(visited, 0);
    }

    #[test]
    fn baking_applies_world_transform() {
        let mut builder = CollisionWorldBuilder::new();
        let transform = Transform::from_translation(Vec3::new(0.0, 3.0, 0.0));
        builder.add_triangle_source(&flat_quad(0.0, 5.0), &transform);
        assert_eq!(builder.triangle_count(), 2);
        let world = builder.build();

        let hits = world.raycast_down(Vec3::new(0.0, 10.0, 0.0), 100.0);
        assert_eq!(hits.len(), 2);
        assert!((hits[0].point.y - 3.0).abs() < 1e-5);
    }

    #[test]
    fn raycast_down_sorts_near_to_far() {
        let mut builder = CollisionWorldBuilder::new();
        let identity = Transform::IDENTITY;
        builder.add_triangle_source(&flat_quad(0.0, 5.0), &identity);
        builder.add_triangle_source(&flat_quad(4.0, 5.0), &identity);
        let world = builder.build();

        let hits = world.raycast_down(Vec3::new(0.3, 10.0, 0.3), 100.0);
        assert!(hits.len() >= 2);
        assert!(hits[0].distance <= hits[1].distance);
        assert!((hits[0].point.y - 4.0).abs() < 1e-5);
        // Normals face the ray.
        assert!(hits.iter().all(|h| h.normal.y > 0.0));
    }

    #[test]
    fn raycast_respects_max_distance() {
        let mut builder = CollisionWorldBuilder::new();
        builder.add_triangle_source(&flat_quad(0.0, 5.0), &Transform::IDENTITY);
        let world = builder.build();
        assert!(world.raycast_down(Vec3::new(0.0, 10.0, 0.0), 5.0).is_empty());
    }

    #[test]
    fn incomplete_triangle_tail_is_dropped() {
        let mut builder = CollisionWorldBuilder::new();
        let mut verts = flat_quad(0.0, 1.0);
        verts.push(Vec3::ZERO);
        builder.add_triangle_source(&verts, &Transform::IDENTITY);
        assert_eq!(builder.triangle_count(), 2);
    }
}
