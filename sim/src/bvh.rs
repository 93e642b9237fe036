//! Bounding volume hierarchy over the baked collision triangles.
//!
//! A binary AABB tree built once after world generation. Per-tick queries are
//! sphere overlaps (capsule solver) and straight-down rays (ground snap and
//! checkpoint alignment), so those are the only traversals implemented.

use bevy::prelude::*;

use crate::geom::Triangle;

/// Leaves stop splitting at this many triangles; below that, brute force is
/// cheaper than deeper traversal.
const LEAF_SIZE: usize = 4;

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn from_triangle(tri: &Triangle) -> Self {
        Self {
            min: tri.a.min(tri.b).min(tri.c),
            max: tri.a.max(tri.b).max(tri.c),
        }
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Sphere overlap test via closest point on the box.
    pub fn intersects_sphere(&self, center: Vec3, radius: f32) -> bool {
        let closest = center.clamp(self.min, self.max);
        closest.distance_squared(center) <= radius * radius
    }

    /// True when a ray cast straight down from `origin` over `max_dist` can
    /// touch this box.
    pub fn intersects_ray_down(&self, origin: Vec3, max_dist: f32) -> bool {
        if origin.x < self.min.x
            || origin.x > self.max.x
            || origin.z < self.min.z
            || origin.z > self.max.z
        {
            return false;
        }
        // Box entirely above the origin, or entirely below the ray's reach.
        origin.y >= self.min.y && origin.y - max_dist <= self.max.y
    }
}

enum BvhNode {
    Leaf {
        aabb: Aabb,
        /// Indices into the world's triangle list.
        triangles: Vec<u32>,
    },
    Internal {
        aabb: Aabb,
        left: Box<BvhNode>,
        right: Box<BvhNode>,
    },
}

impl BvhNode {
    fn aabb(&self) -> &Aabb {
        match self {
            BvhNode::Leaf { aabb, .. } => aabb,
            BvhNode::Internal { aabb, .. } => aabb,
        }
    }
}

/// Spatial index over the collision triangles. Immutable after `build`.
pub struct Bvh {
    root: BvhNode,
}

impl Bvh {
    /// Build over `triangles`. Returns `None` for an empty slice; callers
    /// treat a missing BVH as "no collision geometry".
    pub fn build(triangles: &[Triangle]) -> Option<Bvh> {
        if triangles.is_empty() {
            return None;
        }
        let mut items: Vec<(u32, Aabb)> = triangles
            .iter()
            .enumerate()
            .map(|(i, t)| (i as u32, Aabb::from_triangle(t)))
            .collect();
        Some(Bvh {
            root: Self::build_recursive(&mut items),
        })
    }

    fn build_recursive(items: &mut [(u32, Aabb)]) -> BvhNode {
        let mut aabb = items[0].1;
        for (_, b) in items.iter().skip(1) {
            aabb = aabb.union(b);
        }

        if items.len() <= LEAF_SIZE {
            return BvhNode::Leaf {
                aabb,
                triangles: items.iter().map(|(i, _)| *i).collect(),
            };
        }

        // Median split along the widest centroid axis; keeps the tree
        // balanced without a surface-area heuristic.
        let extent = aabb.max - aabb.min;
        let axis = if extent.x >= extent.y && extent.x >= extent.z {
            0
        } else if extent.y >= extent.z {
            1
        } else {
            2
        };

        items.sort_by(|a, b| {
            let ca = a.1.center()[axis];
            let cb = b.1.center()[axis];
            ca.partial_cmp(&cb).unwrap_or(std::cmp::Ordering::Equal)
        });

        let mid = items.len() / 2;
        let (left_items, right_items) = items.split_at_mut(mid);
        let left = Self::build_recursive(left_items);
        let right = Self::build_recursive(right_items);

        BvhNode::Internal {
            aabb,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Visit the index of every triangle whose bounds overlap the sphere.
    pub fn for_each_in_sphere(&self, center: Vec3, radius: f32, visit: &mut impl FnMut(u32)) {
        Self::sphere_recursive(&self.root, center, radius, visit);
    }

    fn sphere_recursive(node: &BvhNode, center: Vec3, radius: f32, visit: &mut impl FnMut(u32)) {
        if !node.aabb().intersects_sphere(center, radius) {
            return;
        }
        match node {
            BvhNode::Leaf { triangles, .. } => {
                for &i in triangles {
                    visit(i);
                }
            }
            BvhNode::Internal { left, right, .. } => {
                Self::sphere_recursive(left, center, radius, visit);
                Self::sphere_recursive(right, center, radius, visit);
            }
        }
    }

    /// Visit every triangle a straight-down ray from `origin` could hit
    /// within `max_dist`. Hit ordering is the caller's job.
    pub fn for_each_ray_down(&self, origin: Vec3, max_dist: f32, visit: &mut impl FnMut(u32)) {
        Self::ray_recursive(&self.root, origin, max_dist, visit);
    }

    fn ray_recursive(node: &BvhNode, origin: Vec3, max_dist: f32, visit: &mut impl FnMut(u32)) {
        if !node.aabb().intersects_ray_down(origin, max_dist) {
            return;
        }
        match node {
            BvhNode::Leaf { triangles, .. } => {
                for &i in triangles {
                    visit(i);
                }
            }
            BvhNode::Internal { left, right, .. } => {
                Self::ray_recursive(left, origin, max_dist, visit);
                Self::ray_recursive(right, origin, max_dist, visit);
            }
        }
    }
}
