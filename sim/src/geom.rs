//! Geometric probes for the capsule solver.
//!
//! Closest-point queries between segments and triangles. These run inside the
//! per-substep solver loop, so they are plain functions over stack values with
//! no allocation and no shared scratch state.

use bevy::prelude::*;

/// Tolerance for near-parallel / near-degenerate cases in the segment-segment
/// probe.
const SEG_EPS: f32 = 1e-9;

/// A world-space triangle, position-only.
#[derive(Clone, Copy, Debug)]
pub struct Triangle {
    pub a: Vec3,
    pub b: Vec3,
    pub c: Vec3,
}

impl Triangle {
    pub fn new(a: Vec3, b: Vec3, c: Vec3) -> Self {
        Self { a, b, c }
    }

    /// Unit face normal, following the winding order. Degenerate (sliver)
    /// triangles fall back to +Y rather than producing NaNs.
    pub fn normal(&self) -> Vec3 {
        (self.b - self.a)
            .cross(self.c - self.a)
            .try_normalize()
            .unwrap_or(Vec3::Y)
    }

    /// True when `p` (assumed on the triangle's plane) lies inside the
    /// triangle, with a small tolerance on the barycentric coordinates.
    pub fn contains_point(&self, p: Vec3) -> bool {
        let v0 = self.c - self.a;
        let v1 = self.b - self.a;
        let v2 = p - self.a;

        let dot00 = v0.dot(v0);
        let dot01 = v0.dot(v1);
        let dot02 = v0.dot(v2);
        let dot11 = v1.dot(v1);
        let dot12 = v1.dot(v2);

        let denom = dot00 * dot11 - dot01 * dot01;
        if denom.abs() < SEG_EPS {
            return false;
        }
        let inv = 1.0 / denom;
        let u = (dot11 * dot02 - dot01 * dot12) * inv;
        let v = (dot00 * dot12 - dot01 * dot02) * inv;

        let eps = 1e-6;
        u >= -eps && v >= -eps && u + v <= 1.0 + eps
    }

    /// Closest point on the triangle to `p` (Ericson, Real-Time Collision
    /// Detection, 5.1.5). Handles all vertex / edge / face regions.
    pub fn closest_point_to(&self, p: Vec3) -> Vec3 {
        let ab = self.b - self.a;
        let ac = self.c - self.a;
        let ap = p - self.a;

        let d1 = ab.dot(ap);
        let d2 = ac.dot(ap);
        if d1 <= 0.0 && d2 <= 0.0 {
            return self.a;
        }

        let bp = p - self.b;
        let d3 = ab.dot(bp);
        let d4 = ac.dot(bp);
        if d3 >= 0.0 && d4 <= d3 {
            return self.b;
        }

        let vc = d1 * d4 - d3 * d2;
        if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
            let t = d1 / (d1 - d3);
            return self.a + ab * t;
        }

        let cp = p - self.c;
        let d5 = ab.dot(cp);
        let d6 = ac.dot(cp);
        if d6 >= 0.0 && d5 <= d6 {
            return self.c;
        }

        let vb = d5 * d2 - d1 * d6;
        if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
            let t = d2 / (d2 - d6);
            return self.a + ac * t;
        }

        let va = d3 * d6 - d5 * d4;
        if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
            let t = (d4 - d3) / ((d4 - d3) + (d5 - d6));
            return self.b + (self.c - self.b) * t;
        }

        let denom = 1.0 / (va + vb + vc);
        let v = vb * denom;
        let w = vc * denom;
        self.a + ab * v + ac * w
    }
}

/// Closest points between two segments `[p1,q1]` and `[p2,q2]`.
///
/// Returns (point on first segment, point on second segment, distance).
/// Segments collapsed to a point are handled up front by projecting the
/// point onto the other segment (Ericson 5.1.9); near-parallel segments
/// collapse the first parameter to the segment start instead of dividing by
/// a vanishing determinant. Parameters that land outside `[0,1]` are clamped
/// and the other segment's parameter re-derived.
pub fn closest_points_segment_segment(p1: Vec3, q1: Vec3, p2: Vec3, q2: Vec3) -> (Vec3, Vec3, f32) {
    let u = q1 - p1;
    let v = q2 - p2;
    let w = p1 - p2;

    let a = u.dot(u);
    let b = u.dot(v);
    let c = v.dot(v);
    let d = u.dot(w);
    let e = v.dot(w);

    // Degenerate segments never reach the 2x2 system; project the point
    // onto the surviving segment and clamp.
    if a < SEG_EPS && c < SEG_EPS {
        return (p1, p2, p1.distance(p2));
    }
    if a < SEG_EPS {
        let tc = (e / c).clamp(0.0, 1.0);
        let on_second = p2 + v * tc;
        return (p1, on_second, p1.distance(on_second));
    }
    if c < SEG_EPS {
        let sc = (-d / a).clamp(0.0, 1.0);
        let on_first = p1 + u * sc;
        return (on_first, p2, on_first.distance(p2));
    }

    let det = a * c - b * b;
    let mut s_n;
    let s_d = if det < SEG_EPS { 1.0 } else { det };
    let mut t_n;
    let mut t_d = det;

    if det < SEG_EPS {
        s_n = 0.0;
        t_n = e;
        t_d = c;
    } else {
        s_n = b * e - c * d;
        t_n = a * e - b * d;
        if s_n < 0.0 {
            s_n = 0.0;
            t_n = e;
            t_d = c;
        } else if s_n > s_d {
            s_n = s_d;
            t_n = e + b;
            t_d = c;
        }
    }

    let sc;
    if t_n < 0.0 {
        t_n = 0.0;
        if -d < 0.0 {
            sc = 0.0;
        } else if -d > a {
            sc = 1.0;
        } else {
            sc = -d / a;
        }
    } else if t_n > t_d {
        t_n = t_d;
        let tmp = -d + b;
        if tmp < 0.0 {
            sc = 0.0;
        } else if tmp > a {
            sc = 1.0;
        } else {
            sc = tmp / a;
        }
    } else {
        sc = if s_d.abs() < SEG_EPS { 0.0 } else { s_n / s_d };
    }
    let tc = if t_d.abs() < SEG_EPS { 0.0 } else { t_n / t_d };

    let on_first = p1 + u * sc;
    let on_second = p2 + v * tc;
    (on_first, on_second, on_first.distance(on_second))
}

/// Closest points between a segment and a triangle.
///
/// Returns (point on triangle, point on segment, distance). When the segment
/// pierces the triangle's plane between its endpoints and the pierce point is
/// inside the triangle, the result is an exact intersection with distance
/// zero. Otherwise the minimum over five candidates: each segment endpoint vs
/// the triangle face, and the segment vs each of the three triangle edges.
/// The edge checks matter: the true closest feature pair can be
/// segment-interior vs edge-interior, which no point-vs-face projection
/// finds.
pub fn segment_triangle_closest_points(
    seg_start: Vec3,
    seg_end: Vec3,
    tri: &Triangle,
) -> (Vec3, Vec3, f32) {
    let n = tri.normal();
    let da = n.dot(seg_start - tri.a);
    let db = n.dot(seg_end - tri.a);

    if da * db <= 0.0 && (da - db).abs() > SEG_EPS {
        let t = (da / (da - db)).clamp(0.0, 1.0);
        let p = seg_start + (seg_end - seg_start) * t;
        if tri.contains_point(p) {
            return (p, p, 0.0);
        }
    }

    let mut best_d2 = f32::INFINITY;
    let mut on_tri = tri.a;
    let mut on_seg = seg_start;

    let qa = tri.closest_point_to(seg_start);
    let d2 = seg_start.distance_squared(qa);
    if d2 < best_d2 {
        best_d2 = d2;
        on_tri = qa;
        on_seg = seg_start;
    }

    let qb = tri.closest_point_to(seg_end);
    let d2 = seg_end.distance_squared(qb);
    if d2 < best_d2 {
        best_d2 = d2;
        on_tri = qb;
        on_seg = seg_end;
    }

    for (e1, e2) in [(tri.a, tri.b), (tri.b, tri.c), (tri.c, tri.a)] {
        let (s, e, dist) = closest_points_segment_segment(seg_start, seg_end, e1, e2);
        let d2 = dist * dist;
        if d2 < best_d2 {
            best_d2 = d2;
            on_seg = s;
            on_tri = e;
        }
    }

    (on_tri, on_seg, best_d2.sqrt())
}

/// Framerate-independent exponential damping toward `target`.
pub fn damp(current: f32, target: f32, lambda: f32, dt: f32) -> f32 {
    target + (current - target) * (-lambda * dt).exp()
}
