//! Pairwise circle intersection with a crossing-quality weight

use crate::core::{Circle, IntersectionPoint, GEOMETRY_EPSILON_M};

/// Intersection points of two distance circles (0, 1 or 2 of them).
///
/// Each point carries `w = clamp(h / min(r0, r1), 0, 1)` where `h` is the
/// half-chord: near-tangent crossings get little weight, near-orthogonal
/// crossings approach 1.
pub fn intersect(c0: &Circle, c1: &Circle) -> Vec<IntersectionPoint> {
    let delta = c1.center() - c0.center();
    let d = delta.norm();
    let (r0, r1) = (c0.radius_m, c1.radius_m);

    if d <= GEOMETRY_EPSILON_M || d > r0 + r1 || d < (r0 - r1).abs() {
        return Vec::new();
    }

    let a = (r0 * r0 - r1 * r1 + d * d) / (2.0 * d);
    let h = (r0 * r0 - a * a).max(0.0).sqrt();
    let unit = delta / d;
    let mid = c0.center() + unit * a;
    let weight = (h / r0.min(r1)).clamp(0.0, 1.0);

    if h <= GEOMETRY_EPSILON_M {
        return vec![IntersectionPoint { x: mid.x, y: mid.y, weight }];
    }

    // Perpendicular to the center line
    let offset_x = -unit.y * h;
    let offset_y = unit.x * h;
    vec![
        IntersectionPoint { x: mid.x + offset_x, y: mid.y + offset_y, weight },
        IntersectionPoint { x: mid.x - offset_x, y: mid.y - offset_y, weight },
    ]
}

/// All intersection points over every unordered pair, in `(i, j)` order with `i < j`
pub fn pairwise_intersections(circles: &[Circle]) -> Vec<IntersectionPoint> {
    let mut points = Vec::new();
    for (i, c0) in circles.iter().enumerate() {
        for c1 in &circles[i + 1..] {
            points.extend(intersect(c0, c1));
        }
    }
    points
}
