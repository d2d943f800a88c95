use crate::extraction::BoundingBox;

/// Points per centimetre in PDF user space (72 points per inch).
pub const POINTS_PER_CM: f32 = 28.3465;

pub fn cm_to_points(cm: f32) -> f32 {
    cm * POINTS_PER_CM
}

/// Minimum Euclidean distance between two rectangles.
///
/// Zero when they overlap or touch. Otherwise each axis contributes the gap
/// between the nearer edges, and the result is the norm of both gaps.
pub fn box_distance(a: &BoundingBox, b: &BoundingBox) -> f32 {
    let dx = axis_gap(a.x_min, a.x_max, b.x_min, b.x_max);
    let dy = axis_gap(a.y_min, a.y_max, b.y_min, b.y_max);
    dx.hypot(dy)
}

fn axis_gap(a_min: f32, a_max: f32, b_min: f32, b_max: f32) -> f32 {
    if b_min > a_max {
        b_min - a_max
    } else if a_min > b_max {
        a_min - b_max
    } else {
        0.0
    }
}

/// True if any box of `a` lies within `max_distance` (inclusive) of any box of `b`.
pub fn within_distance(a: &[BoundingBox], b: &[BoundingBox], max_distance: f32) -> bool {
    a.iter()
        .any(|first| b.iter().any(|second| box_distance(first, second) <= max_distance))
}
