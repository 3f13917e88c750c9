//! Planar geometry over normalized landmark coordinates.

use nalgebra::Point2;

use crate::types::Landmark;

/// Angle at vertex `b` formed by the rays `b→a` and `b→c`, in degrees.
///
/// Computed as the difference of two `atan2` headings and folded into
/// `[0, 180]`. Coincident points never fail: `atan2(0, 0)` is `0`, so three
/// identical points give `0°`.
pub fn angle_between(a: &Point2<f64>, b: &Point2<f64>, c: &Point2<f64>) -> f64 {
    let radians = (c.y - b.y).atan2(c.x - b.x) - (a.y - b.y).atan2(a.x - b.x);
    let angle = radians.to_degrees().abs();
    if angle > 180.0 {
        360.0 - angle
    } else {
        angle
    }
}

/// Euclidean distance in normalized-coordinate units
pub fn distance(a: &Point2<f64>, b: &Point2<f64>) -> f64 {
    nalgebra::distance(a, b)
}

pub fn midpoint(a: &Point2<f64>, b: &Point2<f64>) -> Point2<f64> {
    nalgebra::center(a, b)
}

/// Joint angle at `vertex` for three landmarks
pub fn joint_angle(a: &Landmark, vertex: &Landmark, c: &Landmark) -> f64 {
    angle_between(&a.to_nalgebra(), &vertex.to_nalgebra(), &c.to_nalgebra())
}

/// Signed horizontal offset of `point` from the midpoint of `left` and `right`
pub fn horizontal_offset(point: &Landmark, left: &Landmark, right: &Landmark) -> f64 {
    let center = midpoint(&left.to_nalgebra(), &right.to_nalgebra());
    point.x - center.x
}
