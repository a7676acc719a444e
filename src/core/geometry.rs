//! Joint angle geometry.

use crate::pose::Point;

/// Angle at vertex `b` between rays b→a and b→c, in degrees.
///
/// Uses `cos(θ) = (ba · bc) / (|ba| × |bc|)` with the cosine clamped to
/// [-1, 1]. A zero-length ray yields 180° (no bend).
pub fn angle(a: Point, b: Point, c: Point) -> f64 {
    let ba = (a.x - b.x, a.y - b.y);
    let bc = (c.x - b.x, c.y - b.y);

    let dot = ba.0 * bc.0 + ba.1 * bc.1;
    let mag_ba = ba.0.hypot(ba.1);
    let mag_bc = bc.0.hypot(bc.1);

    if mag_ba == 0.0 || mag_bc == 0.0 {
        return 180.0;
    }

    let cosine = (dot / (mag_ba * mag_bc)).clamp(-1.0, 1.0);
    cosine.acos().to_degrees()
}
