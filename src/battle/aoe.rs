//! Area-of-effect queries over unit positions
//!
//! Shapes operate on (id, position) pairs supplied by the engine so the
//! helpers stay pure. Results preserve candidate order, which is stable id
//! order when the engine builds the candidate list.

use glam::Vec2;

use crate::battle::hex::HexCoord;
use crate::core::types::UnitId;

/// Units within `radius` hexes of `center` (center hex included)
pub fn units_in_circle(
    center: HexCoord,
    radius: u32,
    candidates: &[(UnitId, HexCoord)],
) -> Vec<UnitId> {
    candidates
        .iter()
        .filter(|(_, pos)| center.distance(pos) <= radius)
        .map(|(id, _)| *id)
        .collect()
}

/// Units inside a cone from `origin` toward `toward`.
///
/// A candidate is inside when its distance from the origin is within
/// `range` and the angle between origin->candidate and origin->toward is
/// at most half of `angle_deg`.
pub fn units_in_cone(
    origin: HexCoord,
    toward: HexCoord,
    angle_deg: f32,
    range: u32,
    candidates: &[(UnitId, HexCoord)],
) -> Vec<UnitId> {
    let origin_pt = origin.to_cartesian();
    let axis = toward.to_cartesian() - origin_pt;
    if axis.length_squared() < 1e-6 {
        return Vec::new();
    }
    let axis = axis.normalize();
    let half_angle = (angle_deg / 2.0).to_radians();

    candidates
        .iter()
        .filter(|(_, pos)| {
            let dist = origin.distance(pos);
            if dist == 0 || dist > range {
                return false;
            }
            let dir: Vec2 = (pos.to_cartesian() - origin_pt).normalize();
            axis.dot(dir).clamp(-1.0, 1.0).acos() <= half_angle
        })
        .map(|(id, _)| *id)
        .collect()
}

/// Units on the thick line from `origin` to `target`
pub fn units_in_line(
    origin: HexCoord,
    target: HexCoord,
    width: u32,
    candidates: &[(UnitId, HexCoord)],
) -> Vec<UnitId> {
    let hexes = origin.thick_line_to(&target, width);
    candidates
        .iter()
        .filter(|(_, pos)| hexes.contains(pos))
        .map(|(id, _)| *id)
        .collect()
}
