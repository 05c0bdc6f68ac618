//! Reorient planes so any edge can be processed as the top edge.

use edgefix_core::{Edge, Plane};

/// Rotate `plane` so that `edge` becomes its top edge.
///
/// Left rotates clockwise, right counter-clockwise, bottom by 180 degrees.
pub fn orient(plane: &Plane, edge: Edge) -> Plane {
    match edge {
        Edge::Top => plane.clone(),
        Edge::Left => plane.transpose().flip_horizontal(),
        Edge::Bottom => plane.flip_horizontal().flip_vertical(),
        Edge::Right => plane.transpose().flip_vertical(),
    }
}

/// Undo [`orient`].
pub fn restore(plane: &Plane, edge: Edge) -> Plane {
    match edge {
        Edge::Top => plane.clone(),
        Edge::Left => plane.flip_horizontal().transpose(),
        Edge::Bottom => plane.flip_vertical().flip_horizontal(),
        Edge::Right => plane.flip_vertical().transpose(),
    }
}

/// Subsampling shifts `(along, across)` the band of `edge` for a plane with
/// shifts `(sw, sh)`.
#[inline]
pub fn oriented_shift(shift: (u8, u8), edge: Edge) -> (u8, u8) {
    let (sw, sh) = shift;
    if edge.is_horizontal() {
        (sw, sh)
    } else {
        (sh, sw)
    }
}
