//! Outlines and polygon overlap
//!
//! Outlines are closed polygons in local space (nose along +x). The
//! resolver only ever sees world-space outlines. Contact means the filled
//! regions overlap: crossing edges, or one outline lying wholly inside the
//! other (a bullet buried in an asteroid still counts).

use glam::Vec2;

/// A local-space outline, as (x, y) vertex pairs
pub type OutlineTable = &'static [(f32, f32)];

/// Player ship (both variants)
pub const SHIP_OUTLINE: OutlineTable = &[
    (21.0, 0.0),
    (-21.0, 12.0),
    (-14.0, 10.0),
    (-14.0, -10.0),
    (-21.0, -12.0),
];

/// Dart used by every projectile
pub const BULLET_OUTLINE: OutlineTable = &[(0.5, 0.0), (-0.5, -0.5), (0.0, 0.0), (-0.5, 0.5)];

/// Four asteroid shapes, scaled per tier
pub const ASTEROID_OUTLINES: [OutlineTable; 4] = [
    &[
        (0.0, -30.0),
        (28.0, -15.0),
        (20.0, 20.0),
        (4.0, 8.0),
        (-1.0, 30.0),
        (-12.0, 15.0),
        (-5.0, 2.0),
        (-25.0, 7.0),
        (-10.0, -25.0),
    ],
    &[
        (10.0, -28.0),
        (7.0, -16.0),
        (30.0, -9.0),
        (30.0, 9.0),
        (10.0, 13.0),
        (5.0, 30.0),
        (-8.0, 28.0),
        (-6.0, 6.0),
        (-27.0, 12.0),
        (-30.0, -11.0),
        (-6.0, -15.0),
        (-6.0, -28.0),
    ],
    &[
        (10.0, -30.0),
        (30.0, 0.0),
        (15.0, 30.0),
        (0.0, 15.0),
        (-15.0, 30.0),
        (-30.0, 0.0),
        (-10.0, -30.0),
    ],
    &[
        (30.0, -18.0),
        (5.0, 5.0),
        (30.0, 15.0),
        (15.0, 30.0),
        (0.0, 25.0),
        (-15.0, 30.0),
        (-25.0, 8.0),
        (-10.0, -25.0),
        (0.0, -30.0),
        (10.0, -30.0),
    ],
];

/// Classic flying saucer hull
pub const ALIEN_OUTLINE_CLASSIC: OutlineTable = &[
    (20.0, 0.0),
    (10.0, 10.0),
    (-10.0, 10.0),
    (-20.0, 0.0),
    (-10.0, -10.0),
    (-5.0, -20.0),
    (5.0, -20.0),
    (10.0, -10.0),
];

/// Enhanced saucer hull: dome, rim, underside
pub const ALIEN_OUTLINE_ENHANCED: OutlineTable = &[
    (-10.0, -8.0),
    (-8.0, -14.0),
    (-4.0, -18.0),
    (0.0, -19.0),
    (4.0, -18.0),
    (8.0, -14.0),
    (10.0, -8.0),
    (10.0, 0.0),
    (15.0, 0.0),
    (20.0, 5.0),
    (15.0, 10.0),
    (10.0, 10.0),
    (8.0, 14.0),
    (4.0, 18.0),
    (0.0, 19.0),
    (-4.0, 18.0),
    (-8.0, 14.0),
    (-10.0, 10.0),
    (-15.0, 10.0),
    (-20.0, 5.0),
    (-15.0, 0.0),
    (-10.0, 0.0),
];

/// Pickup badge frames
pub const PICKUP_SQUARE_OUTLINE: OutlineTable =
    &[(15.0, -15.0), (15.0, 15.0), (-15.0, 15.0), (-15.0, -15.0)];
pub const PICKUP_OCTAGON_OUTLINE: OutlineTable = &[
    (20.0, -10.0),
    (10.0, -20.0),
    (-10.0, -20.0),
    (-20.0, -10.0),
    (-20.0, 10.0),
    (-10.0, 20.0),
    (10.0, 20.0),
    (20.0, 10.0),
];

/// Force field around the ship
pub const SHIELD_OUTLINE: OutlineTable = &[
    (35.0, -25.0),
    (25.0, -35.0),
    (-25.0, -35.0),
    (-35.0, -25.0),
    (-35.0, 25.0),
    (-25.0, 35.0),
    (25.0, 35.0),
    (35.0, 25.0),
];

/// Debris is a unit line along local y, scaled by its length
pub const DEBRIS_OUTLINE: OutlineTable = &[(0.0, -0.5), (0.0, 0.5)];

/// Axis-aligned bounds of a polygon
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl Bounds {
    pub fn of(points: &[Vec2]) -> Self {
        points.iter().fold(
            Bounds {
                min: Vec2::splat(f32::INFINITY),
                max: Vec2::splat(f32::NEG_INFINITY),
            },
            |b, p| Bounds {
                min: b.min.min(*p),
                max: b.max.max(*p),
            },
        )
    }

    #[inline]
    pub fn intersects(&self, other: &Bounds) -> bool {
        self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
    }
}

/// Iterate the closing edges of a polygon (a two-point outline is one segment)
fn edges(poly: &[Vec2]) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
    let n = poly.len();
    let count = match n {
        0 | 1 => 0,
        2 => 1,
        _ => n,
    };
    (0..count).map(move |i| (poly[i], poly[(i + 1) % n]))
}

#[inline]
fn cross(o: Vec2, a: Vec2, b: Vec2) -> f32 {
    (a - o).perp_dot(b - o)
}

#[inline]
fn on_segment(p: Vec2, a: Vec2, b: Vec2) -> bool {
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}

/// Whether segments `ab` and `cd` touch or cross
pub fn segments_intersect(a: Vec2, b: Vec2, c: Vec2, d: Vec2) -> bool {
    let d1 = cross(c, d, a);
    let d2 = cross(c, d, b);
    let d3 = cross(a, b, c);
    let d4 = cross(a, b, d);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    // Collinear / endpoint touching cases
    (d1 == 0.0 && on_segment(a, c, d))
        || (d2 == 0.0 && on_segment(b, c, d))
        || (d3 == 0.0 && on_segment(c, a, b))
        || (d4 == 0.0 && on_segment(d, a, b))
}

/// Even-odd point containment
pub fn point_in_polygon(p: Vec2, poly: &[Vec2]) -> bool {
    if poly.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = poly.len() - 1;
    for i in 0..poly.len() {
        let (a, b) = (poly[i], poly[j]);
        if (a.y > p.y) != (b.y > p.y) {
            let x_cross = a.x + (p.y - a.y) / (b.y - a.y) * (b.x - a.x);
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Whether two world-space outlines overlap as filled regions
pub fn polygons_overlap(a: &[Vec2], b: &[Vec2]) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    if !Bounds::of(a).intersects(&Bounds::of(b)) {
        return false;
    }

    for (p0, p1) in edges(a) {
        for (q0, q1) in edges(b) {
            if segments_intersect(p0, p1, q0, q1) {
                return true;
            }
        }
    }

    // No edges cross: either disjoint or one contains the other
    point_in_polygon(a[0], b) || point_in_polygon(b[0], a)
}

/// Build a world-space polygon from a local outline
pub fn to_world(table: OutlineTable, transform: &glam::Affine2) -> Vec<Vec2> {
    table
        .iter()
        .map(|&(x, y)| transform.transform_point2(Vec2::new(x, y)))
        .collect()
}
