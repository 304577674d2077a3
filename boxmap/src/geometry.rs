//! Pure 2D geometry helpers shared by the pixel mapper and the overlay
//! renderer. All functions work on absolute pixel coordinates expressed as
//! `(x, y)` tuples of `f32`.

/// Three corner points describing one triangle of a triangulated polygon.
pub type Triangle = [(f32, f32); 3];

/// Rotates each point rigidly around `origin` by `angle_deg` degrees.
///
/// Positive angles rotate counter-clockwise in the y-down pixel coordinate
/// system used throughout this crate.
pub fn rotate_points(points: &[(f32, f32)], angle_deg: f32, origin: (f32, f32)) -> Vec<(f32, f32)> {
    let angle_rad = angle_deg.to_radians();
    let cos_a = angle_rad.cos();
    let sin_a = angle_rad.sin();
    let (ox, oy) = origin;
    points
        .iter()
        .map(|&(x, y)| {
            let tx = x - ox;
            let ty = y - oy;
            (tx * cos_a - ty * sin_a + ox, tx * sin_a + ty * cos_a + oy)
        })
        .collect()
}

/// Splits a polygon into a fan of `n - 2` triangles `(v0, vi, vi+1)`.
///
/// The fan is anchored at the first vertex, which is only correct for
/// polygons that are star-shaped with respect to that vertex. This holds
/// for the convex box-face polygons templates declare; self-intersecting
/// polygons or polygons concave away from the first vertex still
/// triangulate but may produce overlapping triangles.
///
/// Fewer than three vertices produce no triangles.
pub fn triangulate(vertices: &[(f32, f32)]) -> Vec<Triangle> {
    if vertices.len() < 3 {
        return Vec::new();
    }
    (1..vertices.len() - 1)
        .map(|i| [vertices[0], vertices[i], vertices[i + 1]])
        .collect()
}

/// Tests whether `p` lies inside the triangle `(a, b, c)`.
///
/// Classic dot-product barycentric technique over the triangle's edge
/// vectors. Degenerate (zero-area) triangles contain no points.
pub fn point_in_triangle(p: (f32, f32), a: (f32, f32), b: (f32, f32), c: (f32, f32)) -> bool {
    let v0 = (c.0 - a.0, c.1 - a.1);
    let v1 = (b.0 - a.0, b.1 - a.1);
    let v2 = (p.0 - a.0, p.1 - a.1);

    let dot00 = v0.0 * v0.0 + v0.1 * v0.1;
    let dot01 = v0.0 * v1.0 + v0.1 * v1.1;
    let dot02 = v0.0 * v2.0 + v0.1 * v2.1;
    let dot11 = v1.0 * v1.0 + v1.1 * v1.1;
    let dot12 = v1.0 * v2.0 + v1.1 * v2.1;

    let denom = dot00 * dot11 - dot01 * dot01;
    if denom == 0.0 {
        return false;
    }
    let inv_denom = 1.0 / denom;
    let u = (dot11 * dot02 - dot01 * dot12) * inv_denom;
    let v = (dot00 * dot12 - dot01 * dot02) * inv_denom;
    u >= 0.0 && v >= 0.0 && u + v < 1.0
}
