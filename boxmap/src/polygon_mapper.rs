//! The per-triangle inverse rasterizer at the heart of the engine.
//!
//! Given a source polygon over a source photo and a destination polygon
//! over a destination page, both polygons are fan-triangulated and every
//! destination pixel inside a destination triangle is inverse-mapped
//! through barycentric coordinates into the matching source triangle, then
//! filled with the nearest source pixel.

use nalgebra::{Matrix2, Vector2};

use crate::geometry::{point_in_triangle, triangulate};
use crate::photo::Photo;
use crate::polygon::Polygon2D;

/// Barycentric systems whose 2×2 determinant magnitude falls below this
/// value are treated as degenerate and their triangle is skipped.
const DEGENERATE_DET: f32 = 1e-4;

/// Copies the pixel content of `src_poly`'s region in `src` into
/// `dst_poly`'s region in `dst`.
///
/// Both polygons are converted to absolute pixel coordinates against their
/// own buffer's dimensions and fan-triangulated; triangle `i` of the source
/// is paired with triangle `i` of the destination. The pairing is
/// positional, not geometric, so matched polygons must be declared with the
/// same vertex order and winding — a differing vertex count is logged and
/// the shorter fan wins.
///
/// For every destination pixel in a destination triangle's bounding box the
/// barycentric weights are computed by inverting the triangle's 2×2 edge
/// matrix; pixels outside the triangle, weights outside `[0, 1]` and
/// near-zero determinants are skipped. Accepted pixels sample the source at
/// the weighted combination of the source triangle's corners —
/// nearest-neighbor, all four channels copied.
///
/// A non-zero `dst_poly.rotation` makes the destination face sample as if
/// it were unrotated: each sampling point is counter-rotated around the
/// bounding-box center before the membership tests, without physically
/// rotating the page.
///
/// `offset` is a fractional translation applied to the source region only,
/// scaled by the source buffer's dimensions and rounded to whole pixels.
///
/// Polygons with fewer than three vertices and empty pixel buffers leave
/// `dst` untouched; geometric edge cases never abort the call.
pub fn map_polygon_pixels(
    src: &Photo,
    src_poly: &Polygon2D,
    dst: &mut Photo,
    dst_poly: &Polygon2D,
    offset: (f32, f32),
) {
    if src.is_empty() || dst.is_empty() {
        log::warn!(
            "polygon {}: mapping skipped, no usable pixel buffer",
            dst_poly.id
        );
        return;
    }
    let src_w = src.width;
    let src_h = src.height;
    let dst_w = dst.width;
    let dst_h = dst.height;

    // Absolute pixel coordinates; the sampling offset shifts the source
    // region only.
    let offset_x = (offset.0 * src_w as f32).round();
    let offset_y = (offset.1 * src_h as f32).round();
    let src_abs: Vec<(f32, f32)> = src_poly
        .absolute(src_w, src_h)
        .iter()
        .map(|&(x, y)| (x + offset_x, y + offset_y))
        .collect();
    let dst_abs = dst_poly.absolute(dst_w, dst_h);

    if src_abs.len() < 3 || dst_abs.len() < 3 {
        return;
    }
    if src_abs.len() != dst_abs.len() {
        log::warn!(
            "polygon {}: input has {} vertices but output has {}; triangles are paired by index",
            dst_poly.id,
            src_abs.len(),
            dst_abs.len()
        );
    }

    let src_tris = triangulate(&src_abs);
    let dst_tris = triangulate(&dst_abs);

    // Counter-rotation undoing the output face's rotation while sampling.
    let rotated = dst_poly.rotation != 0.0;
    let angle_rad = -dst_poly.rotation.to_radians();
    let (sin_a, cos_a) = angle_rad.sin_cos();

    for (src_tri, dst_tri) in src_tris.iter().zip(dst_tris.iter()) {
        // Destination bounding box, clipped to the page.
        let xs = [dst_tri[0].0, dst_tri[1].0, dst_tri[2].0];
        let ys = [dst_tri[0].1, dst_tri[1].1, dst_tri[2].1];
        let min_xf = xs.iter().fold(f32::INFINITY, |a, &b| a.min(b)).floor();
        let max_xf = xs.iter().fold(f32::NEG_INFINITY, |a, &b| a.max(b)).ceil();
        let min_yf = ys.iter().fold(f32::INFINITY, |a, &b| a.min(b)).floor();
        let max_yf = ys.iter().fold(f32::NEG_INFINITY, |a, &b| a.max(b)).ceil();
        if max_xf < 0.0
            || max_yf < 0.0
            || min_xf > (dst_w - 1) as f32
            || min_yf > (dst_h - 1) as f32
        {
            continue;
        }
        let min_x = min_xf.max(0.0) as usize;
        let max_x = max_xf.min((dst_w - 1) as f32) as usize;
        let min_y = min_yf.max(0.0) as usize;
        let max_y = max_yf.min((dst_h - 1) as f32) as usize;
        let cx = (min_x + max_x) as f32 / 2.0;
        let cy = (min_y + max_y) as f32 / 2.0;

        // 2×2 barycentric system of the destination triangle.
        let a = Matrix2::new(
            dst_tri[0].0 - dst_tri[2].0,
            dst_tri[1].0 - dst_tri[2].0,
            dst_tri[0].1 - dst_tri[2].1,
            dst_tri[1].1 - dst_tri[2].1,
        );
        if a.determinant().abs() < DEGENERATE_DET {
            continue;
        }
        let inv = match a.try_inverse() {
            Some(inv) => inv,
            None => continue,
        };

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                // Sample as if the face were unrotated.
                let (x_rot, y_rot) = if rotated {
                    let x_shifted = x as f32 - cx;
                    let y_shifted = y as f32 - cy;
                    (
                        cos_a * x_shifted - sin_a * y_shifted + cx,
                        sin_a * x_shifted + cos_a * y_shifted + cy,
                    )
                } else {
                    (x as f32, y as f32)
                };

                if !point_in_triangle((x_rot, y_rot), dst_tri[0], dst_tri[1], dst_tri[2]) {
                    continue;
                }

                let b = Vector2::new(x_rot - dst_tri[2].0, y_rot - dst_tri[2].1);
                let lambda = inv * b;
                let l1 = lambda.x;
                let l2 = lambda.y;
                let l3 = 1.0 - l1 - l2;
                if !(0.0..=1.0).contains(&l1)
                    || !(0.0..=1.0).contains(&l2)
                    || !(0.0..=1.0).contains(&l3)
                {
                    continue;
                }

                // Weighted combination of the source triangle's corners.
                let src_x = l1 * src_tri[0].0 + l2 * src_tri[1].0 + l3 * src_tri[2].0;
                let src_y = l1 * src_tri[0].1 + l2 * src_tri[1].1 + l3 * src_tri[2].1;

                // Nearest neighbor, clamped to the source buffer.
                let sx = src_x.clamp(0.0, (src_w - 1) as f32).round() as usize;
                let sy = src_y.clamp(0.0, (src_h - 1) as f32).round() as usize;

                let s = (sy * src_w + sx) * 4;
                let d = (y * dst_w + x) * 4;
                dst.img_data[d..d + 4].copy_from_slice(&src.img_data[s..s + 4]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Photo whose pixel at `(x, y)` is `[x, y, 0, 255]`, so sampled
    /// coordinates are visible in the copied bytes.
    fn gradient_photo(width: usize, height: usize) -> Photo {
        let mut photo = Photo::new_filled(width, height, [0, 0, 0, 255]);
        for y in 0..height {
            for x in 0..width {
                photo.put_rgba(x, y, [x as u8, y as u8, 0, 255]);
            }
        }
        photo
    }

    fn square(id: &str, image_idx: usize, rotation: f32) -> Polygon2D {
        Polygon2D::new(
            id.to_string(),
            vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)],
            image_idx,
            rotation,
        )
    }

    #[test]
    fn test_identity_mapping_is_exact() {
        let src = gradient_photo(100, 100);
        let mut dst = Photo::new_filled(100, 100, [255, 255, 255, 255]);
        let input = square("F0", 0, 0.0);
        let output = square("F0", 0, 0.0);

        map_polygon_pixels(&src, &input, &mut dst, &output, (0.0, 0.0));

        assert_eq!(dst.img_data, src.img_data);
    }

    #[test]
    fn test_full_turn_rotation_matches_unrotated() {
        let src = gradient_photo(50, 50);
        let input = Polygon2D::new(
            "B1".to_string(),
            vec![(0.205, 0.21), (0.615, 0.21), (0.615, 0.61), (0.205, 0.61)],
            0,
            0.0,
        );
        let plain = Polygon2D::new("B1".to_string(), input.vertices.clone(), 0, 0.0);
        let turned = Polygon2D::new("B1".to_string(), input.vertices.clone(), 0, 360.0);

        let mut dst_plain = Photo::new_filled(50, 50, [255, 255, 255, 255]);
        let mut dst_turned = Photo::new_filled(50, 50, [255, 255, 255, 255]);
        map_polygon_pixels(&src, &input, &mut dst_plain, &plain, (0.0, 0.0));
        map_polygon_pixels(&src, &input, &mut dst_turned, &turned, (0.0, 0.0));

        assert_eq!(dst_plain.img_data, dst_turned.img_data);
    }

    #[test]
    fn test_accepted_pixels_carry_valid_weights() {
        // A quarter-turn rotation still only ever samples inside the source
        // polygon: every copied pixel must hold a coordinate from it.
        let src = gradient_photo(80, 80);
        let region = vec![(0.25, 0.25), (0.75, 0.25), (0.75, 0.75), (0.25, 0.75)];
        let input = Polygon2D::new("R".to_string(), region.clone(), 0, 0.0);
        let output = Polygon2D::new("R".to_string(), region, 0, 90.0);
        let mut dst = Photo::new_filled(80, 80, [255, 255, 255, 255]);

        map_polygon_pixels(&src, &input, &mut dst, &output, (0.0, 0.0));

        let mut written = 0;
        for y in 0..80 {
            for x in 0..80 {
                let px = dst.rgba(x, y);
                if px == [255, 255, 255, 255] {
                    continue;
                }
                written += 1;
                assert!((19..=61).contains(&px[0]), "sampled x {} out of region", px[0]);
                assert!((19..=61).contains(&px[1]), "sampled y {} out of region", px[1]);
            }
        }
        assert!(written > 1000, "expected a filled region, got {written} pixels");
    }

    #[test]
    fn test_offset_shifts_source_sampling() {
        let src = gradient_photo(100, 100);
        let region = vec![(0.1, 0.1), (0.5, 0.1), (0.5, 0.5), (0.1, 0.5)];
        let input = Polygon2D::new("O".to_string(), region.clone(), 0, 0.0);
        let output = Polygon2D::new("O".to_string(), region, 0, 0.0);
        let mut dst = Photo::new_filled(100, 100, [255, 255, 255, 255]);

        // A 10% offset moves the sampled region 10 pixels right and down.
        map_polygon_pixels(&src, &input, &mut dst, &output, (0.1, 0.1));

        assert_eq!(dst.rgba(30, 30), [40, 40, 0, 255]);
    }

    #[test]
    fn test_two_vertex_polygon_is_a_no_op() {
        let src = gradient_photo(40, 40);
        let input = square("D", 0, 0.0);
        let output = Polygon2D::new("D".to_string(), vec![(0.0, 0.0), (1.0, 1.0)], 0, 0.0);
        let mut dst = Photo::new_filled(40, 40, [255, 255, 255, 255]);
        let before = dst.img_data.clone();

        map_polygon_pixels(&src, &input, &mut dst, &output, (0.0, 0.0));

        assert_eq!(dst.img_data, before);
    }

    #[test]
    fn test_degenerate_triangle_is_skipped() {
        let src = gradient_photo(40, 40);
        // All three corners collinear: zero-area destination.
        let line = vec![(0.1, 0.1), (0.5, 0.5), (0.9, 0.9)];
        let input = square("L", 0, 0.0);
        let output = Polygon2D::new("L".to_string(), line, 0, 0.0);
        let mut dst = Photo::new_filled(40, 40, [255, 255, 255, 255]);
        let before = dst.img_data.clone();

        map_polygon_pixels(&src, &input, &mut dst, &output, (0.0, 0.0));

        assert_eq!(dst.img_data, before);
    }

    #[test]
    fn test_empty_buffer_leaves_destination_untouched() {
        let src = Photo::default();
        let input = square("E", 0, 0.0);
        let output = square("E", 0, 0.0);
        let mut dst = Photo::new_filled(10, 10, [255, 255, 255, 255]);
        let before = dst.img_data.clone();

        map_polygon_pixels(&src, &input, &mut dst, &output, (0.0, 0.0));

        assert_eq!(dst.img_data, before);
    }
}
