//! Preview rendering of template polygons onto a photo.
//!
//! Produces the human-readable "mapping preview" pages: polygon outlines,
//! translucent fills and centroid-anchored id labels. Nothing here affects
//! the mapped output pages.

use ab_glyph::{FontVec, PxScale};
use imageproc::drawing::{draw_text_mut, text_size};
use tiny_skia::{FillRule, Paint, PathBuilder, Pixmap, Stroke, Transform};

use crate::photo::Photo;
use crate::polygon::Polygon2D;

/// Candidate label fonts, probed in order.
const FONT_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Pixel height of the polygon id labels.
const LABEL_SCALE: f32 = 60.0;

/// Styling for [draw_polygons].
#[derive(Debug, Clone)]
pub struct OverlayOptions {
    /// Outline and label color.
    pub color: [u8; 4],
    /// Fill color; `None` leaves polygon interiors untouched.
    pub fill: Option<[u8; 3]>,
    /// Outline width in pixels.
    pub line_width: f32,
    /// Absolute pixel offset added to every vertex.
    pub offset: (f32, f32),
    /// Opacity of the fill, `0.0..=1.0`.
    pub fill_alpha: f32,
    /// Whether to draw each polygon's id at its centroid.
    pub show_id: bool,
}

impl Default for OverlayOptions {
    fn default() -> Self {
        OverlayOptions {
            color: [255, 0, 0, 255],
            fill: None,
            line_width: 4.0,
            offset: (0.0, 0.0),
            fill_alpha: 0.2,
            show_id: true,
        }
    }
}

/// Draws polygon outlines, translucent fills and id labels onto `photo`.
///
/// Each polygon is converted to absolute pixels and shifted by the option
/// offset; the closed path is filled first (when a fill color is set), then
/// stroked. With `show_id` the polygon's id is rendered centered on the
/// unweighted centroid of its offset vertices. A photo without usable
/// pixels is left untouched, as is everything when the drawing surface
/// cannot be allocated.
pub fn draw_polygons(photo: &mut Photo, polygons: &[Polygon2D], options: &OverlayOptions) {
    if photo.is_empty() {
        log::warn!("overlay skipped: no usable pixel buffer");
        return;
    }
    let width = photo.width;
    let height = photo.height;

    let mut pixmap = match Pixmap::new(width as u32, height as u32) {
        Some(pixmap) => pixmap,
        None => {
            log::warn!("overlay skipped: cannot allocate a {width}x{height} drawing surface");
            return;
        }
    };
    // Seed the drawing surface with the current page content.
    for (px, out) in photo.img_data.chunks_exact(4).zip(pixmap.pixels_mut()) {
        *out = tiny_skia::ColorU8::from_rgba(px[0], px[1], px[2], px[3]).premultiply();
    }

    let mut stroke_paint = Paint::default();
    stroke_paint.set_color_rgba8(
        options.color[0],
        options.color[1],
        options.color[2],
        options.color[3],
    );
    stroke_paint.anti_alias = true;
    let stroke = Stroke {
        width: options.line_width,
        ..Stroke::default()
    };

    for poly in polygons {
        let abs: Vec<(f32, f32)> = poly
            .absolute(width, height)
            .iter()
            .map(|&(x, y)| (x + options.offset.0, y + options.offset.1))
            .collect();
        let path = match closed_path(&abs) {
            Some(path) => path,
            None => continue,
        };

        if let Some([r, g, b]) = options.fill {
            let alpha = (options.fill_alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
            let mut fill_paint = Paint::default();
            fill_paint.set_color_rgba8(r, g, b, alpha);
            fill_paint.anti_alias = true;
            pixmap.fill_path(
                &path,
                &fill_paint,
                FillRule::Winding,
                Transform::identity(),
                None,
            );
        }
        pixmap.stroke_path(&path, &stroke_paint, &stroke, Transform::identity(), None);
    }

    // Back to straight RGBA.
    for (px, out) in pixmap.pixels().iter().zip(photo.img_data.chunks_exact_mut(4)) {
        let c = px.demultiply();
        out[0] = c.red();
        out[1] = c.green();
        out[2] = c.blue();
        out[3] = c.alpha();
    }

    if options.show_id {
        draw_labels(photo, polygons, options);
    }
}

fn closed_path(points: &[(f32, f32)]) -> Option<tiny_skia::Path> {
    if points.len() < 2 {
        return None;
    }
    let mut pb = PathBuilder::new();
    pb.move_to(points[0].0, points[0].1);
    for &(x, y) in &points[1..] {
        pb.line_to(x, y);
    }
    pb.close();
    pb.finish()
}

/// Renders each polygon's id centered on the unweighted centroid of its
/// offset vertices. Without a usable system font the labels are skipped.
fn draw_labels(photo: &mut Photo, polygons: &[Polygon2D], options: &OverlayOptions) {
    let font = match load_label_font() {
        Some(font) => font,
        None => return,
    };
    let width = photo.width;
    let height = photo.height;
    let data = std::mem::take(&mut photo.img_data);
    let Some(mut img) = image::RgbaImage::from_raw(width as u32, height as u32, data) else {
        log::warn!("label pass skipped: pixel buffer does not match photo dimensions");
        return;
    };

    let scale = PxScale::from(LABEL_SCALE);
    for poly in polygons {
        if poly.vertices.is_empty() {
            continue;
        }
        let abs = poly.absolute(width, height);
        let mut cx = 0.0f32;
        let mut cy = 0.0f32;
        for &(x, y) in &abs {
            cx += x + options.offset.0;
            cy += y + options.offset.1;
        }
        cx /= abs.len() as f32;
        cy /= abs.len() as f32;

        let (text_w, text_h) = text_size(scale, &font, &poly.id);
        let x = (cx - text_w as f32 / 2.0).round() as i32;
        let y = (cy - text_h as f32 / 2.0).round() as i32;
        draw_text_mut(&mut img, image::Rgba(options.color), x, y, scale, &font, &poly.id);
    }
    photo.img_data = img.into_raw();
}

fn load_label_font() -> Option<FontVec> {
    for path in FONT_PATHS {
        if let Ok(bytes) = std::fs::read(path) {
            if let Ok(font) = FontVec::try_from_vec(bytes) {
                return Some(font);
            }
        }
    }
    log::warn!("no scalable font found; polygon id labels will be skipped");
    None
}
