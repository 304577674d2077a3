//! Composes the four pages of a mapping run.
//!
//! The composer owns the whole pipeline: it derives the working canvas size
//! from the A4 base size and the source photos, letterboxes the photos onto
//! white source canvases, renders the annotated previews, paints the mapped
//! destination pages and serializes everything to PNG data URLs. Every run
//! allocates its own buffers, so concurrent runs are independent.

use std::collections::HashMap;

use thiserror::Error;

use crate::overlay::{draw_polygons, OverlayOptions};
use crate::photo::{Photo, PhotoError};
use crate::polygon::Polygon2D;
use crate::polygon_mapper::map_polygon_pixels;
use crate::template::{Template, TemplateError};

/// Opaque white, the background of every composed page.
const PAGE_WHITE: [u8; 4] = [255, 255, 255, 255];

/// Outline colors of the two source slots (slot 0 red, slot 1 blue).
const SLOT_COLORS: [[u8; 4]; 2] = [[255, 0, 0, 255], [0, 0, 255, 255]];

/// Output resolution of the A4-proportioned pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputDpi {
    Dpi200,
    #[default]
    Dpi300,
    Dpi600,
}

impl OutputDpi {
    /// A4 portrait pixel dimensions at this resolution.
    pub fn a4_pixels(self) -> (usize, usize) {
        match self {
            OutputDpi::Dpi200 => (1654, 2339),
            OutputDpi::Dpi300 => (2480, 3508),
            OutputDpi::Dpi600 => (4961, 7016),
        }
    }
}

/// Errors that abort a whole mapping run. Geometric edge cases inside the
/// run never end up here; they degrade to blank or unchanged regions.
#[derive(Error, Debug)]
pub enum MappingError {
    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    #[error("photo error: {0}")]
    Photo(#[from] PhotoError),
}

/// The four pages produced by [compose_pages]: two printable destination
/// pages and two annotated source previews, index 0 for the outside photo
/// and 1 for the inside photo.
pub struct MappingPages {
    pub pages: [Photo; 2],
    pub previews: [Photo; 2],
}

/// The serialized outputs of [run_mapping], all PNG data URLs.
pub struct MappingOutput {
    pub output_page1: String,
    pub output_page2: String,
    pub output_outside_mapping: String,
    pub output_inside_mapping: String,
}

/// Derives the working canvas size from the largest source image
/// dimensions and the A4 base size.
///
/// The base size wins while both images fit inside it. A larger image
/// grows the canvas uniformly along its dominant axis so the A4 aspect
/// ratio is kept, and the other dimension is then grown further if it
/// still does not cover the images. The result is always at least as
/// large as both images in both axes.
pub fn working_canvas_size(
    image_w: usize,
    image_h: usize,
    a4: (usize, usize),
) -> (usize, usize) {
    let (a4_w, a4_h) = a4;
    let aspect = a4_w as f32 / a4_h as f32;
    let mut canvas_w = a4_w;
    let mut canvas_h = a4_h;
    if image_w > a4_w || image_h > a4_h {
        let scale_w = image_w as f32 / a4_w as f32;
        let scale_h = image_h as f32 / a4_h as f32;
        if scale_w > scale_h {
            canvas_w = image_w;
            canvas_h = (image_w as f32 / aspect).round() as usize;
            if canvas_h < image_h {
                canvas_h = image_h;
            }
        } else {
            canvas_h = image_h;
            canvas_w = (image_h as f32 * aspect).round() as usize;
            if canvas_w < image_w {
                canvas_w = image_w;
            }
        }
    }
    (canvas_w, canvas_h)
}

/// Scales a source photo to fit the working canvas (aspect preserved, not
/// cropped) and letterboxes it onto white, top-left aligned. A photo
/// without pixels degrades to a blank page.
fn letterbox(img: &Photo, canvas_w: usize, canvas_h: usize) -> Photo {
    let mut canvas = Photo::new_filled(canvas_w, canvas_h, PAGE_WHITE);
    if img.is_empty() {
        log::warn!("source image has no pixels; using a blank page");
        return canvas;
    }
    let scale = (canvas_w as f32 / img.width as f32).min(canvas_h as f32 / img.height as f32);
    let new_w = ((img.width as f32 * scale).round() as usize).clamp(1, canvas_w);
    let new_h = ((img.height as f32 * scale).round() as usize).clamp(1, canvas_h);
    let scaled = img.get_scaled(new_w, new_h);
    canvas.paste(&scaled, 0, 0);
    canvas
}

/// Indexes polygons by id. Later entries replace earlier ones, so for
/// duplicate ids the last-declared polygon wins.
fn polygon_map(polygons: &[Polygon2D]) -> HashMap<&str, &Polygon2D> {
    let mut map = HashMap::new();
    for poly in polygons {
        map.insert(poly.id.as_str(), poly);
    }
    map
}

/// Runs the full composition over already-decoded photos.
///
/// `outside` fills source slot 0 and `inside` slot 1. Input and output
/// polygons are matched by id; ids present on only one side are skipped.
/// Each match copies pixels from the source canvas selected by the input
/// polygon's image slot onto the destination page selected by the output
/// polygon's; out-of-range slots are skipped with a warning.
pub fn compose_pages(
    outside: &Photo,
    inside: &Photo,
    template: &Template,
    dpi: OutputDpi,
) -> MappingPages {
    let (a4_w, a4_h) = dpi.a4_pixels();
    let max_w = outside.width.max(inside.width);
    let max_h = outside.height.max(inside.height);
    let (canvas_w, canvas_h) = working_canvas_size(max_w, max_h, (a4_w, a4_h));
    log::info!("composing onto a {canvas_w}x{canvas_h} working canvas");

    // Source photos letterboxed onto white at the working size.
    let sources = [
        letterbox(outside, canvas_w, canvas_h),
        letterbox(inside, canvas_w, canvas_h),
    ];

    // Annotated previews: source content plus that slot's input polygons.
    let mut previews = sources.clone();
    for (idx, preview) in previews.iter_mut().enumerate() {
        let color = SLOT_COLORS[idx];
        let polygons: Vec<Polygon2D> = template
            .input_polygons
            .iter()
            .filter(|p| p.image_idx == idx)
            .cloned()
            .collect();
        let options = OverlayOptions {
            color,
            fill: Some([color[0], color[1], color[2]]),
            ..OverlayOptions::default()
        };
        draw_polygons(preview, &polygons, &options);
    }

    // Blank destination pages.
    let mut pages = [
        Photo::new_filled(canvas_w, canvas_h, PAGE_WHITE),
        Photo::new_filled(canvas_w, canvas_h, PAGE_WHITE),
    ];

    // Match input and output polygons by id.
    let input_map = polygon_map(&template.input_polygons);
    let output_map = polygon_map(&template.output_polygons);
    for (&id, &src_poly) in &input_map {
        let dst_poly = match output_map.get(id) {
            Some(&dst_poly) => dst_poly,
            None => continue,
        };
        let src = match sources.get(src_poly.image_idx) {
            Some(src) => src,
            None => {
                log::warn!(
                    "polygon {id}: input image slot {} out of range; skipped",
                    src_poly.image_idx
                );
                continue;
            }
        };
        let dst = match pages.get_mut(dst_poly.image_idx) {
            Some(dst) => dst,
            None => {
                log::warn!(
                    "polygon {id}: output image slot {} out of range; skipped",
                    dst_poly.image_idx
                );
                continue;
            }
        };
        log::debug!("mapping polygon {id}");
        map_polygon_pixels(src, src_poly, dst, dst_poly, template.offset);
    }

    MappingPages { pages, previews }
}

/// The public entry point of the engine.
///
/// Decodes the two source images from data URLs, parses the template JSON,
/// composes the four pages and serializes them back to PNG data URLs.
/// Undecodable images and malformed templates are the only hard failures;
/// everything downstream degrades per region.
pub fn run_mapping(
    outside_image: &str,
    inside_image: &str,
    template_json: &str,
    dpi: OutputDpi,
) -> Result<MappingOutput, MappingError> {
    let template = Template::from_json(template_json)?;
    let outside = Photo::from_png_data_url(outside_image)?;
    let inside = Photo::from_png_data_url(inside_image)?;

    let result = compose_pages(&outside, &inside, &template, dpi);

    Ok(MappingOutput {
        output_page1: result.pages[0].to_png_data_url()?,
        output_page2: result.pages[1].to_png_data_url()?,
        output_outside_mapping: result.previews[0].to_png_data_url()?,
        output_inside_mapping: result.previews[1].to_png_data_url()?,
    })
}
