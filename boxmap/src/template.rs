//! Template document parsing.
//!
//! A template declares the correspondence between regions of the two source
//! photos (input polygons) and regions of the two printable pages (output
//! polygons), plus a global fractional offset applied to all source
//! sampling. Editors may attach extra UI metadata to the JSON; unknown keys
//! are ignored here.

use serde::Deserialize;
use thiserror::Error;

use crate::polygon::Polygon2D;

/// Errors produced while reading a template document.
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("invalid template JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// A polygon record as it appears in template JSON.
///
/// `input_image` is only meaningful on input polygons and `output_image` /
/// `rotation` only on output polygons; all three default when absent.
#[derive(Debug, Clone, Deserialize)]
pub struct TemplatePolygon {
    pub id: String,
    /// Normalized `[x, y]` vertex pairs.
    pub vertices: Vec<(f32, f32)>,
    #[serde(default)]
    pub input_image: Option<usize>,
    #[serde(default)]
    pub output_image: Option<usize>,
    #[serde(default)]
    pub rotation: Option<f32>,
}

/// The raw template document shape.
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateDocument {
    /// Fractional `(dx, dy)` translation applied to all source sampling.
    pub offset: (f32, f32),
    pub input_polygons: Vec<TemplatePolygon>,
    pub output_polygons: Vec<TemplatePolygon>,
}

/// A parsed template: the source-sampling offset plus typed input and
/// output polygons. Constructed once per mapping run and immutable for its
/// duration.
#[derive(Debug, Clone)]
pub struct Template {
    pub offset: (f32, f32),
    pub input_polygons: Vec<Polygon2D>,
    pub output_polygons: Vec<Polygon2D>,
}

impl Template {
    /// Parses a template from its JSON serialization.
    pub fn from_json(json: &str) -> Result<Template, TemplateError> {
        Ok(Template::from_document(serde_json::from_str(json)?))
    }

    /// Builds typed polygons out of a raw document.
    ///
    /// Input polygons take their image slot from `input_image` and never
    /// rotate; output polygons take theirs from `output_image` and default
    /// to rotation 0.
    pub fn from_document(doc: TemplateDocument) -> Template {
        let input_polygons = doc
            .input_polygons
            .into_iter()
            .map(|p| Polygon2D::new(p.id, p.vertices, p.input_image.unwrap_or(0), 0.0))
            .collect();
        let output_polygons = doc
            .output_polygons
            .into_iter()
            .map(|p| {
                Polygon2D::new(
                    p.id,
                    p.vertices,
                    p.output_image.unwrap_or(0),
                    p.rotation.unwrap_or(0.0),
                )
            })
            .collect();
        Template {
            offset: doc.offset,
            input_polygons,
            output_polygons,
        }
    }
}
