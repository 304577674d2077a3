//! # BoxMap Library
//!
//! The `boxmap` library turns two flat photographs into printable
//! fold-and-glue papercraft box pages. A template declares polygonal
//! regions over the two source photos (input polygons) and over two
//! A4-proportioned print pages (output polygons); the engine triangulates
//! every polygon and, for each destination pixel inside a destination
//! triangle, inverse-maps through barycentric coordinates into the
//! matching source triangle and copies the nearest source pixel.
//!
//! ## Overview of Modules
//!
//! - **`page_composer`**: Orchestrates the high-level workflow of a mapping
//!   run: working-canvas sizing, source letterboxing, preview annotation,
//!   polygon matching and PNG data-URL serialization.
//!
//! - **`photo`**: Defines a basic `Photo` struct for storing pixel data
//!   (RGBA format) along with methods for scaling, pixel access, pasting
//!   and data-URL import/export.
//!
//! - **`polygon`**: The `Polygon2D` template region — an ordered vertex
//!   list in normalized coordinates plus an image slot and a rotation.
//!
//! - **`geometry`**: Pure 2D helpers — rigid point rotation, fan
//!   triangulation and the triangle point-membership test.
//!
//! - **`template`**: Parses template JSON documents into typed polygons,
//!   applying the image-slot and rotation defaulting rules.
//!
//! - **`polygon_mapper`**: The per-triangle inverse rasterizer copying a
//!   source polygon's pixels into a destination polygon, rotation-aware,
//!   nearest-neighbor.
//!
//! - **`overlay`**: Draws polygon outlines, translucent fills and id
//!   labels onto a photo for the human-readable mapping previews.

pub mod geometry;
pub mod overlay;
pub mod page_composer;
pub mod photo;
pub mod polygon;
pub mod polygon_mapper;
pub mod template;

pub use page_composer::{run_mapping, MappingOutput, OutputDpi};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
