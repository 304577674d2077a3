/// A 2D polygon region declared in a box template.
///
/// Vertices are stored in normalized coordinates: both components lie in
/// `[0, 1]` and are interpreted relative to the dimensions of whichever
/// pixel buffer the polygon is applied to. The last vertex implicitly
/// connects back to the first. A polygon needs at least three vertices to
/// take part in pixel mapping; smaller ones are ignored by the mapper.
#[derive(Debug, Clone)]
pub struct Polygon2D {
    /// Correspondence key. An input polygon and an output polygon with the
    /// same id describe the two ends of one region mapping. Compared as an
    /// opaque, case-sensitive string.
    pub id: String,

    /// Ordered vertex list in normalized `[0, 1] × [0, 1]` coordinates.
    pub vertices: Vec<(f32, f32)>,

    /// Which of the two source photos or destination pages this polygon
    /// belongs to (0 or 1).
    pub image_idx: usize,

    /// Rotation in degrees. Only meaningful for output polygons; input
    /// polygons always carry 0.
    pub rotation: f32,
}

impl Polygon2D {
    pub fn new(id: String, vertices: Vec<(f32, f32)>, image_idx: usize, rotation: f32) -> Self {
        Polygon2D {
            id,
            vertices,
            image_idx,
            rotation,
        }
    }

    /// Converts the normalized vertices to absolute pixel coordinates for a
    /// buffer of the given dimensions.
    pub fn absolute(&self, width: usize, height: usize) -> Vec<(f32, f32)> {
        self.vertices
            .iter()
            .map(|&(x, y)| (x * width as f32, y * height as f32))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_scales_by_buffer_size() {
        let poly = Polygon2D::new(
            "A0".to_string(),
            vec![(0.0, 0.0), (1.0, 0.0), (0.5, 0.5)],
            0,
            0.0,
        );
        let abs = poly.absolute(200, 100);
        assert_eq!(abs, vec![(0.0, 0.0), (200.0, 0.0), (100.0, 50.0)]);
    }
}
