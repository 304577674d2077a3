use std::io::Cursor;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use thiserror::Error;

/// Errors produced while importing or exporting `Photo` pixel data.
///
/// These cover the codec boundary only; geometric edge cases inside the
/// mapping pipeline never raise errors.
#[derive(Error, Debug)]
pub enum PhotoError {
    #[error("image codec error: {0}")]
    Image(#[from] image::ImageError),

    #[error("invalid base64 image payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("not an image data URL (missing comma separator)")]
    InvalidDataUrl,

    #[error("pixel buffer length does not match {width}x{height} RGBA dimensions")]
    MalformedBuffer { width: usize, height: usize },
}

/// A basic representation of an image with RGBA pixel data.
/// Each pixel occupies 4 bytes: R, G, B, and A (alpha).
///
/// `Photo` is the drawable-surface seam of the engine: source photos,
/// destination pages and preview pages are all plain `Photo` values, owned
/// by the mapping run that created them and passed explicitly into the
/// mapper and overlay stages.
#[derive(Clone)]
pub struct Photo {
    /// Pixel data stored in a 1D `Vec<u8>`, in RGBA format (4 bytes per pixel).
    pub img_data: Vec<u8>,
    /// The width (in pixels) of the image.
    pub width: usize,
    /// The height (in pixels) of the image.
    pub height: usize,
}

impl Default for Photo {
    /// Creates an empty `Photo` with zero width and height, and no image data.
    fn default() -> Photo {
        Photo {
            img_data: Vec::new(),
            width: 0,
            height: 0,
        }
    }
}

impl Photo {
    /// Creates a photo of the given size with every pixel set to `rgba`.
    pub fn new_filled(width: usize, height: usize, rgba: [u8; 4]) -> Photo {
        let mut img_data = Vec::with_capacity(width * height * 4);
        for _ in 0..width * height {
            img_data.extend_from_slice(&rgba);
        }
        Photo {
            img_data,
            width,
            height,
        }
    }

    /// Converts a decoded image into a photo, expanding whatever color type
    /// it carries to RGBA.
    pub fn from_image(img: image::DynamicImage) -> Photo {
        let rgba = img.to_rgba8();
        Photo {
            width: rgba.width() as usize,
            height: rgba.height() as usize,
            img_data: rgba.into_raw(),
        }
    }

    /// Hands the pixel data over to an `image` buffer of the same
    /// dimensions. Returns `None` when the buffer length does not match.
    pub fn into_rgba_image(self) -> Option<image::RgbaImage> {
        image::RgbaImage::from_raw(self.width as u32, self.height as u32, self.img_data)
    }

    /// True when the photo has no usable pixel storage: zero dimensions, or
    /// a buffer whose length does not match them. Mapping and overlay
    /// stages treat such a photo the way a canvas without a drawing context
    /// is treated: the stage is skipped and the surface left untouched.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.img_data.len() != self.width * self.height * 4
    }

    /// Returns the RGBA components at the pixel coordinate `(x, y)`.
    ///
    /// If `(x, y)` is out of bounds, this method returns opaque white, the
    /// background color of every composed page.
    pub fn rgba(&self, x: usize, y: usize) -> [u8; 4] {
        if x >= self.width || y >= self.height {
            [255, 255, 255, 255]
        } else {
            let index = (y * self.width + x) * 4;
            [
                self.img_data[index],
                self.img_data[index + 1],
                self.img_data[index + 2],
                self.img_data[index + 3],
            ]
        }
    }

    /// Writes the RGBA components at `(x, y)`. Out-of-bounds writes are
    /// discarded.
    pub fn put_rgba(&mut self, x: usize, y: usize, rgba: [u8; 4]) {
        if x < self.width && y < self.height {
            let index = (y * self.width + x) * 4;
            self.img_data[index..index + 4].copy_from_slice(&rgba);
        }
    }

    /// Produces a new `Photo` resampled to `new_width` × `new_height`.
    ///
    /// The pixel values in the resulting image are computed by averaging
    /// all corresponding pixels from the original image that fall into the
    /// region mapped by the new pixel, independently per axis, so the two
    /// dimensions may be scaled by different factors.
    ///
    /// # Parameters
    /// - `new_width`: The desired new width. Must be greater than 0.
    /// - `new_height`: The desired new height. Must be greater than 0.
    ///
    /// # Returns
    /// A new `Photo` with the requested dimensions. Scaling an empty photo
    /// yields a fully transparent result of the requested size.
    ///
    /// # Panics
    /// Panics if `new_width` or `new_height` is zero, since that would lead
    /// to a division by zero.
    pub fn get_scaled(&self, new_width: usize, new_height: usize) -> Photo {
        if new_width == 0 || new_height == 0 {
            panic!("The new dimensions must be greater than 0");
        }
        if self.is_empty() {
            log::warn!("scaling an empty photo; producing a blank surface");
            return Photo {
                img_data: vec![0u8; new_width * new_height * 4],
                width: new_width,
                height: new_height,
            };
        }

        let scale_x = new_width as f32 / self.width as f32;
        let scale_y = new_height as f32 / self.height as f32;

        let mut new_img_data = vec![0u8; new_width * new_height * 4];

        for new_y in 0..new_height {
            for new_x in 0..new_width {
                // Which block of original pixels this new pixel corresponds to.
                let orig_x_start = ((new_x as f32) / scale_x).round() as usize;
                let orig_y_start = ((new_y as f32) / scale_y).round() as usize;
                let orig_x_end = (((new_x + 1) as f32) / scale_x).round() as usize;
                let orig_y_end = (((new_y + 1) as f32) / scale_y).round() as usize;

                // Keep the block inside the original image's bounds.
                let orig_x_start = orig_x_start.min(self.width - 1);
                let orig_y_start = orig_y_start.min(self.height - 1);
                let orig_x_end = orig_x_end.min(self.width - 1).max(orig_x_start);
                let orig_y_end = orig_y_end.min(self.height - 1).max(orig_y_start);

                // Accumulators for RGBA values, plus a pixel count.
                let mut r_total: u32 = 0;
                let mut g_total: u32 = 0;
                let mut b_total: u32 = 0;
                let mut a_total: u32 = 0;
                let mut pixel_count: u32 = 0;

                for orig_y in orig_y_start..=orig_y_end {
                    for orig_x in orig_x_start..=orig_x_end {
                        let orig_index = (orig_y * self.width + orig_x) * 4;
                        r_total += self.img_data[orig_index] as u32;
                        g_total += self.img_data[orig_index + 1] as u32;
                        b_total += self.img_data[orig_index + 2] as u32;
                        a_total += self.img_data[orig_index + 3] as u32;
                        pixel_count += 1;
                    }
                }

                let new_index = (new_y * new_width + new_x) * 4;
                new_img_data[new_index] = (r_total / pixel_count) as u8;
                new_img_data[new_index + 1] = (g_total / pixel_count) as u8;
                new_img_data[new_index + 2] = (b_total / pixel_count) as u8;
                new_img_data[new_index + 3] = (a_total / pixel_count) as u8;
            }
        }

        Photo {
            img_data: new_img_data,
            width: new_width,
            height: new_height,
        }
    }

    /// Copies `src` onto this photo with its top-left corner at
    /// `(left, top)`. Source pixels falling outside this photo are
    /// discarded.
    pub fn paste(&mut self, src: &Photo, left: usize, top: usize) {
        if src.is_empty() {
            return;
        }
        for y in 0..src.height {
            let dst_y = top + y;
            if dst_y >= self.height {
                break;
            }
            for x in 0..src.width {
                let dst_x = left + x;
                if dst_x >= self.width {
                    break;
                }
                let s = (y * src.width + x) * 4;
                let d = (dst_y * self.width + dst_x) * 4;
                self.img_data[d..d + 4].copy_from_slice(&src.img_data[s..s + 4]);
            }
        }
    }

    /// Decodes a `data:image/...;base64,` URL into a photo.
    ///
    /// Any image format the `image` crate recognizes is accepted; the pixel
    /// data is expanded to RGBA.
    pub fn from_png_data_url(data_url: &str) -> Result<Photo, PhotoError> {
        let (_, payload) = data_url.split_once(',').ok_or(PhotoError::InvalidDataUrl)?;
        let bytes = BASE64.decode(payload.trim())?;
        let img = image::load_from_memory(&bytes)?;
        Ok(Photo::from_image(img))
    }

    /// Encodes the photo as a PNG `data:image/png;base64,` URL.
    pub fn to_png_data_url(&self) -> Result<String, PhotoError> {
        if self.img_data.len() != self.width * self.height * 4 {
            return Err(PhotoError::MalformedBuffer {
                width: self.width,
                height: self.height,
            });
        }
        let mut png = Vec::new();
        image::write_buffer_with_format(
            &mut Cursor::new(&mut png),
            &self.img_data,
            self.width as u32,
            self.height as u32,
            image::ColorType::Rgba8,
            image::ImageOutputFormat::Png,
        )?;
        Ok(format!("data:image/png;base64,{}", BASE64.encode(&png)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_filled_sets_every_pixel() {
        let photo = Photo::new_filled(3, 2, [10, 20, 30, 255]);
        assert_eq!(photo.img_data.len(), 3 * 2 * 4);
        assert_eq!(photo.rgba(0, 0), [10, 20, 30, 255]);
        assert_eq!(photo.rgba(2, 1), [10, 20, 30, 255]);
    }

    #[test]
    fn test_rgba_out_of_bounds_is_white() {
        let photo = Photo::new_filled(2, 2, [0, 0, 0, 255]);
        assert_eq!(photo.rgba(5, 0), [255, 255, 255, 255]);
    }

    #[test]
    fn test_put_rgba_round_trip() {
        let mut photo = Photo::new_filled(4, 4, [255, 255, 255, 255]);
        photo.put_rgba(1, 2, [1, 2, 3, 4]);
        assert_eq!(photo.rgba(1, 2), [1, 2, 3, 4]);
        // Out-of-bounds writes are discarded without touching the buffer.
        photo.put_rgba(9, 9, [9, 9, 9, 9]);
        assert_eq!(photo.rgba(3, 3), [255, 255, 255, 255]);
    }

    #[test]
    fn test_get_scaled_averages_source_block() {
        let mut photo = Photo::new_filled(2, 1, [0, 0, 0, 255]);
        photo.put_rgba(1, 0, [255, 255, 255, 255]);
        let scaled = photo.get_scaled(1, 1);
        let pixel = scaled.rgba(0, 0);
        assert_eq!(pixel[3], 255);
        assert!((pixel[0] as i32 - 127).abs() <= 1, "got {}", pixel[0]);
    }

    #[test]
    fn test_get_scaled_keeps_solid_color() {
        let photo = Photo::new_filled(8, 6, [40, 80, 120, 255]);
        let scaled = photo.get_scaled(3, 5);
        assert_eq!(scaled.width, 3);
        assert_eq!(scaled.height, 5);
        for y in 0..5 {
            for x in 0..3 {
                assert_eq!(scaled.rgba(x, y), [40, 80, 120, 255]);
            }
        }
    }

    #[test]
    fn test_paste_clips_to_destination() {
        let mut canvas = Photo::new_filled(4, 4, [255, 255, 255, 255]);
        let patch = Photo::new_filled(3, 3, [0, 255, 0, 255]);
        canvas.paste(&patch, 2, 2);
        assert_eq!(canvas.rgba(2, 2), [0, 255, 0, 255]);
        assert_eq!(canvas.rgba(3, 3), [0, 255, 0, 255]);
        assert_eq!(canvas.rgba(1, 1), [255, 255, 255, 255]);
    }

    #[test]
    fn test_data_url_round_trip() {
        let mut photo = Photo::new_filled(5, 4, [200, 10, 10, 255]);
        photo.put_rgba(3, 2, [0, 0, 255, 255]);
        let url = photo.to_png_data_url().unwrap();
        assert!(url.starts_with("data:image/png;base64,"));
        let decoded = Photo::from_png_data_url(&url).unwrap();
        assert_eq!(decoded.width, 5);
        assert_eq!(decoded.height, 4);
        assert_eq!(decoded.img_data, photo.img_data);
    }

    #[test]
    fn test_from_data_url_rejects_missing_comma() {
        assert!(matches!(
            Photo::from_png_data_url("data:image/png;base64"),
            Err(PhotoError::InvalidDataUrl)
        ));
    }
}
