use super::types::SubjectSegmenter;
use crate::compositing::Color;
use crate::error::{Error, Result};
use crate::types::{Image, Mask};

/// Segmenter for subjects shot against a uniform key color
///
/// Pixels within `inner` RGB distance of the key are background, pixels
/// beyond `outer` are subject, and the band between them is feathered.
#[derive(Debug, Clone)]
pub struct ChromaKeySegmenter {
    key: Color,
    inner: f32,
    outer: f32,
}

impl ChromaKeySegmenter {
    pub fn new(key: Color, tolerance: f32) -> Self {
        let inner = tolerance.max(0.0);
        Self {
            key,
            inner,
            outer: inner * 1.5 + 1.0,
        }
    }

    fn alpha(&self, pixel: &image::Rgba<u8>) -> f32 {
        let dr = pixel[0] as f32 - self.key.r as f32;
        let dg = pixel[1] as f32 - self.key.g as f32;
        let db = pixel[2] as f32 - self.key.b as f32;
        let distance = (dr * dr + dg * dg + db * db).sqrt();

        if distance <= self.inner {
            0.0
        } else if distance >= self.outer {
            1.0
        } else {
            (distance - self.inner) / (self.outer - self.inner)
        }
    }
}

impl SubjectSegmenter for ChromaKeySegmenter {
    fn segment(&self, foreground: &Image) -> Result<Mask> {
        let _span = tracing::debug_span!("chroma_segment").entered();

        let pixels = foreground.pixels();
        let mask = Mask::from_fn(foreground.width(), foreground.height(), |x, y| {
            self.alpha(pixels.get_pixel(x, y))
        });

        if mask.peak() <= 0.0 {
            return Err(Error::NoSubject);
        }
        Ok(mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositing::solid_image;
    use image::{Rgba, RgbaImage};

    #[test]
    fn keyed_pixels_become_background() {
        let mut pixels = RgbaImage::from_pixel(4, 4, Rgba([0, 255, 0, 255]));
        pixels.put_pixel(1, 1, Rgba([200, 30, 30, 255]));
        let mask = ChromaKeySegmenter::new(Color::GREEN, 60.0)
            .segment(&Image::new(pixels))
            .unwrap();

        assert_eq!(mask.alpha_at(0, 0), Some(0.0));
        assert_eq!(mask.alpha_at(1, 1), Some(1.0));
    }

    #[test]
    fn near_key_pixels_are_feathered() {
        let segmenter = ChromaKeySegmenter::new(Color::rgb(0, 0, 0), 10.0);
        let alpha = segmenter.alpha(&Rgba([13, 0, 0, 255]));
        assert!(alpha > 0.0 && alpha < 1.0);
    }

    #[test]
    fn all_key_image_has_no_subject() {
        let result = ChromaKeySegmenter::new(Color::GREEN, 30.0).segment(&solid_image(Color::GREEN, 8, 8));
        assert!(matches!(result, Err(Error::NoSubject)));
    }
}
