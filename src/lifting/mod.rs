//! Subject lifting: resolve the object under a point and cut it out.

mod mask_lifter;

pub use mask_lifter::MaskSubjectLifter;

use crate::error::{Error, Result};
use crate::types::{Image, Mask, Point};
use image::RgbaImage;

/// A subject located in an image, with everything needed to cut it out.
#[derive(Debug, Clone)]
pub struct Subject {
    source: Image,
    mask: Mask,
    bounds: (u32, u32, u32, u32),
}

impl Subject {
    pub fn new(source: Image, mask: Mask, bounds: (u32, u32, u32, u32)) -> Self {
        Self {
            source,
            mask,
            bounds,
        }
    }

    /// Bounding box `(x, y, width, height)` within the source image
    pub fn bounds(&self) -> (u32, u32, u32, u32) {
        self.bounds
    }

    /// Cut-out of the subject: source pixels inside the bounding box with
    /// the mask as their alpha channel.
    pub fn image(&self) -> Result<Image> {
        if !self.mask.fits(&self.source) {
            return Err(Error::Unsupported(format!(
                "mask is {:?} but image is {:?}",
                self.mask.dimensions(),
                self.source.dimensions()
            )));
        }
        let (x0, y0, width, height) = self.bounds;
        let inside = matches!(x0.checked_add(width), Some(right) if right <= self.source.width())
            && matches!(y0.checked_add(height), Some(bottom) if bottom <= self.source.height());
        if width == 0 || height == 0 || !inside {
            return Err(Error::Unsupported(format!("bounds {:?} outside image", self.bounds)));
        }

        let source = self.source.pixels();
        let cutout = RgbaImage::from_fn(width, height, |x, y| {
            let mut pixel = *source.get_pixel(x0 + x, y0 + y);
            let alpha = self.mask.alpha_at(x0 + x, y0 + y).unwrap_or(0.0);
            pixel[3] = (pixel[3] as f32 * alpha).round().clamp(0.0, 255.0) as u8;
            pixel
        });
        Ok(Image::new(cutout))
    }
}

/// Trait for lifters that find the subject under a point
pub trait SubjectLifter: Send + Sync {
    /// Subject located at `point` in `image`, or `None` when the point is
    /// not on a subject.
    fn subject_at(&self, image: &Image, point: Point) -> Result<Option<Subject>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositing::{solid_image, Color};

    #[test]
    fn cutout_is_cropped_and_masked() {
        let source = solid_image(Color::RED, 4, 4);
        let mask = Mask::from_fn(4, 4, |x, y| if x >= 1 && y >= 2 && x <= 2 { 1.0 } else { 0.0 });
        let subject = Subject::new(source, mask, (1, 2, 2, 2));

        let image = subject.image().unwrap();
        assert_eq!(image.dimensions(), (2, 2));
        assert_eq!(image.pixels().get_pixel(0, 0).0, [255, 0, 0, 255]);
    }

    #[test]
    fn cutout_outside_image_fails() {
        let source = solid_image(Color::RED, 2, 2);
        let subject = Subject::new(source, Mask::from_fn(2, 2, |_, _| 1.0), (1, 1, 4, 4));
        assert!(subject.image().is_err());
    }

    #[test]
    fn cutout_with_overflowing_bounds_fails() {
        let source = solid_image(Color::RED, 2, 2);
        let mask = Mask::from_fn(2, 2, |_, _| 1.0);

        let wide = Subject::new(source.clone(), mask.clone(), (u32::MAX, 0, 2, 1));
        assert!(matches!(wide.image(), Err(Error::Unsupported(_))));

        let tall = Subject::new(source, mask, (0, u32::MAX - 1, 1, 3));
        assert!(matches!(tall.image(), Err(Error::Unsupported(_))));
    }
}
