use super::Compositor;
use crate::error::{Error, Result};
use crate::types::{Image, Mask};
use image::{imageops, RgbaImage};

/// Per-pixel alpha blend: `out = fg * a + bg * (1 - a)`.
///
/// The mask must match the foreground exactly. A background of another size
/// is stretched to the foreground's dimensions. The output is opaque.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaskBlendCompositor;

impl MaskBlendCompositor {
    pub fn new() -> Self {
        Self
    }
}

impl Compositor for MaskBlendCompositor {
    fn blend(&self, foreground: &Image, mask: &Mask, background: &Image) -> Result<Image> {
        let _span = tracing::debug_span!("mask_blend").entered();

        if !mask.fits(foreground) {
            return Err(Error::Unsupported(format!(
                "mask is {:?} but foreground is {:?}",
                mask.dimensions(),
                foreground.dimensions()
            )));
        }
        let (width, height) = foreground.dimensions();
        if width == 0 || height == 0 {
            return Err(Error::Unsupported("empty foreground".to_string()));
        }

        let resized;
        let background = if background.dimensions() != (width, height) {
            tracing::debug!(
                "Resizing background from {:?} to {}x{}",
                background.dimensions(),
                width,
                height
            );
            resized = imageops::resize(
                background.pixels(),
                width,
                height,
                imageops::FilterType::Triangle,
            );
            &resized
        } else {
            background.pixels()
        };

        let fg = foreground.pixels();
        let alpha = mask.values();
        let output = RgbaImage::from_fn(width, height, |x, y| {
            let a = alpha[(y * width + x) as usize];
            let f = fg.get_pixel(x, y);
            let b = background.get_pixel(x, y);
            let mix = |c: usize| (f[c] as f32 * a + b[c] as f32 * (1.0 - a)).round().clamp(0.0, 255.0) as u8;
            image::Rgba([mix(0), mix(1), mix(2), 255])
        });

        Ok(Image::new(output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositing::{solid_image, Color};

    fn half_mask(width: u32, height: u32) -> Mask {
        Mask::from_fn(width, height, |x, _| if x < width / 2 { 1.0 } else { 0.0 })
    }

    #[test]
    fn keeps_foreground_under_mask_and_background_elsewhere() {
        let fg = solid_image(Color::WHITE, 4, 2);
        let bg = solid_image(Color::RED, 4, 2);
        let out = MaskBlendCompositor::new().blend(&fg, &half_mask(4, 2), &bg).unwrap();

        assert_eq!(out.pixels().get_pixel(0, 0).0, [255, 255, 255, 255]);
        assert_eq!(out.pixels().get_pixel(3, 1).0, [255, 0, 0, 255]);
    }

    #[test]
    fn partial_alpha_mixes_channels() {
        let fg = solid_image(Color::WHITE, 1, 1);
        let bg = solid_image(Color::rgb(0, 0, 0), 1, 1);
        let mask = Mask::new(1, 1, vec![0.5]).unwrap();
        let out = MaskBlendCompositor::new().blend(&fg, &mask, &bg).unwrap();
        assert_eq!(out.pixels().get_pixel(0, 0).0, [128, 128, 128, 255]);
    }

    #[test]
    fn stretches_background_to_foreground() {
        let fg = solid_image(Color::WHITE, 8, 4);
        let bg = solid_image(Color::BLUE, 2, 2);
        let out = MaskBlendCompositor::new().blend(&fg, &half_mask(8, 4), &bg).unwrap();
        assert_eq!(out.dimensions(), (8, 4));
        assert_eq!(out.pixels().get_pixel(7, 3).0, [0, 0, 255, 255]);
    }

    #[test]
    fn rejects_mismatched_mask() {
        let fg = solid_image(Color::WHITE, 4, 4);
        let err = MaskBlendCompositor::new()
            .blend(&fg, &half_mask(2, 2), &fg)
            .unwrap_err();
        assert!(matches!(err, Error::Unsupported(_)));
    }
}
