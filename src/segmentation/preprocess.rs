use crate::error::Result;
use crate::types::Mask;
use image::{imageops, RgbaImage};
use ndarray::Array4;

/// Preprocessor for converting still images to model input tensors
pub struct Preprocessor {
    target_width: u32,
    target_height: u32,
}

impl Preprocessor {
    pub fn new(target_width: u32, target_height: u32) -> Self {
        Self {
            target_width,
            target_height,
        }
    }

    /// Preprocess an RGBA image into a normalized NCHW tensor
    ///
    /// Steps:
    /// 1. Resize to target dimensions
    /// 2. Drop alpha, convert to float and normalize to [0, 1]
    /// 3. Transpose from HWC to NCHW format
    ///
    /// Returns: Array4<f32> with shape [1, 3, height, width]
    pub fn preprocess(&self, image: &RgbaImage) -> Array4<f32> {
        let _span = tracing::debug_span!("preprocess").entered();

        let resized;
        let source = if image.dimensions() != (self.target_width, self.target_height) {
            resized = imageops::resize(
                image,
                self.target_width,
                self.target_height,
                imageops::FilterType::Lanczos3,
            );
            &resized
        } else {
            image
        };

        let (width, height) = source.dimensions();
        let mut tensor = Array4::<f32>::zeros((1, 3, height as usize, width as usize));

        for (x, y, pixel) in source.enumerate_pixels() {
            for c in 0..3 {
                tensor[[0, c, y as usize, x as usize]] = pixel[c] as f32 / 255.0;
            }
        }

        tensor
    }

    /// Resize a model-resolution matte back to the source image dimensions
    pub fn postprocess_matte(
        matte: &[f32],
        matte_width: u32,
        matte_height: u32,
        target_width: u32,
        target_height: u32,
    ) -> Result<Mask> {
        let _span = tracing::debug_span!("postprocess").entered();

        if matte_width == target_width && matte_height == target_height {
            return Mask::new(target_width, target_height, matte.to_vec());
        }

        let gray_image = image::GrayImage::from_fn(matte_width, matte_height, |x, y| {
            let idx = (y * matte_width + x) as usize;
            let value = (matte[idx] * 255.0).clamp(0.0, 255.0) as u8;
            image::Luma([value])
        });

        let resized = imageops::resize(
            &gray_image,
            target_width,
            target_height,
            imageops::FilterType::Lanczos3,
        );

        let values: Vec<f32> = resized.pixels().map(|p| p[0] as f32 / 255.0).collect();
        Mask::new(target_width, target_height, values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tensor_is_nchw_and_normalized() {
        let image = RgbaImage::from_pixel(4, 2, image::Rgba([255, 0, 51, 255]));
        let tensor = Preprocessor::new(4, 2).preprocess(&image);
        assert_eq!(tensor.shape(), &[1, 3, 2, 4]);
        assert_eq!(tensor[[0, 0, 1, 3]], 1.0);
        assert_eq!(tensor[[0, 1, 0, 0]], 0.0);
        assert!((tensor[[0, 2, 0, 0]] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn tensor_is_resized_to_model_input() {
        let image = RgbaImage::new(10, 6);
        let tensor = Preprocessor::new(8, 8).preprocess(&image);
        assert_eq!(tensor.shape(), &[1, 3, 8, 8]);
    }

    #[test]
    fn matte_is_scaled_back_to_source_size() {
        let matte = vec![1.0; 16];
        let mask = Preprocessor::postprocess_matte(&matte, 4, 4, 10, 7).unwrap();
        assert_eq!(mask.dimensions(), (10, 7));
        assert!(mask.values().iter().all(|v| (*v - 1.0).abs() < 0.01));
    }
}
