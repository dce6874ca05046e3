mod blend;
mod color;

pub use blend::MaskBlendCompositor;
pub use color::{solid_image, Color};

use crate::error::Result;
use crate::types::{Image, Mask};

/// Trait for compositors that place a masked foreground over a background
pub trait Compositor: Send + Sync {
    /// Blend `foreground` over `background` using `mask` as the foreground
    /// opacity.
    ///
    /// # Errors
    /// * `Error::Unsupported` when the inputs cannot be blended
    fn blend(&self, foreground: &Image, mask: &Mask, background: &Image) -> Result<Image>;
}
