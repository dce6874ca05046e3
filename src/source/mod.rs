mod file;

pub use file::FileImageSource;

use crate::error::Result;
use crate::types::Image;

/// Trait for sources that let the user choose a still image
pub trait ImageSource {
    /// Pick one image
    ///
    /// Returns `Ok(None)` when the user dismissed the picker without choosing.
    fn pick_image(&mut self) -> Result<Option<Image>>;
}
