use crate::error::Result;
use crate::types::{Image, Mask};

/// Trait for subject segmenters
/// Allows swapping between different backends (RVM, chroma key, ...)
pub trait SubjectSegmenter: Send + Sync {
    /// Isolate the primary subject of a still image
    ///
    /// # Arguments
    /// * `foreground` - Image containing the subject
    ///
    /// # Returns
    /// * Alpha mask with the same dimensions as `foreground`
    ///
    /// # Errors
    /// * `Error::NoSubject` when nothing was detected
    fn segment(&self, foreground: &Image) -> Result<Mask>;

    /// Get the backend's preferred input dimensions
    ///
    /// Returns `None` for backends that work at native resolution
    fn input_size(&self) -> Option<(u32, u32)> {
        None
    }
}
