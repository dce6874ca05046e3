mod file;

pub use file::FileOutput;

use crate::error::Result;
use crate::types::Image;

/// Trait for output destinations
pub trait OutputSink {
    /// Write an image to the output
    fn write_image(&mut self, image: &Image) -> Result<()>;
}
