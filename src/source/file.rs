use super::ImageSource;
use crate::error::Result;
use crate::types::Image;
use std::collections::VecDeque;
use std::path::PathBuf;

/// Image source backed by a queue of file paths.
///
/// Each pick decodes the next queued file; an empty queue behaves like a
/// dismissed picker.
#[derive(Debug, Default)]
pub struct FileImageSource {
    queue: VecDeque<PathBuf>,
}

impl FileImageSource {
    pub fn new<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            queue: paths.into_iter().map(Into::into).collect(),
        }
    }

    pub fn push(&mut self, path: impl Into<PathBuf>) {
        self.queue.push_back(path.into());
    }
}

impl ImageSource for FileImageSource {
    fn pick_image(&mut self) -> Result<Option<Image>> {
        let Some(path) = self.queue.pop_front() else {
            tracing::debug!("Image source exhausted, treating as cancelled");
            return Ok(None);
        };

        tracing::info!("Loading image from {}", path.display());
        let decoded = image::open(&path)?.into_rgba8();
        tracing::debug!("Loaded {}x{}", decoded.width(), decoded.height());
        Ok(Some(Image::new(decoded)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    #[test]
    fn picks_queued_files_then_cancels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.png");
        RgbaImage::from_pixel(3, 2, image::Rgba([1, 2, 3, 255]))
            .save(&path)
            .unwrap();

        let mut source = FileImageSource::new([&path]);
        let image = source.pick_image().unwrap().unwrap();
        assert_eq!(image.dimensions(), (3, 2));
        assert!(source.pick_image().unwrap().is_none());
    }

    #[test]
    fn missing_file_is_an_error() {
        let mut source = FileImageSource::new(["/nonexistent/photo.png"]);
        assert!(source.pick_image().is_err());
    }
}
