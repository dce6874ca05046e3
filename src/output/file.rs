use super::OutputSink;
use crate::error::Result;
use crate::types::Image;
use std::path::{Path, PathBuf};

/// Writes images to a file; the format follows the extension.
pub struct FileOutput {
    path: PathBuf,
}

impl FileOutput {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl OutputSink for FileOutput {
    fn write_image(&mut self, image: &Image) -> Result<()> {
        let _span = tracing::debug_span!("write_image").entered();

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        // JPEG has no alpha channel
        let is_jpeg = self
            .path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("jpg") || e.eq_ignore_ascii_case("jpeg"));
        if is_jpeg {
            image::DynamicImage::ImageRgba8(image.pixels().clone())
                .to_rgb8()
                .save(&self.path)?;
        } else {
            image.pixels().save(&self.path)?;
        }

        tracing::info!(
            "Wrote {}x{} image to {}",
            image.width(),
            image.height(),
            self.path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositing::{solid_image, Color};

    #[test]
    fn writes_png_and_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let image = solid_image(Color::GRAY, 5, 4);

        for name in ["nested/out.png", "out.jpg"] {
            let mut output = FileOutput::new(dir.path().join(name));
            output.write_image(&image).unwrap();
            let decoded = image::open(output.path()).unwrap();
            assert_eq!((decoded.width(), decoded.height()), (5, 4));
        }
    }
}
