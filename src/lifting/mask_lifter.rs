use super::{Subject, SubjectLifter};
use crate::error::{Error, Result};
use crate::segmentation::SubjectSegmenter;
use crate::types::{Image, Mask, Point};
use std::sync::{Arc, Mutex};

/// Lifter that segments the whole image and lifts the connected region of
/// the mask under the point.
///
/// The mask of the last image is kept, so a drag over one image segments it
/// only once. Failed segmentations are not kept and are retried.
pub struct MaskSubjectLifter {
    segmenter: Arc<dyn SubjectSegmenter>,
    threshold: f32,
    // `None` mask: the segmenter found no subject in that image
    cached: Mutex<Option<(Image, Option<Mask>)>>,
}

impl MaskSubjectLifter {
    pub fn new(segmenter: Arc<dyn SubjectSegmenter>, threshold: f32) -> Self {
        Self {
            segmenter,
            threshold: threshold.clamp(0.0, 1.0),
            cached: Mutex::new(None),
        }
    }

    fn mask_for(&self, image: &Image) -> Result<Option<Mask>> {
        let mut cached = self.cached.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some((source, mask)) = cached.as_ref() {
            if source.same_as(image) {
                return Ok(mask.clone());
            }
        }

        let mask = match self.segmenter.segment(image) {
            Ok(mask) => Some(mask),
            Err(Error::NoSubject) => None,
            Err(err) => return Err(err),
        };
        *cached = Some((image.clone(), mask.clone()));
        Ok(mask)
    }
}

impl SubjectLifter for MaskSubjectLifter {
    fn subject_at(&self, image: &Image, point: Point) -> Result<Option<Subject>> {
        let _span = tracing::debug_span!("subject_at", x = point.x, y = point.y).entered();

        let Some((x, y)) = point.pixel() else {
            return Ok(None);
        };
        let Some(mask) = self.mask_for(image)? else {
            return Ok(None);
        };
        if !mask.fits(image) {
            return Err(Error::Unsupported(format!(
                "mask is {:?} but image is {:?}",
                mask.dimensions(),
                image.dimensions()
            )));
        }

        let Some((region, bounds)) = mask.region_at(x, y, self.threshold) else {
            return Ok(None);
        };
        tracing::debug!("Subject at ({}, {}) spans {:?}", x, y, bounds);
        Ok(Some(Subject::new(image.clone(), region, bounds)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositing::Color;
    use crate::segmentation::ChromaKeySegmenter;
    use image::{Rgba, RgbaImage};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn lifter() -> MaskSubjectLifter {
        MaskSubjectLifter::new(Arc::new(ChromaKeySegmenter::new(Color::GREEN, 40.0)), 0.5)
    }

    fn scene() -> Image {
        let mut pixels = RgbaImage::from_pixel(10, 10, Rgba([0, 255, 0, 255]));
        for y in 3..6 {
            for x in 2..5 {
                pixels.put_pixel(x, y, Rgba([255, 0, 0, 255]));
            }
        }
        Image::new(pixels)
    }

    #[test]
    fn point_on_subject_lifts_it() {
        let subject = lifter().subject_at(&scene(), Point::new(3.0, 4.0)).unwrap().unwrap();
        assert_eq!(subject.bounds(), (2, 3, 3, 3));
        assert_eq!(subject.image().unwrap().dimensions(), (3, 3));
    }

    /// Chroma key that counts how often it runs.
    struct CountingSegmenter {
        inner: ChromaKeySegmenter,
        calls: AtomicUsize,
    }

    impl SubjectSegmenter for CountingSegmenter {
        fn segment(&self, image: &Image) -> Result<Mask> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.segment(image)
        }
    }

    #[test]
    fn drag_over_one_image_segments_once() {
        let segmenter = Arc::new(CountingSegmenter {
            inner: ChromaKeySegmenter::new(Color::GREEN, 40.0),
            calls: AtomicUsize::new(0),
        });
        let lifter = MaskSubjectLifter::new(segmenter.clone(), 0.5);

        let image = scene();
        for x in [2.0, 3.0, 4.0, 8.0] {
            lifter.subject_at(&image, Point::new(x, 4.0)).unwrap();
        }
        assert_eq!(segmenter.calls.load(Ordering::SeqCst), 1);

        lifter.subject_at(&scene(), Point::new(3.0, 4.0)).unwrap();
        assert_eq!(segmenter.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn only_the_touched_subject_is_lifted() {
        let mut pixels = RgbaImage::from_pixel(12, 6, Rgba([0, 255, 0, 255]));
        for y in 1..4 {
            for x in 1..3 {
                pixels.put_pixel(x, y, Rgba([255, 0, 0, 255]));
            }
            for x in 8..11 {
                pixels.put_pixel(x, y, Rgba([0, 0, 255, 255]));
            }
        }
        let image = Image::new(pixels);

        let subject = lifter().subject_at(&image, Point::new(9.0, 2.0)).unwrap().unwrap();
        assert_eq!(subject.bounds(), (8, 1, 3, 3));

        let cutout = subject.image().unwrap();
        assert_eq!(cutout.dimensions(), (3, 3));
        assert!(cutout.pixels().pixels().all(|p| p.0 == [0, 0, 255, 255]));
    }

    #[test]
    fn point_off_subject_finds_nothing() {
        assert!(lifter().subject_at(&scene(), Point::new(8.0, 8.0)).unwrap().is_none());
        assert!(lifter().subject_at(&scene(), Point::new(-1.0, 4.0)).unwrap().is_none());
        assert!(lifter().subject_at(&scene(), Point::new(30.0, 4.0)).unwrap().is_none());
    }
}
