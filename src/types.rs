use crate::error::{Error, Result};
use image::RgbaImage;
use std::collections::VecDeque;
use std::sync::Arc;

/// Immutable bitmap shared between the session, its collaborators and
/// observers. Cloning only bumps a reference count.
#[derive(Debug, Clone)]
pub struct Image(Arc<RgbaImage>);

impl Image {
    pub fn new(pixels: RgbaImage) -> Self {
        Self(Arc::new(pixels))
    }

    pub fn width(&self) -> u32 {
        self.0.width()
    }

    pub fn height(&self) -> u32 {
        self.0.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.0.dimensions()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.0
    }

    /// True when both handles point at the same allocation.
    pub fn same_as(&self, other: &Image) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl From<RgbaImage> for Image {
    fn from(pixels: RgbaImage) -> Self {
        Self::new(pixels)
    }
}

impl PartialEq for Image {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other) || *self.0 == *other.0
    }
}

/// Alpha mask: 0.0 = background, 1.0 = subject.
/// Values are row-major and match the dimensions of the image they were
/// generated from.
#[derive(Debug, Clone, PartialEq)]
pub struct Mask {
    width: u32,
    height: u32,
    alpha: Arc<[f32]>,
}

impl Mask {
    pub fn new(width: u32, height: u32, alpha: Vec<f32>) -> Result<Self> {
        if alpha.len() != (width as usize) * (height as usize) {
            return Err(Error::InvalidMask {
                width,
                height,
                actual: alpha.len(),
            });
        }
        Ok(Self {
            width,
            height,
            alpha: alpha.into(),
        })
    }

    /// Build a mask by evaluating `f` at every pixel.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> f32) -> Self {
        let mut alpha = Vec::with_capacity((width as usize) * (height as usize));
        for y in 0..height {
            for x in 0..width {
                alpha.push(f(x, y).clamp(0.0, 1.0));
            }
        }
        Self {
            width,
            height,
            alpha: alpha.into(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn values(&self) -> &[f32] {
        &self.alpha
    }

    /// Alpha at a pixel, or `None` outside the mask.
    pub fn alpha_at(&self, x: u32, y: u32) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.alpha[(y * self.width + x) as usize])
    }

    /// Whether this mask can be paired with `image`.
    pub fn fits(&self, image: &Image) -> bool {
        self.dimensions() == image.dimensions()
    }

    /// Largest alpha value in the mask.
    pub fn peak(&self) -> f32 {
        self.alpha.iter().copied().fold(0.0, f32::max)
    }

    /// Connected subject region containing `(x, y)`.
    ///
    /// Pixels with alpha of at least `threshold` that are 4-connected to the
    /// seed keep their alpha; everything else is zeroed. Returns the region
    /// mask and its bounds `(x, y, width, height)`, or `None` when the seed
    /// is outside the mask or below `threshold`.
    pub fn region_at(&self, x: u32, y: u32, threshold: f32) -> Option<(Mask, (u32, u32, u32, u32))> {
        if self.alpha_at(x, y)? < threshold {
            return None;
        }

        let width = self.width as usize;
        let height = self.height as usize;
        let mut region = vec![0.0f32; self.alpha.len()];
        let mut visited = vec![false; self.alpha.len()];
        let mut queue = VecDeque::new();
        let (mut x0, mut y0, mut x1, mut y1) = (x, y, x, y);

        let seed = y as usize * width + x as usize;
        visited[seed] = true;
        queue.push_back((x as usize, y as usize));

        while let Some((cx, cy)) = queue.pop_front() {
            let index = cy * width + cx;
            region[index] = self.alpha[index];
            x0 = x0.min(cx as u32);
            y0 = y0.min(cy as u32);
            x1 = x1.max(cx as u32);
            y1 = y1.max(cy as u32);

            let neighbours = [
                (cx.wrapping_sub(1), cy),
                (cx + 1, cy),
                (cx, cy.wrapping_sub(1)),
                (cx, cy + 1),
            ];
            for (nx, ny) in neighbours {
                if nx >= width || ny >= height {
                    continue;
                }
                let next = ny * width + nx;
                if visited[next] || self.alpha[next] < threshold {
                    continue;
                }
                visited[next] = true;
                queue.push_back((nx, ny));
            }
        }

        let mask = Mask {
            width: self.width,
            height: self.height,
            alpha: region.into(),
        };
        Some((mask, (x0, y0, x1 - x0 + 1, y1 - y0 + 1)))
    }

    /// Grayscale rendering of the mask for inspection.
    pub fn to_image(&self) -> Image {
        let width = self.width;
        let pixels = RgbaImage::from_fn(self.width, self.height, |x, y| {
            let value = (self.alpha[(y * width + x) as usize] * 255.0).clamp(0.0, 255.0) as u8;
            image::Rgba([value, value, value, 255])
        });
        Image::new(pixels)
    }
}

/// Pointer position in image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Pixel under the point, if it is not left of or above the origin.
    pub fn pixel(&self) -> Option<(u32, u32)> {
        if self.x < 0.0 || self.y < 0.0 || !self.x.is_finite() || !self.y.is_finite() {
            return None;
        }
        Some((self.x as u32, self.y as u32))
    }
}

impl std::str::FromStr for Point {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (x, y) = s
            .split_once(',')
            .ok_or_else(|| format!("expected 'x,y', got '{s}'"))?;
        let x = x.trim().parse::<f32>().map_err(|e| format!("bad x in '{s}': {e}"))?;
        let y = y.trim().parse::<f32>().map_err(|e| format!("bad y in '{s}': {e}"))?;
        Ok(Self::new(x, y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_rejects_wrong_length() {
        let err = Mask::new(2, 2, vec![0.0; 3]).unwrap_err();
        assert!(matches!(err, Error::InvalidMask { actual: 3, .. }));
    }

    #[test]
    fn region_covers_connected_pixels_only() {
        // Two blobs: columns 0..2 and columns 4..6 on rows 1..3.
        let mask = Mask::from_fn(6, 4, |x, y| {
            if (1..3).contains(&y) && (x < 2 || x >= 4) {
                1.0
            } else {
                0.0
            }
        });

        let (left, bounds) = mask.region_at(1, 1, 0.5).unwrap();
        assert_eq!(bounds, (0, 1, 2, 2));
        assert_eq!(left.alpha_at(0, 2), Some(1.0));
        assert_eq!(left.alpha_at(4, 1), Some(0.0));

        let (_, bounds) = mask.region_at(5, 2, 0.5).unwrap();
        assert_eq!(bounds, (4, 1, 2, 2));
    }

    #[test]
    fn region_needs_seed_on_subject() {
        let mask = Mask::from_fn(3, 3, |x, _| if x == 1 { 0.8 } else { 0.1 });
        assert!(mask.region_at(0, 0, 0.5).is_none());
        assert!(mask.region_at(7, 0, 0.5).is_none());

        let (region, bounds) = mask.region_at(1, 2, 0.5).unwrap();
        assert_eq!(bounds, (1, 0, 1, 3));
        assert_eq!(region.alpha_at(1, 0), Some(0.8));
        assert_eq!(region.alpha_at(0, 0), Some(0.0));
    }

    #[test]
    fn mask_visualization_is_grayscale() {
        let mask = Mask::new(2, 1, vec![0.0, 1.0]).unwrap();
        let image = mask.to_image();
        assert_eq!(image.pixels().get_pixel(0, 0).0, [0, 0, 0, 255]);
        assert_eq!(image.pixels().get_pixel(1, 0).0, [255, 255, 255, 255]);
    }

    #[test]
    fn image_equality_by_identity_or_pixels() {
        let a = Image::new(RgbaImage::new(2, 2));
        let b = Image::new(RgbaImage::new(2, 2));
        assert!(a.same_as(&a.clone()));
        assert!(!a.same_as(&b));
        assert_eq!(a, b);
    }

    #[test]
    fn point_parses_pairs() {
        assert_eq!("3.5, 4".parse::<Point>().unwrap(), Point::new(3.5, 4.0));
        assert!("3".parse::<Point>().is_err());
        assert_eq!(Point::new(-1.0, 2.0).pixel(), None);
    }
}
