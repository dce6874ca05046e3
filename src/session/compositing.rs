//! Foreground / mask / background compositing state machine.
//!
//! The session never calls its collaborators itself. Operations that need
//! a segmentation or a blend return an [`Effect`] describing the work; the
//! caller runs it and hands the result back through
//! [`CompositingSession::apply_segmentation`] or
//! [`CompositingSession::apply_blend`]. Every request carries the
//! generation of the foreground it was issued for, so results that arrive
//! after the foreground changed are dropped.

use crate::compositing::{solid_image, Color};
use crate::error::Result;
use crate::types::{Image, Mask};
use tokio::sync::watch;

/// Monotonic counter bumped whenever the foreground changes or is cleared.
pub type Generation = u64;

/// The background that produced the current output.
#[derive(Debug, Clone, PartialEq)]
pub enum Background {
    Image(Image),
    Color(Color),
}

/// Segment `foreground`; the result belongs to `generation`.
#[derive(Debug, Clone)]
pub struct SegmentRequest {
    pub generation: Generation,
    pub foreground: Image,
}

/// Identifies one blend request. Only the newest request of the current
/// generation may update the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlendTicket {
    pub generation: Generation,
    pub sequence: u64,
}

/// Blend `foreground` through `mask` over `background_image`.
#[derive(Debug, Clone)]
pub struct BlendRequest {
    pub ticket: BlendTicket,
    pub foreground: Image,
    pub mask: Mask,
    pub background_image: Image,
    pub background: Background,
}

/// External work requested by a session operation.
#[derive(Debug, Clone)]
pub enum Effect {
    /// Nothing to run.
    None,
    Segment(SegmentRequest),
    Blend(BlendRequest),
}

impl Effect {
    pub fn is_none(&self) -> bool {
        matches!(self, Effect::None)
    }
}

/// Observable view of the session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub generation: Generation,
    pub foreground: Option<Image>,
    pub has_mask: bool,
    pub segmenting: bool,
    pub output: Option<Image>,
}

pub struct CompositingSession {
    foreground: Option<Image>,
    mask: Option<Mask>,
    background: Option<Background>,
    output: Option<Image>,
    generation: Generation,
    segmenting: bool,
    blend_sequence: u64,
    updates: watch::Sender<Snapshot>,
}

impl Default for CompositingSession {
    fn default() -> Self {
        Self::new()
    }
}

impl CompositingSession {
    pub fn new() -> Self {
        let (updates, _) = watch::channel(Snapshot::default());
        Self {
            foreground: None,
            mask: None,
            background: None,
            output: None,
            generation: 0,
            segmenting: false,
            blend_sequence: 0,
            updates,
        }
    }

    pub fn foreground(&self) -> Option<&Image> {
        self.foreground.as_ref()
    }

    pub fn mask(&self) -> Option<&Mask> {
        self.mask.as_ref()
    }

    pub fn background(&self) -> Option<&Background> {
        self.background.as_ref()
    }

    pub fn output(&self) -> Option<&Image> {
        self.output.as_ref()
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// True while a segmentation for the current foreground is outstanding.
    pub fn is_segmenting(&self) -> bool {
        self.segmenting
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            generation: self.generation,
            foreground: self.foreground.clone(),
            has_mask: self.mask.is_some(),
            segmenting: self.segmenting,
            output: self.output.clone(),
        }
    }

    /// Receive a fresh [`Snapshot`] after every state change.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.updates.subscribe()
    }

    fn publish(&self) {
        self.updates.send_replace(self.snapshot());
    }

    /// Replace the foreground. The previous mask, background and output are
    /// dropped, the new foreground is shown as a preview, and a segmentation
    /// of it is requested.
    pub fn set_foreground(&mut self, image: Image) -> Effect {
        self.generation += 1;
        tracing::info!(
            "Foreground set ({}x{}), generation {}",
            image.width(),
            image.height(),
            self.generation
        );

        self.foreground = Some(image.clone());
        self.mask = None;
        self.background = None;
        self.output = Some(image.clone());
        self.segmenting = true;
        self.publish();

        Effect::Segment(SegmentRequest {
            generation: self.generation,
            foreground: image,
        })
    }

    /// Apply a segmentation result. Returns whether a mask was stored.
    ///
    /// Results for an older generation are ignored. A failed segmentation,
    /// or a mask that does not fit the foreground, leaves the mask unset.
    pub fn apply_segmentation(&mut self, generation: Generation, result: Result<Mask>) -> bool {
        if generation != self.generation {
            tracing::debug!(
                "Discarding segmentation for generation {} (current {})",
                generation,
                self.generation
            );
            return false;
        }
        let Some(foreground) = self.foreground.clone() else {
            return false;
        };

        self.segmenting = false;
        let stored = match result {
            Ok(mask) if mask.fits(&foreground) => {
                tracing::info!("Mask ready for generation {}", generation);
                self.mask = Some(mask);
                self.output = Some(foreground);
                true
            }
            Ok(mask) => {
                tracing::warn!(
                    "Mask is {:?} but foreground is {:?}, ignoring",
                    mask.dimensions(),
                    foreground.dimensions()
                );
                false
            }
            Err(err) => {
                tracing::warn!("Segmentation failed: {}", err);
                false
            }
        };
        self.publish();
        stored
    }

    /// Composite the subject over `image`.
    ///
    /// Does nothing until a foreground and its mask are both available.
    pub fn set_background(&mut self, image: Image) -> Effect {
        if !self.is_ready() {
            tracing::debug!("Background image ignored, mask not ready");
            return Effect::None;
        }
        self.blend_request(Background::Image(image.clone()), image)
    }

    /// Composite the subject over a solid `color` sized to the foreground.
    ///
    /// Does nothing until a foreground and its mask are both available.
    pub fn set_background_color(&mut self, color: Color) -> Effect {
        let Some(foreground) = self.foreground.as_ref().filter(|_| self.mask.is_some()) else {
            tracing::debug!("Background color ignored, mask not ready");
            return Effect::None;
        };
        let solid = solid_image(color, foreground.width(), foreground.height());
        self.blend_request(Background::Color(color), solid)
    }

    fn is_ready(&self) -> bool {
        self.foreground.is_some() && self.mask.is_some()
    }

    fn blend_request(&mut self, background: Background, background_image: Image) -> Effect {
        let (Some(foreground), Some(mask)) = (self.foreground.clone(), self.mask.clone()) else {
            return Effect::None;
        };
        self.blend_sequence += 1;
        Effect::Blend(BlendRequest {
            ticket: BlendTicket {
                generation: self.generation,
                sequence: self.blend_sequence,
            },
            foreground,
            mask,
            background_image,
            background,
        })
    }

    /// Apply a blend result. Returns whether the output changed.
    ///
    /// Results superseded by a newer blend or a newer foreground are
    /// ignored; a failed blend leaves the output as it was.
    pub fn apply_blend(&mut self, ticket: BlendTicket, background: Background, result: Result<Image>) -> bool {
        if ticket.generation != self.generation || ticket.sequence != self.blend_sequence || !self.is_ready() {
            tracing::debug!("Discarding superseded blend {:?}", ticket);
            return false;
        }

        match result {
            Ok(image) => {
                self.output = Some(image);
                self.background = Some(background);
                self.publish();
                true
            }
            Err(err) => {
                tracing::warn!("Blend failed: {}", err);
                false
            }
        }
    }

    /// Show the mask itself as the output. Returns false when no mask exists.
    ///
    /// Blends still running are superseded and will not replace the mask view.
    pub fn show_mask(&mut self) -> bool {
        let Some(mask) = &self.mask else {
            return false;
        };
        self.output = Some(mask.to_image());
        self.blend_sequence += 1;
        self.publish();
        true
    }

    /// Drop the foreground, its mask, the background and the output.
    /// Any outstanding request becomes stale.
    pub fn clear(&mut self) {
        self.generation += 1;
        self.foreground = None;
        self.mask = None;
        self.background = None;
        self.output = None;
        self.segmenting = false;
        self.publish();
    }
}
