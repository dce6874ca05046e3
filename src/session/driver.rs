//! Async drivers that run session effects against real collaborators.
//!
//! Each effect runs as a Tokio task that moves the blocking collaborator
//! call onto the blocking pool under a timeout. Results come back over a
//! channel and are applied by `pump`/`settle` on the driver's own `&mut
//! self`, so session state is only ever touched from one place.
//!
//! Drivers spawn tasks and must be used from within a Tokio runtime.

use super::compositing::{self, Background, BlendTicket, CompositingSession, Generation};
use super::drag_lift::{self, DragId, DragLiftSession, Floating};
use crate::compositing::{Color, Compositor};
use crate::config::WorkflowConfig;
use crate::error::{Error, Result};
use crate::lifting::SubjectLifter;
use crate::segmentation::SubjectSegmenter;
use crate::types::{Image, Mask, Point};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Run a blocking collaborator call with an upper bound on the wait.
async fn run_bounded<T, F>(limit: Duration, job: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::time::timeout(limit, tokio::task::spawn_blocking(job)).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_error)) => Err(Error::Aborted(join_error.to_string())),
        Err(_) => Err(Error::TimedOut(limit)),
    }
}

enum Completion {
    Segmented {
        generation: Generation,
        result: Result<Mask>,
    },
    Blended {
        ticket: BlendTicket,
        background: Background,
        result: Result<Image>,
    },
}

/// Drives a [`CompositingSession`] with a segmenter and a compositor.
pub struct CompositingDriver {
    session: CompositingSession,
    segmenter: Arc<dyn SubjectSegmenter>,
    compositor: Arc<dyn Compositor>,
    call_timeout: Duration,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
    in_flight: usize,
}

impl CompositingDriver {
    pub fn new(
        segmenter: Arc<dyn SubjectSegmenter>,
        compositor: Arc<dyn Compositor>,
        config: &WorkflowConfig,
    ) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            session: CompositingSession::new(),
            segmenter,
            compositor,
            call_timeout: config.call_timeout,
            completions_tx,
            completions_rx,
            in_flight: 0,
        }
    }

    pub fn session(&self) -> &CompositingSession {
        &self.session
    }

    /// Calls dispatched whose results have not been applied yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn set_foreground(&mut self, image: Image) {
        let effect = self.session.set_foreground(image);
        self.dispatch(effect);
    }

    /// Returns false when the request was ignored because no mask is ready.
    pub fn set_background(&mut self, image: Image) -> bool {
        let effect = self.session.set_background(image);
        self.dispatch(effect)
    }

    /// Returns false when the request was ignored because no mask is ready.
    pub fn set_background_color(&mut self, color: Color) -> bool {
        let effect = self.session.set_background_color(color);
        self.dispatch(effect)
    }

    pub fn show_mask(&mut self) -> bool {
        self.session.show_mask()
    }

    pub fn clear(&mut self) {
        self.session.clear();
    }

    fn dispatch(&mut self, effect: compositing::Effect) -> bool {
        let limit = self.call_timeout;
        let tx = self.completions_tx.clone();

        match effect {
            compositing::Effect::None => return false,
            compositing::Effect::Segment(request) => {
                let segmenter = Arc::clone(&self.segmenter);
                let compositing::SegmentRequest {
                    generation,
                    foreground,
                } = request;
                tokio::spawn(async move {
                    let result = run_bounded(limit, move || segmenter.segment(&foreground)).await;
                    let _ = tx.send(Completion::Segmented { generation, result });
                });
            }
            compositing::Effect::Blend(request) => {
                let compositor = Arc::clone(&self.compositor);
                let compositing::BlendRequest {
                    ticket,
                    foreground,
                    mask,
                    background_image,
                    background,
                } = request;
                tokio::spawn(async move {
                    let result = run_bounded(limit, move || {
                        compositor.blend(&foreground, &mask, &background_image)
                    })
                    .await;
                    let _ = tx.send(Completion::Blended {
                        ticket,
                        background,
                        result,
                    });
                });
            }
        }

        self.in_flight += 1;
        true
    }

    /// Wait for the next outstanding call and apply its result.
    /// Returns false when nothing is outstanding.
    pub async fn pump(&mut self) -> bool {
        if self.in_flight == 0 {
            return false;
        }
        let Some(completion) = self.completions_rx.recv().await else {
            return false;
        };
        self.in_flight -= 1;

        match completion {
            Completion::Segmented { generation, result } => {
                self.session.apply_segmentation(generation, result);
            }
            Completion::Blended {
                ticket,
                background,
                result,
            } => {
                self.session.apply_blend(ticket, background, result);
            }
        }
        true
    }

    /// Apply results until no call is outstanding.
    pub async fn settle(&mut self) {
        while self.pump().await {}
    }
}

struct LookupCompletion {
    drag: DragId,
    result: Result<Option<Image>>,
}

/// Drives a [`DragLiftSession`] over a displayed image with a subject lifter.
pub struct DragLiftDriver {
    session: DragLiftSession,
    lifter: Arc<dyn SubjectLifter>,
    image: Option<Image>,
    call_timeout: Duration,
    completions_tx: mpsc::UnboundedSender<LookupCompletion>,
    completions_rx: mpsc::UnboundedReceiver<LookupCompletion>,
    in_flight: usize,
}

impl DragLiftDriver {
    pub fn new(lifter: Arc<dyn SubjectLifter>, config: &WorkflowConfig) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            session: DragLiftSession::new(),
            lifter,
            image: None,
            call_timeout: config.call_timeout,
            completions_tx,
            completions_rx,
            in_flight: 0,
        }
    }

    pub fn session(&self) -> &DragLiftSession {
        &self.session
    }

    pub fn image(&self) -> Option<&Image> {
        self.image.as_ref()
    }

    pub fn floating(&self) -> Option<Floating> {
        self.session.floating()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Display a new image. Any drag in progress ends.
    pub fn set_image(&mut self, image: Image) {
        self.session.end();
        self.image = Some(image);
    }

    pub fn begin(&mut self, point: Point) {
        self.session.begin(point);
    }

    pub fn move_to(&mut self, point: Point) {
        let effect = self.session.move_to(point);
        self.dispatch(effect);
    }

    pub fn end(&mut self) {
        self.session.end();
    }

    fn dispatch(&mut self, effect: drag_lift::Effect) {
        let drag_lift::Effect::Lookup(request) = effect else {
            return;
        };
        let Some(image) = self.image.clone() else {
            self.session.resolve(request.drag, Ok(None));
            return;
        };

        let lifter = Arc::clone(&self.lifter);
        let tx = self.completions_tx.clone();
        let limit = self.call_timeout;
        tokio::spawn(async move {
            let result = run_bounded(limit, move || {
                match lifter.subject_at(&image, request.point)? {
                    Some(subject) => subject.image().map(Some),
                    None => Ok(None),
                }
            })
            .await;
            let _ = tx.send(LookupCompletion {
                drag: request.drag,
                result,
            });
        });
        self.in_flight += 1;
    }

    /// Wait for the next outstanding lookup and apply it.
    /// Returns false when nothing is outstanding.
    pub async fn pump(&mut self) -> bool {
        if self.in_flight == 0 {
            return false;
        }
        let Some(completion) = self.completions_rx.recv().await else {
            return false;
        };
        self.in_flight -= 1;
        self.session.resolve(completion.drag, completion.result);
        true
    }

    pub async fn settle(&mut self) {
        while self.pump().await {}
    }
}
