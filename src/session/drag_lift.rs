//! Drag-to-lift interaction: follow a drag, resolve the subject under it
//! once, then float its cut-out under the pointer until the drag ends.

use crate::error::Result;
use crate::types::{Image, Point};
use tokio::sync::watch;

/// Identifies one drag from begin to end.
pub type DragId = u64;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    /// Dragging; no subject resolved yet.
    Tracking {
        drag: DragId,
        lookup_pending: bool,
    },
    /// Dragging with the subject's cut-out floating under the pointer.
    Lifted { drag: DragId, floating: Image },
}

/// Look up the subject under `point` for `drag`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LookupRequest {
    pub drag: DragId,
    pub point: Point,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    None,
    Lookup(LookupRequest),
}

/// Floating cut-out, centered on `position`.
#[derive(Debug, Clone, PartialEq)]
pub struct Floating {
    pub image: Image,
    pub position: Point,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Snapshot {
    pub state: DragState,
    pub pointer: Point,
}

impl Snapshot {
    pub fn floating(&self) -> Option<Floating> {
        match &self.state {
            DragState::Lifted { floating, .. } => Some(Floating {
                image: floating.clone(),
                position: self.pointer,
            }),
            _ => None,
        }
    }
}

pub struct DragLiftSession {
    state: DragState,
    pointer: Point,
    last_drag: DragId,
    updates: watch::Sender<Snapshot>,
}

impl Default for DragLiftSession {
    fn default() -> Self {
        Self::new()
    }
}

impl DragLiftSession {
    pub fn new() -> Self {
        let (updates, _) = watch::channel(Snapshot::default());
        Self {
            state: DragState::Idle,
            pointer: Point::default(),
            last_drag: 0,
            updates,
        }
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn pointer(&self) -> Point {
        self.pointer
    }

    pub fn is_idle(&self) -> bool {
        self.state == DragState::Idle
    }

    /// Id of the drag in progress, if any.
    pub fn active_drag(&self) -> Option<DragId> {
        match self.state {
            DragState::Idle => None,
            DragState::Tracking { drag, .. } | DragState::Lifted { drag, .. } => Some(drag),
        }
    }

    pub fn floating(&self) -> Option<Floating> {
        self.snapshot().floating()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            state: self.state.clone(),
            pointer: self.pointer,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.updates.subscribe()
    }

    fn publish(&self) {
        self.updates.send_replace(self.snapshot());
    }

    /// Start a drag at `point`. A drag already in progress is abandoned.
    pub fn begin(&mut self, point: Point) {
        self.last_drag += 1;
        tracing::debug!("Drag {} began at ({:.1}, {:.1})", self.last_drag, point.x, point.y);
        self.state = DragState::Tracking {
            drag: self.last_drag,
            lookup_pending: false,
        };
        self.pointer = point;
        self.publish();
    }

    /// Move the pointer. While no subject is resolved and no lookup is
    /// outstanding, a lookup at the new point is requested.
    pub fn move_to(&mut self, point: Point) -> Effect {
        let effect = match &mut self.state {
            DragState::Idle => return Effect::None,
            DragState::Tracking {
                drag,
                lookup_pending,
            } if !*lookup_pending => {
                *lookup_pending = true;
                Effect::Lookup(LookupRequest { drag: *drag, point })
            }
            DragState::Tracking { .. } | DragState::Lifted { .. } => Effect::None,
        };
        self.pointer = point;
        self.publish();
        effect
    }

    /// Apply the result of a lookup. Returns whether the subject was lifted.
    ///
    /// Results for a drag that already ended are discarded. When nothing
    /// was found the drag keeps tracking and the next move retries.
    pub fn resolve(&mut self, drag: DragId, result: Result<Option<Image>>) -> bool {
        let DragState::Tracking {
            drag: live,
            lookup_pending,
        } = &mut self.state
        else {
            tracing::debug!("Discarding lookup for drag {}, no drag is tracking", drag);
            return false;
        };
        if *live != drag {
            tracing::debug!("Discarding lookup for drag {} (current {})", drag, live);
            return false;
        }
        *lookup_pending = false;

        let lifted = match result {
            Ok(Some(image)) => {
                tracing::debug!("Drag {} lifted a {}x{} subject", drag, image.width(), image.height());
                self.state = DragState::Lifted {
                    drag,
                    floating: image,
                };
                true
            }
            Ok(None) => {
                tracing::debug!("No subject under drag {}", drag);
                false
            }
            Err(err) => {
                tracing::warn!("Subject lookup failed: {}", err);
                false
            }
        };
        self.publish();
        lifted
    }

    /// End the drag and drop the floating image.
    pub fn end(&mut self) {
        if let Some(drag) = self.active_drag() {
            tracing::debug!("Drag {} ended", drag);
        }
        self.state = DragState::Idle;
        self.pointer = Point::default();
        self.publish();
    }
}
