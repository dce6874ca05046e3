pub mod compositing;
pub mod drag_lift;
mod driver;

pub use compositing::{Background, CompositingSession};
pub use drag_lift::{DragLiftSession, DragState, Floating};
pub use driver::{CompositingDriver, DragLiftDriver};
