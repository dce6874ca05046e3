use std::time::Duration;

/// Errors reported by the collaborators a session orchestrates.
///
/// Sessions never propagate these: a failed attempt is logged and the
/// session state is left as it was.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The segmenter or lifter found nothing to isolate.
    #[error("no subject found")]
    NoSubject,

    /// The compositor cannot blend the given inputs.
    #[error("blend unsupported: {0}")]
    Unsupported(String),

    #[error("mask has {actual} values, expected {width}x{height}")]
    InvalidMask {
        width: u32,
        height: u32,
        actual: usize,
    },

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("invalid color '{0}'")]
    InvalidColor(String),

    #[error("external call timed out after {0:?}")]
    TimedOut(Duration),

    /// The blocking task running the call panicked or was cancelled.
    #[error("external call aborted: {0}")]
    Aborted(String),

    /// The image source was dismissed without a selection.
    #[error("no {0} selected")]
    Cancelled(&'static str),

    /// A drag needs at least its starting point.
    #[error("drag path is empty")]
    EmptyDrag,

    /// The session never produced a composite for the requested background.
    #[error("background was not applied")]
    NotComposited,

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
