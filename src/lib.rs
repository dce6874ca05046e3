//! Subject isolation workflows: replace a photo's background through a
//! segmentation mask, or drag a lifted cut-out of the subject under the
//! pointer.

pub mod compositing;
pub mod config;
pub mod error;
pub mod lifting;
pub mod output;
pub mod segmentation;
pub mod session;
pub mod source;
pub mod types;
pub mod workflow;

pub use config::WorkflowConfig;
pub use error::{Error, Result};
pub use types::{Image, Mask, Point};
