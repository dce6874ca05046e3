mod chroma;
mod preprocess;
mod rvm;
pub mod types;

pub use chroma::ChromaKeySegmenter;
pub use preprocess::Preprocessor;
pub use rvm::RobustVideoMatting;
pub use types::SubjectSegmenter;

use crate::compositing::Color;
use crate::config::WorkflowConfig;
use crate::error::Result;
use std::path::Path;
use std::sync::Arc;

/// Create the segmenter selected on the command line: RVM when a model is
/// given, otherwise a chroma key on `key`.
pub fn create_segmenter(
    model_path: Option<&Path>,
    key: Color,
    config: &WorkflowConfig,
) -> Result<Arc<dyn SubjectSegmenter>> {
    match model_path {
        Some(path) => Ok(Arc::new(RobustVideoMatting::new(path)?)),
        None => {
            tracing::info!("No model given, keying on {:?}", key);
            Ok(Arc::new(ChromaKeySegmenter::new(key, config.key_tolerance)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn falls_back_to_chroma_key_without_model() {
        let segmenter = create_segmenter(None, Color::GREEN, &WorkflowConfig::default()).unwrap();
        assert_eq!(segmenter.input_size(), None);
    }

    #[test]
    fn missing_model_file_is_reported() {
        let result = create_segmenter(
            Some(Path::new("/nonexistent/rvm.onnx")),
            Color::GREEN,
            &WorkflowConfig::default(),
        );
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
