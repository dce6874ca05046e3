use super::preprocess::Preprocessor;
use super::types::SubjectSegmenter;
use crate::error::{Error, Result};
use crate::types::{Image, Mask};
use ndarray::{Array1, Array4};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::TensorRef;
use std::path::Path;
use std::sync::Mutex;

/// Matte peak below which a still is treated as having no subject
const PRESENCE_THRESHOLD: f32 = 0.5;

/// RobustVideoMatting segmentation model
///
/// The model is recurrent, but each still image is segmented on its own:
/// the recurrent inputs are zeroed for every call so one photo never
/// influences the next.
pub struct RobustVideoMatting {
    session: Mutex<Session>,
    preprocessor: Preprocessor,
    width: u32,
    height: u32,

    // Ratio used by the model to size its internal feature maps
    downsample_ratio: f32,
}

impl RobustVideoMatting {
    /// Create a new RVM model from an ONNX file
    ///
    /// # Default Configuration
    /// - Input size: 512x512
    /// - Downsample ratio: 0.25
    pub fn new<P: AsRef<Path>>(model_path: P) -> Result<Self> {
        let path = model_path.as_ref();

        tracing::info!("Loading RVM model from {}", path.display());

        if !path.exists() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("model not found at {}", path.display()),
            )));
        }

        let session = Session::builder()
            .map_err(inference_error)?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(inference_error)?
            .with_intra_threads(4)
            .map_err(inference_error)?
            .commit_from_file(path)
            .map_err(inference_error)?;

        tracing::info!("RVM model loaded successfully");

        let width = 512;
        let height = 512;

        Ok(Self {
            session: Mutex::new(session),
            preprocessor: Preprocessor::new(width, height),
            width,
            height,
            downsample_ratio: 0.25,
        })
    }

    /// Zeroed recurrent input; RVM accepts a 1x1x1x1 placeholder on the first frame
    fn empty_state() -> Array4<f32> {
        Array4::zeros((1, 1, 1, 1))
    }
}

fn inference_error(err: impl std::fmt::Display) -> Error {
    Error::Inference(err.to_string())
}

impl SubjectSegmenter for RobustVideoMatting {
    fn segment(&self, foreground: &Image) -> Result<Mask> {
        let _span = tracing::debug_span!("rvm_segment").entered();

        let input_tensor = self.preprocessor.preprocess(foreground.pixels());
        let ratio = Array1::from_elem(1, self.downsample_ratio);
        let r1 = Self::empty_state();
        let r2 = Self::empty_state();
        let r3 = Self::empty_state();
        let r4 = Self::empty_state();

        let mut session = self
            .session
            .lock()
            .map_err(|_| Error::Inference("model session poisoned".to_string()))?;

        let _infer_span = tracing::debug_span!("inference").entered();
        let inputs = ort::inputs![
            "src" => TensorRef::from_array_view(&input_tensor).map_err(inference_error)?,
            "r1i" => TensorRef::from_array_view(&r1).map_err(inference_error)?,
            "r2i" => TensorRef::from_array_view(&r2).map_err(inference_error)?,
            "r3i" => TensorRef::from_array_view(&r3).map_err(inference_error)?,
            "r4i" => TensorRef::from_array_view(&r4).map_err(inference_error)?,
            "downsample_ratio" => TensorRef::from_array_view(&ratio).map_err(inference_error)?,
        ];
        let outputs = session.run(inputs).map_err(inference_error)?;
        drop(_infer_span);

        // Outputs: fgr, pha, r1o..r4o. Only the alpha matte is needed.
        let (shape, data) = outputs["pha"]
            .try_extract_tensor::<f32>()
            .map_err(inference_error)?;
        if shape.len() != 4 {
            return Err(Error::Inference(format!(
                "expected 4D alpha matte, got {}D",
                shape.len()
            )));
        }
        let matte_height = shape[2] as u32;
        let matte_width = shape[3] as u32;

        let (frame_width, frame_height) = foreground.dimensions();
        let mask = Preprocessor::postprocess_matte(
            data,
            matte_width,
            matte_height,
            frame_width,
            frame_height,
        )?;

        if mask.peak() < PRESENCE_THRESHOLD {
            tracing::debug!("Matte peak {:.2} below presence threshold", mask.peak());
            return Err(Error::NoSubject);
        }

        Ok(mask)
    }

    fn input_size(&self) -> Option<(u32, u32)> {
        Some((self.width, self.height))
    }
}
