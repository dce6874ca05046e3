//! End-to-end workflows over the session drivers.
//!
//! Each workflow picks its images from an [`ImageSource`], runs the
//! matching driver until every call has settled and returns the image a
//! viewer would show. Writing the result is left to the caller.

use crate::compositing::{Color, MaskBlendCompositor};
use crate::config::WorkflowConfig;
use crate::error::{Error, Result};
use crate::lifting::MaskSubjectLifter;
use crate::segmentation::SubjectSegmenter;
use crate::session::{CompositingDriver, DragLiftDriver, Floating};
use crate::source::ImageSource;
use crate::types::{Image, Point};
use std::sync::Arc;

fn pick(source: &mut impl ImageSource, what: &'static str) -> Result<Image> {
    source.pick_image()?.ok_or(Error::Cancelled(what))
}

/// Pick a foreground and wait until its mask is ready.
async fn prepare_foreground(
    source: &mut impl ImageSource,
    segmenter: Arc<dyn SubjectSegmenter>,
    config: &WorkflowConfig,
) -> Result<CompositingDriver> {
    let foreground = pick(source, "foreground image")?;
    let mut driver = CompositingDriver::new(segmenter, Arc::new(MaskBlendCompositor::new()), config);

    driver.set_foreground(foreground);
    driver.settle().await;
    if driver.session().mask().is_none() {
        return Err(Error::NoSubject);
    }
    Ok(driver)
}

/// Replace the background of the first picked image.
///
/// With `color` the subject is placed over that solid color; otherwise a
/// second image is picked as the background.
pub async fn composite(
    source: &mut impl ImageSource,
    color: Option<Color>,
    segmenter: Arc<dyn SubjectSegmenter>,
    config: &WorkflowConfig,
) -> Result<Image> {
    let mut driver = prepare_foreground(source, segmenter, config).await?;

    let requested = match color {
        Some(color) => {
            tracing::info!("Compositing over {:?}", color);
            driver.set_background_color(color)
        }
        None => {
            let background = pick(source, "background image")?;
            tracing::info!("Compositing over {}x{} image", background.width(), background.height());
            driver.set_background(background)
        }
    };
    if !requested {
        return Err(Error::NotComposited);
    }
    driver.settle().await;

    match (driver.session().background(), driver.session().output()) {
        (Some(_), Some(output)) => Ok(output.clone()),
        _ => Err(Error::NotComposited),
    }
}

/// Grayscale view of the picked image's subject mask.
pub async fn extract_mask(
    source: &mut impl ImageSource,
    segmenter: Arc<dyn SubjectSegmenter>,
    config: &WorkflowConfig,
) -> Result<Image> {
    let mut driver = prepare_foreground(source, segmenter, config).await?;
    if !driver.show_mask() {
        return Err(Error::NoSubject);
    }
    driver.session().output().cloned().ok_or(Error::NoSubject)
}

/// Replay a drag over the picked image.
///
/// The first point begins the drag and every later point is a move; each
/// move settles before the next. Returns the subject floating at the last
/// point, or [`Error::NoSubject`] when the drag never lifted one.
pub async fn lift_along(
    source: &mut impl ImageSource,
    path: &[Point],
    segmenter: Arc<dyn SubjectSegmenter>,
    config: &WorkflowConfig,
) -> Result<Floating> {
    let Some((start, moves)) = path.split_first() else {
        return Err(Error::EmptyDrag);
    };
    let image = pick(source, "image")?;

    let lifter = MaskSubjectLifter::new(segmenter, config.lift_threshold);
    let mut driver = DragLiftDriver::new(Arc::new(lifter), config);
    driver.set_image(image);

    driver.begin(*start);
    for point in moves {
        driver.move_to(*point);
        driver.settle().await;
    }

    let floating = driver.floating();
    driver.end();

    let floating = floating.ok_or(Error::NoSubject)?;
    tracing::info!(
        "Lifted {}x{} subject, floating at ({:.1}, {:.1})",
        floating.image.width(),
        floating.image.height(),
        floating.position.x,
        floating.position.y
    );
    Ok(floating)
}
