//! The boundary between batching and drawing.
//!
//! A renderer receives finished batches, one per (blend mode, texture)
//! group, and is free to draw them however it likes. The GPU renderer in
//! [`crate::gpu`] is one implementation; [`RecordingRenderer`] keeps the
//! submissions in memory for headless runs and tests.

use crate::batch::{Batch, GroupKey};
use crate::simulation::Frame;

/// Something that can draw a batch.
pub trait Renderer {
    type Error;

    /// Draw one group's quads.
    fn draw_batch(&mut self, batch: &Batch) -> Result<(), Self::Error>;
}

/// Submit every non-empty group of `frame`, in order, exactly once.
///
/// Returns the number of submissions.
pub fn submit<R: Renderer + ?Sized>(
    frame: &Frame<'_>,
    renderer: &mut R,
) -> Result<usize, R::Error> {
    let mut submitted = 0;
    for batch in frame.batches() {
        renderer.draw_batch(batch)?;
        submitted += 1;
    }
    Ok(submitted)
}

/// Summary of one recorded submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Submission {
    pub key: GroupKey,
    pub vertices: usize,
    pub indices: usize,
}

/// Renderer that only records what it was asked to draw.
#[derive(Debug, Clone, Default)]
pub struct RecordingRenderer {
    pub submissions: Vec<Submission>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget previous submissions.
    pub fn clear(&mut self) {
        self.submissions.clear();
    }
}

impl Renderer for RecordingRenderer {
    type Error = std::convert::Infallible;

    fn draw_batch(&mut self, batch: &Batch) -> Result<(), Self::Error> {
        self.submissions.push(Submission {
            key: batch.key,
            vertices: batch.vertices.len(),
            indices: batch.indices.len(),
        });
        Ok(())
    }
}
