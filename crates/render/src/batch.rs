//! Parallel rendering of many documents with rayon.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

use rayon::prelude::*;
use serde::Serialize;

use mdpress_core::{Document, FsLoader, PressError, RenderOptions};

use crate::{RenderOutput, render_document};

/// Counts and timing for a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchStats {
    /// Number of documents processed.
    pub total: u32,
    /// Documents rendered without error.
    pub succeeded: u32,
    /// Documents whose render returned an error.
    pub failed: u32,
    /// Wall time for the whole batch in milliseconds.
    pub elapsed_ms: f64,
}

/// Renders documents in parallel. Results keep input order.
///
/// `threads` caps the worker count with a dedicated pool; `None` uses the
/// global rayon pool. Each document's directives are read from disk.
pub fn render_batch(
    inputs: Vec<Document>,
    options: &RenderOptions,
    threads: Option<usize>,
) -> (Vec<Result<RenderOutput, PressError>>, BatchStats) {
    let start = Instant::now();

    let pool = threads.and_then(|threads| {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| log::warn!("falling back to the global rayon pool: {}", e))
            .ok()
    });

    let total = inputs.len() as u32;
    let succeeded = AtomicU32::new(0);
    let failed = AtomicU32::new(0);

    let process = |document: Document| -> Result<RenderOutput, PressError> {
        let result = render_document(&document, &FsLoader, options);
        match &result {
            Ok(_) => succeeded.fetch_add(1, Ordering::Relaxed),
            Err(e) => {
                log::warn!("render of {:?} failed: {}", document.path, e);
                failed.fetch_add(1, Ordering::Relaxed)
            }
        };
        result
    };

    let results: Vec<Result<RenderOutput, PressError>> = match pool {
        Some(pool) => pool.install(|| inputs.into_par_iter().map(process).collect()),
        None => inputs.into_par_iter().map(process).collect(),
    };

    let stats = BatchStats {
        total,
        succeeded: succeeded.load(Ordering::Relaxed),
        failed: failed.load(Ordering::Relaxed),
        elapsed_ms: start.elapsed().as_secs_f64() * 1000.0,
    };
    (results, stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_keeps_order_and_counts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("part.md"), "Shared **part**\n").unwrap();

        let inputs: Vec<Document> = (0..8)
            .map(|i| Document::new(format!("## Page {i}\n\n<!--@include: ./part.md-->"), dir.path()))
            .collect();
        let (results, stats) = render_batch(inputs, &RenderOptions::default(), Some(2));

        assert_eq!(stats.total, 8);
        assert_eq!(stats.succeeded, 8);
        assert_eq!(stats.failed, 0);
        for (i, result) in results.iter().enumerate() {
            let output = result.as_ref().unwrap();
            assert_eq!(output.headings[0].slug, format!("page-{i}"));
            assert!(output.html.contains("<strong>part</strong>"));
        }
    }

    #[test]
    fn empty_batch() {
        let (results, stats) = render_batch(Vec::new(), &RenderOptions::default(), None);
        assert!(results.is_empty());
        assert_eq!((stats.total, stats.succeeded, stats.failed), (0, 0, 0));
    }
}
