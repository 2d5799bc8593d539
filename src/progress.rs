//! Progress-callback trait for per-row rendering events.
//!
//! Inject an [`Arc<dyn RenderProgressCallback>`] via
//! [`crate::config::RenderConfigBuilder::progress_callback`] to receive events
//! as the renderer works through each row. The `csv2pdf` binary uses this to
//! drive its terminal progress bar; library callers can forward the events
//! anywhere without the renderer knowing about it.
//!
//! # Example
//!
//! ```rust
//! use edgequake_rowkit::{RenderConfig, RenderProgressCallback};
//! use std::path::Path;
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     written: AtomicUsize,
//! }
//!
//! impl RenderProgressCallback for CountingCallback {
//!     fn on_row_complete(&self, row_num: usize, total_rows: usize, path: &Path) {
//!         let done = self.written.fetch_add(1, Ordering::SeqCst) + 1;
//!         eprintln!("{done}/{total_rows}: row {row_num} -> {}", path.display());
//!     }
//! }
//!
//! let config = RenderConfig::builder()
//!     .progress_callback(Arc::new(CountingCallback { written: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use std::path::Path;
use std::sync::Arc;

/// Called by the renderer as it processes each row.
///
/// Rows are rendered one at a time, so events arrive in row order. All
/// methods default to no-ops; implement only what you need.
pub trait RenderProgressCallback: Send + Sync {
    /// Called once, after the dataset is loaded and the row range resolved.
    ///
    /// # Arguments
    /// * `total_rows`: number of rows that will be rendered
    fn on_render_start(&self, total_rows: usize) {
        let _ = total_rows;
    }

    /// Called before a row is laid out.
    ///
    /// # Arguments
    /// * `row_num`   : 1-based row number in the dataset
    /// * `total_rows`: rows in this run
    fn on_row_start(&self, row_num: usize, total_rows: usize) {
        let _ = (row_num, total_rows);
    }

    /// Called after a row's PDF has been written.
    fn on_row_complete(&self, row_num: usize, total_rows: usize, path: &Path) {
        let _ = (row_num, total_rows, path);
    }

    /// Called when a row fails; the run continues with the next row.
    fn on_row_error(&self, row_num: usize, total_rows: usize, error: &str) {
        let _ = (row_num, total_rows, error);
    }

    /// Called once after every row has been attempted.
    ///
    /// # Arguments
    /// * `total_rows`   : rows attempted
    /// * `success_count`: rows that produced a PDF
    fn on_render_complete(&self, total_rows: usize, success_count: usize) {
        let _ = (total_rows, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl RenderProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::RenderConfig`].
pub type ProgressCallback = Arc<dyn RenderProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct TrackingCallback {
        started_total: AtomicUsize,
        starts: AtomicUsize,
        completes: AtomicUsize,
        errors: AtomicUsize,
        completed_total: AtomicUsize,
        paths: Mutex<Vec<String>>,
    }

    impl RenderProgressCallback for TrackingCallback {
        fn on_render_start(&self, total_rows: usize) {
            self.started_total.store(total_rows, Ordering::SeqCst);
        }

        fn on_row_start(&self, _row_num: usize, _total_rows: usize) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_row_complete(&self, _row_num: usize, _total_rows: usize, path: &Path) {
            self.completes.fetch_add(1, Ordering::SeqCst);
            if let Ok(mut paths) = self.paths.lock() {
                paths.push(path.display().to_string());
            }
        }

        fn on_row_error(&self, _row_num: usize, _total_rows: usize, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }

        fn on_render_complete(&self, _total_rows: usize, success_count: usize) {
            self.completed_total.store(success_count, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_render_start(5);
        cb.on_row_start(1, 5);
        cb.on_row_complete(1, 5, Path::new("pdfs/a.pdf"));
        cb.on_row_error(2, 5, "some error");
        cb.on_render_complete(5, 4);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_render_start(3);
        assert_eq!(tracker.started_total.load(Ordering::SeqCst), 3);

        tracker.on_row_start(1, 3);
        tracker.on_row_complete(1, 3, Path::new("pdfs/alice.pdf"));
        tracker.on_row_start(2, 3);
        tracker.on_row_complete(2, 3, Path::new("pdfs/bob.pdf"));
        tracker.on_row_start(3, 3);
        tracker.on_row_error(3, 3, "layout failed");
        tracker.on_render_complete(3, 2);

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.completed_total.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.paths.lock().unwrap().len(), 2);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_render_start(10);
        cb.on_row_start(1, 10);
        cb.on_row_complete(1, 10, Path::new("x.pdf"));
    }
}
