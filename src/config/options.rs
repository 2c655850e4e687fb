//! Options controlling how a [`SparseContext`](crate::context::SparseContext) lowers calls.

use crate::dispatch::Platform;

/// Default number of work units (stored entries, or entries times right-hand-side columns)
/// below which the threaded kernels stay on the calling thread.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 1 << 14;

/// Dispatch options.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DispatchOptions {
    /// Platform whose lowerings are tried first.
    pub platform: Platform,

    /// Report a diagnostic whenever a registered accelerated lowering is bypassed.
    pub report_fallbacks: bool,

    /// Minimum work for the threaded kernels to split a call across threads.
    pub parallel_threshold: usize,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            platform: Platform::Threaded,
            report_fallbacks: true,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

impl DispatchOptions {
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn with_report_fallbacks(mut self, report_fallbacks: bool) -> Self {
        self.report_fallbacks = report_fallbacks;
        self
    }

    pub fn with_parallel_threshold(mut self, parallel_threshold: usize) -> Self {
        self.parallel_threshold = parallel_threshold;
        self
    }
}
