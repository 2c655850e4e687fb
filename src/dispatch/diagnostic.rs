//! Fallback diagnostics.
//!
//! Whenever an accelerated lowering is registered but cannot be used, the reference kernel
//! runs and a [`Diagnostic`] is handed to the context's [`DiagnosticSink`]. The default sink
//! logs a warning on the [`EFFICIENCY_TARGET`] target. Reporting never affects results.

use std::fmt;
use std::sync::Mutex;

use crate::core::DType;
use crate::dispatch::Platform;
use crate::primitive::PrimitiveKind;

/// `log` target used for fallback warnings.
pub const EFFICIENCY_TARGET: &str = "spcoo::efficiency";

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FallbackReason {
    UnsupportedDtype(DType),
    UnsortedLayout,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DiagnosticKind {
    PerformanceDegradation,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub primitive: PrimitiveKind,
    pub platform: Platform,
    pub reason: FallbackReason,
}

impl Diagnostic {
    pub fn kind(&self) -> DiagnosticKind {
        DiagnosticKind::PerformanceDegradation
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reason {
            FallbackReason::UnsupportedDtype(dtype) => write!(
                f,
                "{} {} lowering not available for dtype={dtype}. \
                 Falling back to the reference implementation.",
                self.primitive, self.platform
            ),
            FallbackReason::UnsortedLayout => write!(
                f,
                "{} {} lowering requires matrices with sorted rows or sorted cols. \
                 To sort the rows in your matrix, use e.g. `mat.sort_indices()`. \
                 Falling back to the reference implementation.",
                self.primitive, self.platform
            ),
        }
    }
}

/// Receives fallback diagnostics. Implementations must not block.
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, diagnostic: &Diagnostic);
}

/// Forwards diagnostics to `log::warn!`.
#[derive(Copy, Clone, Debug, Default)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn report(&self, diagnostic: &Diagnostic) {
        log::warn!(target: EFFICIENCY_TARGET, "{diagnostic}");
    }
}

/// Keeps every reported diagnostic in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<Diagnostic>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the diagnostics reported so far.
    pub fn events(&self) -> Vec<Diagnostic> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl DiagnosticSink for RecordingSink {
    fn report(&self, diagnostic: &Diagnostic) {
        match self.events.lock() {
            Ok(mut events) => events.push(*diagnostic),
            Err(poisoned) => poisoned.into_inner().push(*diagnostic),
        }
    }
}
