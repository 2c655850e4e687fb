//! Execution context for the COO primitives.
//!
//! A [`SparseContext`] bundles the [`DispatchRegistry`] consulted for lowerings, the
//! [`DispatchOptions`] and the [`DiagnosticSink`] that receives fallback reports. Every call
//! goes through the same four steps:
//!
//! 1. validate the pattern against the value length and the shape,
//! 2. run the primitive's `abstract_eval`,
//! 3. resolve and [`plan`] the lowering for the requested platform,
//! 4. execute the chosen kernels, reporting a [`Diagnostic`] on fallback.
//!
//! The `*_raw` methods take the `(data, Pattern, CooInfo)` form used by the differentiation
//! rules; the others take a [`CooMatrix`].
//!
//! # Example
//! ```rust
//! use spcoo::{CooMatrix, DispatchOptions, Platform, SparseContext};
//!
//! let ctx = SparseContext::new(DispatchOptions::default().with_platform(Platform::Segmented));
//! let m: CooMatrix<f64> = CooMatrix::eye(3, 3, 0).unwrap();
//! assert_eq!(ctx.matvec(&m, &[1.0, 2.0, 3.0], false).unwrap(), vec![1.0, 2.0, 3.0]);
//! ```

use std::fmt;
use std::sync::{Arc, LazyLock};

use faer::{Mat, MatRef};

use crate::config::DispatchOptions;
use crate::core::{DType, IndexType, Scalar, ShapedArray};
use crate::dispatch::{
    CooKernels, Diagnostic, DiagnosticSink, DispatchRegistry, KernelFamily, LogSink, LoweringPlan,
    Orientation, ReferenceKernels, SegmentedKernels, plan,
};
use crate::error::Result;
use crate::matrix::coo::CooMatrix;
use crate::matrix::dense::{count_nonzero, transposed};
use crate::matrix::info::{CooBuffers, CooInfo, Pattern};
use crate::primitive::{PrimitiveKind, fromdense, matmat, matvec, todense};

static GLOBAL_CONTEXT: LazyLock<SparseContext> = LazyLock::new(SparseContext::default);

/// Kernels picked for one call.
enum Selected {
    Reference,
    Accelerated(SegmentedKernels, Orientation),
}

#[derive(Clone)]
pub struct SparseContext {
    registry: Arc<DispatchRegistry>,
    options: DispatchOptions,
    sink: Arc<dyn DiagnosticSink>,
}

impl fmt::Debug for SparseContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SparseContext")
            .field("registry", &self.registry)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Default for SparseContext {
    fn default() -> Self {
        Self::new(DispatchOptions::default())
    }
}

impl SparseContext {
    /// Context over the shared default registry, logging fallbacks.
    pub fn new(options: DispatchOptions) -> Self {
        Self {
            registry: DispatchRegistry::global(),
            options,
            sink: Arc::new(LogSink),
        }
    }

    pub fn with_registry(mut self, registry: Arc<DispatchRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    /// The context used by the free functions in [`ops`](crate::ops) and the
    /// [`CooMatrix`] methods.
    pub fn global() -> &'static SparseContext {
        &GLOBAL_CONTEXT
    }

    pub fn options(&self) -> &DispatchOptions {
        &self.options
    }

    pub fn registry(&self) -> &DispatchRegistry {
        &self.registry
    }

    fn kernels(&self, family: KernelFamily) -> SegmentedKernels {
        match family {
            KernelFamily::Segmented => SegmentedKernels::sequential(),
            KernelFamily::Threaded => SegmentedKernels::threaded(self.options.parallel_threshold),
        }
    }

    fn lower(&self, kind: PrimitiveKind, dtype: DType, spinfo: Option<&CooInfo>) -> Selected {
        let (platform, lowering) = self.registry.resolve(kind, self.options.platform);
        match plan(lowering, dtype, spinfo) {
            LoweringPlan::Reference => {
                log::debug!("{kind}: reference kernels (platform={platform}, dtype={dtype})");
                Selected::Reference
            }
            LoweringPlan::Accelerated {
                family,
                orientation,
            } => {
                log::debug!("{kind}: {family:?} kernels on {platform}, orientation={orientation:?}");
                Selected::Accelerated(self.kernels(family), orientation)
            }
            LoweringPlan::Fallback(reason) => {
                if self.options.report_fallbacks {
                    self.sink.report(&Diagnostic {
                        primitive: kind,
                        platform,
                        reason,
                    });
                }
                Selected::Reference
            }
        }
    }

    pub fn todense_raw<T: Scalar, I: IndexType>(
        &self,
        data: &[T],
        pattern: Pattern<'_, I>,
        spinfo: &CooInfo,
    ) -> Result<Mat<T>> {
        pattern.validate(data.len(), spinfo.shape)?;
        todense::abstract_eval(
            &ShapedArray::of_values(data),
            &ShapedArray::of_indices(pattern.row),
            &ShapedArray::of_indices(pattern.col),
            spinfo,
        )?;
        let out = match self.lower(PrimitiveKind::CooTodense, T::DTYPE, Some(spinfo)) {
            Selected::Reference => ReferenceKernels.todense(data, pattern, spinfo.shape),
            Selected::Accelerated(kernels, Orientation::Rows) => kernels.todense(data, pattern, spinfo.shape),
            Selected::Accelerated(kernels, Orientation::Swapped) => {
                let t = kernels.todense(data, pattern.swapped(), spinfo.transposed().shape);
                transposed(t.as_ref())
            }
        };
        Ok(out)
    }

    pub fn fromdense_raw<T: Scalar, I: IndexType>(
        &self,
        mat: MatRef<'_, T>,
        nse: usize,
    ) -> Result<CooBuffers<T, I>> {
        fromdense::abstract_eval(&ShapedArray::of_mat(mat), nse, I::DTYPE)?;
        match self.lower(PrimitiveKind::CooFromdense, T::DTYPE, None) {
            Selected::Reference => ReferenceKernels.fromdense(mat, nse),
            Selected::Accelerated(kernels, _) => kernels.fromdense(mat, nse),
        }
    }

    pub fn matvec_raw<T: Scalar, I: IndexType>(
        &self,
        data: &[T],
        pattern: Pattern<'_, I>,
        v: &[T],
        spinfo: &CooInfo,
        transpose: bool,
    ) -> Result<Vec<T>> {
        pattern.validate(data.len(), spinfo.shape)?;
        matvec::abstract_eval(
            &ShapedArray::of_values(data),
            &ShapedArray::of_indices(pattern.row),
            &ShapedArray::of_indices(pattern.col),
            &ShapedArray::of_values(v),
            spinfo,
            transpose,
        )?;
        let out = match self.lower(PrimitiveKind::CooMatvec, T::DTYPE, Some(spinfo)) {
            Selected::Reference => ReferenceKernels.matvec(data, pattern, v, spinfo.shape, transpose),
            Selected::Accelerated(kernels, Orientation::Rows) => {
                kernels.matvec(data, pattern, v, spinfo.shape, transpose)
            }
            Selected::Accelerated(kernels, Orientation::Swapped) => {
                kernels.matvec(data, pattern.swapped(), v, spinfo.transposed().shape, !transpose)
            }
        };
        Ok(out)
    }

    pub fn matmat_raw<T: Scalar, I: IndexType>(
        &self,
        data: &[T],
        pattern: Pattern<'_, I>,
        b: MatRef<'_, T>,
        spinfo: &CooInfo,
        transpose: bool,
    ) -> Result<Mat<T>> {
        pattern.validate(data.len(), spinfo.shape)?;
        matmat::abstract_eval(
            &ShapedArray::of_values(data),
            &ShapedArray::of_indices(pattern.row),
            &ShapedArray::of_indices(pattern.col),
            &ShapedArray::of_mat(b),
            spinfo,
            transpose,
        )?;
        let out = match self.lower(PrimitiveKind::CooMatmat, T::DTYPE, Some(spinfo)) {
            Selected::Reference => ReferenceKernels.matmat(data, pattern, b, spinfo.shape, transpose),
            Selected::Accelerated(kernels, Orientation::Rows) => {
                kernels.matmat(data, pattern, b, spinfo.shape, transpose)
            }
            Selected::Accelerated(kernels, Orientation::Swapped) => {
                kernels.matmat(data, pattern.swapped(), b, spinfo.transposed().shape, !transpose)
            }
        };
        Ok(out)
    }

    pub fn todense<T: Scalar, I: IndexType>(&self, mat: &CooMatrix<T, I>) -> Result<Mat<T>> {
        self.todense_raw(mat.data(), mat.pattern(), &mat.info())
    }

    /// Converts `mat`, keeping `nse` entries or, when `None`, every nonzero.
    pub fn fromdense<T: Scalar, I: IndexType>(
        &self,
        mat: MatRef<'_, T>,
        nse: Option<usize>,
    ) -> Result<CooMatrix<T, I>> {
        let nse = nse.unwrap_or_else(|| count_nonzero(mat));
        let buffers = self.fromdense_raw(mat, nse)?;
        // padding at (0, 0) follows the later rows
        let rows_sorted = Pattern::new(&buffers.1, &buffers.2).is_row_sorted();
        let info = CooInfo::new((mat.nrows(), mat.ncols())).with_rows_sorted(rows_sorted);
        CooMatrix::unflatten(buffers, info)
    }

    pub fn matvec<T: Scalar, I: IndexType>(
        &self,
        mat: &CooMatrix<T, I>,
        v: &[T],
        transpose: bool,
    ) -> Result<Vec<T>> {
        self.matvec_raw(mat.data(), mat.pattern(), v, &mat.info(), transpose)
    }

    pub fn matmat<T: Scalar, I: IndexType>(
        &self,
        mat: &CooMatrix<T, I>,
        b: MatRef<'_, T>,
        transpose: bool,
    ) -> Result<Mat<T>> {
        self.matmat_raw(mat.data(), mat.pattern(), b, &mat.info(), transpose)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{FallbackReason, Platform, RecordingSink};
    use crate::error::CooError;
    use crate::matrix::dense::{from_row_major, to_rows};

    fn recording(platform: Platform) -> (SparseContext, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::new());
        let ctx = SparseContext::new(DispatchOptions::default().with_platform(platform))
            .with_sink(sink.clone());
        (ctx, sink)
    }

    #[test]
    fn unsorted_input_falls_back_and_reports() {
        let (ctx, sink) = recording(Platform::Threaded);
        let (row, col) = ([1i32, 0], [0i32, 1]);
        let out = ctx
            .todense_raw(&[2.0f64, 3.0], Pattern::new(&row, &col), &CooInfo::new((2, 2)))
            .unwrap();
        assert_eq!(to_rows(out.as_ref()), vec![vec![0.0, 3.0], vec![2.0, 0.0]]);
        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].primitive, PrimitiveKind::CooTodense);
        assert_eq!(events[0].platform, Platform::Threaded);
        assert_eq!(events[0].reason, FallbackReason::UnsortedLayout);
    }

    #[test]
    fn integer_values_report_dtype() {
        let (ctx, sink) = recording(Platform::Segmented);
        let (row, col) = ([0i32, 1], [0i32, 1]);
        let info = CooInfo::new((2, 2)).with_rows_sorted(true);
        let y = ctx
            .matvec_raw(&[2i64, 3], Pattern::new(&row, &col), &[1, 1], &info, false)
            .unwrap();
        assert_eq!(y, vec![2, 3]);
        assert_eq!(
            sink.events()[0].reason,
            FallbackReason::UnsupportedDtype(DType::I64)
        );
    }

    #[test]
    fn silenced_reports_keep_results() {
        let sink = Arc::new(RecordingSink::new());
        let ctx = SparseContext::new(DispatchOptions::default().with_report_fallbacks(false))
            .with_sink(sink.clone());
        let (row, col) = ([1i32, 0], [0i32, 1]);
        let y = ctx
            .matvec_raw(&[2.0f32, 3.0], Pattern::new(&row, &col), &[1.0, 1.0], &CooInfo::new((2, 2)), false)
            .unwrap();
        assert_eq!(y, vec![3.0, 2.0]);
        assert!(sink.events().is_empty());
    }

    #[test]
    fn column_sorted_input_is_swapped() {
        let (ctx, sink) = recording(Platform::Threaded);
        // [[1, 0, 4],
        //  [2, 3, 0]] in column-major order
        let data = [1.0f64, 2.0, 3.0, 4.0];
        let row = [0i32, 1, 1, 0];
        let col = [0i32, 0, 1, 2];
        let info = CooInfo::new((2, 3)).with_cols_sorted(true);
        let p = Pattern::new(&row, &col);
        let dense = ctx.todense_raw(&data, p, &info).unwrap();
        assert_eq!(to_rows(dense.as_ref()), vec![vec![1.0, 0.0, 4.0], vec![2.0, 3.0, 0.0]]);
        assert_eq!(ctx.matvec_raw(&data, p, &[1.0, 1.0, 1.0], &info, false).unwrap(), vec![5.0, 5.0]);
        assert_eq!(ctx.matvec_raw(&data, p, &[1.0, 2.0], &info, true).unwrap(), vec![5.0, 6.0, 4.0]);
        let b = from_row_major(3, 1, &[1.0, 0.0, 1.0]);
        let c = ctx.matmat_raw(&data, p, b.as_ref(), &info, false).unwrap();
        assert_eq!(to_rows(c.as_ref()), vec![vec![5.0], vec![2.0]]);
        assert!(sink.events().is_empty());
    }

    #[test]
    fn validation_precedes_dispatch() {
        let ctx = SparseContext::default();
        let (row, col) = ([0i32, 5], [0i32, 0]);
        let err = ctx
            .todense_raw(&[1.0f64, 1.0], Pattern::new(&row, &col), &CooInfo::new((2, 2)))
            .unwrap_err();
        assert!(matches!(err, CooError::IndexOutOfBounds { index: 1, row: 5, .. }));
        let err = ctx
            .matvec_raw(&[1.0f64], Pattern::new(&row, &col), &[1.0, 1.0], &CooInfo::new((6, 2)), false)
            .unwrap_err();
        assert_eq!(err, CooError::LengthMismatch { data: 1, row: 2, col: 2 });
    }

    #[test]
    fn fromdense_sets_row_hint() {
        let m = from_row_major(2, 2, &[0.0f64, 1.0, 2.0, 0.0]);
        let coo: CooMatrix<f64> = SparseContext::global().fromdense(m.as_ref(), None).unwrap();
        assert_eq!(coo.nse(), 2);
        assert!(coo.rows_sorted());
        assert!(!coo.cols_sorted());

        let padded: CooMatrix<f64> = SparseContext::global().fromdense(m.as_ref(), Some(4)).unwrap();
        assert_eq!(padded.row(), &[0, 1, 0, 0]);
        assert!(!padded.rows_sorted());
        let row_zero_only = from_row_major(2, 2, &[1.0f64, 0.0, 0.0, 0.0]);
        let padded: CooMatrix<f64> = SparseContext::global().fromdense(row_zero_only.as_ref(), Some(3)).unwrap();
        assert!(padded.rows_sorted());
    }
}
