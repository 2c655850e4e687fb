//! Row-segmented kernels for row-sorted COO input.
//!
//! With rows sorted, the entries of each row form one contiguous run, so the pattern can be
//! walked like a CSR matrix: `ptr[r]..ptr[r + 1]` are the entries of row `r`. Each output row
//! is then owned by exactly one run, which lets the untransposed products and `todense`
//! write disjoint rows in parallel. Transposed products scatter into columns and are reduced
//! from per-thread partial sums instead.
//!
//! Work is split across rayon's pool when the `rayon` feature is on and the call has at least
//! `parallel_threshold` units of work; otherwise the same code runs sequentially.

use faer::{Mat, MatRef};
#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::core::{IndexType, Scalar};
use crate::dispatch::kernels::CooKernels;
use crate::error::Result;
use crate::matrix::dense::from_row_major;
use crate::matrix::info::{CooBuffers, Pattern};
use crate::primitive::fromdense::assemble;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SegmentedKernels {
    parallel_threshold: usize,
}

impl SegmentedKernels {
    /// Never splits work.
    pub fn sequential() -> Self {
        Self {
            parallel_threshold: usize::MAX,
        }
    }

    /// Splits calls with at least `parallel_threshold` units of work across threads.
    pub fn threaded(parallel_threshold: usize) -> Self {
        Self { parallel_threshold }
    }

    pub fn runs_parallel(&self, work: usize) -> bool {
        cfg!(feature = "rayon") && work >= self.parallel_threshold
    }

    /// Calls `f(r, chunk)` for each `width`-long chunk of `buf`.
    fn for_each_row<T: Send>(
        &self,
        buf: &mut [T],
        width: usize,
        work: usize,
        f: impl Fn(usize, &mut [T]) + Sync + Send,
    ) {
        if width == 0 {
            return;
        }
        if self.runs_parallel(work) {
            #[cfg(feature = "rayon")]
            {
                buf.par_chunks_mut(width).enumerate().for_each(|(r, out)| f(r, out));
                return;
            }
        }
        buf.chunks_mut(width).enumerate().for_each(|(r, out)| f(r, out));
    }

    fn map_rows<R: Send>(&self, nrows: usize, work: usize, f: impl Fn(usize) -> R + Sync + Send) -> Vec<R> {
        if self.runs_parallel(work) {
            #[cfg(feature = "rayon")]
            {
                return (0..nrows).into_par_iter().map(f).collect();
            }
        }
        (0..nrows).map(f).collect()
    }

    /// Accumulates `f(acc, r)` over all rows into a zeroed buffer of `len` entries.
    fn fold_rows<T: Scalar>(
        &self,
        nrows: usize,
        len: usize,
        work: usize,
        f: impl Fn(&mut [T], usize) + Sync + Send,
    ) -> Vec<T> {
        if self.runs_parallel(work) {
            #[cfg(feature = "rayon")]
            {
                return (0..nrows)
                    .into_par_iter()
                    .fold(
                        || vec![T::zero(); len],
                        |mut acc, r| {
                            f(&mut acc, r);
                            acc
                        },
                    )
                    .reduce(
                        || vec![T::zero(); len],
                        |mut a, b| {
                            for (x, y) in a.iter_mut().zip(b) {
                                *x += y;
                            }
                            a
                        },
                    );
            }
        }
        let mut acc = vec![T::zero(); len];
        for r in 0..nrows {
            f(&mut acc, r);
        }
        acc
    }
}

impl Default for SegmentedKernels {
    fn default() -> Self {
        Self::sequential()
    }
}

/// Run offsets of a row-sorted index array.
pub fn row_offsets<I: IndexType>(row: &[I], nrows: usize) -> Vec<usize> {
    let mut ptr = vec![0usize; nrows + 1];
    for &r in row {
        ptr[r.index() + 1] += 1;
    }
    for r in 0..nrows {
        ptr[r + 1] += ptr[r];
    }
    ptr
}

impl CooKernels for SegmentedKernels {
    fn todense<T: Scalar, I: IndexType>(
        &self,
        data: &[T],
        pattern: Pattern<'_, I>,
        shape: (usize, usize),
    ) -> Mat<T> {
        let (nrows, ncols) = shape;
        let ptr = row_offsets(pattern.row, nrows);
        let mut buf = vec![T::zero(); nrows * ncols];
        self.for_each_row(&mut buf, ncols, data.len(), |r, out| {
            for p in ptr[r]..ptr[r + 1] {
                out[pattern.col[p].index()] += data[p];
            }
        });
        from_row_major(nrows, ncols, &buf)
    }

    fn fromdense<T: Scalar, I: IndexType>(&self, mat: MatRef<'_, T>, nse: usize) -> Result<CooBuffers<T, I>> {
        let (nrows, ncols) = (mat.nrows(), mat.ncols());
        let zero = T::zero();
        let rows = self.map_rows(nrows, nrows * ncols, |i| {
            (0..ncols)
                .filter_map(|j| {
                    let v = mat[(i, j)];
                    (v != zero).then_some((j, v))
                })
                .collect::<Vec<_>>()
        });
        let entries = rows
            .into_iter()
            .enumerate()
            .flat_map(|(i, entries)| entries.into_iter().map(move |(j, v)| (i, j, v)));
        assemble(entries, nse, (nrows, ncols))
    }

    fn matvec<T: Scalar, I: IndexType>(
        &self,
        data: &[T],
        pattern: Pattern<'_, I>,
        v: &[T],
        shape: (usize, usize),
        transpose: bool,
    ) -> Vec<T> {
        let (nrows, ncols) = shape;
        let ptr = row_offsets(pattern.row, nrows);
        if transpose {
            self.fold_rows(nrows, ncols, data.len(), |acc, r| {
                for p in ptr[r]..ptr[r + 1] {
                    acc[pattern.col[p].index()] += data[p] * v[r];
                }
            })
        } else {
            self.map_rows(nrows, data.len(), |r| {
                let mut acc = T::zero();
                for p in ptr[r]..ptr[r + 1] {
                    acc += data[p] * v[pattern.col[p].index()];
                }
                acc
            })
        }
    }

    fn matmat<T: Scalar, I: IndexType>(
        &self,
        data: &[T],
        pattern: Pattern<'_, I>,
        b: MatRef<'_, T>,
        shape: (usize, usize),
        transpose: bool,
    ) -> Mat<T> {
        let (nrows, ncols) = shape;
        let k = b.ncols();
        let ptr = row_offsets(pattern.row, nrows);
        let work = data.len().saturating_mul(k);
        if transpose {
            let buf = self.fold_rows(nrows, ncols * k, work, |acc, r| {
                for p in ptr[r]..ptr[r + 1] {
                    let c = pattern.col[p].index();
                    for j in 0..k {
                        acc[c * k + j] += data[p] * b[(r, j)];
                    }
                }
            });
            from_row_major(ncols, k, &buf)
        } else {
            let mut buf = vec![T::zero(); nrows * k];
            self.for_each_row(&mut buf, k, work, |r, out| {
                for p in ptr[r]..ptr[r + 1] {
                    let c = pattern.col[p].index();
                    for (j, o) in out.iter_mut().enumerate() {
                        *o += data[p] * b[(c, j)];
                    }
                }
            });
            from_row_major(nrows, k, &buf)
        }
    }
}
