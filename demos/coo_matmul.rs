//! Builds a small COO matrix, multiplies it through each platform and prints the fallback
//! diagnostics collected along the way.
//!
//! Diagnostics are gathered in a `RecordingSink` instead of the log.

use std::sync::Arc;

use faer::Mat;
use spcoo::{CooMatrix, DispatchOptions, Operand, Platform, RecordingSink, SparseContext, coo_fromdense};

fn main() -> spcoo::Result<()> {
    let dense = Mat::from_fn(4, 4, |i, j| match (i as isize) - (j as isize) {
        0 => 2.0,
        -1 | 1 => -1.0,
        _ => 0.0,
    });
    let a: CooMatrix<f64> = coo_fromdense(dense.as_ref(), None)?;
    println!("nse={} shape={:?} rows_sorted={}", a.nse(), a.shape(), a.rows_sorted());

    let x = [1.0, 2.0, 3.0, 4.0];
    if let Some(y) = a.matmul(Operand::Vector(&x))?.into_vector() {
        println!("A x = {y:?}");
    }

    // the transposed copy is only column-sorted, so the kernels see it swapped
    let at = a.transpose();
    let sink = Arc::new(RecordingSink::new());
    for platform in [Platform::Reference, Platform::Segmented, Platform::Threaded] {
        let ctx = SparseContext::new(DispatchOptions::default().with_platform(platform)).with_sink(sink.clone());
        println!("{platform}: A^T x = {:?}", ctx.matvec(&at, &x, false)?);
    }

    // an unsorted matrix falls back to the reference kernels
    let unsorted = CooMatrix::<f64>::new(vec![1.0, 1.0], vec![1, 0], vec![0, 1], (2, 2))?;
    let ctx = SparseContext::default().with_sink(sink.clone());
    println!("unsorted: {:?}", ctx.matvec(&unsorted, &[1.0, 2.0], false)?);
    for diagnostic in sink.events() {
        println!("diagnostic: {diagnostic}");
    }
    Ok(())
}
