//! Tests for backend dispatch: every platform and layout must give the reference results,
//! and each bypassed accelerated lowering must be reported exactly once with its reason.

use std::sync::Arc;

use approx::assert_abs_diff_eq;
use faer::Mat;
use num_complex::Complex64;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use spcoo::dispatch::{AcceleratedLowering, KernelFamily, Lowering, RegistryBuilder};
use spcoo::matrix::dense::{count_nonzero, to_rows};
use spcoo::{
    CooError, CooInfo, CooMatrix, DType, DTypeSet, DispatchOptions, DispatchRegistry, FallbackReason, Platform,
    PrimitiveKind, RecordingSink, SparseContext,
};

const PLATFORMS: [Platform; 3] = [Platform::Reference, Platform::Segmented, Platform::Threaded];

fn context(platform: Platform) -> (SparseContext, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::new());
    let options = DispatchOptions::default()
        .with_platform(platform)
        .with_parallel_threshold(1);
    (SparseContext::new(options).with_sink(sink.clone()), sink)
}

/// Random unsorted COO matrix with duplicates.
fn random_coo(rng: &mut StdRng, shape: (usize, usize), nse: usize) -> CooMatrix<f64> {
    let data = (0..nse).map(|_| rng.gen_range(-1.0..1.0)).collect();
    let row = (0..nse).map(|_| rng.gen_range(0..shape.0 as i32)).collect();
    let col = (0..nse).map(|_| rng.gen_range(0..shape.1 as i32)).collect();
    CooMatrix::new(data, row, col, shape).unwrap()
}

/// The same entries, column-major, hinted `cols_sorted`.
fn col_sorted(m: &CooMatrix<f64>) -> CooMatrix<f64> {
    let sorted = m.transpose().sort_indices().transpose();
    assert!(sorted.cols_sorted() && !sorted.rows_sorted());
    sorted
}

fn assert_close(a: &[f64], b: &[f64]) {
    assert_eq!(a.len(), b.len());
    for (x, y) in a.iter().zip(b) {
        assert_abs_diff_eq!(*x, *y, epsilon = 1e-12);
    }
}

fn assert_mat_close(a: &Mat<f64>, b: &Mat<f64>) {
    assert_eq!((a.nrows(), a.ncols()), (b.nrows(), b.ncols()));
    for (ra, rb) in to_rows(a.as_ref()).iter().zip(&to_rows(b.as_ref())) {
        assert_close(ra, rb);
    }
}

#[test]
fn every_layout_and_platform_agrees() {
    let mut rng = StdRng::seed_from_u64(42);
    let unsorted = random_coo(&mut rng, (6, 5), 20);
    let (reference, _) = context(Platform::Reference);
    let dense = reference.todense(&unsorted).unwrap();
    let k = count_nonzero(dense.as_ref());
    assert!(k > 5);
    let padded: CooMatrix<f64> = reference.fromdense(dense.as_ref(), Some(k + 4)).unwrap();
    let truncated: CooMatrix<f64> = reference.fromdense(dense.as_ref(), Some(k - 5)).unwrap();
    let layouts = [
        unsorted.clone(),
        unsorted.clone().sort_indices(),
        col_sorted(&unsorted),
        padded,
        truncated,
    ];
    let v5: Vec<f64> = (0..5).map(|_| rng.gen_range(-1.0..1.0)).collect();
    let v6: Vec<f64> = (0..6).map(|_| rng.gen_range(-1.0..1.0)).collect();
    let b = Mat::from_fn(5, 3, |i, j| (i as f64) - 0.5 * (j as f64));
    let bt = Mat::from_fn(6, 2, |i, j| (i * j) as f64 + 1.0);

    for m in &layouts {
        let dense = reference.todense(m).unwrap();
        let y = reference.matvec(m, &v5, false).unwrap();
        let yt = reference.matvec(m, &v6, true).unwrap();
        let c = reference.matmat(m, b.as_ref(), false).unwrap();
        let ct = reference.matmat(m, bt.as_ref(), true).unwrap();
        for platform in PLATFORMS {
            let (ctx, _) = context(platform);
            assert_mat_close(&ctx.todense(m).unwrap(), &dense);
            assert_close(&ctx.matvec(m, &v5, false).unwrap(), &y);
            assert_close(&ctx.matvec(m, &v6, true).unwrap(), &yt);
            assert_mat_close(&ctx.matmat(m, b.as_ref(), false).unwrap(), &c);
            assert_mat_close(&ctx.matmat(m, bt.as_ref(), true).unwrap(), &ct);
        }
    }
}

/// Padding lands at `(0, 0)` after the later rows, so a padded result is not row-sorted and
/// must not reach the row-run kernels as if it were.
#[test]
fn padded_fromdense_is_not_hinted_sorted() {
    let diag = Mat::from_fn(3, 3, |i, j| if i == j { (i + 1) as f64 } else { 0.0 });
    let b = Mat::from_fn(3, 2, |i, j| (i + 2 * j) as f64);
    let expected = Mat::from_fn(3, 2, |i, j| diag[(i, i)] * b[(i, j)]);
    for platform in PLATFORMS {
        let (ctx, sink) = context(platform);
        let padded: CooMatrix<f64> = ctx.fromdense(diag.as_ref(), Some(5)).unwrap();
        assert_eq!(padded.row(), &[0, 1, 2, 0, 0]);
        assert!(!padded.rows_sorted());
        let sorted = padded.clone().sort_indices();
        assert_eq!(sorted.row(), &[0, 0, 0, 1, 2]);
        for m in [&padded, &sorted] {
            assert_mat_close(&ctx.todense(m).unwrap(), &diag);
            assert_close(&ctx.matvec(m, &[1.0; 3], false).unwrap(), &[1.0, 2.0, 3.0]);
            assert_close(&ctx.matvec(m, &[1.0; 3], true).unwrap(), &[1.0, 2.0, 3.0]);
            assert_mat_close(&ctx.matmat(m, b.as_ref(), false).unwrap(), &expected);
        }
        // only the unsorted pass falls back
        let events = sink.events();
        match platform {
            Platform::Reference => assert!(events.is_empty()),
            _ => assert!(!events.is_empty() && events.iter().all(|d| d.reason == FallbackReason::UnsortedLayout)),
        }
    }
}

#[test]
fn sorted_inputs_report_nothing() {
    let mut rng = StdRng::seed_from_u64(5);
    let m = random_coo(&mut rng, (4, 4), 9);
    for platform in PLATFORMS {
        let (ctx, sink) = context(platform);
        for layout in [m.clone().sort_indices(), col_sorted(&m)] {
            ctx.todense(&layout).unwrap();
            ctx.matvec(&layout, &[1.0; 4], false).unwrap();
        }
        let dense = ctx.todense(&m.clone().sort_indices()).unwrap();
        let _: CooMatrix<f64, i64> = ctx.fromdense(dense.as_ref(), None).unwrap();
        assert!(sink.events().is_empty(), "{platform}: {:?}", sink.events());
    }
}

#[test]
fn unsorted_inputs_report_layout() {
    let mut rng = StdRng::seed_from_u64(6);
    let m = random_coo(&mut rng, (4, 3), 7);
    let (ctx, sink) = context(Platform::Segmented);
    ctx.todense(&m).unwrap();
    ctx.matvec(&m, &[1.0; 3], false).unwrap();
    ctx.matmat(&m, Mat::from_fn(3, 2, |_, _| 1.0).as_ref(), false).unwrap();
    let events = sink.events();
    let kinds: Vec<PrimitiveKind> = events.iter().map(|d| d.primitive).collect();
    assert_eq!(
        kinds,
        vec![PrimitiveKind::CooTodense, PrimitiveKind::CooMatvec, PrimitiveKind::CooMatmat]
    );
    assert!(events.iter().all(|d| d.reason == FallbackReason::UnsortedLayout));
    assert!(events.iter().all(|d| d.platform == Platform::Segmented));

    // nothing is registered to fall back from on the reference platform
    let (reference, quiet) = context(Platform::Reference);
    reference.todense(&m).unwrap();
    assert!(quiet.events().is_empty());
}

#[test]
fn integer_values_report_dtype() {
    let (ctx, sink) = context(Platform::Threaded);
    let m = CooMatrix::<i32>::new(vec![2, 3], vec![0, 1], vec![1, 0], (2, 2))
        .unwrap()
        .sort_indices();
    assert_eq!(ctx.matvec(&m, &[1, 10], false).unwrap(), vec![20, 3]);
    let events = sink.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].reason, FallbackReason::UnsupportedDtype(DType::I32));
    assert!(events[0].to_string().contains("dtype=int32"));
}

#[test]
fn complex_values_are_accelerated() {
    let (ctx, sink) = context(Platform::Threaded);
    let i = Complex64::new(0.0, 1.0);
    let one = Complex64::new(1.0, 0.0);
    let m = CooMatrix::<Complex64>::new(vec![i, one], vec![0, 1], vec![1, 1], (2, 2))
        .unwrap()
        .sort_indices();
    let y = ctx.matvec(&m, &[one, i], false).unwrap();
    assert_eq!(y, vec![i * i, i]);
    assert!(sink.events().is_empty());
}

#[test]
fn custom_registry_restricts_dtypes() {
    let registry = RegistryBuilder::new()
        .register(
            PrimitiveKind::CooMatvec,
            Platform::Segmented,
            Lowering::Accelerated(AcceleratedLowering {
                family: KernelFamily::Segmented,
                dtypes: DTypeSet::F64,
                requires_sorted: true,
            }),
        )
        .unwrap()
        .build();
    let (ctx, sink) = context(Platform::Segmented);
    let ctx = ctx.with_registry(Arc::new(registry));
    let m32 = CooMatrix::<f32>::eye(3, 3, 0).unwrap();
    let m64 = CooMatrix::<f64>::eye(3, 3, 0).unwrap();
    ctx.matvec(&m32, &[1.0; 3], false).unwrap();
    ctx.matvec(&m64, &[1.0; 3], false).unwrap();
    // todense has no segmented entry in this registry, so it resolves to the reference
    ctx.todense(&m64).unwrap();
    let events = sink.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].reason, FallbackReason::UnsupportedDtype(DType::F32));
}

#[test]
fn duplicate_lowering_is_rejected() {
    let lowering = Lowering::Accelerated(AcceleratedLowering {
        family: KernelFamily::Threaded,
        dtypes: DTypeSet::INEXACT,
        requires_sorted: true,
    });
    let err = RegistryBuilder::new()
        .register(PrimitiveKind::CooTodense, Platform::Threaded, lowering)
        .and_then(|b| b.register(PrimitiveKind::CooTodense, Platform::Threaded, lowering))
        .unwrap_err();
    assert_eq!(
        err,
        CooError::DuplicateLowering {
            primitive: "coo_todense",
            platform: "threaded"
        }
    );
    assert_eq!(DispatchRegistry::global().platforms(PrimitiveKind::CooTodense).len(), 3);
}

#[test]
fn silenced_fallbacks_change_nothing() {
    let mut rng = StdRng::seed_from_u64(8);
    let m = random_coo(&mut rng, (5, 5), 12);
    let v: Vec<f64> = (0..5).map(|i| i as f64).collect();
    let (loud, loud_sink) = context(Platform::Threaded);
    let sink = Arc::new(RecordingSink::new());
    let quiet = SparseContext::new(DispatchOptions::default().with_report_fallbacks(false)).with_sink(sink.clone());
    assert_eq!(loud.matvec(&m, &v, false).unwrap(), quiet.matvec(&m, &v, false).unwrap());
    assert_eq!(loud_sink.events().len(), 1);
    assert!(sink.events().is_empty());
    assert_eq!(CooInfo::new((5, 5)), m.info());
}
