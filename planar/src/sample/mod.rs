//! Adaptive sampling along one axis
//!
//! The domain is split into uniform base intervals, then each interval is
//! recursively halved wherever the estimated slope on either side of its
//! midpoint exceeds a threshold.  This places samples densely around steep
//! regions and discontinuities while leaving flat regions at the base
//! resolution.
//!
//! ```
//! use planar::sample::{Domain, SampleSettings, adaptive_samples};
//!
//! let settings = SampleSettings {
//!     base_samples: 5,
//!     max_depth: 4,
//!     threshold: 1.0,
//! };
//! let domain = Domain::new(-1.0, 1.0)?;
//! let flat = adaptive_samples(&|_x: f64| 1.0, domain, &settings, None)?;
//! assert_eq!(flat.as_slice(), &[-1.0, -0.5, 0.0, 0.5, 1.0]);
//!
//! let step = adaptive_samples(
//!     &|x: f64| if x < 0.1 { 0.0 } else { 1.0 },
//!     domain,
//!     &settings,
//!     None,
//! )?;
//! assert!(step.len() > flat.len());
//! # Ok::<(), planar::Error>(())
//! ```
mod config;

pub use config::{MAX_DEPTH, SampleSettings, ThreadPool};

use crate::Error;
use ordered_float::OrderedFloat;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Added to interval widths when estimating slopes
const SLOPE_EPSILON: f64 = 1e-6;

/// Relative tolerance (as a fraction of the domain width) for merging samples
const MERGE_TOLERANCE: f64 = 1e-12;

/// A one-dimensional function which can be sampled from many threads
///
/// Each worker thread owns one `Data` value, which the function may use as
/// scratch space (e.g. an evaluator stack).
pub trait SampleFn: Sync {
    /// Per-thread scratch data
    type Data: Default + Send;

    /// Evaluates the function at `t`, returning `NaN` if it is undefined
    fn eval(&self, t: f64, data: &mut Self::Data) -> f64;
}

impl<F: Fn(f64) -> f64 + Sync> SampleFn for F {
    type Data = ();
    fn eval(&self, t: f64, _data: &mut ()) -> f64 {
        self(t)
    }
}

/// A range of values along one axis, with `min < max`
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 2]", into = "[f64; 2]")]
pub struct Domain {
    min: f64,
    max: f64,
}

impl Domain {
    /// Builds a new domain, checking that bounds are finite and ordered
    ///
    /// The width `max - min` must also be finite, so bounds near `f64::MAX`
    /// with opposite signs are rejected.
    pub fn new(min: f64, max: f64) -> Result<Self, Error> {
        // Comparisons with NaN are false, and an infinite bound gives an
        // infinite width
        if min < max && (max - min).is_finite() {
            Ok(Self { min, max })
        } else {
            Err(Error::BadDomain { min, max })
        }
    }

    /// Lower bound
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Upper bound
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Distance between the bounds
    pub fn width(&self) -> f64 {
        self.max - self.min
    }

    /// Returns the `i`th of `n` evenly spaced points, including both bounds
    fn base_point(&self, i: usize, n: usize) -> f64 {
        if i + 1 >= n {
            self.max
        } else {
            self.min + self.width() * (i as f64 / (n - 1) as f64)
        }
    }
}

impl Default for Domain {
    /// Returns the domain `[-25, 25]`
    fn default() -> Self {
        Self {
            min: -25.0,
            max: 25.0,
        }
    }
}

impl TryFrom<[f64; 2]> for Domain {
    type Error = Error;
    fn try_from([min, max]: [f64; 2]) -> Result<Self, Error> {
        Self::new(min, max)
    }
}

impl From<Domain> for [f64; 2] {
    fn from(d: Domain) -> Self {
        [d.min, d.max]
    }
}

/// Ascending, deduplicated sample coordinates along one axis
///
/// The set always begins with the domain's lower bound and ends with its
/// upper bound.
#[derive(Clone, Debug, PartialEq)]
pub struct SampleSet(Vec<f64>);

impl SampleSet {
    /// Returns the coordinates as a slice
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

impl std::ops::Deref for SampleSet {
    type Target = [f64];
    fn deref(&self) -> &[f64] {
        &self.0
    }
}

/// Interval awaiting subdivision, with function values at both ends
#[derive(Copy, Clone, Debug)]
struct Task {
    x0: f64,
    x1: f64,
    y0: f64,
    y1: f64,
    depth: u8,
}

/// Per-thread state for subdivision
struct Worker<D> {
    data: D,
    todo: Vec<Task>,
}

impl<D: Default> Default for Worker<D> {
    fn default() -> Self {
        Self {
            data: D::default(),
            todo: vec![],
        }
    }
}

impl<D> Worker<D> {
    /// Subdivides a single base interval, returning the left edge of every
    /// terminal sub-interval in ascending order
    fn subdivide<F: SampleFn<Data = D>>(
        &mut self,
        f: &F,
        x0: f64,
        x1: f64,
        settings: &SampleSettings,
    ) -> Vec<f64> {
        let mut out = vec![];
        let y0 = f.eval(x0, &mut self.data);
        let y1 = f.eval(x1, &mut self.data);
        self.todo.clear();
        self.todo.push(Task {
            x0,
            x1,
            y0,
            y1,
            depth: 0,
        });
        while let Some(t) = self.todo.pop() {
            if t.depth >= settings.max_depth {
                out.push(t.x0);
                continue;
            }
            let x_mid = (t.x0 + t.x1) * 0.5;
            let y_mid = f.eval(x_mid, &mut self.data);

            let left = ((y_mid - t.y0) / (x_mid - t.x0 + SLOPE_EPSILON)).abs();
            let right = ((t.y1 - y_mid) / (t.x1 - x_mid + SLOPE_EPSILON)).abs();

            // NaN slopes compare false, so undefined regions aren't refined
            if left > settings.threshold || right > settings.threshold {
                // Push the right half first so the left half is popped first
                self.todo.push(Task {
                    x0: x_mid,
                    x1: t.x1,
                    y0: y_mid,
                    y1: t.y1,
                    depth: t.depth + 1,
                });
                self.todo.push(Task {
                    x0: t.x0,
                    x1: x_mid,
                    y0: t.y0,
                    y1: y_mid,
                    depth: t.depth + 1,
                });
            } else {
                out.push(t.x0);
            }
        }
        out
    }
}

/// Picks adaptive sample coordinates for `f` over the given domain
///
/// Base intervals are subdivided independently; if `threads` is provided,
/// they're distributed across that pool, otherwise everything runs on the
/// calling thread.  The output is identical in either case.
///
/// The result contains at most
/// [`settings.max_samples()`](SampleSettings::max_samples) coordinates.
pub fn adaptive_samples<F: SampleFn>(
    f: &F,
    domain: Domain,
    settings: &SampleSettings,
    threads: Option<&ThreadPool>,
) -> Result<SampleSet, Error> {
    settings.validate()?;
    let start = std::time::Instant::now();

    let n = settings.base_samples;
    let interval = |w: &mut Worker<F::Data>, i: usize| {
        w.subdivide(
            f,
            domain.base_point(i, n),
            domain.base_point(i + 1, n),
            settings,
        )
    };
    let chunks: Vec<Vec<f64>> = match threads {
        Some(pool) => pool.run(|| {
            (0..n - 1)
                .into_par_iter()
                .map_init(Worker::default, interval)
                .collect()
        }),
        None => {
            let mut w = Worker::default();
            (0..n - 1).map(|i| interval(&mut w, i)).collect()
        }
    };

    let mut samples: Vec<f64> = chunks.into_iter().flatten().collect();
    samples.sort_unstable_by_key(|v| OrderedFloat(*v));

    let tol = domain.width() * MERGE_TOLERANCE;
    samples.dedup_by(|a, b| (*a - *b).abs() <= tol);
    while samples.last().is_some_and(|v| domain.max - v <= tol) {
        samples.pop();
    }
    samples.push(domain.max);

    log::debug!(
        "picked {} samples over [{}, {}] in {:?}",
        samples.len(),
        domain.min,
        domain.max,
        start.elapsed()
    );
    Ok(SampleSet(samples))
}

#[cfg(test)]
mod test {
    use super::*;

    fn settings(
        base_samples: usize,
        max_depth: u8,
        threshold: f64,
    ) -> SampleSettings {
        SampleSettings {
            base_samples,
            max_depth,
            threshold,
        }
    }

    fn check_invariants(
        s: &SampleSet,
        domain: Domain,
        settings: &SampleSettings,
    ) {
        assert_eq!(s.first(), Some(&domain.min()));
        assert_eq!(s.last(), Some(&domain.max()));
        assert!(s.windows(2).all(|w| w[0] < w[1]), "not strictly ascending");
        assert!(s.len() <= settings.max_samples());
    }

    #[test]
    fn test_flat_function_is_uniform() {
        let domain = Domain::new(0.0, 8.0).unwrap();
        let cfg = settings(9, 5, 1.0);
        let s = adaptive_samples(&|x: f64| 0.5 * x, domain, &cfg, None).unwrap();
        let expected: Vec<f64> = (0..=8).map(|i| i as f64).collect();
        assert_eq!(s.as_slice(), expected.as_slice());
    }

    #[test]
    fn test_refines_near_discontinuity() {
        let domain = Domain::new(-1.0, 1.0).unwrap();
        let cfg = settings(9, 6, 5.0);
        let s = adaptive_samples(&|x: f64| 1.0 / x, domain, &cfg, None).unwrap();
        check_invariants(&s, domain, &cfg);

        let near = s.iter().filter(|x| x.abs() < 0.25).count();
        let far = s.iter().filter(|x| x.abs() > 0.75).count();
        assert!(near > far, "expected denser sampling near 0 ({near} vs {far})");
    }

    #[test]
    fn test_worst_case_bound() {
        // Every branch recurses to the maximum depth
        let domain = Domain::new(-3.0, 3.0).unwrap();
        let cfg = settings(4, 3, 1e-9);
        let s = adaptive_samples(&|x: f64| 1e6 * x, domain, &cfg, None).unwrap();
        assert_eq!(s.len(), cfg.max_samples());
        check_invariants(&s, domain, &cfg);
    }

    #[test]
    fn test_nan_is_not_refined() {
        let domain = Domain::new(0.0, 1.0).unwrap();
        let cfg = settings(5, 8, 0.1);
        let s = adaptive_samples(&|_x: f64| f64::NAN, domain, &cfg, None).unwrap();
        assert_eq!(s.as_slice(), &[0.0, 0.25, 0.5, 0.75, 1.0]);
    }

    #[test]
    fn test_idempotent_and_thread_independent() {
        let domain = Domain::new(-25.0, 25.0).unwrap();
        let cfg = settings(200, 6, 5.0);
        let f = |x: f64| (x * 3.0).tan();
        let a = adaptive_samples(&f, domain, &cfg, None).unwrap();
        let b = adaptive_samples(&f, domain, &cfg, None).unwrap();
        assert_eq!(a, b);

        let pool = ThreadPool::Custom(
            rayon::ThreadPoolBuilder::new().num_threads(4).build().unwrap(),
        );
        let c = adaptive_samples(&f, domain, &cfg, Some(&pool)).unwrap();
        assert_eq!(a, c);
        let d = adaptive_samples(&f, domain, &cfg, Some(&ThreadPool::Global))
            .unwrap();
        assert_eq!(a, d);
        check_invariants(&a, domain, &cfg);
    }

    #[test]
    fn test_bad_settings() {
        let domain = Domain::new(0.0, 1.0).unwrap();
        let f = |x: f64| x;
        assert!(matches!(
            adaptive_samples(&f, domain, &settings(1, 3, 1.0), None),
            Err(Error::BadSampleCount(1))
        ));
        assert!(matches!(
            adaptive_samples(&f, domain, &settings(10, 3, 0.0), None),
            Err(Error::BadThreshold(..))
        ));
    }

    #[test]
    fn test_domain() {
        assert!(Domain::new(0.0, 1.0).is_ok());
        assert!(matches!(
            Domain::new(1.0, 1.0),
            Err(Error::BadDomain { .. })
        ));
        assert!(Domain::new(2.0, 1.0).is_err());
        assert!(Domain::new(f64::NEG_INFINITY, 1.0).is_err());
        assert!(Domain::new(0.0, f64::NAN).is_err());

        // Each bound is finite, but the width overflows
        assert!(matches!(
            Domain::new(-1e308, 1e308),
            Err(Error::BadDomain { .. })
        ));
        let d = Domain::new(-1e308, 0.5e308).unwrap();
        assert!(d.width().is_finite());
        let cfg = settings(5, 2, 1.0);
        let s = adaptive_samples(&|x: f64| x, d, &cfg, None).unwrap();
        check_invariants(&s, d, &cfg);
        assert!(s.iter().all(|x| x.is_finite()));
    }
}
