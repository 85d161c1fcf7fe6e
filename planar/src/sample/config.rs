//! Types used in sampling configuration
use crate::Error;
use serde::{Deserialize, Serialize};

/// Hard ceiling on subdivision depth
///
/// Each base interval produces at most `2^MAX_DEPTH` samples.
pub const MAX_DEPTH: u8 = 20;

/// Thread pool to use for multithreaded sampling
///
/// Most users will use the global Rayon pool, but it's possible to provide your
/// own as well.
pub enum ThreadPool {
    /// User-provided pool
    Custom(rayon::ThreadPool),
    /// Global Rayon pool
    Global,
}

impl ThreadPool {
    /// Runs a function across the thread pool
    pub fn run<F: FnOnce() -> V + Send, V: Send>(&self, f: F) -> V {
        match self {
            ThreadPool::Custom(p) => p.install(f),
            ThreadPool::Global => f(),
        }
    }

    /// Returns the number of threads that work will be spread across
    ///
    /// `None` means work runs on the calling thread.
    pub fn count(pool: Option<&Self>) -> usize {
        match pool {
            Some(ThreadPool::Custom(p)) => p.current_num_threads(),
            Some(ThreadPool::Global) => rayon::current_num_threads(),
            None => 1,
        }
    }
}

impl From<rayon::ThreadPool> for ThreadPool {
    fn from(p: rayon::ThreadPool) -> Self {
        ThreadPool::Custom(p)
    }
}

/// Settings for adaptive sampling along one axis
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SampleSettings {
    /// Number of uniformly spaced base samples, including both endpoints
    pub base_samples: usize,

    /// Maximum number of times a base interval may be split in half
    pub max_depth: u8,

    /// Slope magnitude above which an interval is split
    pub threshold: f64,
}

impl Default for SampleSettings {
    fn default() -> Self {
        Self {
            base_samples: 1000,
            max_depth: 6,
            threshold: 5.0,
        }
    }
}

impl SampleSettings {
    /// Checks that these settings describe a bounded amount of work
    pub fn validate(&self) -> Result<(), Error> {
        if self.base_samples < 2 {
            Err(Error::BadSampleCount(self.base_samples))
        } else if self.max_depth > MAX_DEPTH {
            Err(Error::BadDepth(self.max_depth))
        } else if !self.threshold.is_finite() || self.threshold <= 0.0 {
            Err(Error::BadThreshold(self.threshold))
        } else {
            Ok(())
        }
    }

    /// Upper bound on the size of a sample set built with these settings
    pub fn max_samples(&self) -> usize {
        self.base_samples
            .saturating_sub(1)
            .saturating_mul(1usize << self.max_depth.min(MAX_DEPTH))
            .saturating_add(1)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_validate() {
        assert!(SampleSettings::default().validate().is_ok());
        let s = SampleSettings {
            base_samples: 1,
            ..Default::default()
        };
        assert!(matches!(s.validate(), Err(Error::BadSampleCount(1))));
        let s = SampleSettings {
            max_depth: MAX_DEPTH + 1,
            ..Default::default()
        };
        assert!(matches!(s.validate(), Err(Error::BadDepth(..))));
        for threshold in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let s = SampleSettings {
                threshold,
                ..Default::default()
            };
            assert!(matches!(s.validate(), Err(Error::BadThreshold(..))));
        }
    }

    #[test]
    fn test_thread_count() {
        assert_eq!(ThreadPool::count(None), 1);
        let pool = ThreadPool::from(
            rayon::ThreadPoolBuilder::new().num_threads(3).build().unwrap(),
        );
        assert_eq!(ThreadPool::count(Some(&pool)), 3);
        assert_eq!(pool.run(rayon::current_num_threads), 3);
        assert_eq!(
            ThreadPool::count(Some(&ThreadPool::Global)),
            rayon::current_num_threads()
        );
    }

    #[test]
    fn test_max_samples() {
        let s = SampleSettings {
            base_samples: 11,
            max_depth: 3,
            threshold: 1.0,
        };
        assert_eq!(s.max_samples(), 81);
    }
}
