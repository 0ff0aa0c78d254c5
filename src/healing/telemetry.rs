//! Resource figures attached to every recorded outcome.

use rand::Rng;

/// CPU and memory usage, both in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadSample {
    pub cpu_usage: f64,
    pub memory_usage: f64,
}

/// Source of the resource figures fed to the prediction model.
pub trait LoadSampler: Send + Sync {
    fn sample(&self) -> LoadSample;
}

/// Draws cpu from [0.1, 0.9) and memory from [0.1, 0.8).
///
/// The proxy has no view of backend resources, so these are placeholders
/// until instances report real figures.
#[derive(Debug, Default, Clone, Copy)]
pub struct SyntheticLoad;

impl LoadSampler for SyntheticLoad {
    fn sample(&self) -> LoadSample {
        let mut rng = rand::thread_rng();
        LoadSample {
            cpu_usage: rng.gen_range(0.1..0.9),
            memory_usage: rng.gen_range(0.1..0.8),
        }
    }
}

/// Always reports the same figures.
#[derive(Debug, Clone, Copy)]
pub struct FixedLoad(pub LoadSample);

impl LoadSampler for FixedLoad {
    fn sample(&self) -> LoadSample {
        self.0
    }
}
