//! Exponential smoothing filter

/// First order exponential moving average.
///
/// Each update moves the estimate a fraction `k` of the way towards the new sample, so a constant
/// input `v` is approached as `v * (1 - (1 - k)^n)` after `n` updates from zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpFilter {
    k: f64,
    value: f64,
}

impl ExpFilter {
    /// New filter starting at zero.
    pub fn new(k: f64) -> Self {
        Self::with_initial(k, 0.0)
    }

    pub fn with_initial(k: f64, value: f64) -> Self {
        Self { k, value }
    }

    /// Feed a sample in and return the new estimate.
    pub fn update(&mut self, sample: f64) -> f64 {
        self.value = self.value * (1.0 - self.k) + sample * self.k;
        self.value
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn k(&self) -> f64 {
        self.k
    }
}
