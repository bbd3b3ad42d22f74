// Stateful scalar filters and their composition
// Copyright © 2025 Hs293Go
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the "Software"),
// to deal in the Software without restriction, including without limitation
// the rights to use, copy, modify, merge, publish, distribute, sublicense,
// and/or sell copies of the Software, and to permit persons to whom the
// Software is furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included
// in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES
// OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT.
// IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM,
// DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT,
// TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE
// OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use num_traits::Float;

use crate::error::ConfigError;

/// A stateful map from one sample of a scalar stream to its filtered value.
///
/// `dt` is the time in seconds since the previous sample. Filters that depend on time (rate
/// limits, time constants) hold their last output when `dt` is zero, negative or not finite.
pub trait Filter<F> {
    /// Feeds one sample through the filter and returns the filtered value
    fn update(&mut self, value: F, dt: F) -> F;

    /// Returns the filter to its freshly constructed state
    fn reset(&mut self) {}

    /// Chains `next` after this filter: samples pass through `self` first, then `next`.
    ///
    /// Chaining is associative, but it is **not** commutative. Rate limiting a step and then
    /// smoothing it gives a different transient than smoothing the step and then rate limiting
    /// the result.
    fn then<B>(self, next: B) -> Then<Self, B>
    where
        Self: Sized,
        B: Filter<F>,
    {
        Then {
            first: self,
            second: next,
        }
    }
}

/// Returns `dt` if it can advance time-based filter state
pub(crate) fn positive_dt<F: Float>(dt: F) -> Option<F> {
    if dt > F::zero() && dt.is_finite() {
        Some(dt)
    } else {
        None
    }
}

/// The pass-through filter, used where no filter has been attached
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Identity;

impl<F> Filter<F> for Identity {
    fn update(&mut self, value: F, _dt: F) -> F {
        value
    }
}

/// Two filters applied in sequence; built by [`Filter::then`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Then<A, B> {
    first: A,
    second: B,
}

impl<A, B> Then<A, B> {
    /// The filter applied first
    pub fn first(&self) -> &A {
        &self.first
    }

    /// The filter applied second
    pub fn second(&self) -> &B {
        &self.second
    }
}

impl<F: Copy, A: Filter<F>, B: Filter<F>> Filter<F> for Then<A, B> {
    fn update(&mut self, value: F, dt: F) -> F {
        let intermediate = self.first.update(value, dt);
        self.second.update(intermediate, dt)
    }

    fn reset(&mut self) {
        self.first.reset();
        self.second.reset();
    }
}

/// Limits how fast the filtered value may change.
///
/// Each call moves the output toward the input by at most `max_rate * dt`. The output starts at
/// zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimit<F> {
    max_rate: F,
    last: F,
}

impl<F: Float> RateLimit<F> {
    /// Creates a rate limiter allowing at most `max_rate` units of change per second.
    ///
    /// An infinite rate disables limiting.
    ///
    /// # Errors
    /// [`ConfigError::InvalidRateLimit`] if `max_rate` is not positive or is NaN.
    pub fn new(max_rate: F) -> Result<Self, ConfigError> {
        if !(max_rate > F::zero()) {
            tracing::debug!("rejected non-positive rate limit");
            return Err(ConfigError::InvalidRateLimit);
        }
        Ok(Self {
            max_rate,
            last: F::zero(),
        })
    }

    /// The maximum change per second
    pub fn max_rate(&self) -> F {
        self.max_rate
    }

    /// The last output
    pub fn value(&self) -> F {
        self.last
    }
}

impl<F: Float> Filter<F> for RateLimit<F> {
    fn update(&mut self, value: F, dt: F) -> F {
        if value.is_nan() {
            return self.last;
        }
        if let Some(dt) = positive_dt(dt) {
            let max_step = self.max_rate * dt;
            let delta = (value - self.last).max(-max_step).min(max_step);
            self.last = self.last + delta;
        }
        self.last
    }

    fn reset(&mut self) {
        self.last = F::zero();
    }
}

/// First-order exponential smoothing.
///
/// `out += (in - out) * dt / (time_constant + dt)`. The output starts at zero, and for a step
/// input it approaches the step monotonically without overshoot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LowPassFilter<F> {
    time_constant: F,
    last: F,
}

impl<F: Float> LowPassFilter<F> {
    /// Creates a low-pass filter with the given time constant in seconds.
    ///
    /// # Errors
    /// [`ConfigError::InvalidTimeConstant`] if `time_constant` is not positive and finite.
    pub fn new(time_constant: F) -> Result<Self, ConfigError> {
        if !(time_constant > F::zero()) || !time_constant.is_finite() {
            tracing::debug!("rejected low-pass time constant");
            return Err(ConfigError::InvalidTimeConstant);
        }
        Ok(Self {
            time_constant,
            last: F::zero(),
        })
    }

    /// The time constant in seconds
    pub fn time_constant(&self) -> F {
        self.time_constant
    }

    /// The weight given to a new sample taken `dt` seconds after the previous one
    pub fn gain(&self, dt: F) -> F {
        positive_dt(dt).map_or_else(F::zero, |dt| dt / (self.time_constant + dt))
    }

    /// The last output
    pub fn value(&self) -> F {
        self.last
    }
}

impl<F: Float> Filter<F> for LowPassFilter<F> {
    fn update(&mut self, value: F, dt: F) -> F {
        if value.is_nan() {
            return self.last;
        }
        self.last = self.last + (value - self.last) * self.gain(dt);
        self.last
    }

    fn reset(&mut self) {
        self.last = F::zero();
    }
}

/// Removes the slowly varying part of a signal: `in - lowpass(in)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HighPassFilter<F> {
    low_pass: LowPassFilter<F>,
    last: F,
}

impl<F: Float> HighPassFilter<F> {
    /// Creates a high-pass filter with the given time constant in seconds.
    ///
    /// # Errors
    /// [`ConfigError::InvalidTimeConstant`] if `time_constant` is not positive and finite.
    pub fn new(time_constant: F) -> Result<Self, ConfigError> {
        Ok(Self {
            low_pass: LowPassFilter::new(time_constant)?,
            last: F::zero(),
        })
    }

    /// The last output
    pub fn value(&self) -> F {
        self.last
    }
}

impl<F: Float> Filter<F> for HighPassFilter<F> {
    fn update(&mut self, value: F, dt: F) -> F {
        if value.is_nan() || positive_dt(dt).is_none() {
            return self.last;
        }
        self.last = value - self.low_pass.update(value, dt);
        self.last
    }

    fn reset(&mut self) {
        self.low_pass.reset();
        self.last = F::zero();
    }
}

/// Mean of the last `N` samples, independent of `dt`.
///
/// Until the window fills up, it averages the samples seen so far.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovingAverage<F, const N: usize> {
    buffer: [F; N],
    next: usize,
    len: usize,
    last: F,
}

impl<F: Float, const N: usize> MovingAverage<F, N> {
    /// Creates an empty moving average over `N` samples.
    ///
    /// # Errors
    /// [`ConfigError::InvalidWindowSize`] if `N` is zero.
    pub fn new() -> Result<Self, ConfigError> {
        if N == 0 {
            return Err(ConfigError::InvalidWindowSize);
        }
        Ok(Self {
            buffer: [F::zero(); N],
            next: 0,
            len: 0,
            last: F::zero(),
        })
    }

    /// Whether the window has seen at least `N` samples
    pub fn is_full(&self) -> bool {
        self.len == N
    }

    /// The last output
    pub fn value(&self) -> F {
        self.last
    }
}

impl<F: Float, const N: usize> Filter<F> for MovingAverage<F, N> {
    fn update(&mut self, value: F, _dt: F) -> F {
        if value.is_nan() {
            return self.last;
        }
        self.buffer[self.next] = value;
        self.next = (self.next + 1) % N;
        self.len = (self.len + 1).min(N);

        // Summing the window every time keeps rounding error from drifting
        let sum = self.buffer[..self.len]
            .iter()
            .fold(F::zero(), |acc, &x| acc + x);
        self.last = sum / F::from(self.len).unwrap_or_else(F::one);
        self.last
    }

    fn reset(&mut self) {
        self.buffer = [F::zero(); N];
        self.next = 0;
        self.len = 0;
        self.last = F::zero();
    }
}

/// Saturates a signal to `[min, max]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Clamp<F> {
    min: F,
    max: F,
}

impl<F: Float> Clamp<F> {
    /// Creates a clamp to `[min, max]`.
    ///
    /// # Errors
    /// [`ConfigError::InvalidClampBounds`] unless `min < max`.
    pub fn new(min: F, max: F) -> Result<Self, ConfigError> {
        if !(min < max) {
            return Err(ConfigError::InvalidClampBounds);
        }
        Ok(Self { min, max })
    }
}

impl<F: Float> Filter<F> for Clamp<F> {
    fn update(&mut self, value: F, _dt: F) -> F {
        value.max(self.min).min(self.max)
    }
}

/// A filter backed by a closure taking `(value, dt)`; built by [`from_fn`]
#[derive(Debug, Clone, Copy)]
pub struct FnFilter<T>(T);

/// Wraps a closure as a filter. The closure keeps whatever state it captures; [`Filter::reset`] is
/// a no-op.
pub fn from_fn<F, T: FnMut(F, F) -> F>(f: T) -> FnFilter<T> {
    FnFilter(f)
}

impl<F, T: FnMut(F, F) -> F> Filter<F> for FnFilter<T> {
    fn update(&mut self, value: F, dt: F) -> F {
        (self.0)(value, dt)
    }
}

#[cfg(feature = "alloc")]
mod chain {
    use alloc::boxed::Box;
    use alloc::vec::Vec;

    use super::Filter;

    /// An ordered, growable sequence of boxed filters applied in insertion order.
    ///
    /// Use this instead of [`Filter::then`] when the pipeline is assembled at runtime, e.g. from
    /// configuration.
    pub struct FilterChain<F> {
        filters: Vec<Box<dyn Filter<F> + Send>>,
    }

    impl<F> FilterChain<F> {
        /// Creates an empty chain, which passes samples through unchanged
        pub fn new() -> Self {
            Self {
                filters: Vec::new(),
            }
        }

        /// Appends a filter to the end of the chain
        pub fn push<T>(&mut self, filter: T)
        where
            T: Filter<F> + Send + 'static,
        {
            self.filters.push(Box::new(filter));
        }

        /// Builder form of [`FilterChain::push`]
        #[must_use]
        pub fn append<T>(mut self, filter: T) -> Self
        where
            T: Filter<F> + Send + 'static,
        {
            self.push(filter);
            self
        }

        /// Number of filters in the chain
        pub fn len(&self) -> usize {
            self.filters.len()
        }

        /// Whether the chain holds no filters
        pub fn is_empty(&self) -> bool {
            self.filters.is_empty()
        }
    }

    impl<F> Default for FilterChain<F> {
        fn default() -> Self {
            Self::new()
        }
    }

    impl<F> core::fmt::Debug for FilterChain<F> {
        fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
            f.debug_struct("FilterChain")
                .field("len", &self.filters.len())
                .finish()
        }
    }

    impl<F: Copy> Filter<F> for FilterChain<F> {
        fn update(&mut self, value: F, dt: F) -> F {
            self.filters
                .iter_mut()
                .fold(value, |acc, filter| filter.update(acc, dt))
        }

        fn reset(&mut self) {
            self.filters.iter_mut().for_each(|filter| filter.reset());
        }
    }
}

#[cfg(feature = "alloc")]
pub use chain::FilterChain;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degenerate_dt_holds_output() {
        let mut rate_limit = RateLimit::new(10.0).unwrap();
        let mut low_pass = LowPassFilter::new(0.1).unwrap();
        let mut high_pass = HighPassFilter::new(0.1).unwrap();

        assert_eq!(rate_limit.update(5.0, 0.1), 1.0);
        assert_eq!(low_pass.update(5.0, 0.1), 2.5);
        assert_eq!(high_pass.update(1.0, 0.1), 0.5);

        for dt in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert_eq!(rate_limit.update(5.0, dt), 1.0);
            assert_eq!(low_pass.update(5.0, dt), 2.5);
            assert_eq!(high_pass.update(5.0, dt), 0.5);
        }

        // The inner low pass did not move either
        assert_eq!(high_pass.update(1.0, 0.1), 1.0 - 0.75);
    }

    #[test]
    fn test_nan_samples_are_ignored() {
        let mut rate_limit = RateLimit::new(10.0).unwrap();
        rate_limit.update(1.0, 1.0);
        assert_eq!(rate_limit.update(f64::NAN, 1.0), 1.0);

        let mut average = MovingAverage::<f64, 2>::new().unwrap();
        average.update(2.0, 0.0);
        assert_eq!(average.update(f64::NAN, 0.0), 2.0);
    }

    #[test]
    fn test_identity_is_transparent() {
        let mut identity = Identity;
        assert_eq!(Filter::<f64>::update(&mut identity, 3.5, 0.0), 3.5);
    }
}
