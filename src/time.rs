// Clocks that drive the control loop, and conversion of elapsed time into float seconds
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

use core::fmt::Debug;
use core::time::Duration;

use num_traits::Float;

/// A timestamp from whatever clock drives the control loop.
///
/// Controllers only ever subtract consecutive timestamps, so an implementation needs nothing but
/// [`InstantLike::duration_since`]. It must saturate to zero instead of panicking when `earlier`
/// is actually later than `self`; a clock that does not advance is a degenerate timestep, not an
/// error.
pub trait InstantLike: Copy + Debug + PartialEq {
    /// Time elapsed from `earlier` to `self`, or zero if `earlier` is not earlier
    #[must_use]
    fn duration_since(&self, earlier: Self) -> Duration;
}

/// Converts a duration into seconds in the float type used by the control loop.
///
/// Returns zero if the duration is not representable, which downstream code handles as a
/// degenerate timestep.
pub fn as_secs<F: Float>(duration: Duration) -> F {
    F::from(duration.as_secs_f64()).unwrap_or_else(F::zero)
}

/// Seconds elapsed between two instants, or zero if there is no earlier instant.
pub fn elapsed_secs<I: InstantLike, F: Float>(now: I, earlier: Option<I>) -> F {
    earlier.map_or_else(F::zero, |earlier| as_secs(now.duration_since(earlier)))
}

/// Milliseconds from a free-running counter, e.g. the tick count of an embedded timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Millis(pub u64);

impl InstantLike for Millis {
    fn duration_since(&self, earlier: Self) -> Duration {
        Duration::from_millis(self.0.saturating_sub(earlier.0))
    }
}

/// Microseconds from a free-running counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Micros(pub u64);

impl InstantLike for Micros {
    fn duration_since(&self, earlier: Self) -> Duration {
        Duration::from_micros(self.0.saturating_sub(earlier.0))
    }
}

/// Seconds since an arbitrary epoch, as reported by most robot framework clocks
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct TimeF64(pub f64);

impl InstantLike for TimeF64 {
    fn duration_since(&self, earlier: Self) -> Duration {
        let secs = self.0 - earlier.0;
        // Also catches NaN timestamps
        if !(secs > 0.0) {
            return Duration::ZERO;
        }
        if secs >= Duration::MAX.as_secs_f64() {
            return Duration::MAX;
        }
        Duration::from_secs_f64(secs)
    }
}

#[cfg(feature = "std")]
mod std_instant {
    use super::{Duration, InstantLike};

    /// Monotonic wall-clock instant for hosted control loops
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
    pub struct StdInstant(pub std::time::Instant);

    impl StdInstant {
        /// Reads the monotonic clock
        pub fn now() -> Self {
            StdInstant(std::time::Instant::now())
        }
    }

    impl InstantLike for StdInstant {
        fn duration_since(&self, earlier: Self) -> Duration {
            self.0.saturating_duration_since(earlier.0)
        }
    }
}

#[cfg(feature = "std")]
pub use std_instant::StdInstant;
