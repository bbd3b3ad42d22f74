// Construction-time errors for control laws and filters
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

/// Errors raised when a control law or filter is configured with invalid parameters.
///
/// Misconfiguration is rejected eagerly, at construction or when a setter is called, so that the
/// control loop never runs with parameters that would produce NaNs. Nothing on the `update` path
/// returns this error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(thiserror::Error))]
pub enum ConfigError {
    /// The proportional gain is negative or not finite
    #[cfg_attr(
        feature = "std",
        error("proportional gain must be non-negative and finite")
    )]
    InvalidProportionalGain,

    /// The integral gain is negative or not finite
    #[cfg_attr(feature = "std", error("integral gain must be non-negative and finite"))]
    InvalidIntegralGain,

    /// The derivative gain is negative or not finite
    #[cfg_attr(
        feature = "std",
        error("derivative gain must be non-negative and finite")
    )]
    InvalidDerivativeGain,

    /// The derivative filter time constant is negative or not finite
    #[cfg_attr(
        feature = "std",
        error("derivative filter time constant must be non-negative and finite")
    )]
    InvalidFilterTimeConstant,

    /// The output lower bound is not below the upper bound, or either bound is NaN
    #[cfg_attr(
        feature = "std",
        error("output limits must satisfy min < max and neither may be NaN")
    )]
    InvalidOutputLimits,

    /// The integral limit is negative or NaN
    #[cfg_attr(feature = "std", error("integral limit must be non-negative"))]
    InvalidIntegralLimit,

    /// The error range beyond which the integral is reset is not positive
    #[cfg_attr(feature = "std", error("integral range must be positive"))]
    InvalidIntegralRange,

    /// A feedforward gain is negative or not finite
    #[cfg_attr(
        feature = "std",
        error("feedforward gains must be non-negative and finite")
    )]
    InvalidFeedforwardGain,

    /// The maximum rate of a rate limiter is not positive
    #[cfg_attr(feature = "std", error("maximum rate must be positive"))]
    InvalidRateLimit,

    /// A filter time constant is not positive and finite
    #[cfg_attr(feature = "std", error("time constant must be positive and finite"))]
    InvalidTimeConstant,

    /// The bounds of a clamp are not ordered, or either bound is NaN
    #[cfg_attr(feature = "std", error("clamp bounds must satisfy min < max"))]
    InvalidClampBounds,

    /// A moving average window holds no samples
    #[cfg_attr(feature = "std", error("moving average window must hold at least one sample"))]
    InvalidWindowSize,

    /// A convergence tolerance is negative or NaN
    #[cfg_attr(feature = "std", error("tolerance must be non-negative"))]
    InvalidTolerance,
}

#[cfg(not(feature = "std"))]
impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg = match self {
            ConfigError::InvalidProportionalGain => "invalid proportional gain",
            ConfigError::InvalidIntegralGain => "invalid integral gain",
            ConfigError::InvalidDerivativeGain => "invalid derivative gain",
            ConfigError::InvalidFilterTimeConstant => "invalid derivative filter time constant",
            ConfigError::InvalidOutputLimits => "invalid output limits",
            ConfigError::InvalidIntegralLimit => "invalid integral limit",
            ConfigError::InvalidIntegralRange => "invalid integral range",
            ConfigError::InvalidFeedforwardGain => "invalid feedforward gain",
            ConfigError::InvalidRateLimit => "invalid rate limit",
            ConfigError::InvalidTimeConstant => "invalid time constant",
            ConfigError::InvalidClampBounds => "invalid clamp bounds",
            ConfigError::InvalidWindowSize => "invalid window size",
            ConfigError::InvalidTolerance => "invalid tolerance",
        };
        f.write_str(msg)
    }
}

/// Checks that a gain is non-negative and finite
pub(crate) fn is_valid_gain<F: num_traits::Float>(gain: F) -> bool {
    gain >= F::zero() && gain.is_finite()
}
