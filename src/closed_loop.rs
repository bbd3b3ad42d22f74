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

//! An owner that drives an actuator from a [`Regulator`] once per control cycle.
//!
//! [`ClosedLoop::tick`] reads the setpoint from a [`Tunable`] source, updates the regulator with
//! the actuator's measurement, and either drives the actuator with the command
//! ([`LoopState::Running`]) or stops it when the filtered error is within tolerance
//! ([`LoopState::Holding`]). The state is re-evaluated every tick with no hysteresis, so a
//! measurement sitting exactly on the tolerance boundary will alternate between the two.

use num_traits::Float;

use crate::controller::Regulator;
use crate::error::ConfigError;

/// The output sink and measurement source of a control loop, e.g. a motor driver
pub trait Actuator<F> {
    /// Drives the actuator with `output`
    fn set(&mut self, output: F);

    /// Stops driving the actuator
    fn stop(&mut self);

    /// The current measurement of the controlled quantity
    fn measurement(&self) -> F;
}

/// A source of a scalar that may change while the loop runs, e.g. a setpoint tuned from a
/// dashboard. Plain numbers are fixed configuration.
pub trait Tunable<F> {
    /// Reads the current value
    fn value(&self) -> F;
}

impl Tunable<f32> for f32 {
    fn value(&self) -> f32 {
        *self
    }
}

impl Tunable<f64> for f64 {
    fn value(&self) -> f64 {
        *self
    }
}

/// A tunable value polled from a callback; built by [`tunable_fn`]
#[derive(Clone, Copy, Debug)]
pub struct FnTunable<T>(T);

/// Wraps a callback that is polled once per tick
pub fn tunable_fn<F, T: Fn() -> F>(f: T) -> FnTunable<T> {
    FnTunable(f)
}

impl<F, T: Fn() -> F> Tunable<F> for FnTunable<T> {
    fn value(&self) -> F {
        (self.0)()
    }
}

#[cfg(feature = "std")]
mod shared {
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    use super::Tunable;

    /// A number that can be updated from another thread while the loop reads it.
    ///
    /// Clones share the same value.
    #[derive(Clone, Debug)]
    pub struct TunableNumber {
        bits: Arc<AtomicU64>,
    }

    impl TunableNumber {
        /// Creates a tunable number with an initial value
        pub fn new(value: f64) -> Self {
            Self {
                bits: Arc::new(AtomicU64::new(value.to_bits())),
            }
        }

        /// Replaces the value; readers see it on their next read
        pub fn set(&self, value: f64) {
            self.bits.store(value.to_bits(), Ordering::Relaxed);
        }

        /// Reads the current value
        pub fn get(&self) -> f64 {
            f64::from_bits(self.bits.load(Ordering::Relaxed))
        }
    }

    impl Tunable<f64> for TunableNumber {
        fn value(&self) -> f64 {
            self.get()
        }
    }
}

#[cfg(feature = "std")]
pub use shared::TunableNumber;

/// A sink for named numbers, e.g. a dashboard or a log
pub trait Telemetry<F> {
    /// Records `value` under `key`
    fn put_number(&mut self, key: &str, value: F);
}

/// Telemetry key of the filtered setpoint
pub const SETPOINT_KEY: &str = "setpoint";
/// Telemetry key of the filtered measurement
pub const MEASUREMENT_KEY: &str = "measurement";
/// Telemetry key of the command
pub const OUTPUT_KEY: &str = "output";
/// Telemetry key of the filtered error
pub const ERROR_KEY: &str = "error";

/// What a [`ClosedLoop`] did with the actuator on its last tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// The error was outside tolerance; the actuator was driven with the command
    Running,
    /// The error was within tolerance; the actuator was stopped
    Holding,
}

/// Couples a regulator, an actuator and a setpoint source
#[derive(Debug, Clone)]
pub struct ClosedLoop<R, A, T, F> {
    regulator: R,
    actuator: A,
    setpoint: T,
    tolerance: F,
    state: Option<LoopState>,
}

impl<R, A, T, F> ClosedLoop<R, A, T, F>
where
    R: Regulator<F>,
    A: Actuator<F>,
    T: Tunable<F>,
    F: Float,
{
    /// Creates a closed loop.
    ///
    /// # Arguments
    /// - `regulator`: The controller chain.
    /// - `actuator`: Supplies measurements and receives commands.
    /// - `setpoint`: Polled once per tick.
    /// - `tolerance`: The error within which the actuator is stopped.
    ///
    /// # Errors
    /// [`ConfigError::InvalidTolerance`] if `tolerance` is negative or NaN.
    pub fn new(regulator: R, actuator: A, setpoint: T, tolerance: F) -> Result<Self, ConfigError> {
        if !(tolerance >= F::zero()) {
            return Err(ConfigError::InvalidTolerance);
        }
        Ok(Self {
            regulator,
            actuator,
            setpoint,
            tolerance,
            state: None,
        })
    }

    /// Runs one control cycle at time `now`.
    ///
    /// The regulator is updated on every tick, holding included, so its filters keep tracking the
    /// setpoint and the plant while the actuator is stopped. An integrating law also keeps
    /// accumulating the in-tolerance error while holding, and that integral shows up in the
    /// command of the next running tick. Bound it with `integral_limit`, or reset the regulator
    /// through [`regulator_mut`](Self::regulator_mut).
    pub fn tick(&mut self, now: R::Instant) -> LoopState {
        let setpoint = self.setpoint.value();
        let measurement = self.actuator.measurement();
        let output = self.regulator.update(setpoint, measurement, now);

        let state = if self.regulator.is_done(self.tolerance) {
            self.actuator.stop();
            LoopState::Holding
        } else {
            self.actuator.set(output);
            LoopState::Running
        };

        if self.state != Some(state) {
            tracing::debug!(?state, "closed loop changed state");
        }
        self.state = Some(state);
        state
    }

    /// Writes the regulator's filtered setpoint, measurement, error and command to `sink`
    pub fn publish<S: Telemetry<F>>(&self, sink: &mut S) {
        let setpoint = self.regulator.setpoint();
        let measurement = self.regulator.measurement();
        sink.put_number(SETPOINT_KEY, setpoint);
        sink.put_number(MEASUREMENT_KEY, measurement);
        sink.put_number(ERROR_KEY, setpoint - measurement);
        sink.put_number(OUTPUT_KEY, self.regulator.output());
    }

    /// The state entered on the last tick, or `None` before the first tick
    pub fn state(&self) -> Option<LoopState> {
        self.state
    }

    /// The convergence tolerance
    pub fn tolerance(&self) -> F {
        self.tolerance
    }

    /// Changes the convergence tolerance.
    ///
    /// # Errors
    /// [`ConfigError::InvalidTolerance`] if `tolerance` is negative or NaN; the old tolerance is
    /// kept.
    pub fn set_tolerance(&mut self, tolerance: F) -> Result<(), ConfigError> {
        if !(tolerance >= F::zero()) {
            return Err(ConfigError::InvalidTolerance);
        }
        self.tolerance = tolerance;
        Ok(())
    }

    /// The regulator
    pub fn regulator(&self) -> &R {
        &self.regulator
    }

    /// Mutable access to the regulator
    pub fn regulator_mut(&mut self) -> &mut R {
        &mut self.regulator
    }

    /// The actuator
    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    /// Mutable access to the actuator
    pub fn actuator_mut(&mut self) -> &mut A {
        &mut self.actuator
    }
}
