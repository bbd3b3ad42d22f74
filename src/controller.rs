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

use crate::filter::{positive_dt, Filter, Identity};
use crate::law::ControlLaw;
use crate::time::{elapsed_secs, InstantLike};

/// Anything that can be driven one control cycle at a time.
///
/// Owners such as [`ClosedLoop`](crate::closed_loop::ClosedLoop) are generic over this trait
/// rather than over the many type parameters of [`Controller`].
pub trait Regulator<F> {
    /// The timestamp type fed to [`Regulator::update`]
    type Instant: InstantLike;

    /// Runs one control cycle and returns the command
    fn update(&mut self, setpoint: F, measurement: F, now: Self::Instant) -> F;

    /// Whether the last filtered error is within `tolerance`
    fn is_done(&self, tolerance: F) -> bool;

    /// The last filtered setpoint
    fn setpoint(&self) -> F;

    /// The last filtered measurement
    fn measurement(&self) -> F;

    /// The last command
    fn output(&self) -> F;
}

/// A control law wrapped with setpoint, measurement and output filters.
///
/// Each cycle the setpoint and measurement pass through their filters, the law computes a command
/// from the filtered values, and the command passes through the output filter. Unattached filters
/// default to [`Identity`]. The filtered values are kept for [`Controller::is_done`] and for
/// telemetry.
///
/// ```rust
/// use control_chain::controller::Controller;
/// use control_chain::feedforward::{FeedforwardModel, Flywheel};
/// use control_chain::filter::{Filter, LowPassFilter, RateLimit};
/// use control_chain::law::ControlLaw;
/// use control_chain::pid::PidController;
/// use control_chain::time::Millis;
///
/// # fn main() -> Result<(), control_chain::error::ConfigError> {
/// let law = PidController::from_gains(1.0, 0.0, 0.0)?
///     .and(Flywheel::new(0.1, 0.01, 0.01)?.velocity());
/// let mut controller = Controller::new(law, Millis(0))
///     .with_setpoint_filter(RateLimit::new(1000.0)?.then(LowPassFilter::new(0.2)?));
///
/// let output = controller.update(1000.0, 0.0, Millis(20));
/// assert!(output > 0.0);
/// assert!(!controller.is_done(1.0));
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Controller<I, F, L, S = Identity, M = Identity, O = Identity> {
    law: L,
    setpoint_filter: S,
    measurement_filter: M,
    output_filter: O,
    setpoint: F,
    measurement: F,
    output: F,
    last_time: Option<I>,
}

impl<I, F: Float, L> Controller<I, F, L> {
    /// Creates a controller whose first `dt` is measured from `start`
    pub fn new(law: L, start: I) -> Self {
        Self {
            last_time: Some(start),
            ..Self::new_uninit(law)
        }
    }

    /// Creates a controller with no time reference; the first update runs with `dt = 0`, so
    /// time-based filters and the integral only start moving from the second update.
    pub fn new_uninit(law: L) -> Self {
        Self {
            law,
            setpoint_filter: Identity,
            measurement_filter: Identity,
            output_filter: Identity,
            setpoint: F::zero(),
            measurement: F::zero(),
            output: F::zero(),
            last_time: None,
        }
    }
}

impl<I, F, L, S, M, O> Controller<I, F, L, S, M, O> {
    /// Replaces the filter applied to setpoints before the law sees them
    pub fn with_setpoint_filter<S2>(self, filter: S2) -> Controller<I, F, L, S2, M, O> {
        Controller {
            law: self.law,
            setpoint_filter: filter,
            measurement_filter: self.measurement_filter,
            output_filter: self.output_filter,
            setpoint: self.setpoint,
            measurement: self.measurement,
            output: self.output,
            last_time: self.last_time,
        }
    }

    /// Replaces the filter applied to measurements before the law sees them
    pub fn with_measurement_filter<M2>(self, filter: M2) -> Controller<I, F, L, S, M2, O> {
        Controller {
            law: self.law,
            setpoint_filter: self.setpoint_filter,
            measurement_filter: filter,
            output_filter: self.output_filter,
            setpoint: self.setpoint,
            measurement: self.measurement,
            output: self.output,
            last_time: self.last_time,
        }
    }

    /// Replaces the filter applied to the law's command
    pub fn with_output_filter<O2>(self, filter: O2) -> Controller<I, F, L, S, M, O2> {
        Controller {
            law: self.law,
            setpoint_filter: self.setpoint_filter,
            measurement_filter: self.measurement_filter,
            output_filter: filter,
            setpoint: self.setpoint,
            measurement: self.measurement,
            output: self.output,
            last_time: self.last_time,
        }
    }

    /// The control law
    pub fn law(&self) -> &L {
        &self.law
    }

    /// Mutable access to the control law, e.g. for retuning gains
    pub fn law_mut(&mut self) -> &mut L {
        &mut self.law
    }

    /// The setpoint filter
    pub fn setpoint_filter(&self) -> &S {
        &self.setpoint_filter
    }

    /// The measurement filter
    pub fn measurement_filter(&self) -> &M {
        &self.measurement_filter
    }

    /// The output filter
    pub fn output_filter(&self) -> &O {
        &self.output_filter
    }
}

impl<I, F, L, S, M, O> Controller<I, F, L, S, M, O>
where
    I: InstantLike,
    F: Float,
    L: ControlLaw<F>,
    S: Filter<F>,
    M: Filter<F>,
    O: Filter<F>,
{
    /// Runs one control cycle at time `now`.
    ///
    /// `dt` is the time since the previous update (or since `start`). A timestamp that does not
    /// advance yields `dt = 0`, which holds time-based filter state and the PID integral and
    /// derivative.
    pub fn update(&mut self, setpoint: F, measurement: F, now: I) -> F {
        let dt = elapsed_secs(now, self.last_time);
        self.last_time = Some(now);
        self.step(setpoint, measurement, dt)
    }

    /// Runs one control cycle `dt` seconds after the previous one, for drivers that run at a
    /// fixed rate and keep time themselves. The time reference used by
    /// [`Controller::update`] is not touched.
    pub fn step(&mut self, setpoint: F, measurement: F, dt: F) -> F {
        let dt = positive_dt(dt).unwrap_or_else(|| {
            tracing::trace!("degenerate timestep in control cycle");
            F::zero()
        });

        let setpoint = self.setpoint_filter.update(setpoint, dt);
        let measurement = self.measurement_filter.update(measurement, dt);
        let command = self.law.calculate(setpoint, measurement, dt);
        let output = self.output_filter.update(command, dt);

        self.setpoint = setpoint;
        self.measurement = measurement;
        self.output = output;
        output
    }

    /// Whether `|setpoint - measurement| <= tolerance`, using the last filtered values.
    ///
    /// Before the first update both values are zero, so this is true for any non-negative
    /// tolerance.
    pub fn is_done(&self, tolerance: F) -> bool {
        self.error().abs() <= tolerance
    }

    /// The last filtered setpoint
    pub fn setpoint(&self) -> F {
        self.setpoint
    }

    /// The last filtered measurement; this is the value to display, since it is what the law saw
    pub fn measurement(&self) -> F {
        self.measurement
    }

    /// The last command
    pub fn output(&self) -> F {
        self.output
    }

    /// The last filtered error, `setpoint - measurement`
    pub fn error(&self) -> F {
        self.setpoint - self.measurement
    }

    /// The timestamp of the last update
    pub fn last_time(&self) -> Option<I> {
        self.last_time
    }

    /// Clears the law and every filter, and zeroes the recorded values.
    ///
    /// The time reference is kept, so the next update still measures `dt` from the last one.
    pub fn reset(&mut self) {
        self.law.reset();
        self.setpoint_filter.reset();
        self.measurement_filter.reset();
        self.output_filter.reset();
        self.setpoint = F::zero();
        self.measurement = F::zero();
        self.output = F::zero();
    }
}

impl<I, F, L, S, M, O> Regulator<F> for Controller<I, F, L, S, M, O>
where
    I: InstantLike,
    F: Float,
    L: ControlLaw<F>,
    S: Filter<F>,
    M: Filter<F>,
    O: Filter<F>,
{
    type Instant = I;

    fn update(&mut self, setpoint: F, measurement: F, now: I) -> F {
        Controller::update(self, setpoint, measurement, now)
    }

    fn is_done(&self, tolerance: F) -> bool {
        Controller::is_done(self, tolerance)
    }

    fn setpoint(&self) -> F {
        self.setpoint
    }

    fn measurement(&self) -> F {
        self.measurement
    }

    fn output(&self) -> F {
        self.output
    }
}
