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

use crate::error::{is_valid_gain, ConfigError};
use crate::filter::positive_dt;
use crate::law::ControlLaw;

/// Configuration of a PID feedback law.
///
/// Every setter validates its argument and leaves the configuration untouched when it returns an
/// error, so a `PidConfig` is always safe to run.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PidConfig<F> {
    /// Proportional gain coefficient.
    /// Defaults to 1.0.
    kp: F,

    /// Integral gain coefficient. The integral accumulates `ki * error * dt`.
    /// Defaults to 0.0.
    ki: F,

    /// Derivative gain coefficient, applied to the backward difference of the error over `dt`.
    /// Defaults to 0.0.
    kd: F,

    /// Time constant for the low-pass filter applied to the derivative term.
    /// Defaults to 0.0, i.e. no filtering.
    filter_tc: F,

    /// Minimum output value of the PID controller.
    /// Defaults to negative infinity, i.e. no limit.
    output_min: F,

    /// Maximum output value of the PID controller.
    /// Defaults to positive infinity, i.e. no limit.
    output_max: F,

    /// Bound on the magnitude of the integral term.
    /// Defaults to positive infinity. The integral is additionally bounded by the output limits.
    integral_limit: F,

    /// The integral term is cleared whenever the magnitude of the error exceeds this range.
    /// Defaults to positive infinity, i.e. never cleared.
    integral_range: F,

    /// Whether to apply the derivative on the measurement.
    /// if true, the derivative term is computed using the NEGATIVE backward difference between the
    /// current and previous measurement.
    /// Defaults to false.
    use_derivative_on_measurement: bool,
}

impl<F: Float> Default for PidConfig<F> {
    fn default() -> Self {
        PidConfig {
            kp: F::one(),
            ki: F::zero(),
            kd: F::zero(),
            filter_tc: F::zero(),
            output_min: F::neg_infinity(),
            output_max: F::infinity(),
            integral_limit: F::infinity(),
            integral_range: F::infinity(),
            use_derivative_on_measurement: false,
        }
    }
}

impl<F: Float> PidConfig<F> {
    /// Returns the proportional gain.
    pub fn kp(&self) -> F {
        self.kp
    }

    /// Returns the integral gain.
    pub fn ki(&self) -> F {
        self.ki
    }

    /// Returns the derivative gain.
    pub fn kd(&self) -> F {
        self.kd
    }

    /// Returns the time constant for the low-pass filter applied to the derivative term.
    pub fn filter_tc(&self) -> F {
        self.filter_tc
    }

    /// Convenience method that returns the proportional, integral, and derivative gains together as a tuple.
    pub fn gains(&self) -> (F, F, F) {
        (self.kp, self.ki, self.kd)
    }

    /// Returns the minimum output limit.
    pub fn output_min(&self) -> F {
        self.output_min
    }

    /// Returns the maximum output limit.
    pub fn output_max(&self) -> F {
        self.output_max
    }

    /// Returns the bound on the magnitude of the integral term.
    pub fn integral_limit(&self) -> F {
        self.integral_limit
    }

    /// Returns the error magnitude beyond which the integral term is cleared.
    pub fn integral_range(&self) -> F {
        self.integral_range
    }

    /// Returns the flag indicating whether to apply the derivative on the measurement.
    pub fn use_derivative_on_measurement(&self) -> bool {
        self.use_derivative_on_measurement
    }

    /// Sets the proportional gain.
    ///
    /// A zero gain is accepted so that a chain can run on feedforward alone.
    ///
    /// # Arguments
    /// - `kp`: The new proportional gain.
    ///
    /// # Returns
    /// - `Ok(())` if the gain was set successfully.
    /// - `Err(ConfigError::InvalidProportionalGain)` if the gain is negative or not finite.
    pub fn set_kp(&mut self, kp: F) -> Result<(), ConfigError> {
        if !is_valid_gain(kp) {
            return Err(ConfigError::InvalidProportionalGain);
        }
        self.kp = kp;
        Ok(())
    }

    /// Sets the integral gain.
    ///
    /// The gain is folded into the integral accumulator at every step, so changing it does not
    /// cause a jump in the output.
    ///
    /// # Returns
    /// - `Err(ConfigError::InvalidIntegralGain)` if the gain is negative or not finite.
    pub fn set_ki(&mut self, ki: F) -> Result<(), ConfigError> {
        if !is_valid_gain(ki) {
            return Err(ConfigError::InvalidIntegralGain);
        }
        self.ki = ki;
        Ok(())
    }

    /// Sets the derivative gain.
    ///
    /// # Returns
    /// - `Err(ConfigError::InvalidDerivativeGain)` if the gain is negative or not finite.
    pub fn set_kd(&mut self, kd: F) -> Result<(), ConfigError> {
        if !is_valid_gain(kd) {
            return Err(ConfigError::InvalidDerivativeGain);
        }
        self.kd = kd;
        Ok(())
    }

    /// Sets the time constant for the low-pass filter applied to the derivative term.
    ///
    /// # Arguments
    /// - `filter_tc`: The new time constant for the filter. Zero disables filtering.
    ///
    /// # Returns
    /// - `Err(ConfigError::InvalidFilterTimeConstant)` if the time constant is negative or not
    ///   finite.
    pub fn set_filter_tc(&mut self, filter_tc: F) -> Result<(), ConfigError> {
        if !is_valid_gain(filter_tc) {
            return Err(ConfigError::InvalidFilterTimeConstant);
        }
        self.filter_tc = filter_tc;
        Ok(())
    }

    /// Convenience method to set the proportional, integral, and derivative gains together.
    ///
    /// The gains are validated all together before any of them is applied.
    pub fn set_gains(&mut self, kp: F, ki: F, kd: F) -> Result<(), ConfigError> {
        let mut staged = *self;
        staged.set_kp(kp)?;
        staged.set_ki(ki)?;
        staged.set_kd(kd)?;
        *self = staged;
        Ok(())
    }

    /// Sets the minimum and maximum output limits for the PID controller.
    ///
    /// These limits may be set to infinity to disable clamping.
    ///
    /// # Arguments
    /// - `output_min`: The minimum output limit.
    /// - `output_max`: The maximum output limit.
    ///
    /// # Returns
    /// - `Err(ConfigError::InvalidOutputLimits)` if the minimum limit is greater than or equal to
    ///   the maximum limit, or either limit is NaN.
    pub fn set_output_limits(&mut self, output_min: F, output_max: F) -> Result<(), ConfigError> {
        if !(output_min < output_max) {
            return Err(ConfigError::InvalidOutputLimits);
        }

        self.output_min = output_min;
        self.output_max = output_max;

        Ok(())
    }

    /// Sets the bound on the magnitude of the integral term, guarding against windup.
    ///
    /// # Returns
    /// - `Err(ConfigError::InvalidIntegralLimit)` if the limit is negative or NaN.
    pub fn set_integral_limit(&mut self, integral_limit: F) -> Result<(), ConfigError> {
        if !(integral_limit >= F::zero()) {
            return Err(ConfigError::InvalidIntegralLimit);
        }
        self.integral_limit = integral_limit;
        Ok(())
    }

    /// Sets the error magnitude beyond which the integral term is cleared.
    ///
    /// This keeps a large setpoint jump from winding up the integrator during the transient.
    ///
    /// # Returns
    /// - `Err(ConfigError::InvalidIntegralRange)` if the range is not positive or is NaN.
    pub fn set_integral_range(&mut self, integral_range: F) -> Result<(), ConfigError> {
        if !(integral_range > F::zero()) {
            return Err(ConfigError::InvalidIntegralRange);
        }
        self.integral_range = integral_range;
        Ok(())
    }

    /// Sets whether to apply the derivative on the measurement.
    pub fn set_use_derivative_on_measurement(&mut self, use_derivative_on_measurement: bool) {
        self.use_derivative_on_measurement = use_derivative_on_measurement;
    }
}

/// Builder for [`PidConfig`] that defers validation to [`PidConfigBuilder::build`].
///
/// With the `serde` feature, the builder can be deserialized from configuration files; missing
/// fields take their default values and `build` validates the result.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(
        default,
        bound(
            serialize = "F: serde::Serialize",
            deserialize = "F: Float + serde::Deserialize<'de>"
        )
    )
)]
pub struct PidConfigBuilder<F> {
    kp: F,
    ki: F,
    kd: F,
    filter_tc: F,
    output_min: F,
    output_max: F,
    integral_limit: F,
    integral_range: F,
    use_derivative_on_measurement: bool,
}

impl<F: Float> Default for PidConfigBuilder<F> {
    fn default() -> Self {
        let config = PidConfig::default();
        Self {
            kp: config.kp,
            ki: config.ki,
            kd: config.kd,
            filter_tc: config.filter_tc,
            output_min: config.output_min,
            output_max: config.output_max,
            integral_limit: config.integral_limit,
            integral_range: config.integral_range,
            use_derivative_on_measurement: config.use_derivative_on_measurement,
        }
    }
}

impl<F: Float> PidConfigBuilder<F> {
    /// Sets the proportional gain
    pub fn kp(mut self, kp: F) -> Self {
        self.kp = kp;
        self
    }

    /// Sets the integral gain
    pub fn ki(mut self, ki: F) -> Self {
        self.ki = ki;
        self
    }

    /// Sets the derivative gain
    pub fn kd(mut self, kd: F) -> Self {
        self.kd = kd;
        self
    }

    /// Sets the derivative filter time constant
    pub fn filter_tc(mut self, filter_tc: F) -> Self {
        self.filter_tc = filter_tc;
        self
    }

    /// Sets the output limits
    pub fn output_limits(mut self, output_min: F, output_max: F) -> Self {
        self.output_min = output_min;
        self.output_max = output_max;
        self
    }

    /// Sets the integral magnitude bound
    pub fn integral_limit(mut self, integral_limit: F) -> Self {
        self.integral_limit = integral_limit;
        self
    }

    /// Sets the error range beyond which the integral is cleared
    pub fn integral_range(mut self, integral_range: F) -> Self {
        self.integral_range = integral_range;
        self
    }

    /// Sets whether to apply the derivative on the measurement
    pub fn use_derivative_on_measurement(mut self, use_derivative_on_measurement: bool) -> Self {
        self.use_derivative_on_measurement = use_derivative_on_measurement;
        self
    }

    /// Validates every field and produces the configuration.
    ///
    /// # Errors
    /// The error of the first invalid field, in the order the fields are declared.
    pub fn build(self) -> Result<PidConfig<F>, ConfigError> {
        self.try_build().map_err(|error| {
            tracing::debug!(?error, "rejected PID configuration");
            error
        })
    }

    fn try_build(self) -> Result<PidConfig<F>, ConfigError> {
        let mut config = PidConfig::default();
        config.set_kp(self.kp)?;
        config.set_ki(self.ki)?;
        config.set_kd(self.kd)?;
        config.set_filter_tc(self.filter_tc)?;
        config.set_output_limits(self.output_min, self.output_max)?;
        config.set_integral_limit(self.integral_limit)?;
        config.set_integral_range(self.integral_range)?;
        config.set_use_derivative_on_measurement(self.use_derivative_on_measurement);
        Ok(config)
    }
}

/// The mutable state of a PID law: integral accumulator and derivative history.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PidContext<F> {
    i_term: F,
    last_err: F,
    last_input: F,
    last_output: F,
    last_derivative: F,
    is_initialized: bool,
}

impl<F: Float> Default for PidContext<F> {
    fn default() -> Self {
        Self::new_uninit()
    }
}

impl<F: Float> PidContext<F> {
    /// Creates an empty context. The first sample with a usable `dt` only records the error, so
    /// it contributes no derivative kick.
    pub fn new_uninit() -> Self {
        Self {
            i_term: F::zero(),
            last_err: F::zero(),
            last_input: F::zero(),
            last_output: F::zero(),
            last_derivative: F::zero(),
            is_initialized: false,
        }
    }

    /// Creates a context for a bumpless start from a known steady state.
    ///
    /// The first sample with a usable `dt` records the error without differentiating it, as for
    /// [`PidContext::new_uninit`], so the seeded integral carries the output across the handover.
    ///
    /// # Arguments
    /// - `measurement`: The measurement at the moment control takes over.
    /// - `output`: The command currently holding the plant steady; it seeds the integral term,
    ///   which is clamped to the integral and output limits on the first `compute`.
    pub fn new(measurement: F, output: F) -> Self {
        Self {
            i_term: output,
            last_input: measurement,
            last_output: output,
            ..Self::new_uninit()
        }
    }

    /// The last computed output
    pub fn output(&self) -> F {
        self.last_output
    }

    /// The error recorded at the last sample with a usable `dt`
    pub fn error(&self) -> F {
        self.last_err
    }

    /// The current integral term, gain included
    pub fn integral(&self) -> F {
        self.i_term
    }

    /// The current (filtered) derivative of the error, gain excluded
    pub fn derivative(&self) -> F {
        self.last_derivative
    }

    /// Whether a sample has been recorded for derivative estimation
    pub fn is_initialized(&self) -> bool {
        self.is_initialized
    }

    /// Clears the integral and derivative history
    pub fn reset(&mut self) {
        *self = Self::new_uninit();
    }

    /// Clears the integral term only
    pub fn reset_integral(&mut self) {
        self.i_term = F::zero();
    }
}

/// A functional implementation of a PID (Proportional-Integral-Derivative) feedback law.
///
/// This implementation is stateless so a context object must be passed in and returned with each
/// call to `compute`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FuncPidController<F> {
    config: PidConfig<F>,
}

/// A stateful implementation of a PID (Proportional-Integral-Derivative) feedback law.
///
/// This implementation maintains its own [`PidContext`] and implements [`ControlLaw`], so it can
/// be composed with feedforward laws and wrapped in a [`Controller`](crate::controller::Controller).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PidController<F> {
    ctx: PidContext<F>,
    controller: FuncPidController<F>,
}

impl<F: Float> FuncPidController<F> {
    /// Creates a PID law from a validated configuration
    pub fn new(config: PidConfig<F>) -> Self {
        FuncPidController { config }
    }

    /// The configuration
    pub fn config(&self) -> &PidConfig<F> {
        &self.config
    }

    /// Mutable access to the configuration for on-the-fly tuning
    pub fn config_mut(&mut self) -> &mut PidConfig<F> {
        &mut self.config
    }

    /// Computes one PID step.
    ///
    /// # Arguments
    /// - `ctx`: The state produced by the previous call.
    /// - `setpoint`: The desired value.
    /// - `measurement`: The observed value.
    /// - `dt`: Seconds since the previous call. If it is not positive and finite, the integral
    ///   and derivative state are left untouched and the output is recomputed from them.
    ///
    /// # Returns
    /// The clamped output and the updated state.
    pub fn compute(
        &self,
        mut ctx: PidContext<F>,
        setpoint: F,
        measurement: F,
        dt: F,
    ) -> (F, PidContext<F>) {
        let error = setpoint - measurement;
        if error.is_nan() {
            return (ctx.last_output, ctx);
        }

        ctx.i_term = self.clamp_integral(ctx.i_term);

        if let Some(dt) = positive_dt(dt) {
            ctx = self.update_integral(ctx, error, dt);

            // Optional derivative on measurement to mitigate derivative kick
            let raw_derivative = if !ctx.is_initialized {
                F::zero()
            } else if self.config.use_derivative_on_measurement {
                (ctx.last_input - measurement) / dt // Note reversed order of operands
            } else {
                (error - ctx.last_err) / dt
            };

            // Pass the derivative through a first-order LPF
            let alpha = dt / (self.config.filter_tc + dt);
            ctx.last_derivative = alpha * raw_derivative + (F::one() - alpha) * ctx.last_derivative;

            ctx.last_err = error;
            ctx.last_input = measurement;
            ctx.is_initialized = true;
        } else {
            tracing::trace!("degenerate timestep, holding PID state");
        }

        let output = self.config.kp * error + ctx.i_term + self.config.kd * ctx.last_derivative;
        let clamped_output = output
            .max(self.config.output_min)
            .min(self.config.output_max);

        ctx.last_output = clamped_output;
        (clamped_output, ctx)
    }

    fn update_integral(&self, mut ctx: PidContext<F>, error: F, dt: F) -> PidContext<F> {
        if error.abs() > self.config.integral_range {
            ctx.i_term = F::zero();
            return ctx;
        }
        // Fold gain into i-term calculation for bumpless parameter change
        ctx.i_term = ctx.i_term + self.config.ki * error * dt;

        ctx.i_term = self.clamp_integral(ctx.i_term);
        ctx
    }

    /// Clamps the i-term to the integral limit and the output limits to prevent windup
    fn clamp_integral(&self, i_term: F) -> F {
        let limit = self.config.integral_limit;
        i_term
            .max(-limit)
            .min(limit)
            .max(self.config.output_min)
            .min(self.config.output_max)
    }
}

impl<F: Float> PidController<F> {
    /// Creates a stateful PID law with an empty context
    pub fn new(config: PidConfig<F>) -> Self {
        Self {
            ctx: PidContext::new_uninit(),
            controller: FuncPidController::new(config),
        }
    }

    /// Creates a stateful PID law with the given gains and default limits.
    ///
    /// # Errors
    /// The first invalid gain, see [`PidConfig::set_gains`].
    pub fn from_gains(kp: F, ki: F, kd: F) -> Result<Self, ConfigError> {
        let config = PidConfigBuilder::default().kp(kp).ki(ki).kd(kd).build()?;
        Ok(Self::new(config))
    }

    /// Creates a stateful PID law resuming from an explicit context
    pub fn with_context(config: PidConfig<F>, ctx: PidContext<F>) -> Self {
        Self {
            ctx,
            controller: FuncPidController::new(config),
        }
    }

    /// The configuration
    pub fn config(&self) -> &PidConfig<F> {
        &self.controller.config
    }

    /// Mutable access to the configuration for on-the-fly tuning
    pub fn config_mut(&mut self) -> &mut PidConfig<F> {
        &mut self.controller.config
    }

    /// The internal state
    pub fn context(&self) -> &PidContext<F> {
        &self.ctx
    }

    /// The last computed output
    pub fn output(&self) -> F {
        self.ctx.output()
    }

    /// The current integral term
    pub fn integral(&self) -> F {
        self.ctx.integral()
    }

    /// Whether a sample has been recorded for derivative estimation
    pub fn is_initialized(&self) -> bool {
        self.ctx.is_initialized()
    }

    /// Clears the integral term only
    pub fn reset_integral(&mut self) {
        self.ctx.reset_integral();
    }

    /// Computes one PID step, see [`FuncPidController::compute`]
    pub fn compute(&mut self, setpoint: F, measurement: F, dt: F) -> F {
        let (output, ctx) = self.controller.compute(self.ctx, setpoint, measurement, dt);
        self.ctx = ctx;
        output
    }
}

impl<F: Float> ControlLaw<F> for PidController<F> {
    fn calculate(&mut self, setpoint: F, measurement: F, dt: F) -> F {
        self.compute(setpoint, measurement, dt)
    }

    fn reset(&mut self) {
        self.ctx.reset();
    }
}
