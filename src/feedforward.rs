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

//! Open-loop models that predict the command from the setpoint trajectory.
//!
//! A [`FeedforwardModel`] is a pure function of velocity and acceleration. The adapters returned
//! by [`FeedforwardModel::velocity`] and [`FeedforwardModel::position`] estimate those from
//! consecutive setpoints and turn the model into a [`ControlLaw`].

use num_traits::Float;

use crate::error::{is_valid_gain, ConfigError};
use crate::filter::positive_dt;
use crate::law::ControlLaw;

/// Sign function with `sign(0) == 0`, so static friction is not compensated at rest
fn sign<F: Float>(x: F) -> F {
    if x > F::zero() {
        F::one()
    } else if x < F::zero() {
        -F::one()
    } else {
        F::zero()
    }
}

/// A model mapping a desired velocity and acceleration to an open-loop command
pub trait FeedforwardModel<F> {
    /// The command that would produce `velocity` and `acceleration` on an ideal plant
    fn calculate(&self, velocity: F, acceleration: F) -> F;

    /// Treats setpoints as velocities; acceleration is estimated by backward difference
    fn velocity(self) -> VelocityFeedforward<Self, F>
    where
        Self: Sized,
    {
        VelocityFeedforward {
            model: self,
            last_setpoint: None,
        }
    }

    /// Treats setpoints as positions; velocity and acceleration are estimated by successive
    /// backward differences
    fn position(self) -> PositionFeedforward<Self, F>
    where
        Self: Sized,
    {
        PositionFeedforward {
            model: self,
            last_position: None,
            last_velocity: None,
        }
    }
}

/// The DC motor model driving a flywheel: `kS * sign(v) + kV * v + kA * a`
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Flywheel<F> {
    ks: F,
    kv: F,
    ka: F,
}

impl<F: Float> Flywheel<F> {
    /// Creates a flywheel model.
    ///
    /// # Arguments
    /// - `ks`: Static friction, the command needed to just overcome stiction.
    /// - `kv`: Command per unit of velocity.
    /// - `ka`: Command per unit of acceleration.
    ///
    /// # Errors
    /// [`ConfigError::InvalidFeedforwardGain`] if any gain is negative or not finite.
    pub fn new(ks: F, kv: F, ka: F) -> Result<Self, ConfigError> {
        if !(is_valid_gain(ks) && is_valid_gain(kv) && is_valid_gain(ka)) {
            tracing::debug!("rejected flywheel feedforward gains");
            return Err(ConfigError::InvalidFeedforwardGain);
        }
        Ok(Self { ks, kv, ka })
    }

    /// Returns the static, velocity and acceleration gains
    pub fn gains(&self) -> (F, F, F) {
        (self.ks, self.kv, self.ka)
    }
}

impl<F: Float> FeedforwardModel<F> for Flywheel<F> {
    fn calculate(&self, velocity: F, acceleration: F) -> F {
        self.ks * sign(velocity) + self.kv * velocity + self.ka * acceleration
    }
}

/// A motor lifting a constant load: the flywheel model plus a gravity term `kG`
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Elevator<F> {
    kg: F,
    motor: Flywheel<F>,
}

impl<F: Float> Elevator<F> {
    /// Creates an elevator model.
    ///
    /// `kg` is the command that holds the load still; it may be negative for counterweighted
    /// mechanisms.
    ///
    /// # Errors
    /// [`ConfigError::InvalidFeedforwardGain`] if `kg` is not finite or any motor gain is invalid.
    pub fn new(kg: F, ks: F, kv: F, ka: F) -> Result<Self, ConfigError> {
        if !kg.is_finite() {
            return Err(ConfigError::InvalidFeedforwardGain);
        }
        Ok(Self {
            kg,
            motor: Flywheel::new(ks, kv, ka)?,
        })
    }

    /// The gravity gain
    pub fn kg(&self) -> F {
        self.kg
    }
}

impl<F: Float> FeedforwardModel<F> for Elevator<F> {
    fn calculate(&self, velocity: F, acceleration: F) -> F {
        self.kg + self.motor.calculate(velocity, acceleration)
    }
}

/// Feedforward law for velocity setpoints; built by [`FeedforwardModel::velocity`]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct VelocityFeedforward<M, F> {
    model: M,
    last_setpoint: Option<F>,
}

impl<M, F> VelocityFeedforward<M, F> {
    /// The underlying model
    pub fn model(&self) -> &M {
        &self.model
    }
}

impl<F: Float, M: FeedforwardModel<F>> ControlLaw<F> for VelocityFeedforward<M, F> {
    fn calculate(&mut self, setpoint: F, _measurement: F, dt: F) -> F {
        let acceleration = match (self.last_setpoint, positive_dt(dt)) {
            (Some(last), Some(dt)) => (setpoint - last) / dt,
            _ => F::zero(),
        };
        if positive_dt(dt).is_some() || self.last_setpoint.is_none() {
            self.last_setpoint = Some(setpoint);
        }
        self.model.calculate(setpoint, acceleration)
    }

    fn reset(&mut self) {
        self.last_setpoint = None;
    }
}

/// Feedforward law for position setpoints; built by [`FeedforwardModel::position`]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PositionFeedforward<M, F> {
    model: M,
    last_position: Option<F>,
    last_velocity: Option<F>,
}

impl<M, F> PositionFeedforward<M, F> {
    /// The underlying model
    pub fn model(&self) -> &M {
        &self.model
    }
}

impl<F: Float, M: FeedforwardModel<F>> ControlLaw<F> for PositionFeedforward<M, F> {
    fn calculate(&mut self, setpoint: F, _measurement: F, dt: F) -> F {
        let dt = match positive_dt(dt) {
            Some(dt) => dt,
            None => {
                if self.last_position.is_none() {
                    self.last_position = Some(setpoint);
                }
                let velocity = self.last_velocity.unwrap_or_else(F::zero);
                return self.model.calculate(velocity, F::zero());
            }
        };

        let velocity = self.last_position.map(|last| (setpoint - last) / dt);
        let acceleration = match (velocity, self.last_velocity) {
            (Some(velocity), Some(last)) => (velocity - last) / dt,
            _ => F::zero(),
        };
        self.last_position = Some(setpoint);
        self.last_velocity = velocity;

        self.model
            .calculate(velocity.unwrap_or_else(F::zero), acceleration)
    }

    fn reset(&mut self) {
        self.last_position = None;
        self.last_velocity = None;
    }
}
