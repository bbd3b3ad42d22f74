// The uniform contract shared by feedback and feedforward laws
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

use core::ops::Add;

/// A control law maps a setpoint and a measurement to an actuator command.
///
/// Feedback laws such as [`PidController`](crate::pid::PidController) act on the error between
/// the two; feedforward laws such as
/// [`VelocityFeedforward`](crate::feedforward::VelocityFeedforward) ignore the measurement and
/// predict the command from the setpoint trajectory alone. `dt` is the time in seconds since the
/// previous call; laws must tolerate `dt <= 0` without dividing by it.
pub trait ControlLaw<F> {
    /// Computes the command for one control cycle
    fn calculate(&mut self, setpoint: F, measurement: F, dt: F) -> F;

    /// Clears accumulated state such as integrals and derivative history
    fn reset(&mut self) {}

    /// Combines two laws into one whose command is the sum of both commands.
    ///
    /// Both laws see the same setpoint and measurement. Sums nest, so
    /// `pid.and(flywheel.velocity()).and(gravity)` is a valid law.
    fn and<B>(self, other: B) -> Sum<Self, B>
    where
        Self: Sized,
        B: ControlLaw<F>,
    {
        Sum {
            first: self,
            second: other,
        }
    }
}

/// Two control laws whose commands are added; built by [`ControlLaw::and`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sum<A, B> {
    first: A,
    second: B,
}

impl<A, B> Sum<A, B> {
    /// The left-hand law
    pub fn first(&self) -> &A {
        &self.first
    }

    /// Mutable access to the left-hand law, e.g. for retuning
    pub fn first_mut(&mut self) -> &mut A {
        &mut self.first
    }

    /// The right-hand law
    pub fn second(&self) -> &B {
        &self.second
    }

    /// Mutable access to the right-hand law
    pub fn second_mut(&mut self) -> &mut B {
        &mut self.second
    }
}

impl<F, A, B> ControlLaw<F> for Sum<A, B>
where
    F: Copy + Add<Output = F>,
    A: ControlLaw<F>,
    B: ControlLaw<F>,
{
    fn calculate(&mut self, setpoint: F, measurement: F, dt: F) -> F {
        self.first.calculate(setpoint, measurement, dt)
            + self.second.calculate(setpoint, measurement, dt)
    }

    fn reset(&mut self) {
        self.first.reset();
        self.second.reset();
    }
}
