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

use crate::closed_loop::Actuator;
use crate::time::{elapsed_secs, InstantLike};

/// Shape of a [`SignalGenerator`] output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaveForm {
    Step,
    Sine,
    Square,
}

/// Produces `amplitude * wave(t) + offset` for setpoint profiles in closed-loop tests, where `t`
/// is the time in seconds since `initial_time`
#[derive(Debug, Clone, Copy)]
pub struct SignalGenerator<I> {
    waveform: WaveForm,
    initial_time: I,
    amplitude: f64,
    offset: f64,
}

impl<I: InstantLike> SignalGenerator<I> {
    pub fn new(waveform: WaveForm, initial_time: I, amplitude: f64, offset: f64) -> Self {
        Self {
            waveform,
            initial_time,
            amplitude,
            offset,
        }
    }

    pub fn generate(&self, time: I) -> f64 {
        let t: f64 = elapsed_secs(time, Some(self.initial_time));
        let wave = match self.waveform {
            WaveForm::Step => 1.0,
            WaveForm::Sine => t.sin(),
            WaveForm::Square => t.sin().signum(),
        };
        self.amplitude * wave + self.offset
    }
}

/// A first-order velocity plant standing in for a motor and flywheel:
///
/// τ v' = K u − v
///
/// Commands are held between calls to [`FirstOrderPlant::advance`], which integrates the plant
/// exactly over the step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FirstOrderPlant {
    pub gain: f64,
    pub time_constant: f64,
    velocity: f64,
    command: f64,
}

impl FirstOrderPlant {
    pub fn new(gain: f64, time_constant: f64) -> Self {
        Self {
            gain,
            time_constant,
            velocity: 0.0,
            command: 0.0,
        }
    }

    pub fn command(&self) -> f64 {
        self.command
    }

    pub fn advance(&mut self, dt: f64) {
        let steady_state = self.gain * self.command;
        let decay = (-dt / self.time_constant).exp();
        self.velocity = steady_state + (self.velocity - steady_state) * decay;
    }
}

impl Actuator<f64> for FirstOrderPlant {
    fn set(&mut self, output: f64) {
        self.command = output;
    }

    fn stop(&mut self) {
        self.command = 0.0;
    }

    fn measurement(&self) -> f64 {
        self.velocity
    }
}
