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

use std::collections::HashMap;
use std::thread;

use control_chain::closed_loop::{
    tunable_fn, Actuator, ClosedLoop, LoopState, Telemetry, TunableNumber, ERROR_KEY,
    MEASUREMENT_KEY, OUTPUT_KEY, SETPOINT_KEY,
};
use control_chain::controller::Controller;
use control_chain::error::ConfigError;
use control_chain::filter::LowPassFilter;
use control_chain::pid::PidController;
use control_chain::time::TimeF64;

use approx::assert_relative_eq;

#[derive(Debug, Default)]
struct RecordingActuator {
    measurement: f64,
    commands: Vec<f64>,
    stops: usize,
}

impl Actuator<f64> for RecordingActuator {
    fn set(&mut self, output: f64) {
        self.commands.push(output);
    }

    fn stop(&mut self) {
        self.stops += 1;
    }

    fn measurement(&self) -> f64 {
        self.measurement
    }
}

#[derive(Debug, Default)]
struct Dashboard {
    entries: HashMap<String, f64>,
}

impl Telemetry<f64> for Dashboard {
    fn put_number(&mut self, key: &str, value: f64) {
        self.entries.insert(key.to_owned(), value);
    }
}

fn make_regulator() -> Controller<TimeF64, f64, PidController<f64>> {
    Controller::new(PidController::from_gains(1.0, 0.0, 0.0).unwrap(), TimeF64(0.0))
}

fn at(k: u32) -> TimeF64 {
    TimeF64(0.02 * k as f64)
}

mod test_states {
    use super::*;

    #[test]
    fn test_drives_actuator_outside_tolerance() {
        let mut shooter =
            ClosedLoop::new(make_regulator(), RecordingActuator::default(), 2.0, 0.5).unwrap();
        assert_eq!(shooter.state(), None);

        // Both filtered values start at zero, but the regulator is updated before the check
        assert_eq!(shooter.tick(at(1)), LoopState::Running);
        assert_eq!(shooter.state(), Some(LoopState::Running));
        assert_eq!(shooter.actuator().commands, vec![2.0]);
        assert_eq!(shooter.actuator().stops, 0);
    }

    #[test]
    fn test_stops_actuator_within_tolerance() {
        let actuator = RecordingActuator {
            measurement: 1.8,
            ..Default::default()
        };
        let mut shooter = ClosedLoop::new(make_regulator(), actuator, 2.0, 0.5).unwrap();

        assert_eq!(shooter.tick(at(1)), LoopState::Holding);
        assert_eq!(shooter.tick(at(2)), LoopState::Holding);
        assert!(shooter.actuator().commands.is_empty());
        assert_eq!(shooter.actuator().stops, 2);

        // A disturbance pushes the measurement back out of tolerance
        shooter.actuator_mut().measurement = 1.0;
        assert_eq!(shooter.tick(at(3)), LoopState::Running);
        assert_eq!(shooter.actuator().commands.len(), 1);
        assert_relative_eq!(shooter.actuator().commands[0], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_no_hysteresis_at_boundary() {
        let actuator = RecordingActuator {
            measurement: 0.75,
            ..Default::default()
        };
        let mut shooter = ClosedLoop::new(make_regulator(), actuator, 1.0, 0.25).unwrap();

        // An error of exactly the tolerance counts as done
        assert_eq!(shooter.tick(at(1)), LoopState::Holding);

        let mut states = vec![];
        for k in 2..8 {
            shooter.actuator_mut().measurement = if k % 2 == 0 { 0.7 } else { 0.75 };
            states.push(shooter.tick(at(k)));
        }
        assert_eq!(
            states,
            vec![
                LoopState::Running,
                LoopState::Holding,
                LoopState::Running,
                LoopState::Holding,
                LoopState::Running,
                LoopState::Holding,
            ]
        );
    }

    #[test]
    fn test_regulator_tracks_while_holding() {
        let regulator = make_regulator().with_setpoint_filter(LowPassFilter::new(0.2).unwrap());
        let mut shooter =
            ClosedLoop::new(regulator, RecordingActuator::default(), 5.0, 10.0).unwrap();

        let mut last = 0.0;
        for k in 1..10 {
            assert_eq!(shooter.tick(at(k)), LoopState::Holding);
            assert!(shooter.regulator().setpoint() > last);
            last = shooter.regulator().setpoint();
        }
    }

    #[test]
    fn test_integral_accumulates_while_holding() {
        let regulator = Controller::new(
            PidController::from_gains(1.0, 1.0, 0.0).unwrap(),
            TimeF64(0.0),
        );
        let actuator = RecordingActuator {
            measurement: 1.8,
            ..Default::default()
        };
        let mut shooter = ClosedLoop::new(regulator, actuator, 2.0, 0.5).unwrap();

        let mut last = 0.0;
        for k in 1..=10 {
            assert_eq!(shooter.tick(at(k)), LoopState::Holding);
            let integral = shooter.regulator().law().integral();
            assert!(integral > last);
            last = integral;
        }
        assert_relative_eq!(last, 10.0 * 0.2 * 0.02, epsilon = 1e-9);

        // The error integrated while holding is released on the next running tick
        shooter.actuator_mut().measurement = 1.0;
        assert_eq!(shooter.tick(at(11)), LoopState::Running);
        assert_relative_eq!(
            shooter.actuator().commands[0],
            1.0 + last + 1.0 * 0.02,
            epsilon = 1e-9
        );

        shooter.regulator_mut().reset();
        assert_eq!(shooter.regulator().law().integral(), 0.0);
    }

    #[test]
    fn test_invalid_tolerance() {
        for it in [-0.1, f64::NAN] {
            assert_eq!(
                ClosedLoop::new(make_regulator(), RecordingActuator::default(), 1.0, it)
                    .map(|_| ()),
                Err(ConfigError::InvalidTolerance)
            );
        }

        let mut shooter =
            ClosedLoop::new(make_regulator(), RecordingActuator::default(), 1.0, 0.0).unwrap();
        assert_eq!(
            shooter.set_tolerance(f64::NAN),
            Err(ConfigError::InvalidTolerance)
        );
        assert_eq!(shooter.tolerance(), 0.0);
        assert!(shooter.set_tolerance(0.1).is_ok());
        assert_eq!(shooter.tolerance(), 0.1);
    }
}

mod test_setpoint_sources {
    use super::*;

    #[test]
    fn test_tunable_number_shared_across_threads() {
        let target = TunableNumber::new(1.0);
        let mut shooter = ClosedLoop::new(
            make_regulator(),
            RecordingActuator::default(),
            target.clone(),
            0.0,
        )
        .unwrap();

        shooter.tick(at(1));
        assert_eq!(shooter.regulator().setpoint(), 1.0);

        let remote = target.clone();
        thread::spawn(move || remote.set(5.0)).join().unwrap();
        assert_eq!(target.get(), 5.0);

        shooter.tick(at(2));
        assert_eq!(shooter.regulator().setpoint(), 5.0);
        assert_eq!(shooter.actuator().commands, vec![1.0, 5.0]);
    }

    #[test]
    fn test_callback_setpoint() {
        let mut shooter = ClosedLoop::new(
            make_regulator(),
            RecordingActuator::default(),
            tunable_fn(|| 3.0),
            0.1,
        )
        .unwrap();

        shooter.tick(at(1));
        assert_eq!(shooter.regulator().setpoint(), 3.0);
    }
}

mod test_telemetry {
    use super::*;

    #[test]
    fn test_publish() {
        let actuator = RecordingActuator {
            measurement: 0.5,
            ..Default::default()
        };
        let mut shooter = ClosedLoop::new(make_regulator(), actuator, 2.0, 0.1).unwrap();
        shooter.tick(at(1));

        let mut dashboard = Dashboard::default();
        shooter.publish(&mut dashboard);

        assert_eq!(dashboard.entries.len(), 4);
        assert_eq!(dashboard.entries[SETPOINT_KEY], 2.0);
        assert_eq!(dashboard.entries[MEASUREMENT_KEY], 0.5);
        assert_eq!(dashboard.entries[ERROR_KEY], 1.5);
        assert_eq!(dashboard.entries[OUTPUT_KEY], 1.5);
    }
}
