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

use control_chain::error::ConfigError;
use control_chain::feedforward::{Elevator, FeedforwardModel, Flywheel};
use control_chain::law::ControlLaw;
use control_chain::pid::PidController;

use approx::assert_relative_eq;

mod test_models {
    use super::*;

    #[test]
    fn test_flywheel_model() {
        let model = Flywheel::new(0.1, 1.0, 0.5).unwrap();
        assert_eq!(model.gains(), (0.1, 1.0, 0.5));

        assert_relative_eq!(model.calculate(2.0, 4.0), 0.1 + 2.0 + 2.0, epsilon = 1e-12);
        assert_relative_eq!(model.calculate(-2.0, 0.0), -0.1 - 2.0, epsilon = 1e-12);

        // No static friction compensation at rest
        assert_eq!(model.calculate(0.0, 0.0), 0.0);
    }

    #[test]
    fn test_elevator_model() {
        let model = Elevator::new(0.5, 0.1, 1.0, 0.0).unwrap();
        assert_eq!(model.kg(), 0.5);

        // Holding still only needs the gravity term
        assert_eq!(model.calculate(0.0, 0.0), 0.5);
        assert_relative_eq!(model.calculate(1.0, 3.0), 0.5 + 0.1 + 1.0, epsilon = 1e-12);

        // Counterweighted mechanisms have a negative gravity term
        assert!(Elevator::new(-0.5, 0.0, 1.0, 0.0).is_ok());
    }

    #[test]
    fn test_invalid_gains() {
        for (ks, kv, ka) in [
            (-0.1, 1.0, 0.0),
            (0.0, -1.0, 0.0),
            (0.0, 1.0, -1.0),
            (f64::NAN, 1.0, 0.0),
            (0.0, f64::INFINITY, 0.0),
        ] {
            assert_eq!(
                Flywheel::new(ks, kv, ka).map(|_| ()),
                Err(ConfigError::InvalidFeedforwardGain)
            );
            assert_eq!(
                Elevator::new(0.0, ks, kv, ka).map(|_| ()),
                Err(ConfigError::InvalidFeedforwardGain)
            );
        }

        for kg in [f64::NAN, f64::INFINITY, -f64::INFINITY] {
            assert_eq!(
                Elevator::new(kg, 0.0, 1.0, 0.0).map(|_| ()),
                Err(ConfigError::InvalidFeedforwardGain)
            );
        }
    }
}

mod test_velocity_feedforward {
    use super::*;

    fn make_law() -> impl ControlLaw<f64> {
        Flywheel::new(0.1, 1.0, 0.5).unwrap().velocity()
    }

    #[test]
    fn test_acceleration_from_setpoint_changes() {
        let mut law = make_law();

        // No previous setpoint, so no acceleration
        assert_relative_eq!(law.calculate(1.0, 0.0, 0.1), 1.1, epsilon = 1e-12);

        // (2 - 1) / 0.5 = 2 units/s^2
        assert_relative_eq!(law.calculate(2.0, 0.0, 0.5), 0.1 + 2.0 + 0.5 * 2.0, epsilon = 1e-12);

        // The measurement is ignored
        assert_relative_eq!(law.calculate(2.0, 100.0, 0.5), 2.1, epsilon = 1e-12);
    }

    #[test]
    fn test_degenerate_timestep() {
        let mut law = make_law();
        law.calculate(1.0, 0.0, 0.1);

        // No acceleration estimate, and the previous setpoint is kept
        assert_relative_eq!(law.calculate(5.0, 0.0, 0.0), 5.1, epsilon = 1e-12);
        assert_relative_eq!(law.calculate(5.0, 0.0, f64::NAN), 5.1, epsilon = 1e-12);
        assert_relative_eq!(law.calculate(2.0, 0.0, 0.5), 3.1, epsilon = 1e-12);
    }

    #[test]
    fn test_reset() {
        let mut law = make_law();
        law.calculate(1.0, 0.0, 0.1);
        law.reset();

        // A large jump right after reset does not produce an acceleration spike
        assert_relative_eq!(law.calculate(10.0, 0.0, 0.1), 10.1, epsilon = 1e-12);
    }

    #[test]
    fn test_sum_with_feedback() {
        let mut law = PidController::from_gains(1.0, 0.0, 0.0)
            .unwrap()
            .and(Flywheel::new(0.1, 1.0, 0.5).unwrap().velocity());

        // 1 from feedback plus 1.1 from feedforward
        assert_relative_eq!(law.calculate(1.0, 0.0, 0.1), 2.1, epsilon = 1e-12);
        assert_relative_eq!(law.first().output(), 1.0, epsilon = 1e-12);

        law.reset();
        assert_eq!(law.first().output(), 0.0);
    }
}

mod test_position_feedforward {
    use super::*;

    #[test]
    fn test_successive_differences() {
        let mut law = Flywheel::new(0.0, 1.0, 1.0).unwrap().position();

        // Positions 0, 1, 3 one second apart: velocities 0, 1, 2; accelerations 0, 0, 1
        assert_eq!(law.calculate(0.0, 0.0, 1.0), 0.0);
        assert_eq!(law.calculate(1.0, 0.0, 1.0), 1.0);
        assert_eq!(law.calculate(3.0, 0.0, 1.0), 3.0);
    }

    #[test]
    fn test_degenerate_timestep_holds_velocity() {
        let mut law = Flywheel::new(0.0, 1.0, 1.0).unwrap().position();
        law.calculate(0.0, 0.0, 1.0);
        law.calculate(1.0, 0.0, 1.0);
        law.calculate(3.0, 0.0, 1.0);

        // Last velocity of 2, no acceleration
        assert_eq!(law.calculate(10.0, 0.0, 0.0), 2.0);

        // The held position is still 3
        assert_eq!(law.calculate(4.0, 0.0, 1.0), 1.0 + (1.0 - 2.0));
    }

    #[test]
    fn test_elevator_holds_position() {
        let mut law = Elevator::new(0.5, 0.1, 1.0, 0.2).unwrap().position();
        for _ in 0..5 {
            assert_eq!(law.calculate(2.0, 0.0, 0.1), 0.5);
        }
        law.reset();
        assert_eq!(law.model().kg(), 0.5);
    }
}
