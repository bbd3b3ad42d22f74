#![warn(missing_docs)]

//! # Composable Control Chains
//!
//! This library builds discrete control loops out of small parts that share one contract: a
//! feedback law, feedforward laws, and stateful filters on the setpoint, the measurement and the
//! output, combined into a single `update(setpoint, measurement, now) -> output` with a
//! convergence check.
//!
//! ## Features
//!
//! - A PID feedback law with fully validated configuration:
//!   - Integral accumulation with the gain folded in, for bumpless retuning.
//!   - Anti reset-windup: bounded output, bounded integral, and an optional error range beyond
//!     which the integral is cleared.
//!   - Optional derivative-on-measurement and a low-pass filter on the derivative term.
//!   - Both a functional (`FuncPidController` + `PidContext`) and a stateful (`PidController`)
//!     form.
//!
//! - Feedforward models (`Flywheel`, `Elevator`) adapted to velocity or position setpoints.
//!
//! - Filters (`RateLimit`, `LowPassFilter`, `HighPassFilter`, `MovingAverage`, `Clamp`, closures)
//!   chained in order with `then`, or collected at runtime in a `FilterChain`.
//!
//! - Explicit time: every cycle is driven by a timestamp (`update`) or a step size (`step`);
//!   zero or backwards steps are absorbed without dividing by zero.
//!
//! ## Usage
//!
//! ### Composing a controller
//!
//! Laws are summed with `and`; filters are sequenced with `then`. The result is a plain value with
//! no allocation and no dynamic dispatch.
//!
//! ```rust
//! use control_chain::controller::Controller;
//! use control_chain::feedforward::{FeedforwardModel, Flywheel};
//! use control_chain::filter::{Filter, LowPassFilter, RateLimit};
//! use control_chain::law::ControlLaw;
//! use control_chain::pid::{PidConfigBuilder, PidController};
//! use control_chain::time::Millis;
//!
//! let config = PidConfigBuilder::default()
//!     .kp(1.0)
//!     .ki(0.1)
//!     .integral_limit(5.0)
//!     .build()
//!     .expect("Invalid PID config");
//! let feedforward = Flywheel::new(0.1, 0.01, 0.01).expect("Invalid feedforward gains");
//! let setpoint_filter = RateLimit::new(1000.0)
//!     .expect("Invalid rate")
//!     .then(LowPassFilter::new(0.2).expect("Invalid time constant"));
//!
//! let mut controller = Controller::new(
//!     PidController::new(config).and(feedforward.velocity()),
//!     Millis(0),
//! )
//! .with_setpoint_filter(setpoint_filter);
//!
//! let mut now = Millis(0);
//! let mut velocity = 0.0;
//! for _ in 0..10 {
//!     now.0 += 20;
//!     let output = controller.update(3000.0, velocity, now);
//!     velocity += 0.5 * output; // stand-in for the plant
//! }
//! println!("measurement: {}", controller.measurement());
//! ```
//!
//! ### Driving an actuator
//!
//! `ClosedLoop` polls a setpoint, updates the controller with the actuator's measurement, and
//! either drives or stops the actuator depending on whether the error is within tolerance.
//!
//! ```rust
//! use control_chain::closed_loop::{Actuator, ClosedLoop, LoopState};
//! use control_chain::controller::Controller;
//! use control_chain::pid::PidController;
//! use control_chain::time::TimeF64;
//!
//! struct Motor {
//!     command: f64,
//! }
//!
//! impl Actuator<f64> for Motor {
//!     fn set(&mut self, output: f64) {
//!         self.command = output;
//!     }
//!     fn stop(&mut self) {
//!         self.command = 0.0;
//!     }
//!     fn measurement(&self) -> f64 {
//!         0.0
//!     }
//! }
//!
//! let controller = Controller::new(PidController::from_gains(1.0, 0.0, 0.0).unwrap(), TimeF64(0.0));
//! let mut shooter = ClosedLoop::new(controller, Motor { command: 0.0 }, 2.0, 0.5).unwrap();
//!
//! assert_eq!(shooter.tick(TimeF64(0.02)), LoopState::Running);
//! assert_eq!(shooter.actuator().command, 2.0);
//! ```
//!
//! ## License
//!
//! MIT
#![no_std]

#[cfg(feature = "std")]
extern crate std;

#[cfg(feature = "alloc")]
extern crate alloc;

/// Owners that drive an actuator from a controller every control cycle
pub mod closed_loop;

/// The controller chain: a control law wrapped with setpoint, measurement and output filters
pub mod controller;

/// Construction-time errors
pub mod error;

/// Feedforward models and their velocity and position adapters
pub mod feedforward;

/// Stateful scalar filters and their composition
pub mod filter;

/// The contract shared by feedback and feedforward laws, and their sum
pub mod law;

/// The PID feedback law
pub mod pid;

/// The module containing time-related utilities to derive the step size between control cycles
pub mod time;

#[doc(hidden)]
#[cfg(feature = "simulation")]
pub mod sim;

#[doc = include_str!("../README.md")]
#[cfg(doctest)]
pub struct ReadmeDoctests;
