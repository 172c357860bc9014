//! # Stiff steppers for the burning network
//!
//! The seam between the network and the time integrators.
//!
//! ## Main Structures
//! - [`StiffSystem`]: what a stepper needs from the problem: `rhs(t, y)` and
//!   `jacobian(t, y) -> (J, df/dt)`. Implementations must be free of side effects,
//!   trial steps are thrown away after rejection.
//! - [`NetworkSystem`]: the CNO network bound to the [`PlasmaConditions`] of one cell
//! - [`StiffStepper`]: one call of `apply` advances `(t, y)` by one accepted step
//!   towards `t_stop` (never past it) and writes the proposed next step into `h`
//! - [`StepperKind`]: enum over the available steppers, dispatched with `enum_dispatch`
//!   - [`Rosenbrock4`]: adaptive 4th order Rosenbrock with embedded error estimate
//!   - [`LinearImplicitEuler`]: fixed step `(I/h - J) dy = f(y)`
//! - [`IntegratorError`]: the ways a step can fail
//!
//! ## Non-Obvious Features & Tips
//! - a failed `apply` leaves `t`, `y` and `h` untouched
//! - every stepper carries its own [`StepperStats`]; clone a stepper to give a grid
//!   cell its own counters
use crate::BurningIVP::implicit_euler::LinearImplicitEuler;
use crate::BurningIVP::rosenbrock::Rosenbrock4;
use crate::NuclearKinetics::isotopes::{Abundances, NetworkJacobian};
use crate::NuclearKinetics::reaction_network::{NetworkModel, PlasmaConditions};
use enum_dispatch::enum_dispatch;
use std::fmt;
use thiserror::Error;

pub trait StiffSystem {
    fn rhs(&self, t: f64, y: &Abundances) -> Abundances;
    /// Jacobian and explicit time derivative of the RHS
    fn jacobian(&self, t: f64, y: &Abundances) -> (NetworkJacobian, Abundances);
}

/// The network equations at fixed temperature and density
pub struct NetworkSystem<'a> {
    pub model: &'a NetworkModel,
    pub conditions: PlasmaConditions,
}

impl<'a> NetworkSystem<'a> {
    pub fn new(model: &'a NetworkModel, conditions: PlasmaConditions) -> Self {
        Self { model, conditions }
    }
}

impl StiffSystem for NetworkSystem<'_> {
    fn rhs(&self, _t: f64, y: &Abundances) -> Abundances {
        self.model.rhs(y, self.conditions.temperature)
    }

    fn jacobian(&self, _t: f64, y: &Abundances) -> (NetworkJacobian, Abundances) {
        let temperature = self.conditions.temperature;
        (
            self.model.jacobian(y, temperature),
            self.model.time_derivative(y, temperature),
        )
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum IntegratorError {
    #[error("singular iteration matrix at t = {t:e}")]
    SingularMatrix { t: f64 },
    #[error("step size underflow at t = {t:e}, h = {h:e}")]
    StepSizeUnderflow { t: f64, h: f64 },
    #[error("step rejected {tries} times in a row at t = {t:e}")]
    MaxTriesExceeded { t: f64, tries: usize },
    #[error("non-finite state at t = {t:e}")]
    NonFiniteState { t: f64 },
    #[error("invalid step size h = {h:e}")]
    InvalidStepSize { h: f64 },
    #[error("step limit of {max_steps} accepted steps reached at t = {t:e}")]
    MaxStepsExceeded { t: f64, max_steps: usize },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepperStats {
    pub accepted: usize,
    pub rejected: usize,
    pub rhs_evals: usize,
    pub jacobian_evals: usize,
    pub lu_decompositions: usize,
}

impl fmt::Display for StepperStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "accepted: {}, rejected: {}, rhs: {}, jacobian: {}, LU: {}",
            self.accepted, self.rejected, self.rhs_evals, self.jacobian_evals, self.lu_decompositions
        )
    }
}

#[enum_dispatch]
pub trait StiffStepper {
    fn name(&self) -> &'static str;
    /// Advances `(t, y)` by one accepted step, never past `t_stop`.
    /// On success `h` holds the step proposed for the next call.
    fn apply(
        &mut self,
        system: &dyn StiffSystem,
        t: &mut f64,
        t_stop: f64,
        h: &mut f64,
        y: &mut Abundances,
    ) -> Result<(), IntegratorError>;
    fn stats(&self) -> &StepperStats;
    fn reset_stats(&mut self);
}

#[enum_dispatch(StiffStepper)]
#[derive(Debug, Clone)]
pub enum StepperKind {
    Rosenbrock4(Rosenbrock4),
    LinearImplicitEuler(LinearImplicitEuler),
}
