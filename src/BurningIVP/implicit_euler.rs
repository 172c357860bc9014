//! Fixed-step linearly implicit Euler: `(I/h - J) dy = f(y)`, `y <- y + dy`.
//!
//! First order, no error control, one LU decomposition per step. Robust for the
//! stiff network as long as the step is small compared to the burning timescale,
//! useful as a cheap cross-check of the adaptive stepper.
use crate::BurningIVP::stiff_solvers::{IntegratorError, StepperStats, StiffStepper, StiffSystem};
use crate::NuclearKinetics::isotopes::{Abundances, NetworkJacobian};

#[derive(Debug, Clone)]
pub struct LinearImplicitEuler {
    /// fixed step, s
    pub step: f64,
    stats: StepperStats,
}

impl LinearImplicitEuler {
    pub fn new(step: f64) -> Self {
        Self {
            step,
            stats: StepperStats::default(),
        }
    }
}

impl StiffStepper for LinearImplicitEuler {
    fn name(&self) -> &'static str {
        "LinearImplicitEuler"
    }

    fn apply(
        &mut self,
        system: &dyn StiffSystem,
        t: &mut f64,
        t_stop: f64,
        h: &mut f64,
        y: &mut Abundances,
    ) -> Result<(), IntegratorError> {
        if !(self.step.is_finite() && self.step > 0.0) {
            return Err(IntegratorError::InvalidStepSize { h: self.step });
        }
        if *t >= t_stop {
            return Ok(());
        }
        let reaches_stop = self.step >= t_stop - *t;
        let h_used = if reaches_stop { t_stop - *t } else { self.step };
        if *t + h_used == *t {
            return Err(IntegratorError::StepSizeUnderflow { t: *t, h: h_used });
        }

        let dydt = system.rhs(*t, y);
        let (jac, _dfdt) = system.jacobian(*t, y);
        self.stats.rhs_evals += 1;
        self.stats.jacobian_evals += 1;

        let a = NetworkJacobian::identity() * (1.0 / h_used) - jac;
        let lu = a.lu();
        self.stats.lu_decompositions += 1;
        let dy = lu
            .solve(&dydt)
            .ok_or(IntegratorError::SingularMatrix { t: *t })?;
        let y_new = *y + dy;
        if !y_new.iter().all(|v| v.is_finite()) {
            return Err(IntegratorError::NonFiniteState { t: *t });
        }
        *y = y_new;
        *t = if reaches_stop { t_stop } else { *t + h_used };
        *h = self.step;
        self.stats.accepted += 1;
        Ok(())
    }

    fn stats(&self) -> &StepperStats {
        &self.stats
    }

    fn reset_stats(&mut self) {
        self.stats = StepperStats::default();
    }
}
