//! Adaptive Rosenbrock stepper (Kaps-Rentrop form with Shampine's coefficients).
//!
//! Four stages, one Jacobian and one LU decomposition of `I/(gamma h) - J` per
//! attempt, 4th order solution with an embedded 3rd order error estimate.
//! The error norm is `max_i |err_i| / (abs_tol + rel_tol |y_i|)`, a step is
//! accepted when it is <= 1.
use crate::BurningIVP::stiff_solvers::{IntegratorError, StepperStats, StiffStepper, StiffSystem};
use crate::NuclearKinetics::isotopes::{Abundances, NetworkJacobian};
use log::debug;

const SAFETY: f64 = 0.9;
const GROW: f64 = 1.5;
const PGROW: f64 = -0.25;
const SHRNK: f64 = 0.5;
const PSHRNK: f64 = -1.0 / 3.0;
const ERRCON: f64 = 0.1296;
const MAXTRY: usize = 40;

const GAM: f64 = 1.0 / 2.0;
const A21: f64 = 2.0;
const A31: f64 = 48.0 / 25.0;
const A32: f64 = 6.0 / 25.0;
const C21: f64 = -8.0;
const C31: f64 = 372.0 / 25.0;
const C32: f64 = 12.0 / 5.0;
const C41: f64 = -112.0 / 125.0;
const C42: f64 = -54.0 / 125.0;
const C43: f64 = -2.0 / 5.0;
const B1: f64 = 19.0 / 9.0;
const B2: f64 = 1.0 / 2.0;
const B3: f64 = 25.0 / 108.0;
const B4: f64 = 125.0 / 108.0;
const E1: f64 = 17.0 / 54.0;
const E2: f64 = 7.0 / 36.0;
const E3: f64 = 0.0;
const E4: f64 = 125.0 / 108.0;
const C1X: f64 = 1.0 / 2.0;
const C2X: f64 = -3.0 / 2.0;
const C3X: f64 = 121.0 / 50.0;
const C4X: f64 = 29.0 / 250.0;
const A2X: f64 = 1.0;
const A3X: f64 = 3.0 / 5.0;

#[derive(Debug, Clone)]
pub struct Rosenbrock4 {
    pub abs_tol: f64,
    pub rel_tol: f64,
    /// steps below this size are a failure, 0.0 leaves only the round-off check
    pub min_step: f64,
    pub max_tries: usize,
    stats: StepperStats,
}

impl Default for Rosenbrock4 {
    fn default() -> Self {
        Self::new(1e-8, 0.0)
    }
}

impl Rosenbrock4 {
    pub fn new(abs_tol: f64, rel_tol: f64) -> Self {
        Self {
            abs_tol,
            rel_tol,
            min_step: 0.0,
            max_tries: MAXTRY,
            stats: StepperStats::default(),
        }
    }

    pub fn with_min_step(mut self, min_step: f64) -> Self {
        self.min_step = min_step;
        self
    }

    /// one trial step of size h, returns (y_new, err)
    #[allow(clippy::too_many_arguments)]
    fn attempt(
        &mut self,
        system: &dyn StiffSystem,
        t: f64,
        y0: &Abundances,
        dydt0: &Abundances,
        jac: &NetworkJacobian,
        dfdt: &Abundances,
        h: f64,
    ) -> Result<(Abundances, Abundances), IntegratorError> {
        let a = NetworkJacobian::identity() * (1.0 / (GAM * h)) - jac;
        let lu = a.lu();
        self.stats.lu_decompositions += 1;
        if !lu.is_invertible() {
            return Err(IntegratorError::SingularMatrix { t });
        }
        let solve = |b: Abundances| lu.solve(&b).ok_or(IntegratorError::SingularMatrix { t });

        let g1 = solve(dydt0 + dfdt * (h * C1X))?;

        let y_stage = y0 + g1 * A21;
        let f2 = system.rhs(t + A2X * h, &y_stage);
        let g2 = solve(f2 + dfdt * (h * C2X) + g1 * (C21 / h))?;

        let y_stage = y0 + g1 * A31 + g2 * A32;
        let f3 = system.rhs(t + A3X * h, &y_stage);
        self.stats.rhs_evals += 2;
        let g3 = solve(f3 + dfdt * (h * C3X) + (g1 * C31 + g2 * C32) / h)?;
        let g4 = solve(f3 + dfdt * (h * C4X) + (g1 * C41 + g2 * C42 + g3 * C43) / h)?;

        let y_new = y0 + g1 * B1 + g2 * B2 + g3 * B3 + g4 * B4;
        let err = g1 * E1 + g2 * E2 + g3 * E3 + g4 * E4;
        Ok((y_new, err))
    }

    fn error_norm(&self, y0: &Abundances, err: &Abundances) -> f64 {
        let mut errmax: f64 = 0.0;
        for (e, y) in err.iter().zip(y0.iter()) {
            let scale = self.abs_tol + self.rel_tol * y.abs();
            // pure relative control: an exact zero is no error at y = 0
            if scale == 0.0 && *e == 0.0 {
                continue;
            }
            let ratio = e.abs() / scale;
            if ratio.is_nan() {
                return f64::NAN;
            }
            errmax = errmax.max(ratio);
        }
        errmax
    }
}

impl StiffStepper for Rosenbrock4 {
    fn name(&self) -> &'static str {
        "Rosenbrock4"
    }

    fn apply(
        &mut self,
        system: &dyn StiffSystem,
        t: &mut f64,
        t_stop: f64,
        h: &mut f64,
        y: &mut Abundances,
    ) -> Result<(), IntegratorError> {
        if !(h.is_finite() && *h > 0.0) {
            return Err(IntegratorError::InvalidStepSize { h: *h });
        }
        if *t >= t_stop {
            return Ok(());
        }
        let t0 = *t;
        let y0 = *y;
        let dydt0 = system.rhs(t0, &y0);
        let (jac, dfdt) = system.jacobian(t0, &y0);
        self.stats.rhs_evals += 1;
        self.stats.jacobian_evals += 1;

        let mut h_try = *h;
        for _ in 0..self.max_tries {
            let reaches_stop = h_try >= t_stop - t0;
            if reaches_stop {
                h_try = t_stop - t0;
            }
            if t0 + h_try == t0 || h_try < self.min_step {
                return Err(IntegratorError::StepSizeUnderflow { t: t0, h: h_try });
            }
            let (y_new, err) = self.attempt(system, t0, &y0, &dydt0, &jac, &dfdt, h_try)?;
            let errmax = self.error_norm(&y0, &err);
            if errmax <= 1.0 {
                if !y_new.iter().all(|v| v.is_finite()) {
                    return Err(IntegratorError::NonFiniteState { t: t0 });
                }
                self.stats.accepted += 1;
                *y = y_new;
                *t = if reaches_stop { t_stop } else { t0 + h_try };
                *h = if errmax > ERRCON {
                    SAFETY * h_try * errmax.powf(PGROW)
                } else {
                    GROW * h_try
                };
                return Ok(());
            }
            self.stats.rejected += 1;
            let h_shrunk = if errmax.is_finite() {
                SAFETY * h_try * errmax.powf(PSHRNK)
            } else {
                SHRNK * h_try
            };
            debug!("step rejected at t = {:e}: err = {:e}, h = {:e}", t0, errmax, h_try);
            h_try = h_shrunk.max(SHRNK * h_try);
        }
        Err(IntegratorError::MaxTriesExceeded {
            t: t0,
            tries: self.max_tries,
        })
    }

    fn stats(&self) -> &StepperStats {
        &self.stats
    }

    fn reset_stats(&mut self) {
        self.stats = StepperStats::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NuclearKinetics::isotopes::N_ISO;
    use approx::assert_relative_eq;

    /// y_k' = -lambda_k y_k, lambdas from 1e-6 to 1e6
    struct LinearDecay {
        lambdas: Abundances,
    }

    impl LinearDecay {
        fn new() -> Self {
            Self {
                lambdas: Abundances::from_fn(|k, _| 10f64.powi(k as i32 - 6)),
            }
        }
    }

    impl StiffSystem for LinearDecay {
        fn rhs(&self, _t: f64, y: &Abundances) -> Abundances {
            -self.lambdas.component_mul(y)
        }
        fn jacobian(&self, _t: f64, _y: &Abundances) -> (NetworkJacobian, Abundances) {
            (NetworkJacobian::from_diagonal(&(-self.lambdas)), Abundances::zeros())
        }
    }

    /// constant Jacobian 4*I, singular for h = 0.5
    struct Resonant;

    impl StiffSystem for Resonant {
        fn rhs(&self, _t: f64, y: &Abundances) -> Abundances {
            y * 4.0
        }
        fn jacobian(&self, _t: f64, _y: &Abundances) -> (NetworkJacobian, Abundances) {
            (NetworkJacobian::identity() * 4.0, Abundances::zeros())
        }
    }

    struct Poisoned;

    impl StiffSystem for Poisoned {
        fn rhs(&self, _t: f64, _y: &Abundances) -> Abundances {
            Abundances::from_element(f64::NAN)
        }
        fn jacobian(&self, _t: f64, _y: &Abundances) -> (NetworkJacobian, Abundances) {
            (NetworkJacobian::zeros(), Abundances::zeros())
        }
    }

    #[test]
    fn test_linear_decay_against_exact_solution() {
        let system = LinearDecay::new();
        let mut stepper = Rosenbrock4::new(1e-10, 1e-8);
        let mut y = Abundances::from_element(1.0);
        let mut t = 0.0;
        let mut h = 1e-6;
        let t_stop = 1.0;
        while t < t_stop {
            stepper.apply(&system, &mut t, t_stop, &mut h, &mut y).unwrap();
        }
        assert_eq!(t, t_stop);
        for k in 0..N_ISO {
            let exact = (-system.lambdas[k] * t_stop).exp();
            assert_relative_eq!(y[k], exact, epsilon = 1e-7);
        }
        let stats = stepper.stats();
        assert!(stats.accepted > 0);
        assert_eq!(stats.jacobian_evals, stats.accepted);
    }

    #[test]
    fn test_step_never_passes_stop_time() {
        let system = LinearDecay::new();
        let mut stepper = Rosenbrock4::new(1e-6, 1e-6);
        let mut y = Abundances::from_element(1.0);
        let mut t = 0.0;
        let mut h = 10.0;
        stepper.apply(&system, &mut t, 0.25, &mut h, &mut y).unwrap();
        assert!(t <= 0.25);
        while t < 0.25 {
            stepper.apply(&system, &mut t, 0.25, &mut h, &mut y).unwrap();
            assert!(t <= 0.25);
        }
        assert_eq!(t, 0.25);
    }

    #[test]
    fn test_step_grows_on_smooth_problem() {
        let system = LinearDecay {
            lambdas: Abundances::from_element(1e-3),
        };
        let mut stepper = Rosenbrock4::new(1e-8, 0.0);
        let mut y = Abundances::from_element(1.0);
        let mut t = 0.0;
        let mut h = 1e-4;
        stepper.apply(&system, &mut t, 1e6, &mut h, &mut y).unwrap();
        assert_eq!(t, 1e-4);
        assert_relative_eq!(h, GROW * 1e-4, epsilon = 1e-18);
    }

    #[test]
    fn test_singular_matrix_is_reported() {
        let mut stepper = Rosenbrock4::default();
        let mut y = Abundances::from_element(1.0);
        let mut t = 0.0;
        let mut h = 0.5;
        let result = stepper.apply(&Resonant, &mut t, 10.0, &mut h, &mut y);
        assert_eq!(result, Err(IntegratorError::SingularMatrix { t: 0.0 }));
        assert_eq!(t, 0.0);
        assert_eq!(h, 0.5);
        assert_eq!(y, Abundances::from_element(1.0));
    }

    #[test]
    fn test_non_finite_rhs_exhausts_tries() {
        let mut stepper = Rosenbrock4::default();
        let mut y = Abundances::from_element(1.0);
        let mut t = 0.0;
        let mut h = 1e-3;
        let result = stepper.apply(&Poisoned, &mut t, 1.0, &mut h, &mut y);
        assert_eq!(result, Err(IntegratorError::MaxTriesExceeded { t: 0.0, tries: MAXTRY }));
        assert_eq!(stepper.stats().rejected, MAXTRY);
    }

    #[test]
    fn test_relative_only_tolerance_with_zero_components() {
        // half of the components start (and stay) at exactly zero
        let system = LinearDecay {
            lambdas: Abundances::from_element(1.0),
        };
        let mut stepper = Rosenbrock4::new(0.0, 1e-6);
        let mut y = Abundances::from_fn(|k, _| if k % 2 == 0 { 1.0 } else { 0.0 });
        let mut t = 0.0;
        let mut h = 1e-3;
        while t < 1.0 {
            stepper.apply(&system, &mut t, 1.0, &mut h, &mut y).unwrap();
        }
        assert_eq!(t, 1.0);
        for k in 0..N_ISO {
            if k % 2 == 0 {
                assert_relative_eq!(y[k], (-1.0f64).exp(), max_relative = 1e-5);
            } else {
                assert_eq!(y[k], 0.0);
            }
        }
    }

    #[test]
    fn test_invalid_step_size() {
        let mut stepper = Rosenbrock4::default();
        let mut y = Abundances::zeros();
        let mut t = 0.0;
        let mut h = -1.0;
        let result = stepper.apply(&LinearDecay::new(), &mut t, 1.0, &mut h, &mut y);
        assert!(matches!(result, Err(IntegratorError::InvalidStepSize { .. })));
    }
}
