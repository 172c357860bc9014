/// eng
/// Stiff integration of the CNO network: the StiffSystem/StiffStepper seam and the
/// IntegratorError enum, dispatched over the available steppers with enum_dispatch.
pub mod stiff_solvers;
/// eng
/// Adaptive 4-stage Rosenbrock stepper with embedded error estimate and step control.
pub mod rosenbrock;
/// eng
/// Fixed-step linearly implicit Euler stepper: (I/h - J) dy = f(y).
pub mod implicit_euler;
/// eng
/// Post-step clamp of abundances whose mass fraction fell below the floor (1e-20).
pub mod stabilizer;
/// eng
/// Single-cell time loop: NotStarted -> Running -> Completed | Aborted, clamping and
/// recording after each accepted step.
/// # Examples
/// ```
/// use CNOnet::BurningIVP::burn_driver::{BurnDriver, RunStatus};
/// use CNOnet::BurningIVP::rosenbrock::Rosenbrock4;
/// use CNOnet::NuclearKinetics::isotopes::{Abundances, Isotope};
/// use CNOnet::NuclearKinetics::reaction_network::PlasmaConditions;
/// let mut y0 = Abundances::zeros();
/// y0[Isotope::H1.index()] = 147.0;
/// y0[Isotope::C12.index()] = 0.125;
/// let mut driver = BurnDriver::new(
///     PlasmaConditions::new(1.5e7, 150.0),
///     y0,
///     0.0,
///     1.0,
///     1e-8,
///     Rosenbrock4::new(1e-8, 0.0).into(),
/// );
/// let trajectory = driver.run();
/// assert_eq!(driver.status(), &RunStatus::Completed);
/// assert!(trajectory.last().abundances[Isotope::He4.index()] >= 0.0);
/// ```
pub mod burn_driver;
/// eng
/// Grid of independent cells sharing the nominal (t_now, h), one step per cell per sweep.
pub mod grid_driver;
