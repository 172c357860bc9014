//! # Single-cell burning driver
//!
//! Time loop of one burning cell at constant temperature and density.
//!
//! ## Purpose
//! Advances the isotope abundances from `t_start` to `t_stop` by repeated calls to a
//! [`StiffStepper`]. After every accepted step the abundances are clamped with
//! [`AbundanceFloor`] and the step is handed to the caller (or recorded in a
//! [`Trajectory`]).
//!
//! ## Main Structures
//! - [`RunStatus`]: `NotStarted -> Running -> {Completed | Aborted}`
//! - [`BurnDriver`]: owns the state `(t_now, h, Y)`, the stepper and the floor
//! - [`Trajectory`]: initial point plus one point per accepted step
//!
//! ## Non-Obvious Features & Tips
//! - integrator failure is fatal: the status becomes `Aborted(err)` and no more steps
//!   are taken, the last recorded point is the last accepted step
//! - the stepper proposes the next `h`, the driver only carries it
//! - `max_steps` is a guard against runaway runs, hitting it aborts the run
use crate::BurningIVP::stabilizer::AbundanceFloor;
use crate::BurningIVP::stiff_solvers::{IntegratorError, NetworkSystem, StepperKind, StiffStepper};
use crate::NuclearKinetics::isotopes::{Abundances, Isotope, baryon_density, mass_fractions};
use crate::NuclearKinetics::reaction_network::{NetworkModel, PlasmaConditions};
use log::{debug, error, info};

#[derive(Debug, Clone, PartialEq)]
pub enum RunStatus {
    NotStarted,
    Running,
    Completed,
    Aborted(IntegratorError),
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Aborted(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrajectoryPoint {
    pub t: f64,
    pub abundances: Abundances,
}

#[derive(Debug, Clone)]
pub struct Trajectory {
    pub initial: TrajectoryPoint,
    /// one point per accepted step
    pub steps: Vec<TrajectoryPoint>,
}

impl Trajectory {
    pub fn last(&self) -> &TrajectoryPoint {
        self.steps.last().unwrap_or(&self.initial)
    }

    /// time series of one isotope, initial point included
    pub fn history(&self, isotope: Isotope) -> Vec<(f64, f64)> {
        std::iter::once(&self.initial)
            .chain(self.steps.iter())
            .map(|p| (p.t, p.abundances[isotope.index()]))
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct BurnDriver {
    pub model: NetworkModel,
    pub conditions: PlasmaConditions,
    pub stepper: StepperKind,
    pub floor: AbundanceFloor,
    pub t_now: f64,
    pub t_stop: f64,
    pub h: f64,
    pub y: Abundances,
    pub max_steps: Option<usize>,
    initial: TrajectoryPoint,
    status: RunStatus,
    steps: usize,
}

impl BurnDriver {
    pub fn new(
        conditions: PlasmaConditions,
        y0: Abundances,
        t_start: f64,
        t_stop: f64,
        h0: f64,
        stepper: StepperKind,
    ) -> Self {
        Self {
            model: NetworkModel::new(),
            conditions,
            stepper,
            floor: AbundanceFloor::default(),
            t_now: t_start,
            t_stop,
            h: h0,
            y: y0,
            max_steps: None,
            initial: TrajectoryPoint {
                t: t_start,
                abundances: y0,
            },
            status: RunStatus::NotStarted,
            steps: 0,
        }
    }

    pub fn with_floor(mut self, floor: AbundanceFloor) -> Self {
        self.floor = floor;
        self
    }

    pub fn with_max_steps(mut self, max_steps: Option<usize>) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn status(&self) -> &RunStatus {
        &self.status
    }

    pub fn accepted_steps(&self) -> usize {
        self.steps
    }

    /// Takes one accepted step. Returns true if the state advanced.
    pub fn step(&mut self) -> bool {
        match self.status {
            RunStatus::Completed | RunStatus::Aborted(_) => return false,
            RunStatus::NotStarted => {
                info!(
                    "burning started: T = {:e} K, rho = {} g/cm^3, t = {:e} .. {:e} s, stepper {}",
                    self.conditions.temperature,
                    self.conditions.density,
                    self.t_now,
                    self.t_stop,
                    self.stepper.name()
                );
                self.status = RunStatus::Running;
            }
            RunStatus::Running => {}
        }
        if self.t_now >= self.t_stop {
            self.status = RunStatus::Completed;
            return false;
        }
        if let Some(max_steps) = self.max_steps {
            if self.steps >= max_steps {
                let err = IntegratorError::MaxStepsExceeded {
                    t: self.t_now,
                    max_steps,
                };
                error!("burning aborted: {}", err);
                self.status = RunStatus::Aborted(err);
                return false;
            }
        }
        let system = NetworkSystem::new(&self.model, self.conditions);
        match self
            .stepper
            .apply(&system, &mut self.t_now, self.t_stop, &mut self.h, &mut self.y)
        {
            Ok(()) => {
                let zeroed = self.floor.apply(&mut self.y, self.conditions.density);
                if zeroed > 0 {
                    debug!("{} isotopes dropped below the floor at t = {:e}", zeroed, self.t_now);
                }
                self.steps += 1;
                if self.t_now >= self.t_stop {
                    info!(
                        "burning completed at t = {:e} s after {} steps ({})",
                        self.t_now,
                        self.steps,
                        self.stepper.stats()
                    );
                    self.status = RunStatus::Completed;
                }
                true
            }
            Err(err) => {
                error!("burning aborted after {} steps: {}", self.steps, err);
                self.status = RunStatus::Aborted(err);
                false
            }
        }
    }

    /// Runs to a terminal status, calling `on_step` after every accepted step
    pub fn run_with<F: FnMut(f64, &Abundances)>(&mut self, mut on_step: F) -> RunStatus {
        while !self.status.is_terminal() {
            if self.step() {
                on_step(self.t_now, &self.y);
            }
        }
        self.status.clone()
    }

    pub fn run(&mut self) -> Trajectory {
        let mut steps = Vec::new();
        self.run_with(|t, y| {
            steps.push(TrajectoryPoint { t, abundances: *y })
        });
        Trajectory {
            initial: self.initial.clone(),
            steps,
        }
    }

    pub fn pretty_print_summary(&self) {
        use prettytable::{Table, row};
        println!("\n=== CNO BURNING SUMMARY ===");
        let mut table = Table::new();
        table.add_row(row!["Parameter", "Value", "Units"]);
        table.add_row(row!["Temperature (T)", format!("{:.3e}", self.conditions.temperature), "K"]);
        table.add_row(row!["Density (rho)", format!("{:.3}", self.conditions.density), "g/cm^3"]);
        table.add_row(row!["Time reached", format!("{:.4e}", self.t_now), "s"]);
        table.add_row(row!["Status", format!("{:?}", self.status), "-"]);
        table.add_row(row!["Stepper", self.stepper.name(), "-"]);
        let stats = self.stepper.stats();
        table.add_row(row!["Accepted steps", stats.accepted, "-"]);
        table.add_row(row!["Rejected steps", stats.rejected, "-"]);
        table.add_row(row!["RHS evaluations", stats.rhs_evals, "-"]);
        table.add_row(row!["Jacobian evaluations", stats.jacobian_evals, "-"]);
        table.add_row(row![
            "Baryon density drift",
            format!(
                "{:.3e}",
                baryon_density(&self.y) / baryon_density(&self.initial.abundances) - 1.0
            ),
            "-"
        ]);
        table.printstd();

        let x0 = mass_fractions(&self.initial.abundances, self.conditions.density);
        let x = mass_fractions(&self.y, self.conditions.density);
        let mut composition = Table::new();
        composition.add_row(row!["Isotope", "X initial", "X final"]);
        for iso in Isotope::ALL {
            composition.add_row(row![
                iso.name(),
                format!("{:.4e}", x0[iso.index()]),
                format!("{:.4e}", x[iso.index()])
            ]);
        }
        composition.printstd();
    }
}
