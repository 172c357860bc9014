//! # Burning task
//!
//! [`BurnTask`] gathers everything a run needs: plasma conditions, time span, stepper
//! and tolerances, initial composition, output and logging options. It is read from
//! JSON (every field optional, missing ones take the defaults below) and checked with
//! `check_task()` before anything is built from it.
//!
//! ## Defaults
//! | field | value |
//! |---|---|
//! | temperature | 1.5e7 K |
//! | density | 150 g/cm^3 |
//! | t_start .. t_stop | 0 .. 1e22 s |
//! | initial_step | 1e-8 s |
//! | abs_tol / rel_tol | 1e-8 / 0 |
//! | floor | 1e-20 |
//! | initial_mass_fractions | H1: 0.99, C12: 0.01 |
//! | stepper | Rosenbrock |
//! | output | results.dat |
//!
//! ## Example task file
//! ```json
//! {
//!   "temperature": 2.0e7,
//!   "t_stop": 1e12,
//!   "initial_mass_fractions": {"H1": 0.7, "He4": 0.28, "C12": 0.01, "N14": 0.01},
//!   "stepper": {"kind": "ImplicitEuler", "step": 0.01},
//!   "grid": [{"temperature": 1.5e7, "density": 150.0}, {"temperature": 2.5e7, "density": 80.0}]
//! }
//! ```
use crate::BurningIVP::burn_driver::BurnDriver;
use crate::BurningIVP::grid_driver::GridDriver;
use crate::BurningIVP::implicit_euler::LinearImplicitEuler;
use crate::BurningIVP::rosenbrock::Rosenbrock4;
use crate::BurningIVP::stabilizer::{AbundanceFloor, DEFAULT_FLOOR};
use crate::BurningIVP::stiff_solvers::StepperKind;
use crate::NuclearKinetics::isotopes::{Abundances, Isotope, molar_abundances};
use crate::NuclearKinetics::reaction_network::PlasmaConditions;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse task: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("unknown isotope: {0}")]
    UnknownIsotope(String),
    #[error("logger setup failed: {0}")]
    Logger(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum StepperChoice {
    Rosenbrock,
    ImplicitEuler { step: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridCellTask {
    pub temperature: f64,
    pub density: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BurnTask {
    pub temperature: f64,
    pub density: f64,
    pub t_start: f64,
    pub t_stop: f64,
    pub initial_step: f64,
    pub abs_tol: f64,
    pub rel_tol: f64,
    pub floor: f64,
    /// isotope name -> mass fraction, isotopes not listed start at the floor
    pub initial_mass_fractions: BTreeMap<String, f64>,
    pub stepper: StepperChoice,
    pub output: Option<String>,
    /// independent cells, replaces `temperature`/`density` when present
    pub grid: Option<Vec<GridCellTask>>,
    pub max_steps: Option<usize>,
    pub log_level: String,
    pub log_file: Option<String>,
}

impl Default for BurnTask {
    fn default() -> Self {
        let mut initial_mass_fractions = BTreeMap::new();
        initial_mass_fractions.insert("H1".to_string(), 0.99);
        initial_mass_fractions.insert("C12".to_string(), 0.01);
        Self {
            temperature: 1.5e7,
            density: 150.0,
            t_start: 0.0,
            t_stop: 1e22,
            initial_step: 1e-8,
            abs_tol: 1e-8,
            rel_tol: 0.0,
            floor: DEFAULT_FLOOR,
            initial_mass_fractions,
            stepper: StepperChoice::Rosenbrock,
            output: Some("results.dat".to_string()),
            grid: None,
            max_steps: None,
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}

fn invalid(msg: String) -> TaskError {
    TaskError::InvalidParameter(msg)
}

impl BurnTask {
    pub fn from_json_str(json: &str) -> Result<Self, TaskError> {
        let task: BurnTask = serde_json::from_str(json)?;
        Ok(task)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TaskError> {
        let path = path.as_ref();
        info!("loading task from {}", path.display());
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn to_json_string(&self) -> Result<String, TaskError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn check_task(&self) -> Result<(), TaskError> {
        let positive = |name: &str, value: f64| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(invalid(format!("{} must be positive, got {}", name, value)))
            }
        };
        match &self.grid {
            Some(cells) => {
                if cells.is_empty() {
                    return Err(invalid("grid must contain at least one cell".to_string()));
                }
                for (i, cell) in cells.iter().enumerate() {
                    positive(&format!("grid[{}].temperature", i), cell.temperature)?;
                    positive(&format!("grid[{}].density", i), cell.density)?;
                }
            }
            None => {
                positive("temperature", self.temperature)?;
                positive("density", self.density)?;
            }
        }
        if !(self.t_stop > self.t_start) {
            return Err(invalid(format!(
                "t_stop ({}) must be greater than t_start ({})",
                self.t_stop, self.t_start
            )));
        }
        positive("initial_step", self.initial_step)?;
        if !(self.abs_tol >= 0.0) {
            return Err(invalid(format!("abs_tol must be non-negative, got {}", self.abs_tol)));
        }
        if !(self.rel_tol >= 0.0) {
            return Err(invalid(format!("rel_tol must be non-negative, got {}", self.rel_tol)));
        }
        if self.abs_tol == 0.0 && self.rel_tol == 0.0 {
            return Err(invalid("abs_tol and rel_tol are both zero".to_string()));
        }
        if !(self.floor >= 0.0) {
            return Err(invalid(format!("floor must be non-negative, got {}", self.floor)));
        }
        if let StepperChoice::ImplicitEuler { step } = self.stepper {
            positive("stepper.step", step)?;
        }
        if self.initial_mass_fractions.is_empty() {
            return Err(invalid("initial_mass_fractions is empty".to_string()));
        }
        let mut sum = 0.0;
        for (name, x) in self.initial_mass_fractions.iter() {
            if Isotope::from_name(name).is_none() {
                return Err(TaskError::UnknownIsotope(name.clone()));
            }
            if !(x.is_finite() && *x >= 0.0) {
                return Err(invalid(format!("mass fraction of {} must be non-negative, got {}", name, x)));
            }
            sum += x;
        }
        if (sum - 1.0).abs() > 1e-6 {
            warn!("initial mass fractions sum to {}, not 1", sum);
        }
        info!("task checked!");
        Ok(())
    }

    /// mass fractions in isotope order, unlisted isotopes at the floor
    pub fn initial_mass_fraction_vector(&self) -> Result<Abundances, TaskError> {
        let mut x = Abundances::from_element(self.floor);
        for (name, value) in self.initial_mass_fractions.iter() {
            let iso = Isotope::from_name(name).ok_or_else(|| TaskError::UnknownIsotope(name.clone()))?;
            x[iso.index()] = *value;
        }
        Ok(x)
    }

    /// molar abundances Y = X * rho / M at the given density
    pub fn initial_abundances(&self, density: f64) -> Result<Abundances, TaskError> {
        Ok(molar_abundances(&self.initial_mass_fraction_vector()?, density))
    }

    pub fn conditions(&self) -> PlasmaConditions {
        PlasmaConditions::new(self.temperature, self.density)
    }

    pub fn build_stepper(&self) -> StepperKind {
        match self.stepper {
            StepperChoice::Rosenbrock => Rosenbrock4::new(self.abs_tol, self.rel_tol).into(),
            StepperChoice::ImplicitEuler { step } => LinearImplicitEuler::new(step).into(),
        }
    }

    pub fn build_driver(&self) -> Result<BurnDriver, TaskError> {
        self.check_task()?;
        let conditions = self.conditions();
        let driver = BurnDriver::new(
            conditions,
            self.initial_abundances(conditions.density)?,
            self.t_start,
            self.t_stop,
            self.initial_step,
            self.build_stepper(),
        )
        .with_floor(AbundanceFloor::new(self.floor))
        .with_max_steps(self.max_steps);
        Ok(driver)
    }

    /// `None` when the task has no grid section
    pub fn build_grid(&self) -> Result<Option<GridDriver>, TaskError> {
        self.check_task()?;
        let Some(cells) = &self.grid else {
            return Ok(None);
        };
        let mut initial = Vec::with_capacity(cells.len());
        for cell in cells.iter() {
            let conditions = PlasmaConditions::new(cell.temperature, cell.density);
            initial.push((conditions, self.initial_abundances(cell.density)?));
        }
        let grid = GridDriver::new(
            initial,
            &self.build_stepper(),
            self.t_start,
            self.t_stop,
            self.initial_step,
        )
        .with_floor(AbundanceFloor::new(self.floor))
        .with_max_sweeps(self.max_steps);
        Ok(Some(grid))
    }

    pub fn pretty_print_task(&self) {
        use prettytable::{Table, row};
        println!("\n=== CNO BURNING TASK ===");
        let mut table = Table::new();
        table.add_row(row!["Parameter", "Value", "Units"]);
        match &self.grid {
            Some(cells) => {
                for (i, cell) in cells.iter().enumerate() {
                    table.add_row(row![
                        format!("Cell {} (T, rho)", i),
                        format!("{:.3e}, {:.3}", cell.temperature, cell.density),
                        "K, g/cm^3"
                    ]);
                }
            }
            None => {
                table.add_row(row!["Temperature (T)", format!("{:.3e}", self.temperature), "K"]);
                table.add_row(row!["Density (rho)", format!("{:.3}", self.density), "g/cm^3"]);
            }
        }
        table.add_row(row!["Time span", format!("{:.3e} .. {:.3e}", self.t_start, self.t_stop), "s"]);
        table.add_row(row!["Initial step", format!("{:.3e}", self.initial_step), "s"]);
        table.add_row(row!["Stepper", format!("{:?}", self.stepper), "-"]);
        table.add_row(row!["Tolerances (abs, rel)", format!("{:e}, {:e}", self.abs_tol, self.rel_tol), "-"]);
        table.add_row(row!["Abundance floor", format!("{:e}", self.floor), "-"]);
        for (name, x) in self.initial_mass_fractions.iter() {
            table.add_row(row![format!("X0({})", name), format!("{:.4e}", x), "-"]);
        }
        table.printstd();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BurningIVP::stiff_solvers::StiffStepper;
    use approx::assert_relative_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_task_is_valid() {
        let task = BurnTask::default();
        assert!(task.check_task().is_ok());
        assert_eq!(task.temperature, 1.5e7);
        assert_eq!(task.density, 150.0);
        assert_eq!(task.t_stop, 1e22);
        assert_eq!(task.initial_step, 1e-8);
        assert_eq!(task.stepper, StepperChoice::Rosenbrock);
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let task = BurnTask::from_json_str(r#"{"temperature": 2.0e7, "t_stop": 1e10}"#).unwrap();
        assert_eq!(task.temperature, 2.0e7);
        assert_eq!(task.t_stop, 1e10);
        assert_eq!(task.density, 150.0);
        assert_eq!(task.initial_mass_fractions.get("H1"), Some(&0.99));
    }

    #[test]
    fn test_implicit_euler_and_grid_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "stepper": {{"kind": "ImplicitEuler", "step": 0.01}},
                "t_stop": 1.0,
                "grid": [{{"temperature": 1.5e7, "density": 150.0}},
                         {{"temperature": 2.5e7, "density": 80.0}}]
            }}"#
        )
        .unwrap();
        let task = BurnTask::from_file(file.path()).unwrap();
        assert_eq!(task.stepper, StepperChoice::ImplicitEuler { step: 0.01 });
        let grid = task.build_grid().unwrap().unwrap();
        assert_eq!(grid.cells.len(), 2);
        assert_eq!(grid.cells[1].conditions.density, 80.0);
        assert_eq!(grid.cells[0].stepper.name(), "LinearImplicitEuler");
    }

    #[test]
    fn test_initial_abundances_from_mass_fractions() {
        let task = BurnTask::default();
        let y = task.initial_abundances(150.0).unwrap();
        assert_relative_eq!(y[Isotope::H1.index()], 0.99 * 150.0 / 1.00794, max_relative = 1e-14);
        assert_relative_eq!(y[Isotope::C12.index()], 0.125, max_relative = 1e-14);
        assert_relative_eq!(y[Isotope::N14.index()], 1e-20 * 150.0 / 14.00307400478, max_relative = 1e-14);
    }

    #[test]
    fn test_invalid_tasks_are_rejected() {
        let mut task = BurnTask::default();
        task.temperature = -1.0;
        assert!(matches!(task.check_task(), Err(TaskError::InvalidParameter(_))));

        let mut task = BurnTask::default();
        task.t_stop = task.t_start;
        assert!(task.check_task().is_err());

        let mut task = BurnTask::default();
        task.initial_mass_fractions.insert("Fe56".to_string(), 0.1);
        assert!(matches!(task.check_task(), Err(TaskError::UnknownIsotope(name)) if name == "Fe56"));

        let mut task = BurnTask::default();
        task.stepper = StepperChoice::ImplicitEuler { step: 0.0 };
        assert!(task.check_task().is_err());

        let mut task = BurnTask::default();
        task.grid = Some(vec![]);
        assert!(task.build_grid().is_err());
    }

    #[test]
    fn test_tolerances_may_be_zero_but_not_both() {
        let mut task = BurnTask::default();
        task.abs_tol = 0.0;
        task.rel_tol = 1e-6;
        assert!(task.check_task().is_ok());

        task.rel_tol = 0.0;
        assert!(matches!(task.check_task(), Err(TaskError::InvalidParameter(_))));
        task.abs_tol = -1e-8;
        task.rel_tol = 1e-6;
        assert!(task.check_task().is_err());
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(matches!(
            BurnTask::from_json_str("{ temperature: "),
            Err(TaskError::Json(_))
        ));
        assert!(matches!(
            BurnTask::from_file("/definitely/not/here.json"),
            Err(TaskError::Io(_))
        ));
    }

    #[test]
    fn test_json_roundtrip_keeps_task() {
        let mut task = BurnTask::default();
        task.max_steps = Some(1000);
        let json = task.to_json_string().unwrap();
        assert_eq!(BurnTask::from_json_str(&json).unwrap(), task);
    }

    #[test]
    fn test_build_driver_uses_task_settings() {
        let mut task = BurnTask::default();
        task.t_stop = 5.0;
        task.floor = 1e-18;
        let driver = task.build_driver().unwrap();
        assert_eq!(driver.t_stop, 5.0);
        assert_eq!(driver.floor.floor, 1e-18);
        assert_eq!(driver.stepper.name(), "Rosenbrock4");
        assert!(task.build_grid().unwrap().is_none());
    }
}
