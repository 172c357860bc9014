//! # Grid of independent burning cells
//!
//! Every cell has its own conditions, abundances and stepper (own counters), but all
//! cells share the nominal time `t_now` and step `h`. One sweep is one time increment:
//!
//! 1. each cell gets a FRESH copy of the shared `(t_now, h)` and takes one step
//! 2. the cell is clamped
//! 3. after the sweep the shared `(t_now, h)` become those of the LAST cell
//!
//! So cells never see the post-step values of the cells before them. Cells with
//! different conditions may end a sweep at different times, which is reported
//! with `warn!`. A sweep in which any cell fails commits nothing: the grid stays at
//! the last completed sweep and the status becomes `Aborted`.
use crate::BurningIVP::burn_driver::RunStatus;
use crate::BurningIVP::stabilizer::AbundanceFloor;
use crate::BurningIVP::stiff_solvers::{IntegratorError, NetworkSystem, StepperKind, StiffStepper};
use crate::NuclearKinetics::isotopes::Abundances;
use crate::NuclearKinetics::reaction_network::{NetworkModel, PlasmaConditions};
use log::{error, info, warn};

#[derive(Debug, Clone)]
pub struct GridCell {
    pub conditions: PlasmaConditions,
    pub y: Abundances,
    pub stepper: StepperKind,
    /// time reached in the last sweep
    pub t: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridSnapshot {
    pub t: f64,
    pub cell_times: Vec<f64>,
    pub cells: Vec<Abundances>,
}

#[derive(Debug, Clone)]
pub struct GridDriver {
    pub model: NetworkModel,
    pub cells: Vec<GridCell>,
    pub floor: AbundanceFloor,
    pub t_now: f64,
    pub t_stop: f64,
    pub h: f64,
    pub max_sweeps: Option<usize>,
    status: RunStatus,
    sweeps: usize,
}

impl GridDriver {
    /// every cell gets its own clone of `stepper`
    pub fn new(
        cells: Vec<(PlasmaConditions, Abundances)>,
        stepper: &StepperKind,
        t_start: f64,
        t_stop: f64,
        h0: f64,
    ) -> Self {
        let cells = cells
            .into_iter()
            .map(|(conditions, y)| GridCell {
                conditions,
                y,
                stepper: stepper.clone(),
                t: t_start,
            })
            .collect();
        Self {
            model: NetworkModel::new(),
            cells,
            floor: AbundanceFloor::default(),
            t_now: t_start,
            t_stop,
            h: h0,
            max_sweeps: None,
            status: RunStatus::NotStarted,
            sweeps: 0,
        }
    }

    pub fn with_floor(mut self, floor: AbundanceFloor) -> Self {
        self.floor = floor;
        self
    }

    pub fn with_max_sweeps(mut self, max_sweeps: Option<usize>) -> Self {
        self.max_sweeps = max_sweeps;
        self
    }

    pub fn status(&self) -> &RunStatus {
        &self.status
    }

    pub fn sweeps(&self) -> usize {
        self.sweeps
    }

    /// One time increment over all cells. Returns true if the cells advanced.
    pub fn sweep(&mut self) -> bool {
        match self.status {
            RunStatus::Completed | RunStatus::Aborted(_) => return false,
            RunStatus::NotStarted => {
                info!(
                    "grid burning started: {} cells, t = {:e} .. {:e} s",
                    self.cells.len(),
                    self.t_now,
                    self.t_stop
                );
                self.status = RunStatus::Running;
            }
            RunStatus::Running => {}
        }
        if self.t_now >= self.t_stop || self.cells.is_empty() {
            self.status = RunStatus::Completed;
            return false;
        }
        if let Some(max_sweeps) = self.max_sweeps {
            if self.sweeps >= max_sweeps {
                let err = IntegratorError::MaxStepsExceeded {
                    t: self.t_now,
                    max_steps: max_sweeps,
                };
                error!("grid burning aborted: {}", err);
                self.status = RunStatus::Aborted(err);
                return false;
            }
        }

        let (shared_t, shared_h) = (self.t_now, self.h);
        let mut staged = Vec::with_capacity(self.cells.len());
        for (i, cell) in self.cells.iter_mut().enumerate() {
            let mut t = shared_t;
            let mut h = shared_h;
            let mut y = cell.y;
            let system = NetworkSystem::new(&self.model, cell.conditions);
            if let Err(err) = cell.stepper.apply(&system, &mut t, self.t_stop, &mut h, &mut y) {
                error!("grid burning aborted in cell {}: {}", i, err);
                self.status = RunStatus::Aborted(err);
                return false;
            }
            self.floor.apply(&mut y, cell.conditions.density);
            staged.push((y, t, h));
        }
        // the sweep is committed only when every cell succeeded
        let (mut last_t, mut last_h) = (shared_t, shared_h);
        for (cell, (y, t, h)) in self.cells.iter_mut().zip(staged) {
            cell.y = y;
            cell.t = t;
            last_t = t;
            last_h = h;
        }
        if self.cells.iter().any(|cell| cell.t != last_t) {
            warn!(
                "grid cells reached different times in sweep {}, shared time taken from the last cell: {:e}",
                self.sweeps, last_t
            );
        }
        self.t_now = last_t;
        self.h = last_h;
        self.sweeps += 1;
        if self.t_now >= self.t_stop {
            info!("grid burning completed at t = {:e} s after {} sweeps", self.t_now, self.sweeps);
            self.status = RunStatus::Completed;
        }
        true
    }

    pub fn snapshot(&self) -> GridSnapshot {
        GridSnapshot {
            t: self.t_now,
            cell_times: self.cells.iter().map(|c| c.t).collect(),
            cells: self.cells.iter().map(|c| c.y).collect(),
        }
    }

    /// runs to a terminal status, one snapshot per sweep
    pub fn run(&mut self) -> Vec<GridSnapshot> {
        let mut snapshots = Vec::new();
        while !self.status.is_terminal() {
            if self.sweep() {
                snapshots.push(self.snapshot());
            }
        }
        snapshots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BurningIVP::burn_driver::BurnDriver;
    use crate::BurningIVP::implicit_euler::LinearImplicitEuler;
    use crate::BurningIVP::rosenbrock::Rosenbrock4;
    use crate::NuclearKinetics::isotopes::{Isotope, molar_abundances};

    fn solar_cno(density: f64) -> Abundances {
        let mut x = Abundances::from_element(1e-20);
        x[Isotope::H1.index()] = 0.99;
        x[Isotope::C12.index()] = 0.01;
        molar_abundances(&x, density)
    }

    #[test]
    fn test_identical_cells_stay_bit_identical() {
        let conditions = PlasmaConditions::new(1.5e7, 150.0);
        let y0 = solar_cno(150.0);
        let stepper = StepperKind::from(Rosenbrock4::new(1e-8, 0.0));
        let mut grid = GridDriver::new(vec![(conditions, y0); 3], &stepper, 0.0, 1.0e3, 1e-8)
            .with_max_sweeps(Some(200_000));
        let snapshots = grid.run();
        assert_eq!(grid.status(), &RunStatus::Completed);
        assert!(!snapshots.is_empty());
        for snap in snapshots.iter() {
            assert_eq!(snap.cell_times[0], snap.cell_times[1]);
            assert_eq!(snap.cell_times[1], snap.cell_times[2]);
            assert_eq!(snap.cell_times[2], snap.t);
            assert_eq!(snap.cells[0], snap.cells[1]);
            assert_eq!(snap.cells[1], snap.cells[2]);
        }
        assert_eq!(grid.t_now, 1.0e3);
        // every cell counted its own steps
        for cell in grid.cells.iter() {
            assert_eq!(cell.stepper.stats().accepted, grid.sweeps());
        }
    }

    #[test]
    fn test_cells_do_not_leak_into_each_other() {
        // the last cell sets the shared step, so it evolves exactly as when alone
        let hot = PlasmaConditions::new(3.0e7, 100.0);
        let reference = PlasmaConditions::new(1.5e7, 150.0);
        let stepper = StepperKind::from(Rosenbrock4::new(1e-8, 0.0));
        let t_stop = 50.0;
        let mut grid = GridDriver::new(
            vec![(hot, solar_cno(100.0)), (reference, solar_cno(150.0))],
            &stepper,
            0.0,
            t_stop,
            1e-8,
        );
        let snapshots = grid.run();
        let mut single = BurnDriver::new(reference, solar_cno(150.0), 0.0, t_stop, 1e-8, stepper.clone());
        let trajectory = single.run();
        assert_eq!(snapshots.len(), trajectory.steps.len());
        for (snap, point) in snapshots.iter().zip(trajectory.steps.iter()) {
            assert_eq!(snap.t, point.t);
            assert_eq!(snap.cells[1], point.abundances);
        }
    }

    #[test]
    fn test_fixed_step_grid_advances_in_lockstep() {
        let stepper = StepperKind::from(LinearImplicitEuler::new(0.5));
        let cells = vec![
            (PlasmaConditions::new(1.5e7, 150.0), solar_cno(150.0)),
            (PlasmaConditions::new(2.0e7, 50.0), solar_cno(50.0)),
        ];
        let mut grid = GridDriver::new(cells, &stepper, 0.0, 2.0, 0.5);
        let snapshots = grid.run();
        assert_eq!(snapshots.len(), 4);
        for snap in snapshots.iter() {
            assert_eq!(snap.cell_times[0], snap.cell_times[1]);
        }
        assert_eq!(grid.status(), &RunStatus::Completed);
        assert_eq!(grid.t_now, 2.0);
        for (cell, density) in grid.cells.iter().zip([150.0, 50.0]) {
            assert!(cell.y[Isotope::H1.index()] < solar_cno(density)[Isotope::H1.index()]);
            assert!(cell.y[Isotope::He4.index()] >= 0.0);
        }
    }

    #[test]
    fn test_failed_sweep_commits_nothing() {
        let conditions = PlasmaConditions::new(1.5e7, 150.0);
        let healthy = solar_cno(150.0);
        let mut poisoned = solar_cno(150.0);
        poisoned[Isotope::O16.index()] = f64::NAN;
        let stepper = StepperKind::from(Rosenbrock4::default());
        let mut grid = GridDriver::new(
            vec![(conditions, healthy), (conditions, poisoned)],
            &stepper,
            0.0,
            1.0,
            1e-8,
        );
        assert!(!grid.sweep());
        assert!(matches!(grid.status(), RunStatus::Aborted(_)));
        assert_eq!(grid.t_now, 0.0);
        assert_eq!(grid.h, 1e-8);
        assert_eq!(grid.sweeps(), 0);
        assert_eq!(grid.cells[0].y, healthy);
        assert_eq!(grid.cells[0].t, 0.0);
        assert!(grid.cells[1].y[Isotope::O16.index()].is_nan());
        assert!(grid.run().is_empty());
    }

    #[test]
    fn test_empty_grid_completes_immediately() {
        let stepper = StepperKind::from(Rosenbrock4::default());
        let mut grid = GridDriver::new(vec![], &stepper, 0.0, 1.0, 1e-3);
        assert!(grid.run().is_empty());
        assert_eq!(grid.status(), &RunStatus::Completed);
    }
}
