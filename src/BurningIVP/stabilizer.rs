//! Post-step clamp of negligible abundances.
//!
//! After an accepted step every isotope whose mass fraction `Y_k / (rho / M_k)`
//! fell below the floor (default 1e-20) is set to exactly 0.0. Small negative
//! overshoots of the integrator are removed the same way. Never called from
//! inside an RHS/Jacobian evaluation.
use crate::NuclearKinetics::isotopes::{Abundances, MOLAR_MASSES, N_ISO};
use serde::{Deserialize, Serialize};

pub const DEFAULT_FLOOR: f64 = 1e-20;

/// Returns a copy of `y` with every sub-floor abundance set to 0.0
pub fn clamp(y: &Abundances, density: f64, molar_masses: &[f64; N_ISO], floor: f64) -> Abundances {
    Abundances::from_fn(|k, _| {
        if y[k] / (density / molar_masses[k]) < floor {
            0.0
        } else {
            y[k]
        }
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AbundanceFloor {
    pub floor: f64,
}

impl Default for AbundanceFloor {
    fn default() -> Self {
        Self {
            floor: DEFAULT_FLOOR,
        }
    }
}

impl AbundanceFloor {
    pub fn new(floor: f64) -> Self {
        Self { floor }
    }

    /// clamps in place, returns how many isotopes were zeroed by this call
    pub fn apply(&self, y: &mut Abundances, density: f64) -> usize {
        let clamped = clamp(y, density, &MOLAR_MASSES, self.floor);
        let zeroed = y
            .iter()
            .zip(clamped.iter())
            .filter(|(before, after)| **before != 0.0 && **after == 0.0)
            .count();
        *y = clamped;
        zeroed
    }
}
