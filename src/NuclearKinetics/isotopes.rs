//! # Isotopes of the CNO network
//!
//! The 13 species of the network with their stable indices, molar masses and
//! mass numbers. The index order is the order of the state vector everywhere in
//! the crate (RHS, Jacobian rows/columns, output columns).
//!
//! ## Main Structures
//! - [`Isotope`]: the species enum, `Isotope::ALL` iterates in index order
//! - [`Abundances`] / [`NetworkJacobian`]: fixed-size `nalgebra` aliases for the
//!   state vector and the Jacobian
//!
//! ## Non-Obvious Features & Tips
//! - H1 sits at the END (index 12), it is the partner of every two-body reaction
//! - the molar mass of H1 is the standard atomic weight of hydrogen (1.00794), not
//!   the isotopic mass
//! - molar masses are only used at the boundary (mass fraction <-> molar abundance)
use nalgebra::{SMatrix, SVector};
use serde::{Deserialize, Serialize};
use std::fmt;

/// number of isotopes in the network
pub const N_ISO: usize = 13;

/// molar abundances Y (mol/cm^3) in isotope order
pub type Abundances = SVector<f64, N_ISO>;
/// J[row][col] = d(dY[row]/dt)/dY[col]
pub type NetworkJacobian = SMatrix<f64, N_ISO, N_ISO>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Isotope {
    He4,
    C12,
    N13,
    C13,
    N14,
    O15,
    N15,
    O16,
    F17,
    O17,
    F18,
    O18,
    H1,
}

/// molar masses, g/mol
pub const MOLAR_MASSES: [f64; N_ISO] = [
    4.002602,
    12.0,
    13.005738609,
    13.00335483778,
    14.00307400478,
    15.003065617,
    15.00010889823,
    15.99491461956,
    17.002095237,
    16.999131703,
    18.000937956,
    17.999161001,
    1.00794,
];

pub const MASS_NUMBERS: [u32; N_ISO] = [4, 12, 13, 13, 14, 15, 15, 16, 17, 17, 18, 18, 1];

impl Isotope {
    pub const ALL: [Isotope; N_ISO] = [
        Isotope::He4,
        Isotope::C12,
        Isotope::N13,
        Isotope::C13,
        Isotope::N14,
        Isotope::O15,
        Isotope::N15,
        Isotope::O16,
        Isotope::F17,
        Isotope::O17,
        Isotope::F18,
        Isotope::O18,
        Isotope::H1,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Isotope> {
        Self::ALL.get(index).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            Isotope::He4 => "He4",
            Isotope::C12 => "C12",
            Isotope::N13 => "N13",
            Isotope::C13 => "C13",
            Isotope::N14 => "N14",
            Isotope::O15 => "O15",
            Isotope::N15 => "N15",
            Isotope::O16 => "O16",
            Isotope::F17 => "F17",
            Isotope::O17 => "O17",
            Isotope::F18 => "F18",
            Isotope::O18 => "O18",
            Isotope::H1 => "H1",
        }
    }

    /// case-insensitive lookup by name ("n14", "N14")
    pub fn from_name(name: &str) -> Option<Isotope> {
        let name = name.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|iso| iso.name().eq_ignore_ascii_case(name))
    }

    pub fn molar_mass(self) -> f64 {
        MOLAR_MASSES[self.index()]
    }

    pub fn mass_number(self) -> u32 {
        MASS_NUMBERS[self.index()]
    }
}

impl fmt::Display for Isotope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// X_k = Y_k * M_k / rho
pub fn mass_fractions(y: &Abundances, density: f64) -> Abundances {
    Abundances::from_fn(|k, _| y[k] * MOLAR_MASSES[k] / density)
}

/// Y_k = X_k * rho / M_k
pub fn molar_abundances(x: &Abundances, density: f64) -> Abundances {
    Abundances::from_fn(|k, _| x[k] * density / MOLAR_MASSES[k])
}

/// sum_k A_k * Y_k, conserved by every reaction of the network
pub fn baryon_density(y: &Abundances) -> f64 {
    y.iter()
        .zip(MASS_NUMBERS.iter())
        .map(|(yk, a)| yk * (*a as f64))
        .sum()
}
