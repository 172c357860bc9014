//! # CNO reaction network model
//!
//! Right-hand side dY/dt and analytic Jacobian of the 13-isotope network. Both
//! are generated from ONE table of reactions ([`CNO_REACTIONS`]) with one
//! derivative rule per reaction shape, so the Jacobian can not drift away from
//! the RHS.
//!
//! ## Main Structures
//! - [`Reaction`]: reactant (+ optional partner) -> products with a [`RateLaw`]
//! - [`NetworkModel`]: stateless evaluator of RHS, Jacobian, df/dt and the
//!   structural sparsity pattern
//! - [`PlasmaConditions`]: typed parameters of one burning cell (T, rho)
//!
//! ## Rate laws
//! - two-body capture: flux `k(T) * Y[reactant] * Y[partner]`,
//!   dflux/dY[reactant] = k*Y[partner], dflux/dY[partner] = k*Y[reactant]
//! - decay: flux `lambda * Y[reactant]`, dflux/dY[reactant] = lambda
//!
//! every flux is subtracted from the reactant and the partner rows and added to
//! every product row.
//!
//! ## Non-Obvious Features & Tips
//! - the Jacobian has exactly 47 structural nonzeros, column He4 is empty since
//!   He4 is never consumed
//! - evaluation holds no state: every call recomputes the rates, so calls made
//!   for discarded trial steps have no side effects
//! - the explicit time derivative is identically zero (T and rho are constant)
use crate::NuclearKinetics::isotopes::{Abundances, Isotope, N_ISO, NetworkJacobian};
use crate::NuclearKinetics::rate_library::{BetaDecay, CaptureReaction, RateTable};
use serde::{Deserialize, Serialize};

/// Temperature and density of a burning cell, constant during a run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlasmaConditions {
    /// K
    pub temperature: f64,
    /// g/cm^3
    pub density: f64,
}

impl PlasmaConditions {
    pub fn new(temperature: f64, density: f64) -> Self {
        Self {
            temperature,
            density,
        }
    }

    pub fn n_iso(&self) -> usize {
        N_ISO
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RateLaw {
    Capture(CaptureReaction),
    Decay(BetaDecay),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reaction {
    pub reactant: Isotope,
    pub partner: Option<Isotope>,
    pub products: &'static [Isotope],
    pub law: RateLaw,
}

const fn capture(reactant: Isotope, products: &'static [Isotope], reaction: CaptureReaction) -> Reaction {
    Reaction {
        reactant,
        partner: Some(Isotope::H1),
        products,
        law: RateLaw::Capture(reaction),
    }
}

const fn decay(reactant: Isotope, products: &'static [Isotope], decay: BetaDecay) -> Reaction {
    Reaction {
        reactant,
        partner: None,
        products,
        law: RateLaw::Decay(decay),
    }
}

/// CN cycle, NO bi-cycle and the O17/O18 branches
pub static CNO_REACTIONS: [Reaction; 13] = [
    capture(Isotope::C12, &[Isotope::N13], CaptureReaction::C12pg),
    decay(Isotope::N13, &[Isotope::C13], BetaDecay::N13),
    capture(Isotope::C13, &[Isotope::N14], CaptureReaction::C13pg),
    capture(Isotope::N14, &[Isotope::O15], CaptureReaction::N14pg),
    decay(Isotope::O15, &[Isotope::N15], BetaDecay::O15),
    capture(Isotope::N15, &[Isotope::C12, Isotope::He4], CaptureReaction::N15pa),
    capture(Isotope::N15, &[Isotope::O16], CaptureReaction::N15pg),
    capture(Isotope::O16, &[Isotope::F17], CaptureReaction::O16pg),
    decay(Isotope::F17, &[Isotope::O17], BetaDecay::F17),
    capture(Isotope::O17, &[Isotope::N14, Isotope::He4], CaptureReaction::O17pa),
    capture(Isotope::O17, &[Isotope::F18], CaptureReaction::O17pg),
    decay(Isotope::F18, &[Isotope::O18], BetaDecay::F18),
    capture(Isotope::O18, &[Isotope::N15, Isotope::He4], CaptureReaction::O18pa),
];

impl Reaction {
    /// rate coefficient looked up through the (reactant, partner, channel) address
    pub fn rate(&self, rates: &RateTable) -> f64 {
        match (self.law, self.partner) {
            (RateLaw::Capture(reaction), Some(partner)) => {
                rates.two_body(self.reactant, partner, reaction.channel())
            }
            (RateLaw::Capture(_), None) => 0.0,
            (RateLaw::Decay(_), _) => rates.decay(self.reactant),
        }
    }

    pub fn flux(&self, k: f64, y: &Abundances) -> f64 {
        match self.partner {
            Some(partner) => k * y[self.reactant.index()] * y[partner.index()],
            None => k * y[self.reactant.index()],
        }
    }

    /// reactants with -1, products with +1
    fn stoichiometry(&self) -> impl Iterator<Item = (Isotope, f64)> + '_ {
        std::iter::once((self.reactant, -1.0))
            .chain(self.partner.map(|p| (p, -1.0)))
            .chain(self.products.iter().map(|p| (*p, 1.0)))
    }

    /// (column, d flux / d Y[column]) pairs, the first `len` entries are valid
    pub(crate) fn flux_gradient(&self, k: f64, y: &Abundances) -> ([(Isotope, f64); 2], usize) {
        match self.partner {
            Some(partner) => (
                [
                    (self.reactant, k * y[partner.index()]),
                    (partner, k * y[self.reactant.index()]),
                ],
                2,
            ),
            None => ([(self.reactant, k), (self.reactant, 0.0)], 1),
        }
    }

    pub fn label(&self) -> String {
        match self.law {
            RateLaw::Capture(reaction) => reaction.label().to_string(),
            RateLaw::Decay(decay) => decay.label(),
        }
    }
}

/// Stateless evaluator of the network equations
#[derive(Debug, Clone, Copy)]
pub struct NetworkModel {
    pub reactions: &'static [Reaction],
}

impl Default for NetworkModel {
    fn default() -> Self {
        Self::new()
    }
}

impl NetworkModel {
    pub fn new() -> Self {
        Self {
            reactions: &CNO_REACTIONS,
        }
    }

    /// dY/dt at temperature T
    #[allow(non_snake_case)]
    pub fn rhs(&self, y: &Abundances, T: f64) -> Abundances {
        self.rhs_with_rates(y, &RateTable::new(T))
    }

    pub fn rhs_with_rates(&self, y: &Abundances, rates: &RateTable) -> Abundances {
        let mut dydt = Abundances::zeros();
        for reaction in self.reactions {
            let flux = reaction.flux(reaction.rate(rates), y);
            for (species, nu) in reaction.stoichiometry() {
                dydt[species.index()] += nu * flux;
            }
        }
        dydt
    }

    /// J[row][col] = d(dY[row]/dt)/dY[col] at temperature T
    #[allow(non_snake_case)]
    pub fn jacobian(&self, y: &Abundances, T: f64) -> NetworkJacobian {
        self.jacobian_with_rates(y, &RateTable::new(T))
    }

    pub fn jacobian_with_rates(&self, y: &Abundances, rates: &RateTable) -> NetworkJacobian {
        let mut jac = NetworkJacobian::zeros();
        for reaction in self.reactions {
            let k = reaction.rate(rates);
            let (gradient, len) = reaction.flux_gradient(k, y);
            for (row, nu) in reaction.stoichiometry() {
                for (col, dflux) in gradient[..len].iter() {
                    jac[(row.index(), col.index())] += nu * dflux;
                }
            }
        }
        jac
    }

    /// explicit time derivative of the RHS, zero for a constant-T network
    #[allow(non_snake_case)]
    pub fn time_derivative(&self, _y: &Abundances, _T: f64) -> Abundances {
        Abundances::zeros()
    }

    /// entries of the Jacobian that may be nonzero, independent of Y and T
    pub fn sparsity_pattern(&self) -> [[bool; N_ISO]; N_ISO] {
        let mut pattern = [[false; N_ISO]; N_ISO];
        for reaction in self.reactions {
            let columns: Vec<Isotope> = std::iter::once(reaction.reactant)
                .chain(reaction.partner)
                .collect();
            for (row, _) in reaction.stoichiometry() {
                for col in columns.iter() {
                    pattern[row.index()][col.index()] = true;
                }
            }
        }
        pattern
    }

    pub fn structural_nonzeros(&self) -> usize {
        self.sparsity_pattern()
            .iter()
            .map(|row| row.iter().filter(|nz| **nz).count())
            .sum()
    }

    pub fn pretty_print_reactions(&self) {
        use prettytable::{Table, row};
        println!("____________________REACTIONS_________________________");
        let mut table = Table::new();
        table.add_row(row!["#", "Reaction", "Reactants", "Products"]);
        for (i, reaction) in self.reactions.iter().enumerate() {
            let reactants = match reaction.partner {
                Some(partner) => format!("{} + {}", reaction.reactant, partner),
                None => reaction.reactant.to_string(),
            };
            let products = reaction
                .products
                .iter()
                .map(|p| p.to_string())
                .collect::<Vec<_>>()
                .join(" + ");
            table.add_row(row![i, reaction.label(), reactants, products]);
        }
        table.printstd();
    }
}
