/// eng
/// The 13 isotopes of the CNO network (He4, C12, N13, C13, N14, O15, N15, O16, F17, O17,
/// F18, O18, H1) with stable indices, molar masses and mass numbers; conversion between
/// molar abundances and mass fractions.
pub mod isotopes;
/// eng
/// Library of reaction rates: CF88 fits of the nine proton captures as functions of
/// temperature and the four beta+ decay constants. Reactions are addressed by the triple
/// (reactant, partner, channel); a triple naming no reaction gives exactly 0.0.
pub mod rate_library;
/// eng
/// The network model: RHS dY/dt, analytic Jacobian, explicit time derivative and the
/// structural sparsity pattern, all generated from one reaction table.
/// # Examples
/// ```
/// use CNOnet::NuclearKinetics::isotopes::{Abundances, Isotope};
/// use CNOnet::NuclearKinetics::reaction_network::NetworkModel;
/// let model = NetworkModel::new();
/// let mut y = Abundances::zeros();
/// y[Isotope::C12.index()] = 0.125;
/// y[Isotope::H1.index()] = 147.0;
/// let dydt = model.rhs(&y, 1.5e7);
/// assert!(dydt[Isotope::C12.index()] < 0.0);
/// assert!(dydt[Isotope::N13.index()] > 0.0);
/// assert_eq!(model.structural_nonzeros(), 47);
/// ```
pub mod reaction_network;
/// eng
/// The same network as symbolic expressions (RustedSciThe): equations listing and symbolic
/// Jacobian used to cross-check the analytic one.
pub mod symbolic_network;
#[cfg(test)]
mod network_tests;
