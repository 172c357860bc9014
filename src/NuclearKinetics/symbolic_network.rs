//! # Symbolic form of the CNO network
//!
//! Builds the ODE system dY/dt = f(Y) as `RustedSciThe` symbolic expressions from
//! the same reaction table as the numeric model, with the rate coefficients frozen
//! at a given temperature. The symbolic Jacobian is obtained with `Expr::diff`.
//!
//! Used for printing the equations of the network and as an independent check of
//! the hand-derived Jacobian rules of [`NetworkModel`].
//!
//! ```rust,ignore
//! let sym = SymbolicNetwork::new(&NetworkModel::new(), 1.5e7);
//! sym.pretty_print_equations();
//! let jac = sym.evaluate_jacobian(&y);
//! ```
use crate::NuclearKinetics::isotopes::{Abundances, Isotope, N_ISO, NetworkJacobian};
use crate::NuclearKinetics::rate_library::RateTable;
use crate::NuclearKinetics::reaction_network::NetworkModel;
use RustedSciThe::symbolic::symbolic_engine::Expr;

pub struct SymbolicNetwork {
    pub temperature: f64,
    /// variable names, one per isotope in index order
    pub variables: Vec<String>,
    /// right-hand side of dY[k]/dt
    pub equations: Vec<Expr>,
}

impl SymbolicNetwork {
    #[allow(non_snake_case)]
    pub fn new(model: &NetworkModel, T: f64) -> Self {
        let rates = RateTable::new(T);
        let variables: Vec<String> = Isotope::ALL.iter().map(|iso| format!("Y{}", iso.name())).collect();
        let mut equations: Vec<Expr> = vec![Expr::Const(0.0); N_ISO];
        for reaction in model.reactions {
            let k = reaction.rate(&rates);
            let mut flux = Expr::Const(k) * Expr::Var(variables[reaction.reactant.index()].clone());
            if let Some(partner) = reaction.partner {
                flux = flux * Expr::Var(variables[partner.index()].clone());
            }
            let consumed = std::iter::once(reaction.reactant).chain(reaction.partner);
            for species in consumed {
                let i = species.index();
                equations[i] = equations[i].clone() - flux.clone();
            }
            for species in reaction.products {
                let i = species.index();
                equations[i] = equations[i].clone() + flux.clone();
            }
        }
        Self {
            temperature: T,
            variables,
            equations,
        }
    }

    /// jacobian[row][col] = d equations[row] / d variables[col]
    pub fn jacobian(&self) -> Vec<Vec<Expr>> {
        self.equations
            .iter()
            .map(|eq| self.variables.iter().map(|var| eq.diff(var)).collect())
            .collect()
    }

    fn arguments(&self) -> Vec<&str> {
        self.variables.iter().map(|s| s.as_str()).collect()
    }

    pub fn evaluate_rhs(&self, y: &Abundances) -> Abundances {
        let values: Vec<f64> = y.iter().copied().collect();
        let mut dydt = Abundances::zeros();
        for (k, eq) in self.equations.iter().enumerate() {
            let f = eq.clone().lambdify_owned(self.arguments());
            dydt[k] = f(values.clone());
        }
        dydt
    }

    pub fn evaluate_jacobian(&self, y: &Abundances) -> NetworkJacobian {
        let values: Vec<f64> = y.iter().copied().collect();
        let mut jac = NetworkJacobian::zeros();
        for (row, entries) in self.jacobian().into_iter().enumerate() {
            for (col, entry) in entries.into_iter().enumerate() {
                let f = entry.lambdify_owned(self.arguments());
                jac[(row, col)] = f(values.clone());
            }
        }
        jac
    }

    pub fn pretty_print_equations(&self) {
        use prettytable::{Cell, Row, Table, row};
        println!("____________________EQUATIONS_________________________");
        println!("T = {:.3e} K", self.temperature);
        let mut table = Table::new();
        table.add_row(row!["Isotope", "Unknown Var", "dY/dt"]);
        for (k, eq) in self.equations.iter().enumerate() {
            let name = Isotope::ALL[k].name();
            table.add_row(Row::new(vec![
                Cell::new(name),
                Cell::new(&self.variables[k]),
                Cell::new(&format!("{}", eq.clone().symplify())),
            ]));
        }
        table.printstd();
    }
}
