#[cfg(test)]
mod tests {
    use crate::NuclearKinetics::isotopes::{Abundances, Isotope, MASS_NUMBERS, N_ISO, baryon_density};
    use crate::NuclearKinetics::rate_library::{Channel, RateTable, two_body_rate};
    use crate::NuclearKinetics::reaction_network::{CNO_REACTIONS, NetworkModel, RateLaw};
    use approx::assert_relative_eq;

    /// all abundances of order unity and pairwise different
    fn generic_state() -> Abundances {
        Abundances::from_fn(|k, _| 0.5 + 0.1 * k as f64)
    }

    /// (row, col) of every entry that may be nonzero, written out by hand
    fn reference_pattern() -> Vec<(usize, usize)> {
        let mut entries = vec![
            // He4 row: produced by the three (p,a) reactions
            (0, 6),
            (0, 9),
            (0, 11),
            (0, 12),
            (1, 1),
            (1, 6),
            (1, 12),
            (2, 1),
            (2, 2),
            (2, 12),
            (3, 2),
            (3, 3),
            (3, 12),
            (4, 3),
            (4, 4),
            (4, 9),
            (4, 12),
            (5, 4),
            (5, 5),
            (5, 12),
            (6, 5),
            (6, 6),
            (6, 11),
            (6, 12),
            (7, 6),
            (7, 7),
            (7, 12),
            (8, 7),
            (8, 8),
            (8, 12),
            (9, 8),
            (9, 9),
            (9, 12),
            (10, 9),
            (10, 10),
            (10, 12),
            (11, 10),
            (11, 11),
            (11, 12),
        ];
        // H1 row: every capture consumes a proton
        for col in [1, 3, 4, 6, 7, 9, 11, 12] {
            entries.push((12, col));
        }
        entries
    }

    #[test]
    fn test_reference_pattern_has_47_entries() {
        let reference = reference_pattern();
        assert_eq!(reference.len(), 47);
        let mut sorted = reference.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), 47);
    }

    #[test]
    fn test_structural_sparsity_matches_reference() {
        let model = NetworkModel::new();
        let pattern = model.sparsity_pattern();
        let reference = reference_pattern();
        for row in 0..N_ISO {
            for col in 0..N_ISO {
                assert_eq!(
                    pattern[row][col],
                    reference.contains(&(row, col)),
                    "entry ({}, {})",
                    row,
                    col
                );
            }
        }
        assert_eq!(model.structural_nonzeros(), 47);
    }

    #[test]
    fn test_numeric_jacobian_has_exactly_47_nonzeros() {
        let model = NetworkModel::new();
        let reference = reference_pattern();
        for T in [1.5e7, 2.5e7, 1.0e8] {
            let jac = model.jacobian(&generic_state(), T);
            let mut count = 0;
            for row in 0..N_ISO {
                for col in 0..N_ISO {
                    if reference.contains(&(row, col)) {
                        assert!(jac[(row, col)] != 0.0, "({}, {}) vanished at T={}", row, col, T);
                        count += 1;
                    } else {
                        assert_eq!(jac[(row, col)], 0.0, "({}, {}) at T={}", row, col, T);
                    }
                }
            }
            assert_eq!(count, 47);
        }
    }

    #[test]
    fn test_he4_column_is_empty() {
        let jac = NetworkModel::new().jacobian(&generic_state(), 1.5e7);
        for row in 0..N_ISO {
            assert_eq!(jac[(row, Isotope::He4.index())], 0.0);
        }
    }

    #[test]
    fn test_jacobian_matches_finite_differences() {
        // the RHS is bilinear in Y, so central differences are exact for any
        // step; a small one drowns the decay entries (~1) in the round-off of
        // capture terms (~1e10)
        let model = NetworkModel::new();
        let y = generic_state();
        for T in [1.5e7, 3.0e7] {
            let jac = model.jacobian(&y, T);
            for col in 0..N_ISO {
                let delta = 1e8 * y[col];
                let mut y_plus = y;
                let mut y_minus = y;
                y_plus[col] += delta;
                y_minus[col] -= delta;
                let f_plus = model.rhs(&y_plus, T);
                let f_minus = model.rhs(&y_minus, T);
                for row in 0..N_ISO {
                    let fd = (f_plus[row] - f_minus[row]) / (2.0 * delta);
                    assert_relative_eq!(
                        fd,
                        jac[(row, col)],
                        max_relative = 1e-6,
                        epsilon = 1e-9
                    );
                }
            }
        }
    }

    #[test]
    fn test_rhs_conserves_baryon_number() {
        let model = NetworkModel::new();
        let y = generic_state();
        let dydt = model.rhs(&y, 2.0e7);
        let scale: f64 = dydt
            .iter()
            .zip(MASS_NUMBERS.iter())
            .map(|(d, a)| (d * *a as f64).abs())
            .sum();
        let change: f64 = dydt
            .iter()
            .zip(MASS_NUMBERS.iter())
            .map(|(d, a)| d * *a as f64)
            .sum();
        assert!(change.abs() <= 1e-12 * scale, "change {} scale {}", change, scale);
        assert!(baryon_density(&y) > 0.0);
    }

    #[test]
    fn test_every_reaction_conserves_mass_number() {
        for reaction in CNO_REACTIONS.iter() {
            let before = reaction.reactant.mass_number() + reaction.partner.map_or(0, |p| p.mass_number());
            let after: u32 = reaction.products.iter().map(|p| p.mass_number()).sum();
            assert_eq!(before, after, "{}", reaction.label());
        }
    }

    #[test]
    fn test_rhs_signs_for_fresh_cno_mixture() {
        // only C12 and H1 present: C12 burns to N13, nothing else moves yet
        let model = NetworkModel::new();
        let mut y = Abundances::zeros();
        y[Isotope::C12.index()] = 0.125;
        y[Isotope::H1.index()] = 147.0;
        let dydt = model.rhs(&y, 1.5e7);
        assert!(dydt[Isotope::C12.index()] < 0.0);
        assert!(dydt[Isotope::H1.index()] < 0.0);
        assert_relative_eq!(dydt[Isotope::N13.index()], -dydt[Isotope::C12.index()], max_relative = 1e-14);
        for iso in [Isotope::He4, Isotope::C13, Isotope::N14, Isotope::O16] {
            assert_eq!(dydt[iso.index()], 0.0);
        }
    }

    #[test]
    fn test_rhs_two_body_term_uses_channel_rates() {
        // isolated N15 + p: both exit channels drain N15
        let model = NetworkModel::new();
        let T = 2.0e7;
        let mut y = Abundances::zeros();
        y[Isotope::N15.index()] = 0.3;
        y[Isotope::H1.index()] = 100.0;
        let dydt = model.rhs(&y, T);
        let ka = two_body_rate(Isotope::N15, Isotope::H1, Channel::Alpha, T);
        let kg = two_body_rate(Isotope::N15, Isotope::H1, Channel::Gamma, T);
        assert_relative_eq!(dydt[Isotope::He4.index()], ka * 0.3 * 100.0, max_relative = 1e-14);
        assert_relative_eq!(dydt[Isotope::C12.index()], ka * 0.3 * 100.0, max_relative = 1e-14);
        assert_relative_eq!(dydt[Isotope::O16.index()], kg * 0.3 * 100.0, max_relative = 1e-14);
        assert_relative_eq!(dydt[Isotope::N15.index()], -(ka + kg) * 0.3 * 100.0, max_relative = 1e-12);
    }

    #[test]
    fn test_decay_terms_are_linear() {
        let model = NetworkModel::new();
        let rates = RateTable::new(1.5e7);
        let mut y = Abundances::zeros();
        y[Isotope::O15.index()] = 2.0;
        let dydt = model.rhs_with_rates(&y, &rates);
        let lambda = rates.decay(Isotope::O15);
        assert_relative_eq!(dydt[Isotope::O15.index()], -2.0 * lambda, epsilon = 1e-15);
        assert_relative_eq!(dydt[Isotope::N15.index()], 2.0 * lambda, epsilon = 1e-15);
        let decays = CNO_REACTIONS
            .iter()
            .filter(|r| matches!(r.law, RateLaw::Decay(_)))
            .count();
        assert_eq!(decays, 4);
    }

    #[test]
    fn test_flux_gradient_per_reaction_shape() {
        let rates = RateTable::new(2.0e7);
        let y = generic_state();
        for reaction in CNO_REACTIONS.iter() {
            let k = reaction.rate(&rates);
            let (gradient, len) = reaction.flux_gradient(k, &y);
            match reaction.partner {
                Some(partner) => {
                    assert_eq!(len, 2);
                    assert_eq!(gradient[0], (reaction.reactant, k * y[partner.index()]));
                    assert_eq!(gradient[1], (partner, k * y[reaction.reactant.index()]));
                }
                None => {
                    assert_eq!(len, 1);
                    assert_eq!(gradient[0], (reaction.reactant, k));
                }
            }
            // flux is linear along each gradient direction
            let flux = reaction.flux(k, &y);
            let (col, dflux) = gradient[0];
            let mut y_shifted = y;
            y_shifted[col.index()] += 1.0;
            assert_relative_eq!(reaction.flux(k, &y_shifted) - flux, dflux, max_relative = 1e-10);
        }
    }

    #[test]
    fn test_time_derivative_is_zero() {
        let model = NetworkModel::new();
        let dfdt = model.time_derivative(&generic_state(), 1.5e7);
        assert!(dfdt.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_model_holds_no_state() {
        let model = NetworkModel::new();
        let y = generic_state();
        let first = model.jacobian(&y, 1.5e7);
        let _ = model.rhs(&(y * 3.0), 4.0e7);
        let second = model.jacobian(&y, 1.5e7);
        assert_eq!(first, second);
    }
}
