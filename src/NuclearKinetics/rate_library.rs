//! # Rate library of the CNO network
//!
//! Temperature-dependent rate coefficients of the nine proton captures (CF88
//! analytic fits in T9 = T/1e9, scaled by Avogadro's number so that the product
//! `rate * Y_reactant * Y_H` is in mol/cm^3/s) and the four beta+ decay constants.
//!
//! ## Main Structures
//! - [`Channel`]: exit channel of a capture (`Gamma` or `Alpha`)
//! - [`CaptureReaction`]: the nine captures, each with its closed-form fit
//! - [`BetaDecay`]: the four unstable isotopes and their half-lives
//! - [`T9Powers`]: the fractional powers of T9 shared by all fits
//! - [`RateTable`]: every rate of the network evaluated at one temperature
//!
//! ## Addressing
//! A capture is addressed by the triple (reactant, partner, channel). The channel
//! is what tells N15 + p -> C12 + He4 from N15 + p -> O16 + gamma. A triple that names
//! no reaction is not an error: [`two_body_rate`] returns exactly 0.0, so the
//! caller can treat "no edge" and "edge with zero rate" the same way. The same
//! holds for [`decay_rate`] of a stable isotope.
//!
//! ## Non-Obvious Features & Tips
//! - decay "rates" are `0.5^(1/t_half)` with a fixed unit time step, a tested
//!   convention of this network; they are not `ln2/t_half` and carry no Avogadro
//!   factor
//! - all functions are pure, T > 0 is assumed and not checked
use crate::NuclearKinetics::isotopes::{Isotope, N_ISO};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Avogadro's number, 1/mol
pub const AVOGADRO: f64 = 6.02214199e23;
/// unit time step of the decay convention, s
pub const DECAY_TIME_STEP: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    /// (p, gamma): the proton is absorbed
    Gamma,
    /// (p, alpha): the compound nucleus emits He4
    Alpha,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Gamma => write!(f, "g"),
            Channel::Alpha => write!(f, "a"),
        }
    }
}

/// Fractional powers of T9 appearing in the CF88 fits
#[allow(non_snake_case)]
#[derive(Debug, Clone, Copy)]
pub struct T9Powers {
    pub T9: f64,
    pub T913: f64,
    pub T923: f64,
    pub T943: f64,
    pub T953: f64,
    pub T912: f64,
    pub T932: f64,
    pub T965: f64,
}

impl T9Powers {
    #[allow(non_snake_case)]
    pub fn new(T: f64) -> Self {
        let T9 = T / 1.0e9;
        Self {
            T9,
            T913: T9.powf(1.0 / 3.0),
            T923: T9.powf(2.0 / 3.0),
            T943: T9.powf(4.0 / 3.0),
            T953: T9.powf(5.0 / 3.0),
            T912: T9.sqrt(),
            T932: T9.powf(1.5),
            T965: T9.powf(6.0 / 5.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CaptureReaction {
    /// N15(p,a)C12
    N15pa,
    /// O17(p,a)N14
    O17pa,
    /// O18(p,a)N15
    O18pa,
    /// C12(p,g)N13
    C12pg,
    /// C13(p,g)N14
    C13pg,
    /// N14(p,g)O15
    N14pg,
    /// N15(p,g)O16
    N15pg,
    /// O16(p,g)F17
    O16pg,
    /// O17(p,g)F18
    O17pg,
}

impl CaptureReaction {
    pub const ALL: [CaptureReaction; 9] = [
        CaptureReaction::N15pa,
        CaptureReaction::O17pa,
        CaptureReaction::O18pa,
        CaptureReaction::C12pg,
        CaptureReaction::C13pg,
        CaptureReaction::N14pg,
        CaptureReaction::N15pg,
        CaptureReaction::O16pg,
        CaptureReaction::O17pg,
    ];

    /// resolves an addressing triple, `None` if the network has no such edge
    pub fn lookup(reactant: Isotope, partner: Isotope, channel: Channel) -> Option<Self> {
        if partner != Isotope::H1 {
            return None;
        }
        use CaptureReaction::*;
        match (reactant, channel) {
            (Isotope::N15, Channel::Alpha) => Some(N15pa),
            (Isotope::O17, Channel::Alpha) => Some(O17pa),
            (Isotope::O18, Channel::Alpha) => Some(O18pa),
            (Isotope::C12, Channel::Gamma) => Some(C12pg),
            (Isotope::C13, Channel::Gamma) => Some(C13pg),
            (Isotope::N14, Channel::Gamma) => Some(N14pg),
            (Isotope::N15, Channel::Gamma) => Some(N15pg),
            (Isotope::O16, Channel::Gamma) => Some(O16pg),
            (Isotope::O17, Channel::Gamma) => Some(O17pg),
            _ => None,
        }
    }

    pub fn reactant(self) -> Isotope {
        use CaptureReaction::*;
        match self {
            N15pa | N15pg => Isotope::N15,
            O17pa | O17pg => Isotope::O17,
            O18pa => Isotope::O18,
            C12pg => Isotope::C12,
            C13pg => Isotope::C13,
            N14pg => Isotope::N14,
            O16pg => Isotope::O16,
        }
    }

    pub fn channel(self) -> Channel {
        use CaptureReaction::*;
        match self {
            N15pa | O17pa | O18pa => Channel::Alpha,
            _ => Channel::Gamma,
        }
    }

    pub fn label(self) -> &'static str {
        use CaptureReaction::*;
        match self {
            N15pa => "N15(p,a)C12",
            O17pa => "O17(p,a)N14",
            O18pa => "O18(p,a)N15",
            C12pg => "C12(p,g)N13",
            C13pg => "C13(p,g)N14",
            N14pg => "N14(p,g)O15",
            N15pg => "N15(p,g)O16",
            O16pg => "O16(p,g)F17",
            O17pg => "O17(p,g)F18",
        }
    }

    /// N_A <sigma v> in cm^3/mol/s at temperature T (K)
    #[allow(non_snake_case)]
    pub fn rate(self, T: f64) -> f64 {
        self.rate_from_powers(&T9Powers::new(T))
    }

    #[allow(non_snake_case)]
    pub fn rate_from_powers(self, p: &T9Powers) -> f64 {
        let T9Powers {
            T9,
            T913,
            T923,
            T943,
            T953,
            T912,
            T932,
            T965,
        } = *p;
        use CaptureReaction::*;
        let sigma_v = match self {
            N15pa => {
                1.08e12 / T923
                    * (-15.251 / T913 - (T9 / 0.522).powi(2)).exp()
                    * (1.0 + 0.027 * T913 + 2.62 * T923 + 0.501 * T9 + 5.36 * T943 + 2.60 * T953)
                    + 1.19e8 / T932 * (-3.676 / T9).exp()
                    + 5.41e8 / T912 * (-8.926 / T9).exp()
                    + 0.5 * 4.72e8 / T932 * (-7.721 / T9).exp()
                    + 2.20e9 / T932 * (-11.418 / T9).exp()
            }
            O17pa => {
                1.53e7 / T923
                    * (-16.712 / T913 - (T9 / 0.565).powi(2)).exp()
                    * (1.0 + 0.025 * T913 + 5.39 * T923 + 0.940 * T9 + 13.5 * T943 + 5.98 * T953)
                    + 0.5
                        * (4.81e10 * T9 * (-16.712 / T913 - (T9 / 0.040).powi(2)).exp()
                            + 5.05e-5 / T932 * (-0.723 / T9).exp())
                    + 0.5 * 13.1 / T932 * (-1.961 / T9).exp()
            }
            O18pa => {
                3.63e11 / T923
                    * (-16.729 / T913 - (T9 / 1.361).powi(2)).exp()
                    * (1.0 + 0.025 * T913 + 1.88 * T923 + 0.327 * T9 + 4.66 * T943 + 2.06 * T953)
                    + 9.90e-14 / T932 * (-0.231 / T9).exp()
                    + 2.66e4 / T932 * (-1.670 / T9).exp()
                    + 2.41e9 / T932 * (-7.638 / T9).exp()
                    + 1.46e9 / T9 * (-8.310 / T9).exp()
            }
            C12pg => {
                2.04e7 / T923
                    * (-13.690 / T913 - (T9 / 1.500).powi(2)).exp()
                    * (1.0 + 0.030 * T913 + 1.19 * T923 + 0.254 * T9 + 2.06 * T943 + 1.12 * T953)
                    + 1.08e5 / T932 * (-4.925 / T9).exp()
                    + 2.15e5 / T932 * (-18.179 / T9).exp()
            }
            C13pg => {
                8.01e7 / T923
                    * (-13.717 / T913 - (T9 / 2.000).powi(2)).exp()
                    * (1.0 + 0.030 * T913 + 0.958 * T923 + 0.204 * T9 + 1.39 * T943 + 0.753 * T953)
                    + 1.21e6 / T965 * (-5.701 / T9).exp()
            }
            N14pg => {
                4.90e7 / T923
                    * (-15.202 / T913 - (T9 / 1.191).powi(2)).exp()
                    * (1.0 + 0.027 * T913 - 0.778 * T923 - 0.149 * T9 + 0.261 * T943 + 0.127 * T953)
                    + 2.37e3 / T932 * (-3.011 / T9).exp()
                    + 2.19e4 * (-12.530 / T9).exp()
            }
            N15pg => {
                9.78e8 / T923
                    * (-15.251 / T913 - (T9 / 0.450).powi(2)).exp()
                    * (1.0 + 0.027 * T913 + 0.219 * T923 + 0.042 * T9 + 6.83 * T943 + 3.32 * T953)
                    + 1.11e4 / T932 * (-3.328 / T9).exp()
                    + 1.49e4 / T932 * (-4.665 / T9).exp()
                    + 3.80e6 / T932 * (-11.048 / T9).exp()
            }
            O16pg => {
                1.50e8 / (T923 * (1.0 + 2.13 * (1.0 - (-0.728 * T923).exp())))
                    * (-16.692 / T913).exp()
            }
            O17pg => {
                // screened temperature of the resonant term
                let T9A = T9 / (1.0 + 2.69 * T9);
                7.97e7 * T9A.powf(5.0 / 6.0) / T932 * (-16.712 / T9A.powf(1.0 / 3.0)).exp()
                    + 1.51e8 / T923
                        * (-16.712 / T913).exp()
                        * (1.0 + 0.025 * T913 - 0.051 * T923 - 8.82e-3 * T9)
                    + 1.56e5 / T9 * (-6.272 / T9).exp()
                    + 0.5 * 13.1 / T932 * (-1.961 / T9).exp()
            }
        };
        sigma_v * AVOGADRO
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BetaDecay {
    N13,
    O15,
    F17,
    F18,
}

impl BetaDecay {
    pub const ALL: [BetaDecay; 4] = [BetaDecay::N13, BetaDecay::O15, BetaDecay::F17, BetaDecay::F18];

    pub fn of(isotope: Isotope) -> Option<Self> {
        match isotope {
            Isotope::N13 => Some(BetaDecay::N13),
            Isotope::O15 => Some(BetaDecay::O15),
            Isotope::F17 => Some(BetaDecay::F17),
            Isotope::F18 => Some(BetaDecay::F18),
            _ => None,
        }
    }

    pub fn parent(self) -> Isotope {
        match self {
            BetaDecay::N13 => Isotope::N13,
            BetaDecay::O15 => Isotope::O15,
            BetaDecay::F17 => Isotope::F17,
            BetaDecay::F18 => Isotope::F18,
        }
    }

    pub fn daughter(self) -> Isotope {
        match self {
            BetaDecay::N13 => Isotope::C13,
            BetaDecay::O15 => Isotope::N15,
            BetaDecay::F17 => Isotope::O17,
            BetaDecay::F18 => Isotope::O18,
        }
    }

    /// half-life, s
    pub fn half_life(self) -> f64 {
        match self {
            BetaDecay::N13 => 9.965 * 60.0,
            BetaDecay::O15 => 122.24,
            BetaDecay::F17 => 64.49,
            BetaDecay::F18 => 109.771 * 60.0,
        }
    }

    pub fn rate(self) -> f64 {
        0.5_f64.powf(DECAY_TIME_STEP / self.half_life())
    }

    pub fn label(self) -> String {
        format!("{}(e+nu){}", self.parent(), self.daughter())
    }
}

/// Rate coefficient of the two-body reaction addressed by (reactant, partner, channel).
/// Returns exactly 0.0 when the network has no such reaction.
#[allow(non_snake_case)]
pub fn two_body_rate(reactant: Isotope, partner: Isotope, channel: Channel, T: f64) -> f64 {
    match CaptureReaction::lookup(reactant, partner, channel) {
        Some(reaction) => reaction.rate(T),
        None => 0.0,
    }
}

/// Decay constant of `isotope`, exactly 0.0 for stable isotopes
pub fn decay_rate(isotope: Isotope) -> f64 {
    match BetaDecay::of(isotope) {
        Some(decay) => decay.rate(),
        None => 0.0,
    }
}

/// All rates of the network evaluated once at a given temperature
#[allow(non_snake_case)]
#[derive(Debug, Clone)]
pub struct RateTable {
    pub T: f64,
    captures: [f64; 9],
    decays: [f64; N_ISO],
}

impl RateTable {
    #[allow(non_snake_case)]
    pub fn new(T: f64) -> Self {
        let powers = T9Powers::new(T);
        let mut captures = [0.0; 9];
        for (slot, reaction) in captures.iter_mut().zip(CaptureReaction::ALL.iter()) {
            *slot = reaction.rate_from_powers(&powers);
        }
        let mut decays = [0.0; N_ISO];
        for iso in Isotope::ALL {
            decays[iso.index()] = decay_rate(iso);
        }
        Self { T, captures, decays }
    }

    pub fn capture(&self, reaction: CaptureReaction) -> f64 {
        self.captures[reaction as usize]
    }

    pub fn two_body(&self, reactant: Isotope, partner: Isotope, channel: Channel) -> f64 {
        match CaptureReaction::lookup(reactant, partner, channel) {
            Some(reaction) => self.capture(reaction),
            None => 0.0,
        }
    }

    pub fn decay(&self, isotope: Isotope) -> f64 {
        self.decays[isotope.index()]
    }

    pub fn pretty_print(&self) {
        use prettytable::{Table, row};
        println!("\n=== CNO RATES AT T = {:.3e} K ===", self.T);
        let mut table = Table::new();
        table.add_row(row!["Reaction", "Rate", "Units"]);
        for reaction in CaptureReaction::ALL {
            table.add_row(row![
                reaction.label(),
                format!("{:.4e}", self.capture(reaction)),
                "cm^3/mol/s"
            ]);
        }
        for decay in BetaDecay::ALL {
            table.add_row(row![
                decay.label(),
                format!("{:.6}", self.decay(decay.parent())),
                "-"
            ]);
        }
        table.printstd();
    }
}
