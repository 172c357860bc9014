#[allow(non_snake_case)]
pub mod BurningIVP;
#[allow(non_snake_case)]
pub mod NuclearKinetics;
#[allow(non_snake_case)]
pub mod Utils;
pub mod cli;
