pub mod cli_burn;
pub mod cli_main;
