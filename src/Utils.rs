/// eng
/// The burning task: JSON loading (serde), defaults, validation with check_task(), and
/// construction of single-cell and grid drivers. Also the TaskError enum.
pub mod task_config;
/// eng
/// results.dat writer: header plus one row of mass fractions per accepted step.
pub mod results_output;
/// eng
/// Logger setup with simplelog.
pub mod logging;
