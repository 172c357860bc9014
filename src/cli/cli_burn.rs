use crate::BurningIVP::burn_driver::RunStatus;
use crate::NuclearKinetics::rate_library::RateTable;
use crate::NuclearKinetics::reaction_network::NetworkModel;
use crate::NuclearKinetics::symbolic_network::SymbolicNetwork;
use crate::Utils::results_output::{write_grid, write_trajectory};
use crate::Utils::task_config::{BurnTask, TaskError};
use log::{error, info};
use std::io::{self, Write};

/// Runs a checked task to a terminal status and writes its output file(s).
/// An aborted run is reported through the returned status, not as an error.
pub fn run_task(task: &BurnTask) -> Result<RunStatus, TaskError> {
    task.pretty_print_task();
    match task.build_grid()? {
        Some(mut grid) => {
            let snapshots = grid.run();
            if let Some(output) = &task.output {
                let densities: Vec<f64> = grid.cells.iter().map(|c| c.conditions.density).collect();
                let paths = write_grid(output, &snapshots, &densities)?;
                info!("{} sweeps written to {} files", snapshots.len(), paths.len());
            }
            Ok(grid.status().clone())
        }
        None => {
            let mut driver = task.build_driver()?;
            let trajectory = driver.run();
            if let Some(output) = &task.output {
                let rows = write_trajectory(output, &trajectory, driver.conditions.density)?;
                info!("{} rows written to {}", rows, output);
            }
            driver.pretty_print_summary();
            Ok(driver.status().clone())
        }
    }
}

pub fn burn_menu() {
    loop {
        println!("\n=== CNO Burning ===");
        println!("1. Run default CNO burn (T = 1.5e7 K, rho = 150 g/cm^3)");
        println!("2. Run task from JSON file");
        println!("3. Show network equations");
        println!("4. Show rate table");
        println!("5. Show reactions");
        println!("0. Back");
        let choice = prompt("Choose option: ");
        match choice.trim() {
            "1" => report(run_task(&BurnTask::default())),
            "2" => {
                let path = prompt("Path to task file: ");
                report(BurnTask::from_file(path.trim()).and_then(|task| run_task(&task)));
            }
            "3" => match read_temperature() {
                Some(temperature) => SymbolicNetwork::new(&NetworkModel::new(), temperature).pretty_print_equations(),
                None => println!("Invalid temperature"),
            },
            "4" => match read_temperature() {
                Some(temperature) => RateTable::new(temperature).pretty_print(),
                None => println!("Invalid temperature"),
            },
            "5" => NetworkModel::new().pretty_print_reactions(),
            "0" | "" => break,
            _ => println!("Invalid option"),
        }
    }
}

fn report(result: Result<RunStatus, TaskError>) {
    match result {
        Ok(RunStatus::Completed) => println!("Burning completed."),
        Ok(status) => println!("Burning stopped: {:?}", status),
        Err(e) => {
            error!("{}", e);
            println!("Error: {}", e);
        }
    }
}

fn read_temperature() -> Option<f64> {
    let input = prompt("Temperature, K [1.5e7]: ");
    let input = input.trim();
    if input.is_empty() {
        return Some(1.5e7);
    }
    parse_temperature(input)
}

fn parse_temperature(input: &str) -> Option<f64> {
    let temperature: f64 = input.trim().parse().ok()?;
    if temperature.is_finite() && temperature > 0.0 { Some(temperature) } else { None }
}

pub(crate) fn prompt(text: &str) -> String {
    print!("{}", text);
    let _ = io::stdout().flush();
    let mut input = String::new();
    if io::stdin().read_line(&mut input).is_err() {
        return String::new();
    }
    input
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_run_task_writes_results() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("results.dat");
        let mut task = BurnTask::default();
        task.t_stop = 1.0;
        task.output = Some(output.to_string_lossy().into_owned());
        let status = run_task(&task).unwrap();
        assert_eq!(status, RunStatus::Completed);
        let text = fs::read_to_string(&output).unwrap();
        let mut lines = text.lines();
        assert!(lines.next().unwrap().trim_start().starts_with("tnow"));
        let last: Vec<f64> = text
            .lines()
            .last()
            .unwrap()
            .split_whitespace()
            .map(|f| f.parse().unwrap())
            .collect();
        assert_eq!(last[0], 1.0);
        assert!(text.lines().count() > 2);
    }

    #[test]
    fn test_run_grid_task_writes_one_file_per_cell() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("grid.dat");
        let task = BurnTask::from_json_str(&format!(
            r#"{{"t_stop": 0.1, "output": {:?},
                 "grid": [{{"temperature": 1.5e7, "density": 150.0}},
                          {{"temperature": 1.5e7, "density": 150.0}}]}}"#,
            output.to_string_lossy()
        ))
        .unwrap();
        let status = run_task(&task).unwrap();
        assert_eq!(status, RunStatus::Completed);
        let first = fs::read_to_string(dir.path().join("grid_cell0.dat")).unwrap();
        let second = fs::read_to_string(dir.path().join("grid_cell1.dat")).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_menu_temperature_input() {
        assert_eq!(parse_temperature(" 2.5e7\n"), Some(2.5e7));
        assert_eq!(parse_temperature("-1"), None);
        assert_eq!(parse_temperature("hot"), None);
    }

    #[test]
    fn test_invalid_task_is_an_error() {
        let mut task = BurnTask::default();
        task.density = 0.0;
        task.output = None;
        assert!(run_task(&task).is_err());
    }
}
