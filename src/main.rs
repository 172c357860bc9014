use CNOnet::BurningIVP::burn_driver::RunStatus;
use CNOnet::Utils::logging::init_logging;
use CNOnet::Utils::task_config::BurnTask;
use CNOnet::cli::cli_burn::run_task;
use CNOnet::cli::cli_main::run_interactive_menu;
use std::process::ExitCode;

/// `CNOnet task.json` runs the task, `CNOnet` without arguments opens the menu
pub fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let Some(path) = args.get(1) else {
        if let Err(e) = init_logging("info", None) {
            eprintln!("{}", e);
        }
        run_interactive_menu();
        return ExitCode::SUCCESS;
    };

    let task = match BurnTask::from_file(path) {
        Ok(task) => task,
        Err(e) => {
            eprintln!("failed to load task {}: {}", path, e);
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = init_logging(&task.log_level, task.log_file.as_deref()) {
        eprintln!("{}", e);
    }
    match run_task(&task) {
        Ok(RunStatus::Completed) => ExitCode::SUCCESS,
        Ok(status) => {
            eprintln!("run did not complete: {:?}", status);
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
