//! simplelog setup: terminal logger at the task's level, optional file logger.
use crate::Utils::task_config::TaskError;
use simplelog::{
    ColorChoice, CombinedLogger, Config, LevelFilter, SharedLogger, TermLogger, TerminalMode, WriteLogger,
};
use std::fs::File;
use std::str::FromStr;

pub fn parse_level(level: &str) -> Result<LevelFilter, TaskError> {
    LevelFilter::from_str(level.trim())
        .map_err(|_| TaskError::InvalidParameter(format!("unknown log level '{}'", level)))
}

/// Installs the global logger. Fails if a logger is already installed.
pub fn init_logging(level: &str, log_file: Option<&str>) -> Result<(), TaskError> {
    let level = parse_level(level)?;
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];
    if let Some(path) = log_file {
        loggers.push(WriteLogger::new(LevelFilter::Debug, Config::default(), File::create(path)?));
    }
    CombinedLogger::init(loggers).map_err(|e| TaskError::Logger(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("info").unwrap(), LevelFilter::Info);
        assert_eq!(parse_level(" DEBUG ").unwrap(), LevelFilter::Debug);
        assert_eq!(parse_level("off").unwrap(), LevelFilter::Off);
        assert!(parse_level("loud").is_err());
    }
}
