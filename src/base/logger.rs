use log::LevelFilter;
use simplelog::{Config, TermLogger, TerminalMode};

pub fn init(level: LevelFilter) {
    if let Err(error) = TermLogger::init(level, Config::default(), TerminalMode::Mixed) {
        eprintln!("Failed to initialize the terminal logger: {:?}", error);
    }
}
