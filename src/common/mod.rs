pub mod logging;
pub mod report;
pub mod setup;

pub use logging::init_logging;
pub use setup::{parse_configuration_options, CommandLineOptions, NetworkSource};
