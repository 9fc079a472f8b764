mod cli;
mod logging;

pub use cli::{CliError, run, run_from_env};
