mod commands;
mod helpers;

use clap::Parser;
use paddi_core::domain::{ErrorCategory, PaddiError};

pub fn run_from_env() -> i32 {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(args) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("{}", error.diagnostic_line());
            error.exit_code()
        }
    }
}

pub fn run<I, S>(args: I) -> Result<i32, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let full_args = std::iter::once("paddi".to_string())
        .chain(args.into_iter().map(Into::into))
        .collect::<Vec<_>>();
    parse_and_dispatch(full_args)
}

fn parse_and_dispatch(args: Vec<String>) -> Result<i32, CliError> {
    match Cli::try_parse_from(&args) {
        Ok(cli) => {
            crate::logging::init(cli.verbose);
            dispatch_parsed(cli.command)
        }
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{}", err);
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

#[derive(Parser)]
#[command(
    name = "paddi",
    version,
    about = "Inspect PADDI run outputs and generate restart snapshots"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Print the run parameters recorded in a file
    Params(commands::ParamsArgs),
    /// Summarize the output files of a run directory
    Inspect(commands::InspectArgs),
    /// Write a zero-filled restart snapshot template from a namelist parameter file
    ///
    /// Every spectral field is written as zeros. No layered initial profile or
    /// perturbation is applied, so the fields must be filled before the
    /// snapshot can seed a run.
    GenerateDump(commands::GenerateDumpArgs),
}

fn dispatch_parsed(command: CliCommand) -> Result<i32, CliError> {
    match command {
        CliCommand::Params(args) => commands::run_params_command(args),
        CliCommand::Inspect(args) => commands::run_inspect_command(args),
        CliCommand::GenerateDump(args) => commands::run_generate_dump_command(args),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Core(PaddiError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CliError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Usage(_) => ErrorCategory::InputValidation,
            Self::Core(error) => error.category(),
            Self::Internal(_) => ErrorCategory::IoSystem,
        }
    }

    pub fn exit_code(&self) -> i32 {
        self.category().exit_code()
    }

    pub fn diagnostic_line(&self) -> String {
        let message = match self {
            Self::Internal(error) => format!("{error:#}"),
            other => other.to_string(),
        };
        format!("ERROR: [{}] {}", self.category().as_str(), message.trim_end())
    }
}

#[cfg(test)]
mod tests {
    use super::{CliError, run};
    use paddi_core::domain::PaddiError;

    #[test]
    fn unknown_subcommand_is_usage_error() {
        let error = run(["frobnicate"]).expect_err("unknown subcommand should fail");
        assert!(matches!(error, CliError::Usage(_)));
        assert_eq!(error.exit_code(), 2);
        assert!(error.diagnostic_line().starts_with("ERROR: [InputValidationError]"));
    }

    #[test]
    fn help_exits_cleanly() {
        let code = run(["--help"]).expect("help should not be an error");
        assert_eq!(code, 0);
    }

    #[test]
    fn core_errors_keep_their_category() {
        let error = CliError::Core(PaddiError::invalid_schema("sort key 'q' is not a column"));
        assert_eq!(error.exit_code(), 5);
        assert_eq!(
            error.diagnostic_line(),
            "ERROR: [InternalError] invalid reader configuration: sort key 'q' is not a column"
        );
    }

    #[test]
    fn internal_errors_render_their_context_chain() {
        let source = anyhow::anyhow!("disk full").context("failed to encode summary");
        let error = CliError::from(source);
        assert_eq!(error.exit_code(), 3);
        assert_eq!(
            error.diagnostic_line(),
            "ERROR: [IoSystemError] failed to encode summary: disk full"
        );
    }
}
