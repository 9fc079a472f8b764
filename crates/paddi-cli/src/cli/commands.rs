use super::CliError;
use super::helpers::{default_dump_path, render_parameters, render_run_summary, to_json};
use paddi_core::discovery::RunFiles;
use paddi_core::parameters::{HEADER_SKIP_LINES, ParameterSet, default_format};
use paddi_core::snapshot::SnapshotStore;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub(super) enum ParameterSource {
    /// Commented header of an ASCII output file
    Header,
    /// `input_values` group of a namelist file
    Namelist,
    /// Scalar variables of a restart snapshot
    Snapshot,
}

#[derive(clap::Args)]
pub(super) struct ParamsArgs {
    /// File to read parameters from
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// How the parameters are recorded in FILE
    #[arg(long, value_enum, default_value_t = ParameterSource::Header)]
    source: ParameterSource,

    /// Preamble lines before the header values
    #[arg(long, default_value_t = HEADER_SKIP_LINES)]
    skip_lines: usize,

    /// Print JSON instead of a table
    #[arg(long)]
    json: bool,
}

#[derive(clap::Args)]
pub(super) struct InspectArgs {
    /// Run directory to scan
    #[arg(value_name = "DIR", default_value = ".")]
    directory: PathBuf,

    /// Print JSON instead of a table
    #[arg(long)]
    json: bool,
}

#[derive(clap::Args)]
pub(super) struct GenerateDumpArgs {
    /// Namelist file holding the `input_values` group
    #[arg(long, default_value = "parameter_file")]
    parameter_file: PathBuf,

    /// Output path; defaults to `name_of_input_restart_file` + `.cdf`
    /// next to the parameter file
    #[arg(long)]
    dump_file: Option<PathBuf>,
}

pub(super) fn run_params_command(args: ParamsArgs) -> Result<i32, CliError> {
    tracing::debug!(source = ?args.source, file = %args.file.display(), "reading parameters");
    let format = default_format();
    let parameters = match args.source {
        ParameterSource::Header => ParameterSet::from_header(&args.file, args.skip_lines, &format),
        ParameterSource::Namelist => ParameterSet::from_namelist_file(&args.file, &format),
        ParameterSource::Snapshot => {
            SnapshotStore::from_file(&args.file).map(|store| store.parameters().clone())
        }
    }
    .map_err(CliError::Core)?;

    if args.json {
        println!("{}", to_json(&parameters)?);
    } else {
        print!("{}", render_parameters(&parameters));
    }
    Ok(0)
}

pub(super) fn run_inspect_command(args: InspectArgs) -> Result<i32, CliError> {
    let run = RunFiles::scan(&args.directory).map_err(CliError::Core)?;
    if args.json {
        println!("{}", to_json(&run)?);
    } else {
        print!("{}", render_run_summary(&run));
    }
    Ok(0)
}

pub(super) fn run_generate_dump_command(args: GenerateDumpArgs) -> Result<i32, CliError> {
    let parameters = ParameterSet::from_namelist_file(&args.parameter_file, &default_format())
        .map_err(CliError::Core)?;
    let dump_path = match args.dump_file {
        Some(path) => path,
        None => default_dump_path(&args.parameter_file, &parameters).map_err(CliError::Core)?,
    };

    let store = SnapshotStore::generate(&parameters, &dump_path).map_err(CliError::Core)?;
    let (m, l, n) = store.shape();
    println!(
        "Generated snapshot {} (l={l}, m={m}, n={n})",
        store.path().display()
    );
    Ok(0)
}
