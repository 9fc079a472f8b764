use super::CliError;
use anyhow::Context;
use paddi_core::discovery::RunFiles;
use paddi_core::domain::{OutputKind, PaddiError, PaddiResult};
use paddi_core::parameters::ParameterSet;
use paddi_core::schema::Value;
use serde::Serialize;
use std::path::{Path, PathBuf};

const RESTART_NAME_KEY: &str = "name_of_input_restart_file";
const DUMP_EXTENSION: &str = "cdf";

pub(super) fn to_json<T: Serialize>(value: &T) -> Result<String, CliError> {
    serde_json::to_string_pretty(value)
        .context("failed to encode JSON output")
        .map_err(CliError::from)
}

pub(super) fn render_parameters(parameters: &ParameterSet) -> String {
    let mut out = String::new();
    for (parameter, value) in parameters.known() {
        out.push_str(&format!("{:<32} {value}\n", parameter.canonical_name()));
    }
    for (name, value) in parameters.extras() {
        out.push_str(&format!("{name:<32} {value}\n"));
    }
    out
}

pub(super) fn render_run_summary(run: &RunFiles) -> String {
    let mut out = String::new();
    out.push_str(&format!("Run directory: {}\n", run.directory.display()));
    for kind in OutputKind::ALL {
        let files = run.files(kind);
        out.push_str(&format!("{:<20} {}\n", kind.as_str(), files.len()));
        for file in files {
            let name = file
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            out.push_str(&format!("  {name}\n"));
        }
    }
    out
}

/// `name_of_input_restart_file` with a `.cdf` extension, beside the
/// parameter file.
pub(super) fn default_dump_path(
    parameter_file: &Path,
    parameters: &ParameterSet,
) -> PaddiResult<PathBuf> {
    let stem = match parameters.get(RESTART_NAME_KEY)? {
        Value::Text(name) => name.trim().to_string(),
        other => other.to_string(),
    };
    if stem.is_empty() {
        return Err(PaddiError::InvalidValue {
            name: RESTART_NAME_KEY.to_string(),
            reason: "restart file name is empty".to_string(),
        });
    }
    let directory = parameter_file.parent().unwrap_or_else(|| Path::new(""));
    Ok(directory.join(format!("{stem}.{DUMP_EXTENSION}")))
}
