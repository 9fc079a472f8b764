use super::{ParameterSet, default_format};
use crate::domain::{PaddiError, PaddiResult};
use crate::schema::Schema;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Number of preamble lines the solver writes before the parameter lines.
pub const HEADER_SKIP_LINES: usize = 12;

/// Where the parameter header sits in an ASCII output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderLayout {
    pub skip_lines: usize,
    pub format: Schema,
}

impl Default for HeaderLayout {
    fn default() -> Self {
        Self {
            skip_lines: HEADER_SKIP_LINES,
            format: default_format(),
        }
    }
}

impl HeaderLayout {
    pub fn with_skip_lines(mut self, skip_lines: usize) -> Self {
        self.skip_lines = skip_lines;
        self
    }

    pub fn with_format(mut self, format: Schema) -> Self {
        self.format = format;
        self
    }

    pub fn read(&self, path: impl AsRef<Path>) -> PaddiResult<ParameterSet> {
        ParameterSet::from_header(path, self.skip_lines, &self.format)
    }
}

pub(super) fn read_header(
    path: &Path,
    skip_lines: usize,
    format: &Schema,
) -> PaddiResult<ParameterSet> {
    let file = File::open(path).map_err(|source| PaddiError::io(path, source))?;
    let mut lines = BufReader::new(file).lines().skip(skip_lines);

    let mut entries = Vec::with_capacity(format.len());
    for (offset, field) in format.fields().iter().enumerate() {
        let line_number = skip_lines + offset + 1;
        let line = match lines.next() {
            Some(line) => line.map_err(|source| PaddiError::io(path, source))?,
            None => {
                return Err(PaddiError::format(
                    path,
                    line_number,
                    format!("header ends before parameter '{}'", field.name),
                ));
            }
        };

        let token = line.split_whitespace().next_back().ok_or_else(|| {
            PaddiError::format(
                path,
                line_number,
                format!("no value for parameter '{}'", field.name),
            )
        })?;
        let value = field.kind.parse(token).ok_or_else(|| {
            PaddiError::format(
                path,
                line_number,
                format!(
                    "parameter '{}' expects {} but found '{}'",
                    field.name, field.kind, token
                ),
            )
        })?;
        entries.push((field.name.clone(), value));
    }

    tracing::debug!(path = %path.display(), parameters = entries.len(), "read parameter header");
    ParameterSet::from_entries(format, entries)
}
