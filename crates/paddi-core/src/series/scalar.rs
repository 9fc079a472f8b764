use crate::domain::{PaddiError, PaddiResult};
use crate::parameters::{HeaderLayout, ParameterSet};
use crate::schema::{FieldKind, Schema, Value};
use ndarray::Array1;
use serde::Serialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

pub const STEP_COLUMN: &str = "istep";
pub const TIME_COLUMN: &str = "t";

const DIAGNOSTIC_FLOAT_COLUMNS: [&str; 34] = [
    "t",
    "dt",
    "urms",
    "VORTrms",
    "TEMPrms",
    "CHEMrms",
    "flux_Temp",
    "flux_Chem",
    "Temp_min",
    "Temp_max",
    "Chem_min",
    "Chem_max",
    "u_min(1)",
    "u_max(1)",
    "u_min(2)",
    "u_max(2)",
    "u_min(3)",
    "u_max(3)",
    "VORT_min(1)",
    "VORT_max(1)",
    "VORT_min(2)",
    "VORT_max(2)",
    "VORT_min(3)",
    "VORT_max(3)",
    "u_max_abs",
    "VORT_max_abs",
    "uxrms",
    "uyrms",
    "uzrms",
    "VORTXrms",
    "VORTYrms",
    "VORTZrms",
    "diss_Temp",
    "diss_Chem",
];

/// Column layout of the per-step diagnostic tables (`OUT*`).
pub fn default_diagnostic_format() -> Schema {
    Schema::from_pairs(
        std::iter::once((STEP_COLUMN, FieldKind::Integer)).chain(
            DIAGNOSTIC_FLOAT_COLUMNS
                .iter()
                .map(|name| (*name, FieldKind::Float)),
        ),
    )
}

/// One typed column of a scalar series.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Column {
    Integer(Vec<i64>),
    Float(Vec<f64>),
}

impl Column {
    fn empty(kind: FieldKind) -> Self {
        match kind {
            FieldKind::Integer => Self::Integer(Vec::new()),
            FieldKind::Float => Self::Float(Vec::new()),
        }
    }

    fn push(&mut self, value: &Value) {
        match self {
            Self::Integer(values) => values.extend(value.as_i64()),
            Self::Float(values) => values.extend(value.as_f64()),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Integer(values) => values.len(),
            Self::Float(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_integers(&self) -> Option<&[i64]> {
        match self {
            Self::Integer(values) => Some(values),
            Self::Float(_) => None,
        }
    }

    pub fn as_floats(&self) -> Option<&[f64]> {
        match self {
            Self::Float(values) => Some(values),
            Self::Integer(_) => None,
        }
    }

    pub fn to_f64(&self) -> Array1<f64> {
        match self {
            Self::Integer(values) => values.iter().map(|value| *value as f64).collect(),
            Self::Float(values) => Array1::from_vec(values.clone()),
        }
    }
}

/// Rows of one or more diagnostic tables, concatenated in file order.
#[derive(Debug, Clone)]
pub struct ScalarSeries {
    format: Schema,
    columns: Vec<Column>,
    parameters: Option<ParameterSet>,
}

impl ScalarSeries {
    /// Load `files` in order; parameters come from the header of the first.
    pub fn load<P: AsRef<Path>>(files: &[P], format: &Schema) -> PaddiResult<Self> {
        Self::load_with_header(files, format, Some(&HeaderLayout::default()))
    }

    pub fn load_with_header<P: AsRef<Path>>(
        files: &[P],
        format: &Schema,
        header: Option<&HeaderLayout>,
    ) -> PaddiResult<Self> {
        let mut columns = format
            .fields()
            .iter()
            .map(|field| Column::empty(field.kind))
            .collect::<Vec<_>>();

        for path in files {
            let path = path.as_ref();
            let before = columns.first().map_or(0, Column::len);
            read_rows(path, format, &mut columns)?;
            tracing::debug!(
                path = %path.display(),
                rows = columns.first().map_or(0, Column::len) - before,
                "read scalar table"
            );
        }

        let parameters = match (header, files.first()) {
            (Some(layout), Some(first)) => Some(layout.read(first)?),
            _ => None,
        };

        Ok(Self {
            format: format.clone(),
            columns,
            parameters,
        })
    }

    pub fn len(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn format(&self) -> &Schema {
        &self.format
    }

    pub fn parameters(&self) -> Option<&ParameterSet> {
        self.parameters.as_ref()
    }

    pub fn column(&self, name: &str) -> PaddiResult<&Column> {
        self.format
            .position(name)
            .map(|index| &self.columns[index])
            .ok_or_else(|| PaddiError::KeyNotFound {
                name: name.to_string(),
            })
    }

    pub fn column_f64(&self, name: &str) -> PaddiResult<Array1<f64>> {
        self.column(name).map(Column::to_f64)
    }

    pub fn steps(&self) -> PaddiResult<&[i64]> {
        self.column(STEP_COLUMN)?.as_integers().ok_or_else(|| {
            PaddiError::invalid_schema(format!("column '{STEP_COLUMN}' is not an integer column"))
        })
    }

    pub fn times(&self) -> PaddiResult<Array1<f64>> {
        self.column_f64(TIME_COLUMN)
    }
}

fn read_rows(path: &Path, format: &Schema, columns: &mut [Column]) -> PaddiResult<()> {
    let file = File::open(path).map_err(|source| PaddiError::io(path, source))?;
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|source| PaddiError::io(path, source))?;
        let content = strip_comment(&line);
        if content.trim().is_empty() {
            continue;
        }
        let record = format
            .parse_record(content)
            .map_err(|reason| PaddiError::format(path, index + 1, reason))?;
        for (column, value) in columns.iter_mut().zip(&record) {
            column.push(value);
        }
    }
    Ok(())
}

/// Text before the first `#`.
pub(crate) fn strip_comment(line: &str) -> &str {
    line.split_once('#').map_or(line, |(data, _)| data)
}
