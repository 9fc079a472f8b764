//! Run configuration normalized into one typed parameter set.
//!
//! Parameters arrive from three places: the commented header at the top of
//! every ASCII output file, the namelist file the solver was started with,
//! and the scalar variables of a restart snapshot. All three end up as a
//! [`ParameterSet`] keyed by the canonical vocabulary of [`Parameter`].

mod header;
mod names;
mod namelist;

pub use header::{HEADER_SKIP_LINES, HeaderLayout};
pub use names::Parameter;

use crate::domain::{PaddiError, PaddiResult};
use crate::schema::{FieldKind, Schema, Value};
use crate::snapshot::container;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;
use std::path::Path;

const DEFAULT_TIME_STEP: f64 = 5.0e-7;
const DEALIASED_FACTOR: i64 = 3;
const ALIASED_FACTOR: i64 = 4;
const DEALIAS_KEY: &str = "dealias";

/// Parameter layout of the header written at the top of ASCII outputs.
pub fn default_format() -> Schema {
    Schema::from_pairs(
        Parameter::ALL[..21]
            .iter()
            .map(|parameter| (parameter.canonical_name(), parameter.kind())),
    )
}

/// Parameters a restart snapshot carries as scalar variables.
pub fn snapshot_format() -> Schema {
    Schema::from_pairs(
        Parameter::ALL[..10]
            .iter()
            .chain(&[Parameter::Step, Parameter::TimeStep, Parameter::Time])
            .map(|parameter| (parameter.canonical_name(), parameter.kind())),
    )
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSet {
    format: Schema,
    known: BTreeMap<Parameter, Value>,
    extra: Vec<(String, Value)>,
}

impl ParameterSet {
    /// Build a set from `(name, value)` entries given in either vocabulary.
    ///
    /// `istep`, `time` and `dt` receive defaults first and later entries win
    /// over earlier ones. Missing grid sizes are derived from the mode counts
    /// and every name in `format` must resolve once construction is done.
    pub fn from_entries<I, S>(format: &Schema, entries: I) -> PaddiResult<Self>
    where
        I: IntoIterator<Item = (S, Value)>,
        S: Into<String>,
    {
        let mut known = BTreeMap::new();
        let mut extra: Vec<(String, Value)> = Vec::new();
        known.insert(Parameter::Step, Value::Integer(0));
        known.insert(Parameter::Time, Value::Float(0.0));
        let mut explicit_time_step = false;

        for (name, value) in entries {
            let name = name.into();
            match Parameter::resolve(&name) {
                Some(parameter) => {
                    let coerced = value.coerce(parameter.kind()).ok_or_else(|| {
                        PaddiError::InvalidValue {
                            name: parameter.canonical_name().to_string(),
                            reason: format!("{value} is not a valid {}", parameter.kind()),
                        }
                    })?;
                    explicit_time_step |= parameter == Parameter::TimeStep;
                    known.insert(parameter, coerced);
                }
                None => match extra.iter_mut().find(|(key, _)| *key == name) {
                    Some(slot) => slot.1 = value,
                    None => extra.push((name, value)),
                },
            }
        }

        if !explicit_time_step {
            let dt = known
                .get(&Parameter::InitialTimeStep)
                .and_then(Value::as_f64)
                .unwrap_or(DEFAULT_TIME_STEP);
            known.insert(Parameter::TimeStep, Value::Float(dt));
        }

        let factor = dealias_factor(
            extra
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(DEALIAS_KEY))
                .map(|(_, value)| value),
        );
        for (modes, points) in [
            (Parameter::MaxXModes, Parameter::Nx),
            (Parameter::MaxYModes, Parameter::Ny),
            (Parameter::MaxZModes, Parameter::Nz),
        ] {
            if known.contains_key(&points) {
                continue;
            }
            if let Some(count) = known.get(&modes).and_then(Value::as_i64) {
                known.insert(points, Value::Integer(count * factor));
            }
        }

        let set = Self {
            format: format.clone(),
            known,
            extra,
        };
        for name in format.names() {
            if !set.contains(name) {
                return Err(PaddiError::missing_parameter(name));
            }
        }
        Ok(set)
    }

    /// Read the header that precedes the data of an ASCII output file.
    pub fn from_header(
        path: impl AsRef<Path>,
        skip_lines: usize,
        format: &Schema,
    ) -> PaddiResult<Self> {
        header::read_header(path.as_ref(), skip_lines, format)
    }

    /// Read the `input_values` group of a solver namelist file.
    pub fn from_namelist_file(path: impl AsRef<Path>, format: &Schema) -> PaddiResult<Self> {
        let path = path.as_ref();
        let entries = namelist::read_group(path, namelist::INPUT_GROUP)?;
        tracing::debug!(
            path = %path.display(),
            entries = entries.len(),
            "parsed namelist group"
        );
        Self::from_entries(format, entries)
    }

    /// Reconstruct parameters from the scalars and axis sizes of a snapshot.
    ///
    /// Grid and transpose settings do not survive in a snapshot; they come
    /// back as values derived from the axes, or as zero.
    pub fn from_snapshot_metadata(file: &netcdf::File, format: &Schema) -> PaddiResult<Self> {
        let axis = |name: &str| {
            container::dimension_len(file, name)
                .map(|len| len as i64)
                .ok_or_else(|| PaddiError::missing_parameter(format!("dimension '{name}'")))
        };
        let (l, m, n) = (axis("l")?, axis("m")?, axis("n")?);

        let mut entries = container::scalar_variables(file)
            .into_iter()
            .map(|(name, value)| {
                let name = Parameter::from_storage(&name)
                    .map(|parameter| parameter.canonical_name().to_string())
                    .unwrap_or(name);
                (name, value)
            })
            .collect::<Vec<_>>();

        entries.extend([
            (Parameter::MaxXModes, Value::Integer(l - 1)),
            (Parameter::MaxYModes, Value::Integer(m / 2)),
            (Parameter::MaxZModes, Value::Integer(n / 2)),
            (Parameter::Nx, Value::Integer((l - 1) * 2)),
            (Parameter::Ny, Value::Integer(m)),
            (Parameter::Nz, Value::Integer(n)),
            (Parameter::CflSafetyFactor, Value::Float(0.0)),
            (Parameter::MaximumTimeStep, Value::Float(0.0)),
            (Parameter::InitialTimeStep, Value::Float(0.0)),
            (Parameter::TasksFirstTranspose, Value::Integer(0)),
            (Parameter::TasksSecondTranspose, Value::Integer(0)),
        ]
        .map(|(parameter, value)| (parameter.canonical_name().to_string(), value)));

        Self::from_entries(format, entries)
    }

    pub fn format(&self) -> &Schema {
        &self.format
    }

    pub fn value(&self, parameter: Parameter) -> Option<&Value> {
        self.known.get(&parameter)
    }

    pub fn extra(&self, name: &str) -> Option<&Value> {
        self.extra
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_ok()
    }

    /// Look a value up by canonical or storage name, then among extras.
    pub fn get(&self, name: &str) -> PaddiResult<&Value> {
        let found = match Parameter::resolve(name) {
            Some(parameter) => self.known.get(&parameter),
            None => self.extra(name),
        };
        found.ok_or_else(|| PaddiError::KeyNotFound {
            name: name.to_string(),
        })
    }

    pub fn float(&self, parameter: Parameter) -> PaddiResult<f64> {
        self.value(parameter)
            .and_then(Value::as_f64)
            .ok_or_else(|| PaddiError::KeyNotFound {
                name: parameter.canonical_name().to_string(),
            })
    }

    pub fn integer(&self, parameter: Parameter) -> PaddiResult<i64> {
        self.value(parameter)
            .and_then(Value::as_i64)
            .ok_or_else(|| PaddiError::KeyNotFound {
                name: parameter.canonical_name().to_string(),
            })
    }

    pub fn known(&self) -> impl Iterator<Item = (Parameter, &Value)> {
        self.known.iter().map(|(parameter, value)| (*parameter, value))
    }

    pub fn extras(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.extra.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Render the header layout read by [`ParameterSet::from_header`].
    pub fn to_header_string(&self, skip_lines: usize) -> String {
        let mut out = String::new();
        for index in 0..skip_lines {
            if index == 0 {
                out.push_str("# run parameters\n");
            } else {
                out.push_str("#\n");
            }
        }
        for field in self.format.fields() {
            let rendered = match self.get(&field.name) {
                Ok(value) => render_header_value(value, field.kind),
                Err(_) => continue,
            };
            out.push_str(&format!("# {} = {rendered}\n", field.name));
        }
        out
    }
}

fn render_header_value(value: &Value, kind: FieldKind) -> String {
    value
        .coerce(kind)
        .unwrap_or_else(|| value.clone())
        .to_string()
}

fn dealias_factor(setting: Option<&Value>) -> i64 {
    match setting {
        Some(Value::Logical(false)) | Some(Value::Integer(0)) => ALIASED_FACTOR,
        _ => DEALIASED_FACTOR,
    }
}

impl Serialize for ParameterSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.known.len() + self.extra.len()))?;
        for (parameter, value) in &self.known {
            map.serialize_entry(parameter.canonical_name(), value)?;
        }
        for (key, value) in &self.extra {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
