//! netCDF access for snapshot files.

use crate::domain::{PaddiError, PaddiResult};
use crate::schema::Value;
use netcdf::types::{FloatType, IntType, NcVariableType};
use std::fs;
use std::path::Path;

/// Open an existing snapshot read-only.
pub(crate) fn open(path: &Path) -> PaddiResult<netcdf::File> {
    fs::metadata(path).map_err(|source| PaddiError::io(path, source))?;
    netcdf::open(path).map_err(|error| container_error(path, error))
}

pub(crate) fn container_error(path: &Path, error: netcdf::Error) -> PaddiError {
    PaddiError::container(path, error.to_string())
}

pub(crate) fn dimension_len(file: &netcdf::File, name: &str) -> Option<usize> {
    file.dimension(name).map(|dimension| dimension.len())
}

/// Value of a zero-dimensional numeric variable.
pub(crate) fn scalar_value(variable: &netcdf::Variable<'_>) -> Option<Value> {
    if !variable.dimensions().is_empty() {
        return None;
    }
    match variable.vartype() {
        NcVariableType::Float(FloatType::F64) => {
            variable.get_value::<f64, _>(..).ok().map(Value::Float)
        }
        NcVariableType::Float(FloatType::F32) => variable
            .get_value::<f32, _>(..)
            .ok()
            .map(|value| Value::Float(f64::from(value))),
        NcVariableType::Int(IntType::I32) => variable
            .get_value::<i32, _>(..)
            .ok()
            .map(|value| Value::Integer(i64::from(value))),
        NcVariableType::Int(IntType::I16) => variable
            .get_value::<i16, _>(..)
            .ok()
            .map(|value| Value::Integer(i64::from(value))),
        NcVariableType::Int(IntType::I8) => variable
            .get_value::<i8, _>(..)
            .ok()
            .map(|value| Value::Integer(i64::from(value))),
        NcVariableType::Int(IntType::I64) => {
            variable.get_value::<i64, _>(..).ok().map(Value::Integer)
        }
        _ => None,
    }
}

/// Scalar variables of `file`, by stored name, in file order.
pub(crate) fn scalar_variables(file: &netcdf::File) -> Vec<(String, Value)> {
    file.variables()
        .filter_map(|variable| scalar_value(&variable).map(|value| (variable.name(), value)))
        .collect()
}

/// Every value of a double-precision variable whose dimensions are `dimensions`.
pub(crate) fn read_doubles(
    file: &netcdf::File,
    name: &str,
    dimensions: &[&str],
    path: &Path,
) -> PaddiResult<Vec<f64>> {
    let variable = file
        .variable(name)
        .ok_or_else(|| PaddiError::container(path, format!("variable '{name}' is missing")))?;
    let found = variable
        .dimensions()
        .iter()
        .map(|dimension| dimension.name())
        .collect::<Vec<_>>();
    if found != dimensions {
        return Err(PaddiError::container(
            path,
            format!("variable '{name}' has dimensions {found:?}, expected {dimensions:?}"),
        ));
    }
    if !matches!(variable.vartype(), NcVariableType::Float(FloatType::F64)) {
        return Err(PaddiError::container(
            path,
            format!("variable '{name}' is not double precision"),
        ));
    }
    variable
        .get_values::<f64, _>(..)
        .map_err(|error| container_error(path, error))
}
