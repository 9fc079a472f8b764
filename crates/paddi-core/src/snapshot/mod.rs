//! Restart snapshots: spectral fields plus the parameters of the run.
//!
//! A snapshot holds every parameter as a scalar variable (storage names for
//! the physical ones), the wavenumber axes `kx`, `ky`, `kz`, the `ri` axis and
//! five fields shaped `(m, l, n, ri)` where the last axis separates real and
//! imaginary parts.

pub(crate) mod container;
mod wavenumbers;

pub use wavenumbers::{ascending_wavenumbers, fft_wavenumbers, wavenumber_step};

use crate::domain::{PaddiError, PaddiResult};
use crate::parameters::{Parameter, ParameterSet, default_format};
use crate::schema::{FieldKind, Value};
use ndarray::{Array1, Array3, Array4, ArrayView1, ArrayView3, ArrayView4, ArrayViewMut4};
use num_complex::Complex64;
use serde::Serialize;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum SpectralField {
    Chem,
    Temp,
    Ux,
    Uy,
    Uz,
}

impl SpectralField {
    pub const ALL: [SpectralField; 5] = [Self::Chem, Self::Temp, Self::Ux, Self::Uy, Self::Uz];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Chem => "Chem",
            Self::Temp => "Temp",
            Self::Ux => "ux",
            Self::Uy => "uy",
            Self::Uz => "uz",
        }
    }

    const fn index(self) -> usize {
        self as usize
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.name() == name)
    }
}

impl Display for SpectralField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).name())
    }
}

const FIELD_DIMENSIONS: [&str; 4] = ["m", "l", "n", "ri"];

/// A restart snapshot held in memory and written back through a temp file.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
    parameters: ParameterSet,
    scalars: Vec<(String, Value)>,
    kx: Array1<f64>,
    ky: Array1<f64>,
    kz: Array1<f64>,
    fields: [Array4<f64>; 5],
}

impl SnapshotStore {
    /// Create a snapshot for `parameters` with zero-filled fields and write
    /// it to `path`. Nothing is left at `path` if any step fails.
    pub fn generate(parameters: &ParameterSet, path: impl AsRef<Path>) -> PaddiResult<Self> {
        let path = path.as_ref();
        let l = mode_count(parameters, Parameter::MaxXModes)? + 1;
        let m = mode_count(parameters, Parameter::MaxYModes)? * 2;
        let n = mode_count(parameters, Parameter::MaxZModes)? * 2;
        let scalars = stored_scalars(parameters, path)?;

        let step = |storage_name: &str| {
            scalars
                .iter()
                .find(|(name, _)| name == storage_name)
                .and_then(|(_, value)| value.as_f64())
                .map(wavenumber_step)
                .ok_or_else(|| PaddiError::missing_parameter(storage_name))
        };
        let (x_step, y_step, z_step) = (step("Gammax")?, step("Gammay")?, step("Gammaz")?);

        let store = Self {
            path: path.to_path_buf(),
            parameters: parameters.clone(),
            kx: Array1::from(ascending_wavenumbers(l, x_step)),
            ky: Array1::from(fft_wavenumbers(m, y_step)),
            kz: Array1::from(fft_wavenumbers(n, z_step)),
            fields: SpectralField::ALL.map(|_| Array4::zeros((m, l, n, 2))),
            scalars,
        };
        store.write(path)?;
        tracing::info!(
            path = %path.display(),
            scalars = store.scalars.len(),
            "generated snapshot"
        );
        Ok(store)
    }

    /// Open an existing snapshot whose stored physical parameters must equal
    /// those in `parameters`.
    pub fn load(parameters: &ParameterSet, path: impl AsRef<Path>) -> PaddiResult<Self> {
        let path = path.as_ref();
        let file = container::open(path)?;
        verify_parameters(parameters, &file)?;
        let store = Self::read(parameters.clone(), &file, path)?;
        tracing::debug!(path = %path.display(), "loaded snapshot");
        Ok(store)
    }

    /// Open a snapshot and rebuild its parameters from its own metadata.
    pub fn from_file(path: impl AsRef<Path>) -> PaddiResult<Self> {
        let path = path.as_ref();
        let file = container::open(path)?;
        let parameters = ParameterSet::from_snapshot_metadata(&file, &default_format())?;
        verify_parameters(&parameters, &file)?;
        Self::read(parameters, &file, path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn parameters(&self) -> &ParameterSet {
        &self.parameters
    }

    /// Field extents as `(m, l, n)`.
    pub fn shape(&self) -> (usize, usize, usize) {
        let (m, l, n, _) = self.fields[0].dim();
        (m, l, n)
    }

    /// Scalar variable stored under `name`.
    pub fn scalar(&self, name: &str) -> Option<&Value> {
        self.scalars
            .iter()
            .find(|(stored, _)| stored == name)
            .map(|(_, value)| value)
    }

    pub fn scalars(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.scalars.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn field(&self, field: SpectralField) -> ArrayView4<'_, f64> {
        self.fields[field.index()].view()
    }

    pub fn field_mut(&mut self, field: SpectralField) -> ArrayViewMut4<'_, f64> {
        self.fields[field.index()].view_mut()
    }

    /// Copy of a field as complex amplitudes shaped `(m, l, n)`.
    pub fn field_complex(&self, field: SpectralField) -> Array3<Complex64> {
        let values = self.field(field);
        let (m, l, n, _) = values.dim();
        Array3::from_shape_fn((m, l, n), |(j, i, k)| {
            Complex64::new(values[[j, i, k, 0]], values[[j, i, k, 1]])
        })
    }

    pub fn set_field_complex(
        &mut self,
        field: SpectralField,
        amplitudes: ArrayView3<'_, Complex64>,
    ) -> PaddiResult<()> {
        let (m, l, n) = self.shape();
        if amplitudes.dim() != (m, l, n) {
            return Err(PaddiError::InvalidValue {
                name: field.name().to_string(),
                reason: format!(
                    "complex field shaped {:?} does not fit ({m}, {l}, {n})",
                    amplitudes.dim()
                ),
            });
        }
        let mut values = self.field_mut(field);
        for ((j, i, k), amplitude) in amplitudes.indexed_iter() {
            values[[j, i, k, 0]] = amplitude.re;
            values[[j, i, k, 1]] = amplitude.im;
        }
        Ok(())
    }

    pub fn kx(&self) -> ArrayView1<'_, f64> {
        self.kx.view()
    }

    pub fn ky(&self) -> ArrayView1<'_, f64> {
        self.ky.view()
    }

    pub fn kz(&self) -> ArrayView1<'_, f64> {
        self.kz.view()
    }

    pub fn save(&self) -> PaddiResult<()> {
        self.write(&self.path)
    }

    /// Write to `path` and keep it as the target of later saves.
    pub fn save_as(&mut self, path: impl AsRef<Path>) -> PaddiResult<()> {
        let path = path.as_ref();
        self.write(path)?;
        self.path = path.to_path_buf();
        Ok(())
    }

    pub fn close(self) -> PaddiResult<()> {
        self.save()
    }

    fn read(parameters: ParameterSet, file: &netcdf::File, path: &Path) -> PaddiResult<Self> {
        let dimension = |name: &str| {
            container::dimension_len(file, name).ok_or_else(|| {
                PaddiError::container(path, format!("dimension '{name}' is missing"))
            })
        };
        let (l, m, n) = (dimension("l")?, dimension("m")?, dimension("n")?);
        let ri = dimension("ri")?;
        if ri != 2 {
            return Err(PaddiError::container(
                path,
                format!("dimension 'ri' has length {ri}, expected 2"),
            ));
        }

        let axis = |name: &str, dimension: &str| {
            container::read_doubles(file, name, &[dimension], path).map(Array1::from)
        };
        let (kx, ky, kz) = (axis("kx", "l")?, axis("ky", "m")?, axis("kz", "n")?);

        let fields = SpectralField::ALL
            .into_iter()
            .map(|field| {
                let values = container::read_doubles(file, field.name(), &FIELD_DIMENSIONS, path)?;
                Array4::from_shape_vec((m, l, n, 2), values)
                    .map_err(|error| PaddiError::container(path, error.to_string()))
            })
            .collect::<PaddiResult<Vec<_>>>()?;
        let fields = <[Array4<f64>; 5]>::try_from(fields)
            .map_err(|_| PaddiError::container(path, "expected five spectral fields"))?;

        Ok(Self {
            path: path.to_path_buf(),
            parameters,
            scalars: container::scalar_variables(file),
            kx,
            ky,
            kz,
            fields,
        })
    }

    /// Stage the whole file beside `path`, then rename it into place.
    fn write(&self, path: &Path) -> PaddiResult<()> {
        let directory = path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let staged = tempfile::Builder::new()
            .prefix(".snapshot-")
            .suffix(".tmp")
            .tempfile_in(directory)
            .map_err(|source| PaddiError::io(directory, source))?;
        self.write_container(staged.path(), path)?;
        staged
            .persist(path)
            .map_err(|error| PaddiError::io(path, error.error))?;
        tracing::debug!(path = %path.display(), "wrote snapshot");
        Ok(())
    }

    fn write_container(&self, target: &Path, path: &Path) -> PaddiResult<()> {
        let nc = |error: netcdf::Error| container::container_error(path, error);
        let (m, l, n) = self.shape();

        let mut file = netcdf::create_with(target, netcdf::Options::_64BIT_OFFSET).map_err(nc)?;
        for (name, len) in [("l", l), ("m", m), ("n", n), ("ri", 2)] {
            file.add_dimension(name, len).map_err(nc)?;
        }
        for (name, value) in &self.scalars {
            let added = match value {
                Value::Integer(_) => file.add_variable::<i32>(name, &[]).map(drop),
                _ => file.add_variable::<f64>(name, &[]).map(drop),
            };
            added.map_err(nc)?;
        }
        for (name, dimension) in [("kx", "l"), ("ky", "m"), ("kz", "n")] {
            file.add_variable::<f64>(name, &[dimension]).map_err(nc)?;
        }
        file.add_variable::<i32>("ri", &["ri"]).map_err(nc)?;
        for field in SpectralField::ALL {
            file.add_variable::<f64>(field.name(), &FIELD_DIMENSIONS)
                .map_err(nc)?;
        }
        file.enddef().map_err(nc)?;

        for (name, value) in &self.scalars {
            let mut variable = variable_mut(&mut file, name, path)?;
            let written = match value {
                Value::Integer(integer) => {
                    variable.put_value(narrow_integer(name, *integer, path)?, ..)
                }
                Value::Float(float) => variable.put_value(*float, ..),
                _ => Ok(()),
            };
            written.map_err(nc)?;
        }
        for (name, values) in [("kx", &self.kx), ("ky", &self.ky), ("kz", &self.kz)] {
            variable_mut(&mut file, name, path)?
                .put_values(&values.to_vec(), ..)
                .map_err(nc)?;
        }
        variable_mut(&mut file, "ri", path)?
            .put_values(&[0_i32, 1], ..)
            .map_err(nc)?;
        for field in SpectralField::ALL {
            let values = self.field(field).iter().copied().collect::<Vec<_>>();
            variable_mut(&mut file, field.name(), path)?
                .put_values(&values, ..)
                .map_err(nc)?;
        }
        drop(file);
        Ok(())
    }
}

fn variable_mut<'f>(
    file: &'f mut netcdf::FileMut,
    name: &str,
    path: &Path,
) -> PaddiResult<netcdf::VariableMut<'f>> {
    file.variable_mut(name)
        .ok_or_else(|| PaddiError::container(path, format!("variable '{name}' is missing")))
}

fn verify_parameters(parameters: &ParameterSet, file: &netcdf::File) -> PaddiResult<()> {
    for (parameter, expected) in parameters.known() {
        let Some(storage_name) = parameter.storage_name() else {
            continue;
        };
        let stored = file
            .variable(storage_name)
            .and_then(|variable| container::scalar_value(&variable))
            .ok_or_else(|| PaddiError::missing_parameter(storage_name))?;
        if stored.as_f64() != expected.as_f64() {
            return Err(PaddiError::ParameterMismatch {
                name: parameter.canonical_name().to_string(),
                storage_name: storage_name.to_string(),
                expected: expected.to_string(),
                stored: stored.to_string(),
            });
        }
    }
    Ok(())
}

fn mode_count(parameters: &ParameterSet, parameter: Parameter) -> PaddiResult<usize> {
    let count = parameters
        .integer(parameter)
        .map_err(|_| PaddiError::missing_parameter(parameter.canonical_name()))?;
    usize::try_from(count).map_err(|_| PaddiError::InvalidValue {
        name: parameter.canonical_name().to_string(),
        reason: format!("mode count {count} is negative"),
    })
}

fn narrow_integer(name: &str, integer: i64, path: &Path) -> PaddiResult<i32> {
    i32::try_from(integer).map_err(|_| {
        PaddiError::container(
            path,
            format!("'{name}' = {integer} does not fit a 4-byte integer"),
        )
    })
}

fn scalar_entry(name: &str, value: &Value, kind: FieldKind, path: &Path) -> PaddiResult<Value> {
    match kind {
        FieldKind::Float => value
            .as_f64()
            .map(Value::Float)
            .ok_or_else(|| PaddiError::container(path, format!("'{name}' = {value} is not a real"))),
        FieldKind::Integer => {
            let integer = value.as_i64().ok_or_else(|| {
                PaddiError::container(path, format!("'{name}' = {value} is not an integer"))
            })?;
            narrow_integer(name, integer, path).map(|narrow| Value::Integer(i64::from(narrow)))
        }
    }
}

/// Scalars written to a new snapshot, known parameters under their stored
/// names first. Text and logical extras have no numeric form and are skipped.
fn stored_scalars(parameters: &ParameterSet, path: &Path) -> PaddiResult<Vec<(String, Value)>> {
    let mut scalars = Vec::new();
    for (parameter, value) in parameters.known() {
        let name = parameter.stored_name();
        scalars.push((
            name.to_string(),
            scalar_entry(name, value, parameter.kind(), path)?,
        ));
    }
    for (name, value) in parameters.extras() {
        let kind = parameters
            .format()
            .field(name)
            .map(|field| field.kind)
            .or_else(|| value.kind());
        let Some(kind) = kind else {
            tracing::warn!(parameter = name, value = %value, "skipping parameter with unsupported type");
            continue;
        };
        scalars.push((name.to_string(), scalar_entry(name, value, kind, path)?));
    }
    Ok(scalars)
}

#[cfg(test)]
mod tests {
    use super::{SnapshotStore, SpectralField};
    use crate::domain::PaddiError;
    use crate::parameters::{ParameterSet, default_format};
    use crate::schema::Value;
    use ndarray::Array3;
    use num_complex::Complex64;
    use std::f64::consts::PI;
    use tempfile::TempDir;

    fn small_run() -> ParameterSet {
        ParameterSet::from_entries(
            &default_format(),
            [
                ("thermal_buoyancy_param", Value::Float(1.0)),
                ("compositional_buoyancy_param", Value::Float(1.0)),
                ("viscous_diffusion_coeff", Value::Float(7.0)),
                ("thermal_diffusion_coeff", Value::Float(1.0)),
                ("compositional_diffusion_coeff", Value::Float(0.01)),
                ("thermal_stratif_param", Value::Float(1.0)),
                ("compositional_stratif_param", Value::Float(0.5)),
                ("x_extent_of_the_box", Value::Float(2.0 * PI)),
                ("y_extent_of_the_box", Value::Float(PI)),
                ("z_extent_of_the_box", Value::Float(4.0 * PI)),
                ("cfl_safety_factor", Value::Float(0.4)),
                ("maximum_time_step_length", Value::Float(0.1)),
                ("initial_time_step_length", Value::Float(1.0e-3)),
                ("max_degree_of_x_fourier_modes", Value::Integer(2)),
                ("max_degree_of_y_fourier_modes", Value::Integer(2)),
                ("max_degree_of_z_fourier_modes", Value::Integer(3)),
                ("number_of_tasks_1st_transpose", Value::Integer(1)),
                ("number_of_tasks_2nd_transpose", Value::Integer(1)),
            ],
        )
        .expect("parameters should build")
    }

    #[test]
    fn generated_axes_follow_fft_layout() {
        let temp = TempDir::new().expect("tempdir should be created");
        let store = SnapshotStore::generate(&small_run(), temp.path().join("DUMP0001.cdf"))
            .expect("snapshot should be generated");

        assert_eq!(store.kx().to_vec(), vec![0.0, 1.0, 2.0]);
        assert_eq!(store.ky().to_vec(), vec![0.0, 2.0, 4.0, -2.0]);
        let kz = store.kz().to_vec();
        assert_eq!(kz.len(), 6);
        assert!((kz[3] - 1.5).abs() < 1e-12);
        assert!((kz[4] + 1.0).abs() < 1e-12);

        let temp_field = store.field(SpectralField::Temp);
        assert_eq!(temp_field.dim(), (4, 3, 6, 2));
        assert!(temp_field.iter().all(|value| *value == 0.0));
    }

    #[test]
    fn complex_values_survive_save_and_reload() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("DUMP0001.cdf");
        let mut store =
            SnapshotStore::generate(&small_run(), &path).expect("snapshot should be generated");

        let amplitudes = Array3::from_shape_fn((4, 3, 6), |(j, i, k)| {
            Complex64::new(j as f64, (i * 10 + k) as f64)
        });
        store
            .set_field_complex(SpectralField::Chem, amplitudes.view())
            .expect("complex field should be stored");
        store.close().expect("snapshot should be saved");

        let reopened = SnapshotStore::load(&small_run(), &path).expect("snapshot should reload");
        let chem = reopened.field_complex(SpectralField::Chem);
        assert_eq!(chem, amplitudes);
        assert_eq!(reopened.field(SpectralField::Chem)[[1, 2, 5, 1]], 25.0);
        assert_eq!(reopened.scalar("ri"), None);
        assert_eq!(reopened.scalar("Gammay"), Some(&Value::Float(PI)));
    }

    #[test]
    fn wrong_complex_shape_is_rejected() {
        let temp = TempDir::new().expect("tempdir should be created");
        let mut store = SnapshotStore::generate(&small_run(), temp.path().join("DUMP.cdf"))
            .expect("snapshot should be generated");
        let amplitudes = Array3::<Complex64>::zeros((1, 1, 1));
        let error = store
            .set_field_complex(SpectralField::Ux, amplitudes.view())
            .expect_err("shape mismatch should fail");
        assert!(matches!(error, PaddiError::InvalidValue { .. }));
    }

    #[test]
    fn import_rebuilds_parameters_from_metadata() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("DUMP0001.cdf");
        SnapshotStore::generate(&small_run(), &path).expect("snapshot should be generated");

        let imported = SnapshotStore::from_file(&path).expect("snapshot should import");
        let parameters = imported.parameters();
        assert_eq!(parameters.get("Gammaz").ok(), Some(&Value::Float(4.0 * PI)));
        assert_eq!(parameters.get("nx").ok(), Some(&Value::Integer(4)));
        assert_eq!(parameters.get("ny").ok(), Some(&Value::Integer(4)));
        assert_eq!(parameters.get("max_degree_of_z_fourier_modes").ok(), Some(&Value::Integer(3)));
        assert_eq!(
            parameters.get("cfl_safety_factor").ok(),
            Some(&Value::Float(0.0))
        );
    }

    #[test]
    fn field_names_resolve() {
        assert_eq!(SpectralField::from_name("uz"), Some(SpectralField::Uz));
        assert_eq!(SpectralField::from_name("Uz"), None);
        assert_eq!(SpectralField::Temp.to_string(), "Temp");
    }
}
