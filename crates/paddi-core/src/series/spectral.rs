use super::block::{BlockReaderConfig, BlockSeries};
use crate::domain::{PaddiError, PaddiResult};
use crate::parameters::{HeaderLayout, ParameterSet};
use crate::schema::{Schema, index_column_names};
use ndarray::{ArrayViewD, Dimension};
use serde::Serialize;
use std::path::Path;

pub const SPECTRAL_COMMENT_PATTERN: &str = "#Timstep=(.*)time=(.*)";

const ENERGY_COLUMNS: [&str; 6] = [
    "energy_u1",
    "energy_u2",
    "energy_u3",
    "energy_u",
    "energy_Temp",
    "energy_Chem",
];

pub fn default_energy_format() -> Schema {
    Schema::floats(&ENERGY_COLUMNS)
}

/// Reader for spectral energy files. Rows start with `dims` wavenumber
/// columns (`k0`, `k1`, ...) that act as the sort keys.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectralSeriesReader {
    dims: usize,
    format: Schema,
    block_limit: Option<usize>,
    header: Option<HeaderLayout>,
}

impl SpectralSeriesReader {
    pub fn new(dims: usize) -> Self {
        Self {
            dims,
            format: default_energy_format(),
            block_limit: None,
            header: Some(HeaderLayout::default()),
        }
    }

    /// `Z_SPEC*` files.
    pub fn vertical() -> Self {
        Self::new(1)
    }

    /// `XY_SPEC*` files.
    pub fn horizontal() -> Self {
        Self::new(2)
    }

    pub fn with_format(mut self, format: Schema) -> Self {
        self.format = format;
        self
    }

    pub fn with_block_limit(mut self, block_limit: Option<usize>) -> Self {
        self.block_limit = block_limit;
        self
    }

    pub fn with_header(mut self, header: Option<HeaderLayout>) -> Self {
        self.header = header;
        self
    }

    pub fn block_config(&self) -> BlockReaderConfig {
        BlockReaderConfig::default()
            .with_format(self.format.with_index_columns(self.dims))
            .with_sort_keys(index_column_names(self.dims))
            .with_comment_pattern(SPECTRAL_COMMENT_PATTERN)
            .with_block_limit(self.block_limit)
            .with_header(self.header.clone())
    }

    pub fn load<P: AsRef<Path>>(&self, files: &[P]) -> PaddiResult<SpectralSeries> {
        Ok(SpectralSeries {
            dims: self.dims,
            series: BlockSeries::load(files, &self.block_config())?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct SpectralSeries {
    dims: usize,
    series: BlockSeries,
}

/// Position and wavenumbers of the most energetic mode in one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpectralPeak {
    /// Index into the spatial shape of the snapshot.
    pub index: Vec<usize>,
    /// Values of `k0..k{dims-1}` at that index.
    pub wavenumbers: Vec<f64>,
    pub energy: f64,
}

impl SpectralSeries {
    pub fn dims(&self) -> usize {
        self.dims
    }

    pub fn series(&self) -> &BlockSeries {
        &self.series
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn shape(&self) -> &[usize] {
        self.series.shape()
    }

    pub fn field(&self, name: &str) -> PaddiResult<ArrayViewD<'_, f64>> {
        self.series.field(name)
    }

    pub fn snapshot(&self, name: &str, t: usize) -> PaddiResult<ArrayViewD<'_, f64>> {
        self.series.snapshot(name, t)
    }

    pub fn steps(&self) -> &[i64] {
        self.series.steps()
    }

    pub fn times(&self) -> &[f64] {
        self.series.times()
    }

    pub fn parameters(&self) -> Option<&ParameterSet> {
        self.series.parameters()
    }

    pub fn peak_mode(&self, energy_field: &str, t: usize) -> PaddiResult<SpectralPeak> {
        let energy = self.series.snapshot(energy_field, t)?;
        let (index, peak) = energy
            .indexed_iter()
            .max_by(|(_, left), (_, right)| left.total_cmp(right))
            .map(|(index, value)| (index.slice().to_vec(), *value))
            .ok_or_else(|| PaddiError::KeyNotFound {
                name: format!("{energy_field}[{t}]"),
            })?;

        let wavenumbers = index_column_names(self.dims)
            .iter()
            .map(|name| {
                let axis = self.series.snapshot(name, t)?;
                axis.get(index.as_slice())
                    .copied()
                    .ok_or_else(|| PaddiError::KeyNotFound { name: name.clone() })
            })
            .collect::<PaddiResult<Vec<_>>>()?;

        Ok(SpectralPeak {
            index,
            wavenumbers,
            energy: peak,
        })
    }
}
