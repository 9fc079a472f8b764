//! Readers for the time-indexed ASCII outputs of a run.

mod block;
mod scalar;
mod spectral;

pub use block::{BlockReaderConfig, BlockSeries, PROFILE_COMMENT_PATTERN, default_profile_format};
pub use scalar::{Column, STEP_COLUMN, ScalarSeries, TIME_COLUMN, default_diagnostic_format};
pub use spectral::{
    SPECTRAL_COMMENT_PATTERN, SpectralPeak, SpectralSeries, SpectralSeriesReader,
    default_energy_format,
};
