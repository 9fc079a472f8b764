//! Typed readers and writers for the files a PADDI run produces: scalar
//! diagnostics, multi-block profiles and spectra, and netCDF restart snapshots.

pub mod discovery;
pub mod domain;
pub mod parameters;
pub mod schema;
pub mod series;
pub mod snapshot;
