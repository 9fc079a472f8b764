//! Classification of the files a run leaves in its working directory.

use crate::domain::{OutputKind, PaddiError, PaddiResult};
use globset::{Glob, GlobMatcher};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunFiles {
    pub directory: PathBuf,
    pub diagnostics: Vec<PathBuf>,
    pub dumps: Vec<PathBuf>,
    pub profiles: Vec<PathBuf>,
    pub vertical_spectra: Vec<PathBuf>,
    pub horizontal_spectra: Vec<PathBuf>,
}

impl RunFiles {
    /// List the regular files directly inside `directory`, grouped by kind
    /// and sorted by name. Files of no known kind are ignored.
    pub fn scan(directory: impl AsRef<Path>) -> PaddiResult<Self> {
        let directory = directory.as_ref();
        let matchers = OutputKind::ALL
            .into_iter()
            .map(|kind| kind_matcher(kind).map(|matcher| (kind, matcher)))
            .collect::<PaddiResult<Vec<_>>>()?;

        let mut run = Self {
            directory: directory.to_path_buf(),
            ..Self::default()
        };
        let entries = fs::read_dir(directory).map_err(|source| PaddiError::io(directory, source))?;
        for entry in entries {
            let entry = entry.map_err(|source| PaddiError::io(directory, source))?;
            let file_type = entry
                .file_type()
                .map_err(|source| PaddiError::io(entry.path(), source))?;
            if !file_type.is_file() {
                continue;
            }
            let name = entry.file_name();
            if let Some((kind, _)) = matchers
                .iter()
                .find(|(_, matcher)| matcher.is_match(Path::new(&name)))
            {
                run.files_mut(*kind).push(entry.path());
            }
        }

        for kind in OutputKind::ALL {
            run.files_mut(kind).sort();
        }
        tracing::debug!(
            directory = %directory.display(),
            diagnostics = run.diagnostics.len(),
            dumps = run.dumps.len(),
            profiles = run.profiles.len(),
            "scanned run directory"
        );
        Ok(run)
    }

    pub fn files(&self, kind: OutputKind) -> &[PathBuf] {
        match kind {
            OutputKind::Diagnostic => &self.diagnostics,
            OutputKind::Dump => &self.dumps,
            OutputKind::Profile => &self.profiles,
            OutputKind::VerticalSpectrum => &self.vertical_spectra,
            OutputKind::HorizontalSpectrum => &self.horizontal_spectra,
        }
    }

    fn files_mut(&mut self, kind: OutputKind) -> &mut Vec<PathBuf> {
        match kind {
            OutputKind::Diagnostic => &mut self.diagnostics,
            OutputKind::Dump => &mut self.dumps,
            OutputKind::Profile => &mut self.profiles,
            OutputKind::VerticalSpectrum => &mut self.vertical_spectra,
            OutputKind::HorizontalSpectrum => &mut self.horizontal_spectra,
        }
    }

    pub fn is_empty(&self) -> bool {
        OutputKind::ALL
            .into_iter()
            .all(|kind| self.files(kind).is_empty())
    }
}

fn kind_matcher(kind: OutputKind) -> PaddiResult<GlobMatcher> {
    let pattern = format!("{}*", kind.file_prefix());
    Glob::new(&pattern)
        .map(|glob| glob.compile_matcher())
        .map_err(|error| PaddiError::invalid_schema(format!("glob '{pattern}': {error}")))
}
