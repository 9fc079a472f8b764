pub mod errors;

pub use errors::{ErrorCategory, PaddiError, PaddiResult};

use serde::Serialize;
use std::fmt::{Display, Formatter};

/// Kinds of files a simulation run leaves in its working directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum OutputKind {
    Diagnostic,
    Dump,
    Profile,
    VerticalSpectrum,
    HorizontalSpectrum,
}

impl OutputKind {
    pub const ALL: [OutputKind; 5] = [
        Self::Diagnostic,
        Self::Dump,
        Self::Profile,
        Self::VerticalSpectrum,
        Self::HorizontalSpectrum,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Diagnostic => "diagnostic",
            Self::Dump => "dump",
            Self::Profile => "zprof",
            Self::VerticalSpectrum => "zspec",
            Self::HorizontalSpectrum => "xyspec",
        }
    }

    /// File-name prefix the solver uses for this kind.
    pub const fn file_prefix(self) -> &'static str {
        match self {
            Self::Diagnostic => "OUT",
            Self::Dump => "DUMP",
            Self::Profile => "ZPROF",
            Self::VerticalSpectrum => "Z_SPEC",
            Self::HorizontalSpectrum => "XY_SPEC",
        }
    }
}

impl Display for OutputKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}
