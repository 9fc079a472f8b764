use crate::schema::FieldKind;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Run parameters with a fixed meaning, named in the configuration vocabulary.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Parameter {
    ThermalBuoyancy,
    CompositionalBuoyancy,
    ViscousDiffusion,
    ThermalDiffusion,
    CompositionalDiffusion,
    ThermalStratification,
    CompositionalStratification,
    XExtent,
    YExtent,
    ZExtent,
    CflSafetyFactor,
    MaximumTimeStep,
    InitialTimeStep,
    MaxXModes,
    MaxYModes,
    MaxZModes,
    Nx,
    Ny,
    Nz,
    TasksFirstTranspose,
    TasksSecondTranspose,
    Step,
    TimeStep,
    Time,
}

impl Parameter {
    pub const ALL: [Parameter; 24] = [
        Self::ThermalBuoyancy,
        Self::CompositionalBuoyancy,
        Self::ViscousDiffusion,
        Self::ThermalDiffusion,
        Self::CompositionalDiffusion,
        Self::ThermalStratification,
        Self::CompositionalStratification,
        Self::XExtent,
        Self::YExtent,
        Self::ZExtent,
        Self::CflSafetyFactor,
        Self::MaximumTimeStep,
        Self::InitialTimeStep,
        Self::MaxXModes,
        Self::MaxYModes,
        Self::MaxZModes,
        Self::Nx,
        Self::Ny,
        Self::Nz,
        Self::TasksFirstTranspose,
        Self::TasksSecondTranspose,
        Self::Step,
        Self::TimeStep,
        Self::Time,
    ];

    pub const fn canonical_name(self) -> &'static str {
        match self {
            Self::ThermalBuoyancy => "thermal_buoyancy_param",
            Self::CompositionalBuoyancy => "compositional_buoyancy_param",
            Self::ViscousDiffusion => "viscous_diffusion_coeff",
            Self::ThermalDiffusion => "thermal_diffusion_coeff",
            Self::CompositionalDiffusion => "compositional_diffusion_coeff",
            Self::ThermalStratification => "thermal_stratif_param",
            Self::CompositionalStratification => "compositional_stratif_param",
            Self::XExtent => "x_extent_of_the_box",
            Self::YExtent => "y_extent_of_the_box",
            Self::ZExtent => "z_extent_of_the_box",
            Self::CflSafetyFactor => "cfl_safety_factor",
            Self::MaximumTimeStep => "maximum_time_step_length",
            Self::InitialTimeStep => "initial_time_step_length",
            Self::MaxXModes => "max_degree_of_x_fourier_modes",
            Self::MaxYModes => "max_degree_of_y_fourier_modes",
            Self::MaxZModes => "max_degree_of_z_fourier_modes",
            Self::Nx => "nx",
            Self::Ny => "ny",
            Self::Nz => "nz",
            Self::TasksFirstTranspose => "number_of_tasks_1st_transpose",
            Self::TasksSecondTranspose => "number_of_tasks_2nd_transpose",
            Self::Step => "istep",
            Self::TimeStep => "dt",
            Self::Time => "time",
        }
    }

    /// Name used inside snapshot files, when it differs from the canonical one.
    pub const fn storage_name(self) -> Option<&'static str> {
        match self {
            Self::XExtent => Some("Gammax"),
            Self::YExtent => Some("Gammay"),
            Self::ZExtent => Some("Gammaz"),
            Self::ThermalBuoyancy => Some("B_therm"),
            Self::CompositionalBuoyancy => Some("B_comp"),
            Self::ViscousDiffusion => Some("D_visc"),
            Self::ThermalDiffusion => Some("D_therm"),
            Self::CompositionalDiffusion => Some("D_comp"),
            Self::ThermalStratification => Some("S_therm"),
            Self::CompositionalStratification => Some("S_comp"),
            _ => None,
        }
    }

    /// The name this parameter is written under in a snapshot.
    pub fn stored_name(self) -> &'static str {
        self.storage_name().unwrap_or(self.canonical_name())
    }

    pub const fn kind(self) -> FieldKind {
        match self {
            Self::MaxXModes
            | Self::MaxYModes
            | Self::MaxZModes
            | Self::Nx
            | Self::Ny
            | Self::Nz
            | Self::TasksFirstTranspose
            | Self::TasksSecondTranspose
            | Self::Step => FieldKind::Integer,
            _ => FieldKind::Float,
        }
    }

    pub fn from_canonical(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|parameter| parameter.canonical_name() == name)
    }

    pub fn from_storage(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|parameter| parameter.storage_name() == Some(name))
    }

    /// Resolve a name given in either vocabulary.
    pub fn resolve(name: &str) -> Option<Self> {
        Self::from_canonical(name).or_else(|| Self::from_storage(name))
    }
}

impl Display for Parameter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).canonical_name())
    }
}

#[cfg(test)]
mod tests {
    use super::Parameter;
    use crate::schema::FieldKind;

    #[test]
    fn translation_is_bidirectional() {
        for parameter in Parameter::ALL {
            assert_eq!(
                Parameter::from_canonical(parameter.canonical_name()),
                Some(parameter)
            );
            if let Some(storage) = parameter.storage_name() {
                assert_eq!(Parameter::from_storage(storage), Some(parameter));
                assert_eq!(Parameter::resolve(storage), Some(parameter));
            }
        }
        assert_eq!(
            Parameter::ALL
                .iter()
                .filter(|parameter| parameter.storage_name().is_some())
                .count(),
            10
        );
    }

    #[test]
    fn mode_counts_are_integers() {
        assert_eq!(Parameter::MaxZModes.kind(), FieldKind::Integer);
        assert_eq!(Parameter::Step.kind(), FieldKind::Integer);
        assert_eq!(Parameter::XExtent.kind(), FieldKind::Float);
        assert_eq!(Parameter::XExtent.stored_name(), "Gammax");
        assert_eq!(Parameter::Nx.stored_name(), "nx");
        assert_eq!(Parameter::resolve("unknown_thing"), None);
    }
}
