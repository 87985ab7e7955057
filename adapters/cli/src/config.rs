//! TOML configuration consumed by the command-line host.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use thiserror::Error;
use venue_crowd_core::{ModeProfile, ModeProfiles, ProfileError, Section, VenueMode, MAX_CROWD};

/// Contents of a configuration file; every field is optional.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct FileConfig {
    /// Placement seed; omitted means entropy seeding.
    pub(crate) seed: Option<u64>,
    /// Venue state applied before the first pool is generated.
    #[serde(default)]
    pub(crate) crowd: CrowdConfig,
    /// Overrides applied to the standard mode profile.
    #[serde(default)]
    pub(crate) standard: ProfileOverride,
    /// Overrides applied to the intimate mode profile.
    #[serde(default)]
    pub(crate) intimate: ProfileOverride,
}

/// Venue state section of the configuration file.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct CrowdConfig {
    pub(crate) capacity: Option<usize>,
    pub(crate) mode: Option<VenueMode>,
    pub(crate) closed: Option<Vec<Section>>,
    pub(crate) occupancy: Option<f32>,
    pub(crate) vibe: Option<f32>,
    pub(crate) stage_radius: Option<f32>,
}

/// Partial mode profile; missing fields keep the built-in value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ProfileOverride {
    pub(crate) dance_floor_fraction: Option<f32>,
    pub(crate) dance_floor_radius: Option<f32>,
    pub(crate) radius_power: Option<f32>,
    pub(crate) stage_buffer: Option<f32>,
    pub(crate) exclusion_annulus_radius: Option<f32>,
    pub(crate) general_stage_buffer: Option<f32>,
}

impl ProfileOverride {
    fn apply(&self, base: ModeProfile) -> ModeProfile {
        ModeProfile {
            dance_floor_fraction: self.dance_floor_fraction.unwrap_or(base.dance_floor_fraction),
            dance_floor_radius: self.dance_floor_radius.unwrap_or(base.dance_floor_radius),
            radius_power: self.radius_power.unwrap_or(base.radius_power),
            stage_buffer: self.stage_buffer.or(base.stage_buffer),
            exclusion_annulus_radius: self
                .exclusion_annulus_radius
                .unwrap_or(base.exclusion_annulus_radius),
            general_stage_buffer: self.general_stage_buffer.or(base.general_stage_buffer),
        }
    }
}

impl FileConfig {
    /// Reads and validates the configuration stored at `path`.
    pub(crate) fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents)
    }

    /// Parses and validates configuration file contents.
    pub(crate) fn parse(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        if let Some(capacity) = config.crowd.capacity {
            if capacity > MAX_CROWD {
                return Err(ConfigError::Capacity { capacity });
            }
        }
        let _ = config.profiles()?;
        Ok(config)
    }

    /// Built-in profiles with the file overrides applied.
    pub(crate) fn profiles(&self) -> Result<ModeProfiles, ConfigError> {
        let defaults = ModeProfiles::default();
        let profiles = ModeProfiles {
            standard: self.standard.apply(defaults.standard),
            intimate: self.intimate.apply(defaults.intimate),
        };
        profiles.validate()?;
        Ok(profiles)
    }
}

/// Reasons a configuration file is rejected.
#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    /// The file could not be read.
    #[error("failed to read configuration at {}", path.display())]
    Read {
        /// Location of the file.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The file is not valid TOML or has unexpected fields.
    #[error("failed to parse configuration toml")]
    Parse(#[from] toml::de::Error),
    /// A profile override produced an unusable profile.
    #[error("invalid mode profile")]
    Profile(#[from] ProfileError),
    /// The requested capacity exceeds the crowd ceiling.
    #[error("capacity {capacity} exceeds the maximum of {MAX_CROWD}")]
    Capacity {
        /// Requested capacity.
        capacity: usize,
    },
}
