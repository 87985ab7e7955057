//! Per-mode tuning records for crowd placement.

use thiserror::Error;

use crate::VenueMode;

/// Placement parameters that differ between venue modes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ModeProfile {
    /// Share of the pool placed on the dance floor; `0.5` packs half the crowd by the stage.
    pub dance_floor_fraction: f32,
    /// Outer radius of the dance-floor sampling disc in metres.
    pub dance_floor_radius: f32,
    /// Exponent applied to the uniform radius draw; above 1 concentrates figures
    /// at the centre, below 1 pushes them towards the rim.
    pub radius_power: f32,
    /// Gap kept between dance-floor figures and the central stage circle, if
    /// the mode has a central stage at all.
    pub stage_buffer: Option<f32>,
    /// Radius around the room centre left to the dance-floor pool.
    pub exclusion_annulus_radius: f32,
    /// Gap kept between general figures and the central stage circle, if any.
    pub general_stage_buffer: Option<f32>,
}

impl ModeProfile {
    /// Stage against the LED wall, sparse and wide dance floor.
    #[must_use]
    pub const fn standard() -> Self {
        Self {
            dance_floor_fraction: 0.15,
            dance_floor_radius: 7.0,
            radius_power: 0.5,
            stage_buffer: None,
            exclusion_annulus_radius: 7.5,
            general_stage_buffer: None,
        }
    }

    /// Central platform with a tightly packed dance floor.
    #[must_use]
    pub const fn intimate() -> Self {
        Self {
            dance_floor_fraction: 0.50,
            dance_floor_radius: 5.0,
            radius_power: 1.2,
            stage_buffer: Some(0.2),
            exclusion_annulus_radius: 5.5,
            general_stage_buffer: Some(0.8),
        }
    }

    /// Checks that every parameter is usable by the placement system.
    pub fn validate(&self, mode: VenueMode) -> Result<(), ProfileError> {
        let fraction = self.dance_floor_fraction;
        if !(0.0..=1.0).contains(&fraction) {
            return Err(ProfileError::DanceFloorFraction {
                mode,
                value: fraction,
            });
        }

        if !self.radius_power.is_finite() || self.radius_power <= 0.0 {
            return Err(ProfileError::RadiusPower {
                mode,
                value: self.radius_power,
            });
        }

        let distances = [
            ("dance_floor_radius", Some(self.dance_floor_radius)),
            ("exclusion_annulus_radius", Some(self.exclusion_annulus_radius)),
            ("stage_buffer", self.stage_buffer),
            ("general_stage_buffer", self.general_stage_buffer),
        ];
        for (field, value) in distances {
            let Some(value) = value else {
                continue;
            };
            if !value.is_finite() || value < 0.0 {
                return Err(ProfileError::InvalidDistance { mode, field, value });
            }
        }

        Ok(())
    }
}

/// Profiles for every venue mode.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ModeProfiles {
    /// Profile used in [`VenueMode::Standard`].
    pub standard: ModeProfile,
    /// Profile used in [`VenueMode::Intimate`].
    pub intimate: ModeProfile,
}

impl ModeProfiles {
    /// Profile applied for the provided mode.
    #[must_use]
    pub const fn get(&self, mode: VenueMode) -> &ModeProfile {
        match mode {
            VenueMode::Standard => &self.standard,
            VenueMode::Intimate => &self.intimate,
        }
    }

    /// Validates both profiles.
    pub fn validate(&self) -> Result<(), ProfileError> {
        self.standard.validate(VenueMode::Standard)?;
        self.intimate.validate(VenueMode::Intimate)
    }
}

impl Default for ModeProfiles {
    fn default() -> Self {
        Self {
            standard: ModeProfile::standard(),
            intimate: ModeProfile::intimate(),
        }
    }
}

/// Reasons a mode profile is rejected.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum ProfileError {
    /// The dance-floor share lies outside `0.0..=1.0`.
    #[error("{mode:?} dance floor fraction {value} is outside 0..=1")]
    DanceFloorFraction {
        /// Mode whose profile failed validation.
        mode: VenueMode,
        /// Offending value.
        value: f32,
    },
    /// The radius exponent is not a positive finite number.
    #[error("{mode:?} radius power must be positive and finite, got {value}")]
    RadiusPower {
        /// Mode whose profile failed validation.
        mode: VenueMode,
        /// Offending value.
        value: f32,
    },
    /// A radius or buffer is negative or not finite.
    #[error("{mode:?} {field} must be non-negative and finite, got {value}")]
    InvalidDistance {
        /// Mode whose profile failed validation.
        mode: VenueMode,
        /// Name of the offending field.
        field: &'static str,
        /// Offending value.
        value: f32,
    },
}
