#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Rejection-sampling placement system that fills the venue with figures.
//!
//! A pool is split into a dance-floor sub-pool, sampled in polar coordinates
//! around the room centre, and a general sub-pool sampled uniformly across the
//! room. Each sub-pool draws at most ten candidates per requested figure, so a
//! venue whose exclusion zones swallow the floor yields a short pool instead
//! of looping forever.

use std::{f32::consts::TAU, sync::Arc};

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use venue_crowd_core::{
    share_of, Appearance, Command, CrowdPool, CrowdZone, Event, HairStyle, ModeProfile,
    ModeProfiles, PlacedFigure, PlacementInputs, VenueLayout, ZoneStats, HAIR_COLORS, MAX_CROWD,
    PANTS_COLORS, SHIRT_COLORS, SKIN_TONES,
};

/// Candidates drawn per requested figure before a sub-pool gives up.
pub const ATTEMPTS_PER_FIGURE: usize = 10;

const MIN_HEIGHT_SCALE: f32 = 1.0;
const HEIGHT_SCALE_SPREAD: f32 = 0.15;
const PHASE_OFFSET_SPAN: f32 = 100.0;

/// Source of randomness used for each regeneration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlacementSeed {
    /// Seeds every regeneration identically, so equal inputs give equal pools.
    Fixed(u64),
    /// Seeds every regeneration from operating system entropy.
    Entropy,
}

/// Configuration parameters required to construct the placement system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    capacity: usize,
    seed: PlacementSeed,
    profiles: ModeProfiles,
}

impl Config {
    /// Creates a configuration producing pools with `capacity` slots.
    #[must_use]
    pub fn new(capacity: usize, seed: PlacementSeed) -> Self {
        Self {
            capacity,
            seed,
            profiles: ModeProfiles::default(),
        }
    }

    /// Overrides the per-mode placement profiles.
    #[must_use]
    pub fn with_profiles(mut self, profiles: ModeProfiles) -> Self {
        self.profiles = profiles;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(MAX_CROWD, PlacementSeed::Entropy)
    }
}

/// Parameters of a single generation pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlacementRequest {
    /// Number of slots in the generated pool.
    pub capacity: usize,
    /// Count-independent inputs the pool is generated for.
    pub inputs: PlacementInputs,
}

/// Pure system that regenerates the crowd pool whenever its inputs change.
#[derive(Debug)]
pub struct Placement {
    config: Config,
}

impl Placement {
    /// Creates a new placement system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Profiles used when sampling candidates.
    #[must_use]
    pub fn profiles(&self) -> &ModeProfiles {
        &self.config.profiles
    }

    /// Consumes world events and emits a pool for the latest placement inputs.
    ///
    /// Several input changes within one batch collapse into a single
    /// regeneration for the last reported inputs.
    pub fn handle(&mut self, events: &[Event], layout: &VenueLayout, out: &mut Vec<Command>) {
        let latest = events.iter().rev().find_map(|event| match event {
            Event::PlacementInputsChanged { inputs } => Some(*inputs),
            _ => None,
        });

        let Some(inputs) = latest else {
            return;
        };

        let pool = self.generate(inputs, layout);
        out.push(Command::PublishPool {
            inputs,
            pool: Arc::new(pool),
        });
    }

    /// Generates a pool for the provided inputs using the configured seed policy.
    #[must_use]
    pub fn generate(&self, inputs: PlacementInputs, layout: &VenueLayout) -> CrowdPool {
        let mut rng = match self.config.seed {
            PlacementSeed::Fixed(seed) => ChaCha8Rng::seed_from_u64(seed),
            PlacementSeed::Entropy => ChaCha8Rng::from_entropy(),
        };
        let request = PlacementRequest {
            capacity: self.config.capacity,
            inputs,
        };
        generate_pool(&request, layout, &self.config.profiles, &mut rng)
    }
}

/// Fills a pool for the request by rejection sampling both sub-pools.
///
/// Never fails: a sub-pool whose attempt budget runs out is returned short and
/// its [`ZoneStats`] record the shortfall.
pub fn generate_pool<R>(
    request: &PlacementRequest,
    layout: &VenueLayout,
    profiles: &ModeProfiles,
    rng: &mut R,
) -> CrowdPool
where
    R: Rng + ?Sized,
{
    let inputs = &request.inputs;
    let profile = profiles.get(inputs.mode);
    let dance_floor_target = share_of(profile.dance_floor_fraction, request.capacity);
    let general_target = request.capacity - dance_floor_target;

    let (dance_floor, dance_floor_stats) = fill_zone(
        CrowdZone::DanceFloor,
        dance_floor_target,
        rng,
        |rng| sample_dance_floor(profile, rng),
        |point| dance_floor_accepts(point, inputs, profile, layout),
    );

    let area = layout.sampling_area();
    let (general, general_stats) = fill_zone(
        CrowdZone::General,
        general_target,
        rng,
        |rng| {
            Vec2::new(
                rng.gen_range(area.min().x..area.max().x),
                rng.gen_range(area.min().y..area.max().y),
            )
        },
        |point| general_accepts(point, inputs, profile, layout),
    );

    tracing::debug!(
        mode = ?inputs.mode,
        dance_floor_target,
        dance_floor_placed = dance_floor_stats.placed,
        dance_floor_attempts = dance_floor_stats.attempts,
        general_target,
        general_placed = general_stats.placed,
        general_attempts = general_stats.attempts,
        "generated crowd pool"
    );
    if dance_floor_stats.is_short() || general_stats.is_short() {
        tracing::debug!(
            dance_floor_fill = dance_floor_stats.fill_ratio(),
            general_fill = general_stats.fill_ratio(),
            "attempt budget exhausted before the pool filled"
        );
    }

    CrowdPool::new(
        request.capacity,
        interleave(dance_floor, general),
        dance_floor_stats,
        general_stats,
    )
}

/// Reports whether a dance-floor candidate clears every dance-floor exclusion zone.
#[must_use]
pub fn dance_floor_accepts(
    point: Vec2,
    inputs: &PlacementInputs,
    profile: &ModeProfile,
    layout: &VenueLayout,
) -> bool {
    if let Some(buffer) = profile.stage_buffer {
        if point.length() < inputs.stage_radius + buffer {
            return false;
        }
    }
    if layout.permanent_stage().contains(point) {
        return false;
    }
    point.y >= layout.dance_floor_rear_limit()
}

/// Reports whether a general candidate clears every general exclusion zone.
#[must_use]
pub fn general_accepts(
    point: Vec2,
    inputs: &PlacementInputs,
    profile: &ModeProfile,
    layout: &VenueLayout,
) -> bool {
    let distance = point.length();
    if distance < profile.exclusion_annulus_radius {
        return false;
    }
    if let Some(buffer) = profile.general_stage_buffer {
        if distance < inputs.stage_radius + buffer {
            return false;
        }
    }
    if layout.buffered_stage().contains(point) || point.y < layout.general_rear_limit() {
        return false;
    }
    if !layout.room_bounds().contains_inclusive(point) || layout.in_furniture(point) {
        return false;
    }
    !layout.in_closed_section(point, inputs.closed_sections)
}

fn fill_zone<R, S, A>(
    zone: CrowdZone,
    target: usize,
    rng: &mut R,
    mut sample: S,
    accepts: A,
) -> (Vec<PlacedFigure>, ZoneStats)
where
    R: Rng + ?Sized,
    S: FnMut(&mut R) -> Vec2,
    A: Fn(Vec2) -> bool,
{
    let budget = target.saturating_mul(ATTEMPTS_PER_FIGURE);
    let mut figures = Vec::with_capacity(target);
    let mut attempts = 0;

    while figures.len() < target && attempts < budget {
        attempts += 1;
        let point = sample(&mut *rng);
        if accepts(point) {
            figures.push(sample_figure(point, zone, &mut *rng));
        }
    }

    let stats = ZoneStats {
        target,
        placed: figures.len(),
        attempts,
    };
    (figures, stats)
}

fn sample_dance_floor<R>(profile: &ModeProfile, rng: &mut R) -> Vec2
where
    R: Rng + ?Sized,
{
    let angle = rng.gen_range(0.0..TAU);
    let radius = rng.gen::<f32>().powf(profile.radius_power) * profile.dance_floor_radius;
    Vec2::new(angle.cos(), angle.sin()) * radius
}

fn sample_figure<R>(position: Vec2, zone: CrowdZone, rng: &mut R) -> PlacedFigure
where
    R: Rng + ?Sized,
{
    PlacedFigure {
        position,
        height_scale: MIN_HEIGHT_SCALE + rng.gen::<f32>() * HEIGHT_SCALE_SPREAD,
        phase_offset: rng.gen::<f32>() * PHASE_OFFSET_SPAN,
        appearance: Appearance {
            skin: SKIN_TONES[rng.gen_range(0..SKIN_TONES.len())],
            shirt: SHIRT_COLORS[rng.gen_range(0..SHIRT_COLORS.len())],
            pants: PANTS_COLORS[rng.gen_range(0..PANTS_COLORS.len())],
            hair: HAIR_COLORS[rng.gen_range(0..HAIR_COLORS.len())],
            hair_style: HairStyle::ALL[rng.gen_range(0..HairStyle::ALL.len())],
        },
        zone,
    }
}

/// Merges the sub-pools so every prefix carries the dance-floor share.
fn interleave(dance_floor: Vec<PlacedFigure>, general: Vec<PlacedFigure>) -> Vec<PlacedFigure> {
    let total = dance_floor.len() + general.len();
    let dance_floor_len = dance_floor.len();
    let mut dance_floor = dance_floor.into_iter();
    let mut general = general.into_iter();
    let mut merged = Vec::with_capacity(total);
    let mut dance_floor_taken = 0;

    for slot in 0..total {
        let dance_floor_due = dance_floor_taken * total < (slot + 1) * dance_floor_len;
        let next = if dance_floor_due {
            dance_floor.next().or_else(|| general.next())
        } else {
            general.next().or_else(|| dance_floor.next())
        };
        let Some(figure) = next else {
            break;
        };
        if figure.zone == CrowdZone::DanceFloor {
            dance_floor_taken += 1;
        }
        merged.push(figure);
    }

    merged
}
