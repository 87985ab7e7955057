#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the venue crowd engine.
//!
//! This crate defines the message surface that connects hosts, the
//! authoritative world, and pure systems. Hosts submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to. The placement system answers input changes with a freshly
//! generated [`CrowdPool`]; the animation system reads the published pool every
//! frame and produces a batch of [`SegmentTransform`] values.

use std::{sync::Arc, time::Duration};

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

mod layout;
mod profile;

pub use layout::{Rect, SectionFootprint, VenueLayout};
pub use profile::{ModeProfile, ModeProfiles, ProfileError};

/// Hard ceiling on the number of figure slots in a crowd pool.
pub const MAX_CROWD: usize = 500;

/// Stage exclusion radius used when the host does not provide one.
pub const DEFAULT_STAGE_RADIUS: f32 = 3.5;

/// Vibe intensity above which the crowd switches to the high-energy regime.
pub const HIGH_ENERGY_THRESHOLD: f32 = 1.2;

/// Venue configuration that decides stage placement and crowd distribution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VenueMode {
    /// Stage against the rear wall with a sparse dance floor.
    Standard,
    /// Small central platform with a densely packed dance floor.
    Intimate,
}

impl VenueMode {
    /// Ground-plane centre of the DJ stage for the mode.
    ///
    /// Intimate mode places the platform in the middle of the room while the
    /// standard stage sits in front of the LED wall.
    #[must_use]
    pub const fn stage_center(self) -> Vec2 {
        match self {
            Self::Standard => Vec2::new(0.0, -9.0),
            Self::Intimate => Vec2::new(0.0, 0.0),
        }
    }
}

/// Closable seating section of the venue floor plan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Section {
    /// Rear tier platform opposite the stage.
    A,
    /// Central booth rows in front of section A.
    B,
    /// L-shaped booths along the right wall.
    D,
    /// L-shaped booths by the bar.
    E,
}

impl Section {
    /// Every closable section in label order.
    pub const ALL: [Section; 4] = [Section::A, Section::B, Section::D, Section::E];

    /// Parses a section from its single-letter label, ignoring case.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "A" | "a" => Some(Self::A),
            "B" | "b" => Some(Self::B),
            "D" | "d" => Some(Self::D),
            "E" | "e" => Some(Self::E),
            _ => None,
        }
    }

    /// Single-letter label of the section.
    #[must_use]
    pub const fn label(self) -> char {
        match self {
            Self::A => 'A',
            Self::B => 'B',
            Self::D => 'D',
            Self::E => 'E',
        }
    }

    const fn bit(self) -> u8 {
        match self {
            Self::A => 1,
            Self::B => 1 << 1,
            Self::D => 1 << 2,
            Self::E => 1 << 3,
        }
    }
}

/// Set of sections currently closed to guests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ClosedSections(u8);

impl ClosedSections {
    /// Set with every section open.
    pub const NONE: ClosedSections = ClosedSections(0);

    /// Set with every section closed.
    pub const ALL: ClosedSections = ClosedSections(0b1111);

    /// Builds a set from the provided sections.
    #[must_use]
    pub fn from_sections<I>(sections: I) -> Self
    where
        I: IntoIterator<Item = Section>,
    {
        sections
            .into_iter()
            .fold(Self::NONE, |set, section| set.with(section))
    }

    /// Returns a copy of the set with the section closed.
    #[must_use]
    pub const fn with(self, section: Section) -> Self {
        Self(self.0 | section.bit())
    }

    /// Returns a copy of the set with the section reopened.
    #[must_use]
    pub const fn without(self, section: Section) -> Self {
        Self(self.0 & !section.bit())
    }

    /// Reports whether the section is closed.
    #[must_use]
    pub const fn contains(self, section: Section) -> bool {
        self.0 & section.bit() != 0
    }

    /// Reports whether every section is open.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterates over the closed sections in label order.
    pub fn iter(self) -> impl Iterator<Item = Section> {
        Section::ALL
            .into_iter()
            .filter(move |section| self.contains(*section))
    }
}

/// Count-independent inputs that decide the layout of a crowd pool.
///
/// Any change to these inputs invalidates the published pool. Occupancy is
/// not part of them; it only decides how many pooled figures are visible.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlacementInputs {
    /// Active venue configuration.
    pub mode: VenueMode,
    /// Sections removed from general placement.
    pub closed_sections: ClosedSections,
    /// Radius of the central stage exclusion circle in metres.
    pub stage_radius: f32,
}

impl Default for PlacementInputs {
    fn default() -> Self {
        Self {
            mode: VenueMode::Intimate,
            closed_sections: ClosedSections::NONE,
            stage_radius: DEFAULT_STAGE_RADIUS,
        }
    }
}

/// Opaque sRGB colour sampled from a fixed appearance palette.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Swatch {
    red: u8,
    green: u8,
    blue: u8,
}

impl Swatch {
    /// Creates a new swatch from byte RGB components.
    #[must_use]
    pub const fn from_rgb(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Red component of the swatch.
    #[must_use]
    pub const fn red(&self) -> u8 {
        self.red
    }

    /// Green component of the swatch.
    #[must_use]
    pub const fn green(&self) -> u8 {
        self.green
    }

    /// Blue component of the swatch.
    #[must_use]
    pub const fn blue(&self) -> u8 {
        self.blue
    }
}

/// Skin tones available to crowd figures.
pub const SKIN_TONES: [Swatch; 6] = [
    Swatch::from_rgb(0xff, 0xdb, 0xac),
    Swatch::from_rgb(0xf1, 0xc2, 0x7d),
    Swatch::from_rgb(0xe0, 0xac, 0x69),
    Swatch::from_rgb(0x8d, 0x55, 0x24),
    Swatch::from_rgb(0xc6, 0x86, 0x42),
    Swatch::from_rgb(0x57, 0x37, 0x19),
];

/// Shirt colours available to crowd figures.
pub const SHIRT_COLORS: [Swatch; 10] = [
    Swatch::from_rgb(0xee, 0xee, 0xee),
    Swatch::from_rgb(0x11, 0x11, 0x11),
    Swatch::from_rgb(0xcc, 0x33, 0x33),
    Swatch::from_rgb(0x33, 0xcc, 0x33),
    Swatch::from_rgb(0x33, 0x33, 0xcc),
    Swatch::from_rgb(0xff, 0xff, 0x33),
    Swatch::from_rgb(0x00, 0xff, 0xff),
    Swatch::from_rgb(0xff, 0x00, 0xff),
    Swatch::from_rgb(0xff, 0x66, 0x00),
    Swatch::from_rgb(0x99, 0x33, 0xff),
];

/// Trouser colours available to crowd figures.
pub const PANTS_COLORS: [Swatch; 5] = [
    Swatch::from_rgb(0x11, 0x11, 0x11),
    Swatch::from_rgb(0x2f, 0x3e, 0x46),
    Swatch::from_rgb(0x1a, 0x2a, 0x40),
    Swatch::from_rgb(0x3e, 0x27, 0x23),
    Swatch::from_rgb(0x5d, 0x40, 0x37),
];

/// Hair colours available to crowd figures.
pub const HAIR_COLORS: [Swatch; 7] = [
    Swatch::from_rgb(0x1a, 0x1a, 0x1a),
    Swatch::from_rgb(0x2c, 0x18, 0x10),
    Swatch::from_rgb(0x5c, 0x3a, 0x21),
    Swatch::from_rgb(0x8b, 0x5a, 0x3c),
    Swatch::from_rgb(0xd4, 0xa5, 0x74),
    Swatch::from_rgb(0xb5, 0x52, 0x39),
    Swatch::from_rgb(0x80, 0x80, 0x80),
];

/// Discrete hair shape applied to the hair segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HairStyle {
    /// Flattened cap sitting low on the head.
    Short,
    /// Wider, rounder volume.
    MediumCurly,
    /// Taller vertical extent.
    Long,
    /// Effectively invisible.
    Bald,
}

impl HairStyle {
    /// Every hair style in palette order.
    pub const ALL: [HairStyle; 4] = [
        HairStyle::Short,
        HairStyle::MediumCurly,
        HairStyle::Long,
        HairStyle::Bald,
    ];
}

/// Independently sampled categorical appearance of a figure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Appearance {
    /// Skin tone shared by head, neck and arms.
    pub skin: Swatch,
    /// Torso colour.
    pub shirt: Swatch,
    /// Leg colour.
    pub pants: Swatch,
    /// Hair colour.
    pub hair: Swatch,
    /// Hair shape.
    pub hair_style: HairStyle,
}

/// Sub-pool that accepted a figure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CrowdZone {
    /// Figures packed around the stage using concentrated polar sampling.
    DanceFloor,
    /// Figures spread through the rest of the room.
    General,
}

/// Immutable descriptor of a single simulated guest.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlacedFigure {
    /// Ground-plane position expressed as `(x, z)`.
    pub position: Vec2,
    /// Multiplier applied to leg length.
    pub height_scale: f32,
    /// Time-domain phase shift that desynchronises animation.
    pub phase_offset: f32,
    /// Colours and hair shape.
    pub appearance: Appearance,
    /// Sub-pool the figure belongs to.
    pub zone: CrowdZone,
}

/// Outcome of filling one sub-pool through rejection sampling.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ZoneStats {
    /// Number of figures the sub-pool aimed for.
    pub target: usize,
    /// Number of figures actually accepted.
    pub placed: usize,
    /// Number of candidates drawn, accepted or not.
    pub attempts: usize,
}

impl ZoneStats {
    /// Fraction of the target that was placed; `1.0` for an empty target.
    #[must_use]
    pub fn fill_ratio(&self) -> f32 {
        if self.target == 0 {
            return 1.0;
        }
        self.placed as f32 / self.target as f32
    }

    /// Reports whether the attempt budget ran out before the target was met.
    #[must_use]
    pub const fn is_short(&self) -> bool {
        self.placed < self.target
    }
}

/// Stable, immutable set of figures published by the placement system.
///
/// Slot `i` maps to the same figure for the lifetime of the pool, so raising
/// or lowering occupancy only changes which prefix of the pool is visible.
#[derive(Clone, Debug, PartialEq)]
pub struct CrowdPool {
    capacity: usize,
    figures: Vec<PlacedFigure>,
    dance_floor: ZoneStats,
    general: ZoneStats,
}

impl CrowdPool {
    /// Creates a pool from generated figures, dropping any beyond `capacity`.
    #[must_use]
    pub fn new(
        capacity: usize,
        mut figures: Vec<PlacedFigure>,
        dance_floor: ZoneStats,
        general: ZoneStats,
    ) -> Self {
        figures.truncate(capacity);
        Self {
            capacity,
            figures,
            dance_floor,
            general,
        }
    }

    /// Creates a pool with `capacity` slots and no figures.
    #[must_use]
    pub fn empty(capacity: usize) -> Self {
        Self::new(
            capacity,
            Vec::new(),
            ZoneStats::default(),
            ZoneStats::default(),
        )
    }

    /// Number of slots the pool exposes to renderers.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of figures actually generated.
    #[must_use]
    pub fn len(&self) -> usize {
        self.figures.len()
    }

    /// Reports whether the pool holds no figures.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.figures.is_empty()
    }

    /// Figures in slot order.
    #[must_use]
    pub fn figures(&self) -> &[PlacedFigure] {
        &self.figures
    }

    /// Figure occupying the slot, if one was generated.
    #[must_use]
    pub fn get(&self, slot: usize) -> Option<&PlacedFigure> {
        self.figures.get(slot)
    }

    /// Placement outcome of the dance-floor sub-pool.
    #[must_use]
    pub const fn dance_floor_stats(&self) -> ZoneStats {
        self.dance_floor
    }

    /// Placement outcome of the general sub-pool.
    #[must_use]
    pub const fn general_stats(&self) -> ZoneStats {
        self.general
    }

    /// Figures of the pool that are visible at the provided visible count.
    #[must_use]
    pub fn visible(&self, visible_count: usize) -> &[PlacedFigure] {
        let end = visible_count.min(self.figures.len());
        &self.figures[..end]
    }
}

/// Converts an occupancy fraction into the number of visible pool slots.
///
/// Rounding follows [`share_of`].
#[must_use]
pub fn visible_count(occupancy: f32, capacity: usize) -> usize {
    share_of(occupancy, capacity)
}

/// Floors `fraction * capacity` after clamping the fraction to `0.0..=1.0`.
///
/// Non-finite fractions count as zero. The product is floored after a small
/// tolerance so headcount-derived fractions such as `350.0 / 500.0` do not
/// lose a slot to float rounding.
#[must_use]
pub fn share_of(fraction: f32, capacity: usize) -> usize {
    if !fraction.is_finite() {
        return 0;
    }
    let fraction = f64::from(fraction.clamp(0.0, 1.0));
    let scaled = (fraction * capacity as f64 + 1e-4).floor();
    (scaled as usize).min(capacity)
}

/// Rigid body part animated for every figure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Segment {
    /// Left leg capsule.
    LeftLeg,
    /// Right leg capsule.
    RightLeg,
    /// Torso capsule.
    Torso,
    /// Neck cylinder.
    Neck,
    /// Head sphere.
    Head,
    /// Hair volume on top of the head.
    Hair,
    /// Left arm capsule.
    LeftArm,
    /// Right arm capsule.
    RightArm,
}

impl Segment {
    /// Number of segments per figure.
    pub const COUNT: usize = 8;

    /// Every segment in batch order.
    pub const ALL: [Segment; Segment::COUNT] = [
        Segment::LeftLeg,
        Segment::RightLeg,
        Segment::Torso,
        Segment::Neck,
        Segment::Head,
        Segment::Hair,
        Segment::LeftArm,
        Segment::RightArm,
    ];

    /// Zero-based position of the segment within [`Segment::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Rigid transform of a single segment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SegmentTransform {
    /// World-space centre of the segment.
    pub translation: Vec3,
    /// Euler angles in radians applied in XYZ order.
    pub rotation: Vec3,
    /// Per-axis scale factors.
    pub scale: Vec3,
}

impl SegmentTransform {
    /// Collapsed transform used for hidden slots.
    pub const HIDDEN: SegmentTransform = SegmentTransform {
        translation: Vec3::ZERO,
        rotation: Vec3::ZERO,
        scale: Vec3::ZERO,
    };

    /// Reports whether the transform collapses the segment to nothing.
    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.scale == Vec3::ZERO
    }
}

/// Number of general figures standing inside each section footprint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SectionHeadcounts {
    counts: [usize; 4],
}

impl SectionHeadcounts {
    /// Headcount recorded for the section.
    #[must_use]
    pub const fn get(&self, section: Section) -> usize {
        self.counts[Self::slot(section)]
    }

    /// Increments the headcount recorded for the section.
    pub fn record(&mut self, section: Section) {
        self.counts[Self::slot(section)] += 1;
    }

    const fn slot(section: Section) -> usize {
        match section {
            Section::A => 0,
            Section::B => 1,
            Section::D => 2,
            Section::E => 3,
        }
    }
}

/// Summary of how well a published pool satisfied its placement targets.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PlacementReport {
    /// Dance-floor sub-pool outcome.
    pub dance_floor: ZoneStats,
    /// General sub-pool outcome.
    pub general: ZoneStats,
    /// Number of visible slots holding a figure.
    pub visible: usize,
    /// Number of visible figures on the dance floor.
    pub visible_dance_floor: usize,
    /// Visible general figures standing inside each section footprint.
    pub section_headcounts: SectionHeadcounts,
}

impl PlacementReport {
    /// Combined fill ratio across both sub-pools.
    #[must_use]
    pub fn fill_ratio(&self) -> f32 {
        let target = self.dance_floor.target + self.general.target;
        if target == 0 {
            return 1.0;
        }
        (self.dance_floor.placed + self.general.placed) as f32 / target as f32
    }
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Switches the venue configuration.
    SetVenueMode {
        /// Mode the venue should adopt.
        mode: VenueMode,
    },
    /// Removes a section from general placement.
    CloseSection {
        /// Section to close.
        section: Section,
    },
    /// Returns a previously closed section to general placement.
    ReopenSection {
        /// Section to reopen.
        section: Section,
    },
    /// Updates the central stage exclusion radius.
    SetStageRadius {
        /// Radius in metres; non-finite or negative values are ignored.
        radius: f32,
    },
    /// Updates the fraction of the pool that is visible.
    SetOccupancy {
        /// Occupancy in `0.0..=1.0`.
        fraction: f32,
    },
    /// Updates the music energy driving the animation regime.
    SetVibeIntensity {
        /// Intensity, typically between `0.5` and `2.0`.
        intensity: f32,
    },
    /// Advances the shared animation clock.
    Tick {
        /// Wall-clock time elapsed since the previous tick.
        dt: Duration,
    },
    /// Asks for a pool matching the current inputs to be generated.
    RequestPoolRegeneration,
    /// Publishes a freshly generated pool.
    PublishPool {
        /// Inputs the pool was generated for.
        inputs: PlacementInputs,
        /// Generated pool, swapped in wholesale when accepted.
        pool: Arc<CrowdPool>,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Generation inputs changed and the pool must be regenerated.
    PlacementInputsChanged {
        /// Inputs the next pool must be generated for.
        inputs: PlacementInputs,
    },
    /// A new pool replaced the previous one.
    PoolPublished {
        /// Monotonic counter of accepted pools.
        generation: u64,
        /// Number of figures in the new pool.
        figures: usize,
    },
    /// A pool generated for outdated inputs was dropped.
    StalePoolDiscarded {
        /// Inputs the discarded pool was generated for.
        inputs: PlacementInputs,
    },
    /// The number of visible slots changed.
    OccupancyChanged {
        /// Number of visible slots after the change.
        visible: usize,
    },
    /// The vibe intensity changed.
    VibeIntensityChanged {
        /// Intensity after clamping.
        intensity: f32,
    },
    /// The shared clock advanced.
    TimeAdvanced {
        /// Duration of time that elapsed in the tick.
        dt: Duration,
    },
    /// A placement report was recomputed.
    PlacementReportUpdated {
        /// Latest report.
        report: PlacementReport,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_sections_track_membership() {
        let set = ClosedSections::NONE.with(Section::A).with(Section::E);
        assert!(set.contains(Section::A));
        assert!(!set.contains(Section::B));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![Section::A, Section::E]);
        assert!(set.without(Section::A).without(Section::E).is_empty());
        assert_eq!(ClosedSections::from_sections(Section::ALL), ClosedSections::ALL);
    }

    #[test]
    fn section_labels_parse_case_insensitively() {
        for section in Section::ALL {
            let label = section.label().to_string();
            assert_eq!(Section::from_label(&label), Some(section));
            assert_eq!(Section::from_label(&label.to_lowercase()), Some(section));
        }
        assert_eq!(Section::from_label("C"), None);
    }

    #[test]
    fn visible_count_is_monotonic_and_clamped() {
        let mut previous = 0;
        for step in 0..=1_000 {
            let fraction = step as f32 / 1_000.0;
            let visible = visible_count(fraction, MAX_CROWD);
            assert!(visible >= previous);
            previous = visible;
        }
        assert_eq!(visible_count(1.0, MAX_CROWD), MAX_CROWD);
        assert_eq!(visible_count(4.0, MAX_CROWD), MAX_CROWD);
        assert_eq!(visible_count(-1.0, MAX_CROWD), 0);
        assert_eq!(visible_count(f32::NAN, MAX_CROWD), 0);
    }

    #[test]
    fn visible_count_survives_headcount_rounding() {
        for count in 0..=MAX_CROWD {
            let fraction = count as f32 / MAX_CROWD as f32;
            assert_eq!(visible_count(fraction, MAX_CROWD), count);
        }
    }

    #[test]
    fn zone_stats_fill_ratio_handles_empty_target() {
        assert_eq!(ZoneStats::default().fill_ratio(), 1.0);
        let stats = ZoneStats {
            target: 4,
            placed: 1,
            attempts: 40,
        };
        assert!((stats.fill_ratio() - 0.25).abs() < f32::EPSILON);
        assert!(stats.is_short());
    }

    #[test]
    fn segments_index_in_batch_order() {
        for (index, segment) in Segment::ALL.iter().enumerate() {
            assert_eq!(segment.index(), index);
        }
    }

    #[test]
    fn pool_truncates_to_capacity() {
        let figure = PlacedFigure {
            position: Vec2::ZERO,
            height_scale: 1.0,
            phase_offset: 0.0,
            appearance: Appearance {
                skin: SKIN_TONES[0],
                shirt: SHIRT_COLORS[0],
                pants: PANTS_COLORS[0],
                hair: HAIR_COLORS[0],
                hair_style: HairStyle::Short,
            },
            zone: CrowdZone::General,
        };
        let pool = CrowdPool::new(2, vec![figure; 5], ZoneStats::default(), ZoneStats::default());
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.visible(10).len(), 2);
        assert_eq!(pool.visible(1).len(), 1);
    }
}
