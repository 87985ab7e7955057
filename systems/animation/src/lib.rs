#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Closed-form dance animation for every visible crowd figure.
//!
//! Poses depend only on the shared clock, the vibe intensity and the
//! immutable figure descriptor, so the system carries no per-figure state:
//! each frame recomputes the whole [`TransformBatch`] from scratch.

use std::f32::consts::PI;

use glam::{Vec2, Vec3};
use venue_crowd_core::{
    CrowdPool, HairStyle, PlacedFigure, Segment, SegmentTransform, HIGH_ENERGY_THRESHOLD,
};

const LEG_RADIUS: f32 = 0.065;
const LEG_LENGTH: f32 = 0.75 + 2.0 * LEG_RADIUS;
const HIP_HALF_WIDTH: f32 = 0.08;
const TORSO_RADIUS: f32 = 0.18;
const TORSO_HEIGHT: f32 = 0.35 + 2.0 * TORSO_RADIUS;
const NECK_HEIGHT: f32 = 0.15;
const HEAD_RADIUS: f32 = 0.13;
const SHOULDER_HALF_WIDTH: f32 = 0.22;
const SHOULDER_DROP: f32 = 0.05;
const ARM_REST_ROLL: f32 = PI / 1.1;

/// Motion regime derived from the vibe intensity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DanceEnergy {
    /// Angular frequency of the bounce.
    pub jump_speed: f32,
    /// Peak vertical offset of the bounce in metres.
    pub bounce_amplitude: f32,
    /// Amplitude of the arm roll oscillation in radians.
    pub arm_energy: f32,
}

impl DanceEnergy {
    /// Derives the regime for the provided vibe intensity.
    ///
    /// Intensities above [`HIGH_ENERGY_THRESHOLD`] switch to big jumps and
    /// raised arms.
    #[must_use]
    pub fn from_vibe(vibe_intensity: f32) -> Self {
        let high_energy = vibe_intensity > HIGH_ENERGY_THRESHOLD;
        Self {
            jump_speed: 8.0 + vibe_intensity * 3.0,
            bounce_amplitude: if high_energy { 0.15 } else { 0.05 },
            arm_energy: if high_energy { 1.5 } else { 0.5 },
        }
    }
}

/// Scale and vertical offset applied to the hair volume.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HairShape {
    /// Per-axis scale of the hair sphere.
    pub scale: Vec3,
    /// Height of the hair centre above the head centre.
    pub offset: f32,
}

impl HairShape {
    /// Static shape of the provided hair style.
    #[must_use]
    pub fn of(style: HairStyle) -> Self {
        let (scale, offset) = match style {
            HairStyle::Short => (Vec3::new(1.05, 0.6, 1.05), 0.06),
            HairStyle::MediumCurly => (Vec3::new(1.2, 0.9, 1.2), 0.08),
            HairStyle::Long => (Vec3::new(1.1, 1.3, 1.1), 0.05),
            HairStyle::Bald => (Vec3::splat(0.01), 0.08),
        };
        Self { scale, offset }
    }
}

/// Computes the transform of every segment of a figure at time `t`.
///
/// The result is indexed by [`Segment::index`].
#[must_use]
pub fn pose_figure(
    figure: &PlacedFigure,
    t: f32,
    vibe_intensity: f32,
) -> [SegmentTransform; Segment::COUNT] {
    let energy = DanceEnergy::from_vibe(vibe_intensity);
    let offset = figure.phase_offset;
    let height = figure.height_scale;
    let Vec2 { x, y: z } = figure.position;

    let bounce = (t * energy.jump_speed + offset).sin().abs() * energy.bounce_amplitude;
    let yaw = offset + (t * 2.0 + offset).sin() * 0.15;
    let facing = Vec2::new(yaw.cos(), yaw.sin());

    let mut pose = [SegmentTransform::HIDDEN; Segment::COUNT];

    let hip = facing * HIP_HALF_WIDTH;
    let leg_y = LEG_LENGTH / 2.0 * height + bounce;
    let leg_scale = Vec3::new(1.0, height, 1.0);
    let left_stride = (t * 6.0 + offset).sin() * 0.3;
    let right_stride = (t * 6.0 + offset + PI).sin() * 0.3;
    pose[Segment::LeftLeg.index()] = SegmentTransform {
        translation: Vec3::new(x - hip.x, leg_y, z + hip.y),
        rotation: Vec3::new(left_stride, yaw, 0.0),
        scale: leg_scale,
    };
    pose[Segment::RightLeg.index()] = SegmentTransform {
        translation: Vec3::new(x + hip.x, leg_y, z - hip.y),
        rotation: Vec3::new(right_stride, yaw, 0.0),
        scale: leg_scale,
    };

    let torso_y = LEG_LENGTH * height + TORSO_HEIGHT / 2.0 + bounce;
    let torso_pitch = (t * 4.0 + offset).sin() * 0.05;
    pose[Segment::Torso.index()] = SegmentTransform {
        translation: Vec3::new(x, torso_y, z),
        rotation: Vec3::new(torso_pitch, yaw, 0.0),
        scale: Vec3::ONE,
    };

    let neck_y = torso_y + TORSO_HEIGHT / 2.0 + NECK_HEIGHT / 2.0;
    pose[Segment::Neck.index()] = SegmentTransform {
        translation: Vec3::new(x, neck_y, z),
        rotation: Vec3::new(0.0, yaw, 0.0),
        scale: Vec3::new(0.8, 1.0, 0.8),
    };

    let head_y = neck_y + NECK_HEIGHT / 2.0 + HEAD_RADIUS;
    let head_rotation = Vec3::new(
        (t * 2.0 + offset).sin() * 0.1,
        yaw + (t * 1.5).sin() * 0.2,
        0.0,
    );
    pose[Segment::Head.index()] = SegmentTransform {
        translation: Vec3::new(x, head_y, z),
        rotation: head_rotation,
        scale: Vec3::ONE,
    };

    let hair = HairShape::of(figure.appearance.hair_style);
    pose[Segment::Hair.index()] = SegmentTransform {
        translation: Vec3::new(x, head_y + hair.offset, z),
        rotation: head_rotation,
        scale: hair.scale,
    };

    let shoulder = facing * SHOULDER_HALF_WIDTH;
    let shoulder_y = torso_y + TORSO_HEIGHT / 2.0 - SHOULDER_DROP;
    let left_roll = ARM_REST_ROLL + (t * 3.0 + offset).sin() * energy.arm_energy;
    let left_pitch = (t * 2.5 + offset).sin() * 0.5;
    let right_roll = -ARM_REST_ROLL - (t * 3.0 + offset + 1.0).sin() * energy.arm_energy;
    let right_pitch = (t * 2.5 + offset + 2.0).sin() * 0.5;
    pose[Segment::LeftArm.index()] = SegmentTransform {
        translation: Vec3::new(x - shoulder.x, shoulder_y, z + shoulder.y),
        rotation: Vec3::new(torso_pitch + left_pitch, yaw, left_roll),
        scale: Vec3::ONE,
    };
    pose[Segment::RightArm.index()] = SegmentTransform {
        translation: Vec3::new(x + shoulder.x, shoulder_y, z - shoulder.y),
        rotation: Vec3::new(torso_pitch + right_pitch, yaw, right_roll),
        scale: Vec3::ONE,
    };

    pose
}

/// Segment-major transforms for every slot of a pool.
///
/// All transforms of one segment kind are contiguous, matching one instanced
/// draw per segment.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TransformBatch {
    capacity: usize,
    transforms: Vec<SegmentTransform>,
}

impl TransformBatch {
    /// Creates a batch with every slot hidden.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            transforms: vec![SegmentTransform::HIDDEN; capacity * Segment::COUNT],
        }
    }

    /// Number of slots covered by the batch.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Transform of the segment in the slot, if the slot exists.
    #[must_use]
    pub fn get(&self, slot: usize, segment: Segment) -> Option<&SegmentTransform> {
        if slot >= self.capacity {
            return None;
        }
        self.transforms.get(segment.index() * self.capacity + slot)
    }

    /// Transforms of one segment kind in slot order.
    #[must_use]
    pub fn segment(&self, segment: Segment) -> &[SegmentTransform] {
        let start = segment.index() * self.capacity;
        &self.transforms[start..start + self.capacity]
    }

    /// Every transform, segment-major.
    #[must_use]
    pub fn as_slice(&self) -> &[SegmentTransform] {
        &self.transforms
    }

    fn reset(&mut self, capacity: usize) {
        if capacity != self.capacity {
            self.capacity = capacity;
            self.transforms
                .resize(capacity * Segment::COUNT, SegmentTransform::HIDDEN);
        }
        self.transforms.fill(SegmentTransform::HIDDEN);
    }

    fn write(&mut self, slot: usize, pose: &[SegmentTransform; Segment::COUNT]) {
        for (segment, transform) in Segment::ALL.iter().zip(pose) {
            self.transforms[segment.index() * self.capacity + slot] = *transform;
        }
    }
}

/// Per-frame driver that poses the visible prefix of the published pool.
#[derive(Debug, Default)]
pub struct Animation {
    batch: TransformBatch,
}

impl Animation {
    /// Creates a new animation system.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Recomputes every slot of the pool for time `t`.
    ///
    /// Slots at or beyond `visible`, and slots the pool never filled, are
    /// returned as [`SegmentTransform::HIDDEN`].
    pub fn pose_frame(
        &mut self,
        pool: &CrowdPool,
        visible: usize,
        t: f32,
        vibe_intensity: f32,
    ) -> &TransformBatch {
        self.batch.reset(pool.capacity());
        for (slot, figure) in pool.visible(visible).iter().enumerate() {
            let pose = pose_figure(figure, t, vibe_intensity);
            self.batch.write(slot, &pose);
        }
        &self.batch
    }

    /// Batch produced by the most recent frame.
    #[must_use]
    pub fn batch(&self) -> &TransformBatch {
        &self.batch
    }
}
