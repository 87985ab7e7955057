#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for venue crowd adapters.
//!
//! Every segment kind is drawn as one instanced primitive. Backends receive
//! per-instance colours once per published pool and per-instance matrices
//! once per frame, both laid out segment-major so a draw call can take a
//! contiguous slice.

use anyhow::{ensure, Result as AnyResult};
use glam::{EulerRot, Mat4, Quat};
use venue_crowd_core::{CrowdPool, Segment, SegmentTransform, Swatch};

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Fully transparent black, used for slots without a figure.
    pub const TRANSPARENT: Color = Color::new(0.0, 0.0, 0.0, 0.0);

    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Converts a palette swatch into an opaque color.
    #[must_use]
    pub const fn from_swatch(swatch: Swatch) -> Self {
        Self::from_rgb_u8(swatch.red(), swatch.green(), swatch.blue())
    }
}

/// Primitive used to draw a segment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MeshShape {
    /// Cylinder capped by two hemispheres.
    Capsule {
        /// Radius of the cylinder and caps.
        radius: f32,
        /// Length of the straight section between the caps.
        length: f32,
    },
    /// Tapered cylinder.
    Cylinder {
        /// Radius of the upper face.
        top_radius: f32,
        /// Radius of the lower face.
        bottom_radius: f32,
        /// Distance between the faces.
        height: f32,
    },
    /// Sphere.
    Sphere {
        /// Radius of the sphere.
        radius: f32,
    },
}

/// Static mesh and material description of a segment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SegmentMesh {
    /// Segment drawn with this mesh.
    pub segment: Segment,
    /// Geometry of the primitive.
    pub shape: MeshShape,
    /// Surface roughness in the range 0.0..=1.0.
    pub roughness: f32,
    /// Whether the segment casts shadows.
    pub casts_shadow: bool,
    /// Whether the segment receives shadows.
    pub receives_shadow: bool,
}

impl SegmentMesh {
    /// Mesh used for the provided segment.
    #[must_use]
    pub const fn of(segment: Segment) -> Self {
        let (shape, roughness) = match segment {
            Segment::LeftLeg | Segment::RightLeg => (
                MeshShape::Capsule {
                    radius: 0.065,
                    length: 0.75,
                },
                0.8,
            ),
            Segment::Torso => (
                MeshShape::Capsule {
                    radius: 0.18,
                    length: 0.35,
                },
                0.7,
            ),
            Segment::Neck => (
                MeshShape::Cylinder {
                    top_radius: 0.06,
                    bottom_radius: 0.07,
                    height: 0.15,
                },
                0.5,
            ),
            Segment::Head => (MeshShape::Sphere { radius: 0.13 }, 0.5),
            Segment::Hair => (MeshShape::Sphere { radius: 0.14 }, 0.9),
            Segment::LeftArm | Segment::RightArm => (
                MeshShape::Capsule {
                    radius: 0.055,
                    length: 0.55,
                },
                0.5,
            ),
        };
        Self {
            segment,
            shape,
            roughness,
            casts_shadow: true,
            receives_shadow: !matches!(segment, Segment::Hair),
        }
    }

    /// Meshes of every segment in batch order.
    #[must_use]
    pub fn all() -> [SegmentMesh; Segment::COUNT] {
        Segment::ALL.map(Self::of)
    }
}

/// Segment-major per-instance colours of a pool.
#[derive(Clone, Debug, PartialEq)]
pub struct InstanceColors {
    capacity: usize,
    colors: Vec<Color>,
}

impl InstanceColors {
    /// Builds the colour buffers for every slot of the pool.
    ///
    /// Slots the pool never filled are [`Color::TRANSPARENT`].
    #[must_use]
    pub fn from_pool(pool: &CrowdPool) -> Self {
        let capacity = pool.capacity();
        let mut colors = vec![Color::TRANSPARENT; capacity * Segment::COUNT];
        for (slot, figure) in pool.figures().iter().enumerate() {
            let appearance = &figure.appearance;
            for segment in Segment::ALL {
                let swatch = match segment {
                    Segment::LeftLeg | Segment::RightLeg => appearance.pants,
                    Segment::Torso => appearance.shirt,
                    Segment::Hair => appearance.hair,
                    Segment::Neck | Segment::Head | Segment::LeftArm | Segment::RightArm => {
                        appearance.skin
                    }
                };
                colors[segment.index() * capacity + slot] = Color::from_swatch(swatch);
            }
        }
        Self { capacity, colors }
    }

    /// Number of slots covered by the buffers.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Colours of one segment kind in slot order.
    #[must_use]
    pub fn segment(&self, segment: Segment) -> &[Color] {
        let start = segment.index() * self.capacity;
        &self.colors[start..start + self.capacity]
    }
}

/// Segment-major per-instance model matrices of one frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InstanceFrame {
    capacity: usize,
    matrices: Vec<Mat4>,
}

impl InstanceFrame {
    /// Creates an empty frame.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Converts segment-major transforms covering `capacity` slots.
    pub fn from_transforms(capacity: usize, transforms: &[SegmentTransform]) -> AnyResult<Self> {
        let mut frame = Self::new();
        frame.update(capacity, transforms)?;
        Ok(frame)
    }

    /// Overwrites the frame in place, reusing its allocation.
    pub fn update(&mut self, capacity: usize, transforms: &[SegmentTransform]) -> AnyResult<()> {
        ensure!(
            transforms.len() == capacity * Segment::COUNT,
            "expected {} transforms for {capacity} slots, received {}",
            capacity * Segment::COUNT,
            transforms.len()
        );
        self.capacity = capacity;
        self.matrices.clear();
        self.matrices.extend(transforms.iter().map(model_matrix));
        Ok(())
    }

    /// Number of slots covered by the frame.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Matrices of one segment kind in slot order.
    #[must_use]
    pub fn segment(&self, segment: Segment) -> &[Mat4] {
        let start = segment.index() * self.capacity;
        &self.matrices[start..start + self.capacity]
    }
}

/// Builds the model matrix of a segment: scale, then XYZ Euler rotation, then translation.
#[must_use]
pub fn model_matrix(transform: &SegmentTransform) -> Mat4 {
    let rotation = transform.rotation;
    Mat4::from_scale_rotation_translation(
        transform.scale,
        Quat::from_euler(EulerRot::XYZ, rotation.x, rotation.y, rotation.z),
        transform.translation,
    )
}

/// Rendering backend capable of drawing instanced crowd figures.
pub trait RenderingBackend {
    /// Replaces the per-instance colours; called once per published pool.
    fn upload_colors(&mut self, colors: &InstanceColors) -> AnyResult<()>;

    /// Draws one frame of per-instance matrices.
    fn upload_frame(&mut self, frame: &InstanceFrame) -> AnyResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec2, Vec3};
    use venue_crowd_core::{
        Appearance, CrowdZone, HairStyle, PlacedFigure, ZoneStats, HAIR_COLORS, PANTS_COLORS,
        SHIRT_COLORS, SKIN_TONES,
    };

    fn pool() -> CrowdPool {
        let figure = PlacedFigure {
            position: Vec2::ZERO,
            height_scale: 1.0,
            phase_offset: 0.0,
            appearance: Appearance {
                skin: SKIN_TONES[1],
                shirt: SHIRT_COLORS[2],
                pants: PANTS_COLORS[3],
                hair: HAIR_COLORS[4],
                hair_style: HairStyle::Long,
            },
            zone: CrowdZone::General,
        };
        CrowdPool::new(3, vec![figure; 2], ZoneStats::default(), ZoneStats::default())
    }

    #[test]
    fn swatch_conversion_is_opaque() {
        let color = Color::from_swatch(SHIRT_COLORS[6]);
        assert_eq!(color, Color::new(0.0, 1.0, 1.0, 1.0));
    }

    #[test]
    fn colors_follow_the_appearance() {
        let colors = InstanceColors::from_pool(&pool());
        let skin = Color::from_swatch(SKIN_TONES[1]);
        assert_eq!(colors.segment(Segment::Head)[0], skin);
        assert_eq!(colors.segment(Segment::Neck)[1], skin);
        assert_eq!(colors.segment(Segment::RightArm)[0], skin);
        assert_eq!(
            colors.segment(Segment::LeftLeg)[0],
            Color::from_swatch(PANTS_COLORS[3])
        );
        assert_eq!(
            colors.segment(Segment::Torso)[0],
            Color::from_swatch(SHIRT_COLORS[2])
        );
        assert_eq!(
            colors.segment(Segment::Hair)[1],
            Color::from_swatch(HAIR_COLORS[4])
        );
        assert_eq!(colors.segment(Segment::Head)[2], Color::TRANSPARENT);
    }

    #[test]
    fn hair_casts_but_does_not_receive_shadows() {
        let hair = SegmentMesh::of(Segment::Hair);
        assert!(hair.casts_shadow);
        assert!(!hair.receives_shadow);
        assert!(SegmentMesh::all()
            .iter()
            .filter(|mesh| mesh.segment != Segment::Hair)
            .all(|mesh| mesh.receives_shadow));
    }

    #[test]
    fn model_matrix_places_the_segment() {
        let transform = SegmentTransform {
            translation: Vec3::new(1.0, 2.0, 3.0),
            rotation: Vec3::new(0.0, std::f32::consts::FRAC_PI_2, 0.0),
            scale: Vec3::ONE,
        };
        let matrix = model_matrix(&transform);
        assert!(matrix
            .transform_point3(Vec3::ZERO)
            .abs_diff_eq(Vec3::new(1.0, 2.0, 3.0), 1e-6));
        assert!(matrix
            .transform_vector3(Vec3::X)
            .abs_diff_eq(Vec3::new(0.0, 0.0, -1.0), 1e-6));
    }

    #[test]
    fn hidden_segments_collapse_to_a_point() {
        let matrix = model_matrix(&SegmentTransform::HIDDEN);
        assert_eq!(matrix.transform_vector3(Vec3::ONE), Vec3::ZERO);
    }

    #[test]
    fn frame_rejects_mismatched_buffers() {
        assert!(InstanceFrame::from_transforms(2, &[SegmentTransform::HIDDEN; 3]).is_err());
        let frame = InstanceFrame::from_transforms(2, &[SegmentTransform::HIDDEN; 16])
            .expect("matching buffer");
        assert_eq!(frame.segment(Segment::RightArm).len(), 2);
    }
}
