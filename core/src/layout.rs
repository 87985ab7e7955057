//! Static exclusion geometry of the nightclub floor plan.
//!
//! All coordinates are ground-plane `(x, z)` metres with the room centre at
//! the origin and the LED wall towards negative `z`.

use glam::Vec2;

use crate::{ClosedSections, Section};

/// Open axis-aligned rectangle on the ground plane.
///
/// Points on the boundary are outside. Infinite bounds express half-planes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    min: Vec2,
    max: Vec2,
}

impl Rect {
    /// Creates a rectangle spanning `min_x..max_x` and `min_z..max_z`.
    #[must_use]
    pub const fn new(min_x: f32, max_x: f32, min_z: f32, max_z: f32) -> Self {
        Self {
            min: Vec2::new(min_x, min_z),
            max: Vec2::new(max_x, max_z),
        }
    }

    /// Lower corner of the rectangle.
    #[must_use]
    pub const fn min(&self) -> Vec2 {
        self.min
    }

    /// Upper corner of the rectangle.
    #[must_use]
    pub const fn max(&self) -> Vec2 {
        self.max
    }

    /// Reports whether the point lies strictly inside the rectangle.
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        point.x > self.min.x && point.x < self.max.x && point.y > self.min.y && point.y < self.max.y
    }

    /// Reports whether the point lies inside the rectangle or on its boundary.
    #[must_use]
    pub fn contains_inclusive(&self, point: Vec2) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    /// Extent of the rectangle along each axis.
    #[must_use]
    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }
}

/// Platform footprint of a closable section, made of one or two rectangles.
#[derive(Clone, Debug, PartialEq)]
pub struct SectionFootprint {
    section: Section,
    rects: Vec<Rect>,
}

impl SectionFootprint {
    /// Creates a footprint for the section from its platform rectangles.
    #[must_use]
    pub fn new(section: Section, rects: Vec<Rect>) -> Self {
        Self { section, rects }
    }

    /// Section the footprint belongs to.
    #[must_use]
    pub const fn section(&self) -> Section {
        self.section
    }

    /// Rectangles whose union forms the footprint.
    #[must_use]
    pub fn rects(&self) -> &[Rect] {
        &self.rects
    }

    /// Reports whether the point stands on the section platform.
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        self.rects.iter().any(|rect| rect.contains(point))
    }
}

/// Fixed room geometry consumed by the placement system.
#[derive(Clone, Debug, PartialEq)]
pub struct VenueLayout {
    sampling_area: Rect,
    room_bounds: Rect,
    permanent_stage: Rect,
    buffered_stage: Rect,
    dance_floor_rear_limit: f32,
    general_rear_limit: f32,
    furniture: Vec<Rect>,
    footprints: Vec<SectionFootprint>,
}

impl VenueLayout {
    /// Floor plan of the nightclub: LED-wall stage, bar, and sections A/B/D/E.
    #[must_use]
    pub fn nightclub() -> Self {
        let inf = f32::INFINITY;
        Self {
            sampling_area: Rect::new(-20.0, 20.0, -16.0, 16.0),
            room_bounds: Rect::new(-18.0, 18.0, -15.0, 15.0),
            permanent_stage: Rect::new(-5.0, 5.0, -12.0, -6.0),
            buffered_stage: Rect::new(-5.5, 5.5, -13.0, -5.5),
            dance_floor_rear_limit: -12.0,
            general_rear_limit: -13.0,
            furniture: vec![
                // Section E booths.
                Rect::new(-inf, -6.0, -inf, -5.0),
                // Section D booths.
                Rect::new(6.0, inf, -inf, -5.0),
                // Right wall behind section D.
                Rect::new(13.0, inf, -inf, inf),
                // Section B rows.
                Rect::new(-6.0, 6.0, 4.5, 10.5),
                // Section A tier.
                Rect::new(-inf, inf, 10.5, inf),
                // Bar.
                Rect::new(-inf, -12.0, -inf, inf),
            ],
            footprints: vec![
                SectionFootprint::new(Section::A, vec![Rect::new(-8.0, 8.0, 9.0, 13.5)]),
                SectionFootprint::new(Section::B, vec![Rect::new(-6.5, 6.5, 4.0, 11.0)]),
                SectionFootprint::new(
                    Section::D,
                    vec![
                        Rect::new(4.5, 12.5, -10.5, -7.5),
                        Rect::new(11.5, 15.5, -7.25, 4.25),
                    ],
                ),
                SectionFootprint::new(
                    Section::E,
                    vec![
                        Rect::new(-12.5, -4.5, -10.5, -7.5),
                        Rect::new(-15.75, -12.75, -7.5, -4.5),
                    ],
                ),
            ],
        }
    }

    /// Area uniformly sampled for general-pool candidates.
    #[must_use]
    pub const fn sampling_area(&self) -> Rect {
        self.sampling_area
    }

    /// Walls of the room; general figures must stand inside, boundary included.
    #[must_use]
    pub const fn room_bounds(&self) -> Rect {
        self.room_bounds
    }

    /// LED-wall stage present in every mode.
    #[must_use]
    pub const fn permanent_stage(&self) -> Rect {
        self.permanent_stage
    }

    /// Permanent stage grown by the general-pool buffer.
    #[must_use]
    pub const fn buffered_stage(&self) -> Rect {
        self.buffered_stage
    }

    /// Dance-floor figures must stand at or in front of this `z`.
    #[must_use]
    pub const fn dance_floor_rear_limit(&self) -> f32 {
        self.dance_floor_rear_limit
    }

    /// General figures must stand at or in front of this `z`.
    #[must_use]
    pub const fn general_rear_limit(&self) -> f32 {
        self.general_rear_limit
    }

    /// Fixed furniture and seating blocks.
    #[must_use]
    pub fn furniture(&self) -> &[Rect] {
        &self.furniture
    }

    /// Footprints of every closable section.
    #[must_use]
    pub fn footprints(&self) -> &[SectionFootprint] {
        &self.footprints
    }

    /// Footprint of the provided section, if the layout defines one.
    #[must_use]
    pub fn footprint(&self, section: Section) -> Option<&SectionFootprint> {
        self.footprints
            .iter()
            .find(|footprint| footprint.section() == section)
    }

    /// Reports whether the point is blocked by furniture.
    #[must_use]
    pub fn in_furniture(&self, point: Vec2) -> bool {
        self.furniture.iter().any(|rect| rect.contains(point))
    }

    /// Reports whether the point stands on any closed section.
    #[must_use]
    pub fn in_closed_section(&self, point: Vec2, closed: ClosedSections) -> bool {
        self.footprints
            .iter()
            .filter(|footprint| closed.contains(footprint.section()))
            .any(|footprint| footprint.contains(point))
    }

    /// First section whose footprint contains the point.
    #[must_use]
    pub fn section_at(&self, point: Vec2) -> Option<Section> {
        self.footprints
            .iter()
            .find(|footprint| footprint.contains(point))
            .map(SectionFootprint::section)
    }
}

impl Default for VenueLayout {
    fn default() -> Self {
        Self::nightclub()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_boundary_counts_as_outside() {
        let rect = Rect::new(-1.0, 1.0, -1.0, 1.0);
        assert!(rect.contains(Vec2::ZERO));
        assert!(!rect.contains(Vec2::new(1.0, 0.0)));
        assert!(rect.contains_inclusive(Vec2::new(1.0, 0.0)));
        assert_eq!(rect.size(), Vec2::splat(2.0));
    }

    #[test]
    fn half_planes_extend_to_infinity() {
        let layout = VenueLayout::nightclub();
        assert!(layout.in_furniture(Vec2::new(-12.5, 14.0)));
        assert!(layout.in_furniture(Vec2::new(0.0, 10.6)));
        assert!(!layout.in_furniture(Vec2::new(0.0, 0.0)));
    }

    #[test]
    fn l_shaped_sections_cover_both_arms() {
        let layout = VenueLayout::nightclub();
        let closed = ClosedSections::NONE.with(Section::D);
        assert!(layout.in_closed_section(Vec2::new(5.0, -9.0), closed));
        assert!(layout.in_closed_section(Vec2::new(12.0, 0.0), closed));
        assert!(!layout.in_closed_section(Vec2::new(12.0, 0.0), ClosedSections::NONE));
        assert_eq!(layout.section_at(Vec2::new(-14.0, -6.0)), Some(Section::E));
    }

    #[test]
    fn every_section_has_a_footprint() {
        let layout = VenueLayout::default();
        for section in Section::ALL {
            let footprint = layout.footprint(section).expect("footprint");
            assert!(!footprint.rects().is_empty());
        }
    }
}
