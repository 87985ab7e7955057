#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Analytics system that summarises how well the published pool met its targets.

use venue_crowd_core::{
    CrowdPool, CrowdZone, Event, PlacementReport, SectionHeadcounts, VenueLayout,
};

/// Pure analytics system that publishes a report whenever the visible crowd changes.
#[derive(Debug, Default)]
pub struct Analytics {
    last_report: Option<PlacementReport>,
}

impl Analytics {
    /// Creates a new analytics system with no published report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the last report published by the system, if any.
    #[must_use]
    pub fn last_report(&self) -> Option<&PlacementReport> {
        self.last_report.as_ref()
    }

    /// Consumes world events and publishes a fresh report when needed.
    ///
    /// A report is recomputed at most once per call, and only when a pool was
    /// published or the visible count changed.
    pub fn handle(
        &mut self,
        events: &[Event],
        pool: &CrowdPool,
        visible: usize,
        layout: &VenueLayout,
        out: &mut Vec<Event>,
    ) {
        let dirty = events.iter().any(|event| {
            matches!(
                event,
                Event::PoolPublished { .. } | Event::OccupancyChanged { .. }
            )
        });
        if !dirty {
            return;
        }

        let report = summarise(pool, visible, layout);
        self.last_report = Some(report);
        out.push(Event::PlacementReportUpdated { report });
    }
}

/// Builds a report for the visible prefix of the pool.
#[must_use]
pub fn summarise(pool: &CrowdPool, visible: usize, layout: &VenueLayout) -> PlacementReport {
    let figures = pool.visible(visible);
    let mut section_headcounts = SectionHeadcounts::default();
    let mut visible_dance_floor = 0;

    for figure in figures {
        match figure.zone {
            CrowdZone::DanceFloor => visible_dance_floor += 1,
            CrowdZone::General => {
                if let Some(section) = layout.section_at(figure.position) {
                    section_headcounts.record(section);
                }
            }
        }
    }

    PlacementReport {
        dance_floor: pool.dance_floor_stats(),
        general: pool.general_stats(),
        visible: figures.len(),
        visible_dance_floor,
        section_headcounts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unrelated_events_do_not_publish() {
        let mut analytics = Analytics::new();
        let mut out = Vec::new();
        analytics.handle(
            &[Event::VibeIntensityChanged { intensity: 1.0 }],
            &CrowdPool::empty(10),
            10,
            &VenueLayout::nightclub(),
            &mut out,
        );
        assert!(out.is_empty());
        assert!(analytics.last_report().is_none());
    }

    #[test]
    fn empty_pool_reports_full_fill() {
        let report = summarise(&CrowdPool::empty(10), 10, &VenueLayout::nightclub());
        assert_eq!(report.visible, 0);
        assert_eq!(report.fill_ratio(), 1.0);
    }
}
