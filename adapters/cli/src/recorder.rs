//! Headless rendering backend that records what it would have drawn.

use anyhow::{ensure, Result};
use glam::Vec3;
use serde::Serialize;
use venue_crowd_core::Segment;
use venue_crowd_rendering::{InstanceColors, InstanceFrame, RenderingBackend};

/// Aggregate statistics over every uploaded frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub(crate) struct FrameStats {
    pub(crate) frames: u64,
    pub(crate) color_uploads: u64,
    pub(crate) visible_instances: usize,
    pub(crate) peak_head_height: f32,
}

/// Backend that keeps counters instead of touching a GPU.
#[derive(Debug, Default)]
pub(crate) struct RecordingBackend {
    capacity: Option<usize>,
    stats: FrameStats,
}

impl RecordingBackend {
    pub(crate) fn stats(&self) -> FrameStats {
        self.stats
    }
}

impl RenderingBackend for RecordingBackend {
    fn upload_colors(&mut self, colors: &InstanceColors) -> Result<()> {
        self.capacity = Some(colors.capacity());
        self.stats.color_uploads += 1;
        Ok(())
    }

    fn upload_frame(&mut self, frame: &InstanceFrame) -> Result<()> {
        ensure!(
            self.capacity == Some(frame.capacity()),
            "frame covers {} slots but the uploaded colours cover {:?}",
            frame.capacity(),
            self.capacity
        );

        let torsos = frame.segment(Segment::Torso);
        self.stats.visible_instances = torsos
            .iter()
            .filter(|matrix| matrix.x_axis.truncate() != Vec3::ZERO)
            .count();
        for head in frame.segment(Segment::Head) {
            let height = head.w_axis.y;
            if height > self.stats.peak_head_height {
                self.stats.peak_head_height = height;
            }
        }
        self.stats.frames += 1;
        Ok(())
    }
}
