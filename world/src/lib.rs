#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative venue state management for the crowd engine.

use std::{sync::Arc, time::Duration};

use venue_crowd_core::{
    visible_count, ClosedSections, Command, CrowdPool, Event, PlacementInputs, MAX_CROWD,
};

/// Occupancy applied before the host provides one: 75 guests out of 500.
const DEFAULT_OCCUPANCY: f32 = 0.15;
const DEFAULT_VIBE_INTENSITY: f32 = 1.2;
const MAX_VIBE_INTENSITY: f32 = 2.0;

/// Represents the authoritative venue state.
#[derive(Debug)]
pub struct World {
    inputs: PlacementInputs,
    capacity: usize,
    occupancy: f32,
    visible: usize,
    vibe_intensity: f32,
    elapsed: Duration,
    pool: Arc<CrowdPool>,
    generation: u64,
}

impl World {
    /// Creates a venue with the default pool capacity of [`MAX_CROWD`] slots.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(MAX_CROWD)
    }

    /// Creates a venue whose pools expose `capacity` slots.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inputs: PlacementInputs::default(),
            capacity,
            occupancy: DEFAULT_OCCUPANCY,
            visible: visible_count(DEFAULT_OCCUPANCY, capacity),
            vibe_intensity: DEFAULT_VIBE_INTENSITY,
            elapsed: Duration::ZERO,
            pool: Arc::new(CrowdPool::empty(capacity)),
            generation: 0,
        }
    }

    fn update_inputs(&mut self, inputs: PlacementInputs, out_events: &mut Vec<Event>) {
        if inputs == self.inputs {
            return;
        }
        self.inputs = inputs;
        out_events.push(Event::PlacementInputsChanged { inputs });
    }

    fn update_closed_sections(&mut self, closed: ClosedSections, out_events: &mut Vec<Event>) {
        let inputs = PlacementInputs {
            closed_sections: closed,
            ..self.inputs
        };
        self.update_inputs(inputs, out_events);
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::SetVenueMode { mode } => {
            let inputs = PlacementInputs {
                mode,
                ..world.inputs
            };
            world.update_inputs(inputs, out_events);
        }
        Command::CloseSection { section } => {
            let closed = world.inputs.closed_sections.with(section);
            world.update_closed_sections(closed, out_events);
        }
        Command::ReopenSection { section } => {
            let closed = world.inputs.closed_sections.without(section);
            world.update_closed_sections(closed, out_events);
        }
        Command::SetStageRadius { radius } => {
            if !radius.is_finite() || radius < 0.0 {
                tracing::debug!(radius, "ignoring invalid stage radius");
                return;
            }
            let inputs = PlacementInputs {
                stage_radius: radius,
                ..world.inputs
            };
            world.update_inputs(inputs, out_events);
        }
        Command::SetOccupancy { fraction } => {
            if !fraction.is_finite() {
                return;
            }
            world.occupancy = fraction.clamp(0.0, 1.0);
            let visible = visible_count(world.occupancy, world.capacity);
            if visible != world.visible {
                world.visible = visible;
                out_events.push(Event::OccupancyChanged { visible });
            }
        }
        Command::SetVibeIntensity { intensity } => {
            if !intensity.is_finite() {
                return;
            }
            let intensity = intensity.clamp(0.0, MAX_VIBE_INTENSITY);
            if intensity != world.vibe_intensity {
                world.vibe_intensity = intensity;
                out_events.push(Event::VibeIntensityChanged { intensity });
            }
        }
        Command::Tick { dt } => {
            world.elapsed = world.elapsed.saturating_add(dt);
            out_events.push(Event::TimeAdvanced { dt });
        }
        Command::RequestPoolRegeneration => {
            out_events.push(Event::PlacementInputsChanged {
                inputs: world.inputs,
            });
        }
        Command::PublishPool { inputs, pool } => {
            if inputs != world.inputs {
                tracing::debug!(?inputs, current = ?world.inputs, "discarding stale crowd pool");
                out_events.push(Event::StalePoolDiscarded { inputs });
                return;
            }
            let figures = pool.len();
            world.pool = pool;
            world.generation = world.generation.saturating_add(1);
            out_events.push(Event::PoolPublished {
                generation: world.generation,
                figures,
            });
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::sync::Arc;

    use super::World;
    use venue_crowd_core::{ClosedSections, CrowdPool, PlacementInputs, VenueMode};

    /// Inputs the next pool must be generated for.
    #[must_use]
    pub fn placement_inputs(world: &World) -> PlacementInputs {
        world.inputs
    }

    /// Active venue mode.
    #[must_use]
    pub fn venue_mode(world: &World) -> VenueMode {
        world.inputs.mode
    }

    /// Sections currently closed to guests.
    #[must_use]
    pub fn closed_sections(world: &World) -> ClosedSections {
        world.inputs.closed_sections
    }

    /// Radius of the central stage exclusion circle.
    #[must_use]
    pub fn stage_radius(world: &World) -> f32 {
        world.inputs.stage_radius
    }

    /// Pool slot count used to derive the visible count.
    #[must_use]
    pub fn capacity(world: &World) -> usize {
        world.capacity
    }

    /// Occupancy fraction after clamping.
    #[must_use]
    pub fn occupancy(world: &World) -> f32 {
        world.occupancy
    }

    /// Number of pool slots currently visible.
    #[must_use]
    pub fn visible_count(world: &World) -> usize {
        world.visible
    }

    /// Music energy driving the animation regime.
    #[must_use]
    pub fn vibe_intensity(world: &World) -> f32 {
        world.vibe_intensity
    }

    /// Seconds elapsed on the shared animation clock.
    #[must_use]
    pub fn elapsed_seconds(world: &World) -> f32 {
        world.elapsed.as_secs_f32()
    }

    /// Borrow of the currently published pool.
    #[must_use]
    pub fn crowd_pool(world: &World) -> &CrowdPool {
        &world.pool
    }

    /// Shared handle to the currently published pool.
    ///
    /// The handle stays valid after a newer pool is published; readers keep the
    /// pool they started the frame with.
    #[must_use]
    pub fn shared_crowd_pool(world: &World) -> Arc<CrowdPool> {
        Arc::clone(&world.pool)
    }

    /// Number of pools accepted so far.
    #[must_use]
    pub fn pool_generation(world: &World) -> u64 {
        world.generation
    }
}
