use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    sync::Arc,
};

use glam::Vec2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use venue_crowd_core::{
    ClosedSections, Command, CrowdPool, CrowdZone, Event, ModeProfile, ModeProfiles,
    PlacementInputs, Section, VenueLayout, VenueMode, MAX_CROWD,
};
use venue_crowd_system_placement::{
    dance_floor_accepts, general_accepts, generate_pool, Config, Placement, PlacementRequest,
    PlacementSeed, ATTEMPTS_PER_FIGURE,
};
use venue_crowd_world::{self as world, query, World};

fn inputs(mode: VenueMode, closed: &[Section]) -> PlacementInputs {
    PlacementInputs {
        mode,
        closed_sections: ClosedSections::from_sections(closed.iter().copied()),
        ..PlacementInputs::default()
    }
}

fn generate(inputs: PlacementInputs, seed: u64) -> CrowdPool {
    let placement = Placement::new(Config::new(MAX_CROWD, PlacementSeed::Fixed(seed)));
    placement.generate(inputs, &VenueLayout::nightclub())
}

fn general_figures_in(pool: &CrowdPool, layout: &VenueLayout, section: Section) -> usize {
    let Some(footprint) = layout.footprint(section) else {
        return 0;
    };
    pool.figures()
        .iter()
        .filter(|figure| figure.zone == CrowdZone::General)
        .filter(|figure| footprint.contains(figure.position))
        .count()
}

#[test]
fn intimate_pool_fills_both_halves_outside_the_stage() {
    let inputs = inputs(VenueMode::Intimate, &[]);
    let pool = generate(inputs, 0x5eed_0006);

    assert_eq!(pool.dance_floor_stats().target, 250);
    assert_eq!(pool.general_stats().target, 250);
    assert_eq!(pool.dance_floor_stats().placed, 250);
    assert_eq!(pool.general_stats().placed, 250);
    assert_eq!(pool.len(), MAX_CROWD);

    let keep_out = inputs.stage_radius + 0.2;
    for figure in pool.figures() {
        assert!(
            figure.position.length() >= keep_out,
            "figure at {:?} stands on the stage",
            figure.position
        );
    }
}

#[test]
fn standard_pool_keeps_most_of_the_crowd_off_the_dance_floor() {
    let pool = generate(inputs(VenueMode::Standard, &[]), 0x5eed_0001);

    assert_eq!(pool.dance_floor_stats().target, 75);
    assert_eq!(pool.general_stats().target, 425);
    assert!(!pool.dance_floor_stats().is_short());
    assert_eq!(pool.len(), pool.dance_floor_stats().placed + pool.general_stats().placed);
    for figure in pool.figures() {
        if figure.zone == CrowdZone::DanceFloor {
            assert!(figure.position.length() <= 7.0 + 1e-4);
        } else {
            assert!(figure.position.length() >= 7.5);
        }
    }
}

#[test]
fn closed_sections_stay_empty_and_reopened_sections_fill() {
    let layout = VenueLayout::nightclub();
    let closed = generate(inputs(VenueMode::Standard, &[Section::A, Section::B]), 7);
    assert_eq!(general_figures_in(&closed, &layout, Section::A), 0);
    assert_eq!(general_figures_in(&closed, &layout, Section::B), 0);

    let open = generate(inputs(VenueMode::Standard, &[]), 7);
    assert!(general_figures_in(&open, &layout, Section::A) > 0);
    assert!(general_figures_in(&open, &layout, Section::B) > 0);
}

#[test]
fn reclosing_a_section_clears_it_again() {
    let layout = VenueLayout::nightclub();
    let open = generate(inputs(VenueMode::Standard, &[]), 21);
    assert!(general_figures_in(&open, &layout, Section::D) > 0);

    let closed = generate(inputs(VenueMode::Standard, &[Section::D]), 21);
    assert_eq!(general_figures_in(&closed, &layout, Section::D), 0);
}

#[test]
fn every_figure_clears_its_exclusion_zones() {
    let layout = VenueLayout::nightclub();
    let profiles = ModeProfiles::default();
    let cases = [
        inputs(VenueMode::Standard, &[]),
        inputs(VenueMode::Standard, &[Section::D, Section::E]),
        inputs(VenueMode::Intimate, &Section::ALL),
        PlacementInputs {
            stage_radius: 6.0,
            ..inputs(VenueMode::Intimate, &[Section::B])
        },
    ];

    for (seed, case) in cases.into_iter().enumerate() {
        let pool = generate(case, seed as u64);
        let profile = profiles.get(case.mode);
        for figure in pool.figures() {
            let point = figure.position;
            assert!(!layout.permanent_stage().contains(point));
            match figure.zone {
                CrowdZone::DanceFloor => {
                    assert!(dance_floor_accepts(point, &case, profile, &layout));
                    assert!(point.y >= layout.dance_floor_rear_limit());
                }
                CrowdZone::General => {
                    assert!(general_accepts(point, &case, profile, &layout));
                    assert!(layout.room_bounds().contains_inclusive(point));
                    assert!(!layout.in_furniture(point));
                    assert!(!layout.in_closed_section(point, case.closed_sections));
                }
            }
        }
    }
}

#[test]
fn impossible_layout_terminates_with_an_empty_pool() {
    let blocked = ModeProfile {
        stage_buffer: Some(100.0),
        exclusion_annulus_radius: 100.0,
        ..ModeProfile::intimate()
    };
    let profiles = ModeProfiles {
        standard: blocked,
        intimate: blocked,
    };
    let request = PlacementRequest {
        capacity: MAX_CROWD,
        inputs: inputs(VenueMode::Intimate, &Section::ALL),
    };
    let mut rng = ChaCha8Rng::seed_from_u64(99);

    let pool = generate_pool(&request, &VenueLayout::nightclub(), &profiles, &mut rng);

    assert!(pool.is_empty());
    assert_eq!(pool.capacity(), MAX_CROWD);
    let dance_floor = pool.dance_floor_stats();
    let general = pool.general_stats();
    assert_eq!(dance_floor.attempts, dance_floor.target * ATTEMPTS_PER_FIGURE);
    assert_eq!(general.attempts, general.target * ATTEMPTS_PER_FIGURE);
    assert_eq!(dance_floor.fill_ratio(), 0.0);
}

#[test]
fn zero_capacity_yields_an_empty_pool() {
    let request = PlacementRequest {
        capacity: 0,
        inputs: PlacementInputs::default(),
    };
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let pool = generate_pool(
        &request,
        &VenueLayout::nightclub(),
        &ModeProfiles::default(),
        &mut rng,
    );
    assert!(pool.is_empty());
    assert_eq!(pool.general_stats().attempts, 0);
}

#[test]
fn fixed_seed_reproduces_the_pool() {
    let inputs = inputs(VenueMode::Standard, &[Section::E]);
    assert_eq!(generate(inputs, 42), generate(inputs, 42));
    assert_ne!(generate(inputs, 42), generate(inputs, 43));
}

#[test]
fn visible_prefix_mixes_dance_floor_and_general() {
    let pool = generate(inputs(VenueMode::Intimate, &[]), 5);
    let prefix = pool.visible(20);
    let dance_floor = prefix
        .iter()
        .filter(|figure| figure.zone == CrowdZone::DanceFloor)
        .count();
    assert_eq!(dance_floor, 10);
}

#[test]
fn handle_coalesces_input_changes() {
    let mut placement = Placement::new(Config::new(MAX_CROWD, PlacementSeed::Fixed(3)));
    let first = inputs(VenueMode::Standard, &[]);
    let last = inputs(VenueMode::Intimate, &[Section::A]);
    let mut commands = Vec::new();

    placement.handle(
        &[
            Event::PlacementInputsChanged { inputs: first },
            Event::OccupancyChanged { visible: 10 },
            Event::PlacementInputsChanged { inputs: last },
        ],
        &VenueLayout::nightclub(),
        &mut commands,
    );

    assert_eq!(commands.len(), 1);
    match &commands[0] {
        Command::PublishPool { inputs, pool } => {
            assert_eq!(*inputs, last);
            assert_eq!(pool.dance_floor_stats().target, 250);
        }
        other => panic!("unexpected command emitted: {other:?}"),
    }
}

#[test]
fn occupancy_changes_do_not_regenerate() {
    let mut placement = Placement::new(Config::default());
    let mut commands = Vec::new();
    placement.handle(
        &[
            Event::OccupancyChanged { visible: 300 },
            Event::VibeIntensityChanged { intensity: 1.5 },
        ],
        &VenueLayout::nightclub(),
        &mut commands,
    );
    assert!(commands.is_empty());
}

#[test]
fn pool_generated_for_outdated_inputs_is_discarded() {
    let mut world = World::new();
    let mut placement = Placement::new(Config::new(MAX_CROWD, PlacementSeed::Fixed(8)));
    let layout = VenueLayout::nightclub();
    let mut events = Vec::new();
    let mut commands = Vec::new();

    world::apply(&mut world, Command::RequestPoolRegeneration, &mut events);
    placement.handle(&events, &layout, &mut commands);
    events.clear();

    world::apply(
        &mut world,
        Command::CloseSection { section: Section::B },
        &mut events,
    );
    for command in commands.drain(..) {
        world::apply(&mut world, command, &mut events);
    }

    assert!(events
        .iter()
        .any(|event| matches!(event, Event::StalePoolDiscarded { .. })));
    assert_eq!(query::pool_generation(&world), 0);
}

fn replay(seed: u64) -> (u64, u64) {
    let mut world = World::new();
    let mut placement = Placement::new(Config::new(MAX_CROWD, PlacementSeed::Fixed(seed)));
    let layout = VenueLayout::nightclub();
    let script = [
        Command::RequestPoolRegeneration,
        Command::SetVenueMode {
            mode: VenueMode::Standard,
        },
        Command::CloseSection { section: Section::A },
        Command::SetOccupancy { fraction: 0.7 },
        Command::ReopenSection { section: Section::A },
        Command::SetStageRadius { radius: 4.0 },
    ];

    let mut events = Vec::new();
    let mut commands = Vec::new();
    for command in script {
        world::apply(&mut world, command, &mut events);
        while !events.is_empty() {
            placement.handle(&events, &layout, &mut commands);
            events.clear();
            for command in commands.drain(..) {
                world::apply(&mut world, command, &mut events);
            }
        }
    }

    let mut hasher = DefaultHasher::new();
    let pool = query::shared_crowd_pool(&world);
    for figure in pool.visible(query::visible_count(&world)) {
        figure.position.x.to_bits().hash(&mut hasher);
        figure.position.y.to_bits().hash(&mut hasher);
        figure.height_scale.to_bits().hash(&mut hasher);
        figure.phase_offset.to_bits().hash(&mut hasher);
        figure.appearance.hash(&mut hasher);
        figure.zone.hash(&mut hasher);
    }
    (hasher.finish(), query::pool_generation(&world))
}

#[test]
fn deterministic_replay_produces_identical_pools() {
    let (first, generations) = replay(0xfeed);
    let (second, _) = replay(0xfeed);
    assert_eq!(first, second);
    assert_eq!(generations, 5);
}

#[test]
fn published_pool_is_shared_not_copied() {
    let mut world = World::new();
    let mut placement = Placement::new(Config::new(MAX_CROWD, PlacementSeed::Fixed(1)));
    let mut events = Vec::new();
    let mut commands = Vec::new();

    world::apply(&mut world, Command::RequestPoolRegeneration, &mut events);
    placement.handle(&events, &VenueLayout::nightclub(), &mut commands);
    let published = match &commands[0] {
        Command::PublishPool { pool, .. } => Arc::clone(pool),
        other => panic!("unexpected command emitted: {other:?}"),
    };
    events.clear();
    for command in commands.drain(..) {
        world::apply(&mut world, command, &mut events);
    }

    assert!(Arc::ptr_eq(&query::shared_crowd_pool(&world), &published));
    let origin = Vec2::ZERO;
    assert!(query::crowd_pool(&world)
        .figures()
        .iter()
        .all(|figure| figure.position.distance(origin) >= 3.7));
}

#[test]
fn raising_occupancy_only_reveals_more_figures() {
    let pool = generate(inputs(VenueMode::Standard, &[]), 13);
    let mut previous: &[_] = &[];
    for step in 0..=20 {
        let visible = pool.visible(venue_crowd_core::visible_count(step as f32 / 20.0, MAX_CROWD));
        assert!(visible.len() >= previous.len());
        assert_eq!(&visible[..previous.len()], previous);
        previous = visible;
    }
}
