#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that fills the venue and plays the crowd headlessly.

mod config;
mod recorder;

use std::{collections::BTreeMap, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use venue_crowd_core::{
    ClosedSections, Command, Event, ModeProfiles, PlacementReport, Section, VenueLayout,
    VenueMode, ZoneStats, DEFAULT_STAGE_RADIUS, MAX_CROWD,
};
use venue_crowd_rendering::{InstanceColors, InstanceFrame, RenderingBackend};
use venue_crowd_system_analytics::Analytics;
use venue_crowd_system_animation::Animation;
use venue_crowd_system_placement::{Config, Placement, PlacementSeed};
use venue_crowd_world::{self as world, query, World};

use crate::{
    config::FileConfig,
    recorder::{FrameStats, RecordingBackend},
};

const DEFAULT_OCCUPANCY: f32 = 0.15;
const DEFAULT_VIBE: f32 = 1.2;

/// Command-line arguments for the headless crowd host.
#[derive(Debug, Parser)]
#[command(name = "venue-crowd", about = "Generate and animate a nightclub crowd", version)]
struct Args {
    /// Venue configuration.
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,
    /// Comma separated sections to close, e.g. `A,B`.
    #[arg(long, value_delimiter = ',', value_parser = parse_section)]
    close: Vec<Section>,
    /// Fraction of the pool that is visible.
    #[arg(long, conflicts_with = "count")]
    occupancy: Option<f32>,
    /// Number of visible guests.
    #[arg(long)]
    count: Option<usize>,
    /// Music energy driving the dance regime.
    #[arg(long)]
    vibe: Option<f32>,
    /// Radius of the central stage exclusion circle in metres.
    #[arg(long)]
    stage_radius: Option<f32>,
    /// Seed for reproducible placement; omitted means entropy seeding.
    #[arg(long)]
    seed: Option<u64>,
    /// Number of animation frames to play.
    #[arg(long, default_value_t = 60)]
    frames: u32,
    /// Simulated frame rate.
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u32).range(1..))]
    fps: u32,
    /// TOML configuration file; flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Output format of the summary.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    Standard,
    Intimate,
}

impl From<ModeArg> for VenueMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Standard => VenueMode::Standard,
            ModeArg::Intimate => VenueMode::Intimate,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn parse_section(value: &str) -> Result<Section, String> {
    Section::from_label(value)
        .ok_or_else(|| format!("unknown section `{value}`, expected A, B, D or E"))
}

/// Fully resolved run parameters after merging the file and the flags.
#[derive(Clone, Debug, PartialEq)]
struct Settings {
    capacity: usize,
    mode: VenueMode,
    closed: ClosedSections,
    occupancy: f32,
    vibe: f32,
    stage_radius: f32,
    seed: PlacementSeed,
    profiles: ModeProfiles,
    frames: u32,
    fps: u32,
}

impl Settings {
    fn resolve(args: &Args, file: &FileConfig) -> Result<Self> {
        let crowd = &file.crowd;
        let capacity = crowd.capacity.unwrap_or(MAX_CROWD);
        let closed = if args.close.is_empty() {
            ClosedSections::from_sections(crowd.closed.iter().flatten().copied())
        } else {
            ClosedSections::from_sections(args.close.iter().copied())
        };
        let occupancy = match (args.count, args.occupancy) {
            (Some(count), _) => {
                anyhow::ensure!(
                    count <= capacity,
                    "--count {count} exceeds the pool capacity of {capacity}"
                );
                if capacity == 0 {
                    0.0
                } else {
                    count as f32 / capacity as f32
                }
            }
            (None, Some(occupancy)) => occupancy,
            (None, None) => crowd.occupancy.unwrap_or(DEFAULT_OCCUPANCY),
        };
        let seed = match args.seed.or(file.seed) {
            Some(seed) => PlacementSeed::Fixed(seed),
            None => PlacementSeed::Entropy,
        };

        Ok(Self {
            capacity,
            mode: args
                .mode
                .map(VenueMode::from)
                .or(crowd.mode)
                .unwrap_or(VenueMode::Intimate),
            closed,
            occupancy,
            vibe: args.vibe.or(crowd.vibe).unwrap_or(DEFAULT_VIBE),
            stage_radius: args
                .stage_radius
                .or(crowd.stage_radius)
                .unwrap_or(DEFAULT_STAGE_RADIUS),
            seed,
            profiles: file.profiles()?,
            frames: args.frames,
            fps: args.fps,
        })
    }

    fn setup_commands(&self) -> Vec<Command> {
        let mut commands = vec![
            Command::SetVenueMode { mode: self.mode },
            Command::SetStageRadius {
                radius: self.stage_radius,
            },
            Command::SetOccupancy {
                fraction: self.occupancy,
            },
            Command::SetVibeIntensity {
                intensity: self.vibe,
            },
        ];
        commands.extend(
            self.closed
                .iter()
                .map(|section| Command::CloseSection { section }),
        );
        commands.push(Command::RequestPoolRegeneration);
        commands
    }
}

/// Headless host wiring the world to every system and the recording backend.
struct Simulation {
    world: World,
    layout: VenueLayout,
    placement: Placement,
    analytics: Analytics,
    animation: Animation,
    frame: InstanceFrame,
    backend: RecordingBackend,
    events: Vec<Event>,
    commands: Vec<Command>,
    reports: Vec<Event>,
}

impl Simulation {
    fn new(settings: &Settings) -> Self {
        let config =
            Config::new(settings.capacity, settings.seed).with_profiles(settings.profiles);
        Self {
            world: World::with_capacity(settings.capacity),
            layout: VenueLayout::nightclub(),
            placement: Placement::new(config),
            analytics: Analytics::new(),
            animation: Animation::new(),
            frame: InstanceFrame::new(),
            backend: RecordingBackend::default(),
            events: Vec::new(),
            commands: Vec::new(),
            reports: Vec::new(),
        }
    }

    /// Applies the batch and every command the systems answer with.
    fn submit<I>(&mut self, batch: I) -> Result<()>
    where
        I: IntoIterator<Item = Command>,
    {
        self.commands.extend(batch);
        while !self.commands.is_empty() {
            for command in self.commands.drain(..) {
                world::apply(&mut self.world, command, &mut self.events);
            }
            self.dispatch()?;
        }
        Ok(())
    }

    fn dispatch(&mut self) -> Result<()> {
        if self.events.is_empty() {
            return Ok(());
        }

        for event in &self.events {
            if let Event::StalePoolDiscarded { inputs } = event {
                tracing::debug!(?inputs, "placement answered outdated inputs");
            }
        }

        if self
            .events
            .iter()
            .any(|event| matches!(event, Event::PoolPublished { .. }))
        {
            let colors = InstanceColors::from_pool(query::crowd_pool(&self.world));
            self.backend
                .upload_colors(&colors)
                .context("failed to upload instance colours")?;
        }

        self.placement
            .handle(&self.events, &self.layout, &mut self.commands);
        self.analytics.handle(
            &self.events,
            query::crowd_pool(&self.world),
            query::visible_count(&self.world),
            &self.layout,
            &mut self.reports,
        );
        self.events.clear();
        Ok(())
    }

    fn play(&mut self, frames: u32, fps: u32) -> Result<()> {
        let dt = Duration::from_secs(1) / fps;
        for _ in 0..frames {
            self.submit([Command::Tick { dt }])?;
            let pool = query::shared_crowd_pool(&self.world);
            let batch = self.animation.pose_frame(
                &pool,
                query::visible_count(&self.world),
                query::elapsed_seconds(&self.world),
                query::vibe_intensity(&self.world),
            );
            self.frame
                .update(batch.capacity(), batch.as_slice())
                .context("failed to build instance matrices")?;
            self.backend
                .upload_frame(&self.frame)
                .context("failed to upload frame")?;
        }
        Ok(())
    }

    fn last_report(&self) -> PlacementReport {
        self.reports
            .iter()
            .rev()
            .find_map(|event| match event {
                Event::PlacementReportUpdated { report } => Some(*report),
                _ => None,
            })
            .unwrap_or_default()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
struct ZoneSummary {
    target: usize,
    placed: usize,
    attempts: usize,
    fill_ratio: f32,
}

impl From<ZoneStats> for ZoneSummary {
    fn from(stats: ZoneStats) -> Self {
        Self {
            target: stats.target,
            placed: stats.placed,
            attempts: stats.attempts,
            fill_ratio: stats.fill_ratio(),
        }
    }
}

/// Outcome of a run, printed as text or JSON.
#[derive(Clone, Debug, PartialEq, Serialize)]
struct Summary {
    mode: VenueMode,
    closed_sections: Vec<char>,
    stage_radius: f32,
    capacity: usize,
    visible: usize,
    visible_dance_floor: usize,
    pool_generation: u64,
    dance_floor: ZoneSummary,
    general: ZoneSummary,
    section_headcounts: BTreeMap<char, usize>,
    elapsed_seconds: f32,
    frame_stats: FrameStats,
}

impl Summary {
    fn collect(simulation: &Simulation) -> Self {
        let world = &simulation.world;
        let report = simulation.last_report();
        Self {
            mode: query::venue_mode(world),
            closed_sections: query::closed_sections(world)
                .iter()
                .map(Section::label)
                .collect(),
            stage_radius: query::stage_radius(world),
            capacity: query::capacity(world),
            visible: report.visible,
            visible_dance_floor: report.visible_dance_floor,
            pool_generation: query::pool_generation(world),
            dance_floor: report.dance_floor.into(),
            general: report.general.into(),
            section_headcounts: Section::ALL
                .into_iter()
                .map(|section| (section.label(), report.section_headcounts.get(section)))
                .collect(),
            elapsed_seconds: query::elapsed_seconds(world),
            frame_stats: simulation.backend.stats(),
        }
    }

    fn render_text(&self) -> String {
        let closed: String = if self.closed_sections.is_empty() {
            "none".to_owned()
        } else {
            self.closed_sections.iter().collect()
        };
        let headcounts = self
            .section_headcounts
            .iter()
            .map(|(section, count)| format!("{section}={count}"))
            .collect::<Vec<_>>()
            .join(" ");
        let frames = &self.frame_stats;
        format!(
            "mode: {:?}\nclosed sections: {closed}\nstage radius: {:.2} m\n\
             visible: {}/{} ({} on the dance floor)\n\
             dance floor: {}/{} placed in {} attempts ({:.0}%)\n\
             general: {}/{} placed in {} attempts ({:.0}%)\n\
             section headcounts: {headcounts}\n\
             frames: {} over {:.2} s, {} instances drawn, peak head height {:.2} m",
            self.mode,
            self.stage_radius,
            self.visible,
            self.capacity,
            self.visible_dance_floor,
            self.dance_floor.placed,
            self.dance_floor.target,
            self.dance_floor.attempts,
            self.dance_floor.fill_ratio * 100.0,
            self.general.placed,
            self.general.target,
            self.general.attempts,
            self.general.fill_ratio * 100.0,
            frames.frames,
            self.elapsed_seconds,
            frames.visible_instances,
            frames.peak_head_height,
        )
    }
}

fn run(settings: &Settings) -> Result<Summary> {
    let mut simulation = Simulation::new(settings);
    simulation.submit(settings.setup_commands())?;

    let report = simulation.last_report();
    info!(
        visible = report.visible,
        fill_ratio = report.fill_ratio(),
        "crowd placed"
    );
    if report.dance_floor.is_short() || report.general.is_short() {
        info!(
            dance_floor = report.dance_floor.fill_ratio(),
            general = report.general.fill_ratio(),
            "venue could not hold the full crowd"
        );
    }

    simulation.play(settings.frames, settings.fps)?;
    Ok(Summary::collect(&simulation))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Entry point for the venue crowd command-line interface.
fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing();

    let file = match &args.config {
        Some(path) => FileConfig::load(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => FileConfig::default(),
    };
    let settings = Settings::resolve(&args, &file)?;
    info!(
        mode = ?settings.mode,
        capacity = settings.capacity,
        frames = settings.frames,
        "starting headless crowd run"
    );

    let summary = run(&settings)?;
    match args.format {
        OutputFormat::Text => println!("{}", summary.render_text()),
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("failed to serialise summary")?
        ),
    }
    Ok(())
}
