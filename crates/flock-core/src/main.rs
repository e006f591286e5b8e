//! Flock Simulation Driver
//!
//! Headless host for the flocking core: builds a flock from a config and a
//! seed, ticks it a fixed number of times, and writes snapshots a renderer
//! or analysis script can replay.

use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

use flock_core::output::{
    write_current_state, SnapshotGenerator, SnapshotWriter, StatsCollector, SNAPSHOTS_FILE,
};
use flock_core::{default_config_toml, FlockConfig, SimError, Simulation};

/// Command line arguments for the simulation
#[derive(Parser, Debug)]
#[command(name = "flock_sim")]
#[command(about = "A headless boids flocking simulation")]
struct Args {
    /// Random seed for reproducibility
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Number of ticks to simulate
    #[arg(long, default_value_t = 1000)]
    ticks: u64,

    /// Number of boids (overrides the config file)
    #[arg(long)]
    population: Option<usize>,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Interval between snapshots (in ticks, 0 disables periodic snapshots)
    #[arg(long, default_value_t = 100)]
    snapshot_interval: u64,

    /// Output directory
    #[arg(long, default_value = "output")]
    output: PathBuf,

    /// Pace ticks to this many per second (results are unaffected)
    #[arg(long = "frame-rate", value_name = "HZ", value_parser = parse_frame_rate)]
    frame_time: Option<Duration>,

    /// Print the default configuration as TOML and exit
    #[arg(long)]
    print_default_config: bool,
}

/// Turn a `--frame-rate` in ticks per second into the time between ticks
fn parse_frame_rate(value: &str) -> Result<Duration, String> {
    let rate: f64 = value
        .parse()
        .map_err(|e| format!("`{}` is not a number: {}", value, e))?;
    if !(rate.is_finite() && rate > 0.0) {
        return Err(format!("frame rate must be positive and finite, got {}", rate));
    }
    Duration::try_from_secs_f64(1.0 / rate)
        .map_err(|_| format!("frame rate {} is too low to pace", rate))
}

/// Sleeps between ticks to hold a fixed rate
struct FramePacer {
    frame: Duration,
    next: Instant,
}

impl FramePacer {
    fn new(frame: Duration) -> Self {
        Self {
            frame,
            next: Instant::now(),
        }
    }

    fn wait(&mut self) {
        self.next += self.frame;
        let now = Instant::now();
        if self.next > now {
            std::thread::sleep(self.next - now);
        } else {
            // Running behind; don't try to catch up with a burst
            self.next = now;
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    if args.print_default_config {
        print!("{}", default_config_toml());
        return ExitCode::SUCCESS;
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_config(args: &Args) -> Result<FlockConfig, SimError> {
    let mut config = match &args.config {
        Some(path) => FlockConfig::from_file(path)?,
        None => FlockConfig::default(),
    };
    if let Some(population) = args.population {
        config.population = population;
    }
    Ok(config)
}

fn run(args: &Args) -> Result<(), SimError> {
    let config = load_config(args)?;

    tracing::info!(
        seed = args.seed,
        ticks = args.ticks,
        population = config.population,
        neighbor_search = ?config.runtime.neighbor_search,
        parallel = config.runtime.parallel,
        "starting flock simulation"
    );

    fs::create_dir_all(&args.output)?;
    let mut writer = SnapshotWriter::new(args.output.join(SNAPSHOTS_FILE))?;
    let mut generator = SnapshotGenerator::new(args.snapshot_interval);
    let mut stats = StatsCollector::new(args.snapshot_interval);
    let mut pacer = args.frame_time.map(FramePacer::new);

    let mut sim = Simulation::new(config, args.seed)?;

    // Initial snapshot
    emit_snapshot(&sim, &mut generator, &mut writer, &args.output, "simulation_start")?;

    // Main simulation loop
    for _ in 0..args.ticks {
        if let Err(e) = sim.tick() {
            // Keep what the renderer saw last before bailing
            writer.flush()?;
            return Err(e);
        }
        let tick = sim.current_tick();

        let metrics = sim.metrics();
        stats.record_tick(tick, &metrics);

        if generator.should_snapshot(tick) {
            emit_snapshot(&sim, &mut generator, &mut writer, &args.output, "periodic")?;
            tracing::info!(
                tick,
                mean_speed = metrics.mean_speed,
                mean_neighbors = metrics.mean_neighbors,
                outside_bounds = metrics.outside_bounds,
                "progress"
            );
        }

        if let Some(pacer) = pacer.as_mut() {
            pacer.wait();
        }
    }

    // Final snapshot
    if generator.last_snapshot_tick() != Some(sim.current_tick()) {
        emit_snapshot(&sim, &mut generator, &mut writer, &args.output, "simulation_end")?;
    }
    writer.flush()?;
    stats.write_stats(&args.output)?;

    tracing::info!(
        ticks = sim.current_tick(),
        snapshots = generator.snapshot_count(),
        output = %args.output.display(),
        "simulation complete"
    );
    Ok(())
}

fn emit_snapshot(
    sim: &Simulation,
    generator: &mut SnapshotGenerator,
    writer: &mut SnapshotWriter,
    output_dir: &Path,
    triggered_by: &str,
) -> Result<(), SimError> {
    let snapshot = sim.snapshot(generator.next_id(), triggered_by);
    writer.write(&snapshot)?;
    write_current_state(&snapshot, output_dir)?;
    generator.mark_snapshot(sim.current_tick());
    Ok(())
}
