//! tickbucket demo entry point.
//!
//! Runs a small tick loop on top of the scheduling library:
//!
//! 1. Load settings from an INI file (see [`SchedulerConfig`]), then apply CLI overrides
//! 2. Install a bucketed update service as the thread default
//! 3. Spawn countdowns with random lifetimes spread over four update groups
//! 4. Start one property animation and a tick proxy
//! 5. Pause the configured groups, tick, collect garbage periodically
//! 6. Print a JSON summary of the run
//!
//! # Running
//!
//! ```sh
//! cargo run --release -- --manual --ticks 120 --seed 7
//! RUST_LOG=debug cargo run -- --config tickbucket.ini
//! ```

use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;

use clap::Parser;
use serde::Serialize;

use tickbucket::components::ttl::Ttl;
use tickbucket::components::updatable::{GroupId, Updatable, spawn};
use tickbucket::components::updateproxy::UpdateProxy;
use tickbucket::error::SchedulerResult;
use tickbucket::resources::animator::PropertyAnimator;
use tickbucket::resources::locator::{GlobalLocator, set_default_bucket_service};
use tickbucket::resources::schedulerconfig::SchedulerConfig;
use tickbucket::systems::bucketupdateservice::BucketUpdateService;
use tickbucket::systems::ticksource::{LiveTickSource, ManualTickSource, TickSource};

/// Update groups the demo spreads its countdowns over.
const DEMO_GROUPS: GroupId = 4;

/// tickbucket scheduler demo
#[derive(Parser)]
#[command(version, about = "Drives countdowns and an animation through a bucketed update service.")]
struct Cli {
    /// INI configuration file.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Number of ticks to run (overrides the config).
    #[arg(long)]
    ticks: Option<u64>,

    /// Milliseconds between ticks (overrides the config).
    #[arg(long, value_name = "MS")]
    interval_ms: Option<u64>,

    /// Advance time by hand instead of waiting on a timer.
    #[arg(long)]
    manual: bool,

    /// Seed for countdown lifetimes.
    #[arg(long)]
    seed: Option<u64>,

    /// Print the effective configuration as JSON and exit.
    #[arg(long)]
    print_config: bool,
}

#[derive(Serialize)]
struct GroupSummary {
    id: GroupId,
    paused: bool,
    entries: usize,
}

#[derive(Serialize)]
struct RunSummary {
    ticks: u64,
    proxied_ticks: u64,
    countdowns_spawned: u32,
    countdowns_expired: u32,
    garbage_collected: usize,
    animation_finished: bool,
    animation_value: f64,
    groups: Vec<GroupSummary>,
}

/// The concrete source behind the shared `Rc<dyn TickSource>`.
enum Driver {
    Manual(Rc<ManualTickSource>),
    Live(Rc<LiveTickSource>),
}

impl Driver {
    fn new(config: &SchedulerConfig) -> SchedulerResult<Self> {
        if config.manual {
            Ok(Driver::Manual(ManualTickSource::shared()))
        } else {
            Ok(Driver::Live(Rc::new(LiveTickSource::new(config.interval_ms)?)))
        }
    }

    fn source(&self) -> Rc<dyn TickSource> {
        match self {
            Driver::Manual(source) => source.clone(),
            Driver::Live(source) => source.clone(),
        }
    }

    fn step(&self, interval_ms: u64) {
        match self {
            Driver::Manual(source) => {
                source.advance(interval_ms as f64);
            }
            Driver::Live(source) => source.run_for(1),
        }
    }
}

fn load_config(cli: &Cli) -> SchedulerConfig {
    let mut config = match &cli.config {
        Some(path) => SchedulerConfig::with_path(path),
        None => SchedulerConfig::new(),
    };
    if let Err(e) = config.load_from_file() {
        // Missing or unreadable file: keep the defaults.
        log::warn!("{}; using defaults", e);
    }

    if let Some(ticks) = cli.ticks {
        config.total_ticks = ticks;
    }
    if let Some(interval) = cli.interval_ms {
        config.interval_ms = interval;
    }
    if cli.manual {
        config.manual = true;
    }
    config
}

fn run(config: &SchedulerConfig, seed: Option<u64>) -> SchedulerResult<RunSummary> {
    let driver = Driver::new(config)?;
    let bucket = BucketUpdateService::shared(driver.source());
    set_default_bucket_service(Some(bucket.clone()));

    let mut rng = match seed {
        Some(seed) => fastrand::Rng::with_seed(seed),
        None => fastrand::Rng::new(),
    };

    // --------------- Countdowns ---------------
    let expired = Rc::new(Cell::new(0u32));
    let mut countdowns = Vec::with_capacity(config.countdowns as usize);
    for i in 0..config.countdowns {
        let group = i as GroupId % DEMO_GROUPS;
        let lifetime = rng.u64(config.lifetime_range()) as f64;
        let ttl = spawn(Ttl::in_group(lifetime, group)?, Some(&GlobalLocator));
        let counter = expired.clone();
        ttl.borrow_mut()
            .core_mut()
            .on_expired(move |_| counter.set(counter.get() + 1));
        countdowns.push(ttl);
    }
    log::info!("Spawned {} countdowns", countdowns.len());

    // --------------- Animation + proxy ---------------
    let value = Rc::new(Cell::new(0.0));
    let sink = value.clone();
    let animation = PropertyAnimator::animate(
        move |v| sink.set(v),
        0.0,
        100.0,
        config.animation_duration_ms,
        config.animation_easing,
    )?;

    let proxied = Rc::new(Cell::new(0u64));
    let proxy = spawn(UpdateProxy::new(0), Some(&GlobalLocator));
    let seen = proxied.clone();
    proxy.borrow_mut().subscribe(move |_| seen.set(seen.get() + 1));

    for &group in &config.paused_groups {
        bucket.pause(group);
    }

    // --------------- Tick loop ---------------
    let mut garbage_collected = 0;
    for tick in 1..=config.total_ticks {
        driver.step(config.interval_ms);

        if config.gc_every_ticks > 0 && tick % config.gc_every_ticks == 0 {
            // Release finished countdowns so the sweep has something to purge.
            countdowns.retain(|c| !c.borrow().is_expired());
            garbage_collected += bucket.collect_garbage();
        }
    }

    if animation.is_resolved() {
        log::info!("Animation {} finished", animation.id());
    }

    let groups = bucket
        .group_ids()
        .into_iter()
        .map(|id| GroupSummary {
            id,
            paused: bucket.is_paused(id),
            entries: bucket.get(id).map_or(0, |s| s.len()),
        })
        .collect();

    set_default_bucket_service(None);

    Ok(RunSummary {
        ticks: config.total_ticks,
        proxied_ticks: proxied.get(),
        countdowns_spawned: config.countdowns,
        countdowns_expired: expired.get(),
        garbage_collected,
        animation_finished: animation.is_resolved(),
        animation_value: value.get(),
        groups,
    })
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = load_config(&cli);

    if cli.print_config {
        match serde_json::to_string_pretty(&config) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    let summary = match run(&config, cli.seed) {
        Ok(summary) => summary,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    match serde_json::to_string_pretty(&summary) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
