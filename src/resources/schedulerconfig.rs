//! Scheduler configuration resource.
//!
//! Holds the knobs of a tick loop loaded from an INI configuration file.
//! Provides defaults for safe startup and methods to load/save configuration.
//!
//! # Configuration File Format
//!
//! ```ini
//! [ticks]
//! interval_ms = 16
//! total_ticks = 240
//! manual = false
//!
//! [groups]
//! paused = 2,3
//!
//! [gc]
//! every_ticks = 60
//!
//! [animation]
//! easing = QuadEaseOut
//! duration_ms = 1000
//!
//! [countdowns]
//! count = 16
//! min_lifetime_ms = 100
//! max_lifetime_ms = 2000
//! ```

use std::path::PathBuf;

use configparser::ini::Ini;
use log::{info, warn};
use serde::Serialize;

use crate::components::tween::EasingFunctionId;
use crate::components::updatable::GroupId;

/// Default safe values for startup
const DEFAULT_INTERVAL_MS: u64 = 16;
const DEFAULT_TOTAL_TICKS: u64 = 240;
const DEFAULT_MANUAL: bool = false;
const DEFAULT_GC_EVERY_TICKS: u64 = 60;
const DEFAULT_ANIMATION_EASING: EasingFunctionId = EasingFunctionId::QuadEaseOut;
const DEFAULT_ANIMATION_DURATION_MS: f64 = 1000.0;
const DEFAULT_COUNTDOWNS: u32 = 16;
const DEFAULT_MIN_LIFETIME_MS: u64 = 100;
const DEFAULT_MAX_LIFETIME_MS: u64 = 2000;
const DEFAULT_CONFIG_PATH: &str = "./tickbucket.ini";

/// Scheduler configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchedulerConfig {
    /// Milliseconds between live ticks.
    pub interval_ms: u64,
    /// Ticks to run before stopping.
    pub total_ticks: u64,
    /// Drive the loop with a manual source instead of a timer.
    pub manual: bool,
    /// Update groups paused at startup.
    pub paused_groups: Vec<GroupId>,
    /// Garbage-collect every N ticks; 0 disables periodic collection.
    pub gc_every_ticks: u64,
    /// Curve used by the demo animation.
    pub animation_easing: EasingFunctionId,
    pub animation_duration_ms: f64,
    /// Number of countdowns spawned at startup.
    pub countdowns: u32,
    pub min_lifetime_ms: u64,
    pub max_lifetime_ms: u64,
    /// Path to the configuration file.
    pub config_path: PathBuf,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl SchedulerConfig {
    /// Create a new configuration with safe default values.
    pub fn new() -> Self {
        Self {
            interval_ms: DEFAULT_INTERVAL_MS,
            total_ticks: DEFAULT_TOTAL_TICKS,
            manual: DEFAULT_MANUAL,
            paused_groups: Vec::new(),
            gc_every_ticks: DEFAULT_GC_EVERY_TICKS,
            animation_easing: DEFAULT_ANIMATION_EASING,
            animation_duration_ms: DEFAULT_ANIMATION_DURATION_MS,
            countdowns: DEFAULT_COUNTDOWNS,
            min_lifetime_ms: DEFAULT_MIN_LIFETIME_MS,
            max_lifetime_ms: DEFAULT_MAX_LIFETIME_MS,
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    /// Create a new configuration with a custom config file path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Load configuration from the INI file.
    ///
    /// Missing values retain their current (default) values. Values that do
    /// not parse are logged and skipped.
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(&mut self) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .load(&self.config_path)
            .map_err(|e| format!("Failed to load config file: {}", e))?;

        // [ticks] section
        if let Some(interval) = config.getuint("ticks", "interval_ms").ok().flatten() {
            self.interval_ms = interval;
        }
        if let Some(total) = config.getuint("ticks", "total_ticks").ok().flatten() {
            self.total_ticks = total;
        }
        if let Some(manual) = config.getbool("ticks", "manual").ok().flatten() {
            self.manual = manual;
        }

        // [groups] section
        if let Some(paused) = config.get("groups", "paused") {
            self.paused_groups = parse_group_list(&paused);
        }

        // [gc] section
        if let Some(every) = config.getuint("gc", "every_ticks").ok().flatten() {
            self.gc_every_ticks = every;
        }

        // [animation] section
        if let Some(easing) = config.get("animation", "easing") {
            match easing.parse() {
                Ok(id) => self.animation_easing = id,
                Err(e) => warn!("Ignoring [animation] easing: {}", e),
            }
        }
        if let Some(duration) = config.getfloat("animation", "duration_ms").ok().flatten() {
            self.animation_duration_ms = duration;
        }

        // [countdowns] section
        if let Some(count) = config.getuint("countdowns", "count").ok().flatten() {
            self.countdowns = count as u32;
        }
        if let Some(min) = config.getuint("countdowns", "min_lifetime_ms").ok().flatten() {
            self.min_lifetime_ms = min;
        }
        if let Some(max) = config.getuint("countdowns", "max_lifetime_ms").ok().flatten() {
            self.max_lifetime_ms = max;
        }

        info!(
            "Loaded config: interval={}ms, ticks={}, manual={}, paused={:?}, gc every {} ticks",
            self.interval_ms,
            self.total_ticks,
            self.manual,
            self.paused_groups,
            self.gc_every_ticks
        );

        Ok(())
    }

    /// Save configuration to the INI file.
    ///
    /// Creates the file if it doesn't exist.
    pub fn save_to_file(&self) -> Result<(), String> {
        let mut config = Ini::new();

        // [ticks] section
        config.set("ticks", "interval_ms", Some(self.interval_ms.to_string()));
        config.set("ticks", "total_ticks", Some(self.total_ticks.to_string()));
        config.set("ticks", "manual", Some(self.manual.to_string()));

        // [groups] section
        let paused: Vec<String> = self.paused_groups.iter().map(|g| g.to_string()).collect();
        config.set("groups", "paused", Some(paused.join(",")));

        // [gc] section
        config.set("gc", "every_ticks", Some(self.gc_every_ticks.to_string()));

        // [animation] section
        config.set("animation", "easing", Some(self.animation_easing.to_string()));
        config.set(
            "animation",
            "duration_ms",
            Some(self.animation_duration_ms.to_string()),
        );

        // [countdowns] section
        config.set("countdowns", "count", Some(self.countdowns.to_string()));
        config.set(
            "countdowns",
            "min_lifetime_ms",
            Some(self.min_lifetime_ms.to_string()),
        );
        config.set(
            "countdowns",
            "max_lifetime_ms",
            Some(self.max_lifetime_ms.to_string()),
        );

        config
            .write(&self.config_path)
            .map_err(|e| format!("Failed to save config file: {}", e))?;

        info!("Saved config to {:?}", self.config_path);

        Ok(())
    }

    /// Lifetime range for spawned countdowns, with the bounds ordered.
    pub fn lifetime_range(&self) -> std::ops::RangeInclusive<u64> {
        let lo = self.min_lifetime_ms.min(self.max_lifetime_ms).max(1);
        let hi = self.min_lifetime_ms.max(self.max_lifetime_ms).max(lo);
        lo..=hi
    }
}

/// Parses `"2, 3,x,-1"` into `[2, 3, -1]`, skipping entries that are not integers.
fn parse_group_list(raw: &str) -> Vec<GroupId> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| match s.parse::<GroupId>() {
            Ok(group) => Some(group),
            Err(_) => {
                warn!("Ignoring non-numeric group id '{}'", s);
                None
            }
        })
        .collect()
}
