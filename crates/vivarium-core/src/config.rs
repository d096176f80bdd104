//! Configuration loading and typed config structures for Vivarium.
//!
//! The canonical configuration lives in `vivarium-config.yaml` next to the
//! binary. Every section and every field is optional; omitted values take
//! the defaults below, which reproduce the stock tuning of the game.
//!
//! Intervals are given in minutes, thresholds and amounts in stat points.

use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveTime};
use rust_decimal::Decimal;
use serde::Deserialize;

/// Environment variable overriding [`StorageConfig::data_dir`].
pub const DATA_DIR_ENV: &str = "VIVARIUM_DATA_DIR";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration.
///
/// Mirrors the structure of `vivarium-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct VivariumConfig {
    /// Virtual clock settings.
    #[serde(default)]
    pub clock: ClockConfig,

    /// Poll loop settings.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Where state is kept.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Starting vitals for a newborn egg.
    #[serde(default)]
    pub newborn: NewbornConfig,

    /// Hunger decay and hunger penalty.
    #[serde(default)]
    pub hunger: HungerConfig,

    /// Weakness, life damage, and disease.
    #[serde(default)]
    pub wellness: WellnessConfig,

    /// Day/night and the light penalty.
    #[serde(default)]
    pub light: LightConfig,

    /// Low affection and leaving.
    #[serde(default)]
    pub affection: AffectionConfig,

    /// Dirty object spawn and punishment.
    #[serde(default)]
    pub dirt: DirtConfig,

    /// Sleep window.
    #[serde(default)]
    pub sleep: SleepConfig,

    /// Searching for a pet that left.
    #[serde(default)]
    pub search: SearchConfig,

    /// Touch interaction.
    #[serde(default)]
    pub touch: TouchConfig,
}

impl VivariumConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `VIVARIUM_DATA_DIR` overrides `storage.data_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Load `path` if it exists, otherwise use the defaults.
    ///
    /// # Errors
    ///
    /// Same as [`from_file`](Self::from_file) for a file that exists.
    pub fn from_file_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            let mut config = Self::default();
            config.storage.apply_env_overrides();
            Ok(config)
        }
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes as unit, not as an empty map.
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.storage.apply_env_overrides();
        Ok(config)
    }
}

/// Convert a minute count from config into a duration.
pub fn minutes(value: u32) -> Duration {
    Duration::minutes(i64::from(value))
}

// ---------------------------------------------------------------------------
// Runtime sections
// ---------------------------------------------------------------------------

/// Virtual clock configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ClockConfig {
    /// Minutes east of UTC for local time; `None` uses the host offset.
    #[serde(default)]
    pub utc_offset_minutes: Option<i32>,

    /// Pin the virtual clock to this RFC 3339 instant at startup.
    #[serde(default)]
    pub virtual_time: Option<String>,
}

/// Poll loop configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EngineConfig {
    /// Seconds between polls of the decay channels.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Seconds between polls of the sleep window.
    #[serde(default = "default_sleep_poll_interval_secs")]
    pub sleep_poll_interval_secs: u64,

    /// Random seed; `None` seeds from the OS.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Accept evolution offers without asking.
    #[serde(default)]
    pub auto_confirm_evolution: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            sleep_poll_interval_secs: default_sleep_poll_interval_secs(),
            seed: None,
            auto_confirm_evolution: false,
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StorageConfig {
    /// Directory holding one JSON document per key.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl StorageConfig {
    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Some(dir) = std::env::var(DATA_DIR_ENV).ok().filter(|dir| !dir.is_empty()) {
            self.data_dir = PathBuf::from(dir);
        }
    }
}

/// Starting vitals for a newborn.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewbornConfig {
    /// Starting and maximum health.
    #[serde(default = "default_hundred")]
    pub health: u32,

    /// Starting and maximum hunger.
    #[serde(default = "default_hundred")]
    pub hunger: u32,

    /// Starting and maximum wellness.
    #[serde(default = "default_hundred")]
    pub wellness: u32,

    /// Starting friendship.
    #[serde(default = "default_newborn_friendship")]
    pub friendship: u32,

    /// Maximum friendship.
    #[serde(default = "default_hundred")]
    pub max_friendship: u32,
}

impl Default for NewbornConfig {
    fn default() -> Self {
        Self {
            health: default_hundred(),
            hunger: default_hundred(),
            wellness: default_hundred(),
            friendship: default_newborn_friendship(),
            max_friendship: default_hundred(),
        }
    }
}

// ---------------------------------------------------------------------------
// Channel sections
// ---------------------------------------------------------------------------

/// Hunger decay and hunger penalty tuning.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HungerConfig {
    /// Minutes per hunger decay tick.
    #[serde(default = "default_sixty")]
    pub decay_interval_minutes: u32,

    /// Minutes per hunger penalty tick.
    #[serde(default = "default_sixty")]
    pub penalty_interval_minutes: u32,

    /// Hunger at or below which the pet is hungry.
    #[serde(default = "default_hungry_threshold")]
    pub hungry_threshold: u32,

    /// Hunger at or below which the pet is starving.
    #[serde(default = "default_starving_threshold")]
    pub starving_threshold: u32,

    /// Per-tick (friendship, wellness) loss while hungry.
    #[serde(default = "default_hungry_loss")]
    pub hungry_loss: (u32, u32),

    /// Per-tick (friendship, wellness) loss while starving.
    #[serde(default = "default_starving_loss")]
    pub starving_loss: (u32, u32),
}

impl Default for HungerConfig {
    fn default() -> Self {
        Self {
            decay_interval_minutes: default_sixty(),
            penalty_interval_minutes: default_sixty(),
            hungry_threshold: default_hungry_threshold(),
            starving_threshold: default_starving_threshold(),
            hungry_loss: default_hungry_loss(),
            starving_loss: default_starving_loss(),
        }
    }
}

/// A wellness band with its own damage cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DamageBand {
    /// Lowest wellness in the band, inclusive.
    pub min: u32,
    /// Highest wellness in the band, inclusive.
    pub max: u32,
    /// Minutes per tick.
    pub interval_minutes: u32,
    /// Health lost per tick.
    #[serde(default)]
    pub health_loss: u32,
    /// Maximum health lost per tick.
    #[serde(default)]
    pub max_health_loss: u32,
}

impl DamageBand {
    /// Whether `wellness` falls inside this band.
    pub const fn contains(&self, wellness: u32) -> bool {
        wellness >= self.min && wellness <= self.max
    }
}

/// Find the first band containing `wellness`.
pub fn band_for(bands: &[DamageBand], wellness: u32) -> Option<&DamageBand> {
    bands.iter().find(|band| band.contains(wellness))
}

/// Relative weights of the disease lottery outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DiseaseWeights {
    /// Weight of contracting a headache.
    pub headache: u32,
    /// Weight of contracting diarrhea.
    pub diarrhea: u32,
    /// Weight of contracting a gastric ulcer.
    pub gastric_ulcer: u32,
    /// Weight of contracting flu.
    pub flu: u32,
    /// Weight of losing wellness instead of falling ill.
    pub wellness_drop: u32,
    /// Weight of nothing happening.
    pub nothing: u32,
}

impl Default for DiseaseWeights {
    fn default() -> Self {
        Self {
            headache: 15,
            diarrhea: 15,
            gastric_ulcer: 15,
            flu: 15,
            wellness_drop: 15,
            nothing: 25,
        }
    }
}

impl DiseaseWeights {
    /// Sum of all weights.
    pub const fn total(&self) -> u32 {
        self.headache
            .saturating_add(self.diarrhea)
            .saturating_add(self.gastric_ulcer)
            .saturating_add(self.flu)
            .saturating_add(self.wellness_drop)
            .saturating_add(self.nothing)
    }
}

/// Wellness-driven tuning.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WellnessConfig {
    /// Wellness below which the pet is weak.
    #[serde(default = "default_weak_threshold")]
    pub weak_threshold: u32,

    /// Life damage bands, checked in order.
    #[serde(default = "default_damage_bands")]
    pub damage_bands: Vec<DamageBand>,

    /// Disease lottery bands; only `min`, `max` and the interval matter.
    #[serde(default = "default_lottery_bands")]
    pub lottery_bands: Vec<DamageBand>,

    /// Lottery outcome weights.
    #[serde(default)]
    pub disease_weights: DiseaseWeights,

    /// Wellness lost on a "wellness drop" lottery outcome.
    #[serde(default = "default_five")]
    pub lottery_wellness_drop: u32,

    /// Minutes per disease damage tick.
    #[serde(default = "default_sixty")]
    pub disease_damage_interval_minutes: u32,
}

impl Default for WellnessConfig {
    fn default() -> Self {
        Self {
            weak_threshold: default_weak_threshold(),
            damage_bands: default_damage_bands(),
            lottery_bands: default_lottery_bands(),
            disease_weights: DiseaseWeights::default(),
            lottery_wellness_drop: default_five(),
            disease_damage_interval_minutes: default_sixty(),
        }
    }
}

/// Light and day/night tuning. Hours are local, half-open `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LightConfig {
    /// Minutes per light penalty tick.
    #[serde(default = "default_thirty")]
    pub interval_minutes: u32,

    /// First hour of the window in which darkness is penalised.
    #[serde(default = "default_active_start_hour")]
    pub active_start_hour: u32,

    /// Hour at which the penalised window ends.
    #[serde(default = "default_active_end_hour")]
    pub active_end_hour: u32,

    /// First daylight hour.
    #[serde(default = "default_day_start_hour")]
    pub day_start_hour: u32,

    /// Hour at which daylight ends.
    #[serde(default = "default_day_end_hour")]
    pub day_end_hour: u32,

    /// Friendship lost per tick in the dark.
    #[serde(default = "default_two")]
    pub friendship_loss: u32,

    /// Wellness lost per tick in the dark.
    #[serde(default = "default_one")]
    pub wellness_loss: u32,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            interval_minutes: default_thirty(),
            active_start_hour: default_active_start_hour(),
            active_end_hour: default_active_end_hour(),
            day_start_hour: default_day_start_hour(),
            day_end_hour: default_day_end_hour(),
            friendship_loss: default_two(),
            wellness_loss: default_one(),
        }
    }
}

/// Affection tuning.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AffectionConfig {
    /// Minutes per low-affection tick.
    #[serde(default = "default_twenty")]
    pub interval_minutes: u32,

    /// Friendship at or below which affection is low.
    #[serde(default = "default_low_affection_threshold")]
    pub low_threshold: u32,

    /// Wellness lost per tick while affection is low.
    #[serde(default = "default_two")]
    pub wellness_loss: u32,

    /// Friendship below which the pet leaves.
    #[serde(default = "default_leaving_threshold")]
    pub leaving_threshold: u32,
}

impl Default for AffectionConfig {
    fn default() -> Self {
        Self {
            interval_minutes: default_twenty(),
            low_threshold: default_low_affection_threshold(),
            wellness_loss: default_two(),
            leaving_threshold: default_leaving_threshold(),
        }
    }
}

/// Dirty object tuning.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DirtConfig {
    /// Minutes per spawn tick.
    #[serde(default = "default_sixty")]
    pub spawn_interval_minutes: u32,

    /// Minutes between punishments per object (also the grace period).
    #[serde(default = "default_twenty")]
    pub punish_interval_minutes: u32,

    /// Wellness lost per object per punishment.
    #[serde(default = "default_one")]
    pub wellness_loss: u32,

    /// Friendship lost per object per punishment.
    #[serde(default = "default_one")]
    pub friendship_loss: u32,
}

impl Default for DirtConfig {
    fn default() -> Self {
        Self {
            spawn_interval_minutes: default_sixty(),
            punish_interval_minutes: default_twenty(),
            wellness_loss: default_one(),
            friendship_loss: default_one(),
        }
    }
}

/// Sleep window tuning, in local time.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SleepConfig {
    /// Start of the night window, inclusive.
    #[serde(default = "default_night_start")]
    pub night_start: NaiveTime,

    /// End of the night window, exclusive; the morning wake-up time.
    #[serde(default = "default_night_end")]
    pub night_end: NaiveTime,
}

impl Default for SleepConfig {
    fn default() -> Self {
        Self {
            night_start: default_night_start(),
            night_end: default_night_end(),
        }
    }
}

/// Search tuning. Percentages are out of 100.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SearchConfig {
    /// Attempts before the search locks.
    #[serde(default = "default_twenty")]
    pub max_attempts: u32,

    /// Seconds between attempts.
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u32,

    /// Chance an attempt brings the pet home.
    #[serde(default = "default_return_percent")]
    pub return_percent: u32,

    /// Chance an attempt loses the pet for good.
    #[serde(default = "default_lost_percent")]
    pub lost_percent: u32,

    /// Minutes after the cap before attempts reset.
    #[serde(default = "default_sixty")]
    pub reset_minutes: u32,

    /// Friendship restored on return.
    #[serde(default = "default_fifty")]
    pub return_friendship: u32,

    /// Health floor applied on return.
    #[serde(default = "default_fifty")]
    pub return_health_floor: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_twenty(),
            cooldown_secs: default_cooldown_secs(),
            return_percent: default_return_percent(),
            lost_percent: default_lost_percent(),
            reset_minutes: default_sixty(),
            return_friendship: default_fifty(),
            return_health_floor: default_fifty(),
        }
    }
}

/// Touch tuning. Percentages are out of 100.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TouchConfig {
    /// Touches per bucket.
    #[serde(default = "default_twenty")]
    pub max_touches: u32,

    /// Seconds between touches.
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u32,

    /// Friendship gained per touch.
    #[serde(default = "default_friendship_gain")]
    pub friendship_gain: Decimal,

    /// Chance a rewarding touch also yields coins.
    #[serde(default = "default_fifteen")]
    pub coin_percent: u32,

    /// Coins per bonus.
    #[serde(default = "default_one")]
    pub coins: u32,

    /// Minutes after the cap before the bucket refills.
    #[serde(default = "default_sixty")]
    pub reset_minutes: u32,

    /// Friendship above which a maxed child may evolve.
    #[serde(default = "default_evolution_friendship")]
    pub evolution_min_friendship: u32,

    /// Wellness above which a maxed child may evolve.
    #[serde(default = "default_evolution_wellness")]
    pub evolution_min_wellness: u32,

    /// Hours since hatching before evolution is possible.
    #[serde(default = "default_evolution_age_hours")]
    pub evolution_min_age_hours: u32,

    /// Chance of the evolution offer on an eligible touch.
    #[serde(default = "default_evolution_percent")]
    pub evolution_percent: u32,

    /// Chance of the "shy" flavour response on an eligible touch.
    #[serde(default = "default_shy_percent")]
    pub shy_percent: u32,
}

impl Default for TouchConfig {
    fn default() -> Self {
        Self {
            max_touches: default_twenty(),
            cooldown_secs: default_cooldown_secs(),
            friendship_gain: default_friendship_gain(),
            coin_percent: default_fifteen(),
            coins: default_one(),
            reset_minutes: default_sixty(),
            evolution_min_friendship: default_evolution_friendship(),
            evolution_min_wellness: default_evolution_wellness(),
            evolution_min_age_hours: default_evolution_age_hours(),
            evolution_percent: default_evolution_percent(),
            shy_percent: default_shy_percent(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (required by serde's `default = "..."` attribute)
// ---------------------------------------------------------------------------

const fn default_poll_interval_secs() -> u64 {
    30
}

const fn default_sleep_poll_interval_secs() -> u64 {
    1800
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("vivarium-data")
}

const fn default_one() -> u32 {
    1
}

const fn default_two() -> u32 {
    2
}

const fn default_five() -> u32 {
    5
}

const fn default_fifteen() -> u32 {
    15
}

const fn default_twenty() -> u32 {
    20
}

const fn default_thirty() -> u32 {
    30
}

const fn default_fifty() -> u32 {
    50
}

const fn default_sixty() -> u32 {
    60
}

const fn default_hundred() -> u32 {
    100
}

const fn default_newborn_friendship() -> u32 {
    50
}

const fn default_hungry_threshold() -> u32 {
    35
}

const fn default_starving_threshold() -> u32 {
    15
}

const fn default_hungry_loss() -> (u32, u32) {
    (5, 1)
}

const fn default_starving_loss() -> (u32, u32) {
    (15, 2)
}

const fn default_weak_threshold() -> u32 {
    40
}

fn default_damage_bands() -> Vec<DamageBand> {
    vec![
        DamageBand {
            min: 0,
            max: 0,
            interval_minutes: 10,
            health_loss: 10,
            max_health_loss: 5,
        },
        DamageBand {
            min: 1,
            max: 9,
            interval_minutes: 10,
            health_loss: 1,
            max_health_loss: 0,
        },
        DamageBand {
            min: 10,
            max: 39,
            interval_minutes: 30,
            health_loss: 1,
            max_health_loss: 0,
        },
    ]
}

fn default_lottery_bands() -> Vec<DamageBand> {
    [(1, 9, 10), (10, 29, 20), (30, 49, 30)]
        .into_iter()
        .map(|(min, max, interval_minutes)| DamageBand {
            min,
            max,
            interval_minutes,
            health_loss: 0,
            max_health_loss: 0,
        })
        .collect()
}

const fn default_active_start_hour() -> u32 {
    7
}

const fn default_active_end_hour() -> u32 {
    23
}

const fn default_day_start_hour() -> u32 {
    5
}

const fn default_day_end_hour() -> u32 {
    18
}

const fn default_low_affection_threshold() -> u32 {
    30
}

const fn default_leaving_threshold() -> u32 {
    10
}

fn default_night_start() -> NaiveTime {
    NaiveTime::from_hms_opt(22, 59, 0).unwrap_or(NaiveTime::MIN)
}

fn default_night_end() -> NaiveTime {
    NaiveTime::from_hms_opt(7, 0, 0).unwrap_or(NaiveTime::MIN)
}

const fn default_cooldown_secs() -> u32 {
    2
}

const fn default_return_percent() -> u32 {
    22
}

const fn default_lost_percent() -> u32 {
    13
}

fn default_friendship_gain() -> Decimal {
    Decimal::new(5, 2)
}

const fn default_evolution_friendship() -> u32 {
    70
}

const fn default_evolution_wellness() -> u32 {
    60
}

const fn default_evolution_age_hours() -> u32 {
    120
}

const fn default_evolution_percent() -> u32 {
    12
}

const fn default_shy_percent() -> u32 {
    10
}
