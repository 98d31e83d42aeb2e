use crate::registry::TableDefaults;
use blackjack_engine::rules::MAX_STAKE;
use blackjack_engine::table::{MAX_DECKS, MAX_SEATS, MIN_SEATS};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// A room opened when the server starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSpec {
    pub code: String,
    pub seats: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub min_bet: u64,
    pub decks: usize,
    pub turn_timeout_secs: u64,
    pub starting_balance: u64,
    pub seed: Option<u64>,
    pub round_log: Option<PathBuf>,
    pub rooms: Vec<RoomSpec>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8080,
            min_bet: 10,
            decks: 1,
            turn_timeout_secs: 30,
            starting_balance: 1_000,
            seed: None,
            round_log: None,
            rooms: vec![
                RoomSpec {
                    code: "roomy".into(),
                    seats: 6,
                },
                RoomSpec {
                    code: "another".into(),
                    seats: 4,
                },
            ],
        }
    }
}

impl AppConfig {
    pub fn turn_timeout(&self) -> Duration {
        Duration::from_secs(self.turn_timeout_secs)
    }

    pub fn table_defaults(&self) -> TableDefaults {
        TableDefaults {
            min_bet: self.min_bet,
            decks: self.decks,
            seed: self.seed,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_bet == 0 {
            return Err(ConfigError::Invalid("min_bet must be >0".into()));
        }
        if !(1..=MAX_DECKS).contains(&self.decks) {
            return Err(ConfigError::Invalid(format!(
                "decks must be between 1 and {MAX_DECKS}"
            )));
        }
        if self.turn_timeout_secs == 0 {
            return Err(ConfigError::Invalid("turn_timeout_secs must be >0".into()));
        }
        if self.starting_balance < self.min_bet {
            return Err(ConfigError::Invalid(
                "starting_balance must cover the minimum bet".into(),
            ));
        }
        if self.starting_balance > MAX_STAKE {
            return Err(ConfigError::Invalid(format!(
                "starting_balance must be at most {MAX_STAKE}"
            )));
        }
        for room in &self.rooms {
            if !(MIN_SEATS..=MAX_SEATS).contains(&room.seats) {
                return Err(ConfigError::Invalid(format!(
                    "room `{}` must have between {MIN_SEATS} and {MAX_SEATS} seats",
                    room.code
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueSource {
    Default,
    File,
    Env,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConfigSources {
    pub host: ValueSource,
    pub port: ValueSource,
    pub min_bet: ValueSource,
    pub decks: ValueSource,
    pub turn_timeout_secs: ValueSource,
    pub starting_balance: ValueSource,
    pub seed: ValueSource,
    pub round_log: ValueSource,
    pub rooms: ValueSource,
}

impl Default for ConfigSources {
    fn default() -> Self {
        Self {
            host: ValueSource::Default,
            port: ValueSource::Default,
            min_bet: ValueSource::Default,
            decks: ValueSource::Default,
            turn_timeout_secs: ValueSource::Default,
            starting_balance: ValueSource::Default,
            seed: ValueSource::Default,
            round_log: ValueSource::Default,
            rooms: ValueSource::Default,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfigResolved {
    pub config: AppConfig,
    pub sources: ConfigSources,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub const CONFIG_PATH_VAR: &str = "BLACKJACK_CONFIG";

pub fn load() -> Result<AppConfig, ConfigError> {
    load_with_sources().map(|resolved| resolved.config)
}

/// Defaults, then the TOML file named by `BLACKJACK_CONFIG`, then
/// `BLACKJACK_*` environment variables.
pub fn load_with_sources() -> Result<ConfigResolved, ConfigError> {
    let file = match std::env::var(CONFIG_PATH_VAR) {
        Ok(path) if !path.is_empty() => Some(fs::read_to_string(path)?),
        _ => None,
    };
    resolve(file.as_deref(), |key| std::env::var(key).ok())
}

/// Layers an optional TOML document and an environment lookup over the
/// defaults, then validates the result.
pub fn resolve<F>(file: Option<&str>, env: F) -> Result<ConfigResolved, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut cfg = AppConfig::default();
    let mut sources = ConfigSources::default();

    if let Some(text) = file {
        let f: FileConfig = toml::from_str(text)?;
        if let Some(v) = f.host {
            cfg.host = v;
            sources.host = ValueSource::File;
        }
        if let Some(v) = f.port {
            cfg.port = v;
            sources.port = ValueSource::File;
        }
        if let Some(v) = f.min_bet {
            cfg.min_bet = v;
            sources.min_bet = ValueSource::File;
        }
        if let Some(v) = f.decks {
            cfg.decks = v;
            sources.decks = ValueSource::File;
        }
        if let Some(v) = f.turn_timeout_secs {
            cfg.turn_timeout_secs = v;
            sources.turn_timeout_secs = ValueSource::File;
        }
        if let Some(v) = f.starting_balance {
            cfg.starting_balance = v;
            sources.starting_balance = ValueSource::File;
        }
        if let Some(v) = f.seed {
            cfg.seed = Some(v);
            sources.seed = ValueSource::File;
        }
        if let Some(v) = f.round_log {
            cfg.round_log = Some(v);
            sources.round_log = ValueSource::File;
        }
        if let Some(v) = f.rooms {
            cfg.rooms = v;
            sources.rooms = ValueSource::File;
        }
    }

    let var = |key: &str| env(key).filter(|v| !v.is_empty());

    if let Some(host) = var("BLACKJACK_HOST") {
        cfg.host = host;
        sources.host = ValueSource::Env;
    }
    if let Some(port) = var("BLACKJACK_PORT") {
        cfg.port = parse_env("BLACKJACK_PORT", &port)?;
        sources.port = ValueSource::Env;
    }
    if let Some(min_bet) = var("BLACKJACK_MIN_BET") {
        cfg.min_bet = parse_env("BLACKJACK_MIN_BET", &min_bet)?;
        sources.min_bet = ValueSource::Env;
    }
    if let Some(decks) = var("BLACKJACK_DECKS") {
        cfg.decks = parse_env("BLACKJACK_DECKS", &decks)?;
        sources.decks = ValueSource::Env;
    }
    if let Some(secs) = var("BLACKJACK_TURN_TIMEOUT_SECS") {
        cfg.turn_timeout_secs = parse_env("BLACKJACK_TURN_TIMEOUT_SECS", &secs)?;
        sources.turn_timeout_secs = ValueSource::Env;
    }
    if let Some(balance) = var("BLACKJACK_STARTING_BALANCE") {
        cfg.starting_balance = parse_env("BLACKJACK_STARTING_BALANCE", &balance)?;
        sources.starting_balance = ValueSource::Env;
    }
    if let Some(seed) = var("BLACKJACK_SEED") {
        cfg.seed = Some(parse_env("BLACKJACK_SEED", &seed)?);
        sources.seed = ValueSource::Env;
    }
    if let Some(path) = var("BLACKJACK_ROUND_LOG") {
        cfg.round_log = Some(PathBuf::from(path));
        sources.round_log = ValueSource::Env;
    }

    cfg.validate()?;
    Ok(ConfigResolved {
        config: cfg,
        sources,
    })
}

#[derive(Debug, Deserialize)]
struct FileConfig {
    #[serde(default)]
    host: Option<String>,
    #[serde(default)]
    port: Option<u16>,
    #[serde(default)]
    min_bet: Option<u64>,
    #[serde(default)]
    decks: Option<usize>,
    #[serde(default)]
    turn_timeout_secs: Option<u64>,
    #[serde(default)]
    starting_balance: Option<u64>,
    #[serde(default)]
    seed: Option<u64>,
    #[serde(default)]
    round_log: Option<PathBuf>,
    #[serde(default)]
    rooms: Option<Vec<RoomSpec>>,
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::Invalid(format!("{key}: cannot parse `{value}`")))
}
