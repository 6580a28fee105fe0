use std::{
    env, fmt,
    net::{AddrParseError, SocketAddr},
    str::FromStr,
};

use core_sim::{SimConfig, SimConfigError};

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_MODE: RunMode = RunMode::Report;
const DEFAULT_OUTPUT_DIR: &str = "artifacts";
const DEFAULT_PARALLEL: bool = false;

const ENV_ADDR: &str = "LAB_SERVER_ADDR";
const ENV_MODE: &str = "LAB_MODE";
const ENV_OUTPUT_DIR: &str = "LAB_OUTPUT_DIR";
const ENV_PARALLEL: &str = "LAB_PARALLEL";
const ENV_MEAN_DAILY_CHANGE: &str = "LAB_MEAN_DAILY_CHANGE";
const ENV_STDEV_DAILY_CHANGE: &str = "LAB_STDEV_DAILY_CHANGE";
const ENV_INITIAL_VALUE: &str = "LAB_INITIAL_VALUE";
const ENV_NUM_TICKS: &str = "LAB_NUM_TICKS";
const ENV_LEVERAGE: &str = "LAB_LEVERAGE";
const ENV_NUM_RUNS: &str = "LAB_NUM_RUNS";
const ENV_SEED: &str = "LAB_SEED";
const ENV_FLOOR_AT_ZERO: &str = "LAB_FLOOR_AT_ZERO";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Report,
    Serve,
}

impl RunMode {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "report" => Some(Self::Report),
            "serve" => Some(Self::Serve),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Report => "report",
            Self::Serve => "serve",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub mode: RunMode,
    pub output_dir: String,
    pub parallel: bool,
    pub simulation: SimConfig,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidListenAddr(AddrParseError),
    InvalidMode,
    InvalidOutputDir,
    InvalidParallel,
    InvalidFloorAtZero,
    InvalidNumber { key: &'static str },
    InvalidSimulation(SimConfigError),
    NonUnicode { key: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidListenAddr(err) => {
                write!(f, "{ENV_ADDR} is not a valid socket address: {err}")
            }
            Self::InvalidMode => write!(f, "{ENV_MODE} must be one of: report, serve"),
            Self::InvalidOutputDir => {
                write!(f, "{ENV_OUTPUT_DIR} must not be empty or whitespace")
            }
            Self::InvalidParallel => write!(f, "{ENV_PARALLEL} must be true or false"),
            Self::InvalidFloorAtZero => write!(f, "{ENV_FLOOR_AT_ZERO} must be true or false"),
            Self::InvalidNumber { key } => write!(f, "{key} must be a finite number"),
            Self::InvalidSimulation(err) => write!(f, "simulation parameters rejected: {err}"),
            Self::NonUnicode { key } => write!(f, "{key} contains non-unicode data"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidListenAddr(err) => Some(err),
            Self::InvalidSimulation(err) => Some(err),
            _ => None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let listen_addr = match read_env(ENV_ADDR)? {
            Some(value) => value.parse().map_err(ConfigError::InvalidListenAddr)?,
            None => DEFAULT_LISTEN_ADDR
                .parse()
                .expect("default listen address must be valid"),
        };

        let mode = match read_env(ENV_MODE)? {
            Some(value) => RunMode::parse(value.as_str()).ok_or(ConfigError::InvalidMode)?,
            None => DEFAULT_MODE,
        };

        let output_dir = match read_env(ENV_OUTPUT_DIR)? {
            Some(value) if value.trim().is_empty() => return Err(ConfigError::InvalidOutputDir),
            Some(value) => value,
            None => DEFAULT_OUTPUT_DIR.to_owned(),
        };

        let parallel = match read_env(ENV_PARALLEL)? {
            Some(value) => parse_bool(value.as_str()).ok_or(ConfigError::InvalidParallel)?,
            None => DEFAULT_PARALLEL,
        };

        let defaults = SimConfig::default();
        let simulation = SimConfig {
            mean_daily_change: parse_f64_env(ENV_MEAN_DAILY_CHANGE, defaults.mean_daily_change)?,
            stdev_daily_change: parse_f64_env(ENV_STDEV_DAILY_CHANGE, defaults.stdev_daily_change)?,
            initial_value: parse_f64_env(ENV_INITIAL_VALUE, defaults.initial_value)?,
            num_ticks: parse_number_env(ENV_NUM_TICKS, defaults.num_ticks)?,
            leverage: parse_f64_env(ENV_LEVERAGE, defaults.leverage)?,
            num_runs: parse_number_env(ENV_NUM_RUNS, defaults.num_runs)?,
            seed: match read_env(ENV_SEED)? {
                Some(value) => Some(
                    value
                        .parse()
                        .map_err(|_| ConfigError::InvalidNumber { key: ENV_SEED })?,
                ),
                None => defaults.seed,
            },
            floor_at_zero: match read_env(ENV_FLOOR_AT_ZERO)? {
                Some(value) => {
                    parse_bool(value.as_str()).ok_or(ConfigError::InvalidFloorAtZero)?
                }
                None => defaults.floor_at_zero,
            },
        };
        simulation
            .validate()
            .map_err(ConfigError::InvalidSimulation)?;

        Ok(Self {
            listen_addr,
            mode,
            output_dir,
            parallel,
            simulation,
        })
    }
}

fn read_env(key: &'static str) -> Result<Option<String>, ConfigError> {
    match env::var(key) {
        Ok(value) => Ok(Some(value)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => Err(ConfigError::NonUnicode { key }),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

fn parse_f64_env(key: &'static str, default_value: f64) -> Result<f64, ConfigError> {
    let parsed = parse_number_env(key, default_value)?;
    if !parsed.is_finite() {
        return Err(ConfigError::InvalidNumber { key });
    }
    Ok(parsed)
}

fn parse_number_env<T: FromStr>(key: &'static str, default_value: T) -> Result<T, ConfigError> {
    match read_env(key)? {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { key }),
        None => Ok(default_value),
    }
}
