//! Engine configuration
//!
//! Every tunable constant of the analytics engine lives here.
//!
//! ## Configuration Resolution
//!
//! Config is loaded with a two-layer resolution:
//! 1. Check for an override file (explicit path, else
//!    ~/.local/share/flowcast/engine.toml)
//! 2. Fall back to embedded defaults (compiled into binary)

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/engine.toml");

/// Growth-rate estimation settings
#[derive(Debug, Clone, PartialEq)]
pub struct GrowthConfig {
    pub dampening: f64,
    pub default_rate: f64,
    pub clamp: f64,
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self {
            dampening: 0.7,
            default_rate: 0.02,
            clamp: 0.5,
        }
    }
}

/// Deterministic forecast settings
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastConfig {
    pub lookback_months: u32,
    pub band_width: f64,
    pub uncertainty_per_month: f64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            lookback_months: 12,
            band_width: 1.5,
            uncertainty_per_month: 0.1,
        }
    }
}

/// Monte Carlo simulation settings
#[derive(Debug, Clone, PartialEq)]
pub struct MonteCarloConfig {
    pub default_simulations: usize,
    pub max_simulations: usize,
    pub batch_size: usize,
    pub fixed_noise: f64,
    pub volatility_floor_ratio: f64,
    pub min_volatility: f64,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            default_simulations: 1000,
            max_simulations: 100_000,
            batch_size: 1000,
            fixed_noise: 0.02,
            volatility_floor_ratio: 0.10,
            min_volatility: 100.0,
        }
    }
}

/// Upper bounds on request parameters
#[derive(Debug, Clone, PartialEq)]
pub struct LimitsConfig {
    pub max_days_back: u32,
    pub max_periods_back: u32,
    pub max_months_back: u32,
    /// Horizon cap for projections and simulations
    pub max_months_ahead: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_days_back: 3660,
            max_periods_back: 520,
            max_months_back: 240,
            max_months_ahead: 120,
        }
    }
}

/// Full engine configuration
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub growth: GrowthConfig,
    /// Percent change beyond which a series counts as moving up or down
    pub trend_threshold_pct: f64,
    pub forecast: ForecastConfig,
    pub monte_carlo: MonteCarloConfig,
    pub limits: LimitsConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            growth: GrowthConfig::default(),
            trend_threshold_pct: 5.0,
            forecast: ForecastConfig::default(),
            monte_carlo: MonteCarloConfig::default(),
            limits: LimitsConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load from the override path if it exists, else the default location,
    /// else the embedded defaults
    pub fn load(override_path: Option<&Path>) -> Result<Self> {
        let path = override_path
            .map(Path::to_path_buf)
            .or_else(default_config_path)
            .filter(|p| p.exists());

        let content = match path {
            Some(ref p) => {
                debug!(path = %p.display(), "Loading engine config override");
                fs::read_to_string(p)
                    .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?
            }
            None => DEFAULT_CONFIG.to_string(),
        };

        parse_config(&content)
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("flowcast").join("engine.toml"))
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawConfig {
    growth: Option<RawGrowth>,
    trend: Option<RawTrend>,
    forecast: Option<RawForecast>,
    monte_carlo: Option<RawMonteCarlo>,
    limits: Option<RawLimits>,
}

#[derive(Debug, Deserialize)]
struct RawGrowth {
    dampening: Option<f64>,
    default_rate: Option<f64>,
    clamp: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawTrend {
    threshold_pct: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawForecast {
    lookback_months: Option<u32>,
    band_width: Option<f64>,
    uncertainty_per_month: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawMonteCarlo {
    default_simulations: Option<usize>,
    max_simulations: Option<usize>,
    batch_size: Option<usize>,
    fixed_noise: Option<f64>,
    volatility_floor_ratio: Option<f64>,
    min_volatility: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawLimits {
    max_days_back: Option<u32>,
    max_periods_back: Option<u32>,
    max_months_back: Option<u32>,
    max_months_ahead: Option<u32>,
}

/// Parse config from TOML content
pub fn parse_config(content: &str) -> Result<EngineConfig> {
    let raw: RawConfig = toml::from_str(content)
        .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

    let mut config = EngineConfig::default();

    if let Some(growth) = raw.growth {
        if let Some(v) = growth.dampening {
            config.growth.dampening = v;
        }
        if let Some(v) = growth.default_rate {
            config.growth.default_rate = v;
        }
        if let Some(v) = growth.clamp {
            config.growth.clamp = v.abs();
        }
    }

    if let Some(trend) = raw.trend {
        if let Some(v) = trend.threshold_pct {
            config.trend_threshold_pct = v.abs();
        }
    }

    if let Some(forecast) = raw.forecast {
        if let Some(v) = forecast.lookback_months {
            config.forecast.lookback_months = v.max(1);
        }
        if let Some(v) = forecast.band_width {
            config.forecast.band_width = v;
        }
        if let Some(v) = forecast.uncertainty_per_month {
            config.forecast.uncertainty_per_month = v;
        }
    }

    if let Some(mc) = raw.monte_carlo {
        if let Some(v) = mc.default_simulations {
            config.monte_carlo.default_simulations = v.max(1);
        }
        if let Some(v) = mc.max_simulations {
            config.monte_carlo.max_simulations = v.max(1);
        }
        if let Some(v) = mc.batch_size {
            config.monte_carlo.batch_size = v.max(1);
        }
        if let Some(v) = mc.fixed_noise {
            config.monte_carlo.fixed_noise = v;
        }
        if let Some(v) = mc.volatility_floor_ratio {
            config.monte_carlo.volatility_floor_ratio = v;
        }
        if let Some(v) = mc.min_volatility {
            config.monte_carlo.min_volatility = v;
        }
    }

    if let Some(limits) = raw.limits {
        if let Some(v) = limits.max_days_back {
            config.limits.max_days_back = v.max(1);
        }
        if let Some(v) = limits.max_periods_back {
            config.limits.max_periods_back = v.max(1);
        }
        if let Some(v) = limits.max_months_back {
            config.limits.max_months_back = v.max(1);
        }
        if let Some(v) = limits.max_months_ahead {
            config.limits.max_months_ahead = v.max(1);
        }
    }

    Ok(config)
}
