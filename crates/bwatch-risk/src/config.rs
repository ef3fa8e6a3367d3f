//! # Risk Configuration
//!
//! Every threshold, band and weight the engine uses. Each field has a serde
//! default so a partial file (or `{}`) yields the production defaults.
//!
//! Files load through [`RiskConfig::from_file`]: `.yaml`/`.yml` parse as
//! YAML, anything else as JSON.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use bwatch_verify::ProfileConfig;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file does not exist.
    #[error("configuration file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Reading the file failed.
    #[error("I/O error reading configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse YAML at {path}: {source}")]
    YamlParse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("failed to parse JSON at {path}: {source}")]
    JsonParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// A value parsed but is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

// ---------------------------------------------------------------------------
// Price table
// ---------------------------------------------------------------------------

/// Static per-symbol reference prices. Symbols absent from the table are
/// valued at one unit.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriceTable(BTreeMap<String, Decimal>);

impl PriceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the price of `symbol` (case-insensitive).
    pub fn with_price(mut self, symbol: &str, price: Decimal) -> Self {
        self.0.insert(symbol.trim().to_ascii_uppercase(), price);
        self
    }

    /// The reference price of `symbol`, or `1` when unlisted.
    pub fn price_of(&self, symbol: &str) -> Decimal {
        let key = symbol.trim().to_ascii_uppercase();
        self.0.get(&key).copied().unwrap_or(Decimal::ONE)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Signal sections
// ---------------------------------------------------------------------------

fn dec(n: i64) -> Decimal {
    Decimal::from(n)
}

fn default_extreme() -> Decimal {
    dec(10_000_000)
}
fn default_very_large() -> Decimal {
    dec(1_000_000)
}
fn default_large() -> Decimal {
    dec(100_000)
}
fn default_high_value() -> Decimal {
    dec(10_000)
}
fn default_extreme_points() -> f64 {
    40.0
}
fn default_very_large_points() -> f64 {
    30.0
}
fn default_large_points() -> f64 {
    20.0
}
fn default_high_value_base() -> f64 {
    5.0
}
fn default_high_value_slope() -> f64 {
    10.0
}
fn default_high_value_cap() -> f64 {
    15.0
}

/// Reference-value bands for amount risk. Only the highest matching band
/// fires. The high-value band scales linearly from `high_value_base` at
/// `high_value` by `high_value_slope` per `large - high_value`, capped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmountBands {
    #[serde(default = "default_extreme")]
    pub extreme: Decimal,
    #[serde(default = "default_extreme_points")]
    pub extreme_points: f64,
    #[serde(default = "default_very_large")]
    pub very_large: Decimal,
    #[serde(default = "default_very_large_points")]
    pub very_large_points: f64,
    #[serde(default = "default_large")]
    pub large: Decimal,
    #[serde(default = "default_large_points")]
    pub large_points: f64,
    #[serde(default = "default_high_value")]
    pub high_value: Decimal,
    #[serde(default = "default_high_value_base")]
    pub high_value_base: f64,
    #[serde(default = "default_high_value_slope")]
    pub high_value_slope: f64,
    #[serde(default = "default_high_value_cap")]
    pub high_value_cap: f64,
}

impl Default for AmountBands {
    fn default() -> Self {
        Self {
            extreme: default_extreme(),
            extreme_points: default_extreme_points(),
            very_large: default_very_large(),
            very_large_points: default_very_large_points(),
            large: default_large(),
            large_points: default_large_points(),
            high_value: default_high_value(),
            high_value_base: default_high_value_base(),
            high_value_slope: default_high_value_slope(),
            high_value_cap: default_high_value_cap(),
        }
    }
}

fn default_frequency_window() -> i64 {
    3600
}
fn default_frequency_threshold() -> usize {
    10
}
fn default_frequency_per_excess() -> f64 {
    2.0
}
fn default_frequency_cap() -> f64 {
    25.0
}

/// Trailing-window transaction count risk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyConfig {
    #[serde(default = "default_frequency_window")]
    pub window_secs: i64,
    /// Counts above this score.
    #[serde(default = "default_frequency_threshold")]
    pub threshold: usize,
    #[serde(default = "default_frequency_per_excess")]
    pub points_per_excess: f64,
    #[serde(default = "default_frequency_cap")]
    pub cap: f64,
}

impl Default for FrequencyConfig {
    fn default() -> Self {
        Self {
            window_secs: default_frequency_window(),
            threshold: default_frequency_threshold(),
            points_per_excess: default_frequency_per_excess(),
            cap: default_frequency_cap(),
        }
    }
}

fn default_circular_window() -> i64 {
    24 * 3600
}
fn default_circular_points() -> f64 {
    30.0
}
fn default_rapid_window() -> i64 {
    600
}
fn default_rapid_threshold() -> usize {
    5
}
fn default_rapid_points() -> f64 {
    20.0
}

/// Circular-return and rapid-movement detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternConfig {
    #[serde(default = "default_circular_window")]
    pub circular_window_secs: i64,
    #[serde(default = "default_circular_points")]
    pub circular_points: f64,
    #[serde(default = "default_rapid_window")]
    pub rapid_window_secs: i64,
    /// Either endpoint in more than this many transactions is rapid.
    #[serde(default = "default_rapid_threshold")]
    pub rapid_threshold: usize,
    #[serde(default = "default_rapid_points")]
    pub rapid_points: f64,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            circular_window_secs: default_circular_window(),
            circular_points: default_circular_points(),
            rapid_window_secs: default_rapid_window(),
            rapid_threshold: default_rapid_threshold(),
            rapid_points: default_rapid_points(),
        }
    }
}

fn default_unusual_start() -> u32 {
    2
}
fn default_unusual_end() -> u32 {
    6
}
fn default_unusual_points() -> f64 {
    10.0
}
fn default_weekend_points() -> f64 {
    5.0
}

/// Unusual-hours and weekend timing risk. Hours are UTC, `[start, end)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingConfig {
    #[serde(default = "default_unusual_start")]
    pub unusual_start_hour: u32,
    #[serde(default = "default_unusual_end")]
    pub unusual_end_hour: u32,
    #[serde(default = "default_unusual_points")]
    pub unusual_points: f64,
    #[serde(default = "default_weekend_points")]
    pub weekend_points: f64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            unusual_start_hour: default_unusual_start(),
            unusual_end_hour: default_unusual_end(),
            unusual_points: default_unusual_points(),
            weekend_points: default_weekend_points(),
        }
    }
}

fn default_sanctions_points() -> f64 {
    100.0
}
fn default_normalization() -> f64 {
    200.0
}

// ---------------------------------------------------------------------------
// RiskConfig
// ---------------------------------------------------------------------------

/// Complete risk engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskConfig {
    #[serde(default)]
    pub amount: AmountBands,
    #[serde(default)]
    pub frequency: FrequencyConfig,
    #[serde(default)]
    pub pattern: PatternConfig,
    #[serde(default = "default_sanctions_points")]
    pub sanctions_points: f64,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub protocol: ProfileConfig,
    /// Raw point sum that maps to a normalized score of 1.0.
    #[serde(default = "default_normalization")]
    pub normalization: f64,
    #[serde(default)]
    pub prices: PriceTable,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            amount: AmountBands::default(),
            frequency: FrequencyConfig::default(),
            pattern: PatternConfig::default(),
            sanctions_points: default_sanctions_points(),
            timing: TimingConfig::default(),
            protocol: ProfileConfig::default(),
            normalization: default_normalization(),
            prices: PriceTable::default(),
        }
    }
}

impl RiskConfig {
    /// Load from a JSON or YAML file and validate.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                ConfigError::Io(e)
            }
        })?;
        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );
        let config: Self = if is_yaml {
            serde_yaml::from_str(&content).map_err(|e| ConfigError::YamlParse {
                path: path.to_path_buf(),
                source: e,
            })?
        } else {
            serde_json::from_str(&content).map_err(|e| ConfigError::JsonParse {
                path: path.to_path_buf(),
                source: e,
            })?
        };
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.normalization.is_finite() && self.normalization > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "normalization must be positive, got {}",
                self.normalization
            )));
        }
        let a = &self.amount;
        if !(a.high_value < a.large && a.large < a.very_large && a.very_large < a.extreme) {
            return Err(ConfigError::Invalid(
                "amount bands must be strictly increasing: high_value < large < very_large < extreme"
                    .into(),
            ));
        }
        if !(a.high_value_cap <= a.large_points
            && a.large_points <= a.very_large_points
            && a.very_large_points <= a.extreme_points)
        {
            return Err(ConfigError::Invalid(
                "amount band points must be non-decreasing".into(),
            ));
        }
        if !(a.high_value_slope.is_finite() && a.high_value_slope >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "high_value_slope must be non-negative, got {}",
                a.high_value_slope
            )));
        }
        let t = &self.timing;
        if t.unusual_start_hour > 24 || t.unusual_end_hour > 24 {
            return Err(ConfigError::Invalid("timing hours must be within 0..=24".into()));
        }
        if t.unusual_start_hour >= t.unusual_end_hour {
            return Err(ConfigError::Invalid(format!(
                "unusual hours must satisfy start < end, got [{}, {})",
                t.unusual_start_hour, t.unusual_end_hour
            )));
        }
        for (name, points) in self.point_fields() {
            if !(points.is_finite() && points >= 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a non-negative number, got {points}"
                )));
            }
        }
        if self.frequency.window_secs <= 0
            || self.pattern.circular_window_secs <= 0
            || self.pattern.rapid_window_secs <= 0
        {
            return Err(ConfigError::Invalid("windows must be positive".into()));
        }
        Ok(())
    }
}

impl RiskConfig {
    fn point_fields(&self) -> [(&'static str, f64); 12] {
        [
            ("amount.extreme_points", self.amount.extreme_points),
            ("amount.very_large_points", self.amount.very_large_points),
            ("amount.large_points", self.amount.large_points),
            ("amount.high_value_base", self.amount.high_value_base),
            ("amount.high_value_cap", self.amount.high_value_cap),
            ("frequency.points_per_excess", self.frequency.points_per_excess),
            ("frequency.cap", self.frequency.cap),
            ("pattern.circular_points", self.pattern.circular_points),
            ("pattern.rapid_points", self.pattern.rapid_points),
            ("sanctions_points", self.sanctions_points),
            ("timing.unusual_points", self.timing.unusual_points),
            ("timing.weekend_points", self.timing.weekend_points),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_json_yields_defaults() {
        let cfg: RiskConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, RiskConfig::default());
        assert_eq!(cfg.normalization, 200.0);
        assert_eq!(cfg.amount.extreme, Decimal::from(10_000_000));
        cfg.validate().unwrap();
    }

    #[test]
    fn price_table_defaults_to_unit() {
        let prices = PriceTable::new().with_price("eth", Decimal::from(3000));
        assert_eq!(prices.price_of("ETH"), Decimal::from(3000));
        assert_eq!(prices.price_of("DOGE"), Decimal::ONE);
    }

    #[test]
    fn yaml_file_with_partial_overrides() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "sanctions_points: 80\nfrequency:\n  threshold: 4\nprices:\n  WETH: \"2500.50\"\n"
        )
        .unwrap();
        let cfg = RiskConfig::from_file(file.path()).unwrap();
        assert_eq!(cfg.sanctions_points, 80.0);
        assert_eq!(cfg.frequency.threshold, 4);
        assert_eq!(cfg.frequency.cap, 25.0);
        assert_eq!(cfg.prices.price_of("weth"), "2500.50".parse::<Decimal>().unwrap());
    }

    #[test]
    fn json_file_loads() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"normalization": 100}}"#).unwrap();
        let cfg = RiskConfig::from_file(file.path()).unwrap();
        assert_eq!(cfg.normalization, 100.0);
    }

    #[test]
    fn missing_file_reported() {
        let err = RiskConfig::from_file(Path::new("/nonexistent/risk.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
    }

    #[test]
    fn malformed_json_reported_with_path() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, "{{not json").unwrap();
        let err = RiskConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::JsonParse { .. }));
    }

    #[test]
    fn non_positive_normalization_rejected() {
        let cfg = RiskConfig {
            normalization: 0.0,
            ..RiskConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn unordered_bands_rejected() {
        let mut cfg = RiskConfig::default();
        cfg.amount.large = Decimal::from(50_000_000);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn inverted_unusual_hours_rejected() {
        let mut cfg = RiskConfig::default();
        cfg.timing.unusual_start_hour = 6;
        cfg.timing.unusual_end_hour = 2;
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
        cfg.timing.unusual_end_hour = 6;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn negative_slope_rejected() {
        let mut cfg = RiskConfig::default();
        cfg.amount.high_value_slope = -0.5;
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn negative_points_rejected() {
        let mut cfg = RiskConfig::default();
        cfg.timing.weekend_points = -1.0;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("timing.weekend_points"));

        let mut cfg = RiskConfig::default();
        cfg.pattern.rapid_points = f64::NAN;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn negative_points_in_file_rejected() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "sanctions_points: -10").unwrap();
        assert!(matches!(
            RiskConfig::from_file(file.path()),
            Err(ConfigError::Invalid(_))
        ));
    }
}
