use cashdrop_catalog::PricingConfig;
use cashdrop_shared::{Position, TipSelection};
use serde::Deserialize;
use std::env;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub pricing: PricingConfig,
    #[serde(default)]
    pub tracking: TrackingConfig,
    #[serde(default)]
    pub persistence: PersistenceConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TrackingConfig {
    #[serde(default = "default_stale_after_secs")]
    pub stale_after_secs: u64,
}

impl TrackingConfig {
    pub fn stale_after(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.stale_after_secs as i64)
    }
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            stale_after_secs: default_stale_after_secs(),
        }
    }
}

fn default_stale_after_secs() -> u64 { 30 }

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Memory,
    Json,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PersistenceConfig {
    #[serde(default)]
    pub backend: Backend,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl PersistenceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            data_dir: default_data_dir(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

fn default_data_dir() -> String { "data".to_string() }
fn default_timeout_ms() -> u64 { 2_000 }

/// Inputs for the end-to-end demo run
#[derive(Debug, Deserialize, Clone)]
pub struct SimulationConfig {
    /// Keys as typed on the amount keypad, e.g. "500" or "1250.50"
    #[serde(default = "default_amount_input")]
    pub amount_input: String,
    #[serde(default)]
    pub tip: TipSelection,
    #[serde(default = "default_address")]
    pub address: String,
    #[serde(default = "default_destination")]
    pub destination: Position,
    #[serde(default = "default_rider_start")]
    pub rider_start: Position,
    #[serde(default = "default_update_interval_ms")]
    pub update_interval_ms: u64,
    /// Position updates between dispatch and arrival
    #[serde(default = "default_route_steps")]
    pub route_steps: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            amount_input: default_amount_input(),
            tip: TipSelection::None,
            address: default_address(),
            destination: default_destination(),
            rider_start: default_rider_start(),
            update_interval_ms: default_update_interval_ms(),
            route_steps: default_route_steps(),
        }
    }
}

fn default_amount_input() -> String { "500".to_string() }
fn default_address() -> String { "home".to_string() }
fn default_destination() -> Position { Position::new(12.9716, 77.5946) }
fn default_rider_start() -> Position { Position::new(12.9850, 77.6050) }
fn default_update_interval_ms() -> u64 { 500 }
fn default_route_steps() -> u32 { 5 }

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from(Path::new("config"))
    }

    /// Layered load: `default` (required), then `{RUN_MODE}` and `local` (optional), then
    /// `CASHDROP__*` environment variables
    pub fn load_from(dir: &Path) -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());
        let layer = |name: &str| dir.join(name).to_string_lossy().into_owned();

        let s = config::Config::builder()
            .add_source(config::File::with_name(&layer("default")))
            .add_source(config::File::with_name(&layer(&run_mode)).required(false))
            // Not checked in
            .add_source(config::File::with_name(&layer("local")).required(false))
            .add_source(
                config::Environment::with_prefix("CASHDROP")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = s.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), config::ConfigError> {
        self.pricing
            .validate()
            .map_err(|e| config::ConfigError::Message(format!("pricing: {}", e)))?;
        if self.persistence.timeout_ms == 0 {
            return Err(config::ConfigError::Message(
                "persistence.timeout_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cashdrop_catalog::TierEdge;
    use std::fs;

    const DEFAULT_TOML: &str = r#"
[pricing]
currency = "INR"
max_amount = 10000000

[pricing.fee_schedule]
edge = "higher_tier"
tiers = [
    { from = 0 },
    { from = 500000, flat = 500 },
]

[[pricing.surcharges]]
label = "Delivery Fee"
flat = 3000

[pricing.tips]
presets = [1000, 2000, 3000]
custom_ceiling = 50000

[persistence]
backend = "json"
data_dir = "var/orders"

[simulation]
amount_input = "750"
tip = { kind = "PRESET", value = 2000 }
"#;

    #[test]
    fn test_load_layers_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("default.toml"), DEFAULT_TOML).unwrap();
        fs::write(
            dir.path().join("local.toml"),
            "[tracking]\nstale_after_secs = 90\n",
        )
        .unwrap();

        let config = Config::load_from(dir.path()).unwrap();

        assert_eq!(config.pricing.fee_schedule.tiers.len(), 2);
        assert_eq!(config.pricing.fee_schedule.edge, TierEdge::HigherTier);
        assert_eq!(config.pricing.surcharges[0].flat, 3_000);
        assert_eq!(config.persistence.backend, Backend::Json);
        assert_eq!(config.persistence.timeout_ms, 2_000);
        assert_eq!(config.tracking.stale_after_secs, 90);
        assert_eq!(config.simulation.tip, TipSelection::Preset(2_000));
        assert_eq!(config.simulation.update_interval_ms, 500);
    }

    #[test]
    fn test_rejects_invalid_schedule() {
        let dir = tempfile::tempdir().unwrap();
        let broken = DEFAULT_TOML.replace("{ from = 0 },", "{ from = 100 },");
        fs::write(dir.path().join("default.toml"), broken).unwrap();

        let err = Config::load_from(dir.path()).unwrap_err();
        assert!(err.to_string().contains("pricing"), "unexpected error: {}", err);
    }

    #[test]
    fn test_missing_default_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load_from(dir.path()).is_err());
    }
}
