//! Configuration file support for Plateup.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/plateup/config.toml`.
//! The session engine reads settings through the `SettingsProvider` trait so
//! hosts can back it with something other than this file.

use crate::{Error, PlateInventoryEntry, Result, Units};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub training: TrainingConfig,

    #[serde(default)]
    pub equipment: EquipmentConfig,

    #[serde(default)]
    pub feedback: FeedbackConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Training defaults
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrainingConfig {
    #[serde(default)]
    pub units: Units,

    #[serde(default = "default_rest_seconds")]
    pub default_rest_seconds: u32,

    #[serde(default = "default_auto_progression")]
    pub auto_progression_default: bool,

    /// Defaults to 45 lb / 20 kg depending on units
    #[serde(default)]
    pub bar_weight: Option<f64>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            units: Units::default(),
            default_rest_seconds: default_rest_seconds(),
            auto_progression_default: default_auto_progression(),
            bar_weight: None,
        }
    }
}

/// A plate size and how many the gym has
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PlateConfig {
    pub weight: f64,
    pub count: u32,
}

/// Equipment configuration; an empty plate list means the unit default
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct EquipmentConfig {
    #[serde(default)]
    pub plates: Vec<PlateConfig>,
}

/// Which feedback channels fire on session events
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeedbackConfig {
    #[serde(default = "default_true")]
    pub haptics: bool,

    #[serde(default = "default_true")]
    pub sound: bool,

    #[serde(default = "default_true")]
    pub notifications: bool,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            haptics: true,
            sound: true,
            notifications: true,
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| {
        std::env::var_os("HOME")
            .map(|home| PathBuf::from(home).join(".local/share"))
            .unwrap_or_else(|| PathBuf::from("."))
    });
    base.join("plateup")
}

fn default_rest_seconds() -> u32 {
    90
}

fn default_auto_progression() -> bool {
    true
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            std::env::var_os("HOME")
                .map(|home| PathBuf::from(home).join(".config"))
                .unwrap_or_else(|| PathBuf::from("."))
        });
        base.join("plateup").join("config.toml")
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    /// Reject values no gym could have
    pub fn validate(&self) -> Result<()> {
        if let Some(bar) = self.training.bar_weight {
            if bar <= 0.0 {
                return Err(Error::Config(format!(
                    "bar_weight must be positive, got {}",
                    bar
                )));
            }
        }

        if let Some(plate) = self.equipment.plates.iter().find(|p| p.weight <= 0.0) {
            return Err(Error::Config(format!(
                "plate weight must be positive, got {}",
                plate.weight
            )));
        }

        Ok(())
    }

    /// Configured plates, or the unit default when none are listed
    pub fn plate_inventory(&self) -> Vec<PlateInventoryEntry> {
        if self.equipment.plates.is_empty() {
            return crate::plates::default_inventory(self.training.units);
        }
        self.equipment
            .plates
            .iter()
            .map(|p| PlateInventoryEntry::new(p.weight, p.count))
            .collect()
    }
}

// ============================================================================
// Settings lookup
// ============================================================================

/// Setting keys the core reads
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettingKey {
    Units,
    DefaultRestSeconds,
    AutoProgressionDefault,
    BarWeight,
}

/// Setting values
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SettingValue {
    Units(Units),
    Seconds(u32),
    Flag(bool),
    Weight(f64),
}

/// Read-only settings lookup
///
/// The typed accessors fall back to the documented defaults when a provider
/// answers with the wrong kind of value: imperial units, 90 s rest,
/// auto-progression on, and the unit's standard bar.
pub trait SettingsProvider {
    fn get(&self, key: SettingKey) -> SettingValue;

    fn units(&self) -> Units {
        match self.get(SettingKey::Units) {
            SettingValue::Units(units) => units,
            _ => Units::default(),
        }
    }

    fn default_rest_seconds(&self) -> u32 {
        match self.get(SettingKey::DefaultRestSeconds) {
            SettingValue::Seconds(seconds) => seconds,
            _ => default_rest_seconds(),
        }
    }

    fn auto_progression_default(&self) -> bool {
        match self.get(SettingKey::AutoProgressionDefault) {
            SettingValue::Flag(flag) => flag,
            _ => default_auto_progression(),
        }
    }

    fn bar_weight(&self) -> f64 {
        match self.get(SettingKey::BarWeight) {
            SettingValue::Weight(weight) if weight > 0.0 => weight,
            _ => self.units().default_bar_weight(),
        }
    }
}

impl SettingsProvider for Config {
    fn get(&self, key: SettingKey) -> SettingValue {
        match key {
            SettingKey::Units => SettingValue::Units(self.training.units),
            SettingKey::DefaultRestSeconds => {
                SettingValue::Seconds(self.training.default_rest_seconds)
            }
            SettingKey::AutoProgressionDefault => {
                SettingValue::Flag(self.training.auto_progression_default)
            }
            SettingKey::BarWeight => SettingValue::Weight(
                self.training
                    .bar_weight
                    .unwrap_or_else(|| self.training.units.default_bar_weight()),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.training.units, Units::Imperial);
        assert_eq!(config.default_rest_seconds(), 90);
        assert!(config.auto_progression_default());
        assert_eq!(config.bar_weight(), 45.0);
        assert!(config.feedback.sound);
    }

    #[test]
    fn test_config_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("plateup/config.toml");

        let mut config = Config::default();
        config.training.default_rest_seconds = 120;
        config.equipment.plates = vec![PlateConfig {
            weight: 20.0,
            count: 6,
        }];
        config.save_to(&path).unwrap();

        let parsed = Config::load_from(&path).unwrap();
        assert_eq!(parsed.training.default_rest_seconds, 120);
        assert_eq!(parsed.equipment.plates, config.equipment.plates);
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[training]
units = "metric"

[feedback]
sound = false
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.units(), Units::Metric);
        assert_eq!(config.bar_weight(), 20.0);
        assert_eq!(config.default_rest_seconds(), 90); // default
        assert!(!config.feedback.sound);
        assert!(config.feedback.haptics);
        assert_eq!(config.plate_inventory()[0].plate_weight, 25.0);
    }

    #[test]
    fn test_validate_rejects_bad_equipment() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[training]\nbar_weight = 0.0\n").unwrap();
        assert!(matches!(Config::load_from(&path), Err(Error::Config(_))));

        std::fs::write(&path, "[[equipment.plates]]\nweight = -5.0\ncount = 2\n").unwrap();
        assert!(matches!(Config::load_from(&path), Err(Error::Config(_))));
    }

    struct OddProvider;

    impl SettingsProvider for OddProvider {
        fn get(&self, _key: SettingKey) -> SettingValue {
            SettingValue::Flag(false)
        }
    }

    #[test]
    fn test_provider_defaults_for_mismatched_values() {
        let provider = OddProvider;
        assert_eq!(provider.units(), Units::Imperial);
        assert_eq!(provider.default_rest_seconds(), 90);
        assert_eq!(provider.bar_weight(), 45.0);
        assert!(!provider.auto_progression_default());
    }
}
