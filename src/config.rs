// MIT License - Copyright (c) 2026 Peter Wright
// Bridge configuration

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::{BridgeError, Result};

/// Number of zones to expose when `num_zones` is not configured.
pub const DEFAULT_NUM_ZONES: u32 = 8;

/// Largest zone number any supported panel reports.
pub const MAX_ZONES: u32 = 128;

/// Options that control which switch entities are created.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SwitchOptions {
    /// Whether to create one bypass switch per zone at all
    #[serde(default)]
    pub create_zone_bypass_switches: bool,
    /// Zones `1..=num_zones` get a switch
    #[serde(default = "default_num_zones")]
    pub num_zones: u32,
}

fn default_num_zones() -> u32 {
    DEFAULT_NUM_ZONES
}

impl Default for SwitchOptions {
    fn default() -> Self {
        Self {
            create_zone_bypass_switches: false,
            num_zones: DEFAULT_NUM_ZONES,
        }
    }
}

impl SwitchOptions {
    /// Create a new options builder starting from defaults.
    pub fn builder() -> SwitchOptionsBuilder {
        SwitchOptionsBuilder::default()
    }
}

/// Builder for SwitchOptions.
#[derive(Debug, Clone, Default)]
pub struct SwitchOptionsBuilder {
    options: SwitchOptions,
}

impl SwitchOptionsBuilder {
    pub fn create_zone_bypass_switches(mut self, create: bool) -> Self {
        self.options.create_zone_bypass_switches = create;
        self
    }

    pub fn num_zones(mut self, num_zones: u32) -> Self {
        self.options.num_zones = num_zones;
        self
    }

    pub fn build(self) -> SwitchOptions {
        self.options
    }
}

/// Per-zone information supplied by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ZoneInfo {
    /// Friendly zone name; overrides the generated switch name
    #[serde(default)]
    pub name: Option<String>,
    /// Zone type (e.g. "door", "motion"); informational only
    #[serde(default, rename = "type")]
    pub zone_type: Option<String>,
}

impl ZoneInfo {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            zone_type: None,
        }
    }
}

/// MQTT connection and topic layout.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MqttConfig {
    pub url: String,
    #[serde(default = "default_client_id")]
    pub client_id: String,
    #[serde(default = "default_discovery_prefix")]
    pub discovery_prefix: String,
    #[serde(default = "default_base_topic")]
    pub base_topic: String,
    #[serde(default = "default_keep_alive")]
    pub keep_alive_secs: u64,
}

fn default_client_id() -> String {
    "zone-bypass-bridge".to_string()
}
fn default_discovery_prefix() -> String {
    "homeassistant".to_string()
}
fn default_base_topic() -> String {
    "alarm".to_string()
}
fn default_keep_alive() -> u64 {
    30
}

impl MqttConfig {
    /// Config pointing at `url` with default client id and topics.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client_id: default_client_id(),
            discovery_prefix: default_discovery_prefix(),
            base_topic: default_base_topic(),
            keep_alive_secs: default_keep_alive(),
        }
    }
}

/// Top-level TOML configuration file.
#[derive(Debug, Clone, Deserialize)]
pub struct BridgeConfig {
    #[serde(default)]
    pub switches: SwitchOptions,
    pub mqtt: MqttConfig,
    #[serde(default, deserialize_with = "deserialize_zones")]
    pub zones: HashMap<u32, ZoneInfo>,
}

fn deserialize_zones<'de, D>(deserializer: D) -> std::result::Result<HashMap<u32, ZoneInfo>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let string_map: HashMap<String, ZoneInfo> = HashMap::deserialize(deserializer)?;
    string_map
        .into_iter()
        .map(|(k, v)| {
            k.parse::<u32>()
                .map(|id| (id, v))
                .map_err(|_| serde::de::Error::custom(format!("invalid zone number: {k}")))
        })
        .collect()
}

impl BridgeConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    fn validate(&self) -> Result<()> {
        if self.switches.num_zones > MAX_ZONES {
            return Err(BridgeError::InvalidZoneCount {
                count: self.switches.num_zones,
                max: MAX_ZONES,
            });
        }
        if let Some(zone) = self.zones.keys().find(|z| **z == 0 || **z > MAX_ZONES) {
            return Err(BridgeError::InvalidZone {
                zone: *zone,
                max: MAX_ZONES,
            });
        }
        parse_mqtt_url(&self.mqtt.url)?;
        Ok(())
    }
}

/// Parse an MQTT URL like "mqtt://host:port" into (host, port).
pub fn parse_mqtt_url(url: &str) -> Result<(String, u16)> {
    let stripped = url
        .strip_prefix("mqtt://")
        .or_else(|| url.strip_prefix("tcp://"))
        .unwrap_or(url);

    let (host, port_str) = stripped
        .rsplit_once(':')
        .ok_or_else(|| BridgeError::InvalidConfig {
            reason: format!("MQTT URL must be in format mqtt://host:port, got {url}"),
        })?;

    let port: u16 = port_str.parse().map_err(|_| BridgeError::InvalidConfig {
        reason: format!("Invalid MQTT port number: {port_str}"),
    })?;

    if host.is_empty() {
        return Err(BridgeError::InvalidConfig {
            reason: format!("MQTT URL has no host: {url}"),
        });
    }

    Ok((host.to_string(), port))
}
