// MIT License - Copyright (c) 2026 Peter Wright
// Home Assistant MQTT discovery payloads and topic layout

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::switch::BypassSwitch;

pub const PAYLOAD_ON: &str = "ON";
pub const PAYLOAD_OFF: &str = "OFF";
pub const AVAILABILITY_ONLINE: &str = "online";
pub const AVAILABILITY_OFFLINE: &str = "offline";

const BYPASS_ICON: &str = "mdi:shield-off";

/// Topic layout for one bridge instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topics {
    discovery_prefix: String,
    base_topic: String,
}

impl Topics {
    pub fn new(discovery_prefix: impl Into<String>, base_topic: impl Into<String>) -> Self {
        Self {
            discovery_prefix: discovery_prefix.into(),
            base_topic: base_topic.into(),
        }
    }

    /// Retained discovery config for one switch.
    pub fn config(&self, unique_id: &str) -> String {
        format!("{}/switch/{unique_id}/config", self.discovery_prefix)
    }

    pub fn state(&self, zone: u32) -> String {
        format!("{}/zone/{zone}/bypass", self.base_topic)
    }

    pub fn command(&self, zone: u32) -> String {
        format!("{}/zone/{zone}/bypass/set", self.base_topic)
    }

    /// Wildcard covering every zone's command topic.
    pub fn command_filter(&self) -> String {
        format!("{}/zone/+/bypass/set", self.base_topic)
    }

    pub fn attributes(&self, zone: u32) -> String {
        format!("{}/zone/{zone}/bypass/attributes", self.base_topic)
    }

    pub fn availability(&self) -> String {
        format!("{}/status", self.base_topic)
    }

    /// Extract the zone number from a command topic.
    pub fn command_zone(&self, topic: &str) -> Option<u32> {
        topic
            .strip_prefix(self.base_topic.as_str())?
            .strip_prefix("/zone/")?
            .strip_suffix("/bypass/set")?
            .parse()
            .ok()
    }
}

/// `device` block shared by every switch of one controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveryDevice {
    pub identifiers: Vec<String>,
    pub name: String,
}

/// Discovery config for a bypass switch.
///
/// See: <https://www.home-assistant.io/integrations/switch.mqtt/>
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwitchDiscovery {
    pub name: String,
    pub unique_id: String,
    pub state_topic: String,
    pub command_topic: String,
    pub json_attributes_topic: String,
    pub availability_topic: String,
    pub payload_on: String,
    pub payload_off: String,
    pub state_on: String,
    pub state_off: String,
    pub optimistic: bool,
    pub icon: String,
    pub device: DiscoveryDevice,
}

impl SwitchDiscovery {
    pub fn for_switch(switch: &BypassSwitch, topics: &Topics) -> Self {
        let zone = switch.zone_number();
        let controller = switch.controller();
        Self {
            name: switch.name().to_string(),
            unique_id: switch.unique_id().to_string(),
            state_topic: topics.state(zone),
            command_topic: topics.command(zone),
            json_attributes_topic: topics.attributes(zone),
            availability_topic: topics.availability(),
            payload_on: PAYLOAD_ON.to_string(),
            payload_off: PAYLOAD_OFF.to_string(),
            state_on: PAYLOAD_ON.to_string(),
            state_off: PAYLOAD_OFF.to_string(),
            optimistic: false,
            icon: BYPASS_ICON.to_string(),
            device: DiscoveryDevice {
                identifiers: vec![controller.unique_id().to_string()],
                name: controller.alarm_name().to_string(),
            },
        }
    }
}

/// Extra attributes published alongside the on/off state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ZoneAttributes {
    pub zone: u32,
    pub name: String,
    pub bypassed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,
}

/// Inbound switch command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchCommand {
    On,
    Off,
}

impl SwitchCommand {
    pub fn parse(payload: &str) -> Option<Self> {
        let payload = payload.trim();
        if payload.eq_ignore_ascii_case(PAYLOAD_ON) {
            Some(Self::On)
        } else if payload.eq_ignore_ascii_case(PAYLOAD_OFF) {
            Some(Self::Off)
        } else {
            None
        }
    }
}

pub fn state_payload(on: bool) -> &'static str {
    if on { PAYLOAD_ON } else { PAYLOAD_OFF }
}

pub fn availability_payload(online: bool) -> &'static str {
    if online { AVAILABILITY_ONLINE } else { AVAILABILITY_OFFLINE }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ZoneInfo;
    use crate::switch::tests::FakeController;

    fn topics() -> Topics {
        Topics::new("homeassistant", "envisalink")
    }

    #[test]
    fn test_topic_layout() {
        let t = topics();
        assert_eq!(t.config("evl_zone_1_bypass"), "homeassistant/switch/evl_zone_1_bypass/config");
        assert_eq!(t.state(12), "envisalink/zone/12/bypass");
        assert_eq!(t.command(12), "envisalink/zone/12/bypass/set");
        assert_eq!(t.attributes(12), "envisalink/zone/12/bypass/attributes");
        assert_eq!(t.availability(), "envisalink/status");
        assert_eq!(t.command_filter(), "envisalink/zone/+/bypass/set");
    }

    #[test]
    fn test_command_zone() {
        let t = topics();
        assert_eq!(t.command_zone("envisalink/zone/7/bypass/set"), Some(7));
        assert_eq!(t.command_zone("envisalink/zone/7/bypass"), None);
        assert_eq!(t.command_zone("other/zone/7/bypass/set"), None);
        assert_eq!(t.command_zone("envisalink/zone/x/bypass/set"), None);
    }

    #[test]
    fn test_switch_command_parse() {
        assert_eq!(SwitchCommand::parse("ON"), Some(SwitchCommand::On));
        assert_eq!(SwitchCommand::parse(" off\n"), Some(SwitchCommand::Off));
        assert_eq!(SwitchCommand::parse("toggle"), None);
        assert_eq!(SwitchCommand::parse(""), None);
    }

    #[test]
    fn test_payload_helpers() {
        assert_eq!(state_payload(true), "ON");
        assert_eq!(state_payload(false), "OFF");
        assert_eq!(availability_payload(true), "online");
        assert_eq!(availability_payload(false), "offline");
    }

    #[test]
    fn test_discovery_for_switch() {
        let info = ZoneInfo::named("Back Door");
        let switch = BypassSwitch::new(2, Some(&info), FakeController::new());
        let discovery = SwitchDiscovery::for_switch(&switch, &topics());

        assert_eq!(discovery.name, "Back Door_bypass");
        assert_eq!(discovery.unique_id, "evl_1a2b3c_zone_2_bypass");
        assert_eq!(discovery.command_topic, "envisalink/zone/2/bypass/set");
        assert_eq!(discovery.device.identifiers, vec!["evl_1a2b3c".to_string()]);
        assert_eq!(discovery.device.name, "home_alarm");

        let json = serde_json::to_value(&discovery).unwrap();
        assert_eq!(json["availability_topic"], "envisalink/status");
        assert_eq!(json["optimistic"], false);
    }

    #[test]
    fn test_attributes_omit_missing_timestamp() {
        let attrs = ZoneAttributes {
            zone: 3,
            name: "Hall_bypass".into(),
            bypassed: false,
            updated: None,
        };
        let json = serde_json::to_value(&attrs).unwrap();
        assert!(json.get("updated").is_none());
        assert_eq!(json["zone"], 3);
    }
}
