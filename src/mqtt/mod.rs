// MIT License - Copyright (c) 2026 Peter Wright
// Home Assistant MQTT surface

pub mod bridge;
pub mod discovery;
pub mod publisher;

pub use bridge::MqttSwitchBridge;
pub use discovery::{SwitchCommand, SwitchDiscovery, Topics, ZoneAttributes};
pub use publisher::Publisher;
