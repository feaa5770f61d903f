// MIT License - Copyright (c) 2026 Peter Wright
// Zone bypass switches for Home Assistant over MQTT
//
//! # zone-bypass-bridge
//!
//! Exposes the bypass status of each alarm panel zone as a Home Assistant
//! switch over MQTT discovery.
//!
//! The panel itself is reached through an [`AlarmController`] supplied by
//! the caller. This crate only reads each zone's cached bypass flag and
//! forwards switch commands to the controller's bypass toggle.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use zone_bypass_bridge::{
//!     setup_bypass_switches, AlarmController, BridgeConfig, MqttSwitchBridge,
//! };
//!
//! async fn run(controller: Arc<dyn AlarmController>) -> anyhow::Result<()> {
//!     let config = BridgeConfig::load("config.toml")?;
//!
//!     let mut bridge = MqttSwitchBridge::new(config.mqtt.clone());
//!     setup_bypass_switches(&config.switches, &config.zones, controller.clone(), &mut bridge)?;
//!
//!     let events = controller.subscribe();
//!     bridge.run(events, std::future::pending()).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod controller;
pub mod error;
pub mod event;
pub mod mqtt;
pub mod setup;
pub mod switch;

// Re-exports for convenience
pub use config::{BridgeConfig, MqttConfig, SwitchOptions, SwitchOptionsBuilder, ZoneInfo};
pub use controller::{AlarmController, AlarmState, StateCache, ZoneState, ZoneStatusFlags};
pub use error::{BridgeError, Result};
pub use event::{ControllerEvent, EventReceiver, EventSender, UpdateKind};
pub use mqtt::MqttSwitchBridge;
pub use setup::{find_zone_info, setup_bypass_switches, EntitySink};
pub use switch::BypassSwitch;
