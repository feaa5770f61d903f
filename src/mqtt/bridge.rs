// MIT License - Copyright (c) 2026 Peter Wright
// MQTT bridge: publishes bypass switches to Home Assistant and applies commands

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rumqttc::{AsyncClient, Event, LastWill, MqttOptions, Outgoing, Packet, QoS};
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::{timeout, Duration};
use tracing::{debug, error, info, warn};

use crate::config::{parse_mqtt_url, MqttConfig};
use crate::error::Result;
use crate::event::{ControllerEvent, EventReceiver};
use crate::mqtt::discovery::{
    availability_payload, state_payload, SwitchCommand, SwitchDiscovery, Topics, ZoneAttributes,
};
use crate::mqtt::publisher::Publisher;
use crate::setup::EntitySink;
use crate::switch::BypassSwitch;

/// Smallest request queue handed to rumqttc.
const MIN_REQUEST_CAPACITY: usize = 256;

/// Headroom for publishes from the event task while a full announce is queued.
const REQUEST_HEADROOM: usize = 64;

/// Publishes bypass switches over MQTT and forwards switch commands to the controller.
///
/// Collect switches with [`crate::setup_bypass_switches`] (the bridge is an
/// [`EntitySink`]), then call [`MqttSwitchBridge::run`].
#[derive(Debug)]
pub struct MqttSwitchBridge {
    config: MqttConfig,
    topics: Topics,
    switches: Vec<BypassSwitch>,
    panel_online: AtomicBool,
}

impl EntitySink for MqttSwitchBridge {
    fn add_entities(&mut self, entities: Vec<BypassSwitch>) {
        self.switches.extend(entities);
    }
}

impl MqttSwitchBridge {
    pub fn new(config: MqttConfig) -> Self {
        let topics = Topics::new(&config.discovery_prefix, &config.base_topic);
        Self {
            config,
            topics,
            switches: Vec::new(),
            panel_online: AtomicBool::new(true),
        }
    }

    pub fn topics(&self) -> &Topics {
        &self.topics
    }

    pub fn switches(&self) -> &[BypassSwitch] {
        &self.switches
    }

    pub fn panel_online(&self) -> bool {
        self.panel_online.load(Ordering::Relaxed)
    }

    /// Client options, with an `offline` last will on the availability topic.
    pub fn mqtt_options(&self) -> Result<MqttOptions> {
        let (host, port) = parse_mqtt_url(&self.config.url)?;
        let mut opts = MqttOptions::new(&self.config.client_id, host, port);
        opts.set_keep_alive(Duration::from_secs(self.config.keep_alive_secs));
        opts.set_last_will(LastWill::new(
            self.topics.availability(),
            availability_payload(false),
            QoS::AtLeastOnce,
            true,
        ));
        Ok(opts)
    }

    /// Request queue size for the MQTT client.
    ///
    /// A full announce queues one subscribe, one availability message and
    /// three messages per switch, so the queue must hold all of them at once.
    pub fn request_capacity(&self) -> usize {
        (3 * self.switches.len() + 2 + REQUEST_HEADROOM).max(MIN_REQUEST_CAPACITY)
    }

    /// The switch addressed by a command topic, if any.
    pub fn switch_for_topic(&self, topic: &str) -> Option<&BypassSwitch> {
        let zone = self.topics.command_zone(topic)?;
        self.switches.iter().find(|s| s.zone_number() == zone)
    }

    /// Run until `shutdown` completes or the controller's event channel closes.
    pub async fn run(
        self,
        mut events: EventReceiver,
        shutdown: impl Future<Output = ()>,
    ) -> Result<()> {
        let (client, mut eventloop) =
            AsyncClient::new(self.mqtt_options()?, self.request_capacity());
        let bridge = Arc::new(self);
        info!(
            "MQTT bridge starting with {} bypass switches on {}",
            bridge.switches.len(),
            bridge.config.url
        );

        let mqtt_bridge = Arc::clone(&bridge);
        let mqtt_client = client.clone();
        let mqtt_handle = tokio::spawn(async move {
            loop {
                match eventloop.poll().await {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        // rumqttc does not resubscribe after a broker reconnect.
                        // The announce runs in its own task: only this loop drains
                        // the request queue.
                        info!("MQTT: connected");
                        let announce_bridge = Arc::clone(&mqtt_bridge);
                        let announce_client = mqtt_client.clone();
                        tokio::spawn(async move {
                            announce_bridge.on_connect(&announce_client).await;
                        });
                    }
                    Ok(Event::Incoming(Packet::Publish(msg))) => {
                        let payload = String::from_utf8_lossy(&msg.payload);
                        mqtt_bridge.handle_message(&msg.topic, &payload).await;
                    }
                    Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                        debug!("MQTT: disconnect sent");
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        error!("MQTT event loop error: {e}");
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        });

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested");
                    break;
                }
                event = events.recv() => match event {
                    Ok(event) => bridge.handle_controller_event(&client, &event).await,
                    Err(RecvError::Lagged(n)) => {
                        warn!("Event receiver lagged, missed {n} events; republishing");
                        bridge.resync(&client).await;
                    }
                    Err(RecvError::Closed) => {
                        info!("Controller event channel closed");
                        break;
                    }
                },
            }
        }

        bridge.announce_offline(&client).await;
        if let Err(e) = client.disconnect().await {
            warn!("MQTT disconnect failed: {e}");
        }
        if timeout(Duration::from_secs(5), mqtt_handle).await.is_err() {
            warn!("MQTT event loop did not stop in time");
        }
        info!("MQTT bridge stopped");
        Ok(())
    }

    /// Subscribe to commands and publish discovery, availability and state.
    pub async fn on_connect(&self, client: &impl Publisher) {
        let filter = self.topics.command_filter();
        if let Err(e) = client.subscribe(&filter).await {
            error!("Failed to subscribe to {filter}: {e}");
        }
        for switch in &self.switches {
            let discovery = SwitchDiscovery::for_switch(switch, &self.topics);
            publish_json(client, &self.topics.config(switch.unique_id()), &discovery, true).await;
        }
        self.publish_availability(client).await;
        self.publish_all_states(client).await;
    }

    /// Apply an inbound command message. Messages on other topics are ignored.
    pub async fn handle_message(&self, topic: &str, payload: &str) {
        let Some(switch) = self.switch_for_topic(topic) else {
            debug!("Ignoring message on {topic}");
            return;
        };
        let Some(command) = SwitchCommand::parse(payload) else {
            warn!("Invalid command for zone {}: {payload:?}", switch.zone_number());
            return;
        };

        info!("Command: {command:?} zone {}", switch.zone_number());
        let result = match command {
            SwitchCommand::On => switch.turn_on().await,
            SwitchCommand::Off => switch.turn_off().await,
        };
        match result {
            Ok(()) => info!("Bypass toggle zone {}: success", switch.zone_number()),
            Err(e) => error!("Bypass toggle zone {} failed: {e}", switch.zone_number()),
        }
    }

    /// Publish whatever a controller event made stale.
    pub async fn handle_controller_event(&self, client: &impl Publisher, event: &ControllerEvent) {
        match event {
            ControllerEvent::Connected => {
                info!("Panel connected");
                self.panel_online.store(true, Ordering::Relaxed);
                self.publish_availability(client).await;
            }
            ControllerEvent::Disconnected => {
                warn!("Panel disconnected");
                self.panel_online.store(false, Ordering::Relaxed);
                self.publish_availability(client).await;
                return;
            }
            ControllerEvent::StateUpdate { .. } => {}
        }

        for switch in self.switches.iter().filter(|s| s.should_update(event)) {
            self.publish_state(client, switch).await;
        }
    }

    /// Republish availability and every state after events were missed.
    pub async fn resync(&self, client: &impl Publisher) {
        self.publish_availability(client).await;
        self.publish_all_states(client).await;
    }

    /// Mark every switch unavailable; sent once before disconnecting.
    pub async fn announce_offline(&self, client: &impl Publisher) {
        publish_text(client, &self.topics.availability(), availability_payload(false), true).await;
    }

    async fn publish_availability(&self, client: &impl Publisher) {
        let online = self.panel_online();
        publish_text(client, &self.topics.availability(), availability_payload(online), true).await;
    }

    async fn publish_all_states(&self, client: &impl Publisher) {
        for switch in &self.switches {
            self.publish_state(client, switch).await;
        }
    }

    async fn publish_state(&self, client: &impl Publisher, switch: &BypassSwitch) {
        let zone = switch.zone_number();
        let info = switch.info().await;
        let bypassed = info.as_ref().is_some_and(|z| z.bypassed());

        publish_text(client, &self.topics.state(zone), state_payload(bypassed), true).await;
        let attrs = ZoneAttributes {
            zone,
            name: switch.name().to_string(),
            bypassed,
            updated: info.map(|z| z.last_changed),
        };
        publish_json(client, &self.topics.attributes(zone), &attrs, true).await;
    }
}

async fn publish_text(client: &impl Publisher, topic: &str, payload: &str, retain: bool) {
    if let Err(e) = client.publish(topic, payload.as_bytes().to_vec(), retain).await {
        error!("Failed to publish to {topic}: {e}");
    }
}

async fn publish_json(client: &impl Publisher, topic: &str, payload: &impl Serialize, retain: bool) {
    match serde_json::to_vec(payload) {
        Ok(json) => {
            if let Err(e) = client.publish(topic, json, retain).await {
                error!("Failed to publish to {topic}: {e}");
            }
        }
        Err(e) => error!("Failed to serialize MQTT payload: {e}"),
    }
}
