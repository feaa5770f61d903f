// MIT License - Copyright (c) 2026 Peter Wright
// Outbound MQTT operations used by the bridge

use async_trait::async_trait;
use rumqttc::{AsyncClient, QoS};

use crate::error::Result;

/// The subset of an MQTT client the bridge publishes through.
///
/// Implemented for [`rumqttc::AsyncClient`]; every message goes out at QoS 1.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, topic: &str, payload: Vec<u8>, retain: bool) -> Result<()>;

    async fn subscribe(&self, filter: &str) -> Result<()>;
}

#[async_trait]
impl Publisher for AsyncClient {
    async fn publish(&self, topic: &str, payload: Vec<u8>, retain: bool) -> Result<()> {
        AsyncClient::publish(self, topic, QoS::AtLeastOnce, retain, payload).await?;
        Ok(())
    }

    async fn subscribe(&self, filter: &str) -> Result<()> {
        AsyncClient::subscribe(self, filter, QoS::AtLeastOnce).await?;
        Ok(())
    }
}
