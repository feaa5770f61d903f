// MIT License - Copyright (c) 2026 Peter Wright
// Error types

/// All errors that can occur in the zone-bypass-bridge library.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid zone: {zone} (max: {max})")]
    InvalidZone { zone: u32, max: u32 },

    #[error("Invalid zone count: {count} (max: {max})")]
    InvalidZoneCount { count: u32, max: u32 },

    #[error("Controller error: {details}")]
    Controller { details: String },

    #[error("Controller rejected bypass toggle for zone {zone}")]
    CommandRejected { zone: u32 },

    #[error("Failed to parse config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Invalid config: {reason}")]
    InvalidConfig { reason: String },

    #[error("MQTT client error: {0}")]
    Mqtt(#[from] rumqttc::ClientError),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Channel closed")]
    ChannelClosed,
}

impl BridgeError {
    /// Whether this error is transient and the operation may be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BridgeError::Io(_)
                | BridgeError::Controller { .. }
                | BridgeError::Mqtt(_)
                | BridgeError::ChannelClosed
        )
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
