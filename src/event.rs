// MIT License - Copyright (c) 2026 Peter Wright
// Controller state-update notifications

/// Category of state carried by a [`ControllerEvent::StateUpdate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateKind {
    /// Zone open/fault/alarm status
    Zone,
    /// Zone bypass status
    ZoneBypass,
    /// Partition arm state
    Partition,
    /// Keypad display/LED state
    Keypad,
}

/// All events that can be emitted by an alarm controller.
///
/// Consumers subscribe via `controller.subscribe()` to receive a
/// `tokio::sync::broadcast::Receiver<ControllerEvent>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerEvent {
    /// Connection to the panel established
    Connected,
    /// Connection to the panel lost
    Disconnected,
    /// Cached state changed. `ids: None` means every entity of `kind`.
    StateUpdate {
        kind: UpdateKind,
        ids: Option<Vec<u32>>,
    },
}

impl ControllerEvent {
    /// State update for a single entity.
    pub fn update(kind: UpdateKind, id: u32) -> Self {
        Self::StateUpdate {
            kind,
            ids: Some(vec![id]),
        }
    }

    /// State update for every entity of `kind`.
    pub fn update_all(kind: UpdateKind) -> Self {
        Self::StateUpdate { kind, ids: None }
    }

    /// Whether this is a state update of `kind` that covers `id`.
    pub fn covers(&self, kind: UpdateKind, id: u32) -> bool {
        match self {
            Self::StateUpdate { kind: k, ids } if *k == kind => {
                ids.as_ref().is_none_or(|ids| ids.contains(&id))
            }
            _ => false,
        }
    }
}

/// Type alias for the broadcast sender.
pub type EventSender = tokio::sync::broadcast::Sender<ControllerEvent>;

/// Type alias for the broadcast receiver.
pub type EventReceiver = tokio::sync::broadcast::Receiver<ControllerEvent>;

/// Create a new event channel with the given capacity.
pub fn event_channel(capacity: usize) -> (EventSender, EventReceiver) {
    tokio::sync::broadcast::channel(capacity)
}
