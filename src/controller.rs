// MIT License - Copyright (c) 2026 Peter Wright
// Alarm controller interface and cached zone state

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use bitflags::bitflags;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::Result;
use crate::event::{event_channel, ControllerEvent, EventReceiver, EventSender, UpdateKind};

bitflags! {
    /// Zone status flags as reported by the panel.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ZoneStatusFlags: u8 {
        /// Zone is open
        const OPEN        = 0b0000_0001;
        /// Zone is faulted
        const FAULT       = 0b0000_0010;
        /// Zone in alarm
        const ALARM       = 0b0000_0100;
        /// Tamper detected
        const TAMPER      = 0b0000_1000;
        /// Low battery (wireless zones)
        const LOW_BATTERY = 0b0001_0000;
        /// Zone is bypassed
        const BYPASS      = 0b0010_0000;
    }
}

impl ZoneStatusFlags {
    /// Get the flags that changed between old and new status.
    pub fn changed(old: Self, new: Self) -> Self {
        old ^ new
    }
}

/// Cached state of a single zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneState {
    pub flags: ZoneStatusFlags,
    pub last_changed: DateTime<Utc>,
}

impl ZoneState {
    pub fn new(flags: ZoneStatusFlags) -> Self {
        Self {
            flags,
            last_changed: Utc::now(),
        }
    }

    pub fn bypassed(&self) -> bool { self.flags.contains(ZoneStatusFlags::BYPASS) }
    pub fn is_open(&self) -> bool { self.flags.contains(ZoneStatusFlags::OPEN) }
    pub fn is_fault(&self) -> bool { self.flags.contains(ZoneStatusFlags::FAULT) }
    pub fn is_alarm(&self) -> bool { self.flags.contains(ZoneStatusFlags::ALARM) }
    pub fn is_tamper(&self) -> bool { self.flags.contains(ZoneStatusFlags::TAMPER) }
    pub fn is_low_battery(&self) -> bool { self.flags.contains(ZoneStatusFlags::LOW_BATTERY) }
}

/// Snapshot of everything the controller knows about the panel's zones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlarmState {
    zones: BTreeMap<u32, ZoneState>,
}

impl AlarmState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn zone(&self, zone: u32) -> Option<&ZoneState> {
        self.zones.get(&zone)
    }

    pub fn zones(&self) -> impl Iterator<Item = (u32, &ZoneState)> {
        self.zones.iter().map(|(id, state)| (*id, state))
    }

    /// Store new flags for a zone. Returns the flags that changed.
    ///
    /// The first status seen for a zone reports no change.
    pub fn update_zone(&mut self, zone: u32, flags: ZoneStatusFlags) -> ZoneStatusFlags {
        match self.zones.get_mut(&zone) {
            Some(state) => {
                let changed = ZoneStatusFlags::changed(state.flags, flags);
                if !changed.is_empty() {
                    state.flags = flags;
                    state.last_changed = Utc::now();
                }
                changed
            }
            None => {
                self.zones.insert(zone, ZoneState::new(flags));
                ZoneStatusFlags::empty()
            }
        }
    }
}

/// The shared alarm controller that bypass switches read from and command.
///
/// Implementations own the panel connection. Switches only ever read the
/// cached [`AlarmState`] and request a bypass toggle.
#[async_trait]
pub trait AlarmController: Send + Sync {
    /// Stable identifier for the panel, used as the prefix of entity unique ids.
    fn unique_id(&self) -> &str;

    /// Display name of the panel.
    fn alarm_name(&self) -> &str;

    /// Current cached state.
    async fn alarm_state(&self) -> AlarmState;

    /// Send the bypass keypress sequence for `zone`. The panel toggles the
    /// bypass; it has no separate set/clear operation.
    async fn toggle_zone_bypass(&self, zone: u32) -> Result<()>;

    /// Subscribe to state-update notifications.
    fn subscribe(&self) -> EventReceiver;
}

/// Shared [`AlarmState`] plus the channel that announces changes to it.
///
/// Controller implementations feed decoded panel status in through
/// [`StateCache::apply_zone_status`] and hand out [`StateCache::subscribe`].
#[derive(Debug, Clone)]
pub struct StateCache {
    state: Arc<RwLock<AlarmState>>,
    event_tx: EventSender,
}

impl Default for StateCache {
    fn default() -> Self {
        Self::new(256)
    }
}

impl StateCache {
    pub fn new(capacity: usize) -> Self {
        let (event_tx, _event_rx) = event_channel(capacity);
        Self {
            state: Arc::new(RwLock::new(AlarmState::new())),
            event_tx,
        }
    }

    pub async fn snapshot(&self) -> AlarmState {
        self.state.read().await.clone()
    }

    pub fn subscribe(&self) -> EventReceiver {
        self.event_tx.subscribe()
    }

    /// Broadcast an event to all subscribers. Having no subscribers is not an error.
    pub fn emit(&self, event: ControllerEvent) {
        let _ = self.event_tx.send(event);
    }

    /// Record a zone's status and announce what changed. Returns the changed flags.
    pub async fn apply_zone_status(&self, zone: u32, flags: ZoneStatusFlags) -> ZoneStatusFlags {
        let changed = self.state.write().await.update_zone(zone, flags);
        if changed.is_empty() {
            return changed;
        }

        debug!("Zone {zone} status changed: {changed:?}");
        if changed.contains(ZoneStatusFlags::BYPASS) {
            self.emit(ControllerEvent::update(UpdateKind::ZoneBypass, zone));
        }
        if !changed.difference(ZoneStatusFlags::BYPASS).is_empty() {
            self.emit(ControllerEvent::update(UpdateKind::Zone, zone));
        }
        changed
    }
}
