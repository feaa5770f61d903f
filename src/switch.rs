// MIT License - Copyright (c) 2026 Peter Wright
// Zone bypass switch entity

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::ZoneInfo;
use crate::controller::{AlarmController, ZoneState};
use crate::error::Result;
use crate::event::{ControllerEvent, UpdateKind};

/// A switch entity mirroring one zone's bypass status.
///
/// The panel only offers a bypass *toggle*, so turning the switch on and
/// turning it off both send the same command; the panel's next status report
/// settles the actual state.
#[derive(Clone)]
pub struct BypassSwitch {
    zone_number: u32,
    name: String,
    unique_id: String,
    controller: Arc<dyn AlarmController>,
}

impl fmt::Debug for BypassSwitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BypassSwitch")
            .field("zone_number", &self.zone_number)
            .field("name", &self.name)
            .field("unique_id", &self.unique_id)
            .finish_non_exhaustive()
    }
}

impl BypassSwitch {
    pub fn new(
        zone_number: u32,
        zone_info: Option<&ZoneInfo>,
        controller: Arc<dyn AlarmController>,
    ) -> Self {
        let name_suffix = format!("zone_{zone_number}_bypass");
        let unique_id = format!("{}_{name_suffix}", controller.unique_id());

        // A configured zone name wins over the generated one
        let name = match zone_info.and_then(|info| info.name.as_deref()) {
            Some(zone_name) => format!("{zone_name}_bypass"),
            None => format!("{}_{name_suffix}", controller.alarm_name()),
        };

        debug!("Setting up zone: {name}");
        Self {
            zone_number,
            name,
            unique_id,
            controller,
        }
    }

    pub fn zone_number(&self) -> u32 {
        self.zone_number
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    pub fn controller(&self) -> &Arc<dyn AlarmController> {
        &self.controller
    }

    /// The zone's entry in the controller's alarm state.
    pub async fn info(&self) -> Option<ZoneState> {
        self.controller
            .alarm_state()
            .await
            .zone(self.zone_number)
            .cloned()
    }

    /// Whether the zone is bypassed. Zones the panel never reported read as off.
    pub async fn is_on(&self) -> bool {
        self.info().await.is_some_and(|zone| zone.bypassed())
    }

    /// Send the bypass keypress sequence to toggle the zone bypass.
    pub async fn turn_on(&self) -> Result<()> {
        info!("Bypass on requested for zone {} ({})", self.zone_number, self.name);
        self.controller.toggle_zone_bypass(self.zone_number).await
    }

    /// Send the bypass keypress sequence to toggle the zone bypass.
    pub async fn turn_off(&self) -> Result<()> {
        info!("Bypass off requested for zone {} ({})", self.zone_number, self.name);
        self.controller.toggle_zone_bypass(self.zone_number).await
    }

    /// Whether `event` means this switch's published state may be stale.
    pub fn should_update(&self, event: &ControllerEvent) -> bool {
        match event {
            ControllerEvent::Connected | ControllerEvent::Disconnected => true,
            _ => event.covers(UpdateKind::ZoneBypass, self.zone_number),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::controller::{AlarmState, StateCache, ZoneStatusFlags};
    use crate::event::EventReceiver;

    /// Controller double that records toggles instead of talking to a panel.
    pub(crate) struct FakeController {
        pub cache: StateCache,
        pub toggles: Mutex<Vec<u32>>,
    }

    impl FakeController {
        pub(crate) fn new() -> Arc<Self> {
            Arc::new(Self {
                cache: StateCache::new(16),
                toggles: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl AlarmController for FakeController {
        fn unique_id(&self) -> &str {
            "evl_1a2b3c"
        }

        fn alarm_name(&self) -> &str {
            "home_alarm"
        }

        async fn alarm_state(&self) -> AlarmState {
            self.cache.snapshot().await
        }

        async fn toggle_zone_bypass(&self, zone: u32) -> Result<()> {
            self.toggles.lock().unwrap().push(zone);
            Ok(())
        }

        fn subscribe(&self) -> EventReceiver {
            self.cache.subscribe()
        }
    }

    #[test]
    fn test_default_name_and_unique_id() {
        let switch = BypassSwitch::new(3, None, FakeController::new());
        assert_eq!(switch.name(), "home_alarm_zone_3_bypass");
        assert_eq!(switch.unique_id(), "evl_1a2b3c_zone_3_bypass");
        assert_eq!(switch.zone_number(), 3);
    }

    #[test]
    fn test_configured_name_overrides_default() {
        let info = ZoneInfo::named("Front Door");
        let switch = BypassSwitch::new(1, Some(&info), FakeController::new());
        assert_eq!(switch.name(), "Front Door_bypass");
        // Unique id never depends on the configured name
        assert_eq!(switch.unique_id(), "evl_1a2b3c_zone_1_bypass");
    }

    #[test]
    fn test_zone_info_without_name_keeps_default() {
        let info = ZoneInfo {
            name: None,
            zone_type: Some("motion".into()),
        };
        let switch = BypassSwitch::new(2, Some(&info), FakeController::new());
        assert_eq!(switch.name(), "home_alarm_zone_2_bypass");
    }

    #[tokio::test]
    async fn test_is_on_follows_bypass_flag() {
        let controller = FakeController::new();
        let switch = BypassSwitch::new(4, None, controller.clone());
        assert!(!switch.is_on().await);

        controller.cache.apply_zone_status(4, ZoneStatusFlags::BYPASS).await;
        assert!(switch.is_on().await);

        controller.cache.apply_zone_status(4, ZoneStatusFlags::OPEN).await;
        assert!(!switch.is_on().await);
        assert!(switch.info().await.unwrap().is_open());
    }

    #[tokio::test]
    async fn test_turn_on_and_off_both_toggle() {
        let controller = FakeController::new();
        let switch = BypassSwitch::new(6, None, controller.clone());
        switch.turn_on().await.unwrap();
        switch.turn_off().await.unwrap();
        switch.turn_on().await.unwrap();
        assert_eq!(*controller.toggles.lock().unwrap(), vec![6, 6, 6]);
    }

    #[test]
    fn test_should_update() {
        let switch = BypassSwitch::new(5, None, FakeController::new());
        assert!(switch.should_update(&ControllerEvent::update(UpdateKind::ZoneBypass, 5)));
        assert!(switch.should_update(&ControllerEvent::update_all(UpdateKind::ZoneBypass)));
        assert!(switch.should_update(&ControllerEvent::Disconnected));
        assert!(!switch.should_update(&ControllerEvent::update(UpdateKind::ZoneBypass, 6)));
        assert!(!switch.should_update(&ControllerEvent::update(UpdateKind::Zone, 5)));
    }
}
