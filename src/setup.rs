// MIT License - Copyright (c) 2026 Peter Wright
// Build bypass switches from configuration

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use crate::config::{SwitchOptions, ZoneInfo, MAX_ZONES};
use crate::controller::AlarmController;
use crate::error::{BridgeError, Result};
use crate::switch::BypassSwitch;

/// Receives the entities built by [`setup_bypass_switches`].
///
/// This is the host platform's "add entities" hook.
pub trait EntitySink {
    fn add_entities(&mut self, entities: Vec<BypassSwitch>);
}

impl<F> EntitySink for F
where
    F: FnMut(Vec<BypassSwitch>),
{
    fn add_entities(&mut self, entities: Vec<BypassSwitch>) {
        self(entities)
    }
}

/// Look up the user-supplied info for a zone, if any.
pub fn find_zone_info(zone_num: u32, zones: &HashMap<u32, ZoneInfo>) -> Option<&ZoneInfo> {
    zones.get(&zone_num)
}

/// Create one bypass switch per zone and hand them to `sink` in a single batch.
///
/// Returns the number of switches created; zero when bypass switches are
/// disabled in `options`.
pub fn setup_bypass_switches(
    options: &SwitchOptions,
    zones: &HashMap<u32, ZoneInfo>,
    controller: Arc<dyn AlarmController>,
    sink: &mut impl EntitySink,
) -> Result<usize> {
    if !options.create_zone_bypass_switches {
        return Ok(0);
    }
    if options.num_zones > MAX_ZONES {
        return Err(BridgeError::InvalidZoneCount {
            count: options.num_zones,
            max: MAX_ZONES,
        });
    }

    let entities: Vec<BypassSwitch> = (1..=options.num_zones)
        .map(|zone_num| {
            BypassSwitch::new(zone_num, find_zone_info(zone_num, zones), Arc::clone(&controller))
        })
        .collect();

    let count = entities.len();
    info!("Adding {count} zone bypass switches for {}", controller.alarm_name());
    sink.add_entities(entities);
    Ok(count)
}
