// ── Sensor catalog ──
//
// Static table mapping logical sensor ids to the remote field they read and
// the attributes an entity needs to present them.

use serde::Serialize;

/// Remote key of the only sensor read from the top level of `product_data`.
pub const LAST_FILTER_UPDATE_KEY: &str = "dateLastFilterUpdate";

/// What kind of physical quantity a sensor reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    Date,
    Temperature,
    VolumeFlowRate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StateClass {
    Measurement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityCategory {
    Config,
    Diagnostic,
}

/// Static description of one sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SensorDefinition {
    /// Logical id (`exit_air_temperature`).
    pub id: &'static str,
    /// Field name in the API payload (`AIR_EXT_TPT`).
    pub key: &'static str,
    pub name: &'static str,
    pub icon: Option<&'static str>,
    pub unit: Option<&'static str>,
    pub device_class: Option<DeviceClass>,
    pub state_class: Option<StateClass>,
    pub entity_category: Option<EntityCategory>,
}

impl SensorDefinition {
    /// Whether this sensor lives at the top level rather than in `indicator`.
    pub fn is_top_level(&self) -> bool {
        self.key == LAST_FILTER_UPDATE_KEY
    }
}

const DIAGNOSTIC: Option<EntityCategory> = Some(EntityCategory::Diagnostic);

const fn temperature(
    id: &'static str,
    key: &'static str,
    name: &'static str,
) -> SensorDefinition {
    SensorDefinition {
        id,
        key,
        name,
        icon: Some("mdi:thermometer"),
        unit: Some("°C"),
        device_class: Some(DeviceClass::Temperature),
        state_class: Some(StateClass::Measurement),
        entity_category: DIAGNOSTIC,
    }
}

const fn air_flow(id: &'static str, key: &'static str, name: &'static str) -> SensorDefinition {
    SensorDefinition {
        id,
        key,
        name,
        icon: Some("mdi:air-filter"),
        unit: Some("m³/h"),
        device_class: Some(DeviceClass::VolumeFlowRate),
        state_class: None,
        entity_category: DIAGNOSTIC,
    }
}

const fn motor_speed(id: &'static str, key: &'static str, name: &'static str) -> SensorDefinition {
    SensorDefinition {
        id,
        key,
        name,
        icon: Some("mdi:fan-speed-1"),
        unit: Some("rpm"),
        device_class: None,
        state_class: None,
        entity_category: DIAGNOSTIC,
    }
}

/// Every sensor exposed for a product, in presentation order.
pub static SENSORS: [SensorDefinition; 9] = [
    SensorDefinition {
        id: "last_filter_change",
        key: LAST_FILTER_UPDATE_KEY,
        name: "Last Filter Change",
        icon: Some("mdi:air-filter"),
        unit: None,
        device_class: Some(DeviceClass::Date),
        state_class: None,
        entity_category: DIAGNOSTIC,
    },
    SensorDefinition {
        id: "current_mode",
        key: "AIR_CURRENT_MODE",
        name: "Current Mode",
        icon: Some("mdi:fan"),
        unit: None,
        device_class: None,
        state_class: None,
        entity_category: DIAGNOSTIC,
    },
    air_flow("exit_air_flow", "AIR_EXTF_FLW", "Exit Air Flow"),
    motor_speed("exit_air_speed", "AIR_EXTF_SPD", "Exit Air Motor Speed"),
    temperature("exit_air_temperature", "AIR_EXT_TPT", "Exit Air Temperature"),
    air_flow("intake_air_flow", "AIR_FFE_FLW", "Intake Air Flow"),
    temperature("outside_temperature", "AIR_OUTSIDE_TPT", "Outside Temperature"),
    temperature(
        "reject_air_temperature",
        "AIR_REJECT_TPT",
        "Rejected Air Temperature",
    ),
    motor_speed("intake_air_speed", "AIR_VI_SPD", "Intake Air Motor Speed"),
];

/// Look up a sensor by logical id.
pub fn sensor(id: &str) -> Option<&'static SensorDefinition> {
    SENSORS.iter().find(|s| s.id == id)
}

// ── Product references ───────────────────────────────────────────────

/// Friendly names for the product references this crate supports.
static DISPLAY_NAMES: [(&str, &str); 1] = [("AIR_TOP", "InspirAIR TOP")];

/// Friendly name of a product reference, if one is registered.
pub fn display_name_for(reference: &str) -> Option<&'static str> {
    DISPLAY_NAMES
        .iter()
        .find(|(r, _)| *r == reference)
        .map(|(_, name)| *name)
}

/// A reference is supported exactly when it has a friendly name.
pub fn is_product_supported(reference: &str) -> bool {
    display_name_for(reference).is_some()
}
