// aldes-core: Product model and refresh coordination between aldes-api and consumers.

pub mod config;
pub mod coordinator;
pub mod entity;
pub mod error;
pub mod gateway;
pub mod hub;
pub mod model;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::HubConfig;
pub use coordinator::{
    AcceleratedRefresh, DEFAULT_SCAN_INTERVAL, ProductCoordinator, REQUEST_REFRESH_COOLDOWN,
    RefreshStatus,
};
pub use entity::{DOMAIN, DeviceInfo, MANUFACTURER, SensorEntity, sensor_entities};
pub use error::CoreError;
pub use gateway::ProductGateway;
pub use hub::Hub;

pub use model::{
    DeviceClass, EntityCategory, Mode, Product, ProductState, SENSORS, SensorDefinition,
    SensorValue, StateClass, display_modes,
};
