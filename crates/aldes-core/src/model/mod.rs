// ── Domain model ──
//
// Static tables (modes, sensor catalog, product references) and the
// stateful `Product` built on top of them.

pub mod catalog;
pub mod mode;
pub mod product;

pub use catalog::{
    DeviceClass, EntityCategory, SENSORS, SensorDefinition, StateClass, display_name_for,
    is_product_supported,
};
pub use mode::{Mode, display_modes};
pub use product::{Product, ProductState, SensorValue};
