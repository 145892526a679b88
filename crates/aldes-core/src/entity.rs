// ── Sensor entities ──
//
// Presentation-side view of a product: one entity per (product, sensor)
// pair, carrying the naming and device grouping a host application shows.

use std::sync::Arc;

use serde::Serialize;

use crate::gateway::ProductGateway;
use crate::model::{Product, SensorDefinition, SensorValue};

/// Integration domain, used in identifiers and coordinator names.
pub const DOMAIN: &str = "aldes";

pub const MANUFACTURER: &str = "Aldes";

/// Device a set of entities is grouped under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    /// `(domain, product id)`.
    pub identifiers: (&'static str, String),
    pub manufacturer: &'static str,
    /// Friendly product name.
    pub model: String,
    /// Raw product name.
    pub name: String,
}

impl DeviceInfo {
    pub fn for_product<G: ProductGateway>(product: &Product<G>) -> Self {
        Self {
            identifiers: (DOMAIN, product.id().to_owned()),
            manufacturer: MANUFACTURER,
            model: product.get_display_name().to_owned(),
            name: product.name().to_owned(),
        }
    }
}

/// One sensor of one product.
pub struct SensorEntity<G> {
    product: Arc<Product<G>>,
    definition: &'static SensorDefinition,
    name: String,
    unique_id: String,
    device: DeviceInfo,
}

impl<G: ProductGateway> SensorEntity<G> {
    pub fn new(product: Arc<Product<G>>, definition: &'static SensorDefinition) -> Self {
        let name = format!("{} {}", product.get_display_name(), definition.name);
        let unique_id = format!("{}-{}", product.id(), slug(definition.name));
        let device = DeviceInfo::for_product(&product);
        Self {
            product,
            definition,
            name,
            unique_id,
            device,
        }
    }

    pub fn sensor_id(&self) -> &'static str {
        self.definition.id
    }

    /// `"{product display name} {sensor name}"`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stable across restarts: `"{product id}-{sensor-name}"`.
    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    pub fn definition(&self) -> &'static SensorDefinition {
        self.definition
    }

    pub fn device(&self) -> &DeviceInfo {
        &self.device
    }

    pub fn product(&self) -> &Arc<Product<G>> {
        &self.product
    }

    /// Current reading from the product's latest state.
    pub fn native_value(&self) -> Option<SensorValue> {
        self.product.get_sensor_value(self.definition.id)
    }
}

/// Every sensor entity of a product, in catalog order.
pub fn sensor_entities<G: ProductGateway>(product: &Arc<Product<G>>) -> Vec<SensorEntity<G>> {
    product
        .get_available_sensors()
        .iter()
        .map(|definition| SensorEntity::new(Arc::clone(product), definition))
        .collect()
}

fn slug(name: &str) -> String {
    name.to_lowercase().replace(' ', "-")
}
