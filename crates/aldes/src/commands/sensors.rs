//! Sensor readings of one product.

use serde::Serialize;
use tabled::Tabled;

use aldes_core::{CoreError, Hub, ProductGateway, SensorEntity, SensorValue};

use crate::cli::{GlobalOpts, SensorsArgs};
use crate::config;
use crate::error::CliError;
use crate::output;

// ── Views ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct SensorView {
    pub product: String,
    pub sensor: &'static str,
    pub unique_id: String,
    pub name: String,
    pub value: Option<SensorValue>,
    pub unit: Option<&'static str>,
}

impl SensorView {
    pub fn from_entity<G: ProductGateway>(entity: &SensorEntity<G>) -> Self {
        Self {
            product: entity.product().id().to_owned(),
            sensor: entity.sensor_id(),
            unique_id: entity.unique_id().to_owned(),
            name: entity.name().to_owned(),
            value: entity.native_value(),
            unit: entity.definition().unit,
        }
    }
}

#[derive(Tabled)]
struct SensorRow {
    #[tabled(rename = "Sensor")]
    name: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Unit")]
    unit: String,
}

/// Render readings in the selected format.
pub fn render(global: &GlobalOpts, views: &[SensorView]) -> String {
    output::render_list(
        &global.output,
        views,
        |v| SensorRow {
            name: v.name.clone(),
            value: v
                .value
                .as_ref()
                .map_or_else(|| "-".into(), ToString::to_string),
            unit: v.unit.unwrap_or_default().to_owned(),
        },
        |v| {
            let value = v.value.as_ref().map(ToString::to_string).unwrap_or_default();
            format!("{}={value}", v.sensor)
        },
    )
}

/// Current readings of every sensor of a product, in catalog order.
pub fn views_for<G: ProductGateway>(hub: &Hub<G>, id: &str) -> Result<Vec<SensorView>, CoreError> {
    let coordinator = hub.coordinator(id)?;
    Ok(aldes_core::sensor_entities(coordinator.product())
        .iter()
        .map(SensorView::from_entity)
        .collect())
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: SensorsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let hub_config = config::resolve_hub_config(global)?;
    let id = args.id;
    let views = Hub::oneshot(hub_config, |hub| async move { views_for(&hub, &id) }).await?;

    let out = render(global, &views);
    output::print_output(&out, global.quiet);
    Ok(())
}
