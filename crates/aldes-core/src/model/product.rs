// ── Product model ──
//
// Last-known state of one ventilation unit plus typed access to its sensor
// readings. State is swapped atomically on every refresh, so readers never
// block the coordinator and always see a consistent snapshot.

use std::fmt;
use std::sync::Arc;

use aldes_api::{ProductData, ProductDocument};
use arc_swap::ArcSwap;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::catalog::{self, SENSORS, SensorDefinition};
use super::mode::{self, Mode};
use crate::error::CoreError;
use crate::gateway::ProductGateway;

/// Timestamp format of `dateLastFilterUpdate`.
const FILTER_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%SZ";

/// Mutable device state, replaced wholesale on each refresh.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProductState {
    /// Raw firmware mode code; may be a code this crate does not know.
    pub mode: String,
    pub tmpcu: String,
    pub product_data: ProductData,
}

impl ProductState {
    /// Merge a status document: `mode` and `tmpcu` update independently when
    /// present, `product_data` is replaced entirely when present.
    pub fn apply(&mut self, doc: ProductDocument) {
        if let Some(mode) = doc.mode {
            self.mode = mode;
        }
        if let Some(tmpcu) = doc.tmpcu {
            self.tmpcu = tmpcu;
        }
        if let Some(product_data) = doc.product_data {
            self.product_data = product_data;
        }
    }
}

/// A sensor reading.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SensorValue {
    Date(NaiveDate),
    /// Whole-number readings (fan speeds, air flows) keep their exact value.
    Integer(i64),
    Number(f64),
    Text(String),
    Bool(bool),
    /// Nested arrays or objects, passed through as-is.
    Raw(Value),
}

impl SensorValue {
    /// Convert an indicator value; JSON `null` reads as no value.
    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Bool(b) => Some(Self::Bool(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Some(Self::Integer(i)),
                None if n.is_u64() => Some(Self::Raw(value.clone())),
                None => n.as_f64().map(Self::Number),
            },
            Value::String(s) => Some(Self::Text(s.clone())),
            other => Some(Self::Raw(other.clone())),
        }
    }

    /// Numeric view of the reading; integers beyond 2^53 lose precision.
    #[allow(clippy::cast_precision_loss, clippy::as_conversions)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(i) => Some(*i as f64),
            Self::Number(n) => Some(*n),
            Self::Raw(Value::Number(n)) => n.as_f64(),
            _ => None,
        }
    }
}

impl fmt::Display for SensorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Date(d) => write!(f, "{d}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Raw(v) => write!(f, "{v}"),
        }
    }
}

/// One Aldes product bound to the gateway that reaches it.
pub struct Product<G> {
    gateway: Arc<G>,
    id: String,
    name: String,
    state: ArcSwap<ProductState>,
}

impl<G: ProductGateway> Product<G> {
    /// Build a product with its initial mode and status; `product_data`
    /// starts empty until the first [`update()`](Self::update).
    pub fn new(
        gateway: Arc<G>,
        id: impl Into<String>,
        name: impl Into<String>,
        mode: impl Into<String>,
        tmpcu: impl Into<String>,
    ) -> Self {
        Self {
            gateway,
            id: id.into(),
            name: name.into(),
            state: ArcSwap::from_pointee(ProductState {
                mode: mode.into(),
                tmpcu: tmpcu.into(),
                product_data: ProductData::default(),
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Raw product name (the API reference, e.g. `AIR_TOP`).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current state snapshot.
    pub fn snapshot(&self) -> Arc<ProductState> {
        self.state.load_full()
    }

    pub fn mode_code(&self) -> String {
        self.state.load().mode.clone()
    }

    pub fn tmpcu(&self) -> String {
        self.state.load().tmpcu.clone()
    }

    // ── Read-only accessors ──────────────────────────────────────────

    /// Friendly name if one is registered for this product, else the raw name.
    pub fn get_display_name(&self) -> &str {
        catalog::display_name_for(&self.name).unwrap_or(self.name.as_str())
    }

    pub fn get_display_modes(&self) -> Vec<&'static str> {
        mode::display_modes()
    }

    /// Display name of the current mode.
    pub fn get_display_mode(&self) -> Result<&'static str, CoreError> {
        let state = self.state.load();
        Mode::from_code(&state.mode)
            .map(Mode::display_name)
            .ok_or_else(|| CoreError::UnknownModeCode {
                code: state.mode.clone(),
            })
    }

    pub fn get_available_sensors(&self) -> &'static [SensorDefinition] {
        &SENSORS
    }

    /// Current reading of a sensor.
    ///
    /// Absent data, an unknown sensor id, a missing key and a malformed
    /// filter date all read as `None`: partial telemetry is normal.
    ///
    /// The filter date is only taken from the top level of `product_data`.
    /// Unlike the Home Assistant integration, a `dateLastFilterUpdate` key
    /// inside `indicator` is not consulted when the top-level one is absent.
    pub fn get_sensor_value(&self, sensor_id: &str) -> Option<SensorValue> {
        let state = self.state.load();
        let data = &state.product_data;
        if data.is_empty() {
            return None;
        }

        let sensor = catalog::sensor(sensor_id)?;

        if sensor.is_top_level() {
            return data
                .date_last_filter_update
                .as_ref()
                .and_then(Value::as_str)
                .and_then(parse_filter_date)
                .map(SensorValue::Date);
        }

        data.indicator()
            .and_then(|indicator| indicator.get(sensor.key))
            .and_then(SensorValue::from_json)
    }

    // ── Remote operations ────────────────────────────────────────────

    /// Request the mode with the given display name.
    ///
    /// Local state is left alone; the new mode shows up on a later refresh.
    pub async fn maybe_set_mode_from_display(&self, display_mode: &str) -> Result<(), CoreError> {
        let mode =
            Mode::from_display_name(display_mode).ok_or_else(|| CoreError::UnknownDisplayMode {
                name: display_mode.to_owned(),
            })?;
        self.gateway.request_set_mode(&self.id, mode.code()).await
    }

    /// Fetch the latest document and merge it into local state.
    pub async fn update(&self) -> Result<(), CoreError> {
        let doc = self.gateway.get_product(&self.id).await?;
        debug!(
            product = %self.id,
            mode = ?doc.mode,
            has_data = doc.product_data.is_some(),
            "merging product document"
        );

        let mut next = ProductState::clone(&self.state.load());
        next.apply(doc);
        self.state.store(Arc::new(next));
        Ok(())
    }
}

impl<G> fmt::Debug for Product<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Product")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("state", &self.state.load_full())
            .finish_non_exhaustive()
    }
}

fn parse_filter_date(raw: &str) -> Option<NaiveDate> {
    NaiveDateTime::parse_from_str(raw, FILTER_DATE_FORMAT)
        .ok()
        .map(|dt| dt.date())
}
