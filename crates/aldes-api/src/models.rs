// Wire types for the Aldes cloud API.
//
// Every field the device may omit is an `Option`, so that callers can tell
// "absent" apart from "present but empty" and merge only what arrived.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Response of `POST /oauth2/token/`.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// Per-product status document returned by `GET .../products/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductDocument {
    /// Single-letter mode code (`V`, `Y`, `W`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,

    /// Secondary status code, passed through unmodified.
    #[serde(
        default,
        deserialize_with = "opaque_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub tmpcu: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_data: Option<ProductData>,
}

/// Nested telemetry payload of a product.
///
/// `indicator` and `dateLastFilterUpdate` are kept as raw JSON: a firmware
/// that sends an unexpected type must not fail deserialization of the whole
/// document, it only makes the affected sensor read as "no value".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indicator: Option<Value>,

    #[serde(
        rename = "dateLastFilterUpdate",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub date_last_filter_update: Option<Value>,

    /// Any other field the API sends along.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProductData {
    /// `true` when the payload carries no field at all.
    pub fn is_empty(&self) -> bool {
        self.indicator.is_none() && self.date_last_filter_update.is_none() && self.extra.is_empty()
    }

    /// The `indicator` sub-mapping, if present and an object.
    pub fn indicator(&self) -> Option<&Map<String, Value>> {
        self.indicator.as_ref().and_then(Value::as_object)
    }
}

/// One entry of the account-wide product listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    /// Product (modem) identifier used in every per-product URL.
    pub modem: String,

    /// Product reference, e.g. `AIR_TOP`.
    pub reference: String,

    #[serde(default)]
    pub serial_number: Option<String>,

    #[serde(default, rename = "type")]
    pub product_type: Option<String>,

    #[serde(default)]
    pub is_connected: Option<bool>,

    #[serde(default)]
    pub indicator: Option<ProductIndicator>,
}

/// Subset of the listing's `indicator` used to seed a product's state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductIndicator {
    #[serde(default)]
    pub current_air_mode: Option<String>,

    #[serde(default, deserialize_with = "opaque_string")]
    pub tmpcu: Option<String>,
}

/// JSON-RPC envelope for `POST .../products/{id}/commands`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct CommandRequest<'a> {
    pub jsonrpc: &'static str,
    pub method: &'static str,
    pub params: [&'a str; 1],
}

impl<'a> CommandRequest<'a> {
    pub(crate) fn change_mode(code: &'a str) -> Self {
        Self {
            jsonrpc: "2.0",
            method: "changeMode",
            params: [code],
        }
    }
}

/// Some firmware reports `tmpcu` as a number; keep it opaque.
fn opaque_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}
