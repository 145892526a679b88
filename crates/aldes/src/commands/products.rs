//! Product listing.

use serde::Serialize;
use tabled::Tabled;

use aldes_core::{Hub, Product, ProductGateway};

use crate::cli::GlobalOpts;
use crate::config;
use crate::error::CliError;
use crate::output;

// ── Views ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ProductView {
    pub id: String,
    pub name: String,
    pub reference: String,
    /// Display name, `None` for a code this tool does not know.
    pub mode: Option<&'static str>,
    pub mode_code: String,
    /// Opaque status string reported alongside the mode.
    pub tmpcu: String,
}

impl ProductView {
    pub fn from_product<G: ProductGateway>(product: &Product<G>) -> Self {
        Self {
            id: product.id().to_owned(),
            name: product.get_display_name().to_owned(),
            reference: product.name().to_owned(),
            mode: product.get_display_mode().ok(),
            mode_code: product.mode_code(),
            tmpcu: product.tmpcu(),
        }
    }

    /// Mode for human output: display name, or the raw code when unknown.
    pub fn mode_label(&self, color: bool) -> String {
        match self.mode {
            Some(mode) => output::paint_mode(mode, true, color),
            None => output::paint_mode(&format!("? ({})", self.mode_code), false, color),
        }
    }
}

#[derive(Tabled)]
struct ProductRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Reference")]
    reference: String,
    #[tabled(rename = "Mode")]
    mode: String,
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let hub_config = config::resolve_hub_config(global)?;
    let views = Hub::oneshot(hub_config, |hub| async move {
        Ok(hub
            .products()
            .map(|p| ProductView::from_product(p))
            .collect::<Vec<_>>())
    })
    .await?;

    let color = output::should_color(&global.color);
    let out = output::render_list(
        &global.output,
        &views,
        |v| ProductRow {
            id: v.id.clone(),
            name: v.name.clone(),
            reference: v.reference.clone(),
            mode: v.mode_label(color),
        },
        |v| v.id.clone(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
