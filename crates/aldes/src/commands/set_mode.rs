//! Mode change with accelerated follow-up polling.

use aldes_core::{AcceleratedRefresh, Hub, Mode};

use crate::cli::{GlobalOpts, SetModeArgs};
use crate::commands::products::ProductView;
use crate::config;
use crate::error::CliError;
use crate::output;

pub async fn handle(args: SetModeArgs, global: &GlobalOpts) -> Result<(), CliError> {
    // Reject unknown names before logging in.
    if Mode::from_display_name(&args.mode).is_none() {
        return Err(aldes_core::CoreError::UnknownDisplayMode { name: args.mode }.into());
    }

    let hub_config = config::resolve_hub_config(global)?;
    let SetModeArgs { id, mode } = args;

    if !global.quiet {
        eprintln!("Requesting {mode} on {id}, waiting for the unit to report back...");
    }

    let (outcome, view) = Hub::oneshot(hub_config, |hub| async move {
        let outcome = hub.set_mode(&id, &mode).await?;
        let view = ProductView::from_product(hub.coordinator(&id)?.product());
        Ok((outcome, view))
    })
    .await?;

    if outcome == AcceleratedRefresh::Skipped {
        tracing::debug!("a refresh burst was already running");
    }

    let color = output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        &view,
        |v| format!("{}: {}", v.name, v.mode_label(color)),
        |v| v.mode.map_or_else(|| v.mode_code.clone(), str::to_owned),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
