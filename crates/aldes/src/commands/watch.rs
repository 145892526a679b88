//! Live polling: prints readings every time a product refreshes.

use chrono::Utc;
use futures_util::future::select_all;
use tokio::sync::watch;

use aldes_core::{Hub, RefreshStatus};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::commands::products::ProductView;
use crate::commands::sensors;
use crate::config;
use crate::error::CliError;
use crate::output;

pub async fn handle(args: WatchArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let hub_config = config::with_scan_interval(config::resolve_hub_config(global)?, args.interval);
    let interval = hub_config.scan_interval;
    let hub = Hub::connect(hub_config).await?;

    let result = watch_products(&hub, args.id.as_deref(), global, interval).await;
    hub.shutdown().await;
    result
}

async fn watch_products(
    hub: &Hub,
    id: Option<&str>,
    global: &GlobalOpts,
    interval: std::time::Duration,
) -> Result<(), CliError> {
    let ids: Vec<String> = match id {
        Some(id) => vec![hub.coordinator(id)?.product().id().to_owned()],
        None => hub.products().map(|p| p.id().to_owned()).collect(),
    };
    if ids.is_empty() {
        eprintln!("No supported products on this account.");
        return Ok(());
    }

    let mut receivers: Vec<watch::Receiver<RefreshStatus>> = Vec::with_capacity(ids.len());
    // Whether the last refresh of each product succeeded; a product that
    // just started failing gets one early retry instead of a full interval.
    let mut healthy: Vec<bool> = Vec::with_capacity(ids.len());
    for id in &ids {
        let coordinator = hub.coordinator(id)?;
        let status = coordinator.status();
        receivers.push(coordinator.subscribe());
        healthy.push(status.last_update_success);
        print_refresh(hub, id, &status, global)?;
    }

    if !global.quiet {
        eprintln!(
            "Polling every {}s, press Ctrl-C to stop.",
            interval.as_secs()
        );
    }

    loop {
        let (changed, index) = tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            (changed, index, _) = select_all(receivers.iter_mut().map(|rx| Box::pin(rx.changed()))) => {
                (changed, index)
            }
        };
        if changed.is_err() {
            break;
        }
        let status = receivers[index].borrow_and_update().clone();
        if healthy[index] && !status.last_update_success {
            hub.coordinator(&ids[index])?.request_refresh();
        }
        healthy[index] = status.last_update_success;
        print_refresh(hub, &ids[index], &status, global)?;
    }

    Ok(())
}

fn print_refresh(
    hub: &Hub,
    id: &str,
    status: &RefreshStatus,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if let Some(ref error) = status.last_error {
        eprintln!("{id}: refresh failed: {error}");
        return Ok(());
    }

    let views = sensors::views_for(hub, id)?;

    if matches!(global.output, OutputFormat::Table) && !global.quiet {
        let color = output::should_color(&global.color);
        let product = ProductView::from_product(hub.coordinator(id)?.product());
        let at = status.last_refresh.unwrap_or_else(Utc::now);
        println!(
            "{} {} ({}) {}",
            output::paint_dim(&at.format("[%H:%M:%S]").to_string(), color),
            product.name,
            product.id,
            product.mode_label(color),
        );
    }

    output::print_output(&sensors::render(global, &views), global.quiet);
    Ok(())
}
