// ── Hub ──
//
// Account-level entry point: discovers the supported products of an Aldes
// account, owns one coordinator per product and the polling tasks that
// drive them.

use std::sync::Arc;
use std::time::Duration;

use aldes_api::{AldesClient, ProductSummary, TransportConfig};
use futures_util::future::join_all;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::HubConfig;
use crate::coordinator::{AcceleratedRefresh, ProductCoordinator};
use crate::entity::{SensorEntity, sensor_entities};
use crate::error::CoreError;
use crate::gateway::ProductGateway;
use crate::model::{Product, is_product_supported};

/// Supported products of one account and their coordinators.
///
/// Cheaply cloneable.
pub struct Hub<G = AldesClient> {
    inner: Arc<HubInner<G>>,
}

struct HubInner<G> {
    gateway: Arc<G>,
    coordinators: Vec<Arc<ProductCoordinator<G>>>,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl<G> Clone for Hub<G> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Hub<AldesClient> {
    /// Log in, discover products, refresh each once, then start polling.
    ///
    /// A zero `scan_interval` leaves polling off, for one-shot use.
    pub async fn connect(config: HubConfig) -> Result<Self, CoreError> {
        let transport = TransportConfig {
            timeout: config.timeout,
            ca_cert: config.ca_cert.clone(),
        };
        let client = AldesClient::new(config.api_url.clone(), &transport)?;
        client
            .authenticate(&config.username, &config.password)
            .await?;
        debug!(url = %config.api_url, "authenticated");

        let summaries = client.list_products().await?;
        let hub = Self::from_products(Arc::new(client), summaries, config.scan_interval);

        hub.refresh_all().await?;
        if !config.scan_interval.is_zero() {
            hub.start_polling().await;
        }

        info!(products = hub.inner.coordinators.len(), "connected to Aldes");
        Ok(hub)
    }

    /// Connect without background polling, run `f`, shut down.
    pub async fn oneshot<F, Fut, T>(config: HubConfig, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(Hub) -> Fut,
        Fut: Future<Output = Result<T, CoreError>>,
    {
        let mut cfg = config;
        cfg.scan_interval = Duration::ZERO;

        let hub = Self::connect(cfg).await?;
        let result = f(hub.clone()).await;
        hub.shutdown().await;
        result
    }
}

impl<G: ProductGateway> Hub<G> {
    /// Build products and coordinators from a product listing.
    ///
    /// Unsupported references are dropped. Each product starts from the mode
    /// and status reported by the listing; telemetry arrives with the first
    /// refresh.
    pub fn from_products(
        gateway: Arc<G>,
        summaries: Vec<ProductSummary>,
        scan_interval: Duration,
    ) -> Self {
        let coordinators = summaries
            .into_iter()
            .filter(|summary| {
                let supported = is_product_supported(&summary.reference);
                if !supported {
                    debug!(
                        product = %summary.modem,
                        reference = %summary.reference,
                        "skipping unsupported product"
                    );
                }
                supported
            })
            .map(|summary| {
                let indicator = summary.indicator.unwrap_or_default();
                let product = Product::new(
                    Arc::clone(&gateway),
                    summary.modem,
                    summary.reference,
                    indicator.current_air_mode.unwrap_or_default(),
                    indicator.tmpcu.unwrap_or_default(),
                );
                Arc::new(ProductCoordinator::new(Arc::new(product), scan_interval))
            })
            .collect();

        Self {
            inner: Arc::new(HubInner {
                gateway,
                coordinators,
                cancel: CancellationToken::new(),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn gateway(&self) -> &Arc<G> {
        &self.inner.gateway
    }

    pub fn coordinators(&self) -> &[Arc<ProductCoordinator<G>>] {
        &self.inner.coordinators
    }

    pub fn coordinator(&self, id: &str) -> Result<&Arc<ProductCoordinator<G>>, CoreError> {
        self.inner
            .coordinators
            .iter()
            .find(|c| c.product().id() == id)
            .ok_or_else(|| CoreError::ProductNotFound { id: id.to_owned() })
    }

    pub fn products(&self) -> impl Iterator<Item = &Arc<Product<G>>> {
        self.inner.coordinators.iter().map(|c| c.product())
    }

    /// Refresh every product concurrently; the first failure is returned
    /// after all of them have finished.
    pub async fn refresh_all(&self) -> Result<(), CoreError> {
        let results = join_all(self.inner.coordinators.iter().map(|c| c.refresh())).await;
        results.into_iter().collect()
    }

    /// Spawn one polling task per product.
    pub async fn start_polling(&self) {
        let mut handles = self.inner.task_handles.lock().await;
        for coordinator in &self.inner.coordinators {
            let coordinator = Arc::clone(coordinator);
            let cancel = self.inner.cancel.clone();
            handles.push(tokio::spawn(async move { coordinator.run(cancel).await }));
        }
        debug!(tasks = handles.len(), "polling started");
    }

    /// Request a mode by display name, then poll quickly until it shows.
    pub async fn set_mode(
        &self,
        id: &str,
        display_mode: &str,
    ) -> Result<AcceleratedRefresh, CoreError> {
        let coordinator = self.coordinator(id)?;
        coordinator
            .product()
            .maybe_set_mode_from_display(display_mode)
            .await?;
        info!(product = %id, mode = %display_mode, "mode change requested");
        coordinator.accelerated_refresh_after_mode_change().await
    }

    /// Sensor entities of every product.
    pub fn entities(&self) -> Vec<SensorEntity<G>> {
        self.products().flat_map(sensor_entities).collect()
    }

    /// Stop polling and wait for the tasks to finish.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
        debug!("hub shut down");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex as StdMutex;

    use aldes_api::{ProductDocument, ProductIndicator};
    use pretty_assertions::assert_eq;

    use super::*;

    /// Gateway whose products adopt the requested mode on the next fetch.
    #[derive(Default)]
    struct EchoGateway {
        modes: StdMutex<HashMap<String, String>>,
        fetches: StdMutex<Vec<String>>,
    }

    impl ProductGateway for EchoGateway {
        async fn get_product(&self, id: &str) -> Result<ProductDocument, CoreError> {
            self.fetches.lock().unwrap().push(id.to_owned());
            Ok(ProductDocument {
                mode: self.modes.lock().unwrap().get(id).cloned(),
                ..ProductDocument::default()
            })
        }

        async fn request_set_mode(&self, id: &str, code: &str) -> Result<(), CoreError> {
            self.modes
                .lock()
                .unwrap()
                .insert(id.to_owned(), code.to_owned());
            Ok(())
        }
    }

    fn summary(modem: &str, reference: &str, mode: Option<&str>) -> ProductSummary {
        ProductSummary {
            modem: modem.into(),
            reference: reference.into(),
            serial_number: None,
            product_type: None,
            is_connected: Some(true),
            indicator: mode.map(|m| ProductIndicator {
                current_air_mode: Some(m.into()),
                tmpcu: None,
            }),
        }
    }

    fn hub() -> Hub<EchoGateway> {
        Hub::from_products(
            Arc::new(EchoGateway::default()),
            vec![
                summary("a", "AIR_TOP", Some("V")),
                summary("b", "T_ONE_AIR", Some("V")),
                summary("c", "AIR_TOP", None),
            ],
            Duration::from_secs(60),
        )
    }

    #[test]
    fn unsupported_products_are_skipped() {
        let hub = hub();
        let ids: Vec<_> = hub.products().map(|p| p.id().to_owned()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn listing_seeds_initial_mode() {
        let hub = hub();
        let a = hub.coordinator("a").unwrap().product();
        assert_eq!(a.get_display_mode().unwrap(), "Daily");
        let c = hub.coordinator("c").unwrap().product();
        assert_eq!(c.mode_code(), "");
    }

    #[test]
    fn unknown_product_is_not_found() {
        let err = hub().coordinator("b").unwrap_err();
        assert!(matches!(err, CoreError::ProductNotFound { ref id } if id == "b"));
    }

    #[test]
    fn entities_cover_every_product() {
        let entities = hub().entities();
        assert_eq!(entities.len(), 18);
        assert!(entities.iter().any(|e| e.unique_id() == "c-current-mode"));
    }

    #[tokio::test(start_paused = true)]
    async fn set_mode_requests_code_then_refreshes() {
        let hub = hub();

        let outcome = hub.set_mode("a", "Boost").await.unwrap();

        assert_eq!(outcome, AcceleratedRefresh::Completed);
        let product = hub.coordinator("a").unwrap().product();
        assert_eq!(product.mode_code(), "Y");
        assert_eq!(product.get_display_mode().unwrap(), "Boost");
        assert_eq!(hub.gateway().fetches.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn set_mode_rejects_unknown_display_mode() {
        let hub = hub();
        let err = hub.set_mode("a", "Turbo").await.unwrap_err();
        assert!(matches!(err, CoreError::UnknownDisplayMode { .. }));
        assert!(hub.gateway().fetches.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn polling_runs_until_shutdown() {
        let hub = hub();
        hub.refresh_all().await.unwrap();
        assert_eq!(hub.gateway().fetches.lock().unwrap().len(), 2);

        hub.start_polling().await;
        tokio::time::sleep(Duration::from_secs(61)).await;
        hub.shutdown().await;

        let fetches = hub.gateway().fetches.lock().unwrap().clone();
        assert_eq!(fetches.len(), 4);

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(hub.gateway().fetches.lock().unwrap().len(), 4);
    }
}
