// ── Refresh coordinator ──
//
// Drives polling of a single product: a steady background interval, debounced
// on-demand refreshes, and a one-shot burst of polls after a mode change so
// the new mode shows up within seconds instead of at the next steady tick.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, Notify, watch};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info_span, warn};

use crate::error::CoreError;
use crate::gateway::ProductGateway;
use crate::model::Product;

/// Steady-state polling interval.
pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_secs(60);

/// Cooldown of [`ProductCoordinator::request_refresh`].
pub const REQUEST_REFRESH_COOLDOWN: Duration = Duration::from_secs(5);

const BURST_FIRST_DELAY: Duration = Duration::from_secs(1);
const BURST_FOLLOW_UP_DELAY: Duration = Duration::from_secs(3);
const BURST_FOLLOW_UP_POLLS: usize = 2;

/// Outcome of the last refresh attempt, published to subscribers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshStatus {
    pub last_update_success: bool,
    pub last_refresh: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    /// Number of refresh attempts so far.
    pub attempts: u64,
}

/// What [`ProductCoordinator::accelerated_refresh_after_mode_change`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceleratedRefresh {
    /// All burst polls ran.
    Completed,
    /// Another burst was already running for this product.
    Skipped,
}

/// Polling driver for one product.
pub struct ProductCoordinator<G> {
    name: String,
    product: Arc<Product<G>>,
    update_interval: watch::Sender<Duration>,
    status: watch::Sender<RefreshStatus>,
    /// Held across a fetch-and-merge so refreshes of one product never overlap.
    refresh_lock: Mutex<()>,
    refresh_requested: Notify,
    refresh_pending: AtomicBool,
    burst_active: AtomicBool,
}

impl<G: ProductGateway> ProductCoordinator<G> {
    pub fn new(product: Arc<Product<G>>, update_interval: Duration) -> Self {
        let (update_interval, _) = watch::channel(update_interval);
        let (status, _) = watch::channel(RefreshStatus::default());
        Self {
            name: format!("{}-{}", crate::DOMAIN, product.id()),
            product,
            update_interval,
            status,
            refresh_lock: Mutex::new(()),
            refresh_requested: Notify::new(),
            refresh_pending: AtomicBool::new(false),
            burst_active: AtomicBool::new(false),
        }
    }

    /// Coordinator name, `aldes-{product id}`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn product(&self) -> &Arc<Product<G>> {
        &self.product
    }

    pub fn update_interval(&self) -> Duration {
        *self.update_interval.borrow()
    }

    /// Change the polling interval; a running [`run`](Self::run) loop re-arms
    /// its timer immediately.
    pub fn set_update_interval(&self, interval: Duration) {
        self.update_interval.send_replace(interval);
    }

    /// Latest refresh outcome.
    pub fn status(&self) -> RefreshStatus {
        self.status.borrow().clone()
    }

    /// Watch refresh outcomes; the receiver is notified after every attempt.
    pub fn subscribe(&self) -> watch::Receiver<RefreshStatus> {
        self.status.subscribe()
    }

    pub fn is_accelerated_refresh_active(&self) -> bool {
        self.burst_active.load(Ordering::Acquire)
    }

    // ── Refresh ──────────────────────────────────────────────────────

    /// Refresh the product once and publish the outcome.
    ///
    /// Waits for a refresh already in flight, so a slow steady poll cannot
    /// land its older document on top of a burst poll.
    pub async fn refresh(&self) -> Result<(), CoreError> {
        let _in_flight = self.refresh_lock.lock().await;
        let result = self.product.update().await;

        self.status.send_modify(|status| {
            status.attempts += 1;
            match &result {
                Ok(()) => {
                    status.last_update_success = true;
                    status.last_refresh = Some(Utc::now());
                    status.last_error = None;
                }
                Err(e) => {
                    status.last_update_success = false;
                    status.last_error = Some(e.to_string());
                }
            }
        });

        result
    }

    /// Ask the run loop for a refresh after [`REQUEST_REFRESH_COOLDOWN`].
    ///
    /// Requests made while one is pending are folded into it.
    pub fn request_refresh(&self) {
        if !self.refresh_pending.swap(true, Ordering::AcqRel) {
            self.refresh_requested.notify_one();
        }
    }

    /// Poll quickly after a mode change: once after 1s, then twice 3s apart,
    /// then return to the previous interval.
    ///
    /// At most one burst runs per product; a call made while one is in
    /// flight returns [`AcceleratedRefresh::Skipped`] at once. A failed poll
    /// does not cut the burst short: the remaining polls still run and the
    /// first error is returned once the burst is over. The running flag and
    /// the interval are restored on every exit path, including the future
    /// being dropped mid-burst.
    pub async fn accelerated_refresh_after_mode_change(
        &self,
    ) -> Result<AcceleratedRefresh, CoreError> {
        let Some(_guard) = BurstGuard::acquire(&self.burst_active, &self.update_interval) else {
            debug!(coordinator = %self.name, "accelerated refresh already running");
            return Ok(AcceleratedRefresh::Skipped);
        };

        let mut first_error = None;

        self.set_update_interval(BURST_FIRST_DELAY);
        tokio::time::sleep(BURST_FIRST_DELAY).await;
        keep_first_error(&mut first_error, self.refresh().await);

        self.set_update_interval(BURST_FOLLOW_UP_DELAY);
        for _ in 0..BURST_FOLLOW_UP_POLLS {
            tokio::time::sleep(BURST_FOLLOW_UP_DELAY).await;
            keep_first_error(&mut first_error, self.refresh().await);
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(AcceleratedRefresh::Completed),
        }
    }

    // ── Background loop ──────────────────────────────────────────────

    /// Steady polling until `cancel` fires.
    ///
    /// Failures are logged and reported through [`subscribe`](Self::subscribe);
    /// recovery is simply the next tick. Ticks falling inside an accelerated
    /// burst are skipped since the burst is polling already.
    pub async fn run(&self, cancel: CancellationToken) {
        let span = info_span!("coordinator", name = %self.name);
        self.run_loop(cancel).instrument(span).await;
    }

    async fn run_loop(&self, cancel: CancellationToken) {
        let mut interval_rx = self.update_interval.subscribe();

        loop {
            let period = *interval_rx.borrow_and_update();

            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                changed = interval_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    debug!(interval = ?*interval_rx.borrow(), "update interval changed");
                }
                () = self.refresh_requested.notified() => {
                    tokio::select! {
                        () = cancel.cancelled() => break,
                        () = tokio::time::sleep(REQUEST_REFRESH_COOLDOWN) => {}
                    }
                    self.refresh_pending.store(false, Ordering::Release);
                    self.scheduled_refresh().await;
                }
                () = tokio::time::sleep(period) => {
                    self.scheduled_refresh().await;
                }
            }
        }

        debug!("polling stopped");
    }

    async fn scheduled_refresh(&self) {
        if self.is_accelerated_refresh_active() {
            debug!("skipping scheduled refresh during accelerated refresh");
            return;
        }
        if let Err(e) = self.refresh().await {
            warn!(error = %e, "periodic refresh failed");
        }
    }
}

impl<G> fmt::Debug for ProductCoordinator<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProductCoordinator")
            .field("name", &self.name)
            .field("update_interval", &*self.update_interval.borrow())
            .field("burst_active", &self.burst_active.load(Ordering::Acquire))
            .field("status", &*self.status.borrow())
            .finish_non_exhaustive()
    }
}

fn keep_first_error(slot: &mut Option<CoreError>, result: Result<(), CoreError>) {
    if let Err(e) = result {
        warn!(error = %e, "accelerated refresh poll failed");
        slot.get_or_insert(e);
    }
}

/// Single-flight latch for the accelerated burst.
///
/// Holds the running flag while alive and, on drop, restores the interval
/// that was in effect when the burst started before releasing the flag.
struct BurstGuard<'a> {
    active: &'a AtomicBool,
    interval: &'a watch::Sender<Duration>,
    restore: Duration,
}

impl<'a> BurstGuard<'a> {
    fn acquire(active: &'a AtomicBool, interval: &'a watch::Sender<Duration>) -> Option<Self> {
        active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        Some(Self {
            active,
            interval,
            restore: *interval.borrow(),
        })
    }
}

impl Drop for BurstGuard<'_> {
    fn drop(&mut self) {
        self.interval.send_replace(self.restore);
        self.active.store(false, Ordering::Release);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use aldes_api::ProductDocument;
    use pretty_assertions::assert_eq;
    use tokio::time::Instant;
    use tokio_test::{assert_pending, assert_ready_ok, task};

    use super::*;

    /// Gateway that records when each fetch happened and can fail on demand.
    struct ClockedGateway {
        start: Instant,
        fetches: std::sync::Mutex<Vec<Duration>>,
        fail_on: Vec<usize>,
    }

    impl ClockedGateway {
        fn new(fail_on: Vec<usize>) -> Arc<Self> {
            Arc::new(Self {
                start: Instant::now(),
                fetches: std::sync::Mutex::default(),
                fail_on,
            })
        }

        fn fetch_times(&self) -> Vec<Duration> {
            self.fetches.lock().unwrap().clone()
        }
    }

    impl ProductGateway for ClockedGateway {
        async fn get_product(&self, _id: &str) -> Result<ProductDocument, CoreError> {
            let index = {
                let mut fetches = self.fetches.lock().unwrap();
                fetches.push(self.start.elapsed());
                fetches.len()
            };
            if self.fail_on.contains(&index) {
                return Err(CoreError::Api {
                    message: "boom".into(),
                    status: Some(500),
                });
            }
            Ok(ProductDocument {
                mode: Some("Y".into()),
                ..ProductDocument::default()
            })
        }

        async fn request_set_mode(&self, _id: &str, _code: &str) -> Result<(), CoreError> {
            Ok(())
        }
    }

    fn coordinator(gateway: &Arc<ClockedGateway>) -> Arc<ProductCoordinator<ClockedGateway>> {
        let product = Arc::new(Product::new(Arc::clone(gateway), "p1", "AIR_TOP", "V", ""));
        Arc::new(ProductCoordinator::new(product, DEFAULT_SCAN_INTERVAL))
    }

    fn whole_seconds(times: &[Duration]) -> Vec<u64> {
        // Timer wheel granularity may add a millisecond per sleep.
        times.iter().map(Duration::as_secs).collect()
    }

    #[test]
    fn name_includes_product_id() {
        let gateway = ClockedGateway::new(vec![]);
        assert_eq!(coordinator(&gateway).name(), "aldes-p1");
    }

    #[tokio::test(start_paused = true)]
    async fn burst_polls_at_one_four_seven_seconds() {
        let gateway = ClockedGateway::new(vec![]);
        let coord = coordinator(&gateway);

        let outcome = coord.accelerated_refresh_after_mode_change().await.unwrap();

        assert_eq!(outcome, AcceleratedRefresh::Completed);
        assert_eq!(whole_seconds(&gateway.fetch_times()), vec![1, 4, 7]);
        assert_eq!(coord.product().get_display_mode().unwrap(), "Boost");
        assert!(!coord.is_accelerated_refresh_active());
        assert_eq!(coord.update_interval(), DEFAULT_SCAN_INTERVAL);
    }

    #[tokio::test(start_paused = true)]
    async fn second_burst_while_running_is_a_no_op() {
        let gateway = ClockedGateway::new(vec![]);
        let coord = coordinator(&gateway);

        let first = tokio::spawn({
            let coord = Arc::clone(&coord);
            async move { coord.accelerated_refresh_after_mode_change().await }
        });

        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert!(coord.is_accelerated_refresh_active());
        assert_eq!(coord.update_interval(), BURST_FOLLOW_UP_DELAY);

        let second = coord.accelerated_refresh_after_mode_change().await.unwrap();
        assert_eq!(second, AcceleratedRefresh::Skipped);

        assert_eq!(first.await.unwrap().unwrap(), AcceleratedRefresh::Completed);
        assert_eq!(whole_seconds(&gateway.fetch_times()), vec![1, 4, 7]);
        assert!(!coord.is_accelerated_refresh_active());
    }

    #[tokio::test(start_paused = true)]
    async fn guard_is_taken_on_first_poll() {
        let gateway = ClockedGateway::new(vec![]);
        let coord = coordinator(&gateway);

        let mut first = task::spawn(coord.accelerated_refresh_after_mode_change());
        assert_pending!(first.poll());
        assert!(coord.is_accelerated_refresh_active());

        let mut second = task::spawn(coord.accelerated_refresh_after_mode_change());
        let skipped = assert_ready_ok!(second.poll());
        assert_eq!(skipped, AcceleratedRefresh::Skipped);

        drop(first);
        assert!(!coord.is_accelerated_refresh_active());
        assert!(gateway.fetch_times().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_poll_still_completes_and_clears_guard() {
        let gateway = ClockedGateway::new(vec![2]);
        let coord = coordinator(&gateway);

        let err = coord
            .accelerated_refresh_after_mode_change()
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::Api { status: Some(500), .. }));
        assert_eq!(whole_seconds(&gateway.fetch_times()), vec![1, 4, 7]);
        assert!(!coord.is_accelerated_refresh_active());
        assert_eq!(coord.update_interval(), DEFAULT_SCAN_INTERVAL);
        // The last poll succeeded, so the published status is healthy again.
        assert!(coord.status().last_update_success);
        assert_eq!(coord.status().attempts, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_a_burst_releases_the_guard() {
        let gateway = ClockedGateway::new(vec![]);
        let coord = coordinator(&gateway);

        let burst = tokio::spawn({
            let coord = Arc::clone(&coord);
            async move { coord.accelerated_refresh_after_mode_change().await }
        });
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(coord.is_accelerated_refresh_active());

        burst.abort();
        assert!(burst.await.unwrap_err().is_cancelled());

        assert!(!coord.is_accelerated_refresh_active());
        assert_eq!(coord.update_interval(), DEFAULT_SCAN_INTERVAL);

        // A new burst can start afterwards.
        let again = coord.accelerated_refresh_after_mode_change().await.unwrap();
        assert_eq!(again, AcceleratedRefresh::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_status_reports_failures() {
        let gateway = ClockedGateway::new(vec![1]);
        let coord = coordinator(&gateway);
        let mut rx = coord.subscribe();

        assert!(coord.refresh().await.is_err());
        assert!(rx.has_changed().unwrap());
        let status = rx.borrow_and_update().clone();
        assert!(!status.last_update_success);
        assert!(status.last_error.unwrap().contains("boom"));
        assert!(status.last_refresh.is_none());

        coord.refresh().await.unwrap();
        assert!(coord.status().last_update_success);
        assert!(coord.status().last_refresh.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn run_loop_polls_on_interval_until_cancelled() {
        let gateway = ClockedGateway::new(vec![]);
        let coord = coordinator(&gateway);
        coord.set_update_interval(Duration::from_secs(10));
        let cancel = CancellationToken::new();

        let task = tokio::spawn({
            let coord = Arc::clone(&coord);
            let cancel = cancel.clone();
            async move { coord.run(cancel).await }
        });

        tokio::time::sleep(Duration::from_secs(35)).await;
        cancel.cancel();
        task.await.unwrap();

        assert_eq!(whole_seconds(&gateway.fetch_times()), vec![10, 20, 30]);
    }

    #[tokio::test(start_paused = true)]
    async fn requested_refreshes_are_debounced() {
        let gateway = ClockedGateway::new(vec![]);
        let coord = coordinator(&gateway);
        let cancel = CancellationToken::new();

        let task = tokio::spawn({
            let coord = Arc::clone(&coord);
            let cancel = cancel.clone();
            async move { coord.run(cancel).await }
        });

        tokio::task::yield_now().await;
        coord.request_refresh();
        tokio::time::sleep(Duration::from_secs(1)).await;
        coord.request_refresh();
        coord.request_refresh();

        tokio::time::sleep(Duration::from_secs(10)).await;
        cancel.cancel();
        task.await.unwrap();

        assert_eq!(whole_seconds(&gateway.fetch_times()), vec![5]);
    }

    /// Gateway whose first fetch is slow and reports the old mode; later
    /// fetches are instant and report Boost.
    struct SlowFirstGateway {
        start: Instant,
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        fetches: std::sync::Mutex<Vec<Duration>>,
    }

    impl ProductGateway for SlowFirstGateway {
        async fn get_product(&self, _id: &str) -> Result<ProductDocument, CoreError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            self.fetches.lock().unwrap().push(self.start.elapsed());

            let mode = if call == 0 {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "V"
            } else {
                "Y"
            };

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(ProductDocument {
                mode: Some(mode.into()),
                ..ProductDocument::default()
            })
        }

        async fn request_set_mode(&self, _id: &str, _code: &str) -> Result<(), CoreError> {
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn burst_waits_for_refresh_in_flight() {
        let gateway = Arc::new(SlowFirstGateway {
            start: Instant::now(),
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            fetches: std::sync::Mutex::default(),
        });
        let product = Arc::new(Product::new(Arc::clone(&gateway), "p1", "AIR_TOP", "V", ""));
        let coord = Arc::new(ProductCoordinator::new(product, DEFAULT_SCAN_INTERVAL));

        // A steady poll starts at t=0 and holds its fetch until t=5.
        let steady = tokio::spawn({
            let coord = Arc::clone(&coord);
            async move { coord.refresh().await }
        });
        tokio::time::sleep(Duration::from_millis(500)).await;

        let outcome = coord.accelerated_refresh_after_mode_change().await.unwrap();
        steady.await.unwrap().unwrap();

        assert_eq!(outcome, AcceleratedRefresh::Completed);
        assert_eq!(gateway.max_in_flight.load(Ordering::SeqCst), 1);
        assert_eq!(
            whole_seconds(&gateway.fetches.lock().unwrap()),
            vec![0, 5, 8, 11]
        );
        assert_eq!(coord.product().get_display_mode().unwrap(), "Boost");
        assert_eq!(coord.status().attempts, 4);
    }

    #[test]
    fn debug_shows_name_and_interval() {
        let gateway = ClockedGateway::new(vec![]);
        let rendered = format!("{:?}", coordinator(&gateway));
        assert!(rendered.contains("aldes-p1"));
        assert!(rendered.contains("60s"));
    }
}
