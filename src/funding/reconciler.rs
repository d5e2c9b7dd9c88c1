// Payment reconciler
//
// Arbitrates the poller, the checkout navigation watcher and the absolute
// timeout into one final outcome per funding attempt. Signals are handled one
// at a time by a single arbiter task; every exit path goes through
// `teardown()` before the outcome is published.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::api::PaymentApi;
use crate::config::Config;
use crate::error::{AppResult, FundingError};
use crate::funding::models::*;
use crate::funding::signals::{AbsoluteTimeout, NavigationWatcher, Poller};
use crate::funding::state::{Decision, ReconciliationState};
use crate::funding::status_checker::{CheckOutcome, RateLimitedStatusChecker};

#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    pub status_min_interval: Duration,
    pub poll_interval: Duration,
    pub max_poll_ticks: u32,
    pub hard_timeout: Duration,
    pub checkout_hosts: Vec<String>,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            status_min_interval: Duration::from_secs(50),
            poll_interval: Duration::from_secs(3),
            max_poll_ticks: 100,
            hard_timeout: Duration::from_secs(210),
            checkout_hosts: vec!["checkout.paystack.com".to_string()],
        }
    }
}

impl From<&Config> for ReconcilerConfig {
    fn from(config: &Config) -> Self {
        Self {
            status_min_interval: Duration::from_secs(config.status_min_interval_secs),
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            max_poll_ticks: config.max_poll_ticks,
            hard_timeout: Duration::from_secs(config.hard_timeout_secs),
            checkout_hosts: config.checkout_hosts.clone(),
        }
    }
}

/// Starts reconciliation for funding attempts
#[derive(Clone)]
pub struct PaymentReconciler {
    api: Arc<dyn PaymentApi>,
    config: ReconcilerConfig,
}

impl PaymentReconciler {
    pub fn new(api: Arc<dyn PaymentApi>, config: ReconcilerConfig) -> Self {
        Self { api, config }
    }

    /// Arm every signal source for `attempt` and spawn its arbiter.
    ///
    /// Must be called from within a tokio runtime. Each call gets its own
    /// rate-limited checker, so attempts never share a cool-down.
    pub fn start(&self, attempt: PaymentAttempt) -> ReconciliationHandle {
        let checker = Arc::new(RateLimitedStatusChecker::new(
            self.api.clone(),
            self.config.status_min_interval,
        ));
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        let (navigation_tx, navigation_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = watch::channel(ReconciliationEvent::pending());

        let mut timers = JoinSet::new();
        timers.spawn(
            Poller::new(
                checker.clone(),
                attempt.reference.clone(),
                self.config.poll_interval,
                self.config.max_poll_ticks,
            )
            .run(signal_tx.clone()),
        );
        timers.spawn(AbsoluteTimeout::new(Instant::now() + self.config.hard_timeout).run(signal_tx.clone()));
        timers.spawn(
            NavigationWatcher::new(self.config.checkout_hosts.clone())
                .run(navigation_rx, signal_tx.clone()),
        );

        info!(
            attempt_id = %attempt.id,
            reference = %attempt.reference,
            amount = %attempt.amount_requested,
            hard_timeout_secs = self.config.hard_timeout.as_secs(),
            "💳 Payment reconciliation started"
        );

        let attempt_id = attempt.id;
        let arbiter = Arbiter {
            attempt,
            checker,
            state: ReconciliationState::new(),
            signal_tx: signal_tx.clone(),
            signal_rx,
            events: event_tx,
            timers,
        };

        ReconciliationHandle {
            attempt_id,
            signals: signal_tx,
            navigation: navigation_tx,
            events: event_rx,
            driver: tokio::spawn(arbiter.run()),
        }
    }
}

/// Consumer side of one running reconciliation
pub struct ReconciliationHandle {
    attempt_id: Uuid,
    signals: mpsc::UnboundedSender<Signal>,
    navigation: mpsc::UnboundedSender<String>,
    events: watch::Receiver<ReconciliationEvent>,
    driver: JoinHandle<ReconciliationReport>,
}

impl ReconciliationHandle {
    pub fn attempt_id(&self) -> Uuid {
        self.attempt_id
    }

    /// Report a URL change of the hosted checkout page
    pub fn navigated(&self, url: impl Into<String>) {
        // receiver gone means the attempt is already settled
        let _ = self.navigation.send(url.into());
    }

    /// User walked away from checkout. Never claims a backend status.
    pub fn cancel(&self) {
        let _ = self.signals.send(Signal::Cancel);
    }

    pub fn subscribe(&self) -> watch::Receiver<ReconciliationEvent> {
        self.events.clone()
    }

    pub fn outcome(&self) -> Outcome {
        self.events.borrow().outcome
    }

    pub fn is_finished(&self) -> bool {
        self.driver.is_finished()
    }

    /// Wait for the final outcome
    pub async fn finished(self) -> AppResult<ReconciliationReport> {
        self.driver
            .await
            .map_err(|e| FundingError::ReconcilerStopped(e.to_string()).into())
    }
}

struct Arbiter {
    attempt: PaymentAttempt,
    checker: Arc<RateLimitedStatusChecker>,
    state: ReconciliationState,
    signal_tx: mpsc::UnboundedSender<Signal>,
    signal_rx: mpsc::UnboundedReceiver<Signal>,
    events: watch::Sender<ReconciliationEvent>,
    timers: JoinSet<()>,
}

impl Arbiter {
    async fn run(mut self) -> ReconciliationReport {
        let event = loop {
            // the arbiter keeps a sender of its own, so the channel stays open
            let signal = self.signal_rx.recv().await.unwrap_or(Signal::Cancel);
            debug!(reference = %self.attempt.reference, signal = signal.kind(), "📨 Signal received");

            match self.state.apply(&signal) {
                Decision::Resolve(event) => break event,
                Decision::CheckNow => self.spawn_out_of_band_check(),
                Decision::Wait | Decision::Ignore => {}
            }
        };

        self.teardown().await;
        self.attempt.status = self.state.last_status();

        let check_count = self.checker.check_count();
        info!(
            attempt_id = %self.attempt.id,
            reference = %self.attempt.reference,
            outcome = %event.outcome,
            check_count,
            "🏁 Payment reconciliation finished: {}",
            event.message
        );

        self.events.send_replace(event.clone());

        ReconciliationReport {
            attempt: self.attempt,
            event,
            check_count,
            active_timers: self.timers.len(),
        }
    }

    /// Navigation hint: one extra check through the shared gate
    fn spawn_out_of_band_check(&mut self) {
        let checker = self.checker.clone();
        let reference = self.attempt.reference.clone();
        let signals = self.signal_tx.clone();

        self.timers.spawn(async move {
            match checker.request_check(&reference).await {
                CheckOutcome::Checked(result) => {
                    let _ = signals.send(Signal::Status {
                        result,
                        source: CheckSource::Navigation,
                    });
                }
                CheckOutcome::Skipped { retry_in } => {
                    debug!(
                        reference = %reference,
                        retry_in_secs = retry_in.as_secs(),
                        "🧭 Navigation hint rate limited"
                    );
                }
            }
        });
    }

    /// Abort and drain every task tied to this attempt
    async fn teardown(&mut self) {
        self.timers.abort_all();
        while let Some(joined) = self.timers.join_next().await {
            if let Err(e) = joined {
                if e.is_panic() {
                    warn!(reference = %self.attempt.reference, "⚠️ Reconciliation task panicked: {}", e);
                }
            }
        }
        self.signal_rx.close();
    }
}
