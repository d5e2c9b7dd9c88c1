// Terminal signal sources for a funding attempt
//
// Each source runs as its own task and only ever talks to the arbiter by
// sending a `Signal`. None of them decides an outcome.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Url;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::time::{interval_at, sleep_until, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::funding::models::{CheckSource, Signal};
use crate::funding::status_checker::{CheckOutcome, RateLimitedStatusChecker};

/// Periodic status poller with a bounded tick budget
pub struct Poller {
    checker: Arc<RateLimitedStatusChecker>,
    reference: String,
    interval: Duration,
    max_ticks: u32,
}

impl Poller {
    pub fn new(
        checker: Arc<RateLimitedStatusChecker>,
        reference: String,
        interval: Duration,
        max_ticks: u32,
    ) -> Self {
        Self {
            checker,
            reference,
            interval,
            max_ticks,
        }
    }

    pub async fn run(self, signals: UnboundedSender<Signal>) {
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        for tick in 1..=self.max_ticks {
            ticker.tick().await;

            let result = match self.checker.request_check(&self.reference).await {
                CheckOutcome::Skipped { .. } => continue,
                CheckOutcome::Checked(result) => result,
            };

            debug!(reference = %self.reference, tick, "🔁 Poll tick checked status");
            let terminal = result.is_terminal();
            let delivered = signals
                .send(Signal::Status {
                    result,
                    source: CheckSource::Poller,
                })
                .is_ok();

            if terminal || !delivered {
                return;
            }
        }

        info!(
            reference = %self.reference,
            max_ticks = self.max_ticks,
            "⌛ Poll budget exhausted without a final status"
        );
        let _ = signals.send(Signal::PollExhausted);
    }
}

/// Watches hosted checkout navigation and reports when the page leaves the
/// payment provider. Edge-triggered: one signal per departure.
pub struct NavigationWatcher {
    checkout_hosts: Vec<String>,
    on_checkout: bool,
}

impl NavigationWatcher {
    pub fn new(checkout_hosts: Vec<String>) -> Self {
        Self {
            checkout_hosts: checkout_hosts
                .into_iter()
                .map(|host| host.trim().to_ascii_lowercase())
                .filter(|host| !host.is_empty())
                .collect(),
            on_checkout: true,
        }
    }

    fn is_checkout_host(&self, host: &str) -> bool {
        let host = host.to_ascii_lowercase();
        self.checkout_hosts
            .iter()
            .any(|checkout| host == *checkout || host.ends_with(&format!(".{}", checkout)))
    }

    /// Feed one navigation URL; returns a signal when the page just left checkout.
    ///
    /// Non-web URLs (`about:blank`, custom schemes) are ignored.
    pub fn observe(&mut self, url: &str) -> Option<Signal> {
        let parsed = Url::parse(url).ok()?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return None;
        }
        let host = parsed.host_str()?;

        if self.is_checkout_host(host) {
            self.on_checkout = true;
            return None;
        }

        if self.on_checkout {
            self.on_checkout = false;
            return Some(Signal::NavigatedAway {
                url: url.to_string(),
            });
        }

        None
    }

    pub async fn run(mut self, mut urls: UnboundedReceiver<String>, signals: UnboundedSender<Signal>) {
        while let Some(url) = urls.recv().await {
            if let Some(signal) = self.observe(&url) {
                info!(url = %url, "🧭 Checkout page navigated away");
                if signals.send(signal).is_err() {
                    return;
                }
            }
        }
    }
}

/// Fires once at the attempt's absolute deadline
pub struct AbsoluteTimeout {
    deadline: Instant,
}

impl AbsoluteTimeout {
    pub fn new(deadline: Instant) -> Self {
        Self { deadline }
    }

    pub async fn run(self, signals: UnboundedSender<Signal>) {
        sleep_until(self.deadline).await;
        let _ = signals.send(Signal::HardTimeout);
    }
}
