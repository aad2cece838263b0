//! Element-wait utility.
//!
//! All synchronization against the remote DOM goes through [`Waiter`]: timed
//! polling loops that resolve a condition (present, clickable, text-equals,
//! gone, count) or give up when the wait budget elapses.
//!
//! Timeouts are not errors here. Every wait returns an explicit
//! found/not-found outcome so callers decide whether a missing element is
//! fatal; transient driver errors during polling are treated as
//! "not yet there" because the DOM may be mid-navigation.

use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::driver::{Driver, ElementHandle};
use crate::locator::Locator;

/// Default element wait budget (10 seconds)
pub const DEFAULT_WAIT_BUDGET_MS: u64 = 10_000;

/// Default page-load wait budget (20 seconds)
pub const DEFAULT_PAGE_LOAD_BUDGET_MS: u64 = 20_000;

/// Fixed polling interval (250ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 250;

/// Options for wait operations
#[derive(Debug, Clone)]
pub struct WaitOptions {
    /// Element wait budget in milliseconds
    pub budget_ms: u64,
    /// Page-load wait budget in milliseconds
    pub page_load_budget_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            budget_ms: DEFAULT_WAIT_BUDGET_MS,
            page_load_budget_ms: DEFAULT_PAGE_LOAD_BUDGET_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the element wait budget
    #[must_use]
    pub const fn with_budget(mut self, budget: Duration) -> Self {
        self.budget_ms = budget.as_millis() as u64;
        self
    }

    /// Set the page-load wait budget
    #[must_use]
    pub const fn with_page_load_budget(mut self, budget: Duration) -> Self {
        self.page_load_budget_ms = budget.as_millis() as u64;
        self
    }

    /// Set the polling interval
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = interval.as_millis() as u64;
        self
    }

    /// Element wait budget as a Duration
    #[must_use]
    pub const fn budget(&self) -> Duration {
        Duration::from_millis(self.budget_ms)
    }

    /// Poll interval as a Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Outcome of an element wait: the explicit not-found sentinel replaces the
/// underlying timeout fault so callers can branch without error handling.
#[derive(Debug, Clone)]
pub enum WaitOutcome {
    /// Condition held before the budget elapsed
    Found {
        /// The resolved element
        element: ElementHandle,
        /// Time spent polling
        elapsed: Duration,
    },
    /// Budget elapsed without the condition holding
    NotFound {
        /// Time spent polling (at or after the budget, never earlier)
        elapsed: Duration,
    },
}

impl WaitOutcome {
    /// Whether the element was found
    #[must_use]
    pub const fn is_found(&self) -> bool {
        matches!(self, Self::Found { .. })
    }

    /// The resolved element, if found
    #[must_use]
    pub fn element(&self) -> Option<&ElementHandle> {
        match self {
            Self::Found { element, .. } => Some(element),
            Self::NotFound { .. } => None,
        }
    }

    /// Consume into the resolved element, if found
    #[must_use]
    pub fn into_element(self) -> Option<ElementHandle> {
        match self {
            Self::Found { element, .. } => Some(element),
            Self::NotFound { .. } => None,
        }
    }

    /// Time spent polling
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        match self {
            Self::Found { elapsed, .. } | Self::NotFound { elapsed } => *elapsed,
        }
    }
}

/// Outcome of a text wait; the timeout side records the last observed text
/// for diagnostics.
#[derive(Debug, Clone)]
pub enum TextWaitOutcome {
    /// Element text matched before the budget elapsed
    Matched {
        /// Time spent polling
        elapsed: Duration,
    },
    /// Budget elapsed without a match
    TimedOut {
        /// Last text observed on the element, if it ever resolved
        last_observed: Option<String>,
        /// Time spent polling
        elapsed: Duration,
    },
}

impl TextWaitOutcome {
    /// Whether the text matched
    #[must_use]
    pub const fn is_matched(&self) -> bool {
        matches!(self, Self::Matched { .. })
    }

    /// Last observed text on the timeout side
    #[must_use]
    pub fn last_observed(&self) -> Option<&str> {
        match self {
            Self::Matched { .. } => None,
            Self::TimedOut { last_observed, .. } => last_observed.as_deref(),
        }
    }
}

/// Timed poller against the remote document
#[derive(Debug, Clone, Default)]
pub struct Waiter {
    options: WaitOptions,
}

impl Waiter {
    /// Create a waiter with default options
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a waiter with custom options
    #[must_use]
    pub fn with_options(options: WaitOptions) -> Self {
        Self { options }
    }

    /// The configured options
    #[must_use]
    pub const fn options(&self) -> &WaitOptions {
        &self.options
    }

    fn effective_budget(&self, budget: Option<Duration>) -> Duration {
        budget.unwrap_or_else(|| self.options.budget())
    }

    /// Wait for an element to be present in the DOM.
    pub async fn until_present<D: Driver + ?Sized>(
        &self,
        driver: &D,
        locator: &Locator,
        budget: Option<Duration>,
    ) -> WaitOutcome {
        self.poll_for_element(driver, locator, budget, false).await
    }

    /// Wait for an element to be present and clickable.
    pub async fn until_clickable<D: Driver + ?Sized>(
        &self,
        driver: &D,
        locator: &Locator,
        budget: Option<Duration>,
    ) -> WaitOutcome {
        self.poll_for_element(driver, locator, budget, true).await
    }

    async fn poll_for_element<D: Driver + ?Sized>(
        &self,
        driver: &D,
        locator: &Locator,
        budget: Option<Duration>,
        require_clickable: bool,
    ) -> WaitOutcome {
        let budget = self.effective_budget(budget);
        let start = Instant::now();
        loop {
            match driver.query(locator).await {
                Ok(Some(element)) => {
                    let satisfied = if require_clickable {
                        driver.is_clickable(&element).await.unwrap_or(false)
                    } else {
                        true
                    };
                    if satisfied {
                        let elapsed = start.elapsed();
                        debug!(%locator, ?elapsed, "element resolved");
                        return WaitOutcome::Found { element, elapsed };
                    }
                }
                Ok(None) => {}
                Err(err) => {
                    // Mid-navigation queries can fail; keep polling.
                    debug!(%locator, error = %err, "query failed while polling");
                }
            }
            if !self.sleep_within(start, budget).await {
                let elapsed = start.elapsed();
                warn!(
                    %locator,
                    clickable = require_clickable,
                    budget_ms = budget.as_millis() as u64,
                    "element did not resolve within wait budget"
                );
                return WaitOutcome::NotFound { elapsed };
            }
        }
    }

    /// Wait until the element's trimmed text equals `expected`.
    pub async fn until_text_is<D: Driver + ?Sized>(
        &self,
        driver: &D,
        locator: &Locator,
        expected: &str,
        budget: Option<Duration>,
    ) -> TextWaitOutcome {
        let budget = self.effective_budget(budget);
        let start = Instant::now();
        let mut last_observed: Option<String> = None;
        loop {
            if let Ok(Some(element)) = driver.query(locator).await {
                if let Ok(text) = driver.element_text(&element).await {
                    let text = text.trim().to_string();
                    if text == expected {
                        let elapsed = start.elapsed();
                        debug!(%locator, expected, ?elapsed, "element text matched");
                        return TextWaitOutcome::Matched { elapsed };
                    }
                    last_observed = Some(text);
                }
            }
            if !self.sleep_within(start, budget).await {
                let elapsed = start.elapsed();
                warn!(
                    %locator,
                    expected,
                    last_observed = last_observed.as_deref().unwrap_or("<never resolved>"),
                    "element text did not match within wait budget"
                );
                return TextWaitOutcome::TimedOut {
                    last_observed,
                    elapsed,
                };
            }
        }
    }

    /// Wait until no element matches the locator. Used to detect a stale
    /// job list being torn down before the fresh one arrives.
    pub async fn until_gone<D: Driver + ?Sized>(
        &self,
        driver: &D,
        locator: &Locator,
        budget: Option<Duration>,
    ) -> bool {
        let budget = self.effective_budget(budget);
        let start = Instant::now();
        loop {
            match driver.query(locator).await {
                Ok(None) => {
                    debug!(%locator, elapsed = ?start.elapsed(), "element gone");
                    return true;
                }
                Ok(Some(_)) | Err(_) => {}
            }
            if !self.sleep_within(start, budget).await {
                warn!(%locator, "element still present after wait budget");
                return false;
            }
        }
    }

    /// Wait until at least `n` elements match the locator.
    pub async fn until_count_at_least<D: Driver + ?Sized>(
        &self,
        driver: &D,
        locator: &Locator,
        n: usize,
        budget: Option<Duration>,
    ) -> bool {
        let budget = self.effective_budget(budget);
        let start = Instant::now();
        loop {
            if let Ok(elements) = driver.query_all(locator).await {
                if elements.len() >= n {
                    debug!(%locator, count = elements.len(), "element count reached");
                    return true;
                }
            }
            if !self.sleep_within(start, budget).await {
                warn!(%locator, wanted = n, "element count not reached within wait budget");
                return false;
            }
        }
    }

    /// Wait until `document.readyState` is `complete`.
    pub async fn until_page_loaded<D: Driver + ?Sized>(&self, driver: &D) -> bool {
        let budget = Duration::from_millis(self.options.page_load_budget_ms);
        let start = Instant::now();
        loop {
            if let Ok(state) = driver.ready_state().await {
                if state == "complete" {
                    debug!(elapsed = ?start.elapsed(), "page load complete");
                    return true;
                }
            }
            if !self.sleep_within(start, budget).await {
                warn!(budget_ms = budget.as_millis() as u64, "page load did not finish");
                return false;
            }
        }
    }

    /// Sleep for one poll interval, clamped to the remaining budget.
    /// Returns false once the budget is exhausted, guaranteeing the caller
    /// never reports a timeout before the budget has actually elapsed.
    async fn sleep_within(&self, start: Instant, budget: Duration) -> bool {
        let elapsed = start.elapsed();
        if elapsed >= budget {
            return false;
        }
        let remaining = budget - elapsed;
        tokio::time::sleep(self.options.poll_interval().min(remaining)).await;
        true
    }
}
