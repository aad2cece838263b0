//! Interaction utility: click and scroll on top of the wait utility.
//!
//! Clicks resolve the target via the wait-for-clickable contract first. A
//! native click that the browser rejects falls back to exactly one scripted
//! click on the same element handle. An unresolvable target is an explicit
//! [`ClickOutcome::NotFound`] — callers decide whether that is fatal,
//! instead of the interaction silently doing nothing.

use std::time::Duration;

use tracing::{debug, warn};

use crate::driver::{Driver, ElementHandle};
use crate::locator::Locator;
use crate::result::E2eResult;
use crate::wait::Waiter;

/// Default number of click attempts in the retry helper
pub const DEFAULT_CLICK_ATTEMPTS: u32 = 3;

/// Default backoff between click attempts (2 seconds)
pub const DEFAULT_CLICK_BACKOFF: Duration = Duration::from_secs(2);

/// How a click request concluded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Native input-simulation click landed
    Native,
    /// Native click was rejected; the scripted fallback landed
    Scripted,
    /// Target never became clickable within the wait budget
    NotFound,
}

impl ClickOutcome {
    /// Whether a click was actually performed
    #[must_use]
    pub const fn clicked(&self) -> bool {
        !matches!(self, Self::NotFound)
    }
}

/// How a scroll request concluded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollOutcome {
    /// Element was scrolled into view
    Scrolled,
    /// Target never resolved within the wait budget
    NotFound,
}

/// Click/scroll operations composed over [`Waiter`]
#[derive(Debug, Clone, Default)]
pub struct Interactor {
    waiter: Waiter,
}

impl Interactor {
    /// Create an interactor with default wait options
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an interactor sharing the given waiter
    #[must_use]
    pub fn with_waiter(waiter: Waiter) -> Self {
        Self { waiter }
    }

    /// The underlying waiter
    #[must_use]
    pub const fn waiter(&self) -> &Waiter {
        &self.waiter
    }

    /// Resolve the locator via wait-for-clickable, then click it.
    ///
    /// Returns `Ok(ClickOutcome::NotFound)` when the target never resolves;
    /// errors only when both the native click and the scripted fallback fail.
    pub async fn click<D: Driver + ?Sized>(
        &self,
        driver: &D,
        locator: &Locator,
    ) -> E2eResult<ClickOutcome> {
        let Some(element) = self
            .waiter
            .until_clickable(driver, locator, None)
            .await
            .into_element()
        else {
            warn!(%locator, "click target did not become clickable, nothing clicked");
            return Ok(ClickOutcome::NotFound);
        };
        self.click_handle(driver, locator, &element).await
    }

    /// Click an already-resolved element with the native/scripted fallback
    /// contract: a rejected native click triggers exactly one scripted click
    /// on the same handle.
    pub async fn click_handle<D: Driver + ?Sized>(
        &self,
        driver: &D,
        locator: &Locator,
        element: &ElementHandle,
    ) -> E2eResult<ClickOutcome> {
        match driver.click(element).await {
            Ok(()) => {
                debug!(%locator, "native click");
                Ok(ClickOutcome::Native)
            }
            Err(err) => {
                warn!(%locator, error = %err, "native click rejected, falling back to scripted click");
                driver.click_via_script(element).await?;
                Ok(ClickOutcome::Scripted)
            }
        }
    }

    /// Click with bounded retry: up to `attempts` tries with a fixed
    /// `backoff` sleep after each failure. Never retries indefinitely.
    pub async fn click_with_retry<D: Driver + ?Sized>(
        &self,
        driver: &D,
        locator: &Locator,
        attempts: u32,
        backoff: Duration,
    ) -> E2eResult<ClickOutcome> {
        let mut last = ClickOutcome::NotFound;
        for attempt in 1..=attempts.max(1) {
            match self.click(driver, locator).await {
                Ok(outcome) if outcome.clicked() => return Ok(outcome),
                Ok(outcome) => last = outcome,
                Err(err) => {
                    warn!(%locator, attempt, error = %err, "click attempt failed");
                }
            }
            if attempt < attempts {
                tokio::time::sleep(backoff).await;
            }
        }
        Ok(last)
    }

    /// Resolve the locator via wait-for-present, then smooth-scroll it into
    /// view. Warns and reports `NotFound` when the target never resolves.
    pub async fn scroll_to<D: Driver + ?Sized>(
        &self,
        driver: &D,
        locator: &Locator,
    ) -> E2eResult<ScrollOutcome> {
        let Some(element) = self
            .waiter
            .until_present(driver, locator, None)
            .await
            .into_element()
        else {
            warn!(%locator, "scroll target not found");
            return Ok(ScrollOutcome::NotFound);
        };
        driver.scroll_into_view(&element).await?;
        debug!(%locator, "scrolled into view");
        Ok(ScrollOutcome::Scrolled)
    }

    /// Scroll an already-resolved element into view.
    pub async fn scroll_to_handle<D: Driver + ?Sized>(
        &self,
        driver: &D,
        element: &ElementHandle,
    ) -> E2eResult<()> {
        driver.scroll_into_view(element).await
    }

    /// Resolve a dropdown via wait-for-clickable and select an option by
    /// typing its label.
    pub async fn select_by_typing<D: Driver + ?Sized>(
        &self,
        driver: &D,
        locator: &Locator,
        label: &str,
    ) -> E2eResult<bool> {
        let Some(element) = self
            .waiter
            .until_clickable(driver, locator, None)
            .await
            .into_element()
        else {
            warn!(%locator, label, "dropdown not clickable, selection skipped");
            return Ok(false);
        };
        driver.send_keys(&element, label).await?;
        debug!(%locator, label, "dropdown option typed");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockDriver, MockElement, MockPage};
    use crate::wait::WaitOptions;
    use std::time::Instant;

    const BUTTON: Locator = Locator::xpath("//a[contains(text(), 'View Role')]");

    fn fast_interactor() -> Interactor {
        Interactor::with_waiter(Waiter::with_options(
            WaitOptions::new()
                .with_budget(Duration::from_millis(200))
                .with_poll_interval(Duration::from_millis(20)),
        ))
    }

    mod click_tests {
        use super::*;

        #[tokio::test]
        async fn test_native_click() {
            let driver = MockDriver::new();
            driver.load_page(
                MockPage::new("https://example.test")
                    .with_element(BUTTON.selector(), MockElement::new("View Role")),
            );

            let outcome = fast_interactor().click(&driver, &BUTTON).await.unwrap();
            assert_eq!(outcome, ClickOutcome::Native);
            assert_eq!(driver.calls_matching("click:").len(), 1);
            assert!(driver.calls_matching("click_via_script:").is_empty());
        }

        #[tokio::test]
        async fn test_fallback_issues_exactly_one_scripted_click() {
            let driver = MockDriver::new();
            driver.load_page(MockPage::new("https://example.test").with_element(
                BUTTON.selector(),
                MockElement::new("View Role").fails_native_click(),
            ));

            let outcome = fast_interactor().click(&driver, &BUTTON).await.unwrap();
            assert_eq!(outcome, ClickOutcome::Scripted);
            assert_eq!(driver.calls_matching("click_via_script:").len(), 1);
        }

        #[tokio::test]
        async fn test_missing_target_is_explicit_not_found() {
            let driver = MockDriver::new();
            driver.load_page(MockPage::new("https://example.test"));

            let outcome = fast_interactor().click(&driver, &BUTTON).await.unwrap();
            assert_eq!(outcome, ClickOutcome::NotFound);
            assert!(!outcome.clicked());
            assert!(driver.calls_matching("click:").is_empty());
        }
    }

    mod retry_tests {
        use super::*;

        #[tokio::test]
        async fn test_retry_is_bounded() {
            let driver = MockDriver::new();
            driver.load_page(MockPage::new("https://example.test"));

            let interactor = Interactor::with_waiter(Waiter::with_options(
                WaitOptions::new()
                    .with_budget(Duration::from_millis(40))
                    .with_poll_interval(Duration::from_millis(10)),
            ));
            let backoff = Duration::from_millis(30);
            let start = Instant::now();
            let outcome = interactor
                .click_with_retry(&driver, &BUTTON, 3, backoff)
                .await
                .unwrap();

            assert_eq!(outcome, ClickOutcome::NotFound);
            // 3 attempts, 2 backoff sleeps between them
            assert!(start.elapsed() >= Duration::from_millis(40 * 3 + 30 * 2));
        }

        #[tokio::test]
        async fn test_retry_stops_on_success() {
            let driver = MockDriver::new();
            driver.load_page(
                MockPage::new("https://example.test")
                    .with_element(BUTTON.selector(), MockElement::new("View Role")),
            );

            let outcome = fast_interactor()
                .click_with_retry(&driver, &BUTTON, 3, Duration::from_millis(10))
                .await
                .unwrap();
            assert_eq!(outcome, ClickOutcome::Native);
            assert_eq!(driver.calls_matching("click:").len(), 1);
        }
    }

    mod scroll_tests {
        use super::*;

        #[tokio::test]
        async fn test_scroll_found() {
            let driver = MockDriver::new();
            driver.load_page(
                MockPage::new("https://example.test")
                    .with_element(BUTTON.selector(), MockElement::new("View Role")),
            );

            let outcome = fast_interactor().scroll_to(&driver, &BUTTON).await.unwrap();
            assert_eq!(outcome, ScrollOutcome::Scrolled);
            assert_eq!(driver.calls_matching("scroll_into_view:").len(), 1);
        }

        #[tokio::test]
        async fn test_scroll_missing_target() {
            let driver = MockDriver::new();
            driver.load_page(MockPage::new("https://example.test"));

            let outcome = fast_interactor().scroll_to(&driver, &BUTTON).await.unwrap();
            assert_eq!(outcome, ScrollOutcome::NotFound);
            assert!(driver.calls_matching("scroll_into_view:").is_empty());
        }
    }

    mod select_tests {
        use super::*;

        const DROPDOWN: Locator = Locator::xpath("//select[@id='location']");

        #[tokio::test]
        async fn test_select_by_typing() {
            let driver = MockDriver::new();
            driver.load_page(
                MockPage::new("https://example.test")
                    .with_element(DROPDOWN.selector(), MockElement::new("All")),
            );

            let selected = fast_interactor()
                .select_by_typing(&driver, &DROPDOWN, "Istanbul, Turkiye")
                .await
                .unwrap();
            assert!(selected);
            assert_eq!(driver.calls_matching("send_keys:").len(), 1);
        }
    }
}
