//! Page objects for the careers acceptance flow.
//!
//! Each page object is a thin facade over [`PageBase`]: the shared driver
//! reference plus one waiter and one interactor, so retry and fallback logic
//! is written once instead of per page. Locators are associated constants;
//! all sequencing across pages lives in [`crate::scenario`].

mod careers;
mod home;
mod qa_jobs;

pub use careers::CareersPage;
pub use home::HomePage;
pub use qa_jobs::{FilterTuning, QaJobsPage};

use tracing::{debug, error};

use crate::driver::Driver;
use crate::interact::{ClickOutcome, Interactor, ScrollOutcome};
use crate::locator::Locator;
use crate::result::{E2eError, E2eResult};
use crate::wait::Waiter;

/// Shared plumbing for page objects: driver handle, wait utility, and
/// interaction utility.
pub struct PageBase<'d> {
    driver: &'d dyn Driver,
    waiter: Waiter,
    interactor: Interactor,
}

impl std::fmt::Debug for PageBase<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageBase")
            .field("waiter", &self.waiter)
            .finish_non_exhaustive()
    }
}

impl<'d> PageBase<'d> {
    /// Create a base with default wait options
    #[must_use]
    pub fn new(driver: &'d dyn Driver) -> Self {
        Self::with_waiter(driver, Waiter::new())
    }

    /// Create a base with a custom waiter (tests shrink the budgets)
    #[must_use]
    pub fn with_waiter(driver: &'d dyn Driver, waiter: Waiter) -> Self {
        let interactor = Interactor::with_waiter(waiter.clone());
        Self {
            driver,
            waiter,
            interactor,
        }
    }

    /// The driver handle
    #[must_use]
    pub fn driver(&self) -> &'d dyn Driver {
        self.driver
    }

    /// The wait utility
    #[must_use]
    pub const fn waiter(&self) -> &Waiter {
        &self.waiter
    }

    /// The interaction utility
    #[must_use]
    pub const fn interactor(&self) -> &Interactor {
        &self.interactor
    }

    /// Wait until the document readyState is complete
    pub async fn wait_for_page_to_load(&self) -> bool {
        self.waiter.until_page_loaded(self.driver).await
    }

    /// Click a locator with the native/scripted fallback contract
    pub async fn click_element(&self, locator: &Locator) -> E2eResult<ClickOutcome> {
        self.interactor.click(self.driver, locator).await
    }

    /// Smooth-scroll a locator into view
    pub async fn scroll_to(&self, locator: &Locator) -> E2eResult<ScrollOutcome> {
        self.interactor.scroll_to(self.driver, locator).await
    }

    /// Trimmed text of an element, or None if it never resolves
    pub async fn element_text(&self, locator: &Locator) -> Option<String> {
        let element = self
            .waiter
            .until_present(self.driver, locator, None)
            .await
            .into_element()?;
        self.driver.element_text(&element).await.ok()
    }

    /// Accept a cookie banner; a missing banner is not an error
    pub async fn accept_cookies(&self, locator: &Locator) -> E2eResult<ClickOutcome> {
        let outcome = self.click_element(locator).await?;
        if outcome.clicked() {
            debug!(%locator, "cookies accepted");
        } else {
            debug!(%locator, "cookie banner not shown, skipping");
        }
        Ok(outcome)
    }

    /// Fail-fast verification that every critical locator resolves within
    /// the wait budget.
    pub async fn require_critical(&self, page: &str, locators: &[Locator]) -> E2eResult<()> {
        for locator in locators {
            let outcome = self.waiter.until_present(self.driver, locator, None).await;
            if !outcome.is_found() {
                error!(page, %locator, "critical element missing");
                return Err(E2eError::CriticalElementMissing {
                    page: page.to_string(),
                    locator: locator.to_string(),
                });
            }
        }
        debug!(page, "critical elements visible");
        Ok(())
    }

    /// Lowercased page title
    pub async fn title_lower(&self) -> String {
        self.driver
            .title()
            .await
            .map(|t| t.to_lowercase())
            .unwrap_or_default()
    }

    /// Lowercased current URL
    pub async fn url_lower(&self) -> String {
        self.driver
            .current_url()
            .await
            .map(|u| u.to_lowercase())
            .unwrap_or_default()
    }
}
