//! Insider home page.

use tracing::info;

use crate::driver::Driver;
use crate::interact::ClickOutcome;
use crate::locator::Locator;
use crate::result::{E2eError, E2eResult};
use crate::wait::Waiter;

use super::PageBase;

/// Landing page: cookie banner plus the Company menu leading to Careers.
#[derive(Debug)]
pub struct HomePage<'d> {
    base: PageBase<'d>,
}

impl<'d> HomePage<'d> {
    /// Site root
    pub const URL: &'static str = "https://useinsider.com";

    /// Cookie consent accept-all button
    pub const COOKIE_ACCEPT: Locator = Locator::xpath("//*[@id='wt-cli-accept-all-btn']");
    /// "Company" entry in the navbar
    pub const COMPANY_MENU: Locator = Locator::xpath("(//*[@id='navbarDropdownMenuLink'])[5]");
    /// "Careers" link inside the Company dropdown
    pub const CAREERS_LINK: Locator =
        Locator::xpath("//*[@id='navbarNavDropdown']/ul[1]/li[6]/div/div[2]/a[2]");

    /// Critical locators verified after `open()`
    const CRITICAL: [Locator; 2] = [Self::COOKIE_ACCEPT, Self::COMPANY_MENU];

    /// Create the page object over a driver
    #[must_use]
    pub fn new(driver: &'d dyn Driver) -> Self {
        Self {
            base: PageBase::new(driver),
        }
    }

    /// Create with a custom waiter (tests shrink the budgets)
    #[must_use]
    pub fn with_waiter(driver: &'d dyn Driver, waiter: Waiter) -> Self {
        Self {
            base: PageBase::with_waiter(driver, waiter),
        }
    }

    /// Open the home page: navigate, wait for load, and fail fast if the
    /// critical elements are missing.
    pub async fn open(&self, url: &str) -> E2eResult<()> {
        info!(url, "opening home page");
        self.base.driver().navigate(url).await?;
        self.base.wait_for_page_to_load().await;
        self.base.require_critical("home", &Self::CRITICAL).await
    }

    /// Whether the home page is reachable: readyState settles and the title
    /// carries the site keyword. Never raises; calling twice without
    /// navigation yields the same answer.
    pub async fn is_accessible(&self) -> bool {
        self.base.wait_for_page_to_load().await;
        self.base.title_lower().await.contains("insider")
    }

    /// Accept the cookie banner (missing banner is tolerated)
    pub async fn accept_cookies(&self) -> E2eResult<ClickOutcome> {
        self.base.accept_cookies(&Self::COOKIE_ACCEPT).await
    }

    /// Navigate to the Careers page through the Company menu.
    ///
    /// Both clicks are required steps; an unresolvable menu entry is a hard
    /// failure rather than a silent no-op.
    pub async fn navigate_to_careers(&self) -> E2eResult<()> {
        for locator in [&Self::COMPANY_MENU, &Self::CAREERS_LINK] {
            let outcome = self.base.click_element(locator).await?;
            if !outcome.clicked() {
                return Err(E2eError::CriticalElementMissing {
                    page: "home".to_string(),
                    locator: locator.to_string(),
                });
            }
        }
        info!("navigated to careers via company menu");
        Ok(())
    }
}
