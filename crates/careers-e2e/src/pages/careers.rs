//! Careers overview page.

use std::time::Duration;

use tracing::{info, warn};

use crate::driver::Driver;
use crate::locator::Locator;
use crate::result::{E2eError, E2eResult};
use crate::wait::Waiter;

use super::PageBase;

/// Careers page: location/team/culture blocks and the path into the QA
/// team's open positions.
#[derive(Debug)]
pub struct CareersPage<'d> {
    base: PageBase<'d>,
}

impl<'d> CareersPage<'d> {
    /// "Our Locations" block
    pub const LOCATIONS_BLOCK: Locator =
        Locator::xpath("//*[@id='career-our-location']/div/div/div/div[1]");
    /// "Find your calling" teams block
    pub const TEAMS_BLOCK: Locator = Locator::xpath("//*[@id='career-find-our-calling']/div/div/a");
    /// "Life at Insider" heading
    pub const LIFE_AT_INSIDER: Locator =
        Locator::xpath("//h2[contains(text(), 'Life at Insider')]");
    /// "See all teams" expander
    pub const SEE_ALL_TEAMS: Locator = Locator::xpath("//a[contains(text(), 'See all teams')]");
    /// Quality Assurance team card heading
    pub const QA_TEAM: Locator = Locator::xpath("//h3[contains(text(), 'Quality Assurance')]");
    /// "Open Positions" link under the QA team card
    pub const QA_OPEN_POSITIONS: Locator = Locator::xpath(
        "//h3[contains(text(), 'Quality Assurance')]/following-sibling::a[contains(text(), 'Open Positions')]",
    );
    /// Link that confirms the QA careers page has loaded
    pub const SEE_ALL_QA_JOBS: Locator = Locator::xpath("//a[contains(text(), 'See all QA jobs')]");

    /// Budget for the post-navigation "See all QA jobs" confirmation
    const QA_LANDING_BUDGET: Duration = Duration::from_secs(10);

    /// Attach to the careers page, fail-fast verifying the critical blocks.
    pub async fn attach(driver: &'d dyn Driver) -> E2eResult<Self> {
        Self::attach_with_waiter(driver, Waiter::new()).await
    }

    /// Attach with a custom waiter (tests shrink the budgets)
    pub async fn attach_with_waiter(driver: &'d dyn Driver, waiter: Waiter) -> E2eResult<Self> {
        let base = PageBase::with_waiter(driver, waiter);
        base.require_critical(
            "careers",
            &[Self::LOCATIONS_BLOCK, Self::TEAMS_BLOCK, Self::LIFE_AT_INSIDER],
        )
        .await?;
        Ok(Self { base })
    }

    /// Whether the careers page is reachable: readyState settles and the
    /// title or URL carries a careers keyword. Never raises.
    pub async fn is_accessible(&self) -> bool {
        self.base.wait_for_page_to_load().await;
        let title = self.base.title_lower().await;
        let url = self.base.url_lower().await;
        title.contains("careers") || title.contains("quality assurance") || url.contains("/careers")
    }

    /// Verify the Locations, Teams, and Life at Insider blocks are present.
    pub async fn verify_sections(&self) -> bool {
        for locator in [&Self::LOCATIONS_BLOCK, &Self::TEAMS_BLOCK, &Self::LIFE_AT_INSIDER] {
            let outcome = self
                .base
                .waiter()
                .until_present(self.base.driver(), locator, None)
                .await;
            if !outcome.is_found() {
                warn!(%locator, "careers section missing");
                return false;
            }
        }
        info!("locations, teams, and life-at-insider sections visible");
        true
    }

    /// Navigate into the QA team's open positions: expand "See all teams",
    /// scroll to the QA card, click its "Open Positions" link, and wait for
    /// the QA careers landing link to appear.
    pub async fn go_to_qa_careers(&self) -> E2eResult<()> {
        self.base.scroll_to(&Self::SEE_ALL_TEAMS).await?;
        let outcome = self.base.click_element(&Self::SEE_ALL_TEAMS).await?;
        if !outcome.clicked() {
            return Err(E2eError::CriticalElementMissing {
                page: "careers".to_string(),
                locator: Self::SEE_ALL_TEAMS.to_string(),
            });
        }
        self.base.wait_for_page_to_load().await;

        self.base.scroll_to(&Self::QA_TEAM).await?;
        let outcome = self.base.click_element(&Self::QA_OPEN_POSITIONS).await?;
        if !outcome.clicked() {
            return Err(E2eError::CriticalElementMissing {
                page: "careers".to_string(),
                locator: Self::QA_OPEN_POSITIONS.to_string(),
            });
        }
        info!("clicked QA open positions");

        let landing = self
            .base
            .waiter()
            .until_present(
                self.base.driver(),
                &Self::SEE_ALL_QA_JOBS,
                Some(Self::QA_LANDING_BUDGET),
            )
            .await;
        if !landing.is_found() {
            return Err(E2eError::CriticalElementMissing {
                page: "qa careers".to_string(),
                locator: Self::SEE_ALL_QA_JOBS.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockDriver, MockEffect, MockElement, MockPage};
    use crate::wait::WaitOptions;

    fn fast_waiter() -> Waiter {
        Waiter::with_options(
            WaitOptions::new()
                .with_budget(Duration::from_millis(200))
                .with_page_load_budget(Duration::from_millis(200))
                .with_poll_interval(Duration::from_millis(20)),
        )
    }

    fn careers_fixture() -> MockPage {
        MockPage::new("https://useinsider.com/careers/")
            .with_title("Insider Careers")
            .with_element(CareersPage::LOCATIONS_BLOCK.selector(), MockElement::new("28 offices"))
            .with_element(CareersPage::TEAMS_BLOCK.selector(), MockElement::new("Teams"))
            .with_element(CareersPage::LIFE_AT_INSIDER.selector(), MockElement::new("Life at Insider"))
            .with_element(
                CareersPage::SEE_ALL_TEAMS.selector(),
                MockElement::new("See all teams"),
            )
            .with_element(CareersPage::QA_TEAM.selector(), MockElement::new("Quality Assurance"))
            .with_element(
                CareersPage::QA_OPEN_POSITIONS.selector(),
                MockElement::new("Open Positions").on_click(MockEffect::AddElement {
                    selector: CareersPage::SEE_ALL_QA_JOBS.selector().to_string(),
                    element: MockElement::new("See all QA jobs"),
                }),
            )
    }

    #[tokio::test]
    async fn test_attach_requires_sections() {
        let driver = MockDriver::new();
        driver.load_page(MockPage::new("https://useinsider.com/careers/").with_title("Careers"));

        let err = CareersPage::attach_with_waiter(&driver, fast_waiter())
            .await
            .unwrap_err();
        assert!(matches!(err, E2eError::CriticalElementMissing { .. }));
    }

    #[tokio::test]
    async fn test_is_accessible_by_url() {
        let driver = MockDriver::new();
        driver.load_page(careers_fixture().with_title("untitled"));

        let page = CareersPage::attach_with_waiter(&driver, fast_waiter())
            .await
            .unwrap();
        assert!(page.is_accessible().await);
    }

    #[tokio::test]
    async fn test_verify_sections() {
        let driver = MockDriver::new();
        driver.load_page(careers_fixture());

        let page = CareersPage::attach_with_waiter(&driver, fast_waiter())
            .await
            .unwrap();
        assert!(page.verify_sections().await);
    }

    #[tokio::test]
    async fn test_go_to_qa_careers_waits_for_landing_link() {
        let driver = MockDriver::new();
        driver.load_page(careers_fixture());

        let page = CareersPage::attach_with_waiter(&driver, fast_waiter())
            .await
            .unwrap();
        page.go_to_qa_careers().await.unwrap();
        assert!(driver.was_called("scroll_into_view:"));
        assert_eq!(driver.calls_matching("click:").len(), 2);
    }

    #[tokio::test]
    async fn test_go_to_qa_careers_fails_without_open_positions() {
        let driver = MockDriver::new();
        let fixture = MockPage::new("https://useinsider.com/careers/")
            .with_title("Insider Careers")
            .with_element(CareersPage::LOCATIONS_BLOCK.selector(), MockElement::new("28 offices"))
            .with_element(CareersPage::TEAMS_BLOCK.selector(), MockElement::new("Teams"))
            .with_element(
                CareersPage::LIFE_AT_INSIDER.selector(),
                MockElement::new("Life at Insider"),
            )
            .with_element(
                CareersPage::SEE_ALL_TEAMS.selector(),
                MockElement::new("See all teams"),
            );
        driver.load_page(fixture);

        let page = CareersPage::attach_with_waiter(&driver, fast_waiter())
            .await
            .unwrap();
        let err = page.go_to_qa_careers().await.unwrap_err();
        assert!(matches!(err, E2eError::CriticalElementMissing { .. }));
    }
}
