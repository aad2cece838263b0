//! QA open positions page: department/location filtering, job card
//! verification, and the View Role redirect check.

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::driver::Driver;
use crate::locator::Locator;
use crate::result::{E2eError, E2eResult};
use crate::wait::Waiter;

use super::PageBase;

/// Retry tuning for the filter stabilization loop
#[derive(Debug, Clone)]
pub struct FilterTuning {
    /// Attempts before the department filter is declared unready
    pub attempts: u32,
    /// Sleep between attempts
    pub backoff: Duration,
    /// Budget per attempt for the department label to settle
    pub text_budget: Duration,
}

impl Default for FilterTuning {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff: Duration::from_secs(2),
            text_budget: Duration::from_secs(10),
        }
    }
}

/// QA jobs page object.
#[derive(Debug)]
pub struct QaJobsPage<'d> {
    base: PageBase<'d>,
    tuning: FilterTuning,
}

impl<'d> QaJobsPage<'d> {
    /// Landing link on the QA careers page
    pub const SEE_ALL_QA_JOBS: Locator = Locator::xpath("//a[contains(text(), 'See all QA jobs')]");
    /// "View Role" link on a job card
    pub const VIEW_ROLE: Locator = Locator::xpath("//a[contains(text(), 'View Role')]");
    /// A single job card
    pub const JOB_CARD: Locator =
        Locator::xpath("//div[contains(@class, 'position-list-item')]");
    /// Job cards scoped to the jobs list container
    pub const JOB_LIST: Locator =
        Locator::xpath("//div[@id='jobs-list']//div[contains(@class, 'position-list-item')]");
    /// Rendered department filter (select2 widget)
    pub const DEPARTMENT_CONTAINER: Locator = Locator::id("select2-filter-by-department-container");
    /// Rendered location filter (select2 widget)
    pub const LOCATION_CONTAINER: Locator = Locator::id("select2-filter-by-location-container");
    /// The Istanbul option inside the opened location dropdown
    pub const LOCATION_OPTION_ISTANBUL: Locator = Locator::xpath(
        "//li[contains(@class, 'select2-results__option') and normalize-space(text())='Istanbul, Turkiye']",
    );
    /// Underlying department select element
    pub const DEPARTMENT_DROPDOWN: Locator = Locator::xpath("//select[@id='department']");
    /// Underlying location select element
    pub const LOCATION_DROPDOWN: Locator = Locator::xpath("//select[@id='location']");

    /// Budget for the job list to render after filtering
    const JOB_LIST_BUDGET: Duration = Duration::from_secs(15);

    /// Attach to the QA jobs page, fail-fast verifying the landing link and
    /// at least one View Role control.
    pub async fn attach(driver: &'d dyn Driver) -> E2eResult<Self> {
        Self::attach_with_waiter(driver, Waiter::new()).await
    }

    /// Attach with a custom waiter (tests shrink the budgets)
    pub async fn attach_with_waiter(driver: &'d dyn Driver, waiter: Waiter) -> E2eResult<Self> {
        let base = PageBase::with_waiter(driver, waiter);
        base.require_critical("qa jobs", &[Self::SEE_ALL_QA_JOBS, Self::VIEW_ROLE])
            .await?;
        Ok(Self {
            base,
            tuning: FilterTuning::default(),
        })
    }

    /// Override the filter retry tuning
    #[must_use]
    pub fn with_filter_tuning(mut self, tuning: FilterTuning) -> Self {
        self.tuning = tuning;
        self
    }

    /// Whether the QA jobs page is reachable. Never raises.
    pub async fn is_accessible(&self) -> bool {
        self.base.wait_for_page_to_load().await;
        let title = self.base.title_lower().await;
        let url = self.base.url_lower().await;
        title.contains("quality assurance") || url.contains("quality-assurance")
    }

    /// Click through to the full QA jobs listing.
    pub async fn click_see_all_qa_jobs(&self) -> E2eResult<()> {
        let outcome = self.base.click_element(&Self::SEE_ALL_QA_JOBS).await?;
        if !outcome.clicked() {
            return Err(E2eError::CriticalElementMissing {
                page: "qa jobs".to_string(),
                locator: Self::SEE_ALL_QA_JOBS.to_string(),
            });
        }
        self.base.wait_for_page_to_load().await;
        Ok(())
    }

    /// Apply the location and department filters through the underlying
    /// select elements by typing the option labels.
    pub async fn filter_jobs(&self, location: &str, department: &str) -> E2eResult<()> {
        let interactor = self.base.interactor();
        let driver = self.base.driver();
        if !interactor
            .select_by_typing(driver, &Self::LOCATION_DROPDOWN, location)
            .await?
        {
            return Err(E2eError::assertion(
                "filter jobs",
                format!("location filter did not accept '{location}'"),
            ));
        }
        if !interactor
            .select_by_typing(driver, &Self::DEPARTMENT_DROPDOWN, department)
            .await?
        {
            return Err(E2eError::assertion(
                "filter jobs",
                format!("department filter did not accept '{department}'"),
            ));
        }
        info!(location, department, "filters applied");
        Ok(())
    }

    /// Select the Istanbul location once the department filter has settled
    /// on `department_label`.
    ///
    /// The department widget populates itself asynchronously when the page
    /// is entered from the QA careers flow, so this retries a bounded number
    /// of times: each attempt scrolls the widget into view, waits for its
    /// label to read `department_label`, and only then opens the location
    /// dropdown and picks Istanbul. Returns `Ok(false)` when every attempt
    /// is exhausted without the label settling.
    pub async fn select_location_when_department_ready(
        &self,
        department_label: &str,
    ) -> E2eResult<bool> {
        let driver = self.base.driver();
        let waiter = self.base.waiter();
        let attempts = self.tuning.attempts.max(1);

        for attempt in 1..=attempts {
            let _ = self.base.scroll_to(&Self::DEPARTMENT_CONTAINER).await?;
            let outcome = waiter
                .until_text_is(
                    driver,
                    &Self::DEPARTMENT_CONTAINER,
                    department_label,
                    Some(self.tuning.text_budget),
                )
                .await;
            if outcome.is_matched() {
                debug!(attempt, department_label, "department filter settled");
                self.wait_for_job_cards_to_be_replaced().await;

                let opened = self.base.click_element(&Self::LOCATION_CONTAINER).await?;
                if !opened.clicked() {
                    return Err(E2eError::CriticalElementMissing {
                        page: "qa jobs".to_string(),
                        locator: Self::LOCATION_CONTAINER.to_string(),
                    });
                }
                let picked = self
                    .base
                    .click_element(&Self::LOCATION_OPTION_ISTANBUL)
                    .await?;
                if !picked.clicked() {
                    return Err(E2eError::CriticalElementMissing {
                        page: "qa jobs".to_string(),
                        locator: Self::LOCATION_OPTION_ISTANBUL.to_string(),
                    });
                }
                let _ = waiter
                    .until_present(driver, &Self::JOB_CARD, Some(Self::JOB_LIST_BUDGET))
                    .await;
                info!(attempt, "location selected after department settled");
                return Ok(true);
            }
            warn!(
                attempt,
                attempts,
                department_label,
                last_observed = outcome.last_observed().unwrap_or("<never resolved>"),
                "department filter not settled yet"
            );
            if attempt < attempts {
                tokio::time::sleep(self.tuning.backoff).await;
            }
        }
        error!(
            department_label,
            attempts, "department filter never settled, giving up"
        );
        Ok(false)
    }

    /// Wait for job cards to render inside the jobs list container.
    pub async fn wait_for_job_cards_to_load(&self) -> bool {
        self.base
            .waiter()
            .until_present(
                self.base.driver(),
                &Self::JOB_LIST,
                Some(Self::JOB_LIST_BUDGET),
            )
            .await
            .is_found()
    }

    /// Wait for the stale unfiltered job list to be torn down and a fresh
    /// one to render. The teardown never firing is tolerated (the list may
    /// be replaced in place); the fresh render is what matters.
    pub async fn wait_for_job_cards_to_be_replaced(&self) -> bool {
        let driver = self.base.driver();
        let waiter = self.base.waiter();
        let _ = waiter
            .until_gone(driver, &Self::JOB_CARD, Some(Duration::from_secs(2)))
            .await;
        waiter
            .until_count_at_least(driver, &Self::JOB_CARD, 1, Some(Self::JOB_LIST_BUDGET))
            .await
    }

    /// Verify at least one rendered job card mentions both keywords
    /// (case-insensitive).
    pub async fn verify_job_listings(
        &self,
        department_keyword: &str,
        location_keyword: &str,
    ) -> E2eResult<bool> {
        let texts = self.job_card_texts().await?;
        if texts.is_empty() {
            warn!("no job cards rendered");
            return Ok(false);
        }
        let department_keyword = department_keyword.to_lowercase();
        let location_keyword = location_keyword.to_lowercase();
        let matching = texts
            .iter()
            .filter(|text| {
                let text = text.to_lowercase();
                text.contains(&department_keyword) && text.contains(&location_keyword)
            })
            .count();
        if matching == 0 {
            warn!(count = texts.len(), "no job card mentions both keywords");
            return Ok(false);
        }
        info!(
            matching,
            count = texts.len(),
            "job cards match the filters"
        );
        Ok(true)
    }

    async fn job_card_texts(&self) -> E2eResult<Vec<String>> {
        let value = self
            .base
            .driver()
            .execute_js(&Self::JOB_CARD.to_all_text_query())
            .await?;
        match value {
            Value::Array(items) => Ok(items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(text) => Some(text),
                    _ => None,
                })
                .collect()),
            Value::Null => Ok(Vec::new()),
            other => Err(E2eError::ScriptError {
                message: format!("job card text query returned {other}"),
            }),
        }
    }

    /// Click the first "View Role" link and verify the tab it opens lands
    /// on `external_domain`.
    ///
    /// The click is retried a bounded number of times because the card list
    /// re-renders under the cursor while lazy images load. If a second
    /// window appears the check runs there; a same-tab redirect is also
    /// accepted.
    pub async fn verify_view_role_redirects(&self, external_domain: &str) -> E2eResult<bool> {
        let driver = self.base.driver();
        let waiter = self.base.waiter();
        let interactor = self.base.interactor();

        let cards = waiter
            .until_present(driver, &Self::JOB_CARD, Some(Self::JOB_LIST_BUDGET))
            .await;
        if !cards.is_found() {
            return Err(E2eError::CriticalElementMissing {
                page: "qa jobs".to_string(),
                locator: Self::JOB_CARD.to_string(),
            });
        }

        let attempts = self.tuning.attempts.max(1);
        let mut clicked = false;
        for attempt in 1..=attempts {
            let links = driver.query_all(&Self::VIEW_ROLE).await?;
            if let Some(link) = links.first() {
                interactor.scroll_to_handle(driver, link).await?;
                match interactor
                    .click_handle(driver, &Self::VIEW_ROLE, link)
                    .await
                {
                    Ok(outcome) if outcome.clicked() => {
                        clicked = true;
                        break;
                    }
                    Ok(_) => warn!(attempt, "view role click did not land"),
                    Err(err) => warn!(attempt, error = %err, "view role click failed"),
                }
            } else {
                warn!(attempt, "no view role link rendered");
            }
            if attempt < attempts {
                tokio::time::sleep(self.tuning.backoff).await;
            }
        }
        if !clicked {
            return Err(E2eError::assertion(
                "view role",
                format!("view role link not clickable after {attempts} attempts"),
            ));
        }

        let windows = driver.window_handles().await?;
        if windows.len() > 1 {
            driver.switch_to_window(&windows[1]).await?;
        }
        self.base.wait_for_page_to_load().await;
        let url = self.base.url_lower().await;
        let redirected = url.contains(&external_domain.to_lowercase());
        if redirected {
            info!(url = url.as_str(), "view role redirected to the applicant portal");
        } else {
            warn!(url = url.as_str(), external_domain, "view role did not redirect");
        }
        Ok(redirected)
    }
}
