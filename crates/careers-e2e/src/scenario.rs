//! The careers acceptance scenario, end to end.
//!
//! Sequencing across pages lives here; the page objects own their locators
//! and per-page behavior. Each step carries a stable label so a failure
//! reports exactly where the flow broke.

use tracing::info;

use crate::driver::Driver;
use crate::pages::{CareersPage, HomePage, QaJobsPage};
use crate::result::{E2eError, E2eResult};
use crate::wait::Waiter;

/// Scenario parameters. Defaults target the production site.
#[derive(Debug, Clone)]
pub struct ScenarioConfig {
    /// Site root to open
    pub base_url: String,
    /// Department label the filter widget must settle on
    pub department_label: String,
    /// Keyword every job card must mention (department side)
    pub department_keyword: String,
    /// Keyword every job card must mention (location side)
    pub location_keyword: String,
    /// Domain the View Role link must land on
    pub external_domain: String,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            base_url: HomePage::URL.to_string(),
            department_label: "Quality Assurance".to_string(),
            department_keyword: "quality assurance".to_string(),
            location_keyword: "istanbul".to_string(),
            external_domain: "lever.co".to_string(),
        }
    }
}

impl ScenarioConfig {
    /// Config with a different site root (staging, local fixture server)
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Run the full careers flow with default wait budgets.
pub async fn run_careers_scenario(driver: &dyn Driver, config: &ScenarioConfig) -> E2eResult<()> {
    run_careers_scenario_with_waiter(driver, config, Waiter::new()).await
}

/// Run the full careers flow with a custom waiter.
///
/// Home page → cookie consent → Company menu → Careers → QA team →
/// filtered job list → View Role redirect.
pub async fn run_careers_scenario_with_waiter(
    driver: &dyn Driver,
    config: &ScenarioConfig,
    waiter: Waiter,
) -> E2eResult<()> {
    info!(base_url = config.base_url.as_str(), "starting careers scenario");

    let home = HomePage::with_waiter(driver, waiter.clone());
    home.open(&config.base_url).await?;
    if !home.is_accessible().await {
        return Err(E2eError::assertion(
            "home page",
            "page title does not identify the site",
        ));
    }
    let _ = home.accept_cookies().await?;
    home.navigate_to_careers().await?;

    let careers = CareersPage::attach_with_waiter(driver, waiter.clone()).await?;
    let url = driver.current_url().await?.to_lowercase();
    if !url.contains("/careers") {
        return Err(E2eError::assertion(
            "careers page",
            format!("expected a careers url, got {url}"),
        ));
    }
    if !careers.is_accessible().await {
        return Err(E2eError::assertion(
            "careers page",
            "title and url do not identify the careers page",
        ));
    }
    if !careers.verify_sections().await {
        return Err(E2eError::assertion(
            "careers page",
            "locations, teams, or life-at-insider section missing",
        ));
    }
    careers.go_to_qa_careers().await?;

    let qa_jobs = QaJobsPage::attach_with_waiter(driver, waiter).await?;
    if !qa_jobs.is_accessible().await {
        return Err(E2eError::assertion(
            "qa jobs page",
            "title and url do not identify the quality assurance page",
        ));
    }
    qa_jobs.click_see_all_qa_jobs().await?;
    if !qa_jobs
        .select_location_when_department_ready(&config.department_label)
        .await?
    {
        return Err(E2eError::assertion(
            "job filters",
            format!(
                "department filter never settled on '{}'",
                config.department_label
            ),
        ));
    }
    if !qa_jobs.wait_for_job_cards_to_load().await {
        return Err(E2eError::assertion(
            "job list",
            "no job cards rendered after filtering",
        ));
    }
    if !qa_jobs
        .verify_job_listings(&config.department_keyword, &config.location_keyword)
        .await?
    {
        return Err(E2eError::assertion(
            "job list",
            format!(
                "no job card contains both '{}' and '{}'",
                config.department_keyword, config.location_keyword
            ),
        ));
    }
    if !qa_jobs
        .verify_view_role_redirects(&config.external_domain)
        .await?
    {
        return Err(E2eError::assertion(
            "view role",
            format!("did not land on {}", config.external_domain),
        ));
    }

    info!("careers scenario passed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_targets_production() {
        let config = ScenarioConfig::default();
        assert_eq!(config.base_url, "https://useinsider.com");
        assert_eq!(config.external_domain, "lever.co");
    }

    #[test]
    fn test_with_base_url() {
        let config = ScenarioConfig::default().with_base_url("http://localhost:8080");
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.department_label, "Quality Assurance");
    }
}
