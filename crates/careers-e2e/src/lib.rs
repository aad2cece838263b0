//! Browser acceptance tests for the Insider careers site.
//!
//! The suite drives a real browser through the public careers flow: home
//! page, cookie consent, Company menu, Careers, the Quality Assurance team's
//! open positions, department/location filtering, and the View Role redirect
//! to the external applicant portal.
//!
//! # Architecture
//!
//! - [`driver::Driver`] is the abstract browser boundary. The CDP-backed
//!   [`browser::CdpDriver`] (feature `browser`) drives Chromium or Chrome;
//!   [`mock::MockDriver`] drives a scripted fake DOM for tests.
//! - [`wait::Waiter`] owns all DOM synchronization and reports explicit
//!   found/not-found outcomes instead of raising on timeouts.
//! - [`interact::Interactor`] layers clicks (with the scripted-click
//!   fallback), scrolling, and bounded retries on top of the waiter.
//! - [`pages`] holds one page object per site page; [`scenario`] sequences
//!   them into the acceptance flow.
//! - [`reporter`] writes run measurements to InfluxDB (feature `reporting`)
//!   and failure screenshots to disk.
//!
//! # Example
//!
//! ```no_run
//! use careers_e2e::mock::MockDriver;
//! use careers_e2e::scenario::{run_careers_scenario, ScenarioConfig};
//!
//! # async fn run() -> careers_e2e::result::E2eResult<()> {
//! let driver = MockDriver::new();
//! run_careers_scenario(&driver, &ScenarioConfig::default()).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod driver;
pub mod interact;
pub mod locator;
pub mod mock;
pub mod pages;
pub mod reporter;
pub mod result;
pub mod scenario;
pub mod wait;

#[cfg(feature = "browser")]
pub mod browser;

pub use config::SuiteConfig;
pub use driver::{BrowserEngine, Driver, DriverConfig, ElementHandle, Screenshot, WindowHandle};
pub use interact::{ClickOutcome, Interactor, ScrollOutcome};
pub use locator::{Locator, Strategy};
pub use pages::{CareersPage, HomePage, QaJobsPage};
pub use reporter::{FailureArtifacts, RunRecord, TestStatus};
pub use result::{E2eError, E2eResult};
pub use scenario::{run_careers_scenario, ScenarioConfig};
pub use wait::{WaitOptions, WaitOutcome, Waiter};

#[cfg(feature = "browser")]
pub use browser::CdpDriver;

#[cfg(feature = "reporting")]
pub use reporter::InfluxReporter;
