//! Acceptance run against the production site with a real browser.
//!
//! Requires the `browser` feature and an installed Chromium or Chrome.
//! Ignored by default; run with:
//!
//! ```text
//! cargo test --features browser --test live_site -- --ignored
//! ```

#![cfg(feature = "browser")]

use careers_e2e::browser::CdpDriver;
use careers_e2e::driver::{BrowserEngine, Driver, DriverConfig};
use careers_e2e::scenario::{run_careers_scenario, ScenarioConfig};

async fn run_live(engine: BrowserEngine) {
    if engine.find_executable().is_none() {
        eprintln!("skipping: no {engine} executable found");
        return;
    }
    let driver = CdpDriver::launch(DriverConfig::for_engine(engine).no_sandbox())
        .await
        .expect("browser launch");
    let result = run_careers_scenario(&driver, &ScenarioConfig::default()).await;
    driver.close().await.expect("browser close");
    result.expect("careers scenario");
}

#[tokio::test]
#[ignore = "drives a real browser against the production site"]
async fn test_careers_flow_chromium() {
    run_live(BrowserEngine::Chromium).await;
}

#[tokio::test]
#[ignore = "drives a real browser against the production site"]
async fn test_careers_flow_chrome() {
    run_live(BrowserEngine::Chrome).await;
}
