//! Runner for the careers browser acceptance suite.
//!
//! Launches one browser session per engine, runs the full careers scenario
//! in each, and reports results. Sessions are independent: a failure in one
//! engine does not stop the others, and every session is closed even when
//! its run fails.
//!
//! ```bash
//! careers-e2e                          # both engines, headless
//! careers-e2e --engine chrome --headed # one engine, visible window
//! careers-e2e --base-url https://staging.useinsider.com
//! ```

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use careers_e2e::driver::BrowserEngine;
use careers_e2e::SuiteConfig;

const SCENARIO_NAME: &str = "careers_flow";

#[derive(Debug, Parser)]
#[command(name = "careers-e2e", about = "Browser acceptance tests for the careers site", version)]
struct Cli {
    /// Engine to run (repeatable; default: chromium and chrome)
    #[arg(long, value_name = "ENGINE")]
    engine: Vec<String>,

    /// Show browser windows instead of running headless
    #[arg(long)]
    headed: bool,

    /// Site root to test against
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Directory for failure screenshots
    #[arg(long, value_name = "DIR")]
    screenshot_dir: Option<String>,

    /// Increase log verbosity (repeatable)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn init_tracing(cli: &Cli) {
    let default_level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("careers_e2e={default_level}")));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn resolve_config(cli: &Cli) -> Result<SuiteConfig, String> {
    let mut config = SuiteConfig::from_env();
    if !cli.engine.is_empty() {
        let mut engines = Vec::new();
        for name in &cli.engine {
            match BrowserEngine::parse(name) {
                Some(engine) => engines.push(engine),
                None => return Err(format!("unknown engine '{name}' (chromium, chrome)")),
            }
        }
        config.engines = engines;
    }
    if cli.headed {
        config.headed = true;
    }
    if let Some(url) = &cli.base_url {
        config.scenario.base_url.clone_from(url);
    }
    if let Some(dir) = &cli.screenshot_dir {
        config.screenshot_dir = dir.into();
    }
    Ok(config)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    let config = match resolve_config(&cli) {
        Ok(config) => config,
        Err(message) => {
            eprintln!("Error: {message}");
            return ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("Error: failed to start runtime: {err}");
            return ExitCode::FAILURE;
        }
    };
    if runtime.block_on(run_suite(&config)) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

#[cfg(feature = "browser")]
async fn run_suite(config: &SuiteConfig) -> bool {
    use careers_e2e::browser::CdpDriver;
    use careers_e2e::driver::{Driver, DriverConfig};
    use careers_e2e::reporter::{FailureArtifacts, RunRecord};
    use careers_e2e::scenario::run_careers_scenario;
    use std::time::Instant;

    let artifacts = FailureArtifacts::new(&config.screenshot_dir);
    let mut all_passed = true;

    for &engine in &config.engines {
        info!(%engine, "starting scenario run");
        let start = Instant::now();
        let driver_config = DriverConfig::for_engine(engine).headless(!config.headed);
        let driver = match CdpDriver::launch(driver_config).await {
            Ok(driver) => driver,
            Err(err) => {
                error!(%engine, error = %err, "browser launch failed");
                report(
                    config,
                    &RunRecord::failed(SCENARIO_NAME, engine, start.elapsed(), err.to_string()),
                )
                .await;
                all_passed = false;
                continue;
            }
        };

        let result = run_careers_scenario(&driver, &config.scenario).await;
        let duration = start.elapsed();

        let record = match &result {
            Ok(()) => {
                info!(%engine, ?duration, "scenario passed");
                RunRecord::passed(SCENARIO_NAME, engine, duration)
            }
            Err(err) => {
                error!(%engine, ?duration, error = %err, "scenario failed");
                if let Ok(shot) = driver.screenshot().await {
                    let name = format!("{SCENARIO_NAME}-{engine}");
                    artifacts.save_screenshot_best_effort(&name, &shot);
                }
                all_passed = false;
                RunRecord::failed(SCENARIO_NAME, engine, duration, err.to_string())
            }
        };

        if let Err(err) = driver.close().await {
            error!(%engine, error = %err, "browser close failed");
        }
        report(config, &record).await;
    }
    all_passed
}

#[cfg(not(feature = "browser"))]
async fn run_suite(_config: &SuiteConfig) -> bool {
    eprintln!("Error: built without browser support. Rebuild with --features browser");
    false
}

#[cfg(feature = "reporting")]
async fn report(config: &SuiteConfig, record: &careers_e2e::reporter::RunRecord) {
    use careers_e2e::InfluxReporter;
    if let Some(settings) = &config.influx {
        InfluxReporter::new(settings.clone()).report(record).await;
    }
}

#[cfg(not(feature = "reporting"))]
async fn report(_config: &SuiteConfig, _record: &careers_e2e::reporter::RunRecord) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_engines() {
        let cli = Cli::parse_from(["careers-e2e", "--engine", "chrome", "--headed"]);
        let config = resolve_config(&cli).unwrap();
        assert_eq!(config.engines, vec![BrowserEngine::Chrome]);
        assert!(config.headed);
    }

    #[test]
    fn test_cli_rejects_unknown_engine() {
        let cli = Cli::parse_from(["careers-e2e", "--engine", "firefox"]);
        assert!(resolve_config(&cli).is_err());
    }

    #[test]
    fn test_cli_overrides_base_url() {
        let cli = Cli::parse_from(["careers-e2e", "--base-url", "http://localhost:8080"]);
        let config = resolve_config(&cli).unwrap();
        assert_eq!(config.scenario.base_url, "http://localhost:8080");
    }
}
