//! Suite configuration from the environment.
//!
//! CLI flags override these values; the environment is the baseline so CI
//! pipelines can configure runs without touching the invocation.

use std::path::PathBuf;

use tracing::warn;

use crate::driver::BrowserEngine;
use crate::reporter::InfluxSettings;
use crate::scenario::ScenarioConfig;

/// Environment variable for the site root
pub const ENV_BASE_URL: &str = "E2E_BASE_URL";
/// Environment variable listing engines, comma separated
pub const ENV_ENGINES: &str = "E2E_ENGINES";
/// Environment variable enabling headed (visible) browser windows
pub const ENV_HEADED: &str = "E2E_HEADED";
/// Environment variable for the failure screenshot directory
pub const ENV_SCREENSHOT_DIR: &str = "E2E_SCREENSHOT_DIR";
/// InfluxDB server URL
pub const ENV_INFLUX_URL: &str = "INFLUX_URL";
/// InfluxDB organization
pub const ENV_INFLUX_ORG: &str = "INFLUX_ORG";
/// InfluxDB bucket
pub const ENV_INFLUX_BUCKET: &str = "INFLUX_BUCKET";
/// InfluxDB API token
pub const ENV_INFLUX_TOKEN: &str = "INFLUX_TOKEN";

/// Resolved suite configuration
#[derive(Debug, Clone)]
pub struct SuiteConfig {
    /// Scenario parameters
    pub scenario: ScenarioConfig,
    /// Engines to run, in order
    pub engines: Vec<BrowserEngine>,
    /// Run with visible browser windows
    pub headed: bool,
    /// Where failure screenshots land
    pub screenshot_dir: PathBuf,
    /// Reporting settings when all four Influx variables are present
    pub influx: Option<InfluxSettings>,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            scenario: ScenarioConfig::default(),
            engines: BrowserEngine::ALL.to_vec(),
            headed: false,
            screenshot_dir: PathBuf::from("screenshots"),
            influx: None,
        }
    }
}

impl SuiteConfig {
    /// Build the configuration from process environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source (tests inject a map here).
    pub fn from_vars(get: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = get(ENV_BASE_URL) {
            config.scenario.base_url = url;
        }
        if let Some(list) = get(ENV_ENGINES) {
            let engines: Vec<BrowserEngine> = list
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .filter_map(|name| {
                    let engine = BrowserEngine::parse(name);
                    if engine.is_none() {
                        warn!(name, "unknown engine in {ENV_ENGINES}, skipping");
                    }
                    engine
                })
                .collect();
            if !engines.is_empty() {
                config.engines = engines;
            }
        }
        if let Some(headed) = get(ENV_HEADED) {
            config.headed = matches!(headed.trim(), "1" | "true" | "yes");
        }
        if let Some(dir) = get(ENV_SCREENSHOT_DIR) {
            config.screenshot_dir = PathBuf::from(dir);
        }

        config.influx = match (
            get(ENV_INFLUX_URL),
            get(ENV_INFLUX_ORG),
            get(ENV_INFLUX_BUCKET),
            get(ENV_INFLUX_TOKEN),
        ) {
            (Some(url), Some(org), Some(bucket), Some(token)) => {
                Some(InfluxSettings::new(url, org, bucket, token))
            }
            (None, None, None, None) => None,
            _ => {
                warn!("incomplete influxdb configuration, reporting disabled");
                None
            }
        };

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = SuiteConfig::from_vars(|_| None);
        assert_eq!(config.engines, BrowserEngine::ALL.to_vec());
        assert!(!config.headed);
        assert!(config.influx.is_none());
        assert_eq!(config.scenario.base_url, "https://useinsider.com");
    }

    #[test]
    fn test_engine_list_parsed() {
        let env = vars(&[("E2E_ENGINES", "chrome, firefox, chromium")]);
        let config = SuiteConfig::from_vars(|name| env.get(name).cloned());
        // unknown names are skipped
        assert_eq!(
            config.engines,
            vec![BrowserEngine::Chrome, BrowserEngine::Chromium]
        );
    }

    #[test]
    fn test_all_unknown_engines_fall_back_to_default() {
        let env = vars(&[("E2E_ENGINES", "firefox,safari")]);
        let config = SuiteConfig::from_vars(|name| env.get(name).cloned());
        assert_eq!(config.engines, BrowserEngine::ALL.to_vec());
    }

    #[test]
    fn test_headed_flag() {
        let env = vars(&[("E2E_HEADED", "true")]);
        let config = SuiteConfig::from_vars(|name| env.get(name).cloned());
        assert!(config.headed);

        let env = vars(&[("E2E_HEADED", "0")]);
        let config = SuiteConfig::from_vars(|name| env.get(name).cloned());
        assert!(!config.headed);
    }

    #[test]
    fn test_complete_influx_settings() {
        let env = vars(&[
            ("INFLUX_URL", "http://localhost:8086"),
            ("INFLUX_ORG", "qa"),
            ("INFLUX_BUCKET", "e2e"),
            ("INFLUX_TOKEN", "secret"),
        ]);
        let config = SuiteConfig::from_vars(|name| env.get(name).cloned());
        let influx = config.influx.unwrap();
        assert_eq!(influx.org, "qa");
        assert_eq!(influx.bucket, "e2e");
    }

    #[test]
    fn test_partial_influx_settings_disable_reporting() {
        let env = vars(&[("INFLUX_URL", "http://localhost:8086")]);
        let config = SuiteConfig::from_vars(|name| env.get(name).cloned());
        assert!(config.influx.is_none());
    }
}
