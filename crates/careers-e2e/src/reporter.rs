//! Run reporting: InfluxDB measurements and failure screenshots.
//!
//! Reporting is best-effort by contract. A run that passed its assertions
//! must not be failed by an unreachable metrics store, so the send helpers
//! log and swallow errors instead of propagating them into the scenario
//! result.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use crate::driver::{BrowserEngine, Screenshot};
use crate::result::{E2eError, E2eResult};

/// Outcome of one scenario run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestStatus {
    /// Every assertion held
    Passed,
    /// An assertion or step failed
    Failed,
}

impl TestStatus {
    /// Status name used in measurements and logs
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
        }
    }
}

/// One scenario run, ready to be written as a measurement
#[derive(Debug, Clone)]
pub struct RunRecord {
    /// Scenario name
    pub test_name: String,
    /// Engine the run used
    pub engine: BrowserEngine,
    /// Run outcome
    pub status: TestStatus,
    /// Wall-clock duration of the run
    pub duration: Duration,
    /// Failure message, if any
    pub message: Option<String>,
    /// Unix timestamp in nanoseconds
    pub timestamp_ns: i64,
}

impl RunRecord {
    /// Record a passed run
    #[must_use]
    pub fn passed(test_name: impl Into<String>, engine: BrowserEngine, duration: Duration) -> Self {
        Self {
            test_name: test_name.into(),
            engine,
            status: TestStatus::Passed,
            duration,
            message: None,
            timestamp_ns: Utc::now().timestamp_nanos_opt().unwrap_or(0),
        }
    }

    /// Record a failed run with its failure message
    #[must_use]
    pub fn failed(
        test_name: impl Into<String>,
        engine: BrowserEngine,
        duration: Duration,
        message: impl Into<String>,
    ) -> Self {
        Self {
            test_name: test_name.into(),
            engine,
            status: TestStatus::Failed,
            duration,
            message: Some(message.into()),
            timestamp_ns: Utc::now().timestamp_nanos_opt().unwrap_or(0),
        }
    }

    /// Render the record as one InfluxDB line-protocol measurement.
    #[must_use]
    pub fn to_line_protocol(&self, measurement: &str) -> String {
        let passed = i64::from(self.status == TestStatus::Passed);
        let mut line = format!(
            "{},test={},engine={} status=\"{}\",passed={}i,duration_ms={}i",
            escape_tag(measurement),
            escape_tag(&self.test_name),
            self.engine.as_str(),
            self.status.as_str(),
            passed,
            self.duration.as_millis(),
        );
        if let Some(message) = &self.message {
            line.push_str(&format!(",message=\"{}\"", escape_field(message)));
        }
        line.push_str(&format!(" {}", self.timestamp_ns));
        line
    }
}

fn escape_tag(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace(',', "\\,")
        .replace(' ', "\\ ")
        .replace('=', "\\=")
}

fn escape_field(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// InfluxDB v2 connection settings
#[derive(Debug, Clone)]
pub struct InfluxSettings {
    /// Server base URL, e.g. `http://localhost:8086`
    pub url: String,
    /// Organization name
    pub org: String,
    /// Bucket name
    pub bucket: String,
    /// API token
    pub token: String,
    /// Measurement name
    pub measurement: String,
}

impl InfluxSettings {
    /// Settings with the default measurement name
    #[must_use]
    pub fn new(
        url: impl Into<String>,
        org: impl Into<String>,
        bucket: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            org: org.into(),
            bucket: bucket.into(),
            token: token.into(),
            measurement: "careers_e2e".to_string(),
        }
    }

    /// Write endpoint with org/bucket/precision query parameters
    #[must_use]
    pub fn write_url(&self) -> String {
        format!(
            "{}/api/v2/write?org={}&bucket={}&precision=ns",
            self.url.trim_end_matches('/'),
            self.org,
            self.bucket
        )
    }
}

/// Reporter that writes run records to InfluxDB
#[cfg(feature = "reporting")]
#[derive(Debug, Clone)]
pub struct InfluxReporter {
    settings: InfluxSettings,
    client: reqwest::Client,
}

#[cfg(feature = "reporting")]
impl InfluxReporter {
    /// Create a reporter for the given connection settings
    #[must_use]
    pub fn new(settings: InfluxSettings) -> Self {
        Self {
            settings,
            client: reqwest::Client::new(),
        }
    }

    /// Write one record. Errors are returned so `report` can decide what to
    /// do with them; scenario callers use [`Self::report`] instead.
    pub async fn write(&self, record: &RunRecord) -> E2eResult<()> {
        let body = record.to_line_protocol(&self.settings.measurement);
        let response = self
            .client
            .post(self.settings.write_url())
            .header("Authorization", format!("Token {}", self.settings.token))
            .header("Content-Type", "text/plain; charset=utf-8")
            .body(body)
            .send()
            .await
            .map_err(|e| E2eError::ReportingError {
                message: e.to_string(),
            })?;
        if !response.status().is_success() {
            return Err(E2eError::ReportingError {
                message: format!("influxdb returned {}", response.status()),
            });
        }
        Ok(())
    }

    /// Best-effort write: failures are logged and swallowed so reporting can
    /// never fail a run.
    pub async fn report(&self, record: &RunRecord) {
        match self.write(record).await {
            Ok(()) => info!(
                test = record.test_name.as_str(),
                engine = %record.engine,
                status = record.status.as_str(),
                "run reported"
            ),
            Err(err) => warn!(error = %err, "result reporting failed, ignoring"),
        }
    }
}

/// Writes failure screenshots to disk, one PNG per failed run.
#[derive(Debug, Clone)]
pub struct FailureArtifacts {
    dir: PathBuf,
}

impl FailureArtifacts {
    /// Artifacts rooted at a directory (created on first write)
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The artifact directory
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write a screenshot named after the failed run. Returns the path it
    /// was written to.
    pub fn save_screenshot(&self, name: &str, screenshot: &Screenshot) -> E2eResult<PathBuf> {
        if !screenshot.is_valid() {
            return Err(E2eError::ScreenshotError {
                message: "empty screenshot".to_string(),
            });
        }
        std::fs::create_dir_all(&self.dir)?;
        let stamp = Utc::now().format("%Y%m%d-%H%M%S");
        let path = self.dir.join(format!("{}-{stamp}.png", sanitize(name)));
        std::fs::write(&path, &screenshot.data)?;
        info!(path = %path.display(), "failure screenshot saved");
        Ok(path)
    }

    /// Best-effort variant for failure paths: logs and swallows errors.
    pub fn save_screenshot_best_effort(&self, name: &str, screenshot: &Screenshot) {
        if let Err(err) = self.save_screenshot(name, screenshot) {
            warn!(error = %err, "failed to save failure screenshot, ignoring");
        }
    }
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    mod line_protocol_tests {
        use super::*;

        #[test]
        fn test_passed_record() {
            let record = RunRecord::passed(
                "careers_flow",
                BrowserEngine::Chromium,
                Duration::from_millis(1234),
            );
            let line = record.to_line_protocol("careers_e2e");
            assert!(line.starts_with("careers_e2e,test=careers_flow,engine=chromium "));
            assert!(line.contains("status=\"passed\""));
            assert!(line.contains("passed=1i"));
            assert!(line.contains("duration_ms=1234i"));
            assert!(line.ends_with(&format!(" {}", record.timestamp_ns)));
        }

        #[test]
        fn test_failed_record_carries_message() {
            let record = RunRecord::failed(
                "careers_flow",
                BrowserEngine::Chrome,
                Duration::from_secs(9),
                "card missing \"istanbul\"",
            );
            let line = record.to_line_protocol("careers_e2e");
            assert!(line.contains("engine=chrome"));
            assert!(line.contains("passed=0i"));
            assert!(line.contains("message=\"card missing \\\"istanbul\\\"\""));
        }

        #[test]
        fn test_tag_escaping() {
            let record = RunRecord::passed(
                "careers flow, qa",
                BrowserEngine::Chromium,
                Duration::ZERO,
            );
            let line = record.to_line_protocol("careers_e2e");
            assert!(line.contains("test=careers\\ flow\\,\\ qa"));
        }
    }

    mod settings_tests {
        use super::*;

        #[test]
        fn test_write_url() {
            let settings =
                InfluxSettings::new("http://localhost:8086/", "qa", "e2e", "secret");
            assert_eq!(
                settings.write_url(),
                "http://localhost:8086/api/v2/write?org=qa&bucket=e2e&precision=ns"
            );
        }
    }

    mod artifact_tests {
        use super::*;

        #[test]
        fn test_save_screenshot() {
            let dir = tempfile::tempdir().unwrap();
            let artifacts = FailureArtifacts::new(dir.path());
            let shot = Screenshot::new(vec![0x89, 0x50, 0x4E, 0x47]);

            let path = artifacts.save_screenshot("careers flow/chrome", &shot).unwrap();
            assert!(path.exists());
            assert_eq!(std::fs::read(&path).unwrap(), shot.data);
            let file_name = path.file_name().unwrap().to_string_lossy().into_owned();
            assert!(file_name.starts_with("careers_flow_chrome-"));
        }

        #[test]
        fn test_empty_screenshot_rejected() {
            let dir = tempfile::tempdir().unwrap();
            let artifacts = FailureArtifacts::new(dir.path());
            let err = artifacts
                .save_screenshot("x", &Screenshot::new(vec![]))
                .unwrap_err();
            assert!(matches!(err, E2eError::ScreenshotError { .. }));
        }
    }
}
