//! Abstract browser driver boundary.
//!
//! The suite depends on an external automation driver only through the
//! [`Driver`] trait: navigate, query the DOM by locator, click (native or
//! scripted), send keys, evaluate scripts, read URL/title/readyState,
//! enumerate and switch windows, capture screenshots. The trait keeps the
//! page objects testable against [`crate::mock::MockDriver`] and lets the
//! CDP implementation live behind the `browser` feature.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::locator::Locator;
use crate::result::E2eResult;

/// Handle to a resolved DOM element.
///
/// The id addresses an entry in the driver's element registry; handles stay
/// valid until the document is replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementHandle {
    /// Registry id assigned by the driver
    pub id: u64,
    /// Element tag name, lowercase
    pub tag_name: String,
    /// Text content at resolution time (may go stale)
    pub text: Option<String>,
}

impl ElementHandle {
    /// Create a new element handle
    #[must_use]
    pub fn new(id: u64, tag_name: impl Into<String>) -> Self {
        Self {
            id,
            tag_name: tag_name.into(),
            text: None,
        }
    }

    /// Attach resolution-time text
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}

/// Handle to a browser window/tab
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowHandle(pub String);

impl WindowHandle {
    /// Create a window handle
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

/// Screenshot data
#[derive(Debug, Clone)]
pub struct Screenshot {
    /// Raw PNG bytes
    pub data: Vec<u8>,
    /// Timestamp when the screenshot was taken
    pub timestamp: std::time::SystemTime,
}

impl Screenshot {
    /// Create a new screenshot
    #[must_use]
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            timestamp: std::time::SystemTime::now(),
        }
    }

    /// Check whether the screenshot carries data
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.data.is_empty()
    }
}

/// Browser engines the scenario is parameterized over.
///
/// Both are CDP-capable; runs are independent and sequential, one engine per
/// browser session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BrowserEngine {
    /// Open-source Chromium build
    Chromium,
    /// Branded Google Chrome build
    Chrome,
}

impl BrowserEngine {
    /// All engines the suite runs against
    pub const ALL: [Self; 2] = [Self::Chromium, Self::Chrome];

    /// Engine name used in logs and report tags
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Chromium => "chromium",
            Self::Chrome => "chrome",
        }
    }

    /// Environment variable that overrides the executable path
    #[must_use]
    pub const fn path_env(&self) -> &'static str {
        match self {
            Self::Chromium => "CHROMIUM_PATH",
            Self::Chrome => "CHROME_PATH",
        }
    }

    /// Well-known executable locations, probed in order
    #[must_use]
    pub fn candidate_paths(&self) -> &'static [&'static str] {
        match self {
            Self::Chromium => &[
                "/usr/bin/chromium",
                "/usr/bin/chromium-browser",
                "/snap/bin/chromium",
                "/Applications/Chromium.app/Contents/MacOS/Chromium",
            ],
            Self::Chrome => &[
                "/usr/bin/google-chrome",
                "/usr/bin/google-chrome-stable",
                "/opt/google/chrome/chrome",
                "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            ],
        }
    }

    /// Locate the engine executable: env override first, then known paths
    #[must_use]
    pub fn find_executable(&self) -> Option<PathBuf> {
        if let Ok(path) = std::env::var(self.path_env()) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }
        self.candidate_paths()
            .iter()
            .map(Path::new)
            .find(|p| p.exists())
            .map(Path::to_path_buf)
    }

    /// Parse an engine name
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "chromium" => Some(Self::Chromium),
            "chrome" => Some(Self::Chrome),
            _ => None,
        }
    }
}

impl std::fmt::Display for BrowserEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Browser session configuration
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Engine to launch
    pub engine: BrowserEngine,
    /// Run in headless mode
    pub headless: bool,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Navigation timeout
    pub navigation_timeout: Duration,
    /// Executable path override (None = engine auto-detect)
    pub executable_path: Option<PathBuf>,
    /// Sandbox mode (disable for containers/CI)
    pub sandbox: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            engine: BrowserEngine::Chromium,
            headless: true,
            viewport_width: 1920,
            viewport_height: 1080,
            navigation_timeout: Duration::from_secs(30),
            executable_path: None,
            sandbox: true,
        }
    }
}

impl DriverConfig {
    /// Create a config for the given engine
    #[must_use]
    pub fn for_engine(engine: BrowserEngine) -> Self {
        Self {
            engine,
            ..Self::default()
        }
    }

    /// Set headless mode
    #[must_use]
    pub const fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set viewport dimensions
    #[must_use]
    pub const fn viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    /// Override the executable path
    #[must_use]
    pub fn executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.executable_path = Some(path.into());
        self
    }

    /// Disable the sandbox (for containers/CI)
    #[must_use]
    pub const fn no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }
}

/// Abstract driver trait over a live browser session.
///
/// Implementations: `CdpDriver` (feature `browser`) for a real browser,
/// [`crate::mock::MockDriver`] for tests.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Navigate the active window to a URL
    async fn navigate(&self, url: &str) -> E2eResult<()>;

    /// Evaluate a JavaScript expression in the active document
    async fn execute_js(&self, script: &str) -> E2eResult<serde_json::Value>;

    /// Resolve the first element matching a locator, if any
    async fn query(&self, locator: &Locator) -> E2eResult<Option<ElementHandle>>;

    /// Resolve all elements matching a locator
    async fn query_all(&self, locator: &Locator) -> E2eResult<Vec<ElementHandle>>;

    /// Whether an element is enabled, visible, and has a hit area
    async fn is_clickable(&self, element: &ElementHandle) -> E2eResult<bool>;

    /// Native click via input simulation
    async fn click(&self, element: &ElementHandle) -> E2eResult<()>;

    /// Scripted click: invoke `click()` on the element handle directly
    async fn click_via_script(&self, element: &ElementHandle) -> E2eResult<()>;

    /// Type text into an element
    async fn send_keys(&self, element: &ElementHandle, text: &str) -> E2eResult<()>;

    /// Smooth-scroll the element into view
    async fn scroll_into_view(&self, element: &ElementHandle) -> E2eResult<()>;

    /// Current trimmed text of an element
    async fn element_text(&self, element: &ElementHandle) -> E2eResult<String>;

    /// Page title of the active window
    async fn title(&self) -> E2eResult<String>;

    /// URL of the active window
    async fn current_url(&self) -> E2eResult<String>;

    /// `document.readyState` of the active document
    async fn ready_state(&self) -> E2eResult<String>;

    /// Enumerate open windows/tabs
    async fn window_handles(&self) -> E2eResult<Vec<WindowHandle>>;

    /// Switch the active window
    async fn switch_to_window(&self, window: &WindowHandle) -> E2eResult<()>;

    /// Capture a screenshot of the active window
    async fn screenshot(&self) -> E2eResult<Screenshot>;

    /// Close the browser session. Must be safe to call on failure paths.
    async fn close(&self) -> E2eResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    mod engine_tests {
        use super::*;

        #[test]
        fn test_engine_parse() {
            assert_eq!(BrowserEngine::parse("chromium"), Some(BrowserEngine::Chromium));
            assert_eq!(BrowserEngine::parse(" Chrome "), Some(BrowserEngine::Chrome));
            assert_eq!(BrowserEngine::parse("firefox"), None);
        }

        #[test]
        fn test_engine_names() {
            assert_eq!(BrowserEngine::Chromium.to_string(), "chromium");
            assert_eq!(BrowserEngine::Chrome.to_string(), "chrome");
        }

        #[test]
        fn test_all_engines_distinct() {
            assert_ne!(BrowserEngine::ALL[0], BrowserEngine::ALL[1]);
        }
    }

    mod config_tests {
        use super::*;

        #[test]
        fn test_default_config() {
            let config = DriverConfig::default();
            assert!(config.headless);
            assert!(config.sandbox);
            assert_eq!(config.viewport_width, 1920);
        }

        #[test]
        fn test_builder_chain() {
            let config = DriverConfig::for_engine(BrowserEngine::Chrome)
                .headless(false)
                .viewport(1280, 720)
                .no_sandbox();
            assert_eq!(config.engine, BrowserEngine::Chrome);
            assert!(!config.headless);
            assert!(!config.sandbox);
            assert_eq!(config.viewport_height, 720);
        }
    }

    mod handle_tests {
        use super::*;

        #[test]
        fn test_element_handle_with_text() {
            let handle = ElementHandle::new(3, "a").with_text("View Role");
            assert_eq!(handle.id, 3);
            assert_eq!(handle.text.as_deref(), Some("View Role"));
        }

        #[test]
        fn test_screenshot_validity() {
            assert!(!Screenshot::new(vec![]).is_valid());
            assert!(Screenshot::new(vec![0x89, 0x50]).is_valid());
        }
    }
}
