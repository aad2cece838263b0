//! Real browser sessions over the Chrome DevTools Protocol.
//!
//! [`CdpDriver`] implements [`Driver`] on top of chromiumoxide. Elements are
//! resolved in-page into a JavaScript registry (`window.__e2eReg`) and
//! addressed by index afterwards; the registry resets whenever the document
//! is replaced, which is exactly the handle-staleness contract of the trait.
//! Native clicks are dispatched as CDP mouse events at the element's center
//! so overlays intercept them the way they would a real pointer.

use async_trait::async_trait;
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
use chromiumoxide::cdp::browser_protocol::input::{
    DispatchMouseEventParams, DispatchMouseEventType, InsertTextParams, MouseButton,
};
use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, CaptureScreenshotParams,
};
use chromiumoxide::page::Page as CdpPage;
use futures::StreamExt;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::driver::{
    Driver, DriverConfig, ElementHandle, Screenshot, WindowHandle,
};
use crate::locator::{Locator, Strategy};
use crate::result::{E2eError, E2eResult};

/// What the in-page resolution script reports back for one element
#[derive(Debug, Deserialize)]
struct ResolvedElement {
    id: u64,
    tag: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ElementCenter {
    x: f64,
    y: f64,
}

/// Live CDP browser session.
///
/// The active page is swapped by `switch_to_window`; all DOM operations run
/// against whichever page is active. Page handles are cloned out of the lock
/// before any await so driver calls never hold it across I/O.
#[derive(Debug)]
pub struct CdpDriver {
    config: DriverConfig,
    browser: Mutex<CdpBrowser>,
    page: Mutex<CdpPage>,
    #[allow(dead_code)]
    handler: tokio::task::JoinHandle<()>,
}

impl CdpDriver {
    /// Launch a browser for the configured engine and open a blank page.
    ///
    /// The executable is taken from the config override, then the engine's
    /// path environment variable, then well-known install locations.
    pub async fn launch(config: DriverConfig) -> E2eResult<Self> {
        let executable = match &config.executable_path {
            Some(path) => path.clone(),
            None => config.engine.find_executable().ok_or_else(|| {
                E2eError::BrowserNotFound {
                    engine: config.engine.to_string(),
                    env_hint: config.engine.path_env().to_string(),
                }
            })?,
        };
        info!(
            engine = %config.engine,
            executable = %executable.display(),
            headless = config.headless,
            "launching browser"
        );

        let mut builder = CdpConfig::builder()
            .chrome_executable(&executable)
            .window_size(config.viewport_width, config.viewport_height);
        if !config.headless {
            builder = builder.with_head();
        }
        if !config.sandbox {
            builder = builder.no_sandbox();
        }
        let cdp_config = builder.build().map_err(|e| E2eError::BrowserLaunchError {
            message: e.to_string(),
        })?;

        let (browser, mut handler) =
            CdpBrowser::launch(cdp_config)
                .await
                .map_err(|e| E2eError::BrowserLaunchError {
                    message: e.to_string(),
                })?;

        let handle = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| E2eError::BrowserLaunchError {
                message: e.to_string(),
            })?;

        Ok(Self {
            config,
            browser: Mutex::new(browser),
            page: Mutex::new(page),
            handler: handle,
        })
    }

    /// The session configuration
    #[must_use]
    pub const fn config(&self) -> &DriverConfig {
        &self.config
    }

    async fn active_page(&self) -> CdpPage {
        self.page.lock().await.clone()
    }

    async fn eval(&self, script: &str) -> E2eResult<Value> {
        let page = self.active_page().await;
        let result = page
            .evaluate(script)
            .await
            .map_err(|e| E2eError::ScriptError {
                message: e.to_string(),
            })?;
        // `undefined` and detached results deserialize as null
        Ok(result.into_value().unwrap_or(Value::Null))
    }

    /// JavaScript expression evaluating to an array of all matches
    fn match_array_expr(locator: &Locator) -> String {
        match locator.strategy() {
            Strategy::Css => format!(
                "Array.from(document.querySelectorAll({:?}))",
                locator.selector()
            ),
            Strategy::XPath => format!(
                "(() => {{ const r = document.evaluate({:?}, document, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null); const out = []; for (let i = 0; i < r.snapshotLength; i++) {{ out.push(r.snapshotItem(i)); }} return out; }})()",
                locator.selector()
            ),
            Strategy::Id => format!(
                "(() => {{ const el = document.getElementById({:?}); return el === null ? [] : [el]; }})()",
                locator.selector()
            ),
        }
    }

    fn register_script(locator: &Locator, all: bool) -> String {
        let matches = Self::match_array_expr(locator);
        let slice = if all { "matches" } else { "matches.slice(0, 1)" };
        format!(
            "(() => {{ \
                const matches = {matches}; \
                window.__e2eReg = window.__e2eReg || []; \
                return {slice}.map(el => {{ \
                    const id = window.__e2eReg.push(el) - 1; \
                    return {{ id: id, tag: el.tagName.toLowerCase(), text: el.innerText }}; \
                }}); \
            }})()"
        )
    }

    async fn resolve(&self, locator: &Locator, all: bool) -> E2eResult<Vec<ElementHandle>> {
        let value = self.eval(&Self::register_script(locator, all)).await?;
        let resolved: Vec<ResolvedElement> = serde_json::from_value(value)?;
        Ok(resolved
            .into_iter()
            .map(|el| {
                let mut handle = ElementHandle::new(el.id, el.tag);
                if let Some(text) = el.text {
                    handle = handle.with_text(text);
                }
                handle
            })
            .collect())
    }

    /// Script body that looks up a registered element as `el`, evaluating to
    /// `missing` when the handle has gone stale.
    fn with_element(id: u64, body: &str, missing: &str) -> String {
        format!(
            "(() => {{ \
                const reg = window.__e2eReg || []; \
                const el = reg[{id}]; \
                if (!el) return {missing}; \
                {body} \
            }})()"
        )
    }

    async fn element_center(&self, element: &ElementHandle) -> E2eResult<ElementCenter> {
        let script = Self::with_element(
            element.id,
            "const r = el.getBoundingClientRect(); \
             return { x: r.left + r.width / 2, y: r.top + r.height / 2 };",
            "null",
        );
        let value = self.eval(&script).await?;
        if value.is_null() {
            return Err(E2eError::InputError {
                message: format!("stale element handle {}", element.id),
            });
        }
        Ok(serde_json::from_value(value)?)
    }

    async fn dispatch_mouse(
        &self,
        kind: DispatchMouseEventType,
        x: f64,
        y: f64,
    ) -> E2eResult<()> {
        let params = DispatchMouseEventParams::builder()
            .r#type(kind)
            .x(x)
            .y(y)
            .button(MouseButton::Left)
            .click_count(1)
            .build()
            .map_err(|e| E2eError::InputError {
                message: e.to_string(),
            })?;
        let page = self.active_page().await;
        page.execute(params)
            .await
            .map_err(|e| E2eError::InputError {
                message: e.to_string(),
            })?;
        Ok(())
    }
}

#[async_trait]
impl Driver for CdpDriver {
    async fn navigate(&self, url: &str) -> E2eResult<()> {
        let page = self.active_page().await;
        page.goto(url).await.map_err(|e| E2eError::NavigationError {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        debug!(url, "navigated");
        Ok(())
    }

    async fn execute_js(&self, script: &str) -> E2eResult<Value> {
        self.eval(script).await
    }

    async fn query(&self, locator: &Locator) -> E2eResult<Option<ElementHandle>> {
        Ok(self.resolve(locator, false).await?.into_iter().next())
    }

    async fn query_all(&self, locator: &Locator) -> E2eResult<Vec<ElementHandle>> {
        self.resolve(locator, true).await
    }

    async fn is_clickable(&self, element: &ElementHandle) -> E2eResult<bool> {
        let script = Self::with_element(
            element.id,
            "if (el.disabled) return false; \
             const r = el.getBoundingClientRect(); \
             if (r.width === 0 || r.height === 0) return false; \
             const style = window.getComputedStyle(el); \
             return style.visibility !== 'hidden' && style.display !== 'none';",
            "false",
        );
        Ok(self.eval(&script).await? == Value::Bool(true))
    }

    async fn click(&self, element: &ElementHandle) -> E2eResult<()> {
        let center = self.element_center(element).await?;
        self.dispatch_mouse(DispatchMouseEventType::MousePressed, center.x, center.y)
            .await?;
        self.dispatch_mouse(DispatchMouseEventType::MouseReleased, center.x, center.y)
            .await?;
        debug!(id = element.id, x = center.x, y = center.y, "native click dispatched");
        Ok(())
    }

    async fn click_via_script(&self, element: &ElementHandle) -> E2eResult<()> {
        let script = Self::with_element(element.id, "el.click(); return true;", "null");
        let value = self.eval(&script).await?;
        if value.is_null() {
            return Err(E2eError::ScriptError {
                message: format!("stale element handle {}", element.id),
            });
        }
        Ok(())
    }

    async fn send_keys(&self, element: &ElementHandle, text: &str) -> E2eResult<()> {
        let focus = Self::with_element(element.id, "el.focus(); return true;", "null");
        let value = self.eval(&focus).await?;
        if value.is_null() {
            return Err(E2eError::InputError {
                message: format!("stale element handle {}", element.id),
            });
        }
        let page = self.active_page().await;
        page.execute(InsertTextParams::new(text))
            .await
            .map_err(|e| E2eError::InputError {
                message: e.to_string(),
            })?;
        Ok(())
    }

    async fn scroll_into_view(&self, element: &ElementHandle) -> E2eResult<()> {
        let script = Self::with_element(
            element.id,
            "el.scrollIntoView({ behavior: 'smooth', block: 'center' }); return true;",
            "null",
        );
        let value = self.eval(&script).await?;
        if value.is_null() {
            return Err(E2eError::ScriptError {
                message: format!("stale element handle {}", element.id),
            });
        }
        Ok(())
    }

    async fn element_text(&self, element: &ElementHandle) -> E2eResult<String> {
        let script = Self::with_element(element.id, "return el.innerText;", "null");
        match self.eval(&script).await? {
            Value::String(text) => Ok(text.trim().to_string()),
            _ => Err(E2eError::ScriptError {
                message: format!("stale element handle {}", element.id),
            }),
        }
    }

    async fn title(&self) -> E2eResult<String> {
        match self.eval("document.title").await? {
            Value::String(title) => Ok(title),
            _ => Ok(String::new()),
        }
    }

    async fn current_url(&self) -> E2eResult<String> {
        match self.eval("window.location.href").await? {
            Value::String(url) => Ok(url),
            _ => Ok(String::new()),
        }
    }

    async fn ready_state(&self) -> E2eResult<String> {
        match self.eval("document.readyState").await? {
            Value::String(state) => Ok(state),
            _ => Ok(String::new()),
        }
    }

    async fn window_handles(&self) -> E2eResult<Vec<WindowHandle>> {
        let browser = self.browser.lock().await;
        let pages = browser.pages().await.map_err(|e| E2eError::WindowError {
            message: e.to_string(),
        })?;
        Ok((0..pages.len())
            .map(|i| WindowHandle::new(format!("w{i}")))
            .collect())
    }

    async fn switch_to_window(&self, window: &WindowHandle) -> E2eResult<()> {
        let index: usize = window
            .0
            .strip_prefix('w')
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| E2eError::WindowError {
                message: format!("unknown window handle {}", window.0),
            })?;
        let target = {
            let browser = self.browser.lock().await;
            let mut pages = browser.pages().await.map_err(|e| E2eError::WindowError {
                message: e.to_string(),
            })?;
            if index >= pages.len() {
                return Err(E2eError::WindowError {
                    message: format!("window {index} out of range ({} open)", pages.len()),
                });
            }
            pages.swap_remove(index)
        };
        target
            .bring_to_front()
            .await
            .map_err(|e| E2eError::WindowError {
                message: e.to_string(),
            })?;
        *self.page.lock().await = target;
        debug!(window = %window.0, "switched active window");
        Ok(())
    }

    async fn screenshot(&self) -> E2eResult<Screenshot> {
        let page = self.active_page().await;
        let params = CaptureScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .build();
        let response = page
            .execute(params)
            .await
            .map_err(|e| E2eError::ScreenshotError {
                message: e.to_string(),
            })?;
        use base64::Engine;
        let data = base64::engine::general_purpose::STANDARD
            .decode(&response.data)
            .map_err(|e| E2eError::ScreenshotError {
                message: e.to_string(),
            })?;
        Ok(Screenshot::new(data))
    }

    async fn close(&self) -> E2eResult<()> {
        let mut browser = self.browser.lock().await;
        if let Err(err) = browser.close().await {
            warn!(error = %err, "browser close reported an error");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_script_shapes() {
        let locator = Locator::xpath("//a[contains(text(), 'View Role')]");
        let one = CdpDriver::register_script(&locator, false);
        let all = CdpDriver::register_script(&locator, true);
        assert!(one.contains("slice(0, 1)"));
        assert!(!all.contains("slice(0, 1)"));
        assert!(one.contains("__e2eReg"));
        assert!(all.contains("snapshotItem"));
    }

    #[test]
    fn test_match_array_expr_per_strategy() {
        assert!(
            CdpDriver::match_array_expr(&Locator::css("div.card")).contains("querySelectorAll")
        );
        assert!(CdpDriver::match_array_expr(&Locator::id("jobs-list")).contains("getElementById"));
        assert!(CdpDriver::match_array_expr(&Locator::xpath("//div")).contains("document.evaluate"));
    }

    #[test]
    fn test_with_element_guards_stale_handles() {
        let script = CdpDriver::with_element(7, "return el.innerText;", "null");
        assert!(script.contains("reg[7]"));
        assert!(script.contains("if (!el) return null;"));
    }
}
