//! Scripted mock driver for tests.
//!
//! [`MockDriver`] implements [`Driver`] over a declarative fake DOM: pages
//! are registered as routes, elements are keyed by their selector string and
//! can appear after a delay, refuse native clicks, or trigger effects
//! (navigation, opening a tab, text changes, job-list replacement) when
//! clicked. Every driver call is recorded in a history so tests can assert
//! interaction contracts such as "exactly one scripted click".

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::Value;

use crate::driver::{Driver, ElementHandle, Screenshot, WindowHandle};
use crate::locator::Locator;
use crate::result::{E2eError, E2eResult};

/// Effect applied to the fake DOM when an element is clicked
#[derive(Debug, Clone)]
pub enum MockEffect {
    /// Navigate the active window to a URL (resolving routes)
    Navigate(String),
    /// Open a new window/tab at a URL (resolving routes)
    OpenWindow(String),
    /// Replace the text of every element registered under a selector
    SetText {
        /// Selector key
        selector: String,
        /// New text
        text: String,
    },
    /// Remove every element registered under a selector
    RemoveElements(String),
    /// Add an element under a selector
    AddElement {
        /// Selector key
        selector: String,
        /// Element to add
        element: MockElement,
    },
    /// Install a scripted result for `execute_js` on the active window
    SetScriptResult {
        /// Exact script text
        script: String,
        /// Value to return
        result: Value,
    },
}

/// A fake DOM element
#[derive(Debug, Clone)]
pub struct MockElement {
    /// Element text
    pub text: String,
    /// Tag name
    pub tag: String,
    /// Whether the element accepts clicks
    pub clickable: bool,
    /// Delay after page load before the element is visible
    pub appear_delay: Option<Duration>,
    /// Native clicks error out (scripted clicks still land)
    pub native_click_fails: bool,
    /// Effects applied when a click lands
    pub on_click: Vec<MockEffect>,
}

impl MockElement {
    /// Create a clickable element with the given text
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tag: "div".to_string(),
            clickable: true,
            appear_delay: None,
            native_click_fails: false,
            on_click: Vec::new(),
        }
    }

    /// Set the tag name
    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    /// Mark the element as present but not clickable
    #[must_use]
    pub fn unclickable(mut self) -> Self {
        self.clickable = false;
        self
    }

    /// Make the element appear only after a delay from page load
    #[must_use]
    pub const fn appears_after(mut self, delay: Duration) -> Self {
        self.appear_delay = Some(delay);
        self
    }

    /// Make native clicks fail (exercises the scripted-click fallback)
    #[must_use]
    pub const fn fails_native_click(mut self) -> Self {
        self.native_click_fails = true;
        self
    }

    /// Attach a click effect
    #[must_use]
    pub fn on_click(mut self, effect: MockEffect) -> Self {
        self.on_click.push(effect);
        self
    }
}

/// A fake page registered as a navigation route
#[derive(Debug, Clone)]
pub struct MockPage {
    /// Route URL (matched by prefix)
    pub url: String,
    /// Page title
    pub title: String,
    /// `document.readyState` reported for the page
    pub ready_state: String,
    elements: HashMap<String, Vec<MockElement>>,
    script_results: HashMap<String, Value>,
}

impl MockPage {
    /// Create a page for a URL
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: String::new(),
            ready_state: "complete".to_string(),
            elements: HashMap::new(),
            script_results: HashMap::new(),
        }
    }

    /// Set the title
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the reported readyState
    #[must_use]
    pub fn with_ready_state(mut self, state: impl Into<String>) -> Self {
        self.ready_state = state.into();
        self
    }

    /// Register an element under a selector key (repeat for multiple matches)
    #[must_use]
    pub fn with_element(mut self, selector: impl Into<String>, element: MockElement) -> Self {
        self.elements.entry(selector.into()).or_default().push(element);
        self
    }

    /// Install a scripted result for an exact `execute_js` script
    #[must_use]
    pub fn with_script_result(mut self, script: impl Into<String>, result: Value) -> Self {
        let _ = self.script_results.insert(script.into(), result);
        self
    }
}

#[derive(Debug)]
struct WindowState {
    url: String,
    title: String,
    ready_state: String,
    loaded_at: Instant,
    elements: HashMap<String, Vec<MockElement>>,
    script_results: HashMap<String, Value>,
}

impl WindowState {
    fn blank(url: &str) -> Self {
        Self {
            url: url.to_string(),
            title: String::new(),
            ready_state: "complete".to_string(),
            loaded_at: Instant::now(),
            elements: HashMap::new(),
            script_results: HashMap::new(),
        }
    }

    fn from_page(page: &MockPage, url: &str) -> Self {
        Self {
            url: url.to_string(),
            title: page.title.clone(),
            ready_state: page.ready_state.clone(),
            loaded_at: Instant::now(),
            elements: page.elements.clone(),
            script_results: page.script_results.clone(),
        }
    }

    fn visible_indices(&self, selector: &str) -> Vec<usize> {
        let since_load = self.loaded_at.elapsed();
        self.elements
            .get(selector)
            .map(|list| {
                list.iter()
                    .enumerate()
                    .filter(|(_, el)| el.appear_delay.map_or(true, |d| since_load >= d))
                    .map(|(i, _)| i)
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
struct RegistryEntry {
    window: usize,
    selector: String,
    index: usize,
}

#[derive(Debug, Default)]
struct State {
    routes: Vec<MockPage>,
    windows: Vec<WindowState>,
    active: usize,
    registry: HashMap<u64, RegistryEntry>,
    next_id: u64,
    history: Vec<String>,
    closed: bool,
}

/// Scripted driver backed by a fake DOM; see module docs.
#[derive(Debug, Default)]
pub struct MockDriver {
    state: Mutex<State>,
}

impl MockDriver {
    /// Create an empty mock driver
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a navigation route
    pub fn add_route(&self, page: MockPage) {
        let mut state = self.state.lock().expect("mock state poisoned");
        state.routes.push(page);
    }

    /// Register a route and load it into the active window immediately
    pub fn load_page(&self, page: MockPage) {
        let mut state = self.state.lock().expect("mock state poisoned");
        let url = page.url.clone();
        let window = WindowState::from_page(&page, &url);
        state.routes.push(page);
        if state.windows.is_empty() {
            state.windows.push(window);
            state.active = 0;
        } else {
            let active = state.active;
            state.windows[active] = window;
        }
    }

    /// Full call history
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.state.lock().expect("mock state poisoned").history.clone()
    }

    /// Whether any recorded call starts with `prefix`
    #[must_use]
    pub fn was_called(&self, prefix: &str) -> bool {
        !self.calls_matching(prefix).is_empty()
    }

    /// All recorded calls starting with `prefix`
    #[must_use]
    pub fn calls_matching(&self, prefix: &str) -> Vec<String> {
        self.state
            .lock()
            .expect("mock state poisoned")
            .history
            .iter()
            .filter(|call| call.starts_with(prefix))
            .cloned()
            .collect()
    }

    /// Whether `close()` was called
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.lock().expect("mock state poisoned").closed
    }

    fn navigate_locked(state: &mut State, url: &str) {
        let window = state
            .routes
            .iter()
            .find(|route| url == route.url || url.starts_with(route.url.as_str()))
            .map_or_else(|| WindowState::blank(url), |route| WindowState::from_page(route, url));
        if state.windows.is_empty() {
            state.windows.push(window);
            state.active = 0;
        } else {
            let active = state.active;
            state.windows[active] = window;
        }
    }

    fn open_window_locked(state: &mut State, url: &str) {
        let window = state
            .routes
            .iter()
            .find(|route| url == route.url || url.starts_with(route.url.as_str()))
            .map_or_else(|| WindowState::blank(url), |route| WindowState::from_page(route, url));
        state.windows.push(window);
    }

    fn apply_effects_locked(state: &mut State, effects: &[MockEffect]) {
        for effect in effects {
            match effect {
                MockEffect::Navigate(url) => Self::navigate_locked(state, url),
                MockEffect::OpenWindow(url) => Self::open_window_locked(state, url),
                MockEffect::SetText { selector, text } => {
                    let active = state.active;
                    if let Some(list) = state.windows[active].elements.get_mut(selector) {
                        for el in list {
                            el.text.clone_from(text);
                        }
                    }
                }
                MockEffect::RemoveElements(selector) => {
                    let active = state.active;
                    let _ = state.windows[active].elements.remove(selector);
                }
                MockEffect::AddElement { selector, element } => {
                    let active = state.active;
                    state.windows[active]
                        .elements
                        .entry(selector.clone())
                        .or_default()
                        .push(element.clone());
                }
                MockEffect::SetScriptResult { script, result } => {
                    let active = state.active;
                    let _ = state.windows[active]
                        .script_results
                        .insert(script.clone(), result.clone());
                }
            }
        }
    }

    fn resolve_locked<'a>(
        state: &'a State,
        element: &ElementHandle,
    ) -> E2eResult<&'a MockElement> {
        let entry = state
            .registry
            .get(&element.id)
            .ok_or_else(|| E2eError::ScriptError {
                message: format!("unknown element handle {}", element.id),
            })?;
        state
            .windows
            .get(entry.window)
            .and_then(|w| w.elements.get(&entry.selector))
            .and_then(|list| list.get(entry.index))
            .ok_or_else(|| E2eError::ScriptError {
                message: format!("stale element handle {}", element.id),
            })
    }

    fn register_locked(state: &mut State, selector: &str, index: usize) -> ElementHandle {
        let id = state.next_id;
        state.next_id += 1;
        let entry = RegistryEntry {
            window: state.active,
            selector: selector.to_string(),
            index,
        };
        let element = &state.windows[entry.window].elements[selector][index];
        let handle = ElementHandle::new(id, element.tag.clone()).with_text(element.text.clone());
        let _ = state.registry.insert(id, entry);
        handle
    }
}

#[async_trait]
impl Driver for MockDriver {
    async fn navigate(&self, url: &str) -> E2eResult<()> {
        let mut state = self.state.lock().expect("mock state poisoned");
        state.history.push(format!("navigate:{url}"));
        Self::navigate_locked(&mut state, url);
        Ok(())
    }

    async fn execute_js(&self, script: &str) -> E2eResult<Value> {
        let state = self.state.lock().expect("mock state poisoned");
        let window = state
            .windows
            .get(state.active)
            .ok_or_else(|| E2eError::ScriptError {
                message: "no window open".to_string(),
            })?;
        if let Some(result) = window.script_results.get(script) {
            return Ok(result.clone());
        }
        match script {
            "document.readyState" => Ok(Value::String(window.ready_state.clone())),
            "document.title" => Ok(Value::String(window.title.clone())),
            "window.location.href" => Ok(Value::String(window.url.clone())),
            _ => Ok(Value::Null),
        }
    }

    async fn query(&self, locator: &Locator) -> E2eResult<Option<ElementHandle>> {
        let mut state = self.state.lock().expect("mock state poisoned");
        if state.windows.is_empty() {
            return Ok(None);
        }
        let active = state.active;
        let indices = state.windows[active].visible_indices(locator.selector());
        Ok(indices
            .first()
            .map(|&index| Self::register_locked(&mut state, locator.selector(), index)))
    }

    async fn query_all(&self, locator: &Locator) -> E2eResult<Vec<ElementHandle>> {
        let mut state = self.state.lock().expect("mock state poisoned");
        if state.windows.is_empty() {
            return Ok(Vec::new());
        }
        let active = state.active;
        let indices = state.windows[active].visible_indices(locator.selector());
        Ok(indices
            .into_iter()
            .map(|index| Self::register_locked(&mut state, locator.selector(), index))
            .collect())
    }

    async fn is_clickable(&self, element: &ElementHandle) -> E2eResult<bool> {
        let state = self.state.lock().expect("mock state poisoned");
        Ok(Self::resolve_locked(&state, element)
            .map(|el| el.clickable)
            .unwrap_or(false))
    }

    async fn click(&self, element: &ElementHandle) -> E2eResult<()> {
        let mut state = self.state.lock().expect("mock state poisoned");
        let (selector, fails, effects) = {
            let el = Self::resolve_locked(&state, element)?;
            let entry = &state.registry[&element.id];
            (entry.selector.clone(), el.native_click_fails, el.on_click.clone())
        };
        if fails {
            state.history.push(format!("click_rejected:{selector}"));
            return Err(E2eError::InputError {
                message: format!("native click intercepted on {selector}"),
            });
        }
        state.history.push(format!("click:{selector}"));
        Self::apply_effects_locked(&mut state, &effects);
        Ok(())
    }

    async fn click_via_script(&self, element: &ElementHandle) -> E2eResult<()> {
        let mut state = self.state.lock().expect("mock state poisoned");
        let (selector, effects) = {
            let el = Self::resolve_locked(&state, element)?;
            let entry = &state.registry[&element.id];
            (entry.selector.clone(), el.on_click.clone())
        };
        state.history.push(format!("click_via_script:{selector}"));
        Self::apply_effects_locked(&mut state, &effects);
        Ok(())
    }

    async fn send_keys(&self, element: &ElementHandle, text: &str) -> E2eResult<()> {
        let mut state = self.state.lock().expect("mock state poisoned");
        let selector = {
            let _ = Self::resolve_locked(&state, element)?;
            state.registry[&element.id].selector.clone()
        };
        state.history.push(format!("send_keys:{selector}:{text}"));
        Ok(())
    }

    async fn scroll_into_view(&self, element: &ElementHandle) -> E2eResult<()> {
        let mut state = self.state.lock().expect("mock state poisoned");
        let selector = {
            let _ = Self::resolve_locked(&state, element)?;
            state.registry[&element.id].selector.clone()
        };
        state.history.push(format!("scroll_into_view:{selector}"));
        Ok(())
    }

    async fn element_text(&self, element: &ElementHandle) -> E2eResult<String> {
        let state = self.state.lock().expect("mock state poisoned");
        Self::resolve_locked(&state, element).map(|el| el.text.trim().to_string())
    }

    async fn title(&self) -> E2eResult<String> {
        let state = self.state.lock().expect("mock state poisoned");
        Ok(state
            .windows
            .get(state.active)
            .map(|w| w.title.clone())
            .unwrap_or_default())
    }

    async fn current_url(&self) -> E2eResult<String> {
        let state = self.state.lock().expect("mock state poisoned");
        Ok(state
            .windows
            .get(state.active)
            .map(|w| w.url.clone())
            .unwrap_or_default())
    }

    async fn ready_state(&self) -> E2eResult<String> {
        let state = self.state.lock().expect("mock state poisoned");
        Ok(state
            .windows
            .get(state.active)
            .map(|w| w.ready_state.clone())
            .unwrap_or_default())
    }

    async fn window_handles(&self) -> E2eResult<Vec<WindowHandle>> {
        let state = self.state.lock().expect("mock state poisoned");
        Ok((0..state.windows.len())
            .map(|i| WindowHandle::new(format!("w{i}")))
            .collect())
    }

    async fn switch_to_window(&self, window: &WindowHandle) -> E2eResult<()> {
        let mut state = self.state.lock().expect("mock state poisoned");
        let index: usize = window
            .0
            .strip_prefix('w')
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| E2eError::WindowError {
                message: format!("unknown window handle {}", window.0),
            })?;
        if index >= state.windows.len() {
            return Err(E2eError::WindowError {
                message: format!("window {index} out of range"),
            });
        }
        state.active = index;
        state.history.push(format!("switch_to_window:{}", window.0));
        Ok(())
    }

    async fn screenshot(&self) -> E2eResult<Screenshot> {
        let mut state = self.state.lock().expect("mock state poisoned");
        state.history.push("screenshot".to_string());
        // PNG magic, enough for is_valid() and disk-write tests
        Ok(Screenshot::new(vec![0x89, 0x50, 0x4E, 0x47]))
    }

    async fn close(&self) -> E2eResult<()> {
        let mut state = self.state.lock().expect("mock state poisoned");
        state.closed = true;
        state.history.push("close".to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINK: Locator = Locator::css("a.next");

    #[tokio::test]
    async fn test_navigate_resolves_routes() {
        let driver = MockDriver::new();
        driver.add_route(MockPage::new("https://example.test").with_title("Example"));
        driver.navigate("https://example.test/path").await.unwrap();
        assert_eq!(driver.title().await.unwrap(), "Example");
        assert_eq!(driver.current_url().await.unwrap(), "https://example.test/path");
    }

    #[tokio::test]
    async fn test_click_effect_navigates() {
        let driver = MockDriver::new();
        driver.add_route(MockPage::new("https://example.test/next").with_title("Next"));
        driver.load_page(MockPage::new("https://example.test").with_element(
            LINK.selector(),
            MockElement::new("Next").on_click(MockEffect::Navigate(
                "https://example.test/next".to_string(),
            )),
        ));

        let handle = driver.query(&LINK).await.unwrap().unwrap();
        driver.click(&handle).await.unwrap();
        assert_eq!(driver.title().await.unwrap(), "Next");
    }

    #[tokio::test]
    async fn test_open_window_and_switch() {
        let driver = MockDriver::new();
        driver.add_route(MockPage::new("https://jobs.lever.co/insider").with_title("Lever"));
        driver.load_page(MockPage::new("https://example.test").with_element(
            LINK.selector(),
            MockElement::new("View Role").on_click(MockEffect::OpenWindow(
                "https://jobs.lever.co/insider".to_string(),
            )),
        ));

        let handle = driver.query(&LINK).await.unwrap().unwrap();
        driver.click(&handle).await.unwrap();

        let windows = driver.window_handles().await.unwrap();
        assert_eq!(windows.len(), 2);
        driver.switch_to_window(&windows[1]).await.unwrap();
        assert!(driver.current_url().await.unwrap().contains("lever.co"));
    }

    #[tokio::test]
    async fn test_stale_handle_after_navigation() {
        let driver = MockDriver::new();
        driver.load_page(
            MockPage::new("https://example.test")
                .with_element(LINK.selector(), MockElement::new("Next")),
        );
        let handle = driver.query(&LINK).await.unwrap().unwrap();
        driver.navigate("https://other.test").await.unwrap();
        assert!(driver.element_text(&handle).await.is_err());
    }

    #[tokio::test]
    async fn test_set_text_effect() {
        let driver = MockDriver::new();
        driver.load_page(
            MockPage::new("https://example.test")
                .with_element(
                    LINK.selector(),
                    MockElement::new("Open").on_click(MockEffect::SetText {
                        selector: "span.label".to_string(),
                        text: "Quality Assurance".to_string(),
                    }),
                )
                .with_element("span.label", MockElement::new("All")),
        );

        let link = driver.query(&LINK).await.unwrap().unwrap();
        driver.click(&link).await.unwrap();
        let label = driver.query(&Locator::css("span.label")).await.unwrap().unwrap();
        assert_eq!(driver.element_text(&label).await.unwrap(), "Quality Assurance");
    }
}
