//! Locator abstraction for element selection.
//!
//! A [`Locator`] is an immutable (strategy, selector-string) pair identifying
//! a DOM node. Page objects define their locators as associated constants;
//! the wait and interaction utilities accept locators and never raw strings.
//!
//! Locators also know how to render themselves as JavaScript query
//! expressions, which is how the CDP driver resolves them remotely.

use std::fmt;

/// Locator strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// CSS selector (e.g. `div.position-list-item`)
    Css,
    /// XPath expression
    XPath,
    /// Element id attribute
    Id,
}

impl Strategy {
    /// Short name used in log output
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Css => "css",
            Self::XPath => "xpath",
            Self::Id => "id",
        }
    }
}

/// A (strategy, selector) pair identifying a DOM node
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locator {
    strategy: Strategy,
    selector: &'static str,
}

impl Locator {
    /// Create a CSS locator
    #[must_use]
    pub const fn css(selector: &'static str) -> Self {
        Self {
            strategy: Strategy::Css,
            selector,
        }
    }

    /// Create an XPath locator
    #[must_use]
    pub const fn xpath(selector: &'static str) -> Self {
        Self {
            strategy: Strategy::XPath,
            selector,
        }
    }

    /// Create an id locator
    #[must_use]
    pub const fn id(selector: &'static str) -> Self {
        Self {
            strategy: Strategy::Id,
            selector,
        }
    }

    /// Get the strategy
    #[must_use]
    pub const fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Get the raw selector string
    #[must_use]
    pub const fn selector(&self) -> &'static str {
        self.selector
    }

    /// JavaScript expression evaluating to the first matching element or null
    #[must_use]
    pub fn to_query(&self) -> String {
        match self.strategy {
            Strategy::Css => format!("document.querySelector({:?})", self.selector),
            Strategy::XPath => format!(
                "document.evaluate({:?}, document, null, XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue",
                self.selector
            ),
            Strategy::Id => format!("document.getElementById({:?})", self.selector),
        }
    }

    /// JavaScript expression evaluating to the number of matches
    #[must_use]
    pub fn to_count_query(&self) -> String {
        match self.strategy {
            Strategy::Css => format!("document.querySelectorAll({:?}).length", self.selector),
            Strategy::XPath => format!(
                "document.evaluate({:?}, document, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null).snapshotLength",
                self.selector
            ),
            Strategy::Id => format!(
                "(document.getElementById({:?}) === null ? 0 : 1)",
                self.selector
            ),
        }
    }

    /// JavaScript expression evaluating to `true` iff at least one match exists
    #[must_use]
    pub fn to_exists_query(&self) -> String {
        format!("({}) > 0", self.to_count_query())
    }

    /// JavaScript expression evaluating to an array with the `innerText` of
    /// every match. Used to scrape all job-card text blobs in one call.
    #[must_use]
    pub fn to_all_text_query(&self) -> String {
        match self.strategy {
            Strategy::Css => format!(
                "Array.from(document.querySelectorAll({:?})).map(el => el.innerText)",
                self.selector
            ),
            Strategy::XPath => format!(
                "(() => {{ const r = document.evaluate({:?}, document, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null); const out = []; for (let i = 0; i < r.snapshotLength; i++) {{ out.push(r.snapshotItem(i).innerText); }} return out; }})()",
                self.selector
            ),
            Strategy::Id => format!(
                "(() => {{ const el = document.getElementById({:?}); return el === null ? [] : [el.innerText]; }})()",
                self.selector
            ),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.strategy.as_str(), self.selector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod query_tests {
        use super::*;

        #[test]
        fn test_css_query() {
            let locator = Locator::css("div.position-list-item");
            let query = locator.to_query();
            assert!(query.contains("querySelector"));
            assert!(query.contains("position-list-item"));
        }

        #[test]
        fn test_xpath_query() {
            let locator = Locator::xpath("//a[contains(text(), 'View Role')]");
            let query = locator.to_query();
            assert!(query.contains("document.evaluate"));
            assert!(query.contains("FIRST_ORDERED_NODE_TYPE"));
        }

        #[test]
        fn test_id_query() {
            let locator = Locator::id("select2-filter-by-department-container");
            let query = locator.to_query();
            assert!(query.contains("getElementById"));
        }

        #[test]
        fn test_count_query() {
            let locator = Locator::css("div.card");
            let query = locator.to_count_query();
            assert!(query.contains("querySelectorAll"));
            assert!(query.ends_with(".length"));
        }

        #[test]
        fn test_xpath_count_query() {
            let locator = Locator::xpath("//div");
            let query = locator.to_count_query();
            assert!(query.contains("ORDERED_NODE_SNAPSHOT_TYPE"));
            assert!(query.contains("snapshotLength"));
        }

        #[test]
        fn test_exists_query_wraps_count() {
            let locator = Locator::id("jobs-list");
            let query = locator.to_exists_query();
            assert!(query.contains("getElementById"));
            assert!(query.ends_with("> 0"));
        }

        #[test]
        fn test_all_text_query_css() {
            let locator = Locator::css(".position-list-item");
            let query = locator.to_all_text_query();
            assert!(query.contains("querySelectorAll"));
            assert!(query.contains("innerText"));
        }

        #[test]
        fn test_all_text_query_xpath() {
            let locator = Locator::xpath("//div[contains(@class, 'position-list-item')]");
            let query = locator.to_all_text_query();
            assert!(query.contains("snapshotItem"));
            assert!(query.contains("innerText"));
        }
    }

    mod display_tests {
        use super::*;

        #[test]
        fn test_display_includes_strategy() {
            let locator = Locator::id("location-filter");
            assert_eq!(locator.to_string(), "id=location-filter");
        }

        #[test]
        fn test_strategy_names() {
            assert_eq!(Strategy::Css.as_str(), "css");
            assert_eq!(Strategy::XPath.as_str(), "xpath");
            assert_eq!(Strategy::Id.as_str(), "id");
        }
    }
}
