use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;
use std::time::Duration;

use crate::utils::error::{AppError, Result};

pub mod chrome;

pub use chrome::ChromeSession;

/// Element location strategy, written as `css:<selector>` or `xpath:<query>` in configuration.
/// A string without a prefix is treated as CSS.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Locator {
    Css(String),
    XPath(String),
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Locator::Css(selector.into())
    }

    pub fn xpath(query: impl Into<String>) -> Self {
        Locator::XPath(query.into())
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        let locator = if let Some(rest) = raw.strip_prefix("xpath:") {
            Locator::XPath(rest.trim().to_string())
        } else if let Some(rest) = raw.strip_prefix("css:") {
            Locator::Css(rest.trim().to_string())
        } else {
            Locator::Css(raw.to_string())
        };

        if locator.expression().is_empty() {
            return Err(AppError::Validation(format!("Empty locator: {:?}", raw)));
        }
        Ok(locator)
    }

    pub fn expression(&self) -> &str {
        match self {
            Locator::Css(s) | Locator::XPath(s) => s,
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Css(s) => write!(f, "css:{}", s),
            Locator::XPath(s) => write!(f, "xpath:{}", s),
        }
    }
}

impl TryFrom<String> for Locator {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self> {
        Locator::parse(&value)
    }
}

impl From<Locator> for String {
    fn from(locator: Locator) -> Self {
        locator.to_string()
    }
}

/// The browser operations the harvester needs. One session drives exactly one page.
///
/// Every `timeout` is a bounded wait: the element is polled for until it shows up or the
/// duration elapses, in which case the call fails.
#[cfg_attr(test, mockall::automock)]
pub trait BrowserSession {
    fn open(&self, url: &str) -> Result<()>;

    fn maximize(&self) -> Result<()>;

    /// Wait for the element and click it.
    fn click(&self, locator: &Locator, timeout: Duration) -> Result<()>;

    fn wait_visible(&self, locator: &Locator, timeout: Duration) -> Result<()>;

    /// Wait for an input, type `text` into it and press Enter.
    fn type_and_submit(&self, locator: &Locator, text: &str, timeout: Duration) -> Result<()>;

    /// Choose the `<option>` with `value` inside the `<select>` matched by `select`.
    fn select_option(&self, select: &Locator, value: &str, timeout: Duration) -> Result<()>;

    /// Visible text of every element currently matching `locator`, in document order.
    /// No match is an empty list, not an error.
    fn texts(&self, locator: &Locator) -> Result<Vec<String>>;

    /// `attribute` of every element currently matching `locator`, in document order.
    fn attributes(&self, locator: &Locator, attribute: &str) -> Result<Vec<Option<String>>>;

    /// Wait for `container`, then click the first `child` inside it.
    fn click_within(&self, container: &Locator, child: &Locator, timeout: Duration) -> Result<()>;

    fn close(&self) -> Result<()>;
}

/// Owns a session for the length of a run and closes it when dropped, whichever way the run
/// ends.
pub struct SessionGuard<S: BrowserSession> {
    session: S,
}

impl<S: BrowserSession> SessionGuard<S> {
    pub fn new(session: S) -> Self {
        Self { session }
    }
}

impl<S: BrowserSession> Deref for SessionGuard<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.session
    }
}

impl<S: BrowserSession> Drop for SessionGuard<S> {
    fn drop(&mut self) {
        match self.session.close() {
            Ok(()) => tracing::info!("Browser session closed"),
            Err(e) => tracing::error!("Error closing the browser session: {}", e),
        }
    }
}
