use headless_chrome::types::Bounds;
use headless_chrome::{Browser, Element, LaunchOptions, Tab};
use scraper::{Html, Selector};
use serde::Deserialize;
use std::ffi::OsStr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::{BrowserSession, Locator};
use crate::config::BrowserConfig;
use crate::utils::error::{AppError, Result};

/// Chrome stays alive between steps while the page waits on user-like input.
const IDLE_BROWSER_TIMEOUT: Duration = Duration::from_secs(300);

/// A single Chrome tab driven over the DevTools protocol.
pub struct ChromeSession {
    // Dropping the browser kills the Chrome process, so it lives as long as the tab.
    _browser: Browser,
    tab: Arc<Tab>,
}

#[derive(Debug, Deserialize)]
struct XPathSnapshot {
    #[serde(default)]
    values: Vec<Option<String>>,
    error: Option<String>,
}

impl ChromeSession {
    pub fn launch(config: &BrowserConfig) -> Result<Self> {
        let mut launch_options = LaunchOptions::default_builder()
            .headless(config.headless)
            .sandbox(false) // Often needed in containerized environments
            .window_size(Some((config.window_width, config.window_height)))
            .idle_browser_timeout(IDLE_BROWSER_TIMEOUT)
            .args(vec![
                OsStr::new("--no-sandbox"),
                OsStr::new("--disable-dev-shm-usage"),
                OsStr::new("--disable-gpu"),
                OsStr::new("--disable-extensions"),
            ])
            .build()
            .map_err(|e| AppError::Browser(format!("Failed to create launch options: {}", e)))?;

        if let Some(chrome_path) = &config.chrome_path {
            launch_options.path = Some(PathBuf::from(chrome_path));
        }

        let browser = Browser::new(launch_options)
            .map_err(|e| AppError::Browser(format!("Failed to launch browser: {}", e)))?;

        let tab = browser
            .new_tab()
            .map_err(|e| AppError::Browser(format!("Failed to create tab: {}", e)))?;

        if let Some(user_agent) = &config.user_agent {
            tab.set_user_agent(user_agent, None, None)
                .map_err(|e| AppError::Browser(format!("Failed to set user agent: {}", e)))?;
        }

        Ok(Self {
            _browser: browser,
            tab,
        })
    }

    fn wait_for(&self, locator: &Locator, timeout: Duration) -> Result<Element<'_>> {
        let found = match locator {
            Locator::Css(selector) => self.tab.wait_for_element_with_custom_timeout(selector, timeout),
            Locator::XPath(query) => self.tab.wait_for_xpath_with_custom_timeout(query, timeout),
        };

        found.map_err(|e| {
            debug!("Waiting for {} failed: {}", locator, e);
            AppError::ElementNotFound {
                selector: locator.to_string(),
            }
        })
    }

    fn page_url(&self) -> Option<Url> {
        Url::parse(&self.tab.get_url()).ok()
    }

    fn css_values<F>(&self, selector: &str, project: F) -> Result<Vec<Option<String>>>
    where
        F: Fn(scraper::ElementRef<'_>) -> Option<String>,
    {
        let html_content = self
            .tab
            .get_content()
            .map_err(|e| AppError::Browser(format!("Failed to get page content: {}", e)))?;

        let document = Html::parse_document(&html_content);
        let css_selector = Selector::parse(selector)
            .map_err(|e| AppError::Validation(format!("Invalid CSS selector '{}': {:?}", selector, e)))?;

        Ok(document.select(&css_selector).map(project).collect())
    }

    fn xpath_values(&self, xpath: &str, projection: &str) -> Result<Vec<Option<String>>> {
        let js_code = xpath_snapshot_script(xpath, projection)?;

        let result = self
            .tab
            .evaluate(&js_code, false)
            .map_err(|e| AppError::Browser(format!("XPath evaluation failed: {}", e)))?;

        let raw = result
            .value
            .as_ref()
            .and_then(|v| v.as_str())
            .ok_or_else(|| AppError::Browser(format!("XPath '{}' returned no value", xpath)))?;

        let snapshot: XPathSnapshot = serde_json::from_str(raw)?;
        if let Some(error) = snapshot.error {
            return Err(AppError::Browser(format!("XPath error: {}", error)));
        }

        Ok(snapshot.values)
    }
}

impl BrowserSession for ChromeSession {
    fn open(&self, url: &str) -> Result<()> {
        self.tab
            .navigate_to(url)
            .and_then(|tab| tab.wait_until_navigated())
            .map_err(|e| AppError::Browser(format!("Navigation to {} failed: {}", url, e)))?;
        Ok(())
    }

    fn maximize(&self) -> Result<()> {
        self.tab.set_bounds(Bounds::Maximized).map_err(AppError::browser)?;
        Ok(())
    }

    fn click(&self, locator: &Locator, timeout: Duration) -> Result<()> {
        self.wait_for(locator, timeout)?.click().map_err(AppError::browser)?;
        Ok(())
    }

    fn wait_visible(&self, locator: &Locator, timeout: Duration) -> Result<()> {
        self.wait_for(locator, timeout)?;
        Ok(())
    }

    fn type_and_submit(&self, locator: &Locator, text: &str, timeout: Duration) -> Result<()> {
        let input = self.wait_for(locator, timeout)?;
        input.type_into(text).map_err(AppError::browser)?;
        self.tab.press_key("Enter").map_err(AppError::browser)?;
        Ok(())
    }

    fn select_option(&self, select: &Locator, value: &str, timeout: Duration) -> Result<()> {
        let element = self.wait_for(select, timeout)?;
        let result = element
            .call_js_fn(
                "function(value) {
                    this.value = value;
                    this.dispatchEvent(new Event('change', { bubbles: true }));
                    return this.value === value;
                }",
                vec![serde_json::Value::String(value.to_string())],
                false,
            )
            .map_err(AppError::browser)?;

        match result.value {
            Some(serde_json::Value::Bool(true)) => Ok(()),
            _ => Err(AppError::Browser(format!(
                "Option '{}' is not available in {}",
                value, select
            ))),
        }
    }

    fn texts(&self, locator: &Locator) -> Result<Vec<String>> {
        let values = match locator {
            Locator::Css(selector) => self.css_values(selector, |element| {
                Some(collapse_whitespace(&element.text().collect::<Vec<_>>().join(" ")))
            })?,
            Locator::XPath(query) => {
                self.xpath_values(query, "(node.innerText || node.textContent || '').trim()")?
            }
        };

        Ok(values.into_iter().map(Option::unwrap_or_default).collect())
    }

    fn attributes(&self, locator: &Locator, attribute: &str) -> Result<Vec<Option<String>>> {
        let values = match locator {
            Locator::Css(selector) => {
                self.css_values(selector, |element| element.value().attr(attribute).map(str::to_string))?
            }
            Locator::XPath(query) => {
                let name = serde_json::to_string(attribute)?;
                self.xpath_values(query, &format!("node.getAttribute({})", name))?
            }
        };

        let base = self.page_url();
        Ok(values
            .into_iter()
            .map(|value| value.map(|v| resolve_against(base.as_ref(), &v)))
            .collect())
    }

    fn click_within(&self, container: &Locator, child: &Locator, timeout: Duration) -> Result<()> {
        let container_element = self.wait_for(container, timeout)?;

        let Locator::Css(child_selector) = child else {
            return Err(AppError::Validation(format!(
                "Child locator inside {} must be CSS, got {}",
                container, child
            )));
        };

        container_element
            .find_element(child_selector)
            .map_err(|_| AppError::ElementNotFound {
                selector: child.to_string(),
            })?
            .click()
            .map_err(AppError::browser)?;

        self.tab.wait_until_navigated().map_err(AppError::browser)?;
        Ok(())
    }

    fn close(&self) -> Result<()> {
        self.tab.close(true).map_err(AppError::browser)?;
        Ok(())
    }
}

/// Script that evaluates `xpath` and returns `projection` (an expression over `node`) for each
/// match, JSON-encoded so the result comes back by value.
fn xpath_snapshot_script(xpath: &str, projection: &str) -> Result<String> {
    let query = serde_json::to_string(xpath)?;
    Ok(format!(
        r#"
        (function() {{
            try {{
                const result = document.evaluate({query}, document, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null);
                const values = [];
                for (let i = 0; i < result.snapshotLength; i++) {{
                    const node = result.snapshotItem(i);
                    values.push({projection});
                }}
                return JSON.stringify({{ values: values }});
            }} catch (e) {{
                return JSON.stringify({{ error: e.message }});
            }}
        }})()
        "#
    ))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Make a possibly relative `src`/`href` absolute against the current page.
fn resolve_against(base: Option<&Url>, value: &str) -> String {
    let value = value.trim();
    match base {
        Some(base) if Url::parse(value).is_err() && !value.is_empty() => base
            .join(value)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| value.to_string()),
        _ => value.to_string(),
    }
}
