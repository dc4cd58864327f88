use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use crate::browser::Locator;
use crate::models::DateParsePolicy;

pub const DEFAULT_CONFIG_PATH: &str = "config/config.yaml";

/// Placeholder substituted with the configured category in `site.category_option`.
pub const CATEGORY_PLACEHOLDER: &str = "{category}";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub search: SearchConfig,
    pub browser: BrowserConfig,
    pub site: SiteProfile,
    pub fetch: FetchConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

/// What to search for and how far back to collect.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SearchConfig {
    pub search_phrase: String,
    pub category: String,
    pub months: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub headless: bool,
    pub chrome_path: Option<String>,
    pub window_width: u32,
    pub window_height: u32,
    pub wait_timeout_secs: u64,
    pub user_agent: Option<String>,
}

/// Element locators for the target site. Each one is a `css:` or `xpath:` prefixed string.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteProfile {
    pub base_url: String,
    pub search_button: Locator,
    pub search_input: Locator,
    pub see_all_button: Locator,
    pub filters_panel: Locator,
    pub category_option: String,
    pub sort_option: Locator,
    pub sort_select: Locator,
    pub sort_value: String,
    pub timestamps: Locator,
    pub titles: Locator,
    pub descriptions: Locator,
    pub images: Locator,
    pub image_attribute: String,
    pub next_page_container: Locator,
    pub next_page_link: Locator,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub request_timeout_secs: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub export_path: PathBuf,
    pub image_dir: PathBuf,
    pub date_parse_policy: DateParsePolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub directory: PathBuf,
    pub file_name: String,
    pub level: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            search_phrase: String::new(),
            category: String::new(),
            months: 6,
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            chrome_path: None,
            window_width: 1920,
            window_height: 1080,
            wait_timeout_secs: 20,
            user_agent: None,
        }
    }
}

impl Default for SiteProfile {
    fn default() -> Self {
        Self {
            base_url: "https://www.latimes.com".to_string(),
            search_button: Locator::css("button[data-element='search-button']"),
            search_input: Locator::css("input[name='q']"),
            see_all_button: Locator::css("button.button.see-all-button"),
            filters_panel: Locator::css(
                "body > div.page-content > ps-search-results-module > form > div.search-results-module-ajax > ps-search-filters > div > aside > div > div.search-results-module-filters-content.SearchResultsModule-filters-content > div:nth-child(1) > ps-toggler",
            ),
            category_option: format!("xpath://span[text()='{}']", CATEGORY_PLACEHOLDER),
            sort_option: Locator::css("select.select-input option[value='1']"),
            sort_select: Locator::css(".select-input"),
            sort_value: "1".to_string(),
            timestamps: Locator::xpath(r#"//p[@class="promo-timestamp"]"#),
            titles: Locator::xpath("//h3/a"),
            descriptions: Locator::xpath(r#"//p[@class="promo-description"]"#),
            images: Locator::xpath(r#"//img[@class="image"]"#),
            image_attribute: "src".to_string(),
            next_page_container: Locator::css("div.search-results-module-next-page"),
            next_page_link: Locator::css("a"),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            user_agent: concat!("news-harvest/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            export_path: PathBuf::from("post_data.csv"),
            image_dir: PathBuf::from("images"),
            date_parse_policy: DateParsePolicy::Abort,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            file_name: "debug.log".to_string(),
            level: "info".to_string(),
        }
    }
}

impl BrowserConfig {
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }
}

impl FetchConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl SiteProfile {
    /// Locator of the filter entry whose visible text equals `category`.
    ///
    /// In an XPath template a single-quoted placeholder is swapped for a literal that survives
    /// quotes in the category name.
    pub fn category_locator(&self, category: &str) -> Result<Locator, ConfigError> {
        let quoted_placeholder = format!("'{}'", CATEGORY_PLACEHOLDER);
        let raw = if self.category_option.trim_start().starts_with("xpath:")
            && self.category_option.contains(&quoted_placeholder)
        {
            self.category_option.replace(&quoted_placeholder, &xpath_literal(category))
        } else {
            self.category_option.replace(CATEGORY_PLACEHOLDER, category)
        };

        Locator::parse(&raw).map_err(|e| ConfigError::Message(e.to_string()))
    }
}

/// XPath 1.0 string literal for `text`. XPath has no escape sequences, so text holding both
/// quote kinds is split into a `concat()` call.
fn xpath_literal(text: &str) -> String {
    if !text.contains('\'') {
        return format!("'{}'", text);
    }
    if !text.contains('"') {
        return format!("\"{}\"", text);
    }

    let parts: Vec<String> = text
        .split('\'')
        .map(|part| format!("'{}'", part))
        .collect();
    format!("concat({})", parts.join(", \"'\", "))
}

impl AppConfig {
    /// Load from `$CONFIG_PATH` (or the default path when unset) plus the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        match env::var("CONFIG_PATH") {
            Ok(path) => Self::from_path(&path, true),
            Err(_) => Self::from_path(DEFAULT_CONFIG_PATH, false),
        }
    }

    pub fn from_path(path: &str, required: bool) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name(path).required(required))
            // Add environment variables with prefix "NEWS_HARVEST"
            .add_source(Environment::with_prefix("NEWS_HARVEST").separator("__"))
            // Bare variables take precedence over anything in the file
            .set_override_option("search.search_phrase", env::var("SEARCH_PHRASE").ok())?
            .set_override_option("search.category", env::var("CATEGORY").ok())?
            .set_override_option("search.months", env::var("MONTHS").ok())?
            .build()?;

        let mut config: AppConfig = s.try_deserialize()?;

        if config.browser.chrome_path.is_none() {
            config.browser.chrome_path = env::var("CHROME_PATH").ok();
        }

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.search.search_phrase.trim().is_empty() {
            return Err(ConfigError::Message("search.search_phrase must not be empty".into()));
        }

        if self.search.category.trim().is_empty() {
            return Err(ConfigError::Message("search.category must not be empty".into()));
        }

        if self.search.months == 0 {
            return Err(ConfigError::Message("search.months must be greater than 0".into()));
        }

        if Url::parse(&self.site.base_url).is_err() {
            return Err(ConfigError::Message("Invalid site.base_url format".into()));
        }

        if !self.site.category_option.contains(CATEGORY_PLACEHOLDER) {
            return Err(ConfigError::Message(format!(
                "site.category_option must contain the {} placeholder",
                CATEGORY_PLACEHOLDER
            )));
        }
        self.site.category_locator(&self.search.category)?;

        if self.browser.wait_timeout_secs == 0 {
            return Err(ConfigError::Message("browser.wait_timeout_secs must be greater than 0".into()));
        }

        if self.fetch.request_timeout_secs == 0 {
            return Err(ConfigError::Message("fetch.request_timeout_secs must be greater than 0".into()));
        }

        if self.output.export_path.as_os_str().is_empty() {
            return Err(ConfigError::Message("output.export_path must not be empty".into()));
        }

        Ok(())
    }
}
