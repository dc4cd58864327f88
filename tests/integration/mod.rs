// Shared fixtures for the integration tests

pub mod policy_tests;

use chrono::NaiveDate;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use news_harvest::browser::{BrowserSession, Locator};
use news_harvest::config::{AppConfig, SearchConfig, SiteProfile};
use news_harvest::{AppError, Harvester};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub type FakeResult<T> = std::result::Result<T, AppError>;

/// One results page as the browser would show it.
#[derive(Debug, Clone, Default)]
pub struct FakePage {
    pub timestamps: Vec<String>,
    pub titles: Vec<String>,
    pub descriptions: Vec<String>,
    pub images: Vec<Option<String>>,
}

impl FakePage {
    /// Build a page from (timestamp, title, description, image URL) rows.
    pub fn from_rows(rows: &[(&str, &str, &str, Option<String>)]) -> Self {
        let mut page = FakePage::default();
        for (timestamp, title, description, image) in rows {
            page.timestamps.push(timestamp.to_string());
            page.titles.push(title.to_string());
            page.descriptions.push(description.to_string());
            page.images.push(image.clone());
        }
        page
    }
}

/// What the fake session observed during a run.
#[derive(Debug, Default)]
pub struct SessionLog {
    pub current_page: usize,
    /// Index of every page whose listings were read.
    pub pages_read: Vec<usize>,
    /// Data rows in the export file each time the next-page link was followed.
    pub rows_at_page_turn: Vec<usize>,
    pub close_calls: usize,
}

/// Scripted stand-in for a browser: every navigation step succeeds and pages turn until the
/// last one.
pub struct FakeSession {
    site: SiteProfile,
    pages: Vec<FakePage>,
    export_path: PathBuf,
    log: Rc<RefCell<SessionLog>>,
}

impl FakeSession {
    pub fn new(pages: Vec<FakePage>, export_path: &Path) -> (Self, Rc<RefCell<SessionLog>>) {
        let log = Rc::new(RefCell::new(SessionLog::default()));
        let session = Self {
            site: SiteProfile::default(),
            pages,
            export_path: export_path.to_path_buf(),
            log: Rc::clone(&log),
        };
        (session, log)
    }

    fn page(&self) -> FakePage {
        self.pages
            .get(self.log.borrow().current_page)
            .cloned()
            .unwrap_or_default()
    }
}

impl BrowserSession for FakeSession {
    fn open(&self, _url: &str) -> FakeResult<()> {
        Ok(())
    }

    fn maximize(&self) -> FakeResult<()> {
        Ok(())
    }

    fn click(&self, _locator: &Locator, _timeout: Duration) -> FakeResult<()> {
        Ok(())
    }

    fn wait_visible(&self, _locator: &Locator, _timeout: Duration) -> FakeResult<()> {
        Ok(())
    }

    fn type_and_submit(&self, _locator: &Locator, _text: &str, _timeout: Duration) -> FakeResult<()> {
        Ok(())
    }

    fn select_option(&self, _select: &Locator, _value: &str, _timeout: Duration) -> FakeResult<()> {
        Ok(())
    }

    fn texts(&self, locator: &Locator) -> FakeResult<Vec<String>> {
        let page = self.page();
        if *locator == self.site.timestamps {
            let mut log = self.log.borrow_mut();
            let current = log.current_page;
            log.pages_read.push(current);
            Ok(page.timestamps)
        } else if *locator == self.site.titles {
            Ok(page.titles)
        } else if *locator == self.site.descriptions {
            Ok(page.descriptions)
        } else {
            Ok(Vec::new())
        }
    }

    fn attributes(&self, locator: &Locator, _attribute: &str) -> FakeResult<Vec<Option<String>>> {
        if *locator == self.site.images {
            Ok(self.page().images)
        } else {
            Ok(Vec::new())
        }
    }

    fn click_within(&self, _container: &Locator, child: &Locator, _timeout: Duration) -> FakeResult<()> {
        let mut log = self.log.borrow_mut();
        if log.current_page + 1 >= self.pages.len() {
            return Err(AppError::ElementNotFound {
                selector: child.to_string(),
            });
        }

        log.rows_at_page_turn.push(data_rows(&self.export_path));
        log.current_page += 1;
        Ok(())
    }

    fn close(&self) -> FakeResult<()> {
        self.log.borrow_mut().close_calls += 1;
        Ok(())
    }
}

/// Number of data rows (header excluded) in an export file; zero if it does not exist.
pub fn data_rows(path: &Path) -> usize {
    match csv::Reader::from_path(path) {
        Ok(mut reader) => reader.records().count(),
        Err(_) => 0,
    }
}

pub fn read_rows(path: &Path) -> Vec<Vec<String>> {
    let mut reader = csv::Reader::from_path(path).expect("export file exists");
    reader
        .records()
        .map(|record| record.unwrap().iter().map(str::to_string).collect())
        .collect()
}

pub fn test_config(dir: &Path) -> AppConfig {
    let mut config = AppConfig {
        search: SearchConfig {
            search_phrase: "climate".to_string(),
            category: "California".to_string(),
            months: 1,
        },
        ..AppConfig::default()
    };
    config.output.export_path = dir.join("post_data.csv");
    config.output.image_dir = dir.join("images");
    config.browser.wait_timeout_secs = 1;
    config.fetch.request_timeout_secs = 5;
    config
}

pub fn test_harvester(config: AppConfig) -> Harvester {
    Harvester::new(config)
        .expect("harvester builds")
        .with_cutoff(cutoff())
}

/// Fixed cutoff used by every scenario.
pub fn cutoff() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
}

/// Image server answering every `/img/*.jpg` except `/img/broken.jpg`, which is a 404.
pub async fn image_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/img/broken.jpg"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"\x89PNG fake".to_vec()))
        .mount(&server)
        .await;
    server
}

pub fn image(server: &MockServer, name: &str) -> Option<String> {
    Some(format!("{}/img/{}", server.uri(), name))
}
