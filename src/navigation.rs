use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::browser::BrowserSession;
use crate::config::{SearchConfig, SiteProfile};
use crate::utils::error::Result;

/// One interaction needed to get from the site root to a sorted, filtered results list.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NavigationStep {
    OpenSite,
    MaximizeWindow,
    OpenSearch,
    SubmitQuery,
    ExpandResults,
    LocateFilters,
    ApplyCategory,
    SortNewest,
}

/// What a failure of a step means for the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepPolicy {
    /// The run cannot continue without this step.
    Fatal,
    /// Log the failure and carry on.
    Degraded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Continue,
    Degraded(String),
    Fatal(String),
}

/// Steps in the order they are performed.
pub const NAVIGATION_PLAN: [NavigationStep; 8] = [
    NavigationStep::OpenSite,
    NavigationStep::MaximizeWindow,
    NavigationStep::OpenSearch,
    NavigationStep::SubmitQuery,
    NavigationStep::ExpandResults,
    NavigationStep::LocateFilters,
    NavigationStep::ApplyCategory,
    NavigationStep::SortNewest,
];

impl NavigationStep {
    pub fn policy(self) -> StepPolicy {
        match self {
            NavigationStep::MaximizeWindow | NavigationStep::SortNewest => StepPolicy::Degraded,
            _ => StepPolicy::Fatal,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            NavigationStep::OpenSite => "opening the site",
            NavigationStep::MaximizeWindow => "maximizing the window",
            NavigationStep::OpenSearch => "clicking the search button",
            NavigationStep::SubmitQuery => "submitting the search phrase",
            NavigationStep::ExpandResults => "clicking the 'See All' button",
            NavigationStep::LocateFilters => "loading the filters section",
            NavigationStep::ApplyCategory => "selecting the category filter",
            NavigationStep::SortNewest => "selecting the 'Newest' sort order",
        }
    }
}

impl fmt::Display for NavigationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

impl StepOutcome {
    pub fn evaluate(step: NavigationStep, result: Result<()>) -> Self {
        match (result, step.policy()) {
            (Ok(()), _) => StepOutcome::Continue,
            (Err(e), StepPolicy::Degraded) => StepOutcome::Degraded(e.to_string()),
            (Err(e), StepPolicy::Fatal) => StepOutcome::Fatal(e.to_string()),
        }
    }
}

/// Drives a session through [`NAVIGATION_PLAN`] and across result pages.
pub struct Navigator<'a> {
    site: &'a SiteProfile,
    search: &'a SearchConfig,
    timeout: Duration,
}

impl<'a> Navigator<'a> {
    pub fn new(site: &'a SiteProfile, search: &'a SearchConfig, timeout: Duration) -> Self {
        Self {
            site,
            search,
            timeout,
        }
    }

    /// Perform every step in order. Returns the first fatal step and its error.
    pub fn run_plan<S: BrowserSession>(&self, session: &S) -> std::result::Result<(), (NavigationStep, String)> {
        for step in NAVIGATION_PLAN {
            match StepOutcome::evaluate(step, self.perform(session, step)) {
                StepOutcome::Continue => info!("Done {}", step),
                StepOutcome::Degraded(reason) => warn!("Error {}, continuing: {}", step, reason),
                StepOutcome::Fatal(reason) => {
                    error!("Error {}: {}", step, reason);
                    return Err((step, reason));
                }
            }
        }
        Ok(())
    }

    pub fn perform<S: BrowserSession>(&self, session: &S, step: NavigationStep) -> Result<()> {
        let site = self.site;
        match step {
            NavigationStep::OpenSite => session.open(&site.base_url),
            NavigationStep::MaximizeWindow => session.maximize(),
            NavigationStep::OpenSearch => session.click(&site.search_button, self.timeout),
            NavigationStep::SubmitQuery => {
                session.type_and_submit(&site.search_input, &self.search.search_phrase, self.timeout)
            }
            NavigationStep::ExpandResults => session.click(&site.see_all_button, self.timeout),
            NavigationStep::LocateFilters => session.wait_visible(&site.filters_panel, self.timeout),
            NavigationStep::ApplyCategory => {
                let option = site.category_locator(&self.search.category)?;
                session.click(&option, self.timeout)
            }
            NavigationStep::SortNewest => {
                session.wait_visible(&site.sort_option, self.timeout)?;
                session.select_option(&site.sort_select, &site.sort_value, self.timeout)
            }
        }
    }

    /// Activate the "next page" link. Any failure means there are no further pages.
    pub fn next_page<S: BrowserSession>(&self, session: &S) -> Result<()> {
        session.click_within(&self.site.next_page_container, &self.site.next_page_link, self.timeout)
    }
}
