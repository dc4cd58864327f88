use chrono::NaiveDate;
use tracing::{error, info, instrument, warn};

use crate::browser::{BrowserSession, Locator, SessionGuard};
use crate::config::{AppConfig, SiteProfile};
use crate::exporter::Exporter;
use crate::fetcher::AssetFetcher;
use crate::models::{DateParsePolicy, RawListing, ResultEntry, ResultSet, RunOutcome, RunReport, StopReason};
use crate::navigation::Navigator;
use crate::utils::error::Result;
use crate::utils::text::{compute_cutoff, parse_publication_date};

/// Runs one search: navigation, then page-by-page harvesting until the cutoff or the last page.
pub struct Harvester {
    config: AppConfig,
    fetcher: AssetFetcher,
    exporter: Exporter,
    cutoff: NaiveDate,
}

impl Harvester {
    pub fn new(config: AppConfig) -> Result<Self> {
        let fetcher = AssetFetcher::new(&config.fetch, config.output.image_dir.clone())?;
        let exporter = Exporter::new(config.output.export_path.clone());
        let cutoff = compute_cutoff(config.search.months);

        Ok(Self {
            config,
            fetcher,
            exporter,
            cutoff,
        })
    }

    /// Replace the cutoff computed from `search.months`.
    pub fn with_cutoff(mut self, cutoff: NaiveDate) -> Self {
        self.cutoff = cutoff;
        self
    }

    pub fn cutoff(&self) -> NaiveDate {
        self.cutoff
    }

    /// Take ownership of `session`, run the search and release the session on every path out.
    ///
    /// A navigation step that cannot be completed ends the run early with an aborted report.
    /// An error is only returned for failures during harvesting: an unparseable timestamp under
    /// [`DateParsePolicy::Abort`] or a failed export.
    #[instrument(skip_all, fields(search_phrase = %self.config.search.search_phrase, category = %self.config.search.category))]
    pub async fn run<S: BrowserSession>(&self, session: S) -> Result<RunReport> {
        let session = SessionGuard::new(session);
        let search = &self.config.search;

        info!(
            "Starting scrape with search_phrase: {}, category: {}, months: {}, cutoff: {}",
            search.search_phrase, search.category, search.months, self.cutoff
        );

        let navigator = Navigator::new(&self.config.site, search, self.config.browser.wait_timeout());
        if let Err((step, reason)) = navigator.run_plan(&*session) {
            return Ok(RunReport::aborted(step, reason));
        }

        self.harvest(&*session, &navigator).await
    }

    async fn harvest<S: BrowserSession>(&self, session: &S, navigator: &Navigator<'_>) -> Result<RunReport> {
        let search_phrase = &self.config.search.search_phrase;
        let mut results = ResultSet::new();
        let mut pages_visited = 0;
        let mut images_saved = 0;

        let stop = loop {
            pages_visited += 1;
            let listings = collect_listings(session, &self.config.site);
            info!("Page {}: {} listings found", pages_visited, listings.len());

            let mut cutoff_reached = false;
            for listing in listings {
                let publication_date = match parse_publication_date(&listing.timestamp) {
                    Ok(date) => date,
                    Err(e) => match self.config.output.date_parse_policy {
                        DateParsePolicy::Abort => {
                            error!("Stopping on listing {:?}: {}", listing.title, e);
                            return Err(e);
                        }
                        DateParsePolicy::Skip => {
                            warn!("Skipping listing {:?}: {}", listing.title, e);
                            continue;
                        }
                    },
                };

                if publication_date < self.cutoff {
                    info!("Previous post found before the date limit: {}", publication_date);
                    cutoff_reached = true;
                    break;
                }

                let image_filename = self.fetcher.fetch_and_store(listing.image_src.as_deref()).await;
                if image_filename.is_some() {
                    images_saved += 1;
                }

                results.push(ResultEntry::new(
                    publication_date,
                    listing.title,
                    listing.description,
                    image_filename,
                    search_phrase,
                ));
            }

            self.exporter.export(&results)?;

            if cutoff_reached {
                break StopReason::CutoffReached;
            }

            match navigator.next_page(session) {
                Ok(()) => info!("Navigating to page {}", pages_visited + 1),
                Err(e) => {
                    info!("All pages processed or error while navigating to the next page: {}", e);
                    break StopReason::NoMorePages;
                }
            }
        };

        Ok(RunReport {
            outcome: RunOutcome::Completed { stop },
            pages_visited,
            entries_kept: results.len(),
            images_saved,
        })
    }
}

/// Read the four listing collections off the current page and pair them up by position.
///
/// A collection that cannot be read counts as empty, which leaves the page with no listings.
pub fn collect_listings<S: BrowserSession>(session: &S, site: &SiteProfile) -> Vec<RawListing> {
    let read_texts = |what: &str, locator: &Locator| {
        session.texts(locator).unwrap_or_else(|e| {
            error!("Error reading {} with {}: {}", what, locator, e);
            Vec::new()
        })
    };

    let timestamps = read_texts("timestamps", &site.timestamps);
    let titles = read_texts("titles", &site.titles);
    let descriptions = read_texts("descriptions", &site.descriptions);
    let images = session
        .attributes(&site.images, &site.image_attribute)
        .unwrap_or_else(|e| {
            error!("Error reading images with {}: {}", site.images, e);
            Vec::new()
        });

    align_listings(timestamps, titles, descriptions, images)
}

/// Pair the N-th element of each collection. Collections of unequal length are truncated to
/// the shortest one.
pub fn align_listings(
    timestamps: Vec<String>,
    titles: Vec<String>,
    descriptions: Vec<String>,
    images: Vec<Option<String>>,
) -> Vec<RawListing> {
    let lengths = [timestamps.len(), titles.len(), descriptions.len(), images.len()];
    if lengths.iter().any(|&len| len != lengths[0]) {
        warn!(
            "Listing collections differ in length (timestamps {}, titles {}, descriptions {}, images {}), keeping the first {}",
            lengths[0],
            lengths[1],
            lengths[2],
            lengths[3],
            lengths.iter().min().copied().unwrap_or(0)
        );
    }

    timestamps
        .into_iter()
        .zip(titles)
        .zip(descriptions)
        .zip(images)
        .map(|(((timestamp, title), description), image_src)| RawListing {
            timestamp: timestamp.trim().to_string(),
            title: title.trim().to_string(),
            description: description.trim().to_string(),
            image_src,
        })
        .collect()
}
