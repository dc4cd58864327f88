use chrono::{Datelike, Duration, Local, NaiveDate};
use regex::Regex;
use std::sync::LazyLock;

use crate::utils::error::{AppError, Result};

/// Pattern the listing timestamps follow once the month is spelled out.
pub const PUBLICATION_DATE_FORMAT: &str = "%B %d, %Y";

const MONTH_ABBREVIATIONS: [(&str, &str); 7] = [
    ("Jan.", "January"),
    ("Feb.", "February"),
    ("Dec.", "December"),
    ("Nov.", "November"),
    ("Oct.", "October"),
    ("Sept.", "September"),
    ("Aug.", "August"),
];

// Case-sensitive: "USD" and "dollars" only match in that exact spelling.
static MONEY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$[\d,]+(\.\d+)?|\d+\s?(dollars?|USD)").expect("money pattern is valid")
});

/// Replace an abbreviated month in the first token ("Jan. 5, 2024") with its full name.
///
/// Tokens outside the known abbreviation set are left alone, so "March 5, 2024" and "May 5, 2024"
/// come back unchanged. Whitespace between tokens collapses to single spaces.
pub fn normalize_month(date_text: &str) -> String {
    let mut tokens: Vec<&str> = date_text.split_whitespace().collect();

    if let Some(first) = tokens.first_mut() {
        if let Some((_, full)) = MONTH_ABBREVIATIONS.iter().find(|(abbr, _)| abbr == first) {
            *first = full;
        }
    }

    tokens.join(" ")
}

/// Parse a listing timestamp such as "Jan. 5, 2024" into a calendar date.
pub fn parse_publication_date(raw: &str) -> Result<NaiveDate> {
    let normalized = normalize_month(raw.trim());
    NaiveDate::parse_from_str(&normalized, PUBLICATION_DATE_FORMAT).map_err(|_| {
        AppError::DateParse {
            text: raw.to_string(),
        }
    })
}

/// Oldest publication date still collected, measured from today.
pub fn compute_cutoff(months: u32) -> NaiveDate {
    cutoff_from(Local::now().date_naive(), months)
}

/// First day of `today`'s month minus a flat 30 days per month.
pub fn cutoff_from(today: NaiveDate, months: u32) -> NaiveDate {
    let first_of_month = today.with_day(1).unwrap_or(today);
    first_of_month - Duration::days(30 * i64::from(months))
}

pub fn contains_money_amount(text: &str) -> bool {
    MONEY_REGEX.is_match(text)
}

/// Case-insensitive count of non-overlapping occurrences. An empty needle counts as zero.
pub fn count_occurrences(haystack: &str, needle: &str) -> usize {
    if needle.is_empty() {
        return 0;
    }
    haystack
        .to_lowercase()
        .matches(needle.to_lowercase().as_str())
        .count()
}
