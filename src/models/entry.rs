use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::utils::text::{contains_money_amount, count_occurrences};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResultEntry {
    pub publication_date: NaiveDate,
    pub title: String,
    pub description: String,
    pub image_filename: Option<String>,
    pub title_match_count: usize,
    pub description_match_count: usize,
    pub title_has_money: bool,
    pub description_has_money: bool,
}

impl ResultEntry {
    /// Build an entry and derive its search counts and money flags from `search_phrase`.
    pub fn new(
        publication_date: NaiveDate,
        title: String,
        description: String,
        image_filename: Option<String>,
        search_phrase: &str,
    ) -> Self {
        Self {
            title_match_count: count_occurrences(&title, search_phrase),
            description_match_count: count_occurrences(&description, search_phrase),
            title_has_money: contains_money_amount(&title),
            description_has_money: contains_money_amount(&description),
            publication_date,
            title,
            description,
            image_filename,
        }
    }
}

/// Append-only list of entries in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet {
    entries: Vec<ResultEntry>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: ResultEntry) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ResultEntry> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a ResultEntry;
    type IntoIter = std::slice::Iter<'a, ResultEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl FromIterator<ResultEntry> for ResultSet {
    fn from_iter<I: IntoIterator<Item = ResultEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
