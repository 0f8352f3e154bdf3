use crate::scraper::ScraperError;
use crate::throttle::{Sleeper, Throttle};
use crate::types::{ListingPage, ListingRecord, ScrapeResult, SearchQuery};

use rand::Rng;
use serde_json::{Map, Value};
use std::fmt::Display;
use std::future::Future;

pub const LINK_FIELD: &str = "job_link";
pub const DESCRIPTION_FIELD: &str = "description";

/// Where listing pages come from.
pub trait ListingSource {
    fn fetch_page(
        &self,
        query: &SearchQuery,
    ) -> impl Future<Output = Result<ListingPage, ScraperError>> + Send;
}

/// Where detail page data comes from. Never fails; a miss is an empty map.
pub trait DetailSource {
    fn scrape(&self, url: &str) -> impl Future<Output = ScrapeResult> + Send;
}

/// Flattened rows plus the union of their columns in first-seen order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobDataset {
    pub columns: Vec<String>,
    pub rows: Vec<Map<String, Value>>,
}

impl JobDataset {
    pub fn from_records(records: Vec<ListingRecord>) -> Self {
        let mut dataset = JobDataset::default();
        for record in records {
            dataset.push(flatten_record(&record));
        }
        dataset
    }

    fn push(&mut self, row: Map<String, Value>) {
        for key in row.keys() {
            if !self.columns.iter().any(|c| c == key) {
                self.columns.push(key.clone());
            }
        }
        self.rows.push(row);
    }

    /// Value of `column` in row `index`, `None` when the row lacks it.
    pub fn get(&self, index: usize, column: &str) -> Option<&Value> {
        self.rows.get(index)?.get(column)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn described(&self) -> usize {
        self.rows
            .iter()
            .filter(|row| row.contains_key(DESCRIPTION_FIELD))
            .count()
    }
}

impl Display for JobDataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\nDataset:")?;
        writeln!(f, "  Listings:          {}", self.len())?;
        writeln!(f, "  With description:  {}", self.described())?;
        writeln!(f, "  Columns:           {}", self.columns.len())
    }
}

/// Copies `description` from `scraped` onto `listing`, overwriting any
/// existing value. Every other scraped field is dropped. Returns whether
/// the listing changed.
pub fn merge_description(listing: &mut ListingRecord, mut scraped: ScrapeResult) -> bool {
    match scraped.remove(DESCRIPTION_FIELD) {
        Some(description) => {
            listing.insert(DESCRIPTION_FIELD.to_string(), description);
            true
        }
        None => false,
    }
}

/// Turns nested objects into dotted keys (`company.name`). Arrays and
/// scalars are leaves; empty objects vanish. Top-level leaves come first,
/// followed by the flattened nested objects.
pub fn flatten_record(record: &ListingRecord) -> Map<String, Value> {
    let mut flat = Map::new();
    for (key, value) in record {
        if !value.is_object() {
            flat.insert(key.clone(), value.clone());
        }
    }
    for (key, value) in record {
        if let Value::Object(inner) = value {
            flatten_into(&mut flat, key, inner);
        }
    }
    flat
}

fn flatten_into(flat: &mut Map<String, Value>, prefix: &str, object: &Map<String, Value>) {
    for (key, value) in object {
        let name = format!("{}.{}", prefix, key);
        match value {
            Value::Object(inner) => flatten_into(flat, &name, inner),
            _ => {
                flat.insert(name, value.clone());
            }
        }
    }
}

/// Fetches one page of listings and enriches each with the description
/// found on its detail page.
///
/// Listings are processed one at a time, in order, with a throttle pause
/// before every detail request. A page the provider refused yields an
/// empty dataset.
pub async fn build_dataset<L, D, R, S>(
    listings: &L,
    details: &D,
    throttle: &mut Throttle<R, S>,
    query: &SearchQuery,
) -> Result<JobDataset, ScraperError>
where
    L: ListingSource,
    D: DetailSource,
    R: Rng,
    S: Sleeper,
{
    let mut records = match listings.fetch_page(query).await? {
        ListingPage::Listings(records) => records,
        ListingPage::Unavailable { page, status } => {
            log::warn!(
                "No listings available for page {} (status {}), returning an empty dataset",
                page,
                status
            );
            return Ok(JobDataset::default());
        }
    };

    let total = records.len();
    for (index, record) in records.iter_mut().enumerate() {
        throttle.wait().await;

        let Some(url) = record
            .get(LINK_FIELD)
            .and_then(Value::as_str)
            .map(str::to_string)
        else {
            log::warn!("#{} has no {}, leaving it as is", index + 1, LINK_FIELD);
            continue;
        };

        log::info!("#{}/{} Trying to scrape job url: {}", index + 1, total, url);
        let scraped = details.scrape(&url).await;

        if !merge_description(record, scraped) {
            log::warn!("#{} No description found for {}", index + 1, url);
        }
    }

    Ok(JobDataset::from_records(records))
}
