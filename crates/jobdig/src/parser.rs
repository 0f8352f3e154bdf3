use crate::types::{ListingRecord, ScrapeResult};

use scraper::{Html, Selector};
use serde_json::Value;
use std::sync::LazyLock;

static SCRIPT_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("script").expect("static selector is valid"));

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Listing response is not a JSON array of objects: {0}")]
    InvalidListings(#[from] serde_json::Error),
}

/// What the script scan of a detail page turned up.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    /// The page holds no `<script>` elements at all.
    NoScripts,
    /// None of the `candidates` script bodies parsed as JSON.
    NoJson { candidates: usize },
    /// The first parseable script (at `index`) was JSON but not an object.
    NotAnObject { index: usize },
    Found {
        index: usize,
        payload: ScrapeResult,
    },
}

impl Extraction {
    pub fn into_result(self) -> ScrapeResult {
        match self {
            Extraction::Found { payload, .. } => payload,
            _ => ScrapeResult::new(),
        }
    }
}

/// Decodes the body of a successful search API response.
///
/// Records are passed through untouched; the provider caps a page at 25
/// but nothing here enforces it.
pub fn parse_listings(body: &str) -> Result<Vec<ListingRecord>, ParseError> {
    Ok(serde_json::from_str(body)?)
}

/// Scans the `<script>` elements of `html` in document order and stops at
/// the first one whose text is valid JSON.
///
/// Detail pages offer no stable selector for the payload, so every script
/// is a candidate.
pub fn find_embedded_json(html: &str) -> Extraction {
    let document = Html::parse_document(html);
    let scripts: Vec<String> = document
        .select(&SCRIPT_SELECTOR)
        .map(|script| script.text().collect::<String>())
        .collect();

    if scripts.is_empty() {
        return Extraction::NoScripts;
    }

    let first_json = scripts
        .iter()
        .enumerate()
        .find_map(|(index, text)| parse_candidate(index, text));

    match first_json {
        Some((index, Value::Object(payload))) => Extraction::Found { index, payload },
        Some((index, _)) => Extraction::NotAnObject { index },
        None => Extraction::NoJson {
            candidates: scripts.len(),
        },
    }
}

fn parse_candidate(index: usize, text: &str) -> Option<(usize, Value)> {
    match serde_json::from_str::<Value>(text.trim()) {
        Ok(value) => Some((index, value)),
        Err(e) => {
            log::debug!("Script #{} is not JSON: {}", index, e);
            None
        }
    }
}
