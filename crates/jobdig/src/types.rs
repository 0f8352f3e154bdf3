use std::{fmt::Display, str::FromStr};

use serde_json::{Map, Value};

/// One job posting summary as returned by the search API. The provider's
/// schema is open-ended, so records are kept as plain JSON objects.
pub type ListingRecord = Map<String, Value>;

/// Data extracted from a job detail page. Empty when nothing usable was found.
pub type ScrapeResult = Map<String, Value>;

pub const DEFAULT_FIELD: &str = "data scientist";
pub const DEFAULT_GEOID: &str = "102095887";

#[derive(Debug, thiserror::Error)]
#[error("Invalid sort_by '{0}'. Accepted values: 'day', 'week', 'month'")]
pub struct SortByParseError(String);

/// Posting date window understood by the search API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortBy {
    Day,
    Week,
    Month,
}

impl SortBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortBy::Day => "day",
            SortBy::Week => "week",
            SortBy::Month => "month",
        }
    }
}

impl FromStr for SortBy {
    type Err = SortByParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "day" => Ok(SortBy::Day),
            "week" => Ok(SortBy::Week),
            "month" => Ok(SortBy::Month),
            _ => Err(SortByParseError(s.to_string())),
        }
    }
}

impl Display for SortBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters of a single search results page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub field: String,
    pub geoid: String,
    pub page: u32,
    pub sort_by: Option<SortBy>,
}

impl SearchQuery {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            ..Self::default()
        }
    }

    /// Query parameters sent to the provider, minus the credential.
    /// `sort_by` is only present when set.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("field", self.field.clone()),
            ("geoid", self.geoid.clone()),
            ("page", self.page.to_string()),
        ];
        if let Some(sort_by) = self.sort_by {
            params.push(("sort_by", sort_by.as_str().to_string()));
        }
        params
    }
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            field: DEFAULT_FIELD.to_string(),
            geoid: DEFAULT_GEOID.to_string(),
            page: 1,
            sort_by: None,
        }
    }
}

impl Display for SearchQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "'{}' (geoid {}, page {}",
            self.field, self.geoid, self.page
        )?;
        if let Some(sort_by) = self.sort_by {
            write!(f, ", past {}", sort_by)?;
        }
        write!(f, ")")
    }
}

/// Outcome of a listing page request.
///
/// `Unavailable` is the "no data" sentinel for a non-200 answer from the
/// provider. It is not the same thing as a page with zero listings.
#[derive(Debug, Clone, PartialEq)]
pub enum ListingPage {
    Listings(Vec<ListingRecord>),
    Unavailable { page: u32, status: u16 },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param<'a>(params: &'a [(&'static str, String)], key: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_sort_by_omitted_when_unset() {
        let params = SearchQuery::new("rust developer").params();
        assert_eq!(param(&params, "sort_by"), None);
        assert_eq!(param(&params, "field"), Some("rust developer"));
        assert_eq!(param(&params, "geoid"), Some(DEFAULT_GEOID));
        assert_eq!(param(&params, "page"), Some("1"));
    }

    #[test]
    fn test_sort_by_present_for_each_value() {
        for (sort_by, wire) in [
            (SortBy::Day, "day"),
            (SortBy::Week, "week"),
            (SortBy::Month, "month"),
        ] {
            let query = SearchQuery {
                sort_by: Some(sort_by),
                ..SearchQuery::default()
            };
            let params = query.params();
            assert_eq!(param(&params, "sort_by"), Some(wire));
        }
    }

    #[test]
    fn test_sort_by_from_str() {
        assert_eq!("week".parse::<SortBy>().unwrap(), SortBy::Week);
        let err = "year".parse::<SortBy>().unwrap_err();
        assert!(err.to_string().contains("'year'"));
    }
}
