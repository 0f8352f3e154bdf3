use crate::dataset::{DetailSource, ListingSource};
use crate::parser::{Extraction, ParseError, find_embedded_json, parse_listings};
use crate::secrets::ApiKey;
use crate::types::{ListingPage, ScrapeResult, SearchQuery};

use reqwest::{Client, StatusCode};
use std::future::Future;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ScraperError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Parse error: {0}")]
    ParseError(#[from] ParseError),
}

/// HTTP side of the pipeline: talks to the search API and downloads
/// detail pages.
#[derive(Debug, Clone)]
pub struct WebScraper {
    client: Client,
    api_url: String,
    api_key: ApiKey,
}

impl WebScraper {
    pub fn new(api_key: ApiKey) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(format!(
                "{}/{}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;

        Ok(Self {
            client,
            api_url: crate::API_URL.to_string(),
            api_key,
        })
    }

    /// Requests one page of search results.
    ///
    /// A non-200 answer is not an error: it is logged and reported as
    /// [`ListingPage::Unavailable`] so the caller can decide what to do.
    pub async fn fetch_listings(&self, query: &SearchQuery) -> Result<ListingPage, ScraperError> {
        let mut params = vec![("api_key", self.api_key.expose().to_string())];
        params.extend(query.params());

        log::info!("Fetching job listings for {}...", query);

        // Errors carry the request URL, which includes the API key.
        let response = self
            .client
            .get(&self.api_url)
            .query(&params)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;

        let status = response.status();
        if status != StatusCode::OK {
            log::error!(
                "Request for page {} failed with status code: {}",
                query.page,
                status.as_u16()
            );
            return Ok(ListingPage::Unavailable {
                page: query.page,
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(reqwest::Error::without_url)?;
        let listings = parse_listings(&body)?;
        log::info!("Returning {} job listings", listings.len());

        Ok(ListingPage::Listings(listings))
    }

    /// Downloads a detail page and pulls the first JSON payload out of its
    /// script tags. Every failure ends in an empty result.
    pub async fn scrape_detail(&self, url: &str) -> ScrapeResult {
        let html = match self.get_html(url).await {
            Ok(html) => html,
            Err(e) => {
                log::warn!("Failed to fetch {}: {}", url, e);
                return ScrapeResult::new();
            }
        };

        let extraction = find_embedded_json(&html);
        match &extraction {
            Extraction::Found { index, .. } => {
                log::info!("Successfully scraped script #{} of {}", index, url);
            }
            Extraction::NoScripts => {
                log::info!("No script tags were found for url: {}", url);
            }
            Extraction::NoJson { candidates } => {
                log::info!(
                    "None of the {} script tags held JSON for url: {}",
                    candidates,
                    url
                );
            }
            Extraction::NotAnObject { index } => {
                log::info!(
                    "Script #{} of {} is JSON but not an object, skipping",
                    index,
                    url
                );
            }
        }
        extraction.into_result()
    }

    async fn get_html(&self, url: &str) -> Result<String, ScraperError> {
        Ok(self
            .client
            .get(url)
            .send()
            .await
            .inspect_err(|e| log::debug!("HTTP error: {e:?}"))?
            .error_for_status()?
            .text()
            .await
            .inspect_err(|e| log::debug!("Decode error: {e:?}"))?)
    }
}

impl ListingSource for WebScraper {
    fn fetch_page(
        &self,
        query: &SearchQuery,
    ) -> impl Future<Output = Result<ListingPage, ScraperError>> + Send {
        self.fetch_listings(query)
    }
}

impl DetailSource for WebScraper {
    fn scrape(&self, url: &str) -> impl Future<Output = ScrapeResult> + Send {
        self.scrape_detail(url)
    }
}
