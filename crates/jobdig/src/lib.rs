pub mod dataset;
pub mod export;
mod parser;
pub mod scraper;
pub mod secrets;
pub mod throttle;
pub mod types;

pub use self::scraper::{ScraperError, WebScraper};
pub use dataset::{JobDataset, build_dataset};
pub use parser::{Extraction, ParseError, find_embedded_json};

pub(crate) const API_URL: &str = "https://api.scrapingdog.com/linkedinjobs/";
