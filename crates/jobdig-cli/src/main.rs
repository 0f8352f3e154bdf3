use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::process;
use std::str::FromStr;

use clap::{Parser, ValueEnum};
use jobdig::export::{self, ExportError};
use jobdig::scraper::WebScraper;
use jobdig::secrets::{self, ApiKey};
use jobdig::throttle::{DEFAULT_MAX_DELAY_SECS, DEFAULT_MIN_DELAY_SECS, Throttle, TokioSleeper};
use jobdig::types::{DEFAULT_GEOID, SearchQuery, SortBy};
use log::LevelFilter;
use rand::SeedableRng;
use rand::rngs::StdRng;

#[derive(Parser)]
#[command(name = "jobdig")]
#[command(
    about = "Fetch a page of LinkedIn job listings and enrich them with scraped descriptions",
    long_about = None
)]
struct Cli {
    #[arg(
        short = 'l',
        long = "log-level",
        value_enum,
        default_value = "info",
        help = "Set the logging level"
    )]
    log_level: LogLevel,

    #[arg(
        long,
        help = "The job search query, either a job title or a company name"
    )]
    field: String,

    #[arg(
        long = "sort_by",
        visible_alias = "sort-by",
        value_parser = parse_sort_by,
        help = "Only keep jobs posted within the last day, week or month"
    )]
    sort_by: Option<SortBy>,

    #[arg(long, default_value = DEFAULT_GEOID, help = "LinkedIn location id")]
    geoid: String,

    #[arg(
        long,
        default_value_t = 1,
        value_parser = clap::value_parser!(u32).range(1..),
        help = "Results page to fetch (at most 25 jobs per page)"
    )]
    page: u32,

    #[arg(
        long,
        env = "SCRAPINGDOG_API_KEY",
        hide_env_values = true,
        help = "Scrapingdog API key, overrides the secrets file"
    )]
    api_key: Option<String>,

    #[arg(
        long,
        value_name = "PATH",
        default_value = "secrets.toml",
        help = "TOML file holding the API key under [api] key1"
    )]
    secrets: PathBuf,

    #[arg(
        long,
        value_name = "DIR",
        default_value = "data",
        help = "Directory the dataset is written to"
    )]
    out_dir: PathBuf,

    #[arg(
        short = 'o',
        long = "output",
        value_enum,
        default_value = "csv",
        help = "Output format"
    )]
    format: OutputFormat,

    #[arg(
        long,
        value_name = "SECONDS",
        default_value_t = DEFAULT_MIN_DELAY_SECS,
        help = "Shortest pause before each detail page request"
    )]
    min_delay: u64,

    #[arg(
        long,
        value_name = "SECONDS",
        default_value_t = DEFAULT_MAX_DELAY_SECS,
        help = "Longest pause before each detail page request"
    )]
    max_delay: u64,
}

#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
}

fn parse_sort_by(s: &str) -> Result<SortBy, String> {
    SortBy::from_str(s).map_err(|e| e.to_string())
}

fn resolve_api_key(
    flag: Option<String>,
    secrets_path: &Path,
) -> Result<ApiKey, secrets::SecretsError> {
    match flag {
        Some(key) => ApiKey::new(key),
        None => secrets::load_api_key(secrets_path),
    }
}

fn write_dataset(
    dataset: &jobdig::JobDataset,
    path: &Path,
    format: &OutputFormat,
) -> Result<(), ExportError> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let writer = BufWriter::new(File::create(path)?);
    match format {
        OutputFormat::Csv => export::write_csv(dataset, writer),
        OutputFormat::Json => export::write_json(dataset, writer),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level.clone().into())
        .init();

    let mut throttle = Throttle::with_range(
        StdRng::from_os_rng(),
        TokioSleeper,
        cli.min_delay,
        cli.max_delay,
    )
    .unwrap_or_else(|e| {
        log::error!("Invalid args: {e}");
        process::exit(1);
    });

    let api_key = resolve_api_key(cli.api_key, &cli.secrets).unwrap_or_else(|e| {
        log::error!("Error loading API key: {}", e);
        process::exit(1);
    });

    let scraper = WebScraper::new(api_key).unwrap_or_else(|e| {
        log::error!("Error creating scraper: {}", e);
        process::exit(1);
    });

    let query = SearchQuery {
        field: cli.field,
        geoid: cli.geoid,
        page: cli.page,
        sort_by: cli.sort_by,
    };

    let dataset = jobdig::build_dataset(&scraper, &scraper, &mut throttle, &query)
        .await
        .unwrap_or_else(|e| {
            log::error!("Error building dataset: {}", e);
            process::exit(1);
        });

    if dataset.is_empty() {
        log::warn!("No listings for {}, nothing written", query);
        return;
    }

    let file_name = export::output_file_name(&query.field, chrono::Local::now().naive_local());
    let mut path = cli.out_dir.join(file_name);
    if matches!(cli.format, OutputFormat::Json) {
        path.set_extension("json");
    }

    write_dataset(&dataset, &path, &cli.format).unwrap_or_else(|e| {
        log::error!("Error writing {}: {}", path.display(), e);
        process::exit(1);
    });

    print!("{}", dataset);
    log::info!("Saved {} listings to {}", dataset.len(), path.display());
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_sort_by_accepts_known_values() {
        let cli = Cli::try_parse_from(["jobdig", "--field", "data analyst", "--sort_by", "week"])
            .expect("Args should parse");
        assert_eq!(cli.sort_by, Some(SortBy::Week));
        assert_eq!(cli.page, 1);
        assert_eq!(cli.geoid, DEFAULT_GEOID);
    }

    #[test]
    fn test_sort_by_dash_alias() {
        let cli = Cli::try_parse_from(["jobdig", "--field", "x", "--sort-by", "month"])
            .expect("Args should parse");
        assert_eq!(cli.sort_by, Some(SortBy::Month));
    }

    #[test]
    fn test_invalid_sort_by_fails_fast() {
        let err = Cli::try_parse_from(["jobdig", "--field", "x", "--sort_by", "year"])
            .err()
            .expect("Invalid sort_by should be rejected");
        let expected = "Accepted values: 'day', 'week', 'month'";
        assert!(err.to_string().contains(expected));
    }

    #[test]
    fn test_field_is_required() {
        assert!(Cli::try_parse_from(["jobdig"]).is_err());
    }

    #[test]
    fn test_page_zero_is_rejected() {
        assert!(Cli::try_parse_from(["jobdig", "--field", "x", "--page", "0"]).is_err());
    }

    #[test]
    fn test_api_key_flag_wins_over_secrets_file() {
        let key = resolve_api_key(Some("from-flag".to_string()), Path::new("missing.toml"))
            .expect("Flag key should be used");
        assert_eq!(key.expose(), "from-flag");
    }
}
